//! Mutable AST visitors, used by the refine transforms.

use super::*;

/// Trait for transforms that rewrite the AST in place.
///
/// The default methods walk the structure; implementors override the levels
/// they care about and are themselves responsible for recursing further if
/// they do.
pub trait VisitMut: Sized {
    fn visit_file_mut(&mut self, file: &mut File) {
        for node in &mut file.nodes {
            self.visit_node_mut(node);
        }
    }

    fn visit_node_mut(&mut self, node: &mut Node) {
        self.visit_block_mut(&mut node.body);
    }

    fn visit_block_mut(&mut self, block: &mut Block) {
        for stmt in &mut block.stmts {
            self.visit_stmt_mut(stmt);
        }
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        match &mut stmt.body.kind {
            StmtKind::Block(block) => self.visit_block_mut(block),
            StmtKind::If(if_stmt) => {
                self.visit_block_mut(&mut if_stmt.if_clause.block);
                for clause in &mut if_stmt.else_if_clauses {
                    self.visit_block_mut(&mut clause.block);
                }
                if let Some(block) = &mut if_stmt.else_block {
                    self.visit_block_mut(block);
                }
                if let Some(block) = &mut if_stmt.invalid {
                    self.visit_block_mut(block);
                }
            }
            StmtKind::Shortcuts(shortcuts) => {
                for clause in &mut shortcuts.options {
                    self.visit_block_mut(&mut clause.block);
                }
            }
            StmtKind::Text(_)
            | StmtKind::Command(_)
            | StmtKind::Flow(_)
            | StmtKind::ShortcutOption(_) => {}
        }
    }
}

/// AST types that can be driven through a [`VisitMut`].
pub trait Visitable {
    fn visit_mut_with<V: VisitMut>(&mut self, visitor: &mut V);
}

impl Visitable for File {
    fn visit_mut_with<V: VisitMut>(&mut self, visitor: &mut V) {
        visitor.visit_file_mut(self);
    }
}

impl Visitable for Node {
    fn visit_mut_with<V: VisitMut>(&mut self, visitor: &mut V) {
        visitor.visit_node_mut(self);
    }
}

impl Visitable for Block {
    fn visit_mut_with<V: VisitMut>(&mut self, visitor: &mut V) {
        visitor.visit_block_mut(self);
    }
}
