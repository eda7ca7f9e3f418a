use std::vec;

use spindle_err::ErrorCtx;

use crate::ast::visit::VisitMut;
use crate::ast::{
    Block, CommandKind, Expr, Hashtag, IfClause, IfStmt, ShortcutOption, ShortcutOptionClause,
    ShortcutsStmt, Stmt, StmtBody, StmtKind,
};
use crate::ptr::P;
use crate::Span;

/// Block regrouping transform that flattens nested blocks, and creates `if`
/// statements and shortcut groups.
pub struct BlockRegroup<'a> {
    errors: &'a ErrorCtx,
}

impl<'a> BlockRegroup<'a> {
    pub fn new(error_ctx: &'a ErrorCtx) -> Self {
        BlockRegroup { errors: error_ctx }
    }
}

impl<'a> VisitMut for BlockRegroup<'a> {
    fn visit_block_mut(&mut self, block: &mut Block) {
        let raw_stmts = std::mem::replace(&mut block.stmts, Vec::new());
        let mut stmts = Vec::with_capacity(raw_stmts.len());
        let mut state = IfGroupState::new(self.errors, raw_stmts);

        while state.stmt.is_some() {
            if state.stmt_is(is_if) {
                stmts.push(state.group_if_statement());
            } else {
                stmts.push(state.bump().expect("current stmt is checked"));
            }
        }

        block.stmts = stmts;

        // Blocks associated with shortcut options are visited recursively by
        // `OptionGroupIter`, so there is nothing left to do here.
    }
}

fn command_kind(stmt: &Stmt) -> Option<&CommandKind> {
    match &stmt.body.kind {
        StmtKind::Command(command) => Some(&command.kind),
        _ => None,
    }
}

fn is_if(kind: &CommandKind) -> bool {
    matches!(kind, CommandKind::If(_))
}

fn is_else_if(kind: &CommandKind) -> bool {
    matches!(kind, CommandKind::ElseIf(_))
}

fn is_else(kind: &CommandKind) -> bool {
    matches!(kind, CommandKind::Else)
}

fn is_end_if(kind: &CommandKind) -> bool {
    matches!(kind, CommandKind::EndIf)
}

struct IfGroupState<'a> {
    errors: &'a ErrorCtx,
    iter: OptionGroupIter<'a>,
    stmt: Option<Stmt>,
}

impl<'a> IfGroupState<'a> {
    fn new(errors: &'a ErrorCtx, raw_stmts: Vec<Stmt>) -> Self {
        let iter = OptionGroupIter::new(errors, FlattenIter::new(raw_stmts.into_iter()));

        let mut this = IfGroupState {
            errors,
            iter,
            stmt: None,
        };

        this.bump();
        this
    }

    fn bump(&mut self) -> Option<Stmt> {
        std::mem::replace(&mut self.stmt, self.iter.next())
    }

    fn stmt_is(&self, pred: fn(&CommandKind) -> bool) -> bool {
        self.stmt
            .as_ref()
            .and_then(command_kind)
            .map(pred)
            .unwrap_or(false)
    }

    fn verify_if_commands(&self, stmt: &Stmt) {
        for hashtag in &stmt.hashtags {
            self.errors
                .warn("hashtags on if-commands are ignored")
                .span(hashtag.span);
        }
    }

    fn group_if_statement(&mut self) -> Stmt {
        let mut all_span = self
            .stmt
            .as_ref()
            .expect("current statement should be checked")
            .span;

        let if_clause = {
            let stmt = self.bump().expect("should be a current stmt");
            let span = stmt.span;

            self.verify_if_commands(&stmt);

            let condition = match stmt.body.kind {
                StmtKind::Command(command) => match command.kind {
                    CommandKind::If(condition) => condition,
                    _ => unreachable!("statement kind should be checked"),
                },
                _ => unreachable!("statement kind should be checked"),
            };

            let block = self.group_clause_block(span.empty_end());
            let span = union_spans(span, block.span);

            IfClause {
                span,
                condition,
                block,
            }
        };

        all_span = union_spans(all_span, if_clause.span);

        let mut else_if_clauses = Vec::new();
        while self.stmt_is(is_else_if) {
            let stmt = self.bump().expect("should be a current stmt");
            let span = stmt.span;

            self.verify_if_commands(&stmt);

            let condition = match stmt.body.kind {
                StmtKind::Command(command) => match command.kind {
                    CommandKind::ElseIf(condition) => condition,
                    _ => unreachable!("statement kind should be checked"),
                },
                _ => unreachable!("statement kind should be checked"),
            };

            let block = self.group_clause_block(span.empty_end());
            let span = union_spans(span, block.span);
            all_span = union_spans(all_span, span);

            else_if_clauses.push(IfClause {
                span,
                condition,
                block,
            });
        }

        let else_block = if self.stmt_is(is_else) {
            let else_stmt = self.bump().expect("current stmt checked");
            self.verify_if_commands(&else_stmt);
            let block = self.group_clause_block(all_span.empty_end());
            all_span = union_spans(all_span, block.span);
            Some(block)
        } else {
            None
        };

        let invalid = if self.stmt.is_none() || self.stmt_is(is_end_if) {
            None
        } else {
            let mut block = Block::empty(all_span.empty_end());
            while self.stmt.is_some() && !self.stmt_is(is_end_if) {
                block.push(self.bump().expect("current stmt checked"));
            }
            all_span = union_spans(all_span, block.span);
            Some(block)
        };

        // end-if command or nothing
        if self.stmt_is(is_end_if) {
            let end_if_stmt = self.bump().expect("current stmt checked");
            self.verify_if_commands(&end_if_stmt);
        } else {
            self.errors
                .error("this if statement is not closed (missing `<<endif>>`)")
                .span(all_span);
        }

        let body = IfStmt {
            span: all_span,
            if_clause,
            else_if_clauses,
            else_block,
            invalid,
        };

        Stmt {
            span: all_span,
            body: StmtBody {
                span: all_span,
                kind: StmtKind::If(body),
            },
            decorator_command: None,
            hashtags: Vec::new(),
        }
    }

    fn group_clause_block(&mut self, start_span: Span) -> Block {
        let mut block = Block::empty(start_span);

        while let Some(stmt) = self.stmt.as_ref() {
            if let Some(kind) = command_kind(stmt) {
                if is_if(kind) {
                    let if_stmt = self.group_if_statement();
                    block.push(if_stmt);
                    continue;
                }

                if is_else_if(kind) || is_else(kind) || is_end_if(kind) {
                    break;
                }
            }

            block.push(self.bump().expect("current stmt should exist"));
        }

        block
    }
}

#[derive(Debug)]
struct OptionGroupIter<'a> {
    errors: &'a ErrorCtx,
    iter: FlattenIter,
    shortcut_group: Option<Vec<ShortcutOptionClausePart>>,
}

impl<'a> OptionGroupIter<'a> {
    fn new(errors: &'a ErrorCtx, iter: FlattenIter) -> Self {
        OptionGroupIter {
            errors,
            iter,
            shortcut_group: None,
        }
    }
}

/// Extracts the condition of a shortcut option from its decorator command,
/// if any.
fn option_condition(errors: &ErrorCtx, stmt: &mut Stmt) -> Option<P<Expr>> {
    let command = stmt.decorator_command.take()?;

    match command.kind {
        CommandKind::If(condition) => Some(condition),
        _ => {
            errors
                .error("only `if` conditions are allowed on shortcut options")
                .span(command.span);
            None
        }
    }
}

#[derive(Debug)]
struct ShortcutOptionClausePart {
    span: Span,
    option: ShortcutOption,
    condition: Option<P<Expr>>,
    hashtags: Vec<Hashtag>,
    block: Option<Block>,
}

impl<'a> Iterator for OptionGroupIter<'a> {
    type Item = Stmt;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(stmt) = self.iter.peek() {
            // Try building current shortcut group
            if let Some(shortcut_group) = self.shortcut_group.as_mut() {
                let last = shortcut_group
                    .last_mut()
                    .expect("there should be at least one option in group");

                match &stmt.body.kind {
                    StmtKind::ShortcutOption(_) => {
                        let last_span = last.span;
                        last.block
                            .get_or_insert_with(|| Block::empty(last_span.empty_end()));

                        let mut stmt = self.iter.next().expect("value guaranteed by peek");
                        let span = stmt.span;
                        let condition = option_condition(self.errors, &mut stmt);
                        let hashtags = std::mem::replace(&mut stmt.hashtags, Vec::new());
                        let option = match stmt.body.kind {
                            StmtKind::ShortcutOption(option) => option,
                            _ => unreachable!("pattern checked above"),
                        };

                        shortcut_group.push(ShortcutOptionClausePart {
                            span,
                            option,
                            condition,
                            hashtags,
                            block: None,
                        });
                        continue;
                    }
                    StmtKind::Block(_) if last.block.is_none() => {
                        let stmt = self.iter.next().expect("value guaranteed by peek");
                        last.span = union_spans(last.span, stmt.span);
                        let mut block = match stmt.body.kind {
                            StmtKind::Block(block) => block,
                            _ => unreachable!("pattern checked above"),
                        };

                        // Visit associated blocks recursively
                        BlockRegroup::new(self.errors).visit_block_mut(&mut block);

                        last.block = Some(block);
                        continue;
                    }
                    _ => {}
                };

                let shortcut_group = self.shortcut_group.take().expect("group should exist");
                return Some(make_shortcuts_stmt(shortcut_group));
            }

            match &stmt.body.kind {
                // Flatten stray blocks
                StmtKind::Block(_) => {
                    let stmt = self.iter.next().expect("stmt should exist");
                    let block = match stmt.body.kind {
                        StmtKind::Block(block) => block,
                        _ => unreachable!("pattern guaranteed by code above"),
                    };

                    self.iter.push_iter(block.stmts.into_iter());
                }
                // Start a new shortcut option group
                StmtKind::ShortcutOption(_) => {
                    let mut stmt = self.iter.next().expect("value guaranteed by peek");
                    let span = stmt.span;
                    let condition = option_condition(self.errors, &mut stmt);
                    let hashtags = std::mem::replace(&mut stmt.hashtags, Vec::new());
                    let option = match stmt.body.kind {
                        StmtKind::ShortcutOption(option) => option,
                        _ => unreachable!("pattern checked above"),
                    };

                    let old = self.shortcut_group.replace(vec![ShortcutOptionClausePart {
                        span,
                        option,
                        condition,
                        hashtags,
                        block: None,
                    }]);

                    assert!(old.is_none());
                }
                _ => return Some(self.iter.next().expect("stmt should exist")),
            }
        }

        if let Some(shortcut_group) = self.shortcut_group.take() {
            if !shortcut_group.is_empty() {
                return Some(make_shortcuts_stmt(shortcut_group));
            }
        }

        None
    }
}

fn make_shortcuts_stmt(shortcut_group: Vec<ShortcutOptionClausePart>) -> Stmt {
    let mut stmt_span = None;

    let options = shortcut_group
        .into_iter()
        .map(|part| {
            let span = part.span;
            let stmt_span = stmt_span.get_or_insert(span);
            *stmt_span = union_spans(*stmt_span, span);

            let block = part.block.unwrap_or_else(|| Block::empty(span));
            ShortcutOptionClause {
                span,
                option: part.option,
                condition: part.condition,
                hashtags: part.hashtags,
                block,
            }
        })
        .collect::<Vec<_>>();

    let shortcuts = ShortcutsStmt {
        span: stmt_span.expect("there should be at least one option"),
        options,
    };

    Stmt {
        span: shortcuts.span,
        body: StmtBody {
            span: shortcuts.span,
            kind: StmtKind::Shortcuts(shortcuts),
        },
        decorator_command: None,
        hashtags: Vec::new(),
    }
}

fn union_spans(a: Span, b: Span) -> Span {
    if a.is_nil() {
        b
    } else if b.is_nil() {
        a
    } else {
        a.union(b)
    }
}

#[derive(Debug)]
struct FlattenIter {
    next: Option<Stmt>,
    stack: Vec<vec::IntoIter<Stmt>>,
}

impl FlattenIter {
    fn new(iter: vec::IntoIter<Stmt>) -> Self {
        FlattenIter {
            next: None,
            stack: vec![iter],
        }
    }

    fn peek(&mut self) -> Option<&Stmt> {
        if self.next.is_none() {
            self.next = self.source_next();
        }

        self.next.as_ref()
    }

    fn next(&mut self) -> Option<Stmt> {
        if self.next.is_none() {
            self.next = self.source_next();
        }

        self.next.take()
    }

    fn push_iter(&mut self, iter: vec::IntoIter<Stmt>) {
        self.stack.push(iter);
    }

    fn source_next(&mut self) -> Option<Stmt> {
        while let Some(source) = self.stack.last_mut() {
            if let Some(stmt) = source.next() {
                return Some(stmt);
            }

            self.stack.pop();
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Use pretty_assertions for `assert_eq` diffs.
    use pretty_assertions::assert_eq;

    use crate::ast::ExprKind;

    fn stmt(body: StmtKind) -> Stmt {
        Stmt {
            span: Span::new(1, 0),
            body: StmtBody {
                span: Span::new(1, 0),
                kind: body,
            },
            decorator_command: None,
            hashtags: Vec::new(),
        }
    }

    fn command(kind: CommandKind) -> Stmt {
        stmt(StmtKind::Command(crate::ast::Command {
            span: Span::new(1, 0),
            kind,
        }))
    }

    fn expr() -> P<Expr> {
        P(Expr {
            kind: ExprKind::Err,
            span: Span::new(1, 0),
        })
    }

    fn block(stmts: Vec<Stmt>) -> Block {
        Block {
            span: Span::new(1, 0),
            stmts,
        }
    }

    fn block_stmt(stmts: Vec<Stmt>) -> Stmt {
        stmt(StmtKind::Block(block(stmts)))
    }

    fn text_stmt() -> Stmt {
        stmt(StmtKind::Text(crate::ast::StrBody {
            segments: Vec::new(),
            span: Span::new(1, 0),
        }))
    }

    fn shortcut_option() -> Stmt {
        stmt(StmtKind::ShortcutOption(ShortcutOption {
            span: Span::new(1, 0),
            text: crate::ast::StrBody {
                segments: Vec::new(),
                span: Span::new(1, 0),
            },
        }))
    }

    fn regrouped(stmts: Vec<Stmt>) -> Block {
        let mut block = block(stmts);
        let errors = ErrorCtx::new();
        BlockRegroup::new(&errors).visit_block_mut(&mut block);
        assert!(errors.is_empty(), "should not emit any errors");
        block
    }

    #[test]
    fn groups_if_statements() {
        let result = regrouped(vec![
            command(CommandKind::If(expr())),
            text_stmt(),
            command(CommandKind::ElseIf(expr())),
            command(CommandKind::Else),
            text_stmt(),
            command(CommandKind::EndIf),
            text_stmt(),
        ]);

        assert_eq!(result.stmts.len(), 2);
        match &result.stmts[0].body.kind {
            StmtKind::If(if_stmt) => {
                assert_eq!(if_stmt.if_clause.block.stmts.len(), 1);
                assert_eq!(if_stmt.else_if_clauses.len(), 1);
                let else_block = if_stmt.else_block.as_ref().expect("else block expected");
                assert_eq!(else_block.stmts.len(), 1);
                assert!(if_stmt.invalid.is_none());
            }
            other => panic!("expected if statement, got {:?}", other),
        }
    }

    #[test]
    fn groups_nested_if_statements() {
        let result = regrouped(vec![
            command(CommandKind::If(expr())),
            command(CommandKind::If(expr())),
            text_stmt(),
            command(CommandKind::EndIf),
            command(CommandKind::EndIf),
        ]);

        assert_eq!(result.stmts.len(), 1);
        match &result.stmts[0].body.kind {
            StmtKind::If(if_stmt) => {
                assert_eq!(if_stmt.if_clause.block.stmts.len(), 1);
                assert!(matches!(
                    if_stmt.if_clause.block.stmts[0].body.kind,
                    StmtKind::If(_)
                ));
            }
            other => panic!("expected if statement, got {:?}", other),
        }
    }

    #[test]
    fn unclosed_if_is_an_error() {
        let mut source_block = block(vec![command(CommandKind::If(expr())), text_stmt()]);

        let errors = ErrorCtx::new();
        BlockRegroup::new(&errors).visit_block_mut(&mut source_block);
        assert!(!errors.is_empty(), "unclosed if should produce an error");
    }

    #[test]
    fn groups_shortcut_options_with_blocks() {
        let result = regrouped(vec![
            shortcut_option(),
            block_stmt(vec![text_stmt()]),
            shortcut_option(),
            text_stmt(),
        ]);

        assert_eq!(result.stmts.len(), 2);
        match &result.stmts[0].body.kind {
            StmtKind::Shortcuts(shortcuts) => {
                assert_eq!(shortcuts.options.len(), 2);
                assert_eq!(shortcuts.options[0].block.stmts.len(), 1);
                assert!(shortcuts.options[1].block.stmts.is_empty());
            }
            other => panic!("expected shortcuts statement, got {:?}", other),
        }
        assert!(matches!(result.stmts[1].body.kind, StmtKind::Text(_)));
    }

    #[test]
    fn nested_shortcut_groups_are_grouped_recursively() {
        let result = regrouped(vec![
            shortcut_option(),
            block_stmt(vec![shortcut_option(), shortcut_option()]),
        ]);

        assert_eq!(result.stmts.len(), 1);
        match &result.stmts[0].body.kind {
            StmtKind::Shortcuts(shortcuts) => {
                assert_eq!(shortcuts.options.len(), 1);
                let inner = &shortcuts.options[0].block;
                assert_eq!(inner.stmts.len(), 1);
                assert!(matches!(inner.stmts[0].body.kind, StmtKind::Shortcuts(_)));
            }
            other => panic!("expected shortcuts statement, got {:?}", other),
        }
    }

    #[test]
    fn shortcut_conditions_are_extracted() {
        let mut option = shortcut_option();
        option.decorator_command = Some(crate::ast::Command {
            span: Span::new(1, 0),
            kind: CommandKind::If(expr()),
        });

        let result = regrouped(vec![option]);

        match &result.stmts[0].body.kind {
            StmtKind::Shortcuts(shortcuts) => {
                assert!(shortcuts.options[0].condition.is_some());
            }
            other => panic!("expected shortcuts statement, got {:?}", other),
        }
    }
}
