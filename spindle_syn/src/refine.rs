//! Post-parse AST transforms.
//!
//! The parser emits raw `if`/`elseif`/`else`/`endif` commands and flat
//! shortcut-option statements. The regrouping transform rebuilds the
//! structured statements the compiler consumes.

use spindle_err::ErrorCtx;

use crate::ast::visit::Visitable;

mod block_regroup;

use block_regroup::BlockRegroup;

/// Run all refine transforms on a `Visitable` AST type.
pub fn refine<A: Visitable>(errors: &ErrorCtx, ast: &mut A) {
    ast.visit_mut_with(&mut BlockRegroup::new(errors));
}
