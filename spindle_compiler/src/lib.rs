//! Lowering from the `spindle_syn` AST to `spindle_core` bytecode.
//!
//! This crate is mostly intended to be an internal dependency of the `spindle`
//! dialogue engine. End users are expected to use `spindle_runtime`, the
//! user-facing API, instead of depending on this crate directly.
//!
//! The compiler walks regrouped nodes (see `spindle_syn::refine`) and emits
//! linear instruction sequences. Jumps are emitted against symbolic labels
//! and patched to instruction indices when a node is finished; the label
//! names survive in the compiled node for disassembly and for stack-driven
//! jumps.

use thiserror::Error;

mod codegen;
mod strings;

pub use codegen::{compile_file, ProgramCompiler};
pub use strings::StringTableBuilder;

/// Errors that abort compilation of the whole program.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum CompileError {
    #[error("node is missing a `title` header")]
    MissingTitle,
    #[error("node `{name}` is already defined")]
    DuplicateNode { name: String },
    #[error("duplicate string key `{key}`")]
    DuplicateStringKey { key: String },
    #[error("unresolved label `{label}` in node `{node}`")]
    UnresolvedLabel { label: String, node: String },
    #[error("unknown function `{name}`")]
    UnknownFunction { name: String },
    #[error("function `{name}` expects {expected} argument(s), found {found}")]
    ArityMismatch {
        name: String,
        expected: i32,
        found: usize,
    },
    #[error("internal compiler error: {0}")]
    Internal(String),
}
