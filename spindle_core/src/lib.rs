//! Values, bytecode, and compiled programs for the `spindle` dialogue engine.
//!
//! This crate is mostly intended to be an internal dependency of the `spindle`
//! dialogue engine. End users are expected to use `spindle_runtime`, the
//! user-facing API, instead of depending on this crate directly.
//!
//! The types here are the interface between the compiler and the virtual
//! machine: the [`Value`] model with its coercion rules, the typed
//! [`Instruction`] set, the [`Program`] container, and the [`Library`] of
//! host-callable functions.

mod instruction;
mod library;
mod program;
mod value;

pub use instruction::Instruction;
pub use library::{Function, FunctionBody, Library, VARIADIC};
pub use program::{CompiledNode, ContainerError, LineInfo, NodeCollision, Program};
pub use value::{TypeError, Value};

/// Reserved variable read by hosts to decide whether the next presented
/// option set should be shuffled. Set by the `shuffleNextOptions` command.
pub const SHUFFLE_OPTIONS: &str = "SHUFFLE_OPTIONS";
