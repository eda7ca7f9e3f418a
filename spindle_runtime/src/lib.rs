//! The `spindle` interactive-dialogue engine: loader, virtual machine, and
//! host API.
//!
//! `spindle` compiles dialogue scripts into a compact stack-based bytecode
//! program with a localisable string table, and executes it as a stream of
//! events (lines, commands, option prompts, node completions) the host pulls
//! one at a time. See [`Dialogue`] for the entry point.
//!
//! The sibling crates do the heavy lifting: `spindle_syn` parses, `spindle_compiler`
//! lowers, and `spindle_core` defines values, bytecode, and the function
//! library. This crate ties them together behind one session type and
//! provides the pieces that exist only at runtime: the VM, variable storage,
//! and the multi-format loader.

mod dialogue;
mod loader;
mod storage;
mod vm;

pub use dialogue::{Dialogue, DEFAULT_START_NODE};
pub use loader::{load_path, load_string, LoadError, NodeBody, NodeInfo, Position, SourceFormat};
pub use storage::{MemoryVariableStorage, VariableStorage};
pub use vm::{DialogueEvent, ExecutionState, OptionChoice, RuntimeError, VirtualMachine};

pub use spindle_core::{
    CompiledNode, Function, Instruction, Library, LineInfo, Program, TypeError, Value, SHUFFLE_OPTIONS,
    VARIADIC,
};
