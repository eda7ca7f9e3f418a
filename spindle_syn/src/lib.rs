//! Parser for the spindle interactive dialogue language.
//!
//! This crate is mostly intended to be an internal dependency of the `spindle`
//! dialogue engine. End users are expected to use `spindle_runtime`, the
//! user-facing API, instead of depending on this crate directly.
//!
//! This crate contains the AST definitions for the language, a lexer, and a
//! parser. All components assume that all sources logically reside in a
//! continuous space that can be indexed using byte positions.

pub mod ast;
pub mod lex;
pub mod parse;
pub mod ptr;
pub mod refine;
pub mod span;
pub mod token;

#[doc(inline)]
pub use span::{ErrorSpan, Span};
