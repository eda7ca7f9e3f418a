//! Source-mapping for `spindle`.
//!
//! This crate is mostly intended to be an internal dependency of the `spindle`
//! dialogue engine. End users are expected to use `spindle_runtime`, the
//! user-facing API, instead of depending on this crate directly.
//!
//! Most of the internals of `spindle` are developed with the assumption that
//! all code resides in continuous memory addressable with bytes. This
//! simplifies lexing and parsing, but erases information about source
//! location. `spindle_sourcemap` contains the facilities for converting
//! byte-positions back into line/column locations for diagnostics and for the
//! localisation line-info table.

mod line_map;
mod span;

#[doc(inline)]
pub use line_map::{LineMap, Location};
#[doc(inline)]
pub use span::{ErrorSpan, Span};
