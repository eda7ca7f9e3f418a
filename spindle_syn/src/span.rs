//! Re-exports of source-mapping types.
//!
//! `Span`s produced by this crate are byte ranges into the source the AST was
//! parsed from. They can be mapped back to line/column locations with
//! [`spindle_sourcemap::LineMap`].

pub use spindle_sourcemap::{ErrorSpan, Span};
