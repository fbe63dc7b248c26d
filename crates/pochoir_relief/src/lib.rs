//! # pochoir_relief
//!
//! Relief - The sculptured surface every Pochoir pass works against.
//!
//! ## Name Origin
//!
//! A **relief** is a sculpture that stays attached to its background: the
//! figures stand out, but you can always see the slab they were cut from. The
//! template AST here works the same way. Every node keeps its location in the
//! original source so a printer can lift untouched text straight from the slab
//! and only re-carve the nodes a pass replaced.
//!
//! ## Contents
//!
//! - [`location`]: byte offsets, line/column positions and a line index
//! - [`error`]: the fatal, per-file error taxonomy
//! - [`ast`]: template nodes, expressions and the replacement primitive

pub mod ast;
pub mod error;
pub mod location;

pub use ast::*;
pub use error::{TransformError, TransformResult};
pub use location::{LineIndex, Position, SourceLocation};
