//! Foundation types for the tjplan toolchain.
//!
//! Everything location-related lives here: [`FileId`] handles for loaded
//! sources, byte-offset positions ([`TextRange`], [`TextSize`]), the
//! [`LineIndex`] that turns offsets into [`LineCol`] pairs, [`SourceRef`]
//! as the file+range pair carried by tokens and diagnostics, and the
//! [`SourceMap`] owning the loaded texts.
//!
//! Nothing in here depends on the rest of the crate.

mod file_id;
mod line_index;
mod source;

pub use file_id::FileId;
pub use line_index::{LineCol, LineIndex};
pub use source::{resolve_include_path, SourceFile, SourceMap, SourceRef};

pub use text_size::{TextRange, TextSize};
