use std::fmt;
use std::path::{Path, PathBuf};

use text_size::TextRange;

use crate::base::{FileId, LineCol, LineIndex};

/// A byte range within a specific file.
///
/// Every token and every diagnostic carries one of these; resolving it to
/// line/column goes through the owning [`SourceMap`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SourceRef {
    pub file: FileId,
    pub range: TextRange,
}

impl SourceRef {
    pub fn new(file: FileId, range: TextRange) -> Self {
        Self { file, range }
    }

}

/// One loaded source file: its display name, full text, and line table.
#[derive(Debug)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
    index: LineIndex,
}

impl SourceFile {
    pub fn line_index(&self) -> &LineIndex {
        &self.index
    }
}

/// Owner of all file texts touched by one parse.
///
/// The top-level project file registers first; `include`d files follow in
/// the order the parser reaches them. Macro expansion does not register
/// files - expanded text reports positions of the macro call site.
#[derive(Debug, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file text under a display name and return its handle.
    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) -> FileId {
        let text = text.into();
        let index = LineIndex::new(&text);
        self.files.push(SourceFile {
            name: name.into(),
            text,
            index,
        });
        FileId((self.files.len() - 1) as u32)
    }

    /// Read a file from disk and register it.
    pub fn load(&mut self, path: &Path) -> std::io::Result<FileId> {
        let text = std::fs::read_to_string(path)?;
        Ok(self.insert(path.display().to_string(), text))
    }

    pub fn get(&self, id: FileId) -> &SourceFile {
        &self.files[id.index()]
    }

    pub fn name(&self, id: FileId) -> &str {
        &self.files[id.index()].name
    }

    pub fn text(&self, id: FileId) -> &str {
        &self.files[id.index()].text
    }

    /// Resolve a source ref to `name:line:col` (1-indexed) for messages.
    pub fn describe(&self, at: SourceRef) -> SourceDescription<'_> {
        let file = self.get(at.file);
        let pos = file.line_index().line_col(at.range.start());
        SourceDescription {
            name: &file.name,
            pos,
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Human-readable location, formatted as `name:line:col` (1-indexed).
pub struct SourceDescription<'a> {
    name: &'a str,
    pos: LineCol,
}

impl fmt::Display for SourceDescription<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.name, self.pos.line + 1, self.pos.col + 1)
    }
}

/// Resolve an include target against the directory of the including file.
///
/// Absolute paths pass through untouched; relative paths are joined onto
/// the parent directory of `from`.
pub fn resolve_include_path(from: &str, target: &str) -> PathBuf {
    let target_path = Path::new(target);
    if target_path.is_absolute() {
        return target_path.to_path_buf();
    }
    match Path::new(from).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(target_path),
        _ => target_path.to_path_buf(),
    }
}
