/// Numeric handle for a loaded source file.
///
/// File ids are handed out sequentially by [`SourceMap`](crate::base::SourceMap)
/// as files are registered (the top-level project file first, then each
/// `include`d file in the order it is reached). They are cheap to copy and
/// compare, which keeps tokens and diagnostics small.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(pub u32);

impl FileId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for FileId {
    fn from(raw: u32) -> Self {
        FileId(raw)
    }
}
