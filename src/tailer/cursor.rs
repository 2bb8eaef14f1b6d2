//! Position in the logical replay stream

/// Offset of the first byte not yet consumed
///
/// The cursor is independent of any snapshot: every re-read of the file is seeked to it.
/// It only moves forward, and only by whole records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamCursor {
    offset: usize,
    records: u64,
}

impl StreamCursor {
    /// Cursor positioned just past the header region.
    pub fn after_header(header_len: usize) -> Self {
        Self { offset: header_len, records: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Records consumed since the header.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Bytes in `snapshot` past the cursor.
    pub fn remaining(&self, snapshot: &[u8]) -> usize {
        snapshot.len().saturating_sub(self.offset)
    }

    /// Step over one fully applied record.
    pub fn advance(&mut self, record_len: usize) {
        debug_assert!(record_len > 0, "records always include a tag byte");
        self.offset += record_len;
        self.records += 1;
    }
}
