//! Interface boundary to the compressed container's block storage: an
//! ordered, mutable sequence of typed binary records living in a host file.
//! The engine never implements this abstraction itself; it drives an
//! iterator supplied by the caller and reads/writes record content by
//! seeking the host file directly at the offsets the iterator reports.

use crate::prelude::*;

/// Record header: 1 type byte (high bit set on the final record) followed by
/// a 24-bit big-endian payload length.
pub const BLOCK_HEADER_LEN: u64 = 4;
/// Application records start their payload with a 4-byte id.
pub const BLOCK_ID_LEN: u32 = 4;
/// High bit of the type byte marking the last record in the sequence.
pub const BLOCK_LAST_FLAG: u8 = 0x80;

pub const BLOCK_TYPE_PADDING: u8 = 1;
pub const BLOCK_TYPE_APPLICATION: u8 = 2;

/// Largest payload the 24-bit length field can describe.
pub const MAX_BLOCK_PAYLOAD: u32 = (1 << 24) - 1;

/// Coarse record classification. Anything that is neither padding nor
/// application data belongs to the host container and is opaque to this
/// engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Generic,
    Padding,
    Application,
}

impl BlockType {
    pub fn from_code(code: u8) -> BlockType {
        match code & !BLOCK_LAST_FLAG {
            BLOCK_TYPE_PADDING => BlockType::Padding,
            BLOCK_TYPE_APPLICATION => BlockType::Application,
            _ => BlockType::Generic,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            BlockType::Generic => 0,
            BlockType::Padding => BLOCK_TYPE_PADDING,
            BlockType::Application => BLOCK_TYPE_APPLICATION,
        }
    }
}

/// Cursor over the record sequence of one compressed container.
///
/// `next` advances to the following record and reports whether one exists;
/// the accessors describe the record the cursor currently sits on. A fresh
/// cursor is positioned before the first record.
pub trait BlockStorage {
    fn next(&mut self) -> R<bool>;

    fn block_type(&self) -> BlockType;

    /// Payload length of the current record, excluding the record header.
    fn block_length(&self) -> u32;

    /// Host-file offset of the current record's header.
    fn block_offset(&self) -> u64;

    fn is_last(&self) -> bool;

    /// Reads the leading payload bytes of the current record.
    fn read_raw(&mut self, buf: &mut [u8]) -> R<()>;

    /// Appends a record after the last one.
    fn append(&mut self, block_type: BlockType, payload: &[u8]) -> R<()>;

    /// Inserts a record directly after the current one.
    fn insert_after(&mut self, block_type: BlockType, payload: &[u8]) -> R<()>;

    /// Deletes the current record.
    fn delete(&mut self) -> R<()>;
}
