pub use crate::dprintln; // Make the macro available
pub use crate::error::{Error, Side};
pub use crate::index::{ChunkIndex, ChunkRange, Family};
pub use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

pub use std::io::{Read, Seek, SeekFrom, Write};

pub type R<T> = std::result::Result<T, Error>;
