use crate::formats::{read_chunk_header, read_fully};
use crate::prelude::*;

// Wave64 chunk GUIDs: the first four bytes spell the RIFF tag in lowercase
// (or the original tag verbatim), the remaining twelve identify the scheme.
// RIFF GUID 66666972-912E-11CF-A5D6-28DB04C10000
pub(crate) const RIFF_GUID: [u8; 16] = [
    0x72, 0x69, 0x66, 0x66, 0x2E, 0x91, 0xCF, 0x11, 0xA5, 0xD6, 0x28, 0xDB, 0x04, 0xC1, 0x00, 0x00,
];
// WAVE GUID 65766177-ACF3-11D3-8CD1-00C04F8EDB8A
pub(crate) const WAVE_GUID: [u8; 16] = [
    0x77, 0x61, 0x76, 0x65, 0xF3, 0xAC, 0xD3, 0x11, 0x8C, 0xD1, 0x00, 0xC0, 0x4F, 0x8E, 0xDB, 0x8A,
];
// fmt GUID 20746D66-ACF3-11D3-8CD1-00C04F8EDB8A
pub(crate) const FMT_GUID: [u8; 16] = [
    0x66, 0x6D, 0x74, 0x20, 0xF3, 0xAC, 0xD3, 0x11, 0x8C, 0xD1, 0x00, 0xC0, 0x4F, 0x8E, 0xDB, 0x8A,
];
// data GUID 61746164-ACF3-11D3-8CD1-00C04F8EDB8A
pub(crate) const DATA_GUID: [u8; 16] = [
    0x64, 0x61, 0x74, 0x61, 0xF3, 0xAC, 0xD3, 0x11, 0x8C, 0xD1, 0x00, 0xC0, 0x4F, 0x8E, 0xDB, 0x8A,
];

// Chunk Structures
const HEADER_SIZE: usize = 40; // RIFF GUID + 64-bit size + WAVE GUID
const CHUNK_HEADER_SIZE: u64 = 24; // GUID + 64-bit size, counted inside the size

enum Wave64Chunk {
    Fmt,
    Data,
    Other,
}

fn classify(guid: &[u8; 16]) -> Wave64Chunk {
    if *guid == FMT_GUID {
        Wave64Chunk::Fmt
    } else if *guid == DATA_GUID {
        Wave64Chunk::Data
    } else {
        Wave64Chunk::Other
    }
}

/// Walks a Sony Wave64 file from its current position. Unlike RIFF, every
/// chunk size includes the 24-byte chunk header, and chunks align to 8
/// bytes.
pub(crate) fn read(index: &mut ChunkIndex, f: &mut (impl Read + Seek)) -> R<()> {
    let start = f.stream_position().map_err(|e| Error::seek(Side::Source, e))?;
    let mut header = [0u8; HEADER_SIZE];
    if !read_fully(f, &mut header, Side::Source)?
        || header[0..16] != RIFF_GUID
        || header[24..40] != WAVE_GUID
    {
        return Err(Error::UnsupportedLayout {
            family: Family::Wave64,
        });
    }
    index.append(start, HEADER_SIZE as u64)?;
    let eof_offset = LittleEndian::read_u64(&header[16..24]);

    loop {
        let offset = f.stream_position().map_err(|e| Error::seek(Side::Source, e))?;
        let mut chunk = [0u8; CHUNK_HEADER_SIZE as usize];
        if !read_chunk_header(f, &mut chunk, Side::Source)? {
            break;
        }
        let mut guid = [0u8; 16];
        guid.copy_from_slice(&chunk[0..16]);
        let mut size = LittleEndian::read_u64(&chunk[16..24]);
        if size < CHUNK_HEADER_SIZE {
            return Err(Error::BadChunkLength {
                family: Family::Wave64,
            });
        }
        if size & 7 != 0 {
            // pad to 8-byte alignment
            size = size
                .checked_add(7)
                .ok_or(Error::BadChunkLength {
                    family: Family::Wave64,
                })?
                & !7u64;
        }

        let kind = classify(&guid);
        match kind {
            Wave64Chunk::Fmt => index.mark_format()?,
            Wave64Chunk::Data => index.mark_audio()?,
            Wave64Chunk::Other => {}
        }

        let preserved = match kind {
            Wave64Chunk::Data => CHUNK_HEADER_SIZE,
            _ => size,
        };
        index.append(offset, preserved)?;

        let skip = i64::try_from(size - CHUNK_HEADER_SIZE).map_err(|_| Error::BadChunkLength {
            family: Family::Wave64,
        })?;
        f.seek(SeekFrom::Current(skip))
            .map_err(|e| Error::seek(Side::Source, e))?;
    }

    let end = f.stream_position().map_err(|e| Error::seek(Side::Source, e))?;
    if eof_offset != end {
        return Err(Error::UnexpectedEof {
            family: Family::Wave64,
        });
    }
    index.finish()?;
    dprintln!("Wave64 parse: {} chunks indexed", index.ranges.len());
    Ok(())
}
