use crate::formats::{read_chunk_header, read_fully};
use crate::prelude::*;

// Chunk Identifiers
const FORM_CHUNK_ID: &[u8; 4] = b"FORM";
const AIFF_FORMAT_ID: &[u8; 4] = b"AIFF";
const AIFC_FORMAT_ID: &[u8; 4] = b"AIFC";
const COMM_CHUNK_ID: &[u8; 4] = b"COMM";
const SSND_CHUNK_ID: &[u8; 4] = b"SSND";

// Chunk Structures
const HEADER_SIZE: usize = 12; // FORM + size + AIFF/AIFC
const CHUNK_HEADER_SIZE: u64 = 8; // tag + size

enum AiffChunk {
    Comm,
    Ssnd,
    Other,
}

fn classify(tag: &[u8; 4]) -> AiffChunk {
    match tag {
        COMM_CHUNK_ID => AiffChunk::Comm,
        SSND_CHUNK_ID => AiffChunk::Ssnd,
        _ => AiffChunk::Other,
    }
}

/// Walks an AIFF or AIFF-C file from its current position. The SSND range
/// keeps the chunk header, the offset/blockSize words and any alignment
/// bytes the offset field declares; the aligned sample data itself is left
/// to the codec.
pub(crate) fn read(index: &mut ChunkIndex, f: &mut (impl Read + Seek)) -> R<()> {
    let start = f.stream_position().map_err(|e| Error::seek(Side::Source, e))?;
    let mut header = [0u8; HEADER_SIZE];
    if !read_fully(f, &mut header, Side::Source)?
        || &header[0..4] != FORM_CHUNK_ID
        || (&header[8..12] != AIFF_FORMAT_ID && &header[8..12] != AIFC_FORMAT_ID)
    {
        return Err(Error::UnsupportedLayout {
            family: Family::Aiff,
        });
    }
    index.is_aifc = &header[8..12] == AIFC_FORMAT_ID;
    index.append(start, HEADER_SIZE as u64)?;
    let eof_offset = CHUNK_HEADER_SIZE + BigEndian::read_u32(&header[4..8]) as u64;

    loop {
        let offset = f.stream_position().map_err(|e| Error::seek(Side::Source, e))?;
        let mut chunk = [0u8; CHUNK_HEADER_SIZE as usize];
        if !read_chunk_header(f, &mut chunk, Side::Source)? {
            break;
        }
        let mut tag = [0u8; 4];
        tag.copy_from_slice(&chunk[0..4]);
        let mut size = BigEndian::read_u32(&chunk[4..8]) as u64;
        if size & 1 != 0 {
            size += 1; // pad byte
        }

        let kind = classify(&tag);
        match kind {
            AiffChunk::Comm => index.mark_format()?,
            AiffChunk::Ssnd => {
                index.mark_audio()?;
                // Peek the alignment offset field, then rewind so the skip
                // below stays uniform.
                let mut word = [0u8; 4];
                if !read_fully(f, &mut word, Side::Source)? {
                    return Err(Error::ShortRead { side: Side::Source });
                }
                index.ssnd_offset_size = BigEndian::read_u32(&word);
                f.seek(SeekFrom::Current(-4))
                    .map_err(|e| Error::seek(Side::Source, e))?;
            }
            AiffChunk::Other => {}
        }

        // The preserved SSND span is the header plus the offset/blockSize
        // words plus the alignment bytes before the PCM: the unaligned tail
        // of the chunk is not saved.
        let preserved = match kind {
            AiffChunk::Ssnd => CHUNK_HEADER_SIZE + 8 + index.ssnd_offset_size as u64,
            _ => CHUNK_HEADER_SIZE + size,
        };
        index.append(offset, preserved)?;

        f.seek(SeekFrom::Current(size as i64))
            .map_err(|e| Error::seek(Side::Source, e))?;
    }

    let end = f.stream_position().map_err(|e| Error::seek(Side::Source, e))?;
    if eof_offset != end {
        return Err(Error::UnexpectedEof {
            family: Family::Aiff,
        });
    }
    index.finish()?;
    dprintln!("AIFF parse: {} chunks indexed", index.ranges.len());
    Ok(())
}
