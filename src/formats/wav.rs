use crate::formats::{read_chunk_header, read_fully};
use crate::prelude::*;

// Chunk Identifiers
const RIFF_CHUNK_ID: &[u8; 4] = b"RIFF";
const RF64_CHUNK_ID: &[u8; 4] = b"RF64";
const WAVE_FORMAT_ID: &[u8; 4] = b"WAVE";
const FMT_CHUNK_ID: &[u8; 4] = b"fmt ";
const DATA_CHUNK_ID: &[u8; 4] = b"data";
const DS64_CHUNK_ID: &[u8; 4] = b"ds64";

// Chunk Structures
const HEADER_SIZE: usize = 12; // RIFF + size + WAVE
const CHUNK_HEADER_SIZE: u64 = 8; // tag + size
const DS64_BODY_SIZE: usize = 28; // riff/data/sample u64 sizes + table count
const RF64_SIZE_PLACEHOLDER: u32 = 0xFFFF_FFFF;

/// Chunk classification, decoded once per header.
enum WaveChunk {
    Fmt,
    Data,
    Ds64,
    Other,
}

fn classify(tag: &[u8; 4]) -> WaveChunk {
    match tag {
        FMT_CHUNK_ID => WaveChunk::Fmt,
        DATA_CHUNK_ID => WaveChunk::Data,
        DS64_CHUNK_ID => WaveChunk::Ds64,
        _ => WaveChunk::Other,
    }
}

/// Walks a RIFF/WAVE or RF64 file from its current position (normally 0),
/// appending one range per chunk. The audio "data" chunk contributes only
/// its 8-byte header; the sample payload is represented by the codec, not
/// preserved here.
pub(crate) fn read(index: &mut ChunkIndex, f: &mut (impl Read + Seek)) -> R<()> {
    let start = f.stream_position().map_err(|e| Error::seek(Side::Source, e))?;
    let mut header = [0u8; HEADER_SIZE];
    if !read_fully(f, &mut header, Side::Source)?
        || (&header[0..4] != RIFF_CHUNK_ID && &header[0..4] != RF64_CHUNK_ID)
        || &header[8..12] != WAVE_FORMAT_ID
    {
        return Err(Error::UnsupportedLayout {
            family: Family::Wave,
        });
    }
    index.is_rf64 = &header[0..4] == RF64_CHUNK_ID;
    index.append(start, HEADER_SIZE as u64)?;

    let riff_size = LittleEndian::read_u32(&header[4..8]);
    let mut eof_offset: Option<u64> = None;
    if !index.is_rf64 || riff_size != RF64_SIZE_PLACEHOLDER {
        let mut end = CHUNK_HEADER_SIZE + riff_size as u64;
        if end & 1 != 0 {
            end += 1; // fix odd RIFF size
        }
        eof_offset = Some(end);
    }

    // True 64-bit data size from the ds64 table, padded to even. Needed to
    // skip a "data" chunk whose 32-bit size field holds the placeholder.
    let mut ds64_data_size: Option<u64> = None;

    loop {
        let offset = f.stream_position().map_err(|e| Error::seek(Side::Source, e))?;
        let mut chunk = [0u8; CHUNK_HEADER_SIZE as usize];
        if !read_chunk_header(f, &mut chunk, Side::Source)? {
            break;
        }
        let mut tag = [0u8; 4];
        tag.copy_from_slice(&chunk[0..4]);
        let declared = LittleEndian::read_u32(&chunk[4..8]);
        let mut size = declared as u64;
        if size & 1 != 0 {
            size += 1; // pad byte
        }

        let kind = classify(&tag);
        match kind {
            WaveChunk::Fmt => index.mark_format()?,
            WaveChunk::Data => {
                index.mark_audio()?;
                if index.is_rf64 && index.ranges.len() < 2 {
                    return Err(Error::DataBeforeDs64);
                }
            }
            WaveChunk::Ds64 | WaveChunk::Other => {}
        }

        let preserved = match kind {
            WaveChunk::Data => CHUNK_HEADER_SIZE,
            _ => CHUNK_HEADER_SIZE + size,
        };
        index.append(offset, preserved)?;

        if index.is_rf64 && index.ranges.len() == 2 {
            // The chunk right after the header must be the ds64 size table.
            if !matches!(kind, WaveChunk::Ds64) {
                return Err(Error::Ds64Missing);
            }
            // Unpadded size: an extension table is rejected, not skipped.
            if (declared as usize) < DS64_BODY_SIZE {
                return Err(Error::Ds64Truncated);
            }
            if (declared as usize) > DS64_BODY_SIZE {
                return Err(Error::Ds64SizeTable);
            }
            let mut body = [0u8; DS64_BODY_SIZE];
            if !read_fully(f, &mut body, Side::Source)? {
                return Err(Error::ShortRead { side: Side::Source });
            }
            let riff_size64 = LittleEndian::read_u64(&body[0..8]);
            let mut data_size64 = LittleEndian::read_u64(&body[8..16]);
            if data_size64 == u64::MAX {
                return Err(Error::Ds64BadDataSize);
            }
            if data_size64 & 1 != 0 {
                data_size64 += 1;
            }
            // Sizes must stay seekable as signed 64-bit offsets.
            if data_size64 > i64::MAX as u64 {
                return Err(Error::Rf64TooLarge);
            }
            if LittleEndian::read_u32(&body[24..28]) != 0 {
                return Err(Error::Ds64SizeTable);
            }
            ds64_data_size = Some(data_size64);
            let end = riff_size64
                .checked_add(CHUNK_HEADER_SIZE)
                .filter(|end| *end <= i64::MAX as u64)
                .ok_or(Error::Rf64TooLarge)?;
            eof_offset = Some(end);
        } else if matches!(kind, WaveChunk::Data)
            && index.is_rf64
            && declared == RF64_SIZE_PLACEHOLDER
        {
            let skip = ds64_data_size.ok_or(Error::Ds64Missing)?;
            f.seek(SeekFrom::Current(skip as i64))
                .map_err(|e| Error::seek(Side::Source, e))?;
        } else {
            f.seek(SeekFrom::Current(size as i64))
                .map_err(|e| Error::seek(Side::Source, e))?;
        }
    }

    if index.is_rf64 && eof_offset.is_none() {
        return Err(Error::Rf64NoSize);
    }
    let end = f.stream_position().map_err(|e| Error::seek(Side::Source, e))?;
    if eof_offset != Some(end) {
        return Err(Error::UnexpectedEof {
            family: Family::Wave,
        });
    }
    index.finish()?;
    dprintln!("WAVE parse: {} chunks indexed", index.ranges.len());
    Ok(())
}
