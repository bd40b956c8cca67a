use std::fs::File;

use memmap2::MmapOptions;

use crate::prelude::*;

pub(crate) mod aif;
pub(crate) mod w64;
pub(crate) mod wav;

/// Classifies a container from its leading bytes.
pub fn detect_family(data: &[u8]) -> R<Family> {
    if data.len() >= 12
        && (&data[0..4] == b"RIFF" || &data[0..4] == b"RF64")
        && &data[8..12] == b"WAVE"
    {
        return Ok(Family::Wave);
    }
    if data.len() >= 12 && &data[0..4] == b"FORM" && (&data[8..12] == b"AIFF" || &data[8..12] == b"AIFC")
    {
        return Ok(Family::Aiff);
    }
    if data.len() >= 16 && data[0..16] == w64::RIFF_GUID {
        return Ok(Family::Wave64);
    }
    Err(Error::UnknownContainer)
}

/// Maps a file and classifies it without walking any chunks.
pub fn sniff_file(path: &str) -> R<Family> {
    let file = File::open(path).map_err(|e| Error::open(Side::Source, e))?;
    let mapped = unsafe { MmapOptions::new().map(&file) }.map_err(|e| Error::read(Side::Source, e))?;
    detect_family(&mapped)
}

impl ChunkIndex {
    /// Walks a RIFF/WAVE (or RF64) container positioned at its start.
    pub fn read_wave(f: &mut (impl Read + Seek)) -> R<ChunkIndex> {
        let mut index = ChunkIndex::new(Family::Wave);
        wav::read(&mut index, f)?;
        Ok(index)
    }

    /// Walks an AIFF or AIFF-C container positioned at its start.
    pub fn read_aiff(f: &mut (impl Read + Seek)) -> R<ChunkIndex> {
        let mut index = ChunkIndex::new(Family::Aiff);
        aif::read(&mut index, f)?;
        Ok(index)
    }

    /// Walks a Sony Wave64 container positioned at its start.
    pub fn read_wave64(f: &mut (impl Read + Seek)) -> R<ChunkIndex> {
        let mut index = ChunkIndex::new(Family::Wave64);
        w64::read(&mut index, f)?;
        Ok(index)
    }

    pub fn read_wave_file(path: &str) -> R<ChunkIndex> {
        let mut f = File::open(path).map_err(|e| Error::open(Side::Source, e))?;
        Self::read_wave(&mut f)
    }

    pub fn read_aiff_file(path: &str) -> R<ChunkIndex> {
        let mut f = File::open(path).map_err(|e| Error::open(Side::Source, e))?;
        Self::read_aiff(&mut f)
    }

    pub fn read_wave64_file(path: &str) -> R<ChunkIndex> {
        let mut f = File::open(path).map_err(|e| Error::open(Side::Source, e))?;
        Self::read_wave64(&mut f)
    }

    /// Sniffs the family from the file's signature, then parses it.
    pub fn read_file(path: &str) -> R<ChunkIndex> {
        match sniff_file(path)? {
            Family::Wave => Self::read_wave_file(path),
            Family::Wave64 => Self::read_wave64_file(path),
            Family::Aiff => Self::read_aiff_file(path),
        }
    }
}

/// Fills `buf` with the next chunk header. `Ok(false)` means end-of-file
/// landed exactly on a chunk boundary, which terminates the walk; a short
/// nonzero read means the file is truncated mid-header and is fatal.
pub(crate) fn read_chunk_header(f: &mut impl Read, buf: &mut [u8], side: Side) -> R<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = f.read(&mut buf[filled..]).map_err(|e| Error::read(side, e))?;
        if n == 0 {
            if filled == 0 {
                return Ok(false);
            }
            return Err(Error::ShortRead { side });
        }
        filled += n;
    }
    Ok(true)
}

/// Fills `buf` completely, reporting `Ok(false)` on any short read. Used for
/// signatures and fixed tables where partial data is never meaningful.
pub(crate) fn read_fully(f: &mut impl Read, buf: &mut [u8], side: Side) -> R<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = f.read(&mut buf[filled..]).map_err(|e| Error::read(side, e))?;
        if n == 0 {
            return Ok(false);
        }
        filled += n;
    }
    Ok(true)
}
