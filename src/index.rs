use std::fmt;

use crate::prelude::*;
use crate::store::BLOCK_ID_LEN;

/// Largest chunk that fits an application record: the record length field is
/// 24 bits and the family id occupies the first 4 payload bytes.
pub(crate) const MAX_CHUNK_SIZE: u64 = (1 << 24) - BLOCK_ID_LEN as u64;

/// The three recognized container families. RF64 is a variant of the RIFF
/// family, AIFF-C a variant of AIFF; both are tracked with flags on the
/// [`ChunkIndex`] rather than as families of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Wave,
    Wave64,
    Aiff,
}

/// Family identifiers written into application records, in the order the
/// family enum declares them.
const APPLICATION_IDS: [(&[u8; 4], Family); 3] = [
    (b"riff", Family::Wave),
    (b"w64 ", Family::Wave64),
    (b"aiff", Family::Aiff),
];

impl Family {
    /// 4-byte identifier tagging this family's records in block storage.
    pub const fn application_id(self) -> &'static [u8; 4] {
        match self {
            Family::Wave => b"riff",
            Family::Wave64 => b"w64 ",
            Family::Aiff => b"aiff",
        }
    }

    pub fn from_application_id(id: &[u8; 4]) -> Option<Family> {
        APPLICATION_IDS
            .iter()
            .find(|(known, _)| *known == id)
            .map(|(_, family)| *family)
    }

    pub(crate) const fn format_tag(self) -> &'static str {
        match self {
            Family::Wave | Family::Wave64 => "fmt ",
            Family::Aiff => "COMM",
        }
    }

    pub(crate) const fn audio_tag(self) -> &'static str {
        match self {
            Family::Wave | Family::Wave64 => "data",
            Family::Aiff => "SSND",
        }
    }

    pub(crate) const fn layout_name(self) -> &'static str {
        match self {
            Family::Wave => "RIFF",
            Family::Wave64 => "Wave64",
            Family::Aiff => "FORM",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Family::Wave => "WAVE",
            Family::Wave64 => "Wave64",
            Family::Aiff => "AIFF",
        })
    }
}

/// One preserved byte span of the original container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    /// Byte offset of the chunk in its host file. During parsing this is an
    /// offset into the original container; after extraction it is an offset
    /// into the compressed container's block payloads.
    pub offset: u64,
    /// Preserved byte count. For the audio chunk this covers only the chunk
    /// header, never the bulk sample payload.
    pub size: u32,
}

/// Ordered index of the byte ranges to preserve from one container file,
/// with the format and audio chunks singled out and the family quirks that
/// restoration needs. Built monotonically by a parser or the extractor and
/// read-only afterwards.
#[derive(Debug)]
pub struct ChunkIndex {
    pub(crate) family: Family,
    pub(crate) ranges: Vec<ChunkRange>,
    pub(crate) format_chunk: Option<usize>,
    pub(crate) audio_chunk: Option<usize>,
    pub(crate) is_rf64: bool,
    pub(crate) is_aifc: bool,
    pub(crate) is_sowt: bool,
    pub(crate) is_wave_format_extensible: bool,
    /// Stored payload length of the AIFF-C "COMM" record, family id
    /// included. Needed to locate the compression-name field on restore.
    pub(crate) aifc_comm_length: u32,
    /// Alignment byte count from the SSND chunk's offset field.
    pub(crate) ssnd_offset_size: u32,
}

impl ChunkIndex {
    pub(crate) fn new(family: Family) -> Self {
        ChunkIndex {
            family,
            ranges: Vec::new(),
            format_chunk: None,
            audio_chunk: None,
            is_rf64: false,
            is_aifc: false,
            is_sowt: false,
            is_wave_format_extensible: false,
            aifc_comm_length: 0,
            ssnd_offset_size: 0,
        }
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn ranges(&self) -> &[ChunkRange] {
        &self.ranges
    }

    pub fn format_chunk(&self) -> Option<usize> {
        self.format_chunk
    }

    pub fn audio_chunk(&self) -> Option<usize> {
        self.audio_chunk
    }

    pub fn is_rf64(&self) -> bool {
        self.is_rf64
    }

    pub fn is_aifc(&self) -> bool {
        self.is_aifc
    }

    pub fn is_sowt(&self) -> bool {
        self.is_sowt
    }

    pub fn is_wave_format_extensible(&self) -> bool {
        self.is_wave_format_extensible
    }

    pub fn ssnd_offset_size(&self) -> u32 {
        self.ssnd_offset_size
    }

    /// Appends a preserved range, enforcing the embeddable size ceiling.
    pub(crate) fn append(&mut self, offset: u64, size: u64) -> R<()> {
        if size >= MAX_CHUNK_SIZE {
            return Err(Error::ChunkTooLarge { size });
        }
        self.ranges.try_reserve(1).map_err(|_| Error::Alloc)?;
        self.ranges.push(ChunkRange {
            offset,
            size: size as u32,
        });
        Ok(())
    }

    /// Marks the next appended range as the format chunk. Call before the
    /// matching `append`.
    pub(crate) fn mark_format(&mut self) -> R<()> {
        if self.format_chunk.is_some() {
            return Err(Error::DuplicateFormatChunk {
                family: self.family,
            });
        }
        if self.audio_chunk.is_some() {
            return Err(Error::AudioBeforeFormat {
                family: self.family,
            });
        }
        self.format_chunk = Some(self.ranges.len());
        Ok(())
    }

    /// Marks the next appended range as the audio chunk. The format chunk
    /// must already be marked.
    pub(crate) fn mark_audio(&mut self) -> R<()> {
        if self.audio_chunk.is_some() {
            return Err(Error::DuplicateAudioChunk {
                family: self.family,
            });
        }
        if self.format_chunk.is_none() {
            return Err(Error::AudioBeforeFormat {
                family: self.family,
            });
        }
        self.audio_chunk = Some(self.ranges.len());
        Ok(())
    }

    /// Final structural check once a walk is complete.
    pub(crate) fn finish(&self) -> R<()> {
        if self.format_chunk.is_none() {
            return Err(Error::MissingFormatChunk {
                family: self.family,
            });
        }
        if self.audio_chunk.is_none() {
            return Err(Error::MissingAudioChunk {
                family: self.family,
            });
        }
        Ok(())
    }
}
