use std::fmt;
use std::io;

use thiserror::Error;

use crate::index::Family;

/// Which file an I/O or comparison failure is local to. Every operation has
/// one container it reads from and one it writes to (or compares against);
/// errors always name the failing side so the caller knows which file to
/// discard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Destination,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Source => "source container",
            Side::Destination => "destination container",
        })
    }
}

/// Closed error taxonomy of the preservation engine. The first failure aborts
/// the running operation; nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("can't open {side}: {source}")]
    Open {
        side: Side,
        #[source]
        source: io::Error,
    },

    #[error("read failed in {side}: {source}")]
    Read {
        side: Side,
        #[source]
        source: io::Error,
    },

    #[error("write failed in {side}: {source}")]
    Write {
        side: Side,
        #[source]
        source: io::Error,
    },

    #[error("seek failed in {side}: {source}")]
    Seek {
        side: Side,
        #[source]
        source: io::Error,
    },

    #[error("short read in {side}")]
    ShortRead { side: Side },

    #[error("unsupported {} layout", .family.layout_name())]
    UnsupportedLayout { family: Family },

    #[error("file is not a recognized RIFF, AIFF or Wave64 container")]
    UnknownContainer,

    #[error("invalid {family} file: multiple \"{}\" chunks", .family.format_tag())]
    DuplicateFormatChunk { family: Family },

    #[error("invalid {family} file: multiple \"{}\" chunks", .family.audio_tag())]
    DuplicateAudioChunk { family: Family },

    #[error("invalid {family} file: \"{}\" chunk before \"{}\" chunk", .family.audio_tag(), .family.format_tag())]
    AudioBeforeFormat { family: Family },

    #[error("invalid {family} file: missing \"{}\" chunk", .family.format_tag())]
    MissingFormatChunk { family: Family },

    #[error("invalid {family} file: missing \"{}\" chunk", .family.audio_tag())]
    MissingAudioChunk { family: Family },

    #[error("invalid {family} file: unexpected EOF")]
    UnexpectedEof { family: Family },

    #[error("invalid {family} file: chunk length invalid")]
    BadChunkLength { family: Family },

    #[error("foreign metadata chunk is too large to preserve ({size} bytes, max is just under 16MiB)")]
    ChunkTooLarge { size: u64 },

    #[error("invalid RF64 file: \"ds64\" chunk does not immediately follow \"WAVE\" marker")]
    Ds64Missing,

    #[error("invalid RF64 file: \"ds64\" chunk size is < 28")]
    Ds64Truncated,

    #[error("RF64 file has \"ds64\" chunk with extra size table, which is not supported")]
    Ds64SizeTable,

    #[error("RF64 file has \"ds64\" chunk with data size == -1")]
    Ds64BadDataSize,

    #[error("invalid RF64 file: \"data\" chunk before \"ds64\" chunk")]
    DataBeforeDs64,

    #[error("invalid RF64 file: all RIFF sizes are -1")]
    Rf64NoSize,

    #[error("RF64 file too large")]
    Rf64TooLarge,

    #[error("unsupported foreign metadata id {id:?} found, may need a newer decoder")]
    UnknownFamily { id: [u8; 4] },

    #[error("no foreign metadata records found in block storage")]
    NoForeignMetadata,

    #[error("no matching padding record found")]
    PlaceholderMissing,

    #[error("padding record with wrong size found (expected {expected}, found {found})")]
    PlaceholderSize { expected: u32, found: u32 },

    #[error("stored main chunk length differs from written length")]
    VerifyTotalSize,

    #[error("stored format chunk differs from written chunk; the file may have been restored to a different format than the original")]
    VerifyFormatChunk,

    #[error("stored audio length differs from written length; the file may have changed in length after being originally encoded")]
    VerifyAudioLength,

    #[error("restore of foreign metadata failed")]
    VerifyFailed,

    #[error("out of memory growing chunk index")]
    Alloc,
}

impl Error {
    pub(crate) fn open(side: Side, source: io::Error) -> Self {
        Error::Open { side, source }
    }

    /// An `UnexpectedEof` from `read_exact` is a short read in the taxonomy,
    /// not a generic I/O failure.
    pub(crate) fn read(side: Side, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::UnexpectedEof {
            Error::ShortRead { side }
        } else {
            Error::Read { side, source }
        }
    }

    pub(crate) fn write(side: Side, source: io::Error) -> Self {
        Error::Write { side, source }
    }

    pub(crate) fn seek(side: Side, source: io::Error) -> Self {
        Error::Seek { side, source }
    }

    /// Short stable identifier for each failure class, independent of the
    /// human-readable message.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Open { .. } => "open",
            Error::Read { .. } => "read",
            Error::Write { .. } => "write",
            Error::Seek { .. } => "seek",
            Error::ShortRead { .. } => "short-read",
            Error::UnsupportedLayout { .. } => "unsupported-layout",
            Error::UnknownContainer => "unknown-container",
            Error::DuplicateFormatChunk { .. } => "dup-format",
            Error::DuplicateAudioChunk { .. } => "dup-audio",
            Error::AudioBeforeFormat { .. } => "audio-before-format",
            Error::MissingFormatChunk { .. } => "missing-format",
            Error::MissingAudioChunk { .. } => "missing-audio",
            Error::UnexpectedEof { .. } => "eof-mismatch",
            Error::BadChunkLength { .. } => "bad-chunk-length",
            Error::ChunkTooLarge { .. } => "chunk-too-large",
            Error::Ds64Missing => "ds64-missing",
            Error::Ds64Truncated => "ds64-truncated",
            Error::Ds64SizeTable => "ds64-size-table",
            Error::Ds64BadDataSize => "ds64-bad-size",
            Error::DataBeforeDs64 => "data-before-ds64",
            Error::Rf64NoSize => "rf64-no-size",
            Error::Rf64TooLarge => "rf64-too-large",
            Error::UnknownFamily { .. } => "unknown-family",
            Error::NoForeignMetadata => "no-foreign",
            Error::PlaceholderMissing => "pad-missing",
            Error::PlaceholderSize { .. } => "pad-size",
            Error::VerifyTotalSize => "verify-main",
            Error::VerifyFormatChunk => "verify-format",
            Error::VerifyAudioLength => "verify-audio",
            Error::VerifyFailed => "verify",
            Error::Alloc => "alloc",
        }
    }
}
