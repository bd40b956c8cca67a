use std::fs::{File, OpenOptions};

use crate::copy::copy_data;
use crate::prelude::*;
use crate::store::BLOCK_ID_LEN;

/// Byte offset of the compression-name field inside an AIFF-C "COMM" chunk:
/// tag, size, the fixed sample-description fields and the compression type.
const AIFC_NAME_OFFSET: u64 = 30;

/// Where the decoder left gaps in the freshly written container. The decoder
/// writes its own main header, format chunk and audio chunk; restoration
/// fills the spans between them.
#[derive(Debug, Clone, Copy)]
pub struct RestoreOffsets {
    /// End of the main header, where the chunks before the format chunk go.
    pub before_format: u64,
    /// End of the decoder's format chunk.
    pub after_format: u64,
    /// End of the decoder's audio chunk.
    pub after_audio: u64,
}

impl ChunkIndex {
    /// Writes the preserved chunks back around the decoder's output. `host`
    /// is the compressed container the index was extracted from; `dest` is
    /// the container being rebuilt.
    ///
    /// The main header is never rewritten (nor the ds64 chunk of an RF64
    /// file); the decoder owns those. For AIFF-C the decoder emits a fresh
    /// "COMM" chunk, so only its stored compression-name tail is spliced
    /// over the decoder's.
    pub fn restore(
        &self,
        host: &mut (impl Read + Seek),
        dest: &mut (impl Write + Seek),
        offsets: RestoreOffsets,
    ) -> R<()> {
        let format = self.format_chunk.ok_or(Error::MissingFormatChunk {
            family: self.family,
        })?;
        let audio = self.audio_chunk.ok_or(Error::MissingAudioChunk {
            family: self.family,
        })?;

        dest.seek(SeekFrom::Start(offsets.before_format))
            .map_err(|e| Error::seek(Side::Destination, e))?;
        let first = if self.is_rf64 { 2 } else { 1 };
        for range in &self.ranges[first..format] {
            copy_range(host, dest, range)?;
        }

        if self.is_aifc {
            let comm = &self.ranges[format];
            dest.seek(SeekFrom::Current(AIFC_NAME_OFFSET as i64))
                .map_err(|e| Error::seek(Side::Destination, e))?;
            host.seek(SeekFrom::Start(comm.offset + AIFC_NAME_OFFSET))
                .map_err(|e| Error::seek(Side::Source, e))?;
            let name_len =
                self.aifc_comm_length as u64 - BLOCK_ID_LEN as u64 - AIFC_NAME_OFFSET;
            copy_data(host, dest, name_len, Side::Source, Side::Destination)?;
        }

        dest.seek(SeekFrom::Start(offsets.after_format))
            .map_err(|e| Error::seek(Side::Destination, e))?;
        for range in &self.ranges[format + 1..audio] {
            copy_range(host, dest, range)?;
        }

        dest.seek(SeekFrom::Start(offsets.after_audio))
            .map_err(|e| Error::seek(Side::Destination, e))?;
        for range in &self.ranges[audio + 1..] {
            copy_range(host, dest, range)?;
        }
        dprintln!("restored {} chunks", self.ranges.len());
        Ok(())
    }

    pub fn restore_file(
        &self,
        host_path: &str,
        dest_path: &str,
        offsets: RestoreOffsets,
    ) -> R<()> {
        let mut host = File::open(host_path).map_err(|e| Error::open(Side::Source, e))?;
        let mut dest = OpenOptions::new()
            .read(true)
            .write(true)
            .open(dest_path)
            .map_err(|e| Error::open(Side::Destination, e))?;
        self.restore(&mut host, &mut dest, offsets)
    }
}

fn copy_range(
    host: &mut (impl Read + Seek),
    dest: &mut impl Write,
    range: &ChunkRange,
) -> R<()> {
    host.seek(SeekFrom::Start(range.offset))
        .map_err(|e| Error::seek(Side::Source, e))?;
    copy_data(host, dest, range.size as u64, Side::Source, Side::Destination)
}
