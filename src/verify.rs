use std::fs::File;

use crate::copy::compare_data;
use crate::prelude::*;

impl ChunkIndex {
    /// Checks a restored container against the chunks stored in `host`.
    /// `dest` is read sequentially from its start through the audio chunk
    /// header, then from `after_audio` for the trailing chunks, so the check
    /// also catches chunks written at the wrong place.
    ///
    /// The first mismatching range decides the error: the main header, the
    /// format chunk and the audio chunk header each get their own failure
    /// class, anything else is a generic restore mismatch.
    pub fn verify(
        &self,
        host: &mut (impl Read + Seek),
        dest: &mut (impl Read + Seek),
        after_audio: u64,
    ) -> R<()> {
        let audio = self.audio_chunk.ok_or(Error::MissingAudioChunk {
            family: self.family,
        })?;

        for (i, range) in self.ranges[..=audio].iter().enumerate() {
            if !compare_range(host, dest, range)? {
                return Err(if i == 0 {
                    Error::VerifyTotalSize
                } else if Some(i) == self.format_chunk {
                    Error::VerifyFormatChunk
                } else if i == audio {
                    Error::VerifyAudioLength
                } else {
                    Error::VerifyFailed
                });
            }
        }

        dest.seek(SeekFrom::Start(after_audio))
            .map_err(|e| Error::seek(Side::Destination, e))?;
        for range in &self.ranges[audio + 1..] {
            if !compare_range(host, dest, range)? {
                return Err(Error::VerifyFailed);
            }
        }
        Ok(())
    }

    pub fn verify_file(&self, host_path: &str, dest_path: &str, after_audio: u64) -> R<()> {
        let mut host = File::open(host_path).map_err(|e| Error::open(Side::Source, e))?;
        let mut dest = File::open(dest_path).map_err(|e| Error::open(Side::Destination, e))?;
        self.verify(&mut host, &mut dest, after_audio)
    }
}

fn compare_range(
    host: &mut (impl Read + Seek),
    dest: &mut impl Read,
    range: &ChunkRange,
) -> R<bool> {
    host.seek(SeekFrom::Start(range.offset))
        .map_err(|e| Error::seek(Side::Source, e))?;
    compare_data(host, dest, range.size as u64, Side::Source, Side::Destination)
}
