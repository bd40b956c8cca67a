use std::fs::{File, OpenOptions};

use crate::copy::copy_data;
use crate::prelude::*;
use crate::store::{
    BlockStorage, BlockType, BLOCK_HEADER_LEN, BLOCK_ID_LEN, BLOCK_LAST_FLAG,
    BLOCK_TYPE_APPLICATION,
};

impl ChunkIndex {
    /// Copies every indexed range of `src` into the compressed container,
    /// overwriting one pre-sized padding record per range. The caller must
    /// have reserved, in order, a padding record of payload length
    /// `4 + range.size` for each range; anything else is a placeholder
    /// mismatch.
    ///
    /// Records are rewritten through `host` directly: the type byte flips
    /// from padding to application, the length field is already correct, and
    /// the payload becomes the family id followed by the raw chunk bytes.
    pub fn embed(
        &self,
        src: &mut (impl Read + Seek),
        store: &mut dyn BlockStorage,
        host: &mut (impl Read + Write + Seek),
    ) -> R<()> {
        for range in &self.ranges {
            loop {
                if !store.next()? {
                    return Err(Error::PlaceholderMissing);
                }
                if store.block_type() == BlockType::Padding {
                    break;
                }
            }
            let expected = BLOCK_ID_LEN + range.size;
            if store.block_length() != expected {
                return Err(Error::PlaceholderSize {
                    expected,
                    found: store.block_length(),
                });
            }

            src.seek(SeekFrom::Start(range.offset))
                .map_err(|e| Error::seek(Side::Source, e))?;
            host.seek(SeekFrom::Start(store.block_offset()))
                .map_err(|e| Error::seek(Side::Destination, e))?;

            let mut code = BLOCK_TYPE_APPLICATION;
            if store.is_last() {
                code |= BLOCK_LAST_FLAG;
            }
            host.write_u8(code).map_err(|e| Error::write(Side::Destination, e))?;
            // The 24-bit length already matches; leave it untouched.
            host.seek(SeekFrom::Current(BLOCK_HEADER_LEN as i64 - 1))
                .map_err(|e| Error::seek(Side::Destination, e))?;
            host.write_all(self.family.application_id())
                .map_err(|e| Error::write(Side::Destination, e))?;
            copy_data(src, host, range.size as u64, Side::Source, Side::Destination)?;
            dprintln!(
                "embedded {} bytes from offset {}",
                range.size,
                range.offset
            );
        }
        Ok(())
    }

    pub fn embed_file(
        &self,
        src_path: &str,
        host_path: &str,
        store: &mut dyn BlockStorage,
    ) -> R<()> {
        let mut src = File::open(src_path).map_err(|e| Error::open(Side::Source, e))?;
        let mut host = OpenOptions::new()
            .read(true)
            .write(true)
            .open(host_path)
            .map_err(|e| Error::open(Side::Destination, e))?;
        self.embed(&mut src, store, &mut host)
    }
}
