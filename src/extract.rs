use std::fs::File;

use crate::formats::read_fully;
use crate::prelude::*;
use crate::store::{BlockStorage, BlockType, BLOCK_HEADER_LEN, BLOCK_ID_LEN};

impl ChunkIndex {
    /// Rebuilds a chunk index from the application records of a compressed
    /// container. The first recognized record decides the family; later
    /// records with a different application id belong to someone else and
    /// are skipped.
    ///
    /// Offsets in the returned index point into `host` at the chunk content
    /// itself, past each record's header and family id, so the restore and
    /// verify passes can read straight from the compressed file.
    pub fn read_from_store(
        store: &mut dyn BlockStorage,
        host: &mut (impl Read + Seek),
    ) -> R<ChunkIndex> {
        let mut found: Option<ChunkIndex> = None;
        let mut ds64_found = false;
        while store.next()? {
            if store.block_type() != BlockType::Application {
                continue;
            }
            if store.block_length() < BLOCK_ID_LEN {
                continue; // too short to carry a family id
            }
            let mut id = [0u8; 4];
            store.read_raw(&mut id)?;
            match found.as_mut() {
                None => {
                    let family =
                        Family::from_application_id(&id).ok_or(Error::UnknownFamily { id })?;
                    let mut index = ChunkIndex::new(family);
                    index_block(
                        &mut index,
                        host,
                        store.block_offset(),
                        store.block_length(),
                        &mut ds64_found,
                    )?;
                    found = Some(index);
                }
                Some(index) => {
                    if &id != index.family.application_id() {
                        continue; // an unrelated application record
                    }
                    index_block(
                        index,
                        host,
                        store.block_offset(),
                        store.block_length(),
                        &mut ds64_found,
                    )?;
                }
            }
        }
        let index = found.ok_or(Error::NoForeignMetadata)?;
        if index.is_rf64 && !ds64_found {
            return Err(Error::Ds64Missing);
        }
        index.finish()?;
        dprintln!(
            "recovered {} index: {} chunks",
            index.family,
            index.ranges.len()
        );
        Ok(index)
    }

    pub fn read_store_file(path: &str, store: &mut dyn BlockStorage) -> R<ChunkIndex> {
        let mut host = File::open(path).map_err(|e| Error::open(Side::Source, e))?;
        Self::read_from_store(store, &mut host)
    }
}

fn peek(host: &mut (impl Read + Seek), buf: &mut [u8]) -> R<()> {
    if !read_fully(host, buf, Side::Source)? {
        return Err(Error::ShortRead { side: Side::Source });
    }
    Ok(())
}

/// Classifies one application record by the chunk tag its payload carries and
/// appends its content span to the index.
fn index_block(
    index: &mut ChunkIndex,
    host: &mut (impl Read + Seek),
    offset: u64,
    length: u32,
    ds64_found: &mut bool,
) -> R<()> {
    let content = offset + BLOCK_HEADER_LEN + BLOCK_ID_LEN as u64;
    host.seek(SeekFrom::Start(content))
        .map_err(|e| Error::seek(Side::Source, e))?;
    let mut tag = [0u8; 4];
    peek(host, &mut tag)?;

    if index.ranges.is_empty() {
        // First record holds the container's main header.
        match index.family {
            Family::Wave => {
                if &tag == b"RF64" {
                    index.is_rf64 = true;
                } else if &tag != b"RIFF" {
                    return Err(Error::UnsupportedLayout {
                        family: Family::Wave,
                    });
                }
            }
            Family::Wave64 => {
                if &tag != b"riff" {
                    return Err(Error::UnsupportedLayout {
                        family: Family::Wave64,
                    });
                }
            }
            Family::Aiff => {
                if &tag != b"FORM" {
                    return Err(Error::UnsupportedLayout {
                        family: Family::Aiff,
                    });
                }
                let mut rest = [0u8; 8];
                peek(host, &mut rest)?;
                index.is_aifc = &rest[4..8] == b"AIFC";
            }
        }
    } else {
        match index.family {
            Family::Wave => match &tag {
                b"fmt " => {
                    index.mark_format()?;
                    let mut rest = [0u8; 8];
                    peek(host, &mut rest)?;
                    // Format code 0xFFFE, little-endian.
                    index.is_wave_format_extensible = rest[4..6] == [0xFE, 0xFF];
                }
                b"data" => index.mark_audio()?,
                _ => {
                    if index.is_rf64 && index.ranges.len() == 1 {
                        if &tag != b"ds64" {
                            return Err(Error::Ds64Missing);
                        }
                        *ds64_found = true;
                    }
                }
            },
            Family::Wave64 => {
                // Wave64 chunk GUIDs keep the tag in their first 4 bytes.
                match &tag {
                    b"fmt " => index.mark_format()?,
                    b"data" => index.mark_audio()?,
                    _ => {}
                }
            }
            Family::Aiff => match &tag {
                b"COMM" => {
                    index.mark_format()?;
                    if index.is_aifc {
                        let mut rest = [0u8; 26];
                        peek(host, &mut rest)?;
                        index.is_sowt = &rest[22..26] == b"sowt";
                        index.aifc_comm_length = length;
                    }
                }
                b"SSND" => {
                    index.mark_audio()?;
                    let mut rest = [0u8; 8];
                    peek(host, &mut rest)?;
                    index.ssnd_offset_size = BigEndian::read_u32(&rest[4..8]);
                }
                _ => {}
            },
        }
    }

    let payload = length.checked_sub(BLOCK_ID_LEN).ok_or(Error::BadChunkLength {
        family: index.family,
    })?;
    index.append(content, payload as u64)
}
