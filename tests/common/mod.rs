//! Test-only block storage backed by a real file, plus container builders.
//! The host file is a 4-byte magic followed by contiguous records, each a
//! 1-byte type code (high bit on the final record) and a 24-bit big-endian
//! payload length.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};

use chunkkeep::store::{BLOCK_HEADER_LEN, BLOCK_LAST_FLAG, MAX_BLOCK_PAYLOAD};
use chunkkeep::{BlockStorage, BlockType, Error, R, Side};

pub const STORE_MAGIC: &[u8; 4] = b"blk0";

fn io_read(e: std::io::Error) -> Error {
    Error::Read {
        side: Side::Destination,
        source: e,
    }
}

fn io_write(e: std::io::Error) -> Error {
    Error::Write {
        side: Side::Destination,
        source: e,
    }
}

fn io_seek(e: std::io::Error) -> Error {
    Error::Seek {
        side: Side::Destination,
        source: e,
    }
}

#[derive(Debug, Clone, Copy)]
struct Record {
    offset: u64,
    code: u8,
    length: u32,
}

pub struct FileBlocks {
    file: File,
    records: Vec<Record>,
    cursor: Option<usize>,
}

impl FileBlocks {
    pub fn create(path: &str) -> R<FileBlocks> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| Error::Open {
                side: Side::Destination,
                source: e,
            })?;
        file.write_all(STORE_MAGIC).map_err(io_write)?;
        Ok(FileBlocks {
            file,
            records: Vec::new(),
            cursor: None,
        })
    }

    pub fn open(path: &str) -> R<FileBlocks> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| Error::Open {
                side: Side::Destination,
                source: e,
            })?;
        let mut magic = [0u8; 4];
        file.read_exact(&mut magic).map_err(io_read)?;
        assert_eq!(&magic, STORE_MAGIC, "not a block storage file");
        let end = file.seek(SeekFrom::End(0)).map_err(io_seek)?;
        let mut records = Vec::new();
        let mut pos = STORE_MAGIC.len() as u64;
        while pos < end {
            file.seek(SeekFrom::Start(pos)).map_err(io_seek)?;
            let mut header = [0u8; BLOCK_HEADER_LEN as usize];
            file.read_exact(&mut header).map_err(io_read)?;
            let length = u32::from_be_bytes([0, header[1], header[2], header[3]]);
            records.push(Record {
                offset: pos,
                code: header[0],
                length,
            });
            pos += BLOCK_HEADER_LEN + length as u64;
        }
        Ok(FileBlocks {
            file,
            records,
            cursor: None,
        })
    }

    fn current(&self) -> Record {
        self.records[self.cursor.expect("cursor is before the first record")]
    }

    fn patch_code(&mut self, offset: u64, code: u8) -> R<()> {
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(io_seek)?;
        self.file.write_all(&[code]).map_err(io_write)
    }

    fn write_header(&mut self, code: u8, length: u32) -> R<()> {
        let bytes = length.to_be_bytes();
        self.file
            .write_all(&[code, bytes[1], bytes[2], bytes[3]])
            .map_err(io_write)
    }

    fn read_tail(&mut self, from: u64) -> R<Vec<u8>> {
        self.file
            .seek(SeekFrom::Start(from))
            .map_err(io_seek)?;
        let mut tail = Vec::new();
        self.file.read_to_end(&mut tail).map_err(io_read)?;
        Ok(tail)
    }
}

impl BlockStorage for FileBlocks {
    fn next(&mut self) -> R<bool> {
        let next = self.cursor.map_or(0, |i| i + 1);
        if next < self.records.len() {
            self.cursor = Some(next);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn block_type(&self) -> BlockType {
        BlockType::from_code(self.current().code)
    }

    fn block_length(&self) -> u32 {
        self.current().length
    }

    fn block_offset(&self) -> u64 {
        self.current().offset
    }

    fn is_last(&self) -> bool {
        self.current().code & BLOCK_LAST_FLAG != 0
    }

    fn read_raw(&mut self, buf: &mut [u8]) -> R<()> {
        let offset = self.current().offset + BLOCK_HEADER_LEN;
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(io_seek)?;
        self.file.read_exact(buf).map_err(io_read)
    }

    fn append(&mut self, block_type: BlockType, payload: &[u8]) -> R<()> {
        assert!(payload.len() as u32 <= MAX_BLOCK_PAYLOAD);
        if let Some(last) = self.records.last().copied() {
            self.patch_code(last.offset, last.code & !BLOCK_LAST_FLAG)?;
            self.records.last_mut().unwrap().code &= !BLOCK_LAST_FLAG;
        }
        let offset = self.file.seek(SeekFrom::End(0)).map_err(io_seek)?;
        let code = block_type.code() | BLOCK_LAST_FLAG;
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(io_seek)?;
        self.write_header(code, payload.len() as u32)?;
        self.file.write_all(payload).map_err(io_write)?;
        self.records.push(Record {
            offset,
            code,
            length: payload.len() as u32,
        });
        Ok(())
    }

    fn insert_after(&mut self, block_type: BlockType, payload: &[u8]) -> R<()> {
        assert!(payload.len() as u32 <= MAX_BLOCK_PAYLOAD);
        let i = self.cursor.expect("cursor is before the first record");
        let cur = self.records[i];
        let pos = cur.offset + BLOCK_HEADER_LEN + cur.length as u64;
        let tail = self.read_tail(pos)?;
        let was_last = cur.code & BLOCK_LAST_FLAG != 0;
        if was_last {
            self.records[i].code &= !BLOCK_LAST_FLAG;
            let code = self.records[i].code;
            self.patch_code(cur.offset, code)?;
        }
        let code = block_type.code() | if was_last { BLOCK_LAST_FLAG } else { 0 };
        self.file
            .seek(SeekFrom::Start(pos))
            .map_err(io_seek)?;
        self.write_header(code, payload.len() as u32)?;
        self.file.write_all(payload).map_err(io_write)?;
        self.file.write_all(&tail).map_err(io_write)?;
        let shift = BLOCK_HEADER_LEN + payload.len() as u64;
        for rec in &mut self.records[i + 1..] {
            rec.offset += shift;
        }
        self.records.insert(
            i + 1,
            Record {
                offset: pos,
                code,
                length: payload.len() as u32,
            },
        );
        Ok(())
    }

    fn delete(&mut self) -> R<()> {
        let i = self.cursor.expect("cursor is before the first record");
        let rec = self.records.remove(i);
        let tail = self.read_tail(rec.offset + BLOCK_HEADER_LEN + rec.length as u64)?;
        self.file
            .seek(SeekFrom::Start(rec.offset))
            .map_err(io_seek)?;
        self.file.write_all(&tail).map_err(io_write)?;
        self.file
            .set_len(rec.offset + tail.len() as u64)
            .map_err(io_write)?;
        for r in &mut self.records[i..] {
            r.offset -= BLOCK_HEADER_LEN + rec.length as u64;
        }
        if rec.code & BLOCK_LAST_FLAG != 0 {
            if let Some(last) = self.records.last().copied() {
                self.records.last_mut().unwrap().code |= BLOCK_LAST_FLAG;
                self.patch_code(last.offset, last.code | BLOCK_LAST_FLAG)?;
            }
        }
        self.cursor = if i == 0 { None } else { Some(i - 1) };
        Ok(())
    }
}

fn push_le_chunk(data: &mut Vec<u8>, tag: &[u8; 4], body: &[u8]) {
    data.extend_from_slice(tag);
    data.extend_from_slice(&(body.len() as u32).to_le_bytes());
    data.extend_from_slice(body);
    if body.len() % 2 == 1 {
        data.push(0);
    }
}

fn push_be_chunk(data: &mut Vec<u8>, tag: &[u8; 4], body: &[u8]) {
    data.extend_from_slice(tag);
    data.extend_from_slice(&(body.len() as u32).to_be_bytes());
    data.extend_from_slice(body);
    if body.len() % 2 == 1 {
        data.push(0);
    }
}

/// WAVE file with metadata on all three sides of the audio data:
/// a "JUNK" chunk (odd body, so padded) before "fmt ", a "LIST" chunk
/// between "fmt " and "data", and an "ID3 " chunk after "data".
///
/// Layout: header 0..12, JUNK 12..28, fmt 28..52, LIST 52..74,
/// data 74..182, ID3 182..200.
pub fn build_wav() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"RIFF");
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(b"WAVE");
    push_le_chunk(&mut data, b"JUNK", &[0x11; 7]);
    let mut fmt = Vec::new();
    fmt.extend_from_slice(&1u16.to_le_bytes()); // PCM
    fmt.extend_from_slice(&2u16.to_le_bytes()); // channels
    fmt.extend_from_slice(&44100u32.to_le_bytes());
    fmt.extend_from_slice(&176400u32.to_le_bytes());
    fmt.extend_from_slice(&4u16.to_le_bytes());
    fmt.extend_from_slice(&16u16.to_le_bytes());
    push_le_chunk(&mut data, b"fmt ", &fmt);
    push_le_chunk(&mut data, b"LIST", b"INFOIART\x02\0\0\0a\0");
    let pcm: Vec<u8> = (0u16..50).flat_map(|s| s.to_le_bytes()).collect();
    push_le_chunk(&mut data, b"data", &pcm);
    push_le_chunk(&mut data, b"ID3 ", &[0x33; 10]);
    let riff_size = (data.len() - 8) as u32;
    data[4..8].copy_from_slice(&riff_size.to_le_bytes());
    data
}

/// RF64 file whose 32-bit size fields hold the -1 placeholder, with the
/// real sizes in the mandatory "ds64" chunk and an "ID3 " chunk after the
/// audio data.
///
/// Layout: header 0..12, ds64 12..48, fmt 48..72, data 72..180,
/// ID3 180..198.
pub fn build_rf64() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"RF64");
    data.extend_from_slice(&u32::MAX.to_le_bytes());
    data.extend_from_slice(b"WAVE");
    let mut ds64 = Vec::new();
    ds64.extend_from_slice(&190u64.to_le_bytes()); // riff size
    ds64.extend_from_slice(&100u64.to_le_bytes()); // data size
    ds64.extend_from_slice(&25u64.to_le_bytes()); // sample count
    ds64.extend_from_slice(&0u32.to_le_bytes()); // size table entries
    push_le_chunk(&mut data, b"ds64", &ds64);
    let mut fmt = Vec::new();
    fmt.extend_from_slice(&1u16.to_le_bytes());
    fmt.extend_from_slice(&2u16.to_le_bytes());
    fmt.extend_from_slice(&44100u32.to_le_bytes());
    fmt.extend_from_slice(&176400u32.to_le_bytes());
    fmt.extend_from_slice(&4u16.to_le_bytes());
    fmt.extend_from_slice(&16u16.to_le_bytes());
    push_le_chunk(&mut data, b"fmt ", &fmt);
    data.extend_from_slice(b"data");
    data.extend_from_slice(&u32::MAX.to_le_bytes()); // placeholder, see ds64
    data.extend(std::iter::repeat(0x77u8).take(100));
    push_le_chunk(&mut data, b"ID3 ", &[0x33; 10]);
    data
}

/// AIFF-C file using the byte-swapped "sowt" compression type, with an
/// "ANNO" chunk before "COMM".
///
/// Layout: header 0..12, ANNO 12..30, COMM 30..76 (compression name at
/// 60..76), SSND 76..212.
pub fn build_aifc() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"FORM");
    data.extend_from_slice(&0u32.to_be_bytes());
    data.extend_from_slice(b"AIFC");
    push_be_chunk(&mut data, b"ANNO", &[0x22; 10]);
    let mut comm = Vec::new();
    comm.extend_from_slice(&2u16.to_be_bytes()); // channels
    comm.extend_from_slice(&30u32.to_be_bytes()); // frames
    comm.extend_from_slice(&16u16.to_be_bytes()); // sample size
    comm.extend_from_slice(&[0x40, 0x0E, 0xAC, 0x44, 0, 0, 0, 0, 0, 0]); // 44100.0
    comm.extend_from_slice(b"sowt");
    comm.push(14);
    comm.extend_from_slice(b"not compressed");
    comm.push(0); // pad the Pascal string to even length
    push_be_chunk(&mut data, b"COMM", &comm);
    let mut ssnd = Vec::new();
    ssnd.extend_from_slice(&0u32.to_be_bytes()); // offset
    ssnd.extend_from_slice(&0u32.to_be_bytes()); // blockSize
    ssnd.extend(std::iter::repeat(0x55u8).take(120));
    push_be_chunk(&mut data, b"SSND", &ssnd);
    let form_size = (data.len() - 8) as u32;
    data[4..8].copy_from_slice(&form_size.to_be_bytes());
    data
}

const W64_RIFF_GUID: [u8; 16] = [
    0x72, 0x69, 0x66, 0x66, 0x2E, 0x91, 0xCF, 0x11, 0xA5, 0xD6, 0x28, 0xDB, 0x04, 0xC1, 0x00, 0x00,
];
const W64_WAVE_GUID: [u8; 16] = [
    0x77, 0x61, 0x76, 0x65, 0xF3, 0xAC, 0xD3, 0x11, 0x8C, 0xD1, 0x00, 0xC0, 0x4F, 0x8E, 0xDB, 0x8A,
];

fn w64_guid(tag: &[u8; 4]) -> [u8; 16] {
    let mut guid = W64_WAVE_GUID;
    guid[0..4].copy_from_slice(tag);
    guid
}

fn push_w64_chunk(data: &mut Vec<u8>, tag: &[u8; 4], body: &[u8]) {
    data.extend_from_slice(&w64_guid(tag));
    data.extend_from_slice(&(24 + body.len() as u64).to_le_bytes());
    data.extend_from_slice(body);
    let tail = (24 + body.len()) % 8;
    if tail != 0 {
        data.extend(std::iter::repeat(0u8).take(8 - tail));
    }
}

/// Sony Wave64 file with an unknown "levl" chunk between "fmt " and "data"
/// and an "id3 " chunk at the end. Chunk sizes include the 24-byte chunk
/// header and round up to 8-byte alignment.
///
/// Layout: header 0..40, fmt 40..72, levl 72..112, data 112..216,
/// id3 216..256.
pub fn build_w64() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&W64_RIFF_GUID);
    data.extend_from_slice(&0u64.to_le_bytes());
    data.extend_from_slice(&W64_WAVE_GUID);
    push_w64_chunk(&mut data, b"fmt ", &[0x01, 0x00, 0x02, 0x00, 0x44, 0xAC, 0x00, 0x00]);
    push_w64_chunk(&mut data, b"levl", &[0x44; 10]);
    push_w64_chunk(&mut data, b"data", &[0x66; 80]);
    push_w64_chunk(&mut data, b"id3 ", &[0x33; 10]);
    let total = data.len() as u64;
    data[16..24].copy_from_slice(&total.to_le_bytes());
    data
}

/// Appends one correctly sized padding placeholder per indexed range, after
/// whatever records the store already holds.
pub fn reserve_placeholders(store: &mut FileBlocks, index: &chunkkeep::ChunkIndex) -> R<()> {
    for range in index.ranges() {
        store.append(BlockType::Padding, &vec![0u8; 4 + range.size as usize])?;
    }
    Ok(())
}
