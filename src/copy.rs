use crate::prelude::*;

const SLAB: usize = 4096;

/// Streams `size` bytes from `fin` to `fout` in fixed slabs. Failures name
/// the side they happened on; a short read surfaces as `short-read` on the
/// reading side.
pub(crate) fn copy_data(
    fin: &mut impl Read,
    fout: &mut impl Write,
    size: u64,
    read_side: Side,
    write_side: Side,
) -> R<()> {
    let mut buffer = [0u8; SLAB];
    let mut left = size;
    while left > 0 {
        let need = left.min(SLAB as u64) as usize;
        fin.read_exact(&mut buffer[..need])
            .map_err(|e| Error::read(read_side, e))?;
        fout.write_all(&buffer[..need])
            .map_err(|e| Error::write(write_side, e))?;
        left -= need as u64;
    }
    Ok(())
}

/// Compares `size` bytes from two readers. `Ok(true)` means the spans are
/// identical; `Ok(false)` is a content mismatch, which the caller maps to a
/// verification error of its choosing.
pub(crate) fn compare_data(
    fin: &mut impl Read,
    fout: &mut impl Read,
    size: u64,
    in_side: Side,
    out_side: Side,
) -> R<bool> {
    let mut a = [0u8; SLAB];
    let mut b = [0u8; SLAB];
    let mut left = size;
    while left > 0 {
        let need = left.min(SLAB as u64) as usize;
        fin.read_exact(&mut a[..need])
            .map_err(|e| Error::read(in_side, e))?;
        fout.read_exact(&mut b[..need])
            .map_err(|e| Error::read(out_side, e))?;
        if a[..need] != b[..need] {
            return Ok(false);
        }
        left -= need as u64;
    }
    Ok(true)
}
