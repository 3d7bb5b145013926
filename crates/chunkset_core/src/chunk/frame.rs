//! Element frame encoding.

use crate::error::{CoreError, CoreResult};
use bytes::{Buf, BufMut};

/// Frame header: payload length (4 bytes, little endian).
pub(crate) const HEADER_SIZE: usize = 4;

/// Frame trailer: CRC32 of the payload (4 bytes, little endian).
pub(crate) const CRC_SIZE: usize = 4;

/// Appends one frame carrying `payload` to `out`.
pub(crate) fn put_frame(out: &mut Vec<u8>, payload: &[u8]) -> CoreResult<()> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        CoreError::chunk_corruption(format!(
            "element of {} bytes exceeds the frame limit",
            payload.len()
        ))
    })?;

    out.reserve(HEADER_SIZE + payload.len() + CRC_SIZE);
    out.put_u32_le(len);
    out.put_slice(payload);
    out.put_u32_le(compute_crc32(payload));
    Ok(())
}

/// Reads the payload length from a frame header.
pub(crate) fn payload_len(mut header: &[u8]) -> usize {
    header.get_u32_le() as usize
}

/// Checks the trailer of a frame against its payload.
pub(crate) fn verify(payload: &[u8], mut trailer: &[u8]) -> CoreResult<()> {
    let stored = trailer.get_u32_le();
    let computed = compute_crc32(payload);
    if stored != computed {
        return Err(CoreError::ChecksumMismatch {
            expected: stored,
            actual: computed,
        });
    }
    Ok(())
}

/// Computes CRC32 (IEEE polynomial).
#[must_use]
pub fn compute_crc32(data: &[u8]) -> u32 {
    const CRC32_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    !crc
}
