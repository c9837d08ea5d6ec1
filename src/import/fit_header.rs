//! FIT file header and CRC-16 handling
//!
//! Header structure:
//! - `[0]` header size (12 or more)
//! - `[1]` protocol version, major in the high nibble
//! - `[2-3]` profile version (little-endian)
//! - `[4-7]` data section size (little-endian)
//! - `[8-11]` `.FIT` signature
//! - `[12-13]` header CRC, only when the header is 14 bytes or more (0 = not computed)
//!
//! Bytes past the known fields of a longer header are skipped.
//!
//! The data section is followed by a 2-byte CRC over every preceding byte of
//! the file, header included.

use crate::error::DecodeError;

/// Header size of legacy files without a header CRC
pub const LEGACY_HEADER_SIZE: usize = 12;
/// Header size of current files
pub const HEADER_SIZE: usize = 14;
/// Trailing file CRC size
pub const CRC_SIZE: usize = 2;
/// Newest protocol major version this decoder understands
pub const MAX_PROTOCOL_MAJOR: u8 = 2;

const SIGNATURE: &[u8; 4] = b".FIT";

const CRC_TABLE: [u16; 16] = [
    0x0000, 0xCC01, 0xD801, 0x1400, 0xF001, 0x3C00, 0x2800, 0xE401, 0xA001, 0x6C00, 0x7800,
    0xB401, 0x5000, 0x9C01, 0x8801, 0x4400,
];

/// Parsed FIT file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitHeader {
    pub header_size: usize,
    pub protocol_version: u8,
    pub profile_version: u16,
    pub data_size: usize,
}

impl FitHeader {
    /// Parse the header of a FIT file starting at `base` within `bytes`
    pub fn parse(bytes: &[u8], base: usize) -> Result<Self, DecodeError> {
        let rest = bytes.get(base..).unwrap_or(&[]);
        let header_size = *rest.first().ok_or_else(|| DecodeError::MalformedHeader {
            offset: base,
            reason: "missing header byte".to_string(),
        })? as usize;

        if header_size < LEGACY_HEADER_SIZE {
            return Err(DecodeError::MalformedHeader {
                offset: base,
                reason: format!("unsupported header size {}", header_size),
            });
        }

        if rest.len() < header_size {
            return Err(DecodeError::MalformedHeader {
                offset: base,
                reason: format!(
                    "file shorter than its {}-byte header ({} bytes)",
                    header_size,
                    rest.len()
                ),
            });
        }

        let protocol_version = rest[1];
        if protocol_version >> 4 > MAX_PROTOCOL_MAJOR {
            return Err(DecodeError::MalformedHeader {
                offset: base + 1,
                reason: format!("unsupported protocol version {}", protocol_version),
            });
        }

        if &rest[8..12] != SIGNATURE {
            return Err(DecodeError::MalformedHeader {
                offset: base + 8,
                reason: "missing .FIT signature".to_string(),
            });
        }

        if header_size >= HEADER_SIZE {
            let stored = u16::from_le_bytes([rest[12], rest[13]]);
            if stored != 0 {
                let computed = crc16(&rest[..12]);
                if stored != computed {
                    return Err(DecodeError::ChecksumMismatch {
                        offset: base + 12,
                        expected: stored,
                        actual: computed,
                    });
                }
            }
        }

        Ok(Self {
            header_size,
            protocol_version,
            profile_version: u16::from_le_bytes([rest[2], rest[3]]),
            data_size: u32::from_le_bytes([rest[4], rest[5], rest[6], rest[7]]) as usize,
        })
    }

    /// Total bytes of this file: header, data section and trailing CRC
    pub fn file_len(&self) -> usize {
        self.header_size + self.data_size + CRC_SIZE
    }
}

/// Verify the trailing CRC of the file that starts at `base`
pub fn verify_file_crc(bytes: &[u8], base: usize, header: &FitHeader) -> Result<(), DecodeError> {
    let crc_offset = base + header.header_size + header.data_size;
    let available = bytes.len().saturating_sub(base);
    if bytes.len() < crc_offset + CRC_SIZE {
        return Err(DecodeError::Truncated {
            offset: bytes.len().min(crc_offset),
            needed: header.file_len(),
            available,
        });
    }

    let stored = u16::from_le_bytes([bytes[crc_offset], bytes[crc_offset + 1]]);
    let computed = crc16(&bytes[base..crc_offset]);
    if stored != computed {
        return Err(DecodeError::ChecksumMismatch {
            offset: crc_offset,
            expected: stored,
            actual: computed,
        });
    }
    Ok(())
}

/// Garmin FIT CRC-16
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(0u16, |crc, &byte| crc16_step(crc, byte))
}

fn crc16_step(mut crc: u16, byte: u8) -> u16 {
    let mut tmp = CRC_TABLE[(crc & 0xF) as usize];
    crc = (crc >> 4) & 0x0FFF;
    crc = crc ^ tmp ^ CRC_TABLE[(byte & 0xF) as usize];

    tmp = CRC_TABLE[(crc & 0xF) as usize];
    crc = (crc >> 4) & 0x0FFF;
    crc ^ tmp ^ CRC_TABLE[((byte >> 4) & 0xF) as usize]
}
