//! The slice of the FIT profile the power-curve decoder understands
//!
//! Base types describe how raw bytes become numbers and which raw value marks a
//! field as invalid. Field profiles carry the scale/offset transform for the
//! handful of message fields that are interpreted.

/// Global message number of `file_id`
pub const MESG_FILE_ID: u16 = 0;
/// Global message number of `record`
pub const MESG_RECORD: u16 = 20;

/// Field number of `timestamp`, shared by every message
pub const FIELD_TIMESTAMP: u8 = 253;
/// `file_id.time_created`
pub const FIELD_TIME_CREATED: u8 = 4;
/// `record.power`
pub const FIELD_POWER: u8 = 7;

/// `date_time` values below this are seconds since device power-up, not a date
pub const DATE_TIME_MIN: u32 = 0x1000_0000;

/// Whether a `date_time` value is an absolute FIT-epoch time
pub fn is_absolute_date_time(value: i64) -> bool {
    value >= DATE_TIME_MIN as i64
}

/// FIT base types, keyed by the low five bits of the base type byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    Enum,
    SInt8,
    UInt8,
    SInt16,
    UInt16,
    SInt32,
    UInt32,
    String,
    Float32,
    Float64,
    UInt8z,
    UInt16z,
    UInt32z,
    Byte,
    SInt64,
    UInt64,
    UInt64z,
}

impl BaseType {
    /// Decode a base type byte; unknown types are treated as opaque bytes
    pub fn from_byte(byte: u8) -> Self {
        match byte & 0x1F {
            0x00 => BaseType::Enum,
            0x01 => BaseType::SInt8,
            0x02 => BaseType::UInt8,
            0x03 => BaseType::SInt16,
            0x04 => BaseType::UInt16,
            0x05 => BaseType::SInt32,
            0x06 => BaseType::UInt32,
            0x07 => BaseType::String,
            0x08 => BaseType::Float32,
            0x09 => BaseType::Float64,
            0x0A => BaseType::UInt8z,
            0x0B => BaseType::UInt16z,
            0x0C => BaseType::UInt32z,
            0x0E => BaseType::SInt64,
            0x0F => BaseType::UInt64,
            0x10 => BaseType::UInt64z,
            _ => BaseType::Byte,
        }
    }

    /// Width of one element in bytes
    pub fn size(&self) -> usize {
        match self {
            BaseType::Enum
            | BaseType::SInt8
            | BaseType::UInt8
            | BaseType::String
            | BaseType::UInt8z
            | BaseType::Byte => 1,
            BaseType::SInt16 | BaseType::UInt16 | BaseType::UInt16z => 2,
            BaseType::SInt32 | BaseType::UInt32 | BaseType::Float32 | BaseType::UInt32z => 4,
            BaseType::Float64 | BaseType::SInt64 | BaseType::UInt64 | BaseType::UInt64z => 8,
        }
    }

    /// Read one element and apply the invalid-sentinel rule
    ///
    /// Returns `None` for the sentinel, for strings and opaque bytes, and when
    /// `raw` is not exactly one element wide.
    pub fn read(&self, raw: &[u8], big_endian: bool) -> Option<f64> {
        if raw.len() != self.size() {
            return None;
        }
        let bits = read_unsigned(raw, big_endian);
        let value = match self {
            BaseType::Enum | BaseType::UInt8 => valid_unsigned(bits, 0xFF)?,
            BaseType::UInt16 => valid_unsigned(bits, 0xFFFF)?,
            BaseType::UInt32 => valid_unsigned(bits, 0xFFFF_FFFF)?,
            BaseType::UInt64 => valid_unsigned(bits, u64::MAX)?,
            BaseType::UInt8z | BaseType::UInt16z | BaseType::UInt32z | BaseType::UInt64z => {
                valid_unsigned(bits, 0)?
            }
            BaseType::SInt8 => valid_signed(bits as u8 as i8 as i64, i8::MAX as i64)?,
            BaseType::SInt16 => valid_signed(bits as u16 as i16 as i64, i16::MAX as i64)?,
            BaseType::SInt32 => valid_signed(bits as u32 as i32 as i64, i32::MAX as i64)?,
            BaseType::SInt64 => valid_signed(bits as i64, i64::MAX)?,
            BaseType::Float32 => {
                if bits == 0xFFFF_FFFF {
                    return None;
                }
                f32::from_bits(bits as u32) as f64
            }
            BaseType::Float64 => {
                if bits == u64::MAX {
                    return None;
                }
                f64::from_bits(bits)
            }
            BaseType::String | BaseType::Byte => return None,
        };
        Some(value)
    }
}

fn read_unsigned(raw: &[u8], big_endian: bool) -> u64 {
    if big_endian {
        raw.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
    } else {
        raw.iter().rev().fold(0u64, |acc, &b| (acc << 8) | b as u64)
    }
}

fn valid_unsigned(bits: u64, invalid: u64) -> Option<f64> {
    (bits != invalid).then_some(bits as f64)
}

fn valid_signed(value: i64, invalid: i64) -> Option<f64> {
    (value != invalid).then_some(value as f64)
}

/// Scale/offset transform for one profile field: `value = raw / scale - offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldProfile {
    pub message: u16,
    pub field: u8,
    pub name: &'static str,
    pub scale: f64,
    pub offset: f64,
}

impl FieldProfile {
    pub fn apply(&self, raw: f64) -> f64 {
        raw / self.scale - self.offset
    }
}

/// Interpreted `record` and `file_id` fields
pub const FIELD_PROFILES: &[FieldProfile] = &[
    FieldProfile {
        message: MESG_FILE_ID,
        field: FIELD_TIME_CREATED,
        name: "time_created",
        scale: 1.0,
        offset: 0.0,
    },
    FieldProfile {
        message: MESG_RECORD,
        field: 2,
        name: "altitude",
        scale: 5.0,
        offset: 500.0,
    },
    FieldProfile {
        message: MESG_RECORD,
        field: 3,
        name: "heart_rate",
        scale: 1.0,
        offset: 0.0,
    },
    FieldProfile {
        message: MESG_RECORD,
        field: 4,
        name: "cadence",
        scale: 1.0,
        offset: 0.0,
    },
    FieldProfile {
        message: MESG_RECORD,
        field: 5,
        name: "distance",
        scale: 100.0,
        offset: 0.0,
    },
    FieldProfile {
        message: MESG_RECORD,
        field: 6,
        name: "speed",
        scale: 1000.0,
        offset: 0.0,
    },
    FieldProfile {
        message: MESG_RECORD,
        field: FIELD_POWER,
        name: "power",
        scale: 1.0,
        offset: 0.0,
    },
];

/// Look up a field profile; `timestamp` is common to all messages
pub fn field_profile(message: u16, field: u8) -> Option<&'static FieldProfile> {
    static TIMESTAMP: FieldProfile = FieldProfile {
        message: u16::MAX,
        field: FIELD_TIMESTAMP,
        name: "timestamp",
        scale: 1.0,
        offset: 0.0,
    };
    if field == FIELD_TIMESTAMP {
        return Some(&TIMESTAMP);
    }
    FIELD_PROFILES
        .iter()
        .find(|p| p.message == message && p.field == field)
}
