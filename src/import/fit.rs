//! FIT activity decoder
//!
//! Walks the record stream of one (possibly chained) FIT buffer and keeps the
//! `timestamp` and `power` of every `record` message. Definitions are tracked
//! per local message type in a [`DefinitionTable`] that lives for one file; the
//! running timestamp needed by compressed-timestamp headers is a
//! [`TimestampCursor`]. Both are passed explicitly through the loop, so
//! decoding stays a pure function of the input buffer.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::ops::ControlFlow;
use tracing::{debug, trace};

use super::fit_header::{verify_file_crc, FitHeader};
use super::fit_profile::{
    field_profile, is_absolute_date_time, BaseType, FIELD_POWER, FIELD_TIMESTAMP,
    FIELD_TIME_CREATED, MESG_FILE_ID, MESG_RECORD,
};
use crate::error::DecodeError;
use crate::models::{fit_timestamp_to_utc, RawSample};

const COMPRESSED_HEADER: u8 = 0x80;
const DEFINITION_MESSAGE: u8 = 0x40;
const DEVELOPER_DATA: u8 = 0x20;
const LOCAL_TYPE_MASK: u8 = 0x0F;
const COMPRESSED_TIME_MASK: u32 = 0x1F;

/// Decoded content of one activity buffer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedActivity {
    /// `record` samples in file order
    pub samples: Vec<RawSample>,
    /// `file_id.time_created`, FIT epoch seconds
    pub time_created: Option<i64>,
    /// Number of chained FIT files in the buffer
    pub file_count: usize,
}

impl DecodedActivity {
    /// Calendar date of the activity (UTC)
    ///
    /// Uses `time_created`, falling back to the earliest record timestamp.
    /// Relative (power-up based) times carry no date.
    pub fn activity_date(&self) -> Option<NaiveDate> {
        self.time_created
            .filter(|&t| is_absolute_date_time(t))
            .or_else(|| {
                self.samples
                    .iter()
                    .map(|s| s.timestamp)
                    .filter(|&t| is_absolute_date_time(t))
                    .min()
            })
            .and_then(fit_timestamp_to_utc)
            .map(|dt| dt.date_naive())
    }
}

/// Decode a FIT buffer into its `(timestamp, power)` samples
pub fn decode(bytes: &[u8]) -> Result<Vec<RawSample>, DecodeError> {
    decode_activity(bytes).map(|activity| activity.samples)
}

/// Decode a FIT buffer, keeping file-level metadata alongside the samples
pub fn decode_activity(bytes: &[u8]) -> Result<DecodedActivity, DecodeError> {
    let mut activity = DecodedActivity::default();
    let mut cursor = TimestampCursor::default();
    let mut base = 0usize;

    loop {
        let header = FitHeader::parse(bytes, base)?;
        verify_file_crc(bytes, base, &header)?;

        let data_start = base + header.header_size;
        let data_end = data_start + header.data_size;
        walk_records(bytes, data_start, data_end, &mut cursor, |global_message, fields| {
            collect_message(global_message, fields, &mut activity);
            ControlFlow::Continue(())
        })?;
        activity.file_count += 1;

        base += header.file_len();
        if base >= bytes.len() {
            break;
        }
        debug!(offset = base, "Chained FIT file follows");
    }

    debug!(
        samples = activity.samples.len(),
        files = activity.file_count,
        "Decoded FIT buffer"
    );
    Ok(activity)
}

/// Calendar date read from the head of an activity buffer
///
/// Walks the first file only until an absolute `file_id.time_created` or
/// record timestamp turns up, so a prefix of the file is usually enough.
/// Checksums are not verified; a damaged file is still dated by its content.
pub fn peek_activity_date(bytes: &[u8]) -> Option<NaiveDate> {
    let header = FitHeader::parse(bytes, 0).ok()?;
    let start = header.header_size;
    let end = (start + header.data_size).min(bytes.len());

    let mut found = None;
    let mut cursor = TimestampCursor::default();
    let walked = walk_records(bytes, start, end, &mut cursor, |global_message, fields| {
        let candidate = match global_message {
            MESG_FILE_ID => fields.time_created,
            MESG_RECORD => fields.timestamp,
            _ => None,
        };
        match candidate.filter(|&t| is_absolute_date_time(t as i64)) {
            Some(t) => {
                found = Some(t);
                ControlFlow::Break(())
            }
            None => ControlFlow::Continue(()),
        }
    });
    if let Err(err) = walked {
        trace!("Stopped looking for activity date: {}", err);
    }

    found
        .and_then(|t| fit_timestamp_to_utc(t as i64))
        .map(|dt| dt.date_naive())
}

/// Layout of one field inside a data message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefinition {
    pub number: u8,
    pub size: u8,
    pub base_type: BaseType,
}

/// Layout declared by a definition message for one local type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDefinition {
    pub global_message: u16,
    pub big_endian: bool,
    pub fields: Vec<FieldDefinition>,
    /// Total width of developer fields, skipped unread
    pub developer_size: usize,
}

impl MessageDefinition {
    /// Width of a data message using this definition
    pub fn data_size(&self) -> usize {
        self.fields.iter().map(|f| f.size as usize).sum::<usize>() + self.developer_size
    }

    /// Parse a definition body starting at `pos`; returns it with its encoded length
    fn parse(
        bytes: &[u8],
        pos: usize,
        end: usize,
        has_developer_fields: bool,
    ) -> Result<(Self, usize), DecodeError> {
        let fixed = take(bytes, pos, 5, end)?;
        let big_endian = fixed[1] == 1;
        let global_message = if big_endian {
            u16::from_be_bytes([fixed[2], fixed[3]])
        } else {
            u16::from_le_bytes([fixed[2], fixed[3]])
        };
        let field_count = fixed[4] as usize;
        let mut len = 5;

        let raw_fields = take(bytes, pos + len, field_count * 3, end)?;
        let fields = raw_fields
            .chunks_exact(3)
            .map(|f| FieldDefinition {
                number: f[0],
                size: f[1],
                base_type: BaseType::from_byte(f[2]),
            })
            .collect();
        len += field_count * 3;

        let mut developer_size = 0;
        if has_developer_fields {
            let count = take(bytes, pos + len, 1, end)?[0] as usize;
            len += 1;
            let raw_dev = take(bytes, pos + len, count * 3, end)?;
            developer_size = raw_dev.chunks_exact(3).map(|f| f[1] as usize).sum();
            len += count * 3;
        }

        Ok((
            Self {
                global_message,
                big_endian,
                fields,
                developer_size,
            },
            len,
        ))
    }
}

/// Most recent definition per local message type
#[derive(Debug, Default)]
pub struct DefinitionTable {
    definitions: HashMap<u8, MessageDefinition>,
}

impl DefinitionTable {
    pub fn insert(&mut self, local_type: u8, definition: MessageDefinition) {
        self.definitions.insert(local_type, definition);
    }

    pub fn get(&self, local_type: u8) -> Option<&MessageDefinition> {
        self.definitions.get(&local_type)
    }
}

/// Running absolute timestamp used to expand compressed timestamps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimestampCursor {
    last: Option<u32>,
}

impl TimestampCursor {
    pub fn last(&self) -> Option<u32> {
        self.last
    }

    /// Record a full timestamp
    pub fn set(&mut self, timestamp: u32) {
        self.last = Some(timestamp);
    }

    /// Expand a 5-bit compressed time offset against the cursor and advance it
    ///
    /// Returns `None` when no absolute timestamp has been seen yet.
    pub fn expand(&mut self, time_offset: u8) -> Option<u32> {
        let last = self.last?;
        let offset = time_offset as u32 & COMPRESSED_TIME_MASK;
        let mut timestamp = (last & !COMPRESSED_TIME_MASK).wrapping_add(offset);
        if offset < (last & COMPRESSED_TIME_MASK) {
            timestamp = timestamp.wrapping_add(COMPRESSED_TIME_MASK + 1);
        }
        self.last = Some(timestamp);
        Some(timestamp)
    }
}

/// Interpreted fields of one data message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct MessageFields {
    timestamp: Option<u32>,
    power: Option<u16>,
    time_created: Option<u32>,
}

/// Walk the records in `start..end`, handing each data message to `visit`
///
/// A message's timestamp comes from its own field when present, otherwise from
/// its compressed header. Stops early when `visit` breaks.
fn walk_records<F>(
    bytes: &[u8],
    start: usize,
    end: usize,
    cursor: &mut TimestampCursor,
    mut visit: F,
) -> Result<(), DecodeError>
where
    F: FnMut(u16, MessageFields) -> ControlFlow<()>,
{
    let mut definitions = DefinitionTable::default();
    let mut pos = start;

    while pos < end {
        let record_offset = pos;
        let header = bytes[pos];
        pos += 1;

        if header & DEFINITION_MESSAGE != 0 && header & COMPRESSED_HEADER == 0 {
            let local_type = header & LOCAL_TYPE_MASK;
            let (definition, len) =
                MessageDefinition::parse(bytes, pos, end, header & DEVELOPER_DATA != 0)?;
            trace!(
                local_type,
                global = definition.global_message,
                fields = definition.fields.len(),
                "Definition message"
            );
            definitions.insert(local_type, definition);
            pos += len;
            continue;
        }

        let compressed = header & COMPRESSED_HEADER != 0;
        let local_type = if compressed {
            (header >> 5) & 0x03
        } else {
            header & LOCAL_TYPE_MASK
        };
        let definition = definitions.get(local_type).ok_or(DecodeError::UndefinedLocalType {
            offset: record_offset,
            local_type,
        })?;
        let body = take(bytes, pos, definition.data_size(), end)?;
        pos += body.len();

        let compressed_timestamp = if compressed { cursor.expand(header) } else { None };
        let mut fields = read_fields(definition, body);
        match fields.timestamp {
            Some(ts) => cursor.set(ts),
            None => fields.timestamp = compressed_timestamp,
        }

        if visit(definition.global_message, fields).is_break() {
            break;
        }
    }

    Ok(())
}

fn read_fields(definition: &MessageDefinition, body: &[u8]) -> MessageFields {
    let mut fields = MessageFields::default();
    let mut field_start = 0usize;

    for field in &definition.fields {
        let raw = &body[field_start..field_start + field.size as usize];
        field_start += field.size as usize;

        let Some(profile) = field_profile(definition.global_message, field.number) else {
            continue;
        };
        let Some(value) = field
            .base_type
            .read(raw, definition.big_endian)
            .map(|decoded| profile.apply(decoded))
        else {
            continue;
        };

        match (definition.global_message, field.number) {
            (_, FIELD_TIMESTAMP) => {
                if let Some(ts) = to_u32(value) {
                    fields.timestamp = Some(ts);
                }
            }
            (MESG_RECORD, FIELD_POWER) => fields.power = to_watts(value),
            (MESG_FILE_ID, FIELD_TIME_CREATED) => fields.time_created = to_u32(value),
            _ => {}
        }
    }

    fields
}

fn collect_message(global_message: u16, fields: MessageFields, activity: &mut DecodedActivity) {
    match global_message {
        MESG_RECORD => match fields.timestamp {
            Some(ts) => activity
                .samples
                .push(RawSample::new(ts as i64, fields.power)),
            None => trace!("Skipping record message without timestamp"),
        },
        MESG_FILE_ID => {
            if let Some(created) = fields.time_created {
                activity.time_created.get_or_insert(created as i64);
            }
        }
        _ => {}
    }
}

fn take(bytes: &[u8], pos: usize, len: usize, end: usize) -> Result<&[u8], DecodeError> {
    if pos + len > end {
        return Err(DecodeError::Truncated {
            offset: pos,
            needed: len,
            available: end.saturating_sub(pos),
        });
    }
    Ok(&bytes[pos..pos + len])
}

fn to_u32(value: f64) -> Option<u32> {
    (value.is_finite() && value >= 0.0 && value <= u32::MAX as f64).then(|| value as u32)
}

fn to_watts(value: f64) -> Option<u16> {
    (value.is_finite() && value >= 0.0 && value < u16::MAX as f64).then(|| value.round() as u16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::fit_header::crc16;
    use crate::synthetic::{ActivityBuilder, FitWriter};

    const UINT16: u8 = 0x84;
    const UINT32: u8 = 0x86;

    fn record_writer() -> FitWriter {
        let mut writer = FitWriter::new();
        writer.define(0, MESG_RECORD, &[(253, 4, UINT32), (7, 2, UINT16)], false);
        writer
    }

    fn record(ts: u32, power: u16) -> Vec<u8> {
        let mut payload = ts.to_le_bytes().to_vec();
        payload.extend_from_slice(&power.to_le_bytes());
        payload
    }

    #[test]
    fn test_decode_simple_records() {
        let mut writer = record_writer();
        writer.data(0, &record(1000, 200));
        writer.data(0, &record(1001, 250));

        let samples = decode(&writer.finish()).unwrap();
        assert_eq!(
            samples,
            vec![RawSample::new(1000, Some(200)), RawSample::new(1001, Some(250))]
        );
    }

    #[test]
    fn test_invalid_power_is_absent() {
        let mut writer = record_writer();
        writer.data(0, &record(1000, 0xFFFF));

        let samples = decode(&writer.finish()).unwrap();
        assert_eq!(samples, vec![RawSample::new(1000, None)]);
    }

    #[test]
    fn test_record_without_power_field() {
        let mut writer = FitWriter::new();
        writer.define(0, MESG_RECORD, &[(253, 4, UINT32), (3, 1, 0x02)], false);
        let mut payload = 500u32.to_le_bytes().to_vec();
        payload.push(140);
        writer.data(0, &payload);

        let samples = decode(&writer.finish()).unwrap();
        assert_eq!(samples, vec![RawSample::new(500, None)]);
    }

    #[test]
    fn test_big_endian_definition() {
        let mut writer = FitWriter::new();
        writer.define(0, MESG_RECORD, &[(253, 4, UINT32), (7, 2, UINT16)], true);
        let mut payload = 1000u32.to_be_bytes().to_vec();
        payload.extend_from_slice(&300u16.to_be_bytes());
        writer.data(0, &payload);

        let samples = decode(&writer.finish()).unwrap();
        assert_eq!(samples, vec![RawSample::new(1000, Some(300))]);
    }

    #[test]
    fn test_compressed_timestamp_with_rollover() {
        let mut writer = record_writer();
        writer.define(1, MESG_RECORD, &[(7, 2, UINT16)], false);
        // 1020 & 0x1F = 28
        writer.data(0, &record(1020, 100));
        // 30 >= 28: same window -> 1022
        writer.compressed(1, 30, &110u16.to_le_bytes());
        // 2 < 30: rollover -> 1024 + 2 = 1026
        writer.compressed(1, 2, &120u16.to_le_bytes());

        let samples = decode(&writer.finish()).unwrap();
        let timestamps: Vec<i64> = samples.iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![1020, 1022, 1026]);
        assert_eq!(samples[2].power, Some(120));
    }

    #[test]
    fn test_cursor_expand_in_isolation() {
        let mut cursor = TimestampCursor::default();
        assert_eq!(cursor.expand(3), None);

        cursor.set(0x40 + 0x1E);
        assert_eq!(cursor.expand(0x1F), Some(0x40 + 0x1F));
        assert_eq!(cursor.expand(0x00), Some(0x60));
        assert_eq!(cursor.last(), Some(0x60));
        // Equal low bits stays in the same window
        assert_eq!(cursor.expand(0x00), Some(0x60));
    }

    #[test]
    fn test_compressed_before_absolute_timestamp_is_skipped() {
        let mut writer = FitWriter::new();
        writer.define(1, MESG_RECORD, &[(7, 2, UINT16)], false);
        writer.compressed(1, 4, &200u16.to_le_bytes());

        let samples = decode(&writer.finish()).unwrap();
        assert!(samples.is_empty());
    }

    #[test]
    fn test_redefinition_replaces_layout() {
        let mut writer = record_writer();
        writer.data(0, &record(10, 100));
        writer.define(0, MESG_RECORD, &[(7, 2, UINT16), (253, 4, UINT32)], false);
        let mut payload = 150u16.to_le_bytes().to_vec();
        payload.extend_from_slice(&11u32.to_le_bytes());
        writer.data(0, &payload);

        let samples = decode(&writer.finish()).unwrap();
        assert_eq!(
            samples,
            vec![RawSample::new(10, Some(100)), RawSample::new(11, Some(150))]
        );
    }

    #[test]
    fn test_developer_fields_are_skipped() {
        let mut writer = FitWriter::new();
        writer.define_with_developer(
            0,
            MESG_RECORD,
            &[(253, 4, UINT32), (7, 2, UINT16)],
            &[(0, 3, 0)],
        );
        let mut payload = record(77, 333);
        payload.extend_from_slice(&[1, 2, 3]);
        writer.data(0, &payload);

        let samples = decode(&writer.finish()).unwrap();
        assert_eq!(samples, vec![RawSample::new(77, Some(333))]);
    }

    #[test]
    fn test_other_messages_advance_cursor_only() {
        let mut writer = FitWriter::new();
        // event message (21) with a timestamp
        writer.define(2, 21, &[(253, 4, UINT32), (0, 1, 0x00)], false);
        writer.data(2, &{
            let mut p = 4000u32.to_le_bytes().to_vec();
            p.push(0);
            p
        });
        writer.define(1, MESG_RECORD, &[(7, 2, UINT16)], false);
        writer.compressed(1, (4001 & 0x1F) as u8, &180u16.to_le_bytes());

        let samples = decode(&writer.finish()).unwrap();
        assert_eq!(samples, vec![RawSample::new(4001, Some(180))]);
    }

    #[test]
    fn test_undefined_local_type_reports_offset() {
        let mut writer = record_writer();
        writer.data(3, &record(1, 1));

        let err = decode(&writer.finish()).unwrap_err();
        // 14-byte header + definition (1 + 5 + 6)
        assert_eq!(
            err,
            DecodeError::UndefinedLocalType {
                offset: 26,
                local_type: 3
            }
        );
    }

    #[test]
    fn test_truncated_record_stream() {
        let mut writer = record_writer();
        writer.raw(&[0x00, 0xE8, 0x03]);

        let err = decode(&writer.finish()).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { offset: 27, needed: 6, available: 2 }));
    }

    #[test]
    fn test_corrupted_checksum() {
        let mut writer = record_writer();
        writer.data(0, &record(1000, 200));
        let mut bytes = writer.finish();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x55;

        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::ChecksumMismatch { .. }));
        assert_eq!(err.offset(), bytes.len() - 2);
    }

    #[test]
    fn test_flipped_payload_byte_fails_checksum() {
        let mut writer = record_writer();
        writer.data(0, &record(1000, 200));
        let mut bytes = writer.finish();
        bytes[20] ^= 0x01;
        assert!(matches!(
            decode(&bytes),
            Err(DecodeError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_garbage_is_malformed_header() {
        let err = decode(b"definitely not a fit file").unwrap_err();
        assert!(matches!(err, DecodeError::MalformedHeader { offset: 0, .. }));
        assert!(matches!(
            decode(&[]),
            Err(DecodeError::MalformedHeader { .. })
        ));
    }

    /// Reframe a 14-byte-header file with a different header size and protocol
    fn reframe(bytes: &[u8], header_size: u8, protocol_version: u8) -> Vec<u8> {
        let mut out = vec![header_size, protocol_version];
        out.extend_from_slice(&bytes[2..12]);
        let header_crc = crc16(&out);
        out.extend_from_slice(&header_crc.to_le_bytes());
        out.resize(header_size as usize, 0);
        out.extend_from_slice(&bytes[14..bytes.len() - 2]);
        let file_crc = crc16(&out);
        out.extend_from_slice(&file_crc.to_le_bytes());
        out
    }

    #[test]
    fn test_longer_header_and_newer_minor_protocol() {
        let bytes = ActivityBuilder::new(900_000_000).constant(5, 240).to_bytes();
        let expected = decode(&bytes).unwrap();

        assert_eq!(decode(&reframe(&bytes, 16, 0x20)).unwrap(), expected);
        assert_eq!(decode(&reframe(&bytes, 14, 0x21)).unwrap(), expected);
        assert!(matches!(
            decode(&reframe(&bytes, 14, 0x30)),
            Err(DecodeError::MalformedHeader { offset: 1, .. })
        ));
    }

    #[test]
    fn test_legacy_header_without_crc() {
        let mut writer = record_writer().legacy_header();
        writer.data(0, &record(5, 50));
        let bytes = writer.finish();
        assert_eq!(bytes[0], 12);
        assert_eq!(decode(&bytes).unwrap(), vec![RawSample::new(5, Some(50))]);
    }

    #[test]
    fn test_chained_files_share_cursor_not_definitions() {
        let mut first = record_writer();
        first.data(0, &record(2000, 210));
        let mut second = FitWriter::new();
        second.define(1, MESG_RECORD, &[(7, 2, UINT16)], false);
        second.compressed(1, (2001 & 0x1F) as u8, &220u16.to_le_bytes());

        let mut bytes = first.finish();
        bytes.extend(second.finish());
        let activity = decode_activity(&bytes).unwrap();
        assert_eq!(activity.file_count, 2);
        assert_eq!(
            activity.samples,
            vec![RawSample::new(2000, Some(210)), RawSample::new(2001, Some(220))]
        );

        // The second file cannot reuse the first file's local type 0
        let mut third = FitWriter::new();
        third.data(0, &record(2002, 1));
        let mut bytes = first.finish();
        bytes.extend(third.finish());
        assert!(matches!(
            decode(&bytes),
            Err(DecodeError::UndefinedLocalType { local_type: 0, .. })
        ));
    }

    #[test]
    fn test_time_created_and_activity_date() {
        // 2024-03-15T08:00:00Z in FIT epoch seconds
        let created = 1_710_489_600 - crate::models::FIT_EPOCH_OFFSET;
        let bytes = ActivityBuilder::new(created as u32)
            .constant(10, 200)
            .to_bytes();
        let activity = decode_activity(&bytes).unwrap();
        assert_eq!(activity.time_created, Some(created));
        assert_eq!(
            activity.activity_date(),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(activity.samples.len(), 10);
    }

    #[test]
    fn test_activity_date_falls_back_to_first_sample() {
        // 2024-03-15T08:00:00Z and the day before, FIT epoch seconds
        let created = 1_710_489_600 - crate::models::FIT_EPOCH_OFFSET;
        let activity = DecodedActivity {
            samples: vec![
                RawSample::new(created, Some(1)),
                RawSample::new(created - 86_400, None),
            ],
            time_created: None,
            file_count: 1,
        };
        assert_eq!(activity.activity_date(), NaiveDate::from_ymd_opt(2024, 3, 14));
    }

    #[test]
    fn test_relative_times_carry_no_date() {
        let activity = DecodedActivity {
            samples: vec![RawSample::new(86_400 * 2, Some(1)), RawSample::new(86_400, None)],
            time_created: Some(3_600),
            file_count: 1,
        };
        assert_eq!(activity.activity_date(), None);

        // An absolute sample still dates the activity when time_created is relative
        let created = 1_710_489_600 - crate::models::FIT_EPOCH_OFFSET;
        let activity = DecodedActivity {
            samples: vec![RawSample::new(500, Some(1)), RawSample::new(created, Some(1))],
            time_created: Some(3_600),
            file_count: 1,
        };
        assert_eq!(activity.activity_date(), NaiveDate::from_ymd_opt(2024, 3, 15));
    }

    #[test]
    fn test_peek_date_from_file_prefix() {
        let created = 1_710_489_600 - crate::models::FIT_EPOCH_OFFSET;
        let bytes = ActivityBuilder::new(created as u32).constant(3600, 200).to_bytes();
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15);

        assert_eq!(peek_activity_date(&bytes), expected);
        // Header plus the file_id message is enough
        assert_eq!(peek_activity_date(&bytes[..64]), expected);
    }

    #[test]
    fn test_peek_date_ignores_file_checksum() {
        let created = 1_710_489_600 - crate::models::FIT_EPOCH_OFFSET;
        let mut bytes = ActivityBuilder::new(created as u32).constant(10, 200).to_bytes();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;

        assert!(decode(&bytes).is_err());
        assert_eq!(peek_activity_date(&bytes), NaiveDate::from_ymd_opt(2024, 3, 15));
    }

    #[test]
    fn test_peek_date_without_absolute_time() {
        let relative = ActivityBuilder::new(1_000).constant(5, 100).to_bytes();
        assert_eq!(peek_activity_date(&relative), None);
        assert_eq!(peek_activity_date(b"definitely not a fit file"), None);
    }

    #[test]
    fn test_crc_helper_matches_writer() {
        let bytes = record_writer().finish();
        let crc_at = bytes.len() - 2;
        assert_eq!(
            crc16(&bytes[..crc_at]),
            u16::from_le_bytes([bytes[crc_at], bytes[crc_at + 1]])
        );
    }
}
