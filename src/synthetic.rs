//! Synthetic FIT activity generation
//!
//! [`FitWriter`] assembles raw definition/data records and frames them with a
//! header and CRCs. [`ActivityBuilder`] sits on top of it and emits a realistic
//! activity: a `file_id` message followed by 1 Hz `record` messages, using
//! compressed timestamps whenever the gap to the previous sample allows it.

use std::f64::consts::PI;

use crate::import::fit_header::{crc16, HEADER_SIZE, LEGACY_HEADER_SIZE};
use crate::import::fit_profile::{
    FIELD_POWER, FIELD_TIMESTAMP, FIELD_TIME_CREATED, MESG_FILE_ID, MESG_RECORD,
};
use crate::models::RawSample;

const PROTOCOL_VERSION: u8 = 0x20;
const PROFILE_VERSION: u16 = 2132;

const BASE_ENUM: u8 = 0x00;
const BASE_UINT16: u8 = 0x84;
const BASE_UINT32: u8 = 0x86;

/// Low-level FIT record writer
#[derive(Debug, Clone, Default)]
pub struct FitWriter {
    records: Vec<u8>,
    legacy_header: bool,
}

impl FitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a 12-byte header without header CRC
    pub fn legacy_header(mut self) -> Self {
        self.legacy_header = true;
        self
    }

    /// Append a definition message; fields are `(number, size, base_type)`
    pub fn define(
        &mut self,
        local_type: u8,
        global_message: u16,
        fields: &[(u8, u8, u8)],
        big_endian: bool,
    ) -> &mut Self {
        self.records.push(0x40 | (local_type & 0x0F));
        self.push_definition_body(global_message, fields, big_endian);
        self
    }

    /// Append a definition message carrying developer fields `(number, size, index)`
    pub fn define_with_developer(
        &mut self,
        local_type: u8,
        global_message: u16,
        fields: &[(u8, u8, u8)],
        developer_fields: &[(u8, u8, u8)],
    ) -> &mut Self {
        self.records.push(0x60 | (local_type & 0x0F));
        self.push_definition_body(global_message, fields, false);
        self.records.push(developer_fields.len() as u8);
        for &(number, size, index) in developer_fields {
            self.records.extend_from_slice(&[number, size, index]);
        }
        self
    }

    /// Append a data message with a normal header
    pub fn data(&mut self, local_type: u8, payload: &[u8]) -> &mut Self {
        self.records.push(local_type & 0x0F);
        self.records.extend_from_slice(payload);
        self
    }

    /// Append a data message with a compressed-timestamp header
    pub fn compressed(&mut self, local_type: u8, time_offset: u8, payload: &[u8]) -> &mut Self {
        self.records
            .push(0x80 | ((local_type & 0x03) << 5) | (time_offset & 0x1F));
        self.records.extend_from_slice(payload);
        self
    }

    /// Append raw bytes to the record stream
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.records.extend_from_slice(bytes);
        self
    }

    /// Frame the record stream with header and CRCs
    pub fn finish(&self) -> Vec<u8> {
        let header_size = if self.legacy_header {
            LEGACY_HEADER_SIZE
        } else {
            HEADER_SIZE
        };
        let mut bytes = Vec::with_capacity(header_size + self.records.len() + 2);
        bytes.push(header_size as u8);
        bytes.push(PROTOCOL_VERSION);
        bytes.extend_from_slice(&PROFILE_VERSION.to_le_bytes());
        bytes.extend_from_slice(&(self.records.len() as u32).to_le_bytes());
        bytes.extend_from_slice(b".FIT");
        if !self.legacy_header {
            let header_crc = crc16(&bytes);
            bytes.extend_from_slice(&header_crc.to_le_bytes());
        }
        bytes.extend_from_slice(&self.records);
        let file_crc = crc16(&bytes);
        bytes.extend_from_slice(&file_crc.to_le_bytes());
        bytes
    }

    fn push_definition_body(&mut self, global_message: u16, fields: &[(u8, u8, u8)], big_endian: bool) {
        self.records.push(0);
        self.records.push(big_endian as u8);
        if big_endian {
            self.records.extend_from_slice(&global_message.to_be_bytes());
        } else {
            self.records.extend_from_slice(&global_message.to_le_bytes());
        }
        self.records.push(fields.len() as u8);
        for &(number, size, base_type) in fields {
            self.records.extend_from_slice(&[number, size, base_type]);
        }
    }
}

/// Builder for a complete synthetic activity file
#[derive(Debug, Clone)]
pub struct ActivityBuilder {
    time_created: u32,
    next_timestamp: u32,
    samples: Vec<RawSample>,
    compress: bool,
}

impl ActivityBuilder {
    /// Start an activity whose first sample is at `time_created` (FIT epoch seconds)
    pub fn new(time_created: u32) -> Self {
        Self {
            time_created,
            next_timestamp: time_created,
            samples: Vec::new(),
            compress: true,
        }
    }

    /// Always write full timestamps
    pub fn without_compression(mut self) -> Self {
        self.compress = false;
        self
    }

    /// Append 1 Hz samples with the given powers
    pub fn powers(mut self, powers: &[u16]) -> Self {
        for &power in powers {
            self.push(Some(power));
        }
        self
    }

    /// Append `seconds` samples of constant power
    pub fn constant(self, seconds: u32, power: u16) -> Self {
        let powers = vec![power; seconds as usize];
        self.powers(&powers)
    }

    /// Append samples whose power field is marked invalid
    pub fn dropout(mut self, seconds: u32) -> Self {
        for _ in 0..seconds {
            self.push(None);
        }
        self
    }

    /// Skip ahead in time without recording (a pause)
    pub fn pause(mut self, seconds: u32) -> Self {
        self.next_timestamp += seconds;
        self
    }

    /// Append an arbitrary sample; it need not be in order
    pub fn sample(mut self, sample: RawSample) -> Self {
        self.samples.push(sample);
        self
    }

    fn push(&mut self, power: Option<u16>) {
        self.samples
            .push(RawSample::new(self.next_timestamp as i64, power));
        self.next_timestamp += 1;
    }

    /// Encode the activity as FIT bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = FitWriter::new();
        writer.define(0, MESG_FILE_ID, &[(0, 1, BASE_ENUM), (FIELD_TIME_CREATED, 4, BASE_UINT32)], false);
        let mut file_id = vec![4u8]; // type = activity
        file_id.extend_from_slice(&self.time_created.to_le_bytes());
        writer.data(0, &file_id);

        writer.define(
            1,
            MESG_RECORD,
            &[(FIELD_TIMESTAMP, 4, BASE_UINT32), (FIELD_POWER, 2, BASE_UINT16)],
            false,
        );
        writer.define(2, MESG_RECORD, &[(FIELD_POWER, 2, BASE_UINT16)], false);

        let mut last: Option<u32> = None;
        for sample in &self.samples {
            let timestamp = sample.timestamp as u32;
            let power = sample.power.unwrap_or(u16::MAX).to_le_bytes();
            let compressible = self.compress
                && last.is_some_and(|prev| timestamp > prev && timestamp - prev < 32);

            if compressible {
                writer.compressed(2, (timestamp & 0x1F) as u8, &power);
            } else {
                let mut payload = timestamp.to_le_bytes().to_vec();
                payload.extend_from_slice(&power);
                writer.data(1, &payload);
            }
            last = Some(timestamp);
        }

        writer.finish()
    }
}

/// Deterministic ride of `seconds` length oscillating around `base_power`
///
/// Every `seed`-dependent phase shift yields a different but reproducible ride.
pub fn generate_ride(time_created: u32, seconds: u32, base_power: u16, seed: u32) -> Vec<u8> {
    let phase = (seed % 360) as f64 * PI / 180.0;
    let powers: Vec<u16> = (0..seconds)
        .map(|i| {
            let t = i as f64;
            let variation = (t * 0.1 + phase).sin() * 50.0 + (t / 300.0 + phase).sin() * 30.0;
            (base_power as f64 + variation).max(0.0).round() as u16
        })
        .collect();

    ActivityBuilder::new(time_created).powers(&powers).to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::fit::{decode, decode_activity};

    #[test]
    fn test_writer_frames_records() {
        let mut writer = FitWriter::new();
        writer.raw(&[1, 2, 3]);
        let bytes = writer.finish();
        assert_eq!(bytes.len(), 14 + 3 + 2);
        assert_eq!(&bytes[8..12], b".FIT");
        assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 3);
    }

    #[test]
    fn test_builder_round_trip_uses_compression() {
        let builder = ActivityBuilder::new(10_000).powers(&[100, 110, 120]).pause(100).constant(2, 90);
        let compressed = builder.to_bytes();
        let full = builder.clone().without_compression().to_bytes();
        assert!(compressed.len() < full.len());

        let expected = vec![
            RawSample::new(10_000, Some(100)),
            RawSample::new(10_001, Some(110)),
            RawSample::new(10_002, Some(120)),
            RawSample::new(10_103, Some(90)),
            RawSample::new(10_104, Some(90)),
        ];
        assert_eq!(decode(&compressed).unwrap(), expected);
        assert_eq!(decode(&full).unwrap(), expected);
    }

    #[test]
    fn test_dropout_is_decoded_as_absent() {
        let bytes = ActivityBuilder::new(50).constant(1, 200).dropout(2).to_bytes();
        let samples = decode(&bytes).unwrap();
        assert_eq!(samples[1].power, None);
        assert_eq!(samples[2].power, None);
    }

    #[test]
    fn test_generate_ride_is_deterministic() {
        let a = generate_ride(1_000_000, 600, 250, 7);
        let b = generate_ride(1_000_000, 600, 250, 7);
        assert_eq!(a, b);

        let activity = decode_activity(&a).unwrap();
        assert_eq!(activity.samples.len(), 600);
        assert_eq!(activity.time_created, Some(1_000_000));
        assert!(activity.samples.iter().all(|s| s.power.is_some()));
    }
}
