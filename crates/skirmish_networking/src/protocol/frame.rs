//! # Transform Sync Frame
//!
//! Variable-length frame of `(id, x, y, vx, vy)` records keyed by string
//! ids.
//!
//! ## Design
//!
//! - The encoder owns one growable buffer and reuses it every call
//! - The decoder never allocates: ids are borrowed `&str` views into the
//!   input
//! - Decoding is fail-closed. The whole frame is validated before the
//!   first callback, so a malformed frame has zero side effects

use tracing::debug;

use super::packets::PacketType;
use crate::error::ProtocolError;

/// Type (1) + timestamp (4) + count (2).
pub const FRAME_HEADER_SIZE: usize = 7;

/// Id length prefix (1) + four `f32` (16), excluding the id bytes.
pub const RECORD_FIXED_SIZE: usize = 17;

/// Longest encodable id, in bytes.
pub const MAX_ID_LEN: usize = u8::MAX as usize;

/// Most records one frame can carry.
pub const MAX_FRAME_ENTITIES: usize = u16::MAX as usize;

/// Offset of the count field, patched by [`FrameEncoder::finish`].
const COUNT_OFFSET: usize = 5;

/// One entity's replicated state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformRecord<'a> {
    /// Stable wire id.
    pub id: &'a str,
    /// Position X.
    pub x: f32,
    /// Position Y.
    pub y: f32,
    /// Velocity X.
    pub vx: f32,
    /// Velocity Y.
    pub vy: f32,
}

/// Reusable transform frame writer.
///
/// Either encode a whole slice with [`encode`](Self::encode), or stream
/// records with [`begin`](Self::begin) / [`push`](Self::push) /
/// [`finish`](Self::finish) when the records are not already collected.
pub struct FrameEncoder {
    buffer: Vec<u8>,
    count: usize,
}

impl FrameEncoder {
    /// Creates an encoder with an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            count: 0,
        }
    }

    /// Creates an encoder pre-sized for `entities` records with ids of up to
    /// `id_len` bytes.
    #[must_use]
    pub fn with_capacity(entities: usize, id_len: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(FRAME_HEADER_SIZE + entities * (RECORD_FIXED_SIZE + id_len)),
            count: 0,
        }
    }

    /// Returns the bytes written so far.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Returns the number of bytes written.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if nothing has been written.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Encodes a whole frame.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::TooManyEntities`] if `records` exceeds
    /// [`MAX_FRAME_ENTITIES`], [`ProtocolError::IdTooLong`] if any id exceeds
    /// [`MAX_ID_LEN`] bytes. Nothing is written on error.
    pub fn encode(
        &mut self,
        records: &[TransformRecord<'_>],
        timestamp: u32,
    ) -> Result<&[u8], ProtocolError> {
        if records.len() > MAX_FRAME_ENTITIES {
            debug!(count = records.len(), "transform frame rejected: too many records");
            return Err(ProtocolError::TooManyEntities {
                count: records.len(),
                max: MAX_FRAME_ENTITIES,
            });
        }
        if let Some(record) = records.iter().find(|r| r.id.len() > MAX_ID_LEN) {
            debug!(len = record.id.len(), "transform frame rejected: id too long");
            return Err(ProtocolError::IdTooLong {
                len: record.id.len(),
                max: MAX_ID_LEN,
            });
        }

        let body: usize = records.iter().map(|r| RECORD_FIXED_SIZE + r.id.len()).sum();
        self.begin(timestamp);
        self.buffer.reserve(body);
        for record in records {
            self.push(record)?;
        }
        Ok(self.finish())
    }

    /// Starts a new frame, discarding any previous contents.
    pub fn begin(&mut self, timestamp: u32) {
        self.buffer.clear();
        self.count = 0;
        self.buffer.push(PacketType::TransformSync as u8);
        self.buffer.extend_from_slice(&timestamp.to_le_bytes());
        self.buffer.extend_from_slice(&0u16.to_le_bytes());
    }

    /// Appends one record to the frame started by [`begin`](Self::begin).
    ///
    /// # Errors
    ///
    /// Same limits as [`encode`](Self::encode); the rejected record is not
    /// written and the frame stays valid.
    pub fn push(&mut self, record: &TransformRecord<'_>) -> Result<(), ProtocolError> {
        if self.count >= MAX_FRAME_ENTITIES {
            debug!(count = self.count, "transform record rejected: frame full");
            return Err(ProtocolError::TooManyEntities {
                count: self.count + 1,
                max: MAX_FRAME_ENTITIES,
            });
        }
        let Ok(id_len) = u8::try_from(record.id.len()) else {
            debug!(len = record.id.len(), "transform record rejected: id too long");
            return Err(ProtocolError::IdTooLong {
                len: record.id.len(),
                max: MAX_ID_LEN,
            });
        };

        self.buffer.push(id_len);
        self.buffer.extend_from_slice(record.id.as_bytes());
        for value in [record.x, record.y, record.vx, record.vy] {
            self.buffer.extend_from_slice(&value.to_le_bytes());
        }
        self.count += 1;
        Ok(())
    }

    /// Writes the record count into the header and returns the frame.
    pub fn finish(&mut self) -> &[u8] {
        if self.buffer.len() >= FRAME_HEADER_SIZE {
            let count = self.count as u16;
            self.buffer[COUNT_OFFSET..COUNT_OFFSET + 2].copy_from_slice(&count.to_le_bytes());
        }
        &self.buffer
    }
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Cursor over a borrowed frame. Every read is bounds-checked and returns
/// `None` past the end.
pub struct FrameReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> FrameReader<'a> {
    /// Creates a reader at the start of `buffer`.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    /// Returns the number of bytes remaining.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Reads `len` raw bytes.
    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.position.checked_add(len)?;
        let slice = self.buffer.get(self.position..end)?;
        self.position = end;
        Some(slice)
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Option<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    /// Reads a u16 in little-endian format.
    #[inline]
    pub fn read_u16(&mut self) -> Option<u16> {
        let bytes = self.read_bytes(2)?;
        Some(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a u32 in little-endian format.
    #[inline]
    pub fn read_u32(&mut self) -> Option<u32> {
        let bytes = self.read_bytes(4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a f32 in little-endian format.
    #[inline]
    pub fn read_f32(&mut self) -> Option<f32> {
        self.read_u32().map(f32::from_bits)
    }

    /// Reads the frame header: returns `(timestamp, count)` if the type byte
    /// is [`PacketType::TransformSync`].
    fn read_header(&mut self) -> Option<(u32, u16)> {
        if PacketType::from_u8(self.read_u8()?) != Some(PacketType::TransformSync) {
            return None;
        }
        Some((self.read_u32()?, self.read_u16()?))
    }

    /// Reads one record.
    fn read_record(&mut self) -> Option<TransformRecord<'a>> {
        let id_len = self.read_u8()? as usize;
        let id = std::str::from_utf8(self.read_bytes(id_len)?).ok()?;
        Some(TransformRecord {
            id,
            x: self.read_f32()?,
            y: self.read_f32()?,
            vx: self.read_f32()?,
            vy: self.read_f32()?,
        })
    }
}

/// Walks the whole frame without side effects; `Some((timestamp, count))`
/// only if every record parses and nothing trails the last one.
fn validate_frame(bytes: &[u8]) -> Option<(u32, u16)> {
    let mut reader = FrameReader::new(bytes);
    let (timestamp, count) = reader.read_header()?;
    for _ in 0..count {
        reader.read_record()?;
    }
    (reader.remaining() == 0).then_some((timestamp, count))
}

/// Decodes a transform frame, calling `on_entity(id, x, y, vx, vy)` once per
/// record in wire order.
///
/// Returns the frame timestamp, or `None` without invoking the callback if
/// the type byte is wrong, the frame is truncated, bytes trail the last
/// record, or an id is not UTF-8.
pub fn decode_transform_frame<F>(bytes: &[u8], mut on_entity: F) -> Option<u32>
where
    F: FnMut(&str, f32, f32, f32, f32),
{
    let Some((timestamp, count)) = validate_frame(bytes) else {
        debug!(len = bytes.len(), "transform frame rejected");
        return None;
    };

    let mut reader = FrameReader::new(bytes);
    reader.read_header()?;
    for _ in 0..count {
        let record = reader.read_record()?;
        on_entity(record.id, record.x, record.y, record.vx, record.vy);
    }
    Some(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, x: f32) -> TransformRecord<'_> {
        TransformRecord {
            id,
            x,
            y: -x,
            vx: x * 0.5,
            vy: 1.0,
        }
    }

    fn collect(bytes: &[u8]) -> (Option<u32>, Vec<(String, f32, f32, f32, f32)>) {
        let mut out = Vec::new();
        let ts = decode_transform_frame(bytes, |id, x, y, vx, vy| {
            out.push((id.to_owned(), x, y, vx, vy));
        });
        (ts, out)
    }

    #[test]
    fn test_exact_layout() {
        let mut encoder = FrameEncoder::new();
        let bytes = encoder
            .encode(&[TransformRecord { id: "ab", x: 1.0, y: 2.0, vx: 3.0, vy: 4.0 }], 0x0102_0304)
            .unwrap()
            .to_vec();

        assert_eq!(bytes.len(), FRAME_HEADER_SIZE + RECORD_FIXED_SIZE + 2);
        assert_eq!(bytes[0], PacketType::TransformSync as u8);
        assert_eq!(&bytes[1..5], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&bytes[5..7], &[1, 0]);
        assert_eq!(bytes[7], 2);
        assert_eq!(&bytes[8..10], b"ab");
        assert_eq!(&bytes[10..14], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[22..26], &4.0f32.to_le_bytes());
    }

    #[test]
    fn test_round_trip_preserves_order_and_values() {
        let records = [record("alpha", 1.5), record("", 2.0), record("ω-unicode", -3.25)];
        let mut encoder = FrameEncoder::new();
        let bytes = encoder.encode(&records, 777).unwrap().to_vec();

        let (ts, out) = collect(&bytes);
        assert_eq!(ts, Some(777));
        assert_eq!(out.len(), 3);
        for (got, want) in out.iter().zip(records.iter()) {
            assert_eq!(got.0, want.id);
            assert_eq!((got.1, got.2, got.3, got.4), (want.x, want.y, want.vx, want.vy));
        }
    }

    #[test]
    fn test_empty_frame() {
        let mut encoder = FrameEncoder::new();
        let bytes = encoder.encode(&[], 5).unwrap().to_vec();
        assert_eq!(bytes.len(), FRAME_HEADER_SIZE);
        assert_eq!(collect(&bytes), (Some(5), Vec::new()));
    }

    #[test]
    fn test_every_truncation_fails_closed() {
        let mut encoder = FrameEncoder::new();
        let bytes = encoder.encode(&[record("a", 1.0), record("bcd", 2.0)], 9).unwrap().to_vec();

        for cut in 0..bytes.len() {
            let (ts, out) = collect(&bytes[..cut]);
            assert_eq!(ts, None, "prefix of {cut} bytes decoded");
            assert!(out.is_empty());
        }
    }

    #[test]
    fn test_trailing_bytes_fail_closed() {
        let mut encoder = FrameEncoder::new();
        let mut bytes = encoder.encode(&[record("a", 1.0)], 9).unwrap().to_vec();
        bytes.push(0);
        assert_eq!(collect(&bytes), (None, Vec::new()));
    }

    #[test]
    fn test_wrong_type_fails_closed() {
        let mut encoder = FrameEncoder::new();
        let mut bytes = encoder.encode(&[record("a", 1.0)], 9).unwrap().to_vec();
        bytes[0] = PacketType::Input as u8;
        assert_eq!(collect(&bytes), (None, Vec::new()));
    }

    #[test]
    fn test_invalid_utf8_in_later_record_fails_closed() {
        let mut encoder = FrameEncoder::new();
        let mut bytes = encoder.encode(&[record("ok", 1.0), record("xy", 2.0)], 9).unwrap().to_vec();
        let second_id = FRAME_HEADER_SIZE + RECORD_FIXED_SIZE + 2 + 1;
        bytes[second_id] = 0xFF;
        assert_eq!(collect(&bytes), (None, Vec::new()));
    }

    #[test]
    fn test_id_too_long_is_rejected() {
        let long = "x".repeat(MAX_ID_LEN + 1);
        let mut encoder = FrameEncoder::new();
        let err = encoder.encode(&[record(&long, 0.0)], 0).unwrap_err();
        assert_eq!(err, ProtocolError::IdTooLong { len: 256, max: 255 });

        let max = "x".repeat(MAX_ID_LEN);
        assert!(encoder.encode(&[record(&max, 0.0)], 0).is_ok());
    }

    #[test]
    fn test_streaming_push_rejects_long_id_without_writing() {
        let long = "x".repeat(MAX_ID_LEN + 1);
        let mut encoder = FrameEncoder::new();
        encoder.begin(5);
        let before = encoder.len();
        assert_eq!(
            encoder.push(&record(&long, 0.0)).unwrap_err(),
            ProtocolError::IdTooLong { len: 256, max: 255 }
        );
        assert_eq!(encoder.len(), before);
        assert_eq!(collect(encoder.finish()), (Some(5), Vec::new()));
    }

    #[test]
    fn test_too_many_entities_is_rejected() {
        let records = vec![record("", 0.0); MAX_FRAME_ENTITIES + 1];
        let mut encoder = FrameEncoder::new();
        assert_eq!(
            encoder.encode(&records, 0).unwrap_err(),
            ProtocolError::TooManyEntities { count: 65_536, max: 65_535 }
        );
        assert!(encoder.encode(&records[..MAX_FRAME_ENTITIES], 0).is_ok());
    }

    #[test]
    fn test_streaming_matches_batch() {
        let records = [record("a", 1.0), record("b", 2.0)];
        let mut batch = FrameEncoder::new();
        let expected = batch.encode(&records, 3).unwrap().to_vec();

        let mut stream = FrameEncoder::with_capacity(2, 1);
        stream.begin(3);
        for r in &records {
            stream.push(r).unwrap();
        }
        assert_eq!(stream.finish(), &expected[..]);
    }
}
