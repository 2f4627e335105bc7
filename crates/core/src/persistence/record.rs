//! Fixed-layout binary record codec.
//!
//! Each booking occupies [`RECORD_LEN`] bytes, laid out exactly like the
//! legacy C struct (little-endian integers, NUL-padded strings, two bytes of
//! alignment padding after `gender`). There is no header; the file is just
//! records back to back.

use crate::{
    error::RecordError,
    models::{Booking, MAX_BOOKING_ID},
};

/// Width of the passenger name field, terminator included.
pub const NAME_LEN: usize = 100;
/// Width of the gender field, terminator included.
pub const GENDER_LEN: usize = 10;
/// Width of the travel class field, terminator included.
pub const CLASS_LEN: usize = 20;

const ID_OFFSET: usize = 0;
const NAME_OFFSET: usize = ID_OFFSET + 4;
const AGE_OFFSET: usize = NAME_OFFSET + NAME_LEN;
const GENDER_OFFSET: usize = AGE_OFFSET + 4;
const TRAIN_OFFSET: usize = GENDER_OFFSET + GENDER_LEN + 2;
const CLASS_OFFSET: usize = TRAIN_OFFSET + 4;

/// Size of one encoded booking.
pub const RECORD_LEN: usize = CLASS_OFFSET + CLASS_LEN;

/// Truncate `value` so it fits a NUL-terminated field of `width` bytes.
///
/// Cuts on a character boundary, so the result may be shorter than
/// `width - 1` bytes for multi-byte text.
pub fn clamp_field(value: &str, width: usize) -> &str {
    let limit = width.saturating_sub(1);
    if value.len() <= limit {
        return value;
    }
    let mut end = limit;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

/// Encode a booking into its on-disk form. Over-long strings are clamped.
pub fn encode(booking: &Booking) -> [u8; RECORD_LEN] {
    let mut buf = [0u8; RECORD_LEN];
    buf[ID_OFFSET..ID_OFFSET + 4].copy_from_slice(&booking.booking_id.to_le_bytes());
    write_str(&mut buf[NAME_OFFSET..NAME_OFFSET + NAME_LEN], &booking.passenger_name);
    buf[AGE_OFFSET..AGE_OFFSET + 4].copy_from_slice(&booking.age.to_le_bytes());
    write_str(&mut buf[GENDER_OFFSET..GENDER_OFFSET + GENDER_LEN], &booking.gender);
    buf[TRAIN_OFFSET..TRAIN_OFFSET + 4].copy_from_slice(&booking.train_id.to_le_bytes());
    write_str(&mut buf[CLASS_OFFSET..CLASS_OFFSET + CLASS_LEN], &booking.travel_class);
    buf
}

/// Decode one complete record.
pub fn decode(record: &[u8; RECORD_LEN]) -> Result<Booking, RecordError> {
    let booking_id = read_u32(record, ID_OFFSET);
    if booking_id == 0 {
        return Err(RecordError::ZeroBookingId);
    }
    if booking_id > MAX_BOOKING_ID {
        return Err(RecordError::BookingIdOutOfRange(booking_id));
    }
    Ok(Booking {
        booking_id,
        passenger_name: read_str(&record[NAME_OFFSET..NAME_OFFSET + NAME_LEN]),
        age: i32::from_le_bytes(word(record, AGE_OFFSET)),
        gender: read_str(&record[GENDER_OFFSET..GENDER_OFFSET + GENDER_LEN]),
        train_id: read_u32(record, TRAIN_OFFSET),
        travel_class: read_str(&record[CLASS_OFFSET..CLASS_OFFSET + CLASS_LEN]),
    })
}

/// Iterator over the complete records in a byte buffer.
///
/// Yields one decode result per record and stops at the end of the last
/// complete one; any partial tail is exposed through [`Records::trailing`].
pub struct Records<'a> {
    chunks: std::slice::ChunksExact<'a, u8>,
}

impl<'a> Records<'a> {
    /// Walk `bytes` record by record.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            chunks: bytes.chunks_exact(RECORD_LEN),
        }
    }

    /// Number of bytes after the last complete record.
    pub fn trailing(&self) -> usize {
        self.chunks.remainder().len()
    }
}

impl Iterator for Records<'_> {
    type Item = Result<Booking, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = self.chunks.next()?;
        let record: &[u8; RECORD_LEN] = chunk.try_into().ok()?;
        Some(decode(record))
    }
}

fn write_str(field: &mut [u8], value: &str) {
    let clamped = clamp_field(value, field.len());
    field[..clamped.len()].copy_from_slice(clamped.as_bytes());
}

fn read_str(field: &[u8]) -> String {
    let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

fn word(record: &[u8; RECORD_LEN], offset: usize) -> [u8; 4] {
    [
        record[offset],
        record[offset + 1],
        record[offset + 2],
        record[offset + 3],
    ]
}

fn read_u32(record: &[u8; RECORD_LEN], offset: usize) -> u32 {
    u32::from_le_bytes(word(record, offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Booking {
        Booking {
            booking_id: 42,
            passenger_name: "John Doe".to_string(),
            age: 30,
            gender: "Male".to_string(),
            train_id: 3,
            travel_class: "Sleeper".to_string(),
        }
    }

    #[test]
    fn layout_matches_legacy_struct() {
        assert_eq!(RECORD_LEN, 144);

        let bytes = encode(&sample());
        assert_eq!(&bytes[0..4], &42u32.to_le_bytes());
        assert_eq!(&bytes[4..12], b"John Doe");
        assert!(bytes[12..104].iter().all(|b| *b == 0));
        assert_eq!(&bytes[104..108], &30i32.to_le_bytes());
        assert_eq!(&bytes[108..112], b"Male");
        assert_eq!(&bytes[118..120], &[0, 0]);
        assert_eq!(&bytes[120..124], &3u32.to_le_bytes());
        assert_eq!(&bytes[124..131], b"Sleeper");
    }

    #[test]
    fn decode_reverses_encode() {
        let booking = sample();
        assert_eq!(decode(&encode(&booking)), Ok(booking));
    }

    #[test]
    fn negative_age_survives() {
        let booking = Booking {
            age: -5,
            ..sample()
        };
        assert_eq!(decode(&encode(&booking)).map(|b| b.age), Ok(-5));
    }

    #[test]
    fn zero_id_is_malformed() {
        let booking = Booking {
            booking_id: 0,
            ..sample()
        };
        assert_eq!(decode(&encode(&booking)), Err(RecordError::ZeroBookingId));
    }

    #[test]
    fn id_past_signed_range_is_malformed() {
        // A negative C `int` id reads back as a huge unsigned value.
        let mut bytes = encode(&sample());
        bytes[ID_OFFSET..ID_OFFSET + 4].copy_from_slice(&(-1i32).to_le_bytes());
        assert_eq!(
            decode(&bytes),
            Err(RecordError::BookingIdOutOfRange(u32::MAX))
        );

        let edge = Booking {
            booking_id: MAX_BOOKING_ID,
            ..sample()
        };
        assert_eq!(decode(&encode(&edge)).map(|b| b.booking_id), Ok(MAX_BOOKING_ID));
    }

    #[test]
    fn unterminated_field_reads_to_width() {
        let mut bytes = encode(&sample());
        bytes[GENDER_OFFSET..GENDER_OFFSET + GENDER_LEN].copy_from_slice(b"ABCDEFGHIJ");
        let decoded = decode(&bytes).expect("record decodes");
        assert_eq!(decoded.gender, "ABCDEFGHIJ");
    }

    #[test]
    fn clamp_respects_char_boundaries() {
        assert_eq!(clamp_field("Sleeper", CLASS_LEN), "Sleeper");
        assert_eq!(clamp_field("abcdefghijk", GENDER_LEN), "abcdefghi");
        // 'é' is two bytes; a cut at byte 9 would split the fifth one.
        assert_eq!(clamp_field("éééééé", GENDER_LEN), "éééé");
        assert_eq!(clamp_field("anything", 0), "");
    }

    #[test]
    fn records_stop_before_partial_tail() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&encode(&sample()));
        bytes.extend_from_slice(&encode(&Booking {
            booking_id: 43,
            ..sample()
        }));
        bytes.extend_from_slice(&[7u8; 20]);

        let mut records = Records::new(&bytes);
        let ids: Vec<_> = records
            .by_ref()
            .map(|record| record.map(|b| b.booking_id))
            .collect();
        assert_eq!(ids, vec![Ok(42), Ok(43)]);
        assert_eq!(records.trailing(), 20);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Field-sized values come back unchanged
        #[test]
        fn fitting_values_survive(
            booking_id in 1..=MAX_BOOKING_ID,
            age in any::<i32>(),
            train_id in any::<u32>(),
            name in "[A-Za-z .'-]{1,99}",
            gender in "[A-Za-z]{0,9}",
            class in "[A-Za-z0-9 ]{0,19}",
        ) {
            let booking = Booking {
                booking_id,
                passenger_name: name,
                age,
                gender,
                train_id,
                travel_class: class,
            };
            prop_assert_eq!(decode(&encode(&booking)), Ok(booking));
        }

        /// Clamping always leaves room for the terminator
        #[test]
        fn clamp_fits(value in "\\PC{0,60}", width in 1usize..40) {
            let clamped = clamp_field(&value, width);
            prop_assert!(clamped.len() < width);
            prop_assert!(value.starts_with(clamped));
        }
    }
}
