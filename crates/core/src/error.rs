//! Error types for the booking core.
//!
//! Load failures and write failures are kept apart: a corrupt file is a
//! [`PersistenceError`], a file that cannot be written is a [`WriteError`].

use std::{io, path::PathBuf};

use crate::models::{BookingId, TrainId};

/// A single fixed-layout record could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// Booking ids start at 1; zero never denotes a committed booking.
    #[error("booking id is zero")]
    ZeroBookingId,

    /// The id does not fit the file's signed 32-bit field.
    #[error("booking id {0} is out of range")]
    BookingIdOutOfRange(BookingId),
}

/// The bookings file exists but its contents could not be turned into bookings.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Reading the file failed.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The file ends inside a record and strict loading is enabled.
    #[error("{} ends with a partial record ({trailing} stray bytes)", .path.display())]
    Truncated {
        /// File that was being read.
        path: PathBuf,
        /// Bytes following the last complete record.
        trailing: usize,
    },

    /// A complete record failed to decode.
    #[error("record {index} in {} is malformed: {source}", .path.display())]
    Malformed {
        /// File that was being read.
        path: PathBuf,
        /// Zero-based record position within the file.
        index: usize,
        /// Decoding failure.
        #[source]
        source: RecordError,
    },

    /// Two records share a booking id.
    #[error("booking id {booking_id} appears more than once in {}", .path.display())]
    DuplicateId {
        /// File that was being read.
        path: PathBuf,
        /// The repeated id.
        booking_id: BookingId,
    },
}

/// The bookings file could not be written.
#[derive(Debug, thiserror::Error)]
#[error("failed to write {}: {source}", .path.display())]
pub struct WriteError {
    /// Destination that could not be replaced.
    pub path: PathBuf,
    /// Underlying I/O failure.
    #[source]
    pub source: io::Error,
}

/// Reasons a booking service operation can fail.
///
/// Every variant is recoverable: the caller reports it and carries on.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// The passenger name is blank after trimming.
    #[error("passenger name cannot be empty")]
    EmptyName,

    /// The requested train is not in the catalog.
    #[error("train {0} not found")]
    UnknownTrain(TrainId),

    /// Every seat on the train is taken.
    #[error("no seats available on {name} ({total_seats} seats)")]
    TrainFull {
        /// Train that was requested.
        train_id: TrainId,
        /// Display name of that train.
        name: String,
        /// Its capacity.
        total_seats: usize,
    },

    /// A live booking already holds the same passenger, age, train and class.
    #[error("duplicate of booking {existing}: a booking with the same details already exists")]
    DuplicateBooking {
        /// Id of the booking that clashes.
        existing: BookingId,
    },

    /// No live booking has the id.
    #[error("booking {0} not found")]
    NotFound(BookingId),

    /// Every id up to the highest storable one has been handed out.
    #[error("booking ids exhausted: no id is left above {last}")]
    IdsExhausted {
        /// Highest id the store has seen.
        last: BookingId,
    },

    /// The bookings file could not be loaded.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// The bookings file could not be written; nothing was committed.
    #[error(transparent)]
    Io(#[from] WriteError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = BookingError::UnknownTrain(9);
        assert_eq!(err.to_string(), "train 9 not found");

        let err = BookingError::TrainFull {
            train_id: 4,
            name: "Mail D".into(),
            total_seats: 50,
        };
        assert_eq!(err.to_string(), "no seats available on Mail D (50 seats)");

        let err = BookingError::NotFound(12);
        assert_eq!(err.to_string(), "booking 12 not found");

        let err = BookingError::from(PersistenceError::Truncated {
            path: PathBuf::from("bookings.dat"),
            trailing: 17,
        });
        assert_eq!(
            err.to_string(),
            "bookings.dat ends with a partial record (17 stray bytes)"
        );

        let err = BookingError::from(PersistenceError::Malformed {
            path: PathBuf::from("bookings.dat"),
            index: 2,
            source: RecordError::ZeroBookingId,
        });
        assert_eq!(
            err.to_string(),
            "record 2 in bookings.dat is malformed: booking id is zero"
        );
    }
}
