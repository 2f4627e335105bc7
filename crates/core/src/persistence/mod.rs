//! Durable storage for the booking set.

/// Fixed-layout record encoding.
pub mod record;

use std::{
    collections::HashSet,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::{
    error::{PersistenceError, WriteError},
    models::Booking,
};

pub use record::{Records, RECORD_LEN};

/// What to do with bytes after the last complete record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingBytes {
    /// Drop them with a warning; the legacy program did the same.
    #[default]
    Discard,
    /// Refuse to load the file.
    Reject,
}

/// The bookings file on disk.
#[derive(Debug, Clone)]
pub struct BookingFile {
    path: PathBuf,
    trailing: TrailingBytes,
}

impl BookingFile {
    /// Bind to `path`; trailing partial records are discarded.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            trailing: TrailingBytes::Discard,
        }
    }

    /// Override the trailing-bytes policy.
    pub fn with_trailing(mut self, trailing: TrailingBytes) -> Self {
        self.trailing = trailing;
        self
    }

    /// Location of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every booking in file order. A missing file is an empty set.
    pub fn load(&self) -> Result<Vec<Booking>, PersistenceError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no bookings file yet");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(PersistenceError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let mut records = Records::new(&bytes);
        let mut bookings = Vec::with_capacity(bytes.len() / RECORD_LEN);
        let mut seen = HashSet::new();
        for (index, record) in records.by_ref().enumerate() {
            let booking = record.map_err(|source| PersistenceError::Malformed {
                path: self.path.clone(),
                index,
                source,
            })?;
            if !seen.insert(booking.booking_id) {
                return Err(PersistenceError::DuplicateId {
                    path: self.path.clone(),
                    booking_id: booking.booking_id,
                });
            }
            bookings.push(booking);
        }

        let trailing = records.trailing();
        if trailing > 0 {
            match self.trailing {
                TrailingBytes::Discard => warn!(
                    path = %self.path.display(),
                    trailing,
                    "discarding partial record at end of bookings file"
                ),
                TrailingBytes::Reject => {
                    return Err(PersistenceError::Truncated {
                        path: self.path.clone(),
                        trailing,
                    })
                }
            }
        }

        info!(path = %self.path.display(), count = bookings.len(), "bookings loaded");
        Ok(bookings)
    }

    /// Replace the file with `bookings`, in the order given.
    ///
    /// The records go to a temporary file next to the destination which is
    /// then renamed over it, so readers see either the old set or the new one.
    pub fn save<'a>(
        &self,
        bookings: impl IntoIterator<Item = &'a Booking>,
    ) -> Result<(), WriteError> {
        self.write_all(bookings).map_err(|source| WriteError {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all<'a>(&self, bookings: impl IntoIterator<Item = &'a Booking>) -> io::Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let mut file = NamedTempFile::new_in(&parent)?;
        let mut count = 0usize;
        {
            let mut writer = io::BufWriter::new(file.as_file_mut());
            for booking in bookings {
                writer.write_all(&record::encode(booking))?;
                count += 1;
            }
            writer.flush()?;
        }
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|err| err.error)?;

        debug!(path = %self.path.display(), count, "bookings saved");
        Ok(())
    }
}
