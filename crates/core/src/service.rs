//! Validate-then-commit booking workflow.

use tracing::{info, warn};

use crate::{
    catalog::Catalog,
    config::AppConfig,
    error::BookingError,
    models::{Availability, Booking, BookingDraft, BookingId, Train, MAX_BOOKING_ID},
    persistence::{
        record::{clamp_field, CLASS_LEN, GENDER_LEN, NAME_LEN},
        BookingFile,
    },
    store::BookingStore,
};

/// Owns the catalog, the live booking set and its file.
///
/// Every mutation is written to disk before it is applied in memory; when the
/// write fails the store is left exactly as it was.
#[derive(Debug)]
pub struct BookingService {
    catalog: Catalog,
    store: BookingStore,
    file: BookingFile,
}

impl BookingService {
    /// Assemble a service from already-loaded parts.
    pub fn new(catalog: Catalog, store: BookingStore, file: BookingFile) -> Self {
        Self {
            catalog,
            store,
            file,
        }
    }

    /// Load the bookings file and pair it with `catalog`.
    pub fn open(catalog: Catalog, file: BookingFile) -> Result<Self, BookingError> {
        let store = BookingStore::load(&file)?;
        Ok(Self::new(catalog, store, file))
    }

    /// Open the configured bookings file against the standard catalog.
    pub fn from_config(config: &AppConfig) -> Result<Self, BookingError> {
        Self::open(Catalog::standard(), config.booking_file())
    }

    /// Trains on offer.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Live bookings, newest first.
    pub fn bookings(&self) -> impl Iterator<Item = &Booking> + '_ {
        self.store.all()
    }

    /// Number of live bookings.
    pub fn booking_count(&self) -> usize {
        self.store.len()
    }

    /// The train a booking refers to, if the catalog still has it.
    pub fn train_for(&self, booking: &Booking) -> Option<&Train> {
        self.catalog.find(booking.train_id)
    }

    /// Seats booked and left on every catalog train.
    pub fn availability(&self) -> Vec<Availability> {
        self.catalog
            .list()
            .iter()
            .map(|train| {
                let booked = self.store.count_for_train(train.id);
                Availability {
                    train: train.clone(),
                    booked,
                    available: train.total_seats.saturating_sub(booked),
                }
            })
            .collect()
    }

    /// Validate `draft` and commit it as a new booking.
    pub fn book(&mut self, draft: BookingDraft) -> Result<Booking, BookingError> {
        let passenger_name = clamp_field(draft.passenger_name.trim(), NAME_LEN);
        if passenger_name.is_empty() {
            return Err(BookingError::EmptyName);
        }

        let train = self
            .catalog
            .find(draft.train_id)
            .ok_or(BookingError::UnknownTrain(draft.train_id))?;

        if self.store.count_for_train(train.id) >= train.total_seats {
            return Err(BookingError::TrainFull {
                train_id: train.id,
                name: train.name.clone(),
                total_seats: train.total_seats,
            });
        }

        let booking_id = self.store.next_id().ok_or(BookingError::IdsExhausted {
            last: self.store.last_id().unwrap_or(MAX_BOOKING_ID),
        })?;

        let candidate = Booking {
            booking_id,
            passenger_name: passenger_name.to_string(),
            age: draft.age,
            gender: clamp_field(draft.gender.trim(), GENDER_LEN).to_string(),
            train_id: train.id,
            travel_class: clamp_field(draft.travel_class.trim(), CLASS_LEN).to_string(),
        };

        if let Some(existing) = self.store.find_duplicate(&candidate) {
            warn!(
                existing = existing.booking_id,
                train_id = candidate.train_id,
                "duplicate booking rejected"
            );
            return Err(BookingError::DuplicateBooking {
                existing: existing.booking_id,
            });
        }

        self.file
            .save(std::iter::once(&candidate).chain(self.store.all()))?;
        self.store.insert(candidate.clone());

        info!(
            booking_id = candidate.booking_id,
            train_id = candidate.train_id,
            "booking committed"
        );
        Ok(candidate)
    }

    /// Cancel a live booking and return it.
    pub fn cancel(&mut self, booking_id: BookingId) -> Result<Booking, BookingError> {
        if self.store.find(booking_id).is_none() {
            return Err(BookingError::NotFound(booking_id));
        }

        self.file.save(
            self.store
                .all()
                .filter(|booking| booking.booking_id != booking_id),
        )?;
        let removed = self
            .store
            .remove(booking_id)
            .ok_or(BookingError::NotFound(booking_id))?;

        info!(booking_id, train_id = removed.train_id, "booking cancelled");
        Ok(removed)
    }

    /// Look up a live booking.
    pub fn find(&self, booking_id: BookingId) -> Result<&Booking, BookingError> {
        self.store
            .find(booking_id)
            .ok_or(BookingError::NotFound(booking_id))
    }

    /// Rewrite the bookings file from memory.
    pub fn flush(&self) -> Result<(), BookingError> {
        self.file.save(self.store.all())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Train, TrainId};
    use anyhow::Result;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn draft(name: &str, age: i32, train_id: TrainId, class: &str) -> BookingDraft {
        BookingDraft {
            passenger_name: name.to_string(),
            age,
            gender: "Male".to_string(),
            train_id,
            travel_class: class.to_string(),
        }
    }

    fn service_in(dir: &TempDir, catalog: Catalog) -> Result<BookingService> {
        let file = BookingFile::new(dir.path().join("bookings.dat"));
        Ok(BookingService::open(catalog, file)?)
    }

    #[test]
    fn duplicate_and_cancel_scenario() -> Result<()> {
        let dir = tempdir()?;
        let mut service = service_in(&dir, Catalog::standard())?;

        let john = service.book(draft("John Doe", 30, 1, "AC"))?;
        assert_eq!(john.booking_id, 1);

        let err = service
            .book(draft("johndoe", 30, 1, "ac"))
            .expect_err("normalized duplicate");
        assert!(matches!(err, BookingError::DuplicateBooking { existing: 1 }));

        let jane = service.book(draft("Jane Roe", 30, 1, "AC"))?;
        assert_eq!(jane.booking_id, 2);

        let cancelled = service.cancel(1)?;
        assert_eq!(cancelled.passenger_name, "John Doe");
        assert!(matches!(service.find(1), Err(BookingError::NotFound(1))));

        let again = service.book(draft("John Doe", 30, 1, "AC"))?;
        assert_ne!(again.booking_id, 1);
        assert_eq!(again.booking_id, 3);
        Ok(())
    }

    #[test]
    fn one_seat_train_fills_up() -> Result<()> {
        let dir = tempdir()?;
        let catalog = Catalog::new(vec![Train::new(7, "Tiny", "Here", "There", 1)]);
        let mut service = service_in(&dir, catalog)?;

        service.book(draft("First Rider", 22, 7, "AC"))?;
        let err = service
            .book(draft("Second Rider", 23, 7, "AC"))
            .expect_err("no seats left");
        assert!(matches!(
            err,
            BookingError::TrainFull {
                train_id: 7,
                total_seats: 1,
                ..
            }
        ));

        let availability = service.availability();
        assert_eq!(availability[0].booked, 1);
        assert_eq!(availability[0].available, 0);
        Ok(())
    }

    #[test]
    fn seat_after_capacity_always_fails() -> Result<()> {
        let dir = tempdir()?;
        let catalog = Catalog::new(vec![Train::new(1, "Small", "A", "B", 3)]);
        let mut service = service_in(&dir, catalog)?;
        for n in 0..3 {
            service.book(draft(&format!("Rider {n}"), 30, 1, "AC"))?;
        }
        assert!(matches!(
            service.book(draft("Rider 3", 30, 1, "AC")),
            Err(BookingError::TrainFull { .. })
        ));

        service.cancel(2)?;
        assert!(service.book(draft("Rider 3", 30, 1, "AC")).is_ok());
        Ok(())
    }

    #[test]
    fn validation_runs_in_order() -> Result<()> {
        let dir = tempdir()?;
        let catalog = Catalog::new(vec![Train::new(1, "Tiny", "A", "B", 1)]);
        let mut service = service_in(&dir, catalog)?;

        assert!(matches!(
            service.book(draft("   ", 30, 99, "AC")),
            Err(BookingError::EmptyName)
        ));
        assert!(matches!(
            service.book(draft("Asha", 30, 99, "AC")),
            Err(BookingError::UnknownTrain(99))
        ));

        service.book(draft("Asha", 30, 1, "AC"))?;
        // Full trains are reported before duplicates.
        assert!(matches!(
            service.book(draft("Asha", 30, 1, "AC")),
            Err(BookingError::TrainFull { .. })
        ));
        Ok(())
    }

    #[test]
    fn fields_are_trimmed_and_clamped() -> Result<()> {
        let dir = tempdir()?;
        let mut service = service_in(&dir, Catalog::standard())?;
        let long_name = "x".repeat(150);
        let booking = service.book(BookingDraft {
            passenger_name: format!("  {long_name}  "),
            age: 44,
            gender: " Female-identifying ".to_string(),
            train_id: 2,
            travel_class: "  Second Class Sleeper Coach  ".to_string(),
        })?;
        assert_eq!(booking.passenger_name.len(), NAME_LEN - 1);
        assert_eq!(booking.gender, "Female-id");
        assert_eq!(booking.travel_class, "Second Class Sleepe");

        let reloaded = service_in(&dir, Catalog::standard())?;
        assert_eq!(reloaded.find(booking.booking_id)?, &booking);
        Ok(())
    }

    #[test]
    fn state_survives_reload() -> Result<()> {
        let dir = tempdir()?;
        {
            let mut service = service_in(&dir, Catalog::standard())?;
            service.book(draft("Asha", 30, 1, "AC"))?;
            service.book(draft("Ravi", 31, 2, "Sleeper"))?;
            service.book(draft("Meera", 32, 3, "2A"))?;
            service.cancel(3)?;
        }

        let mut service = service_in(&dir, Catalog::standard())?;
        assert_eq!(service.booking_count(), 2);
        assert!(service.find(3).is_err());
        assert_eq!(service.find(2)?.passenger_name, "Ravi");

        let next = service.book(draft("Kiran", 33, 4, "AC"))?;
        assert_eq!(next.booking_id, 3);
        assert!(matches!(
            service.book(draft("asha", 30, 1, "a c")),
            Err(BookingError::DuplicateBooking { existing: 1 })
        ));
        Ok(())
    }

    #[test]
    fn failed_write_commits_nothing() -> Result<()> {
        let dir = tempdir()?;
        let mut service = service_in(&dir, Catalog::standard())?;
        let kept = service.book(draft("Asha", 30, 1, "AC"))?;

        let path = dir.path().join("bookings.dat");
        fs::remove_file(&path)?;
        fs::create_dir(&path)?;

        assert!(matches!(
            service.book(draft("Ravi", 31, 1, "AC")),
            Err(BookingError::Io(_))
        ));
        assert_eq!(service.booking_count(), 1);
        assert_eq!(service.availability()[0].booked, 1);

        assert!(matches!(service.cancel(kept.booking_id), Err(BookingError::Io(_))));
        assert_eq!(service.find(kept.booking_id)?, &kept);

        fs::remove_dir(&path)?;
        let next = service.book(draft("Ravi", 31, 1, "AC"))?;
        assert_eq!(next.booking_id, 2);
        Ok(())
    }

    #[test]
    fn unknown_train_in_file_is_tolerated() -> Result<()> {
        let dir = tempdir()?;
        let file = BookingFile::new(dir.path().join("bookings.dat"));
        let stray = Booking {
            booking_id: 8,
            passenger_name: "Legacy".into(),
            age: 50,
            gender: "Other".into(),
            train_id: 42,
            travel_class: "AC".into(),
        };
        file.save([&stray])?;

        let service = BookingService::open(Catalog::standard(), file)?;
        let loaded = service.find(8)?;
        assert!(service.train_for(loaded).is_none());
        Ok(())
    }

    #[test]
    fn exhausted_ids_refuse_new_bookings() -> Result<()> {
        let dir = tempdir()?;
        let file = BookingFile::new(dir.path().join("bookings.dat"));
        let holder = Booking {
            booking_id: MAX_BOOKING_ID,
            passenger_name: "Last Holder".to_string(),
            age: 40,
            gender: "Female".to_string(),
            train_id: 1,
            travel_class: "AC".to_string(),
        };
        file.save([&holder])?;

        let mut service = BookingService::open(Catalog::standard(), file.clone())?;
        let err = service
            .book(draft("Next Rider", 30, 1, "AC"))
            .expect_err("no id left");
        assert!(matches!(
            err,
            BookingError::IdsExhausted {
                last: MAX_BOOKING_ID
            }
        ));
        assert_eq!(service.booking_count(), 1);

        let reopened = BookingService::open(Catalog::standard(), file)?;
        let ids: Vec<_> = reopened.bookings().map(|b| b.booking_id).collect();
        assert_eq!(ids, vec![MAX_BOOKING_ID]);
        Ok(())
    }

    #[test]
    fn cancelling_unknown_id_is_not_found() -> Result<()> {
        let dir = tempdir()?;
        let mut service = service_in(&dir, Catalog::standard())?;
        assert!(matches!(service.cancel(5), Err(BookingError::NotFound(5))));
        service.flush()?;
        assert!(dir.path().join("bookings.dat").exists());
        Ok(())
    }
}
