//! In-memory booking set.

use std::collections::{HashMap, VecDeque};

use crate::{
    error::PersistenceError,
    models::{Booking, BookingId, TrainId, MAX_BOOKING_ID},
    persistence::BookingFile,
};

/// Authoritative set of live bookings.
///
/// Iterates newest first. The store does not validate what it is given;
/// capacity and duplicate checks belong to the caller.
#[derive(Debug, Clone, Default)]
pub struct BookingStore {
    bookings: VecDeque<Booking>,
    occupancy: HashMap<TrainId, usize>,
    // Wider than `BookingId` so one past `u32::MAX` is representable.
    next_id: u64,
}

impl BookingStore {
    /// Empty store; the first id handed out is 1.
    pub fn new() -> Self {
        Self {
            bookings: VecDeque::new(),
            occupancy: HashMap::new(),
            next_id: 1,
        }
    }

    /// Build a store whose iteration order is `bookings` as given.
    pub fn from_bookings(bookings: impl IntoIterator<Item = Booking>) -> Self {
        let mut store = Self::new();
        for booking in bookings {
            store.track(&booking);
            store.bookings.push_back(booking);
        }
        store
    }

    /// Rebuild the store from the bookings file.
    pub fn load(file: &BookingFile) -> Result<Self, PersistenceError> {
        Ok(Self::from_bookings(file.load()?))
    }

    /// Id the next booking should receive.
    ///
    /// One more than the highest id ever held by this store, so a cancelled id
    /// is not handed out again while the process runs. `None` once that would
    /// pass [`MAX_BOOKING_ID`].
    pub fn next_id(&self) -> Option<BookingId> {
        BookingId::try_from(self.next_id.max(1))
            .ok()
            .filter(|id| *id <= MAX_BOOKING_ID)
    }

    /// Highest id this store has handed out or loaded, if any.
    pub fn last_id(&self) -> Option<BookingId> {
        self.next_id
            .checked_sub(1)
            .filter(|id| *id > 0)
            .and_then(|id| BookingId::try_from(id).ok())
    }

    /// Live bookings on `train_id`.
    pub fn count_for_train(&self, train_id: TrainId) -> usize {
        self.occupancy.get(&train_id).copied().unwrap_or(0)
    }

    /// First live booking that `candidate` duplicates, if any.
    pub fn find_duplicate(&self, candidate: &Booking) -> Option<&Booking> {
        let key = candidate.duplicate_key();
        self.bookings
            .iter()
            .filter(|booking| {
                booking.age == candidate.age && booking.train_id == candidate.train_id
            })
            .find(|booking| booking.duplicate_key() == key)
    }

    /// Whether `candidate` duplicates a live booking.
    pub fn is_duplicate(&self, candidate: &Booking) -> bool {
        self.find_duplicate(candidate).is_some()
    }

    /// Add a booking at the front of the set.
    pub fn insert(&mut self, booking: Booking) {
        self.track(&booking);
        self.bookings.push_front(booking);
    }

    /// Remove the booking with `booking_id`, returning it.
    pub fn remove(&mut self, booking_id: BookingId) -> Option<Booking> {
        let position = self
            .bookings
            .iter()
            .position(|booking| booking.booking_id == booking_id)?;
        let booking = self.bookings.remove(position)?;
        if let Some(count) = self.occupancy.get_mut(&booking.train_id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.occupancy.remove(&booking.train_id);
            }
        }
        Some(booking)
    }

    /// Look up a live booking.
    pub fn find(&self, booking_id: BookingId) -> Option<&Booking> {
        self.bookings
            .iter()
            .find(|booking| booking.booking_id == booking_id)
    }

    /// All live bookings, newest first.
    pub fn all(&self) -> impl Iterator<Item = &Booking> + '_ {
        self.bookings.iter()
    }

    /// Number of live bookings.
    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    /// Whether the store holds no bookings.
    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }

    fn track(&mut self, booking: &Booking) {
        *self.occupancy.entry(booking.train_id).or_insert(0) += 1;
        self.next_id = self.next_id.max(u64::from(booking.booking_id) + 1);
    }
}
