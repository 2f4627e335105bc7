//! Shared domain models.

/// Identifier assigned to a committed booking.
pub type BookingId = u32;

/// Highest id a booking may carry.
///
/// The legacy file stores ids as a signed 32-bit `int`, so anything above
/// `i32::MAX` is out of range there.
pub const MAX_BOOKING_ID: BookingId = i32::MAX as BookingId;

/// Identifier of a train in the catalog.
pub type TrainId = u32;

/// A bookable train as defined by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Train {
    /// Catalog identifier.
    pub id: TrainId,
    /// Human-readable service name (e.g. `Express A`).
    pub name: String,
    /// Departure city.
    pub origin: String,
    /// Arrival city.
    pub destination: String,
    /// Fixed seat capacity.
    pub total_seats: usize,
}

impl Train {
    /// Build a train from display strings.
    pub fn new(
        id: TrainId,
        name: impl Into<String>,
        origin: impl Into<String>,
        destination: impl Into<String>,
        total_seats: usize,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            origin: origin.into(),
            destination: destination.into(),
            total_seats,
        }
    }

    /// Returns a user-facing label combining name and route.
    pub fn display_name(&self) -> String {
        format!("{} ({} -> {})", self.name, self.origin, self.destination)
    }
}

/// A committed reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    /// Unique, monotonically assigned identifier.
    pub booking_id: BookingId,
    /// Passenger display name.
    pub passenger_name: String,
    /// Passenger age; no range is enforced.
    pub age: i32,
    /// Free-text gender.
    pub gender: String,
    /// Train the seat is held on.
    pub train_id: TrainId,
    /// Free-text travel class (e.g. `Sleeper`, `AC`).
    pub travel_class: String,
}

impl Booking {
    /// Key under which two bookings are considered the same reservation.
    pub fn duplicate_key(&self) -> DuplicateKey {
        DuplicateKey::new(
            &self.passenger_name,
            self.age,
            self.train_id,
            &self.travel_class,
        )
    }
}

/// Unvalidated booking request as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingDraft {
    /// Passenger name; must not be blank.
    pub passenger_name: String,
    /// Passenger age.
    pub age: i32,
    /// Free-text gender.
    pub gender: String,
    /// Requested train.
    pub train_id: TrainId,
    /// Requested travel class.
    pub travel_class: String,
}

/// Normalized view of the fields used by duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DuplicateKey {
    name: String,
    age: i32,
    train_id: TrainId,
    travel_class: String,
}

impl DuplicateKey {
    /// Build a key, normalizing the free-text fields.
    pub fn new(passenger_name: &str, age: i32, train_id: TrainId, travel_class: &str) -> Self {
        Self {
            name: normalize(passenger_name),
            age,
            train_id,
            travel_class: normalize(travel_class),
        }
    }
}

/// Lowercase `input` and drop every whitespace character, including interior ones.
///
/// `"John Doe"` and `"johndoe"` normalize identically.
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Seats taken and left on a single train.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    /// Train the figures refer to.
    pub train: Train,
    /// Live bookings on the train.
    pub booked: usize,
    /// Seats left, never negative.
    pub available: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_case_and_all_whitespace() {
        assert_eq!(normalize("John Doe"), "johndoe");
        assert_eq!(normalize("  jOhN\tD o e\n"), "johndoe");
        assert_eq!(normalize("AC"), normalize(" a c "));
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn duplicate_key_ignores_gender_and_id() {
        let first = Booking {
            booking_id: 1,
            passenger_name: "John Doe".to_string(),
            age: 30,
            gender: "Male".to_string(),
            train_id: 1,
            travel_class: "AC".to_string(),
        };
        let second = Booking {
            booking_id: 7,
            passenger_name: "johndoe".to_string(),
            gender: "Other".to_string(),
            travel_class: "ac".to_string(),
            ..first.clone()
        };
        assert_eq!(first.duplicate_key(), second.duplicate_key());

        let older = Booking {
            age: 31,
            ..second.clone()
        };
        assert_ne!(first.duplicate_key(), older.duplicate_key());
    }

    #[test]
    fn train_display_name_includes_route() {
        let train = Train::new(3, "Intercity C", "Chennai", "Hyderabad", 60);
        assert_eq!(train.display_name(), "Intercity C (Chennai -> Hyderabad)");
    }
}
