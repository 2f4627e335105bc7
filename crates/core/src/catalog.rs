//! The fixed list of bookable trains.

use once_cell::sync::Lazy;

use crate::models::{Train, TrainId};

static STANDARD_TRAINS: Lazy<Vec<Train>> = Lazy::new(|| {
    vec![
        Train::new(1, "Express A", "Mumbai", "Delhi", 100),
        Train::new(2, "Superfast B", "Kolkata", "Bangalore", 80),
        Train::new(3, "Intercity C", "Chennai", "Hyderabad", 60),
        Train::new(4, "Mail D", "Jaipur", "Lucknow", 50),
        Train::new(5, "Shatabdi E", "Ahmedabad", "Pune", 90),
    ]
});

/// Read-only train catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    trains: Vec<Train>,
}

impl Catalog {
    /// Catalog over an arbitrary train list, kept in the given order.
    pub fn new(trains: Vec<Train>) -> Self {
        Self { trains }
    }

    /// The five trains served by the booking office.
    pub fn standard() -> Self {
        Self::new(STANDARD_TRAINS.clone())
    }

    /// All trains in display order.
    pub fn list(&self) -> &[Train] {
        &self.trains
    }

    /// Look up a train by id.
    pub fn find(&self, train_id: TrainId) -> Option<&Train> {
        self.trains.iter().find(|train| train.id == train_id)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}
