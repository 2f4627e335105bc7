#![warn(clippy::all, missing_docs)]

//! Core booking logic for the railbook reservation desk.
//!
//! This crate hosts the train catalog, the in-memory booking store with its
//! duplicate and capacity rules, the fixed-layout bookings file, and the
//! service that ties them together. Ticket rendering and configuration live
//! here too so any frontend can share them.

pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod persistence;
pub mod service;
pub mod store;
pub mod ticket;

pub use catalog::Catalog;
pub use config::AppConfig;
pub use error::{BookingError, PersistenceError, RecordError, WriteError};
pub use models::{
    Availability, Booking, BookingDraft, BookingId, Train, TrainId, MAX_BOOKING_ID,
};
pub use persistence::{BookingFile, TrailingBytes};
pub use service::BookingService;
pub use store::BookingStore;
pub use ticket::{TicketArtifacts, TicketRenderer};
