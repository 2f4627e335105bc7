//! Ticket artifacts written after a booking is committed.
//!
//! Nothing here feeds back into the booking set: a failed render leaves the
//! booking in place.

use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};
use qrcode::{Color, EcLevel, QrCode};
use tracing::info;

use crate::models::{Booking, Train};

/// Side length of the ASCII QR placeholder grid.
pub const PLACEHOLDER_DIM: u32 = 21;

/// Files produced for one booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketArtifacts {
    /// Plain-text ticket.
    pub ticket: PathBuf,
    /// ASCII placeholder standing in for a QR image.
    pub qr_placeholder: PathBuf,
    /// Scannable QR code as a plain PBM (P1) bitmap.
    pub qr_image: PathBuf,
}

/// Writes ticket files into a directory.
#[derive(Debug, Clone)]
pub struct TicketRenderer {
    root: PathBuf,
}

impl TicketRenderer {
    /// Renderer writing into `root`, created on first use.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory receiving the artifacts.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write the text ticket and the QR placeholder for `booking`.
    pub fn render(&self, booking: &Booking, train: Option<&Train>) -> Result<TicketArtifacts> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))?;

        let ticket = self.root.join(format!("booking_{}.txt", booking.booking_id));
        fs::write(&ticket, ticket_text(booking, train, Local::now()))
            .with_context(|| format!("failed to write {}", ticket.display()))?;

        let qr_placeholder = self
            .root
            .join(format!("booking_{}_qr.txt", booking.booking_id));
        fs::write(&qr_placeholder, qr_placeholder_text(booking))
            .with_context(|| format!("failed to write {}", qr_placeholder.display()))?;

        let qr_image = self
            .root
            .join(format!("booking_{}_qr.pbm", booking.booking_id));
        fs::write(&qr_image, qr_pbm(booking)?)
            .with_context(|| format!("failed to write {}", qr_image.display()))?;

        info!(booking_id = booking.booking_id, dir = %self.root.display(), "ticket rendered");
        Ok(TicketArtifacts {
            ticket,
            qr_placeholder,
            qr_image,
        })
    }
}

/// String a scanner would read from the booking's QR code.
pub fn qr_payload(booking: &Booking) -> String {
    format!(
        "BookingID:{};Name:{};Age:{};Train:{};Class:{}",
        booking.booking_id,
        booking.passenger_name,
        booking.age,
        booking.train_id,
        booking.travel_class
    )
}

/// Body of the plain-text ticket.
pub fn ticket_text(booking: &Booking, train: Option<&Train>, generated: DateTime<Local>) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "Booking ID: {}", booking.booking_id);
    let _ = writeln!(text, "Name: {}", booking.passenger_name);
    let _ = writeln!(text, "Age: {}", booking.age);
    let _ = writeln!(text, "Gender: {}", booking.gender);
    let _ = writeln!(text, "Train ID: {}", booking.train_id);
    if let Some(train) = train {
        let _ = writeln!(text, "Train: {}", train.display_name());
    }
    let _ = writeln!(text, "Class: {}", booking.travel_class);
    let _ = writeln!(text, "QR: {}", qr_payload(booking));
    let _ = writeln!(text, "Generated: {}", generated.format("%a %b %e %H:%M:%S %Y"));
    text
}

/// Deterministic block pattern seeded from the passenger name and booking id.
pub fn qr_placeholder_text(booking: &Booking) -> String {
    let seed = djb2(booking.passenger_name.as_bytes()) ^ booking.booking_id;
    let mut text = format!(
        "ASCII QR placeholder for Booking {}\n\n",
        booking.booking_id
    );
    for y in 0..PLACEHOLDER_DIM {
        for x in 0..PLACEHOLDER_DIM {
            let value = seed
                .wrapping_add(x.wrapping_mul(131))
                .wrapping_add(y.wrapping_mul(137))
                & 0xFF;
            text.push(if value % 3 == 0 { '#' } else { ' ' });
        }
        text.push('\n');
    }
    text
}

/// Encode the booking's QR payload as an ASCII PBM image, one module per pixel.
pub fn qr_pbm(booking: &Booking) -> Result<String> {
    let code = QrCode::with_error_correction_level(qr_payload(booking), EcLevel::L).map_err(
        |err| anyhow!("failed to encode QR for booking {}: {err}", booking.booking_id),
    )?;
    let width = code.width();
    let mut text = format!("P1\n{width} {width}\n");
    for row in code.to_colors().chunks(width) {
        for module in row {
            text.push_str(if *module == Color::Dark { "1 " } else { "0 " });
        }
        text.push('\n');
    }
    Ok(text)
}

fn djb2(bytes: &[u8]) -> u32 {
    bytes.iter().fold(5381u32, |hash, byte| {
        (hash << 5).wrapping_add(hash).wrapping_add(u32::from(*byte))
    })
}
