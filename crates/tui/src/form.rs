//! Input state for the booking form and numeric prompts.

use anyhow::{anyhow, bail, Result};
use railbook_core::{BookingDraft, BookingId};

const MAX_INPUT_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Age,
    Gender,
    Train,
    Class,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Name,
        Field::Age,
        Field::Gender,
        Field::Train,
        Field::Class,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Passenger name",
            Field::Age => "Age",
            Field::Gender => "Gender (Male/Female/Other)",
            Field::Train => "Train ID",
            Field::Class => "Travel class (e.g. Sleeper, AC, 2A)",
        }
    }

    fn numeric(self) -> bool {
        matches!(self, Field::Age | Field::Train)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookingForm {
    values: [String; 5],
    focus: usize,
}

impl BookingForm {
    pub fn focus(&self) -> Field {
        Field::ALL[self.focus]
    }

    pub fn value(&self, field: Field) -> &str {
        &self.values[Self::index(field)]
    }

    pub fn on_last_field(&self) -> bool {
        self.focus + 1 == Field::ALL.len()
    }

    pub fn move_focus(&mut self, delta: isize) {
        let len = Field::ALL.len() as isize;
        self.focus = (self.focus as isize + delta).rem_euclid(len) as usize;
    }

    pub fn insert(&mut self, ch: char) {
        let field = self.focus();
        if field.numeric() && !(ch.is_ascii_digit() || ch == '-') {
            return;
        }
        let value = &mut self.values[self.focus];
        if value.chars().count() < MAX_INPUT_LEN {
            value.push(ch);
        }
    }

    pub fn backspace(&mut self) {
        self.values[self.focus].pop();
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Parse the form into a draft, moving focus to the first field in error.
    pub fn to_draft(&mut self) -> Result<BookingDraft> {
        let passenger_name = self.value(Field::Name).trim().to_string();
        if passenger_name.is_empty() {
            self.focus = Self::index(Field::Name);
            bail!("Name cannot be empty");
        }

        let age = match self.value(Field::Age).trim().parse::<i32>() {
            Ok(age) => age,
            Err(_) => {
                self.focus = Self::index(Field::Age);
                bail!("Invalid age: enter a whole number");
            }
        };

        let train_id = match self.value(Field::Train).trim().parse::<u32>() {
            Ok(id) => id,
            Err(_) => {
                self.focus = Self::index(Field::Train);
                bail!("Invalid train ID: enter a number from the train list");
            }
        };

        Ok(BookingDraft {
            passenger_name,
            age,
            gender: self.value(Field::Gender).trim().to_string(),
            train_id,
            travel_class: self.value(Field::Class).trim().to_string(),
        })
    }

    fn index(field: Field) -> usize {
        Field::ALL
            .iter()
            .position(|candidate| *candidate == field)
            .unwrap_or(0)
    }
}

/// Parse a booking id typed at a prompt.
pub fn parse_booking_id(input: &str) -> Result<BookingId> {
    let trimmed = input.trim();
    let id = trimmed
        .parse::<BookingId>()
        .map_err(|_| anyhow!("Invalid input: {trimmed:?} is not a booking ID"))?;
    if id == 0 {
        bail!("Invalid input: booking IDs start at 1");
    }
    Ok(id)
}
