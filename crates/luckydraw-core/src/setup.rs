//! Ticket entry: parsing, validation and the bulk-add helpers.

use crate::random::RandomSource;
use crate::ticket::{NumberRange, Ticket, TicketFormat};
use std::collections::HashSet;
use thiserror::Error;

/// Number range enforced by the bulk-add helpers.
pub const BULK_NUMBER_RANGE: NumberRange = NumberRange::new(1, 100);

/// Color and letter used by [`quick_launch_tickets`] when the format accepts them.
pub const QUICK_LAUNCH_SELECTION: (&str, char) = ("Purple", 'D');

/// Number of tickets produced by [`sample_tickets`].
pub const SAMPLE_TICKET_COUNT: u64 = 100;

/// Errors raised while committing the initial ticket list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("Please enter tickets or generate sample tickets")]
    EmptyInput,
    #[error("Invalid ticket format found. Example: {example}\nExpected format: {expected}")]
    InvalidFormat { example: String, expected: String },
    #[error("Ticket {ticket} is outside the allowed range {min}-{max}")]
    OutOfRange { ticket: String, min: u64, max: u64 },
    #[error("Found {0} duplicate tickets. Please remove duplicates.")]
    DuplicateTickets(usize),
    #[error("A draw is already in progress. Reset before entering new tickets.")]
    AlreadyInitialized,
    #[error(transparent)]
    Range(#[from] RangeError),
}

/// Errors raised by the bulk-add helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("Please select Color and Letter buttons")]
    MissingSelection,
    #[error("Please enter both From and To numbers")]
    MissingBounds,
    #[error("From number must be less than or equal to To number")]
    Reversed,
    #[error("Numbers must be between {min} and {max}")]
    OutOfBounds { min: u64, max: u64 },
}

/// Split pasted ticket text into entries: one per line, trimmed, blanks dropped.
pub fn parse_ticket_input(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Validate a candidate ticket list against the format.
///
/// Checks run in order: empty list, format (first offending entry wins),
/// number range, then duplicates. Order of the list is preserved.
pub fn validate_tickets<S: AsRef<str>>(
    entries: &[S],
    format: &TicketFormat,
) -> Result<Vec<Ticket>, SetupError> {
    if entries.is_empty() {
        return Err(SetupError::EmptyInput);
    }

    for entry in entries {
        let entry = entry.as_ref();
        let Some(parts) = format.parse(entry) else {
            return Err(SetupError::InvalidFormat {
                example: entry.to_string(),
                expected: format.describe(),
            });
        };
        if !format.number_in_range(&parts) {
            let range = format.number_range.unwrap_or(BULK_NUMBER_RANGE);
            return Err(SetupError::OutOfRange {
                ticket: entry.to_string(),
                min: range.min,
                max: range.max,
            });
        }
    }

    let unique: HashSet<&str> = entries.iter().map(|e| e.as_ref()).collect();
    if unique.len() != entries.len() {
        return Err(SetupError::DuplicateTickets(entries.len() - unique.len()));
    }

    Ok(entries.iter().map(|e| Ticket::new(e.as_ref())).collect())
}

/// Generate `Color-Letter-from` through `Color-Letter-to`.
///
/// A zero bound counts as missing, matching an empty number field.
pub fn ticket_range(
    color: &str,
    letter: char,
    from: u64,
    to: u64,
) -> Result<Vec<String>, RangeError> {
    if color.is_empty() || letter.is_whitespace() {
        return Err(RangeError::MissingSelection);
    }
    if from == 0 || to == 0 {
        return Err(RangeError::MissingBounds);
    }
    if from > to {
        return Err(RangeError::Reversed);
    }
    if !BULK_NUMBER_RANGE.contains(from) || !BULK_NUMBER_RANGE.contains(to) {
        return Err(RangeError::OutOfBounds {
            min: BULK_NUMBER_RANGE.min,
            max: BULK_NUMBER_RANGE.max,
        });
    }
    Ok((from..=to).map(|i| format!("{color}-{letter}-{i}")).collect())
}

/// The full 1-100 run for one color and letter.
pub fn hundred_tickets(color: &str, letter: char) -> Result<Vec<String>, RangeError> {
    ticket_range(color, letter, BULK_NUMBER_RANGE.min, BULK_NUMBER_RANGE.max)
}

/// The 1-100 run committed by quick launch.
///
/// Uses `Purple-D` when the format accepts it, otherwise the format's first
/// color and letter.
pub fn quick_launch_tickets(format: &TicketFormat) -> Result<Vec<String>, RangeError> {
    let (color, letter) = QUICK_LAUNCH_SELECTION;
    if format.matches(&format!("{color}-{letter}-1")) {
        return hundred_tickets(color, letter);
    }
    match (format.colors.first(), format.letters.first()) {
        (Some(color), Some(&letter)) => hundred_tickets(color, letter),
        _ => Err(RangeError::MissingSelection),
    }
}

/// Put generated tickets ahead of whatever text is already entered.
pub fn prepend_tickets(existing: &str, tickets: &[String]) -> String {
    let existing = existing.trim();
    let generated = tickets.join("\n");
    if existing.is_empty() {
        generated
    } else {
        format!("{generated}\n{existing}")
    }
}

/// Numbered sample tickets with a random color and letter each.
pub fn sample_tickets(format: &TicketFormat, rng: &mut dyn RandomSource) -> Vec<String> {
    if format.colors.is_empty() || format.letters.is_empty() {
        return Vec::new();
    }
    (1..=SAMPLE_TICKET_COUNT)
        .map(|i| {
            let color = &format.colors[rng.below(format.colors.len())];
            let letter = format.letters[rng.below(format.letters.len())];
            format!("{color}-{letter}-{i}")
        })
        .collect()
}
