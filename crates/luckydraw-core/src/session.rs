//! Session state: ticket pool, draw history and display preferences.

use crate::ticket::{Ticket, TicketFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use time::OffsetDateTime;
use uuid::Uuid;

/// Unique identifier of a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawDrawId", into = "Uuid")]
pub struct DrawId(Uuid);

impl DrawId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for DrawId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DrawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<DrawId> for Uuid {
    fn from(id: DrawId) -> Self {
        id.0
    }
}

/// Older saves used a millisecond timestamp as the draw id.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDrawId {
    Uuid(Uuid),
    Millis(u64),
}

impl From<RawDrawId> for DrawId {
    fn from(raw: RawDrawId) -> Self {
        match raw {
            RawDrawId::Uuid(id) => Self(id),
            RawDrawId::Millis(ms) => Self(Uuid::from_u64_pair(0, ms)),
        }
    }
}

/// One completed draw. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawRecord {
    id: DrawId,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
    prize_name: String,
    num_drawn: usize,
    winners: Vec<Ticket>,
    remaining_pool_size: usize,
}

impl DrawRecord {
    pub(crate) fn new(
        timestamp: OffsetDateTime,
        prize_name: String,
        winners: Vec<Ticket>,
        remaining_pool_size: usize,
    ) -> Self {
        Self {
            id: DrawId::new(),
            timestamp,
            prize_name,
            num_drawn: winners.len(),
            winners,
            remaining_pool_size,
        }
    }

    pub fn id(&self) -> DrawId {
        self.id
    }

    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    pub fn prize_name(&self) -> &str {
        &self.prize_name
    }

    pub fn num_drawn(&self) -> usize {
        self.num_drawn
    }

    /// Winners in the order they were picked.
    pub fn winners(&self) -> &[Ticket] {
        &self.winners
    }

    /// Pool size immediately after this draw.
    pub fn remaining_pool_size(&self) -> usize {
        self.remaining_pool_size
    }

    /// Pool size immediately before this draw.
    pub fn pool_size_before(&self) -> usize {
        self.remaining_pool_size + self.num_drawn
    }
}

/// Presentation preferences stored alongside the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    /// Color preselected for the bulk-add helper.
    pub selected_color: String,
    /// Letter preselected for the bulk-add helper.
    pub selected_letter: char,
    /// Show `Color-Letter-Number` rather than just the number.
    pub show_full_format: bool,
    pub enable_animation: bool,
    pub icon_mode: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            selected_color: "Purple".to_string(),
            selected_letter: 'D',
            show_full_format: true,
            enable_animation: true,
            icon_mode: false,
        }
    }
}

/// The whole state of one raffle run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub(crate) pool: Vec<Ticket>,
    /// Most recent draw first.
    pub(crate) history: Vec<DrawRecord>,
    pub(crate) total_tickets: usize,
    pub(crate) preferences: Preferences,
}

impl Session {
    /// Tickets still eligible to be drawn.
    pub fn pool(&self) -> &[Ticket] {
        &self.pool
    }

    /// Completed draws, most recent first.
    pub fn history(&self) -> &[DrawRecord] {
        &self.history
    }

    /// Size of the ticket universe committed at setup.
    pub fn total_tickets(&self) -> usize {
        self.total_tickets
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Whether setup has been completed.
    pub fn is_active(&self) -> bool {
        self.total_tickets > 0
    }

    /// Total number of tickets held by draws in the history.
    pub fn drawn_count(&self) -> usize {
        self.history.iter().map(DrawRecord::num_drawn).sum()
    }

    /// Check the pool/history invariants.
    ///
    /// Every ticket appears at most once across the pool and all winner
    /// lists, their union has `total_tickets` members, and each record's
    /// remaining size chains to the next newer one.
    pub fn verify(&self) -> Result<(), String> {
        let mut seen: HashSet<&Ticket> = HashSet::with_capacity(self.total_tickets);
        let held = self.history.iter().flat_map(|d| d.winners.iter());
        for ticket in self.pool.iter().chain(held) {
            if !seen.insert(ticket) {
                return Err(format!("ticket {ticket} appears more than once"));
            }
        }
        if seen.len() != self.total_tickets {
            return Err(format!(
                "{} tickets tracked but total is {}",
                seen.len(),
                self.total_tickets
            ));
        }

        for record in &self.history {
            if record.winners.len() != record.num_drawn {
                return Err(format!(
                    "draw {} lists {} winners but records {}",
                    record.id,
                    record.winners.len(),
                    record.num_drawn
                ));
            }
        }

        let mut expected_remaining = self.pool.len();
        for record in &self.history {
            if record.remaining_pool_size != expected_remaining {
                return Err(format!(
                    "draw {} records {} remaining, expected {}",
                    record.id, record.remaining_pool_size, expected_remaining
                ));
            }
            expected_remaining = record.pool_size_before();
        }

        Ok(())
    }

    /// Check that every pool and winner ticket matches `format`.
    pub fn check_format(&self, format: &TicketFormat) -> Result<(), String> {
        let held = self.history.iter().flat_map(|d| d.winners.iter());
        match self.pool.iter().chain(held).find(|t| !format.matches(t.as_str())) {
            Some(ticket) => Err(format!("ticket {ticket:?} does not match {}", format.pattern())),
            None => Ok(()),
        }
    }
}
