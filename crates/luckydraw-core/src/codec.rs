//! Versioned JSON encoding of a session.
//!
//! The layout keeps the camelCase keys of the original browser save
//! (`availableTickets`, `drawHistory`, `totalTickets` and the preference
//! flags at the top level) and adds a `version` tag. Saves without a tag
//! are read as version 0. Missing keys take their defaults and unknown
//! keys are ignored.

use crate::session::{DrawRecord, Preferences, Session};
use crate::ticket::Ticket;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current blob layout version.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("Invalid session data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported session version {found} (latest supported is {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("Inconsistent session data: {0}")]
    Inconsistent(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionBlobRef<'a> {
    version: u32,
    available_tickets: &'a [Ticket],
    draw_history: &'a [DrawRecord],
    total_tickets: usize,
    #[serde(flatten)]
    preferences: &'a Preferences,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct SessionBlob {
    version: Option<u32>,
    available_tickets: Vec<Ticket>,
    draw_history: Vec<DrawRecord>,
    total_tickets: usize,
    #[serde(flatten)]
    preferences: Preferences,
}

/// Encode a session as a JSON blob.
pub fn serialize(session: &Session) -> Result<String, serde_json::Error> {
    serde_json::to_string(&SessionBlobRef {
        version: FORMAT_VERSION,
        available_tickets: &session.pool,
        draw_history: &session.history,
        total_tickets: session.total_tickets,
        preferences: &session.preferences,
    })
}

/// Decode a JSON blob into a session, checking the pool/history invariants.
pub fn deserialize(blob: &str) -> Result<Session, DeserializeError> {
    let blob: SessionBlob = serde_json::from_str(blob)?;

    let version = blob.version.unwrap_or(0);
    if version > FORMAT_VERSION {
        return Err(DeserializeError::UnsupportedVersion {
            found: version,
            supported: FORMAT_VERSION,
        });
    }

    let mut session = Session {
        pool: blob.available_tickets,
        history: blob.draw_history,
        total_tickets: blob.total_tickets,
        preferences: blob.preferences,
    };
    if session.total_tickets == 0 {
        session.total_tickets = session.pool.len() + session.drawn_count();
    }
    session.verify().map_err(DeserializeError::Inconsistent)?;

    Ok(session)
}
