//! Tabular export of the draw history.

use crate::clock::{format_human, unix_millis};
use crate::session::{DrawRecord, Session};
use thiserror::Error;
use time::OffsetDateTime;

/// CSV header, in fixed column order.
pub const CSV_HEADER: &str = "Prize Name,Number of Winners,Winners,Timestamp,Remaining Pool";

/// Separator placed between winners in the Winners column.
pub const WINNER_SEPARATOR: &str = "; ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("No draws to export")]
    NothingToExport,
}

/// One exported draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub prize_name: String,
    pub winner_count: usize,
    pub winners: String,
    pub timestamp: String,
    pub remaining_pool: usize,
}

impl From<&DrawRecord> for ExportRow {
    fn from(draw: &DrawRecord) -> Self {
        let winners: Vec<&str> = draw.winners().iter().map(|t| t.as_str()).collect();
        Self {
            prize_name: draw.prize_name().to_string(),
            winner_count: draw.num_drawn(),
            winners: winners.join(WINNER_SEPARATOR),
            timestamp: format_human(draw.timestamp()),
            remaining_pool: draw.remaining_pool_size(),
        }
    }
}

impl ExportRow {
    /// Render as a CSV line without the trailing newline.
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{}",
            quote(&self.prize_name),
            self.winner_count,
            quote(&self.winners),
            quote(&self.timestamp),
            self.remaining_pool
        )
    }
}

/// Build export rows, oldest draw first.
pub fn export_rows(session: &Session) -> Result<Vec<ExportRow>, ExportError> {
    if session.history().is_empty() {
        return Err(ExportError::NothingToExport);
    }
    Ok(session.history().iter().rev().map(ExportRow::from).collect())
}

/// Render rows as CSV with a header line.
pub fn to_csv(rows: &[ExportRow]) -> String {
    let mut csv = String::with_capacity(CSV_HEADER.len() + rows.len() * 64);
    csv.push_str(CSV_HEADER);
    csv.push('\n');
    for row in rows {
        csv.push_str(&row.to_csv_line());
        csv.push('\n');
    }
    csv
}

/// Suggested download name, e.g. `lucky-draw-results-1735732800000.csv`.
pub fn export_file_name(at: OffsetDateTime) -> String {
    format!("lucky-draw-results-{}.csv", unix_millis(at))
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
