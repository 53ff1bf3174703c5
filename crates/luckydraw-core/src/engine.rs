//! The draw engine: owns the session and performs every state transition.

use crate::clock::{Clock, SystemClock};
use crate::codec::DeserializeError;
use crate::export::{self, ExportError, ExportRow};
use crate::random::{RandomSource, default_random, sample_indices};
use crate::session::{DrawRecord, Preferences, Session};
use crate::setup::{self, SetupError};
use crate::storage::{AutoSaver, DEFAULT_STORAGE_KEY, Storage};
use crate::ticket::{Ticket, TicketFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Accepted ticket format.
    pub format: TicketFormat,
    /// Key the session is persisted under.
    pub storage_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            format: TicketFormat::default(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Errors raised by [`DrawEngine::draw`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawError {
    #[error("Please enter a prize name")]
    MissingPrizeName,
    #[error("Please enter a valid number of winners")]
    InvalidCount,
    #[error("Cannot draw {requested} winners. Only {available} tickets remaining.")]
    InsufficientPool { requested: u64, available: usize },
}

/// Owns the session and applies setup, draw, undo and reset.
///
/// Every successful transition is written through the auto-saver before
/// the call returns, so the state a caller renders is already final.
pub struct DrawEngine {
    config: EngineConfig,
    session: Session,
    saver: AutoSaver,
    rng: Box<dyn RandomSource>,
    clock: Box<dyn Clock>,
}

impl DrawEngine {
    /// Create an engine with an empty session, the platform random source
    /// and the system clock.
    pub fn new(config: EngineConfig, storage: Box<dyn Storage>) -> Self {
        let saver = AutoSaver::new(storage, config.storage_key.clone());
        Self {
            config,
            session: Session::default(),
            saver,
            rng: default_random(),
            clock: Box::new(SystemClock),
        }
    }

    /// Replace the random source.
    pub fn with_random(mut self, rng: Box<dyn RandomSource>) -> Self {
        self.rng = rng;
        self
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Load the persisted session, if any.
    ///
    /// A missing or unreadable save, or one holding tickets outside the
    /// configured format, leaves the empty session in place. Returns true
    /// when a session in progress was resumed.
    pub fn restore(&mut self) -> bool {
        let loaded = self.saver.load().and_then(|session| {
            match session.check_format(&self.config.format) {
                Ok(()) => Some(session),
                Err(e) => {
                    log::error!("Failed to load state: {}", DeserializeError::Inconsistent(e));
                    None
                }
            }
        });
        match loaded {
            Some(session) => {
                log::info!(
                    "Restored session: {} of {} tickets in pool, {} draws",
                    session.pool().len(),
                    session.total_tickets(),
                    session.history().len()
                );
                self.session = session;
            }
            None => self.session = Session::default(),
        }
        self.session.is_active()
    }

    pub fn format(&self) -> &TicketFormat {
        &self.config.format
    }

    /// Read-only view of the session for rendering.
    pub fn snapshot(&self) -> &Session {
        &self.session
    }

    /// Whether setup has been completed.
    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    /// Whether leaving now would discard recorded draws.
    pub fn has_draws(&self) -> bool {
        !self.session.history().is_empty()
    }

    /// Whether the last change failed to reach storage.
    pub fn has_unsaved_changes(&self) -> bool {
        self.saver.is_dirty()
    }

    /// Commit the initial ticket list.
    pub fn initialize_pool<S: AsRef<str>>(&mut self, entries: &[S]) -> Result<(), SetupError> {
        if self.session.is_active() {
            return Err(SetupError::AlreadyInitialized);
        }
        let tickets = setup::validate_tickets(entries, &self.config.format)?;

        self.session.total_tickets = tickets.len();
        self.session.pool = tickets;
        self.session.history.clear();
        self.saver.persist(&self.session);

        log::info!("Pool initialized with {} tickets", self.session.total_tickets);
        Ok(())
    }

    /// Commit tickets 1-100 in one step, see [`setup::quick_launch_tickets`].
    pub fn quick_launch(&mut self) -> Result<(), SetupError> {
        let tickets = setup::quick_launch_tickets(&self.config.format)?;
        self.initialize_pool(&tickets)
    }

    /// Generate sample tickets using the engine's random source.
    pub fn sample_tickets(&mut self) -> Vec<String> {
        setup::sample_tickets(&self.config.format, self.rng.as_mut())
    }

    /// Draw `count` distinct winners for `prize_name`.
    ///
    /// Validation failures leave the session unchanged.
    pub fn draw(&mut self, prize_name: &str, count: i64) -> Result<DrawRecord, DrawError> {
        let prize_name = prize_name.trim();
        if prize_name.is_empty() {
            return Err(DrawError::MissingPrizeName);
        }
        let Ok(requested) = u64::try_from(count) else {
            return Err(DrawError::InvalidCount);
        };
        if requested == 0 {
            return Err(DrawError::InvalidCount);
        }
        let available = self.session.pool.len();
        if requested > available as u64 {
            return Err(DrawError::InsufficientPool { requested, available });
        }

        let picked = sample_indices(self.rng.as_mut(), available, requested as usize);
        let winners: Vec<Ticket> = picked.iter().map(|&i| self.session.pool[i].clone()).collect();

        let mut drawn = vec![false; available];
        for &i in &picked {
            drawn[i] = true;
        }
        let mut position = 0;
        self.session.pool.retain(|_| {
            let keep = !drawn[position];
            position += 1;
            keep
        });

        let record = DrawRecord::new(
            self.clock.now(),
            prize_name.to_string(),
            winners,
            self.session.pool.len(),
        );
        self.session.history.insert(0, record.clone());
        self.saver.persist(&self.session);

        log::info!(
            "Drew {} winners for '{}', {} tickets remaining",
            record.num_drawn(),
            record.prize_name(),
            record.remaining_pool_size()
        );
        Ok(record)
    }

    /// Undo the most recent draw, returning its winners to the pool.
    ///
    /// Returns the undone draw, or `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<DrawRecord> {
        if self.session.history.is_empty() {
            log::debug!("Nothing to undo");
            return None;
        }
        let record = self.session.history.remove(0);
        self.session.pool.extend(record.winners().iter().cloned());
        self.saver.persist(&self.session);

        log::info!(
            "Undid draw for '{}', {} tickets back in pool",
            record.prize_name(),
            record.num_drawn()
        );
        Some(record)
    }

    /// Export rows for the history, oldest draw first.
    pub fn export_rows(&self) -> Result<Vec<ExportRow>, ExportError> {
        export::export_rows(&self.session)
    }

    /// Export the history as CSV text.
    pub fn export_csv(&self) -> Result<String, ExportError> {
        Ok(export::to_csv(&self.export_rows()?))
    }

    /// Suggested file name for an export made now.
    pub fn export_file_name(&self) -> String {
        export::export_file_name(self.clock.now())
    }

    /// Update the display preferences.
    pub fn set_preferences(&mut self, preferences: Preferences) {
        if self.session.preferences == preferences {
            return;
        }
        self.session.preferences = preferences;
        self.saver.persist(&self.session);
    }

    /// Render a ticket according to the current format preference.
    pub fn format_ticket<'a>(&self, ticket: &'a Ticket) -> &'a str {
        ticket.display(self.session.preferences.show_full_format)
    }

    /// Discard the session and its saved copy.
    pub fn reset(&mut self) {
        self.session = Session::default();
        self.saver.clear();
        log::info!("Session reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::random::SeededRandom;
    use crate::setup::RangeError;
    use crate::storage::{MemoryStorage, StorageError, StorageResult};
    use std::collections::HashSet;
    use time::macros::datetime;

    fn engine_with(storage: MemoryStorage, seed: u64) -> DrawEngine {
        DrawEngine::new(EngineConfig::default(), Box::new(storage))
            .with_random(Box::new(SeededRandom::new(seed)))
            .with_clock(Box::new(FixedClock(datetime!(2025-03-14 21:05:07 UTC))))
    }

    fn engine() -> DrawEngine {
        engine_with(MemoryStorage::new(), 11)
    }

    fn three_ticket_engine() -> DrawEngine {
        let mut engine = engine();
        engine.initialize_pool(&["Blue-A-1", "Blue-A-2", "Blue-A-3"]).unwrap();
        engine
    }

    fn ticket_set(tickets: &[Ticket]) -> HashSet<Ticket> {
        tickets.iter().cloned().collect()
    }

    #[test]
    fn test_initialize_pool() {
        let engine = three_ticket_engine();
        let session = engine.snapshot();

        assert_eq!(
            session.pool(),
            &[Ticket::from("Blue-A-1"), Ticket::from("Blue-A-2"), Ticket::from("Blue-A-3")]
        );
        assert!(session.history().is_empty());
        assert_eq!(session.total_tickets(), 3);
        assert!(engine.is_active());
        assert!(!engine.has_draws());
    }

    #[test]
    fn test_initialize_pool_errors_leave_state() {
        let mut engine = engine();
        let empty: [&str; 0] = [];

        assert_eq!(engine.initialize_pool(&empty), Err(SetupError::EmptyInput));
        assert_eq!(
            engine.initialize_pool(&["Blue-A-1", "Blue-A-1"]),
            Err(SetupError::DuplicateTickets(1))
        );
        assert!(matches!(
            engine.initialize_pool(&["Blue-A-1", "Orange-A-2"]),
            Err(SetupError::InvalidFormat { .. })
        ));
        assert!(!engine.is_active());
        assert!(engine.snapshot().pool().is_empty());
    }

    #[test]
    fn test_initialize_twice_requires_reset() {
        let mut engine = three_ticket_engine();

        assert_eq!(engine.initialize_pool(&["Red-B-1"]), Err(SetupError::AlreadyInitialized));
        assert_eq!(engine.snapshot().total_tickets(), 3);

        engine.reset();
        engine.initialize_pool(&["Red-B-1"]).unwrap();
        assert_eq!(engine.snapshot().pool(), &[Ticket::from("Red-B-1")]);
    }

    #[test]
    fn test_draw_scenario_with_undo() {
        let mut engine = three_ticket_engine();
        let original = ticket_set(engine.snapshot().pool());

        let record = engine.draw("Prize X", 2).unwrap();
        assert_eq!(record.num_drawn(), 2);
        assert_eq!(record.winners().len(), 2);
        assert_eq!(record.remaining_pool_size(), 1);
        assert_eq!(record.prize_name(), "Prize X");
        assert_eq!(record.timestamp(), datetime!(2025-03-14 21:05:07 UTC));
        assert_eq!(engine.snapshot().pool().len(), 1);
        assert_eq!(engine.snapshot().history(), &[record.clone()]);

        let undone = engine.undo().unwrap();
        assert_eq!(undone, record);
        assert_eq!(ticket_set(engine.snapshot().pool()), original);
        assert_eq!(engine.snapshot().pool().len(), 3);
        assert!(engine.snapshot().history().is_empty());
    }

    #[test]
    fn test_draw_removes_exactly_the_winners() {
        let mut engine = engine();
        let entries = setup::hundred_tickets("Green", 'C').unwrap();
        engine.initialize_pool(&entries).unwrap();

        for k in [1, 5, 17, 30] {
            let before = ticket_set(engine.snapshot().pool());
            let record = engine.draw("Prize", k).unwrap();
            let winners = ticket_set(record.winners());
            let after = ticket_set(engine.snapshot().pool());

            assert_eq!(winners.len(), k as usize);
            assert!(winners.is_subset(&before));
            assert!(winners.is_disjoint(&after));
            let expected: HashSet<Ticket> = before.difference(&winners).cloned().collect();
            assert_eq!(after, expected);
        }
        assert!(engine.snapshot().verify().is_ok());
    }

    #[test]
    fn test_draw_keeps_remaining_order() {
        let mut engine = three_ticket_engine();
        let record = engine.draw("Prize", 1).unwrap();
        let expected: Vec<Ticket> = ["Blue-A-1", "Blue-A-2", "Blue-A-3"]
            .iter()
            .map(|t| Ticket::from(*t))
            .filter(|t| !record.winners().contains(t))
            .collect();
        assert_eq!(engine.snapshot().pool(), expected.as_slice());
    }

    #[test]
    fn test_draw_whole_pool() {
        let mut engine = three_ticket_engine();
        let record = engine.draw("Everything", 3).unwrap();
        assert_eq!(record.remaining_pool_size(), 0);
        assert!(engine.snapshot().pool().is_empty());
        assert_eq!(
            engine.draw("More", 1),
            Err(DrawError::InsufficientPool { requested: 1, available: 0 })
        );
    }

    #[test]
    fn test_draw_validation() {
        let mut engine = three_ticket_engine();
        let before = engine.snapshot().clone();

        assert_eq!(engine.draw("", 1), Err(DrawError::MissingPrizeName));
        assert_eq!(engine.draw("   ", 1), Err(DrawError::MissingPrizeName));
        assert_eq!(engine.draw("Prize", 0), Err(DrawError::InvalidCount));
        assert_eq!(engine.draw("Prize", -4), Err(DrawError::InvalidCount));
        assert_eq!(
            engine.draw("Prize", 999),
            Err(DrawError::InsufficientPool { requested: 999, available: 3 })
        );
        assert_eq!(engine.snapshot(), &before);
    }

    #[test]
    fn test_draw_trims_prize_name() {
        let mut engine = three_ticket_engine();
        let record = engine.draw("  Grand Prize \n", 1).unwrap();
        assert_eq!(record.prize_name(), "Grand Prize");
    }

    #[test]
    fn test_draw_error_messages() {
        let err = DrawError::InsufficientPool { requested: 5, available: 2 };
        assert_eq!(err.to_string(), "Cannot draw 5 winners. Only 2 tickets remaining.");
    }

    #[test]
    fn test_history_is_most_recent_first_and_chains() {
        let mut engine = engine();
        let entries = setup::hundred_tickets("Red", 'B').unwrap();
        engine.initialize_pool(&entries).unwrap();

        engine.draw("First", 10).unwrap();
        engine.draw("Second", 5).unwrap();
        engine.draw("Third", 1).unwrap();

        let history = engine.snapshot().history();
        let names: Vec<&str> = history.iter().map(|d| d.prize_name()).collect();
        assert_eq!(names, vec!["Third", "Second", "First"]);

        // Replay from the oldest draw.
        let mut pool_size = 100;
        for record in history.iter().rev() {
            assert_eq!(record.pool_size_before(), pool_size);
            pool_size = record.remaining_pool_size();
        }
        assert_eq!(pool_size, engine.snapshot().pool().len());
        assert!(engine.snapshot().verify().is_ok());
    }

    #[test]
    fn test_undo_walks_back_one_step_at_a_time() {
        let mut engine = three_ticket_engine();
        engine.draw("First", 1).unwrap();
        let after_first = engine.snapshot().clone();
        engine.draw("Second", 1).unwrap();

        assert_eq!(engine.undo().unwrap().prize_name(), "Second");
        assert_eq!(engine.snapshot().history(), after_first.history());
        assert_eq!(ticket_set(engine.snapshot().pool()), ticket_set(after_first.pool()));

        assert_eq!(engine.undo().unwrap().prize_name(), "First");
        assert!(engine.undo().is_none());
        assert_eq!(engine.snapshot().pool().len(), 3);
    }

    #[test]
    fn test_undo_on_empty_history_is_noop() {
        let mut engine = three_ticket_engine();
        let before = engine.snapshot().clone();

        assert!(engine.undo().is_none());
        assert_eq!(engine.snapshot(), &before);
    }

    #[test]
    fn test_undone_tickets_can_be_drawn_again() {
        let mut engine = three_ticket_engine();
        engine.draw("Prize", 3).unwrap();
        engine.undo();
        let record = engine.draw("Prize", 3).unwrap();
        assert_eq!(record.winners().len(), 3);
    }

    #[test]
    fn test_export_rows() {
        let mut engine = three_ticket_engine();
        assert_eq!(engine.export_rows(), Err(ExportError::NothingToExport));
        assert_eq!(engine.export_csv(), Err(ExportError::NothingToExport));

        engine.draw("First", 1).unwrap();
        engine.draw("Second", 2).unwrap();
        let rows = engine.export_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].prize_name, "First");
        assert_eq!(rows[1].prize_name, "Second");
        assert_eq!(rows[1].remaining_pool, 0);

        let csv = engine.export_csv().unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert_eq!(engine.export_file_name(), "lucky-draw-results-1741986307000.csv");
    }

    #[test]
    fn test_state_survives_restart() {
        let storage = MemoryStorage::new();
        let mut engine = engine_with(storage.clone(), 5);
        engine.initialize_pool(&["Blue-A-1", "Blue-A-2", "Blue-A-3"]).unwrap();
        engine.draw("Prize", 2).unwrap();
        let saved = engine.snapshot().clone();

        let mut resumed = engine_with(storage, 6);
        assert!(resumed.restore());
        assert_eq!(resumed.snapshot(), &saved);

        resumed.undo();
        assert_eq!(resumed.snapshot().pool().len(), 3);
    }

    #[test]
    fn test_restore_corrupt_blob_falls_back_to_empty() {
        let storage = MemoryStorage::new();
        storage.save(DEFAULT_STORAGE_KEY, "not json at all").unwrap();

        let mut engine = engine_with(storage, 1);
        assert!(!engine.restore());
        assert_eq!(engine.snapshot(), &Session::default());
        engine.initialize_pool(&["Blue-A-1"]).unwrap();
    }

    #[test]
    fn test_reset_clears_saved_state() {
        let storage = MemoryStorage::new();
        let mut engine = engine_with(storage.clone(), 1);
        engine.initialize_pool(&["Blue-A-1"]).unwrap();
        assert!(storage.exists(DEFAULT_STORAGE_KEY).unwrap());

        engine.reset();
        assert!(!engine.is_active());
        assert!(!storage.exists(DEFAULT_STORAGE_KEY).unwrap());
    }

    #[test]
    fn test_preferences_persist_and_format() {
        let storage = MemoryStorage::new();
        let mut engine = engine_with(storage.clone(), 1);
        let ticket = Ticket::from("Purple-D-23");
        assert_eq!(engine.format_ticket(&ticket), "Purple-D-23");

        engine.set_preferences(Preferences {
            show_full_format: false,
            ..Preferences::default()
        });
        assert_eq!(engine.format_ticket(&ticket), "23");

        let mut resumed = engine_with(storage, 1);
        resumed.restore();
        assert!(!resumed.snapshot().preferences().show_full_format);
    }

    #[test]
    fn test_quick_launch() {
        let mut engine = engine();
        engine.quick_launch().unwrap();
        let pool = engine.snapshot().pool();
        assert_eq!(pool.len(), 100);
        assert_eq!(pool[0], Ticket::from("Purple-D-1"));
        assert_eq!(pool[99], Ticket::from("Purple-D-100"));
    }

    #[test]
    fn test_custom_format_config() {
        let config = EngineConfig::from_json(
            r#"{"format": {"colors": ["Gold", "Silver"], "letters": ["X", "Y"]}}"#,
        )
        .unwrap();
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(config.format.pattern(), r"^(Gold|Silver)-([XY])-(\d+)$");

        let mut engine = DrawEngine::new(config, Box::new(MemoryStorage::new()));
        assert!(matches!(
            engine.initialize_pool(&["Blue-A-1"]),
            Err(SetupError::InvalidFormat { .. })
        ));
        engine.initialize_pool(&["gold-x-1", "Silver-Y-2"]).unwrap();
    }

    #[test]
    fn test_quick_launch_follows_configured_format() {
        let config =
            EngineConfig::from_json(r#"{"format": {"colors": ["Gold"], "letters": ["X"]}}"#)
                .unwrap();
        let mut engine = DrawEngine::new(config, Box::new(MemoryStorage::new()));
        engine.quick_launch().unwrap();
        assert_eq!(engine.snapshot().pool()[0], Ticket::from("Gold-X-1"));
        assert_eq!(engine.snapshot().total_tickets(), 100);

        let config = EngineConfig::from_json(r#"{"format": {"colors": []}}"#).unwrap();
        let mut engine = DrawEngine::new(config, Box::new(MemoryStorage::new()));
        assert_eq!(engine.quick_launch(), Err(SetupError::Range(RangeError::MissingSelection)));
        assert!(!engine.is_active());
    }

    #[test]
    fn test_restore_rejects_malformed_tickets() {
        let storage = MemoryStorage::new();
        storage
            .save(
                DEFAULT_STORAGE_KEY,
                r#"{"version":1,"availableTickets":["not a ticket","<script>"],"totalTickets":2}"#,
            )
            .unwrap();

        let mut engine = engine_with(storage, 1);
        assert!(!engine.restore());
        assert_eq!(engine.snapshot(), &Session::default());
    }

    #[test]
    fn test_restore_checks_against_configured_format() {
        let storage = MemoryStorage::new();
        let mut engine = engine_with(storage.clone(), 1);
        engine.initialize_pool(&["Blue-A-1", "Blue-A-2"]).unwrap();
        engine.draw("Prize", 1).unwrap();

        let config = EngineConfig::from_json(r#"{"format": {"colors": ["Gold"]}}"#).unwrap();
        let mut gold = DrawEngine::new(config, Box::new(storage.clone()));
        assert!(!gold.restore());

        let mut resumed = engine_with(storage, 2);
        assert!(resumed.restore());
    }

    /// Storage whose writes always fail.
    struct FailingStorage;

    impl Storage for FailingStorage {
        fn load(&self, _key: &str) -> StorageResult<Option<String>> {
            Ok(None)
        }

        fn save(&self, _key: &str, _blob: &str) -> StorageResult<()> {
            Err(StorageError::Io("disk full".to_string()))
        }

        fn delete(&self, _key: &str) -> StorageResult<()> {
            Err(StorageError::Io("disk full".to_string()))
        }
    }

    #[test]
    fn test_failed_save_keeps_changes() {
        let mut engine = DrawEngine::new(EngineConfig::default(), Box::new(FailingStorage))
            .with_random(Box::new(SeededRandom::new(4)));

        engine.initialize_pool(&["Blue-A-1", "Blue-A-2", "Blue-A-3"]).unwrap();
        assert!(engine.is_active());
        assert!(engine.has_unsaved_changes());

        let record = engine.draw("Prize", 2).unwrap();
        assert_eq!(engine.snapshot().pool().len(), 1);
        assert_eq!(engine.snapshot().history(), &[record.clone()]);
        assert!(engine.has_unsaved_changes());

        assert_eq!(engine.undo(), Some(record));
        assert_eq!(engine.snapshot().pool().len(), 3);
        assert!(engine.snapshot().history().is_empty());
        assert!(engine.has_unsaved_changes());
    }

    #[test]
    fn test_sample_tickets_commit() {
        let mut engine = engine();
        let samples = engine.sample_tickets();
        engine.initialize_pool(&samples).unwrap();
        assert_eq!(engine.snapshot().total_tickets(), 100);
    }
}
