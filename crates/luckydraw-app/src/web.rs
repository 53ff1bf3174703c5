//! WebAssembly entry point and the JavaScript-facing engine handle.
//!
//! The page's own script owns the DOM, animation and file downloads; it
//! calls into [`LuckyDraw`] for every state change and renders the JSON
//! snapshot it gets back.

use luckydraw_core::session::{DrawRecord, Preferences, Session};
use luckydraw_core::setup;
use luckydraw_core::storage::{MemoryStorage, create_default_storage};
use luckydraw_core::{DrawEngine, EngineConfig, Ticket};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// What the page needs to render the current state.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionView<'a> {
    active: bool,
    pool_count: usize,
    total_tickets: usize,
    can_undo: bool,
    history: &'a [DrawRecord],
    preferences: &'a Preferences,
}

impl<'a> From<&'a Session> for SessionView<'a> {
    fn from(session: &'a Session) -> Self {
        Self {
            active: session.is_active(),
            pool_count: session.pool().len(),
            total_tickets: session.total_tickets(),
            can_undo: !session.history().is_empty(),
            history: session.history(),
            preferences: session.preferences(),
        }
    }
}

/// Engine handle exported to JavaScript.
#[wasm_bindgen]
pub struct LuckyDraw {
    engine: DrawEngine,
}

#[wasm_bindgen]
impl LuckyDraw {
    /// Create the engine and resume any session saved in `localStorage`.
    #[wasm_bindgen(constructor)]
    pub fn new() -> LuckyDraw {
        let storage = create_default_storage().unwrap_or_else(|e| {
            log::warn!("Falling back to in-memory storage: {}", e);
            Box::new(MemoryStorage::new())
        });
        let mut engine = DrawEngine::new(EngineConfig::default(), storage);
        if engine.restore() {
            log::info!("Resuming saved draw");
        }
        LuckyDraw { engine }
    }

    /// Current state as JSON.
    pub fn snapshot(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&SessionView::from(self.engine.snapshot()))?)
    }

    #[wasm_bindgen(js_name = isActive)]
    pub fn is_active(&self) -> bool {
        self.engine.is_active()
    }

    /// Whether closing the page would lose recorded draws.
    #[wasm_bindgen(js_name = hasDraws)]
    pub fn has_draws(&self) -> bool {
        self.engine.has_draws()
    }

    /// Number of tickets in the pending setup text.
    #[wasm_bindgen(js_name = ticketCount)]
    pub fn ticket_count(input: &str) -> usize {
        setup::parse_ticket_input(input).len()
    }

    /// Prepend `from..=to` for the selected color and letter to `existing`.
    #[wasm_bindgen(js_name = addRange)]
    pub fn add_range(&self, existing: &str, from: u32, to: u32) -> Result<String, JsError> {
        let prefs = self.engine.snapshot().preferences();
        let tickets = setup::ticket_range(
            &prefs.selected_color,
            prefs.selected_letter,
            u64::from(from),
            u64::from(to),
        )?;
        Ok(setup::prepend_tickets(existing, &tickets))
    }

    /// Prepend 1-100 for the selected color and letter to `existing`.
    #[wasm_bindgen(js_name = addHundred)]
    pub fn add_hundred(&self, existing: &str) -> Result<String, JsError> {
        let prefs = self.engine.snapshot().preferences();
        let tickets = setup::hundred_tickets(&prefs.selected_color, prefs.selected_letter)?;
        Ok(setup::prepend_tickets(existing, &tickets))
    }

    /// Sample tickets, one per line.
    #[wasm_bindgen(js_name = sampleTickets)]
    pub fn sample_tickets(&mut self) -> String {
        self.engine.sample_tickets().join("\n")
    }

    /// Commit the setup text as the ticket pool.
    #[wasm_bindgen(js_name = initializePool)]
    pub fn initialize_pool(&mut self, input: &str) -> Result<(), JsError> {
        let entries = setup::parse_ticket_input(input);
        Ok(self.engine.initialize_pool(&entries)?)
    }

    #[wasm_bindgen(js_name = quickLaunch)]
    pub fn quick_launch(&mut self) -> Result<(), JsError> {
        Ok(self.engine.quick_launch()?)
    }

    /// Draw winners; returns the committed draw as JSON.
    pub fn draw(&mut self, prize_name: &str, count: i32) -> Result<String, JsError> {
        let record = self.engine.draw(prize_name, i64::from(count))?;
        Ok(serde_json::to_string(&record)?)
    }

    /// Undo the latest draw; returns it as JSON, or nothing.
    pub fn undo(&mut self) -> Result<Option<String>, JsError> {
        match self.engine.undo() {
            Some(record) => Ok(Some(serde_json::to_string(&record)?)),
            None => Ok(None),
        }
    }

    #[wasm_bindgen(js_name = exportCsv)]
    pub fn export_csv(&self) -> Result<String, JsError> {
        Ok(self.engine.export_csv()?)
    }

    #[wasm_bindgen(js_name = exportFileName)]
    pub fn export_file_name(&self) -> String {
        self.engine.export_file_name()
    }

    /// Replace the preferences from JSON; missing keys take their defaults.
    #[wasm_bindgen(js_name = setPreferences)]
    pub fn set_preferences(&mut self, json: &str) -> Result<(), JsError> {
        let prefs: Preferences = serde_json::from_str(json)?;
        self.engine.set_preferences(prefs);
        Ok(())
    }

    /// Render a ticket per the display preference.
    #[wasm_bindgen(js_name = formatTicket)]
    pub fn format_ticket(&self, ticket: &str) -> String {
        self.engine.format_ticket(&Ticket::from(ticket)).to_string()
    }

    pub fn reset(&mut self) {
        self.engine.reset();
    }
}

impl Default for LuckyDraw {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialize logging when the module loads.
#[wasm_bindgen(start)]
pub fn run_wasm() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging
    console_log::init_with_level(log::Level::Info).expect("Failed to initialize logger");

    log::info!("Lucky Draw engine loaded");
}
