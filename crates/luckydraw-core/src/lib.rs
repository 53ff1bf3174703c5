//! Lucky Draw Core Library
//!
//! Platform-agnostic draw engine for the Lucky Draw raffle tool: ticket
//! validation, uniform draws without replacement, single-step undo,
//! history export and versioned persistence.

pub mod clock;
pub mod codec;
pub mod engine;
pub mod export;
pub mod random;
pub mod session;
pub mod setup;
pub mod storage;
pub mod ticket;

pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::{DeserializeError, FORMAT_VERSION};
pub use engine::{DrawEngine, DrawError, EngineConfig};
pub use export::{ExportError, ExportRow};
pub use random::{RandomSource, SeededRandom};
pub use session::{DrawId, DrawRecord, Preferences, Session};
pub use setup::{RangeError, SetupError};
pub use storage::{Storage, StorageError, StorageResult};
pub use ticket::{NumberRange, Ticket, TicketFormat};

#[cfg(not(target_arch = "wasm32"))]
pub use random::ThreadRandom;
