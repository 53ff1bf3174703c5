//! Lucky Draw Application
//!
//! Thin shells over the draw engine: a terminal command shell for native
//! builds and a JavaScript binding for the browser.

mod shell;

pub use shell::{Command, Outcome, Shell, ShellError};

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{LuckyDraw, run_wasm};
