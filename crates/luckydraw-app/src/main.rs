//! Main application entry point (native).

#[cfg(feature = "native")]
fn main() {
    use luckydraw_app::{Outcome, Shell};
    use luckydraw_core::storage::{MemoryStorage, create_default_storage};
    use luckydraw_core::DrawEngine;
    use std::io::{self, BufRead, Write};

    env_logger::init();
    log::info!("Starting Lucky Draw");

    let config = load_config();
    let storage = create_default_storage().unwrap_or_else(|e| {
        log::warn!("Falling back to in-memory storage: {}", e);
        Box::new(MemoryStorage::new())
    });
    let mut engine = DrawEngine::new(config, storage);
    engine.restore();

    let mut shell = Shell::new(engine);
    println!("{}", shell.greeting());

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        let _ = stdout.flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                log::error!("Failed to read input: {}", e);
                break;
            }
        }

        match shell.run_line(&line) {
            Ok(Outcome::Output(text)) if text.is_empty() => {}
            Ok(Outcome::Output(text)) => println!("{}", text),
            Ok(Outcome::Quit) => break,
            Err(e) => println!("{}", e),
        }
    }

    if shell.engine().has_unsaved_changes() {
        log::warn!("Exiting with changes that could not be saved");
    }
}

/// Read the engine configuration from the file named by `LUCKYDRAW_CONFIG`.
#[cfg(feature = "native")]
fn load_config() -> luckydraw_core::EngineConfig {
    let Ok(path) = std::env::var("LUCKYDRAW_CONFIG") else {
        return luckydraw_core::EngineConfig::default();
    };
    let parsed = std::fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|json| luckydraw_core::EngineConfig::from_json(&json).map_err(|e| e.to_string()));
    match parsed {
        Ok(config) => {
            log::info!("Loaded config from {}", path);
            config
        }
        Err(e) => {
            log::error!("Failed to load config {}: {}", path, e);
            luckydraw_core::EngineConfig::default()
        }
    }
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
