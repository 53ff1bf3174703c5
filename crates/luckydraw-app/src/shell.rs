//! Line-oriented command shell over the draw engine.
//!
//! The shell only translates text commands into engine calls and renders
//! the resulting state; all rules live in `luckydraw-core`.

use luckydraw_core::clock::format_time_of_day;
use luckydraw_core::setup::{self, RangeError, SetupError};
use luckydraw_core::{DrawEngine, DrawError, DrawRecord, ExportError, Preferences};
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to the user by the shell.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Unknown command '{0}'. Type `help` for a list of commands.")]
    UnknownCommand(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Enter tickets and run `start` before drawing")]
    NotStarted,
    #[error("'{0}' is not one of the configured options")]
    UnknownOption(String),
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error(transparent)]
    Draw(#[from] DrawError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Append tickets to the pending input.
    Add(Vec<String>),
    /// Prepend a numbered run for the selected color and letter.
    Range { from: u64, to: u64 },
    /// Prepend 1-100 for the selected color and letter.
    Hundred,
    Color(String),
    Letter(char),
    /// Replace the pending input with random sample tickets.
    Sample,
    Clear,
    Count,
    /// Commit the pending input as the ticket pool.
    Start,
    /// Commit 1-100 for the selected color and letter right away.
    Quick,
    Draw { count: i64, prize: String },
    Undo,
    Pool,
    History,
    Export(Option<PathBuf>),
    Format(bool),
    Animation(bool),
    Icons(bool),
    Reset,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, ShellError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let rest: Vec<&str> = words.collect();

        let command = match name.to_lowercase().as_str() {
            "add" => {
                if rest.is_empty() {
                    return Err(ShellError::Usage("add <ticket> [ticket...]"));
                }
                Command::Add(rest.iter().map(|s| s.to_string()).collect())
            }
            "range" => match rest.as_slice() {
                [from, to] => Command::Range {
                    from: parse_number(from),
                    to: parse_number(to),
                },
                _ => return Err(ShellError::Usage("range <from> <to>")),
            },
            "hundred" => Command::Hundred,
            "color" => match rest.as_slice() {
                [color] => Command::Color(color.to_string()),
                _ => return Err(ShellError::Usage("color <name>")),
            },
            "letter" => {
                let mut chars = rest.first().map(|s| s.chars()).into_iter().flatten();
                match (chars.next(), chars.next(), rest.len()) {
                    (Some(letter), None, 1) => Command::Letter(letter),
                    _ => return Err(ShellError::Usage("letter <letter>")),
                }
            }
            "sample" => Command::Sample,
            "clear" => Command::Clear,
            "count" => Command::Count,
            "start" => Command::Start,
            "quick" => Command::Quick,
            "draw" => match rest.split_first() {
                Some((count, prize)) => Command::Draw {
                    count: count.parse().unwrap_or(0),
                    prize: prize.join(" "),
                },
                None => return Err(ShellError::Usage("draw <count> <prize name>")),
            },
            "undo" => Command::Undo,
            "pool" => Command::Pool,
            "history" => Command::History,
            "export" => Command::Export(rest.first().map(PathBuf::from)),
            "format" => match rest.as_slice() {
                ["full"] => Command::Format(true),
                ["number"] => Command::Format(false),
                _ => return Err(ShellError::Usage("format full|number")),
            },
            "animation" => Command::Animation(parse_toggle(&rest, "animation on|off")?),
            "icons" => Command::Icons(parse_toggle(&rest, "icons on|off")?),
            "reset" => Command::Reset,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(ShellError::UnknownCommand(other.to_string())),
        };
        Ok(Some(command))
    }
}

/// Result of running a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Output(String),
    Quit,
}

/// Interactive shell state: the engine plus the ticket text being entered.
pub struct Shell {
    engine: DrawEngine,
    input: String,
}

impl Shell {
    pub fn new(engine: DrawEngine) -> Self {
        Self {
            engine,
            input: String::new(),
        }
    }

    pub fn engine(&self) -> &DrawEngine {
        &self.engine
    }

    /// Ticket text entered but not yet committed.
    pub fn pending_input(&self) -> &str {
        &self.input
    }

    /// Opening message, depending on whether a session was resumed.
    pub fn greeting(&self) -> String {
        if self.engine.is_active() {
            format!("Resumed draw in progress.\n{}", self.render_pool())
        } else {
            "Enter tickets with `add`, `range`, `hundred` or `sample`, then `start`. Type `help` for commands."
                .to_string()
        }
    }

    /// Parse and run one input line.
    pub fn run_line(&mut self, line: &str) -> Result<Outcome, ShellError> {
        match Command::parse(line)? {
            Some(command) => self.execute(command),
            None => Ok(Outcome::Output(String::new())),
        }
    }

    pub fn execute(&mut self, command: Command) -> Result<Outcome, ShellError> {
        let output = match command {
            Command::Add(tickets) => {
                if !self.input.trim().is_empty() {
                    self.input.push('\n');
                }
                self.input.push_str(&tickets.join("\n"));
                self.render_count()
            }
            Command::Range { from, to } => {
                let prefs = self.engine.snapshot().preferences();
                let tickets =
                    setup::ticket_range(&prefs.selected_color, prefs.selected_letter, from, to)?;
                self.input = setup::prepend_tickets(&self.input, &tickets);
                self.render_count()
            }
            Command::Hundred => {
                let prefs = self.engine.snapshot().preferences();
                let tickets = setup::hundred_tickets(&prefs.selected_color, prefs.selected_letter)?;
                self.input = setup::prepend_tickets(&self.input, &tickets);
                self.render_count()
            }
            Command::Color(color) => {
                let color = self
                    .engine
                    .format()
                    .colors
                    .iter()
                    .find(|c| c.eq_ignore_ascii_case(&color))
                    .cloned()
                    .ok_or(ShellError::UnknownOption(color))?;
                self.update_preferences(|prefs| prefs.selected_color = color.clone());
                format!("Selected color {color}")
            }
            Command::Letter(letter) => {
                let letter = self
                    .engine
                    .format()
                    .letters
                    .iter()
                    .copied()
                    .find(|l| l.eq_ignore_ascii_case(&letter))
                    .ok_or_else(|| ShellError::UnknownOption(letter.to_string()))?;
                self.update_preferences(|prefs| prefs.selected_letter = letter);
                format!("Selected letter {letter}")
            }
            Command::Sample => {
                self.input = self.engine.sample_tickets().join("\n");
                self.render_count()
            }
            Command::Clear => {
                self.input.clear();
                self.render_count()
            }
            Command::Count => self.render_count(),
            Command::Start => {
                let entries = setup::parse_ticket_input(&self.input);
                self.engine.initialize_pool(&entries)?;
                self.input.clear();
                self.render_pool()
            }
            Command::Quick => {
                self.engine.quick_launch()?;
                self.input.clear();
                self.render_pool()
            }
            Command::Draw { count, prize } => {
                if !self.engine.is_active() {
                    return Err(ShellError::NotStarted);
                }
                let record = self.engine.draw(&prize, count)?;
                self.render_draw(&record)
            }
            Command::Undo => match self.engine.undo() {
                Some(record) => format!(
                    "Undid '{}': {} tickets returned. {}",
                    record.prize_name(),
                    record.num_drawn(),
                    self.render_pool()
                ),
                None => "Nothing to undo".to_string(),
            },
            Command::Pool => self.render_pool(),
            Command::History => self.render_history(),
            Command::Export(path) => {
                let csv = self.engine.export_csv()?;
                let path = path.unwrap_or_else(|| PathBuf::from(self.engine.export_file_name()));
                std::fs::write(&path, csv)?;
                log::info!("Exported history to {}", path.display());
                format!(
                    "Exported {} draws to {}",
                    self.engine.snapshot().history().len(),
                    path.display()
                )
            }
            Command::Format(full) => {
                self.update_preferences(|prefs| prefs.show_full_format = full);
                let shown = if full { "Showing full tickets" } else { "Showing numbers only" };
                shown.to_string()
            }
            Command::Animation(on) => {
                self.update_preferences(|prefs| prefs.enable_animation = on);
                format!("Animation {}", if on { "on" } else { "off" })
            }
            Command::Icons(on) => {
                self.update_preferences(|prefs| prefs.icon_mode = on);
                format!("Icon mode {}", if on { "on" } else { "off" })
            }
            Command::Reset => {
                self.engine.reset();
                self.input.clear();
                "Everything cleared. Enter new tickets to start over.".to_string()
            }
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Outcome::Quit),
        };
        Ok(Outcome::Output(output))
    }

    fn update_preferences(&mut self, change: impl FnOnce(&mut Preferences)) {
        let mut prefs = self.engine.snapshot().preferences().clone();
        change(&mut prefs);
        self.engine.set_preferences(prefs);
    }

    fn render_count(&self) -> String {
        let count = setup::parse_ticket_input(&self.input).len();
        format!("({count} ticket{})", if count == 1 { "" } else { "s" })
    }

    fn render_pool(&self) -> String {
        let session = self.engine.snapshot();
        format!(
            "Pool: {} of {} tickets remaining",
            session.pool().len(),
            session.total_tickets()
        )
    }

    fn render_tickets(&self, record: &DrawRecord) -> String {
        let tickets: Vec<&str> = record
            .winners()
            .iter()
            .map(|t| self.engine.format_ticket(t))
            .collect();
        tickets.join("  ")
    }

    fn render_draw(&self, record: &DrawRecord) -> String {
        format!(
            "Winners for {}:\n  {}\n{}",
            record.prize_name(),
            self.render_tickets(record),
            self.render_pool()
        )
    }

    fn render_history(&self) -> String {
        let history = self.engine.snapshot().history();
        if history.is_empty() {
            return "No draws yet".to_string();
        }
        history
            .iter()
            .map(|record| {
                format!(
                    "{} | {} winner{}\n  {} | Remaining: {}\n  {}",
                    record.prize_name(),
                    record.num_drawn(),
                    if record.num_drawn() > 1 { "s" } else { "" },
                    format_time_of_day(record.timestamp()),
                    record.remaining_pool_size(),
                    self.render_tickets(record)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

const HELP: &str = "\
Setup:
  add <ticket>...        add tickets to the pending list
  color <name>           select the color for range/hundred
  letter <letter>        select the letter for range/hundred
  range <from> <to>      add a numbered run (1-100)
  hundred                add 1-100
  sample                 replace the list with 100 random sample tickets
  clear | count          clear or count the pending list
  start                  commit the pending list and begin drawing
  quick                  commit 1-100 for the selected color and letter
Drawing:
  draw <count> <prize>   draw winners for a prize
  undo                   return the most recent winners to the pool
  pool | history         show remaining tickets or past draws
  export [path]          write the history as CSV
Display:
  format full|number     show full tickets or numbers only
  animation on|off       toggle reveal animation
  icons on|off           toggle icon mode
Other:
  reset                  discard everything and start over
  quit";

/// Parse a bound the way a number field reads: anything unparsable is missing.
fn parse_number(text: &str) -> u64 {
    text.parse().unwrap_or(0)
}

fn parse_toggle(rest: &[&str], usage: &'static str) -> Result<bool, ShellError> {
    match rest {
        ["on"] => Ok(true),
        ["off"] => Ok(false),
        _ => Err(ShellError::Usage(usage)),
    }
}
