//! Ticket identifiers and the configurable `Color-Letter-Number` format.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Colors accepted by the default ticket format.
pub const DEFAULT_COLORS: [&str; 4] = ["Blue", "Red", "Green", "Purple"];

/// Letters accepted by the default ticket format.
pub const DEFAULT_LETTERS: [char; 5] = ['A', 'B', 'C', 'D', 'E'];

/// A raffle ticket, e.g. `Blue-A-23`.
///
/// Tickets are compared by exact string equality, so `blue-a-23` and
/// `Blue-A-23` are distinct tickets even though both are well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticket(String);

impl Ticket {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The trailing number segment (`Purple-D-23` -> `23`).
    pub fn number_part(&self) -> &str {
        self.0.rsplit('-').next().unwrap_or(&self.0)
    }

    /// Render for display: the full identifier, or only the number.
    pub fn display(&self, full_format: bool) -> &str {
        if full_format {
            self.as_str()
        } else {
            self.number_part()
        }
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Ticket {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Ticket {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Ticket {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Inclusive bounds on the ticket number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberRange {
    pub min: u64,
    pub max: u64,
}

impl NumberRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, number: u64) -> bool {
        (self.min..=self.max).contains(&number)
    }
}

/// Structural parts of a well-formed ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketParts<'a> {
    pub color: &'a str,
    pub letter: char,
    pub number: &'a str,
}

/// The accepted ticket format: `^(Color1|Color2|...)-([Letters])-(\d+)$`,
/// case-insensitive on the color and letter segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketFormat {
    pub colors: Vec<String>,
    pub letters: Vec<char>,
    /// Optional cap on the number segment. `None` accepts any digit run.
    pub number_range: Option<NumberRange>,
}

impl Default for TicketFormat {
    fn default() -> Self {
        Self {
            colors: DEFAULT_COLORS.iter().map(|c| c.to_string()).collect(),
            letters: DEFAULT_LETTERS.to_vec(),
            number_range: None,
        }
    }
}

impl TicketFormat {
    /// The format as a regular expression, e.g.
    /// `^(Blue|Red|Green|Purple)-([ABCDE])-(\d+)$`.
    pub fn pattern(&self) -> String {
        let letters: String = self.letters.iter().collect();
        format!(r"^({})-([{}])-(\d+)$", self.colors.join("|"), letters)
    }

    /// Human-readable description shown alongside format errors.
    pub fn describe(&self) -> String {
        let color = self.colors.first().map(String::as_str).unwrap_or("Color");
        let letter = self.letters.first().copied().unwrap_or('A');
        format!("Color-Letter-Number (e.g., {color}-{letter}-23)")
    }

    /// Split an entry into its parts if it matches the pattern.
    ///
    /// Every configured color is tried in turn, so colors that share a
    /// prefix or contain a hyphen behave like regex alternation.
    pub fn parse<'a>(&self, entry: &'a str) -> Option<TicketParts<'a>> {
        self.colors.iter().find_map(|color| {
            let rest = strip_prefix_ignore_case(entry, color)?;
            let color_part = &entry[..entry.len() - rest.len()];
            let rest = rest.strip_prefix('-')?;

            let mut chars = rest.chars();
            let letter = chars.next()?;
            if !self.letters.iter().any(|&l| chars_eq_ignore_case(l, letter)) {
                return None;
            }
            let number = chars.as_str().strip_prefix('-')?;
            if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }

            Some(TicketParts {
                color: color_part,
                letter,
                number,
            })
        })
    }

    /// Check whether an entry matches the pattern.
    pub fn matches(&self, entry: &str) -> bool {
        self.parse(entry).is_some()
    }

    /// Check the number segment against the configured range.
    /// Always true when no range is configured.
    pub fn number_in_range(&self, parts: &TicketParts<'_>) -> bool {
        match self.number_range {
            None => true,
            Some(range) => parts
                .number
                .parse::<u64>()
                .map(|n| range.contains(n))
                .unwrap_or(false),
        }
    }
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = s.char_indices();
    for expected in prefix.chars() {
        let (_, actual) = chars.next()?;
        if !chars_eq_ignore_case(actual, expected) {
            return None;
        }
    }
    let end = chars.next().map_or(s.len(), |(i, _)| i);
    Some(&s[end..])
}
