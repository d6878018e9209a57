//! Qualified command paths.
//!
//! A chat-input command is routed by its subcommand group and subcommand
//! names, joined by a space: `/welcomer set` → `"set"`,
//! `/backup schedule create` → `"schedule create"`. A command invoked without
//! either resolves to [`QualifiedPath::BASE`].

use std::fmt;

use discord_types::{CommandOption, OptionType};

/// Group and subcommand names collected from an option tree, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkedPath {
    segments: Vec<String>,
}

impl WalkedPath {
    /// Walks the option tree. Groups contribute their name and are descended
    /// into; subcommands contribute their name; plain arguments are skipped.
    ///
    /// Discord only ever sends one active subcommand per invocation, so this
    /// does not check for siblings.
    pub fn walk(options: &[CommandOption]) -> Self {
        let mut walked = Self::default();
        walked.append(options);
        walked
    }

    fn append(&mut self, options: &[CommandOption]) {
        for option in options {
            match option.option_type() {
                OptionType::SubcommandGroup => {
                    self.segments.push(option.name.clone());
                    self.append(&option.options);
                }
                OptionType::Subcommand => self.segments.push(option.name.clone()),
                _ => {}
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

/// Exact-match routing key for a command handler under its command name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedPath(String);

impl QualifiedPath {
    pub const BASE: &'static str = "BASE";

    pub fn base() -> Self {
        Self(Self::BASE.to_string())
    }

    /// Path for a handler registration, e.g. `"schedule create"`.
    ///
    /// Blank input registers the base handler.
    pub fn new(path: impl AsRef<str>) -> Self {
        let joined = path
            .as_ref()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if joined.is_empty() {
            Self::base()
        } else {
            Self(joined)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_base(&self) -> bool {
        self.0 == Self::BASE
    }
}

impl fmt::Display for QualifiedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves the path that selects a handler within one command.
///
/// Command execution and autocomplete use this same function, so both see
/// the same path for the same option tree.
pub fn resolve(walked: &WalkedPath) -> QualifiedPath {
    let joined = walked
        .segments
        .iter()
        .map(|segment| segment.trim())
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        QualifiedPath::base()
    } else {
        QualifiedPath(joined)
    }
}
