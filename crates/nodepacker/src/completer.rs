use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

/// Tab completion and hints for the interactive shell.
///
/// The first word completes to a command name. Arguments of `machines_zone`
/// complete to known zones and arguments of `manifests_read` to file paths.
pub struct ReplHelper {
    commands: Vec<(&'static str, &'static str)>,
    zones: Vec<String>,
    files: FilenameCompleter,
}

impl ReplHelper {
    pub fn new(commands: &[(&'static str, &'static str)], zones: Vec<String>) -> Self {
        let mut commands = commands.to_vec();
        commands.sort_by_key(|(name, _)| *name);
        Self {
            commands,
            zones,
            files: FilenameCompleter::new(),
        }
    }

    /// Replace the zone names offered for `machines_zone`
    pub fn set_zones(&mut self, zones: Vec<String>) {
        self.zones = zones;
    }

    fn command_candidates(&self, prefix: &str) -> Vec<Pair> {
        self.commands
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, description)| Pair {
                display: format!("{:<16} {}", name, description),
                replacement: name.to_string(),
            })
            .collect()
    }

    fn zone_candidates(&self, prefix: &str) -> Vec<Pair> {
        self.zones
            .iter()
            .filter(|zone| zone.starts_with(prefix))
            .map(|zone| Pair {
                display: zone.clone(),
                replacement: zone.clone(),
            })
            .collect()
    }

    /// Candidates that do not need the filesystem; `None` means file paths
    fn candidates(&self, line: &str, pos: usize) -> Option<(usize, Vec<Pair>)> {
        let before = &line[..pos];
        let word_start = before
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        let word = &before[word_start..];

        match before[..word_start].split_whitespace().next() {
            None => Some((word_start, self.command_candidates(word))),
            Some("machines_zone") => Some((word_start, self.zone_candidates(word))),
            Some("manifests_read") => None,
            Some(_) => Some((pos, Vec::new())),
        }
    }
}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        match self.candidates(line, pos) {
            Some(found) => Ok(found),
            None => self.files.complete(line, pos, ctx),
        }
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    /// Remainder of the command name when the typed prefix is unambiguous
    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if line.is_empty() || pos < line.len() || line.contains(char::is_whitespace) {
            return None;
        }

        let mut matches = self
            .commands
            .iter()
            .filter(|(name, _)| name.starts_with(line));
        match (matches.next(), matches.next()) {
            (Some((name, _)), None) => Some(name[line.len()..].to_string()),
            _ => None,
        }
    }
}

impl Highlighter for ReplHelper {}

impl Validator for ReplHelper {}

impl Helper for ReplHelper {}
