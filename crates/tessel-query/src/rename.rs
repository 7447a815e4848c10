//! Per-compile table renaming.
//!
//! A [`RenameMap`] maps an original table name to a FIFO queue of aliases.
//! Every table declaration (FROM/JOIN) and every column reference consults
//! the map while rendering and consumes the next alias for its table, so the
//! N-th occurrence of a table in render order receives the N-th alias queued
//! for it. An exhausted or missing queue means the original name is used.
//!
//! Automatic disambiguation runs in two passes over the same render code:
//! the first pass uses a recording map that logs each lookup and never
//! renames, [`RenameMap::disambiguate`] turns that log into queues, and the
//! second pass consumes them.

use std::collections::{HashMap, VecDeque};

use tessel_config::RenameSettings;
use tracing::trace;

/// Whether an occurrence declares a table source or references one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccurrenceKind {
    /// The table itself in a FROM or JOIN clause.
    Declaration,
    /// A column of the table used anywhere in the statement.
    Reference,
}

/// One lookup recorded during the observation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub table: String,
    pub kind: OccurrenceKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameMap {
    queues: HashMap<String, VecDeque<String>>,
    recorded: Option<Vec<Occurrence>>,
}

impl RenameMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `aliases` for `table`, after any aliases already queued.
    pub fn with_aliases<I, S>(mut self, table: &str, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for alias in aliases {
            self.push_alias(table, alias);
        }
        self
    }

    pub fn push_alias(&mut self, table: &str, alias: impl Into<String>) {
        self.queues
            .entry(table.to_string())
            .or_default()
            .push_back(alias.into());
    }

    /// A map that records every lookup and never renames.
    pub(crate) fn recording() -> Self {
        Self {
            queues: HashMap::new(),
            recorded: Some(Vec::new()),
        }
    }

    pub(crate) fn is_recording(&self) -> bool {
        self.recorded.is_some()
    }

    pub(crate) fn into_occurrences(self) -> Vec<Occurrence> {
        self.recorded.unwrap_or_default()
    }

    /// Consumes the next alias queued for `table`.
    pub fn next_alias(&mut self, table: &str, kind: OccurrenceKind) -> Option<String> {
        if let Some(log) = self.recorded.as_mut() {
            log.push(Occurrence {
                table: table.to_string(),
                kind,
            });
            return None;
        }

        let queue = self.queues.get_mut(table)?;
        match queue.pop_front() {
            Some(alias) => {
                trace!(table = table, alias = %alias, ?kind, "renaming table occurrence");
                Some(alias)
            }
            None => {
                trace!(table = table, ?kind, "rename queue exhausted, keeping original name");
                None
            }
        }
    }

    /// Number of aliases still queued for `table`.
    pub fn remaining(&self, table: &str) -> usize {
        self.queues.get(table).map_or(0, VecDeque::len)
    }

    /// True when no alias is left in any queue.
    pub fn is_empty(&self) -> bool {
        self.queues.values().all(VecDeque::is_empty)
    }

    /// Builds the queues that give every table declared more than once its
    /// own alias.
    ///
    /// The k-th declaration of such a table gets `settings.alias_for(table, k)`;
    /// column references to it get the alias of its first declaration. Tables
    /// declared at most once are left alone.
    pub fn disambiguate(occurrences: &[Occurrence], settings: &RenameSettings) -> Self {
        let mut declarations: HashMap<&str, usize> = HashMap::new();
        for occurrence in occurrences {
            if occurrence.kind == OccurrenceKind::Declaration {
                *declarations.entry(occurrence.table.as_str()).or_default() += 1;
            }
        }

        let mut map = Self::new();
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for occurrence in occurrences {
            let table = occurrence.table.as_str();
            if declarations.get(table).copied().unwrap_or(0) < 2 {
                continue;
            }

            let alias = match occurrence.kind {
                OccurrenceKind::Declaration => {
                    let n = seen.entry(table).or_default();
                    *n += 1;
                    settings.alias_for(table, *n)
                }
                OccurrenceKind::Reference => settings.alias_for(table, 1),
            };
            map.push_alias(table, alias);
        }

        map
    }
}
