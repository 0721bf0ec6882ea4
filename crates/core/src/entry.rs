// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log entries: decoding raw records and encoding them back.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MalformedEntryError;
use crate::raw::RawLogEntry;

/// Log severity, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    Severe,
    Error,
    Warning,
    Info,
    Normal,
    Debug,
    Config,
    Verbose,
    Finest,
}

impl LogLevel {
    pub const ALL: [LogLevel; 9] = [
        LogLevel::Severe,
        LogLevel::Error,
        LogLevel::Warning,
        LogLevel::Info,
        LogLevel::Normal,
        LogLevel::Debug,
        LogLevel::Config,
        LogLevel::Verbose,
        LogLevel::Finest,
    ];

    pub fn as_token(self) -> &'static str {
        match self {
            LogLevel::Severe => "SEVERE",
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARNING",
            LogLevel::Info => "INFO",
            LogLevel::Normal => "NORMAL",
            LogLevel::Debug => "DEBUG",
            LogLevel::Config => "CONFIG",
            LogLevel::Verbose => "VERBOSE",
            LogLevel::Finest => "FINEST",
        }
    }

    /// True if `self` is as severe as `threshold` or more.
    pub fn is_at_least(self, threshold: LogLevel) -> bool {
        self <= threshold
    }
}

impl FromStr for LogLevel {
    type Err = MalformedEntryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_token().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MalformedEntryError::UnknownLevel(s.to_string()))
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_token())
    }
}

/// One decoded line of execution output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEntry {
    /// Display only; never used for ordering.
    pub relative_time: String,
    pub absolute_time: Option<DateTime<Utc>>,
    pub level: LogLevel,
    pub message: String,
    pub user: Option<String>,
    pub command: Option<String>,
    pub node: Option<String>,
    pub entry_type: Option<String>,
    /// Step context as logged, possibly decorated (`"1/2e"`).
    pub step_context: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

crate::builder! {
    pub struct OutputEntryBuilder => OutputEntry {
        into {
            relative_time: String = "00:00:00",
            message: String = "line",
        }
        set {
            absolute_time: Option<DateTime<Utc>> = None,
            level: LogLevel = LogLevel::Normal,
            metadata: BTreeMap<String, String> = BTreeMap::new(),
        }
        option {
            user: String = None,
            command: String = None,
            node: String = None,
            entry_type: String = None,
            step_context: String = None,
        }
    }
}

/// Decode one raw record.
///
/// Unknown top-level keys join the metadata; non-string values keep their
/// JSON text. A key in both places takes the nested `metadata` value.
pub fn decode(raw: RawLogEntry) -> Result<OutputEntry, MalformedEntryError> {
    let level = raw.level.parse()?;
    let absolute_time = raw.absolute_time.as_deref().map(parse_time).transpose()?;
    let mut metadata = raw.metadata;
    for (key, value) in raw.extra {
        let text = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        metadata.entry(key).or_insert(text);
    }
    Ok(OutputEntry {
        relative_time: raw.time,
        absolute_time,
        level,
        message: raw.log,
        user: raw.user,
        command: raw.command,
        node: raw.node,
        entry_type: raw.entry_type,
        step_context: raw.stepctx,
        metadata,
    })
}

/// Encode an entry back into its raw shape; `decode(encode(e)) == e`.
///
/// Metadata goes back to the top level, except keys that would clash with
/// a field, which stay under `metadata`.
pub fn encode(entry: &OutputEntry) -> RawLogEntry {
    let (nested, top): (BTreeMap<_, _>, BTreeMap<_, _>) = entry
        .metadata
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .partition(|(k, _)| RawLogEntry::FIELD_KEYS.contains(&k.as_str()));
    RawLogEntry {
        time: entry.relative_time.clone(),
        absolute_time: entry.absolute_time.map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        level: entry.level.as_token().to_string(),
        log: entry.message.clone(),
        user: entry.user.clone(),
        command: entry.command.clone(),
        node: entry.node.clone(),
        entry_type: entry.entry_type.clone(),
        stepctx: entry.step_context.clone(),
        metadata: nested,
        extra: top.into_iter().map(|(k, v)| (k, Value::String(v))).collect(),
    }
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, MalformedEntryError> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| MalformedEntryError::BadTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Stable sort by absolute time.
///
/// An entry without an absolute time keeps the time of the entry before it,
/// so it stays next to its neighbours instead of moving to either end.
pub fn sort_by_time(entries: &mut [OutputEntry]) {
    let mut last = None;
    let mut keyed: Vec<(Option<DateTime<Utc>>, usize)> = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        last = entry.absolute_time.or(last);
        keyed.push((last, i));
    }
    keyed.sort();
    let order: Vec<usize> = keyed.into_iter().map(|(_, i)| i).collect();
    let sorted: Vec<OutputEntry> = order.iter().map(|&i| entries[i].clone()).collect();
    entries.clone_from_slice(&sorted);
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
