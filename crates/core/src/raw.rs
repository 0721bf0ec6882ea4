// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Raw payload records, in the server's JSON shape.
//!
//! The transport layer fills these; nothing here is validated beyond what
//! serde needs. [`crate::build`] and [`crate::entry`] turn them into the
//! typed model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::id::ExecutionId;

/// Execution id as sent on the wire: a number in some payloads, a string in others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(u64),
    Text(String),
}

impl From<RawId> for ExecutionId {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Number(n) => ExecutionId::from(n),
            RawId::Text(s) => ExecutionId::from(s),
        }
    }
}

impl From<&ExecutionId> for RawId {
    fn from(id: &ExecutionId) -> Self {
        match id.as_str().parse::<u64>() {
            Ok(n) => RawId::Number(n),
            Err(_) => RawId::Text(id.to_string()),
        }
    }
}

/// Timing fields shared by every state record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTiming {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

/// State of one step on one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNodeState {
    /// Defaults to the owning step's context when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stepctx: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_state: Option<String>,
    #[serde(flatten)]
    pub timing: RawTiming,
}

/// State of one step, possibly fanned out over nodes or running a workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStepState {
    pub stepctx: String,
    /// Position in the parent workflow; inferred from order when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_num: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_state: Option<String>,
    #[serde(flatten)]
    pub timing: RawTiming,
    #[serde(default)]
    pub node_step: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_states: Option<BTreeMap<String, RawNodeState>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<Box<RawWorkflowState>>,
}

/// A workflow: the execution's top level, or a step's sub-workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWorkflowState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_state: Option<String>,
    #[serde(flatten)]
    pub timing: RawTiming,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_count: Option<u32>,
    #[serde(default)]
    pub target_nodes: Vec<String>,
    #[serde(default)]
    pub steps: Vec<RawStepState>,
}

/// Full state payload for one execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExecutionState {
    pub execution_id: RawId,
    #[serde(default)]
    pub all_nodes: Vec<String>,
    #[serde(flatten)]
    pub workflow: RawWorkflowState,
}

/// One log record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLogEntry {
    /// Display-only relative time, e.g. `"10:21:05"`.
    #[serde(default)]
    pub time: String,
    /// RFC 3339 timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_time: Option<String>,
    pub level: String,
    #[serde(default)]
    pub log: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stepctx: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    /// Top-level keys with no field of their own.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RawLogEntry {
    /// Keys a top-level metadata entry cannot use without clashing with a field.
    pub const FIELD_KEYS: [&'static str; 10] =
        ["time", "absolute_time", "level", "log", "user", "command", "node", "type", "stepctx", "metadata"];
}

/// Filter echoed back by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stepctx: Option<String>,
}

/// One chunk of execution output, starting at the requested offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOutput {
    pub id: RawId,
    #[serde(deserialize_with = "lenient_u64")]
    pub offset: u64,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub exec_completed: bool,
    #[serde(default)]
    pub has_failed_nodes: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec_state: Option<String>,
    /// Epoch milliseconds.
    #[serde(default, deserialize_with = "lenient_opt_u64", skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<u64>,
    /// Milliseconds.
    #[serde(default, deserialize_with = "lenient_opt_u64", skip_serializing_if = "Option::is_none")]
    pub exec_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_loaded: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_u64", skip_serializing_if = "Option::is_none")]
    pub total_size: Option<u64>,
    #[serde(default)]
    pub unmodified: bool,
    #[serde(default)]
    pub empty: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<RawFilter>,
    #[serde(default)]
    pub entries: Vec<RawLogEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrText {
    Num(u64),
    Text(String),
}

impl NumOrText {
    fn into_u64<E: serde::de::Error>(self) -> Result<u64, E> {
        match self {
            NumOrText::Num(n) => Ok(n),
            NumOrText::Text(s) => s.trim().parse().map_err(E::custom),
        }
    }
}

/// The server sends some counters as strings (`"offset": "1024"`).
fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    NumOrText::deserialize(deserializer)?.into_u64()
}

fn lenient_opt_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Option::<NumOrText>::deserialize(deserializer)?.map(NumOrText::into_u64).transpose()
}

#[cfg(test)]
#[path = "raw_tests.rs"]
mod tests;
