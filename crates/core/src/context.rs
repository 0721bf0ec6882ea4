// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step context ids: where a step sits inside nested workflows.
//!
//! `"2/1/3"` is the third step of the workflow run by the first step of the
//! workflow run by the second top-level step. Segments are 1-indexed.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::MalformedStateError;

/// A "/"-delimited path of 1-indexed step numbers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StepContextId(Vec<NonZeroU32>);

impl StepContextId {
    /// Top-level step `step_num`.
    pub fn root(step_num: NonZeroU32) -> Self {
        Self(vec![step_num])
    }

    /// Step `step_num` of the workflow owned by this step.
    pub fn child(&self, step_num: NonZeroU32) -> Self {
        let mut path = self.0.clone();
        path.push(step_num);
        Self(path)
    }

    pub fn parent(&self) -> Option<Self> {
        match self.0.split_last() {
            Some((_, rest)) if !rest.is_empty() => Some(Self(rest.to_vec())),
            _ => None,
        }
    }

    /// Position within the immediate parent workflow.
    pub fn step_num(&self) -> NonZeroU32 {
        // A parsed or constructed id always has at least one segment
        self.0.last().copied().unwrap_or(NonZeroU32::MIN)
    }

    /// Nesting depth; top-level steps have depth 1.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn segments(&self) -> &[NonZeroU32] {
        &self.0
    }

    /// True if `self` is `other` or nested anywhere beneath it.
    pub fn starts_with(&self, other: &StepContextId) -> bool {
        self.0.starts_with(&other.0)
    }

    /// Check the id against the step number reported alongside it.
    pub fn check_step_num(&self, step_num: u32) -> Result<(), MalformedStateError> {
        if self.step_num().get() == step_num {
            Ok(())
        } else {
            Err(MalformedStateError::ContextMismatch { stepctx: self.to_string(), step_num })
        }
    }
}

impl FromStr for StepContextId {
    type Err = MalformedStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || MalformedStateError::BadContextId(s.to_string());
        if s.is_empty() {
            return Err(bad());
        }
        s.split('/')
            .map(|seg| seg.parse::<NonZeroU32>().map_err(|_| bad()))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl fmt::Display for StepContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for seg in &self.0 {
            if !first {
                f.write_str("/")?;
            }
            write!(f, "{}", seg)?;
            first = false;
        }
        Ok(())
    }
}

impl Serialize for StepContextId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StepContextId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// True when a raw step context string lies at or beneath `scope`.
///
/// Log records may carry decorated contexts (`"1/2e"` for an error handler,
/// `"1@node"`); only the leading digits of each segment are compared, and an
/// undecodable context never matches.
pub fn raw_context_within(raw: &str, scope: &StepContextId) -> bool {
    let mut segments = raw.split('/');
    for expected in scope.segments() {
        let Some(seg) = segments.next() else {
            return false;
        };
        let digits: String = seg.chars().take_while(char::is_ascii_digit).collect();
        match digits.parse::<u32>() {
            Ok(n) if n == expected.get() => {}
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
