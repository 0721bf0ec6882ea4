// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local files as an output source.
//!
//! The log is JSONL, one raw entry per line, appended by whoever runs the
//! execution. The state file is the execution-state JSON, rewritten in
//! place as the execution progresses.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use xw_core::cursor::{OutputRequest, OutputSource};
use xw_core::{
    build_execution, ExecutionId, ExecutionState, MalformedStateError, RawExecutionState,
    RawLogEntry, RawOutput, SourceError,
};

/// Errors loading an execution-state file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("{} is not a state document: {source}", path.display())]
    Json { path: PathBuf, source: serde_json::Error },

    #[error("{}: {source}", path.display())]
    State { path: PathBuf, source: MalformedStateError },
}

/// Read, parse and build an execution-state file.
pub async fn load_state(path: &Path) -> Result<ExecutionState, LoadError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
    let raw: RawExecutionState = serde_json::from_slice(&bytes)
        .map_err(|source| LoadError::Json { path: path.to_path_buf(), source })?;
    build_execution(raw).map_err(|source| LoadError::State { path: path.to_path_buf(), source })
}

/// Serves a local JSONL log from a byte offset.
///
/// Only complete lines are served; while the execution runs, a partially
/// written last line stays behind the offset until its newline arrives.
/// Filtering is left to the cursor.
pub struct FileOutputSource {
    execution_id: ExecutionId,
    log_path: PathBuf,
    state_path: Option<PathBuf>,
}

impl FileOutputSource {
    pub fn new(execution_id: impl Into<ExecutionId>, log_path: impl Into<PathBuf>) -> Self {
        Self { execution_id: execution_id.into(), log_path: log_path.into(), state_path: None }
    }

    /// Take execution completion from this state file.
    ///
    /// Without one the execution never reports finished, so a follow only
    /// ends on Ctrl-C.
    pub fn with_state(mut self, state_path: impl Into<PathBuf>) -> Self {
        self.state_path = Some(state_path.into());
        self
    }

    pub fn execution_id(&self) -> &ExecutionId {
        &self.execution_id
    }

    async fn read_state(&self) -> Result<Option<ExecutionState>, SourceError> {
        let Some(path) = &self.state_path else {
            return Ok(None);
        };
        match load_state(path).await {
            Ok(state) if state.execution_id != self.execution_id => {
                Err(SourceError::NotFound(self.execution_id.clone()))
            }
            Ok(state) => Ok(Some(state)),
            // The writer may be halfway through replacing the file
            Err(e @ (LoadError::Io { .. } | LoadError::Json { .. })) => {
                Err(SourceError::Unavailable(e.to_string()))
            }
            Err(e @ LoadError::State { .. }) => Err(SourceError::Payload(e.to_string())),
        }
    }
}

/// Bytes of the log from `offset` to end of file, the file length, and its
/// modification time in epoch millis.
async fn read_from(path: &Path, offset: u64) -> Result<(Vec<u8>, u64, Option<u64>), SourceError> {
    let mut file = match tokio::fs::File::open(path).await {
        Ok(f) => f,
        // Nothing has been logged yet
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((Vec::new(), 0, None)),
        Err(e) => return Err(e.into()),
    };
    let metadata = file.metadata().await?;
    let file_len = metadata.len();
    let modified = metadata
        .modified()
        .ok()
        .map(DateTime::<Utc>::from)
        .and_then(|t| u64::try_from(t.timestamp_millis()).ok());
    if file_len <= offset {
        return Ok((Vec::new(), file_len, modified));
    }
    file.seek(SeekFrom::Start(offset)).await?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).await?;
    Ok((buf, file_len, modified))
}

/// Split off the complete lines and decode each one.
///
/// Once the execution has finished nothing more will be appended, so an
/// unterminated last line is complete too.
fn parse_lines(buf: &[u8], offset: u64, finished: bool) -> Result<(Vec<RawLogEntry>, u64), SourceError> {
    let end = if finished {
        buf.len()
    } else {
        match buf.iter().rposition(|b| *b == b'\n') {
            Some(last) => last + 1,
            None => return Ok((Vec::new(), 0)),
        }
    };

    let mut entries = Vec::new();
    let mut at = offset;
    for line in buf[..end].split_inclusive(|b| *b == b'\n') {
        let text = String::from_utf8_lossy(line);
        if !text.trim().is_empty() {
            let entry = serde_json::from_str::<RawLogEntry>(text.trim())
                .map_err(|e| SourceError::Payload(format!("log line at byte {}: {}", at, e)))?;
            entries.push(entry);
        }
        at += line.len() as u64;
    }
    Ok((entries, end as u64))
}

#[async_trait]
impl OutputSource for FileOutputSource {
    async fn fetch(&self, request: &OutputRequest) -> Result<RawOutput, SourceError> {
        if request.execution_id != self.execution_id {
            return Err(SourceError::NotFound(request.execution_id.clone()));
        }

        // State before log: once the state says finished, every line the
        // execution wrote is already in the log.
        let state = self.read_state().await?;
        let exec_finished = state.as_ref().is_some_and(ExecutionState::is_settled);

        let (buf, file_len, last_modified) = read_from(&self.log_path, request.offset).await?;
        let (entries, consumed) = parse_lines(&buf, request.offset, exec_finished)?;
        let partial = buf.len() as u64 > consumed;
        let offset = if file_len < request.offset {
            tracing::warn!(
                log = %self.log_path.display(),
                offset = request.offset,
                file_len,
                "log shrank below cursor offset"
            );
            file_len
        } else {
            request.offset + consumed
        };

        tracing::trace!(
            log = %self.log_path.display(),
            from = request.offset,
            to = offset,
            entries = entries.len(),
            "read log"
        );

        Ok(RawOutput {
            id: (&self.execution_id).into(),
            offset,
            completed: exec_finished && !partial,
            exec_completed: exec_finished,
            has_failed_nodes: state.as_ref().is_some_and(|s| !s.failed_nodes().is_empty()),
            exec_state: state.as_ref().map(|s| s.status().as_token().to_string()),
            last_modified,
            exec_duration: state
                .as_ref()
                .and_then(|s| s.workflow.timing.elapsed(Utc::now()))
                .and_then(|d| u64::try_from(d.num_milliseconds()).ok()),
            percent_loaded: (file_len > 0).then(|| offset as f64 * 100.0 / file_len as f64),
            total_size: Some(file_len),
            unmodified: offset == request.offset && entries.is_empty(),
            empty: file_len == 0,
            filter: None,
            entries,
        })
    }
}

#[cfg(test)]
#[path = "source_tests.rs"]
mod tests;
