// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::IsTerminal;

use clap::builder::styling::{Ansi256Color, Color, Style, Styles};
use xw_core::{ExecutionStatus, LogLevel};

pub mod codes {
    /// Section headers: steel blue
    pub const HEADER: u8 = 74;
    /// Commands and literals: light grey
    pub const LITERAL: u8 = 250;
    /// Descriptions and context: medium grey
    pub const CONTEXT: u8 = 245;
    /// Muted / secondary text: darker grey
    pub const MUTED: u8 = 240;
    /// Succeeded: soft green
    pub const GOOD: u8 = 114;
    /// Failed or aborted: soft red
    pub const BAD: u8 = 174;
    /// Running, partial or mixed: amber
    pub const BUSY: u8 = 179;
}

/// Determine if color output should be enabled.
///
/// Priority: `NO_COLOR=1` disables → `COLOR=1` forces → TTY check.
pub fn should_colorize() -> bool {
    if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
        return false;
    }
    if std::env::var("COLOR").is_ok_and(|v| v == "1") {
        return true;
    }
    std::io::stdout().is_terminal()
}

/// Build clap `Styles` using the project palette.
pub fn styles() -> Styles {
    if !should_colorize() {
        return Styles::plain();
    }
    Styles::styled()
        .header(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::HEADER)))))
        .literal(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::LITERAL)))))
        .placeholder(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::CONTEXT)))))
}

const RESET: &str = "\x1b[0m";

fn paint(code: u8, text: &str) -> String {
    if should_colorize() {
        format!("\x1b[38;5;{code}m{text}{RESET}")
    } else {
        text.to_string()
    }
}

/// Format text with the header color (steel blue).
pub fn header(text: &str) -> String {
    paint(codes::HEADER, text)
}

/// Format text with the context color (medium grey).
pub fn context(text: &str) -> String {
    paint(codes::CONTEXT, text)
}

/// Format text with the muted color (darker grey).
pub fn muted(text: &str) -> String {
    paint(codes::MUTED, text)
}

/// Color a status label by outcome.
pub fn status(status: ExecutionStatus) -> String {
    let code = match status {
        ExecutionStatus::Succeeded => codes::GOOD,
        ExecutionStatus::Failed | ExecutionStatus::Aborted => codes::BAD,
        ExecutionStatus::Running
        | ExecutionStatus::RunningHandler
        | ExecutionStatus::NodePartialSucceeded
        | ExecutionStatus::NodeMixed => codes::BUSY,
        ExecutionStatus::Waiting | ExecutionStatus::NotStarted => codes::MUTED,
    };
    paint(code, &status.to_string())
}

/// Color a log level tag by severity, padded to `width` before painting so
/// the escape codes do not count toward the column.
pub fn level(level: LogLevel, width: usize) -> String {
    let code = match level {
        LogLevel::Severe | LogLevel::Error => codes::BAD,
        LogLevel::Warning => codes::BUSY,
        LogLevel::Info | LogLevel::Normal => codes::LITERAL,
        LogLevel::Debug | LogLevel::Config | LogLevel::Verbose | LogLevel::Finest => codes::MUTED,
    };
    paint(code, &format!("{:<width$}", level.as_token()))
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;
