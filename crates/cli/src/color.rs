// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

use clap::builder::styling::{Ansi256Color, Color, Style, Styles};
use std::io::IsTerminal;

mod codes {
    pub const HEADER: u8 = 74;
}

/// Priority: `NO_COLOR=1` disables, `COLOR=1` forces, otherwise a TTY check.
pub fn should_colorize() -> bool {
    if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
        return false;
    }
    if std::env::var("COLOR").is_ok_and(|v| v == "1") {
        return true;
    }
    std::io::stdout().is_terminal()
}

pub fn styles() -> Styles {
    if !should_colorize() {
        return Styles::plain();
    }
    Styles::styled().header(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::HEADER)))))
}

pub fn header(text: &str) -> String {
    if should_colorize() {
        format!("\x1b[38;5;{}m{}\x1b[0m", codes::HEADER, text)
    } else {
        text.to_string()
    }
}
