pub mod academics;
pub mod config;
pub mod finance;
pub mod health;
pub mod servo;
pub mod timer;

use chrono::{Local, NaiveDate};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// How results are printed: plain lines, or pretty JSON with `--json`.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    /// Print `value` as JSON, or hand it to `human` for plain output.
    pub fn emit<T, F>(&self, value: &T, human: F) -> CmdResult
    where
        T: Serialize + ?Sized,
        F: FnOnce(&T),
    {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human(value);
        }
        Ok(())
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Text progress bar, `width` cells wide.
pub fn bar(ratio: f64, width: usize) -> String {
    let filled = ((ratio.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

pub fn check(done: bool) -> &'static str {
    if done {
        "[x]"
    } else {
        "[ ]"
    }
}
