//! Command handlers and terminal rendering

pub mod convert;
pub mod destinations;
pub mod forecast;
pub mod history;
pub mod setup;
pub mod ui;

use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub(crate) fn print_json<T: Serialize>(report: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
