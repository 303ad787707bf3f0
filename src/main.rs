//! CLI entry point for the statute harvester.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::process::ExitCode;

use anyhow::Result;

mod app;
mod app_config;
mod cli;
mod output;

/// Process outcome once a command has run to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    Success,
    Failure,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Failure => ExitCode::FAILURE,
        }
    }
}

// Fatal errors return `Err`, which prints the context chain and exits 1.
#[tokio::main]
async fn main() -> Result<ExitCode> {
    let exit = app::runtime::run_harvester().await?;
    Ok(exit.into())
}
