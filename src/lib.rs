//! Tax incentive cash flows for biorefinery projects.
//!
//! Incentive programs are drawn from a [`catalog::Catalog`] and evaluated against an
//! [`context::AssessmentContext`] to give four year-indexed series: exemptions, deductions,
//! credits and refunds.
#![warn(missing_docs)]
use std::env;
use std::path::PathBuf;

pub mod cashflow;
pub mod catalog;
pub mod cli;
pub mod context;
pub mod error;
pub mod formula;
pub mod id;
pub mod incentives;
pub mod input;
pub mod jurisdiction;
pub mod log;
pub mod output;
pub mod project;
pub mod schedule;
pub mod series;
pub mod settings;

#[cfg(test)]
mod fixture;

pub use error::{EngineResult, IncentiveError};
pub use incentives::{IncentiveResult, compute_incentives};

/// Get the config folder for the program.
///
/// Falls back to the working directory on platforms without a config folder.
pub fn get_config_dir() -> PathBuf {
    let base = dirs::config_dir()
        .or_else(|| env::current_dir().ok())
        .unwrap_or_default();
    base.join("incentives")
}
