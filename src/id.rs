//! Code for handling incentive program IDs
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The number identifying an incentive program within a catalog
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct IncentiveID(pub u32);

/// A set of selected incentive programs.
///
/// Selecting the same program twice is the same as selecting it once. The set is ordered so that
/// programs are always summed in the same order.
pub type Selection = BTreeSet<IncentiveID>;

/// Build a [`Selection`] from anything which yields ids
pub fn selection<I, T>(ids: I) -> Selection
where
    I: IntoIterator<Item = T>,
    T: Into<IncentiveID>,
{
    ids.into_iter().map(Into::into).collect()
}

/// Parse a string of incentive IDs separated by semicolons.
///
/// The string can be empty or "none" (case-insensitive), a single ID or a semicolon-separated
/// list (e.g. "1;12;21").
pub fn parse_incentive_str(s: &str) -> Result<Selection> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("none") {
        return Ok(Selection::new());
    }

    let ids: Vec<u32> = s
        .split(';')
        .map(|id| {
            id.trim()
                .parse::<u32>()
                .with_context(|| format!("Invalid incentive ID: {id}"))
        })
        .try_collect()?;
    ensure!(ids.iter().all_unique(), "Incentive IDs must be unique");

    Ok(selection(ids))
}
