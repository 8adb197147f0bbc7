//! Building year-indexed series from scalars, respecting construction and startup timing.
//!
//! Index 0 of every series is the first construction year. Operation begins at `start`, which is
//! the number of construction years. In the startup year the plant runs for `startup_time` of
//! the year at a reduced level of activity.
use crate::error::{EngineResult, IncentiveError};
use crate::series::Series;
use float_cmp::approx_eq;

/// Tolerance used when checking that a schedule sums to one
const SCHEDULE_SUM_TOLERANCE: f64 = 1e-9;

/// The timing of a project: construction spend, operating life and startup
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    construction_schedule: Vec<f64>,
    operating_years: usize,
    startup_time: f64,
}

/// Check that a spend/depreciation schedule is non-negative and sums to one
fn check_fractions(name: &str, fractions: &[f64]) -> EngineResult<()> {
    if fractions.iter().any(|f| !f.is_finite() || *f < 0.0) {
        return Err(IncentiveError::InvalidSchedule(format!(
            "{name} must contain finite, non-negative fractions"
        )));
    }

    let sum: f64 = fractions.iter().sum();
    if !approx_eq!(f64, sum, 1.0, epsilon = SCHEDULE_SUM_TOLERANCE) {
        return Err(IncentiveError::InvalidSchedule(format!(
            "{name} must sum to 1 (sums to {sum})"
        )));
    }

    Ok(())
}

impl Schedule {
    /// Create a new [`Schedule`].
    ///
    /// # Arguments
    ///
    /// * `construction_schedule` - Fraction of capital spent in each construction year. May be
    ///   empty if the plant operates from year 0, otherwise it must sum to one.
    /// * `operating_years` - Number of years the plant operates
    /// * `startup_time` - Fraction of the first operating year spent in startup
    pub fn new(
        construction_schedule: Vec<f64>,
        operating_years: usize,
        startup_time: f64,
    ) -> EngineResult<Self> {
        if !construction_schedule.is_empty() {
            check_fractions("construction schedule", &construction_schedule)?;
        }

        if operating_years == 0 {
            return Err(IncentiveError::InvalidSchedule(
                "plant must operate for at least one year".into(),
            ));
        }

        if !(0.0..=1.0).contains(&startup_time) {
            return Err(IncentiveError::InvalidSchedule(format!(
                "startup time must be between 0 and 1 (got {startup_time})"
            )));
        }

        Ok(Self {
            construction_schedule,
            operating_years,
            startup_time,
        })
    }

    /// The first operating year (equal to the number of construction years)
    pub fn start(&self) -> usize {
        self.construction_schedule.len()
    }

    /// The number of operating years
    pub fn operating_years(&self) -> usize {
        self.operating_years
    }

    /// Total number of modelled years, including construction
    pub fn plant_years(&self) -> usize {
        self.start() + self.operating_years
    }

    /// Fraction of capital spent in each construction year
    pub fn construction_schedule(&self) -> &[f64] {
        &self.construction_schedule
    }

    /// Fraction of the first operating year spent in startup
    pub fn startup_time(&self) -> f64 {
        self.startup_time
    }

    /// A steady annual amount, ramping in the startup year.
    ///
    /// The amount is zero during construction. In the startup year the value is a blend of the
    /// startup period (at `startup_fraction` of normal activity) and normal operation for the
    /// rest of the year.
    pub fn yearly_flow(&self, steady_state_amount: f64, startup_fraction: f64) -> Series {
        let start = self.start();
        let w0 = self.startup_time;
        let w1 = 1.0 - w0;
        (0..self.plant_years())
            .map(|year| match year.cmp(&start) {
                std::cmp::Ordering::Less => 0.0,
                std::cmp::Ordering::Equal => {
                    w0 * startup_fraction * steady_state_amount + w1 * steady_state_amount
                }
                std::cmp::Ordering::Greater => steady_state_amount,
            })
            .collect()
    }

    /// A total amount spread over the construction years according to the construction schedule
    pub fn construction_flow(&self, total_amount: f64) -> Series {
        (0..self.plant_years())
            .map(|year| {
                self.construction_schedule
                    .get(year)
                    .map_or(0.0, |fraction| total_amount * fraction)
            })
            .collect()
    }

    /// A total amount depreciated from the first operating year according to `schedule`.
    ///
    /// Years of the depreciation schedule which fall beyond the plant life are dropped.
    pub fn depreciation_flow(&self, total_amount: f64, schedule: &[f64]) -> EngineResult<Series> {
        check_fractions("depreciation schedule", schedule)?;
        let start = self.start();
        Ok((0..self.plant_years())
            .map(|year| {
                year.checked_sub(start)
                    .and_then(|i| schedule.get(i))
                    .map_or(0.0, |fraction| total_amount * fraction)
            })
            .collect())
    }

    /// The value capitalised so far in each year, optionally net of accumulated depreciation.
    ///
    /// This is the running total of [`Schedule::construction_flow`], which is the basis for
    /// property-linked incentives.
    pub fn capitalised_value(&self, total_amount: f64, depreciation: Option<&Series>) -> Series {
        let capitalised = self.construction_flow(total_amount).cumulative_sum();
        match depreciation {
            Some(depreciation) => capitalised
                .zip_with(&depreciation.cumulative_sum(), |value, dep| value - dep)
                .non_negative(),
            None => capitalised,
        }
    }
}

/// Bonus depreciation: take an extra half of the basis in the first year.
///
/// The remaining years are rescaled so that the schedule still sums to one. If the first year
/// already depreciates half or more of the basis, the whole basis is depreciated in that year.
pub fn bonus_depreciation_schedule(schedule: &[f64]) -> EngineResult<Vec<f64>> {
    check_fractions("depreciation schedule", schedule)?;
    let Some((&first, rest)) = schedule.split_first() else {
        return Err(IncentiveError::InvalidSchedule(
            "depreciation schedule cannot be empty".into(),
        ));
    };

    let first = (first + 0.5).min(1.0);
    let rest_total: f64 = rest.iter().sum();
    let remaining = 1.0 - first;
    let mut bonus = Vec::with_capacity(schedule.len());
    bonus.push(first);
    bonus.extend(rest.iter().map(|&fraction| {
        if rest_total > 0.0 {
            fraction * remaining / rest_total
        } else {
            0.0
        }
    }));

    Ok(bonus)
}
