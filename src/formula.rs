//! Evaluation of a single incentive program against an assessment context.
use crate::catalog::{Amount, Program};
use crate::context::{AssessmentContext, ScalarInput, SeriesInput};
use crate::error::{EngineResult, IncentiveError};
use crate::id::IncentiveID;
use crate::series::Series;
use log::debug;
use std::ops::Range;

/// Get a scalar input which a program requires
fn require_scalar(
    context: &AssessmentContext,
    id: IncentiveID,
    input: ScalarInput,
) -> EngineResult<f64> {
    context
        .scalar(input)
        .ok_or(IncentiveError::MissingParameter {
            id,
            input: input.into(),
        })
}

/// Get a series input which a program requires
fn require_series(
    context: &AssessmentContext,
    id: IncentiveID,
    input: SeriesInput,
) -> EngineResult<&Series> {
    context
        .series(input)
        .ok_or(IncentiveError::MissingParameter {
            id,
            input: input.into(),
        })
}

/// The years in which a program applies.
///
/// The window opens at the first operating year, or later if the ceiling series is not positive
/// until a later year. If the program would then run past the end of the plant's life, the window
/// is moved back so that the whole duration fits.
pub fn assessment_window(
    start: usize,
    duration: usize,
    plant_years: usize,
    ceiling: &Series,
) -> Range<usize> {
    let mut start = ceiling
        .first_positive()
        .map_or(start, |first| start.max(first));
    if start + duration > plant_years {
        start = plant_years.saturating_sub(duration);
    }

    start..(start + duration).min(plant_years)
}

impl Amount {
    /// The raw amount in every plant year, before windowing and capping
    fn raw(&self, context: &AssessmentContext, id: IncentiveID) -> EngineResult<Series> {
        let plant_years = context.plant_years();
        let series = match self {
            Self::Fixed {
                base,
                fraction,
                installments,
            } => {
                let base = require_scalar(context, id, *base)?;
                Series::constant(plant_years, fraction * base / f64::from(*installments))
            }
            Self::Proportional {
                driver,
                fraction,
                scaled_by,
            } => {
                let rate = match scaled_by {
                    Some(input) => require_scalar(context, id, *input)?,
                    None => 1.0,
                };
                require_series(context, id, *driver)? * (fraction * rate)
            }
            Self::PassThrough { source } => require_series(context, id, *source)?.clone(),
            Self::Tiered {
                base,
                minimum,
                tiers,
            } => {
                let base = require_scalar(context, id, *base)?;
                let fraction = if base < *minimum {
                    0.0
                } else {
                    tiers
                        .iter()
                        .find(|tier| tier.up_to.is_none_or(|up_to| base <= up_to))
                        .map_or(0.0, |tier| tier.fraction)
                };
                Series::constant(plant_years, fraction * base)
            }
        };

        Ok(series)
    }
}

impl Program {
    /// Check that every input the program needs is in the context
    pub fn check_inputs(&self, context: &AssessmentContext) -> EngineResult<()> {
        match self
            .required_inputs()
            .into_iter()
            .find(|input| !context.contains(*input))
        {
            Some(input) => Err(IncentiveError::MissingParameter { id: self.id, input }),
            None => Ok(()),
        }
    }

    /// The value of the program in each plant year.
    ///
    /// The raw amount is limited to the statutory cap and then to the ceiling series, and is zero
    /// outside the years the program applies. Programs bounded by a taxable value are then
    /// converted to dollars of tax with their levy rate.
    pub fn compute(&self, context: &AssessmentContext) -> EngineResult<Series> {
        self.check_inputs(context)?;

        let plant_years = context.plant_years();
        let ceiling = require_series(context, self.id, self.ceiling)?;
        let duration = self.duration.years(plant_years);
        let window = assessment_window(context.start(), duration, plant_years, ceiling);
        if window.start != context.start() {
            debug!(
                "Incentive {} applies from year {} rather than year {}",
                self.id,
                window.start,
                context.start()
            );
        }

        let mut value = self.amount.raw(context, self.id)?;
        if let Some(cap) = self.statutory_cap {
            value = value.cap(cap);
        }
        value = value.clamp_to(ceiling).retain_window(window);
        if let Some(rate) = self.levy_rate {
            value = &value * require_scalar(context, self.id, rate)?;
        }

        Ok(value)
    }
}
