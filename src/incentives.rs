//! Computing incentive values for a selection of programs.
//!
//! Programs are dispatched to a [`Calculator`] for their category and the results for each
//! category are summed. Each program is bounded by its own ceiling, but the sum for a category is
//! not bounded again: it is up to the caller to limit the total to the tax actually owed (see
//! [`IncentiveResult::capped_total`]).
use crate::catalog::{Catalog, Category};
use crate::context::AssessmentContext;
use crate::error::{EngineResult, IncentiveError};
use crate::id::{IncentiveID, Selection};
use crate::series::Series;
use indexmap::IndexMap;
use log::debug;
use serde::Serialize;
use strum::IntoEnumIterator;

/// The value of each selected program, by ID
pub type Breakdown = IndexMap<IncentiveID, Series>;

/// Computes values for programs of a single category
#[derive(Debug, Clone, Copy)]
pub struct Calculator<'a> {
    catalog: &'a Catalog,
    category: Category,
}

impl<'a> Calculator<'a> {
    /// Create a calculator for the given category of the catalog
    pub fn new(catalog: &'a Catalog, category: Category) -> Self {
        Self { catalog, category }
    }

    /// The category this calculator handles
    pub fn category(&self) -> Category {
        self.category
    }

    /// The value of a single program.
    ///
    /// Fails if the program is not in the catalog or belongs to another category.
    pub fn compute(&self, id: IncentiveID, context: &AssessmentContext) -> EngineResult<Series> {
        let program = self.catalog.get(id)?;
        if program.category != self.category {
            return Err(IncentiveError::InvalidIncentive { id });
        }

        program.compute(context)
    }

    /// The value of each of the given programs
    pub fn breakdown<I>(&self, ids: I, context: &AssessmentContext) -> EngineResult<Breakdown>
    where
        I: IntoIterator<Item = IncentiveID>,
    {
        ids.into_iter()
            .map(|id| Ok((id, self.compute(id, context)?)))
            .collect()
    }

    /// The summed value of the given programs.
    ///
    /// If no programs are given, the result is zero in every year.
    pub fn compute_all<I>(&self, ids: I, context: &AssessmentContext) -> EngineResult<Series>
    where
        I: IntoIterator<Item = IncentiveID>,
    {
        let mut total = context.zeros();
        for value in self.breakdown(ids, context)?.values() {
            total += value;
        }

        Ok(total)
    }
}

/// The value of incentives in each plant year, by category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncentiveResult {
    /// Summed value of selected exemptions
    pub exemptions: Series,
    /// Summed value of selected deductions
    pub deductions: Series,
    /// Summed value of selected credits
    pub credits: Series,
    /// Summed value of selected refunds
    pub refunds: Series,
}

impl IncentiveResult {
    /// A result with every category zero in every year
    pub fn zeros(plant_years: usize) -> Self {
        Self {
            exemptions: Series::zeros(plant_years),
            deductions: Series::zeros(plant_years),
            credits: Series::zeros(plant_years),
            refunds: Series::zeros(plant_years),
        }
    }

    /// The series for a category
    pub fn get(&self, category: Category) -> &Series {
        match category {
            Category::Exemption => &self.exemptions,
            Category::Deduction => &self.deductions,
            Category::Credit => &self.credits,
            Category::Refund => &self.refunds,
        }
    }

    fn get_mut(&mut self, category: Category) -> &mut Series {
        match category {
            Category::Exemption => &mut self.exemptions,
            Category::Deduction => &mut self.deductions,
            Category::Credit => &mut self.credits,
            Category::Refund => &mut self.refunds,
        }
    }

    /// Iterate over the categories and their series
    pub fn iter(&self) -> impl Iterator<Item = (Category, &Series)> {
        Category::iter().map(|category| (category, self.get(category)))
    }

    /// The number of plant years covered
    pub fn plant_years(&self) -> usize {
        self.exemptions.len()
    }

    /// The sum of all four categories
    pub fn total(&self) -> Series {
        let mut total = Series::zeros(self.plant_years());
        for (_, series) in self.iter() {
            total += series;
        }
        total
    }

    /// The sum of all four categories, limited in each year to the tax owed
    pub fn capped_total(&self, tax: &Series) -> Series {
        self.total().clamp_to(tax)
    }
}

/// Check that every selected ID is in the catalog
fn check_selection(catalog: &Catalog, selection: &Selection) -> EngineResult<()> {
    match selection.iter().find(|id| !catalog.contains(**id)) {
        Some(&id) => Err(IncentiveError::InvalidIncentive { id }),
        None => Ok(()),
    }
}

/// Compute the value of the selected programs, summed by category.
///
/// Every category is computed, even if none of its programs are selected, in which case its
/// series is all zeros.
///
/// # Arguments
///
/// * `catalog` - The programs available
/// * `selection` - The IDs of the selected programs
/// * `context` - Inputs for the scenario
pub fn compute_incentives(
    catalog: &Catalog,
    selection: &Selection,
    context: &AssessmentContext,
) -> EngineResult<IncentiveResult> {
    check_selection(catalog, selection)?;

    let mut result = IncentiveResult::zeros(context.plant_years());
    for category in Category::iter() {
        let ids = catalog
            .ids_in(category)
            .filter(|id| selection.contains(id));
        let calculator = Calculator::new(catalog, category);
        *result.get_mut(category) = calculator.compute_all(ids, context)?;
    }
    debug!(
        "Computed incentives for {} program(s) from catalog '{}'",
        selection.len(),
        catalog.name()
    );

    Ok(result)
}

/// Compute the value of each selected program separately, in ascending order of ID
pub fn compute_breakdown(
    catalog: &Catalog,
    selection: &Selection,
    context: &AssessmentContext,
) -> EngineResult<Breakdown> {
    check_selection(catalog, selection)?;

    let mut breakdown = Breakdown::new();
    for category in Category::iter() {
        let ids = catalog
            .ids_in(category)
            .filter(|id| selection.contains(id));
        breakdown.extend(Calculator::new(catalog, category).breakdown(ids, context)?);
    }
    breakdown.sort_keys();

    Ok(breakdown)
}
