//! Jurisdiction scenarios: the same project evaluated under the taxes and incentives of
//! different states.
use crate::cashflow::{ProjectFinancials, TaxRates, assess_taxes};
use crate::catalog::Catalog;
use crate::id::{Selection, parse_incentive_str};
use crate::input::{deserialise_non_negative, deserialise_proportion, input_err_msg, read_csv};
use crate::schedule::Schedule;
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// The name of the jurisdictions CSV file
pub const JURISDICTIONS_FILE_NAME: &str = "jurisdictions.csv";

/// A row of the jurisdictions CSV file
#[derive(Debug, Deserialize)]
struct JurisdictionRaw {
    name: String,
    #[serde(deserialize_with = "deserialise_proportion")]
    state_income_tax: f64,
    #[serde(deserialize_with = "deserialise_proportion")]
    property_tax: f64,
    #[serde(deserialize_with = "deserialise_proportion")]
    fuel_tax: f64,
    #[serde(deserialize_with = "deserialise_proportion")]
    sales_tax: f64,
    #[serde(deserialize_with = "deserialise_non_negative")]
    capital_cost_factor: f64,
    gross_receipts: bool,
    incentives: String,
}

/// A state or other taxing authority in which a project could be sited
#[derive(Debug, Clone, PartialEq)]
pub struct Jurisdiction {
    /// Name of the jurisdiction
    pub name: String,
    /// State income tax rate
    pub state_income_tax: f64,
    /// Property tax rate
    pub property_tax: f64,
    /// Fuel tax rate
    pub fuel_tax: f64,
    /// Sales tax rate
    pub sales_tax: f64,
    /// Factor applied to capital investment for the location
    pub capital_cost_factor: f64,
    /// Whether state tax is levied on gross receipts rather than taxable income
    pub gross_receipts: bool,
    /// The incentive programs available
    pub incentives: Selection,
}

impl Jurisdiction {
    /// The project's tax rates with this jurisdiction's state taxes
    pub fn tax_rates(&self, base: &TaxRates) -> TaxRates {
        TaxRates {
            state_income: self.state_income_tax,
            property: self.property_tax,
            fuel: self.fuel_tax,
            sales: self.sales_tax,
            gross_receipts: self.gross_receipts,
            ..base.clone()
        }
    }
}

impl TryFrom<JurisdictionRaw> for Jurisdiction {
    type Error = anyhow::Error;

    fn try_from(raw: JurisdictionRaw) -> Result<Self> {
        let incentives = parse_incentive_str(&raw.incentives)
            .with_context(|| format!("Invalid incentives for jurisdiction {}", raw.name))?;
        ensure!(
            raw.capital_cost_factor > 0.0,
            "Capital cost factor for jurisdiction {} must be positive",
            raw.name
        );

        Ok(Self {
            name: raw.name,
            state_income_tax: raw.state_income_tax,
            property_tax: raw.property_tax,
            fuel_tax: raw.fuel_tax,
            sales_tax: raw.sales_tax,
            capital_cost_factor: raw.capital_cost_factor,
            gross_receipts: raw.gross_receipts,
            incentives,
        })
    }
}

/// Read jurisdictions from a CSV file and check them against the catalog.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
/// * `catalog` - The programs incentives are drawn from
pub fn read_jurisdictions(file_path: &Path, catalog: &Catalog) -> Result<Vec<Jurisdiction>> {
    let raw: Vec<JurisdictionRaw> = read_csv(file_path)?;
    read_jurisdictions_from_iter(raw.into_iter(), catalog)
        .with_context(|| input_err_msg(file_path))
}

fn read_jurisdictions_from_iter<I>(iter: I, catalog: &Catalog) -> Result<Vec<Jurisdiction>>
where
    I: Iterator<Item = JurisdictionRaw>,
{
    let mut names = HashSet::new();
    iter.map(|raw| {
        ensure!(
            names.insert(raw.name.clone()),
            "Duplicate jurisdiction: {}",
            raw.name
        );
        let jurisdiction = Jurisdiction::try_from(raw)?;
        if let Some(id) = jurisdiction
            .incentives
            .iter()
            .find(|id| !catalog.contains(**id))
        {
            anyhow::bail!(
                "Incentive {id} for jurisdiction {} is not in catalog '{}'",
                jurisdiction.name,
                catalog.name()
            );
        }

        Ok(jurisdiction)
    })
    .try_collect()
}

/// Summary of a project's taxes and incentives in one jurisdiction, over the plant's life
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionSummary {
    /// Name of the jurisdiction
    pub jurisdiction: String,
    /// The incentive programs applied, separated by semicolons
    pub incentives: String,
    /// Tax owed before incentives [$]
    pub total_tax: f64,
    /// Value of exemptions [$]
    pub exemptions: f64,
    /// Value of deductions [$]
    pub deductions: f64,
    /// Value of credits [$]
    pub credits: f64,
    /// Value of refunds [$]
    pub refunds: f64,
    /// Value of all incentives, limited to the tax owed in each year [$]
    pub total_incentives: f64,
    /// Tax owed after incentives [$]
    pub net_tax: f64,
}

/// Evaluate the project in every jurisdiction.
///
/// Jurisdictions are evaluated in parallel, each with its own assessment context. Results are
/// returned in the same order as `jurisdictions`.
pub fn evaluate_jurisdictions(
    catalog: &Catalog,
    schedule: &Schedule,
    financials: &ProjectFinancials,
    base_rates: &TaxRates,
    jurisdictions: &[Jurisdiction],
) -> Result<Vec<JurisdictionSummary>> {
    info!("Evaluating {} jurisdiction(s)", jurisdictions.len());
    jurisdictions
        .par_iter()
        .map(|jurisdiction| {
            let financials = financials.with_capital_cost_factor(jurisdiction.capital_cost_factor);
            let rates = jurisdiction.tax_rates(base_rates);
            let assessment = assess_taxes(
                catalog,
                &jurisdiction.incentives,
                schedule,
                &financials,
                &rates,
            )
            .with_context(|| format!("Failed to evaluate jurisdiction {}", jurisdiction.name))?;

            Ok(JurisdictionSummary {
                jurisdiction: jurisdiction.name.clone(),
                incentives: jurisdiction.incentives.iter().join(";"),
                total_tax: assessment.tax.total(),
                exemptions: assessment.result.exemptions.total(),
                deductions: assessment.result.deductions.total(),
                credits: assessment.result.credits.total(),
                refunds: assessment.result.refunds.total(),
                total_incentives: assessment.incentives.total(),
                net_tax: assessment.net_tax().total(),
            })
        })
        .collect()
}
