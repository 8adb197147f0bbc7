//! Folding incentives into a project's tax cash flow.
//!
//! The project's financials are turned into an [`AssessmentContext`]: steady annual amounts are
//! ramped through the startup year, capital is spread over construction and capitalised, and the
//! tax assessed under each tax type is computed from the rates that apply. The incentives
//! computed from that context are then limited to the total tax owed in each year.
use crate::catalog::Catalog;
use crate::context::{AssessmentContext, ScalarInput, SeriesInput};
use crate::id::Selection;
use crate::incentives::{Breakdown, IncentiveResult, compute_breakdown, compute_incentives};
use crate::input::{
    deserialise_non_negative, deserialise_optional_non_negative, deserialise_proportion,
};
use crate::schedule::{Schedule, bonus_depreciation_schedule};
use crate::series::Series;
use anyhow::{Context, Result, ensure};
use log::debug;
use serde::{Deserialize, Serialize};

/// A flow given either as a steady annual amount or as a value for every plant year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Flow {
    /// A steady annual amount, ramped through the startup year
    Annual(f64),
    /// One value per plant year
    Yearly(Vec<f64>),
}

/// How capital is depreciated for tax purposes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Depreciation {
    /// Fraction of the fixed capital investment depreciated in each year from the start of
    /// operation
    pub schedule: Vec<f64>,
    /// Take an additional half of the basis in the first year
    #[serde(default)]
    pub bonus: bool,
    /// Assess property tax on capitalised value net of accumulated depreciation
    #[serde(default)]
    pub net_property_basis: bool,
}

/// The financial profile of a project.
///
/// Inputs which only drive incentives are optional. An incentive which needs one that is not
/// given fails with [`crate::IncentiveError::MissingParameter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFinancials {
    /// Total capital investment [$]
    #[serde(deserialize_with = "deserialise_non_negative")]
    pub total_capital_investment: f64,
    /// Fixed capital investment [$]
    #[serde(deserialize_with = "deserialise_non_negative")]
    pub fixed_capital_investment: f64,
    /// Purchase cost of equipment and building materials [$]
    #[serde(deserialize_with = "deserialise_non_negative")]
    pub purchase_cost: f64,
    /// Sales value of fuel products [$/yr]
    #[serde(deserialize_with = "deserialise_non_negative")]
    pub fuel_value: f64,
    /// Cost of feedstock purchased [$/yr]
    #[serde(deserialize_with = "deserialise_non_negative")]
    pub feedstock_value: f64,
    /// Utility cost [$/yr]. Only the magnitude is used, as net utility costs are often negative
    /// for plants which export electricity.
    pub utility_cost: f64,
    /// Gross revenue [$/yr], used where state tax is levied on gross receipts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<f64>,
    /// Labour cost [$/yr]
    #[serde(
        default,
        deserialize_with = "deserialise_optional_non_negative",
        skip_serializing_if = "Option::is_none"
    )]
    pub wages: Option<f64>,
    /// Ethanol produced [gal/yr]
    #[serde(
        default,
        deserialize_with = "deserialise_optional_non_negative",
        skip_serializing_if = "Option::is_none"
    )]
    pub ethanol_production: Option<f64>,
    /// Installed cost of ethanol-producing equipment [$]
    #[serde(
        default,
        deserialize_with = "deserialise_optional_non_negative",
        skip_serializing_if = "Option::is_none"
    )]
    pub ethanol_equipment: Option<f64>,
    /// Installed cost of biodiesel-producing equipment [$]
    #[serde(
        default,
        deserialize_with = "deserialise_optional_non_negative",
        skip_serializing_if = "Option::is_none"
    )]
    pub biodiesel_equipment: Option<f64>,
    /// Installed cost of electricity-generating equipment (boiler and turbine-generator) [$]
    #[serde(
        default,
        deserialize_with = "deserialise_optional_non_negative",
        skip_serializing_if = "Option::is_none"
    )]
    pub electricity_equipment: Option<f64>,
    /// Installed cost of conveyors, racks and shelving, including contractor fees [$]
    #[serde(
        default,
        deserialize_with = "deserialise_optional_non_negative",
        skip_serializing_if = "Option::is_none"
    )]
    pub installation_costs: Option<f64>,
    /// Number of jobs paying more than $50,000/yr
    #[serde(
        default,
        deserialize_with = "deserialise_optional_non_negative",
        skip_serializing_if = "Option::is_none"
    )]
    pub qualifying_jobs: Option<f64>,
    /// Variable operating activity in the startup period as a fraction of normal
    #[serde(deserialize_with = "deserialise_proportion")]
    pub startup_voc_fraction: f64,
    /// Fixed operating activity in the startup period as a fraction of normal
    #[serde(deserialize_with = "deserialise_proportion")]
    pub startup_foc_fraction: f64,
    /// Cash flow subject to income tax, before depreciation [$/yr]
    pub taxable_cash_flow: Flow,
    /// Tax depreciation of fixed capital, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depreciation: Option<Depreciation>,
}

impl ProjectFinancials {
    /// Scale capital investment by a location factor
    pub fn with_capital_cost_factor(&self, factor: f64) -> Self {
        Self {
            total_capital_investment: self.total_capital_investment * factor,
            fixed_capital_investment: self.fixed_capital_investment * factor,
            ..self.clone()
        }
    }

    /// The depreciation of fixed capital in each plant year, if depreciation is modelled
    fn depreciation_flow(&self, schedule: &Schedule) -> Result<Option<Series>> {
        let Some(depreciation) = &self.depreciation else {
            return Ok(None);
        };

        let fractions = if depreciation.bonus {
            bonus_depreciation_schedule(&depreciation.schedule)?
        } else {
            depreciation.schedule.clone()
        };
        let flow = schedule.depreciation_flow(self.fixed_capital_investment, &fractions)?;
        Ok(Some(flow))
    }

    /// Taxable cash flow in each plant year, net of depreciation and never negative
    fn taxable_cash_flow(
        &self,
        schedule: &Schedule,
        depreciation: Option<&Series>,
    ) -> Result<Series> {
        let flow = match &self.taxable_cash_flow {
            Flow::Annual(amount) => schedule.yearly_flow(*amount, self.startup_voc_fraction),
            Flow::Yearly(values) => {
                ensure!(
                    values.len() == schedule.plant_years(),
                    "Taxable cash flow has {} values but the plant has {} years",
                    values.len(),
                    schedule.plant_years()
                );
                Series::from(values.as_slice())
            }
        };

        let flow = match depreciation {
            Some(depreciation) => flow.zip_with(depreciation, |cash, dep| cash - dep),
            None => flow,
        };

        Ok(flow.non_negative())
    }
}

/// Tax rates which apply to a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRates {
    /// Federal income tax rate
    #[serde(deserialize_with = "deserialise_proportion")]
    pub federal_income: f64,
    /// State income tax rate
    #[serde(deserialize_with = "deserialise_proportion")]
    pub state_income: f64,
    /// Property tax rate
    #[serde(deserialize_with = "deserialise_proportion")]
    pub property: f64,
    /// Fuel tax rate
    #[serde(default, deserialize_with = "deserialise_proportion")]
    pub fuel: f64,
    /// Sales tax rate
    #[serde(default, deserialize_with = "deserialise_proportion")]
    pub sales: f64,
    /// Utility tax rate
    #[serde(default, deserialize_with = "deserialise_proportion")]
    pub utility: f64,
    /// Whether state tax is levied on gross receipts rather than taxable income
    #[serde(default)]
    pub gross_receipts: bool,
}

/// Build the assessment context for a project.
///
/// # Arguments
///
/// * `schedule` - Construction and startup timing
/// * `financials` - The project's financial profile
/// * `rates` - The tax rates which apply
pub fn build_context(
    schedule: &Schedule,
    financials: &ProjectFinancials,
    rates: &TaxRates,
) -> Result<AssessmentContext> {
    let fin = financials;
    let voc = fin.startup_voc_fraction;
    let foc = fin.startup_foc_fraction;
    let fci = fin.fixed_capital_investment;

    let depreciation = fin.depreciation_flow(schedule)?;
    let taxable = fin.taxable_cash_flow(schedule, depreciation.as_ref())?;

    let property_depreciation = fin
        .depreciation
        .as_ref()
        .filter(|dep| dep.net_property_basis)
        .and(depreciation.as_ref());
    let property_basis = schedule.capitalised_value(fci, property_depreciation);
    let fuel_value = schedule.yearly_flow(fin.fuel_value, voc);
    let feedstock_value = schedule.yearly_flow(fin.feedstock_value, voc);
    let purchases = schedule.construction_flow(fin.purchase_cost);
    let sales = &purchases + &feedstock_value;
    let utility_cost = schedule.yearly_flow(fin.utility_cost.abs(), foc);

    let state_income_basis = if rates.gross_receipts {
        let revenue = fin
            .revenue
            .context("Revenue must be given where state tax is levied on gross receipts")?;
        schedule.yearly_flow(revenue, voc)
    } else {
        taxable.clone()
    };
    let capitalised = |amount: f64| schedule.capitalised_value(amount, None);

    let mut builder = AssessmentContext::builder(schedule.clone())
        .scalar(ScalarInput::TotalCapitalInvestment, fin.total_capital_investment)
        .scalar(ScalarInput::ValueAdded, fci)
        .scalar(ScalarInput::PropertyTaxRate, rates.property)
        .scalar(ScalarInput::FuelTaxRate, rates.fuel)
        .scalar(ScalarInput::SalesTaxRate, rates.sales)
        .series(SeriesInput::PropertyTaxableValue, property_basis)
        .series(SeriesInput::FuelTaxableValue, fuel_value.clone())
        .series(SeriesInput::SalesTaxableValue, sales.clone())
        .series(SeriesInput::BuildingMaterials, purchases)
        .series(
            SeriesInput::FederalIncomeTaxAssessed,
            &taxable * rates.federal_income,
        )
        .series(
            SeriesInput::StateIncomeTaxAssessed,
            &state_income_basis * rates.state_income,
        )
        .series(
            SeriesInput::PropertyTaxAssessed,
            schedule.yearly_flow(fci * rates.property, foc),
        )
        .series(SeriesInput::FuelTaxAssessed, &fuel_value * rates.fuel)
        .series(SeriesInput::SalesTaxAssessed, &sales * rates.sales)
        .series(SeriesInput::UtilityTaxAssessed, &utility_cost * rates.utility);

    // Inputs which only drive incentives are left out of the context when not given
    if let Some(jobs) = fin.qualifying_jobs {
        builder = builder.scalar(ScalarInput::QualifyingJobs, jobs);
    }
    if let Some(wages) = fin.wages {
        builder = builder.series(SeriesInput::Wages, schedule.yearly_flow(wages, foc));
    }
    if let Some(ethanol) = fin.ethanol_production {
        builder = builder.series(
            SeriesInput::EthanolProduction,
            schedule.yearly_flow(ethanol, voc),
        );
    }
    if let Some(cost) = fin.biodiesel_equipment {
        builder = builder.series(SeriesInput::BiodieselEquipment, capitalised(cost));
    }
    if let Some(cost) = fin.ethanol_equipment {
        builder = builder.series(SeriesInput::EthanolEquipment, capitalised(cost));
    }
    if let Some(cost) = fin.electricity_equipment {
        builder = builder
            .series(SeriesInput::ElectricityEquipment, capitalised(cost))
            .series(
                SeriesInput::BiomassEquipment,
                feedstock_value.map(|value| value + cost),
            );
    }
    if let Some(cost) = fin.installation_costs {
        builder = builder.series(SeriesInput::InstallationCosts, capitalised(cost));
    }

    let context = builder.build()?;

    Ok(context)
}

/// Total tax owed in each year before incentives.
///
/// This is property, fuel and utility tax plus federal and state income tax. Returns an error if
/// the context lacks any of them.
pub fn total_tax(context: &AssessmentContext) -> Result<Series> {
    let mut tax = context.zeros();
    for input in [
        SeriesInput::PropertyTaxAssessed,
        SeriesInput::FuelTaxAssessed,
        SeriesInput::UtilityTaxAssessed,
        SeriesInput::FederalIncomeTaxAssessed,
        SeriesInput::StateIncomeTaxAssessed,
    ] {
        let series = context
            .series(input)
            .with_context(|| format!("Context has no {input} series"))?;
        tax += series;
    }

    Ok(tax)
}

/// The outcome of assessing a project's taxes and incentives
#[derive(Debug, Clone, PartialEq)]
pub struct TaxAssessment {
    /// The inputs incentives were computed from
    pub context: AssessmentContext,
    /// Total tax owed in each year before incentives
    pub tax: Series,
    /// Incentives by category
    pub result: IncentiveResult,
    /// Incentives by program
    pub breakdown: Breakdown,
    /// Total incentives in each year, limited to the tax owed
    pub incentives: Series,
}

impl TaxAssessment {
    /// Tax owed in each year after incentives
    pub fn net_tax(&self) -> Series {
        self.tax.zip_with(&self.incentives, |tax, incentives| tax - incentives)
    }
}

/// Assess a project's taxes and the incentives which offset them
pub fn assess_taxes(
    catalog: &Catalog,
    selection: &Selection,
    schedule: &Schedule,
    financials: &ProjectFinancials,
    rates: &TaxRates,
) -> Result<TaxAssessment> {
    let context = build_context(schedule, financials, rates)?;
    let tax = total_tax(&context)?;
    let result = compute_incentives(catalog, selection, &context)?;
    let breakdown = compute_breakdown(catalog, selection, &context)?;
    let incentives = result.capped_total(&tax);
    debug!(
        "Total tax {:.2}, total incentives {:.2}",
        tax.total(),
        incentives.total()
    );

    Ok(TaxAssessment {
        context,
        tax,
        result,
        breakdown,
        incentives,
    })
}
