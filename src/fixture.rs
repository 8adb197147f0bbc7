//! Fixtures for tests

use crate::cashflow::{Flow, ProjectFinancials, TaxRates, build_context};
use crate::catalog::{Amount, Catalog, Category, Duration, Program, Revision};
use crate::context::{AssessmentContext, ScalarInput, SeriesInput};
use crate::id::{IncentiveID, selection};
use crate::project::Project;
use crate::schedule::Schedule;
use rstest::fixture;
use std::path::PathBuf;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Two years of construction followed by eight operating years
#[fixture]
pub fn schedule() -> Schedule {
    Schedule::new(vec![0.4, 0.6], 8, 0.5).unwrap()
}

/// A ten-year credit worth 1.5% of the total capital investment each year
#[fixture]
pub fn program() -> Program {
    Program {
        id: IncentiveID(7),
        label: "C1".into(),
        category: Category::Credit,
        description: "Capital investment credit".into(),
        duration: Duration::Years(10),
        amount: Amount::Fixed {
            base: ScalarInput::TotalCapitalInvestment,
            fraction: 0.015,
            installments: 1,
        },
        statutory_cap: None,
        ceiling: SeriesInput::StateIncomeTaxAssessed,
        levy_rate: None,
    }
}

#[fixture]
pub fn current_catalog() -> Catalog {
    Catalog::from_revision(Revision::Current)
}

#[fixture]
pub fn financials() -> ProjectFinancials {
    ProjectFinancials {
        total_capital_investment: 1e8,
        fixed_capital_investment: 8e7,
        purchase_cost: 3e7,
        wages: Some(2e6),
        ethanol_production: Some(6e7),
        fuel_value: 1.2e8,
        feedstock_value: 5e7,
        utility_cost: -1e6,
        revenue: None,
        ethanol_equipment: Some(2.5e7),
        biodiesel_equipment: Some(0.0),
        electricity_equipment: Some(1.5e7),
        installation_costs: Some(4e6),
        qualifying_jobs: Some(50.0),
        startup_voc_fraction: 0.75,
        startup_foc_fraction: 1.0,
        taxable_cash_flow: Flow::Annual(2e7),
        depreciation: None,
    }
}

#[fixture]
pub fn tax_rates() -> TaxRates {
    TaxRates {
        federal_income: 0.35,
        state_income: 0.065,
        property: 0.013,
        fuel: 0.05,
        sales: 0.06,
        utility: 0.01,
        gross_receipts: false,
    }
}

/// A context with every input present
#[fixture]
pub fn full_context(
    schedule: Schedule,
    financials: ProjectFinancials,
    tax_rates: TaxRates,
) -> AssessmentContext {
    build_context(&schedule, &financials, &tax_rates).unwrap()
}

#[fixture]
pub fn project(
    current_catalog: Catalog,
    schedule: Schedule,
    financials: ProjectFinancials,
    tax_rates: TaxRates,
) -> Project {
    Project {
        path: PathBuf::from("project"),
        catalog: current_catalog,
        selection: selection([7u32, 12]),
        schedule,
        financials,
        tax_rates,
        jurisdictions: Vec::new(),
    }
}
