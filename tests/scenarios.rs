//! Worked scenarios for the incentive engine.
use float_cmp::approx_eq;
use incentives::IncentiveError;
use incentives::cashflow::{Flow, ProjectFinancials, TaxRates, build_context};
use incentives::catalog::{Amount, Catalog, Category, Duration, Program, Revision};
use incentives::context::{AssessmentContext, ScalarInput, SeriesInput};
use incentives::formula::assessment_window;
use incentives::id::{IncentiveID, selection};
use incentives::incentives::{IncentiveResult, compute_incentives};
use incentives::schedule::Schedule;
use incentives::series::Series;
use rstest::rstest;

/// A plant which operates from year 0 for 20 years
fn no_construction() -> Schedule {
    Schedule::new(Vec::new(), 20, 0.0).unwrap()
}

fn credit(id: u32, duration: Duration, amount: Amount, statutory_cap: Option<f64>) -> Program {
    Program {
        id: IncentiveID(id),
        label: format!("C{id}"),
        category: Category::Credit,
        description: String::new(),
        duration,
        amount,
        statutory_cap,
        ceiling: SeriesInput::StateIncomeTaxAssessed,
        levy_rate: None,
    }
}

/// A context built from a realistic project, with every input present
fn project_context() -> AssessmentContext {
    let schedule = Schedule::new(vec![0.1, 0.6, 0.3], 20, 0.5).unwrap();
    let financials = ProjectFinancials {
        total_capital_investment: 2e8,
        fixed_capital_investment: 1.6e8,
        purchase_cost: 6e7,
        wages: Some(3e6),
        ethanol_production: Some(5e7),
        fuel_value: 1.1e8,
        feedstock_value: 7e7,
        utility_cost: 4e6,
        revenue: None,
        ethanol_equipment: Some(4e7),
        biodiesel_equipment: Some(1e7),
        electricity_equipment: Some(2.5e7),
        installation_costs: Some(6e6),
        qualifying_jobs: Some(60.0),
        startup_voc_fraction: 0.6,
        startup_foc_fraction: 1.0,
        taxable_cash_flow: Flow::Annual(3e7),
        depreciation: None,
    };
    let rates = TaxRates {
        federal_income: 0.35,
        state_income: 0.065,
        property: 0.0136,
        fuel: 0.05,
        sales: 0.05785,
        utility: 0.02,
        gross_receipts: false,
    };
    build_context(&schedule, &financials, &rates).unwrap()
}

#[test]
fn startup_blending() {
    let schedule = Schedule::new(vec![0.2; 5], 5, 1.0).unwrap();
    assert_eq!(
        schedule.yearly_flow(1000.0, 0.75),
        Series::from(vec![
            0.0, 0.0, 0.0, 0.0, 0.0, 750.0, 1000.0, 1000.0, 1000.0, 1000.0
        ])
    );
}

#[test]
fn tax_assessed_binds_before_statutory_cap() {
    let program = credit(
        1,
        Duration::PlantLife,
        Amount::Proportional {
            driver: SeriesInput::EthanolProduction,
            fraction: 1.0,
            scaled_by: None,
        },
        Some(5e6),
    );
    let catalog = Catalog::new("test", vec![program]).unwrap();
    let context = AssessmentContext::builder(no_construction())
        .series(SeriesInput::EthanolProduction, vec![6e6; 20])
        .series(SeriesInput::StateIncomeTaxAssessed, vec![4e6; 20])
        .build()
        .unwrap();

    let result = compute_incentives(&catalog, &selection([1u32]), &context).unwrap();
    assert_eq!(result.credits, Series::constant(20, 4e6));
}

#[test]
fn credit_granted_for_its_duration() {
    let program = credit(
        1,
        Duration::Years(10),
        Amount::Fixed {
            base: ScalarInput::TotalCapitalInvestment,
            fraction: 0.03,
            installments: 1,
        },
        None,
    );
    let catalog = Catalog::new("test", vec![program]).unwrap();
    let context = AssessmentContext::builder(no_construction())
        .scalar(ScalarInput::TotalCapitalInvestment, 1e7)
        .series(SeriesInput::StateIncomeTaxAssessed, vec![5e5; 20])
        .build()
        .unwrap();

    let result = compute_incentives(&catalog, &selection([1u32]), &context).unwrap();
    for (year, value) in result.credits.iter().enumerate() {
        let expected = if year < 10 { 300_000.0 } else { 0.0 };
        assert!(
            approx_eq!(f64, *value, expected, ulps = 4),
            "year {year}: {value} != {expected}"
        );
    }
}

#[test]
fn unknown_incentive() {
    let catalog = Catalog::from_revision(Revision::Current);
    assert_eq!(
        compute_incentives(&catalog, &selection([999u32]), &project_context()),
        Err(IncentiveError::InvalidIncentive {
            id: IncentiveID(999)
        })
    );
}

#[test]
fn empty_selection() {
    let catalog = Catalog::from_revision(Revision::Current);
    let context = project_context();
    let result = compute_incentives(&catalog, &selection(Vec::<u32>::new()), &context).unwrap();
    assert_eq!(result, IncentiveResult::zeros(context.plant_years()));
    assert_eq!(result.credits.len(), 23);
}

#[test]
fn duplicate_selection_is_idempotent() {
    let catalog = Catalog::from_revision(Revision::Current);
    let context = project_context();
    let once = compute_incentives(&catalog, &selection([7u32, 12]), &context).unwrap();
    let twice = compute_incentives(&catalog, &selection([7u32, 12, 7, 12]), &context).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn deterministic() {
    let catalog = Catalog::from_revision(Revision::Current);
    let ids = selection(1u32..=20);
    let first = compute_incentives(&catalog, &ids, &project_context()).unwrap();
    let second = compute_incentives(&catalog, &ids, &project_context()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn missing_parameter() {
    let catalog = Catalog::from_revision(Revision::Current);
    let context = AssessmentContext::builder(no_construction())
        .series(SeriesInput::StateIncomeTaxAssessed, vec![1e6; 20])
        .build()
        .unwrap();
    assert!(matches!(
        compute_incentives(&catalog, &selection([7u32]), &context),
        Err(IncentiveError::MissingParameter { id: IncentiveID(7), .. })
    ));
}

#[rstest]
#[case(Revision::Current)]
#[case(Revision::Legacy)]
fn programs_respect_bounds(#[case] revision: Revision) {
    let catalog = Catalog::from_revision(revision);
    let context = project_context();

    for program in catalog.iter() {
        let value = program.compute(&context).unwrap();
        assert_eq!(value.len(), context.plant_years());

        let ceiling = context.series(program.ceiling).unwrap();
        let cap = program.statutory_cap.unwrap_or(f64::INFINITY);
        for (year, (&value, &ceiling)) in value.iter().zip(ceiling.iter()).enumerate() {
            assert!(value >= 0.0, "{}: negative in year {year}", program.label);
            assert!(
                value <= ceiling.min(cap) * (1.0 + 1e-12),
                "{}: {value} exceeds bound in year {year}",
                program.label
            );
        }

        // Only ever granted in one contiguous run of years no longer than the duration
        let duration = program.duration.years(context.plant_years());
        let window = assessment_window(context.start(), duration, context.plant_years(), ceiling);
        assert!(window.len() <= duration);
        for (year, &value) in value.iter().enumerate() {
            assert!(
                window.contains(&year) || value == 0.0,
                "{}: {value} granted in year {year} outside {window:?}",
                program.label
            );
        }
    }
}
