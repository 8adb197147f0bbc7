//! The catalog of incentive programs.
//!
//! Each program is a record describing its category, the shape of its formula, its duration,
//! any statutory dollar cap and the assessed-tax (or taxable value) series it is bounded by. The
//! catalog is static configuration: either one of the built-in [`Revision`]s or a TOML file
//! supplied by the user.
use crate::context::{InputName, ScalarInput, SeriesInput};
use crate::error::{EngineResult, IncentiveError};
use crate::id::IncentiveID;
use crate::input::{input_err_msg, read_toml};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use strum::{Display, EnumIter, EnumString};

pub mod revision;
pub use revision::Revision;

/// The kind of tax relief a program provides
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    /// Reduces property or fuel tax before it is paid
    Exemption,
    /// Reduces a taxable base before the tax rate is applied
    Deduction,
    /// Offsets an already-computed tax liability dollar-for-dollar
    Credit,
    /// Repays tax which has already been paid
    Refund,
}

impl Category {
    /// The series a program of this category may be bounded by
    pub fn permitted_ceilings(self) -> &'static [SeriesInput] {
        match self {
            Self::Exemption => &[
                SeriesInput::PropertyTaxableValue,
                SeriesInput::FuelTaxableValue,
                SeriesInput::PropertyTaxAssessed,
                SeriesInput::FuelTaxAssessed,
            ],
            Self::Deduction => &[SeriesInput::SalesTaxableValue, SeriesInput::SalesTaxAssessed],
            Self::Credit => &[
                SeriesInput::StateIncomeTaxAssessed,
                SeriesInput::FederalIncomeTaxAssessed,
                SeriesInput::UtilityTaxAssessed,
                SeriesInput::PropertyTaxAssessed,
            ],
            Self::Refund => &[
                SeriesInput::SalesTaxAssessed,
                SeriesInput::StateIncomeTaxAssessed,
            ],
        }
    }
}

/// How long a program lasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DurationRaw", into = "DurationRaw")]
pub enum Duration {
    /// A fixed number of years
    Years(usize),
    /// The whole modelled life of the plant
    PlantLife,
}

/// How a [`Duration`] is written in a catalog file: a number of years or "plant_life"
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum DurationRaw {
    Years(usize),
    Keyword(String),
}

impl TryFrom<DurationRaw> for Duration {
    type Error = String;

    fn try_from(raw: DurationRaw) -> Result<Self, Self::Error> {
        match raw {
            DurationRaw::Years(years) => Ok(Self::Years(years)),
            DurationRaw::Keyword(keyword) if keyword == "plant_life" => Ok(Self::PlantLife),
            DurationRaw::Keyword(keyword) => Err(format!(
                "invalid duration '{keyword}': must be a number of years or \"plant_life\""
            )),
        }
    }
}

impl From<Duration> for DurationRaw {
    fn from(duration: Duration) -> Self {
        match duration {
            Duration::Years(years) => Self::Years(years),
            Duration::PlantLife => Self::Keyword("plant_life".into()),
        }
    }
}

impl Duration {
    /// The number of years for a plant with the given life
    pub fn years(self, plant_years: usize) -> usize {
        match self {
            Self::Years(years) => years,
            Self::PlantLife => plant_years,
        }
    }
}

fn one() -> f64 {
    1.0
}

fn one_installment() -> u32 {
    1
}

/// A band of a [`Amount::Tiered`] formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    /// Upper bound of the band (inclusive). The last band has no upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_to: Option<f64>,
    /// Fraction of the base granted within this band
    pub fraction: f64,
}

/// The shape of a program's formula, giving its raw amount in each year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Amount {
    /// `fraction * base / installments`, the same in every year of the program
    Fixed {
        /// The scalar the amount is based on
        base: ScalarInput,
        /// Fraction of the base granted
        #[serde(default = "one")]
        fraction: f64,
        /// Number of equal installments the total is split into
        #[serde(default = "one_installment")]
        installments: u32,
    },
    /// `fraction * driver[year]`, optionally multiplied by a scalar rate
    Proportional {
        /// The series the amount follows
        driver: SeriesInput,
        /// Fraction of the driver granted
        #[serde(default = "one")]
        fraction: f64,
        /// An optional rate the driver is multiplied by (e.g. a sales tax rate)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scaled_by: Option<ScalarInput>,
    },
    /// The whole of the named series: the incentive is the tax itself
    PassThrough {
        /// The series passed through
        source: SeriesInput,
    },
    /// A one-off amount from tiered thresholds on a scalar, granted in every year of the program
    Tiered {
        /// The scalar the tiers apply to
        base: ScalarInput,
        /// Below this value nothing is granted
        #[serde(default)]
        minimum: f64,
        /// Bands in ascending order
        tiers: Vec<Tier>,
    },
}

impl Amount {
    /// The inputs the formula reads
    pub fn inputs(&self) -> Vec<InputName> {
        match self {
            Self::Fixed { base, .. } | Self::Tiered { base, .. } => vec![(*base).into()],
            Self::Proportional {
                driver, scaled_by, ..
            } => {
                let mut inputs = vec![(*driver).into()];
                inputs.extend(scaled_by.map(InputName::from));
                inputs
            }
            Self::PassThrough { source } => vec![(*source).into()],
        }
    }

    /// Check the parameters of the formula
    fn validate(&self) -> Result<(), String> {
        let check_fraction = |fraction: f64| {
            if fraction.is_finite() && fraction >= 0.0 {
                Ok(())
            } else {
                Err(format!("fraction must be finite and non-negative (got {fraction})"))
            }
        };

        match self {
            Self::Fixed {
                fraction,
                installments,
                ..
            } => {
                check_fraction(*fraction)?;
                if *installments == 0 {
                    return Err("installments cannot be zero".into());
                }
            }
            Self::Proportional { fraction, .. } => check_fraction(*fraction)?,
            Self::PassThrough { .. } => {}
            Self::Tiered { minimum, tiers, .. } => {
                let Some((last, rest)) = tiers.split_last() else {
                    return Err("tiered formula must have at least one tier".into());
                };
                for tier in tiers {
                    check_fraction(tier.fraction)?;
                }
                if last.up_to.is_some() || rest.iter().any(|tier| tier.up_to.is_none()) {
                    return Err("only the last tier must be unbounded".into());
                }
                let bounds = rest.iter().filter_map(|tier| tier.up_to).collect_vec();
                if !bounds.iter().tuple_windows().all(|(a, b)| a < b)
                    || bounds.first().is_some_and(|first| first < minimum)
                {
                    return Err("tier bounds must be ascending and above the minimum".into());
                }
            }
        }

        Ok(())
    }
}

/// An incentive program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Unique number for the program
    pub id: IncentiveID,
    /// Short label (e.g. "C6")
    pub label: String,
    /// The kind of relief the program provides
    pub category: Category,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// How long the program lasts once it starts
    pub duration: Duration,
    /// The formula for the raw amount
    pub amount: Amount,
    /// Statutory dollar ceiling applied to each year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statutory_cap: Option<f64>,
    /// The series the program can never exceed
    pub ceiling: SeriesInput,
    /// Rate applied after clamping, for programs bounded by a taxable value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levy_rate: Option<ScalarInput>,
}

impl Program {
    /// Every input needed to evaluate the program
    pub fn required_inputs(&self) -> BTreeSet<InputName> {
        let mut inputs: BTreeSet<_> = self.amount.inputs().into_iter().collect();
        inputs.insert(self.ceiling.into());
        inputs.extend(self.levy_rate.map(InputName::from));
        inputs
    }

    /// Check that the program is internally consistent
    fn validate(&self) -> Result<(), String> {
        if !self.category.permitted_ceilings().contains(&self.ceiling) {
            return Err(format!(
                "{} programs cannot be bounded by {}",
                self.category, self.ceiling
            ));
        }
        if let Some(cap) = self.statutory_cap
            && !(cap.is_finite() && cap >= 0.0)
        {
            return Err(format!("statutory cap must be finite and non-negative (got {cap})"));
        }
        if self.duration == Duration::Years(0) {
            return Err("duration cannot be zero".into());
        }
        self.amount.validate()
    }
}

/// The contents of a catalog file
#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    name: String,
    programs: Vec<Program>,
}

/// A versioned set of incentive programs, keyed by ID
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    name: String,
    programs: IndexMap<IncentiveID, Program>,
}

impl Catalog {
    /// Create a catalog from a list of programs, checking each one.
    ///
    /// Programs are stored in ascending order of ID.
    pub fn new(name: &str, programs: Vec<Program>) -> EngineResult<Self> {
        let mut map = IndexMap::new();
        for program in programs {
            program.validate().map_err(|err| {
                IncentiveError::InvalidCatalog(format!("incentive {}: {err}", program.id))
            })?;

            let id = program.id;
            if map.insert(id, program).is_some() {
                return Err(IncentiveError::InvalidCatalog(format!(
                    "incentive {id} is defined more than once"
                )));
            }
        }
        map.sort_keys();

        Ok(Self {
            name: name.into(),
            programs: map,
        })
    }

    /// One of the built-in catalogs
    pub fn from_revision(revision: Revision) -> Self {
        Self::new(&revision.to_string(), revision.programs())
            .expect("Built-in catalogs are valid")
    }

    /// Read a catalog from a TOML file
    pub fn from_path(file_path: &Path) -> Result<Self> {
        let file: CatalogFile = read_toml(file_path)?;
        Self::new(&file.name, file.programs).with_context(|| input_err_msg(file_path))
    }

    /// The catalog in TOML format, suitable for editing and reading back with
    /// [`Catalog::from_path`]
    pub fn to_toml_string(&self) -> Result<String> {
        let file = CatalogFile {
            name: self.name.clone(),
            programs: self.programs.values().cloned().collect(),
        };
        Ok(toml::to_string(&file)?)
    }

    /// The name of the catalog (e.g. the revision it was built from)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a program
    pub fn get(&self, id: IncentiveID) -> EngineResult<&Program> {
        self.programs
            .get(&id)
            .ok_or(IncentiveError::InvalidIncentive { id })
    }

    /// Whether the catalog contains the given ID
    pub fn contains(&self, id: IncentiveID) -> bool {
        self.programs.contains_key(&id)
    }

    /// Iterate over programs in ascending order of ID
    pub fn iter(&self) -> impl Iterator<Item = &Program> {
        self.programs.values()
    }

    /// Iterate over the IDs belonging to a category
    pub fn ids_in(&self, category: Category) -> impl Iterator<Item = IncentiveID> + '_ {
        self.iter()
            .filter(move |program| program.category == category)
            .map(|program| program.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, program};
    use rstest::rstest;
    use std::fs;
    use tempfile::tempdir;

    #[rstest]
    fn test_required_inputs(program: Program) {
        let inputs = program.required_inputs();
        assert_eq!(
            inputs,
            [
                InputName::Scalar(ScalarInput::TotalCapitalInvestment),
                InputName::Series(SeriesInput::StateIncomeTaxAssessed),
            ]
            .into_iter()
            .collect()
        );
    }

    #[test]
    fn test_required_inputs_with_rates() {
        let program = Program {
            id: IncentiveID(18),
            label: "R1".into(),
            category: Category::Refund,
            description: String::new(),
            duration: Duration::Years(1),
            amount: Amount::Proportional {
                driver: SeriesInput::InstallationCosts,
                fraction: 1.0,
                scaled_by: Some(ScalarInput::SalesTaxRate),
            },
            statutory_cap: None,
            ceiling: SeriesInput::SalesTaxAssessed,
            levy_rate: None,
        };
        assert_eq!(program.required_inputs().len(), 3);
    }

    #[rstest]
    fn test_catalog_duplicate_id(program: Program) {
        assert_eq!(
            Catalog::new("test", vec![program.clone(), program]),
            Err(IncentiveError::InvalidCatalog(
                "incentive 7 is defined more than once".into()
            ))
        );
    }

    #[rstest]
    fn test_catalog_foreign_ceiling(mut program: Program) {
        program.category = Category::Exemption;
        assert_eq!(
            Catalog::new("test", vec![program]),
            Err(IncentiveError::InvalidCatalog(
                "incentive 7: exemption programs cannot be bounded by state_income_tax_assessed".into()
            ))
        );
    }

    #[rstest]
    #[case(vec![Tier { up_to: Some(1e6), fraction: 0.1 }])]
    #[case(vec![Tier { up_to: None, fraction: 0.1 }, Tier { up_to: None, fraction: 0.2 }])]
    #[case(vec![
        Tier { up_to: Some(1e6), fraction: 0.1 },
        Tier { up_to: Some(1e5), fraction: 0.1 },
        Tier { up_to: None, fraction: 0.2 }
    ])]
    #[case(vec![])]
    fn test_catalog_invalid_tiers(mut program: Program, #[case] tiers: Vec<Tier>) {
        program.amount = Amount::Tiered {
            base: ScalarInput::TotalCapitalInvestment,
            minimum: 0.0,
            tiers,
        };
        assert!(matches!(
            Catalog::new("test", vec![program]),
            Err(IncentiveError::InvalidCatalog(_))
        ));
    }

    #[rstest]
    fn test_catalog_get(program: Program) {
        let catalog = Catalog::new("test", vec![program]).unwrap();
        assert_eq!(catalog.get(IncentiveID(7)).unwrap().label, "C1");
        assert_eq!(
            catalog.get(IncentiveID(999)),
            Err(IncentiveError::InvalidIncentive {
                id: IncentiveID(999)
            })
        );
    }

    #[rstest]
    #[case(Revision::Current)]
    #[case(Revision::Legacy)]
    fn test_catalog_toml_round_trip(#[case] revision: Revision) {
        let catalog = Catalog::from_revision(revision);
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("catalog.toml");
        fs::write(&file_path, catalog.to_toml_string().unwrap()).unwrap();
        assert_eq!(Catalog::from_path(&file_path).unwrap(), catalog);
    }

    #[test]
    fn test_catalog_from_path_invalid_duration() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("catalog.toml");
        fs::write(
            &file_path,
            r#"name = "custom"

[[programs]]
id = 1
label = "X1"
category = "credit"
duration = "forever"
ceiling = "state_income_tax_assessed"

[programs.amount]
shape = "pass_through"
source = "state_income_tax_assessed"
"#,
        )
        .unwrap();
        assert!(Catalog::from_path(&file_path).is_err());
    }

    #[test]
    fn test_catalog_from_path_custom() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("catalog.toml");
        fs::write(
            &file_path,
            r#"name = "custom"

[[programs]]
id = 3
label = "X3"
category = "credit"
duration = 10
ceiling = "state_income_tax_assessed"

[programs.amount]
shape = "fixed"
base = "total_capital_investment"
fraction = 0.03

[[programs]]
id = 1
label = "X1"
category = "refund"
duration = "plant_life"
statutory_cap = 6e6
ceiling = "state_income_tax_assessed"

[programs.amount]
shape = "proportional"
driver = "ethanol_production"
fraction = 0.2
"#,
        )
        .unwrap();

        let catalog = Catalog::from_path(&file_path).unwrap();
        assert_eq!(catalog.name(), "custom");
        assert_eq!(
            catalog.iter().map(|program| program.id.0).collect_vec(),
            [1, 3]
        );
        let program = catalog.get(IncentiveID(3)).unwrap();
        assert_eq!(
            program.amount,
            Amount::Fixed {
                base: ScalarInput::TotalCapitalInvestment,
                fraction: 0.03,
                installments: 1
            }
        );
        assert_eq!(catalog.get(IncentiveID(1)).unwrap().duration, Duration::PlantLife);
    }

    #[test]
    fn test_catalog_from_path_foreign_ceiling() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("catalog.toml");
        fs::write(
            &file_path,
            r#"name = "custom"

[[programs]]
id = 1
label = "X1"
category = "deduction"
duration = 1
ceiling = "state_income_tax_assessed"

[programs.amount]
shape = "pass_through"
source = "state_income_tax_assessed"
"#,
        )
        .unwrap();
        assert_error!(
            Catalog::from_path(&file_path),
            format!("Error reading {}", file_path.display())
        );
    }
}
