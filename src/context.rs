//! The assessment context: every input an incentive formula may draw on for one scenario.
use crate::error::{EngineResult, IncentiveError};
use crate::schedule::Schedule;
use crate::series::Series;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// A named scalar input
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
pub enum ScalarInput {
    /// Total capital investment [$]
    TotalCapitalInvestment,
    /// Value added to property [$], taken to be the fixed capital investment
    ValueAdded,
    /// Number of jobs paying more than 50,000 USD/yr
    QualifyingJobs,
    /// Property tax rate [-]
    PropertyTaxRate,
    /// Fuel tax rate [-]
    FuelTaxRate,
    /// Sales tax rate [-]
    SalesTaxRate,
}

/// A named year-indexed input
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
pub enum SeriesInput {
    /// Employee wages [$/yr]
    Wages,
    /// Volume of ethanol produced [gal/yr]
    EthanolProduction,
    /// Value of property on which property tax can be assessed [$]
    PropertyTaxableValue,
    /// Value of fuel on which fuel tax can be assessed [$/yr]
    FuelTaxableValue,
    /// Value of purchases on which sales tax can be assessed [$/yr]
    SalesTaxableValue,
    /// Value of equipment used for producing biodiesel [$]
    BiodieselEquipment,
    /// Value of equipment used for producing ethanol [$]
    EthanolEquipment,
    /// Value of equipment used for producing electricity [$]
    ElectricityEquipment,
    /// Value of biomass boilers, turbine-generators, feedstock handling equipment and biomass
    /// materials [$/yr]
    BiomassEquipment,
    /// Fees paid to (sub)contractors plus the cost of racks, shelving and conveyors [$]
    InstallationCosts,
    /// Cost of building and construction materials [$]
    BuildingMaterials,
    /// Federal income tax assessed [$/yr]
    FederalIncomeTaxAssessed,
    /// State income tax assessed [$/yr]
    StateIncomeTaxAssessed,
    /// Property tax assessed [$/yr]
    PropertyTaxAssessed,
    /// Fuel tax assessed [$/yr]
    FuelTaxAssessed,
    /// Sales tax assessed [$/yr]
    SalesTaxAssessed,
    /// Utility tax assessed [$/yr]
    UtilityTaxAssessed,
}

/// The name of any input, scalar or series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum InputName {
    /// A scalar input
    #[display("{_0}")]
    Scalar(ScalarInput),
    /// A series input
    #[display("{_0}")]
    Series(SeriesInput),
}

impl From<ScalarInput> for InputName {
    fn from(input: ScalarInput) -> Self {
        Self::Scalar(input)
    }
}

impl From<SeriesInput> for InputName {
    fn from(input: SeriesInput) -> Self {
        Self::Series(input)
    }
}

/// All inputs available to incentive formulas for one scenario.
///
/// A context is built fresh for each scenario and cannot be modified once built. Every series it
/// holds has exactly one value per plant year.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentContext {
    schedule: Schedule,
    scalars: IndexMap<ScalarInput, f64>,
    series: IndexMap<SeriesInput, Series>,
}

impl AssessmentContext {
    /// Start building a context for the given schedule
    pub fn builder(schedule: Schedule) -> ContextBuilder {
        ContextBuilder {
            schedule,
            scalars: IndexMap::new(),
            series: IndexMap::new(),
        }
    }

    /// The project timing
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Total number of modelled years
    pub fn plant_years(&self) -> usize {
        self.schedule.plant_years()
    }

    /// The first operating year
    pub fn start(&self) -> usize {
        self.schedule.start()
    }

    /// Get a scalar input, if supplied
    pub fn scalar(&self, input: ScalarInput) -> Option<f64> {
        self.scalars.get(&input).copied()
    }

    /// Get a series input, if supplied
    pub fn series(&self, input: SeriesInput) -> Option<&Series> {
        self.series.get(&input)
    }

    /// Whether the named input was supplied
    pub fn contains(&self, input: InputName) -> bool {
        match input {
            InputName::Scalar(input) => self.scalars.contains_key(&input),
            InputName::Series(input) => self.series.contains_key(&input),
        }
    }

    /// An all-zero series covering the plant life
    pub fn zeros(&self) -> Series {
        Series::zeros(self.plant_years())
    }
}

/// Builder for [`AssessmentContext`]
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    schedule: Schedule,
    scalars: IndexMap<ScalarInput, f64>,
    series: IndexMap<SeriesInput, Series>,
}

impl ContextBuilder {
    /// Supply a scalar input, replacing any previous value
    pub fn scalar(mut self, input: ScalarInput, value: f64) -> Self {
        self.scalars.insert(input, value);
        self
    }

    /// Supply a series input, replacing any previous value
    pub fn series<S: Into<Series>>(mut self, input: SeriesInput, values: S) -> Self {
        self.series.insert(input, values.into());
        self
    }

    /// Check the inputs and build the context.
    ///
    /// Fails if any series does not have one value per plant year.
    pub fn build(self) -> EngineResult<AssessmentContext> {
        let plant_years = self.schedule.plant_years();
        for (input, series) in &self.series {
            if series.len() != plant_years {
                return Err(IncentiveError::ShapeMismatch {
                    input: input.to_string(),
                    expected: plant_years,
                    actual: series.len(),
                });
            }
        }

        Ok(AssessmentContext {
            schedule: self.schedule,
            scalars: self.scalars,
            series: self.series,
        })
    }
}
