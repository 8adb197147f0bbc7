//! The built-in catalog revisions.
//!
//! Two numberings of the programs exist. [`Revision::Current`] numbers exemptions 1-5, the
//! deduction 6, credits 7-17 and refunds 18-20, and converts programs bounded by a taxable value
//! into dollars of tax with the relevant tax rate. [`Revision::Legacy`] numbers exemptions 1-6,
//! the deduction 7, credits 8-20 and refunds 21-23, and reports programs bounded by a taxable
//! value in dollars of taxable value.
use super::{Amount, Category, Duration, Program, Tier};
use crate::context::{ScalarInput, SeriesInput};
use crate::id::IncentiveID;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Energy content of ethanol [BTU/gal]
const ETHANOL_BTU_PER_GAL: f64 = 76_100.0;

/// A built-in version of the catalog
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Revision {
    /// Programs numbered 1-20
    #[default]
    Current,
    /// Programs numbered 1-23
    Legacy,
}

impl Revision {
    /// The programs in this revision
    pub fn programs(self) -> Vec<Program> {
        match self {
            Self::Current => current(),
            Self::Legacy => legacy(),
        }
    }
}

/// Shorthand for building a program record
struct Entry {
    id: u32,
    label: &'static str,
    category: Category,
    description: &'static str,
    duration: Duration,
    amount: Amount,
    statutory_cap: Option<f64>,
    ceiling: SeriesInput,
    levy_rate: Option<ScalarInput>,
}

impl From<Entry> for Program {
    fn from(entry: Entry) -> Self {
        Self {
            id: IncentiveID(entry.id),
            label: entry.label.into(),
            category: entry.category,
            description: entry.description.into(),
            duration: entry.duration,
            amount: entry.amount,
            statutory_cap: entry.statutory_cap,
            ceiling: entry.ceiling,
            levy_rate: entry.levy_rate,
        }
    }
}

fn fixed(base: ScalarInput, fraction: f64, installments: u32) -> Amount {
    Amount::Fixed {
        base,
        fraction,
        installments,
    }
}

fn proportional(driver: SeriesInput, fraction: f64) -> Amount {
    Amount::Proportional {
        driver,
        fraction,
        scaled_by: None,
    }
}

fn sales_tax_on(driver: SeriesInput) -> Amount {
    Amount::Proportional {
        driver,
        fraction: 1.0,
        scaled_by: Some(ScalarInput::SalesTaxRate),
    }
}

fn pass_through(source: SeriesInput) -> Amount {
    Amount::PassThrough { source }
}

/// Investment credit banded by the size of the total capital investment
fn tiered_investment() -> Amount {
    Amount::Tiered {
        base: ScalarInput::TotalCapitalInvestment,
        minimum: 1e5,
        tiers: vec![
            Tier {
                up_to: Some(3e5),
                fraction: 0.07,
            },
            Tier {
                up_to: Some(1e6),
                fraction: 0.14,
            },
            Tier {
                up_to: None,
                fraction: 0.18,
            },
        ],
    }
}

/// Programs which are the same in both revisions, apart from their numbering
struct Shared;

impl Shared {
    fn capital_investment_credit(id: u32, label: &'static str) -> Entry {
        Entry {
            id,
            label,
            category: Category::Credit,
            description: "1.5% of qualified capital investment",
            duration: Duration::Years(10),
            amount: fixed(ScalarInput::TotalCapitalInvestment, 0.015, 1),
            statutory_cap: None,
            ceiling: SeriesInput::StateIncomeTaxAssessed,
            levy_rate: None,
        }
    }

    fn qualified_investment_credit(id: u32, label: &'static str) -> Entry {
        Entry {
            id,
            label,
            category: Category::Credit,
            description: "3% of qualified investment, up to $750,000 per year",
            duration: Duration::Years(22),
            amount: fixed(ScalarInput::TotalCapitalInvestment, 0.03, 1),
            statutory_cap: Some(7.5e5),
            ceiling: SeriesInput::StateIncomeTaxAssessed,
            levy_rate: None,
        }
    }

    fn ethanol_energy_credit(id: u32, label: &'static str) -> Entry {
        Entry {
            id,
            label,
            category: Category::Credit,
            description: "$0.20 per 76,000 BTU of ethanol produced, up to $3,000,000 per year",
            duration: Duration::Years(5),
            amount: proportional(
                SeriesInput::EthanolProduction,
                ETHANOL_BTU_PER_GAL * 0.2 / 76_000.0,
            ),
            statutory_cap: Some(3e6),
            ceiling: SeriesInput::StateIncomeTaxAssessed,
            levy_rate: None,
        }
    }

    fn investment_installment_credit(id: u32, label: &'static str) -> Entry {
        Entry {
            id,
            label,
            category: Category::Credit,
            description: "5% of qualifying investment in five equal installments",
            duration: Duration::Years(5),
            amount: fixed(ScalarInput::TotalCapitalInvestment, 0.05, 5),
            statutory_cap: None,
            ceiling: SeriesInput::StateIncomeTaxAssessed,
            levy_rate: None,
        }
    }

    fn income_tax_holiday(id: u32, label: &'static str) -> Entry {
        Entry {
            id,
            label,
            category: Category::Credit,
            description: "The whole of state income tax",
            duration: Duration::Years(15),
            amount: pass_through(SeriesInput::StateIncomeTaxAssessed),
            statutory_cap: None,
            ceiling: SeriesInput::StateIncomeTaxAssessed,
            levy_rate: None,
        }
    }

    fn ethanol_production_credit(id: u32, label: &'static str) -> Entry {
        Entry {
            id,
            label,
            category: Category::Credit,
            description: "$1 per gallon of ethanol produced, up to $5,000,000 per year",
            duration: Duration::PlantLife,
            amount: proportional(SeriesInput::EthanolProduction, 1.0),
            statutory_cap: Some(5e6),
            ceiling: SeriesInput::StateIncomeTaxAssessed,
            levy_rate: None,
        }
    }

    fn tiered_investment_credit(id: u32, label: &'static str) -> Entry {
        Entry {
            id,
            label,
            category: Category::Credit,
            description: "7%, 14% or 18% of investment by project size, up to $1,000,000",
            duration: Duration::Years(2),
            amount: tiered_investment(),
            statutory_cap: Some(1e6),
            ceiling: SeriesInput::StateIncomeTaxAssessed,
            levy_rate: None,
        }
    }

    fn facility_property_credit(id: u32, label: &'static str) -> Entry {
        Entry {
            id,
            label,
            category: Category::Credit,
            description: "25% of the cost of constructing and equipping the facility \
                          in seven equal installments",
            duration: Duration::Years(7),
            amount: fixed(ScalarInput::TotalCapitalInvestment, 0.25, 7),
            statutory_cap: None,
            ceiling: SeriesInput::PropertyTaxAssessed,
            levy_rate: None,
        }
    }

    fn electricity_equipment_credit(id: u32, label: &'static str) -> Entry {
        Entry {
            id,
            label,
            category: Category::Credit,
            description: "25% of electricity-generating equipment, up to $650,000 per year",
            duration: Duration::Years(15),
            amount: proportional(SeriesInput::ElectricityEquipment, 0.25),
            statutory_cap: Some(6.5e5),
            ceiling: SeriesInput::StateIncomeTaxAssessed,
            levy_rate: None,
        }
    }

    fn income_tax_share_credit(id: u32, label: &'static str) -> Entry {
        Entry {
            id,
            label,
            category: Category::Credit,
            description: "75% of state income tax",
            duration: Duration::Years(20),
            amount: proportional(SeriesInput::StateIncomeTaxAssessed, 0.75),
            statutory_cap: None,
            ceiling: SeriesInput::StateIncomeTaxAssessed,
            levy_rate: None,
        }
    }

    fn jobs_credit(id: u32, label: &'static str) -> Entry {
        Entry {
            id,
            label,
            category: Category::Credit,
            description: "$500 per job paying over $50,000 per year, up to $175,000 per year",
            duration: Duration::Years(5),
            amount: fixed(ScalarInput::QualifyingJobs, 500.0, 1),
            statutory_cap: Some(1.75e5),
            ceiling: SeriesInput::StateIncomeTaxAssessed,
            levy_rate: None,
        }
    }

    fn installation_refund(id: u32, label: &'static str) -> Entry {
        Entry {
            id,
            label,
            category: Category::Refund,
            description: "Sales tax on contractor fees, racks, shelving and conveyors",
            duration: Duration::Years(1),
            amount: sales_tax_on(SeriesInput::InstallationCosts),
            statutory_cap: None,
            ceiling: SeriesInput::SalesTaxAssessed,
            levy_rate: None,
        }
    }

    fn building_materials_refund(id: u32, label: &'static str) -> Entry {
        Entry {
            id,
            label,
            category: Category::Refund,
            description: "Sales tax on building and construction materials",
            duration: Duration::Years(1),
            amount: sales_tax_on(SeriesInput::BuildingMaterials),
            statutory_cap: None,
            ceiling: SeriesInput::SalesTaxAssessed,
            levy_rate: None,
        }
    }

    fn ethanol_refund(id: u32, label: &'static str) -> Entry {
        Entry {
            id,
            label,
            category: Category::Refund,
            description: "$0.20 per gallon of ethanol produced, up to $6,000,000 per year",
            duration: Duration::PlantLife,
            amount: proportional(SeriesInput::EthanolProduction, 0.2),
            statutory_cap: Some(6e6),
            ceiling: SeriesInput::StateIncomeTaxAssessed,
            levy_rate: None,
        }
    }
}

/// Programs bounded by a taxable value, which may or may not be converted into dollars of tax
fn value_programs(levy: bool) -> [Entry; 5] {
    let rate = |rate| levy.then_some(rate);
    [
        Entry {
            id: 0,
            label: "",
            category: Category::Exemption,
            description: "Value added to property",
            duration: Duration::Years(20),
            amount: fixed(ScalarInput::ValueAdded, 1.0, 1),
            statutory_cap: None,
            ceiling: SeriesInput::PropertyTaxableValue,
            levy_rate: rate(ScalarInput::PropertyTaxRate),
        },
        Entry {
            id: 0,
            label: "",
            category: Category::Exemption,
            description: "The whole of property tax",
            duration: Duration::Years(10),
            amount: pass_through(SeriesInput::PropertyTaxableValue),
            statutory_cap: None,
            ceiling: SeriesInput::PropertyTaxableValue,
            levy_rate: rate(ScalarInput::PropertyTaxRate),
        },
        Entry {
            id: 0,
            label: "",
            category: Category::Exemption,
            description: "Value of ethanol-producing equipment",
            duration: Duration::Years(10),
            amount: proportional(SeriesInput::EthanolEquipment, 1.0),
            statutory_cap: None,
            ceiling: SeriesInput::PropertyTaxableValue,
            levy_rate: rate(ScalarInput::PropertyTaxRate),
        },
        Entry {
            id: 0,
            label: "",
            category: Category::Exemption,
            description: "The whole of fuel tax",
            duration: Duration::PlantLife,
            amount: pass_through(SeriesInput::FuelTaxableValue),
            statutory_cap: None,
            ceiling: SeriesInput::FuelTaxableValue,
            levy_rate: rate(ScalarInput::FuelTaxRate),
        },
        Entry {
            id: 0,
            label: "",
            category: Category::Exemption,
            description: "The whole of property tax for the life of the plant",
            duration: Duration::PlantLife,
            amount: pass_through(SeriesInput::PropertyTaxableValue),
            statutory_cap: None,
            ceiling: SeriesInput::PropertyTaxableValue,
            levy_rate: rate(ScalarInput::PropertyTaxRate),
        },
    ]
}

/// Sales tax deduction on biomass equipment
fn biomass_deduction(id: u32, label: &'static str, levy: bool) -> Entry {
    Entry {
        id,
        label,
        category: Category::Deduction,
        description: "Value of biomass boilers, turbine-generators, feedstock handling \
                      equipment and biomass materials",
        duration: Duration::PlantLife,
        amount: proportional(SeriesInput::BiomassEquipment, 1.0),
        statutory_cap: None,
        ceiling: SeriesInput::SalesTaxableValue,
        levy_rate: levy.then_some(ScalarInput::SalesTaxRate),
    }
}

/// Renumber an entry
fn numbered(mut entry: Entry, id: u32, label: &'static str) -> Entry {
    entry.id = id;
    entry.label = label;
    entry
}

fn current() -> Vec<Program> {
    let [e1, e2, e3, e4, e5] = value_programs(true);
    vec![
        numbered(e1, 1, "E1"),
        numbered(e2, 2, "E2"),
        numbered(e3, 3, "E3"),
        numbered(e4, 4, "E4"),
        numbered(e5, 5, "E5"),
        biomass_deduction(6, "D1", true),
        Shared::capital_investment_credit(7, "C1"),
        Shared::qualified_investment_credit(8, "C2"),
        Shared::ethanol_energy_credit(9, "C3"),
        Shared::investment_installment_credit(10, "C4"),
        Shared::income_tax_holiday(11, "C5"),
        Shared::ethanol_production_credit(12, "C6"),
        Shared::tiered_investment_credit(13, "C7"),
        Shared::facility_property_credit(14, "C8"),
        Shared::electricity_equipment_credit(15, "C9"),
        Shared::income_tax_share_credit(16, "C10"),
        Shared::jobs_credit(17, "C11"),
        Shared::installation_refund(18, "R1"),
        Shared::building_materials_refund(19, "R2"),
        Shared::ethanol_refund(20, "R3"),
    ]
    .into_iter()
    .map(Program::from)
    .collect()
}

fn legacy() -> Vec<Program> {
    let [value_added, property, ethanol_equipment, fuel, property_life] = value_programs(false);
    let biodiesel_equipment = Entry {
        id: 3,
        label: "E3",
        category: Category::Exemption,
        description: "Value of biodiesel-producing equipment",
        duration: Duration::PlantLife,
        amount: proportional(SeriesInput::BiodieselEquipment, 1.0),
        statutory_cap: None,
        ceiling: SeriesInput::PropertyTaxableValue,
        levy_rate: None,
    };
    let wages_credit = Entry {
        id: 8,
        label: "C1",
        category: Category::Credit,
        description: "3% of wages, against utility tax",
        duration: Duration::Years(10),
        amount: proportional(SeriesInput::Wages, 0.03),
        statutory_cap: None,
        ceiling: SeriesInput::UtilityTaxAssessed,
        levy_rate: None,
    };
    let federal_ethanol_credit = Entry {
        id: 20,
        label: "C13",
        category: Category::Credit,
        description: "$1.01 per gallon of ethanol produced, up to 15,000,000 gallons per year",
        duration: Duration::PlantLife,
        amount: proportional(SeriesInput::EthanolProduction, 1.01),
        statutory_cap: Some(1.01 * 15e6),
        ceiling: SeriesInput::FederalIncomeTaxAssessed,
        levy_rate: None,
    };

    vec![
        numbered(value_added, 1, "E1"),
        numbered(property, 2, "E2"),
        biodiesel_equipment,
        numbered(ethanol_equipment, 4, "E4"),
        numbered(fuel, 5, "E5"),
        numbered(property_life, 6, "E6"),
        biomass_deduction(7, "D1", false),
        wages_credit,
        Shared::capital_investment_credit(9, "C2"),
        Shared::qualified_investment_credit(10, "C3"),
        Shared::ethanol_energy_credit(11, "C4"),
        Shared::investment_installment_credit(12, "C5"),
        Shared::income_tax_holiday(13, "C6"),
        Shared::ethanol_production_credit(14, "C7"),
        Shared::tiered_investment_credit(15, "C8"),
        Shared::facility_property_credit(16, "C9"),
        Shared::electricity_equipment_credit(17, "C10"),
        Shared::income_tax_share_credit(18, "C11"),
        Shared::jobs_credit(19, "C12"),
        federal_ethanol_credit,
        Shared::installation_refund(21, "R1"),
        Shared::building_materials_refund(22, "R2"),
        Shared::ethanol_refund(23, "R3"),
    ]
    .into_iter()
    .map(Program::from)
    .collect()
}
