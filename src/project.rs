//! Loading projects from disk.
//!
//! A project is a directory containing a `project.toml` file describing the plant's timing,
//! finances and tax rates, the incentive programs selected and the catalog they come from. It may
//! also contain a `jurisdictions.csv` file listing alternative jurisdictions to evaluate.
use crate::cashflow::{ProjectFinancials, TaxRates, build_context};
use crate::catalog::{Catalog, Revision};
use crate::id::{IncentiveID, Selection};
use crate::input::{input_err_msg, read_toml};
use crate::jurisdiction::{JURISDICTIONS_FILE_NAME, Jurisdiction, read_jurisdictions};
use crate::schedule::Schedule;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The name of the project file
pub const PROJECT_FILE_NAME: &str = "project.toml";

/// Which catalog a project draws its programs from
#[derive(Debug, Default, Deserialize, PartialEq)]
struct CatalogSource {
    /// A built-in revision
    revision: Option<Revision>,
    /// Path to a catalog file, relative to the project directory
    file: Option<PathBuf>,
}

impl CatalogSource {
    fn load(&self, project_dir: &Path) -> Result<Catalog> {
        match (&self.revision, &self.file) {
            (Some(_), Some(_)) => {
                anyhow::bail!("Cannot specify both a catalog revision and a catalog file")
            }
            (_, Some(file)) => Catalog::from_path(&project_dir.join(file)),
            (revision, None) => Ok(Catalog::from_revision(revision.unwrap_or_default())),
        }
    }
}

/// The timing section of the project file
#[derive(Debug, Deserialize, PartialEq)]
struct ScheduleSection {
    construction_schedule: Vec<f64>,
    operating_years: usize,
    startup_time: f64,
}

/// The contents of the project file
#[derive(Debug, Deserialize, PartialEq)]
struct ProjectFile {
    #[serde(default)]
    incentives: Vec<IncentiveID>,
    #[serde(default)]
    catalog: CatalogSource,
    schedule: ScheduleSection,
    tax_rates: TaxRates,
    financials: ProjectFinancials,
}

/// A project ready to be evaluated
#[derive(Debug, Clone)]
pub struct Project {
    /// The directory the project was loaded from
    pub path: PathBuf,
    /// The catalog programs are drawn from
    pub catalog: Catalog,
    /// The selected programs
    pub selection: Selection,
    /// Construction and startup timing
    pub schedule: Schedule,
    /// The project's financial profile
    pub financials: ProjectFinancials,
    /// Tax rates which apply
    pub tax_rates: TaxRates,
    /// Alternative jurisdictions to evaluate (may be empty)
    pub jurisdictions: Vec<Jurisdiction>,
}

/// Check that every selected program is in the catalog
fn check_selection(selection: &Selection, catalog: &Catalog) -> Result<()> {
    for id in selection {
        ensure!(
            catalog.contains(*id),
            "Incentive {id} is not in catalog '{}'",
            catalog.name()
        );
    }

    Ok(())
}

/// Load a project from the specified directory.
///
/// # Arguments
///
/// * `project_dir` - Folder containing the project configuration files
pub fn load_project<P: AsRef<Path>>(project_dir: P) -> Result<Project> {
    let project_dir = project_dir.as_ref();
    let file_path = project_dir.join(PROJECT_FILE_NAME);
    let file: ProjectFile = read_toml(&file_path)?;

    let schedule = Schedule::new(
        file.schedule.construction_schedule,
        file.schedule.operating_years,
        file.schedule.startup_time,
    )
    .with_context(|| input_err_msg(&file_path))?;
    let catalog = file
        .catalog
        .load(project_dir)
        .context("Failed to load catalog")?;
    let selection: Selection = file.incentives.into_iter().collect();
    check_selection(&selection, &catalog).with_context(|| input_err_msg(&file_path))?;

    // Check that the financials are consistent with the schedule
    build_context(&schedule, &file.financials, &file.tax_rates)
        .with_context(|| input_err_msg(&file_path))?;

    let jurisdictions_path = project_dir.join(JURISDICTIONS_FILE_NAME);
    let jurisdictions = if jurisdictions_path.is_file() {
        read_jurisdictions(&jurisdictions_path, &catalog)?
    } else {
        Vec::new()
    };

    Ok(Project {
        path: project_dir.to_path_buf(),
        catalog,
        selection,
        schedule,
        financials: file.financials,
        tax_rates: file.tax_rates,
        jurisdictions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IncentiveError;
    use crate::cashflow::assess_taxes;
    use crate::context::{InputName, SeriesInput};
    use crate::fixture::assert_error;
    use std::fs;
    use tempfile::tempdir;

    const PROJECT_TOML: &str = r#"incentives = [7, 12, 12]

[catalog]
revision = "current"

[schedule]
construction_schedule = [0.4, 0.6]
operating_years = 8
startup_time = 0.5

[tax_rates]
federal_income = 0.35
state_income = 0.065
property = 0.013

[financials]
total_capital_investment = 1e8
fixed_capital_investment = 8e7
purchase_cost = 3e7
fuel_value = 1e8
feedstock_value = 5e7
utility_cost = 0
ethanol_production = 6e7
startup_voc_fraction = 0.75
startup_foc_fraction = 1
taxable_cash_flow = 2e7
"#;

    #[test]
    fn test_load_project() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(PROJECT_FILE_NAME), PROJECT_TOML).unwrap();

        let project = load_project(dir.path()).unwrap();
        assert_eq!(project.catalog.name(), "current");
        assert_eq!(project.selection.len(), 2);
        assert_eq!(project.schedule.plant_years(), 10);
        assert_eq!(project.financials.ethanol_production, Some(6e7));
        assert_eq!(project.financials.qualifying_jobs, None);
        assert!(project.jurisdictions.is_empty());
    }

    #[test]
    fn test_load_project_missing_incentive_input() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(PROJECT_FILE_NAME),
            PROJECT_TOML.replace("ethanol_production = 6e7\n", ""),
        )
        .unwrap();

        // The project loads, but the ethanol production credit cannot be evaluated
        let project = load_project(dir.path()).unwrap();
        let err = assess_taxes(
            &project.catalog,
            &project.selection,
            &project.schedule,
            &project.financials,
            &project.tax_rates,
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<IncentiveError>(),
            Some(&IncentiveError::MissingParameter {
                id: IncentiveID(12),
                input: InputName::Series(SeriesInput::EthanolProduction),
            })
        );
    }

    #[test]
    fn test_load_project_missing_tax_base() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(PROJECT_FILE_NAME),
            PROJECT_TOML.replace("fuel_value = 1e8\n", ""),
        )
        .unwrap();

        let file_path = dir.path().join(PROJECT_FILE_NAME);
        assert_error!(load_project(dir.path()), input_err_msg(&file_path));
    }

    #[test]
    fn test_load_project_not_in_catalog() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(PROJECT_FILE_NAME),
            PROJECT_TOML.replace("[7, 12, 12]", "[23]"),
        )
        .unwrap();

        let file_path = dir.path().join(PROJECT_FILE_NAME);
        assert_error!(load_project(dir.path()), input_err_msg(&file_path));
    }

    #[test]
    fn test_load_project_custom_catalog() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(PROJECT_FILE_NAME),
            PROJECT_TOML.replace(
                "revision = \"current\"",
                "file = \"catalog.toml\"",
            ),
        )
        .unwrap();
        fs::write(
            dir.path().join("catalog.toml"),
            Catalog::from_revision(Revision::Legacy)
                .to_toml_string()
                .unwrap(),
        )
        .unwrap();

        let project = load_project(dir.path()).unwrap();
        assert_eq!(project.catalog.name(), "legacy");
    }

    #[test]
    fn test_load_project_both_catalogs() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(PROJECT_FILE_NAME),
            PROJECT_TOML.replace(
                "revision = \"current\"",
                "revision = \"current\"\nfile = \"catalog.toml\"",
            ),
        )
        .unwrap();

        assert_error!(load_project(dir.path()), "Failed to load catalog");
    }

    #[test]
    fn test_load_project_missing_file() {
        let dir = tempdir().unwrap();
        assert!(load_project(dir.path()).is_err());
    }
}
