//! The module responsible for writing output data to disk.
use crate::cashflow::TaxAssessment;
use crate::catalog::{Catalog, Category};
use crate::context::SeriesInput;
use crate::id::IncentiveID;
use crate::jurisdiction::JurisdictionSummary;
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;

pub mod metadata;

/// The root folder in which project-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "incentives_results";

/// The output file name for incentives by category
const INCENTIVES_FILE_NAME: &str = "incentives.csv";

/// The output file name for incentives by program
const BREAKDOWN_FILE_NAME: &str = "incentive_breakdown.csv";

/// The output file name for jurisdiction summaries
const JURISDICTIONS_FILE_NAME: &str = "jurisdictions.csv";

/// The output file name for the assessment context
const CONTEXT_FILE_NAME: &str = "debug_context.csv";

/// Get the output folder for the project at the specified path
pub fn get_output_dir(project_dir: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user has specified "."
    let project_dir = project_dir
        .canonicalize()
        .context("Could not resolve path to project")?;

    let project_name = project_dir
        .file_name()
        .context("Project cannot be in root folder")?
        .to_str()
        .context("Invalid chars in project dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, project_name].iter().collect())
}

/// Create a new output directory, optionally replacing an existing one.
///
/// Returns true if an existing folder with contents will be overwritten.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Folder exists and is empty: nothing to do
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Please delete the folder or pass the \
             --overwrite command-line option."
        );

        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Represents a row in the incentives CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct IncentiveRow {
    year: usize,
    exemptions: f64,
    deductions: f64,
    credits: f64,
    refunds: f64,
    total_tax: f64,
    incentives: f64,
    net_tax: f64,
}

/// Represents a row in the incentive breakdown CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct BreakdownRow {
    year: usize,
    incentive_id: IncentiveID,
    label: String,
    category: Category,
    value: f64,
}

/// Represents a row in the debug context CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ContextRow {
    year: usize,
    input: SeriesInput,
    value: f64,
}

/// Write incentives by category and year
fn write_incentives(output_path: &Path, assessment: &TaxAssessment) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_path.join(INCENTIVES_FILE_NAME))?;
    let result = &assessment.result;
    let net_tax = assessment.net_tax();
    for year in 0..result.plant_years() {
        writer.serialize(IncentiveRow {
            year,
            exemptions: result.exemptions[year],
            deductions: result.deductions[year],
            credits: result.credits[year],
            refunds: result.refunds[year],
            total_tax: assessment.tax[year],
            incentives: assessment.incentives[year],
            net_tax: net_tax[year],
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// Write the value of each program by year
fn write_breakdown(
    output_path: &Path,
    catalog: &Catalog,
    assessment: &TaxAssessment,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_path.join(BREAKDOWN_FILE_NAME))?;
    for (&id, series) in &assessment.breakdown {
        let program = catalog.get(id)?;
        for (year, &value) in series.iter().enumerate() {
            writer.serialize(BreakdownRow {
                year,
                incentive_id: id,
                label: program.label.clone(),
                category: program.category,
                value,
            })?;
        }
    }
    writer.flush()?;

    Ok(())
}

/// Write every series in the assessment context
fn write_context(output_path: &Path, assessment: &TaxAssessment) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_path.join(CONTEXT_FILE_NAME))?;
    for input in SeriesInput::iter() {
        let Some(series) = assessment.context.series(input) else {
            continue;
        };
        for (year, &value) in series.iter().enumerate() {
            writer.serialize(ContextRow { year, input, value })?;
        }
    }
    writer.flush()?;

    Ok(())
}

/// Write the results of assessing a project to CSV files.
///
/// # Arguments
///
/// * `output_path` - Folder where files will be saved
/// * `catalog` - The catalog programs were drawn from
/// * `assessment` - The results to write
/// * `save_debug_info` - Whether to include the assessment context for debugging
pub fn write_assessment(
    output_path: &Path,
    catalog: &Catalog,
    assessment: &TaxAssessment,
    save_debug_info: bool,
) -> Result<()> {
    write_incentives(output_path, assessment)?;
    write_breakdown(output_path, catalog, assessment)?;
    if save_debug_info {
        write_context(output_path, assessment)?;
    }

    Ok(())
}

/// Write jurisdiction summaries to a CSV file
pub fn write_jurisdictions(output_path: &Path, summaries: &[JurisdictionSummary]) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_path.join(JURISDICTIONS_FILE_NAME))?;
    for summary in summaries {
        writer.serialize(summary)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cashflow::{ProjectFinancials, TaxRates, assess_taxes};
    use crate::catalog::Revision;
    use crate::fixture::{financials, schedule, tax_rates};
    use crate::id::selection;
    use crate::schedule::Schedule;
    use itertools::Itertools;
    use rstest::{fixture, rstest};
    use tempfile::tempdir;

    #[fixture]
    fn assessment(
        schedule: Schedule,
        financials: ProjectFinancials,
        tax_rates: TaxRates,
    ) -> TaxAssessment {
        let catalog = Catalog::from_revision(Revision::Current);
        assess_taxes(
            &catalog,
            &selection([7u32, 12]),
            &schedule,
            &financials,
            &tax_rates,
        )
        .unwrap()
    }

    #[rstest]
    fn test_write_assessment(assessment: TaxAssessment) {
        let catalog = Catalog::from_revision(Revision::Current);
        let dir = tempdir().unwrap();
        write_assessment(dir.path(), &catalog, &assessment, false).unwrap();

        let rows: Vec<IncentiveRow> =
            csv::Reader::from_path(dir.path().join(INCENTIVES_FILE_NAME))
                .unwrap()
                .into_deserialize()
                .try_collect()
                .unwrap();
        assert_eq!(rows.len(), assessment.tax.len());
        assert_eq!(rows[3].credits, assessment.result.credits[3]);
        assert_eq!(rows[3].total_tax, assessment.tax[3]);

        let rows: Vec<BreakdownRow> = csv::Reader::from_path(dir.path().join(BREAKDOWN_FILE_NAME))
            .unwrap()
            .into_deserialize()
            .try_collect()
            .unwrap();
        assert_eq!(rows.len(), 2 * assessment.tax.len());
        assert_eq!(rows[0].incentive_id, IncentiveID(7));
        assert_eq!(rows[0].label, "C1");
        assert_eq!(rows[0].category, Category::Credit);

        assert!(!dir.path().join(CONTEXT_FILE_NAME).exists());
    }

    #[rstest]
    fn test_write_assessment_debug(assessment: TaxAssessment) {
        let catalog = Catalog::from_revision(Revision::Current);
        let dir = tempdir().unwrap();
        write_assessment(dir.path(), &catalog, &assessment, true).unwrap();

        let rows: Vec<ContextRow> = csv::Reader::from_path(dir.path().join(CONTEXT_FILE_NAME))
            .unwrap()
            .into_deserialize()
            .try_collect()
            .unwrap();
        assert_eq!(
            rows.len(),
            SeriesInput::iter().count() * assessment.tax.len()
        );
    }

    #[test]
    fn test_write_jurisdictions() {
        let summary = JurisdictionSummary {
            jurisdiction: "Iowa".into(),
            incentives: "1;12;21".into(),
            total_tax: 10.0,
            exemptions: 1.0,
            deductions: 0.0,
            credits: 2.0,
            refunds: 0.0,
            total_incentives: 3.0,
            net_tax: 7.0,
        };
        let dir = tempdir().unwrap();
        write_jurisdictions(dir.path(), std::slice::from_ref(&summary)).unwrap();

        let rows: Vec<JurisdictionSummary> =
            csv::Reader::from_path(dir.path().join(JURISDICTIONS_FILE_NAME))
                .unwrap()
                .into_deserialize()
                .try_collect()
                .unwrap();
        assert_eq!(rows, [summary]);
    }

    #[test]
    fn test_create_output_directory() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("output");

        // New folder
        assert!(!create_output_directory(&output_dir, false).unwrap());
        assert!(output_dir.is_dir());

        // Empty folder
        assert!(!create_output_directory(&output_dir, false).unwrap());

        // Folder with contents
        fs::write(output_dir.join("file.txt"), "").unwrap();
        assert!(create_output_directory(&output_dir, false).is_err());
        assert!(create_output_directory(&output_dir, true).unwrap());
        assert!(!output_dir.join("file.txt").exists());
    }
}
