//! CLI commands for inspecting incentive catalogs.
use crate::catalog::{Catalog, Revision};
use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Which catalog to inspect
#[derive(Args)]
pub struct CatalogOpts {
    /// A built-in catalog revision (current or legacy)
    #[arg(long, default_value_t = Revision::Current, conflicts_with = "file")]
    pub revision: Revision,
    /// Path to a catalog file
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl CatalogOpts {
    fn load(&self) -> Result<Catalog> {
        match &self.file {
            Some(file) => Catalog::from_path(file),
            None => Ok(Catalog::from_revision(self.revision)),
        }
    }
}

/// Subcommands for catalogs
#[derive(Subcommand)]
pub enum CatalogSubcommands {
    /// List the programs in a catalog
    List {
        /// Which catalog to list
        #[command(flatten)]
        opts: CatalogOpts,
    },
    /// Write a catalog to the console in TOML format, for use as a custom catalog
    Dump {
        /// Which catalog to dump
        #[command(flatten)]
        opts: CatalogOpts,
    },
}

impl CatalogSubcommands {
    /// Execute the supplied catalog subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::List { opts } => print!("{}", format_catalog(&opts.load()?)),
            Self::Dump { opts } => print!("{}", opts.load()?.to_toml_string()?),
        }

        Ok(())
    }
}

/// One line per program: ID, label, category and description
fn format_catalog(catalog: &Catalog) -> String {
    catalog
        .iter()
        .map(|program| {
            format!(
                "{:>3}  {:<4} {:<10} {}\n",
                program.id, program.label, program.category, program.description
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_catalog() {
        let listing = format_catalog(&Catalog::from_revision(Revision::Current));
        let lines: Vec<_> = listing.lines().collect();
        assert_eq!(lines.len(), 20);
        assert!(lines[11].starts_with(" 12  C6   credit"));
    }
}
