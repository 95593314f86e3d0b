//! `routes` command

use super::SourceArgs;
use acton_resources::{RouteEntry, RouteTable};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use console::style;
use std::collections::HashSet;

/// Output format for the route listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned, human-readable table
    #[default]
    Table,
    /// JSON array of route entries
    Json,
}

/// Print the generated route table
#[derive(Debug, Args)]
pub struct RoutesCommand {
    #[command(flatten)]
    source: SourceArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

impl RoutesCommand {
    /// Execute the routes command
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration cannot be loaded
    /// - Controller declarations are malformed or collide
    /// - JSON serialization fails
    pub fn execute(&self) -> Result<()> {
        let (_, table) = self.source.generate()?;

        match self.format {
            OutputFormat::Json => {
                let json =
                    serde_json::to_string_pretty(&table).context("Failed to serialize routes")?;
                println!("{json}");
            }
            OutputFormat::Table => print_table(&table),
        }

        Ok(())
    }
}

fn target(entry: &RouteEntry) -> String {
    format!("{}#{}", entry.controller, entry.action)
}

/// Rails-style listing: each name is printed on its first route only
fn print_table(table: &RouteTable) {
    if table.is_empty() {
        println!("{}", style("No routes defined").dim());
        return;
    }

    let width = |column: fn(&RouteEntry) -> usize| table.iter().map(column).max().unwrap_or(0);
    let name_width = width(|entry| entry.name.len()).max("Prefix".len());
    let verb_width = width(|entry| entry.verb.as_str().len()).max("Verb".len());
    let path_width = width(|entry| entry.path.to_string().len()).max("URI Pattern".len());

    println!(
        "{}",
        style(format!(
            "{:>name_width$} {:<verb_width$} {:<path_width$} {}",
            "Prefix", "Verb", "URI Pattern", "Controller#Action"
        ))
        .bold()
    );

    let mut named: HashSet<&str> = HashSet::new();
    for entry in table {
        let name = if named.insert(entry.name.as_str()) {
            entry.name.as_str()
        } else {
            ""
        };

        println!(
            "{} {} {} {}",
            style(format!("{name:>name_width$}")).cyan(),
            style(format!("{:<verb_width$}", entry.verb.as_str())).green(),
            format_args!("{:<path_width$}", entry.path.to_string()),
            style(target(entry)).dim()
        );
    }
}
