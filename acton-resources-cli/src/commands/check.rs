//! `check` command

use super::SourceArgs;
use anyhow::{bail, Result};
use clap::Args;
use console::{style, Emoji};

static SUCCESS: Emoji = Emoji("✓", "√");
static WARNING: Emoji = Emoji("⚠", "!");

/// Validate controller declarations
#[derive(Debug, Args)]
pub struct CheckCommand {
    #[command(flatten)]
    source: SourceArgs,

    /// Fail when routes bind different parameter names at the same position
    #[arg(long)]
    strict: bool,
}

impl CheckCommand {
    /// Execute the check command
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration cannot be loaded
    /// - Controller declarations are malformed or collide
    /// - `--strict` is set and parameter names conflict
    pub fn execute(&self) -> Result<()> {
        let (tree, table) = self.source.generate()?;
        let conflicts = table.param_conflicts();

        for conflict in &conflicts {
            println!(
                "{} {} and {} bind different parameter names at the same position",
                WARNING,
                style(&conflict.first).yellow(),
                style(&conflict.second).yellow()
            );
        }

        if self.strict && !conflicts.is_empty() {
            bail!(
                "{} parameter name conflict(s); use --param-style qualified",
                conflicts.len()
            );
        }

        println!(
            "{} {} controllers, {} routes",
            SUCCESS,
            style(tree.len()).bold(),
            style(table.len()).bold()
        );

        Ok(())
    }
}
