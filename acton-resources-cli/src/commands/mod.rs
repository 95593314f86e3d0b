//! CLI command implementations

pub mod check;
pub mod routes;

pub use check::CheckCommand;
pub use routes::RoutesCommand;

use acton_resources::{ParamStyle, ResourcesConfig, RouteTable, RoutingTree};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// Parameter naming style accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StyleArg {
    /// Last parameter is `:id`, earlier ones `:{resource}_id`
    Trailing,
    /// Own parameter is `:id`, ancestors `:{resource}_id`
    Prefixed,
    /// Every parameter is `:{resource}_id`
    Qualified,
}

impl From<StyleArg> for ParamStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Trailing => Self::Trailing,
            StyleArg::Prefixed => Self::Prefixed,
            StyleArg::Qualified => Self::Qualified,
        }
    }
}

/// Where declarations come from and how routes are generated
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Configuration file (default: layered service configuration)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Service name used to locate layered configuration
    #[arg(long, default_value = "default")]
    pub service: String,

    /// Controllers directory, overriding `discovery.controllers_dir`
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Parameter naming style, overriding `routing.param_style`
    #[arg(long, value_enum)]
    pub param_style: Option<StyleArg>,

    /// Emit PUT alongside PATCH for `update`
    #[arg(long)]
    pub emit_put: bool,
}

impl SourceArgs {
    /// Load configuration and apply command-line overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub fn load(&self) -> Result<ResourcesConfig> {
        let mut config = match &self.config {
            Some(path) => ResourcesConfig::load_from(path)?,
            None => ResourcesConfig::load_for_service(&self.service)?,
        };

        if let Some(dir) = &self.dir {
            config.discovery.controllers_dir = Some(dir.clone());
        }
        if let Some(style) = self.param_style {
            config.routing.param_style = style.into();
        }
        if self.emit_put {
            config.routing.emit_put = true;
        }

        Ok(config)
    }

    /// Build the routing tree and generate its table
    ///
    /// # Errors
    ///
    /// Returns an error if loading, discovery, tree resolution or generation
    /// fails.
    pub fn generate(&self) -> Result<(RoutingTree, RouteTable)> {
        let config = self.load()?;
        let tree = config.routing_tree()?;
        let table = tree
            .generate_with(&config.routing)
            .context("Failed to generate routes")?;
        Ok((tree, table))
    }
}
