//! Options file handling.
//!
//! A `--config` file holds a JSON [`DiagramOptions`] object. Every field is
//! optional; explicit flags win over file values, and file values win over
//! the built-in defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use stageflow_core::{Dialect, FlowDirection, RenderOptions};
use std::path::Path;

use crate::cli::{Args, OutputFormat};

/// Resolved settings for one CLI run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct DiagramOptions {
    pub dialect: Dialect,
    pub direction: FlowDirection,
    pub format: OutputFormat,
}

impl DiagramOptions {
    /// Load options from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse options JSON")
    }

    /// Resolve the settings for `args`, reading `--config` when given.
    pub fn resolve(args: &Args) -> Result<Self> {
        let base = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(base.overridden_by(args))
    }

    fn overridden_by(self, args: &Args) -> Self {
        Self {
            dialect: args.dialect.map(Into::into).unwrap_or(self.dialect),
            direction: args.direction.unwrap_or(self.direction),
            format: args.format.unwrap_or(self.format),
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            direction: self.direction,
        }
    }
}
