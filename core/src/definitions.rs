//! Workflow definition files
//!
//! A definition file holds a list of workflows under the `workflow` key, in TOML or JSON:
//!
//! ```toml
//! [[workflow]]
//! name = "checkout"
//!
//! [[workflow.rules]]
//! name = "isLoyaltyMember"
//! expression = "input.IsLoyaltyMember"
//! on_success = "AddDiscount"
//! context = { discount = 5 }
//! ```
//!
//! Every workflow is validated while it is deserialized, so a file that loads is a file
//! the engine accepts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::engine::index_by_name;
use crate::error::DefinitionError;
use crate::workflow::Workflow;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSet {
    #[serde(rename = "workflow", default)]
    pub workflows: Vec<Workflow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
    Json,
    Toml,
}

impl DefinitionFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, DefinitionError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "json" => Ok(DefinitionFormat::Json),
            "toml" => Ok(DefinitionFormat::Toml),
            _ => Err(DefinitionError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Workflows read from one file
#[derive(Debug, Clone)]
pub struct LoadedWorkflows {
    pub path: PathBuf,
    pub workflows: Vec<Workflow>,
    /// SHA-256 of the file contents, hex encoded
    pub version: String,
}

/// Parse workflow definitions from source text, rejecting duplicate workflow names
pub fn parse_workflows(source: &str, format: DefinitionFormat) -> Result<Vec<Workflow>, DefinitionError> {
    let set: WorkflowSet = match format {
        DefinitionFormat::Json => serde_json::from_str(source)?,
        DefinitionFormat::Toml => toml::from_str(source)?,
    };

    let indexed = index_by_name(set.workflows)?;
    Ok(indexed.into_values().collect())
}

pub fn load_workflow_file(path: impl AsRef<Path>) -> Result<LoadedWorkflows, DefinitionError> {
    let path = path.as_ref();
    let format = DefinitionFormat::from_path(path)?;
    let source = std::fs::read_to_string(path).map_err(|source| DefinitionError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let workflows = parse_workflows(&source, format)?;
    let version = hash_source(&source);

    info!(
        path = %path.display(),
        version = &version[..8],
        workflows = workflows.len(),
        "loaded workflow definitions"
    );

    Ok(LoadedWorkflows {
        path: path.to_path_buf(),
        workflows,
        version,
    })
}

fn hash_source(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}
