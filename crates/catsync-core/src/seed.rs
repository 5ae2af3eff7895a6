//! YAML seed files for the in-memory document store.
//!
//! A seed file lists raw product documents exactly as the remote store would
//! hold them; nothing is normalized here, so seeds can deliberately include
//! malformed records.
//!
//! ```yaml
//! products:
//!   - id: trail-runner
//!     name: Trail Runner
//!     price: 89.99
//!     image: https://cdn.example.com/trail-runner.jpg
//!   - name: Canvas Hat      # id assigned by the store
//!     price: "19.50"
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

#[derive(Debug, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub products: Vec<SeedDocument>,
}

/// One raw document from a seed file.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedDocument {
    /// Explicit document id; the store assigns one when absent.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Load and validate a seed file from disk.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_seed_file(path: &Path) -> Result<SeedFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SeedFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_seed(&content)
}

fn parse_seed(content: &str) -> Result<SeedFile, ConfigError> {
    let seed: SeedFile = serde_yaml::from_str(content).map_err(ConfigError::SeedFileParse)?;
    validate_seed(&seed)?;
    Ok(seed)
}

fn validate_seed(seed: &SeedFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for doc in &seed.products {
        let Some(id) = doc.id.as_deref() else {
            continue;
        };
        if id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "seed document id must be non-empty when given".to_string(),
            ));
        }
        if !seen_ids.insert(id) {
            return Err(ConfigError::Validation(format!(
                "duplicate seed document id: '{id}'"
            )));
        }
    }

    Ok(())
}
