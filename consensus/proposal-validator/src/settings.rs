use std::{fs, path::Path};

use halite_core::consts::MAX_SQUARE_SIZE;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProposalValidatorSettings {
    /// Largest original square width a proposal may declare.
    pub max_square_size: usize,
    /// Reject proposals where two claims carry the same commitment instead of
    /// collapsing them into one.
    pub reject_duplicate_commitments: bool,
}

impl Default for ProposalValidatorSettings {
    fn default() -> Self {
        Self {
            max_square_size: MAX_SQUARE_SIZE,
            reject_duplicate_commitments: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

impl ProposalValidatorSettings {
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }
}
