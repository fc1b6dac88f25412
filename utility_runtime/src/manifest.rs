//! Deploy manifest — the configuration a registry is deployed from.
//!
//! ```json
//! {
//!   "admin": "0x...",
//!   "name": "MyMultilityToken",
//!   "symbol": "MMT",
//!   "utilities": [
//!     { "id": 1, "label": "Utility A", "issuer": "0x...", "transferable": true }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use utility_registry::domain::{AccountId, UtilityDefinition};
use utility_registry::engine::Registry;
use utility_registry::error::RegistryError;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("deploy rejected: {0}")]
    Deploy(#[from] RegistryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployManifest {
    pub admin: AccountId,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub utilities: Vec<UtilityDefinition>,
}

impl Default for DeployManifest {
    /// The reference deployment: two utilities, deployed by a local admin.
    fn default() -> Self {
        Self {
            admin: AccountId::new("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
            name: "MyMultilityToken".to_string(),
            symbol: "MMT".to_string(),
            utilities: vec![
                UtilityDefinition::new(
                    1,
                    "Utility A",
                    "0x1234567890abcdef1234567890abcdef12345678",
                    true,
                ),
                UtilityDefinition::new(
                    2,
                    "Utility B",
                    "0xf11d8A2BF17D04C50CfB6ba505e1e88c4BD4b673",
                    false,
                ),
            ],
        }
    }
}

impl DeployManifest {
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn deploy(self) -> Result<Registry, ManifestError> {
        Ok(Registry::deploy(
            self.admin,
            &self.name,
            &self.symbol,
            self.utilities,
        )?)
    }
}
