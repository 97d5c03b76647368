// SPDX-License-Identifier: Apache-2.0
//! Factory configuration (the external file formats "Environment and CLI": "surrounding
//! host code configures the factory via a URI passed to its
//! constructor"), following `echo-config-fs`'s pattern of a small
//! `serde`-deserializable config struct plus a filesystem-backed default.

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::ResourceError;

/// Construction-time configuration for a [`crate::factory::Factory`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactoryConfig {
    /// Path to the bundled archive's `.arci` index file, if a packaged
    /// archive is mounted.
    pub archive_index_path: Option<PathBuf>,
    /// Root directory for loose-file resolution, if a filesystem mount
    /// is enabled (typically development builds).
    pub filesystem_root: Option<PathBuf>,
    /// Directory the liveupdate overlay is stored in. `None` disables
    /// liveupdate support entirely.
    pub liveupdate_dir: Option<PathBuf>,
    /// Capacity of the factory's resource slot table. `Get` beyond this
    /// many live resources fails with [`ResourceError::OutOfResources`].
    pub max_resources: usize,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            archive_index_path: None,
            filesystem_root: None,
            liveupdate_dir: None,
            max_resources: 4096,
        }
    }
}

impl FactoryConfig {
    /// Resolves the platform-appropriate application-support directory
    /// for liveupdate storage, matching the external file formats's "platform-specific
    /// 'application support' directory".
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Invalid`] if the platform has no
    /// resolvable home directory.
    pub fn default_liveupdate_dir(application: &str) -> Result<PathBuf, ResourceError> {
        let dirs = ProjectDirs::from("dev", "flyingrobots", application).ok_or_else(|| {
            ResourceError::Invalid("could not resolve application support directory".into())
        })?;
        Ok(dirs.data_local_dir().join("liveupdate"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_mounts_and_a_nonzero_capacity() {
        let config = FactoryConfig::default();
        assert!(config.archive_index_path.is_none());
        assert!(config.filesystem_root.is_none());
        assert!(config.liveupdate_dir.is_none());
        assert!(config.max_resources > 0);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = FactoryConfig {
            archive_index_path: Some(PathBuf::from("game.arci")),
            filesystem_root: None,
            liveupdate_dir: Some(PathBuf::from("/tmp/lu")),
            max_resources: 128,
        };
        let json = serde_json::to_string(&config).expect("should serialize");
        let parsed: FactoryConfig = serde_json::from_str(&json).expect("should deserialize");
        assert_eq!(parsed.max_resources, 128);
        assert_eq!(parsed.archive_index_path, config.archive_index_path);
    }
}
