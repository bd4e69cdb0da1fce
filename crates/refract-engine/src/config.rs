//! TOML configuration
//!
//! ```toml
//! [reflect.permissions]
//! global = "FULL_ACCESS|FORCE_FINAL"
//!
//! [reflect.permissions.packages]
//! "com.example.app" = "ALL"
//! "com.example.plugins.*" = "PUBLIC_ONLY"
//! ```
//!
//! Package keys containing `*` become wildcard rules. The rule with the
//! longest literal prefix wins, whatever the key order in the file.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ReflectError, ReflectResult};
use crate::permissions::{PackagePermissionRule, PermissionStore, ReflectionPermission};

/// Root of a configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReflectConfig {
    /// `[reflect]` table
    #[serde(default)]
    pub reflect: ReflectSection,
}

/// `[reflect]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReflectSection {
    /// `[reflect.permissions]` table
    #[serde(default)]
    pub permissions: PermissionsSection,
}

/// `[reflect.permissions]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PermissionsSection {
    /// Global default, e.g. `"ALL"` or `"READ_PUBLIC|INVOKE_PUBLIC"`
    pub global: Option<String>,
    /// Package name or pattern -> permissions
    #[serde(default)]
    pub packages: BTreeMap<String, String>,
}

impl ReflectConfig {
    /// Parse a configuration document
    pub fn from_toml_str(content: &str) -> ReflectResult<Self> {
        toml::from_str(content).map_err(|e| ReflectError::Config(e.to_string()))
    }

    /// Read and parse a configuration file
    pub fn load(path: &Path) -> ReflectResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ReflectError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Install the configured permissions into `store`
    ///
    /// Every value is validated before the store is touched.
    pub fn apply(&self, store: &mut PermissionStore) -> ReflectResult<()> {
        let section = &self.reflect.permissions;

        let global = section
            .global
            .as_deref()
            .map(|value| parse_permissions("global", value))
            .transpose()?;
        let packages = section
            .packages
            .iter()
            .map(|(key, value)| Ok((key.as_str(), parse_permissions(key, value)?)))
            .collect::<ReflectResult<Vec<_>>>()?;

        if let Some(global) = global {
            store.set_global(global);
        }
        for (key, permissions) in packages {
            if key.contains('*') {
                store.add_package_rule(PackagePermissionRule {
                    pattern: key.to_string(),
                    permissions,
                });
            } else {
                store.set_package(key, permissions);
            }
        }
        tracing::debug!(
            global = ?global,
            packages = section.packages.len(),
            "applied reflection permissions"
        );
        Ok(())
    }
}

fn parse_permissions(key: &str, value: &str) -> ReflectResult<ReflectionPermission> {
    ReflectionPermission::parse_combined(value)
        .ok_or_else(|| ReflectError::Config(format!("Invalid permission value for {}: {}", key, value)))
}
