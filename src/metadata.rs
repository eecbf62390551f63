//! Declarative catalog of integration metadata.
//!
//! This is presentation-layer information (what a driver shows in a
//! `list-integrations` command) separate from the live [`crate::registry`]
//! entries themselves — an adapter can be registered without being listed
//! here (a plugin, say) and vice versa isn't meaningful, since `all()`
//! merges the built-in table with whatever plugins have contributed.

use dashmap::DashMap;

/// Broad grouping used when a driver wants to organize integrations for
/// display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Ci,
    Containers,
    Language,
    Infrastructure,
    Toolchain,
}

/// One row of the integration catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationInfo {
    pub name: &'static str,
    pub display_name: &'static str,
    pub category: Category,
    pub experimental: bool,
}

/// The six adapters this crate ships, per the adapter table in §4.5.
const BUILTINS: &[IntegrationInfo] = &[
    IntegrationInfo {
        name: "github-actions",
        display_name: "GitHub Actions",
        category: Category::Ci,
        experimental: false,
    },
    IntegrationInfo {
        name: "docker",
        display_name: "Docker",
        category: Category::Containers,
        experimental: false,
    },
    IntegrationInfo {
        name: "go",
        display_name: "Go modules",
        category: Category::Language,
        experimental: false,
    },
    IntegrationInfo {
        name: "tflint",
        display_name: "tflint plugins",
        category: Category::Infrastructure,
        experimental: false,
    },
    IntegrationInfo {
        name: "asdf",
        display_name: "asdf",
        category: Category::Toolchain,
        experimental: true,
    },
    IntegrationInfo {
        name: "mise",
        display_name: "mise",
        category: Category::Toolchain,
        experimental: true,
    },
];

lazy_static::lazy_static! {
    /// Plugin-contributed entries, appended to `BUILTINS` by `all()`.
    /// Separate from the built-in slice so plugin loading never needs
    /// `unsafe` mutation of a `const`.
    static ref PLUGIN_ENTRIES: DashMap<&'static str, IntegrationInfo> = DashMap::new();
}

/// Registers (or overwrites) a plugin-contributed catalog entry. Called by
/// [`crate::plugin::load_plugins`] after a plugin's `RegisterWith` symbol
/// has successfully registered its integration.
pub fn register_plugin_entry(info: IntegrationInfo) {
    PLUGIN_ENTRIES.insert(info.name, info);
}

/// All catalog entries: the six built-ins plus anything plugins have
/// contributed, sorted by name for stable display order.
pub fn all() -> Vec<IntegrationInfo> {
    let mut entries: Vec<IntegrationInfo> = BUILTINS.to_vec();
    entries.extend(PLUGIN_ENTRIES.iter().map(|e| e.value().clone()));
    entries.sort_by_key(|info| info.name);
    entries
}

/// Looks up one entry by name, built-in or plugin-contributed.
pub fn get(name: &str) -> Option<IntegrationInfo> {
    BUILTINS
        .iter()
        .find(|info| info.name == name)
        .cloned()
        .or_else(|| PLUGIN_ENTRIES.get(name).map(|e| e.value().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_builtins_are_present() {
        let names: Vec<&str> = all().iter().map(|info| info.name).collect();
        assert!(names.contains(&"github-actions"));
        assert!(names.contains(&"mise"));
        assert_eq!(names.len(), BUILTINS.len());
    }

    #[test]
    fn asdf_and_mise_are_marked_experimental() {
        assert!(get("asdf").unwrap().experimental);
        assert!(get("mise").unwrap().experimental);
        assert!(!get("docker").unwrap().experimental);
    }

    #[test]
    fn unknown_name_is_none() {
        assert!(get("nonexistent").is_none());
    }

    #[test]
    fn plugin_entries_are_merged_into_all() {
        register_plugin_entry(IntegrationInfo {
            name: "npm-custom-test-entry",
            display_name: "npm (custom)",
            category: Category::Language,
            experimental: true,
        });
        assert!(get("npm-custom-test-entry").is_some());
        assert!(all().iter().any(|info| info.name == "npm-custom-test-entry"));
    }
}
