//! Dynamic loading of out-of-tree integrations.
//!
//! Scans a fixed set of directories for shared objects exporting a
//! `RegisterWith` symbol and hands each one a reference to the live
//! [`IntegrationRegistry`] to register into. Load failures are logged and
//! skipped — a broken plugin must never prevent built-in adapters from
//! working.

use crate::registry::IntegrationRegistry;
use libloading::{Library, Symbol};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// The symbol every plugin shared object must export.
const ENTRY_POINT: &[u8] = b"RegisterWith";

/// Signature of a plugin's entry point: given the process-wide registry,
/// register every integration the plugin provides.
type RegisterFn = unsafe extern "C" fn(&IntegrationRegistry);

lazy_static::lazy_static! {
    /// Loaded libraries are kept alive for the process lifetime — dropping
    /// a `Library` would unload code whose constructors may still be
    /// cached in the registry.
    static ref LOADED: Mutex<Vec<Library>> = Mutex::new(Vec::new());
}

/// Directories scanned for plugins, checked in this order, with
/// `$UPTOOL_PLUGIN_DIR` (if set) appended last.
fn plugin_directories() -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::from("./plugins")];
    if let Some(home) = home::home_dir() {
        dirs.push(home.join(".uptool").join("plugins"));
    }
    dirs.push(PathBuf::from("/usr/local/lib/uptool/plugins"));
    if let Ok(extra) = std::env::var("UPTOOL_PLUGIN_DIR") {
        dirs.push(PathBuf::from(extra));
    }
    dirs
}

fn shared_object_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext == std::env::consts::DLL_EXTENSION)
                .unwrap_or(false)
        })
        .collect()
}

/// Scans every plugin directory and loads each shared object found,
/// registering its integrations into `registry`. Called at most once per
/// process by [`IntegrationRegistry::get`]/[`IntegrationRegistry::get_all`]
/// unless `reload_plugins` resets that guard.
pub fn load_plugins(registry: &IntegrationRegistry) {
    for dir in plugin_directories() {
        for path in shared_object_files(&dir) {
            if let Err(err) = load_one(&path, registry) {
                tracing::warn!(plugin = %path.display(), error = %err, "failed to load plugin");
            }
        }
    }
}

fn load_one(path: &Path, registry: &IntegrationRegistry) -> Result<(), libloading::Error> {
    // Safety: plugins are trusted, operator-installed shared objects, not
    // arbitrary untrusted input. We require the exact `RegisterWith`
    // symbol and the signature above before invoking anything.
    unsafe {
        let library = Library::new(path)?;
        let register_with: Symbol<RegisterFn> = library.get(ENTRY_POINT)?;
        register_with(registry);
        LOADED.lock().expect("plugin registry lock poisoned").push(library);
    }
    tracing::info!(plugin = %path.display(), "loaded plugin");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_directories_includes_fixed_locations() {
        let dirs = plugin_directories();
        assert!(dirs.contains(&PathBuf::from("./plugins")));
        assert!(dirs.contains(&PathBuf::from("/usr/local/lib/uptool/plugins")));
    }

    #[test]
    fn missing_directory_yields_no_shared_objects() {
        assert!(shared_object_files(Path::new("/nonexistent/uptool/plugins")).is_empty());
    }

    #[test]
    fn env_override_is_appended() {
        std::env::set_var("UPTOOL_PLUGIN_DIR", "/tmp/custom-uptool-plugins");
        let dirs = plugin_directories();
        assert!(dirs.contains(&PathBuf::from("/tmp/custom-uptool-plugins")));
        std::env::remove_var("UPTOOL_PLUGIN_DIR");
    }
}
