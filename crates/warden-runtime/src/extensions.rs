//! Extension discovery and loading.
//!
//! An extension is a named bundle of commands. Extensions are registered in
//! an [`ExtensionSet`] under dotted ids (`cogs.owner_cmds`) and loaded at
//! startup in two passes:
//!
//! 1. every preloaded id, in configuration order;
//! 2. every id discovered in the extension folder, minus the denylist and
//!    the preloaded ids.
//!
//! A discovered file with no registered extension is skipped
//! ([`ExtensionError::NoEntryPoint`]). Any other failure halts loading.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use warden_framework::CommandRegistry;

use crate::config::ExtensionsConfig;
use crate::error::ExtensionError;

/// A bundle of commands.
pub trait Extension: Send + Sync {
    /// Registers the extension's commands.
    fn setup(&self, commands: &CommandRegistry) -> anyhow::Result<()>;
}

impl<F> Extension for F
where
    F: Fn(&CommandRegistry) -> anyhow::Result<()> + Send + Sync,
{
    fn setup(&self, commands: &CommandRegistry) -> anyhow::Result<()> {
        self(commands)
    }
}

/// Extensions known to the binary, by id.
#[derive(Default, Clone)]
pub struct ExtensionSet {
    entries: BTreeMap<String, Arc<dyn Extension>>,
}

impl fmt::Debug for ExtensionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

impl ExtensionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `extension` under `id`, replacing any previous entry.
    pub fn with(mut self, id: impl Into<String>, extension: impl Extension + 'static) -> Self {
        self.insert(id, extension);
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, extension: impl Extension + 'static) {
        self.entries.insert(id.into(), Arc::new(extension));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Loads one extension into `commands`.
    pub fn load(&self, id: &str, commands: &CommandRegistry) -> Result<(), ExtensionError> {
        let extension = self
            .entries
            .get(id)
            .ok_or_else(|| ExtensionError::NoEntryPoint(id.to_string()))?;

        extension
            .setup(commands)
            .map_err(|err| ExtensionError::load_failed(id, format!("{err:#}")))?;

        debug!(extension = id, "Loaded extension");
        Ok(())
    }

    /// Runs both loading passes and returns the ids that were loaded, in
    /// order.
    pub fn load_all(
        &self,
        config: &ExtensionsConfig,
        commands: &CommandRegistry,
    ) -> Result<Vec<String>, ExtensionError> {
        let mut loaded = Vec::new();

        for id in &config.preloaded {
            self.load(id, commands)?;
            loaded.push(id.clone());
        }

        let skip: HashSet<&str> = config
            .denylist
            .iter()
            .chain(&config.preloaded)
            .map(String::as_str)
            .collect();

        let discovered = discover_extensions(
            &config.resolved_base_dir(),
            &config.folder,
            &config.file_extension,
        )?;

        for id in discovered {
            if skip.contains(id.as_str()) {
                continue;
            }
            match self.load(&id, commands) {
                Ok(()) => loaded.push(id),
                Err(ExtensionError::NoEntryPoint(id)) => {
                    debug!(extension = %id, "Skipping file without an entry point");
                }
                Err(err) => return Err(err),
            }
        }

        info!(count = loaded.len(), "Extensions loaded");
        Ok(loaded)
    }
}

/// Lists extension ids under `base_dir/folder`, sorted.
///
/// `cogs/admin/prefix.rs` becomes `cogs.admin.prefix`. A missing folder
/// yields no extensions.
pub fn discover_extensions(
    base_dir: &Path,
    folder: &str,
    file_extension: &str,
) -> Result<Vec<String>, ExtensionError> {
    let root = base_dir.join(folder);
    if !root.is_dir() {
        warn!(path = %root.display(), "Extension folder not found");
        return Ok(Vec::new());
    }

    let pattern = format!(
        "{}/**/*.{file_extension}",
        glob::Pattern::escape(&root.display().to_string())
    );
    let entries = glob::glob(&pattern).map_err(|source| ExtensionError::Pattern {
        pattern: pattern.clone(),
        source,
    })?;

    let mut ids: Vec<String> = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => ids.extend(path_to_id(base_dir, &path)),
            Ok(_) => {}
            Err(e) => debug!(error = %e, "Skipping unreadable extension entry"),
        }
    }
    ids.sort();
    Ok(ids)
}

fn path_to_id(base_dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base_dir).ok()?.with_extension("");
    let parts: Option<Vec<&str>> = relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect();
    Some(parts?.join("."))
}
