//! The canonical module registry.
//!
//! A registry is rebuilt wholesale by every discovery run and treated as an
//! immutable snapshot by queries.

use crate::error::{Error, Result};
use crate::model::{CommandValue, Module, Technology, TechnologyOrder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Registry artifact schema version written by this crate.
pub const SCHEMA_VERSION: u32 = 1;

/// Project-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Project name.
    pub name: String,
}

/// The reserved default module holding project-wide fallback commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultModule {
    /// Canonical command name to executable string(s).
    #[serde(default)]
    pub commands: BTreeMap<String, CommandValue>,
}

impl DefaultModule {
    /// Build defaults from each technology's fallback commands.
    ///
    /// A command offered by one technology becomes a single value; a command
    /// offered by several becomes a per-technology value. Entries in
    /// `overrides` replace whatever the technologies supplied.
    #[must_use]
    pub fn from_technology_defaults(
        defaults: impl IntoIterator<Item = (Technology, BTreeMap<String, String>)>,
        overrides: &BTreeMap<String, CommandValue>,
    ) -> Self {
        let mut by_command: BTreeMap<String, BTreeMap<Technology, String>> = BTreeMap::new();
        for (technology, commands) in defaults {
            for (command, executable) in commands {
                by_command
                    .entry(command)
                    .or_default()
                    .insert(technology.clone(), executable);
            }
        }

        let mut commands: BTreeMap<String, CommandValue> = by_command
            .into_iter()
            .map(|(command, mut per_tech)| {
                let value = if per_tech.len() == 1
                    && let Some((_, executable)) = per_tech.pop_first()
                {
                    CommandValue::Single(executable)
                } else {
                    CommandValue::PerTechnology(per_tech)
                };
                (command, value)
            })
            .collect();

        commands.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { commands }
    }
}

/// The canonical set of modules for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    schema_version: u32,
    project: ProjectInfo,
    technology_priority: TechnologyOrder,
    #[serde(default)]
    defaults: DefaultModule,
    modules: BTreeMap<String, Module>,
}

impl Registry {
    /// Build a registry from aggregated modules.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateModule`] if two modules share a name.
    pub fn from_modules(
        project: ProjectInfo,
        technology_priority: TechnologyOrder,
        defaults: DefaultModule,
        modules: impl IntoIterator<Item = Module>,
    ) -> Result<Self> {
        let mut by_name = BTreeMap::new();
        for module in modules {
            let name = module.name.clone();
            if by_name.insert(name.clone(), module).is_some() {
                return Err(Error::DuplicateModule { name });
            }
        }

        Ok(Self {
            schema_version: SCHEMA_VERSION,
            project,
            technology_priority,
            defaults,
            modules: by_name,
        })
    }

    /// Project metadata.
    #[must_use]
    pub fn project(&self) -> &ProjectInfo {
        &self.project
    }

    /// The technology order the registry was built with.
    #[must_use]
    pub fn technology_order(&self) -> &TechnologyOrder {
        &self.technology_priority
    }

    /// The reserved default module.
    #[must_use]
    pub fn defaults(&self) -> &DefaultModule {
        &self.defaults
    }

    /// Schema version recorded in the artifact.
    #[must_use]
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Look up a module by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    /// Look up a module by name, failing with the list of known names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModuleNotFound`] if no module has this name.
    pub fn require(&self, name: &str) -> Result<&Module> {
        self.get(name).ok_or_else(|| Error::ModuleNotFound {
            name: name.to_string(),
            available: self.names().map(str::to_string).collect(),
        })
    }

    /// Module names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Modules in name order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    /// Number of modules, excluding the default module.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the registry holds no modules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Modules located at the project root, in name order.
    pub fn root_modules(&self) -> impl Iterator<Item = &Module> {
        self.modules().filter(|module| module.is_at_root())
    }

    /// Sibling virtual modules sharing `base_name`, in technology priority order.
    ///
    /// Empty when `base_name` names no virtual-module group.
    #[must_use]
    pub fn hybrid_group(&self, base_name: &str) -> Vec<&Module> {
        let mut members: Vec<&Module> = self
            .modules()
            .filter(|module| {
                module
                    .virtual_module_info
                    .as_ref()
                    .is_some_and(|info| info.base_name == base_name)
            })
            .collect();
        members.sort_by(|a, b| {
            let tech = |m: &Module| {
                m.virtual_module_info
                    .as_ref()
                    .map(|info| info.technology.clone())
            };
            match (tech(a), tech(b)) {
                (Some(ta), Some(tb)) => self.technology_priority.compare(&ta, &tb),
                _ => a.name.cmp(&b.name),
            }
        });
        members
    }
}
