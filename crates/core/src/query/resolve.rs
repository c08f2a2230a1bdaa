//! Canonical command resolution.
//!
//! Resolution is read-only: it maps a canonical command name onto the
//! executable string(s) registered for a module, falling back to the
//! project-wide default module. It never runs anything.

use crate::error::{Error, Result};
use crate::model::{CommandValue, Module, Technology, TechnologyOrder};
use crate::registry::Registry;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Name reported for resolutions against an empty registry.
pub const DEFAULT_MODULE_NAME: &str = "defaults";

/// Where a resolved command came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandSource {
    /// The module's own command table.
    Module,
    /// The project-wide default module.
    Default,
}

/// One technology's executable in a per-technology resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TechnologyCommand {
    /// Technology the executable belongs to.
    pub technology: Technology,
    /// Module that registered it.
    pub module: String,
    /// The executable string.
    pub command: String,
}

/// Outcome of resolving a canonical command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Resolution {
    /// Exactly one executable.
    Single {
        /// Module the command was resolved against.
        module: String,
        /// The executable string.
        executable: String,
        /// Module table or defaults.
        source: CommandSource,
    },
    /// One executable per technology, in technology priority order.
    PerTechnology {
        /// Module or hybrid base name the command was resolved against.
        module: String,
        /// Executables, one per technology.
        executables: Vec<TechnologyCommand>,
        /// Module table or defaults.
        source: CommandSource,
    },
}

impl Resolution {
    /// The module (or hybrid base name) the command resolved against.
    #[must_use]
    pub fn module(&self) -> &str {
        match self {
            Self::Single { module, .. } | Self::PerTechnology { module, .. } => module,
        }
    }

    /// Where the command came from.
    #[must_use]
    pub fn source(&self) -> CommandSource {
        match self {
            Self::Single { source, .. } | Self::PerTechnology { source, .. } => *source,
        }
    }

    /// All executable strings, in order.
    #[must_use]
    pub fn executables(&self) -> Vec<&str> {
        match self {
            Self::Single { executable, .. } => vec![executable.as_str()],
            Self::PerTechnology { executables, .. } => {
                executables.iter().map(|e| e.command.as_str()).collect()
            }
        }
    }
}

/// What a resolution runs against.
enum Target<'a> {
    Module(&'a Module),
    Hybrid {
        base_name: &'a str,
        members: Vec<&'a Module>,
    },
    DefaultsOnly,
}

impl Target<'_> {
    fn label(&self) -> &str {
        match self {
            Self::Module(module) => &module.name,
            Self::Hybrid { base_name, .. } => base_name,
            Self::DefaultsOnly => DEFAULT_MODULE_NAME,
        }
    }

    fn command_names(&self) -> Vec<&str> {
        match self {
            Self::Module(module) => module.commands.keys().map(String::as_str).collect(),
            Self::Hybrid { members, .. } => members
                .iter()
                .flat_map(|m| m.commands.keys().map(String::as_str))
                .collect(),
            Self::DefaultsOnly => Vec::new(),
        }
    }
}

/// Resolve `command` for `module_name`, or for the root target when none is given.
///
/// `module_name` may name a module or the base name of a hybrid group. An
/// empty name counts as unspecified.
///
/// # Errors
///
/// - [`Error::ModuleNotFound`] if `module_name` names neither a module nor a hybrid group
/// - [`Error::CommandNotFound`] if neither the target nor the defaults define `command`
pub fn resolve(registry: &Registry, command: &str, module_name: Option<&str>) -> Result<Resolution> {
    let target = match module_name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => named_target(registry, name)?,
        None => root_target(registry),
    };
    debug!(command, target = %target.label(), "Resolving command");

    let order = registry.technology_order();
    let label = target.label().to_string();

    let found = match &target {
        Target::Module(module) => module
            .commands
            .get(command)
            .map(|value| from_value(&label, value, CommandSource::Module, order)),
        Target::Hybrid { members, .. } => hybrid_resolution(&label, members, command, order),
        Target::DefaultsOnly => None,
    };
    if let Some(resolution) = found {
        return Ok(resolution);
    }

    if let Some(value) = registry.defaults().commands.get(command) {
        debug!(command, target = %label, "Falling back to default module");
        return Ok(from_value(&label, value, CommandSource::Default, order));
    }

    let available: BTreeSet<&str> = target
        .command_names()
        .into_iter()
        .chain(registry.defaults().commands.keys().map(String::as_str))
        .collect();
    Err(Error::CommandNotFound {
        command: command.to_string(),
        module: label,
        available: available.into_iter().map(str::to_string).collect(),
    })
}

fn named_target<'a>(registry: &'a Registry, name: &'a str) -> Result<Target<'a>> {
    if let Some(module) = registry.get(name) {
        return Ok(Target::Module(module));
    }

    let members = registry.hybrid_group(name);
    if members.is_empty() {
        return Err(Error::ModuleNotFound {
            name: name.to_string(),
            available: registry.names().map(str::to_string).collect(),
        });
    }
    Ok(Target::Hybrid {
        base_name: name,
        members,
    })
}

fn root_target(registry: &Registry) -> Target<'_> {
    let mut roots = registry.root_modules();
    if let Some(root) = roots.next() {
        if let Some(info) = root.virtual_module_info.as_ref() {
            return Target::Hybrid {
                base_name: &info.base_name,
                members: registry.hybrid_group(&info.base_name),
            };
        }
        return Target::Module(root);
    }

    registry
        .modules()
        .next()
        .map_or(Target::DefaultsOnly, Target::Module)
}

fn hybrid_resolution(
    base_name: &str,
    members: &[&Module],
    command: &str,
    order: &TechnologyOrder,
) -> Option<Resolution> {
    let mut executables = Vec::new();
    for member in members {
        let Some(value) = member.commands.get(command) else {
            continue;
        };
        match value {
            CommandValue::Single(executable) => {
                let technology = member
                    .virtual_module_info
                    .as_ref()
                    .map(|info| info.technology.clone())
                    .or_else(|| member.build_technologies.first().cloned());
                if let Some(technology) = technology {
                    executables.push(TechnologyCommand {
                        technology,
                        module: member.name.clone(),
                        command: executable.clone(),
                    });
                }
            }
            CommandValue::PerTechnology(per_tech) => {
                executables.extend(per_technology(&member.name, per_tech, order));
            }
        }
    }

    if executables.is_empty() {
        return None;
    }
    executables.sort_by(|a, b| order.compare(&a.technology, &b.technology));
    Some(Resolution::PerTechnology {
        module: base_name.to_string(),
        executables,
        source: CommandSource::Module,
    })
}

fn from_value(
    module: &str,
    value: &CommandValue,
    source: CommandSource,
    order: &TechnologyOrder,
) -> Resolution {
    match value {
        CommandValue::Single(executable) => Resolution::Single {
            module: module.to_string(),
            executable: executable.clone(),
            source,
        },
        CommandValue::PerTechnology(per_tech) => Resolution::PerTechnology {
            module: module.to_string(),
            executables: per_technology(module, per_tech, order),
            source,
        },
    }
}

fn per_technology(
    module: &str,
    per_tech: &BTreeMap<Technology, String>,
    order: &TechnologyOrder,
) -> Vec<TechnologyCommand> {
    let mut executables: Vec<TechnologyCommand> = per_tech
        .iter()
        .map(|(technology, command)| TechnologyCommand {
            technology: technology.clone(),
            module: module.to_string(),
            command: command.clone(),
        })
        .collect();
    executables.sort_by(|a, b| order.compare(&a.technology, &b.technology));
    executables
}
