//! Reconciliation of raw discovery records into canonical modules.
//!
//! Records are grouped by physical path. A path reported by a single
//! technology becomes one module. A path reported by several technologies
//! becomes one virtual module per technology, named `{base}-{technology}`,
//! where `base` comes from the record whose technology ranks first in the
//! [`TechnologyOrder`].

use crate::error::AggregationError;
use crate::model::{Module, RawModuleRecord, TechnologyOrder, VirtualModuleInfo};
use crate::paths;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Inputs to [`aggregate`] besides the records themselves.
#[derive(Debug, Clone)]
pub struct AggregateOptions<'a> {
    /// Technology priority used for base-name selection and sorting.
    pub order: &'a TechnologyOrder,
    /// Name given to an unnamed record at the project root.
    pub project_name: &'a str,
}

/// Reconcile raw records into modules, sorted by name.
///
/// The result does not depend on the order of `records`.
///
/// # Errors
///
/// Returns an [`AggregationError`] when the records are inconsistent: more
/// than one aggregator at a path, an aggregator owning sources, a technology
/// reporting the same path twice, two modules ending up with one name, or a
/// hybrid base name that does not identify exactly one path.
pub fn aggregate(
    records: Vec<RawModuleRecord>,
    options: &AggregateOptions<'_>,
) -> Result<Vec<Module>, AggregationError> {
    let mut groups: BTreeMap<String, Vec<RawModuleRecord>> = BTreeMap::new();
    for mut record in records {
        record.physical_path = paths::normalize(&record.physical_path);
        groups
            .entry(paths::key(&record.physical_path))
            .or_default()
            .push(record);
    }

    let mut modules = Vec::new();
    for (path_key, mut group) in groups {
        group.sort_by(|a, b| {
            options
                .order
                .compare(&a.technology, &b.technology)
                .then_with(|| a.name_hint.cmp(&b.name_hint))
        });
        validate_group(&path_key, &group)?;

        if group.len() == 1 {
            if let Some(record) = group.pop() {
                let name = module_name(&record, options.project_name);
                debug!(module = %name, path = %path_key, "Aggregated single-technology module");
                modules.push(Module::from_record(name, record));
            }
        } else {
            modules.extend(split_group(&path_key, group, options.project_name));
        }
    }

    ensure_unique_names(&modules)?;
    ensure_unique_base_names(&modules)?;
    modules.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(modules)
}

fn validate_group(path_key: &str, group: &[RawModuleRecord]) -> Result<(), AggregationError> {
    for record in group {
        if record.packaging_kind.is_aggregator() && !record.source_paths.is_empty() {
            return Err(AggregationError::AggregatorWithSources {
                name: record.name_hint.clone(),
                physical_path: path_key.to_string(),
            });
        }
    }

    for pair in group.windows(2) {
        if let [a, b] = pair
            && a.technology == b.technology
        {
            return Err(AggregationError::DuplicateTechnology {
                physical_path: path_key.to_string(),
                technology: a.technology.to_string(),
            });
        }
    }

    let aggregators: Vec<String> = group
        .iter()
        .filter(|record| record.packaging_kind.is_aggregator())
        .map(|record| record.technology.to_string())
        .collect();
    if aggregators.len() > 1 {
        return Err(AggregationError::ConflictingPackaging {
            physical_path: path_key.to_string(),
            technologies: aggregators,
        });
    }

    Ok(())
}

/// Split a multi-technology group into sibling virtual modules.
///
/// `group` must already be sorted by technology priority.
fn split_group(path_key: &str, group: Vec<RawModuleRecord>, project_name: &str) -> Vec<Module> {
    let base_name = group
        .first()
        .map(|record| module_name(record, project_name))
        .unwrap_or_default();

    let names: Vec<String> = group
        .iter()
        .map(|record| format!("{base_name}-{}", record.technology))
        .collect();

    debug!(
        path = %path_key,
        base = %base_name,
        siblings = ?names,
        "Split hybrid path into virtual modules"
    );

    group
        .into_iter()
        .zip(names.iter())
        .map(|(record, name)| {
            let mut sibling_names: Vec<String> =
                names.iter().filter(|other| *other != name).cloned().collect();
            sibling_names.sort();

            let info = VirtualModuleInfo {
                physical_path: record.physical_path.clone(),
                technology: record.technology.clone(),
                base_name: base_name.clone(),
                sibling_names,
            };
            let mut module = Module::from_record(name.clone(), record);
            module.virtual_module_info = Some(info);
            module
        })
        .collect()
}

fn module_name(record: &RawModuleRecord, project_name: &str) -> String {
    let hint = record.name_hint.trim();
    if !hint.is_empty() {
        return hint.to_string();
    }
    paths::last_component(&record.physical_path).unwrap_or_else(|| project_name.to_string())
}

fn ensure_unique_names(modules: &[Module]) -> Result<(), AggregationError> {
    let mut seen: HashMap<&str, &Module> = HashMap::new();
    for module in modules {
        if let Some(first) = seen.insert(module.name.as_str(), module) {
            return Err(AggregationError::DuplicateName {
                name: module.name.clone(),
                first_path: paths::key(&first.physical_path),
                second_path: paths::key(&module.physical_path),
            });
        }
    }
    Ok(())
}

/// A base name addresses a hybrid group as a whole, so it must belong to a
/// single path and must not also be the name of a plain module.
fn ensure_unique_base_names(modules: &[Module]) -> Result<(), AggregationError> {
    let mut bases: HashMap<&str, &Module> = HashMap::new();
    for module in modules {
        let Some(info) = &module.virtual_module_info else {
            continue;
        };
        match bases.get(info.base_name.as_str()) {
            Some(first) if first.physical_path != module.physical_path => {
                return Err(AggregationError::DuplicateName {
                    name: info.base_name.clone(),
                    first_path: paths::key(&first.physical_path),
                    second_path: paths::key(&module.physical_path),
                });
            }
            Some(_) => {}
            None => {
                bases.insert(info.base_name.as_str(), module);
            }
        }
    }

    for module in modules.iter().filter(|module| !module.is_virtual()) {
        if let Some(group) = bases.get(module.name.as_str()) {
            let (first, second) = if group.physical_path <= module.physical_path {
                (*group, module)
            } else {
                (module, *group)
            };
            return Err(AggregationError::DuplicateName {
                name: module.name.clone(),
                first_path: paths::key(&first.physical_path),
                second_path: paths::key(&second.physical_path),
            });
        }
    }
    Ok(())
}
