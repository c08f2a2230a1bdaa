use crate::enrichment::{EnrichmentSnapshot, ModuleEnrichment};
use crate::error::Result;
use crate::model::Module;
use crate::registry::Registry;
use serde::Serialize;

/// A module merged with its enrichment entry.
///
/// The merge only exists in responses; neither artifact is modified.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleView {
    /// The registry entry.
    #[serde(flatten)]
    pub module: Module,
    /// Enrichment for the module, if any was authored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<ModuleEnrichment>,
}

/// Look up `name` and attach its enrichment.
///
/// # Errors
///
/// Returns [`crate::Error::ModuleNotFound`] if the registry has no such module.
pub fn describe(
    registry: &Registry,
    enrichment: &EnrichmentSnapshot,
    name: &str,
) -> Result<ModuleView> {
    let module = registry.require(name)?;
    Ok(ModuleView {
        module: module.clone(),
        enrichment: enrichment.get(name).cloned(),
    })
}
