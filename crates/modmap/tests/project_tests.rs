//! End-to-end tests: real manifests on disk through discovery, persistence
//! and every query.

#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]

use modmap::{
    CommandSource, DependencyTree, Error, ListFilter, PackagingKind, Project, Resolution,
    Technology, commands,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A Cargo workspace with a root binary and an npm workspace sharing `web/`.
fn shop(root: &Path) {
    write(
        root,
        "Cargo.toml",
        r#"
[package]
name = "shop-server"

[[bin]]
name = "shop-server"
path = "server/main.rs"

[workspace]
members = ["crates/*", "web"]

[dependencies]
shop-core = { path = "crates/core" }
"#,
    );
    write(root, "server/main.rs", "fn main() {}");
    write(
        root,
        "crates/core/Cargo.toml",
        "[package]\nname = \"shop-core\"\n",
    );
    write(root, "crates/core/src/lib.rs", "");
    write(
        root,
        "web/Cargo.toml",
        "[package]\nname = \"web\"\n\n[dependencies]\nshop-core = { path = \"../crates/core\" }\n",
    );
    write(root, "web/src/lib.rs", "");
    write(
        root,
        "package.json",
        r#"{"name": "shop", "private": true, "workspaces": ["web"], "scripts": {"test": "vitest"}}"#,
    );
    write(
        root,
        "web/package.json",
        r#"{"name": "web", "scripts": {"build": "vite build", "test": "vitest run"}}"#,
    );
}

#[test]
fn discovery_persists_hybrid_registry() {
    let temp = TempDir::new().unwrap();
    shop(temp.path());

    let project = Project::open(temp.path()).unwrap();
    let registry = project.discover().unwrap();

    assert_eq!(
        registry.names().collect::<Vec<_>>(),
        vec![
            "shop-core",
            "shop-server-cargo",
            "shop-server-npm",
            "web-cargo",
            "web-npm",
        ]
    );
    assert!(temp.path().join(".modmap/registry.json").is_file());
    assert_eq!(project.registry().unwrap(), registry);

    let npm_root = registry.get("shop-server-npm").unwrap();
    assert!(npm_root.packaging_kind.is_aggregator());
    assert_eq!(
        npm_root.virtual_module_info.as_ref().unwrap().sibling_names,
        vec!["shop-server-cargo"]
    );
}

#[test]
fn list_filters_by_technology_and_pattern() {
    let temp = TempDir::new().unwrap();
    shop(temp.path());
    let project = Project::open(temp.path()).unwrap();
    project.discover().unwrap();

    let npm = project
        .list(&ListFilter::default().technology("npm"))
        .unwrap();
    assert_eq!(npm, vec!["shop-server-npm", "web-npm"]);

    let web = project.list(&ListFilter::default().pattern("web-*")).unwrap();
    assert_eq!(web, vec!["web-cargo", "web-npm"]);

    let libraries = project
        .list(&ListFilter::default().packaging(PackagingKind::Library))
        .unwrap();
    assert_eq!(libraries, vec!["shop-core", "web-cargo", "web-npm"]);
}

#[test]
fn graph_layers_follow_dependencies() {
    let temp = TempDir::new().unwrap();
    shop(temp.path());
    let project = Project::open(temp.path()).unwrap();
    project.discover().unwrap();

    let graph = project.graph(false).unwrap();
    assert_eq!(graph.excluded, vec!["shop-server-npm"]);
    assert_eq!(
        graph.layers,
        vec![
            vec!["shop-core".to_string(), "web-npm".to_string()],
            vec!["shop-server-cargo".to_string(), "web-cargo".to_string()],
        ]
    );
    assert!(!graph.has_cycles());
    assert!(matches!(graph.tree, DependencyTree::Forest(_)));

    let with_aggregators = project.graph(true).unwrap();
    assert!(with_aggregators.excluded.is_empty());
    assert_eq!(with_aggregators.layers[0].len(), 3);
}

#[test]
fn enrichment_leaf_keeps_aggregator_and_is_never_written() {
    let temp = TempDir::new().unwrap();
    shop(temp.path());
    let enrichment = r#"{"modules": {"shop-server-npm": {"isLeaf": true, "description": "JS workspace root", "owner": "web-team"}}}"#;
    write(temp.path(), ".modmap/enrichment.json", enrichment);

    let project = Project::open(temp.path()).unwrap();
    project.discover().unwrap();

    let graph = project.graph(false).unwrap();
    assert!(graph.excluded.is_empty());
    assert!(graph.layers[0].contains(&"shop-server-npm".to_string()));

    let view = project.describe("shop-server-npm").unwrap();
    let merged = view.enrichment.unwrap();
    assert_eq!(merged.description.as_deref(), Some("JS workspace root"));
    assert_eq!(merged.extra["owner"], "web-team");

    let json = serde_json::to_value(project.describe("web-npm").unwrap()).unwrap();
    assert_eq!(json["name"], "web-npm");
    assert!(json.get("enrichment").is_none());

    assert_eq!(
        fs::read_to_string(temp.path().join(".modmap/enrichment.json")).unwrap(),
        enrichment
    );
    let registry_text = fs::read_to_string(temp.path().join(".modmap/registry.json")).unwrap();
    assert!(!registry_text.contains("JS workspace root"));
}

#[test]
fn resolve_hybrid_base_name_lists_every_technology() {
    let temp = TempDir::new().unwrap();
    shop(temp.path());
    let project = Project::open(temp.path()).unwrap();
    project.discover().unwrap();

    let resolution = project.resolve(commands::MODULE_TESTS, Some("web")).unwrap();
    let Resolution::PerTechnology {
        module,
        executables,
        source,
    } = resolution
    else {
        panic!("hybrid base name must resolve per technology");
    };
    assert_eq!(module, "web");
    assert_eq!(source, CommandSource::Module);
    let pairs: Vec<(&str, &str)> = executables
        .iter()
        .map(|e| (e.technology.as_str(), e.command.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("cargo", "cargo test -p web"),
            ("npm", "npm run test --workspace=web"),
        ]
    );

    let single = project.resolve(commands::BUILD, Some("web-npm")).unwrap();
    assert_eq!(single.executables(), vec!["npm run build --workspace=web"]);
}

#[test]
fn resolve_without_module_targets_the_root() {
    let temp = TempDir::new().unwrap();
    shop(temp.path());
    let project = Project::open(temp.path()).unwrap();
    project.discover().unwrap();

    let resolution = project.resolve(commands::VERIFY, None).unwrap();
    assert_eq!(resolution.module(), "shop-server");
    assert_eq!(
        resolution.executables(),
        vec![
            "cargo clippy -p shop-server --all-targets && cargo test -p shop-server",
            "npm run test",
        ]
    );
}

#[test]
fn resolve_falls_back_to_technology_defaults() {
    let temp = TempDir::new().unwrap();
    shop(temp.path());
    let project = Project::open(temp.path()).unwrap();
    project.discover().unwrap();

    let install = project.resolve(commands::INSTALL, Some("shop-core")).unwrap();
    assert_eq!(install.source(), CommandSource::Default);
    assert_eq!(install.executables(), vec!["npm install"]);

    let build = project.resolve(commands::BUILD, Some("shop-server-npm")).unwrap();
    let Resolution::PerTechnology { executables, .. } = build else {
        panic!("defaults shared by two technologies resolve per technology");
    };
    let techs: Vec<&Technology> = executables.iter().map(|e| &e.technology).collect();
    assert_eq!(techs, vec![&Technology::new("cargo"), &Technology::new("npm")]);
}

#[test]
fn resolve_errors_list_alternatives() {
    let temp = TempDir::new().unwrap();
    shop(temp.path());
    let project = Project::open(temp.path()).unwrap();
    project.discover().unwrap();

    let err = project.resolve(commands::BUILD, Some("api")).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Module 'api' not found"));
    assert!(message.contains("shop-core"));

    let err = project.resolve("deploy", Some("shop-core")).unwrap_err();
    assert!(matches!(
        err,
        Error::Core(modmap_core::Error::CommandNotFound { .. })
    ));
}

#[test]
fn configuration_shapes_discovery() {
    let temp = TempDir::new().unwrap();
    shop(temp.path());
    write(
        temp.path(),
        "modmap.toml",
        r#"
projectName = "storefront"
technologyPriority = ["npm", "cargo"]
registryPath = "build/modules.json"

[defaultCommands]
install = "make install"
"#,
    );

    let project = Project::open(temp.path()).unwrap();
    let registry = project.discover().unwrap();

    assert_eq!(registry.project().name, "storefront");
    assert!(temp.path().join("build/modules.json").is_file());
    assert!(!temp.path().join(".modmap/registry.json").exists());

    // npm now ranks first, so its root package names the hybrid group
    assert!(registry.get("shop-npm").is_some());
    assert!(registry.get("shop-cargo").is_some());

    let install = project.resolve(commands::INSTALL, Some("shop-core")).unwrap();
    assert_eq!(install.executables(), vec!["make install"]);
}

#[test]
fn enabled_technologies_limit_providers() {
    let temp = TempDir::new().unwrap();
    shop(temp.path());
    write(
        temp.path(),
        "modmap.toml",
        "enabledTechnologies = [\"cargo\"]\n",
    );

    let project = Project::open(temp.path()).unwrap();
    let registry = project.discover().unwrap();

    assert_eq!(
        registry.names().collect::<Vec<_>>(),
        vec!["shop-core", "shop-server", "web"]
    );
    assert!(registry.modules().all(|m| !m.is_virtual()));
}

#[test]
fn failed_aggregation_keeps_previous_registry() {
    let temp = TempDir::new().unwrap();
    shop(temp.path());
    let project = Project::open(temp.path()).unwrap();
    project.discover().unwrap();
    let before = fs::read(temp.path().join(".modmap/registry.json")).unwrap();

    // An npm package reusing a Cargo package's name elsewhere in the tree
    write(
        temp.path(),
        "package.json",
        r#"{"name": "shop", "workspaces": ["web", "js/*"]}"#,
    );
    write(temp.path(), "js/core/package.json", r#"{"name": "shop-core"}"#);

    let err = project.discover().unwrap_err();
    assert!(matches!(
        err,
        Error::Core(modmap_core::Error::Aggregation(
            modmap_core::AggregationError::DuplicateName { .. }
        ))
    ));
    assert_eq!(
        fs::read(temp.path().join(".modmap/registry.json")).unwrap(),
        before
    );
}

#[test]
fn rediscovery_is_byte_identical() {
    let temp = TempDir::new().unwrap();
    shop(temp.path());
    let project = Project::open(temp.path()).unwrap();

    project.discover().unwrap();
    let first = fs::read(temp.path().join(".modmap/registry.json")).unwrap();
    project.discover().unwrap();
    let second = fs::read(temp.path().join(".modmap/registry.json")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn queries_before_discovery_ask_for_discovery() {
    let temp = TempDir::new().unwrap();
    shop(temp.path());
    let project = Project::open(temp.path()).unwrap();

    let err = project.resolve(commands::BUILD, None).unwrap_err();
    assert!(err.is_registry_missing());
    assert!(project.describe("web-npm").unwrap_err().is_registry_missing());
}
