//! Discovery against the checked-in polyglot fixture.
//!
//! The fixture is a Cargo virtual workspace and an npm workspace sharing one
//! repository; `web/` carries both a `Cargo.toml` and a `package.json`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use modmap_core::{AggregateOptions, Technology, TechnologyOrder, aggregate, commands};
use modmap_discovery::{DiscoveryProvider, NpmProvider, ProviderRegistry};
use std::path::{Path, PathBuf};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/polyglot")
}

#[test]
fn test_discover_all_reports_both_technologies() {
    let output = ProviderRegistry::builtin().discover_all(&fixture()).unwrap();

    let cargo: Vec<(String, String)> = output
        .records
        .iter()
        .filter(|r| r.technology == Technology::new("cargo"))
        .map(|r| (r.physical_path.display().to_string(), r.name_hint.clone()))
        .collect();
    assert_eq!(
        cargo,
        vec![
            (".".to_string(), String::new()),
            ("crates/cli".to_string(), "cli".to_string()),
            ("crates/lib-a".to_string(), "lib-a".to_string()),
            ("crates/lib-b".to_string(), "lib-b".to_string()),
            ("web".to_string(), "web".to_string()),
        ]
    );

    let npm: Vec<String> = output
        .records
        .iter()
        .filter(|r| r.technology == Technology::new("npm"))
        .map(|r| r.physical_path.display().to_string())
        .collect();
    assert_eq!(npm, vec![".", "packages/ui", "web"]);

    let default_techs: Vec<&str> = output.defaults.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(default_techs, vec!["cargo", "npm"]);
}

#[test]
fn test_fixture_aggregates_into_hybrid_modules() {
    let output = ProviderRegistry::builtin().discover_all(&fixture()).unwrap();
    let order = TechnologyOrder::default();
    let modules = aggregate(
        output.records,
        &AggregateOptions {
            order: &order,
            project_name: "polyglot",
        },
    )
    .unwrap();

    let names: Vec<&str> = modules.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "cli",
            "lib-a",
            "lib-b",
            "polyglot-cargo",
            "polyglot-npm",
            "ui",
            "web-cargo",
            "web-npm",
        ]
    );

    let web_npm = modules.iter().find(|m| m.name == "web-npm").unwrap();
    let info = web_npm.virtual_module_info.as_ref().unwrap();
    assert_eq!(info.base_name, "web");
    assert_eq!(info.sibling_names, vec!["web-cargo"]);
    assert!(
        web_npm
            .commands
            .values()
            .all(|value| format!("{value:?}").contains("npm"))
    );

    let cli = modules.iter().find(|m| m.name == "cli").unwrap();
    let deps: Vec<&str> = cli.dependency_identifiers().collect();
    assert_eq!(deps, vec!["lib-a"]);
}

#[test]
fn test_enabled_technologies_limit_discovery() {
    let output = ProviderRegistry::builtin()
        .retain_enabled(&[Technology::new("npm")])
        .unwrap()
        .discover_all(&fixture())
        .unwrap();

    assert!(
        output
            .records
            .iter()
            .all(|r| r.technology == Technology::new("npm"))
    );
    assert_eq!(output.records.len(), 3);
}

#[test]
fn test_npm_root_with_sources_is_a_library() {
    let records = NpmProvider.discover(&fixture()).unwrap();
    let root = &records[0];

    assert_eq!(root.name_hint, "polyglot");
    assert!(!root.packaging_kind.is_aggregator());
    assert_eq!(root.commands[commands::BUILD], "npm run build");
    assert_eq!(root.source_paths, vec![PathBuf::from("src")]);
}
