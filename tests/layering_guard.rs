//! Layering guardrails to keep the shared crates free of the engine's runtime stack.
//!
//! `candor_core` is pure vocabulary and `candor_syntax` is a pure frontend: neither may pull in the
//! async runtime, serialization, or randomness the engine uses. This test scans their manifests and
//! fails if any such crate appears in `[dependencies]`.

const ENGINE_ONLY: &[&str] = &["tokio", "serde", "serde_json", "rand", "sha2", "clap", "candor"];

fn main_dependencies(manifest: &str) -> Vec<String> {
    let mut in_dependencies = false;
    let mut names = Vec::new();

    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        if line.starts_with('[') {
            in_dependencies = line == "[dependencies]";
            continue;
        }
        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line_no_comment = line.split('#').next().unwrap_or("").trim();
        if let Some((name, _)) = line_no_comment.split_once('=') {
            names.push(name.trim().to_string());
        }
    }
    names
}

fn assert_layered(crate_name: &str, manifest: &str) {
    for dep in main_dependencies(manifest) {
        if ENGINE_ONLY.contains(&dep.as_str()) {
            panic!("`{dep}` must not appear in {crate_name}'s [dependencies]");
        }
    }
}

#[test]
fn core_has_no_engine_dependencies() {
    assert_layered("candor_core", include_str!("../crates/candor_core/Cargo.toml"));
}

#[test]
fn syntax_has_no_engine_dependencies() {
    let manifest = include_str!("../crates/candor_syntax/Cargo.toml");
    assert_layered("candor_syntax", manifest);
    assert!(main_dependencies(manifest).contains(&"candor_core".to_string()));
}

#[test]
fn engine_leaves_diagnostics_to_syntax() {
    let manifest = include_str!("../Cargo.toml");
    assert!(!main_dependencies(manifest).contains(&"miette".to_string()));
    assert!(main_dependencies(include_str!("../crates/candor_syntax/Cargo.toml")).contains(&"miette".to_string()));
}
