//! End-to-end resolution over levels on disk.

use bemdeps::core::BemError;
use bemdeps::resolver::ResolveOptions;

use crate::common::{TestProject, keys};

fn strict() -> ResolveOptions {
    ResolveOptions {
        strict: true,
        ..ResolveOptions::default()
    }
}

#[tokio::test]
async fn test_must_dependency_is_emitted_first() {
    let project = TestProject::new().unwrap();
    project.deps("blocks", "a", r#"{"mustDeps": {"block": "b"}}"#);

    let resolution =
        project.resolve(&["blocks"], r#"[{"block": "a"}]"#, ResolveOptions::default()).await.unwrap();
    assert_eq!(keys(&resolution), ["b", "a"]);
    assert!(resolution.cycles.is_empty());
}

#[tokio::test]
async fn test_should_cycle_is_harmless() {
    let project = TestProject::new().unwrap();
    project
        .deps("blocks", "a", r#"{"shouldDeps": {"block": "b"}}"#)
        .deps("blocks", "b", r#"{"shouldDeps": {"block": "a"}}"#);

    let resolution = project.resolve(&["blocks"], r#"[{"block": "a"}]"#, strict()).await.unwrap();
    assert_eq!(keys(&resolution), ["a", "b"]);
    assert!(resolution.cycles.is_empty());
}

#[tokio::test]
async fn test_must_cycle_is_broken() {
    let project = TestProject::new().unwrap();
    project
        .deps("blocks", "a", r#"{"mustDeps": "b"}"#)
        .deps("blocks", "b", r#"{"mustDeps": "a"}"#);

    let resolution =
        project.resolve(&["blocks"], r#"["a"]"#, ResolveOptions::default()).await.unwrap();
    assert_eq!(keys(&resolution), ["b", "a"]);
    assert_eq!(resolution.cycles.len(), 1);

    let mut members: Vec<String> =
        resolution.cycles[0].entities.iter().map(|e| e.key()).collect();
    members.sort();
    assert_eq!(members, ["a", "b"]);
}

#[tokio::test]
async fn test_must_cycle_in_strict_mode() {
    let project = TestProject::new().unwrap();
    project
        .deps("blocks", "alpha", r#"{"mustDeps": "beta"}"#)
        .deps("blocks", "beta", r#"{"mustDeps": "alpha"}"#);

    let err = project.resolve(&["blocks"], r#"["alpha"]"#, strict()).await.unwrap_err();
    let bem = err.downcast_ref::<BemError>().unwrap();
    assert!(matches!(bem, BemError::CircularDependency { .. }));

    let message = err.to_string();
    assert!(message.contains("Circular"));
    assert!(message.contains("alpha") && message.contains("beta"));
}

#[tokio::test]
async fn test_boolean_modifier_expands_in_nested_order() {
    let project = TestProject::new().unwrap();
    project.deps("blocks", "a", r#"{"mustDeps": {"block": "X", "mods": {"m": true}}}"#);

    let resolution =
        project.resolve(&["blocks"], r#"["a"]"#, ResolveOptions::default()).await.unwrap();
    assert_eq!(keys(&resolution), ["X", "X_m", "X_m_true", "a"]);
}

#[tokio::test]
async fn test_no_deps_removes_inherited_edge() {
    let project = TestProject::new().unwrap();
    project
        .deps("common", "button", r#"{"mustDeps": ["i-bem", "legacy-reset"]}"#)
        .deps("desktop", "button", r#"{"noDeps": ["legacy-reset", "never-declared"]}"#);

    let resolution = project
        .resolve(&["common", "desktop"], r#"["button"]"#, ResolveOptions::default())
        .await
        .unwrap();
    assert_eq!(keys(&resolution), ["i-bem", "button"]);
}

#[tokio::test]
async fn test_declare_then_remove_equals_never_declared() {
    let with_removal = TestProject::new().unwrap();
    with_removal
        .deps("blocks", "a", r#"[{"mustDeps": "c"}, {"shouldDeps": ["b", "d"]}, {"noDeps": "b"}]"#)
        .deps("blocks", "b", "{ broken")
        .deps("blocks", "d", r#"{"shouldDeps": "e"}"#);
    let without = TestProject::new().unwrap();
    without
        .deps("blocks", "a", r#"[{"mustDeps": "c"}, {"shouldDeps": "d"}]"#)
        .deps("blocks", "d", r#"{"shouldDeps": "e"}"#);

    let first =
        with_removal.resolve(&["blocks"], r#"["a"]"#, ResolveOptions::default()).await.unwrap();
    let second = without.resolve(&["blocks"], r#"["a"]"#, ResolveOptions::default()).await.unwrap();
    assert_eq!(keys(&first), keys(&second));
    assert_eq!(keys(&first), ["c", "a", "d", "e"]);

    let context = |r: &bemdeps::resolver::Resolution| -> Vec<Option<String>> {
        r.items.iter().map(|i| i.context.as_ref().map(|c| c.key())).collect()
    };
    assert_eq!(context(&first), context(&second));
}

#[tokio::test]
async fn test_bemdecl_declaration_with_elements_and_yaml_deps() {
    let project = TestProject::new().unwrap();
    project.entity_file(
        "blocks",
        "page__header",
        "deps.yaml",
        "mustDeps:\n  - block: logo\n  - elem: nav\nshouldDeps:\n  mods: {fixed: true}\n",
    );

    let declaration = r#"{"blocks": [{"name": "page", "elems": [{"name": "header"}]}]}"#;
    let resolution =
        project.resolve(&["blocks"], declaration, ResolveOptions::default()).await.unwrap();
    assert_eq!(
        keys(&resolution),
        ["page", "logo", "page__nav", "page__header", "page__header_fixed", "page__header_fixed_true"]
    );
}

#[tokio::test]
async fn test_tech_scoped_dependencies() {
    let project = TestProject::new().unwrap();
    project
        .deps("blocks", "button", r#"[{"shouldDeps": "icon"}, {"tech": "js", "mustDeps": "i-bem"}]"#)
        .deps("blocks", "i-bem", r#"{"mustDeps": "jquery"}"#);

    let resolution =
        project.resolve(&["blocks"], r#"["button"]"#, ResolveOptions::default()).await.unwrap();
    assert_eq!(keys(&resolution), ["jquery.js", "i-bem.js", "button", "icon"]);

    let groups = resolution.by_tech();
    assert_eq!(groups[0].0.as_deref(), Some("js"));
    assert_eq!(groups[1].0, None);
}

#[tokio::test]
async fn test_entities_are_unique_and_contexts_recorded() {
    let project = TestProject::new().unwrap();
    project
        .deps("blocks", "page", r#"{"mustDeps": ["reset", "grid"], "shouldDeps": ["grid", "link"]}"#)
        .deps("blocks", "grid", r#"{"mustDeps": "reset"}"#)
        .deps("blocks", "link", r#"{"shouldDeps": "page"}"#);

    let resolution =
        project.resolve(&["blocks"], r#"["page", "link"]"#, ResolveOptions::default()).await.unwrap();
    assert_eq!(keys(&resolution), ["reset", "grid", "page", "link"]);

    let grid = resolution.items.iter().find(|i| i.entity.key() == "grid").unwrap();
    assert_eq!(grid.context.as_ref().map(|c| c.key()), Some("page".to_string()));
    // Declared entities have no context, even when also referenced by others.
    assert!(resolution.items[2].context.is_none());
    assert!(resolution.items[3].context.is_none());
}

#[tokio::test]
async fn test_resolution_is_deterministic() {
    let project = TestProject::new().unwrap();
    project
        .deps("blocks", "a", r#"{"mustDeps": ["b", "c"], "shouldDeps": ["d", "e"]}"#)
        .deps("blocks", "b", r#"{"mustDeps": "c", "shouldDeps": "a"}"#)
        .deps("blocks", "c", r#"{"mustDeps": "b"}"#)
        .deps("blocks", "d", r#"{"mustDeps": "e"}"#);

    let first = project.resolve(&["blocks"], r#"["a", "d"]"#, ResolveOptions::default()).await.unwrap();
    for _ in 0..5 {
        let again =
            project.resolve(&["blocks"], r#"["a", "d"]"#, ResolveOptions::default()).await.unwrap();
        assert_eq!(keys(&again), keys(&first));
        assert_eq!(again.cycles, first.cycles);
    }
}

#[tokio::test]
async fn test_malformed_file_fails_with_path() {
    let project = TestProject::new().unwrap();
    project.deps("blocks", "a", r#"{"mustDeps": "b"}"#).deps("blocks", "b", "{ broken");

    let err = project.resolve(&["blocks"], r#"["a"]"#, ResolveOptions::default()).await.unwrap_err();
    assert!(format!("{err:#}").contains("b.deps.json"));
}

#[tokio::test]
async fn test_missing_level_is_reported() {
    let project = TestProject::new().unwrap();
    let missing = project.dir().join("nowhere");
    let err = bemdeps::loader::LevelIndex::scan(&[missing]).unwrap_err();
    assert!(matches!(err, BemError::LevelNotFound { .. }));
}
