//! Loading single command and extension manifests from disk.

use std::path::{Path, PathBuf};

use quiver_core::args::OptionKind;
use quiver_core::loader::{
    load_command_from_file, load_extension_from_file, CommandLoader, FileOptions, LoadStrategy,
    LoaderOptions, ModuleHost,
};
use quiver_core::{LoadError, ModuleError};
use serde_json::json;

fn fixture(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(relative)
}

#[tokio::test]
async fn test_loads_default_wrapped_nested_command() {
    let host = ModuleHost::new();
    let path = fixture("command-files/commands/generate/model.toml");

    let command = load_command_from_file(&path, &host, &FileOptions::default())
        .await
        .unwrap();

    assert_eq!(command.name, "model");
    assert_eq!(command.command_path, vec!["generate", "model"]);
    assert_eq!(command.description.as_deref(), Some("Generate a model"));
    assert!(command.hidden);
    assert!(command.has_handler());
    assert_eq!(command.source_file.as_deref(), Some(path.as_path()));

    assert_eq!(command.args.len(), 2);
    assert_eq!(command.args[0].name, "force");
    assert_eq!(command.args[0].alias, Some('f'));
    assert_eq!(command.args[1].kind, OptionKind::String);
    assert!(command.args[1].default_option);
}

#[tokio::test]
async fn test_trailing_duplicate_segment_collapses() {
    let host = ModuleHost::new();
    let path = fixture("command-files/commands/generate/generate.toml");

    let command = load_command_from_file(&path, &host, &FileOptions::default())
        .await
        .unwrap();

    assert_eq!(command.name, "generate");
    assert_eq!(command.command_path, vec!["generate"]);
    // an empty string is falsy
    assert!(!command.hidden);
}

#[tokio::test]
async fn test_declared_name_wins_and_aliases_normalize() {
    let host = ModuleHost::new();
    let path = fixture("command-files/loose/renamed.json");

    let command = load_command_from_file(&path, &host, &FileOptions::default())
        .await
        .unwrap();

    assert_eq!(command.name, "custom");
    assert_eq!(command.command_path, vec!["renamed"]);
    assert_eq!(command.aliases, vec!["c"]);
    assert_eq!(command.metadata["message"], json!("hi"));
}

#[tokio::test]
async fn test_command_path_override() {
    let host = ModuleHost::new();
    let options = FileOptions {
        command_path: Some(vec!["custom".into(), "path".into()]),
        strategy: LoadStrategy::Async,
    };

    let command = load_command_from_file(&fixture("command-files/loose/not-a-dir.toml"), &host, &options)
        .await
        .unwrap();

    assert_eq!(command.command_path, vec!["custom", "path"]);
    assert_eq!(command.name, "path");
}

#[tokio::test]
async fn test_name_defaults_to_file_stem() {
    let host = ModuleHost::new();
    let command = load_command_from_file(
        &fixture("good-plugins/missing-name/commands/foo.json"),
        &host,
        &FileOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(command.name, "foo");
    assert!(!command.has_alias());
}

#[tokio::test]
async fn test_command_without_run_is_invalid() {
    let host = ModuleHost::new();

    let err = load_command_from_file(
        &fixture("bad-plugins/abort/commands/b-bad.toml"),
        &host,
        &FileOptions::default(),
    )
    .await
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Couldn't load command b-bad -- needs a \"run\" property with a function."
    );

    let err = load_command_from_file(
        &fixture("command-files/loose/not-an-object.json"),
        &host,
        &FileOptions::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, LoadError::InvalidCommand { ref name } if name == "not-an-object"));
}

#[tokio::test]
async fn test_unknown_handler_is_a_missing_dependency() {
    let host = ModuleHost::new();
    let err = load_command_from_file(
        &fixture("bad-plugins/missing-handler/commands/ghost.toml"),
        &host,
        &FileOptions::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        LoadError::Module(ModuleError::DependencyNotFound { ref dependency, .. })
            if dependency == "app:does-not-exist"
    ));
}

#[tokio::test]
async fn test_syntax_errors_propagate() {
    let host = ModuleHost::new();
    let err = load_command_from_file(
        &fixture("bad-plugins/syntax/commands/broken.toml"),
        &host,
        &FileOptions::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, LoadError::Module(ModuleError::Evaluation { .. })));
}

#[tokio::test]
async fn test_directory_is_not_a_command_file() {
    let host = ModuleHost::new();
    let dir = fixture("command-files/loose");
    let err = load_command_from_file(&dir, &host, &FileOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, LoadError::CommandNotAFile(_)));
}

#[tokio::test]
async fn test_loads_extension_manifest() {
    let host = ModuleHost::new();
    let extension = load_extension_from_file(
        &fixture("good-plugins/async-extension/extensions/greeting.toml"),
        &host,
        LoadStrategy::Blocking,
    )
    .await
    .unwrap();

    assert_eq!(extension.name, "greeting");
    assert_eq!(
        extension.description.as_deref(),
        Some("Puts a greeting in the toolbox")
    );
    assert!(extension.setup.is_some());
}

#[tokio::test]
async fn test_bad_extension_shape() {
    let host = ModuleHost::new();
    let err = load_extension_from_file(
        &fixture("bad-plugins/bad-extension/extensions/bad.toml"),
        &host,
        LoadStrategy::Blocking,
    )
    .await
    .unwrap_err();

    assert!(err.to_string().starts_with("couldn't load bad. Expected an object"));
}

#[tokio::test]
async fn test_command_loader_stops_at_first_bad_file() {
    let host = ModuleHost::new();
    let loader = CommandLoader::new(fixture("bad-plugins/abort/commands"), LoaderOptions::default())
        .unwrap();

    let results = loader.load(&host).await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
}

#[test]
fn test_command_loader_rejects_files() {
    let err = CommandLoader::new(
        fixture("command-files/loose/not-a-dir.toml"),
        LoaderOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(err, LoadError::NotADirectory { kind: "command", .. }));
}

#[tokio::test]
async fn test_blank_name_falls_back_to_command_path() {
    let host = ModuleHost::new();
    let command = load_command_from_file(
        &fixture("command-files/commands/blank-name.toml"),
        &host,
        &FileOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(command.name, "blank-name");
    assert_eq!(command.command_path, vec!["blank-name"]);
}

#[tokio::test]
async fn test_unusable_option_definition_is_malformed() {
    let host = ModuleHost::new();
    let err = load_command_from_file(
        &fixture("command-files/loose/bad-option.toml"),
        &host,
        &FileOptions::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, LoadError::Module(ModuleError::Evaluation { .. })));
    assert!(err.to_string().contains("--force"));
}

#[tokio::test]
async fn test_blank_extension_name_is_invalid() {
    let host = ModuleHost::new();
    let err = load_extension_from_file(
        &fixture("extension-files/blank-name.toml"),
        &host,
        LoadStrategy::Blocking,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, LoadError::InvalidExtension { ref name, .. } if name == "blank-name"));
}

#[tokio::test]
async fn test_empty_patterns_fall_back_to_defaults() {
    let host = ModuleHost::new();
    let options = LoaderOptions {
        patterns: Vec::new(),
        ..Default::default()
    };
    let loader = CommandLoader::new(fixture("good-plugins/threepack/commands"), options).unwrap();

    // README.md and three.test.toml stay out
    let results = loader.load(&host).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].as_ref().unwrap().name, "three");
}
