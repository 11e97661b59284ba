//! Tests for token, repository list, and data type resolution.

use std::fs;

use camino::Utf8PathBuf;
use rstest::rstest;
use tempfile::TempDir;

use crate::DevtalkConfig;
use crate::error::DevtalkError;
use crate::github::models::EntityKind;

fn write_temp(dir: &TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("fixture file should be writable");
    Utf8PathBuf::from_path_buf(path)
        .expect("utf-8 temp path")
        .into_string()
}

#[rstest]
fn token_field_wins_over_other_sources() {
    let _guard = env_lock::lock_env([("GITHUB_TOKEN", Some("env-token"))]);
    let config = DevtalkConfig {
        token: Some("cli-token".to_owned()),
        token_file: Some("/nonexistent/token".to_owned()),
        ..Default::default()
    };

    let token = config.resolve_token().expect("token");

    assert_eq!(token.value(), "cli-token");
}

#[rstest]
fn token_file_first_line_is_used() {
    let _guard = env_lock::lock_env([("GITHUB_TOKEN", None::<&str>)]);
    let dir = TempDir::new().expect("temp dir");
    let path = write_temp(&dir, "token", "  ghp_secret  \nsecond line\n");
    let config = DevtalkConfig {
        token_file: Some(path),
        ..Default::default()
    };

    let token = config.resolve_token().expect("token");

    assert_eq!(token.value(), "ghp_secret");
}

#[rstest]
fn blank_token_file_is_an_error() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_temp(&dir, "token", "\n");
    let config = DevtalkConfig {
        token_file: Some(path),
        ..Default::default()
    };

    let result = config.resolve_token();

    assert!(
        matches!(result, Err(DevtalkError::TokenFile { .. })),
        "expected a token file error, got {result:?}"
    );
}

#[rstest]
fn github_token_is_the_fallback() {
    let _guard = env_lock::lock_env([("GITHUB_TOKEN", Some("env-token"))]);
    let config = DevtalkConfig::default();

    let token = config.resolve_token().expect("token");

    assert_eq!(token.value(), "env-token");
}

#[rstest]
fn missing_token_is_reported() {
    let _guard = env_lock::lock_env([("GITHUB_TOKEN", None::<&str>)]);
    let config = DevtalkConfig::default();

    let result = config.resolve_token();

    assert!(matches!(result, Err(DevtalkError::MissingToken)));
}

#[rstest]
#[case::all("all", EntityKind::ALL.to_vec())]
#[case::subset("pull_requests, issues", vec![EntityKind::Issue, EntityKind::PullRequest])]
fn data_types_select_entity_kinds(#[case] selector: &str, #[case] expected: Vec<EntityKind>) {
    let config = DevtalkConfig {
        data_types: selector.to_owned(),
        ..Default::default()
    };

    assert_eq!(config.entity_kinds().expect("valid selector"), expected);
}

#[rstest]
fn unknown_data_type_is_a_configuration_error() {
    let config = DevtalkConfig {
        data_types: "wikis".to_owned(),
        ..Default::default()
    };

    assert!(matches!(
        config.entity_kinds(),
        Err(DevtalkError::Configuration { .. })
    ));
}

#[rstest]
fn targets_merge_file_and_inline_entries() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_temp(
        &dir,
        "repos.txt",
        "# seed\noctocat/hello-world\nnot a repository\n",
    );
    let config = DevtalkConfig {
        repos_file: Some(path),
        repos: Some("https://github.com/rust-lang/rust.git, octocat/hello-world".to_owned()),
        ..Default::default()
    };

    let list = config.load_targets().expect("targets");

    let slugs: Vec<String> = list.targets.iter().map(|target| target.slug()).collect();
    assert_eq!(slugs, vec!["octocat/hello-world", "rust-lang/rust"]);
    assert_eq!(list.invalid.len(), 1);
}

#[rstest]
fn targets_are_required() {
    let result = DevtalkConfig::default().load_targets();

    assert!(matches!(result, Err(DevtalkError::Configuration { .. })));
}

#[rstest]
fn unreadable_repository_list_is_an_io_error() {
    let config = DevtalkConfig {
        repos_file: Some("/nonexistent/devtalk/repos.txt".to_owned()),
        ..Default::default()
    };

    assert!(matches!(
        config.load_targets(),
        Err(DevtalkError::Io { .. })
    ));
}
