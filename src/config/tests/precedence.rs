//! Tests for configuration layer precedence.

use rstest::rstest;
use serde_json::{Value, json};

use super::helpers::build_config_from_layers;
use crate::config::{DEFAULT_API_BASE, DEFAULT_OUTPUT_DIR};

#[rstest]
#[case::file_overrides_defaults(
    vec![("defaults", json!({"output_dir": "default-dir"})), ("file", json!({"output_dir": "file-dir"}))],
    "file-dir",
    "file should override default"
)]
#[case::environment_overrides_file(
    vec![("file", json!({"output_dir": "file-dir"})), ("environment", json!({"output_dir": "env-dir"}))],
    "env-dir",
    "environment should override file"
)]
#[case::cli_overrides_environment(
    vec![("environment", json!({"output_dir": "env-dir"})), ("cli", json!({"output_dir": "cli-dir"}))],
    "cli-dir",
    "CLI should override environment"
)]
fn output_dir_layer_precedence(
    #[case] layers: Vec<(&str, Value)>,
    #[case] expected: &str,
    #[case] message: &str,
) {
    let config = build_config_from_layers(&layers);

    assert_eq!(config.output_dir, expected, "{message}");
}

#[rstest]
fn defaults_apply_when_no_sources_provided() {
    let config = build_config_from_layers(&[("defaults", json!({"token": null}))]);

    assert!(config.token.is_none(), "token should be None");
    assert!(config.repos_file.is_none(), "repos_file should be None");
    assert_eq!(config.data_types, "all");
    assert_eq!(config.output_dir, DEFAULT_OUTPUT_DIR);
    assert_eq!(config.api_base, DEFAULT_API_BASE);
    assert_eq!(config.page_size, 50);
    assert_eq!(config.comment_page_size, 50);
    assert_eq!(config.max_retries, 5);
    assert_eq!(config.safety_margin, 50);
    assert_eq!(config.workers, 1);
    assert!(config.max_pages.is_none());
    assert!(!config.telemetry);
}

#[rstest]
fn full_precedence_chain() {
    let config = build_config_from_layers(&[
        (
            "defaults",
            json!({"data_types": "all", "token": "default-token", "page_size": 10}),
        ),
        (
            "file",
            json!({"data_types": "issues", "token": "file-token", "page_size": 20}),
        ),
        ("environment", json!({"data_types": "commits", "page_size": 30})),
        ("cli", json!({"page_size": 40})),
    ]);

    assert_eq!(config.page_size, 40, "CLI wins for page_size");
    assert_eq!(
        config.data_types, "commits",
        "environment wins for data_types (no CLI override)"
    );
    assert_eq!(
        config.token.as_deref(),
        Some("file-token"),
        "file wins for token (no env/cli override)"
    );
}

#[rstest]
fn numeric_and_optional_fields_merge_from_file() {
    let config = build_config_from_layers(&[(
        "file",
        json!({
            "repos_file": "repos.txt",
            "workers": 4,
            "max_pages": 200,
            "min_backoff_ms": 250,
            "max_backoff_ms": 8000,
            "safety_margin": 100,
            "telemetry": true
        }),
    )]);

    assert_eq!(config.repos_file.as_deref(), Some("repos.txt"));
    assert_eq!(config.workers, 4);
    assert_eq!(config.max_pages, Some(200));
    assert_eq!(config.min_backoff_ms, 250);
    assert_eq!(config.max_backoff_ms, 8000);
    assert_eq!(config.safety_margin, 100);
    assert!(config.telemetry);
}
