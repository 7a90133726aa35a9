use std::env;
use std::sync::{Mutex, OnceLock};

use quoteflow_cli::commands::{advance, config, migrate, quotes, seed, set_workflow};
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("QUOTEFLOW_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_unsupported_database() {
    with_env(&[("QUOTEFLOW_DATABASE_URL", "postgres://localhost/quotes")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    with_database(|| {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        let first_payload = parse_payload(&first.output);
        let inserted = first_payload["data"]["inserted"].as_array().map(Vec::len).unwrap_or(0);
        assert!(inserted > 0, "first run should insert demo quotes");

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");
        let second_payload = parse_payload(&second.output);
        assert_eq!(second_payload["data"]["inserted"], Value::Array(Vec::new()));
        assert_eq!(
            second_payload["data"]["skipped"].as_array().map(Vec::len).unwrap_or(0),
            inserted
        );
    });
}

#[test]
fn quotes_lists_filtered_results_with_stats() {
    with_database(|| {
        assert_eq!(seed::run().exit_code, 0);

        let result = quotes::run(None, Some("approved".to_string()), None);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let listed = payload["data"]["quotes"].as_array().cloned().unwrap_or_default();
        assert!(!listed.is_empty());
        assert!(listed.iter().all(|quote| quote["status"] == "approved"));
        assert!(payload["data"]["stats"]["totalQuotes"].as_u64().unwrap_or(0) >= listed.len() as u64);

        let invalid = quotes::run(None, None, Some("sideways".to_string()));
        assert_eq!(invalid.exit_code, 6);
        assert_eq!(parse_payload(&invalid.output)["error_class"], "validation");
    });
}

#[test]
fn advance_walks_workflow_and_reports_conflicts() {
    with_database(|| {
        assert_eq!(seed::run().exit_code, 0);

        let result = advance::run("Q-2025-001".to_string(), "quoting".to_string());
        assert_eq!(result.exit_code, 0, "{}", result.output);
        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["currentStep"], "contract-creation");

        let again = advance::run("Q-2025-001".to_string(), "quoting".to_string());
        assert_eq!(again.exit_code, 8);
        assert_eq!(parse_payload(&again.output)["error_class"], "conflict");

        let missing = advance::run("Q-404".to_string(), "quoting".to_string());
        assert_eq!(missing.exit_code, 7);
        assert_eq!(parse_payload(&missing.output)["message"], "Quote not found");

        let last = advance::run("Q-2025-001".to_string(), "contract-creation".to_string());
        assert_eq!(last.exit_code, 0);
        let payload = parse_payload(&last.output);
        assert_eq!(payload["data"]["status"], "approved");
        assert_eq!(payload["data"]["currentStep"], Value::Null);
    });
}

#[test]
fn set_workflow_replaces_steps_and_notes_duplicates() {
    with_database(|| {
        assert_eq!(seed::run().exit_code, 0);

        let result = set_workflow::run(
            "Q-2025-002".to_string(),
            vec!["configuration".to_string(), "billing".to_string(), "configuration".to_string()],
            vec!["billing=Dana Ortiz".to_string()],
        );
        assert_eq!(result.exit_code, 0, "{}", result.output);

        let payload = parse_payload(&result.output);
        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.contains("Product Configuration is already in the workflow"));
        assert_eq!(payload["data"]["status"], "pending");
        assert_eq!(payload["data"]["currentStep"], "billing");
        assert_eq!(payload["data"]["workflow"][1]["assignee"], "Dana Ortiz");

        let empty = set_workflow::run("Q-2025-002".to_string(), Vec::new(), Vec::new());
        assert_eq!(empty.exit_code, 6);
        assert_eq!(
            parse_payload(&empty.output)["message"],
            "Workflow must have at least one step"
        );
    });
}

#[test]
fn config_reports_env_sources() {
    with_env(&[("QUOTEFLOW_SERVER_PORT", "4321")], || {
        let output = config::run();
        assert!(output.contains("- server.port = 4321 (source: env (QUOTEFLOW_SERVER_PORT))"));
        assert!(output.contains("- logging.level = info (source: default)"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).unwrap_or_else(|error| {
        panic!("expected JSON command output, got `{output}`: {error}");
    })
}

fn with_database(test_fn: impl FnOnce()) {
    let dir = TempDir::new().expect("tempdir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("quoteflow.db").display());
    with_env(&[("QUOTEFLOW_DATABASE_URL", url.as_str())], test_fn);
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "QUOTEFLOW_DATABASE_URL",
        "QUOTEFLOW_DATABASE_MAX_CONNECTIONS",
        "QUOTEFLOW_DATABASE_TIMEOUT_SECS",
        "QUOTEFLOW_SERVER_BIND_ADDRESS",
        "QUOTEFLOW_SERVER_PORT",
        "PORT",
        "QUOTEFLOW_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "QUOTEFLOW_LOGGING_LEVEL",
        "QUOTEFLOW_LOGGING_FORMAT",
        "QUOTEFLOW_LOG_LEVEL",
        "QUOTEFLOW_LOG_FORMAT",
        "QUOTEFLOW_WORKFLOW_SEED_DEMO_DATA",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
