use std::process::{Command, Output};

use tempfile::tempdir;

const PIPELINE_SQL: &str = "\
WITH recent AS (SELECT id, amount FROM dbo.orders WHERE created_at > '2024-01-01')
SELECT id, SUM(amount) AS total INTO #totals FROM recent GROUP BY id;

SELECT * FROM #totals WHERE total > 100;
";

fn stageflow(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stageflow"))
        .args(args)
        .output()
        .expect("run CLI")
}

#[test]
fn test_mermaid_output_for_file() {
    let dir = tempdir().expect("temp dir");
    let sql_path = dir.path().join("pipeline.sql");
    std::fs::write(&sql_path, PIPELINE_SQL).expect("write sql");

    let output = stageflow(&[sql_path.to_str().expect("sql path")]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Expected exit 0, got: {stdout}");
    assert!(stdout.starts_with("flowchart TD\n"), "{stdout}");
    assert!(stdout.contains("subgraph S1[\"#totals (TEMP TABLE)\"]"), "{stdout}");
    assert!(stdout.contains("    S0 --> S1\n    S1 --> S2"), "{stdout}");
}

#[test]
fn test_json_output_with_direction_flag() {
    let dir = tempdir().expect("temp dir");
    let sql_path = dir.path().join("pipeline.sql");
    std::fs::write(&sql_path, PIPELINE_SQL).expect("write sql");

    let output = stageflow(&[
        "-f",
        "json",
        "--direction",
        "LR",
        sql_path.to_str().expect("sql path"),
    ]);
    assert!(output.status.success());

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid JSON output");
    assert_eq!(value["summary"]["stageCount"], 3);
    assert_eq!(value["spec"]["stages"][1]["kind"], "TEMP_TABLE");
    assert!(value["diagram"]
        .as_str()
        .expect("diagram string")
        .starts_with("flowchart LR"));
}

#[test]
fn test_config_file_sets_format() {
    let dir = tempdir().expect("temp dir");
    let sql_path = dir.path().join("query.sql");
    let config_path = dir.path().join("stageflow.json");
    std::fs::write(&sql_path, "SELECT * FROM users").expect("write sql");
    std::fs::write(&config_path, r#"{"format": "markdown", "direction": "RL"}"#)
        .expect("write config");

    let output = stageflow(&[
        "--config",
        config_path.to_str().expect("config path"),
        sql_path.to_str().expect("sql path"),
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "{stdout}");
    assert!(stdout.contains("```mermaid\nflowchart RL\n"), "{stdout}");
}

#[test]
fn test_parse_error_exits_with_failure() {
    let dir = tempdir().expect("temp dir");
    let sql_path = dir.path().join("broken.sql");
    std::fs::write(&sql_path, "SELECT * FROM").expect("write sql");

    let output = stageflow(&[sql_path.to_str().expect("sql path")]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1), "stdout: {stdout}");
    assert!(stdout.contains("error[\"No SQL stages"), "{stdout}");
    assert!(stderr.contains("stageflow: error:"), "{stderr}");
    assert!(stderr.contains("broken.sql"), "{stderr}");
}

#[test]
fn test_quiet_suppresses_stderr_issues() {
    let dir = tempdir().expect("temp dir");
    let sql_path = dir.path().join("broken.sql");
    std::fs::write(&sql_path, "SELECT * FROM").expect("write sql");

    let output = stageflow(&["--quiet", sql_path.to_str().expect("sql path")]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stderr.is_empty());
}

#[test]
fn test_quiet_suppresses_skipped_statement_logs() {
    let dir = tempdir().expect("temp dir");
    let sql_path = dir.path().join("script.sql");
    std::fs::write(&sql_path, "DROP TABLE #old;\nSELECT * FROM users;").expect("write sql");

    let loud = stageflow(&[sql_path.to_str().expect("sql path")]);
    assert!(loud.status.success());
    assert!(String::from_utf8_lossy(&loud.stderr).contains("stageflow: warning:"));

    let quiet = stageflow(&["-q", sql_path.to_str().expect("sql path")]);
    assert!(quiet.status.success());
    assert!(quiet.stderr.is_empty(), "{}", String::from_utf8_lossy(&quiet.stderr));
}

#[test]
fn test_ast_input() {
    let dir = tempdir().expect("temp dir");
    let ast_path = dir.path().join("plan.json");
    std::fs::write(
        &ast_path,
        r#"[{"type": "select",
             "with": [{"name": "src", "stmt": {"from": [{"type": "table", "name": "events"}]}}],
             "from": [{"type": "table", "name": "src"}]}]"#,
    )
    .expect("write ast");

    let output = stageflow(&["--ast", ast_path.to_str().expect("ast path")]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "{stdout}");
    assert!(stdout.contains("subgraph S0[\"src (CTE)\"]"), "{stdout}");
    assert!(stdout.trim_end().ends_with("    S0 --> S1"), "{stdout}");
}

#[test]
fn test_ast_with_malformed_node_still_renders() {
    let dir = tempdir().expect("temp dir");
    let ast_path = dir.path().join("plan.json");
    std::fs::write(
        &ast_path,
        r#"[{"type": "select", "from": [{"type": "table", "name": "a"}],
             "where": {"operator": "=", "left": 1}}]"#,
    )
    .expect("write ast");

    let output = stageflow(&["--ast", ast_path.to_str().expect("ast path")]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "{stdout}");
    assert!(stdout.contains("WHERE: [Complex Expression]"), "{stdout}");
}

#[test]
fn test_missing_input_is_config_error() {
    let output = stageflow(&["/nonexistent/query.sql"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(66));
    assert!(stderr.contains("Failed to read file"), "{stderr}");
}

#[test]
fn test_invalid_ast_is_config_error() {
    let dir = tempdir().expect("temp dir");
    let ast_path = dir.path().join("plan.json");
    std::fs::write(&ast_path, "{ not json").expect("write ast");

    let output = stageflow(&["--ast", ast_path.to_str().expect("ast path")]);
    assert_eq!(output.status.code(), Some(66));
}

#[test]
fn test_output_file() {
    let dir = tempdir().expect("temp dir");
    let sql_path = dir.path().join("query.sql");
    let out_path = dir.path().join("diagram.mmd");
    std::fs::write(&sql_path, "SELECT * FROM users").expect("write sql");

    let output = stageflow(&[
        "-o",
        out_path.to_str().expect("out path"),
        sql_path.to_str().expect("sql path"),
    ]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let written = std::fs::read_to_string(&out_path).expect("read output");
    assert!(written.starts_with("flowchart TD\n"));
    assert!(written.contains("FROM: users"));
}
