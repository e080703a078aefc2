/// End-to-end tests for the jpath binary.
use serde_json::{json, Value};
use std::io::Write;
use std::process::{Command, Output, Stdio};

fn jpath_stdin(args: &[&str], input: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_jpath"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .and_then(|mut child| {
            child
                .stdin
                .take()
                .unwrap()
                .write_all(input.as_bytes())
                .unwrap();
            child.wait_with_output()
        })
        .expect("failed to run jpath")
}

fn records(output: &Output) -> Vec<Value> {
    String::from_utf8(output.stdout.clone())
        .expect("jpath output was not valid UTF-8")
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_file_input_with_options() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.jsonl");
    std::fs::write(
        &path,
        concat!(
            r#"{"payload": "{\"items\": [{\"id\": 1}, {\"id\": 2}]}"}"#,
            "\n",
            r#"{"payload": "{\"items\": []}"}"#,
            "\n",
            r#"{"payload": "oops"}"#,
            "\n",
            r#"{"payload": "{}"}"#,
            "\n",
        ),
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_jpath"))
        .args(["--input", "payload", "--error", "err", "--output", "ids", "--default", "none"])
        .arg("items[].id")
        .arg(&path)
        .output()
        .expect("failed to run jpath");

    assert!(
        output.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let records = records(&output);
    assert_eq!(records.len(), 4);
    assert_eq!(records[0]["ids"], json!(["1", "2"]));
    assert!(records[1].get("ids").is_none());
    assert_eq!(records[2]["err"], json!("Invalid JSON."));
    assert_eq!(records[3]["ids"], json!("none"));
}

#[test]
fn test_wildcard_output_from_stdin() {
    let input = concat!(
        r#"{"_raw": "{\"Tags\": [{\"Key\": \"env\", \"Value\": \"prod\"}]}", "host": "a"}"#,
        "\n",
    );

    let output = jpath_stdin(&["--output", "tag_*", "unroll(Tags, 'Key', 'Value')"], input);

    assert!(output.status.success());
    assert_eq!(records(&output), vec![json!({
        "_raw": "{\"Tags\": [{\"Key\": \"env\", \"Value\": \"prod\"}]}",
        "host": "a",
        "tag_env": "prod"
    })]);
}

#[test]
fn test_output_preserves_input_key_order() {
    let input = concat!(r#"{"_raw": "{\"z\": 1, \"a\": {\"y\": 2, \"b\": 3}}"}"#, "\n");

    let output = jpath_stdin(&["--output", "f_*", "@"], input);

    assert!(output.status.success());
    let line = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        line.trim_end(),
        concat!(
            r#"{"_raw":"{\"z\": 1, \"a\": {\"y\": 2, \"b\": 3}}","#,
            r#""f_z":"1","f_a":"{\"y\": 2, \"b\": 3}"}"#
        )
    );
}

#[test]
fn test_unknown_function_exits_with_error() {
    let input = concat!(
        r#"{"_raw": "{\"a\": 1}"}"#,
        "\n",
        r#"{"_raw": "{}"}"#,
        "\n",
        r#"{"_raw": "{\"a\": 3}"}"#,
        "\n",
    );

    let output = jpath_stdin(&["a || missing_fn(@)"], input);

    assert!(!output.status.success());
    assert_eq!(records(&output), vec![json!({"_raw": "{\"a\": 1}", "jpath": "1"})]);
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing_fn"));
}

#[test]
fn test_bad_expression_rejected() {
    let output = jpath_stdin(&["a["], "");

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_bad_field_name_rejected() {
    let output = jpath_stdin(&["--input", "not a field", "a"], "");

    assert!(!output.status.success());
}
