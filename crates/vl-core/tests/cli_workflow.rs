//! End-to-end tests for the `veil` binary.
//!
//! Every invocation gets an empty `--config-dir` and a scrubbed environment
//! so user configuration never leaks into the results.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use vl_core::exit_codes::ExitCode;

const PATIENT: &str = "Patient John Doe, SSN 123-45-6789";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        fs::create_dir(dir.path().join("config")).expect("create config dir");
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content).expect("write file");
        path
    }

    fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path(name)).expect("read file")
    }

    fn veil(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("veil");
        cmd.timeout(Duration::from_secs(60))
            .env_remove("VEIL_SETTINGS")
            .env_remove("VEIL_RULESETS")
            .env_remove("VEIL_CONFIG_DIR")
            .env_remove("VEIL_LOG")
            .env_remove("RUST_LOG")
            .arg("--config-dir")
            .arg(self.path("config"));
        cmd
    }

    /// Redact `doc.txt` into `clean.txt` and `audit.json`.
    fn redact(&self, extra: &[&str]) {
        self.veil()
            .args(["redact", "-j", "HIPAA", "--term", "NAME=John Doe"])
            .arg(self.path("doc.txt"))
            .arg("--out")
            .arg(self.path("clean.txt"))
            .arg("--audit")
            .arg(self.path("audit.json"))
            .args(extra)
            .assert()
            .success();
    }
}

fn code(exit: ExitCode) -> i32 {
    exit.as_i32()
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("stdout is JSON")
}

#[test]
fn scan_prints_plan() {
    let ws = Workspace::new();
    let doc = ws.write("doc.txt", PATIENT);

    let output = ws
        .veil()
        .args(["scan", "-j", "HIPAA", "--term", "NAME=John Doe"])
        .arg(&doc)
        .assert()
        .code(code(ExitCode::Clean))
        .get_output()
        .stdout
        .clone();

    let plan = stdout_json(&output);
    let spans = plan["resolvedSpans"].as_array().unwrap();
    assert_eq!(spans.len(), 2);
    assert_eq!(spans[0]["category"], "NAME");
    assert_eq!(spans[1]["category"], "SSN");
    assert_eq!(plan["jurisdictions"], serde_json::json!(["HIPAA"]));
}

#[test]
fn scan_with_flag_only_findings_exits_flagged() {
    let ws = Workspace::new();
    let doc = ws.write("doc.txt", "Call 555-201-3344 after noon.");

    ws.veil()
        .args(["scan", "-j", "CCPA"])
        .arg(&doc)
        .assert()
        .code(code(ExitCode::Flagged))
        .stdout(predicate::str::contains("flaggedSpans"));
}

#[test]
fn redact_then_restore_is_exact() {
    let ws = Workspace::new();
    ws.write("doc.txt", PATIENT);
    ws.redact(&[]);

    assert_eq!(
        ws.read("clean.txt"),
        "Patient [REDACTED_NAME_1], SSN [REDACTED_SSN_1]"
    );

    ws.veil()
        .arg("restore")
        .arg(ws.path("clean.txt"))
        .arg("--audit")
        .arg(ws.path("audit.json"))
        .assert()
        .success()
        .stdout(predicate::eq(PATIENT));
}

#[test]
fn reviewed_plan_is_applied() {
    let ws = Workspace::new();
    let doc = ws.write("doc.txt", PATIENT);

    let output = ws
        .veil()
        .args(["scan", "-j", "HIPAA", "--term", "NAME=John Doe"])
        .arg(&doc)
        .output()
        .expect("run scan");
    let mut plan = stdout_json(&output.stdout);
    // The reviewer keeps the name visible.
    plan["resolvedSpans"].as_array_mut().unwrap().remove(0);
    ws.write("plan.json", &plan.to_string());

    ws.veil()
        .arg("redact")
        .arg(&doc)
        .arg("--plan")
        .arg(ws.path("plan.json"))
        .arg("--out")
        .arg(ws.path("clean.txt"))
        .arg("--audit")
        .arg(ws.path("audit.json"))
        .assert()
        .success();

    assert_eq!(ws.read("clean.txt"), "Patient John Doe, SSN [REDACTED_SSN_1]");
}

#[test]
fn plan_for_another_document_is_rejected() {
    let ws = Workspace::new();
    let doc = ws.write("doc.txt", PATIENT);
    let output = ws
        .veil()
        .args(["scan", "-j", "HIPAA"])
        .arg(&doc)
        .output()
        .expect("run scan");
    ws.write("plan.json", &String::from_utf8(output.stdout).unwrap());
    let other = ws.write("other.txt", "Patient Jane Roe, SSN 987-65-4321");

    ws.veil()
        .arg("redact")
        .arg(&other)
        .arg("--plan")
        .arg(ws.path("plan.json"))
        .arg("--out")
        .arg(ws.path("clean.txt"))
        .arg("--audit")
        .arg(ws.path("audit.json"))
        .assert()
        .code(code(ExitCode::InvalidPlan));
    assert!(!ws.path("clean.txt").exists());
}

#[test]
fn tampered_clean_document_fails_integrity() {
    let ws = Workspace::new();
    ws.write("doc.txt", PATIENT);
    ws.redact(&[]);

    let tampered = ws.read("clean.txt").replace("Patient", "patient");
    ws.write("clean.txt", &tampered);

    ws.veil()
        .arg("restore")
        .arg(ws.path("clean.txt"))
        .arg("--audit")
        .arg(ws.path("audit.json"))
        .assert()
        .code(code(ExitCode::IntegrityError))
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn unknown_placeholder_is_unresolved() {
    let ws = Workspace::new();
    ws.write("doc.txt", PATIENT);
    ws.redact(&[]);

    // Rewrite both the text and its recorded hash so only the token is wrong.
    let clean = ws.read("clean.txt").replace("[REDACTED_SSN_1]", "[REDACTED_SSN_2]");
    ws.write("clean.txt", &clean);
    let mut log: Value = serde_json::from_str(&ws.read("audit.json")).unwrap();
    log["cleanDocumentHash"] = Value::String(vl_redact::content_hash(clean.as_bytes()));
    ws.write("audit.json", &log.to_string());

    ws.veil()
        .arg("restore")
        .arg(ws.path("clean.txt"))
        .arg("--audit")
        .arg(ws.path("audit.json"))
        .assert()
        .code(code(ExitCode::UnresolvedPlaceholder));
}

#[test]
fn malformed_audit_log() {
    let ws = Workspace::new();
    ws.write("clean.txt", "Patient [REDACTED_NAME_1]");
    ws.write("audit.json", "{\"documentHash\": 42}");

    ws.veil()
        .arg("verify")
        .arg(ws.path("clean.txt"))
        .arg("--audit")
        .arg(ws.path("audit.json"))
        .assert()
        .code(code(ExitCode::MalformedAuditLog));
}

#[test]
fn jurisdiction_errors() {
    let ws = Workspace::new();
    let doc = ws.write("doc.txt", PATIENT);

    ws.veil()
        .args(["scan", "-j", "GDPR,MARS"])
        .arg(&doc)
        .assert()
        .code(code(ExitCode::UnknownJurisdiction));

    ws.veil()
        .arg("scan")
        .arg(&doc)
        .assert()
        .code(code(ExitCode::ArgsError));
}

#[test]
fn unknown_jurisdiction_in_settings_matches_flag_exit_code() {
    let ws = Workspace::new();
    fs::write(
        ws.path("config").join("settings.toml"),
        "jurisdictions = [\"MARS\"]\n",
    )
    .unwrap();
    let doc = ws.write("doc.txt", PATIENT);

    ws.veil()
        .arg("scan")
        .arg(&doc)
        .assert()
        .code(code(ExitCode::UnknownJurisdiction))
        .stderr(predicate::str::contains("MARS"));
}

#[test]
fn settings_supply_jurisdictions_and_terms() {
    let ws = Workspace::new();
    fs::write(
        ws.path("config").join("settings.toml"),
        "jurisdictions = [\"GDPR\"]\n\n[[dictionary]]\ncategory = \"NAME\"\nterms = [\"John Doe\"]\n",
    )
    .unwrap();
    let doc = ws.write("doc.txt", PATIENT);

    ws.veil()
        .arg("redact")
        .arg(&doc)
        .arg("--out")
        .arg(ws.path("clean.txt"))
        .arg("--audit")
        .arg(ws.path("audit.json"))
        .assert()
        .success();
    assert_eq!(
        ws.read("clean.txt"),
        "Patient [REDACTED_NAME_1], SSN [REDACTED_SSN_1]"
    );
}

#[test]
fn verify_reports_leaks() {
    let ws = Workspace::new();
    ws.write("doc.txt", "John Doe wrote to John Doe");

    let output = ws
        .veil()
        .args(["scan", "-j", "GDPR", "--term", "NAME=John Doe"])
        .arg(ws.path("doc.txt"))
        .output()
        .expect("run scan");
    let mut plan = stdout_json(&output.stdout);
    plan["resolvedSpans"].as_array_mut().unwrap().truncate(1);
    ws.write("plan.json", &plan.to_string());

    ws.veil()
        .arg("redact")
        .arg(ws.path("doc.txt"))
        .arg("--plan")
        .arg(ws.path("plan.json"))
        .arg("--out")
        .arg(ws.path("clean.txt"))
        .arg("--audit")
        .arg(ws.path("audit.json"))
        .assert()
        .success();

    let output = ws
        .veil()
        .arg("verify")
        .arg(ws.path("clean.txt"))
        .arg("--audit")
        .arg(ws.path("audit.json"))
        .assert()
        .code(code(ExitCode::Flagged))
        .get_output()
        .stdout
        .clone();

    let report = stdout_json(&output);
    assert_eq!(report["integrity"], "ok");
    assert_eq!(report["leaks"]["leakedValues"], 1);
    assert!(!String::from_utf8_lossy(&output).contains("John Doe"));
}

#[test]
fn sealed_audit_log_survives_rotation() {
    let ws = Workspace::new();
    ws.write("doc.txt", PATIENT);
    let keys = ws.path("keys.json");

    ws.veil().args(["keys", "init"]).arg(&keys).assert().success();
    ws.veil()
        .args(["keys", "init"])
        .arg(&keys)
        .assert()
        .code(code(ExitCode::ArgsError));

    ws.redact(&["--seal-key", keys.to_str().unwrap()]);

    ws.veil()
        .args(["keys", "rotate"])
        .arg(&keys)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"activeKeyId\": \"k2\""));

    ws.veil()
        .arg("restore")
        .arg(ws.path("clean.txt"))
        .arg("--audit")
        .arg(ws.path("audit.json"))
        .arg("--seal-key")
        .arg(&keys)
        .assert()
        .success()
        .stdout(predicate::eq(PATIENT));
}

#[test]
fn unsealed_log_fails_seal_check() {
    let ws = Workspace::new();
    ws.write("doc.txt", PATIENT);
    let keys = ws.path("keys.json");
    ws.veil().args(["keys", "init"]).arg(&keys).assert().success();
    ws.redact(&[]);

    ws.veil()
        .arg("verify")
        .arg(ws.path("clean.txt"))
        .arg("--audit")
        .arg(ws.path("audit.json"))
        .arg("--seal-key")
        .arg(&keys)
        .assert()
        .code(code(ExitCode::IntegrityError));
}

#[test]
fn seal_from_unknown_key_fails_integrity() {
    let ws = Workspace::new();
    ws.write("doc.txt", PATIENT);
    let ours = ws.path("ours.json");
    let theirs = ws.path("theirs.json");
    ws.veil().args(["keys", "init"]).arg(&ours).assert().success();
    ws.veil().args(["keys", "init"]).arg(&theirs).assert().success();
    ws.veil().args(["keys", "rotate"]).arg(&theirs).assert().success();

    // Sealed under "k2", which our key file has never issued.
    ws.redact(&["--seal-key", theirs.to_str().unwrap()]);

    ws.veil()
        .arg("restore")
        .arg(ws.path("clean.txt"))
        .arg("--audit")
        .arg(ws.path("audit.json"))
        .arg("--seal-key")
        .arg(&ours)
        .assert()
        .code(code(ExitCode::IntegrityError))
        .stdout(predicate::str::is_empty());
}

#[test]
fn failed_redact_writes_no_artifacts() {
    let ws = Workspace::new();
    let doc = ws.write("doc.txt", PATIENT);

    ws.veil()
        .args(["redact", "-j", "HIPAA"])
        .arg(&doc)
        .arg("--out")
        .arg(ws.path("clean.txt"))
        .arg("--audit")
        .arg(ws.path("missing").join("audit.json"))
        .assert()
        .code(code(ExitCode::IoError));

    assert!(!ws.path("clean.txt").exists());
    let mut names: Vec<String> = fs::read_dir(ws.dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["config", "doc.txt"]);
}

#[test]
fn bundles_by_profile() {
    let ws = Workspace::new();
    ws.write("doc.txt", PATIENT);
    ws.redact(&[]);

    for (profile, name) in [("shareable", "share.zip"), ("local", "local.zip")] {
        ws.veil()
            .args(["bundle", "create", "--profile", profile])
            .arg("--clean")
            .arg(ws.path("clean.txt"))
            .arg("--audit")
            .arg(ws.path("audit.json"))
            .arg("-o")
            .arg(ws.path(name))
            .assert()
            .success();
    }

    let output = ws
        .veil()
        .args(["bundle", "inspect"])
        .arg(ws.path("share.zip"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let inspected = stdout_json(&output);
    assert_eq!(inspected["verified"], true);
    assert_eq!(inspected["manifest"]["export_profile"], "shareable");
    let files: Vec<&str> = inspected["manifest"]["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["path"].as_str().unwrap())
        .collect();
    assert_eq!(files, vec!["clean.txt", "summary.json"]);

    ws.veil()
        .args(["bundle", "inspect"])
        .arg(ws.path("share.zip"))
        .arg("--restore-to")
        .arg(ws.path("restored.txt"))
        .assert()
        .code(code(ExitCode::ArgsError));

    ws.veil()
        .args(["bundle", "inspect"])
        .arg(ws.path("local.zip"))
        .arg("--restore-to")
        .arg(ws.path("restored.txt"))
        .assert()
        .success();
    assert_eq!(ws.read("restored.txt"), PATIENT);
}

#[test]
fn rulesets_command() {
    let ws = Workspace::new();

    ws.veil()
        .args(["rulesets", "-j", "hipaa"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"jurisdiction\": \"HIPAA\""))
        .stdout(predicate::str::contains("\"SSN\": \"REDACT\""));

    ws.veil()
        .args(["rulesets", "-j", "MARS"])
        .assert()
        .code(code(ExitCode::UnknownJurisdiction));
}

#[test]
fn bad_arguments_exit_with_args_error() {
    let ws = Workspace::new();
    ws.veil()
        .args(["redact", "missing-required-flags.txt"])
        .assert()
        .code(code(ExitCode::ArgsError));

    ws.veil()
        .args(["scan", "-j", "GDPR", "--term", "no-equals-sign"])
        .arg(ws.write("doc.txt", PATIENT))
        .assert()
        .code(code(ExitCode::ArgsError));
}

#[test]
fn missing_input_is_io_error() {
    let ws = Workspace::new();
    ws.veil()
        .args(["scan", "-j", "GDPR"])
        .arg(Path::new("/definitely/not/here.txt"))
        .assert()
        .code(code(ExitCode::IoError));
}
