//! Exit status and output of the `pdfbatch` binary.

mod common;

use common::Workspace;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn pdfbatch(config: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pdfbatch"))
        .arg("--config")
        .arg(config)
        .env_remove("RUST_LOG")
        .env_remove("PDFBATCH_CONFIG")
        .output()
        .expect("spawn pdfbatch")
}

/// Write `config.toml` with `work_space` pointing at the work space.
fn config_file(ws: &Workspace, body: &str) -> std::path::PathBuf {
    let path = ws.path().join("config.toml");
    let text = format!(
        "[Settings]\n{body}\n[Settings.Directories]\nwork_space = '{}'\n",
        ws.path().display()
    );
    fs::write(&path, text).unwrap();
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// `YYYY-MM-DD HH:MM:SS.ffffff+00:00 - ` prefix.
fn assert_timestamped(text: &str) {
    for line in text.lines().filter(|l| !l.is_empty()) {
        let date = line.get(..10).unwrap_or_default();
        assert!(
            date.len() == 10 && date.chars().filter(|c| *c == '-').count() == 2,
            "{line}"
        );
        assert_eq!(line.get(26..35), Some("+00:00 - "), "{line}");
    }
}

#[test]
fn missing_config_file_exits_with_failure() {
    let ws = Workspace::new();
    let output = pdfbatch(&ws.path().join("absent.toml"));

    assert_eq!(output.status.code(), Some(1));
    let text = stdout(&output);
    assert!(text.contains("ERROR: Configuration error"), "{text}");
    assert_timestamped(&text);
}

#[test]
fn config_without_work_mode_exits_with_failure() {
    let ws = Workspace::new();
    ws.image("a.png", 4, 4);
    let output = pdfbatch(&config_file(&ws, ""));

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("work_mode"));
    assert!(!ws.output().exists());
}

#[test]
fn missing_input_directory_exits_cleanly() {
    let ws = Workspace::without_input();
    let output = pdfbatch(&config_file(&ws, "work_mode = \"img2pdf\""));

    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.contains("ERROR: Input directory does not exist"), "{text}");
    assert_timestamped(&text);
}

#[test]
fn item_failures_do_not_fail_the_run() {
    let ws = Workspace::new();
    ws.image("a.png", 4, 4);
    fs::write(ws.input().join("broken.png"), b"not a png").unwrap();
    let output = pdfbatch(&config_file(
        &ws,
        "work_mode = \"img2pdf\"\n[Settings.PdfOutputStrategy]\nmode = \"one_to_one\"",
    ));

    assert_eq!(output.status.code(), Some(0));
    assert!(ws.output().join("a.pdf").is_file());
    assert!(!ws.output().join("broken.pdf").exists());
    let text = stdout(&output);
    assert!(text.contains("ERROR: Failed to convert broken.png"), "{text}");
    assert!(text.contains("1 written, 0 renamed, 0 skipped, 1 failed"), "{text}");
    assert_timestamped(&text);
}
