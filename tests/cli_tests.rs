//! CLI interface tests

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Binary with config and cache directories pointed into `home`, so the
/// user's own files never leak into a test run.
fn htmltrans(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_htmltrans"));
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_CACHE_HOME", home.join("cache"))
        .env_remove("RUST_LOG")
        .env_remove("GEMINI_API_KEY")
        .env_remove("GOOGLE_API_KEY");
    cmd
}

const PAGE: &str = "<!DOCTYPE html>\n<html>\n<head><title>Hello</title><style>p { color: red; }</style></head>\n<body>\n  <p>Hello world</p>\n  <script>var s = \"skip me\";</script>\n  <p>Second <b>paragraph</b></p>\n</body>\n</html>\n";

#[test]
fn test_help_command() {
    let home = TempDir::new().unwrap();
    let output = htmltrans(home.path())
        .arg("--help")
        .output()
        .expect("Failed to run help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("translate"), "Should list translate command");
    assert!(stdout.contains("extract"), "Should list extract command");
    assert!(stdout.contains("cache"), "Should list cache command");
    assert!(stdout.contains("config"), "Should list config command");
}

#[test]
fn test_version_command() {
    let home = TempDir::new().unwrap();
    let output = htmltrans(home.path())
        .arg("--version")
        .output()
        .expect("Failed to run version");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("htmltrans"), "Should show program name");
}

#[test]
fn test_translate_help() {
    let home = TempDir::new().unwrap();
    let output = htmltrans(home.path())
        .args(["translate", "--help"])
        .output()
        .expect("Failed to run translate help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--lang"), "Should have lang option");
    assert!(stdout.contains("--domain"), "Should have domain option");
    assert!(stdout.contains("--parallel"), "Should have parallel option");
    assert!(stdout.contains("--glossary"), "Should have glossary option");
    assert!(stdout.contains("--no-cache"), "Should have no-cache option");
}

#[test]
fn test_extract_lists_segments() {
    let home = TempDir::new().unwrap();
    let page = home.path().join("index.html");
    fs::write(&page, PAGE).unwrap();

    let output = htmltrans(home.path())
        .args(["extract", page.to_str().unwrap()])
        .output()
        .expect("Failed to run extract");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Hello world"));
    assert!(stdout.contains("paragraph"));
    assert!(!stdout.contains("skip me"), "Script text must not be listed");
    assert!(!stdout.contains("color: red"), "Style text must not be listed");
    assert!(stdout.contains("Chunk 1/1"));
}

#[test]
fn test_translate_to_source_language_copies_document() {
    let home = TempDir::new().unwrap();
    let site = home.path().join("site");
    fs::create_dir_all(&site).unwrap();
    let page = site.join("index.html");
    fs::write(&page, PAGE).unwrap();

    let output = htmltrans(home.path())
        .args([
            "translate",
            page.to_str().unwrap(),
            "-l",
            "en",
            "--api",
            "ollama",
            "--no-cache",
        ])
        .output()
        .expect("Failed to run translate");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let translated = fs::read_to_string(site.join("index.en.html")).unwrap();
    assert_eq!(translated, PAGE);
}

#[test]
fn test_translate_without_api_key_fails() {
    let home = TempDir::new().unwrap();
    let page = home.path().join("index.html");
    fs::write(&page, PAGE).unwrap();

    let output = htmltrans(home.path())
        .args(["translate", page.to_str().unwrap(), "-l", "ru", "--api", "gemini"])
        .output()
        .expect("Failed to run translate");

    assert!(!output.status.success(), "Should fail without an API key");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("API key"), "stderr: {}", stderr);
    assert!(!home.path().join("index.ru.html").exists());
}

#[test]
fn test_config_set_and_get() {
    let home = TempDir::new().unwrap();

    let output = htmltrans(home.path())
        .args(["config", "set", "translation.default_language", "ru"])
        .output()
        .expect("Failed to run config set");
    assert!(output.status.success());

    let output = htmltrans(home.path())
        .args(["config", "get", "translation.default_language"])
        .output()
        .expect("Failed to run config get");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("translation.default_language = ru"));
}

#[test]
fn test_invalid_command() {
    let home = TempDir::new().unwrap();
    let output = htmltrans(home.path())
        .arg("invalid_command")
        .output()
        .expect("Failed to run invalid command");

    assert!(!output.status.success(), "Should fail on invalid command");
}

#[test]
fn test_missing_input() {
    let home = TempDir::new().unwrap();
    let output = htmltrans(home.path())
        .arg("translate")
        .output()
        .expect("Failed to run translate without input");

    assert!(!output.status.success(), "Should fail without input");
}
