use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Integration tests for the notemd binary
///
/// Each test lays out a converter work directory with markdown and
/// extracted media, runs a command, and inspects the written files.
struct TestContext {
    #[allow(dead_code)]
    temp_dir: TempDir,
    root: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let root = temp_dir.path().to_path_buf();
        Self { temp_dir, root }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    fn write(&self, rel: &str, content: &[u8]) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn notemd(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        Command::new(env!("CARGO_BIN_EXE_notemd"))
            .current_dir(&self.root)
            .env("RUST_LOG", "warn")
            .args(args)
            .assert()
    }
}

fn only_file_in(dir: &Path) -> PathBuf {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(entries.len(), 1, "expected exactly one file in {:?}", dir);
    entries.remove(0)
}

#[test]
fn test_post_process_rewrites_images_relative() {
    let ctx = TestContext::new();
    ctx.write("_tmp/media/image1.png", b"png");
    ctx.write(
        "_tmp/Page.md",
        b"Page\n\nFriday\n\n10:30\n\nSee <img src=\"media/image1.png\" style=\"width:1in\" />\n",
    );

    ctx.notemd(&[
        "post-process",
        "_tmp/Page.md",
        "--output",
        "out/Notebook/Page.md",
        "--resources",
        "out/_resources",
    ])
    .success()
    .stdout(predicate::str::contains("Wrote out/Notebook/Page.md"));

    let moved = only_file_in(&ctx.path("out/_resources"));
    let file_name = moved.file_name().unwrap().to_string_lossy().to_string();
    assert!(file_name.ends_with(".png"));
    assert_eq!(fs::read(&moved).unwrap(), b"png");
    assert!(!ctx.path("_tmp/media/image1.png").exists());

    let written = fs::read_to_string(ctx.path("out/Notebook/Page.md")).unwrap();
    assert_eq!(
        written,
        format!("See ![{0}](../_resources/{0})\n", file_name)
    );
}

#[test]
fn test_post_process_absolute_references() {
    let ctx = TestContext::new();
    ctx.write("_tmp/media/a.jpg", b"jpg");
    ctx.write(
        "_tmp/Page.md",
        b"<img src=\"media/a.jpg\" />\n\n<img src=\"media/a.jpg\" />\n",
    );

    ctx.notemd(&[
        "post-process",
        "_tmp/Page.md",
        "-o",
        "out/Page.md",
        "--absolute",
    ])
    .success();

    let moved = only_file_in(&ctx.path("out/_resources"));
    let stem = moved.file_stem().unwrap().to_string_lossy().to_string();
    let written = fs::read_to_string(ctx.path("out/Page.md")).unwrap();
    assert_eq!(written.matches(&format!("(:/{})", stem)).count(), 2);
}

#[test]
fn test_post_process_malformed_tag_still_normalizes() {
    let ctx = TestContext::new();
    ctx.write(
        "_tmp/Page.md",
        b"Page\n\nFriday\n\n10:30 Body <img alt=\"x\" />\n \n \n End\n",
    );

    ctx.notemd(&["post-process", "_tmp/Page.md", "-o", "out/Page.md"])
        .success()
        .stderr(predicate::str::contains("Images left unprocessed"));

    let written = fs::read_to_string(ctx.path("out/Page.md")).unwrap();
    assert_eq!(written, "Body <img alt=\"x\" />\n\nEnd\n");
}

#[test]
fn test_post_process_missing_image_warns_but_succeeds() {
    let ctx = TestContext::new();
    ctx.write("_tmp/Page.md", b"<img src=\"media/lost.png\" />\n");

    ctx.notemd(&["post-process", "_tmp/Page.md", "-o", "out/Page.md"])
        .success()
        .stderr(predicate::str::contains("Attachment not moved"));

    let written = fs::read_to_string(ctx.path("out/Page.md")).unwrap();
    assert!(written.starts_with("!["));
}

#[test]
fn test_post_process_json_summary() {
    let ctx = TestContext::new();
    ctx.write("_tmp/media/a.png", b"a");
    ctx.write("_tmp/Page.md", b"<img src=\"media/a.png\" />\n");

    let assert = ctx
        .notemd(&["post-process", "_tmp/Page.md", "-o", "out/Page.md", "--json"])
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["metadata"]["command"], "post-process");
    assert_eq!(json["data"]["images_moved"], 1);
    assert_eq!(json["data"]["attachments"].as_array().unwrap().len(), 1);
}

#[test]
fn test_no_images_flag_keeps_tags() {
    let ctx = TestContext::new();
    ctx.write("_tmp/media/a.png", b"a");
    ctx.write("_tmp/Page.md", b"<img src=\"media/a.png\" />\n");

    ctx.notemd(&[
        "post-process",
        "_tmp/Page.md",
        "-o",
        "out/Page.md",
        "--no-images",
    ])
    .success();

    let written = fs::read_to_string(ctx.path("out/Page.md")).unwrap();
    assert_eq!(written, "<img src=\"media/a.png\" />\n");
    assert!(ctx.path("_tmp/media/a.png").exists());
}

#[test]
fn test_config_file_disables_header_strip() {
    let ctx = TestContext::new();
    ctx.write(
        "notemd.toml",
        b"[post_processing]\nremove_onenote_header = false\n",
    );
    ctx.write("page.md", b"Page\n\nFriday\n\n10:30 Body\n");

    ctx.notemd(&["normalize", "page.md"])
        .success()
        .stdout(predicate::str::contains("Page\n\nFriday\n\n10:30 Body"));

    ctx.notemd(&["normalize", "page.md", "--config", "missing.toml"])
        .failure()
        .code(3);
}

#[test]
fn test_normalize_prints_cleaned_text() {
    let ctx = TestContext::new();
    ctx.write("page.md", b"Page\r\n\r\nFriday\r\n\r\n10:30 Body\r\n");

    ctx.notemd(&["normalize", "page.md"])
        .success()
        .stdout("Body\n");
}

#[test]
fn test_convert_markdown_input() {
    let ctx = TestContext::new();
    ctx.write("in/media/pic.gif", b"gif");
    ctx.write("in/Daily.md", b"Hi <img src=\"media/pic.gif\" />\n");

    ctx.notemd(&["convert", "in/Daily.md", "-o", "out/Daily.md"])
        .success();

    let moved = only_file_in(&ctx.path("out/_resources"));
    let file_name = moved.file_name().unwrap().to_string_lossy().to_string();
    let written = fs::read_to_string(ctx.path("out/Daily.md")).unwrap();
    assert_eq!(written, format!("Hi ![{0}](_resources/{0})\n", file_name));
}

#[test]
fn test_convert_unsupported_format() {
    let ctx = TestContext::new();
    ctx.write("in/notes.pdf", b"%PDF");

    ctx.notemd(&["convert", "in/notes.pdf", "-o", "out/notes.md"])
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Unsupported input format"));
}

#[test]
fn test_missing_input_exit_code() {
    let ctx = TestContext::new();

    ctx.notemd(&["post-process", "nope.md", "-o", "out.md"])
        .failure()
        .code(3);
}

#[test]
fn test_json_error_envelope() {
    let ctx = TestContext::new();

    let assert = ctx
        .notemd(&["post-process", "nope.md", "-o", "out.md", "--json"])
        .failure()
        .code(3);

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
    assert_eq!(json["error"]["exit_code"], 3);
    assert_eq!(json["metadata"]["command"], "post-process");
}

#[test]
fn test_relative_reference_from_output_above_working_dir() {
    let ctx = TestContext::new();
    let work = ctx.path("work");
    fs::create_dir_all(&work).unwrap();
    ctx.write("work/_tmp/media/a.png", b"png");
    ctx.write("work/_tmp/Page.md", b"<img src=\"media/a.png\" />\n");

    Command::new(env!("CARGO_BIN_EXE_notemd"))
        .current_dir(&work)
        .env("RUST_LOG", "warn")
        .args([
            "post-process",
            "_tmp/Page.md",
            "-o",
            "../out/Page.md",
            "--resources",
            "_resources",
        ])
        .assert()
        .success();

    let moved = only_file_in(&work.join("_resources"));
    let file_name = moved.file_name().unwrap().to_string_lossy().to_string();
    let written = fs::read_to_string(ctx.path("out/Page.md")).unwrap();
    assert_eq!(
        written,
        format!("![{0}](../work/_resources/{0})\n", file_name)
    );
}
