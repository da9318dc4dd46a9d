use assert_cmd::prelude::*;
use httpmock::prelude::*;
use serde_json::json;
use std::io::Write;
use std::process::{Command, Output};
use tempfile::{NamedTempFile, TempDir};

// Nothing listens on the discard port, so a test that accidentally goes
// remote fails loudly instead of reaching VK.
const UNREACHABLE_API: &str = "http://127.0.0.1:9/method";

fn command(api_url: &str) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("vk-upload"));
    cmd.env("VK_API_URL", api_url)
        .env_remove("VK_API_VERSION")
        .env_remove("RUST_LOG");
    cmd
}

fn video_file() -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".mp4")
        .tempfile()
        .expect("temp file");
    file.write_all(b"fake video bytes").expect("write");
    file
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("utf8 stdout")
}

#[test]
fn missing_file_is_reported_without_network() {
    let temp = TempDir::new().expect("temp dir");
    let missing = temp.path().join("missing.mp4");

    let assert = command(UNREACHABLE_API)
        .env("VK_ACCESS_TOKEN", "secret")
        .arg("--file")
        .arg(&missing)
        .assert()
        .failure()
        .code(1);

    let out = stdout(assert.get_output());
    assert_eq!(
        out,
        format!("❌ Error: file not found at path '{}'\n", missing.display())
    );
}

#[test]
fn missing_token_prints_setup_instructions() {
    let file = video_file();

    let assert = command(UNREACHABLE_API)
        .env_remove("VK_ACCESS_TOKEN")
        .arg("--file")
        .arg(file.path())
        .assert()
        .failure()
        .code(1);

    let out = stdout(assert.get_output());
    assert!(out.contains("❌ Error: environment variable 'VK_ACCESS_TOKEN' is not set."));
    assert!(out.contains("export VK_ACCESS_TOKEN=\"your_token_here\""));
    assert!(!out.contains("Starting upload"));
}

#[test]
fn missing_file_flag_is_a_usage_error() {
    let assert = command(UNREACHABLE_API)
        .args(["--title", "Launch"])
        .assert()
        .failure()
        .code(2);

    let stderr = String::from_utf8(assert.get_output().stderr.clone()).expect("utf8 stderr");
    assert!(stderr.contains("--file"));
}

#[test]
fn rejected_token_prints_scope_hint() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/method/users.get");
        then.status(200).json_body(json!({
            "error": { "error_code": 5, "error_msg": "User authorization failed: invalid access_token (4)." }
        }));
    });
    let file = video_file();

    let assert = command(&server.url("/method"))
        .env("VK_ACCESS_TOKEN", "expired")
        .arg("--file")
        .arg(file.path())
        .assert()
        .failure()
        .code(1);

    let out = stdout(assert.get_output());
    assert!(out.starts_with("🚀 Starting upload...\n"));
    assert!(out.contains("❌ Authentication error: [5] User authorization failed"));
    assert!(out.contains("'video' and 'wall' scopes"));
}

#[test]
fn upload_and_wall_post_end_to_end() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/method/users.get")
            .body_contains("access_token=secret");
        then.status(200)
            .json_body(json!({ "response": [{ "id": 42, "first_name": "A", "last_name": "B" }] }));
    });
    let save = server.mock(|when, then| {
        when.method(POST)
            .path("/method/video.save")
            .body_contains("name=Launch");
        then.status(200).json_body(json!({
            "response": { "upload_url": server.url("/upload"), "owner_id": 42, "video_id": 100 }
        }));
    });
    let upload = server.mock(|when, then| {
        when.method(POST).path("/upload");
        then.status(200)
            .json_body(json!({ "owner_id": 42, "video_id": 100, "size": 16 }));
    });
    let post = server.mock(|when, then| {
        when.method(POST)
            .path("/method/wall.post")
            .body_contains("message=Launch%0A%0AFirst+cut")
            .body_contains("attachments=video42_100");
        then.status(200)
            .json_body(json!({ "response": { "post_id": 1 } }));
    });
    let file = video_file();

    let assert = command(&server.url("/method"))
        .env("VK_ACCESS_TOKEN", "secret")
        .arg("--file")
        .arg(file.path())
        .args(["--title", "Launch", "--description", "First cut", "--wallpost"])
        .assert()
        .success();

    save.assert();
    upload.assert();
    post.assert();
    let out = stdout(assert.get_output());
    assert!(out.contains("   URL: https://vk.com/video42_100\n"));
    assert!(out.ends_with("✅ Posted to wall!\n"));
}

#[test]
fn without_wallpost_flag_nothing_is_posted() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/method/users.get");
        then.status(200)
            .json_body(json!({ "response": [{ "id": 42 }] }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/method/video.save");
        then.status(200).json_body(json!({
            "response": { "upload_url": server.url("/upload"), "owner_id": 42, "video_id": 100 }
        }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/upload");
        then.status(200)
            .json_body(json!({ "owner_id": 42, "video_id": 100 }));
    });
    let post = server.mock(|when, then| {
        when.method(POST).path("/method/wall.post");
        then.status(200)
            .json_body(json!({ "response": { "post_id": 1 } }));
    });
    let file = video_file();

    let assert = command(&server.url("/method"))
        .env("VK_ACCESS_TOKEN", "secret")
        .arg("--file")
        .arg(file.path())
        .assert()
        .success();

    post.assert_hits(0);
    let out = stdout(assert.get_output());
    assert!(out.ends_with("   URL: https://vk.com/video42_100\n"));
}
