use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn ccat_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("ccat");
    path
}

const JSON_FEED: &str = r#"{
  "status": "success",
  "data": [
    {
      "id": 1,
      "title": "Complete Guide to Rust",
      "content": "<p>Covers ownership and borrowing.</p>",
      "type": "video",
      "views": 50000,
      "likes": 1200,
      "category": "Tutorial",
      "tags": ["rust", "beginner"],
      "url": "https://example.com/rust-guide",
      "published_at": "2024-01-15T10:00:00Z"
    },
    {
      "id": 2,
      "title": "Advanced Async Patterns",
      "content": "Pinning, executors, and cancellation.",
      "type": "text",
      "reading_time": 15,
      "reactions": 67,
      "category": "Advanced",
      "tags": ["rust", "async"],
      "url": "https://example.com/async-patterns",
      "published_at": "2024-02-01T09:30:00Z"
    }
  ]
}"#;

const XML_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<response>
  <status>success</status>
  <items>
    <item>
      <id>4</id>
      <title>Understanding Rust Fundamentals</title>
      <content>Deep dive into core concepts.</content>
      <type>text</type>
      <reading_time>12</reading_time>
      <reactions>89</reactions>
      <category>Fundamentals</category>
      <tags>
        <tag>fundamentals</tag>
        <tag>theory</tag>
      </tags>
      <url>https://example.com/rust-fundamentals</url>
      <published_at>2024-01-10T08:00:00Z</published_at>
    </item>
  </items>
  <total>1</total>
</response>"#;

/// Minimal blocking HTTP server for the provider feeds. Serves until the
/// process exits; each test binds its own ephemeral port.
fn spawn_feed_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            if let Ok(stream) = stream {
                std::thread::spawn(move || handle_request(stream));
            }
        }
    });

    format!("http://{}", addr)
}

fn handle_request(mut stream: TcpStream) {
    let mut buf = [0u8; 4096];
    let mut req = Vec::new();
    loop {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                req.extend_from_slice(&buf[..n]);
                if req.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            Err(_) => return,
        }
    }

    let request = String::from_utf8_lossy(&req);
    let mut parts = request.split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("");

    let (status, body, content_type) = if path.starts_with("/feed.json") {
        ("200 OK", JSON_FEED, "application/json")
    } else if path.starts_with("/feed.xml") {
        ("200 OK", XML_FEED, "application/xml")
    } else if path.starts_with("/broken") {
        ("500 Internal Server Error", "", "text/plain")
    } else {
        ("404 Not Found", "", "text/plain")
    };

    let payload = if method == "HEAD" { "" } else { body };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        payload
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.shutdown(std::net::Shutdown::Both);
}

fn setup_test_env(base_url: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/ccat.sqlite"

[sync]
timeout_secs = 5

[providers.json.tutorials]
url = "{}/feed.json"
rate_limit = 50

[providers.xml.partner]
url = "{}/feed.xml"
"#,
        root.display(),
        base_url,
        base_url
    );

    let config_path = config_dir.join("ccat.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_ccat(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = ccat_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run ccat binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let base_url = spawn_feed_server();
    let (tmp, config_path) = setup_test_env(&base_url);

    let (stdout, stderr, success) = run_ccat(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data").join("ccat.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let base_url = spawn_feed_server();
    let (_tmp, config_path) = setup_test_env(&base_url);

    let (_, _, success1) = run_ccat(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_ccat(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_providers_listed_with_availability() {
    let base_url = spawn_feed_server();
    let (_tmp, config_path) = setup_test_env(&base_url);

    let (stdout, _, success) = run_ccat(&config_path, &["providers"]);
    assert!(success);
    assert!(stdout.contains("json:tutorials"));
    assert!(stdout.contains("xml:partner"));
    assert!(stdout.contains("yes"));
    assert!(stdout.contains("50/50"));
}

#[test]
fn test_sync_creates_documents() {
    let base_url = spawn_feed_server();
    let (_tmp, config_path) = setup_test_env(&base_url);

    run_ccat(&config_path, &["init"]);
    let (stdout, stderr, success) = run_ccat(&config_path, &["sync"]);
    assert!(success, "sync failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("created: 3"), "got: {}", stdout);
    assert!(stdout.contains("updated: 0"));
    assert!(stdout.contains("ok"));
}

#[test]
fn test_sync_idempotent_no_duplicates() {
    let base_url = spawn_feed_server();
    let (_tmp, config_path) = setup_test_env(&base_url);

    run_ccat(&config_path, &["init"]);
    let (stdout1, _, _) = run_ccat(&config_path, &["sync"]);
    assert!(stdout1.contains("created: 3"));

    // Same upstream content: must update in place, never duplicate
    let (stdout2, _, _) = run_ccat(&config_path, &["sync"]);
    assert!(stdout2.contains("created: 0"), "got: {}", stdout2);
    assert!(stdout2.contains("updated: 3"));

    let (list_out, _, _) = run_ccat(&config_path, &["search", ""]);
    assert!(list_out.contains("3 total"), "got: {}", list_out);
}

#[test]
fn test_sync_continues_past_broken_provider() {
    let base_url = spawn_feed_server();
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join("config")).unwrap();
    fs::create_dir_all(root.join("data")).unwrap();

    // First provider 500s on every request, second is healthy
    let config_content = format!(
        r#"[db]
path = "{}/data/ccat.sqlite"

[sync]
timeout_secs = 5

[providers.json.broken]
url = "{}/broken"

[providers.json.tutorials]
url = "{}/feed.json"
"#,
        root.display(),
        base_url,
        base_url
    );
    let config_path = root.join("config").join("ccat.toml");
    fs::write(&config_path, config_content).unwrap();

    run_ccat(&config_path, &["init"]);
    let (stdout, _, success) = run_ccat(&config_path, &["sync"]);
    assert!(success, "partial failure must not fail the run: {}", stdout);
    assert!(stdout.contains("unavailable"), "got: {}", stdout);
    assert!(stdout.contains("created: 2"), "got: {}", stdout);
}

#[test]
fn test_search_matches_title_and_filters() {
    let base_url = spawn_feed_server();
    let (_tmp, config_path) = setup_test_env(&base_url);

    run_ccat(&config_path, &["init"]);
    run_ccat(&config_path, &["sync"]);

    let (stdout, _, success) = run_ccat(&config_path, &["search", "Rust"]);
    assert!(success);
    assert!(stdout.contains("Complete Guide to Rust"));
    assert!(stdout.contains("Understanding Rust Fundamentals"));

    let (stdout, _, _) = run_ccat(&config_path, &["search", "Rust", "--type", "video"]);
    assert!(stdout.contains("Complete Guide to Rust"));
    assert!(!stdout.contains("Understanding Rust Fundamentals"));

    let (stdout, _, _) = run_ccat(&config_path, &["search", "", "--tag", "async"]);
    assert!(stdout.contains("1 total"), "got: {}", stdout);
    assert!(stdout.contains("Advanced Async Patterns"));
}

#[test]
fn test_search_no_results() {
    let base_url = spawn_feed_server();
    let (_tmp, config_path) = setup_test_env(&base_url);

    run_ccat(&config_path, &["init"]);
    run_ccat(&config_path, &["sync"]);

    let (stdout, _, success) = run_ccat(&config_path, &["search", "xyznonexistent"]);
    assert!(success);
    assert!(stdout.contains("No results"));
}

#[test]
fn test_search_deterministic() {
    let base_url = spawn_feed_server();
    let (_tmp, config_path) = setup_test_env(&base_url);

    run_ccat(&config_path, &["init"]);
    run_ccat(&config_path, &["sync"]);

    // Execution time varies; compare the result lines only
    let strip = |out: String| -> String {
        out.lines()
            .filter(|l| !l.starts_with("Results:"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let (stdout1, _, _) = run_ccat(&config_path, &["search", "Rust"]);
    let (stdout2, _, _) = run_ccat(&config_path, &["search", "Rust"]);
    assert_eq!(strip(stdout1), strip(stdout2));
}

#[test]
fn test_suggest_and_listings() {
    let base_url = spawn_feed_server();
    let (_tmp, config_path) = setup_test_env(&base_url);

    run_ccat(&config_path, &["init"]);
    run_ccat(&config_path, &["sync"]);

    let (stdout, _, success) = run_ccat(&config_path, &["suggest", "Rust"]);
    assert!(success);
    assert!(stdout.contains("Complete Guide to Rust"));

    let (stdout, _, _) = run_ccat(&config_path, &["categories"]);
    assert!(stdout.contains("Tutorial"));
    assert!(stdout.contains("Advanced"));
    assert!(stdout.contains("Fundamentals"));

    let (stdout, _, _) = run_ccat(&config_path, &["tags"]);
    assert!(stdout.contains("rust"));
    assert!(stdout.contains("async"));
    assert!(stdout.contains("theory"));
}

#[test]
fn test_get_document() {
    let base_url = spawn_feed_server();
    let (_tmp, config_path) = setup_test_env(&base_url);

    run_ccat(&config_path, &["init"]);
    run_ccat(&config_path, &["sync"]);

    let (stdout, _, success) = run_ccat(&config_path, &["get", "1"]);
    assert!(success, "get failed: {}", stdout);
    assert!(stdout.contains("--- Document ---"));
    assert!(stdout.contains("Complete Guide to Rust"));
    // HTML is stripped during normalization
    assert!(stdout.contains("Covers ownership and borrowing."));
    assert!(!stdout.contains("<p>"));
}

#[test]
fn test_get_missing_document() {
    let base_url = spawn_feed_server();
    let (_tmp, config_path) = setup_test_env(&base_url);

    run_ccat(&config_path, &["init"]);

    let (_, stderr, success) = run_ccat(&config_path, &["get", "999"]);
    assert!(!success, "get with missing id should fail");
    assert!(stderr.contains("not found"), "got: {}", stderr);
}

#[test]
fn test_view_and_like_rescore() {
    let base_url = spawn_feed_server();
    let (_tmp, config_path) = setup_test_env(&base_url);

    run_ccat(&config_path, &["init"]);
    run_ccat(&config_path, &["sync"]);

    let (stdout, _, success) = run_ccat(&config_path, &["view", "1"]);
    assert!(success);
    assert!(stdout.contains("50001 views"), "got: {}", stdout);

    let (stdout, _, success) = run_ccat(&config_path, &["like", "1"]);
    assert!(success);
    assert!(stdout.contains("1201 likes"), "got: {}", stdout);
    assert!(stdout.contains("score:"));
}

#[test]
fn test_stats_overview() {
    let base_url = spawn_feed_server();
    let (_tmp, config_path) = setup_test_env(&base_url);

    run_ccat(&config_path, &["init"]);
    run_ccat(&config_path, &["sync"]);
    run_ccat(&config_path, &["search", "rust"]);

    let (stdout, _, success) = run_ccat(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Documents:   3"), "got: {}", stdout);
    assert!(stdout.contains("Video:       1"));
    assert!(stdout.contains("Text:        2"));
    assert!(stdout.contains("Searches:    1"));
    assert!(stdout.contains("rust"));
}
