use breakshot_browser::scripted::{PageCall, ScriptedBrowser};
use breakshot_browser::ViewportSize;
use breakshot_screenshot::{Config, OutputPlan, ViewportSet, run_with_browser};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn config(output: &Path, args: &[&str]) -> Config {
    let output = output.to_string_lossy().to_string();
    let args = ["breakshot", "-o", output.as_str()]
        .into_iter()
        .chain(args.iter().copied());
    Config::from_args(args).expect("config should parse")
}

async fn run_scripted(
    browser: &ScriptedBrowser,
    config: &Config,
) -> breakshot_screenshot::CaptureReport {
    let viewports = ViewportSet::resolve(&config.viewports, &config.custom_resolutions);
    let plan = OutputPlan::create(config).expect("output dir should be created");
    run_with_browser(browser.clone(), config, &viewports, &plan)
        .await
        .expect("run should succeed")
}

fn run_breakshot(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_breakshot"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("breakshot should run")
}

#[tokio::test]
async fn test_default_viewports_full_page() {
    let out = TempDir::new().unwrap();
    let config = config(out.path(), &["-h", "https://example.com", "-p", "/", "-t", "50"]);
    let browser = ScriptedBrowser::new().with_heights(vec![1000, 1000]);

    let report = run_scripted(&browser, &config).await;

    assert_eq!(report.saved.len(), 4);
    assert!(report.failed.is_empty());
    for key in ["s", "m", "l", "xl"] {
        let file = out.path().join("example.com").join(key).join("1.home.png");
        assert!(file.exists(), "missing {}", file.display());
    }

    let calls = browser.calls();
    let viewports: Vec<ViewportSize> = calls
        .iter()
        .filter_map(|call| match call {
            PageCall::SetViewport(size) => Some(*size),
            _ => None,
        })
        .collect();
    assert_eq!(
        viewports,
        vec![
            ViewportSize::new(640, 800),
            ViewportSize::new(768, 800),
            ViewportSize::new(1024, 800),
            ViewportSize::new(1440, 800),
        ]
    );
    assert!(calls.iter().all(|call| match call {
        PageCall::Screenshot { full_page, .. } => *full_page,
        _ => true,
    }));
    assert!(browser.is_closed());
}

#[tokio::test]
async fn test_paths_outer_viewports_inner() {
    let out = TempDir::new().unwrap();
    let paths: Vec<String> = (1..=10).map(|i| format!("/page-{}", i)).collect();
    let mut args = vec!["-h", "https://example.com/", "-v", "s", "custom", "-c", "375x667", "-p"];
    args.extend(paths.iter().map(String::as_str));
    let config = config(out.path(), &args);
    let browser = ScriptedBrowser::new();

    let report = run_scripted(&browser, &config).await;

    assert_eq!(report.saved.len(), 20);
    let order: Vec<(&str, &str)> = report
        .saved
        .iter()
        .take(4)
        .map(|saved| (saved.url.as_str(), saved.viewport.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("https://example.com/page-1", "s"),
            ("https://example.com/page-1", "custom_1"),
            ("https://example.com/page-2", "s"),
            ("https://example.com/page-2", "custom_1"),
        ]
    );
    let base = out.path().join("example.com");
    assert!(base.join("s/01.page_1.png").exists());
    assert!(base.join("custom_1/10.page_10.png").exists());

    // custom viewports have a height, so they are not full-page
    let custom_shot = PageCall::Screenshot {
        path: base.join("custom_1/01.page_1.png"),
        full_page: false,
    };
    assert!(browser.calls().contains(&custom_shot));
}

#[tokio::test]
async fn test_height_limit_applies_to_every_viewport() {
    let out = TempDir::new().unwrap();
    let config = config(
        out.path(),
        &["-h", "https://example.com", "-p", "/", "-H", "1200", "-v", "m", "custom", "-c", "320x480"],
    );
    let browser = ScriptedBrowser::new();

    run_scripted(&browser, &config).await;

    let calls = browser.calls();
    assert!(calls.contains(&PageCall::SetViewport(ViewportSize::new(768, 1200))));
    assert!(calls.contains(&PageCall::SetViewport(ViewportSize::new(320, 1200))));
    assert!(!calls.iter().any(|call| matches!(
        call,
        PageCall::Screenshot {
            full_page: true,
            ..
        }
    )));
}

#[tokio::test]
async fn test_failed_capture_does_not_stop_run() {
    let out = TempDir::new().unwrap();
    let config = config(
        out.path(),
        &["-h", "https://example.com", "-p", "/", "/broken", "/about", "-v", "l"],
    );
    let browser = ScriptedBrowser::new().failing_url("/broken");

    let report = run_scripted(&browser, &config).await;

    assert_eq!(report.saved.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].url, "https://example.com/broken");
    assert_eq!(report.failed[0].viewport, "l");
    assert!(report.failed[0].error.contains("ERR_CONNECTION_REFUSED"));

    let base = out.path().join("example.com/l");
    assert!(base.join("1.home.png").exists());
    assert!(!base.join("2.broken.png").exists());
    assert!(base.join("3.about.png").exists());

    let opened = browser.calls().iter().filter(|c| **c == PageCall::Open).count();
    let closed = browser.calls().iter().filter(|c| **c == PageCall::Close).count();
    assert_eq!(opened, 3);
    assert_eq!(closed, 3);
}

#[tokio::test]
async fn test_report_serializes_to_json() {
    let out = TempDir::new().unwrap();
    let config = config(out.path(), &["-h", "https://example.com", "-p", "/x", "-v", "s"]);
    let browser = ScriptedBrowser::new();

    let report = run_scripted(&browser, &config).await;
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["saved"][0]["url"], "https://example.com/x");
    assert_eq!(json["saved"][0]["viewport"], "s");
    assert_eq!(json["failed"].as_array().map(Vec::len), Some(0));
}

#[test]
fn test_cli_missing_required_flags_exits_one() {
    let output = run_breakshot(&["-p", "/"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: Base URL (-h) and paths (-p) are required."));
}

#[test]
fn test_cli_unknown_flag_exits_one() {
    let output = run_breakshot(&["-h", "https://example.com", "-x", "1", "-p", "/"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_cli_help_exits_zero() {
    let output = run_breakshot(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("-h <URL>"));
    assert!(stdout.contains("--custom"));
}

/// Capture a local page with a real Chromium
#[test]
#[ignore] // requires a local Chromium install
fn test_cli_captures_local_server() {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    std::thread::spawn(move || {
        let body = "<!DOCTYPE html><html><body style=\"height:2400px\"><h1>breakshot</h1></body></html>";
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    let out = TempDir::new().unwrap();
    let base_url = format!("http://127.0.0.1:{}", port);
    let output = run_breakshot(&[
        "-h",
        &base_url,
        "-p",
        "/",
        "-t",
        "10",
        "-v",
        "s",
        "-o",
        &out.path().to_string_lossy(),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let screenshot = out.path().join("127.0.0.1/s/1.home.png");
    let bytes = std::fs::read(&screenshot).unwrap();
    assert!(bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]));
    assert!(bytes.len() > 1000, "screenshot should have content");
}
