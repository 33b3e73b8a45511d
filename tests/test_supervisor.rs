#![cfg(unix)]

use std::net::TcpListener;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use voice_agent::config::structs::Config;
use voice_agent::supervisor::LaunchResult;
use voice_agent::{LaunchError, Selector, Supervisor};

const READINESS_MS: u64 = 600;

fn config(root: &Path, policy: &str, services: &str) -> Config {
    let contents = format!(
        r#"
        project_root = '{}'

        [runner]
        shell = "sh"
        args = ["-c"]
        readiness_ms = {READINESS_MS}
        health_timeout_ms = 300
        health_policy = "{policy}"

        {services}
        "#,
        root.display()
    );

    toml::from_str(&contents).unwrap()
}

async fn serve_once(status_line: &'static str) -> String {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!("{status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
            let _ = socket.write_all(response.as_bytes()).await;
        }
    });

    format!("http://127.0.0.1:{port}/")
}

fn only(id: &str) -> Selector { Selector::Only(vec![id.to_owned()]) }

async fn wait_until_stopped(supervisor: &Supervisor, id: &str) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);

    while Instant::now() < deadline {
        if !supervisor.status().await.is_running(id) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    false
}

#[tokio::test]
async fn test_early_stdout_starts_before_readiness_timeout() {
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir(root.path().join("worker")).unwrap();

    let config = config(
        root.path(),
        "strict",
        r#"
        [services.worker]
        name = "Worker"
        dir = "worker"
        pattern = "sleep 7\\.301"
        start = "echo ready; exec sleep 7.301"
        "#,
    );
    let supervisor = Supervisor::from_config(&config).unwrap();

    let started = Instant::now();
    let report = supervisor.start(&only("worker")).await.unwrap();

    assert!(report.is_success(), "{report:?}");
    assert!(started.elapsed() < Duration::from_millis(READINESS_MS));
    assert!(supervisor.status().await.is_running("worker"));

    let second = supervisor.start(&only("worker")).await.unwrap();
    assert!(second.outcomes.is_empty());
    assert_eq!(second.skipped, vec!["worker".to_string()]);

    let stop = supervisor.stop(&only("worker")).await.unwrap();
    assert!(stop.stopped.contains(&"worker".to_string()) || stop.still_running.contains(&"worker".to_string()));
    assert!(wait_until_stopped(&supervisor, "worker").await);

    let again = supervisor.stop(&only("worker")).await.unwrap();
    assert!(again.stopped.is_empty());
    assert_eq!(again.not_running, vec!["worker".to_string()]);
}

#[tokio::test]
async fn test_silent_process_succeeds_after_readiness_timeout() {
    let root = tempfile::tempdir().unwrap();

    let config = config(
        root.path(),
        "strict",
        r#"
        [services.quiet]
        name = "Quiet"
        dir = "."
        pattern = "sleep 7\\.302"
        start = "exec sleep 7.302"
        "#,
    );
    let supervisor = Supervisor::from_config(&config).unwrap();

    let started = Instant::now();
    let report = supervisor.start(&only("quiet")).await.unwrap();

    assert!(report.is_success(), "{report:?}");
    assert!(started.elapsed() >= Duration::from_millis(READINESS_MS));

    supervisor.stop(&only("quiet")).await.unwrap();
    assert!(wait_until_stopped(&supervisor, "quiet").await);
}

#[tokio::test]
async fn test_stderr_error_fails_only_that_service() {
    let root = tempfile::tempdir().unwrap();

    let config = config(
        root.path(),
        "strict",
        r#"
        [services.broken]
        name = "Broken"
        dir = "."
        pattern = "sleep 7\\.303"
        start = "echo 'Error: EADDRINUSE' >&2"

        [services.chatty]
        name = "Chatty"
        dir = "."
        pattern = "sleep 7\\.304"
        start = "echo 'Listening on port 3000' >&2; exec sleep 7.304"
        "#,
    );
    let supervisor = Supervisor::from_config(&config).unwrap();

    let report = supervisor.start(&Selector::All).await.unwrap();

    assert_eq!(report.succeeded().collect::<Vec<_>>(), vec!["chatty"]);
    let failed: Vec<_> = report.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, "broken");
    assert!(failed[0].1.contains("EADDRINUSE"));

    supervisor.stop(&only("chatty")).await.unwrap();
    assert!(wait_until_stopped(&supervisor, "chatty").await);
}

#[tokio::test]
async fn test_missing_directory_is_reported_per_service() {
    let root = tempfile::tempdir().unwrap();

    let config = config(
        root.path(),
        "strict",
        r#"
        [services.ghost]
        name = "Ghost"
        dir = "does-not-exist"
        pattern = "sleep 7\\.305"
        start = "exec sleep 7.305"
        "#,
    );
    let supervisor = Supervisor::from_config(&config).unwrap();

    let report = supervisor.start(&Selector::All).await.unwrap();
    let expected = LaunchError::MissingDirectory(root.path().join("does-not-exist")).to_string();

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].result, LaunchResult::Failed(expected));
}

#[tokio::test]
async fn test_strict_health_policy_fails_silent_unhealthy_service() {
    let root = tempfile::tempdir().unwrap();
    let closed = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();

    let config = config(
        root.path(),
        "strict",
        &format!(
            r#"
            [services.api]
            name = "API"
            dir = "."
            pattern = "sleep 7\\.306"
            health = "http://127.0.0.1:{closed}/"
            start = "exec sleep 7.306"
            "#
        ),
    );
    let supervisor = Supervisor::from_config(&config).unwrap();

    let report = supervisor.start(&only("api")).await.unwrap();
    assert!(!report.is_success());
    assert!(report.failed().next().unwrap().1.starts_with("service started but health check failed"));

    supervisor.stop(&only("api")).await.unwrap();
    assert!(wait_until_stopped(&supervisor, "api").await);
}

#[tokio::test]
async fn test_lenient_policy_tolerates_failed_health_check() {
    let root = tempfile::tempdir().unwrap();
    let closed = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();

    let config = config(
        root.path(),
        "lenient",
        &format!(
            r#"
            [services.api]
            name = "API"
            dir = "."
            pattern = "sleep 7\\.307"
            health = "http://127.0.0.1:{closed}/"
            start = "exec sleep 7.307"
            "#
        ),
    );
    let supervisor = Supervisor::from_config(&config).unwrap();

    let started = Instant::now();
    let report = supervisor.start(&only("api")).await.unwrap();

    assert!(report.is_success(), "{report:?}");
    assert!(started.elapsed() >= Duration::from_millis(READINESS_MS));

    supervisor.stop(&only("api")).await.unwrap();
    assert!(wait_until_stopped(&supervisor, "api").await);
}

#[tokio::test]
async fn test_healthy_silent_service_starts_after_readiness_timeout() {
    let root = tempfile::tempdir().unwrap();
    let health = serve_once("HTTP/1.1 200 OK").await;

    let config = config(
        root.path(),
        "strict",
        &format!(
            r#"
            [services.api]
            name = "API"
            dir = "."
            pattern = "sleep 7\\.308"
            health = "{health}"
            start = "exec sleep 7.308"
            "#
        ),
    );
    let supervisor = Supervisor::from_config(&config).unwrap();

    let started = Instant::now();
    let report = supervisor.start(&only("api")).await.unwrap();

    assert!(report.is_success(), "{report:?}");
    assert!(started.elapsed() >= Duration::from_millis(READINESS_MS));

    supervisor.stop(&only("api")).await.unwrap();
    assert!(wait_until_stopped(&supervisor, "api").await);
}

#[tokio::test]
async fn test_status_follows_port_occupancy() {
    let root = tempfile::tempdir().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let config = config(
        root.path(),
        "strict",
        &format!(
            r#"
            [services.web]
            name = "Web"
            port = {port}
            dir = "."
            pattern = "never-matches-anything"
            start = "true"
            "#
        ),
    );
    let supervisor = Supervisor::from_config(&config).unwrap();

    assert!(supervisor.status().await.is_running("web"));

    drop(listener);
    assert!(!supervisor.status().await.is_running("web"));
}

#[tokio::test]
async fn test_unknown_service_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let supervisor = Supervisor::from_config(&config(root.path(), "strict", "[services]")).unwrap();

    assert!(supervisor.start(&only("nope")).await.is_err());
    assert!(supervisor.stop(&only("nope")).await.is_err());
}
