//! End-to-end behavior of the public execution API.

#![cfg(unix)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use safeexec::{
    safe_execute, safe_read_file, safe_spawn, sanitize_file_path, ProcessError,
    SafeCommandOptions, SafeExecError, SpawnOptions,
};
use tempfile::TempDir;

#[tokio::test]
async fn test_search_term_with_metacharacters_stays_one_argument() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("file.txt"), "a\ntest; rm -rf /\nb\n").unwrap();

    let options = SafeCommandOptions::new().with_cwd(dir.path());
    let result = safe_execute("grep", &["-n", "test; rm -rf /", "file.txt"], &options)
        .await
        .unwrap();

    assert_eq!(result.exit_code, Some(0));
    assert_eq!(result.stdout, "2:test; rm -rf /\n");
    assert!(dir.path().join("file.txt").exists());
}

#[tokio::test]
async fn test_buffered_timeout_is_reported_as_data() {
    let options = SafeCommandOptions::new().with_timeout(Duration::from_millis(100));
    let result = safe_execute("sleep", &["5"], &options).await.unwrap();

    assert_eq!(result.exit_code, Some(1));
    assert!(matches!(
        result.error,
        Some(ProcessError::TimedOut { timeout_ms: 100 })
    ));
}

#[tokio::test]
async fn test_streamed_timeout_is_rejected() {
    let child = safe_spawn(
        "sleep",
        &["5"],
        SpawnOptions::new().with_timeout(Duration::from_millis(100)),
    )
    .unwrap();

    let err = child.wait().await.unwrap_err();
    assert!(err.is_timeout());
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn test_streamed_chunks_reassemble_output() {
    let seen = Arc::new(Mutex::new(String::new()));
    let sink = Arc::clone(&seen);

    let child = safe_spawn(
        "sh",
        &["-c", "printf one; sleep 0.05; printf two"],
        SpawnOptions::new().on_stdout(move |chunk| sink.lock().unwrap().push_str(chunk)),
    )
    .unwrap();
    let result = child.wait().await.unwrap();

    assert_eq!(result.exit_code, Some(0));
    assert_eq!(*seen.lock().unwrap(), "onetwo");
    assert_eq!(result.stdout, "onetwo");
}

#[tokio::test]
async fn test_read_file_confined_to_base() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("docs")).unwrap();
    std::fs::write(dir.path().join("docs").join("a.txt"), "alpha").unwrap();

    let options = SafeCommandOptions::default();
    let result = safe_read_file("docs/a.txt", Some(dir.path()), &options)
        .await
        .unwrap();
    assert_eq!(result.stdout, "alpha");

    let err = safe_read_file("../../etc/passwd", Some(dir.path()), &options)
        .await
        .unwrap_err();
    assert!(matches!(err, SafeExecError::OutsideBaseDirectory(_)));
}

#[test]
fn test_sanitize_without_base() {
    assert!(matches!(
        sanitize_file_path("a/b/../../etc", None),
        Err(SafeExecError::DirectoryTraversal(_))
    ));
    assert_eq!(
        sanitize_file_path("./docs//a.txt", None).unwrap(),
        std::path::PathBuf::from("docs/a.txt")
    );
}

#[tokio::test]
async fn test_concurrent_executions_are_independent() {
    let options = SafeCommandOptions::default();
    let runs = (0..8).map(|i| {
        let options = options.clone();
        async move {
            let arg = format!("run-{}", i);
            safe_execute("echo", &[arg.as_str()], &options).await
        }
    });

    let results = spawn_all(runs).await;
    for (i, result) in results.into_iter().enumerate() {
        assert_eq!(result.unwrap().stdout, format!("run-{}\n", i));
    }
}

async fn spawn_all<F, T>(futures: impl IntoIterator<Item = F>) -> Vec<T>
where
    F: std::future::Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let handles: Vec<_> = futures.into_iter().map(tokio::spawn).collect();
    let mut out = Vec::with_capacity(handles.len());
    for handle in handles {
        out.push(handle.await.unwrap());
    }
    out
}
