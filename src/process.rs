use std::io::ErrorKind;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::{Result, VidsubError};

/// Run an external tool to completion with stdout/stderr captured.
///
/// A binary that cannot be found maps to `ToolNotFound`. The child is
/// killed if the token fires before it exits. The exit status is left to
/// the caller.
pub async fn run_captured(binary: &str, args: &[String], cancel: &CancelToken) -> Result<Output> {
    debug!("Executing: {} {:?}", binary, args);
    cancel.check()?;

    let child = Command::new(binary)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => VidsubError::ToolNotFound(format!("{}: {}", binary, e)),
            _ => VidsubError::Media(format!("Failed to execute {}: {}", binary, e)),
        })?;

    tokio::select! {
        output = child.wait_with_output() => Ok(output?),
        _ = cancel.cancelled() => {
            debug!("Cancelled while running {}", binary);
            Err(VidsubError::Cancelled)
        }
    }
}

/// Stderr of a failed run, trimmed to something loggable
pub fn stderr_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        output.status.to_string()
    } else {
        stderr.to_string()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn test_missing_binary_is_tool_not_found() {
        let err = run_captured("vidsub-no-such-tool", &[], &CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, VidsubError::ToolNotFound(_)));
        assert!(err.is_environment());
    }

    #[tokio::test]
    async fn test_captures_stderr_and_status() {
        let args = vec!["-c".to_string(), "echo broken >&2; exit 3".to_string()];
        let output = run_captured("sh", &args, &CancelToken::new()).await.unwrap();
        assert!(!output.status.success());
        assert_eq!(stderr_text(&output), "broken");
    }

    #[tokio::test]
    async fn test_cancel_kills_running_tool() {
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let args = vec!["30".to_string()];
        let err = run_captured("sleep", &args, &cancel).await.unwrap_err();
        assert!(matches!(err, VidsubError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
