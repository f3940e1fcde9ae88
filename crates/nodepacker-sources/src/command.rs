use crate::error::{Result, SourceError};
use std::time::Duration;
use tracing::debug;

/// Output from a command execution
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Execute a command, failing on non-zero exit code or when `limit` expires.
///
/// The child is killed if it is still running when the limit expires.
pub async fn exec(program: &str, args: &[&str], limit: Duration) -> Result<CommandOutput> {
    let command_line = format!("{} {}", program, args.join(" "));

    let output = tokio::time::timeout(limit, exec_unchecked(program, args))
        .await
        .map_err(|_| SourceError::timeout(&command_line, limit.as_secs()))??;

    if output.exit_code != 0 {
        return Err(SourceError::command_failed(
            command_line,
            output.exit_code,
            output.stderr.trim(),
        ));
    }

    Ok(output)
}

/// Execute a command and return output regardless of exit code
pub async fn exec_unchecked(program: &str, args: &[&str]) -> Result<CommandOutput> {
    debug!("Executing: {} {}", program, args.join(" "));

    let output = tokio::process::Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            SourceError::command_failed(
                format!("{} {}", program, args.join(" ")),
                -1,
                e.to_string(),
            )
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    debug!(
        "Command exited with code {}: {} {}",
        exit_code,
        program,
        args.join(" ")
    );

    Ok(CommandOutput {
        stdout,
        stderr,
        exit_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn test_exec_captures_stdout() {
        let output = exec("sh", &["-c", "echo hello"], LIMIT).await.unwrap();
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.exit_code, 0);
    }

    #[tokio::test]
    async fn test_exec_fails_on_non_zero_exit() {
        let err = exec("sh", &["-c", "echo oops >&2; exit 3"], LIMIT)
            .await
            .unwrap_err();
        match err {
            SourceError::CommandFailed {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, 3);
                assert_eq!(stderr, "oops");
            }
            other => panic!("expected CommandFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exec_unchecked_returns_exit_code() {
        let output = exec_unchecked("sh", &["-c", "exit 2"]).await.unwrap();
        assert_eq!(output.exit_code, 2);
    }

    #[tokio::test]
    async fn test_exec_missing_program() {
        let err = exec("nodepacker-no-such-program", &[], LIMIT)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::CommandFailed { exit_code: -1, .. }));
    }

    #[tokio::test]
    async fn test_exec_times_out() {
        let err = exec("sleep", &["5"], Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Timeout { .. }));
    }
}
