//! Bounded execution of external commands.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::AdapterError;

/// Run `program args..`, returning stdout.
///
/// The child is killed if the timeout expires or the future is dropped.
pub(crate) async fn run(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<String, AdapterError> {
    let command_line = format!("{} {}", program, args.join(" "));

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(timeout, child).await {
        Err(_) => return Err(AdapterError::Timeout(timeout)),
        Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
            return Err(AdapterError::Unavailable(format!("{} not found", program)));
        }
        Ok(Err(e)) => {
            return Err(AdapterError::Command {
                command: command_line,
                stderr: e.to_string(),
            });
        }
        Ok(Ok(output)) => output,
    };

    if !output.status.success() {
        return Err(AdapterError::Command {
            command: command_line,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    String::from_utf8(output.stdout).map_err(|e| AdapterError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let result = run(
            "homewatch-definitely-not-a-binary",
            &[],
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(result, Err(AdapterError::Unavailable(_))));
    }
}
