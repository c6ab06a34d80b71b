// src/exec/output.rs

//! Re-emit captured child output as log events tagged with the child label.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout};
use tracing::{debug, info, warn};

/// Spawn background readers for whichever pipes are present.
///
/// Both pipes are always drained so a chatty child never blocks on a full
/// buffer.
pub fn forward_output(label: &str, stdout: Option<ChildStdout>, stderr: Option<ChildStderr>) {
    if let Some(stdout) = stdout {
        let label = label.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(label = %label, "stdout: {}", line);
            }
            debug!(label = %label, "stdout closed");
        });
    }

    if let Some(stderr) = stderr {
        let label = label.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                warn!(label = %label, "stderr: {}", line);
            }
            debug!(label = %label, "stderr closed");
        });
    }
}
