//! Backend that shells out to the `p4` command-line client

use std::process::Stdio;
use std::time::Duration;

use serde::de::DeserializeOwned;
use streamline_core::{AnnotateResult, BackendConfig, ChangeNumber, ChangelistDescription, Commit, StreamNode};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::backend::{BackendError, BackendResult, VcsBackend};
use crate::schema::{
    decode_annotate, decode_change, decode_describe, decode_stream, RawAnnotate, RawChange, RawDescribe, RawMessage,
    RawStream,
};

/// First line of the diff section in untagged `describe` output.
const DIFF_BANNER: &str = "Differences ...";

pub struct P4Backend {
    bin: String,
    port: Option<String>,
    user: Option<String>,
    client: Option<String>,
    timeout: Duration,
}

impl P4Backend {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            bin: config.p4_bin.clone(),
            port: config.port.clone(),
            user: config.user.clone(),
            client: config.client.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn command(&self, tagged: bool, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.bin);
        if let Some(port) = &self.port {
            cmd.args(["-p", port.as_str()]);
        }
        if let Some(user) = &self.user {
            cmd.args(["-u", user.as_str()]);
        }
        if let Some(client) = &self.client {
            cmd.args(["-c", client.as_str()]);
        }
        if tagged {
            cmd.args(["-ztag", "-Mj"]);
        }
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn run(&self, tagged: bool, args: &[&str]) -> BackendResult<String> {
        let label = format!("p4 {}", args.join(" "));
        debug!("running {}", label);

        let output = tokio::time::timeout(self.timeout, self.command(tagged, args).output())
            .await
            .map_err(|_| BackendError::Timeout {
                command: label.clone(),
                elapsed: self.timeout,
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(BackendError::Command {
                command: label,
                message: if stderr.is_empty() {
                    format!("exit status {}", output.status)
                } else {
                    stderr
                },
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run a tagged command and deserialize each JSON line into `T`.
    async fn run_tagged<T: DeserializeOwned>(&self, args: &[&str]) -> BackendResult<Vec<T>> {
        let stdout = self.run(true, args).await?;
        parse_tagged(&stdout).map_err(|err| match err {
            BackendError::Command { message, .. } => BackendError::Command {
                command: format!("p4 {}", args.join(" ")),
                message,
            },
            other => other,
        })
    }
}

/// Split `-Mj` output into records, surfacing the first error record.
pub(crate) fn parse_tagged<T: DeserializeOwned>(stdout: &str) -> BackendResult<Vec<T>> {
    let mut records = Vec::new();
    for line in stdout.lines().filter(|line| !line.trim().is_empty()) {
        let value: serde_json::Value = serde_json::from_str(line)?;
        if value.get("code").is_some() {
            let message: RawMessage = serde_json::from_value(value)?;
            if message.is_error() {
                return Err(BackendError::Command {
                    command: "p4".to_string(),
                    message: message.data.unwrap_or_default().trim().to_string(),
                });
            }
            continue;
        }
        records.push(serde_json::from_value(value)?);
    }
    Ok(records)
}

/// Everything from the `Differences ...` banner on; empty when the change
/// has no diffable files.
pub(crate) fn diff_section(describe: &str) -> String {
    match describe.find(DIFF_BANNER) {
        Some(start) => describe[start..].to_string(),
        None => String::new(),
    }
}

#[async_trait::async_trait]
impl VcsBackend for P4Backend {
    async fn describe_changelist(&self, number: ChangeNumber) -> BackendResult<ChangelistDescription> {
        let change = number.to_string();
        let tagged_args = ["describe", "-s", change.as_str()];
        let diff_args = ["describe", "-du", change.as_str()];
        let (records, untagged) = tokio::try_join!(
            self.run_tagged::<RawDescribe>(&tagged_args),
            self.run(false, &diff_args),
        )?;

        let raw = records
            .first()
            .ok_or_else(|| BackendError::NotFound(format!("change {number}")))?;
        Ok(decode_describe(raw, diff_section(&untagged))?)
    }

    async fn annotate_file(&self, depot_path: &str) -> BackendResult<AnnotateResult> {
        match self.run_tagged::<RawAnnotate>(&["annotate", "-c", "-u", depot_path]).await {
            Ok(records) => Ok(decode_annotate(&records)?),
            Err(BackendError::Command { message, .. }) => {
                warn!("annotate {} failed: {}", depot_path, message);
                Ok(AnnotateResult::failed(message))
            }
            Err(err) => Err(err),
        }
    }

    async fn list_submitted_changes(&self, branch_path: &str, limit: usize) -> BackendResult<Vec<Commit>> {
        let max = limit.to_string();
        let filespec = format!("{}/...", branch_path.trim_end_matches('/'));
        let records = self
            .run_tagged::<RawChange>(&["changes", "-s", "submitted", "-l", "-m", &max, &filespec])
            .await?;
        Ok(records.iter().map(decode_change).collect::<Result<_, _>>()?)
    }

    async fn list_streams(&self, depot: &str) -> BackendResult<Vec<StreamNode>> {
        let filespec = format!("{}/...", depot.trim_end_matches('/'));
        let records = self.run_tagged::<RawStream>(&["streams", &filespec]).await?;
        Ok(records.iter().map(decode_stream).collect::<Result<_, _>>()?)
    }

    fn name(&self) -> &str {
        "p4"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_section_starts_at_banner() {
        let out = "Change 12 by alice@ws on 2024/01/01\n\n\tFix\n\nAffected files ...\n\n... //depot/a.c#2 edit\n\nDifferences ...\n\n==== //depot/a.c#2 (text) ====\n";
        assert!(diff_section(out).starts_with("Differences ...\n"));
        assert_eq!(diff_section("Change 1 by a@b\n"), "");
    }

    #[test]
    fn tagged_output_surfaces_errors() {
        let out = "{\"code\":\"error\",\"data\":\"//depot/nope/... - no such file(s).\\n\",\"severity\":2}\n";
        let err = parse_tagged::<RawChange>(out).unwrap_err();
        assert!(matches!(err, BackendError::Command { ref message, .. } if message.ends_with("no such file(s).")));
    }

    #[test]
    fn tagged_output_skips_info_records() {
        let out = "{\"code\":\"info\",\"data\":\"note\"}\n{\"change\":\"3\",\"user\":\"a\"}\n\n";
        let records = parse_tagged::<RawChange>(out).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn missing_binary_is_an_io_error() {
        let backend = P4Backend::new(&BackendConfig {
            p4_bin: "/nonexistent/streamline-p4".to_string(),
            ..BackendConfig::default()
        });
        let err = backend.list_streams("//depot").await.unwrap_err();
        assert!(matches!(err, BackendError::Io(_)));

        let err = backend.describe_changelist(12).await.unwrap_err();
        assert!(matches!(err, BackendError::Io(_)));
    }
}
