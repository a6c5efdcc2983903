//! Local tooling checks run before any remote call

use crate::error::{Error, Result};
use tokio::process::Command;
use tracing::debug;

/// A local program the audit cannot run without
#[derive(Debug, Clone)]
pub struct RequiredTool {
    pub program: String,
    pub probe_args: Vec<String>,
}

impl RequiredTool {
    pub fn new(program: impl Into<String>, probe_args: &[&str]) -> Self {
        Self {
            program: program.into(),
            probe_args: probe_args.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn verify_command(&self) -> String {
        format!("command -v {} && {} {}", self.program, self.program, self.probe_args.join(" "))
    }
}

/// Fail on the first tool that cannot be executed
pub async fn check_tools(tools: &[RequiredTool]) -> Result<()> {
    for tool in tools {
        let status = Command::new(&tool.program)
            .args(&tool.probe_args)
            .output()
            .await;

        match status {
            Ok(output) if output.status.success() => {
                debug!("Found required tool {}", tool.program);
            }
            Ok(output) => {
                return Err(Error::MissingTool {
                    tool: format!(
                        "{} (probe exited with {})",
                        tool.program, output.status
                    ),
                    verify: tool.verify_command(),
                });
            }
            Err(e) => {
                return Err(Error::MissingTool {
                    tool: format!("{} ({})", tool.program, e),
                    verify: tool.verify_command(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_missing_tool() {
        let tools = [RequiredTool::new("definitely-not-a-real-binary-xyz", &["--version"])];
        let err = check_tools(&tools).await.unwrap_err();

        assert_matches!(err, Error::MissingTool { .. });
        assert_eq!(
            err.verify_command(),
            Some("command -v definitely-not-a-real-binary-xyz && definitely-not-a-real-binary-xyz --version")
        );
    }

    #[tokio::test]
    async fn test_empty_tool_list() {
        assert!(check_tools(&[]).await.is_ok());
    }
}
