use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::{Rasterizer, RenderRequest};
use crate::errors::{RasterizeError, RasterizeResult};

/// Rasterizer that pipes the SVG through an external `rsvg-convert`
///
/// The child reads the source on stdin and writes PNG on stdout. It is
/// killed if it outlives `timeout`.
#[derive(Debug, Clone)]
pub struct RsvgConvertRasterizer {
    command: String,
    timeout: Duration,
}

impl RsvgConvertRasterizer {
    pub fn new<S: Into<String>>(command: S, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    fn arguments(request: &RenderRequest) -> Vec<String> {
        let side = request.side().to_string();
        let mut args = vec![
            "--format".to_string(),
            "png".to_string(),
            "--width".to_string(),
            side.clone(),
            "--height".to_string(),
            side,
        ];
        if !request.background.is_empty() {
            args.push(format!("--background-color=#{}", request.background));
        }
        args
    }
}

#[async_trait::async_trait]
impl Rasterizer for RsvgConvertRasterizer {
    async fn render(&self, source: &[u8], request: &RenderRequest) -> RasterizeResult<Vec<u8>> {
        let args = Self::arguments(request);
        debug!("Running {} {}", self.command, args.join(" "));

        let mut child = Command::new(&self.command)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RasterizeError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        // stdin is fed while stdout drains
        let mut stdin = child.stdin.take().ok_or_else(|| RasterizeError::Spawn {
            command: self.command.clone(),
            source: std::io::Error::other("stdin was not captured"),
        })?;
        let input = source.to_vec();
        let writer = tokio::spawn(async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        });

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| RasterizeError::Spawn {
                command: self.command.clone(),
                source,
            })?,
            Err(_) => {
                writer.abort();
                return Err(RasterizeError::TimedOut {
                    command: self.command.clone(),
                    timeout: self.timeout,
                });
            }
        };

        if let Ok(Err(e)) = writer.await {
            // A failed write usually surfaces as a bad exit status below
            warn!("Writing SVG to {} failed: {}", self.command, e);
        }

        if !output.status.success() {
            return Err(RasterizeError::Failed {
                command: self.command.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if output.stdout.is_empty() {
            return Err(RasterizeError::EmptyOutput);
        }
        Ok(output.stdout)
    }

    fn name(&self) -> &'static str {
        "rsvg-convert"
    }
}
