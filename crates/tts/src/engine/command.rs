use std::{path::Path, process::Stdio, time::Duration};

use async_trait::async_trait;
use tokio::process::Command;
use vocalis_config::CommandEngineConfig;

use super::{EngineError, SynthesisEngine, ensure_audio};
use crate::params::SynthesisRequest;

/// Keep this many trailing bytes of stderr for the failure detail
const STDERR_TAIL: usize = 512;

/// Runs a command-line synthesizer once per request
///
/// Each argument template is rendered in a single pass, so values that
/// themselves contain `{...}` are never expanded again. Arguments are passed
/// directly to the process without a shell.
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandEngine {
    pub fn new(config: &CommandEngineConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            timeout: config.timeout.get(),
        }
    }

    fn render_args(&self, request: &SynthesisRequest, output: &Path) -> Vec<String> {
        let output = output.to_string_lossy();

        self.args
            .iter()
            .map(|template| {
                render(template, |name| match name {
                    "text" => Some(request.text()),
                    "voice" => Some(request.voice()),
                    "rate" => Some(request.rate()),
                    "pitch" => Some(request.pitch()),
                    "output" => Some(output.as_ref()),
                    _ => None,
                })
            })
            .collect()
    }
}

#[async_trait]
impl SynthesisEngine for CommandEngine {
    async fn synthesize(&self, request: &SynthesisRequest, output: &Path) -> Result<(), EngineError> {
        let args = self.render_args(request, output);

        tracing::debug!(
            program = %self.program,
            voice = request.voice(),
            text_len = request.text().len(),
            "running synthesis command"
        );

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let result = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| EngineError::Timeout(self.timeout))??;

        if !result.status.success() {
            let stderr = stderr_tail(&result.stderr);
            tracing::warn!(program = %self.program, status = %result.status, "synthesis command failed: {stderr}");

            return Err(EngineError::Failed(if stderr.is_empty() {
                format!("{} exited with {}", self.program, result.status)
            } else {
                format!("{} exited with {}: {stderr}", self.program, result.status)
            }));
        }

        ensure_audio(output).await
    }

    fn name(&self) -> &str {
        "command"
    }
}

/// Substitute `{name}` placeholders; unknown names are kept verbatim
fn render<'a>(template: &str, lookup: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match after.find('}').and_then(|close| lookup(&after[..close]).map(|value| (close, value))) {
            Some((close, value)) => {
                rendered.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                rendered.push('{');
                rest = after;
            }
        }
    }

    rendered.push_str(rest);
    rendered
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();

    if text.len() <= STDERR_TAIL {
        return text.to_string();
    }

    let mut start = text.len() - STDERR_TAIL;
    while !text.is_char_boundary(start) {
        start += 1;
    }

    text[start..].to_string()
}
