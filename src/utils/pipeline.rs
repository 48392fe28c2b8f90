use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};

use anyhow::{bail, Context};
use itertools::Itertools;
use log::debug;

/// One stage of a child-process pipeline: a program plus its arguments.
#[derive(Clone, Debug)]
pub struct Stage {
    program: String,
    args: Vec<String>,
}

impl Stage {
    pub fn new(program: impl Into<String>) -> Stage {
        Stage {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Stage {
        self.args.push(arg.into());
        self
    }

    /// Command line as the user would type it, for error messages
    pub fn describe(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.iter().join(" "))
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// Output of a completed pipeline: the last stage's stdout plus the exit
/// status of every stage, in stage order.
#[derive(Debug)]
pub struct PipelineOutput {
    pub stdout: Vec<u8>,
    pub statuses: Vec<ExitStatus>,
}

/// An ordered chain of external commands. Stage N's stdout feeds stage N+1's
/// stdin; the final stdout is captured. All stages are awaited before the
/// output is handed back, and a nonzero exit in any stage is an error naming
/// that stage, so a failure deep in the chain cannot pass silently.
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Pipeline {
        Pipeline { stages: Vec::new() }
    }

    pub fn stage(mut self, stage: Stage) -> Pipeline {
        self.stages.push(stage);
        self
    }

    /// All stages joined with " | ", for messages
    pub fn describe(&self) -> String {
        self.stages.iter().map(|s| s.describe()).join(" | ")
    }

    /// Spawn the whole chain, capture the final stdout, then reap every
    /// stage. Stderr of each stage goes to the caller's stderr.
    pub fn run(&self) -> anyhow::Result<PipelineOutput> {
        if self.stages.is_empty() {
            bail!("empty pipeline");
        }
        debug!("Running pipeline: {}", self.describe());

        let mut children: Vec<Child> = Vec::with_capacity(self.stages.len());
        for (i, stage) in self.stages.iter().enumerate() {
            let stdin = if let Some(prev) = children.last_mut() {
                let upstream = prev
                    .stdout
                    .take()
                    .expect("stdout of previous stage was already taken");
                Stdio::from(upstream)
            } else {
                Stdio::null()
            };
            let child = stage
                .command()
                .stdin(stdin)
                .stdout(Stdio::piped())
                .spawn()
                .with_context(|| {
                    format!(
                        "failed to start '{}' (stage {} of pipeline '{}'); is it installed and in $PATH?",
                        stage.program,
                        i + 1,
                        self.describe()
                    )
                })?;
            children.push(child);
        }

        // Drain the final stdout first; this is what drives the upstream
        // stages to completion without any pipe filling up.
        let mut stdout = Vec::new();
        let mut last_out = children
            .last_mut()
            .unwrap()
            .stdout
            .take()
            .expect("stdout of final stage was already taken");
        last_out
            .read_to_end(&mut stdout)
            .context("failed reading pipeline output")?;

        let mut statuses = Vec::with_capacity(children.len());
        for (child, stage) in children.iter_mut().zip(&self.stages) {
            let status = child
                .wait()
                .with_context(|| format!("failed waiting for '{}'", stage.describe()))?;
            statuses.push(status);
        }

        for (status, stage) in statuses.iter().zip(&self.stages) {
            if !status.success() {
                bail!(
                    "'{}' exited with {} in pipeline '{}'",
                    stage.describe(),
                    status,
                    self.describe()
                );
            }
        }

        Ok(PipelineOutput { stdout, statuses })
    }
}

/// Run one stage and return only the first line of its stdout, or None if it
/// produced nothing. The child is terminated once the line is read, so this
/// is safe to use for peeking at arbitrarily large outputs.
pub fn first_stdout_line(stage: &Stage) -> anyhow::Result<Option<String>> {
    debug!("Reading first output line of: {}", stage.describe());
    let mut child = stage
        .command()
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .spawn()
        .with_context(|| {
            format!(
                "failed to start '{}'; is it installed and in $PATH?",
                stage.program
            )
        })?;

    let out = child
        .stdout
        .take()
        .expect("piped stdout was already taken");
    let mut line = String::new();
    let n = BufReader::new(out)
        .read_line(&mut line)
        .with_context(|| format!("failed reading output of '{}'", stage.describe()))?;

    // May still be streaming; we have what we came for
    let _ = child.kill();
    let _ = child.wait();

    if n == 0 {
        Ok(None)
    } else {
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }
}
