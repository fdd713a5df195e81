#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use llmstxt_gateway::{
    GenerateError, GenerationRequest, Generator, GeneratorConfig, JobInvocation, JobResult,
    JobRunner, ProcessDefaults, workspace::{artifact_file_name, full_artifact_file_name},
};
use tempfile::TempDir;
use url::Url;

#[macro_export]
macro_rules! assert_failures {
    (
        $(
            $test_name:ident : behavior => $behavior:expr, failure => $failure:pat
        ),+ $(,)?
    ) => {
        $(
            #[tokio::test]
            async fn $test_name() {
                let harness = Harness::with_timeout(
                    $behavior,
                    keyed_defaults(),
                    std::time::Duration::from_millis(200),
                );

                let result = harness.generator.generate(&request("https://www.example.com")).await;

                assert!(
                    matches!(result, Err($failure)),
                    "unexpected outcome: {result:?}"
                );
                assert_that(&harness.runner.invocation_count()).is_equal_to(1);
                assert_that(&harness.leftover_files()).is_equal_to(Vec::<String>::new());
            }
        )+
    }
}

/// What the simulated generator does when it is run.
#[derive(Clone, Debug)]
pub enum Behavior {
    /// Exit 0 after writing the artifact (and its companion) where the gateway expects it.
    WriteArtifact { content: String },
    /// Exit 0 after writing the artifact under a name the gateway does not expect.
    WriteElsewhere,
    /// Exit with the given code and stderr, leaving a partial artifact behind.
    Exit { code: i32, stderr: String },
    /// Run longer than the budget allows.
    Hang { duration: Duration },
    /// Keep running past the budget without enforcing it, like a runner whose process
    /// exited but whose pipes never close.
    IgnoreBudget { duration: Duration },
}

/// A `JobRunner` double that records invocations and simulates the generator.
pub struct StubJobRunner {
    behavior: Behavior,
    invocations: Mutex<Vec<JobInvocation>>,
    terminated: AtomicBool,
    completed: AtomicBool,
}

impl StubJobRunner {
    pub fn new(behavior: Behavior) -> Self {
        StubJobRunner {
            behavior,
            invocations: Mutex::new(Vec::new()),
            terminated: AtomicBool::new(false),
            completed: AtomicBool::new(false),
        }
    }

    pub fn invocations(&self) -> Vec<JobInvocation> {
        self.invocations.lock().expect("invocations mutex").clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations().len()
    }

    pub fn terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Whether a run went all the way to its end instead of being dropped.
    pub fn completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }
}

fn flag_value<'a>(invocation: &'a JobInvocation, flag: &str) -> &'a str {
    invocation
        .args
        .iter()
        .position(|arg| arg == flag)
        .and_then(|index| invocation.args.get(index + 1))
        .map(String::as_str)
        .expect("flag present")
}

fn target_url(invocation: &JobInvocation) -> Url {
    Url::parse(invocation.args.get(1).expect("positional url")).expect("valid url")
}

#[async_trait]
impl JobRunner for StubJobRunner {
    async fn run(&self, invocation: JobInvocation) -> Result<JobResult, GenerateError> {
        self.invocations
            .lock()
            .expect("invocations mutex")
            .push(invocation.clone());

        let output_dir = PathBuf::from(flag_value(&invocation, "--output-dir"));
        let url = target_url(&invocation);

        match &self.behavior {
            Behavior::WriteArtifact { content } => {
                std::fs::write(output_dir.join(artifact_file_name(&url)), content)
                    .expect("write artifact");
                std::fs::write(output_dir.join(full_artifact_file_name(&url)), content)
                    .expect("write full artifact");
                Ok(exited(0, ""))
            }
            Behavior::WriteElsewhere => {
                std::fs::write(output_dir.join("unexpected-llms.txt"), "lost")
                    .expect("write stray artifact");
                Ok(exited(0, ""))
            }
            Behavior::Exit { code, stderr } => {
                std::fs::write(output_dir.join(artifact_file_name(&url)), "partial")
                    .expect("write partial artifact");
                Ok(exited(*code, stderr))
            }
            Behavior::Hang { duration } => {
                if *duration <= invocation.timeout {
                    tokio::time::sleep(*duration).await;
                    return Ok(exited(0, ""));
                }
                tokio::time::sleep(invocation.timeout).await;
                self.terminated.store(true, Ordering::SeqCst);
                Err(GenerateError::Timeout {
                    budget: invocation.timeout,
                })
            }
            Behavior::IgnoreBudget { duration } => {
                tokio::time::sleep(*duration).await;
                self.completed.store(true, Ordering::SeqCst);
                Ok(exited(0, ""))
            }
        }
    }
}

fn exited(exit_code: i32, stderr: &str) -> JobResult {
    JobResult {
        exit_code,
        stdout: String::new(),
        stderr: stderr.to_owned(),
    }
}

/// A generator wired to a stub runner and scratch directories.
pub struct Harness {
    pub scratch: TempDir,
    pub runner: Arc<StubJobRunner>,
    pub generator: Arc<Generator>,
}

impl Harness {
    pub fn new(behavior: Behavior, defaults: ProcessDefaults) -> Self {
        Self::with_timeout(behavior, defaults, Duration::from_secs(5))
    }

    pub fn with_timeout(behavior: Behavior, defaults: ProcessDefaults, timeout: Duration) -> Self {
        let scratch = tempfile::tempdir().expect("tempdir");
        let runner = Arc::new(StubJobRunner::new(behavior));
        let config = GeneratorConfig {
            script_dir: scratch.path().join("fc-py"),
            output_dir: scratch.path().join("temp"),
            timeout,
            ..GeneratorConfig::default()
        };
        let generator = Arc::new(Generator::new(config, defaults, runner.clone()));

        Harness {
            scratch,
            runner,
            generator,
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.scratch.path().join("temp")
    }

    /// Names of the files still present in the output directory, except stray ones.
    pub fn leftover_files(&self) -> Vec<String> {
        list_files(&self.output_dir())
            .into_iter()
            .filter(|name| name != "unexpected-llms.txt")
            .collect()
    }
}

fn list_files(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

pub fn keyed_defaults() -> ProcessDefaults {
    ProcessDefaults {
        firecrawl_api_key: Some("fc-default".to_owned()),
        openai_api_key: Some("sk-default".to_owned()),
        firecrawl_base_url: None,
    }
}

pub fn request(url: &str) -> GenerationRequest {
    GenerationRequest {
        url: url.to_owned(),
        ..GenerationRequest::default()
    }
}
