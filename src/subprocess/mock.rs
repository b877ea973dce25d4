use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::error::ProcessError;
use super::runner::{ExitStatus, ProcessCommand, ProcessOutput, ProcessRunner};

/// Scripted process runner for tests
///
/// Expectations are consumed in registration order: an expectation limited
/// with `times(n)` stops matching after `n` calls and the next matching one
/// takes over, which lets a test script "fail, fail, succeed" sequences.
#[derive(Clone)]
pub struct MockProcessRunner {
    expectations: Arc<Mutex<Vec<MockExpectation>>>,
    call_history: Arc<Mutex<Vec<ProcessCommand>>>,
}

#[derive(Clone, Copy, Debug)]
enum MockSpawnFailure {
    NotFound,
    PermissionDenied,
}

struct MockExpectation {
    program: String,
    #[allow(clippy::type_complexity)]
    args_matcher: Option<Box<dyn Fn(&[String]) -> bool + Send + Sync>>,
    response: ProcessOutput,
    spawn_failure: Option<MockSpawnFailure>,
    simulate_runtime: bool,
    times_called: usize,
    expected_times: Option<usize>,
}

impl MockExpectation {
    fn exhausted(&self) -> bool {
        self.expected_times
            .map(|expected| self.times_called >= expected)
            .unwrap_or(false)
    }
}

pub struct MockCommandConfig {
    runner: MockProcessRunner,
    expectation: MockExpectation,
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Self {
            expectations: Arc::new(Mutex::new(Vec::new())),
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn expect_command(&mut self, program: &str) -> MockCommandConfig {
        MockCommandConfig {
            runner: self.clone(),
            expectation: MockExpectation {
                program: program.to_string(),
                args_matcher: None,
                response: ProcessOutput {
                    status: ExitStatus::Success,
                    stdout: String::new(),
                    stderr: String::new(),
                    duration: Duration::from_millis(10),
                },
                spawn_failure: None,
                simulate_runtime: false,
                times_called: 0,
                expected_times: None,
            },
        }
    }

    pub fn verify_called(&self, program: &str, times: usize) -> bool {
        self.call_count(program) == times
    }

    pub fn call_count(&self, program: &str) -> usize {
        self.call_history
            .lock()
            .map(|history| history.iter().filter(|cmd| cmd.program == program).count())
            .unwrap_or(0)
    }

    pub fn get_call_history(&self) -> Vec<ProcessCommand> {
        self.call_history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    pub fn reset(&mut self) {
        if let Ok(mut expectations) = self.expectations.lock() {
            expectations.clear();
        }
        if let Ok(mut history) = self.call_history.lock() {
            history.clear();
        }
    }

    fn next_response(
        &self,
        command: &ProcessCommand,
    ) -> Result<(ProcessOutput, Option<MockSpawnFailure>, bool), ProcessError> {
        let mut expectations = self
            .expectations
            .lock()
            .map_err(|_| ProcessError::MockExpectationNotMet("mock state poisoned".into()))?;

        for expectation in expectations.iter_mut() {
            if expectation.program != command.program || expectation.exhausted() {
                continue;
            }

            if let Some(ref args_matcher) = expectation.args_matcher {
                if !(args_matcher)(&command.args) {
                    continue;
                }
            }

            expectation.times_called += 1;
            return Ok((
                expectation.response.clone(),
                expectation.spawn_failure,
                expectation.simulate_runtime,
            ));
        }

        Err(ProcessError::MockExpectationNotMet(format!(
            "No expectation left for command: {} {:?}",
            command.program, command.args
        )))
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        if let Ok(mut history) = self.call_history.lock() {
            history.push(command.clone());
        }

        let (response, spawn_failure, simulate_runtime) = self.next_response(&command)?;

        match spawn_failure {
            Some(MockSpawnFailure::NotFound) => {
                return Err(ProcessError::CommandNotFound(command.program))
            }
            Some(MockSpawnFailure::PermissionDenied) => {
                return Err(ProcessError::PermissionDenied(command.program))
            }
            None => {}
        }

        if simulate_runtime {
            tokio::time::sleep(response.duration).await;
        }

        Ok(response)
    }
}

impl MockCommandConfig {
    pub fn with_args<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&[String]) -> bool + Send + Sync + 'static,
    {
        self.expectation.args_matcher = Some(Box::new(matcher));
        self
    }

    pub fn returns_stdout(mut self, stdout: &str) -> Self {
        self.expectation.response.stdout = stdout.to_string();
        self
    }

    pub fn returns_stderr(mut self, stderr: &str) -> Self {
        self.expectation.response.stderr = stderr.to_string();
        self
    }

    pub fn returns_exit_code(mut self, code: i32) -> Self {
        self.expectation.response.status = ExitStatus::from_code(code);
        self
    }

    pub fn returns_success(mut self) -> Self {
        self.expectation.response.status = ExitStatus::Success;
        self
    }

    pub fn returns_timeout(mut self) -> Self {
        self.expectation.response.status = ExitStatus::Timeout;
        self
    }

    pub fn returns_signal(mut self, signal: i32) -> Self {
        self.expectation.response.status = ExitStatus::Signal(signal);
        self
    }

    pub fn fails_not_found(mut self) -> Self {
        self.expectation.spawn_failure = Some(MockSpawnFailure::NotFound);
        self
    }

    pub fn fails_permission_denied(mut self) -> Self {
        self.expectation.spawn_failure = Some(MockSpawnFailure::PermissionDenied);
        self
    }

    /// Make the call take `duration` on the tokio clock
    pub fn takes(mut self, duration: Duration) -> Self {
        self.expectation.response.duration = duration;
        self.expectation.simulate_runtime = true;
        self
    }

    pub fn times(mut self, n: usize) -> Self {
        self.expectation.expected_times = Some(n);
        self
    }

    pub fn finish(self) {
        if let Ok(mut expectations) = self.runner.expectations.lock() {
            expectations.push(self.expectation);
        }
    }
}

impl Default for MockProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}
