use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::command::CommandOutput;
use super::process::{ProcessCommand, ProcessError, ProcessRunner};

/// Scripted process runner. Expectations are matched in registration order;
/// one limited with `times` stops matching once used up.
#[derive(Clone, Default)]
pub struct MockProcessRunner {
    expectations: Arc<Mutex<Vec<MockExpectation>>>,
    call_history: Arc<Mutex<Vec<ProcessCommand>>>,
}

struct MockExpectation {
    program: String,
    args_prefix: Vec<String>,
    response: Result<CommandOutput, ProcessError>,
    times_called: usize,
    expected_times: Option<usize>,
}

pub struct MockCommandConfig {
    runner: MockProcessRunner,
    expectation: MockExpectation,
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect `program` invoked with arguments starting with `args_prefix`.
    pub fn expect(&self, program: &str, args_prefix: &[&str]) -> MockCommandConfig {
        MockCommandConfig {
            runner: self.clone(),
            expectation: MockExpectation {
                program: program.to_string(),
                args_prefix: args_prefix.iter().map(|a| a.to_string()).collect(),
                response: Ok(CommandOutput::completed(0, "", "")),
                times_called: 0,
                expected_times: None,
            },
        }
    }

    pub fn get_call_history(&self) -> Vec<ProcessCommand> {
        self.call_history.lock().unwrap().clone()
    }

    /// Whether any recorded call had arguments starting with `args_prefix`.
    pub fn was_called_with(&self, program: &str, args_prefix: &[&str]) -> bool {
        self.get_call_history()
            .iter()
            .any(|cmd| cmd.program == program && starts_with(&cmd.args, args_prefix))
    }
}

fn starts_with<S: AsRef<str>>(args: &[String], prefix: &[S]) -> bool {
    args.len() >= prefix.len()
        && args
            .iter()
            .zip(prefix.iter())
            .all(|(a, p)| a == p.as_ref())
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<CommandOutput, ProcessError> {
        self.call_history.lock().unwrap().push(command.clone());

        let mut expectations = self.expectations.lock().unwrap();
        for expectation in expectations.iter_mut() {
            if expectation.program != command.program
                || !starts_with(&command.args, &expectation.args_prefix)
            {
                continue;
            }
            if let Some(limit) = expectation.expected_times {
                if expectation.times_called >= limit {
                    continue;
                }
            }
            expectation.times_called += 1;
            return expectation.response.clone();
        }

        Err(ProcessError::MockExpectationNotMet(format!(
            "No expectation found for command: {}",
            command.display()
        )))
    }
}

impl MockCommandConfig {
    pub fn returns(mut self, exit_code: i32, stdout: &str, stderr: &str) -> Self {
        self.expectation.response = Ok(CommandOutput::completed(exit_code, stdout, stderr));
        self
    }

    pub fn returns_error(mut self, error: ProcessError) -> Self {
        self.expectation.response = Err(error);
        self
    }

    pub fn times(mut self, n: usize) -> Self {
        self.expectation.expected_times = Some(n);
        self
    }

    pub fn finish(self) {
        self.runner
            .expectations
            .lock()
            .unwrap()
            .push(self.expectation);
    }
}
