//! Scripted mock thread service for testing.

use super::{AssistantError, FunctionCall, Run, RunOutput, RunStatus, ThreadService};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Mock thread service that replays a fixed script of run observations.
///
/// Each `get_run` call returns the next scripted entry; once the script is
/// exhausted the last entry repeats, so a single non-terminal entry models
/// a run that never finishes.
pub struct MockThreadService {
    script: Vec<Run>,
    cursor: AtomicUsize,
    threads_created: AtomicUsize,
    messages_created: AtomicUsize,
    runs_created: AtomicUsize,
    run_queries: AtomicUsize,
    function_calls: Mutex<Vec<Option<String>>>,
}

impl MockThreadService {
    pub fn new(script: Vec<Run>) -> Self {
        Self {
            script,
            cursor: AtomicUsize::new(0),
            threads_created: AtomicUsize::new(0),
            messages_created: AtomicUsize::new(0),
            runs_created: AtomicUsize::new(0),
            run_queries: AtomicUsize::new(0),
            function_calls: Mutex::new(Vec::new()),
        }
    }

    /// A service whose runs complete immediately with the given reply.
    pub fn with_reply(reply: &str) -> Self {
        Self::new(vec![Self::run(RunStatus::Completed, Some(reply), None)])
    }

    /// Build a scripted run observation.
    pub fn run(status: RunStatus, reply: Option<&str>, last_error: Option<&str>) -> Run {
        Run {
            id: "run-mock".to_string(),
            status,
            outputs: reply
                .map(|text| {
                    vec![RunOutput {
                        text: text.to_string(),
                    }]
                })
                .unwrap_or_default(),
            last_error: last_error.map(str::to_string),
        }
    }

    pub fn threads_created(&self) -> usize {
        self.threads_created.load(Ordering::SeqCst)
    }

    pub fn messages_created(&self) -> usize {
        self.messages_created.load(Ordering::SeqCst)
    }

    pub fn runs_created(&self) -> usize {
        self.runs_created.load(Ordering::SeqCst)
    }

    /// Number of `get_run` status queries observed.
    pub fn run_queries(&self) -> usize {
        self.run_queries.load(Ordering::SeqCst)
    }

    /// Function-call names attached to each created run, in order.
    pub fn function_calls(&self) -> Vec<Option<String>> {
        self.function_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ThreadService for MockThreadService {
    async fn create_thread(&self) -> Result<String, AssistantError> {
        let n = self.threads_created.fetch_add(1, Ordering::SeqCst);
        Ok(format!("thread-mock-{}", n))
    }

    async fn create_message(
        &self,
        _thread_id: &str,
        _role: &str,
        _content: &str,
    ) -> Result<String, AssistantError> {
        let n = self.messages_created.fetch_add(1, Ordering::SeqCst);
        Ok(format!("msg-mock-{}", n))
    }

    async fn create_run(
        &self,
        _thread_id: &str,
        _assistant_id: &str,
        function_call: Option<FunctionCall>,
    ) -> Result<Run, AssistantError> {
        self.runs_created.fetch_add(1, Ordering::SeqCst);
        self.function_calls
            .lock()
            .unwrap()
            .push(function_call.map(|f| f.name));

        Ok(Self::run(RunStatus::Queued, None, None))
    }

    async fn get_run(&self, _thread_id: &str, _run_id: &str) -> Result<Run, AssistantError> {
        self.run_queries.fetch_add(1, Ordering::SeqCst);

        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        let observation = self
            .script
            .get(index)
            .or_else(|| self.script.last())
            .ok_or_else(|| {
                AssistantError::InvalidResponse("mock script is empty".to_string())
            })?;

        Ok(observation.clone())
    }

    async fn health_check(&self) -> Result<(), AssistantError> {
        Ok(())
    }
}
