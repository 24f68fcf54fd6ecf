// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory agent service with a scripted run lifecycle.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use parley_core::types::{AdapterType, AgentRun, AgentThread, MessagePart, ThreadMessage};
use parley_core::{AgentConnector, AgentService, ParleyError, RunStatus, ServiceAdapter};

/// Which call of the run lifecycle should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    CreateThread,
    CreateMessage,
    CreateRun,
    GetRun,
    CancelRun,
    ListMessages,
}

/// An [`AgentService`] that plays back run statuses from a queue.
///
/// `get_run` pops the next status; once one status is left it repeats
/// forever. Replies are attached to the most recent run.
///
/// Like the hosted service, a run holds its thread until it reaches a
/// terminal status: posting a message or starting a run there fails with 400.
pub struct MockAgentService {
    statuses: Mutex<VecDeque<RunStatus>>,
    last_error: Option<String>,
    reply: Option<Vec<MessagePart>>,
    foreign_reply: Option<String>,
    poll_delay: Option<Duration>,
    fail_at: Option<FailAt>,
    cancel_status: RunStatus,
    active: Mutex<Option<(String, String)>>,
    posted: Mutex<Vec<(String, String)>>,
    threads: AtomicUsize,
    runs: AtomicUsize,
    polls: AtomicUsize,
    lists: AtomicUsize,
    cancels: AtomicUsize,
}

impl Default for MockAgentService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAgentService {
    /// Runs complete on the first poll and reply `"Hello from the agent"`.
    pub fn new() -> Self {
        Self {
            statuses: Mutex::new(VecDeque::from([RunStatus::Completed])),
            last_error: None,
            reply: Some(vec![MessagePart::Text("Hello from the agent".into())]),
            foreign_reply: None,
            poll_delay: None,
            fail_at: None,
            cancel_status: RunStatus::Cancelled,
            active: Mutex::new(None),
            posted: Mutex::new(Vec::new()),
            threads: AtomicUsize::new(0),
            runs: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            lists: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
        }
    }

    /// Statuses returned by successive `get_run` calls.
    pub fn with_statuses(self, statuses: impl IntoIterator<Item = RunStatus>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into_iter().collect();
        self
    }

    pub fn with_last_error(mut self, detail: &str) -> Self {
        self.last_error = Some(detail.to_string());
        self
    }

    pub fn with_reply(mut self, text: &str) -> Self {
        self.reply = Some(vec![MessagePart::Text(text.to_string())]);
        self
    }

    pub fn with_reply_parts(mut self, parts: Vec<MessagePart>) -> Self {
        self.reply = Some(parts);
        self
    }

    /// No assistant message belongs to the run.
    pub fn without_reply(mut self) -> Self {
        self.reply = None;
        self
    }

    /// An assistant message from some other run, listed newest.
    pub fn with_foreign_reply(mut self, text: &str) -> Self {
        self.foreign_reply = Some(text.to_string());
        self
    }

    /// Every `get_run` sleeps this long first.
    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = Some(delay);
        self
    }

    pub fn failing_at(mut self, step: FailAt) -> Self {
        self.fail_at = Some(step);
        self
    }

    /// Status `cancel_run` reports. Non-terminal statuses keep the thread held.
    pub fn with_cancel_status(mut self, status: RunStatus) -> Self {
        self.cancel_status = status;
        self
    }

    pub fn threads_created(&self) -> usize {
        self.threads.load(Ordering::SeqCst)
    }

    pub fn runs_created(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    /// `(thread_id, run_id)` of the run currently holding a thread.
    pub fn active_run(&self) -> Option<(String, String)> {
        self.active.lock().unwrap().clone()
    }

    /// `(thread_id, content)` of every posted user message.
    pub fn posted(&self) -> Vec<(String, String)> {
        self.posted.lock().unwrap().clone()
    }

    fn check(&self, step: FailAt) -> Result<(), ParleyError> {
        if self.fail_at == Some(step) {
            return Err(ParleyError::Service {
                message: format!("{step:?} rejected"),
                status: Some(500),
                source: None,
            });
        }
        Ok(())
    }

    fn ensure_idle(&self, thread_id: &str) -> Result<(), ParleyError> {
        match self.active.lock().unwrap().as_ref() {
            Some((thread, run)) if thread == thread_id => Err(ParleyError::Service {
                message: format!("thread {thread_id} already has an active run {run}"),
                status: Some(400),
                source: None,
            }),
            _ => Ok(()),
        }
    }

    fn settle(&self, status: &RunStatus) {
        if status.is_terminal() {
            *self.active.lock().unwrap() = None;
        }
    }

    fn current_run(&self, thread_id: &str) -> AgentRun {
        let status = {
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.len() > 1 {
                statuses.pop_front().unwrap_or(RunStatus::Completed)
            } else {
                statuses.front().cloned().unwrap_or(RunStatus::Completed)
            }
        };
        let last_error = match status {
            RunStatus::Failed | RunStatus::Expired | RunStatus::Cancelled => {
                self.last_error.clone()
            }
            _ => None,
        };
        AgentRun {
            id: format!("run_{}", self.runs_created()),
            thread_id: thread_id.to_string(),
            status,
            last_error,
        }
    }
}

#[async_trait]
impl ServiceAdapter for MockAgentService {
    fn name(&self) -> &str {
        "mock-agents"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::AgentService
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        Ok(())
    }
}

#[async_trait]
impl AgentService for MockAgentService {
    async fn create_thread(&self) -> Result<AgentThread, ParleyError> {
        self.check(FailAt::CreateThread)?;
        let n = self.threads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(AgentThread {
            id: format!("thread_{n}"),
        })
    }

    async fn create_message(&self, thread_id: &str, content: &str) -> Result<(), ParleyError> {
        self.check(FailAt::CreateMessage)?;
        self.ensure_idle(thread_id)?;
        self.posted
            .lock()
            .unwrap()
            .push((thread_id.to_string(), content.to_string()));
        Ok(())
    }

    async fn create_run(&self, thread_id: &str, _agent_id: &str) -> Result<AgentRun, ParleyError> {
        self.check(FailAt::CreateRun)?;
        self.ensure_idle(thread_id)?;
        let n = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        *self.active.lock().unwrap() = Some((thread_id.to_string(), format!("run_{n}")));
        Ok(AgentRun {
            id: format!("run_{n}"),
            thread_id: thread_id.to_string(),
            status: RunStatus::Queued,
            last_error: None,
        })
    }

    async fn get_run(&self, thread_id: &str, _run_id: &str) -> Result<AgentRun, ParleyError> {
        if let Some(delay) = self.poll_delay {
            tokio::time::sleep(delay).await;
        }
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.check(FailAt::GetRun)?;
        let run = self.current_run(thread_id);
        self.settle(&run.status);
        Ok(run)
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<AgentRun, ParleyError> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.check(FailAt::CancelRun)?;
        self.settle(&self.cancel_status);
        Ok(AgentRun {
            id: run_id.to_string(),
            thread_id: thread_id.to_string(),
            status: self.cancel_status.clone(),
            last_error: None,
        })
    }

    async fn list_messages(&self, _thread_id: &str) -> Result<Vec<ThreadMessage>, ParleyError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.check(FailAt::ListMessages)?;
        let run_id = format!("run_{}", self.runs_created());
        let mut listed = Vec::new();
        if let Some(text) = &self.foreign_reply {
            listed.push(ThreadMessage {
                id: "msg_foreign".into(),
                role: "assistant".into(),
                run_id: Some("run_other".into()),
                created_at: 1_700_000_100,
                content: vec![MessagePart::Text(text.clone())],
            });
        }
        if let Some(parts) = &self.reply {
            listed.push(ThreadMessage {
                id: format!("msg_{run_id}"),
                role: "assistant".into(),
                run_id: Some(run_id.clone()),
                created_at: 1_700_000_000,
                content: parts.clone(),
            });
        }
        listed.push(ThreadMessage {
            id: "msg_user".into(),
            role: "user".into(),
            run_id: None,
            created_at: 1_699_999_999,
            content: vec![MessagePart::Text("question".into())],
        });
        Ok(listed)
    }
}

/// An [`AgentConnector`] handing out one shared [`MockAgentService`].
pub struct MockConnector {
    pub service: Arc<MockAgentService>,
    connects: Mutex<Vec<(String, String)>>,
}

impl MockConnector {
    pub fn new(service: Arc<MockAgentService>) -> Self {
        Self {
            service,
            connects: Mutex::new(Vec::new()),
        }
    }

    /// `(endpoint, token)` of every connect call.
    pub fn connects(&self) -> Vec<(String, String)> {
        self.connects.lock().unwrap().clone()
    }
}

impl AgentConnector for MockConnector {
    fn connect(
        &self,
        endpoint: &str,
        token: &SecretString,
    ) -> Result<Arc<dyn AgentService>, ParleyError> {
        self.connects
            .lock()
            .unwrap()
            .push((endpoint.to_string(), token.expose_secret().to_string()));
        Ok(self.service.clone())
    }
}
