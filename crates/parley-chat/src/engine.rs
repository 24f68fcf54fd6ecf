// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn submission against the hosted agent service.
//!
//! One turn runs at a time. A turn appends the user's message, makes sure a
//! remote thread exists, posts the message, starts a run of the configured
//! agent, waits for the run and appends the agent's reply.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use parley_core::types::RunStatus;
use parley_core::{
    AgentConnector, AgentService, ChatSettings, CredentialProvider, Message, ParleyError,
};

use crate::poll::{PollPolicy, wait_for_run};
use crate::state::ChatState;

/// How a call to [`ChatEngine::submit`] ended.
#[derive(Debug)]
pub enum TurnOutcome {
    /// Blank input; nothing happened.
    Skipped,
    /// Another turn was still running; nothing happened.
    Busy,
    /// The agent answered and the reply was appended.
    Replied(Message),
    /// The run completed without a text reply for this run.
    NoReply,
    /// The turn failed; the error is also in [`ChatState::error`].
    Failed(ParleyError),
}

/// Owns the conversation and runs turns against the agent service.
pub struct ChatEngine {
    state: watch::Sender<ChatState>,
    busy: AtomicBool,
    /// Bumped by `clear_messages`; turns that started under an older epoch
    /// do not write into the cleared conversation.
    epoch: AtomicU64,
    cancel: Mutex<CancellationToken>,
    /// The run the current turn started, until the turn ends.
    active_run: Mutex<Option<ActiveRun>>,
    policy: PollPolicy,
}

/// A started run and the client that can stop it.
struct ActiveRun {
    service: Arc<dyn AgentService>,
    thread_id: String,
    run_id: String,
}

/// Clears the busy flag and the loading indicator when a turn ends.
struct TurnGuard<'a> {
    engine: &'a ChatEngine,
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.engine.state.send_modify(|s| s.is_loading = false);
        self.engine.busy.store(false, Ordering::Release);
    }
}

impl ChatEngine {
    pub fn new(policy: PollPolicy) -> Self {
        let (state, _) = watch::channel(ChatState::default());
        Self {
            state,
            busy: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
            cancel: Mutex::new(CancellationToken::new()),
            active_run: Mutex::new(None),
            policy,
        }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// A receiver that sees every state change.
    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ChatState {
        self.state.borrow().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Runs one turn.
    ///
    /// Failures never escape: they land in the state's error banner and come
    /// back as [`TurnOutcome::Failed`].
    pub async fn submit(
        &self,
        content: &str,
        settings: &ChatSettings,
        credentials: &dyn CredentialProvider,
        connector: &dyn AgentConnector,
    ) -> TurnOutcome {
        if content.trim().is_empty() {
            return TurnOutcome::Skipped;
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("turn rejected: another turn is in flight");
            return TurnOutcome::Busy;
        }
        let _guard = TurnGuard { engine: self };

        let epoch = self.epoch.load(Ordering::Acquire);
        let cancel = self.fresh_cancel_token();
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ParleyError::Cancelled),
            result = self.run_turn(content, settings, credentials, connector, epoch) => result,
        };

        let started = self.active_run().take();
        if let (Some(run), Err(e)) = (started, &result) {
            if leaves_run_active(e) {
                self.release_run(run, epoch).await;
            }
        }

        match result {
            Ok(Some(reply)) => TurnOutcome::Replied(reply),
            Ok(None) => TurnOutcome::NoReply,
            Err(e) => {
                warn!(error = %e, "turn failed");
                let banner = e.to_string();
                self.modify_if_current(epoch, |s| s.error = Some(banner));
                TurnOutcome::Failed(e)
            }
        }
    }

    async fn run_turn(
        &self,
        content: &str,
        settings: &ChatSettings,
        credentials: &dyn CredentialProvider,
        connector: &dyn AgentConnector,
        epoch: u64,
    ) -> Result<Option<Message>, ParleyError> {
        let token = credentials
            .access_token()
            .await
            .ok_or_else(|| ParleyError::auth("no access token available"))?;
        let agent_id = settings.agent_id().ok_or(ParleyError::AgentNotConfigured)?;
        let service = connector.connect(&settings.endpoint, &token)?;

        let user = Message::user(content);
        self.modify_if_current(epoch, |s| s.messages.push(user));

        let thread_id = self.ensure_thread(service.as_ref(), epoch).await?;
        service.create_message(&thread_id, content).await?;
        let run = service.create_run(&thread_id, agent_id).await?;
        debug!(thread_id = %thread_id, run_id = %run.id, "run started");
        *self.active_run() = Some(ActiveRun {
            service: service.clone(),
            thread_id: thread_id.clone(),
            run_id: run.id.clone(),
        });

        let run = wait_for_run(service.as_ref(), &thread_id, &run.id, &self.policy).await?;
        if run.status != RunStatus::Completed {
            return Err(ParleyError::RunFailed {
                status: run.status,
                detail: run.last_error,
            });
        }

        let reply = service
            .list_messages(&thread_id)
            .await?
            .into_iter()
            .filter(|m| m.role == "assistant" && m.run_id.as_deref() == Some(run.id.as_str()))
            .find_map(|m| m.to_message());

        match reply {
            Some(reply) => {
                let appended = self.modify_if_current(epoch, |s| s.messages.push(reply.clone()));
                if appended {
                    info!(run_id = %run.id, "assistant replied");
                } else {
                    debug!("conversation cleared during turn; reply dropped");
                }
                Ok(Some(reply))
            }
            None => {
                debug!(run_id = %run.id, "run completed without a text reply");
                Ok(None)
            }
        }
    }

    /// The cached thread id, creating a thread on first use.
    async fn ensure_thread(
        &self,
        service: &dyn AgentService,
        epoch: u64,
    ) -> Result<String, ParleyError> {
        let cached = self.state.borrow().thread_id.clone();
        if let Some(id) = cached {
            return Ok(id);
        }
        let thread = service.create_thread().await?;
        debug!(thread_id = %thread.id, "thread created");
        let id = thread.id.clone();
        self.modify_if_current(epoch, |s| s.thread_id = Some(thread.id));
        Ok(id)
    }

    /// Aborts the turn in flight, if any.
    pub fn cancel_turn(&self) {
        if self.is_busy() {
            info!("cancelling turn");
        }
        self.cancel.lock().unwrap_or_else(|p| p.into_inner()).cancel();
    }

    /// Empties the conversation and forgets the remote thread.
    pub fn clear_messages(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.state.send_modify(|s| {
            s.messages.clear();
            s.thread_id = None;
            s.error = None;
        });
        debug!("conversation cleared");
    }

    /// Stops a run the turn gave up on so the thread accepts new messages.
    ///
    /// If the service cannot confirm the run has stopped, the thread is
    /// forgotten and the next turn starts a new one.
    async fn release_run(&self, run: ActiveRun, epoch: u64) {
        let stopped = match run.service.cancel_run(&run.thread_id, &run.run_id).await {
            Ok(cancelled) => cancelled.status.is_terminal(),
            Err(e) => {
                warn!(run_id = %run.run_id, error = %e, "failed to cancel run");
                false
            }
        };
        if stopped {
            debug!(run_id = %run.run_id, "abandoned run cancelled");
            return;
        }
        let forgot = self.modify_if_current(epoch, |s| {
            if s.thread_id.as_deref() == Some(run.thread_id.as_str()) {
                s.thread_id = None;
            }
        });
        if forgot {
            info!(thread_id = %run.thread_id, "run still active; next turn starts a new thread");
        }
    }

    fn active_run(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        self.active_run.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn fresh_cancel_token(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.cancel.lock().unwrap_or_else(|p| p.into_inner()) = token.clone();
        token
    }

    /// Applies `f` unless the conversation was cleared since `epoch`.
    fn modify_if_current(&self, epoch: u64, f: impl FnOnce(&mut ChatState)) -> bool {
        self.state.send_if_modified(|s| {
            if self.epoch.load(Ordering::Acquire) != epoch {
                return false;
            }
            f(s);
            true
        })
    }
}

/// Errors that end a turn while its run may still hold the thread.
fn leaves_run_active(error: &ParleyError) -> bool {
    match error {
        ParleyError::Cancelled | ParleyError::RunTimedOut { .. } => true,
        ParleyError::RunFailed { status, .. } => !status.is_terminal(),
        _ => false,
    }
}

impl Default for ChatEngine {
    fn default() -> Self {
        Self::new(PollPolicy::default())
    }
}
