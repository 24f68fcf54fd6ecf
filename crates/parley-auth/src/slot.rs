// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide owner of the session manager.
//!
//! The manager (and the identity client inside it) is built the first time
//! chat settings are complete and reused afterwards. Later settings changes
//! do not rebuild it: the client id, tenant and authority it was built with
//! stay in effect until restart. Only the scopes are refreshed.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use parley_core::ParleyError;

use crate::session::SessionManager;

#[derive(Default)]
pub struct SessionSlot {
    cell: OnceCell<Arc<SessionManager>>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The manager, if it has been built.
    pub fn get(&self) -> Option<Arc<SessionManager>> {
        self.cell.get().cloned()
    }

    /// Returns the manager, building and initializing it on first call.
    ///
    /// `build` runs at most once per slot, even under concurrent callers. If
    /// it or initialization fails the slot stays empty and a later call
    /// retries.
    pub async fn get_or_init<F, Fut>(&self, build: F) -> Result<Arc<SessionManager>, ParleyError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SessionManager, ParleyError>>,
    {
        self.cell
            .get_or_try_init(|| async {
                let manager = Arc::new(build().await?);
                manager.initialize().await?;
                info!("identity session created");
                Ok(manager)
            })
            .await
            .cloned()
    }

    /// Aborts background sign-in work and releases the identity client.
    pub async fn shutdown(&self) -> Result<(), ParleyError> {
        match self.cell.get() {
            Some(manager) => {
                debug!("shutting down identity session");
                manager.shutdown().await
            }
            None => Ok(()),
        }
    }
}
