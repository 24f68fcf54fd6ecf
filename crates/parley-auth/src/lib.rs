// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication session management for Parley.
//!
//! [`SessionManager`] wraps an [`IdentityClient`](parley_core::IdentityClient)
//! and exposes the small surface the shell needs: sign in, sign out, and
//! "give me a bearer token". [`SessionSlot`] owns the single manager for the
//! life of the process.

pub mod session;
pub mod slot;

pub use session::{AuthStatus, SessionManager, SessionPhase};
pub use slot::SessionSlot;
