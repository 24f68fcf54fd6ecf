// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation engine for the Parley chat client.
//!
//! [`ChatEngine`] owns the in-memory conversation and drives one turn at a
//! time through the hosted agent's thread / message / run protocol,
//! publishing every state change on a `watch` channel.

pub mod engine;
pub mod poll;
pub mod state;

pub use engine::{ChatEngine, TurnOutcome};
pub use poll::PollPolicy;
pub use state::ChatState;
