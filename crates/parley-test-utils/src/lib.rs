// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Parley integration tests.
//!
//! Provides mock adapters and a test harness for deterministic,
//! network-free testing of the session and conversation layers.

pub mod harness;
pub mod mock_agents;
pub mod mock_identity;

pub use harness::{TestHarness, TestHarnessBuilder, test_policy, test_settings};
pub use mock_agents::{FailAt, MockAgentService, MockConnector};
pub use mock_identity::{MockIdentityClient, StaticCredential, test_account};
