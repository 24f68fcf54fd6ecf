// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Microsoft Entra ID identity client for Parley.
//!
//! Implements [`parley_core::IdentityClient`] with the device authorization
//! grant for interactive sign-in, the refresh token grant for silent renewal,
//! and a token cache persisted through a [`parley_core::KeyValueStore`].

pub mod cache;
pub mod client;
pub mod types;

pub use cache::{TOKEN_CACHE_KEY, TokenCache};
pub use client::{EntraConfig, EntraIdentityClient};
