// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Finance Gateway - authenticated per-user resource store
//!
//! Serves the personal-finance front end. Every request carries a bearer token
//! from the external identity provider; the gateway verifies it and reads or
//! writes the caller's data under a key namespaced by their user id.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token verification and the authorization gate
//! - `gateway` - Authorized read/write/report operations
//! - `storage` - Resource keys and key-value store backends
//! - `notify` - Email rendering and delivery
//! - `accounts` - Account provisioning through the identity provider

pub mod accounts;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod notify;
pub mod state;
pub mod storage;
pub mod tls;

#[cfg(test)]
pub(crate) mod testing;
