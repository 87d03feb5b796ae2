// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Accounts - User Account & Authentication Service
//!
//! REST backend that registers users, verifies their passwords and issues
//! signed bearer tokens that gate the rest of the API.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers and router (Axum)
//! - `auth` - Password hashing, token issuance and the access guard
//! - `config` - Environment-driven runtime configuration
//! - `storage` - JSON document storage for user records
//! - `users` - Account management rules (validation, uniqueness, role changes)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
pub mod users;
