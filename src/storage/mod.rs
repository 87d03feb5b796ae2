// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent storage as JSON documents on the local filesystem, rooted at
//! `DATA_DIR`.
//!
//! ## Storage Layout
//!
//! ```text
//! $DATA_DIR/
//!   users/
//!     {user_id}.json   # Account record (includes the password digest)
//! ```

pub mod document_store;
pub mod paths;
pub mod repository;

pub use document_store::{DocumentStore, StorageError, StorageResult};
pub use paths::StoragePaths;
pub use repository::{normalize_email, StoredUser, UserRepository};
