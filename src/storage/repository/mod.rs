// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the document store.

pub mod users;

pub use users::{normalize_email, StoredUser, UserRepository};
