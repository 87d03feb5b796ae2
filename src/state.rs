// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{Authenticator, TokenIssuer};
use crate::storage::DocumentStore;
use crate::users::UserService;

/// Shared handler state. Everything here is read-only or internally
/// synchronized, so cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<DocumentStore>,
    pub tokens: Arc<TokenIssuer>,
    pub authenticator: Authenticator,
    pub users: UserService,
}

impl AppState {
    /// `storage` must already be initialized.
    pub fn new(storage: DocumentStore, tokens: TokenIssuer) -> Self {
        let storage = Arc::new(storage);
        let tokens = Arc::new(tokens);
        Self {
            authenticator: Authenticator::new(tokens.clone()),
            users: UserService::new(storage.clone()),
            storage,
            tokens,
        }
    }
}
