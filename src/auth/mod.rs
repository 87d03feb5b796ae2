// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Password login and bearer-token access control for the accounts API.
//!
//! ## Auth Flow
//!
//! 1. Client posts e-mail + password to `/v1/auth/login`
//! 2. Server:
//!    - Looks up the account and verifies the argon2id digest
//!    - Issues an HS256 JWT carrying `sub`, `email`, `role`, `iat`, `exp`
//! 3. Client sends `Authorization: Bearer <token>` on protected calls
//! 4. The guard verifies signature and expiry and attaches the principal
//!
//! ## Security
//!
//! - Unknown e-mail and wrong password are indistinguishable to callers
//! - Token verification never touches storage; roles are trusted until expiry
//! - No clock skew tolerance on `exp`
//! - Password hashing runs on the blocking pool

pub mod authenticator;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod guard;
pub mod password;
pub mod roles;
pub mod token;

pub use authenticator::{Authenticator, CredentialStore};
pub use claims::{AuthenticatedUser, TokenClaims, TokenSubject};
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use guard::{authenticate_request, require_auth};
pub use roles::Role;
pub use token::{IssuedToken, TokenError, TokenIssuer};
