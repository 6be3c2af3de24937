// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token authentication against the external identity provider.
//!
//! ## Auth Flow
//!
//! 1. Front end authenticates the user with the identity provider
//! 2. Front end sends `Authorization: Bearer <JWT>`
//! 3. [`BearerCredential`] pulls the raw token out of the header
//! 4. [`AuthorizationGate`] hands it to the [`IdentityVerifier`]:
//!    - [`JwtVerifier`] fetches the provider JWKS over HTTPS
//!    - verifies signature, expiry, issuer, audience
//!    - `sub` becomes the [`Principal`]
//!
//! ## Security
//!
//! - Every resource operation goes through the gate; there is no bypass
//! - Rejection reasons are logged, never returned to the caller
//! - Verifier failures and timeouts fail closed
//! - Clock skew tolerance is 60 seconds

pub mod error;
pub mod extractor;
pub mod gate;
pub mod jwks;
pub mod jwt;
pub mod verifier;

pub use error::AuthError;
pub use extractor::BearerCredential;
pub use gate::{AuthorizationGate, AuthorizedContext};
pub use jwks::JwksManager;
#[cfg(any(test, feature = "dev"))]
pub use jwt::InsecureDecodeVerifier;
pub use jwt::JwtVerifier;
pub use verifier::{IdentityVerifier, Principal, VerificationError};
