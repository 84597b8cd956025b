/*
 * Copyright (c) 2024 The NAMIB Project Developers.
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */
mod key_agreement;

use openssl::error::ErrorStack;
use strum_macros::Display;

use crate::crypto_impl::CryptoBackend;
use crate::error::CoseCipherError;

/// Represents an error caused by the OpenSSL cryptographic backend.
#[derive(Debug, Display)]
#[non_exhaustive]
pub enum CoseOpensslCipherError {
    /// Standard OpenSSL error (represented as an [`ErrorStack`] in the openssl library crate).
    OpensslError(ErrorStack),
    /// Other error (error message is provided as a string).
    Other(&'static str),
}

impl From<ErrorStack> for CoseOpensslCipherError {
    fn from(value: ErrorStack) -> Self {
        CoseOpensslCipherError::OpensslError(value)
    }
}

impl From<ErrorStack> for CoseCipherError<CoseOpensslCipherError> {
    fn from(value: ErrorStack) -> Self {
        CoseCipherError::Other(value.into())
    }
}

/// Context for the OpenSSL cryptographic backend.
///
/// Can be used as a [`CryptoBackend`] for recipient key agreement.
///
/// Generic properties of this backend:
/// - [x] Can derive EC public key components if only the private component (d) is present.
/// - [x] Can work with compressed EC public keys (EC keys using point compression)
///
/// Algorithm support:
/// - Direct Key Agreement
///     - [x] Direct ECDH
///         - [x] ECDH-ES + HKDF-256
///         - [x] ECDH-ES + HKDF-512
///         - [x] ECDH-SS + HKDF-256
///         - [x] ECDH-SS + HKDF-512
/// - Key Agreement with Key Wrap (key derivation step only)
///     - [x] ECDH with Key Wrap
///         - [x] ECDH-ES + A128KW
///         - [x] ECDH-ES + A192KW
///         - [x] ECDH-ES + A256KW
///         - [x] ECDH-SS + A128KW
///         - [x] ECDH-SS + A192KW
///         - [x] ECDH-SS + A256KW
///
/// Elliptic Curve support:
/// - ECDH
///     - [x] P-256
///     - [x] P-384
///     - [x] P-521
///     - [x] X25519
///     - [x] X448
#[derive(Default)]
pub struct OpensslContext {}

impl OpensslContext {
    /// Creates a new OpenSSL context for key agreement operations.
    #[must_use]
    pub fn new() -> OpensslContext {
        OpensslContext {}
    }
}

impl CryptoBackend for OpensslContext {
    type Error = CoseOpensslCipherError;
}
