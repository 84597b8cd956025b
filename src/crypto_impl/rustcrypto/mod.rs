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
use strum_macros::Display;

use crate::crypto_impl::CryptoBackend;
use crate::error::CoseCipherError;

#[cfg(rustcrypto_key_agreement_base)]
mod key_agreement;

#[derive(Debug, Display)]
/// Errors that might be returned from the `RustCrypto` cryptographic backend.
pub enum CoseRustCryptoCipherError {
    /// Error regarding elliptic curve operations (e.g. invalid scalars or points).
    #[cfg(feature = "rustcrypto-ecdh")]
    EcError(elliptic_curve::Error),
    /// Requested HKDF output length is invalid for the hash function.
    #[cfg(feature = "rustcrypto-hkdf")]
    InvalidLength(hkdf::InvalidLength),
    /// A derived public point is not a valid public key.
    InvalidPoint,
}

#[cfg(feature = "rustcrypto-ecdh")]
impl From<elliptic_curve::Error> for CoseCipherError<CoseRustCryptoCipherError> {
    fn from(value: elliptic_curve::Error) -> Self {
        CoseCipherError::Other(CoseRustCryptoCipherError::EcError(value))
    }
}

#[cfg(feature = "rustcrypto-hkdf")]
impl From<hkdf::InvalidLength> for CoseCipherError<CoseRustCryptoCipherError> {
    fn from(value: hkdf::InvalidLength) -> Self {
        CoseCipherError::Other(CoseRustCryptoCipherError::InvalidLength(value))
    }
}

/// Context for the RustCrypto cryptographic backend.
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
///     - [ ] X448
#[derive(Debug, Default, Clone, Copy)]
pub struct RustCryptoContext;

impl RustCryptoContext {
    /// Creates a new RustCrypto context for key agreement operations.
    #[must_use]
    pub fn new() -> RustCryptoContext {
        RustCryptoContext
    }
}

impl CryptoBackend for RustCryptoContext {
    type Error = CoseRustCryptoCipherError;
}
