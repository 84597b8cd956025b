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

//! Cryptographic backends for recipient key agreement.
//!
//! Backends are selected through Cargo features: `rustcrypto` (the default) provides
//! [`rustcrypto::RustCryptoContext`], `openssl` provides [`openssl::OpensslContext`].

use core::fmt::Display;

use crate::error::CoseCipherError;
use crate::key::{CoseEc2Key, CoseOkpKey, EllipticCurve};

#[cfg(feature = "openssl")]
pub mod openssl;
#[cfg(rustcrypto_base)]
pub mod rustcrypto;

#[cfg(test)]
mod tests;

/// Common properties of all cryptographic backends.
pub trait CryptoBackend {
    /// Type of errors specific to this backend.
    type Error: Display;
}

/// Hash function to instantiate HKDF with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HkdfHash {
    /// SHA-256, used by the `*-HKDF-256` and key wrap variants of ECDH.
    Sha256,
    /// SHA-512, used by the `*-HKDF-512` variants of ECDH.
    Sha512,
}

impl HkdfHash {
    /// Largest number of output bytes HKDF can expand to with this hash (RFC 5869, Section 2.3).
    #[must_use]
    pub fn max_output_len(self) -> usize {
        let hash_len = match self {
            HkdfHash::Sha256 => 32,
            HkdfHash::Sha512 => 64,
        };
        255 * hash_len
    }
}

/// Trait for cryptographic backends that can perform the key agreement operations required by
/// COSE recipients using ECDH (RFC 9053, Section 6.3).
pub trait KeyAgreementCryptoBackend: CryptoBackend {
    /// Computes the ECDH shared secret of the EC2 keys `private_key` and `public_key`.
    ///
    /// # Arguments
    ///
    /// * `private_key` - Key carrying the private component `d`.
    /// * `public_key` - Peer key carrying the public point (coordinates or compressed form).
    ///
    /// Callers ensure that both keys are on the same curve.
    ///
    /// # Returns
    ///
    /// The x coordinate of the shared point, as a big endian byte string of the curve's field
    /// size.
    ///
    /// # Errors
    ///
    /// [`CoseCipherError::UnsupportedCurve`] for curves the backend can't handle,
    /// [`CoseCipherError::MissingKeyParam`] if one of the keys lacks required components,
    /// [`CoseCipherError::Other`] for backend errors (e.g. points not on the curve).
    fn ecdh_ec2(
        &mut self,
        private_key: &CoseEc2Key<'_, Self::Error>,
        public_key: &CoseEc2Key<'_, Self::Error>,
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>>;

    /// Computes the ECDH shared secret of the octet key pairs `private_key` and `public_key`
    /// (X25519/X448, RFC 7748).
    ///
    /// # Errors
    ///
    /// Same as for [`KeyAgreementCryptoBackend::ecdh_ec2`].
    fn ecdh_okp(
        &mut self,
        private_key: &CoseOkpKey<'_, Self::Error>,
        public_key: &CoseOkpKey<'_, Self::Error>,
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>>;

    /// Derives the public point `(x, y)` of the EC2 private key `d` on curve `crv`.
    ///
    /// # Errors
    ///
    /// [`CoseCipherError::UnsupportedCurve`] for unsupported curves, [`CoseCipherError::Other`]
    /// for invalid scalars.
    fn ec2_public_key(
        &mut self,
        crv: &EllipticCurve,
        d: &[u8],
    ) -> Result<(Vec<u8>, Vec<u8>), CoseCipherError<Self::Error>>;

    /// Derives the public key `x` of the OKP private key `d` on curve `crv`.
    ///
    /// # Errors
    ///
    /// Same as for [`KeyAgreementCryptoBackend::ec2_public_key`].
    fn okp_public_key(
        &mut self,
        crv: &EllipticCurve,
        d: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>>;

    /// Performs HKDF (RFC 5869) extract and expand.
    ///
    /// # Arguments
    ///
    /// * `hash` - Hash function to use.
    /// * `salt` - Salt for the extract step, `None` is equivalent to a salt of hash length zeros.
    /// * `ikm` - Input keying material (the ECDH shared secret).
    /// * `info` - Context information (the encoded `COSE_KDF_Context`).
    /// * `okm_len` - Length of the output in bytes.
    ///
    /// # Errors
    ///
    /// [`CoseCipherError::Other`] if `okm_len` is too large for the hash function.
    fn hkdf(
        &mut self,
        hash: HkdfHash,
        salt: Option<&[u8]>,
        ikm: &[u8],
        info: &[u8],
        okm_len: usize,
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>>;
}
