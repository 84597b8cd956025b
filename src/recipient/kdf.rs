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

//! The `COSE_KDF_Context` structure (RFC 9053, Section 5.2) and the algorithm tables needed to
//! fill it in.

use ciborium::Value;
use coset::iana::EnumI64;
use coset::{iana, CoseError};

use crate::crypto_impl::HkdfHash;
use crate::header::encode_value;

/// Nonce of a [`PartyInfo`], either a byte string or an integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartyNonce {
    /// Byte string nonce.
    Bytes(Vec<u8>),
    /// Integer nonce.
    Integer(i64),
}

impl From<Vec<u8>> for PartyNonce {
    fn from(value: Vec<u8>) -> Self {
        PartyNonce::Bytes(value)
    }
}

impl From<i64> for PartyNonce {
    fn from(value: i64) -> Self {
        PartyNonce::Integer(value)
    }
}

/// Information about one party of the key agreement (`PartyUInfo` or `PartyVInfo`).
///
/// Absent fields are encoded as `null`.
#[derive(Debug, Default, PartialEq, Clone, Builder)]
#[builder(setter(into, strip_option), derive(Debug, PartialEq))]
pub struct PartyInfo {
    /// Identity of the party.
    #[builder(default)]
    pub identity: Option<Vec<u8>>,

    /// Nonce contributed by the party.
    #[builder(default)]
    pub nonce: Option<PartyNonce>,

    /// Other information about the party.
    #[builder(default)]
    pub other: Option<Vec<u8>>,
}

impl PartyInfo {
    /// Returns a new builder for this struct.
    #[must_use]
    pub fn builder() -> PartyInfoBuilder {
        PartyInfoBuilder::default()
    }

    /// Returns the CBOR array `[identity, nonce, other]`.
    #[must_use]
    pub fn to_cbor_value(&self) -> Value {
        let bytes_or_null = |b: &Option<Vec<u8>>| b.clone().map_or(Value::Null, Value::Bytes);
        Value::Array(vec![
            bytes_or_null(&self.identity),
            match &self.nonce {
                None => Value::Null,
                Some(PartyNonce::Bytes(b)) => Value::Bytes(b.clone()),
                Some(PartyNonce::Integer(i)) => Value::from(*i),
            },
            bytes_or_null(&self.other),
        ])
    }
}

/// Public supplementary information, binding the key length and the protected header of the
/// recipient into the derived key.
#[derive(Debug, Default, PartialEq, Clone, Builder)]
#[builder(setter(into, strip_option), derive(Debug, PartialEq))]
pub struct SuppPubInfo {
    /// Length of the derived key in bits.
    pub key_data_length: u64,

    /// Serialized protected header of the recipient.
    pub protected: Vec<u8>,

    /// Other public information.
    #[builder(default)]
    pub other: Option<Vec<u8>>,
}

impl SuppPubInfo {
    /// Returns a new builder for this struct.
    #[must_use]
    pub fn builder() -> SuppPubInfoBuilder {
        SuppPubInfoBuilder::default()
    }

    /// Creates the supplementary information for a key that is used with `alg`.
    ///
    /// Returns `None` if the key length for `alg` is not known.
    #[must_use]
    pub fn for_algorithm(alg: iana::Algorithm, protected: Vec<u8>) -> Option<SuppPubInfo> {
        Some(SuppPubInfo {
            key_data_length: key_data_length(alg)?,
            protected,
            other: None,
        })
    }

    /// Returns the CBOR array `[keyDataLength, protected, ?other]`.
    #[must_use]
    pub fn to_cbor_value(&self) -> Value {
        let mut entries = vec![
            Value::from(self.key_data_length),
            Value::Bytes(self.protected.clone()),
        ];
        if let Some(other) = &self.other {
            entries.push(Value::Bytes(other.clone()));
        }
        Value::Array(entries)
    }
}

/// A `COSE_KDF_Context`, used as the HKDF info parameter during key agreement.
#[derive(Debug, PartialEq, Clone, Builder)]
#[builder(setter(into, strip_option), derive(Debug, PartialEq))]
pub struct KdfContext {
    /// Algorithm the derived key is used with.
    pub algorithm: iana::Algorithm,

    /// Information about the sending party.
    #[builder(default)]
    pub party_u: PartyInfo,

    /// Information about the receiving party.
    #[builder(default)]
    pub party_v: PartyInfo,

    /// Public supplementary information.
    pub supp_pub: SuppPubInfo,

    /// Private supplementary information.
    #[builder(default)]
    pub supp_priv: Option<Vec<u8>>,
}

impl KdfContext {
    /// Returns a new builder for this struct.
    #[must_use]
    pub fn builder() -> KdfContextBuilder {
        KdfContextBuilder::default()
    }

    /// Length of the key to derive in bytes.
    #[must_use]
    pub fn key_length(&self) -> usize {
        usize::try_from(self.supp_pub.key_data_length / 8).unwrap_or(usize::MAX)
    }

    /// Returns the CBOR array `[alg, PartyUInfo, PartyVInfo, SuppPubInfo, ?SuppPrivInfo]`.
    #[must_use]
    pub fn to_cbor_value(&self) -> Value {
        let mut entries = vec![
            Value::from(self.algorithm.to_i64()),
            self.party_u.to_cbor_value(),
            self.party_v.to_cbor_value(),
            self.supp_pub.to_cbor_value(),
        ];
        if let Some(supp_priv) = &self.supp_priv {
            entries.push(Value::Bytes(supp_priv.clone()));
        }
        Value::Array(entries)
    }

    /// Encodes the context as CBOR.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, CoseError> {
        encode_value(&self.to_cbor_value())
    }
}

/// Length in bits of keys used with `alg`, as bound into the KDF context.
#[must_use]
pub fn key_data_length(alg: iana::Algorithm) -> Option<u64> {
    match alg {
        iana::Algorithm::A128GCM
        | iana::Algorithm::A128KW
        | iana::Algorithm::AES_CCM_16_64_128
        | iana::Algorithm::AES_CCM_64_64_128
        | iana::Algorithm::AES_CCM_16_128_128
        | iana::Algorithm::AES_CCM_64_128_128
        | iana::Algorithm::AES_MAC_128_64
        | iana::Algorithm::AES_MAC_128_128 => Some(128),
        iana::Algorithm::A192GCM | iana::Algorithm::A192KW => Some(192),
        iana::Algorithm::A256GCM
        | iana::Algorithm::A256KW
        | iana::Algorithm::AES_CCM_16_64_256
        | iana::Algorithm::AES_CCM_64_64_256
        | iana::Algorithm::AES_CCM_16_128_256
        | iana::Algorithm::AES_CCM_64_128_256
        | iana::Algorithm::AES_MAC_256_64
        | iana::Algorithm::AES_MAC_256_128
        | iana::Algorithm::ChaCha20Poly1305
        | iana::Algorithm::HMAC_256_64
        | iana::Algorithm::HMAC_256_256 => Some(256),
        iana::Algorithm::HMAC_384_384 => Some(384),
        iana::Algorithm::HMAC_512_512 => Some(512),
        _ => None,
    }
}

/// Hash function HKDF is instantiated with for the ECDH algorithm `alg`.
///
/// Returns `None` if `alg` is not an ECDH key agreement algorithm.
#[must_use]
pub fn ecdh_hkdf_hash(alg: iana::Algorithm) -> Option<HkdfHash> {
    match alg {
        iana::Algorithm::ECDH_ES_HKDF_256
        | iana::Algorithm::ECDH_SS_HKDF_256
        | iana::Algorithm::ECDH_ES_A128KW
        | iana::Algorithm::ECDH_ES_A192KW
        | iana::Algorithm::ECDH_ES_A256KW
        | iana::Algorithm::ECDH_SS_A128KW
        | iana::Algorithm::ECDH_SS_A192KW
        | iana::Algorithm::ECDH_SS_A256KW => Some(HkdfHash::Sha256),
        iana::Algorithm::ECDH_ES_HKDF_512 | iana::Algorithm::ECDH_SS_HKDF_512 => {
            Some(HkdfHash::Sha512)
        }
        _ => None,
    }
}

/// Key wrap algorithm of an ECDH + key wrap algorithm.
///
/// This is the algorithm the KDF context has to name for these modes.
#[must_use]
pub fn kw_algorithm(alg: iana::Algorithm) -> Option<iana::Algorithm> {
    match alg {
        iana::Algorithm::ECDH_ES_A128KW | iana::Algorithm::ECDH_SS_A128KW => {
            Some(iana::Algorithm::A128KW)
        }
        iana::Algorithm::ECDH_ES_A192KW | iana::Algorithm::ECDH_SS_A192KW => {
            Some(iana::Algorithm::A192KW)
        }
        iana::Algorithm::ECDH_ES_A256KW | iana::Algorithm::ECDH_SS_A256KW => {
            Some(iana::Algorithm::A256KW)
        }
        _ => None,
    }
}

/// Whether `alg` uses a static sender key instead of an ephemeral one.
#[must_use]
pub fn is_static_static(alg: iana::Algorithm) -> bool {
    matches!(
        alg,
        iana::Algorithm::ECDH_SS_HKDF_256
            | iana::Algorithm::ECDH_SS_HKDF_512
            | iana::Algorithm::ECDH_SS_A128KW
            | iana::Algorithm::ECDH_SS_A192KW
            | iana::Algorithm::ECDH_SS_A256KW
    )
}
