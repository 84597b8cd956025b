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

//! COSE recipients and ECDH based key agreement (RFC 9053, Section 6.3).
//!
//! A [`Recipient`] is created from its header buckets, either directly or from a normalized
//! test vector node. Its key can then be derived using [`Recipient::derive_kek`] (with an
//! explicit key pair and [`KdfContext`]) or [`Recipient::agree_direct`] (with the keys the
//! test vector provides). Headers may be updated in between, and every intermediate encoding
//! can be compared against the expected bytes of a test vector.

use core::convert::Infallible;
use core::fmt::Display;

use ciborium::Value;
use coset::iana::EnumI64;
use coset::{iana, Algorithm, CoseError, CoseKey, KeyType, Label};

use crate::crypto_impl::KeyAgreementCryptoBackend;
use crate::error::{CoseCipherError, VectorError};
use crate::header::{check_for_duplicate_headers, encode_value, HeaderMap, HeaderParam, HeaderValue};
use crate::key::{find_param_by_label, materialize_any, public_key, CoseParsedKey, KeyDescriptor};
use crate::vector::{field, nested_list};

pub use kdf::{
    ecdh_hkdf_hash, is_static_static, key_data_length, kw_algorithm, KdfContext,
    KdfContextBuilder, PartyInfo, PartyInfoBuilder, PartyNonce, SuppPubInfo, SuppPubInfoBuilder,
};

mod kdf;

#[cfg(test)]
mod tests;

/// Error type of operations on a [`Recipient`] that don't involve a cryptographic backend.
pub type RecipientEncodeError = CoseCipherError<Infallible>;

fn encoding_error<E: Display>(e: CoseError) -> CoseCipherError<E> {
    CoseCipherError::Encoding(e.to_string())
}

/// A COSE recipient (or signer, which has the same shape).
///
/// Recipients form a tree: each one owns the recipients nested inside of it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Recipient {
    /// Header parameters that are integrity protected.
    pub protected: HeaderMap,
    /// Header parameters that are not integrity protected.
    pub unprotected: HeaderMap,
    /// Key of the receiving party. May carry the private part, which is ignored for agreement.
    pub key: Option<CoseKey>,
    /// Key of the sending party (ephemeral for ECDH-ES, static for ECDH-SS).
    pub sender_key: Option<CoseKey>,
    /// Nested recipients.
    pub recipients: Vec<Recipient>,
    /// Payload, e.g. a wrapped key. Empty for direct key agreement.
    pub payload: Vec<u8>,
}

impl Recipient {
    /// Creates a recipient with the given header buckets and without keys or payload.
    #[must_use]
    pub fn new(protected: HeaderMap, unprotected: HeaderMap) -> Recipient {
        Recipient {
            protected,
            unprotected,
            ..Recipient::default()
        }
    }

    /// Encodes the protected header. An empty protected header encodes to `A0`.
    ///
    /// # Errors
    ///
    /// Returns an error if the header can't be encoded.
    pub fn encode_phdr(&self) -> Result<Vec<u8>, CoseError> {
        self.protected.encode()
    }

    /// Encodes the unprotected header.
    ///
    /// # Errors
    ///
    /// Returns an error if the header can't be encoded.
    pub fn encode_uhdr(&self) -> Result<Vec<u8>, CoseError> {
        self.unprotected.encode()
    }

    /// Merges `header` into the protected header, replacing existing entries.
    pub fn phdr_update(&mut self, header: HeaderMap) {
        self.protected.update(header);
    }

    /// Merges `header` into the unprotected header, replacing existing entries.
    pub fn uhdr_update(&mut self, header: HeaderMap) {
        self.unprotected.update(header);
    }

    /// Returns the algorithm of this recipient, looking at the protected header first.
    #[must_use]
    pub fn algorithm(&self) -> Option<Algorithm> {
        self.protected
            .algorithm()
            .or_else(|| self.unprotected.algorithm())
    }

    /// Returns the value of `param`, looking at the protected header first.
    #[must_use]
    pub fn header_param<P: Into<HeaderParam>>(&self, param: P) -> Option<&HeaderValue> {
        let param = param.into();
        self.protected
            .get(param)
            .or_else(|| self.unprotected.get(param))
    }

    fn header_bytes<E: Display>(
        &self,
        param: iana::HeaderAlgorithmParameter,
    ) -> Result<Option<Vec<u8>>, CoseCipherError<E>> {
        match self.header_param(param) {
            None => Ok(None),
            Some(HeaderValue::Bytes(b)) => Ok(Some(b.clone())),
            Some(v) => Err(CoseCipherError::InvalidHeaderParam(
                param.into(),
                v.to_cbor_value().unwrap_or(Value::Null),
            )),
        }
    }

    fn party_info<E: Display>(
        &self,
        identity: iana::HeaderAlgorithmParameter,
        nonce: iana::HeaderAlgorithmParameter,
        other: iana::HeaderAlgorithmParameter,
    ) -> Result<PartyInfo, CoseCipherError<E>> {
        let nonce = match self.header_param(nonce) {
            None => None,
            Some(HeaderValue::Bytes(b)) => Some(PartyNonce::Bytes(b.clone())),
            Some(HeaderValue::Int(i)) => Some(PartyNonce::Integer(*i)),
            Some(v) => {
                return Err(CoseCipherError::InvalidHeaderParam(
                    nonce.into(),
                    v.to_cbor_value().unwrap_or(Value::Null),
                ))
            }
        };
        Ok(PartyInfo {
            identity: self.header_bytes(identity)?,
            nonce,
            other: self.header_bytes(other)?,
        })
    }

    /// Builds the KDF context for a key used with `alg`, taking party information from the
    /// headers of this recipient and binding its current protected header.
    ///
    /// # Errors
    ///
    /// Returns [`CoseCipherError::UnsupportedAlgorithm`] if the key length for `alg` is not
    /// known, and [`CoseCipherError::InvalidHeaderParam`] if party information headers have
    /// the wrong type.
    pub fn kdf_context<E: Display>(
        &self,
        alg: iana::Algorithm,
    ) -> Result<KdfContext, CoseCipherError<E>> {
        let supp_pub = SuppPubInfo::for_algorithm(alg, self.encode_phdr().map_err(encoding_error)?)
            .ok_or(CoseCipherError::UnsupportedAlgorithm(Algorithm::Assigned(alg)))?;
        Ok(KdfContext {
            algorithm: alg,
            party_u: self.party_info(
                iana::HeaderAlgorithmParameter::PartyUIdentity,
                iana::HeaderAlgorithmParameter::PartyUNonce,
                iana::HeaderAlgorithmParameter::PartyUOther,
            )?,
            party_v: self.party_info(
                iana::HeaderAlgorithmParameter::PartyVIdentity,
                iana::HeaderAlgorithmParameter::PartyVNonce,
                iana::HeaderAlgorithmParameter::PartyVOther,
            )?,
            supp_pub,
            supp_priv: None,
        })
    }

    /// Derives a key using ECDH followed by HKDF.
    ///
    /// # Arguments
    ///
    /// * `backend` - Cryptographic backend to use.
    /// * `private_key` - Own key, must carry its private component `d`.
    /// * `peer_public_key` - Key of the other party, must not carry a private component.
    /// * `alg` - ECDH algorithm, determines the hash function used for HKDF.
    /// * `context` - KDF context used as HKDF info, also determines the output length.
    ///
    /// If a `salt` header parameter is set on this recipient, it is used as HKDF salt.
    ///
    /// # Returns
    ///
    /// The derived key, which is the content key for direct key agreement and the key
    /// encryption key for key agreement with key wrap.
    ///
    /// # Errors
    ///
    /// - [`CoseCipherError::UnsupportedAlgorithm`] if `alg` is not an ECDH algorithm.
    /// - [`CoseCipherError::CurveMismatch`] if the keys are on different curves.
    /// - [`CoseCipherError::MissingKeyParam`] if `private_key` lacks `d`.
    /// - [`CoseCipherError::UnexpectedKeyParam`] if `peer_public_key` carries `d`.
    /// - [`CoseCipherError::UnsupportedKeyType`] for keys that aren't EC2 or OKP keys.
    /// - Backend errors for failed cryptographic operations.
    pub fn derive_kek<B: KeyAgreementCryptoBackend>(
        &self,
        backend: &mut B,
        private_key: &CoseKey,
        peer_public_key: &CoseKey,
        alg: iana::Algorithm,
        context: &KdfContext,
    ) -> Result<Vec<u8>, CoseCipherError<B::Error>> {
        let hash = ecdh_hkdf_hash(alg)
            .ok_or(CoseCipherError::UnsupportedAlgorithm(Algorithm::Assigned(alg)))?;

        let private = CoseParsedKey::<B::Error>::try_from(private_key)?;
        let peer = CoseParsedKey::<B::Error>::try_from(peer_public_key)?;
        // D has the same label for EC2 and OKP keys.
        if private.d().is_none() {
            return Err(CoseCipherError::MissingKeyParam(
                iana::Ec2KeyParameter::D.into(),
            ));
        }
        if peer.d().is_some() {
            return Err(CoseCipherError::UnexpectedKeyParam(
                iana::Ec2KeyParameter::D.into(),
            ));
        }

        let shared_secret = match (&private, &peer) {
            (CoseParsedKey::Ec2(private), CoseParsedKey::Ec2(peer)) => {
                if private.crv != peer.crv {
                    return Err(CoseCipherError::CurveMismatch(
                        private.crv.clone(),
                        peer.crv.clone(),
                    ));
                }
                backend.ecdh_ec2(private, peer)?
            }
            (CoseParsedKey::Okp(private), CoseParsedKey::Okp(peer)) => {
                if private.crv != peer.crv {
                    return Err(CoseCipherError::CurveMismatch(
                        private.crv.clone(),
                        peer.crv.clone(),
                    ));
                }
                backend.ecdh_okp(private, peer)?
            }
            (private, peer) => {
                return Err(match (private.curve(), peer.curve()) {
                    (Some(a), Some(b)) => CoseCipherError::CurveMismatch(a.clone(), b.clone()),
                    (None, _) => CoseCipherError::UnsupportedKeyType(private.as_ref().kty.clone()),
                    (_, None) => CoseCipherError::UnsupportedKeyType(peer.as_ref().kty.clone()),
                })
            }
        };

        let salt = self.header_bytes(iana::HeaderAlgorithmParameter::Salt)?;
        let info = context.encode().map_err(encoding_error)?;
        let key = backend.hkdf(
            hash,
            salt.as_deref(),
            &shared_secret,
            &info,
            context.key_length(),
        )?;
        log::debug!(
            "derived {} bit key using {alg:?} for {:?}",
            context.supp_pub.key_data_length,
            context.algorithm
        );
        Ok(key)
    }

    /// Runs direct ECDH key agreement with the keys attached to this recipient.
    ///
    /// The sender key is used as private key and the public part of the recipient key as peer
    /// key. For ECDH-ES, the public part of the sender key is attached to the unprotected
    /// header as ephemeral key. For ECDH-SS, the sender key ID (or, if it has none, its
    /// public part) is attached as static key ID (or static key), unless one of these is
    /// already present. The KDF context names `content_alg` for direct key agreement and the
    /// key wrap algorithm for ECDH with key wrap.
    ///
    /// # Returns
    ///
    /// The derived content key (direct) or key encryption key (key wrap). Wrapping the content
    /// key is left to the caller.
    ///
    /// # Errors
    ///
    /// - [`CoseCipherError::MissingKey`] if the recipient has no sender or recipient key.
    /// - [`CoseCipherError::UnsupportedAlgorithm`] if the recipient algorithm is not an ECDH
    ///   algorithm.
    /// - All errors of [`Recipient::derive_kek`].
    pub fn agree_direct<B: KeyAgreementCryptoBackend>(
        &mut self,
        backend: &mut B,
        content_alg: iana::Algorithm,
    ) -> Result<Vec<u8>, CoseCipherError<B::Error>> {
        let alg = match self.algorithm() {
            Some(Algorithm::Assigned(alg)) if ecdh_hkdf_hash(alg).is_some() => alg,
            Some(alg) => return Err(CoseCipherError::UnsupportedAlgorithm(alg)),
            None => return Err(CoseCipherError::MissingKey("algorithm")),
        };
        let sender_key = self
            .sender_key
            .clone()
            .ok_or(CoseCipherError::MissingKey("sender key"))?;
        let peer_key = public_key(
            self.key
                .as_ref()
                .ok_or(CoseCipherError::MissingKey("recipient key"))?,
        );

        let sender_public = public_key_with_coordinates(backend, &sender_key)?;
        if is_static_static(alg) {
            let has_static_key = self
                .header_param(iana::HeaderAlgorithmParameter::StaticKeyId)
                .is_some()
                || self
                    .header_param(iana::HeaderAlgorithmParameter::StaticKey)
                    .is_some();
            if !has_static_key {
                if sender_key.key_id.is_empty() {
                    self.unprotected
                        .insert(iana::HeaderAlgorithmParameter::StaticKey, sender_public);
                } else {
                    self.unprotected.insert(
                        iana::HeaderAlgorithmParameter::StaticKeyId,
                        sender_key.key_id.clone(),
                    );
                }
            }
        } else {
            self.unprotected
                .insert(iana::HeaderAlgorithmParameter::EphemeralKey, sender_public);
        }

        let context = self.kdf_context(kw_algorithm(alg).unwrap_or(content_alg))?;
        let key = self.derive_kek(backend, &sender_key, &peer_key, alg, &context)?;
        if kw_algorithm(alg).is_none() {
            self.payload = Vec::new();
        }
        Ok(key)
    }

    /// Returns the CBOR structure `[protected, unprotected, payload, ?recipients]`.
    ///
    /// # Errors
    ///
    /// Returns [`CoseCipherError::DuplicateHeaders`] if a label is set in both header buckets
    /// (of this or any nested recipient), or [`CoseCipherError::Encoding`] if a header can't
    /// be encoded.
    pub fn encode(&self) -> Result<Value, RecipientEncodeError> {
        check_for_duplicate_headers(&self.protected, &self.unprotected)?;
        let mut entries = vec![
            Value::Bytes(self.encode_phdr().map_err(encoding_error)?),
            self.unprotected.to_cbor_value().map_err(encoding_error)?,
            Value::Bytes(self.payload.clone()),
        ];
        if !self.recipients.is_empty() {
            entries.push(Value::Array(
                self.recipients
                    .iter()
                    .map(Recipient::encode)
                    .collect::<Result<_, _>>()?,
            ));
        }
        Ok(Value::Array(entries))
    }

    /// Serializes the recipient as CBOR.
    ///
    /// # Errors
    ///
    /// Same as for [`Recipient::encode`].
    pub fn to_vec(&self) -> Result<Vec<u8>, RecipientEncodeError> {
        encode_value(&self.encode()?).map_err(encoding_error)
    }
}

/// Returns the public part of `key` with only the parameters needed to identify the point
/// (key type, curve and coordinates), deriving the coordinates from `d` if necessary.
fn public_key_with_coordinates<B: KeyAgreementCryptoBackend>(
    backend: &mut B,
    key: &CoseKey,
) -> Result<CoseKey, CoseCipherError<B::Error>> {
    let parsed = CoseParsedKey::<B::Error>::try_from(key)?;
    let crv_label = Label::Int(iana::Ec2KeyParameter::Crv.to_i64());
    let crv = find_param_by_label(&crv_label, &key.params)
        .cloned()
        .ok_or(CoseCipherError::MissingKeyParam(
            iana::Ec2KeyParameter::Crv.into(),
        ))?;
    let mut params = vec![(crv_label, crv)];
    match parsed {
        CoseParsedKey::Ec2(ec2) => {
            let (x, y) = match (ec2.x, ec2.y, ec2.sign) {
                (Some(x), Some(y), _) => (x.to_vec(), Value::Bytes(y.to_vec())),
                (Some(x), None, Some(sign)) => (x.to_vec(), Value::Bool(sign)),
                (_, _, _) => {
                    let d = ec2.d.ok_or(CoseCipherError::MissingKeyParam(
                        iana::Ec2KeyParameter::D.into(),
                    ))?;
                    let (x, y) = backend.ec2_public_key(&ec2.crv, d)?;
                    (x, Value::Bytes(y))
                }
            };
            params.push((
                Label::Int(iana::Ec2KeyParameter::X.to_i64()),
                Value::Bytes(x),
            ));
            params.push((Label::Int(iana::Ec2KeyParameter::Y.to_i64()), y));
        }
        CoseParsedKey::Okp(okp) => {
            let x = match (okp.x, okp.d) {
                (Some(x), _) => x.to_vec(),
                (None, Some(d)) => backend.okp_public_key(&okp.crv, d)?,
                (None, None) => {
                    return Err(CoseCipherError::MissingKeyParam(
                        iana::OkpKeyParameter::X.into(),
                    ))
                }
            };
            params.push((Label::Int(iana::OkpKeyParameter::X.to_i64()), Value::Bytes(x)));
        }
        CoseParsedKey::Symmetric(_) => {
            return Err(CoseCipherError::UnsupportedKeyType(KeyType::Assigned(
                iana::KeyType::Symmetric,
            )))
        }
    }
    Ok(CoseKey {
        kty: key.kty.clone(),
        params,
        ..CoseKey::default()
    })
}

impl TryFrom<&Value> for Recipient {
    type Error = VectorError;

    /// Builds a recipient tree from a normalized recipient (or signer) node of a test vector.
    ///
    /// Nested `recipients` (or `signers`) are converted recursively, preserving their order.
    /// A node containing both lists is rejected as malformed.
    fn try_from(node: &Value) -> Result<Self, Self::Error> {
        if node.as_map().is_none() {
            return Err(VectorError::MalformedFixture(format!(
                "recipient is not an object: {node:?}"
            )));
        }
        let header = |name: &str| {
            field(node, name)
                .map(HeaderMap::try_from)
                .transpose()
                .map(Option::unwrap_or_default)
        };
        let key = |name: &str| -> Result<Option<CoseKey>, VectorError> {
            field(node, name)
                .map(|v| -> Result<CoseKey, VectorError> {
                    Ok(materialize_any(&KeyDescriptor::try_from(v)?)?)
                })
                .transpose()
        };
        let nested = nested_list(node)?
            .map(|v| -> Result<Vec<Recipient>, VectorError> {
                v.as_array()
                    .ok_or_else(|| {
                        VectorError::MalformedFixture(format!("nested recipients are not a list: {v:?}"))
                    })?
                    .iter()
                    .map(Recipient::try_from)
                    .collect()
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Recipient {
            protected: header("protected")?,
            unprotected: header("unprotected")?,
            key: key("key")?,
            sender_key: key("sender_key")?,
            recipients: nested,
            payload: Vec::new(),
        })
    }
}
