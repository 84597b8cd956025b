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

//! Key materialization from test vector key descriptors and parsed key views used by the
//! cryptographic backends.

use core::fmt::Display;
use std::collections::BTreeSet;
use std::marker::PhantomData;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use ciborium::Value;
use coset::iana::EnumI64;
use coset::{iana, Algorithm, AsCborValue, CoseKey, KeyOperation, KeyType, Label};
use coset::RegisteredLabelWithPrivate;
use strum_macros::Display;

use crate::error::{CoseCipherError, KeyError};


/// Base64url engine that accepts input with or without padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A key parameter, either common to all key types or specific to one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyParam {
    /// Parameter common to all key types.
    Common(iana::KeyParameter),
    /// Parameter of EC2 keys.
    Ec2(iana::Ec2KeyParameter),
    /// Parameter of octet key pairs.
    Okp(iana::OkpKeyParameter),
    /// Parameter of symmetric keys.
    Symmetric(iana::SymmetricKeyParameter),
}

impl From<iana::KeyParameter> for KeyParam {
    fn from(value: iana::KeyParameter) -> Self {
        KeyParam::Common(value)
    }
}

impl From<iana::Ec2KeyParameter> for KeyParam {
    fn from(value: iana::Ec2KeyParameter) -> Self {
        KeyParam::Ec2(value)
    }
}

impl From<iana::OkpKeyParameter> for KeyParam {
    fn from(value: iana::OkpKeyParameter) -> Self {
        KeyParam::Okp(value)
    }
}

impl From<iana::SymmetricKeyParameter> for KeyParam {
    fn from(value: iana::SymmetricKeyParameter) -> Self {
        KeyParam::Symmetric(value)
    }
}

/// An elliptic curve identifier, either IANA registered or private use.
pub type EllipticCurve = RegisteredLabelWithPrivate<iana::EllipticCurve>;

/// The variants of keys that can be materialized from a [`KeyDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum KeyVariant {
    /// Elliptic curve key with x and y coordinate.
    Ec2,
    /// Octet key pair (e.g. X25519).
    Okp,
    /// Symmetric key.
    Symmetric,
}

impl KeyVariant {
    /// Returns the IANA key type of this variant.
    #[must_use]
    pub fn key_type(self) -> iana::KeyType {
        match self {
            KeyVariant::Ec2 => iana::KeyType::EC2,
            KeyVariant::Okp => iana::KeyType::OKP,
            KeyVariant::Symmetric => iana::KeyType::Symmetric,
        }
    }

    /// Determines the variant from the value of a descriptor's key type parameter.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::UnsupportedKeyType`] if the value is not the integer label of a
    /// supported key type. Text values that were not mapped during normalization are never
    /// coerced into a default variant.
    pub fn from_key_type(kty: &Value) -> Result<Self, KeyError> {
        let kty_label = kty
            .as_integer()
            .and_then(|i| i64::try_from(i).ok())
            .and_then(iana::KeyType::from_i64);
        match kty_label {
            Some(iana::KeyType::EC2) => Ok(KeyVariant::Ec2),
            Some(iana::KeyType::OKP) => Ok(KeyVariant::Okp),
            Some(iana::KeyType::Symmetric) => Ok(KeyVariant::Symmetric),
            _ => Err(KeyError::UnsupportedKeyType(kty.clone())),
        }
    }
}

/// A key parameter map as found in a (normalized) test vector, prior to materialization.
///
/// Labels are usually integers after normalization. Text labels that had no canonical mapping
/// are retained but ignored by [`materialize`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyDescriptor {
    params: Vec<(Label, Value)>,
}

impl KeyDescriptor {
    /// Creates an empty descriptor.
    #[must_use]
    pub fn new() -> KeyDescriptor {
        KeyDescriptor::default()
    }

    /// Sets the parameter with integer `label` to `value`, replacing a previous value.
    #[must_use]
    pub fn param(mut self, label: i64, value: Value) -> KeyDescriptor {
        self.insert(Label::Int(label), value);
        self
    }

    /// Sets the parameter `label` to `value`, replacing a previous value.
    pub fn insert(&mut self, label: Label, value: Value) {
        match self.params.iter_mut().find(|(l, _)| *l == label) {
            Some((_, v)) => *v = value,
            None => self.params.push((label, value)),
        }
    }

    /// Returns the value of the parameter with integer `label`.
    #[must_use]
    pub fn get(&self, label: i64) -> Option<&Value> {
        find_param_by_label(&Label::Int(label), &self.params)
    }

    /// Iterates over all parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(Label, Value)> {
        self.params.iter()
    }

    /// Returns the descriptor as a CBOR map.
    #[must_use]
    pub fn to_cbor_value(&self) -> Value {
        Value::Map(
            self.params
                .iter()
                .map(|(l, v)| (label_to_value(l), v.clone()))
                .collect(),
        )
    }
}

impl TryFrom<&Value> for KeyDescriptor {
    type Error = KeyError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let entries = value
            .as_map()
            .ok_or_else(|| KeyError::NotAMap(value.clone()))?;
        let mut descriptor = KeyDescriptor::new();
        for (k, v) in entries {
            let label = match k {
                Value::Integer(i) => {
                    Label::Int(i64::try_from(*i).map_err(|_e| KeyError::InvalidLabel(k.clone()))?)
                }
                Value::Text(t) => Label::Text(t.clone()),
                other => return Err(KeyError::InvalidLabel(other.clone())),
            };
            descriptor.insert(label, v.clone());
        }
        Ok(descriptor)
    }
}

fn label_to_value(label: &Label) -> Value {
    match label {
        Label::Int(i) => Value::from(*i),
        Label::Text(t) => Value::Text(t.clone()),
    }
}

/// Decodes a coordinate or secret value: byte strings are taken as they are, text is base64url.
fn decode_key_bytes(param: KeyParam, value: &Value) -> Result<Vec<u8>, KeyError> {
    match value {
        Value::Bytes(b) => Ok(b.clone()),
        Value::Text(t) => URL_SAFE_LENIENT
            .decode(t)
            .map_err(|_e| KeyError::InvalidKeyParam(param, value.clone())),
        v => Err(KeyError::InvalidKeyParam(param, v.clone())),
    }
}

/// Checks that a curve parameter is an integer or text label.
fn decode_curve(param: KeyParam, value: &Value) -> Result<EllipticCurve, KeyError> {
    EllipticCurve::from_cbor_value(value.clone())
        .map_err(|_e| KeyError::InvalidKeyParam(param, value.clone()))
}

/// Builds a [`CoseKey`] of the given `variant` from a `descriptor` that uses canonical labels.
///
/// Coordinates and secrets given as text are base64url decoded, byte strings are used as is.
/// Key ID, algorithm and key operations are carried over if present.
///
/// # Errors
///
/// - [`KeyError::VariantMismatch`] if the descriptor names a different key type.
/// - [`KeyError::UnsupportedKeyType`] if the descriptor's key type is not a supported one.
/// - [`KeyError::MissingKeyParam`] if the curve (EC2/OKP), the secret `k` (symmetric) or all
///   key material (EC2/OKP) is missing.
/// - [`KeyError::InvalidKeyParam`] if a parameter can't be decoded.
pub fn materialize(variant: KeyVariant, descriptor: &KeyDescriptor) -> Result<CoseKey, KeyError> {
    if let Some(kty) = descriptor.get(iana::KeyParameter::Kty.to_i64()) {
        let found = KeyVariant::from_key_type(kty)?;
        if found != variant {
            return Err(KeyError::VariantMismatch {
                requested: variant,
                found: KeyType::Assigned(found.key_type()),
            });
        }
    }

    let mut key = CoseKey {
        kty: KeyType::Assigned(variant.key_type()),
        ..CoseKey::default()
    };

    for (label, value) in descriptor.iter() {
        match label {
            Label::Int(i) if *i == iana::KeyParameter::Kid.to_i64() => {
                key.key_id = match value {
                    Value::Text(t) => t.clone().into_bytes(),
                    Value::Bytes(b) => b.clone(),
                    v => {
                        return Err(KeyError::InvalidKeyParam(
                            iana::KeyParameter::Kid.into(),
                            v.clone(),
                        ))
                    }
                };
            }
            Label::Int(i) if *i == iana::KeyParameter::Alg.to_i64() => {
                key.alg = Some(Algorithm::from_cbor_value(value.clone()).map_err(|_e| {
                    KeyError::InvalidKeyParam(iana::KeyParameter::Alg.into(), value.clone())
                })?);
            }
            Label::Int(i) if *i == iana::KeyParameter::KeyOps.to_i64() => {
                key.key_ops = decode_key_ops(value)?;
            }
            Label::Int(_) => {}
            Label::Text(t) => log::debug!("ignoring unmapped key parameter \"{t}\""),
        }
    }

    key.params = match variant {
        KeyVariant::Ec2 => materialize_ec2_params(descriptor)?,
        KeyVariant::Okp => materialize_okp_params(descriptor)?,
        KeyVariant::Symmetric => {
            let k = descriptor
                .get(iana::SymmetricKeyParameter::K.to_i64())
                .ok_or(KeyError::MissingKeyParam(
                    iana::SymmetricKeyParameter::K.into(),
                ))?;
            vec![(
                Label::Int(iana::SymmetricKeyParameter::K.to_i64()),
                Value::Bytes(decode_key_bytes(iana::SymmetricKeyParameter::K.into(), k)?),
            )]
        }
    };

    Ok(key)
}

/// Same as [`materialize`], but takes the variant from the descriptor's key type.
///
/// # Errors
///
/// Returns [`KeyError::MissingKeyParam`] if no key type is given, and the errors of
/// [`materialize`] otherwise.
pub fn materialize_any(descriptor: &KeyDescriptor) -> Result<CoseKey, KeyError> {
    let kty = descriptor
        .get(iana::KeyParameter::Kty.to_i64())
        .ok_or(KeyError::MissingKeyParam(iana::KeyParameter::Kty.into()))?;
    materialize(KeyVariant::from_key_type(kty)?, descriptor)
}

fn decode_key_ops(value: &Value) -> Result<BTreeSet<KeyOperation>, KeyError> {
    let invalid = || KeyError::InvalidKeyParam(iana::KeyParameter::KeyOps.into(), value.clone());
    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|op| KeyOperation::from_cbor_value(op.clone()).map_err(|_e| invalid()))
        .collect()
}

fn materialize_ec2_params(descriptor: &KeyDescriptor) -> Result<Vec<(Label, Value)>, KeyError> {
    let crv = descriptor
        .get(iana::Ec2KeyParameter::Crv.to_i64())
        .ok_or(KeyError::MissingKeyParam(iana::Ec2KeyParameter::Crv.into()))?;
    decode_curve(iana::Ec2KeyParameter::Crv.into(), crv)?;
    let mut params = vec![(Label::Int(iana::Ec2KeyParameter::Crv.to_i64()), crv.clone())];

    let mut has_public = false;
    let mut has_private = false;
    for param in [
        iana::Ec2KeyParameter::X,
        iana::Ec2KeyParameter::Y,
        iana::Ec2KeyParameter::D,
    ] {
        let Some(value) = descriptor.get(param.to_i64()) else {
            continue;
        };
        let value = match (param, value) {
            // Compressed points carry the sign of y instead of its value.
            (iana::Ec2KeyParameter::Y, Value::Bool(sign)) => Value::Bool(*sign),
            (p, v) => Value::Bytes(decode_key_bytes(p.into(), v)?),
        };
        has_public |= param == iana::Ec2KeyParameter::X;
        has_private |= param == iana::Ec2KeyParameter::D;
        params.push((Label::Int(param.to_i64()), value));
    }
    if !has_public && !has_private {
        return Err(KeyError::MissingKeyParam(iana::Ec2KeyParameter::D.into()));
    }
    Ok(params)
}

fn materialize_okp_params(descriptor: &KeyDescriptor) -> Result<Vec<(Label, Value)>, KeyError> {
    let crv = descriptor
        .get(iana::OkpKeyParameter::Crv.to_i64())
        .ok_or(KeyError::MissingKeyParam(iana::OkpKeyParameter::Crv.into()))?;
    decode_curve(iana::OkpKeyParameter::Crv.into(), crv)?;
    let mut params = vec![(Label::Int(iana::OkpKeyParameter::Crv.to_i64()), crv.clone())];
    for param in [iana::OkpKeyParameter::X, iana::OkpKeyParameter::D] {
        if let Some(value) = descriptor.get(param.to_i64()) {
            params.push((
                Label::Int(param.to_i64()),
                Value::Bytes(decode_key_bytes(param.into(), value)?),
            ));
        }
    }
    if params.len() == 1 {
        return Err(KeyError::MissingKeyParam(iana::OkpKeyParameter::D.into()));
    }
    Ok(params)
}

/// Re-derives a [`KeyDescriptor`] from a materialized `key`.
///
/// All coordinates and secrets are byte strings in the result, so materializing the returned
/// descriptor again yields an equal key.
#[must_use]
pub fn describe(key: &CoseKey) -> KeyDescriptor {
    let mut descriptor = KeyDescriptor::new();
    if let Ok(kty) = key.kty.clone().to_cbor_value() {
        descriptor.insert(Label::Int(iana::KeyParameter::Kty.to_i64()), kty);
    }
    if !key.key_id.is_empty() {
        descriptor.insert(
            Label::Int(iana::KeyParameter::Kid.to_i64()),
            Value::Bytes(key.key_id.clone()),
        );
    }
    if let Some(alg) = key.alg.clone().and_then(|a| a.to_cbor_value().ok()) {
        descriptor.insert(Label::Int(iana::KeyParameter::Alg.to_i64()), alg);
    }
    if !key.key_ops.is_empty() {
        let ops = key
            .key_ops
            .iter()
            .filter_map(|op| op.clone().to_cbor_value().ok())
            .collect();
        descriptor.insert(
            Label::Int(iana::KeyParameter::KeyOps.to_i64()),
            Value::Array(ops),
        );
    }
    for (label, value) in &key.params {
        descriptor.insert(label.clone(), value.clone());
    }
    descriptor
}

/// Returns a copy of `key` without its private part, suitable as a peer public key.
///
/// Key operations are dropped as well, as they describe the private key's permitted use.
#[must_use]
pub fn public_key(key: &CoseKey) -> CoseKey {
    // D has the same label for EC2 and OKP keys.
    let d_label = Label::Int(iana::Ec2KeyParameter::D.to_i64());
    CoseKey {
        params: key
            .params
            .iter()
            .filter(|(l, _)| *l != d_label)
            .cloned()
            .collect(),
        key_ops: BTreeSet::new(),
        ..key.clone()
    }
}

/// Looks up the value of the parameter with the given `label`.
pub(crate) fn find_param_by_label<'a>(
    label: &Label,
    param_vec: &'a [(Label, Value)],
) -> Option<&'a Value> {
    param_vec.iter().find(|(l, _)| l == label).map(|(_, v)| v)
}

/// A [`CoseKey`] that has been checked to be of a supported key type.
pub enum CoseParsedKey<'a, OE: Display> {
    /// EC2 key.
    Ec2(CoseEc2Key<'a, OE>),
    /// Octet key pair.
    Okp(CoseOkpKey<'a, OE>),
    /// Symmetric key.
    Symmetric(CoseSymmetricKey<'a, OE>),
}

impl<'a, OE: Display> TryFrom<&'a CoseKey> for CoseParsedKey<'a, OE> {
    type Error = CoseCipherError<OE>;

    fn try_from(key: &'a CoseKey) -> Result<Self, Self::Error> {
        match &key.kty {
            KeyType::Assigned(iana::KeyType::EC2) => CoseEc2Key::try_from(key).map(Self::Ec2),
            KeyType::Assigned(iana::KeyType::OKP) => CoseOkpKey::try_from(key).map(Self::Okp),
            KeyType::Assigned(iana::KeyType::Symmetric) => {
                CoseSymmetricKey::try_from(key).map(Self::Symmetric)
            }
            v => Err(CoseCipherError::UnsupportedKeyType(v.clone())),
        }
    }
}

impl<'a, OE: Display> CoseParsedKey<'a, OE> {
    /// Returns the curve of EC2 and OKP keys.
    #[must_use]
    pub fn curve(&self) -> Option<&EllipticCurve> {
        match self {
            CoseParsedKey::Ec2(k) => Some(&k.crv),
            CoseParsedKey::Okp(k) => Some(&k.crv),
            CoseParsedKey::Symmetric(_) => None,
        }
    }

    /// Returns the private key component `d` of EC2 and OKP keys, if present.
    #[must_use]
    pub fn d(&self) -> Option<&'a [u8]> {
        match self {
            CoseParsedKey::Ec2(k) => k.d,
            CoseParsedKey::Okp(k) => k.d,
            CoseParsedKey::Symmetric(_) => None,
        }
    }
}

impl<'a, OE: Display> AsRef<CoseKey> for CoseParsedKey<'a, OE> {
    fn as_ref(&self) -> &CoseKey {
        match self {
            CoseParsedKey::Ec2(v) => v.as_ref(),
            CoseParsedKey::Okp(v) => v.as_ref(),
            CoseParsedKey::Symmetric(v) => v.as_ref(),
        }
    }
}

/// Parses an optional byte string key parameter.
fn bytes_param<'a, OE: Display>(
    key: &'a CoseKey,
    param: KeyParam,
    label: i64,
) -> Result<Option<&'a [u8]>, CoseCipherError<OE>> {
    find_param_by_label(&Label::Int(label), &key.params)
        .map(|v| match v.as_bytes() {
            None => Err(CoseCipherError::InvalidKeyParam(param, v.clone())),
            Some(b) => Ok(b.as_slice()),
        })
        .transpose()
}

/// Parses the curve parameter of an EC2 or OKP key.
fn curve_param<OE: Display>(
    key: &CoseKey,
    param: KeyParam,
    label: i64,
) -> Result<EllipticCurve, CoseCipherError<OE>> {
    let crv = find_param_by_label(&Label::Int(label), &key.params)
        .ok_or(CoseCipherError::MissingKeyParam(param))?;
    EllipticCurve::from_cbor_value(crv.clone())
        .map_err(|_e| CoseCipherError::InvalidKeyParam(param, crv.clone()))
}

/// View on an EC2 key.
pub struct CoseEc2Key<'a, OE: Display> {
    generic: &'a CoseKey,
    /// Curve of the key.
    pub crv: EllipticCurve,
    /// Private key component.
    pub d: Option<&'a [u8]>,
    /// X coordinate of the public key.
    pub x: Option<&'a [u8]>,
    /// Y coordinate of the public key.
    pub y: Option<&'a [u8]>,
    /// Sign of the y coordinate, if the point is compressed.
    pub sign: Option<bool>,
    _backend_error_type: PhantomData<OE>,
}

impl<'a, OE: Display> TryFrom<&'a CoseKey> for CoseEc2Key<'a, OE> {
    type Error = CoseCipherError<OE>;

    fn try_from(key: &'a CoseKey) -> Result<Self, Self::Error> {
        // Unless stated otherwise, these checks are according to RFC 9053, Section 7.1.1.
        let crv = curve_param(
            key,
            iana::Ec2KeyParameter::Crv.into(),
            iana::Ec2KeyParameter::Crv.to_i64(),
        )?;

        // Check whether curve and key type are consistent (RFC 9053, Section 7.1)
        match &crv {
            EllipticCurve::Assigned(
                iana::EllipticCurve::P_256
                | iana::EllipticCurve::P_384
                | iana::EllipticCurve::P_521
                | iana::EllipticCurve::Secp256k1,
            ) => {}
            v @ EllipticCurve::Assigned(_) => {
                return Err(CoseCipherError::KeyTypeCurveMismatch(
                    KeyType::Assigned(iana::KeyType::EC2),
                    v.clone(),
                ))
            }
            // Private use, the caller is expected to know what they are doing.
            _v => {}
        }

        let d = bytes_param(
            key,
            iana::Ec2KeyParameter::D.into(),
            iana::Ec2KeyParameter::D.to_i64(),
        )?;
        let x = bytes_param(
            key,
            iana::Ec2KeyParameter::X.into(),
            iana::Ec2KeyParameter::X.to_i64(),
        )?;

        // Y is either a bstr containing the coordinate or a boolean indicating the sign.
        let y = find_param_by_label(
            &Label::Int(iana::Ec2KeyParameter::Y.to_i64()),
            &key.params,
        );
        let (y, sign) = match y {
            None => (None, None),
            Some(Value::Bytes(b)) => (Some(b.as_slice()), None),
            Some(Value::Bool(b)) => (None, Some(*b)),
            Some(value) => {
                return Err(CoseCipherError::InvalidKeyParam(
                    iana::Ec2KeyParameter::Y.into(),
                    value.clone(),
                ))
            }
        };

        // For public keys, X and Y must be set, for private keys, at least D must be set.
        if d.is_none() && !(x.is_some() && (y.is_some() || sign.is_some())) {
            return Err(CoseCipherError::MissingKeyParam(
                iana::Ec2KeyParameter::D.into(),
            ));
        }

        Ok(CoseEc2Key {
            generic: key,
            crv,
            d,
            x,
            y,
            sign,
            _backend_error_type: PhantomData,
        })
    }
}

impl<'a, OE: Display> AsRef<CoseKey> for CoseEc2Key<'a, OE> {
    fn as_ref(&self) -> &CoseKey {
        self.generic
    }
}

/// View on an octet key pair.
pub struct CoseOkpKey<'a, OE: Display> {
    generic: &'a CoseKey,
    /// Curve of the key.
    pub crv: EllipticCurve,
    /// Private key.
    pub d: Option<&'a [u8]>,
    /// Public key.
    pub x: Option<&'a [u8]>,
    _backend_error_type: PhantomData<OE>,
}

impl<'a, OE: Display> TryFrom<&'a CoseKey> for CoseOkpKey<'a, OE> {
    type Error = CoseCipherError<OE>;

    fn try_from(key: &'a CoseKey) -> Result<Self, Self::Error> {
        // Unless stated otherwise, these checks are according to RFC 9053, Section 7.2.
        let crv = curve_param(
            key,
            iana::OkpKeyParameter::Crv.into(),
            iana::OkpKeyParameter::Crv.to_i64(),
        )?;

        match crv {
            EllipticCurve::Assigned(
                iana::EllipticCurve::X448
                | iana::EllipticCurve::X25519
                | iana::EllipticCurve::Ed448
                | iana::EllipticCurve::Ed25519,
            ) => {}
            v => {
                return Err(CoseCipherError::KeyTypeCurveMismatch(
                    KeyType::Assigned(iana::KeyType::OKP),
                    v,
                ))
            }
        }

        let d = bytes_param(
            key,
            iana::OkpKeyParameter::D.into(),
            iana::OkpKeyParameter::D.to_i64(),
        )?;
        let x = bytes_param(
            key,
            iana::OkpKeyParameter::X.into(),
            iana::OkpKeyParameter::X.to_i64(),
        )?;

        // For public keys, at least X must be set, for private keys, at least D must be set.
        if d.is_none() && x.is_none() {
            return Err(CoseCipherError::MissingKeyParam(
                iana::OkpKeyParameter::D.into(),
            ));
        }

        Ok(CoseOkpKey {
            generic: key,
            crv,
            d,
            x,
            _backend_error_type: PhantomData,
        })
    }
}

impl<'a, OE: Display> AsRef<CoseKey> for CoseOkpKey<'a, OE> {
    fn as_ref(&self) -> &CoseKey {
        self.generic
    }
}

/// View on a symmetric key.
pub struct CoseSymmetricKey<'a, OE: Display> {
    generic: &'a CoseKey,
    /// Key value.
    pub k: &'a [u8],
    _backend_error_type: PhantomData<OE>,
}

impl<'a, OE: Display> TryFrom<&'a CoseKey> for CoseSymmetricKey<'a, OE> {
    type Error = CoseCipherError<OE>;

    fn try_from(key: &'a CoseKey) -> Result<Self, Self::Error> {
        // RFC 9053, Section 7.3: k must be set and be a bstr.
        let k = bytes_param(
            key,
            iana::SymmetricKeyParameter::K.into(),
            iana::SymmetricKeyParameter::K.to_i64(),
        )?
        .ok_or(CoseCipherError::MissingKeyParam(
            iana::SymmetricKeyParameter::K.into(),
        ))?;

        Ok(CoseSymmetricKey {
            generic: key,
            k,
            _backend_error_type: PhantomData,
        })
    }
}

impl<'a, OE: Display> AsRef<CoseKey> for CoseSymmetricKey<'a, OE> {
    fn as_ref(&self) -> &CoseKey {
        self.generic
    }
}
