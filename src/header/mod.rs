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

//! Strongly typed COSE header maps.
//!
//! A [`HeaderMap`] only admits labels of the closed [`HeaderParam`] set. Converting a
//! normalized test vector header (a [`Value`] map) into a [`HeaderMap`] is the point at which
//! leftover text labels are rejected.

use core::fmt::Display;
use std::collections::BTreeSet;

use ciborium::Value;
use coset::iana::EnumI64;
use coset::{iana, Algorithm, AsCborValue, CborOrdering, CoseError, CoseKey, Label};

use crate::error::{CoseCipherError, VectorError};
use crate::key::{materialize_any, KeyDescriptor};


/// A header parameter that can be used in a COSE header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderParam {
    /// Generic header parameter applicable to all algorithms.
    Generic(iana::HeaderParameter),
    /// Header parameter that is specific for a set of algorithms.
    Algorithm(iana::HeaderAlgorithmParameter),
}

impl HeaderParam {
    /// Returns the integer label of this parameter.
    #[must_use]
    pub fn to_i64(self) -> i64 {
        match self {
            HeaderParam::Generic(p) => p.to_i64(),
            HeaderParam::Algorithm(p) => p.to_i64(),
        }
    }

    /// Returns the parameter registered under the integer `label`, if any.
    #[must_use]
    pub fn from_i64(label: i64) -> Option<HeaderParam> {
        iana::HeaderParameter::from_i64(label)
            .map(HeaderParam::Generic)
            .or_else(|| iana::HeaderAlgorithmParameter::from_i64(label).map(HeaderParam::Algorithm))
    }

    /// Returns the [`Label`] of this parameter.
    #[must_use]
    pub fn label(self) -> Label {
        Label::Int(self.to_i64())
    }
}

impl From<iana::HeaderParameter> for HeaderParam {
    fn from(value: iana::HeaderParameter) -> Self {
        HeaderParam::Generic(value)
    }
}

impl From<iana::HeaderAlgorithmParameter> for HeaderParam {
    fn from(value: iana::HeaderAlgorithmParameter) -> Self {
        HeaderParam::Algorithm(value)
    }
}

/// Value of a header parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    /// Integer value, e.g. an algorithm or content format.
    Int(i64),
    /// Byte string, e.g. a key ID or IV.
    Bytes(Vec<u8>),
    /// Text string, e.g. a private use algorithm name.
    Text(String),
    /// Embedded COSE key, e.g. an ephemeral public key.
    Key(CoseKey),
    /// Any other nested CBOR structure.
    Cbor(Value),
}

impl HeaderValue {
    /// Returns the CBOR representation of this value, with nested maps in canonical order.
    ///
    /// # Errors
    ///
    /// Returns an error if an embedded key can't be represented as CBOR.
    pub fn to_cbor_value(&self) -> Result<Value, CoseError> {
        Ok(match self {
            HeaderValue::Int(i) => Value::from(*i),
            HeaderValue::Bytes(b) => Value::Bytes(b.clone()),
            HeaderValue::Text(t) => Value::Text(t.clone()),
            HeaderValue::Key(k) => {
                let mut key = k.clone();
                key.canonicalize(CborOrdering::Lexicographic);
                key.to_cbor_value()?
            }
            HeaderValue::Cbor(v) => canonicalize(v.clone()),
        })
    }

    /// Interprets a normalized CBOR `value` as the value of header parameter `param`.
    ///
    /// Key IDs and (partial) IVs must be byte strings, ephemeral and static keys are
    /// materialized from their key descriptors.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::InvalidHeaderValue`] if the value has the wrong type for the
    /// parameter, or [`VectorError::Key`] if an embedded key is invalid.
    pub fn from_value(param: HeaderParam, value: &Value) -> Result<HeaderValue, VectorError> {
        let invalid = || VectorError::InvalidHeaderValue(param, value.clone());
        match (param, value) {
            (
                HeaderParam::Algorithm(
                    iana::HeaderAlgorithmParameter::EphemeralKey
                    | iana::HeaderAlgorithmParameter::StaticKey,
                ),
                Value::Map(_),
            ) => Ok(HeaderValue::Key(materialize_any(
                &KeyDescriptor::try_from(value)?,
            )?)),
            (
                HeaderParam::Generic(
                    iana::HeaderParameter::Kid
                    | iana::HeaderParameter::Iv
                    | iana::HeaderParameter::PartialIv,
                ),
                v,
            ) => v
                .as_bytes()
                .map(|b| HeaderValue::Bytes(b.clone()))
                .ok_or_else(invalid),
            (_, Value::Integer(i)) => i64::try_from(*i)
                .map(HeaderValue::Int)
                .map_err(|_e| invalid()),
            (_, Value::Bytes(b)) => Ok(HeaderValue::Bytes(b.clone())),
            (_, Value::Text(t)) => Ok(HeaderValue::Text(t.clone())),
            (_, v) => Ok(HeaderValue::Cbor(v.clone())),
        }
    }
}

impl From<i64> for HeaderValue {
    fn from(value: i64) -> Self {
        HeaderValue::Int(value)
    }
}

impl From<Vec<u8>> for HeaderValue {
    fn from(value: Vec<u8>) -> Self {
        HeaderValue::Bytes(value)
    }
}

impl From<CoseKey> for HeaderValue {
    fn from(value: CoseKey) -> Self {
        HeaderValue::Key(value)
    }
}

impl From<iana::Algorithm> for HeaderValue {
    fn from(value: iana::Algorithm) -> Self {
        HeaderValue::Int(value.to_i64())
    }
}

/// Sorts all maps in `value` (recursively) by the encoded form of their keys, as required by
/// RFC 8949, Section 4.2.1.
pub(crate) fn canonicalize(value: Value) -> Value {
    match value {
        Value::Map(entries) => {
            let mut entries: Vec<(Value, Value)> = entries
                .into_iter()
                .map(|(k, v)| (canonicalize(k), canonicalize(v)))
                .collect();
            entries.sort_by_cached_key(|(k, _)| {
                let mut encoded = Vec::new();
                // Writing into a Vec can't fail.
                let _ = ciborium::ser::into_writer(k, &mut encoded);
                encoded
            });
            Value::Map(entries)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        Value::Tag(tag, inner) => Value::Tag(tag, Box::new(canonicalize(*inner))),
        v => v,
    }
}

/// Serializes a CBOR `value` to bytes.
pub(crate) fn encode_value(value: &Value) -> Result<Vec<u8>, CoseError> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf)
        .map_err(|_e| CoseError::EncodeFailed)?;
    Ok(buf)
}

/// A COSE header bucket keyed by [`HeaderParam`]s.
///
/// Insertion order is irrelevant: the encoding always uses canonical label order, so that
/// encoding equal maps yields equal bytes.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    entries: Vec<(HeaderParam, HeaderValue)>,
}

impl PartialEq for HeaderMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(p, v)| other.get(*p).is_some_and(|o| o == v))
    }
}

impl HeaderMap {
    /// Creates an empty header map.
    #[must_use]
    pub fn new() -> HeaderMap {
        HeaderMap::default()
    }

    /// Builder-style variant of [`HeaderMap::insert`].
    #[must_use]
    pub fn with<P: Into<HeaderParam>, V: Into<HeaderValue>>(mut self, param: P, value: V) -> Self {
        self.insert(param, value);
        self
    }

    /// Sets `param` to `value`, returning the value it replaced.
    pub fn insert<P: Into<HeaderParam>, V: Into<HeaderValue>>(
        &mut self,
        param: P,
        value: V,
    ) -> Option<HeaderValue> {
        let param = param.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(p, _)| *p == param) {
            Some((_, v)) => Some(core::mem::replace(v, value)),
            None => {
                self.entries.push((param, value));
                None
            }
        }
    }

    /// Returns the value of `param`.
    #[must_use]
    pub fn get<P: Into<HeaderParam>>(&self, param: P) -> Option<&HeaderValue> {
        let param = param.into();
        self.entries.iter().find(|(p, _)| *p == param).map(|(_, v)| v)
    }

    /// Removes `param`, returning its value.
    pub fn remove<P: Into<HeaderParam>>(&mut self, param: P) -> Option<HeaderValue> {
        let param = param.into();
        let index = self.entries.iter().position(|(p, _)| *p == param)?;
        Some(self.entries.remove(index).1)
    }

    /// Merges all entries of `other` into this map, overwriting existing entries.
    pub fn update(&mut self, other: HeaderMap) {
        for (param, value) in other.entries {
            self.insert(param, value);
        }
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over all entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(HeaderParam, HeaderValue)> {
        self.entries.iter()
    }

    /// Returns the set of labels used in this map.
    #[must_use]
    pub fn labels(&self) -> BTreeSet<Label> {
        self.entries.iter().map(|(p, _)| p.label()).collect()
    }

    /// Returns the algorithm set in this map.
    #[must_use]
    pub fn algorithm(&self) -> Option<Algorithm> {
        match self.get(iana::HeaderParameter::Alg)? {
            HeaderValue::Int(i) => Some(
                iana::Algorithm::from_i64(*i)
                    .map_or(Algorithm::PrivateUse(*i), Algorithm::Assigned),
            ),
            HeaderValue::Text(t) => Some(Algorithm::Text(t.clone())),
            _ => None,
        }
    }

    /// Returns the key ID set in this map.
    #[must_use]
    pub fn key_id(&self) -> Option<&[u8]> {
        match self.get(iana::HeaderParameter::Kid)? {
            HeaderValue::Bytes(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// Returns the header as a CBOR map in canonical label order.
    ///
    /// # Errors
    ///
    /// Returns an error if an embedded key can't be represented as CBOR.
    pub fn to_cbor_value(&self) -> Result<Value, CoseError> {
        let mut entries: Vec<(Label, Value)> = self
            .entries
            .iter()
            .map(|(p, v)| v.to_cbor_value().map(|cbor| (p.label(), cbor)))
            .collect::<Result<_, CoseError>>()?;
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(Value::Map(
            entries
                .into_iter()
                .map(|(l, v)| match l {
                    Label::Int(i) => (Value::from(i), v),
                    Label::Text(t) => (Value::Text(t), v),
                })
                .collect(),
        ))
    }

    /// Encodes the header as a CBOR map.
    ///
    /// An empty header encodes to the empty map (`A0`), never to an empty byte string. This
    /// is also the form used for the protected header bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the header can't be encoded.
    pub fn encode(&self) -> Result<Vec<u8>, CoseError> {
        encode_value(&self.to_cbor_value()?)
    }
}

impl TryFrom<&Value> for HeaderMap {
    type Error = VectorError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let entries = value.as_map().ok_or_else(|| {
            VectorError::MalformedFixture(format!("header is not a map: {value:?}"))
        })?;
        let mut header = HeaderMap::new();
        for (k, v) in entries {
            let param = match k {
                Value::Integer(i) => {
                    let label = i64::try_from(*i).map_err(|_e| {
                        VectorError::MalformedFixture(format!("header label {k:?} out of range"))
                    })?;
                    HeaderParam::from_i64(label).ok_or(VectorError::UnknownHeaderLabel(label))?
                }
                Value::Text(t) => return Err(VectorError::UnmappedHeaderLabel(t.clone())),
                other => {
                    return Err(VectorError::MalformedFixture(format!(
                        "invalid header label {other:?}"
                    )))
                }
            };
            header.insert(param, HeaderValue::from_value(param, v)?);
        }
        Ok(header)
    }
}

/// Checks that no label is used in both the `protected` and the `unprotected` header.
///
/// # Errors
///
/// Returns [`CoseCipherError::DuplicateHeaders`] with the offending labels.
pub fn check_for_duplicate_headers<E: Display>(
    protected: &HeaderMap,
    unprotected: &HeaderMap,
) -> Result<(), CoseCipherError<E>> {
    let protected_set = protected.labels();
    let duplicate_header_fields: Vec<Label> = unprotected
        .labels()
        .intersection(&protected_set)
        .cloned()
        .collect();
    if duplicate_header_fields.is_empty() {
        Ok(())
    } else {
        Err(CoseCipherError::DuplicateHeaders(duplicate_header_fields))
    }
}
