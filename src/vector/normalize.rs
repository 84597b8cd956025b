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

//! In-place normalization of test vector construction objects.
//!
//! Vector files use human-readable names for header attributes, key parameters, algorithms,
//! key types and curves, and encode binary values as text. Normalization rewrites them into the
//! integer labels and byte strings of the COSE data model. Names without a canonical mapping
//! are passed through unchanged, which makes normalization idempotent.

use ciborium::Value;
use coset::iana;
use coset::iana::EnumI64;

use crate::error::VectorError;
use crate::header::HeaderParam;
use crate::labels::{
    is_hex_field, lookup_algorithm, lookup_header_attribute, lookup_key_attribute,
    lookup_key_parameter,
};
use crate::vector::field_mut;

/// Names of the header buckets of a construction, recipient or signer.
const HEADER_BUCKETS: [&str; 2] = ["protected", "unprotected"];

/// Names of the fields holding nested recipient-shaped structures.
const NESTED_LISTS: [&str; 2] = ["recipients", "signers"];

/// Names of the fields holding key descriptors.
const KEY_FIELDS: [&str; 2] = ["key", "sender_key"];

/// Normalizes a construction object (or a recipient or signer) of a test vector in place.
///
/// Header buckets get canonical labels and byte string values, key descriptors get canonical
/// parameter labels, and nested `recipients` and `signers` are normalized recursively at any
/// depth, in order. Absent fields are left absent.
///
/// # Errors
///
/// Returns [`VectorError::MalformedFixture`] if the object, a header bucket, a key or a nested
/// structure has the wrong shape, and [`VectorError::InvalidHex`] if a hex field can't be
/// decoded.
pub fn normalize_construction(object: &mut Value) -> Result<(), VectorError> {
    if !object.is_map() {
        return Err(VectorError::MalformedFixture(format!(
            "construction is not an object: {object:?}"
        )));
    }

    for bucket in HEADER_BUCKETS {
        if let Some(header) = field_mut(object, bucket) {
            normalize_header(header, bucket)?;
        }
    }

    for list_name in NESTED_LISTS {
        if let Some(list) = field_mut(object, list_name) {
            let Value::Array(nested) = list else {
                return Err(VectorError::MalformedFixture(format!(
                    "{list_name} is not a list"
                )));
            };
            for entry in nested.iter_mut() {
                normalize_construction(entry)?;
            }
        }
    }

    for key_field in KEY_FIELDS {
        if let Some(key) = field_mut(object, key_field) {
            normalize_key(key)?;
        }
    }
    Ok(())
}

/// Normalizes a key descriptor in place.
///
/// Parameter names are replaced by their labels, `_hex` fields are decoded into byte strings,
/// and the values of `kty` and `crv` are replaced by their integer values. Other values (e.g.
/// base64url coordinates) are left for key materialization.
///
/// # Errors
///
/// Returns [`VectorError::MalformedFixture`] if `key` is not an object, and
/// [`VectorError::InvalidHex`] if a hex field can't be decoded.
pub fn normalize_key(key: &mut Value) -> Result<(), VectorError> {
    let Value::Map(entries) = key else {
        return Err(VectorError::MalformedFixture(format!(
            "key is not an object: {key:?}"
        )));
    };
    for (label, value) in entries.iter_mut() {
        let Value::Text(name) = label else {
            continue;
        };
        let name = name.clone();
        let Some(canonical) = lookup_key_parameter(&name) else {
            log::debug!("passing through unmapped key parameter \"{name}\"");
            continue;
        };
        if is_hex_field(&name) {
            decode_hex_in_place(&name, value)?;
        } else if name == "kty" || name == "crv" {
            if let Value::Text(attribute) = value {
                match lookup_key_attribute(attribute) {
                    Some(v) => *value = Value::from(v),
                    None => log::debug!("passing through unmapped {name} value \"{attribute}\""),
                }
            }
        }
        *label = Value::from(canonical);
    }
    Ok(())
}

/// Normalizes one header bucket in place.
///
/// Attribute names are rewritten first, an ephemeral key is detached and normalized as key
/// descriptor, algorithm names are substituted, and the ephemeral key is reattached under its
/// canonical label.
fn normalize_header(header: &mut Value, bucket: &str) -> Result<(), VectorError> {
    let Value::Map(entries) = header else {
        return Err(VectorError::MalformedFixture(format!(
            "{bucket} header is not an object"
        )));
    };

    let mut normalized: Vec<(Value, Value)> = Vec::with_capacity(entries.len());
    let mut ephemeral_key = None;
    for (label, value) in entries.drain(..) {
        let (name, param) = match &label {
            Value::Text(name) => (name.clone(), lookup_header_attribute(name)),
            Value::Integer(i) => (
                String::new(),
                i64::try_from(*i).ok().and_then(HeaderParam::from_i64),
            ),
            _ => (String::new(), None),
        };
        let Some(param) = param else {
            if label.is_text() {
                log::debug!("passing through unmapped {bucket} header attribute \"{name}\"");
            }
            insert_or_replace(&mut normalized, label, value);
            continue;
        };
        let value = normalize_header_value(&name, param, value)?;
        if param == HeaderParam::Algorithm(iana::HeaderAlgorithmParameter::EphemeralKey) {
            ephemeral_key = Some(value);
        } else {
            insert_or_replace(&mut normalized, Value::from(param.to_i64()), value);
        }
    }

    for (_, value) in &mut normalized {
        if let Value::Text(name) = value {
            if let Some(alg) = lookup_algorithm(name) {
                *value = Value::from(alg.to_i64());
            }
        }
    }

    if let Some(ephemeral_key) = ephemeral_key {
        insert_or_replace(
            &mut normalized,
            Value::from(iana::HeaderAlgorithmParameter::EphemeralKey.to_i64()),
            ephemeral_key,
        );
    }
    *entries = normalized;
    Ok(())
}

/// Normalizes the value of header attribute `name` (empty for integer labels) with label
/// `param`.
fn normalize_header_value(
    name: &str,
    param: HeaderParam,
    mut value: Value,
) -> Result<Value, VectorError> {
    if is_hex_field(name) {
        decode_hex_in_place(name, &mut value)?;
        return Ok(value);
    }
    match (param, value) {
        (HeaderParam::Algorithm(iana::HeaderAlgorithmParameter::EphemeralKey), mut key) => {
            normalize_key(&mut key)?;
            Ok(key)
        }
        (
            HeaderParam::Generic(iana::HeaderParameter::Kid)
            | HeaderParam::Algorithm(iana::HeaderAlgorithmParameter::Salt),
            Value::Text(t),
        ) => Ok(Value::Bytes(t.into_bytes())),
        (HeaderParam::Generic(iana::HeaderParameter::PartialIv), mut v @ Value::Text(_)) => {
            decode_hex_in_place(name, &mut v)?;
            Ok(v)
        }
        (_, v) => Ok(v),
    }
}

fn decode_hex_in_place(name: &str, value: &mut Value) -> Result<(), VectorError> {
    if let Value::Text(text) = value {
        let bytes =
            hex::decode(text.as_str()).map_err(|e| VectorError::InvalidHex(name.to_string(), e))?;
        *value = Value::Bytes(bytes);
    }
    Ok(())
}

fn insert_or_replace(entries: &mut Vec<(Value, Value)>, label: Value, value: Value) {
    match entries.iter_mut().find(|(l, _)| *l == label) {
        Some((_, v)) => *v = value,
        None => entries.push((label, value)),
    }
}
