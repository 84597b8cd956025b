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

//! This module contains common error types used across this crate.

use core::fmt::{Display, Formatter};
use std::path::PathBuf;

use ciborium::Value;
use coset::{Algorithm, KeyType, Label};

use crate::header::HeaderParam;
use crate::key::{EllipticCurve, KeyParam, KeyVariant};

/// Error type used when a key descriptor can't be turned into a key of the requested variant.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum KeyError {
    /// The key type given in the descriptor is not one of the supported key variants.
    UnsupportedKeyType(Value),
    /// The descriptor carries a key type that differs from the requested variant.
    VariantMismatch {
        /// Variant that was requested by the caller.
        requested: KeyVariant,
        /// Key type found in the descriptor.
        found: KeyType,
    },
    /// A parameter that is required for the requested variant is missing.
    MissingKeyParam(KeyParam),
    /// A parameter has a value that can't be used (wrong CBOR type or undecodable text).
    InvalidKeyParam(KeyParam, Value),
    /// A descriptor label is neither an integer nor a text string.
    InvalidLabel(Value),
    /// The descriptor is not a map.
    NotAMap(Value),
}

impl Display for KeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            KeyError::UnsupportedKeyType(v) => write!(f, "unsupported key type: {v:?}"),
            KeyError::VariantMismatch { requested, found } => write!(
                f,
                "requested a key of variant {requested}, but descriptor has key type {found:?}"
            ),
            KeyError::MissingKeyParam(p) => write!(f, "key parameter {p:?} is missing"),
            KeyError::InvalidKeyParam(p, v) => {
                write!(f, "key parameter {p:?} has invalid value {v:?}")
            }
            KeyError::InvalidLabel(l) => write!(f, "invalid key parameter label {l:?}"),
            KeyError::NotAMap(v) => write!(f, "key descriptor is not a map: {v:?}"),
        }
    }
}

/// Error type used while loading and normalizing test vectors.
#[derive(Debug)]
#[non_exhaustive]
pub enum VectorError {
    /// A fixture file or directory could not be read.
    Io(PathBuf, std::io::Error),
    /// A fixture file is not valid JSON.
    Json(PathBuf, serde_json::Error),
    /// The fixture lacks a field the harness requires, or a field has the wrong shape.
    MalformedFixture(String),
    /// A field that should contain hex text could not be decoded.
    InvalidHex(String, hex::FromHexError),
    /// A header map still contains a label that has no canonical integer form.
    UnmappedHeaderLabel(String),
    /// A header map contains an integer label that is not part of the closed header label set.
    UnknownHeaderLabel(i64),
    /// A header value does not have the type its label requires.
    InvalidHeaderValue(HeaderParam, Value),
    /// An embedded key could not be materialized.
    Key(KeyError),
}

impl Display for VectorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            VectorError::Io(path, e) => write!(f, "unable to read {}: {e}", path.display()),
            VectorError::Json(path, e) => {
                write!(f, "unable to parse {} as JSON: {e}", path.display())
            }
            VectorError::MalformedFixture(msg) => write!(f, "malformed fixture: {msg}"),
            VectorError::InvalidHex(field, e) => {
                write!(f, "field {field} does not contain valid hex: {e}")
            }
            VectorError::UnmappedHeaderLabel(l) => {
                write!(f, "header label \"{l}\" has no canonical integer form")
            }
            VectorError::UnknownHeaderLabel(l) => write!(f, "unknown header label {l}"),
            VectorError::InvalidHeaderValue(p, v) => {
                write!(f, "header parameter {p:?} has invalid value {v:?}")
            }
            VectorError::Key(e) => write!(f, "invalid embedded key: {e}"),
        }
    }
}

impl From<KeyError> for VectorError {
    fn from(value: KeyError) -> Self {
        VectorError::Key(value)
    }
}

/// Errors that may occur while performing recipient key agreement.
///
/// Generic over the error type `T` of the cryptographic backend in use.
#[derive(Debug)]
#[non_exhaustive]
pub enum CoseCipherError<T>
where
    T: Display,
{
    /// The given algorithm is not supported for the requested operation.
    UnsupportedAlgorithm(Algorithm),
    /// The key type of a key is not supported for the requested operation.
    UnsupportedKeyType(KeyType),
    /// The curve of a key is not supported by the backend.
    UnsupportedCurve(EllipticCurve),
    /// The curve of a key is not valid for its key type.
    KeyTypeCurveMismatch(KeyType, EllipticCurve),
    /// The private key and the peer public key are on different curves.
    CurveMismatch(EllipticCurve, EllipticCurve),
    /// A key parameter required for the operation is missing.
    MissingKeyParam(KeyParam),
    /// A key parameter has an invalid value.
    InvalidKeyParam(KeyParam, Value),
    /// A key parameter is set that must not be present for the operation (e.g. a private
    /// component in a peer public key).
    UnexpectedKeyParam(KeyParam),
    /// A key required for the operation (named by the field) is not available.
    MissingKey(&'static str),
    /// A header parameter has an invalid value.
    InvalidHeaderParam(HeaderParam, Value),
    /// The same header labels were set in both the protected and unprotected bucket.
    DuplicateHeaders(Vec<Label>),
    /// A structure could not be encoded as CBOR.
    Encoding(String),
    /// An error specific to the cryptographic backend.
    Other(T),
}

impl<T: Display> Display for CoseCipherError<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            CoseCipherError::UnsupportedAlgorithm(a) => write!(f, "unsupported algorithm {a:?}"),
            CoseCipherError::UnsupportedKeyType(k) => write!(f, "unsupported key type {k:?}"),
            CoseCipherError::UnsupportedCurve(c) => write!(f, "unsupported curve {c:?}"),
            CoseCipherError::KeyTypeCurveMismatch(k, c) => {
                write!(f, "curve {c:?} can not be used with key type {k:?}")
            }
            CoseCipherError::CurveMismatch(a, b) => {
                write!(f, "keys are on different curves ({a:?} and {b:?})")
            }
            CoseCipherError::MissingKeyParam(p) => write!(f, "key parameter {p:?} is missing"),
            CoseCipherError::InvalidKeyParam(p, v) => {
                write!(f, "key parameter {p:?} has invalid value {v:?}")
            }
            CoseCipherError::UnexpectedKeyParam(p) => {
                write!(f, "key parameter {p:?} must not be set for this operation")
            }
            CoseCipherError::MissingKey(name) => write!(f, "no {name} available"),
            CoseCipherError::InvalidHeaderParam(p, v) => {
                write!(f, "header parameter {p:?} has invalid value {v:?}")
            }
            CoseCipherError::DuplicateHeaders(labels) => write!(
                f,
                "header labels {labels:?} are set in both the protected and unprotected header"
            ),
            CoseCipherError::Encoding(msg) => write!(f, "CBOR encoding failed: {msg}"),
            CoseCipherError::Other(e) => write!(f, "{e}"),
        }
    }
}

mod std_error {
    use core::fmt::Debug;
    use std::error::Error;

    use super::{CoseCipherError, Display, KeyError, VectorError};

    impl Error for KeyError {}

    impl Error for VectorError {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            match self {
                VectorError::Io(_, e) => Some(e),
                VectorError::Json(_, e) => Some(e),
                VectorError::InvalidHex(_, e) => Some(e),
                VectorError::Key(e) => Some(e),
                _ => None,
            }
        }
    }

    impl<T> Error for CoseCipherError<T> where T: Debug + Display {}
}
