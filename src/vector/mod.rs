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

//! Known-answer test vectors in the JSON format of the cose-wg/Examples repository.
//!
//! A [`TestVector`] holds one normalized construction object (see [`normalize`]) together with
//! the expected output and intermediate values of the vector. Vectors are usually obtained
//! through the [`loader`], which selects the vectors of a construction from a set of fixture
//! directories.
//!
//! # Example
//! ```
//! use cose_conformance::vector::{Construction, TestVector};
//! use serde_json::json;
//!
//! let vector = TestVector::from_json(
//!     "example.json",
//!     Construction::Mac0,
//!     json!({
//!         "title": "HMAC-01",
//!         "input": {
//!             "plaintext": "This is the content.",
//!             "mac0": { "protected": { "alg": "HS256" }, "unprotected": { "kid": "our-secret" } }
//!         },
//!         "intermediates": { "ToMac_hex": "84" },
//!         "output": { "cbor": "D1" }
//!     }),
//! )?
//! .expect("vector contains a mac0 construction");
//! assert_eq!(vector.title, "HMAC-01");
//! assert_eq!(vector.protected_header()?.encode().unwrap(), hex::decode("A10105")?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::PathBuf;

use ciborium::Value;
use coset::{iana, CoseKey};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::VectorError;
use crate::header::HeaderMap;
use crate::key::{materialize, materialize_any, KeyDescriptor, KeyVariant};
use crate::recipient::Recipient;

pub use loader::{
    load_vectors, Construction, FixtureSuite, LoadedSuite, LoaderConfig, LoaderConfigBuilder,
    SkippedVector,
};
pub use normalize::{normalize_construction, normalize_key};

pub mod loader;
pub mod normalize;


/// Returns the value of the text-keyed field `name` of a CBOR map `node`.
pub(crate) fn field<'a>(node: &'a Value, name: &str) -> Option<&'a Value> {
    node.as_map()?
        .iter()
        .find(|(k, _)| k.as_text() == Some(name))
        .map(|(_, v)| v)
}

/// Returns the nested `recipients` or `signers` list of `node`.
///
/// # Errors
///
/// Returns [`VectorError::MalformedFixture`] if `node` contains both lists.
pub(crate) fn nested_list(node: &Value) -> Result<Option<&Value>, VectorError> {
    match (field(node, "recipients"), field(node, "signers")) {
        (Some(_), Some(_)) => Err(VectorError::MalformedFixture(
            "node contains both recipients and signers".to_string(),
        )),
        (recipients, signers) => Ok(recipients.or(signers)),
    }
}

/// Returns the value of the text-keyed field `name` of a CBOR map `node` for modification.
pub(crate) fn field_mut<'a>(node: &'a mut Value, name: &str) -> Option<&'a mut Value> {
    node.as_map_mut()?
        .iter_mut()
        .find(|(k, _)| k.as_text() == Some(name))
        .map(|(_, v)| v)
}

/// Intermediate values of one recipient in a test vector.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientIntermediates {
    /// Encoded KDF context of a key agreement.
    #[serde(rename = "Context_hex", deserialize_with = "hex::deserialize", default)]
    pub context: Vec<u8>,
    /// Shared secret of a key agreement.
    #[serde(rename = "Secret_hex", deserialize_with = "hex::deserialize", default)]
    pub secret: Vec<u8>,
}

/// Intermediate values of one signer in a test vector.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SignerIntermediates {
    /// Encoded `Sig_structure`.
    #[serde(rename = "ToBeSign_hex", deserialize_with = "hex::deserialize", default)]
    pub to_be_signed: Vec<u8>,
}

/// Intermediate values that should be produced while processing a test vector.
///
/// Values that are not given by the vector are empty.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Intermediates {
    /// Content encryption key.
    #[serde(rename = "CEK_hex", deserialize_with = "hex::deserialize", default)]
    pub cek: Vec<u8>,
    /// Encoded `Enc_structure`.
    #[serde(rename = "AAD_hex", deserialize_with = "hex::deserialize", default)]
    pub aad: Vec<u8>,
    /// Encoded `MAC_structure`. Some vectors misspell the field as `ToMax_hex`.
    #[serde(
        rename = "ToMac_hex",
        alias = "ToMax_hex",
        deserialize_with = "hex::deserialize",
        default
    )]
    pub to_mac: Vec<u8>,
    /// Encoded `Sig_structure` of a `COSE_Sign1` object.
    #[serde(rename = "ToBeSign_hex", deserialize_with = "hex::deserialize", default)]
    pub to_be_signed: Vec<u8>,
    /// Intermediates of the recipients, in order.
    #[serde(default)]
    pub recipients: Vec<RecipientIntermediates>,
    /// Intermediates of the signers, in order.
    #[serde(default)]
    pub signers: Vec<SignerIntermediates>,
}

/// A normalized test vector for one construction.
#[derive(Debug, Clone, PartialEq)]
pub struct TestVector {
    /// File the vector was loaded from.
    pub path: PathBuf,
    /// Title of the vector.
    pub title: String,
    /// Description of the vector, if any.
    pub description: Option<String>,
    /// Construction this vector was loaded for.
    pub construction: Construction,
    /// The normalized construction object (`input.<construction>`).
    pub object: Value,
    /// Plaintext of the vector, if any.
    pub plaintext: Option<String>,
    /// Random values consumed while creating the object, hex decoded.
    pub rng_stream: Vec<Vec<u8>>,
    /// Expected CBOR encoding of the created object.
    pub output: Vec<u8>,
    /// Expected intermediate values.
    pub intermediates: Intermediates,
    /// Whether processing the vector is expected to fail.
    pub fail: bool,
}

fn missing(name: &str) -> VectorError {
    VectorError::MalformedFixture(format!("vector has no {name}"))
}

fn decode_hex_text(name: &str, value: &JsonValue) -> Result<Vec<u8>, VectorError> {
    let text = value
        .as_str()
        .ok_or_else(|| VectorError::MalformedFixture(format!("{name} is not a string")))?;
    hex::decode(text).map_err(|e| VectorError::InvalidHex(name.to_string(), e))
}

/// Whether a `fail` or `failures` field exists anywhere in `value`, regardless of its value.
fn contains_fail_marker(value: &JsonValue) -> bool {
    match value {
        JsonValue::Object(map) => {
            map.contains_key("fail")
                || map.contains_key("failures")
                || map.values().any(contains_fail_marker)
        }
        JsonValue::Array(items) => items.iter().any(contains_fail_marker),
        _ => false,
    }
}

impl TestVector {
    /// Creates a test vector for `construction` from the parsed JSON document `json`.
    ///
    /// # Returns
    ///
    /// `None` if the `input` of the vector has no object for `construction`, and the
    /// normalized vector otherwise.
    ///
    /// # Errors
    ///
    /// - [`VectorError::MalformedFixture`] if `title`, `input`, `output.cbor` or
    ///   `intermediates` are missing or have the wrong shape.
    /// - [`VectorError::InvalidHex`] if a hex field can't be decoded.
    pub fn from_json<P: Into<PathBuf>>(
        path: P,
        construction: Construction,
        json: JsonValue,
    ) -> Result<Option<TestVector>, VectorError> {
        let input = json
            .get("input")
            .and_then(JsonValue::as_object)
            .ok_or_else(|| missing("input"))?;
        let Some(raw_object) = input.get(&construction.to_string()) else {
            return Ok(None);
        };

        let title = json
            .get("title")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| missing("title"))?
            .to_string();
        let output = decode_hex_text(
            "output.cbor",
            json.get("output")
                .and_then(|o| o.get("cbor"))
                .ok_or_else(|| missing("output.cbor"))?,
        )?;
        let intermediates = serde_json::from_value::<Intermediates>(
            json.get("intermediates")
                .cloned()
                .ok_or_else(|| missing("intermediates"))?,
        )
        .map_err(|e| VectorError::MalformedFixture(format!("invalid intermediates: {e}")))?;
        let rng_stream = match input.get("rng_stream") {
            None => Vec::new(),
            Some(JsonValue::Array(entries)) => entries
                .iter()
                .map(|e| decode_hex_text("rng_stream", e))
                .collect::<Result<_, _>>()?,
            Some(_) => {
                return Err(VectorError::MalformedFixture(
                    "rng_stream is not a list".to_string(),
                ))
            }
        };

        let fail = json.get("fail").is_some()
            || input.contains_key("failures")
            || contains_fail_marker(raw_object);

        let mut object = serde_json::from_value::<Value>(raw_object.clone()).map_err(|e| {
            VectorError::MalformedFixture(format!("invalid {construction} object: {e}"))
        })?;
        normalize_construction(&mut object)?;

        Ok(Some(TestVector {
            path: path.into(),
            title,
            description: json
                .get("description")
                .and_then(JsonValue::as_str)
                .map(String::from),
            construction,
            object,
            plaintext: input
                .get("plaintext")
                .and_then(JsonValue::as_str)
                .map(String::from),
            rng_stream,
            output,
            intermediates,
            fail,
        }))
    }

    fn header(&self, bucket: &str) -> Result<HeaderMap, VectorError> {
        field(&self.object, bucket)
            .map(HeaderMap::try_from)
            .transpose()
            .map(Option::unwrap_or_default)
    }

    /// Returns the protected header of the construction (empty if absent).
    ///
    /// # Errors
    ///
    /// Returns an error if the header contains labels or values that aren't valid COSE.
    pub fn protected_header(&self) -> Result<HeaderMap, VectorError> {
        self.header("protected")
    }

    /// Returns the unprotected header of the construction (empty if absent).
    ///
    /// For `encrypted` and `enveloped` constructions of vectors with an `rng_stream`, the
    /// entry at `rng_index` of the stream is set as IV.
    ///
    /// # Errors
    ///
    /// Returns an error if the header contains labels or values that aren't valid COSE, or if
    /// the stream has no entry at `rng_index`.
    pub fn unprotected_header(&self, rng_index: usize) -> Result<HeaderMap, VectorError> {
        let mut header = self.header("unprotected")?;
        if matches!(
            self.construction,
            Construction::Encrypted | Construction::Enveloped
        ) && !self.rng_stream.is_empty()
        {
            let iv = self.rng_stream.get(rng_index).ok_or_else(|| {
                VectorError::MalformedFixture(format!("rng_stream has no entry {rng_index}"))
            })?;
            header.insert(iana::HeaderParameter::Iv, iv.clone());
        }
        Ok(header)
    }

    /// Returns the full IV of a vector whose header only carries a partial IV.
    ///
    /// # Errors
    ///
    /// Returns an error if `unsent.IV_hex` is not valid hex.
    pub fn unsent_iv(&self) -> Result<Option<Vec<u8>>, VectorError> {
        match field(&self.object, "unsent").and_then(|u| field(u, "IV_hex")) {
            None => Ok(None),
            Some(Value::Text(iv)) => hex::decode(iv)
                .map(Some)
                .map_err(|e| VectorError::InvalidHex("unsent.IV_hex".to_string(), e)),
            Some(Value::Bytes(iv)) => Ok(Some(iv.clone())),
            Some(v) => Err(VectorError::MalformedFixture(format!(
                "unsent.IV_hex is not a string: {v:?}"
            ))),
        }
    }

    fn key_descriptor(&self) -> Result<Option<KeyDescriptor>, VectorError> {
        Ok(field(&self.object, "key")
            .map(KeyDescriptor::try_from)
            .transpose()?)
    }

    /// Returns the key of the construction (e.g. the MAC key of a `mac0` construction), using
    /// the key type of the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::Key`] if the key can't be materialized.
    pub fn key(&self) -> Result<Option<CoseKey>, VectorError> {
        self.key_descriptor()?
            .map(|d| materialize_any(&d).map_err(VectorError::from))
            .transpose()
    }

    /// Returns the key of the construction as a key of the given `variant`.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::Key`] if the key can't be materialized as `variant`.
    pub fn key_as(&self, variant: KeyVariant) -> Result<Option<CoseKey>, VectorError> {
        self.key_descriptor()?
            .map(|d| materialize(variant, &d).map_err(VectorError::from))
            .transpose()
    }

    /// Returns the recipients (or, for signatures, the signers) of the construction.
    ///
    /// # Errors
    ///
    /// Returns an error if a recipient can't be converted, see
    /// [`Recipient`](crate::recipient::Recipient), or if the construction contains both
    /// `recipients` and `signers`.
    pub fn recipients(&self) -> Result<Vec<Recipient>, VectorError> {
        match nested_list(&self.object)? {
            None => Ok(Vec::new()),
            Some(Value::Array(entries)) => entries.iter().map(Recipient::try_from).collect(),
            Some(v) => Err(VectorError::MalformedFixture(format!(
                "recipients are not a list: {v:?}"
            ))),
        }
    }
}
