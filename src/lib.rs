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

//! A known-answer conformance harness for [COSE](https://www.rfc-editor.org/rfc/rfc9052) implementations.
//!
//! This crate reads the JSON test vectors published by the
//! [cose-wg/Examples](https://github.com/cose-wg/Examples) repository and turns them into typed
//! values that an implementation under test can be checked against.
//! Key features include:
//! - Canonical label tables ([`labels`]) translating the human-readable names used in vector
//!   files into the integer labels of RFC 9052/9053.
//! - Normalization of vector construction objects ([`normalize_construction`]) and loading of
//!   whole fixture directories ([`LoaderConfig`], [`load_vectors`]).
//! - Materialization of key descriptors into [`CoseKey`](coset::CoseKey)s ([`materialize`]).
//! - Ordered header maps with canonical CBOR encoding ([`HeaderMap`]).
//! - Recipients using ECDH key agreement with HKDF (RFC 9053, Section 6.3), including the
//!   construction of the `COSE_KDF_Context` ([`Recipient`], [`KdfContext`]).
//!
//! Cryptographic primitives are provided by backends implementing
//! [`KeyAgreementCryptoBackend`]. The `rustcrypto` feature (enabled by default) provides
//! [`RustCryptoContext`](crypto_impl::rustcrypto::RustCryptoContext), the `openssl` feature
//! provides [`OpensslContext`](crypto_impl::openssl::OpensslContext).
//!
//! Performing the content encryption, MAC or signature operations of a vector is *out of scope*
//! for this crate, as is fetching the vector repository itself.
//!
//! # Usage
//! ```toml
//! [dev-dependencies]
//! cose-conformance = { version = "^0.1.0" }
//! ```
//! Or, if you want to use OpenSSL instead of the RustCrypto crates:
//! ```toml
//! [dev-dependencies]
//! cose-conformance = { version = "^0.1.0", default-features = false, features = ["openssl"] }
//! ```
//!
//! # Example
//! Vectors are usually loaded per [`FixtureSuite`] from a checkout of the vector repository.
//! The fixture root defaults to [`DEFAULT_FIXTURE_ROOT`](vector::loader::DEFAULT_FIXTURE_ROOT)
//! and can be overridden through the `COSE_FIXTURE_DIR` environment variable:
//! ```no_run
//! # use std::error::Error;
//! use cose_conformance::{FixtureSuite, LoaderConfig};
//!
//! let suite = LoaderConfig::from_env().load(FixtureSuite::EcdhDirect)?;
//! for vector in &suite.vectors {
//!     println!("{}: {} recipient(s)", vector.title, vector.recipients()?.len());
//! }
//! for skipped in &suite.skipped {
//!     println!("skipped {}: {}", skipped.path.display(), skipped.reason);
//! }
//! # Ok::<(), Box<dyn Error>>(())
//! ```
//!
//! Recipients of an enveloped vector can then derive the content encryption key, which is
//! compared against the `CEK_hex` intermediate of the vector:
//! ```
//! # use std::error::Error;
//! use cose_conformance::crypto_impl::rustcrypto::RustCryptoContext;
//! use cose_conformance::{Construction, TestVector};
//! use coset::iana;
//! use serde_json::json;
//!
//! let vector = TestVector::from_json(
//!     "p256-hkdf-256-01.json",
//!     Construction::Enveloped,
//!     json!({
//!         "title": "ECDH-ES direct: P-256, HKDF-256",
//!         "input": {
//!             "plaintext": "This is the content.",
//!             "enveloped": {
//!                 "protected": { "alg": "A128GCM" },
//!                 "recipients": [{
//!                     "protected": { "alg": "ECDH-ES" },
//!                     "unprotected": { "kid": "meriadoc.brandybuck@buckland.example" },
//!                     "key": {
//!                         "kty": "EC",
//!                         "crv": "P-256",
//!                         "x": "Ze2loSV3wrroKUN_4zhwGhCqo3Xhu1td4QjeQ5wIVR0",
//!                         "y": "HlLtdXARY_f55A3fnzQbPcm6hgr34Mp8p-nuzQCE0Zw",
//!                         "d": "r_kHyZ-a06rmxM3yESK84r1otSg-aQcVStkRhA-iCM8"
//!                     },
//!                     "sender_key": {
//!                         "kty": "EC",
//!                         "crv": "P-256",
//!                         "d_hex": "02D1F7E6F26C43D4868D87CEB2353161740AACF1F7163647984B522A848DF1C3"
//!                     }
//!                 }]
//!             }
//!         },
//!         "intermediates": { "CEK_hex": "56074D506729CA40C4B4FE50C6439893" },
//!         "output": { "cbor": "D8608443A10101A0F68140" }
//!     }),
//! )?
//! .expect("vector contains an enveloped construction");
//!
//! let mut recipient = vector.recipients()?.remove(0);
//! let cek = recipient
//!     .agree_direct(&mut RustCryptoContext, iana::Algorithm::A128GCM)
//!     .unwrap();
//! assert_eq!(cek, vector.intermediates.cek);
//! # Ok::<(), Box<dyn Error>>(())
//! ```

#![deny(rustdoc::broken_intra_doc_links, clippy::pedantic)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]
// These ones are a little too eager
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::wildcard_imports
)]
#[macro_use]
extern crate derive_builder;

#[doc(inline)]
pub use crypto_impl::{CryptoBackend, HkdfHash, KeyAgreementCryptoBackend};
#[doc(inline)]
pub use error::{CoseCipherError, KeyError, VectorError};
#[doc(inline)]
pub use header::{HeaderMap, HeaderParam, HeaderValue};
#[doc(inline)]
pub use key::{materialize, materialize_any, KeyDescriptor, KeyVariant};
#[doc(inline)]
pub use recipient::{KdfContext, PartyInfo, PartyNonce, Recipient, SuppPubInfo};
#[doc(inline)]
pub use vector::{
    load_vectors, normalize_construction, Construction, FixtureSuite, LoadedSuite, LoaderConfig,
    TestVector,
};

pub mod crypto_impl;
pub mod error;
pub mod header;
pub mod key;
pub mod labels;
pub mod recipient;
pub mod vector;
