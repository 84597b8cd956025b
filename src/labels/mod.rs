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

//! Static tables mapping the human-readable names used in test vector files to the canonical
//! labels of the COSE data model.
//!
//! All lookups return [`Option`]s. Whether a miss is an error or a pass-through of an already
//! canonical value is up to the caller.

use std::collections::HashMap;

use coset::iana;
use coset::iana::EnumI64;
use lazy_static::lazy_static;

use crate::header::HeaderParam;

#[cfg(test)]
mod tests;

/// Suffix that marks a field whose value is hex encoded text.
pub const HEX_SUFFIX: &str = "_hex";

lazy_static! {
    static ref ALGORITHMS: HashMap<&'static str, iana::Algorithm> = HashMap::from([
        ("A128GCM", iana::Algorithm::A128GCM),
        ("A192GCM", iana::Algorithm::A192GCM),
        ("A256GCM", iana::Algorithm::A256GCM),
        ("AES-CCM-16-128/64", iana::Algorithm::AES_CCM_16_64_128),
        ("AES-CCM-16-256/64", iana::Algorithm::AES_CCM_16_64_256),
        ("AES-CCM-64-128/64", iana::Algorithm::AES_CCM_64_64_128),
        ("AES-CCM-64-256/64", iana::Algorithm::AES_CCM_64_64_256),
        ("AES-CCM-16-128/128", iana::Algorithm::AES_CCM_16_128_128),
        ("AES-CCM-16-256/128", iana::Algorithm::AES_CCM_16_128_256),
        ("AES-CCM-64-128/128", iana::Algorithm::AES_CCM_64_128_128),
        ("AES-CCM-64-256/128", iana::Algorithm::AES_CCM_64_128_256),
        ("ChaCha-Poly1305", iana::Algorithm::ChaCha20Poly1305),
        ("direct", iana::Algorithm::Direct),
        ("HKDF-HMAC-SHA-256", iana::Algorithm::Direct_HKDF_SHA_256),
        ("HKDF-HMAC-SHA-512", iana::Algorithm::Direct_HKDF_SHA_512),
        ("ECDH-ES", iana::Algorithm::ECDH_ES_HKDF_256),
        ("ECDH-ES-512", iana::Algorithm::ECDH_ES_HKDF_512),
        ("ECDH-SS", iana::Algorithm::ECDH_SS_HKDF_256),
        ("ECDH-SS-256", iana::Algorithm::ECDH_SS_HKDF_256),
        ("ECDH-SS-512", iana::Algorithm::ECDH_SS_HKDF_512),
        ("ECDH-ES-A128KW", iana::Algorithm::ECDH_ES_A128KW),
        ("ECDH-ES-A192KW", iana::Algorithm::ECDH_ES_A192KW),
        ("ECDH-ES-A256KW", iana::Algorithm::ECDH_ES_A256KW),
        ("ECDH-SS-A128KW", iana::Algorithm::ECDH_SS_A128KW),
        ("ECDH-SS-A192KW", iana::Algorithm::ECDH_SS_A192KW),
        ("ECDH-SS-A256KW", iana::Algorithm::ECDH_SS_A256KW),
        ("A128KW", iana::Algorithm::A128KW),
        ("A192KW", iana::Algorithm::A192KW),
        ("A256KW", iana::Algorithm::A256KW),
        ("HS256", iana::Algorithm::HMAC_256_256),
        ("HS384", iana::Algorithm::HMAC_384_384),
        ("HS512", iana::Algorithm::HMAC_512_512),
        ("HS256/64", iana::Algorithm::HMAC_256_64),
        ("AES-MAC-128/64", iana::Algorithm::AES_MAC_128_64),
        ("AES-MAC-256/64", iana::Algorithm::AES_MAC_256_64),
        ("AES-MAC-128/128", iana::Algorithm::AES_MAC_128_128),
        ("AES-MAC-256/128", iana::Algorithm::AES_MAC_256_128),
        ("ES256", iana::Algorithm::ES256),
        ("ES384", iana::Algorithm::ES384),
        ("ES512", iana::Algorithm::ES512),
    ]);
    static ref HEADER_ATTRIBUTES: HashMap<&'static str, HeaderParam> = HashMap::from([
        ("alg", HeaderParam::Generic(iana::HeaderParameter::Alg)),
        ("ctyp", HeaderParam::Generic(iana::HeaderParameter::ContentType)),
        ("kid", HeaderParam::Generic(iana::HeaderParameter::Kid)),
        ("kid_hex", HeaderParam::Generic(iana::HeaderParameter::Kid)),
        ("IV_hex", HeaderParam::Generic(iana::HeaderParameter::Iv)),
        ("partialIV", HeaderParam::Generic(iana::HeaderParameter::PartialIv)),
        ("partialIV_hex", HeaderParam::Generic(iana::HeaderParameter::PartialIv)),
        ("epk", HeaderParam::Algorithm(iana::HeaderAlgorithmParameter::EphemeralKey)),
        ("salt", HeaderParam::Algorithm(iana::HeaderAlgorithmParameter::Salt)),
        ("salt_hex", HeaderParam::Algorithm(iana::HeaderAlgorithmParameter::Salt)),
    ]);
    static ref KEY_PARAMETERS: HashMap<&'static str, i64> = HashMap::from([
        ("kty", iana::KeyParameter::Kty.to_i64()),
        ("kid", iana::KeyParameter::Kid.to_i64()),
        ("crv", iana::Ec2KeyParameter::Crv.to_i64()),
        ("k", iana::SymmetricKeyParameter::K.to_i64()),
        ("k_hex", iana::SymmetricKeyParameter::K.to_i64()),
        ("x", iana::Ec2KeyParameter::X.to_i64()),
        ("x_hex", iana::Ec2KeyParameter::X.to_i64()),
        ("y", iana::Ec2KeyParameter::Y.to_i64()),
        ("y_hex", iana::Ec2KeyParameter::Y.to_i64()),
        ("d", iana::Ec2KeyParameter::D.to_i64()),
        ("d_hex", iana::Ec2KeyParameter::D.to_i64()),
    ]);
    static ref KEY_ATTRIBUTES: HashMap<&'static str, i64> = HashMap::from([
        ("EC", iana::KeyType::EC2.to_i64()),
        ("OKP", iana::KeyType::OKP.to_i64()),
        ("oct", iana::KeyType::Symmetric.to_i64()),
        ("P-256", iana::EllipticCurve::P_256.to_i64()),
        ("P-384", iana::EllipticCurve::P_384.to_i64()),
        ("P-521", iana::EllipticCurve::P_521.to_i64()),
        ("X25519", iana::EllipticCurve::X25519.to_i64()),
        ("X448", iana::EllipticCurve::X448.to_i64()),
        ("Ed25519", iana::EllipticCurve::Ed25519.to_i64()),
        ("Ed448", iana::EllipticCurve::Ed448.to_i64()),
    ]);
}

/// Looks up the algorithm registered under the given vector-file `name`, e.g. `"A128GCM"`.
#[must_use]
pub fn lookup_algorithm(name: &str) -> Option<iana::Algorithm> {
    ALGORITHMS.get(name).copied()
}

/// Looks up the header parameter for a header attribute `name`, e.g. `"kid"` or `"kid_hex"`.
#[must_use]
pub fn lookup_header_attribute(name: &str) -> Option<HeaderParam> {
    HEADER_ATTRIBUTES.get(name).copied()
}

/// Looks up the integer label of a key parameter `name`.
///
/// Names with the [`HEX_SUFFIX`] map to the same label as the name without it, as both
/// spellings are used for the same field in vector files.
///
/// Note that some labels are key type specific: `"crv"` and `"k"` both map to `-1`.
#[must_use]
pub fn lookup_key_parameter(name: &str) -> Option<i64> {
    KEY_PARAMETERS.get(name).copied()
}

/// Looks up the integer value of a key attribute value `name`, i.e. a key type (`"EC"`) or a
/// curve (`"P-256"`).
#[must_use]
pub fn lookup_key_attribute(name: &str) -> Option<i64> {
    KEY_ATTRIBUTES.get(name).copied()
}

/// Returns whether a field `name` carries hex encoded text.
#[must_use]
pub fn is_hex_field(name: &str) -> bool {
    name.ends_with(HEX_SUFFIX)
}
