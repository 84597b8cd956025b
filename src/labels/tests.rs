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
use coset::iana;
use rstest::rstest;

use crate::header::HeaderParam;
use crate::labels::{
    is_hex_field, lookup_algorithm, lookup_header_attribute, lookup_key_attribute,
    lookup_key_parameter,
};

#[rstest]
#[case("A128GCM", iana::Algorithm::A128GCM)]
#[case("AES-CCM-64-256/128", iana::Algorithm::AES_CCM_64_128_256)]
#[case("ECDH-ES", iana::Algorithm::ECDH_ES_HKDF_256)]
#[case("ECDH-SS", iana::Algorithm::ECDH_SS_HKDF_256)]
#[case("ECDH-SS-256", iana::Algorithm::ECDH_SS_HKDF_256)]
#[case("ECDH-ES-A192KW", iana::Algorithm::ECDH_ES_A192KW)]
#[case("HS256/64", iana::Algorithm::HMAC_256_64)]
#[case("HKDF-HMAC-SHA-512", iana::Algorithm::Direct_HKDF_SHA_512)]
#[case("ChaCha-Poly1305", iana::Algorithm::ChaCha20Poly1305)]
#[case("ES512", iana::Algorithm::ES512)]
fn lookup_algorithm_known_names(#[case] name: &str, #[case] expected: iana::Algorithm) {
    assert_eq!(lookup_algorithm(name), Some(expected));
}

#[test]
fn lookup_algorithm_miss() {
    assert_eq!(lookup_algorithm("RSA-OAEP"), None);
    // Lookups are exact, no case folding.
    assert_eq!(lookup_algorithm("a128gcm"), None);
}

#[rstest]
#[case("alg", HeaderParam::Generic(iana::HeaderParameter::Alg))]
#[case("ctyp", HeaderParam::Generic(iana::HeaderParameter::ContentType))]
#[case("kid", HeaderParam::Generic(iana::HeaderParameter::Kid))]
#[case("kid_hex", HeaderParam::Generic(iana::HeaderParameter::Kid))]
#[case("partialIV_hex", HeaderParam::Generic(iana::HeaderParameter::PartialIv))]
#[case("epk", HeaderParam::Algorithm(iana::HeaderAlgorithmParameter::EphemeralKey))]
fn lookup_header_attribute_known_names(#[case] name: &str, #[case] expected: HeaderParam) {
    assert_eq!(lookup_header_attribute(name), Some(expected));
}

#[test]
fn hex_suffixed_key_parameters_share_labels() {
    for name in ["k", "x", "y", "d"] {
        let hex_name = format!("{name}_hex");
        assert!(is_hex_field(&hex_name));
        assert!(!is_hex_field(name));
        assert_eq!(lookup_key_parameter(name), lookup_key_parameter(&hex_name));
        assert!(lookup_key_parameter(name).is_some());
    }
}

#[rstest]
#[case("kty", 1)]
#[case("kid", 2)]
#[case("crv", -1)]
#[case("k", -1)]
#[case("x", -2)]
#[case("y", -3)]
#[case("d", -4)]
fn lookup_key_parameter_known_names(#[case] name: &str, #[case] expected: i64) {
    assert_eq!(lookup_key_parameter(name), Some(expected));
}

#[rstest]
#[case("EC", 2)]
#[case("OKP", 1)]
#[case("oct", 4)]
#[case("P-256", 1)]
#[case("P-384", 2)]
#[case("P-521", 3)]
#[case("X25519", 4)]
#[case("X448", 5)]
fn lookup_key_attribute_known_names(#[case] name: &str, #[case] expected: i64) {
    assert_eq!(lookup_key_attribute(name), Some(expected));
}

#[test]
fn unmapped_names_are_misses() {
    assert_eq!(lookup_header_attribute("reserved"), None);
    assert_eq!(lookup_key_parameter("use"), None);
    assert_eq!(lookup_key_attribute("RSA"), None);
}
