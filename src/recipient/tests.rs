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
use core::convert::Infallible;
use core::fmt::Debug;

use ciborium::Value;
use coset::iana::EnumI64;
use coset::{iana, Algorithm, CoseKey, CoseKeyBuilder, KeyType, Label};
use rstest::rstest;
use serde_json::json;

#[cfg(feature = "openssl")]
use crate::crypto_impl::openssl::OpensslContext;
#[cfg(rustcrypto_base)]
use crate::crypto_impl::rustcrypto::RustCryptoContext;
use crate::crypto_impl::{HkdfHash, KeyAgreementCryptoBackend};
use crate::error::{CoseCipherError, VectorError};
use crate::header::{HeaderMap, HeaderValue};
use crate::recipient::{
    ecdh_hkdf_hash, is_static_static, key_data_length, kw_algorithm, KdfContext, PartyInfo,
    PartyNonce, Recipient, SuppPubInfo,
};
use crate::vector::normalize_construction;

const MERIADOC_KID: &[u8] = b"meriadoc.brandybuck@buckland.example";
const MERIADOC_X: &str = "65EDA5A12577C2BAE829437FE338701A10AAA375E1BB5B5DE108DE439C08551D";
const MERIADOC_Y: &str = "1E52ED75701163F7F9E40DDF9F341B3DC9BA860AF7E0CA7CA7E9EECD0084D19C";
const EPH_D: &str = "02D1F7E6F26C43D4868D87CEB2353161740AACF1F7163647984B522A848DF1C3";
const EPH_X: &str = "98F50A4FF6C05861C8860D13A638EA56C3F5AD7590BBFBF054E1C7B4D91D6280";
const EPH_Y: &str = "F01400B089867804B8E9FC96C3932161F1934F4223069170D924B7E03BF822BB";
const CONTEXT: &str = "840183F6F6F683F6F6F682188044A1013818";
const CEK: &str = "56074D506729CA40C4B4FE50C6439893";

fn bytes(hex_str: &str) -> Vec<u8> {
    hex::decode(hex_str).unwrap()
}

fn key(kty: iana::KeyType, crv: iana::EllipticCurve, params: &[(i64, Vec<u8>)]) -> CoseKey {
    let mut all_params = vec![(
        Label::Int(iana::Ec2KeyParameter::Crv.to_i64()),
        Value::from(crv.to_i64()),
    )];
    all_params.extend(
        params
            .iter()
            .map(|(l, v)| (Label::Int(*l), Value::Bytes(v.clone()))),
    );
    CoseKey {
        kty: KeyType::Assigned(kty),
        params: all_params,
        ..CoseKey::default()
    }
}

fn ephemeral_private_key() -> CoseKey {
    key(
        iana::KeyType::EC2,
        iana::EllipticCurve::P_256,
        &[(iana::Ec2KeyParameter::D.to_i64(), bytes(EPH_D))],
    )
}

fn ephemeral_public_key() -> CoseKey {
    CoseKeyBuilder::new_ec2_pub_key(iana::EllipticCurve::P_256, bytes(EPH_X), bytes(EPH_Y)).build()
}

fn meriadoc_public_key() -> CoseKey {
    CoseKeyBuilder::new_ec2_pub_key(iana::EllipticCurve::P_256, bytes(MERIADOC_X), bytes(MERIADOC_Y))
        .key_id(MERIADOC_KID.to_vec())
        .build()
}

fn ecdh_es_recipient() -> Recipient {
    Recipient::new(
        HeaderMap::new().with(iana::HeaderParameter::Alg, iana::Algorithm::ECDH_ES_HKDF_256),
        HeaderMap::new(),
    )
}

fn expected_uhdr() -> String {
    format!(
        "A2045824{}20A401022001215820{EPH_X}225820{EPH_Y}",
        hex::encode_upper(MERIADOC_KID)
    )
}

fn perform_meriadoc_test<B: KeyAgreementCryptoBackend>(mut backend: B)
where
    B::Error: Debug,
{
    let mut recipient = ecdh_es_recipient();
    assert_eq!(recipient.encode_phdr().unwrap(), bytes("A1013818"));

    let context = recipient
        .kdf_context::<Infallible>(iana::Algorithm::A128GCM)
        .unwrap();
    assert_eq!(context.encode().unwrap(), bytes(CONTEXT));

    let cek = recipient
        .derive_kek(
            &mut backend,
            &ephemeral_private_key(),
            &meriadoc_public_key(),
            iana::Algorithm::ECDH_ES_HKDF_256,
            &context,
        )
        .unwrap();
    assert_eq!(cek, bytes(CEK));

    recipient.uhdr_update(
        HeaderMap::new()
            .with(iana::HeaderParameter::Kid, MERIADOC_KID.to_vec())
            .with(
                iana::HeaderAlgorithmParameter::EphemeralKey,
                ephemeral_public_key(),
            ),
    );
    assert_eq!(recipient.encode_uhdr().unwrap(), bytes(&expected_uhdr()));
    assert_eq!(
        recipient.to_vec().unwrap(),
        bytes(&format!("8344A1013818{}40", expected_uhdr()))
    );
}

fn perform_agree_direct_test<B: KeyAgreementCryptoBackend>(mut backend: B)
where
    B::Error: Debug,
{
    let mut node: Value = serde_json::from_value(json!({
        "protected": { "alg": "ECDH-ES" },
        "unprotected": { "kid": "meriadoc.brandybuck@buckland.example" },
        "key": {
            "kty": "EC",
            "kid": "meriadoc.brandybuck@buckland.example",
            "crv": "P-256",
            "x": "Ze2loSV3wrroKUN_4zhwGhCqo3Xhu1td4QjeQ5wIVR0",
            "y": "HlLtdXARY_f55A3fnzQbPcm6hgr34Mp8p-nuzQCE0Zw",
            "d": "r_kHyZ-a06rmxM3yESK84r1otSg-aQcVStkRhA-iCM8"
        },
        "sender_key": { "kty": "EC", "crv": "P-256", "d_hex": EPH_D }
    }))
    .unwrap();
    normalize_construction(&mut node).unwrap();
    let mut recipient = Recipient::try_from(&node).unwrap();

    let cek = recipient
        .agree_direct(&mut backend, iana::Algorithm::A128GCM)
        .unwrap();
    assert_eq!(cek, bytes(CEK));
    assert_eq!(recipient.encode_uhdr().unwrap(), bytes(&expected_uhdr()));
    assert_eq!(
        recipient.to_vec().unwrap(),
        bytes(&format!("8344A1013818{}40", expected_uhdr()))
    );
}

fn perform_agree_direct_static_test<B: KeyAgreementCryptoBackend>(mut backend: B)
where
    B::Error: Debug,
{
    let mut recipient = Recipient::new(
        HeaderMap::new().with(iana::HeaderParameter::Alg, iana::Algorithm::ECDH_SS_HKDF_256),
        HeaderMap::new(),
    );
    let mut sender_key = ephemeral_private_key();
    sender_key.key_id = b"peregrin.took@tuckborough.example".to_vec();
    recipient.sender_key = Some(sender_key);
    recipient.key = Some(meriadoc_public_key());

    let kek = recipient
        .agree_direct(&mut backend, iana::Algorithm::A128GCM)
        .unwrap();
    assert_eq!(kek.len(), 16);
    assert_eq!(
        recipient
            .unprotected
            .get(iana::HeaderAlgorithmParameter::StaticKeyId),
        Some(&HeaderValue::Bytes(
            b"peregrin.took@tuckborough.example".to_vec()
        ))
    );
    assert!(recipient
        .unprotected
        .get(iana::HeaderAlgorithmParameter::EphemeralKey)
        .is_none());
}

fn perform_key_wrap_context_test<B: KeyAgreementCryptoBackend>(mut backend: B)
where
    B::Error: Debug,
{
    let mut recipient = Recipient::new(
        HeaderMap::new().with(iana::HeaderParameter::Alg, iana::Algorithm::ECDH_ES_A256KW),
        HeaderMap::new(),
    );
    recipient.sender_key = Some(ephemeral_private_key());
    recipient.key = Some(meriadoc_public_key());
    recipient.payload = vec![0xAA; 40];

    let kek = recipient
        .agree_direct(&mut backend, iana::Algorithm::A128GCM)
        .unwrap();
    // The context names the key wrap algorithm, not the content algorithm.
    assert_eq!(kek.len(), 32);
    assert_eq!(recipient.payload, vec![0xAA; 40]);
}

fn perform_derive_kek_errors_test<B: KeyAgreementCryptoBackend>(mut backend: B)
where
    B::Error: Debug,
{
    let recipient = ecdh_es_recipient();
    let context = recipient
        .kdf_context::<Infallible>(iana::Algorithm::A128GCM)
        .unwrap();
    let private = ephemeral_private_key();
    let peer = meriadoc_public_key();

    assert!(matches!(
        recipient.derive_kek(
            &mut backend,
            &private,
            &peer,
            iana::Algorithm::A128GCM,
            &context
        ),
        Err(CoseCipherError::UnsupportedAlgorithm(_))
    ));

    let x25519_peer = key(
        iana::KeyType::OKP,
        iana::EllipticCurve::X25519,
        &[(iana::OkpKeyParameter::X.to_i64(), vec![9; 32])],
    );
    assert!(matches!(
        recipient.derive_kek(
            &mut backend,
            &private,
            &x25519_peer,
            iana::Algorithm::ECDH_ES_HKDF_256,
            &context
        ),
        Err(CoseCipherError::CurveMismatch(_, _))
    ));

    assert!(matches!(
        recipient.derive_kek(
            &mut backend,
            &peer,
            &peer,
            iana::Algorithm::ECDH_ES_HKDF_256,
            &context
        ),
        Err(CoseCipherError::MissingKeyParam(_))
    ));

    assert!(matches!(
        recipient.derive_kek(
            &mut backend,
            &private,
            &private,
            iana::Algorithm::ECDH_ES_HKDF_256,
            &context
        ),
        Err(CoseCipherError::UnexpectedKeyParam(_))
    ));

    let mut oversized = context.clone();
    oversized.supp_pub.key_data_length = u64::MAX;
    assert!(matches!(
        recipient.derive_kek(
            &mut backend,
            &private,
            &peer,
            iana::Algorithm::ECDH_ES_HKDF_256,
            &oversized
        ),
        Err(CoseCipherError::Other(_))
    ));
}

fn perform_agree_direct_missing_keys_test<B: KeyAgreementCryptoBackend>(mut backend: B)
where
    B::Error: Debug,
{
    let mut recipient = ecdh_es_recipient();
    assert!(matches!(
        recipient.agree_direct(&mut backend, iana::Algorithm::A128GCM),
        Err(CoseCipherError::MissingKey("sender key"))
    ));
    recipient.sender_key = Some(ephemeral_private_key());
    assert!(matches!(
        recipient.agree_direct(&mut backend, iana::Algorithm::A128GCM),
        Err(CoseCipherError::MissingKey("recipient key"))
    ));

    let mut recipient = Recipient::new(
        HeaderMap::new().with(iana::HeaderParameter::Alg, iana::Algorithm::A128KW),
        HeaderMap::new(),
    );
    assert!(matches!(
        recipient.agree_direct(&mut backend, iana::Algorithm::A128GCM),
        Err(CoseCipherError::UnsupportedAlgorithm(Algorithm::Assigned(
            iana::Algorithm::A128KW
        )))
    ));
}

#[cfg(rustcrypto_base)]
#[rstest]
fn rustcrypto_recipient(
    #[values(
        perform_meriadoc_test::<RustCryptoContext>,
        perform_agree_direct_test::<RustCryptoContext>,
        perform_agree_direct_static_test::<RustCryptoContext>,
        perform_key_wrap_context_test::<RustCryptoContext>,
        perform_derive_kek_errors_test::<RustCryptoContext>,
        perform_agree_direct_missing_keys_test::<RustCryptoContext>
    )]
    test: fn(RustCryptoContext),
) {
    test(RustCryptoContext::new());
}

#[cfg(feature = "openssl")]
#[rstest]
fn openssl_recipient(
    #[values(
        perform_meriadoc_test::<OpensslContext>,
        perform_agree_direct_test::<OpensslContext>,
        perform_agree_direct_static_test::<OpensslContext>,
        perform_key_wrap_context_test::<OpensslContext>,
        perform_derive_kek_errors_test::<OpensslContext>,
        perform_agree_direct_missing_keys_test::<OpensslContext>
    )]
    test: fn(OpensslContext),
) {
    test(OpensslContext::new());
}

#[rstest]
fn empty_protected_header() {
    let recipient = Recipient::default();
    assert_eq!(recipient.encode_phdr().unwrap(), vec![0xA0]);
    assert_eq!(recipient.to_vec().unwrap(), bytes("8341A0A040"));
}

#[rstest]
fn header_updates() {
    let mut recipient = ecdh_es_recipient();
    recipient.phdr_update(
        HeaderMap::new().with(iana::HeaderParameter::Alg, iana::Algorithm::ECDH_SS_HKDF_256),
    );
    recipient.uhdr_update(HeaderMap::new().with(iana::HeaderParameter::Kid, b"kid".to_vec()));
    assert_eq!(recipient.encode_phdr().unwrap(), bytes("A101381A"));
    assert_eq!(recipient.encode_uhdr().unwrap(), bytes("A104436B6964"));
    assert_eq!(
        recipient.algorithm(),
        Some(Algorithm::Assigned(iana::Algorithm::ECDH_SS_HKDF_256))
    );
}

#[rstest]
fn duplicate_headers_are_rejected() {
    let recipient = Recipient::new(
        HeaderMap::new().with(iana::HeaderParameter::Alg, iana::Algorithm::ECDH_ES_HKDF_256),
        HeaderMap::new().with(iana::HeaderParameter::Alg, iana::Algorithm::ECDH_ES_HKDF_512),
    );
    assert!(matches!(
        recipient.to_vec(),
        Err(CoseCipherError::DuplicateHeaders(labels)) if labels == vec![Label::Int(1)]
    ));
}

#[rstest]
fn nested_recipients_are_encoded() {
    let mut recipient = ecdh_es_recipient();
    recipient.recipients.push(Recipient::default());
    assert_eq!(recipient.to_vec().unwrap(), bytes("8444A1013818A040818341A0A040"));
}

#[rstest]
fn kdf_context_with_party_info() {
    let context = KdfContext::builder()
        .algorithm(iana::Algorithm::A128GCM)
        .party_u(PartyInfo::builder().identity(b"id".to_vec()).build().unwrap())
        .party_v(PartyInfo::builder().nonce(PartyNonce::Integer(5)).build().unwrap())
        .supp_pub(
            SuppPubInfo::builder()
                .key_data_length(128u64)
                .protected(bytes("A1013818"))
                .other(vec![0x01])
                .build()
                .unwrap(),
        )
        .supp_priv(vec![0x02])
        .build()
        .unwrap();
    assert_eq!(context.key_length(), 16);
    assert_eq!(
        context.encode().unwrap(),
        bytes("850183426964F6F683F605F683188044A101381841014102")
    );
}

#[rstest]
fn kdf_context_from_headers() {
    let recipient = Recipient::new(
        HeaderMap::new().with(iana::HeaderParameter::Alg, iana::Algorithm::ECDH_ES_HKDF_256),
        HeaderMap::new()
            .with(iana::HeaderAlgorithmParameter::PartyUIdentity, b"lighting-client".to_vec())
            .with(iana::HeaderAlgorithmParameter::PartyVNonce, 7i64),
    );
    let context = recipient
        .kdf_context::<Infallible>(iana::Algorithm::A256GCM)
        .unwrap();
    assert_eq!(context.party_u.identity, Some(b"lighting-client".to_vec()));
    assert_eq!(context.party_v.nonce, Some(PartyNonce::Integer(7)));
    assert_eq!(context.supp_pub.key_data_length, 256);
    assert_eq!(context.supp_pub.protected, bytes("A1013818"));

    let invalid = Recipient::new(
        HeaderMap::new(),
        HeaderMap::new().with(iana::HeaderAlgorithmParameter::PartyUIdentity, 1i64),
    );
    assert!(matches!(
        invalid.kdf_context::<Infallible>(iana::Algorithm::A256GCM),
        Err(CoseCipherError::InvalidHeaderParam(_, _))
    ));
    assert!(matches!(
        recipient.kdf_context::<Infallible>(iana::Algorithm::Direct),
        Err(CoseCipherError::UnsupportedAlgorithm(_))
    ));
}

#[rstest]
#[case(iana::Algorithm::A128GCM, Some(128))]
#[case(iana::Algorithm::A192KW, Some(192))]
#[case(iana::Algorithm::ChaCha20Poly1305, Some(256))]
#[case(iana::Algorithm::HMAC_384_384, Some(384))]
#[case(iana::Algorithm::AES_MAC_128_64, Some(128))]
#[case(iana::Algorithm::ES256, None)]
fn key_data_lengths(#[case] alg: iana::Algorithm, #[case] bits: Option<u64>) {
    assert_eq!(key_data_length(alg), bits);
}

#[rstest]
fn ecdh_algorithm_tables() {
    assert_eq!(
        ecdh_hkdf_hash(iana::Algorithm::ECDH_SS_HKDF_512),
        Some(HkdfHash::Sha512)
    );
    assert_eq!(
        ecdh_hkdf_hash(iana::Algorithm::ECDH_ES_A192KW),
        Some(HkdfHash::Sha256)
    );
    assert_eq!(ecdh_hkdf_hash(iana::Algorithm::Direct_HKDF_SHA_256), None);
    assert_eq!(
        kw_algorithm(iana::Algorithm::ECDH_SS_A128KW),
        Some(iana::Algorithm::A128KW)
    );
    assert_eq!(kw_algorithm(iana::Algorithm::ECDH_ES_HKDF_256), None);
    assert!(is_static_static(iana::Algorithm::ECDH_SS_A256KW));
    assert!(!is_static_static(iana::Algorithm::ECDH_ES_HKDF_512));
}

#[rstest]
fn recipient_tree_from_value() {
    let mut node: Value = serde_json::from_value(json!({
        "protected": { "alg": "ECDH-SS" },
        "recipients": [
            { "unprotected": { "kid": "a" } },
            { "unprotected": { "kid": "b" }, "signers": [{ "protected": { "alg": "ES256" } }] }
        ]
    }))
    .unwrap();
    normalize_construction(&mut node).unwrap();
    let recipient = Recipient::try_from(&node).unwrap();
    assert_eq!(
        recipient.algorithm(),
        Some(Algorithm::Assigned(iana::Algorithm::ECDH_SS_HKDF_256))
    );
    assert_eq!(recipient.recipients.len(), 2);
    assert_eq!(recipient.recipients[0].unprotected.key_id(), Some(b"a".as_slice()));
    assert_eq!(recipient.recipients[1].unprotected.key_id(), Some(b"b".as_slice()));
    assert_eq!(recipient.recipients[1].recipients.len(), 1);
    assert!(recipient.key.is_none());
}

#[rstest]
fn recipient_with_recipients_and_signers() {
    let mut node: Value = serde_json::from_value(json!({
        "protected": { "alg": "ECDH-SS" },
        "recipients": [{ "unprotected": { "kid": "a" } }],
        "signers": [{ "protected": { "alg": "ES256" } }]
    }))
    .unwrap();
    normalize_construction(&mut node).unwrap();
    assert!(matches!(
        Recipient::try_from(&node),
        Err(VectorError::MalformedFixture(_))
    ));
}

#[rstest]
fn recipient_from_unnormalized_value() {
    let node: Value = serde_json::from_value(json!({ "protected": { "alg": "ECDH-ES" } })).unwrap();
    assert!(matches!(
        Recipient::try_from(&node),
        Err(VectorError::UnmappedHeaderLabel(_))
    ));
    assert!(matches!(
        Recipient::try_from(&Value::Array(vec![])),
        Err(VectorError::MalformedFixture(_))
    ));
}
