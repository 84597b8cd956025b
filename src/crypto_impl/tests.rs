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
use core::fmt::Debug;

use ciborium::Value;
use coset::iana::EnumI64;
use coset::{iana, CoseKey, KeyType, Label};
use rstest::rstest;

#[cfg(feature = "openssl")]
use crate::crypto_impl::openssl::OpensslContext;
#[cfg(rustcrypto_base)]
use crate::crypto_impl::rustcrypto::RustCryptoContext;
use crate::crypto_impl::{HkdfHash, KeyAgreementCryptoBackend};
use crate::error::CoseCipherError;
use crate::key::{CoseEc2Key, CoseOkpKey};

const EPH_D: &str = "02D1F7E6F26C43D4868D87CEB2353161740AACF1F7163647984B522A848DF1C3";
const EPH_X: &str = "98F50A4FF6C05861C8860D13A638EA56C3F5AD7590BBFBF054E1C7B4D91D6280";
const EPH_Y: &str = "F01400B089867804B8E9FC96C3932161F1934F4223069170D924B7E03BF822BB";
const PEER_X: &str = "65EDA5A12577C2BAE829437FE338701A10AAA375E1BB5B5DE108DE439C08551D";
const PEER_Y: &str = "1E52ED75701163F7F9E40DDF9F341B3DC9BA860AF7E0CA7CA7E9EECD0084D19C";
const SHARED_SECRET: &str = "4B31712E096E5F20B4ECF9790FD8CC7C8B7E2C8AD90BDA81CB224F62C0E7B9A6";

const P521_D: &str = "00A1B2C3D4E5F60718293A4B5C6D7E8F90A1B2C3D4E5F60718293A4B5C6D7E8F90A1B2C3D4E5F60718293A4B5C6D7E8F90A1B2C3D4E5F60718293A4B5C6D7E8F9023";
const P521_X: &str = "00D561D801BFF278068E796FFDAFD3A89350D5AF20DC13F1597B0832FF88333C2A3301E678E023663684EB7C44F1D78459B2EA217FBE7EA4AE770BE3B8B3A3FE5FDE";
const P521_Y: &str = "01D0AB69A7AE0F2CF717AB5229D355E7C60D674027A6A1A8EFB78B1ED30F6FEDD5F0996CF8715474BF1A6B574F5E9B6C8ADD24A884EBDADF3850FD974DE0EDCA6259";
const P521_PEER_X: &str = "0122A0E94D5F9BC5234524572666A3580A755318798C0035DF1EA56B43E5ACBF94F466DC7D5BA627E7DCBA97FCE086B7071467510FCBB1052219F2DE65DDAD276486";
const P521_PEER_Y: &str = "00804F51FFC230FAB5AB77E665B167CD72A1D93009BD752B36CB75FF29F3F6BF34F47E40022B83B5E9E87EFE5308B9427ED5A279A438D091EEC278806B0E3DDA7A79";
const P521_SHARED_SECRET: &str = "00E9E071A9F66348141DE667226821852D8883975EBF3B9B400F0C37124CBDE5D279318EB14F94D0441B62F21EDCAE5694E3450FB1442C12D133B269AFFCC74AF404";

// RFC 7748, Section 6.1
const X25519_ALICE_D: &str = "77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a";
const X25519_ALICE_X: &str = "8520f0098930a754748b7ddcb43ef75a0dbf3a0d26381af4eba4a98eaa9b4e6a";
const X25519_BOB_X: &str = "de9edb7d7b7dc1b4d35b61c2ece435373f8343c85b78674dadfc7e146f882b4f";
const X25519_SHARED: &str = "4a5d9d5ba4ce2de1728e3bf480350f25e07e21c947d19e3376f09b3c1e161742";

fn key(kty: iana::KeyType, crv: iana::EllipticCurve, params: &[(i64, Value)]) -> CoseKey {
    let mut all_params = vec![(Label::Int(-1), Value::from(crv.to_i64()))];
    all_params.extend(params.iter().map(|(l, v)| (Label::Int(*l), v.clone())));
    CoseKey {
        kty: KeyType::Assigned(kty),
        params: all_params,
        ..CoseKey::default()
    }
}

fn bytes(hex_str: &str) -> Value {
    Value::Bytes(hex::decode(hex_str).unwrap())
}

fn perform_ecdh_ec2_test<B: KeyAgreementCryptoBackend>(mut backend: B)
where
    B::Error: Debug,
{
    let private = key(
        iana::KeyType::EC2,
        iana::EllipticCurve::P_256,
        &[(-4, bytes(EPH_D))],
    );
    let peer = key(
        iana::KeyType::EC2,
        iana::EllipticCurve::P_256,
        &[(-2, bytes(PEER_X)), (-3, bytes(PEER_Y))],
    );
    let private = CoseEc2Key::<B::Error>::try_from(&private).unwrap();
    let peer = CoseEc2Key::<B::Error>::try_from(&peer).unwrap();
    let shared = backend.ecdh_ec2(&private, &peer).unwrap();
    assert_eq!(shared, hex::decode(SHARED_SECRET).unwrap());
}

fn perform_ecdh_p521_test<B: KeyAgreementCryptoBackend>(mut backend: B)
where
    B::Error: Debug,
{
    let private = key(
        iana::KeyType::EC2,
        iana::EllipticCurve::P_521,
        &[(-4, bytes(P521_D))],
    );
    let peer = key(
        iana::KeyType::EC2,
        iana::EllipticCurve::P_521,
        &[(-2, bytes(P521_PEER_X)), (-3, bytes(P521_PEER_Y))],
    );
    let private = CoseEc2Key::<B::Error>::try_from(&private).unwrap();
    let peer = CoseEc2Key::<B::Error>::try_from(&peer).unwrap();
    let shared = backend.ecdh_ec2(&private, &peer).unwrap();
    // The shared secret keeps its leading zero byte.
    assert_eq!(hex::encode_upper(shared), P521_SHARED_SECRET);

    let (x, y) = backend
        .ec2_public_key(
            &coset::RegisteredLabelWithPrivate::Assigned(iana::EllipticCurve::P_521),
            &hex::decode(P521_D).unwrap(),
        )
        .unwrap();
    assert_eq!(hex::encode_upper(x), P521_X);
    assert_eq!(hex::encode_upper(y), P521_Y);
}

fn perform_ecdh_ec2_compressed_test<B: KeyAgreementCryptoBackend>(mut backend: B)
where
    B::Error: Debug,
{
    let private = key(
        iana::KeyType::EC2,
        iana::EllipticCurve::P_256,
        &[(-4, bytes(EPH_D))],
    );
    // The y coordinate of the peer key is even.
    let peer = key(
        iana::KeyType::EC2,
        iana::EllipticCurve::P_256,
        &[(-2, bytes(PEER_X)), (-3, Value::Bool(false))],
    );
    let private = CoseEc2Key::<B::Error>::try_from(&private).unwrap();
    let peer = CoseEc2Key::<B::Error>::try_from(&peer).unwrap();
    let shared = backend.ecdh_ec2(&private, &peer).unwrap();
    assert_eq!(shared, hex::decode(SHARED_SECRET).unwrap());
}

fn perform_ec2_public_key_test<B: KeyAgreementCryptoBackend>(mut backend: B)
where
    B::Error: Debug,
{
    let (x, y) = backend
        .ec2_public_key(
            &coset::RegisteredLabelWithPrivate::Assigned(iana::EllipticCurve::P_256),
            &hex::decode(EPH_D).unwrap(),
        )
        .unwrap();
    assert_eq!(hex::encode_upper(x), EPH_X);
    assert_eq!(hex::encode_upper(y), EPH_Y);
}

fn perform_ecdh_okp_test<B: KeyAgreementCryptoBackend>(mut backend: B)
where
    B::Error: Debug,
{
    let private = key(
        iana::KeyType::OKP,
        iana::EllipticCurve::X25519,
        &[(-4, bytes(X25519_ALICE_D))],
    );
    let peer = key(
        iana::KeyType::OKP,
        iana::EllipticCurve::X25519,
        &[(-2, bytes(X25519_BOB_X))],
    );
    let private = CoseOkpKey::<B::Error>::try_from(&private).unwrap();
    let peer = CoseOkpKey::<B::Error>::try_from(&peer).unwrap();
    assert_eq!(
        backend.ecdh_okp(&private, &peer).unwrap(),
        hex::decode(X25519_SHARED).unwrap()
    );
    assert_eq!(
        backend
            .okp_public_key(
                &coset::RegisteredLabelWithPrivate::Assigned(iana::EllipticCurve::X25519),
                &hex::decode(X25519_ALICE_D).unwrap()
            )
            .unwrap(),
        hex::decode(X25519_ALICE_X).unwrap()
    );
}

fn perform_unsupported_curve_test<B: KeyAgreementCryptoBackend>(mut backend: B)
where
    B::Error: Debug,
{
    let private = key(
        iana::KeyType::EC2,
        iana::EllipticCurve::Secp256k1,
        &[(-4, bytes(EPH_D))],
    );
    let private_view = CoseEc2Key::<B::Error>::try_from(&private).unwrap();
    assert!(matches!(
        backend.ecdh_ec2(&private_view, &private_view),
        Err(CoseCipherError::UnsupportedCurve(_))
    ));
}

fn perform_hkdf_test<B: KeyAgreementCryptoBackend>(mut backend: B)
where
    B::Error: Debug,
{
    // RFC 5869, Appendix A.1
    let okm = backend
        .hkdf(
            HkdfHash::Sha256,
            Some(&hex::decode("000102030405060708090a0b0c").unwrap()),
            &[0x0b; 22],
            &hex::decode("f0f1f2f3f4f5f6f7f8f9").unwrap(),
            42,
        )
        .unwrap();
    assert_eq!(
        hex::encode(okm),
        "3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf34007208d5b887185865"
    );

    // Direct ECDH with the context of a 128 bit content key and an A1013818 protected header.
    let cek = backend
        .hkdf(
            HkdfHash::Sha256,
            None,
            &hex::decode(SHARED_SECRET).unwrap(),
            &hex::decode("840183F6F6F683F6F6F682188044A1013818").unwrap(),
            16,
        )
        .unwrap();
    assert_eq!(hex::encode(cek), "56074d506729ca40c4b4fe50c6439893");
}

fn perform_hkdf_invalid_length_test<B: KeyAgreementCryptoBackend>(mut backend: B)
where
    B::Error: Debug,
{
    // At most 255 blocks of output can be generated.
    assert!(matches!(
        backend.hkdf(HkdfHash::Sha256, None, &[0; 32], &[], 255 * 32 + 1),
        Err(CoseCipherError::Other(_))
    ));
    assert!(matches!(
        backend.hkdf(HkdfHash::Sha512, None, &[0; 32], &[], usize::MAX),
        Err(CoseCipherError::Other(_))
    ));
    assert_eq!(
        backend
            .hkdf(
                HkdfHash::Sha512,
                None,
                &[0; 32],
                &[],
                HkdfHash::Sha512.max_output_len()
            )
            .unwrap()
            .len(),
        255 * 64
    );
}

#[cfg(rustcrypto_base)]
#[rstest]
fn rustcrypto_key_agreement(
    #[values(
        perform_ecdh_ec2_test::<RustCryptoContext>,
        perform_ecdh_p521_test::<RustCryptoContext>,
        perform_ecdh_ec2_compressed_test::<RustCryptoContext>,
        perform_ec2_public_key_test::<RustCryptoContext>,
        perform_ecdh_okp_test::<RustCryptoContext>,
        perform_unsupported_curve_test::<RustCryptoContext>,
        perform_hkdf_test::<RustCryptoContext>,
        perform_hkdf_invalid_length_test::<RustCryptoContext>
    )]
    test: fn(RustCryptoContext),
) {
    test(RustCryptoContext::new());
}

#[cfg(feature = "openssl")]
#[rstest]
fn openssl_key_agreement(
    #[values(
        perform_ecdh_ec2_test::<OpensslContext>,
        perform_ecdh_p521_test::<OpensslContext>,
        perform_ecdh_ec2_compressed_test::<OpensslContext>,
        perform_ec2_public_key_test::<OpensslContext>,
        perform_ecdh_okp_test::<OpensslContext>,
        perform_unsupported_curve_test::<OpensslContext>,
        perform_hkdf_test::<OpensslContext>,
        perform_hkdf_invalid_length_test::<OpensslContext>
    )]
    test: fn(OpensslContext),
) {
    test(OpensslContext::new());
}
