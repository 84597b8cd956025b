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
use ciborium::Value;
use coset::iana;
use elliptic_curve::sec1::{FromEncodedPoint, ModulusSize, ToEncodedPoint};
use elliptic_curve::{AffinePoint, CurveArithmetic, FieldBytesSize, PublicKey, SecretKey};
use hkdf::Hkdf;
use p256::NistP256;
use p384::NistP384;
use p521::NistP521;
use sha2::{Sha256, Sha512};

use crate::crypto_impl::rustcrypto::{CoseRustCryptoCipherError, RustCryptoContext};
use crate::crypto_impl::{CryptoBackend, HkdfHash, KeyAgreementCryptoBackend};
use crate::error::CoseCipherError;
use crate::key::{CoseEc2Key, CoseOkpKey, EllipticCurve};

type RustCryptoResult<T> = Result<T, CoseCipherError<CoseRustCryptoCipherError>>;

impl KeyAgreementCryptoBackend for RustCryptoContext {
    fn ecdh_ec2(
        &mut self,
        private_key: &CoseEc2Key<'_, Self::Error>,
        public_key: &CoseEc2Key<'_, Self::Error>,
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        match &private_key.crv {
            EllipticCurve::Assigned(iana::EllipticCurve::P_256) => {
                Self::ecdh_with_curve::<NistP256>(private_key, public_key)
            }
            EllipticCurve::Assigned(iana::EllipticCurve::P_384) => {
                Self::ecdh_with_curve::<NistP384>(private_key, public_key)
            }
            EllipticCurve::Assigned(iana::EllipticCurve::P_521) => {
                Self::ecdh_with_curve::<NistP521>(private_key, public_key)
            }
            v => Err(CoseCipherError::UnsupportedCurve(v.clone())),
        }
    }

    fn ecdh_okp(
        &mut self,
        private_key: &CoseOkpKey<'_, Self::Error>,
        public_key: &CoseOkpKey<'_, Self::Error>,
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        match &private_key.crv {
            EllipticCurve::Assigned(iana::EllipticCurve::X25519) => {
                let secret = x25519_secret(private_key)?;
                let peer = match public_key.x {
                    Some(x) => x25519_dalek::PublicKey::from(x25519_bytes(
                        iana::OkpKeyParameter::X,
                        x,
                    )?),
                    None => x25519_dalek::PublicKey::from(&x25519_secret(public_key)?),
                };
                Ok(secret.diffie_hellman(&peer).as_bytes().to_vec())
            }
            v => Err(CoseCipherError::UnsupportedCurve(v.clone())),
        }
    }

    fn ec2_public_key(
        &mut self,
        crv: &EllipticCurve,
        d: &[u8],
    ) -> Result<(Vec<u8>, Vec<u8>), CoseCipherError<Self::Error>> {
        match crv {
            EllipticCurve::Assigned(iana::EllipticCurve::P_256) => {
                Self::public_point_with_curve::<NistP256>(d)
            }
            EllipticCurve::Assigned(iana::EllipticCurve::P_384) => {
                Self::public_point_with_curve::<NistP384>(d)
            }
            EllipticCurve::Assigned(iana::EllipticCurve::P_521) => {
                Self::public_point_with_curve::<NistP521>(d)
            }
            v => Err(CoseCipherError::UnsupportedCurve(v.clone())),
        }
    }

    fn okp_public_key(
        &mut self,
        crv: &EllipticCurve,
        d: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        match crv {
            EllipticCurve::Assigned(iana::EllipticCurve::X25519) => {
                let secret =
                    x25519_dalek::StaticSecret::from(x25519_bytes(iana::OkpKeyParameter::D, d)?);
                Ok(x25519_dalek::PublicKey::from(&secret).as_bytes().to_vec())
            }
            v => Err(CoseCipherError::UnsupportedCurve(v.clone())),
        }
    }

    fn hkdf(
        &mut self,
        hash: HkdfHash,
        salt: Option<&[u8]>,
        ikm: &[u8],
        info: &[u8],
        okm_len: usize,
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        if okm_len > hash.max_output_len() {
            return Err(CoseCipherError::Other(
                CoseRustCryptoCipherError::InvalidLength(hkdf::InvalidLength),
            ));
        }
        let mut okm = vec![0u8; okm_len];
        match hash {
            HkdfHash::Sha256 => Hkdf::<Sha256>::new(salt, ikm).expand(info, &mut okm)?,
            HkdfHash::Sha512 => Hkdf::<Sha512>::new(salt, ikm).expand(info, &mut okm)?,
        }
        Ok(okm)
    }
}

impl RustCryptoContext {
    /// Perform ECDH on curve `CRV` and return the x coordinate of the shared point.
    fn ecdh_with_curve<CRV: CurveArithmetic>(
        private_key: &CoseEc2Key<'_, <Self as CryptoBackend>::Error>,
        public_key: &CoseEc2Key<'_, <Self as CryptoBackend>::Error>,
    ) -> RustCryptoResult<Vec<u8>>
    where
        FieldBytesSize<CRV>: ModulusSize,
        AffinePoint<CRV>: FromEncodedPoint<CRV> + ToEncodedPoint<CRV>,
    {
        let secret = Self::cose_ec2_to_ec_private_key::<CRV>(private_key)?;
        let peer = Self::cose_ec2_to_ec_public_key::<CRV>(public_key)?;
        let shared =
            elliptic_curve::ecdh::diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine());
        Ok(shared.raw_secret_bytes().to_vec())
    }

    /// Derive the uncompressed public point of the private scalar `d` on curve `CRV`.
    fn public_point_with_curve<CRV: CurveArithmetic>(
        d: &[u8],
    ) -> RustCryptoResult<(Vec<u8>, Vec<u8>)>
    where
        FieldBytesSize<CRV>: ModulusSize,
        AffinePoint<CRV>: FromEncodedPoint<CRV> + ToEncodedPoint<CRV>,
    {
        let point = SecretKey::<CRV>::from_slice(d)?
            .public_key()
            .to_encoded_point(false);
        match (point.x(), point.y()) {
            (Some(x), Some(y)) => Ok((x.to_vec(), y.to_vec())),
            // Only the identity has no coordinates, which can't be a public key.
            _ => Err(CoseCipherError::Other(CoseRustCryptoCipherError::InvalidPoint)),
        }
    }

    /// Convert a private COSE EC2 key to its RustCrypto representation.
    fn cose_ec2_to_ec_private_key<CRV: CurveArithmetic>(
        key: &CoseEc2Key<'_, <Self as CryptoBackend>::Error>,
    ) -> RustCryptoResult<SecretKey<CRV>> {
        let d = key
            .d
            .ok_or(CoseCipherError::MissingKeyParam(iana::Ec2KeyParameter::D.into()))?;
        SecretKey::<CRV>::from_slice(d).map_err(CoseCipherError::from)
    }

    /// Convert a public or private COSE EC2 key to its public key RustCrypto representation.
    fn cose_ec2_to_ec_public_key<CRV: CurveArithmetic>(
        key: &CoseEc2Key<'_, <Self as CryptoBackend>::Error>,
    ) -> RustCryptoResult<PublicKey<CRV>>
    where
        FieldBytesSize<CRV>: ModulusSize,
        AffinePoint<CRV>: FromEncodedPoint<CRV> + ToEncodedPoint<CRV>,
    {
        let sec1 = match (key.x, key.y, key.sign) {
            (Some(x), Some(y), _) => [&[0x04][..], x, y].concat(),
            (Some(x), None, Some(sign)) => [&[0x02 | u8::from(sign)][..], x].concat(),
            // Without a public point, the key must carry d (checked when parsing the key).
            _ => return Ok(Self::cose_ec2_to_ec_private_key::<CRV>(key)?.public_key()),
        };
        PublicKey::<CRV>::from_sec1_bytes(&sec1).map_err(CoseCipherError::from)
    }
}

/// Convert an X25519 private key to its x25519-dalek representation.
fn x25519_secret(
    key: &CoseOkpKey<'_, CoseRustCryptoCipherError>,
) -> RustCryptoResult<x25519_dalek::StaticSecret> {
    let d = key
        .d
        .ok_or(CoseCipherError::MissingKeyParam(iana::OkpKeyParameter::D.into()))?;
    Ok(x25519_dalek::StaticSecret::from(x25519_bytes(
        iana::OkpKeyParameter::D,
        d,
    )?))
}

fn x25519_bytes(param: iana::OkpKeyParameter, value: &[u8]) -> RustCryptoResult<[u8; 32]> {
    <[u8; 32]>::try_from(value)
        .map_err(|_e| CoseCipherError::InvalidKeyParam(param.into(), Value::Bytes(value.to_vec())))
}
