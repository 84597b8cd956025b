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
use openssl::bn::{BigNum, BigNumContext};
use openssl::derive::Deriver;
use openssl::ec::{EcGroup, EcKey, EcPoint};
use openssl::md::Md;
use openssl::nid::Nid;
use openssl::pkey::{Id, PKey, Private, Public};
use openssl::pkey_ctx::PkeyCtx;

use crate::crypto_impl::openssl::{CoseOpensslCipherError, OpensslContext};
use crate::crypto_impl::{HkdfHash, KeyAgreementCryptoBackend};
use crate::error::CoseCipherError;
use crate::key::{CoseEc2Key, CoseOkpKey, EllipticCurve};

type OpensslResult<T> = Result<T, CoseCipherError<CoseOpensslCipherError>>;

impl KeyAgreementCryptoBackend for OpensslContext {
    fn ecdh_ec2(
        &mut self,
        private_key: &CoseEc2Key<'_, Self::Error>,
        public_key: &CoseEc2Key<'_, Self::Error>,
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        let (_, group) = get_ecdh_group_params(&private_key.crv)?;
        let private = PKey::from_ec_key(cose_ec2_to_ec_private_key(private_key, &group)?)?;
        let peer = PKey::from_ec_key(cose_ec2_to_ec_public_key(public_key, &group)?)?;
        derive_shared_secret(&private, &peer)
    }

    fn ecdh_okp(
        &mut self,
        private_key: &CoseOkpKey<'_, Self::Error>,
        public_key: &CoseOkpKey<'_, Self::Error>,
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        let id = get_okp_id(&private_key.crv)?;
        let private = PKey::private_key_from_raw_bytes(
            private_key
                .d
                .ok_or(CoseCipherError::MissingKeyParam(iana::OkpKeyParameter::D.into()))?,
            id,
        )?;
        let peer = match (public_key.x, public_key.d) {
            (Some(x), _) => PKey::public_key_from_raw_bytes(x, id)?,
            (None, Some(d)) => PKey::public_key_from_raw_bytes(
                &PKey::private_key_from_raw_bytes(d, id)?.raw_public_key()?,
                id,
            )?,
            (None, None) => {
                return Err(CoseCipherError::MissingKeyParam(
                    iana::OkpKeyParameter::X.into(),
                ))
            }
        };
        derive_shared_secret(&private, &peer)
    }

    fn ec2_public_key(
        &mut self,
        crv: &EllipticCurve,
        d: &[u8],
    ) -> Result<(Vec<u8>, Vec<u8>), CoseCipherError<Self::Error>> {
        let (field_len, group) = get_ecdh_group_params(crv)?;
        let mut ctx = BigNumContext::new()?;
        let point = public_point_of(&group, &BigNum::from_slice(d)?, &ctx)?;
        let mut x = BigNum::new()?;
        let mut y = BigNum::new()?;
        point.affine_coordinates(&group, &mut x, &mut y, &mut ctx)?;
        let field_len = i32::try_from(field_len)
            .map_err(|_e| CoseCipherError::Other(CoseOpensslCipherError::Other("field size")))?;
        Ok((x.to_vec_padded(field_len)?, y.to_vec_padded(field_len)?))
    }

    fn okp_public_key(
        &mut self,
        crv: &EllipticCurve,
        d: &[u8],
    ) -> Result<Vec<u8>, CoseCipherError<Self::Error>> {
        let id = get_okp_id(crv)?;
        Ok(PKey::private_key_from_raw_bytes(d, id)?.raw_public_key()?)
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
            return Err(CoseCipherError::Other(CoseOpensslCipherError::Other(
                "HKDF output length exceeds 255 hash blocks",
            )));
        }
        let mut ctx = PkeyCtx::new_id(Id::HKDF)?;
        ctx.derive_init()?;
        ctx.set_hkdf_md(match hash {
            HkdfHash::Sha256 => Md::sha256(),
            HkdfHash::Sha512 => Md::sha512(),
        })?;
        ctx.set_hkdf_key(ikm)?;
        if let Some(salt) = salt {
            ctx.set_hkdf_salt(salt)?;
        }
        ctx.add_hkdf_info(info)?;
        let mut okm = vec![0u8; okm_len];
        ctx.derive(Some(&mut okm))?;
        Ok(okm)
    }
}

/// Determine the openssl [`EcGroup`] instance and coordinate size that should be used for the
/// given curve.
fn get_ecdh_group_params(crv: &EllipticCurve) -> OpensslResult<(usize, EcGroup)> {
    match crv {
        EllipticCurve::Assigned(iana::EllipticCurve::P_256) => {
            Ok((32, EcGroup::from_curve_name(Nid::X9_62_PRIME256V1)?))
        }
        EllipticCurve::Assigned(iana::EllipticCurve::P_384) => {
            Ok((48, EcGroup::from_curve_name(Nid::SECP384R1)?))
        }
        EllipticCurve::Assigned(iana::EllipticCurve::P_521) => {
            Ok((66, EcGroup::from_curve_name(Nid::SECP521R1)?))
        }
        v => Err(CoseCipherError::UnsupportedCurve(v.clone())),
    }
}

/// Determine the openssl key [`Id`] of an OKP curve usable for key agreement.
fn get_okp_id(crv: &EllipticCurve) -> OpensslResult<Id> {
    match crv {
        EllipticCurve::Assigned(iana::EllipticCurve::X25519) => Ok(Id::X25519),
        EllipticCurve::Assigned(iana::EllipticCurve::X448) => Ok(Id::X448),
        v => Err(CoseCipherError::UnsupportedCurve(v.clone())),
    }
}

fn derive_shared_secret(private: &PKey<Private>, peer: &PKey<Public>) -> OpensslResult<Vec<u8>> {
    let mut deriver = Deriver::new(private)?;
    deriver.set_peer(peer)?;
    Ok(deriver.derive_to_vec()?)
}

fn public_point_of(group: &EcGroup, d: &BigNum, ctx: &BigNumContext) -> OpensslResult<EcPoint> {
    let mut point = EcPoint::new(group)?;
    point.mul_generator(group, d, ctx)?;
    Ok(point)
}

/// Converts a private [`CoseEc2Key`] instance to its corresponding representation as an [`EcKey`]
/// in `openssl`.
fn cose_ec2_to_ec_private_key(
    key: &CoseEc2Key<'_, CoseOpensslCipherError>,
    group: &EcGroup,
) -> OpensslResult<EcKey<Private>> {
    let d = BigNum::from_slice(
        key.d
            .ok_or(CoseCipherError::MissingKeyParam(iana::Ec2KeyParameter::D.into()))?,
    )?;
    let ctx = BigNumContext::new()?;
    let public_point = public_point_of(group, &d, &ctx)?;
    let ec_key = EcKey::<Private>::from_private_components(group, &d, &public_point)?;
    ec_key.check_key()?;
    Ok(ec_key)
}

/// Converts a public [`CoseEc2Key`] instance to its corresponding representation as an [`EcKey`]
/// in `openssl`.
fn cose_ec2_to_ec_public_key(
    key: &CoseEc2Key<'_, CoseOpensslCipherError>,
    group: &EcGroup,
) -> OpensslResult<EcKey<Public>> {
    let mut ctx = BigNumContext::new()?;
    let sec1 = match (key.x, key.y, key.sign) {
        (Some(x), Some(y), _) => [&[0x04][..], x, y].concat(),
        (Some(x), None, Some(sign)) => [&[0x02 | u8::from(sign)][..], x].concat(),
        _ => {
            // Recompute the public point from d (RFC 9053, Section 7.1.1).
            let private = cose_ec2_to_ec_private_key(key, group)?;
            return Ok(EcKey::<Public>::from_public_key(group, private.public_key())?);
        }
    };
    let point = EcPoint::from_bytes(group, &sec1, &mut ctx)?;
    let ec_key = EcKey::<Public>::from_public_key(group, &point)?;
    ec_key.check_key()?;
    Ok(ec_key)
}
