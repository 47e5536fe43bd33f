// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::context::SchemeContext;
use crate::error::{FheError, FheResult};
use crate::types::{Ciphertext, PublicKey, RelinKey};

/// Converts between this crate's wrapper types and the opaque byte blobs
/// that travel over the wire (`hecnn-model::Query::input_ciphertexts`,
/// `hecnn-model::KeyBundle::public_key`, etc). SEAL's own binary
/// serialization does the heavy lifting; this module only adds the
/// level/scale header the core tracks alongside it.
const HEADER_LEN: usize = 8;

fn write_header(level: u32, scale_bits: u32, body: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(&level.to_le_bytes());
    out.extend_from_slice(&scale_bits.to_le_bytes());
    out.extend_from_slice(&body);
    out
}

fn read_header(bytes: &[u8]) -> FheResult<(u32, u32, &[u8])> {
    if bytes.len() < HEADER_LEN {
        return Err(FheError::Backend("ciphertext blob shorter than header".into()));
    }
    let level = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
    let scale_bits = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
    Ok((level, scale_bits, &bytes[HEADER_LEN..]))
}

pub fn ciphertext_to_bytes(ct: &Ciphertext) -> FheResult<Vec<u8>> {
    let body = ct
        .inner
        .to_bytes()
        .map_err(|e| FheError::Backend(format!("ciphertext serialize: {e}")))?;
    Ok(write_header(ct.level, ct.scale_bits, body))
}

pub fn ciphertext_from_bytes(ctx: &SchemeContext, bytes: &[u8]) -> FheResult<Ciphertext> {
    let (level, scale_bits, body) = read_header(bytes)?;
    let inner = sealy::Ciphertext::from_bytes(&ctx.context, body)
        .map_err(|e| FheError::Backend(format!("ciphertext deserialize: {e}")))?;
    Ok(Ciphertext { inner, level, scale_bits })
}

pub fn public_key_to_bytes(pk: &PublicKey) -> FheResult<Vec<u8>> {
    pk.inner
        .to_bytes()
        .map_err(|e| FheError::Backend(format!("public key serialize: {e}")))
}

pub fn public_key_from_bytes(ctx: &SchemeContext, bytes: &[u8]) -> FheResult<PublicKey> {
    let inner = sealy::PublicKey::from_bytes(&ctx.context, bytes)
        .map_err(|e| FheError::Backend(format!("public key deserialize: {e}")))?;
    Ok(PublicKey { inner })
}

pub fn relin_key_to_bytes(rk: &RelinKey) -> FheResult<Vec<u8>> {
    rk.inner
        .to_bytes()
        .map_err(|e| FheError::Backend(format!("relin key serialize: {e}")))
}

pub fn relin_key_from_bytes(ctx: &SchemeContext, bytes: &[u8]) -> FheResult<RelinKey> {
    let inner = sealy::RelinearizationKeys::from_bytes(&ctx.context, bytes)
        .map_err(|e| FheError::Backend(format!("relin key deserialize: {e}")))?;
    Ok(RelinKey { inner })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips_level_and_scale() {
        let body = vec![1u8, 2, 3, 4, 5];
        let framed = write_header(3, 30, body.clone());
        let (level, scale_bits, rest) = read_header(&framed).unwrap();
        assert_eq!(level, 3);
        assert_eq!(scale_bits, 30);
        assert_eq!(rest, body.as_slice());
    }

    #[test]
    fn header_rejects_truncated_blob() {
        assert!(read_header(&[0u8; 4]).is_err());
    }
}
