use hkdf::Hkdf;
use serde_bytes::Bytes;
use sha2::{Sha256, Sha512};
use zeroize::Zeroizing;

use crate::cbor;

use super::{error::Error, AeadAlgorithm, HkdfAlgorithm, Result};

/// Length of the Partial IV part of the nonce.
pub const PIV_LEN: usize = 5;
/// The largest sequence number a 5 byte Partial IV can carry.
pub const MAX_SEQUENCE_NUMBER: u64 = (1 << 40) - 1;

/// Returns the CBOR encoded `info` structure.
///
/// # Arguments
/// * `id` - The sender ID or recipient ID (or empty for IV).
/// * `alg_aead` - The AEAD algorithm the output is used with.
/// * `type` - Either "Key" or "IV".
/// * `l` - The size of the key/nonce for the AEAD, in bytes.
pub fn build_info(
    id: &[u8],
    alg_aead: AeadAlgorithm,
    r#type: &str,
    l: usize,
) -> Result<Vec<u8>> {
    // (id, id_context, alg_aead, type, L)
    let info = (Bytes::new(id), (), i64::from(alg_aead), r#type, l);
    // Return the CBOR encoded version of that
    Ok(cbor::encode(info)?)
}

/// Returns the derived key/IV for this `info` structure.
///
/// # Arguments
/// * `alg` - The HKDF variant to use.
/// * `master_secret` - The master secret.
/// * `master_salt` - The master salt.
/// * `info` - The `info` structure, different for key and IV derivation.
/// * `l` - The size of the key/nonce for the AEAD used, in bytes.
pub fn hkdf(
    alg: HkdfAlgorithm,
    master_secret: &[u8],
    master_salt: &[u8],
    info: &[u8],
    l: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    let mut okm = Zeroizing::new(vec![0; l]);
    // Extract the pseudorandom key (PRK), then expand it to the desired
    // length output keying material (OKM)
    let expanded = match alg {
        HkdfAlgorithm::HkdfSha256 => {
            Hkdf::<Sha256>::new(Some(master_salt), master_secret)
                .expand(info, okm.as_mut_slice())
        }
        HkdfAlgorithm::HkdfSha512 => {
            Hkdf::<Sha512>::new(Some(master_salt), master_secret)
                .expand(info, okm.as_mut_slice())
        }
    };
    expanded
        .map_err(|_| Error::DerivationFailure("HKDF output length invalid"))?;

    Ok(okm)
}

/// Returns the CBOR encoded AAD array.
///
/// There's no argument for class I options, because the standard doesn't
/// define any at this point.
pub fn build_aad_array(
    alg_aead: AeadAlgorithm,
    request_kid: &[u8],
    request_piv: &[u8],
) -> Result<Vec<u8>> {
    // (oscore_version, algorithms, request_kid, request_piv, options)
    let arr = (
        1,
        [i64::from(alg_aead)],
        Bytes::new(request_kid),
        Bytes::new(request_piv),
        Bytes::new(&[]),
    );
    Ok(cbor::encode(arr)?)
}

/// Returns the AAD.
pub fn build_aad(
    alg_aead: AeadAlgorithm,
    request_kid: &[u8],
    request_piv: &[u8],
) -> Result<Vec<u8>> {
    let aad_arr = build_aad_array(alg_aead, request_kid, request_piv)?;
    // Pack the array into an Encrypt0 structure
    let aad = ("Encrypt0", Bytes::new(&[]), Bytes::new(&aad_arr));
    Ok(cbor::encode(aad)?)
}

/// Returns the longest ID a nonce of this length can carry.
pub fn max_id_len(nonce_len: usize) -> usize {
    nonce_len - 6
}

/// Returns the nonce for the AEAD.
///
/// `id_piv` must not be longer than `max_id_len(common_iv.len())`, which
/// context derivation guarantees for the IDs it accepts.
pub fn compute_nonce(
    mut piv: &[u8],
    id_piv: &[u8],
    common_iv: &[u8],
) -> Vec<u8> {
    let nonce_len = common_iv.len();
    debug_assert!(id_piv.len() <= max_id_len(nonce_len));
    // Only the least significant bytes of an oversized piv fit
    if piv.len() > PIV_LEN {
        piv = &piv[piv.len() - PIV_LEN..];
    }

    let mut nonce = vec![0; nonce_len];
    // Left-pad the Partial IV (PIV) with zeros to exactly 5 bytes
    nonce[nonce_len - piv.len()..].copy_from_slice(piv);
    // Left-pad ID_PIV with zeros to exactly nonce length minus 6 bytes
    nonce[nonce_len - PIV_LEN - id_piv.len()..nonce_len - PIV_LEN]
        .copy_from_slice(id_piv);
    // Add the size of the ID_PIV (a single byte S)
    nonce[0] = id_piv.len() as u8;
    // XOR with common IV
    for (b1, b2) in nonce.iter_mut().zip(common_iv.iter()) {
        *b1 ^= b2;
    }

    nonce
}

/// Returns the `piv` as a u64.
pub fn piv_to_u64(mut piv: &[u8]) -> u64 {
    // Trim piv if it's too long
    if piv.len() > 8 {
        piv = &piv[piv.len() - 8..];
    }
    // Copy piv into an appropriately sized array
    let mut piv_arr = [0; 8];
    piv_arr[8 - piv.len()..].copy_from_slice(piv);

    u64::from_be_bytes(piv_arr)
}

/// Returns the `piv` in its correct format (no leading zero bytes).
pub fn format_piv(piv: u64) -> Vec<u8> {
    // Convert the sender sequence number to its byte representation
    let bytes = piv.to_be_bytes();
    // Find the index of the first byte that is not zero
    let first_nonzero = bytes.iter().position(|&x| x != 0);
    match first_nonzero {
        // If there is one, skip leading zero bytes and return the others
        Some(n) => bytes[n..].to_vec(),
        // If there isn't, we simply return 0
        None => vec![0x00],
    }
}
