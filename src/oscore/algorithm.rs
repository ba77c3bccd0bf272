//! COSE algorithm identifiers and the primitives behind them.
//!
//! Credential storage refers to algorithms by their integer value in the
//! COSE algorithms registry. Conversion happens through `TryFrom<i64>` and
//! `From<_> for i64`, nowhere else.

use aes::Aes128;
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use ccm::{
    aead::{Aead, KeyInit, Nonce, Payload},
    consts::{U13, U16, U7, U8},
    Ccm,
};
use core::convert::TryFrom;

use super::{error::Error, Result};

type AesCcm16_64_128 = Ccm<Aes128, U8, U13>;
type AesCcm64_64_128 = Ccm<Aes128, U8, U7>;
type AesCcm16_128_128 = Ccm<Aes128, U16, U13>;
type AesCcm64_128_128 = Ccm<Aes128, U16, U7>;

/// The AEAD algorithms a security context can be derived for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AeadAlgorithm {
    /// AES-CCM-16-64-128, the mandatory to implement OSCORE algorithm.
    AesCcm16_64_128,
    /// AES-CCM-64-64-128.
    AesCcm64_64_128,
    /// AES-CCM-16-128-128.
    AesCcm16_128_128,
    /// AES-CCM-64-128-128.
    AesCcm64_128_128,
    /// AES-GCM with a 128 bit key.
    A128Gcm,
    /// AES-GCM with a 256 bit key.
    A256Gcm,
}

impl AeadAlgorithm {
    /// Every supported AEAD algorithm.
    pub const ALL: [AeadAlgorithm; 6] = [
        AeadAlgorithm::AesCcm16_64_128,
        AeadAlgorithm::AesCcm64_64_128,
        AeadAlgorithm::AesCcm16_128_128,
        AeadAlgorithm::AesCcm64_128_128,
        AeadAlgorithm::A128Gcm,
        AeadAlgorithm::A256Gcm,
    ];

    /// Returns the key length in bytes.
    pub fn key_len(self) -> usize {
        match self {
            AeadAlgorithm::A256Gcm => 32,
            _ => 16,
        }
    }

    /// Returns the nonce length in bytes, which is also the length of the
    /// Common IV.
    pub fn nonce_len(self) -> usize {
        match self {
            AeadAlgorithm::AesCcm16_64_128
            | AeadAlgorithm::AesCcm16_128_128 => 13,
            AeadAlgorithm::AesCcm64_64_128
            | AeadAlgorithm::AesCcm64_128_128 => 7,
            AeadAlgorithm::A128Gcm | AeadAlgorithm::A256Gcm => 12,
        }
    }

    /// Returns the authentication tag length in bytes.
    pub fn tag_len(self) -> usize {
        match self {
            AeadAlgorithm::AesCcm16_64_128
            | AeadAlgorithm::AesCcm64_64_128 => 8,
            _ => 16,
        }
    }

    /// Encrypts `msg` and appends the tag.
    pub(crate) fn seal(
        self,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        msg: &[u8],
    ) -> Result<Vec<u8>> {
        if nonce.len() != self.nonce_len() {
            return Err(Error::Aead);
        }
        let payload = Payload { msg, aad };
        match self {
            AeadAlgorithm::AesCcm16_64_128 => {
                seal_with::<AesCcm16_64_128>(key, nonce, payload)
            }
            AeadAlgorithm::AesCcm64_64_128 => {
                seal_with::<AesCcm64_64_128>(key, nonce, payload)
            }
            AeadAlgorithm::AesCcm16_128_128 => {
                seal_with::<AesCcm16_128_128>(key, nonce, payload)
            }
            AeadAlgorithm::AesCcm64_128_128 => {
                seal_with::<AesCcm64_128_128>(key, nonce, payload)
            }
            AeadAlgorithm::A128Gcm => {
                seal_with::<Aes128Gcm>(key, nonce, payload)
            }
            AeadAlgorithm::A256Gcm => {
                seal_with::<Aes256Gcm>(key, nonce, payload)
            }
        }
    }

    /// Verifies the tag of `msg` and decrypts it.
    pub(crate) fn open(
        self,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        msg: &[u8],
    ) -> Result<Vec<u8>> {
        if nonce.len() != self.nonce_len() {
            return Err(Error::Aead);
        }
        let payload = Payload { msg, aad };
        match self {
            AeadAlgorithm::AesCcm16_64_128 => {
                open_with::<AesCcm16_64_128>(key, nonce, payload)
            }
            AeadAlgorithm::AesCcm64_64_128 => {
                open_with::<AesCcm64_64_128>(key, nonce, payload)
            }
            AeadAlgorithm::AesCcm16_128_128 => {
                open_with::<AesCcm16_128_128>(key, nonce, payload)
            }
            AeadAlgorithm::AesCcm64_128_128 => {
                open_with::<AesCcm64_128_128>(key, nonce, payload)
            }
            AeadAlgorithm::A128Gcm => {
                open_with::<Aes128Gcm>(key, nonce, payload)
            }
            AeadAlgorithm::A256Gcm => {
                open_with::<Aes256Gcm>(key, nonce, payload)
            }
        }
    }
}

impl TryFrom<i64> for AeadAlgorithm {
    type Error = Error;

    fn try_from(value: i64) -> Result<AeadAlgorithm> {
        match value {
            10 => Ok(AeadAlgorithm::AesCcm16_64_128),
            12 => Ok(AeadAlgorithm::AesCcm64_64_128),
            30 => Ok(AeadAlgorithm::AesCcm16_128_128),
            32 => Ok(AeadAlgorithm::AesCcm64_128_128),
            1 => Ok(AeadAlgorithm::A128Gcm),
            3 => Ok(AeadAlgorithm::A256Gcm),
            other => Err(Error::UnsupportedAlgorithm(other)),
        }
    }
}

impl From<AeadAlgorithm> for i64 {
    fn from(alg: AeadAlgorithm) -> i64 {
        match alg {
            AeadAlgorithm::AesCcm16_64_128 => 10,
            AeadAlgorithm::AesCcm64_64_128 => 12,
            AeadAlgorithm::AesCcm16_128_128 => 30,
            AeadAlgorithm::AesCcm64_128_128 => 32,
            AeadAlgorithm::A128Gcm => 1,
            AeadAlgorithm::A256Gcm => 3,
        }
    }
}

/// The key derivation functions a security context can be derived with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HkdfAlgorithm {
    /// HKDF with HMAC SHA-256, the OSCORE default.
    HkdfSha256,
    /// HKDF with HMAC SHA-512.
    HkdfSha512,
}

impl HkdfAlgorithm {
    /// Every supported key derivation function.
    pub const ALL: [HkdfAlgorithm; 2] =
        [HkdfAlgorithm::HkdfSha256, HkdfAlgorithm::HkdfSha512];
}

impl TryFrom<i64> for HkdfAlgorithm {
    type Error = Error;

    fn try_from(value: i64) -> Result<HkdfAlgorithm> {
        match value {
            -10 => Ok(HkdfAlgorithm::HkdfSha256),
            -11 => Ok(HkdfAlgorithm::HkdfSha512),
            other => Err(Error::UnsupportedAlgorithm(other)),
        }
    }
}

impl From<HkdfAlgorithm> for i64 {
    fn from(alg: HkdfAlgorithm) -> i64 {
        match alg {
            HkdfAlgorithm::HkdfSha256 => -10,
            HkdfAlgorithm::HkdfSha512 => -11,
        }
    }
}

fn seal_with<C: KeyInit + Aead>(
    key: &[u8],
    nonce: &[u8],
    payload: Payload,
) -> Result<Vec<u8>> {
    let cipher = C::new_from_slice(key).map_err(|_| Error::Aead)?;
    Ok(cipher.encrypt(Nonce::<C>::from_slice(nonce), payload)?)
}

fn open_with<C: KeyInit + Aead>(
    key: &[u8],
    nonce: &[u8],
    payload: Payload,
) -> Result<Vec<u8>> {
    let cipher = C::new_from_slice(key).map_err(|_| Error::Aead)?;
    Ok(cipher.decrypt(Nonce::<C>::from_slice(nonce), payload)?)
}
