use core::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use zeroize::Zeroizing;

use super::{
    error::Error,
    replay::ReplayWindow,
    util::{self, MAX_SEQUENCE_NUMBER, PIV_LEN},
    AeadAlgorithm, HkdfAlgorithm, Result, SecurityParameters,
};

/// The common context part of the security context.
struct CommonContext {
    // Master secret and salt are only needed for derivation, hence not part
    // of this
    common_iv: Vec<u8>,
}

/// The sender context part of the security context.
struct SenderContext {
    sender_id: Vec<u8>,
    sender_key: Zeroizing<Vec<u8>>,
    sender_sequence_number: Mutex<u64>,
}

/// The recipient context part of the security context.
struct RecipientContext {
    recipient_id: Vec<u8>,
    recipient_key: Zeroizing<Vec<u8>>,
    replay_window: Mutex<ReplayWindow>,
}

/// The security context.
///
/// Keys are fixed at derivation. The sender sequence number and the replay
/// window are behind their own locks, so a context can be shared between
/// threads handling messages of the same peer.
pub struct SecurityContext {
    aead_algorithm: AeadAlgorithm,
    hkdf_algorithm: HkdfAlgorithm,
    common_context: CommonContext,
    sender_context: SenderContext,
    recipient_context: RecipientContext,
}

impl SecurityContext {
    /// Derives a new `SecurityContext` as described in RFC 8613, section
    /// 3.2.
    ///
    /// # Arguments
    /// * `params` - The pre-shared input for this peer.
    /// * `replay_window_size` - The size of the receiving replay window.
    pub fn derive(
        params: &SecurityParameters,
        replay_window_size: u32,
    ) -> Result<SecurityContext> {
        let aead = params.aead_algorithm();
        let hkdf = params.hkdf_algorithm();
        let (key_len, nonce_len) = (aead.key_len(), aead.nonce_len());

        // The IDs have to fit into the nonce
        let max_id_len = util::max_id_len(nonce_len);
        if params.sender_id().len() > max_id_len {
            return Err(Error::DerivationFailure("sender ID too long"));
        }
        if params.recipient_id().len() > max_id_len {
            return Err(Error::DerivationFailure("recipient ID too long"));
        }

        let master_secret = params.master_secret().expose();
        // An absent salt is the empty byte string
        let master_salt = params.master_salt().unwrap_or(&[]);

        // Derive the keys and IV
        let sender_key = util::hkdf(
            hkdf,
            master_secret,
            master_salt,
            &util::build_info(params.sender_id(), aead, "Key", key_len)?,
            key_len,
        )?;
        let recipient_key = util::hkdf(
            hkdf,
            master_secret,
            master_salt,
            &util::build_info(params.recipient_id(), aead, "Key", key_len)?,
            key_len,
        )?;
        let common_iv = util::hkdf(
            hkdf,
            master_secret,
            master_salt,
            &util::build_info(&[], aead, "IV", nonce_len)?,
            nonce_len,
        )?;

        // Build the subcontexts
        let common_context = CommonContext {
            common_iv: common_iv.to_vec(),
        };
        let sender_context = SenderContext {
            sender_id: params.sender_id().to_vec(),
            sender_key,
            sender_sequence_number: Mutex::new(0),
        };
        let recipient_context = RecipientContext {
            recipient_id: params.recipient_id().to_vec(),
            recipient_key,
            replay_window: Mutex::new(ReplayWindow::new(replay_window_size)),
        };

        Ok(SecurityContext {
            aead_algorithm: aead,
            hkdf_algorithm: hkdf,
            common_context,
            sender_context,
            recipient_context,
        })
    }

    pub fn aead_algorithm(&self) -> AeadAlgorithm {
        self.aead_algorithm
    }

    pub fn hkdf_algorithm(&self) -> HkdfAlgorithm {
        self.hkdf_algorithm
    }

    pub fn sender_id(&self) -> &[u8] {
        &self.sender_context.sender_id
    }

    pub fn recipient_id(&self) -> &[u8] {
        &self.recipient_context.recipient_id
    }

    pub fn sender_key(&self) -> &[u8] {
        &self.sender_context.sender_key
    }

    pub fn recipient_key(&self) -> &[u8] {
        &self.recipient_context.recipient_key
    }

    pub fn common_iv(&self) -> &[u8] {
        &self.common_context.common_iv
    }

    /// Returns the sequence number the next outgoing message will get.
    pub fn sender_sequence_number(&self) -> u64 {
        *lock(&self.sender_context.sender_sequence_number)
    }

    /// Returns the sequence number for an outgoing message and advances it.
    ///
    /// Concurrent callers always get distinct numbers.
    pub fn next_sequence_number(&self) -> Result<u64> {
        let mut ssn = lock(&self.sender_context.sender_sequence_number);
        if *ssn > MAX_SEQUENCE_NUMBER {
            return Err(Error::SequenceNumberExhausted);
        }
        let current = *ssn;
        *ssn += 1;

        Ok(current)
    }

    /// Returns the Partial IV for an outgoing message and advances the
    /// sequence number.
    pub fn next_piv(&self) -> Result<Vec<u8>> {
        Ok(util::format_piv(self.next_sequence_number()?))
    }

    /// Returns `true` if the received sequence number is fresh and remembers
    /// it, `false` if the message has to be dropped as a replay.
    pub fn check_replay(&self, sequence_number: u64) -> bool {
        lock(&self.recipient_context.replay_window)
            .check_and_update(sequence_number)
    }

    /// Same as `check_replay`, for a Partial IV as found in a message.
    pub fn check_replay_piv(&self, piv: &[u8]) -> bool {
        if piv.is_empty() || piv.len() > PIV_LEN {
            return false;
        }
        self.check_replay(util::piv_to_u64(piv))
    }

    /// Returns the highest sequence number received so far.
    pub fn highest_received(&self) -> Option<u64> {
        lock(&self.recipient_context.replay_window).highest()
    }

    /// Returns the nonce for a message protected with our sender key.
    pub fn sender_nonce(&self, piv: &[u8]) -> Vec<u8> {
        util::compute_nonce(
            piv,
            &self.sender_context.sender_id,
            &self.common_context.common_iv,
        )
    }

    /// Returns the nonce for a message protected with the peer's key.
    pub fn recipient_nonce(&self, piv: &[u8]) -> Vec<u8> {
        util::compute_nonce(
            piv,
            &self.recipient_context.recipient_id,
            &self.common_context.common_iv,
        )
    }

    /// Returns the AAD for the request identified by `request_kid` and
    /// `request_piv`.
    pub fn external_aad(
        &self,
        request_kid: &[u8],
        request_piv: &[u8],
    ) -> Result<Vec<u8>> {
        util::build_aad(self.aead_algorithm, request_kid, request_piv)
    }

    /// Encrypts `plaintext` with the sender key.
    pub fn seal(
        &self,
        nonce: &[u8],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        self.aead_algorithm.seal(
            &self.sender_context.sender_key,
            nonce,
            aad,
            plaintext,
        )
    }

    /// Decrypts `ciphertext` with the recipient key.
    pub fn open(
        &self,
        nonce: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        self.aead_algorithm.open(
            &self.recipient_context.recipient_key,
            nonce,
            aad,
            ciphertext,
        )
    }

    #[cfg(test)]
    pub fn set_sender_sequence_number(&self, n: u64) {
        *lock(&self.sender_context.sender_sequence_number) = n;
    }
}

impl fmt::Debug for SecurityContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SecurityContext")
            .field("aead_algorithm", &self.aead_algorithm)
            .field("hkdf_algorithm", &self.hkdf_algorithm)
            .field("sender_id", &hex::encode(self.sender_id()))
            .field("recipient_id", &hex::encode(self.recipient_id()))
            .field("sender_sequence_number", &self.sender_sequence_number())
            .finish()
    }
}

// A panic while holding one of these locks can't leave the counters in a
// torn state, so the poison flag is ignored
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
