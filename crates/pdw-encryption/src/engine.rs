//! `EncryptionEngine`: IBE-style encryption under a content identity, and
//! threshold decryption gated on an on-chain approval transaction plus a
//! live session key.
//!
//! Genuine non-interactive IBE needs bilinear pairings; the key-server
//! protocol internals are an out-of-scope external collaborator,
//! so this engine implements exactly the client-visible threshold contract:
//! a random data-encryption key, Shamir-split across the key-server fleet,
//! AES-256-GCM-sealed under the content identity as associated data.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;
use tracing::warn;

use pdw_core::errors::{ErrorKind, PdwError, PdwResult};

use crate::approval::ApprovalTx;
use crate::key_server::IKeyServer;
use crate::session::SessionKey;
use crate::shamir::{self, ShamirShare};

const DEK_LEN: usize = 32;
const NONCE_LEN: usize = 12;

#[derive(Debug, Clone, Copy)]
pub struct ThresholdConfig {
    pub threshold_t: u8,
    pub servers_n: u8,
}

impl ThresholdConfig {
    pub fn validate(&self) -> PdwResult<()> {
        if self.threshold_t == 0 || self.servers_n == 0 || self.threshold_t > self.servers_n {
            return Err(PdwError::invalid_input(format!(
                "invalid threshold config: t={}, n={}",
                self.threshold_t, self.servers_n
            )));
        }
        Ok(())
    }
}

pub struct EncryptionEngine {
    key_servers: Vec<Box<dyn IKeyServer>>,
    config: ThresholdConfig,
}

impl EncryptionEngine {
    pub fn new(key_servers: Vec<Box<dyn IKeyServer>>, config: ThresholdConfig) -> PdwResult<Self> {
        config.validate()?;
        if key_servers.len() != config.servers_n as usize {
            return Err(PdwError::invalid_input(format!(
                "expected {} key servers, got {}",
                config.servers_n,
                key_servers.len()
            )));
        }
        Ok(Self { key_servers, config })
    }

    /// Encrypts `plaintext` under `identity`. Independent of any session key
    ///. Returns the ciphertext and a `backup_symmetric_key`
    /// that bypasses the key-server fleet entirely — the caller's own
    /// responsibility to store or discard.
    pub fn encrypt(&self, plaintext: &[u8], identity: &[u8]) -> PdwResult<(Vec<u8>, [u8; DEK_LEN])> {
        let mut dek = [0u8; DEK_LEN];
        rand::thread_rng().fill_bytes(&mut dek);

        let ciphertext = seal(&dek, identity, plaintext)?;

        let shares = shamir::split(&dek, self.config.threshold_t, self.config.servers_n)?;
        for (server, share) in self.key_servers.iter().zip(shares.into_iter()) {
            server.provision_share(identity, share)?;
        }

        Ok((ciphertext, dek))
    }

    /// Decrypts `ciphertext` via the threshold contract: collects `t`
    /// approving key shares gated on `approval_tx` and `session`, combines
    /// them into the data-encryption key, and opens the AEAD envelope.
    pub fn decrypt(&self, ciphertext: &[u8], identity: &[u8], approval_tx: &ApprovalTx, session: &SessionKey) -> PdwResult<Vec<u8>> {
        if session.is_expired(chrono::Utc::now()) {
            return Err(PdwError::expired("session key has expired"));
        }
        let assertion_bytes = session.assertion_bytes()?;

        let mut shares: Vec<ShamirShare> = Vec::new();
        let mut denials = 0usize;
        let mut unavailable = 0usize;
        for server in &self.key_servers {
            if shares.len() >= self.config.threshold_t as usize {
                break;
            }
            match server.request_key_share(identity, approval_tx, &assertion_bytes) {
                Ok(share) => shares.push(share),
                Err(e) if e.kind == ErrorKind::Unauthorized => denials += 1,
                Err(e) => {
                    warn!(server = server.server_index(), error = %e, "key server unreachable");
                    unavailable += 1;
                }
            }
        }

        if shares.len() < self.config.threshold_t as usize {
            return Err(if denials >= unavailable {
                PdwError::unauthorized(format!("only {} of {} required approvals collected", shares.len(), self.config.threshold_t))
            } else {
                PdwError::unavailable(format!("only {} of {} required key servers responded", shares.len(), self.config.threshold_t))
            });
        }

        let dek = shamir::combine(&shares, self.config.threshold_t)?;
        open(&dek, identity, ciphertext)
    }

    /// Decrypts directly with the `backup_symmetric_key` returned by
    /// `encrypt`, bypassing the key-server fleet and its approval gating
    /// entirely.
    pub fn decrypt_with_backup_key(&self, ciphertext: &[u8], identity: &[u8], backup_key: &[u8; DEK_LEN]) -> PdwResult<Vec<u8>> {
        open(backup_key, identity, ciphertext)
    }
}

fn seal(dek: &[u8; DEK_LEN], identity: &[u8], plaintext: &[u8]) -> PdwResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(dek));
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let payload = aes_gcm::aead::Payload { msg: plaintext, aad: identity };
    let sealed = cipher
        .encrypt(nonce, payload)
        .map_err(|_| PdwError::internal("aead seal failed"))?;

    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&sealed);
    Ok(out)
}

fn open(dek: &[u8; DEK_LEN], identity: &[u8], ciphertext: &[u8]) -> PdwResult<Vec<u8>> {
    if ciphertext.len() < NONCE_LEN {
        return Err(PdwError::tampered("ciphertext shorter than a nonce"));
    }
    let (nonce_bytes, sealed) = ciphertext.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(dek));
    let nonce = Nonce::from_slice(nonce_bytes);
    let payload = aes_gcm::aead::Payload { msg: sealed, aad: identity };
    cipher.decrypt(nonce, payload).map_err(|_| PdwError::tampered("ciphertext failed authentication"))
}
