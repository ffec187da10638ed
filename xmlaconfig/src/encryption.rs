//! Chiffrement du mot de passe XML/A stocké dans la configuration
//!
//! Le mot de passe du serveur OLAP peut être écrit en clair dans
//! `config.yaml` ou sous la forme `encrypted:BASE64`, où BASE64 encode
//! `nonce (12 octets) || ciphertext AES-256-GCM`.
//!
//! La clé est dérivée d'un identifiant propre à la machine : une valeur
//! chiffrée n'est lisible que sur la machine qui l'a produite.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use anyhow::{Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha2::{Digest, Sha256};

/// Préfixe des mots de passe chiffrés
const ENCRYPTED_PREFIX: &str = "encrypted:";

const KEY_SALT: &[u8] = b"xmla-config-encryption-v1";
const NONCE_SALT: &[u8] = b"xmla-nonce-v1";
const NONCE_LEN: usize = 12;

/// Identifiant stable de la machine, source de la clé
#[cfg(target_os = "linux")]
fn machine_secret() -> Result<String> {
    ["/etc/machine-id", "/var/lib/dbus/machine-id"]
        .iter()
        .filter_map(|path| std::fs::read_to_string(path).ok())
        .map(|id| id.trim().to_string())
        .find(|id| !id.is_empty())
        .ok_or_else(|| anyhow!("No machine-id found"))
}

#[cfg(target_os = "macos")]
fn machine_secret() -> Result<String> {
    let output = std::process::Command::new("ioreg")
        .args(["-d2", "-c", "IOPlatformExpertDevice"])
        .output()?;

    // "IOPlatformUUID" = "XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX"
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .find(|line| line.contains("IOPlatformUUID"))
        .and_then(|line| line.split('"').nth(3))
        .map(str::to_string)
        .ok_or_else(|| anyhow!("IOPlatformUUID not found in ioreg output"))
}

#[cfg(target_os = "windows")]
fn machine_secret() -> Result<String> {
    let output = std::process::Command::new("wmic")
        .args(["csproduct", "get", "UUID"])
        .output()?;

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .nth(1)
        .map(|line| line.trim().to_string())
        .filter(|uuid| !uuid.is_empty())
        .ok_or_else(|| anyhow!("UUID not found in wmic output"))
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn machine_secret() -> Result<String> {
    Err(anyhow!("No machine identifier on this platform"))
}

/// Chiffreur AES-256-GCM lié à un secret
pub struct PasswordCipher {
    cipher: Aes256Gcm,
}

impl PasswordCipher {
    /// Chiffreur dont la clé vaut SHA-256(secret || sel)
    pub fn from_secret(secret: &[u8]) -> Result<Self> {
        let key = Sha256::new()
            .chain_update(secret)
            .chain_update(KEY_SALT)
            .finalize();
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| anyhow!("Failed to create cipher: {}", e))?;
        Ok(Self { cipher })
    }

    /// Chiffreur lié à la machine courante
    pub fn for_machine() -> Result<Self> {
        Self::from_secret(machine_secret()?.as_bytes())
    }

    /// Chiffre `password` au format `encrypted:BASE64`.
    ///
    /// Le nonce est dérivé du mot de passe : un même mot de passe donne
    /// toujours la même valeur, et `config.yaml` ne change pas à chaque
    /// sauvegarde.
    pub fn encrypt(&self, password: &str) -> Result<String> {
        let digest = Sha256::new()
            .chain_update(password.as_bytes())
            .chain_update(NONCE_SALT)
            .finalize();
        let nonce = Nonce::from_slice(&digest[..NONCE_LEN]);

        let ciphertext = self
            .cipher
            .encrypt(nonce, password.as_bytes())
            .map_err(|e| anyhow!("Encryption failed: {}", e))?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(nonce);
        payload.extend_from_slice(&ciphertext);
        Ok(format!("{}{}", ENCRYPTED_PREFIX, BASE64.encode(payload)))
    }

    /// Déchiffre une valeur `encrypted:BASE64`
    pub fn decrypt(&self, value: &str) -> Result<String> {
        let encoded = value
            .strip_prefix(ENCRYPTED_PREFIX)
            .ok_or_else(|| anyhow!("Invalid encrypted password format (missing prefix)"))?;
        let payload = BASE64
            .decode(encoded)
            .map_err(|e| anyhow!("Invalid base64: {}", e))?;
        if payload.len() < NONCE_LEN {
            return Err(anyhow!("Invalid ciphertext (too short)"));
        }

        let (nonce, ciphertext) = payload.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| anyhow!("Decryption failed (wrong machine or corrupted data): {}", e))?;

        String::from_utf8(plaintext).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
    }
}

/// Chiffre un mot de passe avec la clé de la machine
///
/// ```rust,ignore
/// let stored = encrypt_password("my_password")?;
/// // stored = "encrypted:SGVsbG8gV29ybGQh..."
/// ```
pub fn encrypt_password(password: &str) -> Result<String> {
    PasswordCipher::for_machine()?.encrypt(password)
}

/// Déchiffre un mot de passe `encrypted:BASE64` avec la clé de la machine
pub fn decrypt_password(encrypted: &str) -> Result<String> {
    if !is_encrypted(encrypted) {
        return Err(anyhow!("Invalid encrypted password format (missing prefix)"));
    }
    PasswordCipher::for_machine()?.decrypt(encrypted)
}

pub fn is_encrypted(value: &str) -> bool {
    value.starts_with(ENCRYPTED_PREFIX)
}

/// Mot de passe en clair, que la valeur stockée soit chiffrée ou non
pub fn get_password(value: &str) -> Result<String> {
    if is_encrypted(value) {
        decrypt_password(value)
    } else {
        Ok(value.to_string())
    }
}
