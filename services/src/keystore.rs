//! Local Ed25519 signer, read from a Sui CLI keystore or a raw secret.

use std::{
    env,
    fs,
    path::Path,
};

use anyhow::{
    bail,
    Context,
    Result,
};
use base64::{
    engine::general_purpose::STANDARD as BASE64,
    Engine,
};
use blake2::{
    digest::consts::U32,
    Blake2b,
    Digest,
};
use ed25519_dalek::{
    Signer,
    SigningKey,
};
use tracing::debug;
use tunemint_core::Address;

pub const SECRET_KEY_ENV: &str = "TUNEMINT_SECRET_KEY";

const ED25519_FLAG: u8 = 0x00;
/// `TransactionData` intent: scope, version, app id
const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];


pub fn blake2b256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b::<U32>::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

pub fn address_of(public_key: &[u8; 32]) -> Address { Address::new(blake2b256(&[&[ED25519_FLAG], public_key])) }


pub struct Keypair {
    key: SigningKey,
    address: Address,
}

impl Keypair {
    pub fn from_secret(secret: &[u8; 32]) -> Self {
        let key = SigningKey::from_bytes(secret);
        let address = address_of(&key.verifying_key().to_bytes());
        Self { key, address }
    }

    pub fn address(&self) -> Address { self.address }

    /// Serialized signature over BCS `TransactionData`: `flag || signature || public key`, base64
    pub fn sign_transaction(&self, tx_data: &[u8]) -> String {
        let digest = blake2b256(&[&TRANSACTION_INTENT, tx_data]);
        let signature = self.key.sign(&digest);

        let mut out = Vec::with_capacity(1 + 64 + 32);
        out.push(ED25519_FLAG);
        out.extend_from_slice(&signature.to_bytes());
        out.extend_from_slice(&self.key.verifying_key().to_bytes());
        BASE64.encode(out)
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_struct("Keypair").field("address", &self.address).finish_non_exhaustive() }
}


/// Picks the Ed25519 key matching `address`, or the first one, from keystore JSON
pub fn parse_keystore(json: &str, address: Option<Address>) -> Result<Keypair> {
    let entries: Vec<String> = serde_json::from_str(json).context("Keystore must be a JSON array of base64 keys")?;

    let mut keys = entries.iter().filter_map(|entry| match BASE64.decode(entry.trim()) {
        Ok(bytes) if bytes.len() == 33 && bytes[0] == ED25519_FLAG => {
            let secret: [u8; 32] = bytes[1..].try_into().ok()?;
            Some(Keypair::from_secret(&secret))
        },
        Ok(bytes) => {
            debug!("Skipping keystore entry with scheme flag {:?}", bytes.first());
            None
        },
        Err(e) => {
            debug!("Skipping undecodable keystore entry: {e}");
            None
        },
    });

    match address {
        Some(address) => keys
            .find(|k| k.address() == address)
            .with_context(|| format!("No Ed25519 key for {address} in keystore")),
        None => keys.next().context("Keystore has no Ed25519 keys"),
    }
}

pub fn load_keystore(path: &Path, address: Option<Address>) -> Result<Keypair> {
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read keystore {}", path.display()))?;
    parse_keystore(&json, address).with_context(|| format!("Invalid keystore {}", path.display()))
}

/// Hex encoded 32 byte secret, with or without `0x`
pub fn parse_secret_hex(hex_str: &str) -> Result<Keypair> {
    let hex_str = hex_str.trim();
    let bytes = hex::decode(hex_str.strip_prefix("0x").unwrap_or(hex_str)).context("Secret key is not valid hex")?;
    let Ok(secret) = <[u8; 32]>::try_from(bytes.as_slice()) else {
        bail!("Secret key must be 32 bytes, got {}", bytes.len());
    };
    Ok(Keypair::from_secret(&secret))
}

/// Signer from [`SECRET_KEY_ENV`] when set, otherwise from the keystore file
pub fn load(keystore: &Path, address: Option<Address>) -> Result<Keypair> {
    match env::var(SECRET_KEY_ENV) {
        Ok(secret) => {
            let keypair = parse_secret_hex(&secret).with_context(|| format!("Invalid {SECRET_KEY_ENV}"))?;
            if let Some(address) = address.filter(|a| *a != keypair.address()) {
                bail!("{SECRET_KEY_ENV} belongs to {}, not {address}", keypair.address());
            }
            Ok(keypair)
        },
        Err(_) => load_keystore(keystore, address),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    const SECRET_B64: &str = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8g";
    const SECP_B64: &str = "AQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
    const ADDRESS: &str = "0x7573c697fa68450f04fa0dee2d39dcdc8a5ccf5db547f3e47638a6f8eeeec110";

    fn secret() -> [u8; 32] { core::array::from_fn(|i| i as u8 + 1) }

    #[test]
    fn derives_sui_address() {
        assert_eq!(Keypair::from_secret(&secret()).address().to_string(), ADDRESS);
    }

    #[test]
    fn signs_with_intent() {
        let signature = Keypair::from_secret(&secret()).sign_transaction(&[1, 2, 3]);
        assert_eq!(
            signature,
            "AIDyCaKbRJ3xYsMKZVCn1eEipPZwZMMYwXnz4oVh5BcjTkVQLVlcEeCfiKFhljKcW21vr2z02AeA7Eum7OzMhAd5tVYuj+ZU+UB4sRLoqYunkB+FOuaVvtfg45ELrQSWZA=="
        );
    }

    #[test]
    fn keystore_skips_other_schemes() {
        let json = format!(r#"["{SECP_B64}", "{SECRET_B64}"]"#);
        assert_eq!(parse_keystore(&json, None).unwrap().address().to_string(), ADDRESS);
        assert_eq!(parse_keystore(&json, ADDRESS.parse().ok()).unwrap().address().to_string(), ADDRESS);
    }

    #[test]
    fn keystore_address_mismatch() {
        let json = format!(r#"["{SECRET_B64}"]"#);
        let err = parse_keystore(&json, Some(Address::CLOCK)).unwrap_err();
        assert!(format!("{err:#}").contains("No Ed25519 key"));
        assert!(parse_keystore(&format!(r#"["{SECP_B64}"]"#), None).is_err());
        assert!(parse_keystore("{}", None).is_err());
    }

    #[test]
    fn hex_secret() {
        let hex = hex::encode(secret());
        assert_eq!(parse_secret_hex(&format!("0x{hex}")).unwrap().address().to_string(), ADDRESS);
        assert!(parse_secret_hex("0x0102").is_err());
        assert!(parse_secret_hex("zz").is_err());
    }
}
