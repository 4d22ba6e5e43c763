//! Key resolution: a WIF private key or a hex public key, normalized to the
//! canonical public key and its HASH160.

use bitcoin::key::Secp256k1;
use bitcoin::{PrivateKey, PubkeyHash, PublicKey};

use crate::Error;

/// User-supplied key material. A private key derives exactly one public key;
/// a public key alone never yields a private key.
#[derive(Debug, Clone)]
pub enum KeyMaterial {
    Private(PrivateKey),
    Public(PublicKey),
}

impl KeyMaterial {
    /// Parses `input` as a WIF private key when `private` is set, otherwise
    /// as a hex-encoded public key.
    pub fn parse(input: &str, private: bool) -> Result<Self, Error> {
        if private {
            let key = PrivateKey::from_wif(input).map_err(|e| Error::InvalidKey(e.to_string()))?;
            Ok(KeyMaterial::Private(key))
        } else {
            let key = input
                .parse::<PublicKey>()
                .map_err(|e| Error::InvalidKey(e.to_string()))?;
            Ok(KeyMaterial::Public(key))
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            KeyMaterial::Private(key) => key.public_key(&Secp256k1::new()),
            KeyMaterial::Public(key) => *key,
        }
    }

    pub fn pubkey_hash(&self) -> PubkeyHash {
        self.public_key().pubkey_hash()
    }

    pub fn private_key(&self) -> Option<&PrivateKey> {
        match self {
            KeyMaterial::Private(key) => Some(key),
            KeyMaterial::Public(_) => None,
        }
    }
}
