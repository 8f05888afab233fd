use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Transaction identifier returned by the relay service (base58 signature string).
pub type TransactionId = String;

/// Fee-relay SDK error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("no active signer in account storage")]
    Unauthorized,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("no signature recorded for signer {0}")]
    SignatureNotFound(String),

    #[error("transport failure: {message}")]
    Transport {
        /// HTTP status when the failure was a non-2xx response.
        status: Option<u16>,
        message: String,
    },

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("unknown derivation scheme: {0}")]
    UnknownScheme(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("transaction encoding failed: {0}")]
    Encoding(String),

    #[error("transaction failed on chain: {0}")]
    TransactionFailed(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Coarse grouping of [`RelayError`] for callers choosing a UI response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Sign in again.
    Auth,
    /// Fix the input.
    Input,
    /// Remote or service problem, retry later.
    Remote,
    /// Local fault in signing or encoding.
    Internal,
}

impl RelayError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { status: None, message: message.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized => ErrorKind::Auth,
            Self::InvalidAddress(_) | Self::UnknownScheme(_) | Self::Config(_) => ErrorKind::Input,
            Self::InvalidResponse(_)
            | Self::Transport { .. }
            | Self::Rpc { .. }
            | Self::TransactionFailed(_)
            | Self::Timeout(_) => ErrorKind::Remote,
            Self::SignatureNotFound(_) | Self::Signing(_) | Self::Encoding(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

/// Anything able to sign serialized transaction messages with one ed25519 key.
///
/// Implementations must never expose the secret key; only the public key and
/// produced signatures leave the signer.
pub trait TransactionSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;
    fn sign_message(&self, message: &[u8]) -> Result<Signature>;
}

macro_rules! base58_bytes {
    ($name:ident, $len:expr, $err:expr) => {
        impl $name {
            pub const LEN: usize = $len;

            pub const fn new_from_array(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub const fn to_bytes(&self) -> [u8; $len] {
                self.0
            }

            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self([0u8; $len])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&bs58::encode(self.0).into_string())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = RelayError;

            fn from_str(s: &str) -> Result<Self> {
                let make_err: fn(String) -> RelayError = $err;
                let bytes = bs58::decode(s.trim())
                    .into_vec()
                    .map_err(|e| make_err(format!("{s}: {e}")))?;
                let array: [u8; $len] = bytes.try_into().map_err(|b: Vec<u8>| {
                    make_err(format!("{s}: expected {} bytes, got {}", $len, b.len()))
                })?;
                Ok(Self(array))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

/// Ed25519 public key / account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pubkey([u8; 32]);

base58_bytes!(Pubkey, 32, RelayError::InvalidAddress);

/// Ed25519 signature over a serialized transaction message.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; 64]);

base58_bytes!(Signature, 64, RelayError::InvalidResponse);

/// Recent blockhash anchoring a transaction to a window of network time.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Blockhash([u8; 32]);

base58_bytes!(Blockhash, 32, RelayError::InvalidResponse);

/// Parse a user-supplied address string.
pub fn parse_address(address: &str) -> Result<Pubkey> {
    address.parse()
}
