//! Key-derivation path selection.
//!
//! Only the choice of path lives here; turning a mnemonic into key material
//! along that path is done by the wallet layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use feerelay_types::{RelayError, Result};

/// Supported derivation path templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DerivationScheme {
    /// `m/44'/501'/0'/0'`, used by most current wallets.
    #[default]
    Bip44Change,
    /// `m/44'/501'/0'`
    Bip44,
    /// `m/501'/0'/0/0`, kept for legacy accounts.
    Deprecated,
}

impl DerivationScheme {
    pub const ALL: [DerivationScheme; 3] = [Self::Bip44Change, Self::Bip44, Self::Deprecated];

    pub const fn path(self) -> &'static str {
        match self {
            Self::Bip44Change => "m/44'/501'/0'/0'",
            Self::Bip44 => "m/44'/501'/0'",
            Self::Deprecated => "m/501'/0'/0/0",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Bip44Change => "bip44Change",
            Self::Bip44 => "bip44",
            Self::Deprecated => "deprecated",
        }
    }
}

impl fmt::Display for DerivationScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DerivationScheme {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|scheme| scheme.name() == s)
            .ok_or_else(|| RelayError::UnknownScheme(s.to_string()))
    }
}

/// Wallet construction settings.
///
/// The derivation scheme is passed explicitly to every keypair constructor
/// instead of living in process-wide state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WalletConfig {
    pub derivation_scheme: DerivationScheme,
}
