//! Wallet creation rules.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use bursary_shared::types::Currency;

use super::error::LedgerError;
use super::request::require_text;
use super::types::WalletKind;

/// Input for creating a wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWallet {
    /// Unique display name.
    pub name: String,
    /// Kind of cash pool.
    pub kind: WalletKind,
    /// ISO 4217 code.
    pub currency: String,
}

impl NewWallet {
    /// Validates the name and resolves the currency.
    ///
    /// # Errors
    ///
    /// Returns `BlankField` or `UnsupportedCurrency`.
    pub fn validate(&self) -> Result<Currency, LedgerError> {
        require_text("name", &self.name)?;
        Currency::from_str(&self.currency)
            .map_err(|_| LedgerError::UnsupportedCurrency(self.currency.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(name: &str, currency: &str) -> NewWallet {
        NewWallet {
            name: name.to_string(),
            kind: WalletKind::Cash,
            currency: currency.to_string(),
        }
    }

    #[test]
    fn test_valid_wallet() {
        assert_eq!(wallet("Main Cash", "inr").validate().unwrap(), Currency::Inr);
    }

    #[test]
    fn test_rejects_blank_name_and_unknown_currency() {
        assert!(matches!(
            wallet("  ", "INR").validate(),
            Err(LedgerError::BlankField("name"))
        ));
        assert!(matches!(
            wallet("Main Cash", "XYZ").validate(),
            Err(LedgerError::UnsupportedCurrency(_))
        ));
    }
}
