//! Reference code formatting and parsing.

use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;

/// Width the counter is zero-padded to.
pub const COUNTER_WIDTH: usize = 5;

/// Registered document prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequencePrefix {
    /// Fee receipts.
    Receipt,
    /// Expenses.
    Expense,
    /// Payroll disbursements.
    Payroll,
    /// Wallet transfers.
    Transfer,
    /// Investments.
    Investment,
    /// Investment returns.
    InvestmentReturn,
    /// Refunds.
    Refund,
    /// Security deposits.
    SecurityDeposit,
    /// Reversals.
    Reversal,
}

impl SequencePrefix {
    /// Every registered prefix.
    pub const ALL: [Self; 9] = [
        Self::Receipt,
        Self::Expense,
        Self::Payroll,
        Self::Transfer,
        Self::Investment,
        Self::InvestmentReturn,
        Self::Refund,
        Self::SecurityDeposit,
        Self::Reversal,
    ];

    /// Returns the code prefix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Receipt => "RCP",
            Self::Expense => "EXP",
            Self::Payroll => "PAY",
            Self::Transfer => "TRF",
            Self::Investment => "INV",
            Self::InvestmentReturn => "IRT",
            Self::Refund => "RFD",
            Self::SecurityDeposit => "SDP",
            Self::Reversal => "REV",
        }
    }
}

impl std::fmt::Display for SequencePrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed reference code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceCode {
    /// Prefix part.
    pub prefix: String,
    /// Scope year.
    pub year: i32,
    /// Counter value, starting at 1.
    pub value: i64,
}

impl std::fmt::Display for ReferenceCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_code(&self.prefix, self.year, self.value))
    }
}

/// Checks that a prefix is 2-8 uppercase ASCII letters.
///
/// # Errors
///
/// Returns `InvalidPrefix` otherwise.
pub fn validate_prefix(prefix: &str) -> Result<(), LedgerError> {
    let ok = (2..=8).contains(&prefix.len()) && prefix.bytes().all(|b| b.is_ascii_uppercase());
    if ok {
        Ok(())
    } else {
        Err(LedgerError::InvalidPrefix(prefix.to_string()))
    }
}

/// Formats `<PREFIX>-<YEAR>-<NNNNN>`. Values wider than five digits print
/// unpadded.
#[must_use]
pub fn format_code(prefix: &str, year: i32, value: i64) -> String {
    format!("{prefix}-{year}-{value:0width$}", width = COUNTER_WIDTH)
}

/// Parses a code produced by [`format_code`].
///
/// # Errors
///
/// Returns `MalformedCode` when the shape does not match.
pub fn parse_code(code: &str) -> Result<ReferenceCode, LedgerError> {
    let malformed = || LedgerError::MalformedCode(code.to_string());

    let mut parts = code.split('-');
    let (Some(prefix), Some(year), Some(value), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed());
    };

    validate_prefix(prefix).map_err(|_| malformed())?;
    if year.len() != 4 || value.len() < COUNTER_WIDTH {
        return Err(malformed());
    }
    if !year.bytes().all(|b| b.is_ascii_digit()) || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let year: i32 = year.parse().map_err(|_| malformed())?;
    let value: i64 = value.parse().map_err(|_| malformed())?;
    if value < 1 {
        return Err(malformed());
    }

    Ok(ReferenceCode {
        prefix: prefix.to_string(),
        year,
        value,
    })
}

/// Next code after the greatest existing one, restarting at 1 when the
/// scope year changes.
///
/// Only used to seed counters from codes that predate the counter table.
///
/// # Errors
///
/// Returns `InvalidPrefix` or `MalformedCode`.
pub fn next_after(prefix: &str, year: i32, last: Option<&str>) -> Result<String, LedgerError> {
    validate_prefix(prefix)?;
    let next = match last {
        None => 1,
        Some(code) => {
            let parsed = parse_code(code)?;
            if parsed.prefix == prefix && parsed.year == year {
                parsed.value + 1
            } else {
                1
            }
        }
    };
    Ok(format_code(prefix, year, next))
}
