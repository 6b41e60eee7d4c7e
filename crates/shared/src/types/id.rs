//! Typed IDs for type-safe entity references.
//!
//! A `WalletId` cannot be passed where a `LedgerEntryId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(WalletId, "Unique identifier for a wallet.");
typed_id!(LedgerEntryId, "Unique identifier for a ledger entry.");
typed_id!(StudentId, "Unique identifier for a student.");
typed_id!(EmployeeId, "Unique identifier for an employee.");
typed_id!(UserId, "Identity of the caller performing an action.");
typed_id!(
    AccountingPeriodId,
    "Unique identifier for an accounting period."
);
typed_id!(AuditLogId, "Unique identifier for an audit log entry.");
typed_id!(InvoiceId, "Unique identifier for a fee invoice.");
typed_id!(FeePaymentId, "Unique identifier for a fee payment.");
typed_id!(
    ExpenseCategoryId,
    "Unique identifier for an expense category."
);
typed_id!(ExpenseId, "Unique identifier for an expense.");
typed_id!(SalarySlipId, "Unique identifier for a salary slip.");
typed_id!(TransferId, "Unique identifier for a wallet transfer.");
typed_id!(InvestmentId, "Unique identifier for an investment.");
typed_id!(
    InvestmentReturnId,
    "Unique identifier for an investment return."
);
typed_id!(RefundId, "Unique identifier for a refund.");
typed_id!(
    SecurityDepositId,
    "Unique identifier for a security deposit."
);
