//! Shared domain enums

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// BookStatus
// ---------------------------------------------------------------------------

/// Availability of a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum BookStatus {
    #[serde(alias = "Disponible")]
    Available,
    #[serde(alias = "Prestado")]
    OnLoan,
}

impl Default for BookStatus {
    fn default() -> Self {
        BookStatus::Available
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BookStatus::Available => "Available",
            BookStatus::OnLoan => "On loan",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// LoanStatus
// ---------------------------------------------------------------------------

/// Loan lifecycle: `Active` moves to `Returned` exactly once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum LoanStatus {
    #[serde(alias = "Activo")]
    Active,
    #[serde(alias = "Devuelto")]
    Returned,
}

impl Default for LoanStatus {
    fn default() -> Self {
        LoanStatus::Active
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoanStatus::Active => "Active",
            LoanStatus::Returned => "Returned",
        };
        write!(f, "{}", label)
    }
}

/// Loan list filter accepted by the API (`?status=active`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatusFilter {
    Active,
    Returned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_status_labels() {
        let s: BookStatus = serde_json::from_str("\"Prestado\"").unwrap();
        assert_eq!(s, BookStatus::OnLoan);
        let s: LoanStatus = serde_json::from_str("\"Devuelto\"").unwrap();
        assert_eq!(s, LoanStatus::Returned);
        assert_eq!(serde_json::to_string(&BookStatus::OnLoan).unwrap(), "\"OnLoan\"");
    }
}
