//! Loan (borrow) model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::book::not_blank;
use super::enums::LoanStatus;

/// One borrowing transaction.
///
/// `book_id` is a weak reference: the book may be deleted after the loan
/// is returned, so title and sequence number are kept as a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Loan {
    pub id: String,
    #[serde(alias = "libroId")]
    pub book_id: String,
    #[serde(alias = "libroNumero")]
    pub book_sequence_number: u64,
    #[serde(alias = "libroTitulo")]
    pub book_title: String,
    #[serde(alias = "nombreUsuario")]
    pub borrower_name: String,
    #[serde(alias = "diasPrestamo")]
    pub duration_days: u32,
    #[serde(default, alias = "cuotaInicial")]
    pub initial_fee: Decimal,
    #[serde(alias = "fechaInicio")]
    pub start_date: DateTime<Utc>,
    #[serde(alias = "fechaDevolucion")]
    pub due_date: DateTime<Utc>,
    #[serde(default, alias = "estado")]
    pub status: LoanStatus,
    #[serde(default, alias = "fechaDevolucionReal")]
    pub returned_date: Option<DateTime<Utc>>,
    #[serde(default, alias = "multaTotal")]
    pub total_fine_charged: Option<Decimal>,
}

impl Loan {
    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }
}

/// Loan with amounts evaluated at a given instant, for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanDetails {
    #[serde(flatten)]
    pub loan: Loan,
    pub overdue_days: i64,
    pub fine: Decimal,
    pub total_due: Decimal,
    pub is_overdue: bool,
}

/// Create loan request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLoan {
    pub book_id: String,
    #[validate(custom(function = "not_blank", message = "Borrower name is required"))]
    pub borrower_name: String,
    #[validate(range(max = 36500, message = "Loan duration cannot exceed 36500 days"))]
    pub duration_days: u32,
    #[serde(default)]
    #[validate(custom(function = "non_negative", message = "Initial fee cannot be negative"))]
    pub initial_fee: Decimal,
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_loan_validation() {
        let mut req = CreateLoan {
            book_id: "b1".to_string(),
            borrower_name: "Bob".to_string(),
            duration_days: 3,
            initial_fee: Decimal::new(500, 2),
        };
        assert!(req.validate().is_ok());

        req.borrower_name = "   ".to_string();
        assert!(req.validate().is_err());

        req.borrower_name = "Bob".to_string();
        req.initial_fee = Decimal::new(-1, 0);
        assert!(req.validate().is_err());

        req.initial_fee = Decimal::ZERO;
        req.duration_days = 36500;
        assert!(req.validate().is_ok());
        req.duration_days = u32::MAX;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_legacy_loan_shape() {
        let raw = r#"{
            "id": "l1",
            "libroId": "b1",
            "libroNumero": 1,
            "libroTitulo": "Title A",
            "nombreUsuario": "Bob",
            "diasPrestamo": 3,
            "cuotaInicial": 5,
            "fechaInicio": "2024-03-01T10:00:00.000Z",
            "fechaDevolucion": "2024-03-04T10:00:00.000Z",
            "estado": "Activo",
            "multaTotal": 0
        }"#;
        let loan: Loan = serde_json::from_str(raw).unwrap();
        assert_eq!(loan.initial_fee, Decimal::new(5, 0));
        assert!(loan.is_active());
        assert_eq!(loan.returned_date, None);
    }
}
