//! Loan ledger: loan creation and return, overdue fines

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::LoansConfig,
    error::{AppError, AppResult, ConflictKind},
    models::{BookStatus, CreateLoan, Loan, LoanDetails, LoanStatus},
};

use super::catalog::CatalogService;

/// Fine charged per whole calendar day past the due date
pub const FINE_PER_DAY: Decimal = Decimal::TEN;

/// Fine rate and the clock used to cut calendar days
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanPolicy {
    pub fine_per_day: Decimal,
    pub offset: FixedOffset,
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self {
            fine_per_day: FINE_PER_DAY,
            offset: Utc.fix(),
        }
    }
}

impl LoanPolicy {
    pub fn from_config(config: &LoansConfig) -> AppResult<Self> {
        if config.fine_per_day.is_sign_negative() && !config.fine_per_day.is_zero() {
            return Err(AppError::Validation(
                "loans.fine_per_day cannot be negative".to_string(),
            ));
        }
        let offset = FixedOffset::east_opt(config.utc_offset_minutes * 60).ok_or_else(|| {
            AppError::Validation(format!(
                "loans.utc_offset_minutes out of range: {}",
                config.utc_offset_minutes
            ))
        })?;
        Ok(Self {
            fine_per_day: config.fine_per_day,
            offset,
        })
    }

    /// Calendar date of `instant` on the library's clock
    pub fn calendar_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }
}

/// Every loan ever made, in creation order. Loans are never removed; the
/// only transition is `Active` to `Returned`.
#[derive(Debug, Default)]
pub struct LoanLedger {
    loans: Vec<Loan>,
    policy: LoanPolicy,
}

impl LoanLedger {
    pub fn new(policy: LoanPolicy) -> Self {
        Self {
            loans: Vec::new(),
            policy,
        }
    }

    pub fn with_loans(policy: LoanPolicy, loans: Vec<Loan>) -> Self {
        Self { loans, policy }
    }

    pub fn policy(&self) -> &LoanPolicy {
        &self.policy
    }

    pub fn all(&self) -> &[Loan] {
        &self.loans
    }

    pub fn get(&self, loan_id: &str) -> AppResult<&Loan> {
        self.loans
            .iter()
            .find(|l| l.id == loan_id)
            .ok_or_else(|| AppError::loan_not_found(loan_id))
    }

    /// Lend an available book. The book is marked on loan.
    pub fn create_loan(
        &mut self,
        catalog: &mut CatalogService,
        request: CreateLoan,
        now: DateTime<Utc>,
    ) -> AppResult<Loan> {
        request.validate()?;

        let book = catalog.get(&request.book_id)?;
        if !book.is_available() {
            return Err(AppError::conflict(
                ConflictKind::BookNotAvailable,
                format!("Book #{} is already on loan", book.sequence_number),
            ));
        }

        let due_date = Duration::try_days(i64::from(request.duration_days))
            .and_then(|term| now.checked_add_signed(term))
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Loan duration of {} days is out of range",
                    request.duration_days
                ))
            })?;

        let loan = Loan {
            id: Uuid::new_v4().to_string(),
            book_id: book.id.clone(),
            book_sequence_number: book.sequence_number,
            book_title: book.title.clone(),
            borrower_name: request.borrower_name.trim().to_string(),
            duration_days: request.duration_days,
            initial_fee: request.initial_fee,
            start_date: now,
            due_date,
            status: LoanStatus::Active,
            returned_date: None,
            total_fine_charged: None,
        };

        catalog.set_status(&loan.book_id, BookStatus::OnLoan);
        self.loans.push(loan.clone());

        tracing::info!(
            "Loan {} created: book #{} to {}, due {}",
            loan.id,
            loan.book_sequence_number,
            loan.borrower_name,
            loan.due_date
        );
        Ok(loan)
    }

    /// Whole calendar days between the due date and `as_of`, never negative
    pub fn compute_overdue_days(&self, loan: &Loan, as_of: DateTime<Utc>) -> i64 {
        let due = self.policy.calendar_date(loan.due_date);
        let today = self.policy.calendar_date(as_of);
        (today - due).num_days().max(0)
    }

    pub fn compute_fine(&self, loan: &Loan, as_of: DateTime<Utc>) -> Decimal {
        Decimal::from(self.compute_overdue_days(loan, as_of)) * self.policy.fine_per_day
    }

    pub fn compute_total_due(&self, loan: &Loan, as_of: DateTime<Utc>) -> Decimal {
        loan.initial_fee + self.compute_fine(loan, as_of)
    }

    /// Close a loan, freezing what is owed at `now`. The book goes back to
    /// available unless it was deleted meanwhile.
    pub fn return_loan(
        &mut self,
        catalog: &mut CatalogService,
        loan_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Loan> {
        let index = self
            .loans
            .iter()
            .position(|l| l.id == loan_id)
            .ok_or_else(|| AppError::loan_not_found(loan_id))?;

        if self.loans[index].status == LoanStatus::Returned {
            return Err(AppError::conflict(
                ConflictKind::LoanAlreadyReturned,
                format!("Loan {} has already been returned", loan_id),
            ));
        }

        let total = self.compute_total_due(&self.loans[index], now);
        let loan = &mut self.loans[index];
        loan.total_fine_charged = Some(total);
        loan.returned_date = Some(now);
        loan.status = LoanStatus::Returned;

        if !catalog.set_status(&loan.book_id, BookStatus::Available) {
            tracing::debug!("Book {} of loan {} no longer exists", loan.book_id, loan.id);
        }

        tracing::info!("Loan {} returned, charged {}", loan.id, total);
        Ok(loan.clone())
    }

    pub fn list_active(&self) -> Vec<Loan> {
        self.filtered(LoanStatus::Active)
    }

    pub fn list_returned(&self) -> Vec<Loan> {
        self.filtered(LoanStatus::Returned)
    }

    fn filtered(&self, status: LoanStatus) -> Vec<Loan> {
        self.loans
            .iter()
            .filter(|l| l.status == status)
            .cloned()
            .collect()
    }

    /// Amounts owed on `loan` as of `as_of`
    pub fn details(&self, loan: &Loan, as_of: DateTime<Utc>) -> LoanDetails {
        let overdue_days = if loan.is_active() {
            self.compute_overdue_days(loan, as_of)
        } else {
            0
        };
        let fine = Decimal::from(overdue_days) * self.policy.fine_per_day;
        let total_due = match loan.total_fine_charged {
            Some(charged) if !loan.is_active() => charged,
            _ => loan.initial_fee + fine,
        };
        LoanDetails {
            loan: loan.clone(),
            overdue_days,
            fine,
            total_due,
            is_overdue: overdue_days > 0,
        }
    }

    /// Replace the whole ledger, as a bulk import does
    pub fn replace_all(&mut self, loans: Vec<Loan>) {
        self.loans = loans;
    }
}
