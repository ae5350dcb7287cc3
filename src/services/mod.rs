//! Business logic services

pub mod catalog;
pub mod loans;
pub mod transfer;

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    error::AppResult,
    models::{Book, BookFields, CreateLoan, Loan, LoanDetails, LoanStatusFilter},
    repository::Repository,
};

use self::catalog::CatalogService;
use self::loans::{LoanLedger, LoanPolicy};
use self::transfer::{ExportFile, ExportKind};

/// The library's whole state: catalog, loan ledger and where they persist.
///
/// Every mutating operation runs to completion in memory, then writes a
/// full snapshot. A failed write is logged and never undoes or fails the
/// mutation.
pub struct Library {
    catalog: CatalogService,
    ledger: LoanLedger,
    repository: Repository,
}

impl Library {
    /// Start empty without reading persisted state
    pub fn new(repository: Repository, policy: LoanPolicy) -> Self {
        Self {
            catalog: CatalogService::new(),
            ledger: LoanLedger::new(policy),
            repository,
        }
    }

    /// Restore whatever state the repository holds
    pub async fn load(repository: Repository, policy: LoanPolicy) -> Self {
        let snapshot = repository.load_all().await;
        tracing::info!(
            "Loaded {} books and {} loans",
            snapshot.books.len(),
            snapshot.loans.len()
        );
        Self {
            catalog: CatalogService::restore(snapshot.books, snapshot.counter),
            ledger: LoanLedger::with_loans(policy, snapshot.loans),
            repository,
        }
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    pub fn ledger(&self) -> &LoanLedger {
        &self.ledger
    }

    fn today(&self) -> NaiveDate {
        self.ledger.policy().calendar_date(Utc::now())
    }

    async fn persist(&self) {
        let books = self.catalog.list();
        if let Err(e) = self
            .repository
            .save_all(&books, self.ledger.all(), self.catalog.next_sequence())
            .await
        {
            tracing::error!("Failed to persist library state: {}", e);
        }
    }

    // -----------------------------------------------------------------------
    // Catalog
    // -----------------------------------------------------------------------

    pub async fn register_book(&mut self, fields: BookFields) -> AppResult<Book> {
        let today = self.today();
        let book = self.catalog.register(fields, today)?;
        self.persist().await;
        Ok(book)
    }

    pub async fn update_book(&mut self, id: &str, fields: BookFields) -> AppResult<Book> {
        let book = self.catalog.update(id, fields)?;
        self.persist().await;
        Ok(book)
    }

    pub async fn remove_book(&mut self, id: &str) -> AppResult<Book> {
        let book = self.catalog.remove(id)?;
        self.persist().await;
        Ok(book)
    }

    pub fn get_book(&self, id: &str) -> AppResult<Book> {
        self.catalog.get(id).cloned()
    }

    pub fn search_books(&self, query: &str) -> Vec<Book> {
        self.catalog.search(query)
    }

    pub fn available_books(&self) -> Vec<Book> {
        self.catalog.list_available()
    }

    // -----------------------------------------------------------------------
    // Loans
    // -----------------------------------------------------------------------

    pub async fn create_loan(&mut self, request: CreateLoan) -> AppResult<Loan> {
        self.create_loan_at(request, Utc::now()).await
    }

    pub async fn create_loan_at(
        &mut self,
        request: CreateLoan,
        now: DateTime<Utc>,
    ) -> AppResult<Loan> {
        let loan = self.ledger.create_loan(&mut self.catalog, request, now)?;
        self.persist().await;
        Ok(loan)
    }

    pub async fn return_loan(&mut self, loan_id: &str) -> AppResult<Loan> {
        self.return_loan_at(loan_id, Utc::now()).await
    }

    pub async fn return_loan_at(&mut self, loan_id: &str, now: DateTime<Utc>) -> AppResult<Loan> {
        let loan = self.ledger.return_loan(&mut self.catalog, loan_id, now)?;
        self.persist().await;
        Ok(loan)
    }

    pub fn loan_details(&self, loan_id: &str, as_of: DateTime<Utc>) -> AppResult<LoanDetails> {
        let loan = self.ledger.get(loan_id)?;
        Ok(self.ledger.details(loan, as_of))
    }

    /// Loans with their amounts evaluated at `as_of`; all of them when
    /// `filter` is `None`
    pub fn list_loans(
        &self,
        filter: Option<LoanStatusFilter>,
        as_of: DateTime<Utc>,
    ) -> Vec<LoanDetails> {
        let loans = match filter {
            Some(LoanStatusFilter::Active) => self.ledger.list_active(),
            Some(LoanStatusFilter::Returned) => self.ledger.list_returned(),
            None => self.ledger.all().to_vec(),
        };
        loans
            .iter()
            .map(|loan| self.ledger.details(loan, as_of))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Import / export
    // -----------------------------------------------------------------------

    /// Replace the catalog with the books in `text`. Nothing changes unless
    /// the whole file parses.
    pub async fn import_books(&mut self, text: &str) -> AppResult<usize> {
        let books = transfer::parse_books(text)?;
        let count = books.len();
        self.catalog.reload(books);
        tracing::info!(
            "Imported {} books, next sequence number {}",
            count,
            self.catalog.next_sequence()
        );
        self.persist().await;
        Ok(count)
    }

    /// Replace the loan ledger with the loans in `text`
    pub async fn import_loans(&mut self, text: &str) -> AppResult<usize> {
        let loans = transfer::parse_loans(text)?;
        let count = loans.len();
        self.ledger.replace_all(loans);
        tracing::info!("Imported {} loans", count);
        self.persist().await;
        Ok(count)
    }

    pub fn export(&self, kind: ExportKind) -> AppResult<ExportFile> {
        let today = self.today();
        match kind {
            ExportKind::Catalog | ExportKind::Inventory => {
                transfer::export(kind, &self.catalog.list(), today)
            }
            ExportKind::Loans => transfer::export(kind, self.ledger.all(), today),
        }
    }
}
