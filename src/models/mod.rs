//! Data models for Bibliotheca

pub mod book;
pub mod enums;
pub mod loan;

// Re-export commonly used types
pub use book::{Book, BookFields};
pub use enums::{BookStatus, LoanStatus, LoanStatusFilter};
pub use loan::{CreateLoan, Loan, LoanDetails};
