//! Bulk import and export of the catalog and the loan ledger as JSON text

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::{Book, Loan},
};

use super::catalog::MAX_SEQUENCE;

/// What an export contains, which also names the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Catalog,
    Inventory,
    Loans,
}

impl ExportKind {
    fn file_stem(self) -> &'static str {
        match self {
            ExportKind::Catalog => "catalog",
            ExportKind::Inventory => "inventory",
            ExportKind::Loans => "loans",
        }
    }
}

/// A text file ready to hand to the client
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub content: String,
}

pub fn export<T: Serialize>(kind: ExportKind, records: &[T], on: NaiveDate) -> AppResult<ExportFile> {
    let content = serde_json::to_string_pretty(records)
        .map_err(|e| AppError::Internal(format!("Failed to serialize export: {}", e)))?;
    Ok(ExportFile {
        file_name: format!("{}_{}.txt", kind.file_stem(), on.format("%Y-%m-%d")),
        content,
    })
}

/// Parse an imported catalog. Fails on anything that is not an array of
/// book objects, or that repeats an id or a sequence number.
pub fn parse_books(text: &str) -> AppResult<Vec<Book>> {
    let books: Vec<Book> = parse_records(text, "book")?;

    let mut ids = HashSet::new();
    let mut sequences = HashSet::new();
    for book in &books {
        if book.sequence_number > MAX_SEQUENCE {
            return Err(AppError::Parse(format!(
                "Sequence number {} is out of range",
                book.sequence_number
            )));
        }
        if !ids.insert(book.id.as_str()) {
            return Err(AppError::Parse(format!("Duplicate book id {}", book.id)));
        }
        if !sequences.insert(book.sequence_number) {
            return Err(AppError::Parse(format!(
                "Duplicate sequence number {}",
                book.sequence_number
            )));
        }
    }
    Ok(books)
}

/// Parse an imported loan ledger
pub fn parse_loans(text: &str) -> AppResult<Vec<Loan>> {
    let loans: Vec<Loan> = parse_records(text, "loan")?;

    let mut ids = HashSet::new();
    for loan in &loans {
        if !ids.insert(loan.id.as_str()) {
            return Err(AppError::Parse(format!("Duplicate loan id {}", loan.id)));
        }
    }
    Ok(loans)
}

fn parse_records<T: DeserializeOwned>(text: &str, what: &str) -> AppResult<Vec<T>> {
    let value: Value = serde_json::from_str(text.trim_start_matches('\u{feff}'))?;
    let entries = match value {
        Value::Array(entries) => entries,
        _ => {
            return Err(AppError::Parse(format!(
                "Expected a list of {} records",
                what
            )))
        }
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            if !entry.is_object() {
                return Err(AppError::Parse(format!(
                    "Entry {} is not a {} record",
                    index, what
                )));
            }
            serde_json::from_value(entry)
                .map_err(|e| AppError::Parse(format!("Entry {}: {}", index, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookStatus;

    const CATALOG: &str = r#"[
        {"id": "a", "sequence_number": 1, "title": "One", "author": "X",
         "publisher": "", "category": "", "year": "2001",
         "status": "Available", "registered_date": "2024-01-01"},
        {"id": "b", "sequence_number": 2, "title": "Two", "author": "Y",
         "status": "OnLoan"}
    ]"#;

    #[test]
    fn test_parse_books() {
        let books = parse_books(CATALOG).unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[1].status, BookStatus::OnLoan);
        assert_eq!(books[1].publisher, "");
    }

    #[test]
    fn test_parse_rejects_wrong_shapes() {
        for text in [
            "",
            "not json",
            "{\"id\": \"a\"}",
            "[1, 2]",
            "[{\"id\": \"a\", \"title\": \"no sequence\", \"author\": \"x\"}]",
        ] {
            let err = parse_books(text).unwrap_err();
            assert!(matches!(err, AppError::Parse(_)), "accepted {:?}", text);
        }
    }

    #[test]
    fn test_parse_rejects_duplicates() {
        let dup_id = r#"[
            {"id": "a", "sequence_number": 1, "title": "One", "author": "X"},
            {"id": "a", "sequence_number": 2, "title": "Two", "author": "Y"}
        ]"#;
        let dup_seq = r#"[
            {"id": "a", "sequence_number": 1, "title": "One", "author": "X"},
            {"id": "b", "sequence_number": 1, "title": "Two", "author": "Y"}
        ]"#;
        assert!(matches!(parse_books(dup_id), Err(AppError::Parse(_))));
        assert!(matches!(parse_books(dup_seq), Err(AppError::Parse(_))));
    }

    #[test]
    fn test_parse_rejects_last_sequence_number() {
        let text = r#"[
            {"id": "a", "sequence_number": 18446744073709551615, "title": "One", "author": "X"}
        ]"#;
        let err = parse_books(text).unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));

        let text = r#"[
            {"id": "a", "sequence_number": 18446744073709551614, "title": "One", "author": "X"}
        ]"#;
        assert_eq!(parse_books(text).unwrap()[0].sequence_number, MAX_SEQUENCE);
    }

    #[test]
    fn test_parse_empty_list() {
        assert!(parse_books("[]").unwrap().is_empty());
        assert!(parse_loans(" [ ] ").unwrap().is_empty());
    }

    #[test]
    fn test_export_names_file() {
        let books = parse_books(CATALOG).unwrap();
        let on = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let file = export(ExportKind::Inventory, &books, on).unwrap();
        assert_eq!(file.file_name, "inventory_2024-06-01.txt");
        assert!(file.content.starts_with("[\n"));
        assert_eq!(parse_books(&file.content).unwrap(), books);
    }
}
