//! Catalog management service

use chrono::NaiveDate;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult, ConflictKind},
    models::{Book, BookFields, BookStatus},
    tree::BookTree,
};

/// Highest sequence number a book may carry. The counter sits one past the
/// highest number in use, so it must stay representable.
pub const MAX_SEQUENCE: u64 = u64::MAX - 1;

/// Owns the catalog tree and the sequence counter.
///
/// Sequence numbers start at 1 and are never reused, even after deletion.
#[derive(Debug)]
pub struct CatalogService {
    tree: BookTree,
    next_sequence: u64,
}

impl Default for CatalogService {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogService {
    pub fn new() -> Self {
        Self {
            tree: BookTree::new(),
            next_sequence: 1,
        }
    }

    /// Restore a catalog from persisted state. The stored counter is only
    /// trusted if it is past every sequence number already handed out.
    pub fn restore(books: Vec<Book>, stored_counter: Option<u64>) -> Self {
        let mut catalog = Self::new();
        catalog.reload(books);
        if let Some(counter) = stored_counter {
            if counter < catalog.next_sequence {
                tracing::warn!(
                    "Stored sequence counter {} is behind the catalog, using {}",
                    counter,
                    catalog.next_sequence
                );
            }
            catalog.next_sequence = catalog.next_sequence.max(counter);
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Sequence number the next registration will receive
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn get(&self, id: &str) -> AppResult<&Book> {
        self.tree
            .find_by_id(id)
            .ok_or_else(|| AppError::book_not_found(id))
    }

    /// Register a new book as available
    pub fn register(&mut self, fields: BookFields, registered_on: NaiveDate) -> AppResult<Book> {
        fields.validate()?;
        if self.next_sequence > MAX_SEQUENCE {
            return Err(AppError::conflict(
                ConflictKind::SequenceExhausted,
                "No sequence numbers left to assign",
            ));
        }
        let fields = fields.trimmed();

        let book = Book {
            id: Uuid::new_v4().to_string(),
            sequence_number: self.next_sequence,
            title: fields.title,
            author: fields.author,
            publisher: fields.publisher,
            category: fields.category,
            year: fields.year,
            status: BookStatus::Available,
            registered_date: registered_on.format("%Y-%m-%d").to_string(),
        };
        self.next_sequence += 1;
        self.tree.insert(book.clone());

        tracing::info!("Registered book #{} \"{}\"", book.sequence_number, book.title);
        Ok(book)
    }

    /// Edit the descriptive fields of a book in place
    pub fn update(&mut self, id: &str, fields: BookFields) -> AppResult<Book> {
        fields.validate()?;
        let book = self
            .tree
            .find_by_id_mut(id)
            .ok_or_else(|| AppError::book_not_found(id))?;
        book.apply(fields);
        Ok(book.clone())
    }

    /// Delete a book that is not on loan
    pub fn remove(&mut self, id: &str) -> AppResult<Book> {
        let book = self.get(id)?;
        if book.status == BookStatus::OnLoan {
            return Err(AppError::conflict(
                ConflictKind::BookOnLoan,
                format!("Book #{} is on loan and cannot be deleted", book.sequence_number),
            ));
        }
        let removed = self
            .tree
            .remove_by_id(id)
            .ok_or_else(|| AppError::book_not_found(id))?;
        tracing::info!("Removed book #{}", removed.sequence_number);
        Ok(removed)
    }

    /// Text search, or the ordered catalog when the query is blank.
    /// Matches come back in tree pre-order, not sorted.
    pub fn search(&self, query: &str) -> Vec<Book> {
        if query.trim().is_empty() {
            return self.list();
        }
        self.tree.search_by_text(query).into_iter().cloned().collect()
    }

    /// Whole catalog, ascending by sequence number
    pub fn list(&self) -> Vec<Book> {
        self.tree.to_ordered_vec()
    }

    /// Books that can be lent right now, ascending by sequence number
    pub fn list_available(&self) -> Vec<Book> {
        self.tree
            .to_ordered()
            .into_iter()
            .filter(|b| b.is_available())
            .cloned()
            .collect()
    }

    /// Replace the catalog wholesale. The counter restarts after the
    /// highest imported sequence number; a book at `u64::MAX` leaves the
    /// counter exhausted rather than wrapping.
    pub fn reload(&mut self, books: Vec<Book>) {
        self.next_sequence = books
            .iter()
            .map(|b| b.sequence_number)
            .max()
            .map_or(1, |max| max.saturating_add(1));
        self.tree.rebuild_from(books);
    }

    /// Flip a book's availability. Returns false when the book is gone.
    pub(crate) fn set_status(&mut self, id: &str, status: BookStatus) -> bool {
        match self.tree.find_by_id_mut(id) {
            Some(book) => {
                book.status = status;
                true
            }
            None => false,
        }
    }
}
