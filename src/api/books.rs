//! Catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::AppResult,
    models::book::{Book, BookFields},
};

/// Catalog search query
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Text matched against title, author and sequence number
    pub q: Option<String>,
}

/// List the catalog, or search it
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "Books ordered by sequence number, or search matches", body = Vec<Book>)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let library = state.library.lock().await;
    let books = library.search_books(query.q.as_deref().unwrap_or(""));
    Ok(Json(books))
}

/// List books that can be lent
#[utoipa::path(
    get,
    path = "/books/available",
    tag = "books",
    responses(
        (status = 200, description = "Available books ordered by sequence number", body = Vec<Book>)
    )
)]
pub async fn list_available_books(State(state): State<crate::AppState>) -> Json<Vec<Book>> {
    let library = state.library.lock().await;
    Json(library.available_books())
}

/// Get a book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Book>> {
    let library = state.library.lock().await;
    Ok(Json(library.get_book(&id)?))
}

/// Register a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = BookFields,
    responses(
        (status = 201, description = "Book registered", body = Book),
        (status = 400, description = "Title or author missing")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    Json(fields): Json<BookFields>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let mut library = state.library.lock().await;
    let book = library.register_book(fields).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Edit a book's descriptive fields
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    request_body = BookFields,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Title or author missing"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Json(fields): Json<BookFields>,
) -> AppResult<Json<Book>> {
    let mut library = state.library.lock().await;
    let book = library.update_book(&id, fields).await?;
    Ok(Json(book))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book is on loan")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let mut library = state.library.lock().await;
    library.remove_book(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
