//! Import and export endpoints.
//!
//! Exports come back as plain-text attachments; imports take the same text
//! as the raw request body and replace the current data wholesale.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    services::transfer::{ExportFile, ExportKind},
};

/// Import result
#[derive(Serialize, ToSchema)]
pub struct ImportResponse {
    /// Number of records now loaded
    pub imported: usize,
}

fn attachment(file: ExportFile) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.file_name),
            ),
        ],
        file.content,
    )
        .into_response()
}

async fn export(state: crate::AppState, kind: ExportKind) -> AppResult<Response> {
    let library = state.library.lock().await;
    Ok(attachment(library.export(kind)?))
}

/// Export the catalog
#[utoipa::path(
    get,
    path = "/export/books",
    tag = "transfer",
    responses(
        (status = 200, description = "Catalog as JSON text", content_type = "text/plain", body = String)
    )
)]
pub async fn export_books(State(state): State<crate::AppState>) -> AppResult<Response> {
    export(state, ExportKind::Catalog).await
}

/// Export the inventory listing
#[utoipa::path(
    get,
    path = "/export/inventory",
    tag = "transfer",
    responses(
        (status = 200, description = "Inventory as JSON text", content_type = "text/plain", body = String)
    )
)]
pub async fn export_inventory(State(state): State<crate::AppState>) -> AppResult<Response> {
    export(state, ExportKind::Inventory).await
}

/// Export the loan ledger
#[utoipa::path(
    get,
    path = "/export/loans",
    tag = "transfer",
    responses(
        (status = 200, description = "Loans as JSON text", content_type = "text/plain", body = String)
    )
)]
pub async fn export_loans(State(state): State<crate::AppState>) -> AppResult<Response> {
    export(state, ExportKind::Loans).await
}

/// Replace the catalog with an exported file
#[utoipa::path(
    post,
    path = "/import/books",
    tag = "transfer",
    request_body(content = String, content_type = "text/plain"),
    responses(
        (status = 200, description = "Catalog replaced", body = ImportResponse),
        (status = 422, description = "File is not a list of books")
    )
)]
pub async fn import_books(
    State(state): State<crate::AppState>,
    body: String,
) -> AppResult<Json<ImportResponse>> {
    let mut library = state.library.lock().await;
    let imported = library.import_books(&body).await?;
    Ok(Json(ImportResponse { imported }))
}

/// Replace the loan ledger with an exported file
#[utoipa::path(
    post,
    path = "/import/loans",
    tag = "transfer",
    request_body(content = String, content_type = "text/plain"),
    responses(
        (status = 200, description = "Ledger replaced", body = ImportResponse),
        (status = 422, description = "File is not a list of loans")
    )
)]
pub async fn import_loans(
    State(state): State<crate::AppState>,
    body: String,
) -> AppResult<Json<ImportResponse>> {
    let mut library = state.library.lock().await;
    let imported = library.import_loans(&body).await?;
    Ok(Json(ImportResponse { imported }))
}
