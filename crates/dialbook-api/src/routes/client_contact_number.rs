//! Routes for the Client Contact Number aggregate and its read model.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::{delete, post};
use axum::{Json, Router};
use dialbook_client_contact_number::domain::commands::{
    AddClientContactNumber, ClientContactNumberCommand, RemoveClientContactNumber,
};
use dialbook_projections::read_model::ListQuery;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::{ListParams, accepted_at, command_context, list_response};
use crate::state::AppState;

/// Request body for POST /client/{client_id}/contact-number.
#[derive(Debug, Deserialize)]
pub struct AddClientContactNumberRequest {
    /// Referenced contact number type.
    pub type_id: String,
    /// The number itself.
    pub contact_number: String,
}

/// POST /client/{client_id}/contact-number
#[instrument(skip(state, headers, request))]
async fn add_client_contact_number(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<AddClientContactNumberRequest>,
) -> Result<Response, ApiError> {
    let context = command_context(&headers);
    let id = Uuid::new_v4().to_string();
    info!(
        correlation_id = %context.correlation_id,
        id = %id,
        "handling add client contact number command"
    );

    let command = ClientContactNumberCommand::AddClientContactNumber {
        client_id: client_id.clone(),
        data: AddClientContactNumber {
            id: id.clone(),
            type_id: request.type_id,
            contact_number: request.contact_number,
        },
    };
    state
        .client_contact_number_bus
        .execute(&command, &context)
        .await?;

    Ok(accepted_at(format!("/client/{client_id}/contact-number/{id}")))
}

/// DELETE /client/{client_id}/contact-number/{id}
#[instrument(skip(state, headers))]
async fn remove_client_contact_number(
    State(state): State<AppState>,
    Path((client_id, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let context = command_context(&headers);
    info!(
        correlation_id = %context.correlation_id,
        "handling remove client contact number command"
    );

    let command = ClientContactNumberCommand::RemoveClientContactNumber {
        client_id,
        data: RemoveClientContactNumber { id },
    };
    state
        .client_contact_number_bus
        .execute(&command, &context)
        .await?;

    Ok(StatusCode::ACCEPTED)
}

/// GET /client/{client_id}/contact-number
#[instrument(skip(state))]
async fn list_client_contact_numbers(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    let query = ListQuery::from(params);
    let page = state
        .client_contact_numbers
        .list_for_client(&client_id, query)
        .await?;
    Ok(list_response(
        &format!("/client/{client_id}/contact-number"),
        query,
        page,
    ))
}

/// Returns the router for client contact numbers.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/client/{client_id}/contact-number",
            post(add_client_contact_number).get(list_client_contact_numbers),
        )
        .route(
            "/client/{client_id}/contact-number/{id}",
            delete(remove_client_contact_number),
        )
}
