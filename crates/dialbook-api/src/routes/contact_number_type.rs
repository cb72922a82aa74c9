//! Routes for the Contact Number Setting aggregate and its read model.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use dialbook_contact_number_setting::domain::commands::{
    AddContactNumberType, ContactNumberSettingCommand, DisableContactNumberType,
    EnableContactNumberType, UpdateContactNumberType,
};
use dialbook_core::error::{DomainError, ValidationError};
use dialbook_projections::read_model::{ContactNumberTypeView, ListQuery};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::{ListParams, accepted_at, command_context, list_response};
use crate::state::AppState;

const COLLECTION_PATH: &str = "/contact-number-type";

/// Request body for POST /contact-number-type.
#[derive(Debug, Deserialize)]
pub struct AddContactNumberTypeRequest {
    /// Display name.
    pub name: String,
    /// Display order.
    #[serde(default)]
    pub order: Option<i32>,
}

/// Request body for PATCH /contact-number-type/{id}.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateContactNumberTypeRequest {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New display order.
    #[serde(default)]
    pub order: Option<i32>,
}

fn empty_body() -> ApiError {
    ApiError(DomainError::Validation(ValidationError::single(
        "Invalid payload passed",
        "EMPTY_BODY",
        "empty payload is not allowed",
        &["body"],
    )))
}

/// POST /contact-number-type
#[instrument(skip(state, headers, request))]
async fn add_contact_number_type(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AddContactNumberTypeRequest>,
) -> Result<Response, ApiError> {
    let context = command_context(&headers);
    let id = Uuid::new_v4().to_string();
    info!(
        correlation_id = %context.correlation_id,
        id = %id,
        "handling add contact number type command"
    );

    let command = ContactNumberSettingCommand::AddContactNumberType(AddContactNumberType {
        id: id.clone(),
        name: request.name,
        order: request.order,
    });
    state
        .contact_number_setting_bus
        .execute(&command, &context)
        .await?;

    Ok(accepted_at(format!("{COLLECTION_PATH}/{id}")))
}

/// PATCH /contact-number-type/{id}
#[instrument(skip(state, headers, request))]
async fn update_contact_number_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    request: Option<Json<UpdateContactNumberTypeRequest>>,
) -> Result<StatusCode, ApiError> {
    let request = request.map(|Json(body)| body).unwrap_or_default();
    if request.name.is_none() && request.order.is_none() {
        return Err(empty_body());
    }

    let context = command_context(&headers);
    info!(correlation_id = %context.correlation_id, "handling update contact number type command");

    let command = ContactNumberSettingCommand::UpdateContactNumberType(UpdateContactNumberType {
        id,
        name: request.name,
        order: request.order,
    });
    state
        .contact_number_setting_bus
        .execute(&command, &context)
        .await?;

    Ok(StatusCode::ACCEPTED)
}

/// POST /contact-number-type/{id}/enable
#[instrument(skip(state, headers))]
async fn enable_contact_number_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let context = command_context(&headers);
    let command =
        ContactNumberSettingCommand::EnableContactNumberType(EnableContactNumberType { id });
    state
        .contact_number_setting_bus
        .execute(&command, &context)
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// POST /contact-number-type/{id}/disable
#[instrument(skip(state, headers))]
async fn disable_contact_number_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let context = command_context(&headers);
    let command =
        ContactNumberSettingCommand::DisableContactNumberType(DisableContactNumberType { id });
    state
        .contact_number_setting_bus
        .execute(&command, &context)
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// GET /contact-number-type
#[instrument(skip(state))]
async fn list_contact_number_types(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    let query = ListQuery::from(params);
    let page = state.contact_number_types.list(query).await?;
    Ok(list_response(COLLECTION_PATH, query, page))
}

/// GET /contact-number-type/{id}
#[instrument(skip(state))]
async fn get_contact_number_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ContactNumberTypeView>, ApiError> {
    state
        .contact_number_types
        .find(&id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError(DomainError::ResourceNotFound(
                "No contact number type found".into(),
            ))
        })
}

/// Returns the router for contact number types.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            COLLECTION_PATH,
            post(add_contact_number_type).get(list_contact_number_types),
        )
        .route(
            "/contact-number-type/{id}",
            get(get_contact_number_type).patch(update_contact_number_type),
        )
        .route(
            "/contact-number-type/{id}/enable",
            post(enable_contact_number_type),
        )
        .route(
            "/contact-number-type/{id}/disable",
            post(disable_contact_number_type),
        )
}
