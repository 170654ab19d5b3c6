//! Overview and Contact Routes
//!
//! - GET /api/v1/overview - Dashboard home numbers for the caller
//! - POST /api/v1/contact - Landing-page contact form (no session needed)

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::ContactResponse;
use crate::api::error::ApiResult;
use crate::api::extract::CurrentUser;
use crate::api::state::AppState;
use crate::contact::{self, SUBMITTED_MESSAGE};
use crate::dashboard::OverviewStats;
use crate::models::NewContactSubmission;

pub async fn overview(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> ApiResult<Json<OverviewStats>> {
    let stats = user.dashboard(&state).overview(user.id()).await?;
    Ok(Json(stats))
}

pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    Json(form): Json<NewContactSubmission>,
) -> ApiResult<(StatusCode, Json<ContactResponse>)> {
    let saved = contact::submit(&state.public.contacts, form).await?;
    tracing::info!(submission_id = %saved.id, "Contact form submitted");

    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            id: saved.id,
            message: SUBMITTED_MESSAGE.to_string(),
        }),
    ))
}
