use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};

use crate::dto::MedTypeRequest;
use crate::error::AppResult;
use crate::models::med_record::MedRecord;
use crate::models::session::RequestContext;
use crate::AppState;

pub async fn get_today(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> AppResult<Json<MedRecord>> {
    let record = state.meds.fetch_today(&ctx).await?;
    Ok(Json(record))
}

pub async fn mark_given(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    body: Result<Json<MedTypeRequest>, JsonRejection>,
) -> AppResult<Json<MedRecord>> {
    let body = request_body(body);
    let record = state.meds.mark_given(&ctx, body.med_type()).await?;
    Ok(Json(record))
}

pub async fn reset_given(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    body: Result<Json<MedTypeRequest>, JsonRejection>,
) -> AppResult<Json<MedRecord>> {
    let body = request_body(body);
    let record = state.meds.reset_given(&ctx, body.med_type()).await?;
    Ok(Json(record))
}

// An unreadable body carries no medType, which the service rejects once the
// caller has been checked.
fn request_body(body: Result<Json<MedTypeRequest>, JsonRejection>) -> MedTypeRequest {
    match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable medication request body");
            MedTypeRequest::default()
        }
    }
}
