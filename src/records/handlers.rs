use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    auth::jwt::CurrentUser,
    error::ApiError,
    records::{
        dto::{is_valid_date, CreatedRecord, ListRecordsQuery, RecordIdQuery, RecordPage, SaveRecordRequest},
        repo::{self, RecordFilters, RecordKind},
    },
    response::ApiResponse,
    state::AppState,
};

pub fn record_routes() -> Router<AppState> {
    Router::new().route(
        "/records",
        get(list_records)
            .post(create_record)
            .put(update_record)
            .delete(delete_record),
    )
}

fn today() -> String {
    let date = OffsetDateTime::now_utc().date();
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

#[instrument(skip(state))]
pub async fn list_records(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Query(query): Query<ListRecordsQuery>,
) -> Result<ApiResponse<RecordPage>, ApiError> {
    for date in [&query.start_date, &query.end_date].into_iter().flatten() {
        if !is_valid_date(date) {
            return Err(ApiError::validation("dates must be formatted as YYYY-MM-DD"));
        }
    }

    let filters = RecordFilters {
        start_date: query.start_date,
        end_date: query.end_date,
        category_id: query.category_id,
        kind: match query.kind.as_deref() {
            Some("income") => Some(RecordKind::Income),
            Some("expense") => Some(RecordKind::Expense),
            _ => None,
        },
    };

    let (records, total) =
        repo::list(&state.db, claims.id, &filters, query.page, query.page_size).await?;
    Ok(ApiResponse::ok(RecordPage {
        records,
        total,
        page: query.page,
        page_size: query.page_size,
    }))
}

#[instrument(skip(state, payload))]
pub async fn create_record(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Json(payload): Json<SaveRecordRequest>,
) -> Result<ApiResponse<CreatedRecord>, ApiError> {
    let (Some(amount), Some(category_id)) = (payload.amount, payload.category_id) else {
        return Err(ApiError::validation("amount and category are required"));
    };

    let record_date = match payload.record_date {
        Some(date) => {
            if !is_valid_date(&date) {
                return Err(ApiError::validation(
                    "record date must be formatted as YYYY-MM-DD",
                ));
            }
            date
        }
        None => today(),
    };
    let description = payload.description.unwrap_or_default();

    let id = repo::create(
        &state.db,
        claims.id,
        amount,
        category_id,
        &description,
        &record_date,
    )
    .await?;
    info!(user_id = claims.id, record_id = id, "record created");
    Ok(ApiResponse::ok_with_message(
        "record added",
        CreatedRecord { id },
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_record(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Query(query): Query<RecordIdQuery>,
    Json(payload): Json<SaveRecordRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    let Some(id) = query.id else {
        return Err(ApiError::validation("missing required parameters"));
    };
    let (Some(amount), Some(category_id), Some(record_date)) =
        (payload.amount, payload.category_id, payload.record_date)
    else {
        return Err(ApiError::validation("missing required parameters"));
    };
    if !is_valid_date(&record_date) {
        return Err(ApiError::validation(
            "record date must be formatted as YYYY-MM-DD",
        ));
    }

    if !repo::is_owned_by(&state.db, claims.id, id).await? {
        warn!(user_id = claims.id, record_id = id, "update denied");
        return Err(ApiError::forbidden("no permission to modify this record"));
    }

    let description = payload.description.unwrap_or_default();
    repo::update(
        &state.db,
        claims.id,
        id,
        amount,
        category_id,
        &description,
        &record_date,
    )
    .await?;
    info!(user_id = claims.id, record_id = id, "record updated");
    Ok(ApiResponse::message("record updated"))
}

#[instrument(skip(state))]
pub async fn delete_record(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Query(query): Query<RecordIdQuery>,
) -> Result<ApiResponse<()>, ApiError> {
    let Some(id) = query.id else {
        return Err(ApiError::validation("record id is required"));
    };

    if !repo::is_owned_by(&state.db, claims.id, id).await? {
        warn!(user_id = claims.id, record_id = id, "delete denied");
        return Err(ApiError::forbidden("no permission to delete this record"));
    }

    repo::delete(&state.db, claims.id, id).await?;
    info!(user_id = claims.id, record_id = id, "record deleted");
    Ok(ApiResponse::message("record deleted"))
}
