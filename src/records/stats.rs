use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;
use tracing::instrument;

use crate::{
    auth::jwt::CurrentUser,
    error::ApiError,
    records::dto::is_valid_month,
    response::ApiResponse,
    state::AppState,
};

pub fn stats_routes() -> Router<AppState> {
    Router::new().route("/records/stats", get(monthly_stats))
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub month: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct CategoryStat {
    pub name: Option<String>,
    pub total_amount: f64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct DailyTrendPoint {
    pub record_date: String,
    pub daily_income: f64,
    pub daily_expense: f64,
}

#[derive(Debug, Serialize)]
pub struct MonthlyStats {
    pub month: String,
    pub total_income: f64,
    pub total_expense: f64,
    pub balance: f64,
    pub expense_category_stats: Vec<CategoryStat>,
    pub income_category_stats: Vec<CategoryStat>,
    pub daily_trend: Vec<DailyTrendPoint>,
}

fn current_month() -> String {
    let date = OffsetDateTime::now_utc().date();
    format!("{:04}-{:02}", date.year(), u8::from(date.month()))
}

#[instrument(skip(state))]
pub async fn monthly_stats(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Query(query): Query<StatsQuery>,
) -> Result<ApiResponse<MonthlyStats>, ApiError> {
    let month = match query.month {
        Some(month) => {
            if !is_valid_month(&month) {
                return Err(ApiError::validation("month must be formatted as YYYY-MM"));
            }
            month
        }
        None => current_month(),
    };

    let stats = collect(&state.db, claims.id, &month).await?;
    Ok(ApiResponse::ok(stats))
}

/// Amounts are aggregated as magnitudes, so clients following the
/// negative-expense sign convention and clients sending positive amounts
/// produce the same totals.
async fn collect(db: &SqlitePool, user_id: i64, month: &str) -> Result<MonthlyStats, ApiError> {
    let (total_income, total_expense): (f64, f64) = sqlx::query_as(
        r#"
        SELECT
            IFNULL(SUM(CASE WHEN c.is_income = 1 THEN ABS(r.amount) ELSE 0.0 END), 0.0) AS total_income,
            IFNULL(SUM(CASE WHEN c.is_income = 0 THEN ABS(r.amount) ELSE 0.0 END), 0.0) AS total_expense
        FROM records r
        LEFT JOIN categories c ON r.category_id = c.id
        WHERE r.user_id = ?1 AND strftime('%Y-%m', r.record_date) = ?2
        "#,
    )
    .bind(user_id)
    .bind(month)
    .fetch_one(db)
    .await?;

    let expense_category_stats = category_stats(db, user_id, month, false).await?;
    let income_category_stats = category_stats(db, user_id, month, true).await?;

    let daily_trend = sqlx::query_as::<_, DailyTrendPoint>(
        r#"
        SELECT
            r.record_date,
            SUM(CASE WHEN c.is_income = 1 THEN ABS(r.amount) ELSE 0.0 END) AS daily_income,
            SUM(CASE WHEN c.is_income = 0 THEN ABS(r.amount) ELSE 0.0 END) AS daily_expense
        FROM records r
        LEFT JOIN categories c ON r.category_id = c.id
        WHERE r.user_id = ?1 AND strftime('%Y-%m', r.record_date) = ?2
        GROUP BY r.record_date
        ORDER BY r.record_date ASC
        "#,
    )
    .bind(user_id)
    .bind(month)
    .fetch_all(db)
    .await?;

    Ok(MonthlyStats {
        month: month.to_owned(),
        total_income,
        total_expense,
        balance: total_income - total_expense,
        expense_category_stats,
        income_category_stats,
        daily_trend,
    })
}

async fn category_stats(
    db: &SqlitePool,
    user_id: i64,
    month: &str,
    income: bool,
) -> Result<Vec<CategoryStat>, ApiError> {
    let stats = sqlx::query_as::<_, CategoryStat>(
        r#"
        SELECT c.name, SUM(ABS(r.amount)) AS total_amount
        FROM records r
        LEFT JOIN categories c ON r.category_id = c.id
        WHERE r.user_id = ?1 AND strftime('%Y-%m', r.record_date) = ?2 AND c.is_income = ?3
        GROUP BY c.id, c.name
        ORDER BY total_amount DESC
        "#,
    )
    .bind(user_id)
    .bind(month)
    .bind(income)
    .fetch_all(db)
    .await?;
    Ok(stats)
}
