use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::error::ApiError;

/// One row per user with aggregate record totals, for the admin overview.
#[derive(Debug, Serialize, FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
    pub created_at: String,
    pub record_count: i64,
    pub total_income: f64,
    pub total_expense: f64,
}

pub async fn list_user_summaries(db: &SqlitePool) -> Result<Vec<UserSummary>, ApiError> {
    let summaries = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT
            u.id, u.username, u.is_admin, u.created_at,
            COUNT(r.id) AS record_count,
            IFNULL(SUM(CASE WHEN c.is_income = 1 THEN ABS(r.amount) ELSE 0.0 END), 0.0) AS total_income,
            IFNULL(SUM(CASE WHEN c.is_income = 0 THEN ABS(r.amount) ELSE 0.0 END), 0.0) AS total_expense
        FROM users u
        LEFT JOIN records r ON u.id = r.user_id
        LEFT JOIN categories c ON r.category_id = c.id
        GROUP BY u.id, u.username, u.is_admin, u.created_at
        ORDER BY u.created_at DESC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(summaries)
}
