use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::error::{on_unique_violation, ApiError};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub is_income: bool,
}

/// System categories (owner 0) plus the user's own, income first and then
/// in creation order.
pub async fn list_for_user(db: &SqlitePool, user_id: i64) -> Result<Vec<Category>, ApiError> {
    let categories = sqlx::query_as::<_, Category>(
        r#"
        SELECT id, name, is_income
        FROM categories
        WHERE user_id = 0 OR user_id = ?1
        ORDER BY is_income DESC, id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(categories)
}

pub async fn create(
    db: &SqlitePool,
    user_id: i64,
    name: &str,
    is_income: bool,
) -> Result<i64, ApiError> {
    let result = sqlx::query(
        r#"
        INSERT INTO categories (user_id, name, is_income)
        VALUES (?1, ?2, ?3)
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(is_income)
    .execute(db)
    .await
    .map_err(|e| on_unique_violation(e, "a category with this name already exists"))?;
    Ok(result.last_insert_rowid())
}
