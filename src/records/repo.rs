use serde::Serialize;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use crate::error::ApiError;

/// A record joined with its category, as listed to the client.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RecordRow {
    pub id: i64,
    pub amount: f64,
    pub description: String,
    pub record_date: String,
    pub category_id: i64,
    pub category_name: Option<String>,
    pub is_income: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Income,
    Expense,
}

/// Independently combinable list filters. The date range only applies when
/// both bounds are present.
#[derive(Debug, Default)]
pub struct RecordFilters {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub category_id: Option<i64>,
    pub kind: Option<RecordKind>,
}

const SELECT_RECORDS: &str = "SELECT r.id, r.amount, r.description, r.record_date, r.category_id, \
     c.name AS category_name, c.is_income \
     FROM records r LEFT JOIN categories c ON r.category_id = c.id";

const COUNT_RECORDS: &str =
    "SELECT COUNT(*) FROM records r LEFT JOIN categories c ON r.category_id = c.id";

/// All user-supplied values go through `push_bind`, never into the SQL text.
fn push_filters<'a>(builder: &mut QueryBuilder<'a, Sqlite>, user_id: i64, filters: &'a RecordFilters) {
    builder.push(" WHERE r.user_id = ").push_bind(user_id);
    if let (Some(start), Some(end)) = (filters.start_date.as_deref(), filters.end_date.as_deref()) {
        builder
            .push(" AND r.record_date BETWEEN ")
            .push_bind(start)
            .push(" AND ")
            .push_bind(end);
    }
    if let Some(category_id) = filters.category_id {
        builder.push(" AND r.category_id = ").push_bind(category_id);
    }
    match filters.kind {
        Some(RecordKind::Income) => {
            builder.push(" AND c.is_income = 1");
        }
        Some(RecordKind::Expense) => {
            builder.push(" AND c.is_income = 0");
        }
        None => {}
    }
}

/// One page of records plus the total count of everything matching the
/// filters, computed by a second query sharing the same predicates.
pub async fn list(
    db: &SqlitePool,
    user_id: i64,
    filters: &RecordFilters,
    page: i64,
    page_size: i64,
) -> Result<(Vec<RecordRow>, i64), ApiError> {
    let page = page.max(1);
    let page_size = page_size.max(1);

    let mut query = QueryBuilder::new(SELECT_RECORDS);
    push_filters(&mut query, user_id, filters);
    query
        .push(" ORDER BY r.record_date DESC, r.created_at DESC LIMIT ")
        .push_bind(page_size)
        .push(" OFFSET ")
        .push_bind((page - 1) * page_size);
    let records = query.build_query_as::<RecordRow>().fetch_all(db).await?;

    let mut count = QueryBuilder::new(COUNT_RECORDS);
    push_filters(&mut count, user_id, filters);
    let total: i64 = count.build_query_scalar().fetch_one(db).await?;

    Ok((records, total))
}

pub async fn create(
    db: &SqlitePool,
    user_id: i64,
    amount: f64,
    category_id: i64,
    description: &str,
    record_date: &str,
) -> Result<i64, ApiError> {
    let result = sqlx::query(
        r#"
        INSERT INTO records (user_id, amount, category_id, description, record_date)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .bind(category_id)
    .bind(description)
    .bind(record_date)
    .execute(db)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Ownership precondition for mutations: the row must exist and belong to
/// the caller.
pub async fn is_owned_by(db: &SqlitePool, user_id: i64, id: i64) -> Result<bool, ApiError> {
    let row = sqlx::query("SELECT id FROM records WHERE id = ?1 AND user_id = ?2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    Ok(row.is_some())
}

pub async fn update(
    db: &SqlitePool,
    user_id: i64,
    id: i64,
    amount: f64,
    category_id: i64,
    description: &str,
    record_date: &str,
) -> Result<(), ApiError> {
    sqlx::query(
        r#"
        UPDATE records
        SET amount = ?1, category_id = ?2, description = ?3, record_date = ?4
        WHERE id = ?5 AND user_id = ?6
        "#,
    )
    .bind(amount)
    .bind(category_id)
    .bind(description)
    .bind(record_date)
    .bind(id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn delete(db: &SqlitePool, user_id: i64, id: i64) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM records WHERE id = ?1 AND user_id = ?2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::repo::User, categories, state::AppState};

    async fn seed_user(state: &AppState, name: &str) -> i64 {
        User::create(&state.db, name, "hash").await.unwrap().id
    }

    #[tokio::test]
    async fn pagination_returns_at_most_a_page_and_a_stable_total() {
        let state = AppState::for_tests().await;
        let alice = seed_user(&state, "alice").await;
        let food = categories::repo::create(&state.db, alice, "Takeout", false)
            .await
            .unwrap();

        for day in 1..=25 {
            let date = format!("2024-05-{day:02}");
            create(&state.db, alice, -10.0, food, "", &date).await.unwrap();
        }

        let filters = RecordFilters::default();
        let (rows, total) = list(&state.db, alice, &filters, 1, 10).await.unwrap();
        assert_eq!(rows.len(), 10);
        assert_eq!(total, 25);
        // Most recent date first.
        assert_eq!(rows[0].record_date, "2024-05-25");

        let (rows, total) = list(&state.db, alice, &filters, 3, 10).await.unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(total, 25);
        assert_eq!(rows.last().unwrap().record_date, "2024-05-01");
    }

    #[tokio::test]
    async fn filters_compose_independently() {
        let state = AppState::for_tests().await;
        let alice = seed_user(&state, "alice").await;
        let salary = categories::repo::create(&state.db, alice, "Paycheck", true)
            .await
            .unwrap();
        let food = categories::repo::create(&state.db, alice, "Takeout", false)
            .await
            .unwrap();

        create(&state.db, alice, 1000.0, salary, "may pay", "2024-05-01")
            .await
            .unwrap();
        create(&state.db, alice, -20.0, food, "lunch", "2024-05-10")
            .await
            .unwrap();
        create(&state.db, alice, -30.0, food, "dinner", "2024-06-02")
            .await
            .unwrap();

        let income_only = RecordFilters {
            kind: Some(RecordKind::Income),
            ..Default::default()
        };
        let (rows, total) = list(&state.db, alice, &income_only, 1, 20).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].category_name.as_deref(), Some("Paycheck"));
        assert_eq!(rows[0].is_income, Some(true));

        let may_only = RecordFilters {
            start_date: Some("2024-05-01".into()),
            end_date: Some("2024-05-31".into()),
            ..Default::default()
        };
        let (_, total) = list(&state.db, alice, &may_only, 1, 20).await.unwrap();
        assert_eq!(total, 2);

        let by_category = RecordFilters {
            category_id: Some(food),
            ..Default::default()
        };
        let (rows, total) = list(&state.db, alice, &by_category, 1, 20).await.unwrap();
        assert_eq!(total, 2);
        assert!(rows.iter().all(|r| r.category_id == food));

        let combined = RecordFilters {
            start_date: Some("2024-05-01".into()),
            end_date: Some("2024-05-31".into()),
            category_id: Some(food),
            kind: Some(RecordKind::Expense),
        };
        let (rows, total) = list(&state.db, alice, &combined, 1, 20).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].description, "lunch");
    }

    #[tokio::test]
    async fn listing_is_scoped_to_the_owner() {
        let state = AppState::for_tests().await;
        let alice = seed_user(&state, "alice").await;
        let bob = seed_user(&state, "bob").await;
        let food = categories::repo::create(&state.db, alice, "Takeout", false)
            .await
            .unwrap();

        create(&state.db, alice, -20.0, food, "", "2024-05-10")
            .await
            .unwrap();

        let (rows, total) = list(&state.db, bob, &RecordFilters::default(), 1, 20)
            .await
            .unwrap();
        assert!(rows.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn ownership_check_and_scoped_mutations() {
        let state = AppState::for_tests().await;
        let alice = seed_user(&state, "alice").await;
        let bob = seed_user(&state, "bob").await;
        let food = categories::repo::create(&state.db, alice, "Takeout", false)
            .await
            .unwrap();

        let id = create(&state.db, alice, -20.0, food, "lunch", "2024-05-10")
            .await
            .unwrap();
        assert!(is_owned_by(&state.db, alice, id).await.unwrap());
        assert!(!is_owned_by(&state.db, bob, id).await.unwrap());

        update(&state.db, alice, id, -25.0, food, "late lunch", "2024-05-11")
            .await
            .unwrap();
        let (rows, _) = list(&state.db, alice, &RecordFilters::default(), 1, 20)
            .await
            .unwrap();
        assert_eq!(rows[0].amount, -25.0);
        assert_eq!(rows[0].description, "late lunch");
        assert_eq!(rows[0].record_date, "2024-05-11");

        delete(&state.db, alice, id).await.unwrap();
        let (rows, total) = list(&state.db, alice, &RecordFilters::default(), 1, 20)
            .await
            .unwrap();
        assert!(rows.is_empty());
        assert_eq!(total, 0);
    }
}
