use sqlx::{Pool, Postgres};

use crate::{
    error::{ApiError, QueryError},
    pagination::PageContext,
    schema::{Subscription, User, UserRow},
    SUBSCRIPTION_COUNT_PER_PAGE,
};

use super::get_user_by_id;

pub async fn list_subscriptions(
    user_id: i32,
    pool: &Pool<Postgres>,
) -> Result<Vec<Subscription>, ApiError> {
    let list: Vec<Subscription> = sqlx::query_as("SELECT * FROM subscriptions WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

pub async fn is_subscribed(
    user_id: i32,
    author_id: i32,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let result: Option<(i32,)> = sqlx::query_as(
        "SELECT author_id FROM subscriptions WHERE user_id = $1 AND author_id = $2",
    )
    .bind(user_id)
    .bind(author_id)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(result.is_some())
}

/// Subscribing to yourself or to the same author twice is rejected.
pub async fn subscribe(
    user_id: i32,
    author_id: i32,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    if user_id == author_id {
        return Err(ApiError::InvalidRequest(String::from(
            "You can't subscribe to yourself",
        )));
    }

    let author = get_user_by_id(pool, author_id).await?;
    if author.is_none() {
        return Err(ApiError::NotFound(String::from(
            "No user exists with specified id",
        )));
    }

    let result = sqlx::query(
        "INSERT INTO subscriptions (user_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(author_id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::AlreadyExists(String::from(
            "Already subscribed to this author",
        )));
    }

    Ok(())
}

pub async fn unsubscribe(
    user_id: i32,
    author_id: i32,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
        .bind(user_id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::NotFound(String::from(
            "Not subscribed to this author",
        )));
    }

    Ok(())
}

/// Authors the user subscribes to, newest subscription first.
pub async fn fetch_subscriptions(
    user_id: i32,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<UserRow>, ApiError> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.*, COUNT(*) OVER() AS count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.user_id = $1
        ORDER BY u.id DESC LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(SUBSCRIPTION_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.get(0).map(|p| p.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, SUBSCRIPTION_COUNT_PER_PAGE, offset);

    Ok(page)
}

pub async fn list_subscribed_authors(
    user_id: i32,
    pool: &Pool<Postgres>,
) -> Result<Vec<User>, ApiError> {
    let list: Vec<User> = sqlx::query_as(
        "
        SELECT u.*
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.user_id = $1
        ORDER BY u.id DESC
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}
