use sqlx::{Pool, Postgres};

use crate::{
    error::{ApiError, QueryError},
    pagination::PageContext,
    schema::{Favorite, RecipeRow},
    RECIPE_COUNT_PER_PAGE,
};

use super::get_recipe;

pub async fn list_favorites(
    user_id: i32,
    pool: &Pool<Postgres>,
) -> Result<Vec<Favorite>, ApiError> {
    let list: Vec<Favorite> = sqlx::query_as("SELECT * FROM favorites WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

pub async fn is_favorite(
    recipe_id: i32,
    user_id: i32,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let result: Option<(i32,)> = sqlx::query_as(
        "SELECT recipe_id FROM favorites WHERE recipe_id = $1 AND user_id = $2",
    )
    .bind(recipe_id)
    .bind(user_id)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(result.is_some())
}

pub async fn fetch_favorites(
    user_id: i32,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, ApiError> {
    let rows: Vec<RecipeRow> = sqlx::query_as(
        "
        SELECT r.*, COUNT(*) OVER() AS count
        FROM favorites f
        INNER JOIN recipes r ON r.id = f.recipe_id
        WHERE f.user_id = $1
        ORDER BY r.id DESC LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(RECIPE_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.get(0).map(|p| p.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, RECIPE_COUNT_PER_PAGE, offset);

    Ok(page)
}

/// Favoriting the same recipe twice is an error, not a no-op.
pub async fn add_to_favorites(
    recipe_id: i32,
    user_id: i32,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let recipe = get_recipe(recipe_id, pool).await?;
    if recipe.is_none() {
        return Err(ApiError::NotFound(String::from(
            "No recipe exists with specified id",
        )));
    }

    let result = sqlx::query(
        "INSERT INTO favorites (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::AlreadyExists(String::from(
            "Recipe is already in favorites",
        )));
    }

    sqlx::query("UPDATE recipes SET favorite_count = favorite_count + 1 WHERE id = $1")
        .bind(recipe_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

pub async fn remove_from_favorites(
    recipe_id: i32,
    user_id: i32,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(recipe_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::NotFound(String::from(
            "Recipe is not in favorites",
        )));
    }

    sqlx::query("UPDATE recipes SET favorite_count = favorite_count - 1 WHERE id = $1")
        .bind(recipe_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}
