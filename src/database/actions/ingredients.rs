use sqlx::{Pool, Postgres};

use crate::{
    error::{ApiError, QueryError},
    jwt::SessionData,
    pagination::PageContext,
    permissions::{admin_or_read_only, RequestKind},
    schema::{Ingredient, IngredientRow},
    INGREDIENT_COUNT_PER_PAGE,
};

/// Ordered by name. `search` is a name-prefix ILIKE pattern prepared by the
/// caller (e.g. `flo%`).
pub async fn fetch_ingredients(
    search: String,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<IngredientRow>, ApiError> {
    let rows: Vec<IngredientRow> = sqlx::query_as(
        "
        SELECT i.*, COUNT(*) OVER() AS count
        FROM ingredients i
        WHERE i.name ILIKE $1
        ORDER BY i.name LIMIT $2 OFFSET $3
    ",
    )
    .bind(search)
    .bind(INGREDIENT_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.get(0).map(|p| p.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, INGREDIENT_COUNT_PER_PAGE, offset);
    Ok(page)
}

pub async fn list_ingredients(pool: &Pool<Postgres>) -> Result<Vec<Ingredient>, ApiError> {
    let list: Vec<Ingredient> = sqlx::query_as("SELECT * FROM ingredients ORDER BY name")
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

pub async fn get_ingredient(
    id: i32,
    pool: &Pool<Postgres>,
) -> Result<Option<Ingredient>, ApiError> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Admin-only write; the catalogue is read-only for everyone else.
pub async fn create_ingredient(
    session: Option<&SessionData>,
    name: &str,
    measurement_unit: &str,
    pool: &Pool<Postgres>,
) -> Result<i32, ApiError> {
    admin_or_read_only(RequestKind::Write, session)?;

    if name.is_empty() || measurement_unit.is_empty() {
        return Err(ApiError::InvalidRequest(String::from(
            "Name and measurement unit are required",
        )));
    }

    let id: (i32,) = sqlx::query_as(
        "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2) RETURNING id",
    )
    .bind(name)
    .bind(measurement_unit)
    .fetch_one(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(id.0)
}
