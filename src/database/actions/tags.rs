use sqlx::{Pool, Postgres};

use crate::{
    error::{ApiError, QueryError},
    jwt::SessionData,
    permissions::{admin_or_read_only, RequestKind},
    schema::{is_valid_hex_color, Tag},
    DEFAULT_TAG_COLOR,
};

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, ApiError> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

pub async fn get_tag(id: i32, pool: &Pool<Postgres>) -> Result<Option<Tag>, ApiError> {
    let row: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn find_tag_by_slug(
    slug: &str,
    pool: &Pool<Postgres>,
) -> Result<Option<i32>, ApiError> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT id FROM tags WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row.map(|tag| tag.0))
}

/// Admin-only write. Name, slug and color are all unique; a conflicting
/// insert is rejected instead of silently ignored.
pub async fn create_tag(
    session: Option<&SessionData>,
    name: &str,
    slug: &str,
    color: &str,
    pool: &Pool<Postgres>,
) -> Result<i32, ApiError> {
    admin_or_read_only(RequestKind::Write, session)?;

    if name.is_empty() || slug.is_empty() {
        return Err(ApiError::InvalidRequest(String::from(
            "Name and slug are required",
        )));
    }

    let color = if color.is_empty() {
        DEFAULT_TAG_COLOR
    } else {
        color
    };
    if !is_valid_hex_color(color) {
        return Err(ApiError::InvalidRequest(String::from(
            "Enter a valid HEX color",
        )));
    }

    let id: Option<(i32,)> = sqlx::query_as(
        "INSERT INTO tags (name, slug, color) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING RETURNING id",
    )
    .bind(name)
    .bind(slug)
    .bind(color)
    .fetch_optional(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    match id {
        Some(id) => Ok(id.0),
        None => Err(ApiError::AlreadyExists(String::from(
            "Tag with the same name, slug or color already exists",
        ))),
    }
}

pub async fn list_recipe_tags(recipe_id: i32, pool: &Pool<Postgres>) -> Result<Vec<Tag>, ApiError> {
    let list: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.*
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

pub async fn add_tag_to_recipe(
    recipe_id: i32,
    tag_id: i32,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let tag = get_tag(tag_id, pool).await?;
    if tag.is_none() {
        return Err(ApiError::NotFound(String::from(
            "No tag exists with specified id",
        )));
    }

    sqlx::query(
        "INSERT INTO recipe_tags (recipe_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(recipe_id)
    .bind(tag_id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

pub async fn remove_tag_from_recipe(
    recipe_id: i32,
    tag_id: i32,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1 AND tag_id = $2")
        .bind(recipe_id)
        .bind(tag_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}
