use sqlx::{Pool, Postgres};

use crate::{
    error::{ApiError, QueryError},
    schema::{CartEntry, User},
    shopping::{aggregate_ingredients, render_shopping_list, IngredientAmount},
};

use super::get_recipe;

pub async fn is_in_cart(
    recipe_id: i32,
    user_id: i32,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let result: Option<(i32,)> = sqlx::query_as(
        "SELECT recipe_id FROM shopping_cart WHERE recipe_id = $1 AND user_id = $2",
    )
    .bind(recipe_id)
    .bind(user_id)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(result.is_some())
}

pub async fn list_cart(user_id: i32, pool: &Pool<Postgres>) -> Result<Vec<CartEntry>, ApiError> {
    let list: Vec<CartEntry> = sqlx::query_as("SELECT * FROM shopping_cart WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

/// Adding the same recipe twice is an error, not a no-op.
pub async fn add_to_cart(
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
        "INSERT INTO shopping_cart (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::AlreadyExists(String::from(
            "Recipe is already in the shopping cart",
        )));
    }

    Ok(())
}

pub async fn remove_from_cart(
    recipe_id: i32,
    user_id: i32,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM shopping_cart WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(recipe_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::NotFound(String::from(
            "Recipe is not in the shopping cart",
        )));
    }

    Ok(())
}

/// Raw join-table rows across every recipe in the user's cart. The same
/// ingredient appears once per recipe using it; summing is done in Rust by
/// `aggregate_ingredients`.
pub async fn collect_cart_ingredients(
    user_id: i32,
    pool: &Pool<Postgres>,
) -> Result<Vec<IngredientAmount>, ApiError> {
    let rows: Vec<IngredientAmount> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit,
               ri.amount::BIGINT AS amount
        FROM shopping_cart sc
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = $1
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

/// The download endpoint body: collect, aggregate, render.
pub async fn shopping_list_for_user(
    user: &User,
    pool: &Pool<Postgres>,
) -> Result<String, ApiError> {
    let rows = collect_cart_ingredients(user.id, pool).await?;
    let aggregated = aggregate_ingredients(rows);

    log::debug!(
        "rendering shopping list for user {} ({} lines)",
        user.id,
        aggregated.len()
    );

    Ok(render_shopping_list(&user.full_name(), &aggregated))
}
