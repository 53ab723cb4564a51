use sqlx::{Pool, Postgres};

use crate::{
    authentication::permissions::ActionType,
    error::{ApiError, QueryError},
    form::{Form, FormData},
    jwt::SessionData,
    pagination::PageContext,
    schema::{
        IngredientInRecipe, NewRecipe, NewRecipeIngredient, Recipe, RecipeIngredient, RecipeRow,
        Uuid,
    },
    MAX_LENGTH_NAME, MAX_LENGTH_TEXT, RECIPE_COUNT_PER_PAGE,
};

/// Newest first. `search` is an ILIKE pattern prepared by the caller.
pub async fn fetch_recipes(
    author: Option<i32>,
    tag_slug: Option<String>,
    search: String,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, ApiError> {
    let rows: Vec<RecipeRow> = match (author, tag_slug) {
        (Some(author), Some(tag_slug)) => {
            sqlx::query_as(
                "
                SELECT DISTINCT r.*, COUNT(*) OVER() AS count
                FROM recipes r
                INNER JOIN recipe_tags rt ON rt.recipe_id = r.id
                INNER JOIN tags t ON t.id = rt.tag_id
                WHERE r.author_id = $1 AND t.slug = $2 AND r.name ILIKE $3
                ORDER BY r.id DESC LIMIT $4 OFFSET $5
            ",
            )
            .bind(author)
            .bind(tag_slug)
            .bind(search)
            .bind(RECIPE_COUNT_PER_PAGE)
            .bind(offset)
            .fetch_all(&*pool)
            .await
            .map_err(|e| QueryError::from(e).into())?
        }
        (Some(author), None) => {
            sqlx::query_as(
                "
                SELECT r.*, COUNT(*) OVER() AS count
                FROM recipes r
                WHERE r.author_id = $1 AND r.name ILIKE $2
                ORDER BY r.id DESC LIMIT $3 OFFSET $4
            ",
            )
            .bind(author)
            .bind(search)
            .bind(RECIPE_COUNT_PER_PAGE)
            .bind(offset)
            .fetch_all(&*pool)
            .await
            .map_err(|e| QueryError::from(e).into())?
        }
        (None, Some(tag_slug)) => {
            sqlx::query_as(
                "
                SELECT DISTINCT r.*, COUNT(*) OVER() AS count
                FROM recipes r
                INNER JOIN recipe_tags rt ON rt.recipe_id = r.id
                INNER JOIN tags t ON t.id = rt.tag_id
                WHERE t.slug = $1 AND r.name ILIKE $2
                ORDER BY r.id DESC LIMIT $3 OFFSET $4
            ",
            )
            .bind(tag_slug)
            .bind(search)
            .bind(RECIPE_COUNT_PER_PAGE)
            .bind(offset)
            .fetch_all(&*pool)
            .await
            .map_err(|e| QueryError::from(e).into())?
        }
        (None, None) => {
            sqlx::query_as(
                "
                SELECT r.*, COUNT(*) OVER() AS count
                FROM recipes r
                WHERE r.name ILIKE $1
                ORDER BY r.id DESC LIMIT $2 OFFSET $3
            ",
            )
            .bind(search)
            .bind(RECIPE_COUNT_PER_PAGE)
            .bind(offset)
            .fetch_all(&*pool)
            .await
            .map_err(|e| QueryError::from(e).into())?
        }
    };

    let total_count = rows.get(0).map(|p| p.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, RECIPE_COUNT_PER_PAGE, offset);
    Ok(page)
}

pub async fn get_recipe(id: i32, pool: &Pool<Postgres>) -> Result<Option<Recipe>, ApiError> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Resolves a recipe for modification: the author may edit their own,
/// an admin may edit anything.
pub async fn get_recipe_mut(
    id: i32,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    let recipe = get_recipe(id, pool).await?;
    session.authenticate(ActionType::ManageOwnRecipes)?;

    match recipe {
        Some(recipe) => match session.authenticate(ActionType::ManageAllRecipes) {
            Ok(_) => Ok(recipe),
            Err(_) => {
                if recipe.author_id != session.user_id {
                    Err(ApiError::Unauthorized(String::from(
                        "Only the author can modify this recipe",
                    )))
                } else {
                    Ok(recipe)
                }
            }
        },
        None => Err(ApiError::NotFound(String::from(
            "No recipe exists with specified id",
        ))),
    }
}

pub fn validate_new_recipe(recipe: &NewRecipe) -> Result<(), ApiError> {
    if recipe.name.is_empty() || recipe.name.len() > MAX_LENGTH_NAME {
        return Err(ApiError::InvalidRequest(String::from("Invalid name")));
    }

    if recipe.text.len() > MAX_LENGTH_TEXT {
        return Err(ApiError::InvalidRequest(String::from(
            "Description is too long",
        )));
    }

    if recipe.cooking_time < 1 {
        return Err(ApiError::InvalidRequest(String::from("Enter a valid time")));
    }

    if recipe.ingredients.is_empty() {
        return Err(ApiError::InvalidRequest(String::from(
            "Recipe needs at least one ingredient",
        )));
    }

    if recipe.ingredients.iter().any(|i| i.amount < 1) {
        return Err(ApiError::InvalidRequest(String::from(
            "Enter a valid amount",
        )));
    }

    for (n, ingredient) in recipe.ingredients.iter().enumerate() {
        if recipe.ingredients[..n]
            .iter()
            .any(|other| other.ingredient_id == ingredient.ingredient_id)
        {
            return Err(ApiError::InvalidRequest(String::from(
                "Duplicate ingredient in recipe",
            )));
        }
    }

    Ok(())
}

/// Inserts the recipe, its ingredient rows and its tag links in one
/// transaction.
pub async fn create_recipe(
    session: &SessionData,
    recipe: NewRecipe,
    pool: &Pool<Postgres>,
) -> Result<Uuid, ApiError> {
    session.authenticate(ActionType::CreateRecipes)?;
    validate_new_recipe(&recipe)?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new(String::from("Could not start transaction")).into())?;

    let id: (i32,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(session.user_id)
    .bind(&recipe.name)
    .bind(&recipe.image)
    .bind(&recipe.text)
    .bind(recipe.cooking_time)
    .fetch_one(&mut *tr)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    for ingredient in &recipe.ingredients {
        sqlx::query(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES ($1, $2, $3)",
        )
        .bind(id.0)
        .bind(ingredient.ingredient_id)
        .bind(ingredient.amount)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;
    }

    for tag_id in &recipe.tags {
        sqlx::query(
            "INSERT INTO recipe_tags (recipe_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(id.0)
        .bind(tag_id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;
    }

    tr.commit()
        .await
        .map_err(|_| QueryError::new(String::from("Could not commit transaction")).into())?;

    Ok(id.0)
}

/// Replaces a recipe's fields, ingredient rows and tag links. Ownership is
/// checked through `get_recipe_mut`.
pub async fn update_recipe(
    id: i32,
    session: &SessionData,
    recipe: NewRecipe,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    get_recipe_mut(id, session, pool).await?;
    validate_new_recipe(&recipe)?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new(String::from("Could not start transaction")).into())?;

    sqlx::query(
        "UPDATE recipes SET name = $1, image = $2, text = $3, cooking_time = $4 WHERE id = $5",
    )
    .bind(&recipe.name)
    .bind(&recipe.image)
    .bind(&recipe.text)
    .bind(recipe.cooking_time)
    .bind(id)
    .execute(&mut *tr)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    for ingredient in &recipe.ingredients {
        sqlx::query(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES ($1, $2, $3)",
        )
        .bind(id)
        .bind(ingredient.ingredient_id)
        .bind(ingredient.amount)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;
    }

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    for tag_id in &recipe.tags {
        sqlx::query(
            "INSERT INTO recipe_tags (recipe_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(tag_id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;
    }

    tr.commit()
        .await
        .map_err(|_| QueryError::new(String::from("Could not commit transaction")).into())?;

    Ok(())
}

/// Deletes a recipe and every row referencing it.
pub async fn delete_recipe(
    id: i32,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    get_recipe_mut(id, session, pool).await?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new(String::from("Could not start transaction")).into())?;

    for table in [
        "recipe_ingredients",
        "recipe_tags",
        "favorites",
        "shopping_cart",
    ] {
        sqlx::query(&format!("DELETE FROM {table} WHERE recipe_id = $1"))
            .bind(id)
            .execute(&mut *tr)
            .await
            .map_err(|e| QueryError::from(e).into())?;
    }

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new(String::from("Could not commit transaction")).into())?;

    Ok(())
}

pub async fn list_recipe_ingredients(
    recipe_id: i32,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeIngredient>, ApiError> {
    let rows: Vec<RecipeIngredient> = sqlx::query_as(
        "
        SELECT ri.recipe_id AS recipe_id, i.id AS ingredient_id, i.name AS name,
               i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY i.name
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

pub async fn set_recipe_ingredient(
    recipe_id: i32,
    ingredient_id: i32,
    amount: i32,
    pool: &Pool<Postgres>,
) -> Result<IngredientInRecipe, ApiError> {
    if amount < 1 {
        return Err(ApiError::InvalidRequest(String::from(
            "Enter a valid amount",
        )));
    }

    let row: IngredientInRecipe = sqlx::query_as(
        "
        INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount)
        VALUES ($1, $2, $3)
        ON CONFLICT (recipe_id, ingredient_id) DO UPDATE SET amount = $3
        RETURNING recipe_id, ingredient_id, amount;
    ",
    )
    .bind(recipe_id)
    .bind(ingredient_id)
    .bind(amount)
    .fetch_one(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn remove_recipe_ingredient(
    recipe_id: i32,
    ingredient_id: i32,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query(
        "DELETE FROM recipe_ingredients WHERE recipe_id = $1 AND ingredient_id = $2",
    )
    .bind(recipe_id)
    .bind(ingredient_id)
    .execute(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::NotFound(String::from(
            "Ingredient is not part of the recipe",
        )));
    }

    Ok(())
}

/// Builds a `NewRecipe` out of a loosely-typed request payload.
pub fn parse_recipe_form(data: FormData) -> Result<NewRecipe, ApiError> {
    let form = Form::from_data(data);

    let name = form.get_str("name").map_err(Into::<ApiError>::into)?;
    let image = form.get_str("image").map_err(Into::<ApiError>::into)?;
    let text = form.get_str("text").map_err(Into::<ApiError>::into)?;
    let cooking_time = form.get_number::<i32>("cooking_time")?;

    let tags = form
        .get_array("tags")
        .map_err(Into::<ApiError>::into)?
        .into_iter()
        .map(|v| {
            v.as_i64()
                .map(|id| id as i32)
                .ok_or_else(|| ApiError::InvalidRequest(String::from("Invalid tag id")))
        })
        .collect::<Result<Vec<i32>, ApiError>>()?;

    let ingredients = form
        .get_array("ingredients")
        .map_err(Into::<ApiError>::into)?
        .into_iter()
        .map(|v| {
            let ingredient_id = v
                .get("ingredient_id")
                .and_then(|id| id.as_i64())
                .ok_or_else(|| ApiError::InvalidRequest(String::from("Invalid ingredient id")))?;
            let amount = v
                .get("amount")
                .and_then(|a| a.as_i64())
                .ok_or_else(|| ApiError::InvalidRequest(String::from("Invalid amount")))?;

            Ok(NewRecipeIngredient {
                ingredient_id: ingredient_id as i32,
                amount: amount as i32,
            })
        })
        .collect::<Result<Vec<NewRecipeIngredient>, ApiError>>()?;

    Ok(NewRecipe {
        name,
        image,
        text,
        cooking_time,
        ingredients,
        tags,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn recipe() -> NewRecipe {
        NewRecipe {
            name: String::from("Pancakes"),
            image: String::from("recipes/pancakes.png"),
            text: String::from("Mix and fry."),
            cooking_time: 25,
            ingredients: vec![
                NewRecipeIngredient {
                    ingredient_id: 1,
                    amount: 500,
                },
                NewRecipeIngredient {
                    ingredient_id: 2,
                    amount: 10,
                },
            ],
            tags: vec![1],
        }
    }

    #[test]
    fn valid_recipe_passes() {
        assert!(validate_new_recipe(&recipe()).is_ok());
    }

    #[test]
    fn cooking_time_must_be_positive() {
        let mut r = recipe();
        r.cooking_time = 0;

        assert!(validate_new_recipe(&r).is_err());
    }

    #[test]
    fn amounts_must_be_positive() {
        let mut r = recipe();
        r.ingredients[1].amount = 0;

        assert!(validate_new_recipe(&r).is_err());
    }

    #[test]
    fn ingredients_are_required_and_unique() {
        let mut r = recipe();
        r.ingredients.clear();
        assert!(validate_new_recipe(&r).is_err());

        let mut r = recipe();
        r.ingredients[1].ingredient_id = r.ingredients[0].ingredient_id;
        assert!(validate_new_recipe(&r).is_err());
    }

    #[test]
    fn parses_recipe_payload() {
        let data = serde_json::from_value(json!({
            "name": "Pancakes",
            "image": "recipes/pancakes.png",
            "text": "Mix and fry.",
            "cooking_time": 25,
            "tags": [1, 2],
            "ingredients": [
                { "ingredient_id": 1, "amount": 500 },
                { "ingredient_id": 2, "amount": 10 },
            ],
        }))
        .unwrap();

        let recipe = parse_recipe_form(data).unwrap();

        assert_eq!(recipe.name, "Pancakes");
        assert_eq!(recipe.cooking_time, 25);
        assert_eq!(recipe.tags, vec![1, 2]);
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.ingredients[0].amount, 500);
    }

    #[test]
    fn rejects_malformed_payload() {
        let data = serde_json::from_value(json!({
            "name": "Pancakes",
            "image": "recipes/pancakes.png",
            "text": "Mix and fry.",
            "cooking_time": "soon",
            "tags": [],
            "ingredients": [],
        }))
        .unwrap();

        assert!(parse_recipe_form(data).is_err());
    }
}
