use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::TypeError;

pub type Uuid = i32;

#[derive(
    Clone, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

impl TryFrom<Value> for UserRole {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(value) => match value {
                "user" => Ok(Self::User),
                "admin" => Ok(Self::Admin),
                _ => Err(TypeError::new("Invalid variant")),
            },
            None => Err(TypeError::new("Failed to parse value as string")),
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub role: UserRole,
}

impl User {
    /// Display name used in the shopping-list report header. Falls back to
    /// the username when both name fields are blank.
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();

        if name.is_empty() {
            self.username.to_owned()
        } else {
            name.to_string()
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub role: UserRole,

    pub count: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub color: String,
}

/// Matches `^#([A-Fa-f0-9]{6}|[A-Fa-f0-9]{3})$`.
pub fn is_valid_hex_color(color: &str) -> bool {
    let Some(digits) = color.strip_prefix('#') else {
        return false;
    };

    (digits.len() == 6 || digits.len() == 3) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct IngredientRow {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,

    pub count: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,

    pub favorite_count: i32,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,

    pub favorite_count: i32,

    pub count: i64,
}

/// Payload for creating or replacing a recipe.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRecipe {
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub ingredients: Vec<NewRecipeIngredient>,
    pub tags: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRecipeIngredient {
    pub ingredient_id: Uuid,
    pub amount: i32,
}

/// Join row between a recipe and an ingredient, carrying the amount.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct IngredientInRecipe {
    pub recipe_id: Uuid,
    pub ingredient_id: Uuid,
    pub amount: i32,
}

/// Joined read shape: ingredient name and unit resolved for a recipe row.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeIngredient {
    pub recipe_id: Uuid,
    pub ingredient_id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Favorite {
    pub user_id: Uuid,
    pub recipe_id: Uuid,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct CartEntry {
    pub user_id: Uuid,
    pub recipe_id: Uuid,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Subscription {
    pub user_id: Uuid,
    pub author_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str, username: &str) -> User {
        User {
            id: 1,
            email: String::from("jane@example.com"),
            username: username.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            password: String::new(),
            role: UserRole::User,
        }
    }

    #[test]
    fn full_name_joins_and_trims() {
        assert_eq!(user("Jane", "Doe", "jdoe").full_name(), "Jane Doe");
        assert_eq!(user("Jane", "", "jdoe").full_name(), "Jane");
        assert_eq!(user("", "Doe", "jdoe").full_name(), "Doe");
    }

    #[test]
    fn full_name_falls_back_to_username() {
        assert_eq!(user("", "", "jdoe").full_name(), "jdoe");
    }

    #[test]
    fn hex_colors() {
        assert!(is_valid_hex_color("#000000"));
        assert!(is_valid_hex_color("#FfA07a"));
        assert!(is_valid_hex_color("#abc"));

        assert!(!is_valid_hex_color("000000"));
        assert!(!is_valid_hex_color("#00000"));
        assert!(!is_valid_hex_color("#0000000"));
        assert!(!is_valid_hex_color("#abcg12"));
        assert!(!is_valid_hex_color("#"));
        assert!(!is_valid_hex_color(""));
    }

    #[test]
    fn user_role_from_json_value() {
        use serde_json::json;

        assert_eq!(UserRole::try_from(json!("admin")).unwrap(), UserRole::Admin);
        assert_eq!(UserRole::try_from(json!("user")).unwrap(), UserRole::User);
        assert!(UserRole::try_from(json!("staff")).is_err());
        assert!(UserRole::try_from(json!(3)).is_err());
    }
}
