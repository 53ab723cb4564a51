use sqlx::{Pool, Postgres};

use crate::{
    authentication::{cryptography::verify_password, jwt::generate_jwt_session},
    error::{ApiError, QueryError},
    schema::User,
    MAX_LENGTH_EMAIL,
};

pub async fn get_user_by_email(
    pool: &Pool<Postgres>,
    email: &str,
) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn get_user_by_id(
    pool: &Pool<Postgres>,
    user_id: i32,
) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Basic shape checks; uniqueness is left to the store constraint.
pub fn validate_registration(
    email: &str,
    username: &str,
    first_name: &str,
    last_name: &str,
) -> Result<(), ApiError> {
    if email.is_empty() || email.len() > MAX_LENGTH_EMAIL || !email.contains('@') {
        return Err(ApiError::InvalidRequest(String::from("Invalid email")));
    }

    if username.is_empty() || first_name.is_empty() || last_name.is_empty() {
        return Err(ApiError::InvalidRequest(String::from(
            "Username, first name and last name are required",
        )));
    }

    Ok(())
}

/// Creates a user. `password` must already be the argon2 hash.
/// Returns false when the email is already taken.
pub async fn register_user(
    email: &str,
    username: &str,
    first_name: &str,
    last_name: &str,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    validate_registration(email, username, first_name, last_name)?;

    let query = sqlx::query(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT DO NOTHING RETURNING *;
    ",
    )
    .bind(email)
    .bind(username)
    .bind(first_name)
    .bind(last_name)
    .bind(password)
    .execute(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(query.rows_affected() > 0)
}

/// Email is the login identifier. A missing user and a wrong password are
/// indistinguishable to the caller.
pub async fn login_user(
    email: &str,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<String, ApiError> {
    let user = get_user_by_email(pool, email).await?;
    let Some(user) = user else {
        return Err(ApiError::InvalidRequest(String::from("Invalid credentials")));
    };

    let authenticated = verify_password(password, &user.password)
        .map_err(|_e| ApiError::InvalidRequest(String::from("Invalid credentials")))?;
    if !authenticated {
        return Err(ApiError::InvalidRequest(String::from("Invalid credentials")));
    }

    let session = generate_jwt_session(&user);

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_shape_checks() {
        assert!(validate_registration("jane@example.com", "jdoe", "Jane", "Doe").is_ok());

        assert!(validate_registration("", "jdoe", "Jane", "Doe").is_err());
        assert!(validate_registration("not-an-email", "jdoe", "Jane", "Doe").is_err());
        assert!(validate_registration("jane@example.com", "", "Jane", "Doe").is_err());
        assert!(validate_registration("jane@example.com", "jdoe", "", "Doe").is_err());
        assert!(validate_registration("jane@example.com", "jdoe", "Jane", "").is_err());

        let long = format!("{}@example.com", "a".repeat(250));
        assert!(validate_registration(&long, "jdoe", "Jane", "Doe").is_err());
    }
}
