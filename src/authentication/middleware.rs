use warp::{
    reject::{self, Rejection},
    Filter,
};

use super::jwt::{verify_jwt_session, JwtSessionData};

#[derive(Debug)]
struct Unauthorized;

impl reject::Reject for Unauthorized {}

pub fn with_auth() -> impl Filter<Extract = ((),), Error = Rejection> + Copy {
    warp::cookie::<String>("session").and_then(|session: String| async move {
        if let Ok(_) = verify_jwt_session(session) {
            Ok(())
        } else {
            Err(warp::reject::custom(Unauthorized))
        }
    })
}

pub fn with_session() -> impl Filter<Extract = (JwtSessionData,), Error = Rejection> + Copy {
    warp::cookie::<String>("session").and_then(|session: String| async move {
        if let Ok(data) = verify_jwt_session(session) {
            Ok(data)
        } else {
            Err(warp::reject::custom(Unauthorized))
        }
    })
}

pub fn with_possible_session(
) -> impl Filter<Extract = (Option<JwtSessionData>,), Error = Rejection> + Copy {
    warp::cookie::<String>("session").map(move |session: String| {
        if let Ok(data) = verify_jwt_session(session) {
            Some(data)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use crate::jwt::generate_jwt_session;
    use crate::schema::{User, UserRole};

    use super::*;

    fn session_cookie() -> String {
        let user = User {
            id: 7,
            email: String::from("jane@example.com"),
            username: String::from("jdoe"),
            first_name: String::from("Jane"),
            last_name: String::from("Doe"),
            password: String::new(),
            role: UserRole::User,
        };

        format!("session={}", generate_jwt_session(&user))
    }

    #[tokio::test]
    async fn session_filter_extracts_claims() {
        let session = warp::test::request()
            .header("cookie", session_cookie())
            .filter(&with_session())
            .await
            .unwrap();

        assert_eq!(session.user_id, 7);
        assert_eq!(session.email, "jane@example.com");
    }

    #[tokio::test]
    async fn auth_filter_rejects_garbage_token() {
        assert!(warp::test::request()
            .header("cookie", "session=not-a-token")
            .filter(&with_auth())
            .await
            .is_err());

        assert!(warp::test::request()
            .header("cookie", session_cookie())
            .filter(&with_auth())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn possible_session_degrades_to_none() {
        let session = warp::test::request()
            .header("cookie", "session=not-a-token")
            .filter(&with_possible_session())
            .await
            .unwrap();

        assert!(session.is_none());

        let session = warp::test::request()
            .header("cookie", session_cookie())
            .filter(&with_possible_session())
            .await
            .unwrap();

        assert!(session.is_some());
    }
}
