use axum::{extract::Extension, http::StatusCode, response::Response};
use entity::user;
use sea_orm::{ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::NailError;
use crate::handlers::ValidatedForm;
use crate::models::{Envelope, UserSummary};
use crate::server::State;
use crate::utils::pass::HASHER;

/// The form input for `POST /register`
///
/// Missing fields deserialize as empty strings so that they fail validation like empty ones do.
#[derive(Debug, Default, Validate, Deserialize)]
#[serde(default)]
pub(crate) struct RegisterForm {
    #[validate(length(min = 1, message = "Must not be empty."))]
    pub(crate) email: String,
    #[validate(length(min = 1, message = "Must not be empty."))]
    pub(crate) username: String,
    // upper bound matches `PWD_MAX_LEN`
    #[validate(length(min = 1, max = 1024, message = "Must not be empty or longer than 1024."))]
    pub(crate) password: String,
    #[serde(rename = "confirmPassword")]
    #[validate(length(min = 1, message = "Must not be empty."))]
    pub(crate) confirm_password: String,
}

/// Handler for `POST /register`
pub(crate) async fn register(
    ValidatedForm(input): ValidatedForm<RegisterForm>,
    state: Extension<Arc<State>>,
) -> Result<Response, NailError> {
    if input.password != input.confirm_password {
        return Err(NailError::Validation(
            "password and confirmPassword do not match".into(),
        ));
    }

    // check if this email already exists in our database
    let conflict = user::Entity::find()
        .filter(user::Column::Email.eq(input.email.as_str()))
        .one(&state.db)
        .await?;

    if conflict.is_some() {
        return Err(NailError::Conflict);
    }

    let password = HASHER.hash(&input.password).map_err(NailError::Hash)?;

    let created = user::ActiveModel {
        email: Set(input.email),
        username: Set(input.username),
        password: Set(password),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| {
        // lost a race with another registration of the same email
        if is_unique_violation(&e) {
            NailError::Conflict
        } else {
            NailError::Persistence(e)
        }
    })?;

    tracing::info!("Registered user {}", created.id);

    Ok(Envelope::success("registration succeeded", Some(UserSummary::from(created)))
        .respond(StatusCode::CREATED))
}

/// Name Postgres gives the unique index on `users.email`.
const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";

// sea-orm 0.7 only hands back the driver's message. The constraint name is not localized, the
// message text is.
fn is_unique_violation(err: &DbErr) -> bool {
    let message = err.to_string();
    message.contains(EMAIL_UNIQUE_CONSTRAINT)
        || message.contains("duplicate key value violates unique constraint")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_FORM_BYTES;
    use crate::handlers::testing::*;
    use object_store::memory::InMemory;
    use sea_orm::{DatabaseBackend, MockDatabase};

    const FORM: &str = "email=a%40x.com&username=a&password=p1&confirmPassword=p1";

    fn stored_user() -> user::Model {
        user::Model {
            id: 1,
            email: "a@x.com".into(),
            username: "a".into(),
            password: HASHER.hash("p1").unwrap(),
        }
    }

    #[tokio::test]
    async fn register_then_register_again_conflicts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![
                // first attempt: no conflict, then the inserted row
                vec![],
                vec![stored_user()],
                // second attempt: the email is taken
                vec![stored_user()],
            ])
            .into_connection();
        let state = state(db, idle_predictor(), Arc::new(InMemory::new()));

        let (status, body) = send(state.clone(), form_request("/register", FORM)).await;
        assert_eq!(status, 201);
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["id"], 1);
        assert_eq!(body["data"]["email"], "a@x.com");
        assert_eq!(body["data"]["username"], "a");
        assert!(body["data"].get("password").is_none());

        let (status, body) = send(state, form_request("/register", FORM)).await;
        assert_eq!(status, 409);
        assert_eq!(body["status"], "error");
        assert_eq!(body["data"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn register_accepts_multipart_forms() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![], vec![stored_user()]])
            .into_connection();
        let state = state(db, idle_predictor(), Arc::new(InMemory::new()));

        let request = multipart_request(
            "/register",
            &[
                ("email", None, &b"a@x.com"[..]),
                ("username", None, &b"a"[..]),
                ("password", None, &b"p1"[..]),
                ("confirmPassword", None, &b"p1"[..]),
            ],
        );
        let (status, body) = send(state, request).await;

        assert_eq!(status, 201);
        assert_eq!(body["data"]["email"], "a@x.com");
    }

    #[tokio::test]
    async fn register_stores_a_hash_not_the_password() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![], vec![stored_user()]])
            .into_connection();
        let state = state(db, idle_predictor(), Arc::new(InMemory::new()));

        let (status, _) = send(state.clone(), form_request("/register", FORM)).await;
        assert_eq!(status, 201);

        // the email lookup, then the insert
        let log = transaction_log(state);
        assert_eq!(log.len(), 2);
        let insert = format!("{:?}", log[1]);
        assert!(insert.contains(r#"INSERT INTO \"users\""#), "{}", insert);
        assert!(insert.contains("$argon2$"), "{}", insert);
        assert!(insert.contains("pmin=1"), "{}", insert);
        assert!(!insert.contains(r#"String(Some("p1"))"#), "{}", insert);
        assert!(insert.contains(r#"String(Some("a@x.com"))"#), "{}", insert);
    }

    #[tokio::test]
    async fn register_refuses_oversized_forms() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let state = state(db, idle_predictor(), Arc::new(InMemory::new()));

        let form = format!(
            "email=a%40x.com&username={}&password=p1&confirmPassword=p1",
            "a".repeat(MAX_FORM_BYTES as usize)
        );
        let (status, body) = send(state.clone(), form_request("/register", &form)).await;

        assert_eq!(status, 413);
        assert_eq!(body["status"], "error");
        assert!(transaction_log(state).is_empty());
    }

    #[tokio::test]
    async fn register_rejects_empty_or_missing_fields() {
        for form in [
            "email=a%40x.com&username=&password=p1&confirmPassword=p1",
            "email=a%40x.com&password=p1&confirmPassword=p1",
            "",
        ] {
            let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
            let state = state(db, idle_predictor(), Arc::new(InMemory::new()));

            let (status, body) = send(state, form_request("/register", form)).await;
            assert_eq!(status, 400, "{}", form);
            assert_eq!(body["status"], "error");
        }
    }

    #[tokio::test]
    async fn register_rejects_mismatched_passwords() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let state = state(db, idle_predictor(), Arc::new(InMemory::new()));

        let form = "email=a%40x.com&username=a&password=p1&confirmPassword=p2";
        let (status, body) = send(state, form_request("/register", form)).await;

        assert_eq!(status, 400);
        assert_eq!(body["message"], "password and confirmPassword do not match");
    }

    #[test]
    fn unique_violations_are_recognized() {
        let err = DbErr::Exec(
            "error returned from database: duplicate key value violates unique constraint \"users_email_key\""
                .into(),
        );
        assert!(is_unique_violation(&err));
        assert!(!is_unique_violation(&DbErr::Conn("connection refused".into())));

        // a German server still names the constraint
        let err = DbErr::Exec(
            "FEHLER: doppelter Schlüsselwert verletzt Unique-Constraint \"users_email_key\"".into(),
        );
        assert!(is_unique_violation(&err));
    }
}
