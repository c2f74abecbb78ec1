use axum::{extract::Extension, http::StatusCode, response::Response};
use entity::user;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::NailError,
    handlers::ValidatedForm,
    models::{Envelope, UserSummary},
    server::State,
    utils::pass,
};

// NOTE: no session is created here, callers keep track of the user id themselves

/// The form input of a `POST /login` request.
#[derive(Debug, Default, Validate, Deserialize)]
#[serde(default)]
pub(crate) struct LoginForm {
    #[validate(length(min = 1, message = "Must not be empty."))]
    email: String,
    #[validate(length(min = 1, message = "Must not be empty."))]
    password: String,
}

/// Handler for `POST /login`
pub(crate) async fn login(
    ValidatedForm(input): ValidatedForm<LoginForm>,
    state: Extension<Arc<State>>,
) -> Result<Response, NailError> {
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(input.email.as_str()))
        .one(&state.db)
        .await?
        .ok_or(NailError::Unauthorized)?;

    if !pass::verify(&user.password, &input.password) {
        return Err(NailError::Unauthorized);
    }

    Ok(Envelope::success("login succeeded", Some(UserSummary::from(user))).respond(StatusCode::OK))
}

/// Handler for `POST /logout`
pub(crate) async fn logout() -> Response {
    Envelope::<()>::success("logout succeeded", None).respond(StatusCode::OK)
}
