use serde::{Deserialize, Serialize};

/// The public face of a user. The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct UserSummary {
    pub(crate) id: i32,
    pub(crate) username: String,
    pub(crate) email: String,
}

impl From<entity::user::Model> for UserSummary {
    fn from(user: entity::user::Model) -> Self {
        UserSummary {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}
