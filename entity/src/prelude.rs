pub use super::prediction::Entity as Prediction;
pub use super::user::Entity as User;
