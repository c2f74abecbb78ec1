//! SeaORM entities for the `users` and `predictions` tables.

pub mod prelude;

pub mod prediction;
pub mod user;
