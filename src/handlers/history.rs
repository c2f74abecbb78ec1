use axum::{
    extract::{rejection::PathRejection, Extension, Path},
    http::StatusCode,
    response::Response,
};
use entity::prediction;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use std::sync::Arc;

use crate::error::NailError;
use crate::models::Envelope;
use crate::server::State;

/// Handler for `GET /history/:user_id`
///
/// Rows come back in whatever order the database keeps them.
pub(crate) async fn history(
    path: Result<Path<i32>, PathRejection>,
    state: Extension<Arc<State>>,
) -> Result<Response, NailError> {
    let Path(user_id) = path?;

    let rows = prediction::Entity::find()
        .filter(prediction::Column::UserId.eq(user_id))
        .all(&state.db)
        .await?;

    if rows.is_empty() {
        return Err(NailError::NotFound);
    }

    Ok(Envelope::success("prediction history retrieved", Some(rows)).respond(StatusCode::OK))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::*;
    use axum::{body::Body, http::Request};
    use object_store::memory::InMemory;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn row(id: i32, confidence: f64) -> prediction::Model {
        prediction::Model {
            id,
            confidence,
            description: "Your nails are in good shape!".into(),
            url: format!("{}/{}/{}.jpg", PUBLIC_URL_BASE, BUCKET, id),
            user_id: 7,
        }
    }

    #[tokio::test]
    async fn history_lists_every_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![row(1, 0.5), row(2, 0.25)]])
            .into_connection();
        let state = state(db, idle_predictor(), Arc::new(InMemory::new()));

        let (status, body) = send(state, get("/history/7")).await;

        assert_eq!(status, 200);
        assert_eq!(body["status"], "success");
        assert_eq!(
            body["data"],
            json!([
                {
                    "id": 1,
                    "confidence": 0.5,
                    "description": "Your nails are in good shape!",
                    "url": "https://storage.googleapis.com/nail-bucket/1.jpg",
                    "user_id": 7
                },
                {
                    "id": 2,
                    "confidence": 0.25,
                    "description": "Your nails are in good shape!",
                    "url": "https://storage.googleapis.com/nail-bucket/2.jpg",
                    "user_id": 7
                }
            ])
        );
    }

    #[tokio::test]
    async fn empty_history_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<prediction::Model>::new()])
            .into_connection();
        let state = state(db, idle_predictor(), Arc::new(InMemory::new()));

        let (status, body) = send(state, get("/history/7")).await;

        assert_eq!(status, 404);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn history_needs_numeric_user_id() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let state = state(db, idle_predictor(), Arc::new(InMemory::new()));

        let (status, _) = send(state, get("/history/seven")).await;

        assert_eq!(status, 400);
    }
}
