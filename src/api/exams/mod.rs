mod handlers;

use axum::{routing::get, routing::post, Router};

use crate::core::state::AppState;

pub(crate) const MANAGE_PERMISSION: &str = "exams:manage";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_exam).get(handlers::list_exams))
        .route(
            "/:exam_id",
            get(handlers::get_exam).patch(handlers::update_exam).delete(handlers::delete_exam),
        )
        .route("/:exam_id/start", post(handlers::start_exam))
        .route("/:exam_id/records", get(handlers::list_exam_records))
}

#[cfg(test)]
mod tests;
