mod handlers;

use axum::{routing::get, Router};

use crate::core::state::AppState;

pub(crate) const CREATE_PERMISSION: &str = "materials:create";
pub(crate) const UPDATE_PERMISSION: &str = "materials:update";
pub(crate) const DELETE_PERMISSION: &str = "materials:delete";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_materials).post(handlers::create_material))
        .route(
            "/:material_id",
            get(handlers::get_material)
                .patch(handlers::update_material)
                .delete(handlers::delete_material),
        )
}

#[cfg(test)]
mod tests;
