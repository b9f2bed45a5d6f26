mod create;
mod destroy;
mod retrieve;
pub use create::*;
pub use destroy::*;
pub use retrieve::*;

use axum::{Router, middleware::from_fn_with_state, routing::get};

use crate::{AppState, auth_middleware};

//------------------------------------object permissions ----------------------------
// no update route: PUT/PATCH on a record answer 405
pub fn object_permissions(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/permissions",
            get(list_permissions).post(create_permission),
        )
        .route(
            "/api/permissions/{uid}",
            get(retrieve_permission).delete(destroy_permission),
        )
        .route_layer(from_fn_with_state(state, auth_middleware))
}
