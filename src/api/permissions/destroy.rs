use axum::{Extension, debug_handler, extract::State, http::StatusCode};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{ApiError, ApiPath, AppState, Claims, begin_immediate, remove_perm, user_can_share};

use super::retrieve::load_visible;

/// Revokes a directly assigned permission, along with the inherited copies it
/// was backing.
#[debug_handler(state = AppState)]
#[instrument(skip_all, fields(
    user_id = %claims.sub,
    uid = %uid,
))]
pub async fn destroy_permission(
    Extension(claims): Extension<Claims>,
    State(appstate): State<AppState>,
    ApiPath(uid): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut tx = begin_immediate(&appstate.db_pool).await?;
    let (actor, asset, perm) = load_visible(&mut tx, claims.sub, uid).await?;

    // inherited records are refused even for actors allowed to share
    if perm.inherited {
        warn!("attempt to delete an inherited permission");
        return Err(ApiError::MethodNotAllowed(
            "Cannot delete inherited permissions.".into(),
        ));
    }
    if !user_can_share(&mut tx, &asset, &actor, perm.permission).await? {
        warn!(
            share_kind = %perm.permission.share_kind(),
            "actor lacks share permission"
        );
        return Err(ApiError::PermissionDenied);
    }

    remove_perm(&mut tx, &asset, perm.user_id, perm.permission, perm.deny).await?;
    tx.commit().await?;

    info!(permission = %perm.permission, "permission deleted");
    Ok(StatusCode::NO_CONTENT)
}
