use anyhow::anyhow;
use axum::{Extension, Json, debug_handler, extract::State, http::StatusCode};
use tracing::{error, info, instrument, warn};

use crate::{
    ApiError, ApiJson, AppState, Claims, NewPermission, ObjectPermission, assign_perm,
    begin_immediate, fetch_asset, fetch_user, user_can_share,
};

/// Grants (or denies) `permission` on `object` to `user`.
///
/// The share check and the insert share one transaction; any early return
/// drops it and rolls back.
#[debug_handler(state = AppState)]
#[instrument(skip_all, fields(
    user_id = %claims.sub,
    object_id = %payload.object,
    permission = %payload.permission,
))]
pub async fn create_permission(
    Extension(claims): Extension<Claims>,
    State(appstate): State<AppState>,
    ApiJson(payload): ApiJson<NewPermission>,
) -> Result<(StatusCode, Json<ObjectPermission>), ApiError> {
    info!("creating permission for user {}", payload.user);
    let mut tx = begin_immediate(&appstate.db_pool).await?;

    let actor = fetch_user(&mut tx, claims.sub)
        .await?
        .ok_or(ApiError::Unauthorized)
        .inspect_err(|_| warn!("token subject no longer exists"))?;
    let asset = fetch_asset(&mut tx, payload.object)
        .await?
        .ok_or_else(|| ApiError::BadRequest(anyhow!("object {} does not exist", payload.object)))?;
    fetch_user(&mut tx, payload.user)
        .await?
        .ok_or_else(|| ApiError::BadRequest(anyhow!("user {} does not exist", payload.user)))?;

    if !user_can_share(&mut tx, &asset, &actor, payload.permission).await? {
        warn!(
            share_kind = %payload.permission.share_kind(),
            "actor lacks share permission"
        );
        return Err(ApiError::PermissionDenied);
    }

    let perm = assign_perm(
        &mut tx,
        &asset,
        payload.user,
        payload.permission,
        payload.deny,
    )
    .await
    .inspect_err(|e| error!("{}", e))?;
    tx.commit().await?;

    info!(uid = %perm.uid, "permission created");
    Ok((StatusCode::CREATED, Json(perm)))
}
