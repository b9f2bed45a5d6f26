use axum::{Extension, Json, debug_handler, extract::State};
use sqlx::SqliteConnection;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::{
    ApiError, ApiPath, AppState, Asset, Claims, ObjectPermission, User, fetch_asset,
    fetch_permission, fetch_user, fetch_visible_permissions, is_visible,
};

async fn load_actor(con: &mut SqliteConnection, id: Uuid) -> Result<User, ApiError> {
    fetch_user(con, id).await?.ok_or(ApiError::Unauthorized)
}

/// Resolves `uid` to a record the actor may see; anything else is a 404.
pub(super) async fn load_visible(
    con: &mut SqliteConnection,
    actor_id: Uuid,
    uid: Uuid,
) -> Result<(User, Asset, ObjectPermission), ApiError> {
    let actor = load_actor(&mut *con, actor_id).await?;
    let perm = fetch_permission(&mut *con, uid)
        .await?
        .ok_or(ApiError::NotFound)?;
    let asset = fetch_asset(&mut *con, perm.object_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    if !is_visible(&mut *con, &actor, &asset, &perm).await? {
        debug!("permission {} hidden from actor", uid);
        return Err(ApiError::NotFound);
    }
    Ok((actor, asset, perm))
}

#[debug_handler(state = AppState)]
#[instrument(skip_all, fields(
    user_id = %claims.sub,
))]
pub async fn list_permissions(
    Extension(claims): Extension<Claims>,
    State(appstate): State<AppState>,
) -> Result<Json<Vec<ObjectPermission>>, ApiError> {
    let mut con = appstate.db_pool.acquire().await?;
    let actor = load_actor(&mut con, claims.sub).await?;
    let visible = fetch_visible_permissions(&mut con, &actor).await?;
    info!("listing {} permissions", visible.len());
    Ok(Json(visible))
}

#[debug_handler(state = AppState)]
#[instrument(skip_all, fields(
    user_id = %claims.sub,
    uid = %uid,
))]
pub async fn retrieve_permission(
    Extension(claims): Extension<Claims>,
    State(appstate): State<AppState>,
    ApiPath(uid): ApiPath<Uuid>,
) -> Result<Json<ObjectPermission>, ApiError> {
    let mut con = appstate.db_pool.acquire().await?;
    let (_, _, perm) = load_visible(&mut con, claims.sub, uid)
        .await
        .inspect_err(|e| error!("{}", e))?;
    Ok(Json(perm))
}
