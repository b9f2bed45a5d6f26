//! Object-level permission engine.
//!
//! A direct record is materialised as inherited copies on every descendant
//! asset, so lookups only ever need to look at the asset itself.
use anyhow::anyhow;
use sqlx::SqliteConnection;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::{
    Asset, DatabaseError, ObjectPermission, PermissionKind, User, fetch_descendant_ids,
    fetch_object_permissions, insert_permission, insert_permission_if_missing,
};

async fn has_record(
    con: &mut SqliteConnection,
    user_id: Uuid,
    object_id: Uuid,
    kind: PermissionKind,
    deny: bool,
) -> Result<bool, DatabaseError> {
    Ok(sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (
            SELECT 1 FROM object_permissions
            WHERE user_id = ?1 AND object_id = ?2 AND permission = ?3 AND deny = ?4
        )",
    )
    .bind(user_id)
    .bind(object_id)
    .bind(kind.codename())
    .bind(deny)
    .fetch_one(con)
    .await?)
}

/// Whether a direct record on a strict ancestor of `object_id` still passes
/// `(user, kind, deny)` down to it.
async fn is_backed_by_ancestor(
    con: &mut SqliteConnection,
    user_id: Uuid,
    object_id: Uuid,
    kind: PermissionKind,
    deny: bool,
) -> Result<bool, DatabaseError> {
    Ok(sqlx::query_scalar::<_, bool>(
        "WITH RECURSIVE ancestors(id) AS (
            SELECT parent_id FROM assets WHERE id = ?2 AND parent_id IS NOT NULL
            UNION
            SELECT a.parent_id FROM assets a JOIN ancestors an ON a.id = an.id
            WHERE a.parent_id IS NOT NULL
        )
        SELECT EXISTS (
            SELECT 1 FROM object_permissions
            WHERE object_id IN (SELECT id FROM ancestors)
              AND user_id = ?1 AND permission = ?3 AND deny = ?4 AND inherited = 0
        )",
    )
    .bind(user_id)
    .bind(object_id)
    .bind(kind.codename())
    .bind(deny)
    .fetch_one(con)
    .await?)
}

/// Superusers and owners hold everything; otherwise a grant is needed and a deny wins.
pub async fn user_has_perm(
    con: &mut SqliteConnection,
    asset: &Asset,
    user: &User,
    kind: PermissionKind,
) -> Result<bool, DatabaseError> {
    if user.is_superuser || asset.owner_id == user.id {
        return Ok(true);
    }
    if has_record(&mut *con, user.id, asset.id, kind, true).await? {
        debug!(user_id = %user.id, asset_id = %asset.id, %kind, "denied by explicit deny record");
        return Ok(false);
    }
    has_record(con, user.id, asset.id, kind, false).await
}

/// The gate in front of every grant and revoke: the user must hold the
/// share permission that governs `kind` on the asset.
pub async fn user_can_share(
    con: &mut SqliteConnection,
    asset: &Asset,
    user: &User,
    kind: PermissionKind,
) -> Result<bool, DatabaseError> {
    user_has_perm(con, asset, user, kind.share_kind()).await
}

/// Stores a direct record and its inherited copies on every descendant.
#[instrument(skip_all, fields(asset_id = %asset.id, user_id = %user_id, kind = %kind, deny = deny))]
pub async fn assign_perm(
    con: &mut SqliteConnection,
    asset: &Asset,
    user_id: Uuid,
    kind: PermissionKind,
    deny: bool,
) -> Result<ObjectPermission, DatabaseError> {
    let direct = ObjectPermission::new(user_id, asset.id, kind, deny);
    insert_permission(&mut *con, &direct).await?;

    let descendants = fetch_descendant_ids(&mut *con, asset.id).await?;
    for child in &descendants {
        insert_permission_if_missing(&mut *con, &direct.inherited_on(*child)).await?;
    }
    info!(descendants = descendants.len(), "permission assigned");
    Ok(direct)
}

/// Drops the direct `(user, kind, deny)` record on the asset, then any
/// inherited copy of it below that no other ancestor still backs. A grant and
/// a deny for the same kind are separate records; removing one keeps the other.
#[instrument(skip_all, fields(asset_id = %asset.id, user_id = %user_id, kind = %kind, deny = deny))]
pub async fn remove_perm(
    con: &mut SqliteConnection,
    asset: &Asset,
    user_id: Uuid,
    kind: PermissionKind,
    deny: bool,
) -> Result<(), DatabaseError> {
    let removed = sqlx::query(
        "DELETE FROM object_permissions
         WHERE user_id = ?1 AND object_id = ?2 AND permission = ?3 AND deny = ?4
           AND inherited = 0",
    )
    .bind(user_id)
    .bind(asset.id)
    .bind(kind.codename())
    .bind(deny)
    .execute(&mut *con)
    .await?
    .rows_affected();
    if removed == 0 {
        return Err(DatabaseError::NotFound(anyhow!(
            "no direct '{kind}' permission for user {user_id} on asset {}",
            asset.id
        )));
    }

    let mut pruned = 0u64;
    for child in fetch_descendant_ids(&mut *con, asset.id).await? {
        if is_backed_by_ancestor(&mut *con, user_id, child, kind, deny).await? {
            continue;
        }
        pruned += sqlx::query(
            "DELETE FROM object_permissions
             WHERE user_id = ?1 AND object_id = ?2 AND permission = ?3
               AND deny = ?4 AND inherited = 1",
        )
        .bind(user_id)
        .bind(child)
        .bind(kind.codename())
        .bind(deny)
        .execute(&mut *con)
        .await?
        .rows_affected();
    }
    info!(removed, pruned, "permission removed");
    Ok(())
}

/// Gives a freshly inserted asset every record its parent holds, marked inherited.
pub async fn copy_permissions_from_parent(
    con: &mut SqliteConnection,
    asset: &Asset,
) -> Result<(), DatabaseError> {
    let Some(parent_id) = asset.parent_id else {
        return Ok(());
    };
    let inherited = fetch_object_permissions(&mut *con, parent_id).await?;
    debug!(asset_id = %asset.id, count = inherited.len(), "copying parent permissions");
    for perm in &inherited {
        insert_permission_if_missing(&mut *con, &perm.inherited_on(asset.id)).await?;
    }
    Ok(())
}

/// Who may see a permission record: superusers, the asset owner, the
/// record's subject, and anyone able to share its kind on the asset.
pub async fn is_visible(
    con: &mut SqliteConnection,
    actor: &User,
    asset: &Asset,
    perm: &ObjectPermission,
) -> Result<bool, DatabaseError> {
    if actor.is_superuser || asset.owner_id == actor.id || perm.user_id == actor.id {
        return Ok(true);
    }
    user_can_share(con, asset, actor, perm.permission).await
}
