use std::{str::FromStr, sync::OnceLock, time::Duration};

use sqlx::{
    Sqlite, SqliteConnection, SqlitePool, Transaction,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::{
    Asset, DatabaseConfig, DatabaseError, ObjectPermission, ObjectPermissionRow, PermissionKind,
    User, copy_permissions_from_parent,
};

static DB_POOL: OnceLock<SqlitePool> = OnceLock::new();

/// Opens a pool and brings the schema up to date.
pub async fn connect_pool(config: &DatabaseConfig) -> Result<SqlitePool, DatabaseError> {
    let options = SqliteConnectOptions::from_str(&config.url)?
        .foreign_keys(true)
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        // an in-memory database lives only as long as its connection
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .inspect_err(|e| error!("failed to open database: {}", e))?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("database ready");
    Ok(pool)
}

pub async fn init_db(config: &DatabaseConfig) -> Result<(), DatabaseError> {
    let pool = connect_pool(config).await?;
    DB_POOL
        .set(pool)
        .map_err(|_| DatabaseError::PoolAlreadyInitialized)
}

pub fn get_db() -> Result<SqlitePool, DatabaseError> {
    DB_POOL
        .get()
        .cloned()
        .ok_or(DatabaseError::PoolNotInitialized)
}

/// Opens a transaction that takes the write lock up front.
///
/// Check-then-act requests read before they write; in a deferred transaction
/// the upgrade to a write lock fails with SQLITE_BUSY when another writer got
/// there first, while an immediate one waits out `busy_timeout` instead.
pub async fn begin_immediate(
    pool: &SqlitePool,
) -> Result<Transaction<'static, Sqlite>, DatabaseError> {
    Ok(pool
        .begin_with("BEGIN IMMEDIATE")
        .await
        .inspect_err(|e| error!("failed to open write transaction: {}", e))?)
}

fn map_unique_violation(e: sqlx::Error, what: &str) -> DatabaseError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => DatabaseError::Duplicate(what.to_string()),
        _ => DatabaseError::Connection(e),
    }
}

//------------------------------------------users---------------------------------------
pub async fn insert_user(con: &mut SqliteConnection, user: &User) -> Result<(), DatabaseError> {
    sqlx::query("INSERT INTO users (id, username, is_superuser, created_at) VALUES (?1, ?2, ?3, ?4)")
        .bind(user.id)
        .bind(&user.username)
        .bind(user.is_superuser)
        .bind(user.created_at)
        .execute(con)
        .await
        .map_err(|e| map_unique_violation(e, "username already taken"))?;
    Ok(())
}

pub async fn fetch_user(con: &mut SqliteConnection, id: Uuid) -> Result<Option<User>, DatabaseError> {
    Ok(
        sqlx::query_as::<_, User>("SELECT id, username, is_superuser, created_at FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(con)
            .await?,
    )
}

//------------------------------------------assets--------------------------------------
/// Inserts the asset and gives it the permissions its ancestors pass down.
pub async fn insert_asset(con: &mut SqliteConnection, asset: &Asset) -> Result<(), DatabaseError> {
    sqlx::query(
        "INSERT INTO assets (id, name, owner_id, parent_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(asset.id)
    .bind(&asset.name)
    .bind(asset.owner_id)
    .bind(asset.parent_id)
    .bind(asset.created_at)
    .execute(&mut *con)
    .await?;
    copy_permissions_from_parent(con, asset).await
}

pub async fn fetch_asset(con: &mut SqliteConnection, id: Uuid) -> Result<Option<Asset>, DatabaseError> {
    Ok(sqlx::query_as::<_, Asset>(
        "SELECT id, name, owner_id, parent_id, created_at FROM assets WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(con)
    .await?)
}

/// Every asset below `id`, at any depth.
pub async fn fetch_descendant_ids(
    con: &mut SqliteConnection,
    id: Uuid,
) -> Result<Vec<Uuid>, DatabaseError> {
    Ok(sqlx::query_scalar::<_, Uuid>(
        "WITH RECURSIVE descendants(id) AS (
            SELECT id FROM assets WHERE parent_id = ?1
            UNION
            SELECT a.id FROM assets a JOIN descendants d ON a.parent_id = d.id
        )
        SELECT id FROM descendants",
    )
    .bind(id)
    .fetch_all(con)
    .await?)
}

//------------------------------------------permission records--------------------------
const PERMISSION_COLUMNS: &str =
    "uid, user_id, object_id, permission, deny, inherited, created_at";

pub async fn insert_permission(
    con: &mut SqliteConnection,
    perm: &ObjectPermission,
) -> Result<(), DatabaseError> {
    debug!(uid = %perm.uid, inherited = perm.inherited, "inserting permission record");
    sqlx::query(&format!(
        "INSERT INTO object_permissions ({PERMISSION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
    ))
    .bind(perm.uid)
    .bind(perm.user_id)
    .bind(perm.object_id)
    .bind(perm.permission.codename())
    .bind(perm.deny)
    .bind(perm.inherited)
    .bind(perm.created_at)
    .execute(con)
    .await
    .map_err(|e| map_unique_violation(e, "this permission is already assigned"))?;
    Ok(())
}

/// Same as [`insert_permission`] but an identical existing record is kept as is.
pub async fn insert_permission_if_missing(
    con: &mut SqliteConnection,
    perm: &ObjectPermission,
) -> Result<(), DatabaseError> {
    sqlx::query(&format!(
        "INSERT OR IGNORE INTO object_permissions ({PERMISSION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
    ))
    .bind(perm.uid)
    .bind(perm.user_id)
    .bind(perm.object_id)
    .bind(perm.permission.codename())
    .bind(perm.deny)
    .bind(perm.inherited)
    .bind(perm.created_at)
    .execute(con)
    .await?;
    Ok(())
}

pub async fn fetch_permission(
    con: &mut SqliteConnection,
    uid: Uuid,
) -> Result<Option<ObjectPermission>, DatabaseError> {
    sqlx::query_as::<_, ObjectPermissionRow>(&format!(
        "SELECT {PERMISSION_COLUMNS} FROM object_permissions WHERE uid = ?1"
    ))
    .bind(uid)
    .fetch_optional(con)
    .await?
    .map(ObjectPermission::try_from)
    .transpose()
}

/// Records `actor` may see, newest first: everything for a superuser, and
/// otherwise records on assets they own, records naming them, and records
/// whose kind they can share on the asset (a deny on the share kind wins).
pub async fn fetch_visible_permissions(
    con: &mut SqliteConnection,
    actor: &User,
) -> Result<Vec<ObjectPermission>, DatabaseError> {
    sqlx::query_as::<_, ObjectPermissionRow>(
        "SELECT p.uid, p.user_id, p.object_id, p.permission, p.deny, p.inherited, p.created_at
         FROM object_permissions p
         JOIN assets a ON a.id = p.object_id
         WHERE ?2
            OR a.owner_id = ?1
            OR p.user_id = ?1
            OR EXISTS (
                SELECT 1 FROM object_permissions s
                WHERE s.user_id = ?1 AND s.object_id = p.object_id AND s.deny = 0
                  AND s.permission = CASE WHEN substr(p.permission, -12) = '_submissions'
                                          THEN ?3 ELSE ?4 END
                  AND NOT EXISTS (
                      SELECT 1 FROM object_permissions d
                      WHERE d.user_id = ?1 AND d.object_id = p.object_id AND d.deny = 1
                        AND d.permission = s.permission
                  )
            )
         ORDER BY p.created_at DESC, p.uid",
    )
    .bind(actor.id)
    .bind(actor.is_superuser)
    .bind(PermissionKind::ShareSubmissions.codename())
    .bind(PermissionKind::ShareAsset.codename())
    .fetch_all(con)
    .await?
    .into_iter()
    .map(ObjectPermission::try_from)
    .collect()
}

pub async fn fetch_object_permissions(
    con: &mut SqliteConnection,
    object_id: Uuid,
) -> Result<Vec<ObjectPermission>, DatabaseError> {
    sqlx::query_as::<_, ObjectPermissionRow>(&format!(
        "SELECT {PERMISSION_COLUMNS} FROM object_permissions WHERE object_id = ?1 ORDER BY created_at"
    ))
    .bind(object_id)
    .fetch_all(con)
    .await?
    .into_iter()
    .map(ObjectPermission::try_from)
    .collect()
}
