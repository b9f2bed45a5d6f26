use std::{fmt::Display, str::FromStr};

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::DatabaseError;

#[derive(Debug, Clone, Deserialize, Serialize, FromRow, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub is_superuser: bool,
    pub created_at: NaiveDateTime,
}
impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            is_superuser: false,
            created_at: Utc::now().naive_utc(),
        }
    }

    pub fn superuser(mut self) -> Self {
        self.is_superuser = true;
        self
    }
}

/// Any shareable object. Assets nest through `parent_id`.
#[derive(Debug, Clone, Deserialize, Serialize, FromRow, PartialEq, Eq)]
pub struct Asset {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub created_at: NaiveDateTime,
}
impl Asset {
    pub fn new(owner_id: Uuid, parent_id: Option<Uuid>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            owner_id,
            parent_id,
            created_at: Utc::now().naive_utc(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionKind {
    ViewAsset,
    ChangeAsset,
    ShareAsset,
    AddSubmissions,
    ViewSubmissions,
    ChangeSubmissions,
    ValidateSubmissions,
    ShareSubmissions,
}

impl PermissionKind {
    pub const ALL: [PermissionKind; 8] = [
        Self::ViewAsset,
        Self::ChangeAsset,
        Self::ShareAsset,
        Self::AddSubmissions,
        Self::ViewSubmissions,
        Self::ChangeSubmissions,
        Self::ValidateSubmissions,
        Self::ShareSubmissions,
    ];

    pub fn codename(&self) -> &'static str {
        match self {
            Self::ViewAsset => "view_asset",
            Self::ChangeAsset => "change_asset",
            Self::ShareAsset => "share_asset",
            Self::AddSubmissions => "add_submissions",
            Self::ViewSubmissions => "view_submissions",
            Self::ChangeSubmissions => "change_submissions",
            Self::ValidateSubmissions => "validate_submissions",
            Self::ShareSubmissions => "share_submissions",
        }
    }

    /// The permission required to grant or revoke `self`.
    pub fn share_kind(&self) -> PermissionKind {
        if self.codename().ends_with("_submissions") {
            Self::ShareSubmissions
        } else {
            Self::ShareAsset
        }
    }
}

impl Display for PermissionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.codename())
    }
}

impl FromStr for PermissionKind {
    type Err = DatabaseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.codename() == s)
            .ok_or_else(|| DatabaseError::InvalidRecord(format!("unknown permission '{s}'")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectPermission {
    pub uid: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    #[serde(rename = "object")]
    pub object_id: Uuid,
    pub permission: PermissionKind,
    pub deny: bool,
    pub inherited: bool,
    pub created_at: NaiveDateTime,
}
impl ObjectPermission {
    pub fn new(user_id: Uuid, object_id: Uuid, permission: PermissionKind, deny: bool) -> Self {
        Self {
            uid: Uuid::new_v4(),
            user_id,
            object_id,
            permission,
            deny,
            inherited: false,
            created_at: Utc::now().naive_utc(),
        }
    }

    /// Copy of a direct record materialised on a descendant asset.
    pub fn inherited_on(&self, object_id: Uuid) -> Self {
        Self {
            uid: Uuid::new_v4(),
            object_id,
            inherited: true,
            created_at: Utc::now().naive_utc(),
            ..self.clone()
        }
    }
}

/// Row shape of `object_permissions`; `permission` is stored as its codename.
#[derive(Debug, FromRow)]
pub struct ObjectPermissionRow {
    pub uid: Uuid,
    pub user_id: Uuid,
    pub object_id: Uuid,
    pub permission: String,
    pub deny: bool,
    pub inherited: bool,
    pub created_at: NaiveDateTime,
}

impl TryFrom<ObjectPermissionRow> for ObjectPermission {
    type Error = DatabaseError;
    fn try_from(row: ObjectPermissionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            uid: row.uid,
            user_id: row.user_id,
            object_id: row.object_id,
            permission: row.permission.parse()?,
            deny: row.deny,
            inherited: row.inherited,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPermission {
    pub user: Uuid,
    pub object: Uuid,
    pub permission: PermissionKind,
    #[serde(default)]
    pub deny: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid, // user ID
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}
impl Claims {
    /// default exp = 900 seconds = 15 minutes
    pub fn new(sub: Uuid, username: String) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub,
            username,
            iat: now,
            exp: now + 900,
        }
    }
    pub fn with_expiry(mut self, seconds: i64) -> Self {
        self.exp = self.iat + seconds;
        self
    }
}
