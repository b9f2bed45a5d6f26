use axum::http::StatusCode;
use object_permissions::{NewPermission, ObjectPermission, PermissionKind, User, create_access_token};
use serde_json::json;
use uuid::Uuid;

use crate::{TestDatabase, setup_scenario};

fn grant(user: &User, object: Uuid, permission: PermissionKind) -> NewPermission {
    NewPermission {
        user: user.id,
        object,
        permission,
        deny: false,
    }
}

#[tokio::test]
pub async fn owner_grants_permission() -> anyhow::Result<()> {
    let s = setup_scenario().await?;
    let resp = s
        .app
        .create(
            &s.jwt(&s.owner),
            &grant(&s.alice, s.root.id, PermissionKind::ViewAsset),
        )
        .await;
    resp.assert_status(StatusCode::CREATED);
    let perm: ObjectPermission = resp.json();
    assert_eq!(perm.user_id, s.alice.id);
    assert_eq!(perm.object_id, s.root.id);
    assert_eq!(perm.permission, PermissionKind::ViewAsset);
    assert!(!perm.inherited);
    assert!(!perm.deny);

    let stored = TestDatabase::permission(&s.app.state.db_pool, perm.uid).await?;
    assert_eq!(stored.map(|p| p.uid), Some(perm.uid));

    let on_child = TestDatabase::permissions_on(&s.app.state.db_pool, &s.child).await?;
    assert_eq!(on_child.len(), 1);
    assert!(on_child[0].inherited);
    assert_eq!(on_child[0].user_id, s.alice.id);
    Ok(())
}

#[tokio::test]
pub async fn create_without_share_permission_is_denied() -> anyhow::Result<()> {
    let s = setup_scenario().await?;
    let pool = &s.app.state.db_pool;
    // viewing is not sharing
    TestDatabase::grant(pool, &s.root, &s.alice, PermissionKind::ViewAsset).await?;

    for kind in PermissionKind::ALL {
        s.app
            .create(&s.jwt(&s.alice), &grant(&s.bob, s.root.id, kind))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    // nothing for bob was written, on the asset or below it
    for asset in [&s.root, &s.child] {
        let records = TestDatabase::permissions_on(pool, asset).await?;
        assert!(records.iter().all(|p| p.user_id != s.bob.id));
    }
    Ok(())
}

#[tokio::test]
pub async fn share_asset_only_covers_asset_permissions() -> anyhow::Result<()> {
    let s = setup_scenario().await?;
    TestDatabase::grant(&s.app.state.db_pool, &s.root, &s.alice, PermissionKind::ShareAsset)
        .await?;
    let jwt = s.jwt(&s.alice);

    s.app
        .create(&jwt, &grant(&s.bob, s.root.id, PermissionKind::ChangeAsset))
        .await
        .assert_status(StatusCode::CREATED);
    s.app
        .create(&jwt, &grant(&s.bob, s.root.id, PermissionKind::ViewSubmissions))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
pub async fn inherited_share_permission_allows_granting_on_child() -> anyhow::Result<()> {
    let s = setup_scenario().await?;
    TestDatabase::grant(
        &s.app.state.db_pool,
        &s.root,
        &s.alice,
        PermissionKind::ShareSubmissions,
    )
    .await?;

    s.app
        .create(
            &s.jwt(&s.alice),
            &grant(&s.bob, s.child.id, PermissionKind::ValidateSubmissions),
        )
        .await
        .assert_status(StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
pub async fn superuser_can_grant_on_any_asset() -> anyhow::Result<()> {
    let s = setup_scenario().await?;
    let admin = TestDatabase::create_superuser(&s.app.state.db_pool, "admin").await?;
    s.app
        .create(
            &s.jwt(&admin),
            &grant(&s.bob, s.child.id, PermissionKind::ShareAsset),
        )
        .await
        .assert_status(StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
pub async fn deny_record_can_be_created() -> anyhow::Result<()> {
    let s = setup_scenario().await?;
    let resp = s
        .app
        .create(
            &s.jwt(&s.owner),
            &json!({
                "user": s.alice.id,
                "object": s.root.id,
                "permission": "change_asset",
                "deny": true,
            }),
        )
        .await;
    resp.assert_status(StatusCode::CREATED);
    let perm: ObjectPermission = resp.json();
    assert!(perm.deny);
    Ok(())
}

#[tokio::test]
pub async fn duplicate_direct_permission_conflicts() -> anyhow::Result<()> {
    let s = setup_scenario().await?;
    let jwt = s.jwt(&s.owner);
    let payload = grant(&s.alice, s.root.id, PermissionKind::ViewAsset);
    s.app
        .create(&jwt, &payload)
        .await
        .assert_status(StatusCode::CREATED);
    s.app
        .create(&jwt, &payload)
        .await
        .assert_status(StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
pub async fn unknown_object_or_user_is_bad_request() -> anyhow::Result<()> {
    let s = setup_scenario().await?;
    let jwt = s.jwt(&s.owner);
    s.app
        .create(&jwt, &grant(&s.alice, Uuid::new_v4(), PermissionKind::ViewAsset))
        .await
        .assert_status_bad_request();

    let ghost = User::new("ghost");
    s.app
        .create(&jwt, &grant(&ghost, s.root.id, PermissionKind::ViewAsset))
        .await
        .assert_status_bad_request();
    Ok(())
}

#[tokio::test]
pub async fn create_requires_valid_token() -> anyhow::Result<()> {
    let s = setup_scenario().await?;
    let payload = grant(&s.alice, s.root.id, PermissionKind::ViewAsset);

    s.app
        .create_anonymous(&payload)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    s.app
        .create("not-a-jwt", &payload)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let expired = create_access_token(&s.owner, -3600, &s.app.state.settings.secrets.hmac)?;
    s.app
        .create(&expired, &payload)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    // signed correctly, but the subject has no account
    let ghost = User::new("ghost");
    s.app
        .create(&s.jwt(&ghost), &payload)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
pub async fn deny_on_share_asset_revokes_right_to_grant() -> anyhow::Result<()> {
    let s = setup_scenario().await?;
    TestDatabase::grant(&s.app.state.db_pool, &s.root, &s.alice, PermissionKind::ShareAsset)
        .await?;
    s.app
        .create(
            &s.jwt(&s.alice),
            &grant(&s.bob, s.root.id, PermissionKind::ViewAsset),
        )
        .await
        .assert_status(StatusCode::CREATED);

    let deny = NewPermission {
        deny: true,
        ..grant(&s.alice, s.root.id, PermissionKind::ShareAsset)
    };
    s.app
        .create(&s.jwt(&s.owner), &deny)
        .await
        .assert_status(StatusCode::CREATED);

    s.app
        .create(
            &s.jwt(&s.alice),
            &grant(&s.bob, s.root.id, PermissionKind::ChangeAsset),
        )
        .await
        .assert_status(StatusCode::FORBIDDEN);
    // the inherited deny closes the child too
    s.app
        .create(
            &s.jwt(&s.alice),
            &grant(&s.bob, s.child.id, PermissionKind::ChangeAsset),
        )
        .await
        .assert_status(StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
pub async fn malformed_body_is_bad_request() -> anyhow::Result<()> {
    let s = setup_scenario().await?;
    let resp = s
        .app
        .create_raw(&s.jwt(&s.owner), r#"{"user": "alice", "object": "#)
        .await;
    resp.assert_status_bad_request();
    let body: serde_json::Value = resp.json();
    assert!(body["detail"].as_str().is_some_and(|d| !d.is_empty()));

    // well-formed JSON naming an unknown kind is rejected the same way
    let resp = s
        .app
        .create(
            &s.jwt(&s.owner),
            &json!({ "user": s.alice.id, "object": s.root.id, "permission": "delete_asset" }),
        )
        .await;
    resp.assert_status_bad_request();
    assert!(resp.json::<serde_json::Value>()["detail"].is_string());
    Ok(())
}
