//! Service catalog behaviour over the in-memory store

use appoint_scheduling::{models::ServiceInput, AppError, Services};

#[tokio::test]
async fn test_create_and_get_service() {
    let (services, _) = Services::in_memory();

    let created = services
        .catalog
        .create(&ServiceInput::new("Haircut").with_price(25.0, true))
        .await
        .expect("Failed to create service");

    assert!(created.id > 0);
    assert_eq!(created.name, "Haircut");
    assert_eq!(created.price, Some(25.0));
    assert!(created.public_price);
    assert!(created.deleted_at.is_none());

    let fetched = services.catalog.get_by_id(created.id).await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_name_length_bounds() {
    let (services, _) = Services::in_memory();

    for len in [0usize, 101] {
        let err = services
            .catalog
            .create(&ServiceInput::new("n".repeat(len)))
            .await
            .unwrap_err();
        assert!(err.is_validation(), "name of length {} should be rejected", len);
    }
    for len in [1usize, 50, 100] {
        assert!(services.catalog.create(&ServiceInput::new("n".repeat(len))).await.is_ok());
    }
}

#[tokio::test]
async fn test_description_too_long_on_update() {
    let (services, _) = Services::in_memory();
    let created = services.catalog.create(&ServiceInput::new("Massage")).await.unwrap();

    let mut data = ServiceInput::new("Massage");
    data.description = "x".repeat(301);
    let err = services.catalog.update(created.id, &data).await.unwrap_err();
    assert!(err.is_validation());

    data.description = "x".repeat(300);
    let updated = services.catalog.update(created.id, &data).await.unwrap();
    assert_eq!(updated.description.len(), 300);
}

#[tokio::test]
async fn test_negative_price_rejected() {
    let (services, _) = Services::in_memory();
    let err = services
        .catalog
        .create(&ServiceInput::new("Massage").with_price(-5.0, false))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = services
        .catalog
        .create(&ServiceInput::new("Massage").with_price(f64::NAN, true))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("finite"));
}

#[tokio::test]
async fn test_parent_must_exist_and_be_active() {
    let (services, _) = Services::in_memory();

    let err = services
        .catalog
        .create(&ServiceInput::new("Orphan").with_parent(99))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let parent = services.catalog.create(&ServiceInput::new("Hair")).await.unwrap();
    services.catalog.delete(parent.id).await.unwrap();

    let err = services
        .catalog
        .create(&ServiceInput::new("Child").with_parent(parent.id))
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_delete_blocked_by_active_children() {
    let (services, _) = Services::in_memory();

    let parent = services.catalog.create(&ServiceInput::new("Hair")).await.unwrap();
    let child = services
        .catalog
        .create(&ServiceInput::new("Haircut").with_parent(parent.id))
        .await
        .unwrap();

    let err = services.catalog.delete(parent.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let children = services.catalog.list_children(parent.id).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].id, child.id);

    // once the child is gone the parent can be deleted
    services.catalog.delete(child.id).await.unwrap();
    services.catalog.delete(parent.id).await.unwrap();

    assert!(services.catalog.get_by_id(parent.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_delete_errors() {
    let (services, _) = Services::in_memory();
    assert!(services.catalog.delete(0).await.unwrap_err().is_validation());
    assert!(services.catalog.delete(12).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_update_reparenting_rejects_cycles() {
    let (services, _) = Services::in_memory();

    let root = services.catalog.create(&ServiceInput::new("Root")).await.unwrap();
    let mid = services
        .catalog
        .create(&ServiceInput::new("Mid").with_parent(root.id))
        .await
        .unwrap();
    let leaf = services
        .catalog
        .create(&ServiceInput::new("Leaf").with_parent(mid.id))
        .await
        .unwrap();

    let err = services
        .catalog
        .update(root.id, &ServiceInput::new("Root").with_parent(leaf.id))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    // moving the leaf directly under the root is fine
    let moved = services
        .catalog
        .update(leaf.id, &ServiceInput::new("Leaf").with_parent(root.id))
        .await
        .unwrap();
    assert_eq!(moved.parent_id, Some(root.id));
}

#[tokio::test]
async fn test_update_missing_service_is_not_found() {
    let (services, _) = Services::in_memory();
    let err = services
        .catalog
        .update(77, &ServiceInput::new("Ghost"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
