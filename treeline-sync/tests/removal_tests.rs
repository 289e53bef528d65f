use pretty_assertions::assert_eq;
use treeline_client::{ContentService, MemoryService};
use treeline_sync::{
    DEFAULT_DELETED_FOLDER_NAME, RemovalOptions, StepStatus, archive_prepared_item, build_tree,
    prepare_item_for_removal, remove_item, remove_subtree,
};
use treeline_types::{
    Body, ContentItem, ContentStatus, Hierarchy, ItemId, PublishingStatus, RepositoryId,
};

fn repo() -> RepositoryId {
    RepositoryId::new("target-repo")
}

fn make_item(id: &str, label: &str) -> ContentItem {
    ContentItem::new(ItemId::new(id), label, Body::default())
}

fn keyed(mut item: ContentItem, key: &str) -> ContentItem {
    item.body.meta.delivery_key = Some(key.to_string());
    item
}

fn published(mut item: ContentItem) -> ContentItem {
    item.publishing_status = PublishingStatus::Latest;
    item
}

fn archived(mut item: ContentItem) -> ContentItem {
    item.status = ContentStatus::Archived;
    item
}

fn rooted(mut item: ContentItem) -> ContentItem {
    item.body.meta.hierarchy = Some(Hierarchy::root());
    item
}

fn child_of(mut item: ContentItem, parent: &str) -> ContentItem {
    item.body.meta.hierarchy = Some(Hierarchy::child_of(ItemId::new(parent)));
    item
}

async fn seed(service: &MemoryService, item: ContentItem) -> ItemId {
    let id = item.id.clone();
    service.put_item(&repo(), item).await;
    id
}

// ── Preparation ──────────────────────────────────────────────────

#[tokio::test]
async fn preparation_parks_the_item_in_quarantine() {
    let service = MemoryService::new();
    let id = seed(&service, child_of(make_item("item-1", "Child"), "parent-1")).await;

    let prep = prepare_item_for_removal(&service, &repo(), &id, &RemovalOptions::default()).await;

    assert!(prep.success);
    assert_eq!(prep.ensure_deleted_folder, StepStatus::Succeeded);
    assert_eq!(prep.fetch_latest, StepStatus::Succeeded);
    assert_eq!(prep.unarchive, StepStatus::Skipped);
    assert_eq!(prep.move_to_deleted, StepStatus::Succeeded);
    assert_eq!(prep.label.as_deref(), Some("Child"));
    assert_eq!(prep.first_failure(), None);

    let updated = prep.updated_item.unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(updated.hierarchy(), None);
    assert_eq!(updated.folder_id, prep.deleted_folder_id);

    // The quarantine folder is the conventional one.
    let folder = service
        .get_or_create_folder(&repo(), DEFAULT_DELETED_FOLDER_NAME, None)
        .await
        .unwrap();
    assert_eq!(prep.deleted_folder_id, Some(folder));
}

#[tokio::test]
async fn preparation_uses_a_preresolved_folder() {
    let service = MemoryService::new();
    let id = seed(&service, make_item("item-1", "Child")).await;
    let folder = service.get_or_create_folder(&repo(), "graveyard", None).await.unwrap();

    let options = RemovalOptions {
        deleted_folder_id: Some(folder.clone()),
        ..RemovalOptions::default()
    };
    let prep = prepare_item_for_removal(&service, &repo(), &id, &options).await;

    assert!(prep.success);
    assert_eq!(prep.ensure_deleted_folder, StepStatus::Skipped);
    assert_eq!(prep.deleted_folder_id, Some(folder.clone()));
    assert_eq!(prep.updated_item.unwrap().folder_id, Some(folder));
}

#[tokio::test]
async fn preparation_unarchives_archived_items() {
    let service = MemoryService::new();
    let id = seed(&service, archived(make_item("item-1", "Old"))).await;

    let prep = prepare_item_for_removal(&service, &repo(), &id, &RemovalOptions::default()).await;

    assert!(prep.success);
    assert_eq!(prep.unarchive, StepStatus::Succeeded);
    assert_eq!(prep.updated_item.unwrap().status, ContentStatus::Active);
}

#[tokio::test]
async fn preparation_fails_on_archived_items_when_unarchiving_is_off() {
    let service = MemoryService::new();
    let id = seed(&service, archived(make_item("item-1", "Old"))).await;

    let options = RemovalOptions {
        unarchive_if_needed: false,
        ..RemovalOptions::default()
    };
    let prep = prepare_item_for_removal(&service, &repo(), &id, &options).await;

    assert!(!prep.success);
    assert_eq!(prep.unarchive, StepStatus::Skipped);
    assert!(prep.move_to_deleted.is_failure());
    assert_eq!(prep.first_failure().unwrap().0, "move_to_deleted");
    assert!(prep.updated_item.is_none());
}

#[tokio::test]
async fn preparation_fails_when_the_item_is_gone() {
    let service = MemoryService::new();

    let prep = prepare_item_for_removal(
        &service,
        &repo(),
        &ItemId::new("missing"),
        &RemovalOptions::default(),
    )
    .await;

    assert!(!prep.success);
    assert_eq!(prep.ensure_deleted_folder, StepStatus::Succeeded);
    assert_eq!(prep.fetch_latest, StepStatus::Failed("item not found".to_string()));
    assert_eq!(prep.move_to_deleted, StepStatus::Skipped);
    assert_eq!(prep.first_failure(), Some(("fetch_latest", "item not found")));
}

// ── Archival ─────────────────────────────────────────────────────

#[tokio::test]
async fn archival_clears_key_unpublishes_and_archives() {
    let service = MemoryService::new();
    let id = seed(&service, published(keyed(make_item("item-1", "Page"), "en-GB-page"))).await;

    let options = RemovalOptions::default();
    let prep = prepare_item_for_removal(&service, &repo(), &id, &options).await;
    assert!(prep.success);

    let cleanup = archive_prepared_item(&service, &prep, &options).await.unwrap();
    assert!(cleanup.overall_success);
    assert_eq!(cleanup.label, "Page");
    assert_eq!(cleanup.unarchive, StepStatus::Skipped);
    assert_eq!(cleanup.move_to_deleted, StepStatus::Succeeded);
    assert_eq!(cleanup.clear_key, StepStatus::Succeeded);
    assert_eq!(cleanup.unpublish, StepStatus::Succeeded);
    assert_eq!(cleanup.archive, StepStatus::Succeeded);

    let final_state = service.get_item(&id).await.unwrap().unwrap();
    assert_eq!(final_state.status, ContentStatus::Archived);
    assert_eq!(final_state.publishing_status, PublishingStatus::None);
    assert_eq!(final_state.delivery_key(), None);
}

#[tokio::test]
async fn archival_skips_steps_that_do_not_apply() {
    // No key, never published: only the archive step runs.
    let service = MemoryService::new();
    let id = seed(&service, make_item("item-1", "Plain")).await;

    let options = RemovalOptions::default();
    let prep = prepare_item_for_removal(&service, &repo(), &id, &options).await;
    let cleanup = archive_prepared_item(&service, &prep, &options).await.unwrap();

    assert!(cleanup.overall_success);
    assert_eq!(cleanup.clear_key, StepStatus::Skipped);
    assert_eq!(cleanup.unpublish, StepStatus::Skipped);
    assert_eq!(cleanup.archive, StepStatus::Succeeded);
}

#[tokio::test]
async fn archival_can_retain_the_delivery_key() {
    let service = MemoryService::new();
    let id = seed(&service, keyed(make_item("item-1", "Page"), "en-GB-page")).await;

    let options = RemovalOptions {
        clear_delivery_key: false,
        ..RemovalOptions::default()
    };
    let prep = prepare_item_for_removal(&service, &repo(), &id, &options).await;
    let cleanup = archive_prepared_item(&service, &prep, &options).await.unwrap();

    assert!(cleanup.overall_success);
    assert_eq!(cleanup.clear_key, StepStatus::Skipped);

    let final_state = service.get_item(&id).await.unwrap().unwrap();
    assert_eq!(final_state.status, ContentStatus::Archived);
    assert_eq!(final_state.delivery_key(), Some("en-GB-page"));
}

#[tokio::test]
async fn archival_refuses_an_incomplete_preparation() {
    let service = MemoryService::new();
    let options = RemovalOptions::default();

    let prep =
        prepare_item_for_removal(&service, &repo(), &ItemId::new("missing"), &options).await;
    assert!(!prep.success);

    assert!(archive_prepared_item(&service, &prep, &options).await.is_none());
}

#[tokio::test]
async fn stale_version_stops_archival_at_key_clearing() {
    let service = MemoryService::new();
    let id = seed(&service, keyed(make_item("item-1", "Page"), "en-GB-page")).await;

    let options = RemovalOptions::default();
    let prep = prepare_item_for_removal(&service, &repo(), &id, &options).await;
    assert!(prep.success);

    // A concurrent writer bumps the version between the two phases.
    let mut raced = prep.updated_item.clone().unwrap();
    raced.version += 3;
    service.put_item(&repo(), raced).await;

    let cleanup = archive_prepared_item(&service, &prep, &options).await.unwrap();
    assert!(!cleanup.overall_success);
    assert!(cleanup.clear_key.is_failure());
    assert_eq!(cleanup.unpublish, StepStatus::Skipped);
    assert_eq!(cleanup.archive, StepStatus::Skipped);
    assert_eq!(cleanup.first_failure().unwrap().0, "clear_key");

    let final_state = service.get_item(&id).await.unwrap().unwrap();
    assert_eq!(final_state.status, ContentStatus::Active);
}

// ── Whole-item removal ───────────────────────────────────────────

#[tokio::test]
async fn remove_item_runs_both_phases() {
    let service = MemoryService::new();
    let id = seed(&service, published(keyed(make_item("item-1", "Page"), "en-GB-page"))).await;

    let removal = remove_item(&service, &repo(), &id, &RemovalOptions::default()).await;

    assert!(removal.overall_success);
    assert_eq!(removal.label, "Page");
    assert!(removal.preparation.success);
    assert!(removal.cleanup.unwrap().overall_success);

    let final_state = service.get_item(&id).await.unwrap().unwrap();
    assert_eq!(final_state.status, ContentStatus::Archived);
}

#[tokio::test]
async fn remove_item_short_circuits_on_failed_preparation() {
    let service = MemoryService::new();

    let removal = remove_item(
        &service,
        &repo(),
        &ItemId::new("missing"),
        &RemovalOptions::default(),
    )
    .await;

    assert!(!removal.overall_success);
    assert!(!removal.preparation.success);
    assert!(removal.cleanup.is_none());
    assert_eq!(removal.label, "");
}

// ── Subtree removal ──────────────────────────────────────────────

#[tokio::test]
async fn subtree_removal_retires_children_before_parents() {
    let service = MemoryService::new();
    seed(&service, rooted(make_item("r", "Root"))).await;
    seed(&service, child_of(make_item("a", "A"), "r")).await;
    seed(&service, child_of(make_item("a1", "A1"), "a")).await;

    let items = service.fetch_items(&repo(), None).await.unwrap();
    let tree = build_tree(&ItemId::new("r"), &items).unwrap();

    let removals = remove_subtree(&service, &repo(), &tree, &RemovalOptions::default()).await;

    let order: Vec<&str> = removals.iter().map(|r| r.item_id.as_str()).collect();
    assert_eq!(order, vec!["a1", "a", "r"]);
    assert!(removals.iter().all(|r| r.overall_success));

    // The quarantine folder was resolved once and shared.
    let folder = removals[0].preparation.deleted_folder_id.clone();
    assert!(folder.is_some());
    assert!(removals.iter().all(|r| {
        r.preparation.deleted_folder_id == folder
            && r.preparation.ensure_deleted_folder == StepStatus::Skipped
    }));

    for id in ["r", "a", "a1"] {
        let item = service.get_item(&ItemId::new(id)).await.unwrap().unwrap();
        assert_eq!(item.status, ContentStatus::Archived);
    }
}

#[tokio::test]
async fn subtree_removal_continues_past_a_failing_item() {
    let service = MemoryService::new();
    seed(&service, rooted(make_item("r", "Root"))).await;
    seed(&service, child_of(make_item("a", "A"), "r")).await;

    let items = service.fetch_items(&repo(), None).await.unwrap();
    let tree = build_tree(&ItemId::new("r"), &items).unwrap();

    // Archive the child out-of-band; with unarchiving off its move fails.
    let child = service.get_item(&ItemId::new("a")).await.unwrap().unwrap();
    service.archive_item(&child.id, child.version).await.unwrap();

    let options = RemovalOptions {
        unarchive_if_needed: false,
        ..RemovalOptions::default()
    };
    let removals = remove_subtree(&service, &repo(), &tree, &options).await;

    assert_eq!(removals.len(), 2);
    assert!(!removals[0].overall_success);
    assert!(removals[1].overall_success);

    let root = service.get_item(&ItemId::new("r")).await.unwrap().unwrap();
    assert_eq!(root.status, ContentStatus::Archived);
}
