use std::time::Duration;

use planmark_annotator::{AnnotationType, EntityDefaults, GestureResult, LayoutPoint, PointerTarget};
use planmark_core::{AnnotationId, AppEvent, EntityId, PersistenceEvent, StatusEvent, StatusLevel};

use crate::common::*;

async fn draw_room(f: &mut Fixture) -> AnnotationId {
    f.session.set_draw_mode(AnnotationType::Room).unwrap();
    f.session
        .pointer_down(LayoutPoint::new(500.0, 50.0), PointerTarget::Canvas)
        .unwrap();
    match f.session.pointer_up(LayoutPoint::new(700.0, 200.0)).unwrap() {
        GestureResult::Drawn(id) => id,
        other => panic!("expected a drawn room, got {:?}", other),
    }
}

fn has_error_status(f: &Fixture) -> bool {
    f.events().into_iter().any(|event| {
        matches!(
            event,
            AppEvent::Status(StatusEvent::Message {
                level: StatusLevel::Error,
                ..
            })
        )
    })
}

#[tokio::test]
async fn test_save_all_replaces_temporary_ids() {
    let mut f = fixture().await;
    let temp = draw_room(&mut f).await;

    let summary = f.session.save_all().await.unwrap();
    assert!(summary.success);
    assert_eq!(summary.count, 1);

    assert!(f.session.annotation(temp).is_none());
    assert_eq!(f.session.store().len(), 6);
    assert!(f.session.store().iter().all(|a| !a.is_temporary()));

    let saved = f.session.annotation(AnnotationId::Stable(6)).unwrap();
    assert_eq!(saved.kind(), AnnotationType::Room);
    assert_close(saved.normalized.x, 500.0 / 800.0);
    assert_close(saved.normalized.width, 200.0 / 800.0);
}

#[tokio::test]
async fn test_undo_cannot_restore_saved_drafts() {
    let mut f = fixture().await;
    draw_room(&mut f).await;
    f.session.save_all().await.unwrap();
    assert_eq!(f.backend.records(PAGE).len(), 6);

    assert_eq!(f.session.undo().unwrap(), None);
    assert!(f.session.store().iter().all(|a| !a.is_temporary()));
    assert_eq!(
        f.session.history().current().map(|s| s.label.as_str()),
        Some("Save page 1")
    );

    let summary = f.session.save_all().await.unwrap();
    assert_eq!(summary.count, 0);
    assert_eq!(f.backend.records(PAGE).len(), 6);
}

#[tokio::test]
async fn test_save_all_without_drafts_is_a_no_op() {
    let mut f = fixture().await;
    let summary = f.session.save_all().await.unwrap();
    assert_eq!(summary.count, 0);
    assert_eq!(f.backend.records(PAGE).len(), 5);
}

#[tokio::test]
async fn test_delete_temporary_annotation_stays_local() {
    let mut f = fixture().await;
    let temp = draw_room(&mut f).await;

    f.session.delete_annotation(temp).await.unwrap();
    assert!(f.session.annotation(temp).is_none());
    assert!(f.backend.deletes().is_empty());
}

#[tokio::test]
async fn test_delete_stable_annotation_hits_backend() {
    let mut f = fixture().await;
    f.session.delete_annotation(LOOSE_CABINET).await.unwrap();

    assert_eq!(f.backend.deletes(), vec![5]);
    assert_eq!(f.session.store().len(), 4);
    assert_eq!(
        f.session.history().current().map(|s| s.label.as_str()),
        Some("Delete Cabinet 1")
    );
}

#[tokio::test]
async fn test_failed_delete_keeps_annotation() {
    let mut f = fixture().await;
    f.backend.fail_next("offline");

    let err = f.session.delete_annotation(LOOSE_CABINET).await.unwrap_err();
    assert!(err.is_persistence_error());
    assert!(f.session.annotation(LOOSE_CABINET).is_some());
    assert!(has_error_status(&f));
}

#[tokio::test]
async fn test_rejected_save_keeps_drafts() {
    let mut f = fixture().await;
    let temp = draw_room(&mut f).await;
    f.backend.reject_next(422);

    let err = f.session.save_all().await.unwrap_err();
    assert!(err.is_persistence_error());
    assert_eq!(err.to_string(), "save annotations rejected with status 422");
    assert!(f.session.annotation(temp).is_some());
    assert_eq!(f.backend.records(PAGE).len(), 5);
    assert!(has_error_status(&f));
}

#[tokio::test]
async fn test_failed_load_keeps_state() {
    let mut f = fixture().await;
    f.backend.fail_next("timeout");

    let err = f.session.load_page(PAGE, 1, None).await.unwrap_err();
    assert_eq!(err.to_string(), "load annotations failed: timeout");
    assert_eq!(f.session.store().len(), 5);
    assert!(has_error_status(&f));
}

#[tokio::test(start_paused = true)]
async fn test_failed_patch_is_retried() {
    let mut f = fixture().await;
    f.session
        .pointer_down(LayoutPoint::new(100.0, 100.0), PointerTarget::Body(ROOM))
        .unwrap();
    f.session.pointer_up(LayoutPoint::new(100.0, 140.0)).unwrap();
    let moved = f.session.annotation(ROOM).unwrap().normalized;

    f.backend.fail_next("offline");
    tokio::time::advance(Duration::from_millis(1000)).await;
    let err = f.session.flush_due_saves().await.unwrap_err();
    assert!(err.is_persistence_error());

    // local geometry is kept and the lockout is released
    assert_eq!(f.session.annotation(ROOM).unwrap().normalized, moved);
    assert!(!f.session.lockout().is_held());
    assert!(f.session.has_failed_saves());
    assert!(has_error_status(&f));

    assert_eq!(f.session.retry_failed_saves().await.unwrap(), 1);
    assert!(!f.session.has_failed_saves());
    assert_eq!(f.backend.patches(), vec![(1, moved)]);

    let failures = f
        .events()
        .into_iter()
        .filter(|e| matches!(e, AppEvent::Persistence(PersistenceEvent::SaveFailed { .. })))
        .count();
    assert_eq!(failures, 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_keeps_lockout_while_later_save_is_queued() {
    let mut f = fixture().await;
    f.session
        .pointer_down(LayoutPoint::new(100.0, 100.0), PointerTarget::Body(ROOM))
        .unwrap();
    f.session.pointer_up(LayoutPoint::new(100.0, 140.0)).unwrap();
    f.backend.fail_next("offline");
    tokio::time::advance(Duration::from_millis(1000)).await;
    assert!(f.session.flush_due_saves().await.is_err());

    f.session
        .pointer_down(LayoutPoint::new(200.0, 200.0), PointerTarget::Body(NORTH_WALL))
        .unwrap();
    f.session.pointer_up(LayoutPoint::new(230.0, 200.0)).unwrap();
    assert!(f.session.debouncer().is_pending());

    assert_eq!(f.session.retry_failed_saves().await.unwrap(), 1);
    assert!(f.session.debouncer().is_armed());
    assert!(f.session.lockout().is_held());
    assert!(f.session.select_annotation(ROOM).is_err());

    assert_eq!(f.session.run_pending_save().await.unwrap(), 1);
    assert!(!f.session.lockout().is_held());
    assert!(f.session.select_annotation(ROOM).is_ok());
}

#[tokio::test]
async fn test_temporary_annotation_moves_are_not_patched() {
    let mut f = fixture().await;
    let temp = draw_room(&mut f).await;

    f.session
        .pointer_down(LayoutPoint::new(550.0, 100.0), PointerTarget::Body(temp))
        .unwrap();
    let result = f.session.pointer_up(LayoutPoint::new(560.0, 120.0)).unwrap();
    assert_eq!(result, GestureResult::Committed(temp));
    assert!(!f.session.debouncer().is_pending());
    assert!(!f.session.lockout().is_held());
}

#[tokio::test]
async fn test_create_missing_ancestors_fills_context() {
    let mut f = fixture().await;
    let created = f
        .session
        .create_missing_ancestors(AnnotationType::CabinetRun, None)
        .await
        .unwrap();

    let names: Vec<_> = created.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Untitled", "Location"]);
    assert_eq!(f.session.context().room_id(), Some(EntityId(6)));
    assert_eq!(f.session.context().location_id(), Some(EntityId(7)));
    assert_eq!(f.session.context_label(), "Untitled → Location");

    let entities = f.backend.created_entities();
    assert!(matches!(
        &entities[1],
        EntityDefaults::RoomLocation { room_id: Some(EntityId(6)), .. }
    ));
    assert!(f.session.can_draw(AnnotationType::CabinetRun));
}
