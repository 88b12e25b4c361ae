use std::time::Duration;

use planmark_annotator::{
    AnnotationType, GestureResult, HoldReason, LayoutPoint, LayoutRect, PointerTarget,
    PointerUpdate, ResizeHandle,
};
use planmark_core::{AnnotationEvent, AppEvent, ValidationError};

use crate::common::*;

fn p(x: f64, y: f64) -> LayoutPoint {
    LayoutPoint::new(x, y)
}

#[tokio::test]
async fn test_draw_room_opens_edit_surface() {
    let mut f = fixture().await;
    assert_eq!(
        f.session.set_draw_mode(AnnotationType::Room).unwrap(),
        Some(AnnotationType::Room)
    );

    f.session.pointer_down(p(350.0, 250.0), PointerTarget::Canvas).unwrap();
    assert_eq!(
        f.session.pointer_move(p(50.0, 50.0)),
        PointerUpdate::Preview(LayoutRect::new(50.0, 50.0, 300.0, 200.0))
    );
    let result = f.session.pointer_up(p(50.0, 50.0)).unwrap();

    let GestureResult::Drawn(id) = result else {
        panic!("expected a drawn annotation, got {:?}", result);
    };
    assert!(id.is_temporary());

    let drawn = f.session.annotation(id).unwrap();
    assert_eq!(drawn.label, "Room");
    assert_eq!(drawn.parent_id, None);
    assert_eq!(drawn.color, "#3b82f6");

    let opened = f.edit_surface.last().unwrap();
    assert_eq!(opened.id, id);
    assert_eq!(f.session.history().len(), 2);
    assert!(!f.session.lockout().is_held());
}

#[tokio::test]
async fn test_draw_below_minimum_is_cancelled() {
    let mut f = fixture().await;
    f.session.set_draw_mode(AnnotationType::Room).unwrap();
    f.session.pointer_down(p(10.0, 10.0), PointerTarget::Canvas).unwrap();

    let result = f.session.pointer_up(p(25.0, 200.0)).unwrap();
    assert!(matches!(
        result,
        GestureResult::Cancelled(ValidationError::BelowMinimumSize { .. })
    ));
    assert_eq!(f.session.store().len(), 5);
    assert_eq!(f.session.history().len(), 1);
    assert!(f.edit_surface.opened().is_empty());
}

#[tokio::test]
async fn test_location_draw_links_to_selected_room() {
    let mut f = fixture().await;
    f.session.select_annotation(ROOM).unwrap();
    assert_eq!(f.session.context_label(), "Kitchen");
    let announced = f.events().into_iter().any(|event| {
        matches!(
            event,
            AppEvent::Annotation(AnnotationEvent::ContextChanged { ref label, ref draw_tool })
                if label == "Kitchen" && draw_tool == "location"
        )
    });
    assert!(announced);

    f.session.set_draw_mode(AnnotationType::Location).unwrap();
    f.session.pointer_down(p(100.0, 100.0), PointerTarget::Canvas).unwrap();
    let GestureResult::Drawn(id) = f.session.pointer_up(p(200.0, 160.0)).unwrap() else {
        panic!("expected a drawn location");
    };

    let location = f.session.annotation(id).unwrap();
    assert_eq!(location.label, "Location 2");
    assert_eq!(location.parent_id, Some(ROOM));
    assert_eq!(location.refs.room_id(), Some(planmark_core::EntityId(100)));
}

#[tokio::test]
async fn test_duplicate_draw_is_refused_and_highlighted() {
    let mut f = fixture().await;
    f.session.select_annotation(NORTH_WALL).unwrap();

    let err = f.session.set_draw_mode(AnnotationType::Location).unwrap_err();
    assert!(err.is_validation_error());
    assert_eq!(f.session.draw_mode(), None);

    let highlighted = f.events().into_iter().any(|event| {
        matches!(
            event,
            AppEvent::Annotation(AnnotationEvent::DuplicateHighlighted {
                id,
                ref color,
                duration_ms: 2000,
            }) if id == NORTH_WALL && color == "#ff0000"
        )
    });
    assert!(highlighted);

    // cabinets are exempt
    assert!(f.session.set_draw_mode(AnnotationType::Cabinet).is_ok());
}

#[tokio::test]
async fn test_draw_modes_require_context() {
    let mut f = fixture().await;
    let err = f.session.set_draw_mode(AnnotationType::CabinetRun).unwrap_err();
    assert_eq!(err.to_string(), "Select a room and location before drawing");
    assert!(f.session.set_draw_mode(AnnotationType::Location).is_err());

    assert_eq!(f.session.set_draw_mode(AnnotationType::Room).unwrap(), Some(AnnotationType::Room));
    assert_eq!(f.session.set_draw_mode(AnnotationType::Room).unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_resize_commits_after_debounce() {
    let mut f = fixture().await;
    assert_eq!(
        f.session.annotation(ROOM).unwrap().layout,
        LayoutRect::new(80.0, 60.0, 320.0, 240.0)
    );

    f.session
        .pointer_down(p(400.0, 300.0), PointerTarget::Handle(ROOM, ResizeHandle::Se))
        .unwrap();
    assert!(f.session.lockout().holds(HoldReason::Resize));

    assert_eq!(f.session.pointer_move(p(420.0, 310.0)), PointerUpdate::FrameRequested);
    assert_eq!(f.session.pointer_move(p(430.0, 320.0)), PointerUpdate::Coalesced);
    assert_eq!(
        f.session.animation_frame(),
        Some(LayoutRect::new(80.0, 60.0, 350.0, 260.0))
    );

    let result = f.session.pointer_up(p(430.0, 320.0)).unwrap();
    assert_eq!(result, GestureResult::Committed(ROOM));
    assert!(f.session.lockout().holds(HoldReason::PendingSave));
    assert!(!f.session.lockout().holds(HoldReason::Resize));

    let room = f.session.annotation(ROOM).unwrap();
    assert_close(room.normalized.width, 350.0 / 800.0);
    assert_close(room.normalized.height, 260.0 / 600.0);

    tokio::time::advance(Duration::from_millis(999)).await;
    assert_eq!(f.session.flush_due_saves().await.unwrap(), 0);
    assert!(f.backend.patches().is_empty());

    tokio::time::advance(Duration::from_millis(1)).await;
    assert_eq!(f.session.flush_due_saves().await.unwrap(), 1);
    let patches = f.backend.patches();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].0, 1);
    assert_close(patches[0].1.width, 350.0 / 800.0);
    assert!(!f.session.lockout().is_held());
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_moves_writes_once_per_annotation() {
    let mut f = fixture().await;

    f.session.pointer_down(p(100.0, 100.0), PointerTarget::Body(ROOM)).unwrap();
    f.session.pointer_up(p(110.0, 100.0)).unwrap();

    tokio::time::advance(Duration::from_millis(500)).await;
    f.session
        .pointer_down(p(500.0, 380.0), PointerTarget::Body(PANTRY_WALL))
        .unwrap();
    // timer is paused while the gesture runs
    assert!(!f.session.debouncer().is_armed());
    f.session.pointer_up(p(500.0, 390.0)).unwrap();

    tokio::time::advance(Duration::from_millis(500)).await;
    f.session.pointer_down(p(110.0, 100.0), PointerTarget::Body(ROOM)).unwrap();
    f.session.pointer_up(p(130.0, 100.0)).unwrap();

    tokio::time::advance(Duration::from_millis(999)).await;
    assert_eq!(f.session.flush_due_saves().await.unwrap(), 0);
    tokio::time::advance(Duration::from_millis(1)).await;
    assert_eq!(f.session.flush_due_saves().await.unwrap(), 2);

    let patches = f.backend.patches();
    assert_eq!(patches.len(), 2);
    let room_patch = patches.iter().find(|(id, _)| *id == 1).unwrap();
    // 80px + 30px over an 800px wide layout
    assert_close(room_patch.1.x, 110.0 / 800.0);
}

#[tokio::test(start_paused = true)]
async fn test_jitter_leaves_annotation_untouched() {
    let mut f = fixture().await;
    let before = f.session.annotation(ROOM).unwrap().clone();

    f.session
        .pointer_down(p(400.0, 180.0), PointerTarget::Handle(ROOM, ResizeHandle::E))
        .unwrap();
    f.session.pointer_move(p(401.5, 181.0));
    f.session.animation_frame();
    let result = f.session.pointer_up(p(401.5, 181.0)).unwrap();

    assert!(matches!(
        result,
        GestureResult::Cancelled(ValidationError::BelowMinimumDelta { .. })
    ));
    assert_eq!(f.session.annotation(ROOM).unwrap(), &before);
    assert!(!f.session.lockout().is_held());
    assert!(!f.session.debouncer().is_pending());
    assert_eq!(f.session.history().len(), 1);

    tokio::time::advance(Duration::from_secs(2)).await;
    f.session.tick().await.unwrap();
    assert!(f.backend.patches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_resize_frame_below_minimum_is_skipped() {
    let mut f = fixture().await;
    f.session
        .pointer_down(p(400.0, 180.0), PointerTarget::Handle(ROOM, ResizeHandle::E))
        .unwrap();
    // would leave the room 10px wide
    f.session.pointer_move(p(90.0, 180.0));
    assert_eq!(f.session.animation_frame(), None);
    assert_eq!(
        f.session.annotation(ROOM).unwrap().layout,
        LayoutRect::new(80.0, 60.0, 320.0, 240.0)
    );
    f.session.cancel_gesture();
    assert!(!f.session.lockout().is_held());
}

#[tokio::test(start_paused = true)]
async fn test_lockout_refuses_context_changes() {
    let mut f = fixture().await;
    f.session.pointer_down(p(100.0, 100.0), PointerTarget::Body(ROOM)).unwrap();

    let err = f.session.select_annotation(NORTH_WALL).unwrap_err();
    assert!(err.is_concurrency_conflict());
    assert!(!err.is_user_facing());
    assert!(f.session.context().is_empty());
    assert!(f.session.undo().is_err());
    assert!(!f.session.recompute_positions());

    let refused = f.events().into_iter().any(|event| {
        matches!(event, AppEvent::Annotation(AnnotationEvent::ContextRefused { .. }))
    });
    assert!(refused);

    f.session.pointer_up(p(140.0, 100.0)).unwrap();
    // still held until the debounced save resolves
    assert!(f.session.select_annotation(NORTH_WALL).is_err());

    f.session.run_pending_save().await.unwrap();
    f.session.select_annotation(NORTH_WALL).unwrap();
    assert_eq!(f.session.context_label(), "Kitchen → North Wall");
}

#[tokio::test(start_paused = true)]
async fn test_tree_refresh_deferred_during_gesture() {
    let mut f = fixture().await;
    f.session
        .pointer_down(p(400.0, 300.0), PointerTarget::Handle(ROOM, ResizeHandle::Se))
        .unwrap();

    f.backend.set_tree(Vec::new());
    assert!(!f.session.refresh_tree().await.unwrap());
    assert!(f.session.is_refresh_deferred());
    assert!(!f.session.tree().is_empty());

    f.session.pointer_move(p(440.0, 330.0));
    f.session.animation_frame();
    f.session.pointer_up(p(440.0, 330.0)).unwrap();

    tokio::time::advance(Duration::from_millis(1000)).await;
    f.session.tick().await.unwrap();
    assert!(!f.session.is_refresh_deferred());
    assert!(f.session.tree().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_refresh_waits_for_pending_save() {
    let mut f = fixture().await;
    f.session.pointer_down(p(100.0, 100.0), PointerTarget::Body(ROOM)).unwrap();
    f.session.pointer_up(p(100.0, 130.0)).unwrap();

    // polls until the debounced save has gone out
    assert!(f.session.refresh_tree().await.unwrap());
    assert_eq!(f.backend.patches().len(), 1);
    assert!(!f.session.lockout().is_held());
}

#[tokio::test]
async fn test_locked_annotation_cannot_be_moved() {
    let mut f = fixture().await;
    assert!(f.session.toggle_lock(ROOM).unwrap());
    let err = f
        .session
        .pointer_down(p(100.0, 100.0), PointerTarget::Body(ROOM))
        .unwrap_err();
    assert_eq!(err.to_string(), "Annotation 1 is locked");
    assert!(!f.session.lockout().is_held());
}

#[tokio::test]
async fn test_undo_and_redo_draw() {
    let mut f = fixture().await;
    f.session.set_draw_mode(AnnotationType::Room).unwrap();
    f.session.pointer_down(p(500.0, 50.0), PointerTarget::Canvas).unwrap();
    f.session.pointer_up(p(600.0, 150.0)).unwrap();
    assert_eq!(f.session.store().len(), 6);

    assert_eq!(f.session.undo().unwrap().as_deref(), Some("Draw room"));
    assert_eq!(f.session.store().len(), 5);
    assert_eq!(f.session.undo().unwrap(), None);

    assert_eq!(f.session.redo().unwrap().as_deref(), Some("Draw room"));
    assert_eq!(f.session.store().len(), 6);
    assert_eq!(f.session.history().len(), 2);
}
