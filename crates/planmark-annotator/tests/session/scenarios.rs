use planmark_annotator::{
    Annotation, AnnotationType, EntityKind, GestureResult, HistoryConfig, HistoryManager,
    LayoutPoint, PointerTarget,
};

use crate::common::*;

#[tokio::test]
async fn test_drawn_rectangle_round_trips_through_document_space() {
    let mut f = fixture().await;
    f.session.set_draw_mode(AnnotationType::Room).unwrap();
    f.session
        .pointer_down(LayoutPoint::new(50.0, 50.0), PointerTarget::Canvas)
        .unwrap();
    let GestureResult::Drawn(id) = f
        .session
        .pointer_up(LayoutPoint::new(350.0, 250.0))
        .unwrap()
    else {
        panic!("expected a drawn room");
    };

    let doc = f.session.annotation(id).unwrap().doc;
    assert_close(doc.x, 38.25);
    assert_close(doc.y, 726.0);
    assert_close(doc.width, 229.5);
    assert_close(doc.height, 264.0);

    let layout = f
        .session
        .coordinates()
        .doc_to_layout(doc.x, doc.y, doc.width, doc.height);
    assert_close(layout.x, 50.0);
    assert_close(layout.y, 50.0);
    assert_close(layout.width, 300.0);
    assert_close(layout.height, 200.0);
}

#[tokio::test]
async fn test_room_isolation_visibility() {
    let mut f = fixture().await;
    f.session.enter_isolation(ROOM).await.unwrap();

    assert!(!f.session.is_hidden(ROOM));
    assert!(!f.session.is_hidden(NORTH_WALL));
    assert!(!f.session.is_hidden(BASE_RUN));
    assert!(f.session.is_hidden(PANTRY_WALL));
    assert!(f.session.is_hidden(LOOSE_CABINET));
}

#[test]
fn test_history_keeps_most_recent_snapshots() {
    let mut history = HistoryManager::new(HistoryConfig { max_size: 3 });
    let mut annotations: Vec<Annotation> = Vec::new();
    for n in 1..=4 {
        annotations.push(Annotation::new(AnnotationType::Room, 1));
        assert!(history.push(&annotations, format!("{}", n)));
    }

    let labels: Vec<_> = history.snapshots().iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["2", "3", "4"]);
    assert_eq!(history.index(), Some(2));
    assert_eq!(history.current().unwrap().annotations.len(), 4);
}

#[tokio::test]
async fn test_missing_ancestors_follow_context() {
    let mut f = fixture().await;
    let kinds = |f: &Fixture| -> Vec<EntityKind> {
        f.session
            .detector()
            .missing_ancestors(AnnotationType::CabinetRun, f.session.context())
            .into_iter()
            .map(|m| m.kind)
            .collect()
    };

    assert_eq!(kinds(&f), vec![EntityKind::Room, EntityKind::RoomLocation]);

    f.session.select_annotation(ROOM).unwrap();
    assert_eq!(kinds(&f), vec![EntityKind::RoomLocation]);

    f.session.select_annotation(NORTH_WALL).unwrap();
    assert!(kinds(&f).is_empty());
}
