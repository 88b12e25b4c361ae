use std::collections::HashSet;

use planmark_annotator::{
    AnnotationType, GestureResult, IsolationLevel, IsolationStep, LayoutPoint, Orientation,
    PointerTarget, ViewContext, ViewType,
};
use planmark_core::{AppEvent, IsolationEvent};

use crate::common::*;

#[tokio::test]
async fn test_room_isolation_hides_other_branches() {
    let mut f = fixture().await;
    let steps = f.session.enter_isolation(ROOM).await.unwrap();
    assert_eq!(
        steps,
        vec![IsolationStep::RecomputeGeometry, IsolationStep::RebuildMask]
    );

    assert_eq!(f.session.isolation().level(), Some(IsolationLevel::Room));
    assert_eq!(
        f.session.hidden(),
        &HashSet::from([PANTRY_WALL, LOOSE_CABINET])
    );
    let visible: Vec<_> = f.session.visible_annotations().iter().map(|a| a.id).collect();
    assert_eq!(visible, vec![ROOM, NORTH_WALL, BASE_RUN]);
    assert_eq!(f.session.context_label(), "Kitchen");
}

#[tokio::test]
async fn test_reentering_same_focus_is_a_no_op() {
    let mut f = fixture().await;
    f.session.enter_isolation(ROOM).await.unwrap();
    let mask = f.session.mask().to_vec();

    assert!(f.session.enter_isolation(ROOM).await.unwrap().is_empty());
    assert_eq!(f.session.mask(), mask.as_slice());
}

#[tokio::test]
async fn test_exit_restores_prior_context() {
    let mut f = fixture().await;
    f.session.select_annotation(PANTRY_WALL).unwrap();
    let before = f.session.context().clone();

    f.session.enter_isolation(NORTH_WALL).await.unwrap();
    assert_eq!(f.session.context_label(), "Kitchen → North Wall");

    // switching focus keeps the context captured on first entry
    f.session.enter_isolation(ROOM).await.unwrap();
    assert!(f.session.exit_isolation().await.unwrap());

    assert_eq!(f.session.context(), &before);
    assert!(f.session.hidden().is_empty());
    assert!(f.session.mask().is_empty());
    assert!(!f.session.exit_isolation().await.unwrap());

    let exited = f
        .events()
        .into_iter()
        .filter(|e| matches!(e, AppEvent::Isolation(IsolationEvent::Exited)))
        .count();
    assert_eq!(exited, 1);
}

#[tokio::test(start_paused = true)]
async fn test_viewport_fit_runs_before_mask() {
    let (mut f, viewport) = viewport_fixture().await;
    assert_eq!(
        f.session.annotation(ROOM).unwrap().layout,
        planmark_annotator::LayoutRect::new(80.0, 60.0, 320.0, 240.0)
    );

    let steps = f.session.enter_isolation(ROOM).await.unwrap();
    assert_eq!(
        steps,
        vec![
            IsolationStep::FitViewport,
            IsolationStep::AwaitRender,
            IsolationStep::RecomputeGeometry,
            IsolationStep::RebuildMask,
        ]
    );
    assert_close(viewport.zoom(), 2.25);
    assert_close(f.session.coordinates().zoom(), 2.25);

    let layout = f.session.annotation(ROOM).unwrap().layout;
    assert_close(layout.x, 180.0);
    assert_close(layout.y, 135.0);
    assert_close(layout.width, 720.0);
    assert_close(layout.height, 540.0);

    // focus first, then every other visible annotation
    let mask = f.session.mask();
    assert_eq!(mask.len(), 3);
    assert_close(mask[0].rect.x, 165.0);
    assert_close(mask[0].rect.y, 120.0);
    assert_close(mask[0].rect.width, 750.0);
    assert_close(mask[0].rect.height, 570.0);
    assert_eq!(mask[0].corner_radius, 8.0);

    f.session.exit_isolation().await.unwrap();
    assert_close(viewport.zoom(), 1.0);
    assert_eq!(
        f.session.annotation(ROOM).unwrap().layout,
        planmark_annotator::LayoutRect::new(80.0, 60.0, 320.0, 240.0)
    );
}

#[tokio::test]
async fn test_isolating_cabinet_isolates_its_room() {
    let mut f = fixture().await;
    f.session.enter_isolation(LOOSE_CABINET).await.unwrap();

    let ctx = f.session.isolation().context().unwrap();
    assert_eq!(ctx.level, IsolationLevel::Room);
    assert_eq!(ctx.focus, ROOM);
}

#[tokio::test]
async fn test_location_breadcrumbs() {
    let mut f = fixture().await;
    f.session.enter_isolation(NORTH_WALL).await.unwrap();

    let crumbs: Vec<_> = f
        .session
        .breadcrumbs()
        .into_iter()
        .map(|c| format!("{} {}", c.icon, c.name))
        .collect();
    assert_eq!(crumbs, vec!["🏠 Kitchen", "📍 North Wall"]);
    assert_eq!(
        f.session.hidden(),
        &HashSet::from([PANTRY_WALL, LOOSE_CABINET])
    );
}

#[tokio::test]
async fn test_draw_inside_isolation_links_to_focus() {
    let mut f = fixture().await;
    f.session.enter_isolation(NORTH_WALL).await.unwrap();
    let mask_before = f.session.mask().len();

    f.session.set_draw_mode(AnnotationType::CabinetRun).unwrap();
    f.session
        .pointer_down(LayoutPoint::new(130.0, 100.0), PointerTarget::Canvas)
        .unwrap();
    let GestureResult::Drawn(id) = f
        .session
        .pointer_up(LayoutPoint::new(230.0, 160.0))
        .unwrap()
    else {
        panic!("expected a drawn run");
    };

    let run = f.session.annotation(id).unwrap();
    assert_eq!(run.parent_id, Some(NORTH_WALL));
    assert_eq!(run.label, "Run 2");
    assert_eq!(run.refs.location_id(), Some(planmark_core::EntityId(10)));
    assert!(!f.session.is_hidden(id));
    assert_eq!(f.session.mask().len(), mask_before + 1);
}

#[tokio::test]
async fn test_view_change_while_isolated_is_undone_on_exit() {
    let mut f = fixture().await;
    f.session.enter_isolation(ROOM).await.unwrap();

    let elevation = ViewContext::new(ViewType::Elevation, Some(Orientation::North));
    f.session.set_view(elevation);
    assert_eq!(f.session.view(), elevation);
    assert_eq!(
        f.session.isolation().context().unwrap().view,
        Some(elevation)
    );

    f.session.exit_isolation().await.unwrap();
    assert_eq!(f.session.view(), ViewContext::plan());
}
