use std::sync::Arc;

use planmark_annotator::{
    AnnotationRecord, AnnotatorSession, HeadlessViewport, MemoryBackend, RecordingEditSurface,
    SessionConfig, StaticSurface, SurfaceSize, TreeNode,
};
use planmark_core::{AnnotationId, AppEvent, EntityId, EventBus, EventBusConfig, PageId};

pub const PAGE: PageId = PageId(1);

pub const ROOM: AnnotationId = AnnotationId::Stable(1);
pub const NORTH_WALL: AnnotationId = AnnotationId::Stable(2);
pub const PANTRY_WALL: AnnotationId = AnnotationId::Stable(3);
pub const BASE_RUN: AnnotationId = AnnotationId::Stable(4);
pub const LOOSE_CABINET: AnnotationId = AnnotationId::Stable(5);

pub struct Fixture {
    pub session: AnnotatorSession,
    pub backend: Arc<MemoryBackend>,
    pub edit_surface: Arc<RecordingEditSurface>,
    pub events: Arc<EventBus>,
}

#[allow(clippy::too_many_arguments)]
pub fn record(
    id: u64,
    kind: &str,
    rect: (f64, f64, f64, f64),
    room: Option<u64>,
    location: Option<u64>,
    run: Option<u64>,
    parent: Option<u64>,
) -> AnnotationRecord {
    AnnotationRecord {
        id,
        annotation_type: kind.to_string(),
        x: rect.0,
        y: rect.1,
        width: rect.2,
        height: rect.3,
        text: None,
        color: None,
        view_type: None,
        orientation: None,
        notes: None,
        room_id: room.map(EntityId),
        room_location_id: location.map(EntityId),
        cabinet_run_id: run.map(EntityId),
        cabinet_specification_id: None,
        parent_annotation_id: parent,
        page_number: None,
    }
}

/// Kitchen (room 100) with its north wall (location 10) and base run
/// (run 50), a pantry wall in room 200, and a cabinet only linked to the
/// kitchen.
pub fn seed_records() -> Vec<AnnotationRecord> {
    let mut records = vec![
        record(1, "room", (0.1, 0.1, 0.4, 0.4), Some(100), None, None, None),
        record(2, "location", (0.15, 0.15, 0.2, 0.1), Some(100), Some(10), None, Some(1)),
        record(3, "location", (0.6, 0.6, 0.2, 0.1), Some(200), Some(20), None, None),
        record(4, "cabinet_run", (0.16, 0.16, 0.1, 0.05), Some(100), Some(10), Some(50), Some(2)),
        record(5, "cabinet", (0.3, 0.3, 0.05, 0.05), Some(100), None, None, None),
    ];
    let labels = ["Kitchen", "North Wall", "Pantry Wall", "Base Run", "Cabinet 1"];
    for (record, label) in records.iter_mut().zip(labels) {
        record.text = Some(label.to_string());
    }
    records
}

pub fn seed_tree() -> Vec<TreeNode> {
    serde_json::from_value(serde_json::json!([
        {"id": 100, "name": "Kitchen", "type": "room",
         "pages": [{"page": 1, "viewType": "plan"}],
         "children": [
            {"id": 10, "name": "North Wall", "type": "room_location",
             "pages": [{"page": 3, "viewType": "elevation"}],
             "children": [
                {"id": 50, "name": "Base Run", "type": "cabinet_run", "pages": []}
             ]}
         ]},
        {"id": 200, "name": "Pantry", "type": "room",
         "pages": [{"page": 2, "viewType": "plan"}],
         "children": [
            {"id": 20, "name": "Pantry Wall", "type": "room_location", "pages": []}
         ]}
    ]))
    .unwrap()
}

fn build(config: SessionConfig, viewport: Option<Arc<HeadlessViewport>>) -> Fixture {
    let backend = Arc::new(
        MemoryBackend::new()
            .with_page(PAGE, seed_records())
            .with_tree(seed_tree()),
    );
    let edit_surface = Arc::new(RecordingEditSurface::new());
    let events = Arc::new(EventBus::with_config(EventBusConfig {
        history_size: 256,
        ..EventBusConfig::default()
    }));

    let mut session = AnnotatorSession::new(config, backend.clone(), backend.clone())
        .with_edit_surface(edit_surface.clone())
        .with_events(events.clone());

    match viewport {
        Some(viewport) => {
            session = session.with_viewport(viewport.clone());
            session.attach_surface(viewport);
        }
        None => session.attach_surface(Arc::new(StaticSurface::new(800.0, 600.0))),
    }

    Fixture {
        session,
        backend,
        edit_surface,
        events,
    }
}

/// A session on an 800x600 static surface with page 1 and the tree loaded.
pub async fn fixture() -> Fixture {
    let mut fixture = build(SessionConfig::default(), None);
    fixture.session.load_page(PAGE, 1, None).await.unwrap();
    fixture.session.refresh_tree().await.unwrap();
    fixture
}

/// Like [`fixture`] but hosted in a zoomable 800x600 viewport.
pub async fn viewport_fixture() -> (Fixture, Arc<HeadlessViewport>) {
    let viewport = Arc::new(HeadlessViewport::new(
        SurfaceSize::new(800.0, 600.0),
        SurfaceSize::new(800.0, 600.0),
    ));
    let mut fixture = build(SessionConfig::default(), Some(viewport.clone()));
    fixture.session.load_page(PAGE, 1, None).await.unwrap();
    fixture.session.refresh_tree().await.unwrap();
    (fixture, viewport)
}

impl Fixture {
    pub fn events(&self) -> Vec<AppEvent> {
        self.events.history()
    }
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {} but got {}",
        expected,
        actual
    );
}
