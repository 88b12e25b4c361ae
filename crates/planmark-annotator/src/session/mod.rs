//! The annotation session.
//!
//! [`AnnotatorSession`] owns every piece of per-document state: the store,
//! the active context, isolation, gesture state, the lockout, history and
//! the pending-save queue. Hosts drive it through narrow methods and read it
//! through query methods; nothing is shared by direct field access.
//!
//! Every method that mutates the annotation list or the active context
//! consults the lockout first.

mod gestures;
mod isolation;
mod sync;

pub use gestures::{GestureResult, PointerTarget};
pub use isolation::{IsolationConfig, IsolationStep};

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use planmark_core::{
    AnnotationEvent, AnnotationId, AppEvent, ConcurrencyConflict, Error, EventBus, PageId,
    PersistenceEvent, Result, StatusLevel, ValidationError,
};

use crate::context::ActiveContext;
use crate::coordinates::{CoordinateConfig, CoordinateSpace, RenderSurface};
use crate::geometry::{NormalizedRect, PageDimensions};
use crate::hierarchy::HierarchyDetector;
use crate::history::{HistoryConfig, HistoryManager};
use crate::host::{EditSurface, ViewportHost};
use crate::interaction::{InteractionConfig, InteractionController};
use crate::lockout::Lockout;
use crate::model::{Annotation, AnnotationType, ViewContext};
use crate::persistence::{
    AnnotationBackend, AnnotationPayload, EntityBackend, SaveDebouncer, SaveSummary,
};
use crate::store::AnnotationStore;
use crate::tree::{NodeKey, ProjectTree, TreeNodeKind};
use crate::visibility::{self, Breadcrumb, IsolationState, MaskCutout};

/// Settings for every component a session owns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionConfig {
    pub interaction: InteractionConfig,
    pub history: HistoryConfig,
    pub coordinates: CoordinateConfig,
    pub isolation: IsolationConfig,
    /// Page size used when a page reports none.
    pub default_page: PageDimensions,
    pub project_id: u64,
}

/// Editing state for one project document.
pub struct AnnotatorSession {
    config: SessionConfig,
    page_id: Option<PageId>,
    page_number: u32,
    view: ViewContext,
    coords: CoordinateSpace,
    store: AnnotationStore,
    context: ActiveContext,
    tree: ProjectTree,
    isolation: IsolationState,
    stashed: Option<(ActiveContext, ViewContext)>,
    hidden: HashSet<AnnotationId>,
    mask: Vec<MaskCutout>,
    interaction: InteractionController,
    lockout: Lockout,
    debouncer: SaveDebouncer,
    failed_saves: BTreeMap<u64, NormalizedRect>,
    history: HistoryManager,
    detector: HierarchyDetector,
    annotations_api: Arc<dyn AnnotationBackend>,
    entities_api: Arc<dyn EntityBackend>,
    edit_surface: Option<Arc<dyn EditSurface>>,
    viewport: Option<Arc<dyn ViewportHost>>,
    events: Arc<EventBus>,
    refresh_deferred: bool,
}

impl AnnotatorSession {
    pub fn new(
        config: SessionConfig,
        annotations_api: Arc<dyn AnnotationBackend>,
        entities_api: Arc<dyn EntityBackend>,
    ) -> Self {
        Self {
            page_id: None,
            page_number: 1,
            view: ViewContext::plan(),
            coords: CoordinateSpace::new(config.coordinates.clone()),
            store: AnnotationStore::new(),
            context: ActiveContext::new(),
            tree: ProjectTree::default(),
            isolation: IsolationState::Normal,
            stashed: None,
            hidden: HashSet::new(),
            mask: Vec::new(),
            interaction: InteractionController::new(config.interaction.clone()),
            lockout: Lockout::new(),
            debouncer: SaveDebouncer::new(config.interaction.save_debounce),
            failed_saves: BTreeMap::new(),
            history: HistoryManager::new(config.history.clone()),
            detector: HierarchyDetector::new(config.project_id),
            annotations_api,
            entities_api,
            edit_surface: None,
            viewport: None,
            events: Arc::new(EventBus::new()),
            refresh_deferred: false,
            config,
        }
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    pub fn with_edit_surface(mut self, surface: Arc<dyn EditSurface>) -> Self {
        self.edit_surface = Some(surface);
        self
    }

    pub fn with_viewport(mut self, viewport: Arc<dyn ViewportHost>) -> Self {
        self.viewport = Some(viewport);
        self
    }

    /// Attaches the surface the current page renders into and recomputes
    /// layout geometry against it.
    pub fn attach_surface(&mut self, surface: Arc<dyn RenderSurface>) {
        self.coords.attach_surface(surface);
        self.recompute_positions();
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.store.get(id)
    }

    pub fn context(&self) -> &ActiveContext {
        &self.context
    }

    pub fn tree(&self) -> &ProjectTree {
        &self.tree
    }

    pub fn isolation(&self) -> &IsolationState {
        &self.isolation
    }

    pub fn coordinates(&self) -> &CoordinateSpace {
        &self.coords
    }

    pub fn lockout(&self) -> &Lockout {
        &self.lockout
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn detector(&self) -> &HierarchyDetector {
        &self.detector
    }

    pub fn debouncer(&self) -> &SaveDebouncer {
        &self.debouncer
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn page_id(&self) -> Option<PageId> {
        self.page_id
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn view(&self) -> ViewContext {
        self.view
    }

    pub fn hidden(&self) -> &HashSet<AnnotationId> {
        &self.hidden
    }

    pub fn is_hidden(&self, id: AnnotationId) -> bool {
        self.hidden.contains(&id)
    }

    /// Cutouts of the isolation overlay from the last rebuild.
    pub fn mask(&self) -> &[MaskCutout] {
        &self.mask
    }

    pub fn is_refresh_deferred(&self) -> bool {
        self.refresh_deferred
    }

    /// Annotations drawn under the current isolation state.
    pub fn visible_annotations(&self) -> Vec<&Annotation> {
        self.store
            .iter()
            .filter(|a| visibility::is_visible(a, &self.isolation))
            .collect()
    }

    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        self.isolation
            .context()
            .map(|ctx| ctx.breadcrumbs())
            .unwrap_or_default()
    }

    pub fn context_label(&self) -> String {
        self.context.label()
    }

    /// Switches the view. While isolated the change only affects the
    /// isolation filter; the outer view is restored on exit.
    pub fn set_view(&mut self, view: ViewContext) {
        self.view = view;
        if let IsolationState::Isolated(ctx) = &mut self.isolation {
            ctx.view = Some(view);
        }
        self.recompute_hidden();
    }

    fn check_lockout(&self, operation: &str) -> std::result::Result<(), ConcurrencyConflict> {
        self.lockout.check(operation).inspect_err(|conflict| {
            tracing::warn!("{}", conflict);
        })
    }

    fn publish(&self, event: AppEvent) {
        // Nobody listening is fine.
        let _ = self.events.publish(event);
    }

    fn status(&self, level: StatusLevel, text: impl Into<String>) {
        self.events.status(level, text);
    }

    fn report_failure(&self, operation: &str, err: &Error) {
        tracing::error!("{} failed: {}", operation, err);
        self.publish(AppEvent::Persistence(PersistenceEvent::SaveFailed {
            operation: operation.to_string(),
            message: err.to_string(),
        }));
        self.status(StatusLevel::Error, format!("{} failed: {}", operation, err));
    }

    pub(crate) fn recompute_hidden(&mut self) {
        self.hidden = visibility::hidden_set(self.store.as_slice(), &self.isolation);
    }

    fn record_history(&mut self, label: impl Into<String>) {
        self.history.push(self.store.as_slice(), label);
    }

    /// Loads a page's annotations from the backend, replacing the list.
    ///
    /// Falls back to the configured default page size when `dimensions` is
    /// absent. Records with unknown types are skipped.
    pub async fn load_page(
        &mut self,
        page_id: PageId,
        page_number: u32,
        dimensions: Option<PageDimensions>,
    ) -> Result<usize> {
        self.check_lockout("load page")?;

        let page = dimensions
            .filter(PageDimensions::is_valid)
            .unwrap_or(self.config.default_page);

        let records = match self.annotations_api.load_annotations(page_id).await {
            Ok(records) => records,
            Err(err) => {
                let err = Error::from(err);
                self.report_failure("Load annotations", &err);
                return Err(err);
            }
        };

        let mut annotations = Vec::with_capacity(records.len());
        for record in records {
            let id = record.id;
            match record.into_annotation(page, page_number) {
                Ok(annotation) => annotations.push(annotation),
                Err(err) => tracing::warn!("Skipping annotation {}: {}", id, err),
            }
        }

        self.page_id = Some(page_id);
        self.page_number = page_number;
        self.coords.set_page(Some(page));

        self.store.replace_all(annotations);
        self.store.inherit_parent_refs();
        self.store.refresh_layout(&self.coords);
        self.recompute_hidden();

        let count = self.store.len();
        self.record_history(format!("Load page {}", page_number));
        tracing::info!("Loaded {} annotations for {}", count, page_id);
        self.publish(AppEvent::Persistence(PersistenceEvent::Loaded {
            page: page_id,
            count,
        }));
        Ok(count)
    }

    /// Persists every temporary annotation on the current page.
    ///
    /// Missing entity ids are filled from the active context and the backend
    /// is asked to create entities. The page is reloaded afterwards so stable
    /// ids replace temporary ones, and history restarts from the saved list.
    pub async fn save_all(&mut self) -> Result<SaveSummary> {
        self.check_lockout("save annotations")?;
        let page_id = self
            .page_id
            .ok_or_else(|| Error::other("No page loaded"))?;

        let payloads: Vec<AnnotationPayload> = self
            .store
            .iter()
            .filter(|a| a.is_temporary() && a.page_number == self.page_number)
            .map(|a| AnnotationPayload::from_annotation(a, &self.context))
            .collect();

        if payloads.is_empty() {
            return Ok(SaveSummary {
                success: true,
                count: 0,
            });
        }

        let count = payloads.len();
        self.publish(AppEvent::Persistence(PersistenceEvent::SaveStarted { count }));

        let summary = match self
            .annotations_api
            .save_annotations(page_id, payloads, true)
            .await
        {
            Ok(summary) => summary,
            Err(err) => {
                let err = Error::from(err);
                self.report_failure("Save annotations", &err);
                return Err(err);
            }
        };

        tracing::info!("Saved {} annotations", summary.count);
        self.publish(AppEvent::Persistence(PersistenceEvent::SaveSucceeded {
            count: summary.count,
        }));
        self.status(
            StatusLevel::Info,
            format!("Saved {} annotations", summary.count),
        );

        let dimensions = self.coords.page();
        self.load_page(page_id, self.page_number, dimensions).await?;
        self.history
            .rebase(self.store.as_slice(), format!("Save page {}", self.page_number));
        if let Err(err) = self.refresh_tree().await {
            tracing::warn!("Tree refresh after save failed: {}", err);
        }
        Ok(summary)
    }

    /// Deletes an annotation.
    ///
    /// Temporary annotations are only removed locally. Persisted ones are
    /// deleted on the backend first; on failure local state is kept.
    pub async fn delete_annotation(&mut self, id: AnnotationId) -> Result<()> {
        self.check_lockout("delete annotation")?;
        let annotation = self
            .store
            .get(id)
            .ok_or(ValidationError::UnknownAnnotation { id })?;
        let label = annotation.label.clone();

        if let Some(stable) = id.stable() {
            if let Err(err) = self.annotations_api.delete_annotation(stable).await {
                let err = Error::from(err);
                self.report_failure("Delete annotation", &err);
                return Err(err);
            }
            self.debouncer.forget(stable);
            self.failed_saves.remove(&stable);
        }

        self.store.remove(id);
        self.recompute_hidden();
        self.record_history(format!("Delete {}", label));
        tracing::info!("Deleted annotation {}", id);
        self.publish(AppEvent::Annotation(AnnotationEvent::Deleted { id }));

        if !id.is_temporary() {
            if let Err(err) = self.refresh_tree().await {
                tracing::warn!("Tree refresh after delete failed: {}", err);
            }
        }
        Ok(())
    }

    /// Makes an annotation's entity chain the active context.
    pub fn select_annotation(&mut self, id: AnnotationId) -> Result<()> {
        if let Err(conflict) = self.check_lockout("select annotation") {
            self.publish(AppEvent::Annotation(AnnotationEvent::ContextRefused {
                operation: "select annotation".to_string(),
            }));
            return Err(conflict.into());
        }

        let annotation = self
            .store
            .get(id)
            .ok_or(ValidationError::UnknownAnnotation { id })?;
        self.context.select_annotation(annotation, &self.tree);

        let key = tree_key(annotation);
        if let Some(key) = key {
            self.tree.expand_path(key);
            self.tree.select(Some(key));
        }
        self.context_changed();
        Ok(())
    }

    /// Selects a tree node, making its path the active context.
    ///
    /// Returns the page to navigate to, if it differs from the current one.
    pub fn select_tree_node(&mut self, key: NodeKey) -> Result<Option<u32>> {
        if let Err(conflict) = self.check_lockout("select tree node") {
            self.publish(AppEvent::Annotation(AnnotationEvent::ContextRefused {
                operation: "select tree node".to_string(),
            }));
            return Err(conflict.into());
        }

        let Some(path) = self.tree.path(key) else {
            return Ok(None);
        };
        self.context.select_tree_path(&path);
        self.tree.select(Some(key));
        self.tree.expand_path(key);
        self.context_changed();

        Ok(self
            .tree
            .navigation_target(key, self.view.view_type, self.page_number))
    }

    pub fn clear_context(&mut self) -> Result<()> {
        self.check_lockout("clear context")?;
        self.context.clear();
        self.interaction.clear_draw_mode();
        self.tree.select(None);
        self.context_changed();
        Ok(())
    }

    fn context_changed(&self) {
        let label = self.context.label();
        let draw_tool = self.context.enabled_draw_tool().to_string();
        tracing::debug!("Context: {} (draws {})", label, draw_tool);
        self.publish(AppEvent::Annotation(AnnotationEvent::ContextChanged {
            label,
            draw_tool,
        }));
    }

    /// Whether drawing a location is allowed: a room is isolated or active.
    pub fn can_draw_location(&self) -> bool {
        self.isolation.level().is_some() || self.context.room_id().is_some()
    }

    /// Whether drawing `kind` is allowed in the current context.
    pub fn can_draw(&self, kind: AnnotationType) -> bool {
        use crate::visibility::IsolationLevel;
        match kind {
            AnnotationType::Room => true,
            AnnotationType::Location => self.can_draw_location(),
            AnnotationType::CabinetRun | AnnotationType::Cabinet => {
                matches!(
                    self.isolation.level(),
                    Some(IsolationLevel::Location | IsolationLevel::CabinetRun)
                ) || (self.context.room_id().is_some() && self.context.location_id().is_some())
            }
        }
    }

    pub fn undo(&mut self) -> Result<Option<String>> {
        self.check_lockout("undo")?;
        let label = self.history.undo(&mut self.store);
        if label.is_some() {
            self.after_replay();
        }
        Ok(label)
    }

    pub fn redo(&mut self) -> Result<Option<String>> {
        self.check_lockout("redo")?;
        let label = self.history.redo(&mut self.store);
        if label.is_some() {
            self.after_replay();
        }
        Ok(label)
    }

    fn after_replay(&mut self) {
        self.store.refresh_layout(&self.coords);
        self.recompute_hidden();
        if self.isolation.is_isolated() {
            self.rebuild_mask();
        }
    }
}

impl std::fmt::Debug for AnnotatorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotatorSession")
            .field("page_id", &self.page_id)
            .field("page_number", &self.page_number)
            .field("annotations", &self.store.len())
            .field("isolation", &self.isolation.level())
            .field("lockout", self.lockout.state())
            .finish()
    }
}

/// Tree node an annotation stands for, if it is linked.
fn tree_key(annotation: &Annotation) -> Option<NodeKey> {
    let kind = match annotation.kind() {
        AnnotationType::Room => TreeNodeKind::Room,
        AnnotationType::Location => TreeNodeKind::RoomLocation,
        AnnotationType::CabinetRun => TreeNodeKind::CabinetRun,
        AnnotationType::Cabinet => TreeNodeKind::Cabinet,
    };
    annotation
        .refs
        .own_entity()
        .map(|id| NodeKey::new(kind, id))
}
