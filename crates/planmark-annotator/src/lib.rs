//! # Planmark Annotator
//!
//! Annotation overlay engine for paginated PDF floor plans. Users draw
//! rectangular room, location, cabinet-run and cabinet regions on a page;
//! each region links to a backend entity in a project-wide hierarchy.
//!
//! ## Core Components
//!
//! - **Coordinates**: document (PDF point) ↔ layout (CSS pixel) mapping
//! - **Store & Context**: the page's annotations, their forest and the
//!   active room/location selection
//! - **Visibility**: isolation mode and the visibility predicate
//! - **Interaction**: draw, resize and move gestures
//! - **Lockout**: cooperative guard held during gestures and pending saves
//! - **History**: snapshot undo/redo
//! - **Hierarchy**: missing-ancestor detection and entity defaults
//!
//! ## Architecture
//!
//! ```text
//! pointer events
//!   └── InteractionController ── CoordinateSpace (layout ↔ doc)
//!         └── AnnotationStore ── HistoryManager
//!               └── SaveDebouncer ── AnnotationBackend
//!
//! AnnotationStore ── IsolationState ── visible annotations + mask
//! ```
//!
//! [`AnnotatorSession`] owns all of the above for one document.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use planmark_annotator::{AnnotatorSession, MemoryBackend, SessionConfig, StaticSurface};
//!
//! let backend = Arc::new(MemoryBackend::new());
//! let mut session = AnnotatorSession::new(SessionConfig::default(), backend.clone(), backend);
//! session.attach_surface(Arc::new(StaticSurface::new(800.0, 600.0)));
//! session.load_page(PageId(1), 1, None).await?;
//! ```

pub mod context;
pub mod coordinates;
pub mod filter;
pub mod geometry;
pub mod hierarchy;
pub mod history;
pub mod host;
pub mod interaction;
pub mod lockout;
pub mod model;
pub mod persistence;
pub mod session;
pub mod store;
pub mod tree;
pub mod visibility;

pub use context::{ActiveContext, ContextEntity};
pub use coordinates::{CoordinateConfig, CoordinateSpace, RenderSurface, StaticSurface, ZoomLimits};
pub use filter::AnnotationFilter;
pub use geometry::{
    ClientRect, DocGeometry, DocPoint, DocRect, LayoutPoint, LayoutRect, NormalizedPoint,
    NormalizedRect, PageDimensions, SurfaceSize,
};
pub use hierarchy::{EntityDefaults, EntityKind, HierarchyDetector, MissingAncestor};
pub use history::{HistoryConfig, HistoryInfo, HistoryManager, HistorySnapshot};
pub use host::{EditSurface, HeadlessViewport, RecordingEditSurface, ViewportHost};
pub use interaction::{
    AdjustKind, GestureOutcome, InteractionConfig, InteractionController, PointerUpdate,
    ResizeHandle,
};
pub use lockout::{HoldReason, Lockout, LockoutState};
pub use model::{
    color_for, Annotation, AnnotationType, EntityRefs, Orientation, ViewContext, ViewType,
    FALLBACK_COLOR, HIGHLIGHT_COLOR,
};
pub use persistence::{
    AnnotationBackend, AnnotationPayload, AnnotationRecord, EntityBackend, EntityContext,
    EntityRecord, MemoryBackend, SaveDebouncer, SaveSummary,
};
pub use session::{
    AnnotatorSession, GestureResult, IsolationConfig, IsolationStep, PointerTarget, SessionConfig,
};
pub use store::{AnnotationNode, AnnotationStore};
pub use tree::{NodeKey, ProjectTree, TreeNode, TreeNodeKind, TreePage};
pub use visibility::{
    hidden_set, is_visible, mask_cutouts, passes_view_filter, Breadcrumb, IsolatedLevel,
    IsolationContext, IsolationLevel, IsolationState, MaskCutout, MaskStyle,
};
