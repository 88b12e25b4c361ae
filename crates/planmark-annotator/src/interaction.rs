//! Pointer gesture state machine for drawing, resizing and moving.
//!
//! The controller only tracks gesture state and computes geometry; the
//! session applies results to the store, the lockout and persistence.
//!
//! Resize and move updates are coalesced to one per animation frame and are
//! always computed from the total pointer delta against the geometry captured
//! at pointer-down, so rounding never accumulates across frames.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use planmark_core::{AnnotationId, ValidationError};

use crate::geometry::{LayoutPoint, LayoutRect};
use crate::model::AnnotationType;

/// Gesture thresholds and timing.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionConfig {
    /// Smallest side, in layout pixels, a drawn or resized region may have.
    pub min_draw_size: f64,
    /// Changes at or below this many pixels are treated as click jitter.
    pub min_adjust_delta: f64,
    /// Quiet period before a committed resize or move is saved.
    pub save_debounce: Duration,
    /// Poll interval for refreshes deferred by the lockout.
    pub refresh_poll: Duration,
    /// How long a refused duplicate stays highlighted.
    pub duplicate_highlight: Duration,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            min_draw_size: 20.0,
            min_adjust_delta: 2.0,
            save_debounce: Duration::from_millis(1000),
            refresh_poll: Duration::from_millis(100),
            duplicate_highlight: Duration::from_millis(2000),
        }
    }
}

/// One of the eight resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::N,
        ResizeHandle::Ne,
        ResizeHandle::E,
        ResizeHandle::Se,
        ResizeHandle::S,
        ResizeHandle::Sw,
        ResizeHandle::W,
        ResizeHandle::Nw,
    ];

    /// CSS cursor for hovering this handle.
    pub fn cursor(&self) -> &'static str {
        match self {
            ResizeHandle::N => "n-resize",
            ResizeHandle::Ne => "ne-resize",
            ResizeHandle::E => "e-resize",
            ResizeHandle::Se => "se-resize",
            ResizeHandle::S => "s-resize",
            ResizeHandle::Sw => "sw-resize",
            ResizeHandle::W => "w-resize",
            ResizeHandle::Nw => "nw-resize",
        }
    }

    fn moves_top(&self) -> bool {
        matches!(self, ResizeHandle::N | ResizeHandle::Ne | ResizeHandle::Nw)
    }

    fn moves_bottom(&self) -> bool {
        matches!(self, ResizeHandle::S | ResizeHandle::Se | ResizeHandle::Sw)
    }

    fn moves_left(&self) -> bool {
        matches!(self, ResizeHandle::W | ResizeHandle::Nw | ResizeHandle::Sw)
    }

    fn moves_right(&self) -> bool {
        matches!(self, ResizeHandle::E | ResizeHandle::Ne | ResizeHandle::Se)
    }

    /// Applies a total pointer delta to the captured geometry.
    pub fn apply(&self, origin: LayoutRect, dx: f64, dy: f64) -> LayoutRect {
        let mut rect = origin;
        if self.moves_left() {
            rect.x += dx;
            rect.width -= dx;
        }
        if self.moves_right() {
            rect.width += dx;
        }
        if self.moves_top() {
            rect.y += dy;
            rect.height -= dy;
        }
        if self.moves_bottom() {
            rect.height += dy;
        }
        rect
    }
}

/// Kind of adjustment gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdjustKind {
    Resize(ResizeHandle),
    Move,
}

impl fmt::Display for AdjustKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdjustKind::Resize(_) => write!(f, "resize"),
            AdjustKind::Move => write!(f, "move"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Adjustment {
    id: AnnotationId,
    kind: AdjustKind,
    anchor: LayoutPoint,
    origin: LayoutRect,
    current: LayoutRect,
    pending: Option<LayoutPoint>,
}

/// Current gesture.
#[derive(Debug, Clone, PartialEq, Default)]
enum Gesture {
    #[default]
    Idle,
    Drawing {
        kind: AnnotationType,
        start: LayoutPoint,
        current: LayoutPoint,
    },
    Adjusting(Adjustment),
}

/// Effect of a pointer-move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerUpdate {
    /// Draw preview changed.
    Preview(LayoutRect),
    /// An animation frame should be requested to apply the update.
    FrameRequested,
    /// Folded into the frame already requested.
    Coalesced,
    /// No gesture is active.
    Ignored,
}

/// Result of pointer-up.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// A new region was drawn.
    Drawn {
        kind: AnnotationType,
        rect: LayoutRect,
    },
    /// A resize or move passed its threshold.
    Committed {
        id: AnnotationId,
        kind: AdjustKind,
        origin: LayoutRect,
        rect: LayoutRect,
    },
    /// The gesture fell below its threshold. `restore` is the exact geometry
    /// to put back for adjustments.
    Cancelled {
        id: Option<AnnotationId>,
        restore: Option<LayoutRect>,
        reason: ValidationError,
    },
    /// No gesture was active.
    Idle,
}

/// Tracks one pointer gesture at a time.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    config: InteractionConfig,
    draw_mode: Option<AnnotationType>,
    gesture: Gesture,
    frame_requested: bool,
}

impl InteractionController {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn draw_mode(&self) -> Option<AnnotationType> {
        self.draw_mode
    }

    /// Selects a draw mode; selecting the active mode again turns it off.
    pub fn toggle_draw_mode(&mut self, kind: AnnotationType) -> Option<AnnotationType> {
        self.draw_mode = if self.draw_mode == Some(kind) {
            None
        } else {
            Some(kind)
        };
        self.draw_mode
    }

    pub fn clear_draw_mode(&mut self) {
        self.draw_mode = None;
    }

    pub fn is_idle(&self) -> bool {
        self.gesture == Gesture::Idle
    }

    /// Name of the active gesture, if any.
    pub fn active_gesture(&self) -> Option<&'static str> {
        match &self.gesture {
            Gesture::Idle => None,
            Gesture::Drawing { .. } => Some("draw"),
            Gesture::Adjusting(adj) => Some(match adj.kind {
                AdjustKind::Resize(_) => "resize",
                AdjustKind::Move => "move",
            }),
        }
    }

    /// Annotation targeted by the active resize or move.
    pub fn active_annotation(&self) -> Option<AnnotationId> {
        match &self.gesture {
            Gesture::Adjusting(adj) => Some(adj.id),
            _ => None,
        }
    }

    fn ensure_idle(&self) -> Result<(), ValidationError> {
        match self.active_gesture() {
            None => Ok(()),
            Some(active) => Err(ValidationError::GestureInProgress {
                active: active.to_string(),
            }),
        }
    }

    /// Starts drawing at `point` using the active draw mode.
    pub fn begin_draw(&mut self, point: LayoutPoint) -> Result<AnnotationType, ValidationError> {
        self.ensure_idle()?;
        let kind = self.draw_mode.ok_or_else(|| ValidationError::MissingContext {
            required: "draw mode".to_string(),
        })?;
        self.gesture = Gesture::Drawing {
            kind,
            start: point,
            current: point,
        };
        tracing::debug!("Draw {} started at ({:.1}, {:.1})", kind, point.x, point.y);
        Ok(kind)
    }

    /// Starts resizing or moving an annotation whose current geometry is `origin`.
    pub fn begin_adjust(
        &mut self,
        id: AnnotationId,
        kind: AdjustKind,
        pointer: LayoutPoint,
        origin: LayoutRect,
    ) -> Result<(), ValidationError> {
        self.ensure_idle()?;
        self.gesture = Gesture::Adjusting(Adjustment {
            id,
            kind,
            anchor: pointer,
            origin,
            current: origin,
            pending: None,
        });
        self.frame_requested = false;
        tracing::debug!("{} of {} started", kind, id);
        Ok(())
    }

    /// Live preview of the rectangle being drawn.
    pub fn preview(&self) -> Option<LayoutRect> {
        match &self.gesture {
            Gesture::Drawing { start, current, .. } => {
                Some(LayoutRect::from_corners(*start, *current))
            }
            _ => None,
        }
    }

    pub fn pointer_move(&mut self, point: LayoutPoint) -> PointerUpdate {
        match &mut self.gesture {
            Gesture::Idle => PointerUpdate::Ignored,
            Gesture::Drawing { start, current, .. } => {
                *current = point;
                PointerUpdate::Preview(LayoutRect::from_corners(*start, point))
            }
            Gesture::Adjusting(adj) => {
                adj.pending = Some(point);
                if self.frame_requested {
                    PointerUpdate::Coalesced
                } else {
                    self.frame_requested = true;
                    PointerUpdate::FrameRequested
                }
            }
        }
    }

    /// Applies the latest pointer position of this frame.
    ///
    /// Returns the new geometry to show, or `None` when there was nothing to
    /// apply or a resize would shrink a side below the minimum (that frame
    /// is skipped, not clamped).
    pub fn animation_frame(&mut self) -> Option<(AnnotationId, LayoutRect)> {
        self.frame_requested = false;
        let min_size = self.config.min_draw_size;
        let Gesture::Adjusting(adj) = &mut self.gesture else {
            return None;
        };
        let pointer = adj.pending.take()?;
        let next = adjusted_geometry(adj, pointer, min_size)?;
        adj.current = next;
        Some((adj.id, next))
    }

    /// Ends the gesture at `point`.
    pub fn pointer_up(&mut self, point: LayoutPoint) -> GestureOutcome {
        self.frame_requested = false;
        let gesture = std::mem::take(&mut self.gesture);
        match gesture {
            Gesture::Idle => GestureOutcome::Idle,
            Gesture::Drawing { kind, start, .. } => {
                let rect = LayoutRect::from_corners(start, point);
                let minimum = self.config.min_draw_size;
                if rect.width < minimum || rect.height < minimum {
                    tracing::debug!(
                        "Draw cancelled: {:.1}x{:.1} below minimum",
                        rect.width,
                        rect.height
                    );
                    return GestureOutcome::Cancelled {
                        id: None,
                        restore: None,
                        reason: ValidationError::BelowMinimumSize {
                            width: rect.width,
                            height: rect.height,
                            minimum,
                        },
                    };
                }
                GestureOutcome::Drawn { kind, rect }
            }
            Gesture::Adjusting(mut adj) => {
                if let Some(final_rect) = adjusted_geometry(&adj, point, self.config.min_draw_size)
                {
                    adj.current = final_rect;
                }

                let delta = match adj.kind {
                    AdjustKind::Resize(_) => (adj.current.width - adj.origin.width)
                        .abs()
                        .max((adj.current.height - adj.origin.height).abs()),
                    AdjustKind::Move => (adj.current.x - adj.origin.x)
                        .abs()
                        .max((adj.current.y - adj.origin.y).abs()),
                };

                let minimum = self.config.min_adjust_delta;
                if delta > minimum {
                    GestureOutcome::Committed {
                        id: adj.id,
                        kind: adj.kind,
                        origin: adj.origin,
                        rect: adj.current,
                    }
                } else {
                    tracing::debug!("{} of {} cancelled: {:.1}px", adj.kind, adj.id, delta);
                    GestureOutcome::Cancelled {
                        id: Some(adj.id),
                        restore: Some(adj.origin),
                        reason: ValidationError::BelowMinimumDelta { delta, minimum },
                    }
                }
            }
        }
    }

    /// Abandons the active gesture, returning geometry to restore.
    pub fn cancel(&mut self) -> Option<(AnnotationId, LayoutRect)> {
        self.frame_requested = false;
        match std::mem::take(&mut self.gesture) {
            Gesture::Adjusting(adj) => Some((adj.id, adj.origin)),
            _ => None,
        }
    }
}

fn adjusted_geometry(adj: &Adjustment, pointer: LayoutPoint, min_size: f64) -> Option<LayoutRect> {
    let dx = pointer.x - adj.anchor.x;
    let dy = pointer.y - adj.anchor.y;
    match adj.kind {
        AdjustKind::Move => Some(adj.origin.translated(dx, dy)),
        AdjustKind::Resize(handle) => {
            let next = handle.apply(adj.origin, dx, dy);
            (next.width >= min_size && next.height >= min_size).then_some(next)
        }
    }
}
