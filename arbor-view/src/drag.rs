use std::time::{Duration, Instant};

use arbor_tree::{FlatNode, NodeId, Placement, Result, TreeError, TreeStore};
use serde::Deserialize;

use crate::expansion::{ExpansionView, expand_descendants};

/// How a completed drop relocates the dragged node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveStrategy {
    /// Detach and reattach the subtree, keeping every id.
    #[default]
    Relocate,
    /// Paste a deep copy at the target, then delete the source.
    ///
    /// The moved subtree gets fresh ids. If the delete misses, the copy
    /// stays and nothing is reported.
    ///
    /// Unlike a plain paste, a drop into the source's own subtree is
    /// rejected with [`TreeError::MoveIntoDescendant`]: the copy would land
    /// inside the source and be deleted along with it.
    CopyThenDelete,
}

/// Configuration knobs for [`DragController`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DragOptions {
    /// Hover time over a collapsed row before it expands.
    pub expand_dwell_ms: u64,
    /// Share of a row's height at the top and bottom that means
    /// "above" / "below" instead of "inside".
    ///
    /// Clamped to `0.0..=0.5` when classifying; NaN counts as `0.0`.
    pub edge_fraction: f32,
    pub move_strategy: MoveStrategy,
}

impl Default for DragOptions {
    fn default() -> Self {
        Self {
            expand_dwell_ms: 300,
            edge_fraction: 0.25,
            move_strategy: MoveStrategy::default(),
        }
    }
}

impl DragOptions {
    pub fn expand_dwell(&self) -> Duration {
        Duration::from_millis(self.expand_dwell_ms)
    }
}

/// Where a drop lands relative to the hovered row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropZone {
    Above,
    Inside,
    Below,
}

impl DropZone {
    /// Classify a pointer at `offset_y` within a row `height` tall.
    ///
    /// Ratios outside `0..=1` (and a zero height) fall through to
    /// [`DropZone::Inside`]. `edge_fraction` is clamped to `0.0..=0.5` so
    /// the edge bands never overlap.
    pub fn classify(offset_y: f32, height: f32, edge_fraction: f32) -> Self {
        let edge = if edge_fraction.is_nan() {
            0.0
        } else {
            edge_fraction.clamp(0.0, 0.5)
        };
        let ratio = offset_y / height;
        if (0.0..=edge).contains(&ratio) {
            Self::Above
        } else if ((1.0 - edge)..=1.0).contains(&ratio) {
            Self::Below
        } else {
            Self::Inside
        }
    }
}

impl From<DropZone> for Placement {
    fn from(zone: DropZone) -> Self {
        match zone {
            DropZone::Above => Placement::Above,
            DropZone::Inside => Placement::Inside,
            DropZone::Below => Placement::Below,
        }
    }
}

/// Styling hint for a row while a drag is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowHint {
    None,
    DragSource,
    DropAbove,
    DropBelow,
    DropInside,
}

#[derive(Debug, Clone)]
struct HoverState {
    target: NodeId,
    since: Instant,
    zone: DropZone,
}

#[derive(Debug, Clone, Default)]
enum DragPhase {
    #[default]
    Idle,
    Dragging {
        source: NodeId,
        hover: Option<HoverState>,
    },
}

/// Turns pointer drag gestures over flat rows into store mutations.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    options: DragOptions,
    phase: DragPhase,
}

impl DragController {
    pub fn new(options: DragOptions) -> Self {
        Self {
            options,
            phase: DragPhase::Idle,
        }
    }

    pub fn options(&self) -> &DragOptions {
        &self.options
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging { .. })
    }

    /// Node being dragged, if any.
    pub fn source(&self) -> Option<&NodeId> {
        match &self.phase {
            DragPhase::Dragging { source, .. } => Some(source),
            DragPhase::Idle => None,
        }
    }

    /// Row currently under the pointer.
    pub fn hover_target(&self) -> Option<&NodeId> {
        self.hover_state().map(|hover| &hover.target)
    }

    /// Zone computed by the latest [`DragController::hover`].
    pub fn zone(&self) -> Option<DropZone> {
        self.hover_state().map(|hover| hover.zone)
    }

    /// Begin dragging `source`, collapsing it so it cannot be dropped into
    /// its own visible children.
    pub fn start(
        &mut self,
        source: &FlatNode,
        expansion: &mut impl ExpansionView,
    ) {
        expansion.collapse(&source.id);
        log::debug!("drag started on {}", source.id);
        self.phase = DragPhase::Dragging {
            source: source.id.clone(),
            hover: None,
        };
    }

    /// Track the pointer over `target` and return the resulting zone.
    ///
    /// Staying over the same collapsed row longer than the configured dwell
    /// expands it. Returns `None` when no drag is active.
    pub fn hover(
        &mut self,
        target: &FlatNode,
        offset_y: f32,
        height: f32,
        now: Instant,
        expansion: &mut impl ExpansionView,
    ) -> Option<DropZone> {
        let zone =
            DropZone::classify(offset_y, height, self.options.edge_fraction);
        let dwell = self.options.expand_dwell();
        let DragPhase::Dragging { hover, .. } = &mut self.phase else {
            return None;
        };

        match hover {
            Some(state) if state.target == target.id => {
                state.zone = zone;
                if now.saturating_duration_since(state.since) > dwell
                    && !expansion.is_expanded(&target.id)
                {
                    log::trace!("auto-expanding {} after hover", target.id);
                    expansion.expand(&target.id);
                }
            },
            _ => {
                *hover = Some(HoverState {
                    target: target.id.clone(),
                    since: now,
                    zone,
                });
            },
        }
        Some(zone)
    }

    /// Drop onto `target` and return the id of the node now at the drop
    /// position.
    ///
    /// Dropping onto the source itself, or with no drag active, only resets
    /// the controller. Drops into the source's own subtree are rejected.
    /// The controller is idle afterwards in every case.
    pub fn drop_on(
        &mut self,
        target: &FlatNode,
        store: &mut TreeStore,
        expansion: &mut impl ExpansionView,
    ) -> Result<Option<NodeId>> {
        let DragPhase::Dragging { source, hover } =
            std::mem::take(&mut self.phase)
        else {
            return Ok(None);
        };
        if source == target.id {
            log::debug!("drag of {source} dropped onto itself");
            return Ok(None);
        }
        let zone = hover.map_or(DropZone::Inside, |hover| hover.zone);
        let placement = Placement::from(zone);

        let moved = match self.options.move_strategy {
            MoveStrategy::Relocate => {
                store.move_item(&source, &target.id, placement)?;
                source
            },
            MoveStrategy::CopyThenDelete => {
                if store.tree().is_ancestor(&source, &target.id) {
                    log::warn!("rejected drop of {source} into its subtree");
                    return Err(TreeError::MoveIntoDescendant {
                        node: source,
                        target: target.id.clone(),
                    });
                }
                let copy = store.copy_paste(&source, &target.id, placement)?;
                if let Err(err) = store.delete_item(&source) {
                    log::warn!("drop left a duplicate behind: {err}");
                }
                copy
            },
        };

        expand_descendants(expansion, store.tree(), &moved);
        Ok(Some(moved))
    }

    /// Abort the gesture without touching the tree.
    pub fn cancel(&mut self) {
        self.phase = DragPhase::Idle;
    }

    /// Styling hint for `row` given the current gesture.
    pub fn row_hint(&self, row: &FlatNode) -> RowHint {
        if self.source() == Some(&row.id) {
            return RowHint::DragSource;
        }
        match self.hover_state() {
            Some(hover) if hover.target == row.id => match hover.zone {
                DropZone::Above => RowHint::DropAbove,
                DropZone::Below => RowHint::DropBelow,
                DropZone::Inside => RowHint::DropInside,
            },
            _ => RowHint::None,
        }
    }

    fn hover_state(&self) -> Option<&HoverState> {
        match &self.phase {
            DragPhase::Dragging { hover, .. } => hover.as_ref(),
            DragPhase::Idle => None,
        }
    }
}
