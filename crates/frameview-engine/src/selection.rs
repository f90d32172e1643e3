//! Interactive region selection.
//!
//! Models the drag-to-select flow a host UI drives: begin anchors the
//! drag, updates move the opposite corner, commit normalizes the
//! rectangle into a [`CaptureRegion`]. Inverted drags (up or left from
//! the anchor) are normalized, never rejected; only a zero-area drag
//! fails to commit.

use frameview_types::CaptureRegion;
use tracing::debug;

/// Where the selection flow currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    /// No drag in progress.
    Idle,

    /// Dragging from `anchor` to `current`, in virtual desktop
    /// coordinates.
    Selecting {
        anchor: (i32, i32),
        current: (i32, i32),
    },

    /// A region was produced and awaits pickup.
    Committed(CaptureRegion),

    /// The drag was abandoned.
    Cancelled,
}

/// Drag-to-select state machine.
#[derive(Debug)]
pub struct RegionSelection {
    state: SelectionState,
}

impl RegionSelection {
    pub fn new() -> Self {
        Self {
            state: SelectionState::Idle,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Anchor a new drag at `(x, y)`. Restarts any previous flow.
    pub fn begin(&mut self, x: i32, y: i32) {
        self.state = SelectionState::Selecting {
            anchor: (x, y),
            current: (x, y),
        };
    }

    /// Move the drag's opposite corner. Ignored outside a drag.
    pub fn update(&mut self, x: i32, y: i32) {
        if let SelectionState::Selecting { current, .. } = &mut self.state {
            *current = (x, y);
        }
    }

    /// Finish the drag. Returns the normalized region, or `None` for a
    /// zero-area drag (which cancels the flow) or when no drag was in
    /// progress.
    pub fn commit(&mut self) -> Option<CaptureRegion> {
        let SelectionState::Selecting { anchor, current } = self.state else {
            return None;
        };

        let x = anchor.0.min(current.0);
        let y = anchor.1.min(current.1);
        let width = anchor.0.abs_diff(current.0);
        let height = anchor.1.abs_diff(current.1);

        match CaptureRegion::new(x, y, width, height) {
            Ok(region) => {
                debug!(?region, "region selection committed");
                self.state = SelectionState::Committed(region);
                Some(region)
            }
            Err(_) => {
                debug!("zero-area selection discarded");
                self.state = SelectionState::Cancelled;
                None
            }
        }
    }

    /// Abandon the flow from any state.
    pub fn cancel(&mut self) {
        if !matches!(self.state, SelectionState::Idle) {
            self.state = SelectionState::Cancelled;
        }
    }

    /// Take a committed region, returning the machine to idle.
    pub fn take_committed(&mut self) -> Option<CaptureRegion> {
        if let SelectionState::Committed(region) = self.state {
            self.state = SelectionState::Idle;
            Some(region)
        } else {
            None
        }
    }
}

impl Default for RegionSelection {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_drag_commits_normalized_region() {
        let mut selection = RegionSelection::new();
        selection.begin(10, 20);
        selection.update(110, 220);
        let region = selection.commit().unwrap();
        assert_eq!((region.x, region.y), (10, 20));
        assert_eq!((region.width, region.height), (100, 200));
        assert_eq!(selection.take_committed(), Some(region));
        assert_eq!(*selection.state(), SelectionState::Idle);
    }

    #[test]
    fn inverted_drag_is_normalized() {
        let mut selection = RegionSelection::new();
        selection.begin(300, 400);
        selection.update(100, 150);
        let region = selection.commit().unwrap();
        assert_eq!((region.x, region.y), (100, 150));
        assert_eq!((region.width, region.height), (200, 250));
    }

    #[test]
    fn zero_area_drag_cancels() {
        let mut selection = RegionSelection::new();
        selection.begin(50, 50);
        assert!(selection.commit().is_none());
        assert_eq!(*selection.state(), SelectionState::Cancelled);
        assert!(selection.take_committed().is_none());
    }

    #[test]
    fn cancel_abandons_the_drag() {
        let mut selection = RegionSelection::new();
        selection.begin(0, 0);
        selection.update(10, 10);
        selection.cancel();
        assert_eq!(*selection.state(), SelectionState::Cancelled);
        assert!(selection.commit().is_none());
    }

    #[test]
    fn update_outside_a_drag_is_ignored() {
        let mut selection = RegionSelection::new();
        selection.update(5, 5);
        assert_eq!(*selection.state(), SelectionState::Idle);
        assert!(selection.commit().is_none());
    }

    #[test]
    fn begin_restarts_a_previous_flow() {
        let mut selection = RegionSelection::new();
        selection.begin(0, 0);
        selection.update(10, 10);
        selection.commit().unwrap();
        selection.begin(5, 5);
        assert!(matches!(
            selection.state(),
            SelectionState::Selecting { anchor: (5, 5), .. }
        ));
    }
}
