use std::cell::Cell;
use std::f64::consts::{PI, TAU};
use std::rc::Rc;

/// Cumulative knob rotation and whether a gesture is in progress.
///
/// `container_angle` is never wrapped; several full turns keep accumulating.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DragState {
    pub is_dragging: bool,
    pub container_angle: f64,
}

impl DragState {
    /// Knob readout in `[0, 360)` degrees. Display only.
    pub fn knob_degrees(&self) -> f64 {
        self.container_angle.to_degrees().rem_euclid(360.0)
    }
}

/// The one drag state shared by the input handler and the render loop.
///
/// Clones share the same cell. Only `RotationController` writes it; readers
/// take a `snapshot` once per frame.
#[derive(Clone, Debug, Default)]
pub struct SharedDragState(Rc<Cell<DragState>>);

impl SharedDragState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> DragState {
        self.0.get()
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut DragState)) {
        let mut state = self.0.get();
        f(&mut state);
        self.0.set(state);
    }
}

/// Signed shortest difference between two angles, in `(-PI, PI]`.
pub fn normalize_angle_delta(raw: f64) -> f64 {
    if !raw.is_finite() {
        return 0.0;
    }
    let delta = raw % TAU;
    if delta > PI {
        delta - TAU
    } else if delta <= -PI {
        delta + TAU
    } else {
        delta
    }
}

/// Screen-space bounding rectangle of the rotation control.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlBounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ControlBounds {
    pub fn center(&self) -> (f64, f64) {
        (self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
}

impl PointerSample {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Pointer angle around the control center, screen coordinates (y down).
    pub fn angle_around(&self, bounds: &ControlBounds) -> f64 {
        let (cx, cy) = bounds.center();
        (self.y - cy).atan2(self.x - cx)
    }
}

/// Turns pointer drags on the knob into cumulative container rotation.
pub struct RotationController {
    state: SharedDragState,
    last_pointer_angle: Option<f64>,
}

impl RotationController {
    pub fn new(state: SharedDragState) -> Self {
        Self {
            state,
            last_pointer_angle: None,
        }
    }

    pub fn state(&self) -> &SharedDragState {
        &self.state
    }

    pub fn drag_start(&mut self, sample: PointerSample, bounds: &ControlBounds) {
        let angle = sample.angle_around(bounds);
        if !angle.is_finite() {
            return;
        }
        self.last_pointer_angle = Some(angle);
        self.state.update(|s| s.is_dragging = true);
    }

    /// Applies the normalized delta since the previous sample and returns it.
    /// `None` when no drag is in progress.
    pub fn drag_move(&mut self, sample: PointerSample, bounds: &ControlBounds) -> Option<f64> {
        let previous = self.last_pointer_angle?;
        let angle = sample.angle_around(bounds);
        if !angle.is_finite() {
            return None;
        }
        let delta = normalize_angle_delta(angle - previous);
        self.last_pointer_angle = Some(angle);
        self.state.update(|s| s.container_angle += delta);
        Some(delta)
    }

    /// Ends the gesture. The accumulated angle is kept.
    pub fn drag_end(&mut self) {
        self.last_pointer_angle = None;
        self.state.update(|s| s.is_dragging = false);
    }

    pub fn is_dragging(&self) -> bool {
        self.last_pointer_angle.is_some()
    }
}
