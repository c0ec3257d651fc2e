//! Viewport engine: pan offset, zoom scale, grid-to-screen recentering and
//! the recenter animation. Raw pointer/touch/wheel events arrive already
//! normalized as [`InputEvent`]s; scheduling (the frame loop) lives in the
//! component layer, which feeds elapsed time into [`Camera::advance_anim`].

use crate::state::bounds::{CELL_PX, GridBounds};

pub const MIN_ZOOM: f64 = 0.2;
pub const MAX_ZOOM: f64 = 5.0;

/// Normalized viewport input. Components translate DOM events into these;
/// any of them cancels an in-flight recenter animation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    DragStart { x: f64, y: f64 },
    DragMove { x: f64, y: f64 },
    DragEnd,
    /// Two-finger pinch step: midpoint in viewport pixels plus the ratio of
    /// the current finger distance to the previous one.
    PinchUpdate { cx: f64, cy: f64, factor: f64 },
    WheelScroll { x: f64, y: f64, delta_y: f64 },
}

/// A single in-flight recenter interpolation. Offsets ease from `from` to
/// `to` over `duration_ms`; the caller accumulates elapsed time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Recenter {
    pub from_x: f64,
    pub from_y: f64,
    pub to_x: f64,
    pub to_y: f64,
    pub duration_ms: f64,
    pub elapsed_ms: f64,
}

impl Recenter {
    /// Offset at `elapsed_ms` into the animation plus a completion flag.
    pub fn offset_at(&self, elapsed_ms: f64) -> (f64, f64, bool) {
        let t = if self.duration_ms > 0.0 {
            (elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let e = ease_in_out_cubic(t);
        (
            self.from_x + (self.to_x - self.from_x) * e,
            self.from_y + (self.to_y - self.from_y) * e,
            t >= 1.0,
        )
    }
}

fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub zoom: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub panning: bool,
    pub last_x: f64,
    pub last_y: f64,
    pub initialized: bool,
    /// Bounds the current offsets were computed against; updated through
    /// [`Camera::apply_bounds`] so growth never shifts visible content.
    pub bounds: Option<GridBounds>,
    pub anim: Option<Recenter>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            panning: false,
            last_x: 0.0,
            last_y: 0.0,
            initialized: false,
            bounds: None,
            anim: None,
        }
    }
}

impl Camera {
    /// Pure input transition. Every gesture cancels the recenter animation
    /// before it mutates anything else.
    pub fn apply(&mut self, ev: InputEvent) {
        self.anim = None;
        match ev {
            InputEvent::DragStart { x, y } => {
                self.panning = true;
                self.last_x = x - self.offset_x;
                self.last_y = y - self.offset_y;
            }
            InputEvent::DragMove { x, y } => {
                if self.panning {
                    self.offset_x = x - self.last_x;
                    self.offset_y = y - self.last_y;
                }
            }
            InputEvent::DragEnd => {
                self.panning = false;
            }
            InputEvent::PinchUpdate { cx, cy, factor } => {
                self.zoom_at(cx, cy, factor);
            }
            InputEvent::WheelScroll { x, y, delta_y } => {
                self.zoom_at(x, y, (-delta_y * 0.001).exp());
            }
        }
    }

    /// Scale by `factor` (clamped into `[MIN_ZOOM, MAX_ZOOM]`) while keeping
    /// the viewport point `(cx, cy)` over the same grid position.
    pub fn zoom_at(&mut self, cx: f64, cy: f64, factor: f64) {
        let old = self.zoom;
        let new = (old * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        if new == old {
            return;
        }
        let world_x = (cx - self.offset_x) / old;
        let world_y = (cy - self.offset_y) / old;
        self.zoom = new;
        self.offset_x = cx - world_x * new;
        self.offset_y = cy - world_y * new;
    }

    /// Store newly computed bounds, first compensating the offsets so cells
    /// that were already on screen do not jump when the range grows.
    pub fn apply_bounds(&mut self, new: GridBounds) {
        if let Some(old) = self.bounds {
            if new != old {
                let (dx, dy) = new.shift_from(&old, self.zoom);
                self.offset_x += dx;
                self.offset_y -= dy;
            }
        }
        self.bounds = Some(new);
    }

    /// Offset that would center `coord` in a `vw` x `vh` viewport, from the
    /// currently stored bounds.
    pub fn recenter_target(&self, coord: (i32, i32), vw: f64, vh: f64) -> Option<(f64, f64)> {
        let bounds = self.bounds?;
        let (ox, oy) = bounds.cell_origin(coord.0, coord.1);
        let px = (ox + CELL_PX / 2.0) * self.zoom;
        let py = (oy + CELL_PX / 2.0) * self.zoom;
        Some((vw / 2.0 - px, vh / 2.0 - py))
    }

    /// Recenter on a grid coordinate, either snapping immediately or easing
    /// over `duration_ms`. Starting a new animation replaces any running one.
    pub fn recenter(&mut self, coord: (i32, i32), vw: f64, vh: f64, immediate: bool, duration_ms: f64) {
        let Some((tx, ty)) = self.recenter_target(coord, vw, vh) else {
            return;
        };
        if immediate || duration_ms <= 0.0 {
            self.offset_x = tx;
            self.offset_y = ty;
            self.anim = None;
        } else {
            self.anim = Some(Recenter {
                from_x: self.offset_x,
                from_y: self.offset_y,
                to_x: tx,
                to_y: ty,
                duration_ms,
                elapsed_ms: 0.0,
            });
        }
    }

    /// Advance the recenter animation by `dt_ms`. Returns true when the
    /// offsets changed (the caller then rewrites the transform). Completion
    /// pins the offsets exactly on the target and clears the animation.
    pub fn advance_anim(&mut self, dt_ms: f64) -> bool {
        let Some(anim) = self.anim.as_mut() else {
            return false;
        };
        anim.elapsed_ms += dt_ms.max(0.0);
        let (x, y, done) = anim.offset_at(anim.elapsed_ms);
        self.offset_x = x;
        self.offset_y = y;
        if done {
            self.anim = None;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(coords: &[(i32, i32)]) -> GridBounds {
        GridBounds::compute(coords).unwrap()
    }

    #[test]
    fn drag_keeps_the_grab_point_under_the_pointer() {
        let mut cam = Camera {
            offset_x: 30.0,
            offset_y: -10.0,
            ..Camera::default()
        };
        cam.apply(InputEvent::DragStart { x: 100.0, y: 100.0 });
        assert!(cam.panning);
        cam.apply(InputEvent::DragMove { x: 140.0, y: 90.0 });
        assert_eq!(cam.offset_x, 70.0);
        assert_eq!(cam.offset_y, -20.0);
        cam.apply(InputEvent::DragEnd);
        assert!(!cam.panning);
        // Moves without a press do nothing.
        cam.apply(InputEvent::DragMove { x: 500.0, y: 500.0 });
        assert_eq!(cam.offset_x, 70.0);
    }

    #[test]
    fn zoom_keeps_the_anchor_point_fixed() {
        let mut cam = Camera {
            offset_x: 50.0,
            offset_y: 20.0,
            zoom: 1.0,
            ..Camera::default()
        };
        let (ax, ay) = (320.0, 240.0);
        let world_before = ((ax - cam.offset_x) / cam.zoom, (ay - cam.offset_y) / cam.zoom);
        cam.zoom_at(ax, ay, 1.5);
        let world_after = ((ax - cam.offset_x) / cam.zoom, (ay - cam.offset_y) / cam.zoom);
        assert!((world_before.0 - world_after.0).abs() < 1e-9);
        assert!((world_before.1 - world_after.1).abs() < 1e-9);
        assert_eq!(cam.zoom, 1.5);
    }

    #[test]
    fn zoom_clamps_to_range() {
        let mut cam = Camera::default();
        for _ in 0..50 {
            cam.apply(InputEvent::PinchUpdate { cx: 0.0, cy: 0.0, factor: 2.0 });
        }
        assert_eq!(cam.zoom, MAX_ZOOM);
        for _ in 0..50 {
            cam.apply(InputEvent::WheelScroll { x: 0.0, y: 0.0, delta_y: 800.0 });
        }
        assert_eq!(cam.zoom, MIN_ZOOM);
    }

    #[test]
    fn wheel_direction_maps_to_zoom_sign() {
        let mut cam = Camera::default();
        cam.apply(InputEvent::WheelScroll { x: 0.0, y: 0.0, delta_y: -200.0 });
        assert!(cam.zoom > 1.0);
        let mut cam = Camera::default();
        cam.apply(InputEvent::WheelScroll { x: 0.0, y: 0.0, delta_y: 200.0 });
        assert!(cam.zoom < 1.0);
    }

    #[test]
    fn first_bounds_store_without_compensation() {
        let mut cam = Camera::default();
        cam.apply_bounds(bounds(&[(0, 0), (1, 1)]));
        assert_eq!(cam.offset_x, 0.0);
        assert_eq!(cam.offset_y, 0.0);
        assert!(cam.bounds.is_some());
    }

    #[test]
    fn growing_max_y_compensates_offset_exactly_one_cell() {
        let mut cam = Camera {
            zoom: 1.5,
            ..Camera::default()
        };
        cam.apply_bounds(bounds(&[(0, 0), (0, 1)]));
        let before = cam.offset_y;
        cam.apply_bounds(bounds(&[(0, 0), (0, 1), (0, 2)]));
        assert_eq!(cam.offset_y - before, -CELL_PX * 1.5);
        assert_eq!(cam.offset_x, 0.0);
    }

    #[test]
    fn growing_the_x_range_compensates_offset_x() {
        let mut cam = Camera::default();
        cam.apply_bounds(bounds(&[(0, 0), (1, 0)]));
        cam.apply_bounds(bounds(&[(0, 0), (2, 0)]));
        // range_min_x moved from -1 to -2: one extra column on the left.
        assert_eq!(cam.offset_x, -CELL_PX);
        assert_eq!(cam.offset_y, 0.0);
    }

    #[test]
    fn recenter_immediate_centers_the_cell() {
        let mut cam = Camera::default();
        cam.apply_bounds(bounds(&[(0, 0)]));
        cam.recenter((0, 0), 800.0, 600.0, true, 0.0);
        assert_eq!(cam.offset_x, 400.0 - CELL_PX / 2.0);
        assert_eq!(cam.offset_y, 300.0 - CELL_PX / 2.0);
        assert_eq!(cam.anim, None);
    }

    #[test]
    fn recenter_without_bounds_is_a_no_op() {
        let mut cam = Camera::default();
        cam.recenter((0, 0), 800.0, 600.0, true, 0.0);
        assert_eq!(cam.offset_x, 0.0);
        assert_eq!(cam.offset_y, 0.0);
    }

    #[test]
    fn animated_recenter_eases_and_pins_to_target() {
        let mut cam = Camera::default();
        cam.apply_bounds(bounds(&[(0, 0)]));
        cam.recenter((0, 0), 800.0, 600.0, false, 400.0);
        let anim = cam.anim.expect("animation installed");
        assert_eq!((anim.from_x, anim.from_y), (0.0, 0.0));

        // Halfway through, the cubic ease is exactly at the midpoint.
        assert!(cam.advance_anim(200.0));
        assert!((cam.offset_x - anim.to_x / 2.0).abs() < 1e-9);
        assert!((cam.offset_y - anim.to_y / 2.0).abs() < 1e-9);
        assert!(cam.anim.is_some());

        // Overshooting the duration completes and pins exactly.
        assert!(cam.advance_anim(10_000.0));
        assert_eq!(cam.offset_x, anim.to_x);
        assert_eq!(cam.offset_y, anim.to_y);
        assert_eq!(cam.anim, None);
        assert!(!cam.advance_anim(16.0));
    }

    #[test]
    fn any_gesture_cancels_the_animation() {
        let mut cam = Camera::default();
        cam.apply_bounds(bounds(&[(0, 0)]));
        cam.recenter((0, 0), 800.0, 600.0, false, 400.0);
        assert!(cam.anim.is_some());
        cam.apply(InputEvent::DragStart { x: 0.0, y: 0.0 });
        assert_eq!(cam.anim, None);

        cam.recenter((0, 0), 800.0, 600.0, false, 400.0);
        cam.apply(InputEvent::WheelScroll { x: 0.0, y: 0.0, delta_y: 10.0 });
        assert_eq!(cam.anim, None);
    }

    #[test]
    fn restarting_recenter_replaces_the_previous_animation() {
        let mut cam = Camera::default();
        cam.apply_bounds(bounds(&[(0, 0), (3, 3)]));
        cam.recenter((0, 0), 800.0, 600.0, false, 400.0);
        let first = cam.anim.unwrap();
        cam.recenter((3, 3), 800.0, 600.0, false, 250.0);
        let second = cam.anim.unwrap();
        assert_ne!(first, second);
        assert_eq!(second.duration_ms, 250.0);
    }

    #[test]
    fn ease_curve_endpoints_and_midpoint() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-12);
        // Monotone non-decreasing over the unit interval.
        let mut prev = 0.0;
        for k in 0..=100 {
            let v = ease_in_out_cubic(k as f64 / 100.0);
            assert!(v >= prev);
            prev = v;
        }
    }
}
