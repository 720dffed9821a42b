//! View transform: pan/zoom math between screen and world coordinates.
//!
//! A screen point `s` maps to world point `w = (s - pan) / zoom`. Zoom is
//! always clamped to [`MIN_ZOOM`, `MAX_ZOOM`] before it is stored; nothing
//! here errors, out-of-range requests saturate.

use kurbo::{Affine, Point, Vec2};

pub const MIN_ZOOM: f64 = 0.25;
pub const MAX_ZOOM: f64 = 2.0;

/// Increment used by the zoom-in / zoom-out controls.
pub const ZOOM_STEP: f64 = 0.25;

/// Discrete zoom levels offered by the zoom menu.
pub const ZOOM_PRESETS: [f64; 6] = [0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

const PRESET_TOLERANCE: f64 = 0.05;

/// Offset from the viewport center used when quick-adding a node, so a
/// default-sized note lands centered.
const QUICK_ADD_OFFSET: Vec2 = Vec2::new(140.0, 90.0);

/// Clamp a raw zoom factor into the supported range.
///
/// NaN collapses to the lower bound.
pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        return MIN_ZOOM;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Pan and zoom of a canvas view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub zoom: f64,
    pub pan: Vec2,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform {
        zoom: 1.0,
        pan: Vec2::ZERO,
    };

    pub fn new(zoom: f64, pan_x: f64, pan_y: f64) -> Self {
        Self {
            zoom,
            pan: Vec2::new(pan_x, pan_y),
        }
    }

    /// The world → screen affine: scale by zoom, then translate by pan.
    pub fn to_affine(&self) -> Affine {
        Affine::translate(self.pan) * Affine::scale(self.zoom)
    }

    pub fn world_from_screen(&self, screen: Point) -> Point {
        ((screen - self.pan).to_vec2() / self.zoom).to_point()
    }

    pub fn screen_from_world(&self, world: Point) -> Point {
        self.to_affine() * world
    }

    /// Change zoom while keeping the world point under `pivot` (screen
    /// coordinates) visually fixed. The requested zoom is clamped first.
    pub fn zoomed_at(&self, pivot: Point, new_zoom: f64) -> ViewTransform {
        let new_zoom = clamp_zoom(new_zoom);
        ViewTransform {
            zoom: new_zoom,
            pan: zoom_at(pivot, self.zoom, new_zoom, self.pan),
        }
    }

    /// World-space origin for a node quick-added at the viewport center.
    pub fn quick_add_origin(&self, viewport_width: f64, viewport_height: f64) -> Point {
        let center = Point::new(viewport_width / 2.0, viewport_height / 2.0);
        self.world_from_screen(center) - QUICK_ADD_OFFSET
    }

    /// The preset the current zoom sits on, if any.
    pub fn preset(&self) -> Option<f64> {
        ZOOM_PRESETS
            .into_iter()
            .find(|p| (p - self.zoom).abs() < PRESET_TOLERANCE)
    }
}

/// `(screen - pan) / zoom`, per axis.
pub fn world_from_screen(screen_x: f64, screen_y: f64, pan_x: f64, pan_y: f64, zoom: f64) -> (f64, f64) {
    let p = ViewTransform::new(zoom, pan_x, pan_y).world_from_screen(Point::new(screen_x, screen_y));
    (p.x, p.y)
}

/// New pan after zooming from `old_zoom` to `new_zoom` around `pivot`:
/// `pivot - (pivot - old_pan) * (new_zoom / old_zoom)`.
pub fn zoom_at(pivot: Point, old_zoom: f64, new_zoom: f64, old_pan: Vec2) -> Vec2 {
    let factor = new_zoom / old_zoom;
    let pivot = pivot.to_vec2();
    pivot - (pivot - old_pan) * factor
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn clamp_saturates_at_bounds() {
        assert_eq!(clamp_zoom(3.0), 2.0);
        assert_eq!(clamp_zoom(-1.0), 0.25);
        assert_eq!(clamp_zoom(1.3), 1.3);
        assert_eq!(clamp_zoom(f64::NAN), 0.25);
        assert_eq!(clamp_zoom(f64::INFINITY), 2.0);
    }

    #[test]
    fn world_from_screen_inverts_pan_and_zoom() {
        let (x, y) = world_from_screen(300.0, 150.0, 100.0, 50.0, 2.0);
        assert_eq!((x, y), (100.0, 50.0));

        let view = ViewTransform::new(0.5, -20.0, 40.0);
        let world = Point::new(12.0, -8.0);
        let back = view.world_from_screen(view.screen_from_world(world));
        assert!((back - world).hypot() < EPS);
    }

    #[test]
    fn zoom_at_keeps_pivot_fixed() {
        let view = ViewTransform::IDENTITY;
        let pivot = Point::new(100.0, 100.0);
        let before = view.world_from_screen(pivot);

        let zoomed = view.zoomed_at(pivot, 2.0);
        assert_eq!(zoomed.zoom, 2.0);
        assert_eq!(zoomed.pan, Vec2::new(-100.0, -100.0));
        let after = zoomed.world_from_screen(pivot);
        assert!((after - before).hypot() < EPS);
    }

    #[test]
    fn zoomed_at_clamps_request() {
        let view = ViewTransform::new(1.5, 10.0, 10.0);
        let pivot = Point::new(400.0, 300.0);
        let before = view.world_from_screen(pivot);
        let zoomed = view.zoomed_at(pivot, 9.0);
        assert_eq!(zoomed.zoom, MAX_ZOOM);
        assert!((zoomed.world_from_screen(pivot) - before).hypot() < EPS);
    }

    #[test]
    fn quick_add_origin_centers_default_note() {
        let view = ViewTransform::new(2.0, 100.0, 0.0);
        let origin = view.quick_add_origin(1200.0, 800.0);
        assert_eq!(origin, Point::new(250.0 - 140.0, 200.0 - 90.0));
    }

    #[test]
    fn preset_detection() {
        assert_eq!(ViewTransform::new(1.26, 0.0, 0.0).preset(), Some(1.25));
        assert_eq!(ViewTransform::new(0.3, 0.0, 0.0).preset(), None);
    }
}
