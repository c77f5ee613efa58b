//! Viewport ↔ canvas coordinate mapping.
//!
//! The canvas is drawn at a uniform scale `s` with its top-left at a client
//! origin that moves when the host scrolls. Mapping is re-derived on every
//! event, so callers never cache canvas points across events.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    scale: f32,
    /// Client position of the canvas top-left; `None` while detached.
    origin: Option<Point>,
}

impl CoordinateMapper {
    pub fn new(scale: f32) -> Self {
        Self {
            scale,
            origin: None,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f32) -> bool {
        if !(scale.is_finite() && scale > 0.0) {
            log::warn!("ignoring display scale {scale}");
            return false;
        }
        self.scale = scale;
        true
    }

    pub fn attach(&mut self, origin_x: f32, origin_y: f32) {
        self.origin = Some(Point::new(origin_x, origin_y));
    }

    /// The surface moved (scroll, resize). No-op while detached.
    pub fn update_origin(&mut self, origin_x: f32, origin_y: f32) -> bool {
        match &mut self.origin {
            Some(o) => {
                *o = Point::new(origin_x, origin_y);
                true
            }
            None => false,
        }
    }

    pub fn detach(&mut self) {
        self.origin = None;
    }

    pub fn is_attached(&self) -> bool {
        self.origin.is_some()
    }

    pub fn to_canvas_xy(&self, client_x: f32, client_y: f32) -> Option<Point> {
        let o = self.origin?;
        Some(Point::new(
            (client_x - o.x) / self.scale,
            (client_y - o.y) / self.scale,
        ))
    }

    pub fn delta_to_canvas(&self, dx: f32, dy: f32) -> (f32, f32) {
        (dx / self.scale, dy / self.scale)
    }

    pub fn to_client(&self, p: Point) -> Option<Point> {
        let o = self.origin?;
        Some(Point::new(o.x + p.x * self.scale, o.y + p.y * self.scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_mapper_yields_nothing() {
        let m = CoordinateMapper::new(0.5);
        assert_eq!(m.to_canvas_xy(10.0, 10.0), None);
    }

    #[test]
    fn maps_through_origin_and_scale() {
        let mut m = CoordinateMapper::new(0.5);
        m.attach(100.0, 50.0);
        assert_eq!(m.to_canvas_xy(150.0, 100.0), Some(Point::new(100.0, 100.0)));
        assert_eq!(m.to_client(Point::new(100.0, 100.0)), Some(Point::new(150.0, 100.0)));
        assert_eq!(m.delta_to_canvas(10.0, -4.0), (20.0, -8.0));
    }

    #[test]
    fn scroll_moves_origin() {
        let mut m = CoordinateMapper::new(1.0);
        assert!(!m.update_origin(0.0, 0.0));
        m.attach(0.0, 0.0);
        assert!(m.update_origin(0.0, -200.0));
        assert_eq!(m.to_canvas_xy(10.0, 0.0), Some(Point::new(10.0, 200.0)));
    }

    #[test]
    fn bad_scale_is_kept_out() {
        let mut m = CoordinateMapper::new(1.0);
        assert!(!m.set_scale(0.0));
        assert_eq!(m.scale(), 1.0);
    }
}
