use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::resolver::{self, Size, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rect {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RectError {
    #[error("rect size must be positive, got {width}x{height}")]
    NonPositiveSize { width: i32, height: i32 },
    #[error("circle radius must be positive, got {radius}")]
    NonPositiveRadius { radius: i32 },
    #[error("screen size {width}x{height} exceeds the i32 coordinate range")]
    ScreenOutOfRange { width: u32, height: u32 },
    #[error("rect at ({x}, {y}) with size {width}x{height} exceeds the i32 coordinate range")]
    OutOfRange {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Result<Self, RectError> {
        if width <= 0 || height <= 0 {
            return Err(RectError::NonPositiveSize { width, height });
        }
        if x.checked_add(width).is_none() || y.checked_add(height).is_none() {
            return Err(RectError::OutOfRange {
                x,
                y,
                width,
                height,
            });
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    pub fn around_circle(cx: i32, cy: i32, radius: i32) -> Result<Self, RectError> {
        if radius <= 0 {
            return Err(RectError::NonPositiveRadius { radius });
        }
        let out_of_range = RectError::OutOfRange {
            x: cx,
            y: cy,
            width: radius,
            height: radius,
        };
        let (Some(x), Some(y), Some(size)) = (
            cx.checked_sub(radius),
            cy.checked_sub(radius),
            radius.checked_mul(2),
        ) else {
            return Err(out_of_range);
        };
        Self::new(x, y, size, size)
    }

    pub(crate) fn from_cells(x: u32, y: u32, width: u32, height: u32) -> Self {
        debug_assert!(width > 0 && height > 0);
        Self {
            x: x as i32,
            y: y as i32,
            width: width as i32,
            height: height as i32,
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> i64 {
        i64::from(self.width) * i64::from(self.height)
    }

    /// Strict overlap: shared edges do not count.
    pub fn intersects(&self, actor: &ActorBox) -> bool {
        if actor.width <= 0.0 || actor.height <= 0.0 {
            return false;
        }
        actor.x < self.right() as f32
            && actor.x + actor.width > self.x as f32
            && actor.y < self.bottom() as f32
            && actor.y + actor.height > self.y as f32
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActorBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ActorBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn at(position: Vec2, size: Size) -> Self {
        Self::new(position.x, position.y, size.width, size.height)
    }
}

#[derive(Debug, Clone)]
pub struct CollisionMapBuilder {
    width: u32,
    height: u32,
    rects: Vec<Rect>,
}

impl CollisionMapBuilder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rects: Vec::new(),
        }
    }

    pub fn add_rect(self, x: i32, y: i32, width: i32, height: i32) -> Result<Self, RectError> {
        let rect = Rect::new(x, y, width, height)?;
        Ok(self.push(rect))
    }

    pub fn add_circle(self, cx: i32, cy: i32, radius: i32) -> Result<Self, RectError> {
        let rect = Rect::around_circle(cx, cy, radius)?;
        Ok(self.push(rect))
    }

    pub fn push(mut self, rect: Rect) -> Self {
        self.rects.push(rect);
        self
    }

    pub fn extend_rects(mut self, rects: impl IntoIterator<Item = Rect>) -> Self {
        self.rects.extend(rects);
        self
    }

    pub fn rect_count(&self) -> usize {
        self.rects.len()
    }

    pub fn build(self) -> CollisionMap {
        CollisionMap {
            width: self.width,
            height: self.height,
            rects: self.rects,
            debug_enabled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollisionMap {
    width: u32,
    height: u32,
    rects: Vec<Rect>,
    debug_enabled: bool,
}

impl CollisionMap {
    pub fn empty(width: u32, height: u32) -> Self {
        CollisionMapBuilder::new(width, height).build()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn overlaps(&self, actor: &ActorBox) -> bool {
        self.rects.iter().any(|rect| rect.intersects(actor))
    }

    pub fn check(&self, x: f32, y: f32, width: f32, height: f32) -> bool {
        self.overlaps(&ActorBox::new(x, y, width, height))
    }

    pub fn resolve(
        &self,
        old_x: f32,
        old_y: f32,
        new_x: f32,
        new_y: f32,
        width: f32,
        height: f32,
    ) -> (f32, f32) {
        let resolved = resolver::resolve(
            Vec2 { x: old_x, y: old_y },
            Vec2 { x: new_x, y: new_y },
            Size { width, height },
            self,
        );
        (resolved.x, resolved.y)
    }

    pub fn debug_rects(&self) -> &[Rect] {
        &self.rects
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug_enabled
    }

    pub fn toggle_debug(&mut self) -> bool {
        self.debug_enabled = !self.debug_enabled;
        info!(
            debug_enabled = self.debug_enabled,
            rect_count = self.rects.len(),
            "collision_debug_toggled"
        );
        self.debug_enabled
    }

    pub fn debug_overlay(&self) -> DebugOverlay<'_> {
        let rects: &[Rect] = if self.debug_enabled { &self.rects } else { &[] };
        DebugOverlay {
            rects,
            style: DebugOverlayStyle::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugOverlayStyle {
    pub fill_rgb: [u8; 3],
    pub fill_alpha: u8,
    pub outline_rgb: [u8; 3],
    pub outline_width_px: u32,
}

impl Default for DebugOverlayStyle {
    fn default() -> Self {
        Self {
            fill_rgb: [255, 0, 0],
            fill_alpha: 128,
            outline_rgb: [255, 255, 0],
            outline_width_px: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugOverlay<'a> {
    pub rects: &'a [Rect],
    pub style: DebugOverlayStyle,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_with(rects: &[(i32, i32, i32, i32)]) -> CollisionMap {
        let mut builder = CollisionMapBuilder::new(100, 100);
        for &(x, y, w, h) in rects {
            builder = builder.add_rect(x, y, w, h).expect("rect");
        }
        builder.build()
    }

    #[test]
    fn add_rect_rejects_non_positive_size() {
        let err = CollisionMapBuilder::new(10, 10)
            .add_rect(0, 0, 0, 5)
            .expect_err("err");
        assert_eq!(
            err,
            RectError::NonPositiveSize {
                width: 0,
                height: 5
            }
        );
        assert!(Rect::new(1, 1, 4, -2).is_err());
    }

    #[test]
    fn circle_is_stored_as_bounding_box() {
        let map = CollisionMapBuilder::new(50, 50)
            .add_circle(20, 30, 12)
            .expect("circle")
            .build();
        assert_eq!(map.debug_rects(), &[Rect::new(8, 18, 24, 24).expect("rect")]);
        // corner of the box is inside the stored rect even though it is
        // outside the true circle
        assert!(map.check(8.5, 18.5, 1.0, 1.0));
    }

    #[test]
    fn circle_rejects_non_positive_radius() {
        let err = CollisionMapBuilder::new(10, 10)
            .add_circle(5, 5, 0)
            .expect_err("err");
        assert_eq!(err, RectError::NonPositiveRadius { radius: 0 });
    }

    #[test]
    fn rects_past_the_coordinate_range_are_rejected() {
        let err = CollisionMapBuilder::new(10, 10)
            .add_rect(i32::MAX - 5, 0, 10, 10)
            .expect_err("err");
        assert!(matches!(err, RectError::OutOfRange { .. }));
        assert!(Rect::new(0, i32::MAX, 1, 1).is_err());
        assert!(Rect::new(i32::MAX - 10, 0, 10, 1).is_ok());

        let err = CollisionMapBuilder::new(10, 10)
            .add_circle(0, 0, i32::MAX / 2 + 1)
            .expect_err("err");
        assert!(matches!(err, RectError::OutOfRange { .. }));
        assert!(Rect::around_circle(i32::MIN + 3, 0, 4).is_err());
    }

    #[test]
    fn accepted_rect_near_the_limit_can_be_queried() {
        let map = map_with(&[(i32::MAX - 20, 0, 10, 10)]);
        assert!(!map.check(0.0, 0.0, 1.0, 1.0));
        assert_eq!(map.debug_rects()[0].right(), i32::MAX - 10);
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let map = map_with(&[(10, 10, 10, 10)]);
        assert!(!map.check(0.0, 10.0, 10.0, 10.0));
        assert!(!map.check(20.0, 10.0, 5.0, 5.0));
        assert!(!map.check(10.0, 0.0, 10.0, 10.0));
        assert!(!map.check(10.0, 20.0, 10.0, 10.0));
        assert!(map.check(0.0, 10.0, 10.5, 10.0));
        assert!(map.check(12.0, 12.0, 1.0, 1.0));
    }

    #[test]
    fn negative_coordinate_walls_block() {
        let map = map_with(&[(-10, 0, 10, 100)]);
        assert!(map.check(-0.5, 50.0, 5.0, 5.0));
        assert!(!map.check(0.0, 50.0, 5.0, 5.0));
    }

    #[test]
    fn degenerate_actor_box_overlaps_nothing() {
        let map = map_with(&[(0, 0, 50, 50)]);
        assert!(!map.check(10.0, 10.0, 0.0, 10.0));
        assert!(!map.check(10.0, 10.0, 10.0, -1.0));
    }

    #[test]
    fn empty_map_never_overlaps() {
        let map = CollisionMap::empty(640, 480);
        assert!(map.is_empty());
        assert!(!map.check(0.0, 0.0, 640.0, 480.0));
    }

    #[test]
    fn debug_flag_is_per_map_and_gates_overlay() {
        let mut first = map_with(&[(0, 0, 5, 5)]);
        let second = first.clone();
        assert!(first.debug_overlay().rects.is_empty());

        assert!(first.toggle_debug());
        assert!(first.debug_enabled());
        assert!(!second.debug_enabled());
        let overlay = first.debug_overlay();
        assert_eq!(overlay.rects.len(), 1);
        assert_eq!(overlay.style.fill_rgb, [255, 0, 0]);
        assert_eq!(overlay.style.outline_width_px, 2);

        assert!(!first.toggle_debug());
        assert!(first.debug_overlay().rects.is_empty());
    }

    #[test]
    fn builder_preserves_insertion_order() {
        let map = map_with(&[(5, 5, 1, 1), (0, 0, 2, 2), (9, 9, 3, 3)]);
        let xs: Vec<i32> = map.debug_rects().iter().map(Rect::x).collect();
        assert_eq!(xs, vec![5, 0, 9]);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn rect_serializes_public_fields() {
        let rect = Rect::new(-10, 4, 10, 20).expect("rect");
        let json = serde_json::to_value(rect).expect("json");
        assert_eq!(
            json,
            serde_json::json!({"x": -10, "y": 4, "width": 10, "height": 20})
        );
        assert_eq!(rect.right(), 0);
        assert_eq!(rect.bottom(), 24);
        assert_eq!(rect.area(), 200);
    }
}
