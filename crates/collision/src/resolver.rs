use crate::map::{ActorBox, CollisionMap};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Accepted,
    SlideHorizontal,
    SlideVertical,
    Blocked,
}

impl MoveOutcome {
    pub fn label(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::SlideHorizontal => "slide_horizontal",
            Self::SlideVertical => "slide_vertical",
            Self::Blocked => "blocked",
        }
    }
}

/// Position the actor ends up at when trying to move from `old` to `desired`.
pub fn resolve(old: Vec2, desired: Vec2, box_size: Size, map: &CollisionMap) -> Vec2 {
    resolve_with_outcome(old, desired, box_size, map).0
}

pub fn resolve_with_outcome(
    old: Vec2,
    desired: Vec2,
    box_size: Size,
    map: &CollisionMap,
) -> (Vec2, MoveOutcome) {
    if !map.overlaps(&ActorBox::at(desired, box_size)) {
        return (desired, MoveOutcome::Accepted);
    }

    let horizontal = Vec2 {
        x: desired.x,
        y: old.y,
    };
    if !map.overlaps(&ActorBox::at(horizontal, box_size)) {
        return (horizontal, MoveOutcome::SlideHorizontal);
    }

    let vertical = Vec2 {
        x: old.x,
        y: desired.y,
    };
    if !map.overlaps(&ActorBox::at(vertical, box_size)) {
        return (vertical, MoveOutcome::SlideVertical);
    }

    (old, MoveOutcome::Blocked)
}
