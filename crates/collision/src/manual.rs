use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::map::{CollisionMap, CollisionMapBuilder, RectError};

const MAGINOT_ART_WIDTH: f32 = 1536.0;
const MAGINOT_ART_HEIGHT: f32 = 1024.0;
const MAGINOT_DOOR_X: i32 = 467;
const MAGINOT_DOOR_Y: i32 = 575;
const MAGINOT_DOOR_CLEARANCE: f32 = 100.0;
const TREE_RADIUS: i32 = 12;
const EDGE_WALL_THICKNESS: i32 = 10;
const ROCK_WIDTH: i32 = 12;
const ROCK_HEIGHT: i32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MapPrimitive {
    Rect {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    Circle {
        cx: i32,
        cy: i32,
        radius: i32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualLayout {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub primitives: Vec<MapPrimitive>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualPreset {
    MaginotExterior,
    ForestPath,
}

impl ManualPreset {
    pub fn label(self) -> &'static str {
        match self {
            Self::MaginotExterior => "maginot",
            Self::ForestPath => "forest-path",
        }
    }
}

impl fmt::Display for ManualPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ManualPreset {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "maginot" => Ok(Self::MaginotExterior),
            "forest-path" => Ok(Self::ForestPath),
            other => Err(format!(
                "unknown preset '{other}' (expected maginot or forest-path)"
            )),
        }
    }
}

pub struct ManualMapBuilder {
    builder: CollisionMapBuilder,
}

impl ManualMapBuilder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            builder: CollisionMapBuilder::new(width, height),
        }
    }

    pub fn primitive(self, primitive: MapPrimitive) -> Result<Self, RectError> {
        let builder = match primitive {
            MapPrimitive::Rect {
                x,
                y,
                width,
                height,
            } => self.builder.add_rect(x, y, width, height)?,
            MapPrimitive::Circle { cx, cy, radius } => self.builder.add_circle(cx, cy, radius)?,
        };
        Ok(Self { builder })
    }

    pub fn primitives(
        self,
        primitives: impl IntoIterator<Item = MapPrimitive>,
    ) -> Result<Self, RectError> {
        primitives
            .into_iter()
            .try_fold(self, |manual, primitive| manual.primitive(primitive))
    }

    pub fn build(self) -> CollisionMap {
        self.builder.build()
    }

    pub fn from_layout(layout: &ManualLayout) -> Result<CollisionMap, RectError> {
        let map = Self::new(layout.width, layout.height)
            .primitives(layout.primitives.iter().copied())?
            .build();
        info!(
            width = layout.width,
            height = layout.height,
            rect_count = map.len(),
            "manual_layout_built"
        );
        Ok(map)
    }

    pub fn preset(
        preset: ManualPreset,
        screen_width: u32,
        screen_height: u32,
    ) -> Result<CollisionMap, RectError> {
        let layout = match preset {
            ManualPreset::MaginotExterior => maginot_exterior_layout(screen_width, screen_height)?,
            ManualPreset::ForestPath => forest_path_layout(screen_width, screen_height)?,
        };
        let map = Self::new(layout.width, layout.height)
            .primitives(layout.primitives)?
            .build();
        info!(
            preset = %preset,
            width = screen_width,
            height = screen_height,
            rect_count = map.len(),
            "manual_preset_built"
        );
        Ok(map)
    }
}

pub fn maginot_exterior_layout(
    screen_width: u32,
    screen_height: u32,
) -> Result<ManualLayout, RectError> {
    let (w, h) = screen_extent(screen_width, screen_height)?;
    let scale_x = screen_width as f32 / MAGINOT_ART_WIDTH;
    let scale_y = screen_height as f32 / MAGINOT_ART_HEIGHT;

    let door_width = (30.0 * scale_x) as i32;
    let door_height = (40.0 * scale_y) as i32;
    debug!(
        door_x = MAGINOT_DOOR_X,
        door_y = MAGINOT_DOOR_Y,
        door_width,
        door_height,
        "maginot_door_location"
    );

    let mut primitives = Vec::new();

    let bunker_blocks = [
        (MAGINOT_DOOR_X - 60, MAGINOT_DOOR_Y - 20, 40, 60),
        (MAGINOT_DOOR_X + door_width + 20, MAGINOT_DOOR_Y - 20, 40, 60),
    ];
    for (x, y, width, height) in bunker_blocks {
        let on_screen = x >= 0 && y >= 0 && x + width <= w && y + height <= h;
        if on_screen && !blocks_door_approach(x, y, width, height) {
            primitives.push(MapPrimitive::Rect {
                x,
                y,
                width,
                height,
            });
        }
    }

    // trees are smaller than their sprites
    for (tree_x, tree_y) in [(80, h / 3 + 20), (w - 100, h / 3 + 30)] {
        primitives.push(MapPrimitive::Circle {
            cx: tree_x + 4,
            cy: tree_y + 10,
            radius: TREE_RADIUS,
        });
    }

    primitives.extend(edge_walls(w, h));

    for (rock_x, rock_y) in [
        (100, h / 3 + 70),
        (300, h / 3 + 85),
        (500, h / 3 + 75),
        (700, h / 3 + 90),
    ] {
        primitives.push(MapPrimitive::Rect {
            x: rock_x - ROCK_WIDTH / 2,
            y: rock_y - ROCK_HEIGHT / 2,
            width: ROCK_WIDTH,
            height: ROCK_HEIGHT,
        });
    }

    Ok(ManualLayout {
        width: screen_width,
        height: screen_height,
        primitives,
    })
}

fn screen_extent(screen_width: u32, screen_height: u32) -> Result<(i32, i32), RectError> {
    match (i32::try_from(screen_width), i32::try_from(screen_height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(RectError::ScreenOutOfRange {
            width: screen_width,
            height: screen_height,
        }),
    }
}

fn blocks_door_approach(x: i32, y: i32, width: i32, height: i32) -> bool {
    let center_x = x as f32 + width as f32 / 2.0;
    let center_y = y as f32 + height as f32 / 2.0;
    (center_x - MAGINOT_DOOR_X as f32).abs() < MAGINOT_DOOR_CLEARANCE
        && (center_y - MAGINOT_DOOR_Y as f32).abs() < MAGINOT_DOOR_CLEARANCE
}

fn edge_walls(w: i32, h: i32) -> [MapPrimitive; 4] {
    let t = EDGE_WALL_THICKNESS;
    [
        MapPrimitive::Rect {
            x: -t,
            y: 0,
            width: t,
            height: h,
        },
        MapPrimitive::Rect {
            x: w,
            y: 0,
            width: t,
            height: h,
        },
        MapPrimitive::Rect {
            x: 0,
            y: -t,
            width: w,
            height: t,
        },
        MapPrimitive::Rect {
            x: 0,
            y: h,
            width: w,
            height: t,
        },
    ]
}

// only the middle third of the lower half is walkable
pub fn forest_path_layout(
    screen_width: u32,
    screen_height: u32,
) -> Result<ManualLayout, RectError> {
    let (w, h) = screen_extent(screen_width, screen_height)?;
    let path_top = h / 2;
    let path_left = w / 3;
    let path_right = 2 * path_left;

    Ok(ManualLayout {
        width: screen_width,
        height: screen_height,
        primitives: vec![
            MapPrimitive::Rect {
                x: 0,
                y: path_top,
                width: path_left,
                height: h - path_top,
            },
            MapPrimitive::Rect {
                x: path_right,
                y: path_top,
                width: w - path_right,
                height: h - path_top,
            },
            MapPrimitive::Rect {
                x: 0,
                y: 0,
                width: w,
                height: path_top,
            },
        ],
    })
}
