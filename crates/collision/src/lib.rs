use thiserror::Error;

mod config;
mod manual;
mod map;
mod regions;
mod resolver;
mod setup;
mod terrain;

pub use config::{AnalysisConfig, ScanOrder, SpecialPolicy};
pub use manual::{
    forest_path_layout, maginot_exterior_layout, ManualLayout, ManualMapBuilder, ManualPreset,
    MapPrimitive,
};
pub use map::{
    ActorBox, CollisionMap, CollisionMapBuilder, DebugOverlay, DebugOverlayStyle, Rect, RectError,
};
pub use regions::extract;
pub use resolver::{resolve, resolve_with_outcome, MoveOutcome, Size, Vec2};
pub use setup::{build_scene_map, load_background_rgb, AnalysisError, ImageBackedMap, MapStrategy};
pub use terrain::{
    classify, classify_buffer, classify_image, GridError, PixelBuffer, Rgb, TerrainGrid,
    TerrainLabel,
};

#[derive(Debug, Error)]
pub enum CollisionError {
    #[error(transparent)]
    Rect(#[from] RectError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}
