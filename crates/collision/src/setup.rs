use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::{ImageError, ImageReader, RgbImage};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::map::{CollisionMap, CollisionMapBuilder};
use crate::regions::extract;
use crate::terrain::{classify_buffer, PixelBuffer};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("pixel buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },
    #[error("failed to open background image {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode background image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MapStrategy {
    #[default]
    ImageBacked,
    Manual,
}

impl MapStrategy {
    pub fn label(self) -> &'static str {
        match self {
            Self::ImageBacked => "image",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for MapStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MapStrategy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "image" => Ok(Self::ImageBacked),
            "manual" => Ok(Self::Manual),
            other => Err(format!(
                "unknown map strategy '{other}' (expected image or manual)"
            )),
        }
    }
}

pub struct ImageBackedMap;

impl ImageBackedMap {
    pub fn from_buffer(
        buffer: PixelBuffer<'_>,
        config: &AnalysisConfig,
    ) -> Result<CollisionMap, AnalysisError> {
        let grid = classify_buffer(buffer);
        let rects = extract(&grid, config);
        Ok(CollisionMapBuilder::new(grid.width(), grid.height())
            .extend_rects(rects)
            .build())
    }

    pub fn from_image(
        image: &RgbImage,
        config: &AnalysisConfig,
    ) -> Result<CollisionMap, AnalysisError> {
        let buffer = PixelBuffer::try_from(image)?;
        Self::from_buffer(buffer, config)
    }

    pub fn from_path(path: &Path, config: &AnalysisConfig) -> Result<CollisionMap, AnalysisError> {
        let image = load_background_rgb(path)?;
        Self::from_image(&image, config)
    }
}

pub fn load_background_rgb(path: &Path) -> Result<RgbImage, AnalysisError> {
    let reader = ImageReader::open(path).map_err(|source| AnalysisError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = reader.decode().map_err(|source| AnalysisError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decoded.to_rgb8())
}

/// Builds the collision map for a scene.
pub fn build_scene_map<F, E>(
    strategy: MapStrategy,
    background: Option<&RgbImage>,
    config: &AnalysisConfig,
    fallback: F,
) -> Result<CollisionMap, E>
where
    F: FnOnce() -> Result<CollisionMap, E>,
{
    match (strategy, background) {
        (MapStrategy::Manual, _) => {
            info!(strategy = %strategy, "scene_map_manual");
            fallback()
        }
        (MapStrategy::ImageBacked, None) => {
            warn!(
                strategy = %strategy,
                reason = "no background image available",
                "scene_map_fallback"
            );
            fallback()
        }
        (MapStrategy::ImageBacked, Some(image)) => match ImageBackedMap::from_image(image, config)
        {
            Ok(map) => {
                info!(
                    width = map.width(),
                    height = map.height(),
                    rect_count = map.len(),
                    scan_order = %config.scan_order,
                    "collision_map_extracted"
                );
                Ok(map)
            }
            Err(error) => {
                warn!(
                    strategy = %strategy,
                    error = %error,
                    "scene_map_fallback"
                );
                fallback()
            }
        },
    }
}
