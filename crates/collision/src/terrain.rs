use image::RgbImage;
use thiserror::Error;

use crate::setup::AnalysisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TerrainLabel {
    #[default]
    Walkable,
    Obstacle,
    // water and similar, never produced by classify
    Special,
}

pub fn classify(pixel: Rgb) -> TerrainLabel {
    let r = i32::from(pixel.r);
    let g = i32::from(pixel.g);
    let b = i32::from(pixel.b);

    if is_grass(r, g, b) {
        return TerrainLabel::Walkable;
    }
    if is_concrete(r, g, b) || is_tree(r, g, b) || is_rock(r, g, b) {
        return TerrainLabel::Obstacle;
    }
    if is_sky(r, g, b) {
        return TerrainLabel::Walkable;
    }
    TerrainLabel::Walkable
}

fn is_grass(r: i32, g: i32, b: i32) -> bool {
    g > r + 20 && g > b + 10 && in_open(g, 30, 200) && r < 150 && b < 150
}

// Near-gray: mean in (80, 180) and every channel within 30 of the mean.
// Compared on the channel sum to keep the mean exact.
fn is_concrete(r: i32, g: i32, b: i32) -> bool {
    let sum = r + g + b;
    let deviation = (3 * r - sum)
        .abs()
        .max((3 * g - sum).abs())
        .max((3 * b - sum).abs());
    in_open(sum, 240, 540) && deviation < 90
}

fn is_tree(r: i32, g: i32, b: i32) -> bool {
    let bark = in_open(r, 60, 140) && in_open(g, 40, 90) && in_open(b, 20, 60);
    let foliage = r < 80 && in_open(g, 50, 150) && b < 80 && g > r + 20;
    bark || foliage
}

fn is_rock(r: i32, g: i32, b: i32) -> bool {
    in_open(r, 70, 120)
        && in_open(g, 70, 120)
        && in_open(b, 60, 110)
        && (r - g).abs() < 20
        && (g - b).abs() < 20
}

fn is_sky(r: i32, g: i32, b: i32) -> bool {
    b > r && b > g && b > 100 && r + g < 400
}

fn in_open(value: i32, low: i32, high: i32) -> bool {
    low < value && value < high
}

#[derive(Debug, Clone, PartialEq)]
pub struct TerrainGrid {
    width: u32,
    height: u32,
    cells: Vec<TerrainLabel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell count mismatch: expected {expected}, got {actual}")]
    CellCountMismatch { expected: usize, actual: usize },
}

impl TerrainGrid {
    pub fn new(width: u32, height: u32, cells: Vec<TerrainLabel>) -> Result<Self, GridError> {
        let expected = width as usize * height as usize;
        let actual = cells.len();
        if expected != actual {
            return Err(GridError::CellCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn filled(width: u32, height: u32, label: TerrainLabel) -> Self {
        Self {
            width,
            height,
            cells: vec![label; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn label_at(&self, x: u32, y: u32) -> Option<TerrainLabel> {
        self.index_of(x, y)
            .and_then(|index| self.cells.get(index).copied())
    }

    pub fn set(&mut self, x: u32, y: u32, label: TerrainLabel) -> bool {
        match self.index_of(x, y) {
            Some(index) => {
                self.cells[index] = label;
                true
            }
            None => false,
        }
    }

    pub fn count(&self, label: TerrainLabel) -> usize {
        self.cells.iter().filter(|cell| **cell == label).count()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PixelBuffer<'a> {
    width: u32,
    height: u32,
    bytes: &'a [u8],
}

impl<'a> PixelBuffer<'a> {
    pub fn new(width: u32, height: u32, bytes: &'a [u8]) -> Result<Self, AnalysisError> {
        if width == 0 || height == 0 {
            return Err(AnalysisError::EmptyImage { width, height });
        }
        let expected = width as usize * height as usize * 3;
        if bytes.len() != expected {
            return Err(AnalysisError::BufferSizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            width,
            height,
            bytes,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        let rgb = self.bytes.get(offset..offset + 3)?;
        Some(Rgb::new(rgb[0], rgb[1], rgb[2]))
    }
}

impl<'a> TryFrom<&'a RgbImage> for PixelBuffer<'a> {
    type Error = AnalysisError;

    fn try_from(image: &'a RgbImage) -> Result<Self, Self::Error> {
        PixelBuffer::new(image.width(), image.height(), image.as_raw())
    }
}

pub fn classify_buffer(buffer: PixelBuffer<'_>) -> TerrainGrid {
    let cells = buffer
        .bytes
        .chunks_exact(3)
        .map(|rgb| classify(Rgb::new(rgb[0], rgb[1], rgb[2])))
        .collect();
    TerrainGrid {
        width: buffer.width,
        height: buffer.height,
        cells,
    }
}

pub fn classify_image(image: &RgbImage) -> Result<TerrainGrid, AnalysisError> {
    let buffer = PixelBuffer::try_from(image)?;
    Ok(classify_buffer(buffer))
}
