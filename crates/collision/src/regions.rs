use tracing::debug;

use crate::config::{AnalysisConfig, ScanOrder};
use crate::map::Rect;
use crate::terrain::TerrainGrid;

pub fn extract(grid: &TerrainGrid, config: &AnalysisConfig) -> Vec<Rect> {
    let mut scan = RegionScan::new(grid, config);
    let mut rects = Vec::new();

    match config.scan_order {
        ScanOrder::ColumnMajor => {
            for x in 0..grid.width() {
                for y in 0..grid.height() {
                    if let Some(rect) = scan.claim_rect_at(x, y) {
                        rects.push(rect);
                    }
                }
            }
        }
        ScanOrder::RowMajor => {
            for y in 0..grid.height() {
                for x in 0..grid.width() {
                    if let Some(rect) = scan.claim_rect_at(x, y) {
                        rects.push(rect);
                    }
                }
            }
        }
    }

    debug!(
        width = grid.width(),
        height = grid.height(),
        scan_order = %config.scan_order,
        blocking_cells = scan.blocking_cells,
        rect_count = rects.len(),
        "terrain_regions_extracted"
    );
    rects
}

struct RegionScan<'a> {
    grid: &'a TerrainGrid,
    config: &'a AnalysisConfig,
    processed: Vec<bool>,
    blocking_cells: usize,
}

impl<'a> RegionScan<'a> {
    fn new(grid: &'a TerrainGrid, config: &'a AnalysisConfig) -> Self {
        Self {
            grid,
            config,
            processed: vec![false; grid.width() as usize * grid.height() as usize],
            blocking_cells: 0,
        }
    }

    fn is_open_obstacle(&self, x: u32, y: u32) -> bool {
        let Some(index) = self.grid.index_of(x, y) else {
            return false;
        };
        let blocks = self
            .grid
            .label_at(x, y)
            .map(|label| self.config.blocks(label))
            .unwrap_or(false);
        blocks && !self.processed[index]
    }

    fn claim_rect_at(&mut self, start_x: u32, start_y: u32) -> Option<Rect> {
        if !self.is_open_obstacle(start_x, start_y) {
            return None;
        }

        let mut max_width = 0u32;
        while start_x + max_width < self.grid.width()
            && self.is_open_obstacle(start_x + max_width, start_y)
        {
            max_width += 1;
        }

        let mut max_height = 0u32;
        while start_y + max_height < self.grid.height()
            && (start_x..start_x + max_width)
                .all(|x| self.is_open_obstacle(x, start_y + max_height))
        {
            max_height += 1;
        }

        if max_width == 0 || max_height == 0 {
            return None;
        }

        for y in start_y..start_y + max_height {
            for x in start_x..start_x + max_width {
                if let Some(index) = self.grid.index_of(x, y) {
                    self.processed[index] = true;
                }
            }
        }
        self.blocking_cells += max_width as usize * max_height as usize;

        Some(Rect::from_cells(start_x, start_y, max_width, max_height))
    }
}
