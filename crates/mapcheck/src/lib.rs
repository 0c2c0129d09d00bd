use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use collision::{
    build_scene_map, classify, load_background_rgb, resolve_with_outcome, AnalysisConfig,
    CollisionMap, ManualLayout, ManualMapBuilder, ManualPreset, MapStrategy, Rect, Rgb, Size,
    TerrainLabel, Vec2,
};
use serde::Serialize;
use tracing::{info, warn};

pub const DEFAULT_SCREEN_WIDTH: u32 = 1024;
pub const DEFAULT_SCREEN_HEIGHT: u32 = 768;

#[derive(Debug, Clone)]
pub struct CommonOptions {
    pub strategy: MapStrategy,
    pub image: Option<PathBuf>,
    pub layout: Option<PathBuf>,
    pub preset: ManualPreset,
    pub screen_width: u32,
    pub screen_height: u32,
    pub analysis: AnalysisConfig,
    pub json: bool,
}

impl Default for CommonOptions {
    fn default() -> Self {
        Self {
            strategy: MapStrategy::ImageBacked,
            image: None,
            layout: None,
            preset: ManualPreset::MaginotExterior,
            screen_width: DEFAULT_SCREEN_WIDTH,
            screen_height: DEFAULT_SCREEN_HEIGHT,
            analysis: AnalysisConfig::default(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandKind {
    Map,
    Check {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Resolve {
        old_x: f32,
        old_y: f32,
        new_x: f32,
        new_y: f32,
        width: f32,
        height: f32,
    },
    Classify {
        pixel: Rgb,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MapSource {
    Image { path: String },
    Layout { path: String },
    Preset { name: String },
}

#[derive(Debug, Serialize)]
struct MapReport<'a> {
    source: &'a MapSource,
    width: u32,
    height: u32,
    rect_count: usize,
    rects: &'a [Rect],
}

#[derive(Debug, Serialize)]
struct CheckReport {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    blocked: bool,
}

#[derive(Debug, Serialize)]
struct ResolveReport {
    x: f32,
    y: f32,
    outcome: &'static str,
}

#[derive(Debug, Serialize)]
struct ClassifyReport {
    r: u8,
    g: u8,
    b: u8,
    label: &'static str,
}

pub struct LoadedMap {
    pub map: CollisionMap,
    pub source: MapSource,
}

pub fn run<W: Write>(kind: CommandKind, opts: &CommonOptions, stdout: &mut W) -> Result<(), String> {
    match kind {
        CommandKind::Classify { pixel } => {
            let report = ClassifyReport {
                r: pixel.r,
                g: pixel.g,
                b: pixel.b,
                label: terrain_label_name(classify(pixel)),
            };
            if opts.json {
                emit_json(stdout, &report)
            } else {
                emit_line(stdout, report.label)
            }
        }
        CommandKind::Map => {
            let loaded = load_map(opts)?;
            let map = &loaded.map;
            let report = MapReport {
                source: &loaded.source,
                width: map.width(),
                height: map.height(),
                rect_count: map.len(),
                rects: map.debug_rects(),
            };
            if opts.json {
                return emit_json(stdout, &report);
            }
            emit_line(
                stdout,
                &format!(
                    "source: {}\nsize: {}x{}\nrects: {}",
                    describe_source(&loaded.source),
                    report.width,
                    report.height,
                    report.rect_count
                ),
            )?;
            for rect in report.rects {
                emit_line(
                    stdout,
                    &format!(
                        "  {} {} {} {}",
                        rect.x(),
                        rect.y(),
                        rect.width(),
                        rect.height()
                    ),
                )?;
            }
            Ok(())
        }
        CommandKind::Check {
            x,
            y,
            width,
            height,
        } => {
            let map = load_map(opts)?.map;
            let report = CheckReport {
                x,
                y,
                width,
                height,
                blocked: map.check(x, y, width, height),
            };
            if opts.json {
                emit_json(stdout, &report)
            } else {
                emit_line(stdout, if report.blocked { "blocked" } else { "clear" })
            }
        }
        CommandKind::Resolve {
            old_x,
            old_y,
            new_x,
            new_y,
            width,
            height,
        } => {
            let map = load_map(opts)?.map;
            let (resolved, outcome) = resolve_with_outcome(
                Vec2 { x: old_x, y: old_y },
                Vec2 { x: new_x, y: new_y },
                Size { width, height },
                &map,
            );
            let report = ResolveReport {
                x: resolved.x,
                y: resolved.y,
                outcome: outcome.label(),
            };
            if opts.json {
                emit_json(stdout, &report)
            } else {
                emit_line(
                    stdout,
                    &format!("{} {} {}", report.x, report.y, report.outcome),
                )
            }
        }
    }
}

pub fn load_map(opts: &CommonOptions) -> Result<LoadedMap, String> {
    let background = match (opts.strategy, opts.image.as_deref()) {
        (MapStrategy::ImageBacked, Some(path)) => match load_background_rgb(path) {
            Ok(image) => Some((image, path)),
            Err(error) => {
                warn!(error = %error, "background_load_failed");
                None
            }
        },
        _ => None,
    };

    let fallback_source = match opts.layout.as_deref() {
        Some(path) => MapSource::Layout {
            path: path.display().to_string(),
        },
        None => MapSource::Preset {
            name: opts.preset.to_string(),
        },
    };
    let mut source = match &background {
        Some((_, path)) => MapSource::Image {
            path: path.display().to_string(),
        },
        None => fallback_source.clone(),
    };

    let map = build_scene_map(
        opts.strategy,
        background.as_ref().map(|(image, _)| image),
        &opts.analysis,
        || {
            source = fallback_source;
            build_manual_map(opts)
        },
    )?;

    info!(
        source = %describe_source(&source),
        rect_count = map.len(),
        "mapcheck_map_loaded"
    );
    Ok(LoadedMap { map, source })
}

fn build_manual_map(opts: &CommonOptions) -> Result<CollisionMap, String> {
    let built = match opts.layout.as_deref() {
        Some(path) => ManualMapBuilder::from_layout(&read_layout(path)?),
        None => ManualMapBuilder::preset(opts.preset, opts.screen_width, opts.screen_height),
    };
    built.map_err(|error| format!("failed to build manual collision map: {error}"))
}

pub fn read_layout(path: &Path) -> Result<ManualLayout, String> {
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("failed to read layout file '{}': {error}", path.display()))?;
    parse_layout(&raw)
}

pub fn parse_layout(raw: &str) -> Result<ManualLayout, String> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, ManualLayout>(&mut deserializer) {
        Ok(layout) => Ok(layout),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(format!("parse layout json: {source}"))
            } else {
                Err(format!("parse layout json at {path}: {source}"))
            }
        }
    }
}

pub fn terrain_label_name(label: TerrainLabel) -> &'static str {
    match label {
        TerrainLabel::Walkable => "walkable",
        TerrainLabel::Obstacle => "obstacle",
        TerrainLabel::Special => "special",
    }
}

fn describe_source(source: &MapSource) -> String {
    match source {
        MapSource::Image { path } => format!("image {path}"),
        MapSource::Layout { path } => format!("layout {path}"),
        MapSource::Preset { name } => format!("preset {name}"),
    }
}

fn emit_line<W: Write>(stdout: &mut W, line: &str) -> Result<(), String> {
    writeln!(stdout, "{line}").map_err(|error| format!("failed to write output: {error}"))
}

fn emit_json<W: Write, T: Serialize>(stdout: &mut W, value: &T) -> Result<(), String> {
    let text = serde_json::to_string(value)
        .map_err(|error| format!("failed to encode json output: {error}"))?;
    emit_line(stdout, &text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use collision::ScanOrder;
    use image::RgbImage;
    use tempfile::TempDir;

    fn run_to_string(kind: CommandKind, opts: &CommonOptions) -> String {
        let mut out = Vec::new();
        run(kind, opts, &mut out).expect("run");
        String::from_utf8(out).expect("utf8")
    }

    fn write_background(dir: &TempDir) -> PathBuf {
        let mut image = RgbImage::from_pixel(20, 10, image::Rgb([60, 140, 50]));
        for y in 2..5 {
            for x in 8..12 {
                image.put_pixel(x, y, image::Rgb([128, 128, 128]));
            }
        }
        let path = dir.path().join("field.png");
        image.save(&path).expect("save");
        path
    }

    #[test]
    fn classify_prints_label() {
        let opts = CommonOptions::default();
        let out = run_to_string(
            CommandKind::Classify {
                pixel: Rgb::new(128, 128, 128),
            },
            &opts,
        );
        assert_eq!(out, "obstacle\n");
    }

    #[test]
    fn classify_json_includes_channels() {
        let opts = CommonOptions {
            json: true,
            ..CommonOptions::default()
        };
        let out = run_to_string(
            CommandKind::Classify {
                pixel: Rgb::new(120, 160, 230),
            },
            &opts,
        );
        let value: serde_json::Value = serde_json::from_str(out.trim()).expect("json");
        assert_eq!(value["label"], "walkable");
        assert_eq!(value["b"], 230);
    }

    #[test]
    fn image_map_lists_extracted_rects() {
        let dir = TempDir::new().expect("tempdir");
        let opts = CommonOptions {
            image: Some(write_background(&dir)),
            ..CommonOptions::default()
        };
        let out = run_to_string(CommandKind::Map, &opts);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("source: image "));
        assert_eq!(lines[1], "size: 20x10");
        assert_eq!(lines[2], "rects: 1");
        assert_eq!(lines[3], "  8 2 4 3");
    }

    #[test]
    fn missing_image_falls_back_to_preset() {
        let dir = TempDir::new().expect("tempdir");
        let opts = CommonOptions {
            image: Some(dir.path().join("nope.png")),
            preset: ManualPreset::ForestPath,
            screen_width: 900,
            screen_height: 600,
            ..CommonOptions::default()
        };
        let loaded = load_map(&opts).expect("map");
        assert_eq!(
            loaded.source,
            MapSource::Preset {
                name: "forest-path".to_string()
            }
        );
        assert_eq!(loaded.map.len(), 3);
    }

    #[test]
    fn no_image_uses_default_maginot_preset() {
        let loaded = load_map(&CommonOptions::default()).expect("map");
        assert_eq!(
            loaded.source,
            MapSource::Preset {
                name: "maginot".to_string()
            }
        );
        assert_eq!((loaded.map.width(), loaded.map.height()), (1024, 768));
    }

    #[test]
    fn manual_strategy_ignores_image_and_uses_layout() {
        let dir = TempDir::new().expect("tempdir");
        let layout_path = dir.path().join("layout.json");
        fs::write(
            &layout_path,
            r#"{"width": 50, "height": 40, "primitives": [{"kind": "rect", "x": 10, "y": 0, "width": 5, "height": 40}]}"#,
        )
        .expect("write layout");
        let opts = CommonOptions {
            strategy: MapStrategy::Manual,
            image: Some(write_background(&dir)),
            layout: Some(layout_path),
            json: true,
            ..CommonOptions::default()
        };
        let out = run_to_string(
            CommandKind::Resolve {
                old_x: 0.0,
                old_y: 0.0,
                new_x: 8.0,
                new_y: 5.0,
                width: 4.0,
                height: 4.0,
            },
            &opts,
        );
        let value: serde_json::Value = serde_json::from_str(out.trim()).expect("json");
        assert_eq!(value["outcome"], "slide_vertical");
        assert_eq!(value["x"], 0.0);
        assert_eq!(value["y"], 5.0);
    }

    #[test]
    fn check_reports_blocked_and_clear() {
        let dir = TempDir::new().expect("tempdir");
        let opts = CommonOptions {
            image: Some(write_background(&dir)),
            analysis: AnalysisConfig {
                scan_order: ScanOrder::RowMajor,
                ..AnalysisConfig::default()
            },
            ..CommonOptions::default()
        };
        let blocked = run_to_string(
            CommandKind::Check {
                x: 7.0,
                y: 1.0,
                width: 2.0,
                height: 2.0,
            },
            &opts,
        );
        assert_eq!(blocked, "blocked\n");
        let clear = run_to_string(
            CommandKind::Check {
                x: 0.0,
                y: 0.0,
                width: 8.0,
                height: 10.0,
            },
            &opts,
        );
        assert_eq!(clear, "clear\n");
    }

    #[test]
    fn malformed_layout_is_ignored_when_image_analysis_succeeds() {
        let dir = TempDir::new().expect("tempdir");
        let layout_path = dir.path().join("broken.json");
        fs::write(&layout_path, "{ not json").expect("write layout");
        let opts = CommonOptions {
            image: Some(write_background(&dir)),
            layout: Some(layout_path.clone()),
            ..CommonOptions::default()
        };
        let loaded = load_map(&opts).expect("map");
        assert!(matches!(loaded.source, MapSource::Image { .. }));
        assert_eq!(loaded.map.len(), 1);

        let opts = CommonOptions {
            image: Some(dir.path().join("nope.png")),
            layout: Some(layout_path),
            ..CommonOptions::default()
        };
        let err = load_map(&opts).err().expect("err");
        assert!(err.starts_with("parse layout json"), "{err}");
    }

    #[test]
    fn oversized_preset_screen_is_an_error() {
        let opts = CommonOptions {
            screen_width: 2_147_483_648,
            ..CommonOptions::default()
        };
        let err = load_map(&opts).err().expect("err");
        assert!(err.contains("exceeds the i32 coordinate range"), "{err}");
    }

    #[test]
    fn layout_errors_report_json_path() {
        let err = parse_layout(
            r#"{"width": 10, "height": 10, "primitives": [{"kind": "rect", "x": 0, "y": 0, "width": "wide", "height": 1}]}"#,
        )
        .expect_err("err");
        assert!(err.starts_with("parse layout json at primitives[0]"), "{err}");
    }

    #[test]
    fn degenerate_layout_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let layout_path = dir.path().join("layout.json");
        fs::write(
            &layout_path,
            r#"{"width": 10, "height": 10, "primitives": [{"kind": "circle", "cx": 1, "cy": 1, "radius": 0}]}"#,
        )
        .expect("write layout");
        let opts = CommonOptions {
            strategy: MapStrategy::Manual,
            layout: Some(layout_path),
            ..CommonOptions::default()
        };
        let err = load_map(&opts).err().expect("err");
        assert!(err.contains("radius must be positive"), "{err}");
    }
}
