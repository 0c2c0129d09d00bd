use std::env;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use collision::Rgb;
use mapcheck::{run, CommandKind, CommonOptions};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_tracing();
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!(error = %message, "mapcheck_failed");
            eprintln!("{message}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn run_cli() -> Result<(), String> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        return Err(usage_text());
    }
    if args[0] == "-h" || args[0] == "--help" {
        print_usage();
        return Ok(());
    }

    let mut options = CommonOptions::default();
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "--image" => {
                options.image = Some(PathBuf::from(option_value(&args, index, "--image")?));
                index += 2;
            }
            "--layout" => {
                options.layout = Some(PathBuf::from(option_value(&args, index, "--layout")?));
                index += 2;
            }
            "--preset" => {
                options.preset = option_value(&args, index, "--preset")?.parse()?;
                index += 2;
            }
            "--strategy" => {
                options.strategy = option_value(&args, index, "--strategy")?.parse()?;
                index += 2;
            }
            "--scan-order" => {
                options.analysis.scan_order = option_value(&args, index, "--scan-order")?.parse()?;
                index += 2;
            }
            "--screen-width" => {
                options.screen_width = parse_number(&args, index, "--screen-width", "u32")?;
                index += 2;
            }
            "--screen-height" => {
                options.screen_height = parse_number(&args, index, "--screen-height", "u32")?;
                index += 2;
            }
            "--json" => {
                options.json = true;
                index += 1;
            }
            _ => break,
        }
    }

    let command = args
        .get(index)
        .ok_or_else(|| "missing subcommand".to_string())?
        .as_str();
    let command_args = &args[(index + 1)..];

    let kind = match command {
        "map" => {
            if !command_args.is_empty() {
                return Err("map takes no arguments".to_string());
            }
            CommandKind::Map
        }
        "check" => {
            let [x, y, width, height] = parse_floats::<4>("check", command_args)?;
            CommandKind::Check {
                x,
                y,
                width,
                height,
            }
        }
        "resolve" => {
            let [old_x, old_y, new_x, new_y, width, height] =
                parse_floats::<6>("resolve", command_args)?;
            CommandKind::Resolve {
                old_x,
                old_y,
                new_x,
                new_y,
                width,
                height,
            }
        }
        "classify" => {
            if command_args.len() != 3 {
                return Err("classify requires <r> <g> <b>".to_string());
            }
            let mut channels = [0u8; 3];
            for (channel, raw) in channels.iter_mut().zip(command_args) {
                *channel = raw
                    .parse::<u8>()
                    .map_err(|_| format!("invalid channel value '{raw}' (expected 0-255)"))?;
            }
            CommandKind::Classify {
                pixel: Rgb::from(channels),
            }
        }
        other => return Err(format!("unknown subcommand '{other}'")),
    };

    info!(
        command,
        strategy = %options.strategy,
        scan_order = %options.analysis.scan_order,
        "mapcheck_start"
    );
    run(kind, &options, &mut io::stdout())
}

fn option_value<'a>(args: &'a [String], index: usize, flag: &str) -> Result<&'a str, String> {
    args.get(index + 1)
        .map(String::as_str)
        .ok_or_else(|| format!("missing value for {flag}"))
}

fn parse_number<T: FromStr>(
    args: &[String],
    index: usize,
    flag: &str,
    expected: &str,
) -> Result<T, String> {
    let value = option_value(args, index, flag)?;
    value
        .parse::<T>()
        .map_err(|_| format!("invalid {flag} value '{value}' (expected {expected})"))
}

fn parse_floats<const N: usize>(command: &str, raw: &[String]) -> Result<[f32; N], String> {
    if raw.len() != N {
        return Err(format!(
            "{command} requires {N} numeric arguments, got {}",
            raw.len()
        ));
    }
    let mut values = [0.0f32; N];
    for (value, text) in values.iter_mut().zip(raw) {
        *value = text
            .parse::<f32>()
            .map_err(|_| format!("invalid {command} argument '{text}' (expected number)"))?;
    }
    Ok(values)
}

fn print_usage() {
    println!("{}", usage_text());
}

fn usage_text() -> String {
    [
        "mapcheck - build collision maps from background images and query them",
        "",
        "Usage:",
        "  mapcheck [options] map",
        "  mapcheck [options] check <x> <y> <w> <h>",
        "  mapcheck [options] resolve <old_x> <old_y> <new_x> <new_y> <w> <h>",
        "  mapcheck classify <r> <g> <b>",
        "",
        "Options:",
        "  --image <path>            background image to analyze",
        "  --strategy image|manual   skip analysis with manual",
        "  --layout <json>           manual layout used when analysis is skipped or fails",
        "  --preset maginot|forest-path",
        "  --screen-width <u32>      preset screen size",
        "  --screen-height <u32>",
        "  --scan-order column|row",
        "  --json                    machine-readable output",
        "",
        "Defaults:",
        "  --strategy image",
        "  --preset maginot",
        "  --screen-width 1024 --screen-height 768",
        "  --scan-order column",
        "",
        "Logging goes to stderr; set RUST_LOG to change the filter (default info).",
    ]
    .join("\n")
}
