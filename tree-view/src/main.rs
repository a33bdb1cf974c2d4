//! Application entry point for the pixel tree viewer.
//!
//! Usage:
//!   pixel-tree [OPTIONS]
//!     --seed <N>           Seed for the first tree (default: random)
//!     --max-nodes <N>      Node cap per tree (default: 50)
//!     --config <FILE>      JSON overrides for growth/render tuning
//!     --palettes <FILE>    Extra palettes, merged over the built-in ones
//!     --palette <NAME>     Starting palette (default: green)
//!     --out <DIR>          Where screenshots and frames go (default: out)

mod export;
mod viewer;

use std::path::PathBuf;

use tree_core::PaletteBook;
use tree_core::config::Config;
use viewer::{Viewer, ViewerOptions};

/// Starts the native eframe application titled `"Pixel Tree"`.
fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = parse_args();
    let viewer = match Viewer::new(opts) {
        Ok(viewer) => viewer,
        Err(e) => {
            eprintln!("Failed to create tree: {e}");
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([760.0, 720.0]),
        ..Default::default()
    };
    eframe::run_native("Pixel Tree", options, Box::new(|_cc| Ok(Box::new(viewer))))
}

/// Parses command-line arguments with plain `std::env::args()` matching.
fn parse_args() -> ViewerOptions {
    let mut opts = ViewerOptions::default();
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--seed" => {
                i += 1;
                opts.seed = Some(parse_value(&args, i, "--seed requires a number"));
            }
            "--max-nodes" => {
                i += 1;
                opts.max_nodes = parse_value(&args, i, "--max-nodes requires a number");
            }
            "--config" => {
                i += 1;
                let text = read_file(&args, i, "--config");
                opts.config = Config::from_json(&text).unwrap_or_else(|e| {
                    eprintln!("{e}");
                    std::process::exit(1);
                });
            }
            "--palettes" => {
                i += 1;
                let text = read_file(&args, i, "--palettes");
                let extra = PaletteBook::from_json(&text).unwrap_or_else(|e| {
                    eprintln!("{e}");
                    std::process::exit(1);
                });
                log::info!("loaded {} palettes from {}", extra.len(), args[i]);
                opts.palettes.merge(extra);
            }
            "--palette" => {
                i += 1;
                opts.palette = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--palette requires a name");
                    std::process::exit(1);
                });
            }
            "--out" => {
                i += 1;
                opts.out_dir = args.get(i).map(PathBuf::from).unwrap_or_else(|| {
                    eprintln!("--out requires a directory");
                    std::process::exit(1);
                });
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    opts
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, msg: &str) -> T {
    args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
        eprintln!("{msg}");
        std::process::exit(1);
    })
}

fn read_file(args: &[String], i: usize, flag: &str) -> String {
    let Some(path) = args.get(i) else {
        eprintln!("{flag} requires a file path");
        std::process::exit(1);
    };
    std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Cannot read {path}: {e}");
        std::process::exit(1);
    })
}

fn print_usage() {
    println!("Usage: pixel-tree [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --seed <N>           Seed for the first tree (default: random)");
    println!("  --max-nodes <N>      Node cap per tree (default: 50)");
    println!("  --config <FILE>      JSON overrides for growth/render tuning");
    println!("  --palettes <FILE>    Extra palettes, merged over the built-in ones");
    println!("  --palette <NAME>     Starting palette (default: green)");
    println!("  --out <DIR>          Where screenshots and frames go (default: out)");
    println!("  --help, -h           Show this help");
}
