use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use eframe::egui;
use tracing::{error, info};

mod app;
mod canvas;

use app::{App, Settings};

const DEMO: &str = "\
#
// arrows or WASD to move, space to change color
enum Tint { Warm, Cool }
player = { x: 300, y: 220, tint: Warm }
speed = 160

update(dt) {
  if held(\"left\")  { player.x -= speed * dt }
  if held(\"right\") { player.x += speed * dt }
  if held(\"up\")    { player.y -= speed * dt }
  if held(\"down\")  { player.y += speed * dt }
  if pressed(\"jump\") {
    player.tint = match player.tint { Warm => Cool, Cool => Warm }
    sound(\"blip\")
  }
}

draw {
  clear(\"#1c1c20\")
  c = match player.tint { Warm => \"orange\", Cool => \"cyan\" }
  rect(player.x, player.y, 24, 24, color=c)
  text(\"x \" + floor(player.x) + \"  y \" + floor(player.y), 8, 8, size=14)
}
";

/// Editor and runner for Topple programs
#[derive(Parser, Debug)]
#[command(name = "topple")]
#[command(about = "Edit and run Topple programs, where unsupported code falls before it runs")]
struct Args {
    /// Program to open; a small demo is loaded when omitted
    file: Option<PathBuf>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Longest frame step handed to `update`, in seconds
    #[arg(long, default_value_t = 0.1)]
    max_dt: f64,

    /// Canvas width in pixels
    #[arg(long, default_value_t = 640.0)]
    width: f32,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 480.0)]
    height: f32,

    /// Print the program after falling and exit
    #[arg(long)]
    preview: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let source = match &args.file {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                error!(path = %path.display(), "cannot read program: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => DEMO.to_string(),
    };

    if args.preview {
        println!("{}", topple_lang::preview(&source));
        let floating = topple_lang::unsupported_positions(&source);
        if !floating.is_empty() {
            info!(count = floating.len(), "characters fell");
        }
        return ExitCode::SUCCESS;
    }

    let settings = Settings {
        max_dt: args.max_dt,
        canvas: egui::vec2(args.width, args.height),
    };
    let title = match &args.file {
        Some(path) => format!("Topple - {}", path.display()),
        None => "Topple".to_string(),
    };
    info!("starting topple v{}", env!("CARGO_PKG_VERSION"));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1400.0, 800.0]),
        ..Default::default()
    };
    let app = App::new(source, settings);
    match eframe::run_native(&title, options, Box::new(|_cc| Ok(Box::new(app)))) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("window closed with error: {e}");
            ExitCode::FAILURE
        }
    }
}
