use std::path::Path;
use std::process::ExitCode;

use log::{error, info};
use pixmap::{Composition, Pixmap, PixmapError, Result};

enum Command {
    Info(String),
    Compose { scene: String, output: String },
    View(String),
    Help,
}

fn print_usage() {
    println!("Usage: pixmap <COMMAND>");
    println!();
    println!("Commands:");
    println!("  info <IMAGE>                  Print size and pixel format of an image");
    println!("  compose <SCENE.json> <OUT>    Render a composition document to an image");
    println!("  view <IMAGE>                  Show an image in a window (needs --features viewer)");
    println!("  --help                        Show this help message");
}

/// Parse command line arguments
fn parse_args(args: &[String]) -> Result<Command> {
    let usage = |msg: &str| PixmapError::InvalidArgument(format!("{} (see --help)", msg));
    match args.get(1).map(String::as_str) {
        None | Some("--help" | "-h" | "help") => Ok(Command::Help),
        Some("info") => args
            .get(2)
            .map(|p| Command::Info(p.clone()))
            .ok_or_else(|| usage("info needs an image path")),
        Some("compose") => match (args.get(2), args.get(3)) {
            (Some(scene), Some(output)) => Ok(Command::Compose {
                scene: scene.clone(),
                output: output.clone(),
            }),
            _ => Err(usage("compose needs a scene and an output path")),
        },
        Some("view") => args
            .get(2)
            .map(|p| Command::View(p.clone()))
            .ok_or_else(|| usage("view needs an image path")),
        Some(other) => Err(usage(&format!("unknown command '{}'", other))),
    }
}

fn print_info(path: &str) -> Result<()> {
    let pixmap = Pixmap::from_file(path)?;
    let (w, h) = pixmap.size()?;
    let format = pixmap.format()?;
    println!("{}: {}x{}", path, w, h);
    println!("  bytes/pixel: {}", format.bytes_per_pixel());
    println!("  pitch:       {}", pixmap.pitch()?);
    let (r, g, b, a) = format.masks();
    println!("  masks:       r={:#010x} g={:#010x} b={:#010x} a={:#010x}", r, g, b, a);
    Ok(())
}

fn compose(scene: &str, output: &str) -> Result<()> {
    let doc = Composition::load(scene)?;
    let base_dir = Path::new(scene).parent().unwrap_or_else(|| Path::new("."));
    let canvas = doc.render(base_dir)?;
    canvas.save(output)?;
    info!("wrote {}", output);
    Ok(())
}

#[cfg(feature = "viewer")]
fn view(path: &str) -> Result<()> {
    let img = Pixmap::from_file(path)?;
    pixmap::display::view(path, &img)
}

#[cfg(not(feature = "viewer"))]
fn view(_path: &str) -> Result<()> {
    Err(PixmapError::InvalidArgument(
        "this build has no viewer, rebuild with --features viewer".into(),
    ))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let args: Vec<String> = std::env::args().collect();
    let result = parse_args(&args).and_then(|cmd| match cmd {
        Command::Help => {
            print_usage();
            Ok(())
        },
        Command::Info(path) => print_info(&path),
        Command::Compose { scene, output } => compose(&scene, &output),
        Command::View(path) => view(&path),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        },
    }
}
