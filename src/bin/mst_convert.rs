use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::info;

use mst_convert_lib::convert::{convert_scene, ConvertOptions, TransformMode};
use mst_convert_lib::mst::{write_mst, MstMesh};
use mst_convert_lib::scene::Scene;

struct Args {
    scene_path: PathBuf,
    output_path: PathBuf,
    config_path: Option<PathBuf>,
    local_transforms: bool,
}

fn usage() -> ! {
    eprintln!("Usage:");
    eprintln!("  mst-convert <scene.json> <out.mst> [--config options.json] [--local-transforms]");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  mst-convert ./house.json ./house.mst");
    eprintln!("  mst-convert ./house.json ./house.mst --config ./convert.json");
    std::process::exit(1);
}

fn parse_args(args: &[String]) -> Result<Args> {
    if args.len() < 3 {
        usage();
    }

    let mut parsed = Args {
        scene_path: PathBuf::from(&args[1]),
        output_path: PathBuf::from(&args[2]),
        config_path: None,
        local_transforms: false,
    };

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                let Some(val) = args.get(i + 1) else {
                    bail!("--config requires a path");
                };
                parsed.config_path = Some(PathBuf::from(val));
                i += 2;
            }
            "--local-transforms" => {
                parsed.local_transforms = true;
                i += 1;
            }
            other => bail!("unknown argument '{}'", other),
        }
    }
    Ok(parsed)
}

fn load_options(args: &Args) -> Result<ConvertOptions> {
    let mut options = match &args.config_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?
        }
        None => ConvertOptions::default(),
    };

    if args.local_transforms {
        options.transform_mode = TransformMode::Local;
    }
    // Textures are looked up next to the scene file unless the config says otherwise.
    if options.base_dir.is_none() {
        options.base_dir = args
            .scene_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf);
    }
    Ok(options)
}

/// Buffered write, flushed explicitly so a failed final write is reported.
fn write_output<W: Write + Seek>(mesh: &MstMesh, out: W) -> Result<()> {
    let mut writer = BufWriter::new(out);
    write_mst(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let options = load_options(args)?;

    let text = std::fs::read_to_string(&args.scene_path)
        .with_context(|| format!("Failed to read scene: {}", args.scene_path.display()))?;
    let scene: Scene = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse scene: {}", args.scene_path.display()))?;

    info!("Converting '{}' ...", args.scene_path.display());
    let mesh = convert_scene(Some(&scene), &options);

    let file = File::create(&args.output_path)
        .with_context(|| format!("Failed to create {}", args.output_path.display()))?;
    write_output(&mesh, file)
        .with_context(|| format!("Failed to write {}", args.output_path.display()))?;

    info!(
        "Wrote {} ({} materials, {} nodes, {} instances)",
        args.output_path.display(),
        mesh.materials.len(),
        mesh.nodes.len(),
        mesh.instances.len()
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let result = parse_args(&args).and_then(|a| run(&a));
    if let Err(e) = result {
        eprintln!("Conversion failed: {:?}", e);
        std::process::exit(1);
    }
}
