use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use encquery::cli::{self, Commands, PresetAction, QueueAction};
use encquery::config::Config;
use encquery::engine::presets::{Preset, PresetStore, QueueStore};
use encquery::engine::validate::validate_settings;
use encquery::engine::{
    VideoEncoder, generate_preview_query, generate_query, parse_query, quality_from_slider, x264,
};

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_presets(path: &Path) -> Result<PresetStore> {
    if !path.exists() {
        return Ok(PresetStore::new());
    }
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read presets file: {}", path.display()))?;
    PresetStore::from_json(&json)
        .with_context(|| format!("Failed to parse presets file: {}", path.display()))
}

fn load_queue(path: &Path) -> Result<QueueStore> {
    if !path.exists() {
        return Ok(QueueStore::new());
    }
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read queue file: {}", path.display()))?;
    QueueStore::from_json(&json)
        .with_context(|| format!("Failed to parse queue file: {}", path.display()))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

fn run_preset(action: PresetAction, config: &Config) -> Result<()> {
    let presets_path = config.presets_path()?;
    let mut user = load_presets(&presets_path)?;

    match action {
        PresetAction::List => {
            let mut all = PresetStore::builtin();
            all.merge(user);
            let mut category = None;
            for preset in all.iter() {
                let label = if preset.built_in {
                    preset.category.as_str()
                } else {
                    "User"
                };
                if category != Some(label) {
                    println!("{}", label);
                    category = Some(label);
                }
                println!("  {}", preset.name);
            }
        }
        PresetAction::Show { name } => {
            let mut all = PresetStore::builtin();
            all.merge(user);
            let preset = all
                .get(&name)
                .with_context(|| format!("Preset '{}' not found", name))?;
            println!("{}", preset.query);
            println!("{}", serde_json::to_string_pretty(&preset.settings())?);
        }
        PresetAction::Add {
            name,
            query,
            picture_settings,
        } => {
            if PresetStore::builtin().get(&name).is_some() {
                bail!("Preset '{}' is built in", name);
            }
            user.add(Preset::new(&name, query, picture_settings))?;
            write_file(&presets_path, &user.to_json()?)?;
            println!("Added preset '{}'", name);
        }
        PresetAction::Remove { name } => {
            user.remove(&name)?;
            write_file(&presets_path, &user.to_json()?)?;
            println!("Removed preset '{}'", name);
        }
    }
    Ok(())
}

fn run_queue(action: QueueAction, config: &Config) -> Result<()> {
    let queue_path = config.queue_path()?;
    let mut queue = load_queue(&queue_path)?;

    match action {
        QueueAction::List => {
            for item in queue.iter() {
                println!("{}  {:?}  {}", item.id, item.status, item.query);
            }
        }
        QueueAction::Add { settings } => {
            let settings = config.load_settings(&settings)?;
            if queue.has_destination(&settings.destination) {
                bail!(
                    "Another queued encode already writes to {}",
                    settings.destination
                );
            }
            let id = queue.enqueue(&settings);
            write_file(&queue_path, &queue.to_json()?)?;
            println!("{}", id);
        }
        QueueAction::Remove { id } => {
            queue.remove(id)?;
            write_file(&queue_path, &queue.to_json()?)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = cli::parse();
    init_logging(cli.verbose);

    let config = Config::load()?;
    debug!(?config, "loaded config");

    match cli.command {
        Commands::Generate {
            settings,
            preview,
            duration,
            with_program,
        } => {
            let settings = config.load_settings(&settings)?;
            let query = match preview {
                Some(index) => generate_preview_query(&settings, index, duration),
                None => generate_query(&settings),
            };
            match with_program {
                Some(program) => {
                    let program =
                        shlex::try_quote(&program).context("Program path can not be quoted")?;
                    println!("{} {}", program, query);
                }
                None => println!("{}", query),
            }
        }
        Commands::Parse { query } => {
            let settings = parse_query(&query);
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Commands::Standardize { options } => {
            println!("{}", x264::standardize(&options));
        }
        Commands::Validate { settings } => {
            let settings = config.load_settings(&settings)?;
            match validate_settings(&settings) {
                Ok(()) => println!("OK"),
                Err(errors) => {
                    println!("{}", serde_json::to_string_pretty(&errors)?);
                    std::process::exit(1);
                }
            }
        }
        Commands::Quality { encoder, slider } => {
            let encoder = VideoEncoder::from_cli_token(&encoder)
                .with_context(|| format!("Unknown video encoder '{}'", encoder))?;
            let quality = quality_from_slider(encoder, slider, config.defaults.x264_cq_step);
            println!("{}", encquery::engine::format_decimal(quality));
        }
        Commands::Preset { action } => run_preset(action, &config)?,
        Commands::Queue { action } => run_queue(action, &config)?,
        Commands::InitConfig => {
            let config_path = Config::config_path()?;
            if Config::exists() {
                println!("Config file exists at: {}", config_path.display());
            } else {
                Config::ensure_default()?;
                println!("Created default config at: {}", config_path.display());
            }
        }
    }

    Ok(())
}
