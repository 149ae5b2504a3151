//! focus-sounds - play and inspect procedural focus sounds

use clap::{Parser, Subcommand};
use focus_sounds_lib::audio::catalog::{available, grouped_by_category, CATALOG};
use focus_sounds_lib::{EngineConfig, FocusNoisePlayer, SoundServer, SoundType};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "focus-sounds")]
#[command(about = "Procedural focus sound engine")]
#[command(version)]
struct Cli {
    /// Engine config (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sound catalog
    List {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,

        /// Only sounds available without premium
        #[arg(long)]
        free: bool,
    },

    /// Play a sound on the default output device
    Play {
        /// Sound id or display name, e.g. `pink` or "Soft Rain"
        sound: String,

        /// Stop after this many seconds
        #[arg(short, long, default_value_t = 30.0)]
        seconds: f32,
    },

    /// Render a sound offline and print level statistics
    Render {
        sound: String,

        #[arg(short, long, default_value_t = 5.0)]
        seconds: f32,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match cli.config.as_deref().map(EngineConfig::load).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::List { json, free } => list(json, free),
        Commands::Play { sound, seconds } => match parse_sound(&sound) {
            Some(sound) => play(config, sound, seconds),
            None => return ExitCode::FAILURE,
        },
        Commands::Render {
            sound,
            seconds,
            seed,
        } => match parse_sound(&sound) {
            Some(sound) => render(&config, sound, seconds, seed),
            None => return ExitCode::FAILURE,
        },
    }

    ExitCode::SUCCESS
}

fn parse_sound(name: &str) -> Option<SoundType> {
    let sound = SoundType::from_name(name);
    if sound.is_none() {
        error!("Unknown sound '{}'. Run `focus-sounds list` to see the catalog.", name);
    }
    sound
}

fn parse_duration(seconds: f32) -> Option<Duration> {
    match Duration::try_from_secs_f32(seconds) {
        Ok(duration) => Some(duration),
        Err(e) => {
            error!("Invalid --seconds {}: {}", seconds, e);
            None
        }
    }
}

fn list(json: bool, free: bool) {
    if json {
        let infos: Vec<_> = CATALOG
            .iter()
            .filter(|info| !free || !info.is_premium)
            .collect();
        match serde_json::to_string_pretty(&infos) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("Could not serialize catalog: {}", e),
        }
        return;
    }

    let allowed: Vec<SoundType> = available(!free).collect();
    for (category, sounds) in grouped_by_category() {
        let sounds: Vec<_> = sounds.into_iter().filter(|s| allowed.contains(s)).collect();
        if sounds.is_empty() {
            continue;
        }
        println!("{}", category.display_name());
        for sound in sounds {
            let mut tags = Vec::new();
            if sound.requires_stereo() {
                tags.push("stereo");
            }
            if sound.is_premium() {
                tags.push("premium");
            }
            let tags = if tags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", tags.join(", "))
            };
            println!("  {:<16} {}{}", sound.id(), sound.display_name(), tags);
        }
    }
}

fn play(config: EngineConfig, sound: SoundType, seconds: f32) {
    let Some(duration) = parse_duration(seconds) else {
        return;
    };

    let mut player = FocusNoisePlayer::new(config);
    player.play(sound);
    if !player.is_playing() {
        error!("Playback did not start");
        return;
    }

    info!("Playing {} for {:.0}s", sound.display_name(), seconds);
    std::thread::sleep(duration);
    player.release();
}

fn render(config: &EngineConfig, sound: SoundType, seconds: f32, seed: Option<u64>) {
    let Some(duration) = parse_duration(seconds) else {
        return;
    };

    let mut server = match seed {
        Some(seed) => SoundServer::from_config_seeded(config, seed),
        None => SoundServer::from_config(config),
    };
    let frames = (duration.as_secs_f64() * config.sample_rate as f64) as usize;
    let samples = server.generate(sound, frames);

    let peak = samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
    let rms = if samples.is_empty() {
        0.0
    } else {
        let energy: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        (energy / samples.len() as f64).sqrt()
    };

    println!(
        "{}: {} frames x {} channel(s), peak {}, rms {:.1}",
        sound.display_name(),
        frames,
        sound.channels(),
        peak,
        rms
    );
}
