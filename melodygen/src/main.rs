// melodygen CLI: audition the sequencer engine without a host.
//
// Drives a `SequencerEngine` from a square-wave clock and writes the result
// to a MIDI file, or prints the scale catalog and host parameter table.
//
// Usage:
//   melodygen render [OUTPUT.mid] [--settings FILE] [--config FILE]
//     [--scale NAME|INDEX] [--key NAME|INDEX] [--range N] [--disjunction X]
//     [--rest X] [--trill X] [--repeat X] [--gravity X] [--trill-rate X]
//     [--bpm BPM] [--duty X] [--beats N] [--seed N] [--guard-window OCTAVES]
//   melodygen scales
//   melodygen params
//
// Logging goes through env_logger; set RUST_LOG=debug (or trace) for engine
// detail.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use env_logger::Env;

use melodygen::midi::{MidiSettings, write_midi};
use melodygen::params::PARAMS;
use melodygen::render::{ClockDriver, render_events};
use melodygen::scale::{KEY_NAMES, ScaleId};
use melodygen::{Configuration, EngineSettings, SequencerEngine};

#[derive(Parser)]
#[command(name = "melodygen")]
#[command(about = "Gate-triggered melodic sequence generator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the engine against a clock and write the notes to a MIDI file
    Render(RenderArgs),
    /// List the scale catalog
    Scales,
    /// Print the host parameter table as JSON
    Params,
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Output MIDI file
    #[arg(default_value = "melodygen.mid")]
    output: PathBuf,

    /// Engine settings JSON
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Knob configuration JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scale by name ("dorian", "harmonic minor") or catalog index
    #[arg(long)]
    scale: Option<String>,

    /// Key by name ("D", "Bb") or semitone offset above C
    #[arg(long)]
    key: Option<String>,

    /// Octave range, 1-5
    #[arg(long)]
    range: Option<u8>,

    #[arg(long)]
    disjunction: Option<f32>,

    /// Rest probability
    #[arg(long)]
    rest: Option<f32>,

    /// Trill probability
    #[arg(long)]
    trill: Option<f32>,

    /// Probability that a repeated note is allowed to stand
    #[arg(long)]
    repeat: Option<f32>,

    /// Root gravity
    #[arg(long)]
    gravity: Option<f32>,

    /// Trill rate, 0-10
    #[arg(long)]
    trill_rate: Option<f32>,

    /// Clock tempo; one trigger per beat
    #[arg(long, default_value = "120")]
    bpm: f32,

    /// Fraction of each beat the trigger stays high
    #[arg(long, default_value = "0.5")]
    duty: f32,

    /// Number of beats to render
    #[arg(long, default_value = "32")]
    beats: u32,

    /// PRNG seed (overrides the settings file)
    #[arg(long)]
    seed: Option<u64>,

    /// Guard window in octaves (overrides the settings file)
    #[arg(long)]
    guard_window: Option<f32>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Render(args) => render(args),
        Commands::Scales => {
            for id in ScaleId::ALL {
                let offsets: Vec<String> =
                    id.scale().offsets().iter().map(u8::to_string).collect();
                println!("{:>2}  {:<15} [{}]", id.index(), id.name(), offsets.join(", "));
            }
            Ok(())
        }
        Commands::Params => {
            println!("{}", serde_json::to_string_pretty(&PARAMS)?);
            Ok(())
        }
    }
}

fn render(args: RenderArgs) -> Result<()> {
    let mut settings = match &args.settings {
        Some(path) => EngineSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => EngineSettings::default(),
    };
    if args.seed.is_some() {
        settings.seed = args.seed;
    }
    if let Some(window) = args.guard_window {
        settings.guard_window_octaves = window;
    }

    let mut config = match &args.config {
        Some(path) => Configuration::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Configuration::default(),
    };
    if let Some(scale) = &args.scale {
        config.scale_index = parse_scale(scale)?.index();
    }
    if let Some(key) = &args.key {
        config.key = parse_key(key)?;
    }
    if let Some(range) = args.range {
        config.octave_range = range;
    }
    if let Some(v) = args.disjunction {
        config.disjunction = v;
    }
    if let Some(v) = args.rest {
        config.rest_probability = v;
    }
    if let Some(v) = args.trill {
        config.trill_probability = v;
    }
    if let Some(v) = args.repeat {
        config.repeat_probability = v;
    }
    if let Some(v) = args.gravity {
        config.root_gravity = v;
    }
    if let Some(v) = args.trill_rate {
        config.trill_rate = v;
    }

    let resolved = config.resolve();
    log::info!(
        "scale {} in {}, {} octave(s), {} beats at {} bpm",
        ScaleId::ALL[resolved.scale_index].name(),
        KEY_NAMES[usize::from(resolved.key)],
        resolved.octave_range,
        args.beats,
        args.bpm
    );

    let sample_rate = settings.sample_rate;
    let mut engine = SequencerEngine::new(settings).context("building engine")?;
    let clock = ClockDriver::from_bpm(args.bpm, sample_rate, args.duty)
        .with_context(|| format!("building a {} bpm clock", args.bpm))?;
    let samples = clock.period_samples() * u64::from(args.beats);
    let events = render_events(&mut engine, config, clock, samples);

    let midi = MidiSettings {
        tempo_bpm: args.bpm,
        sample_rate,
        ..Default::default()
    };
    write_midi(&events, &midi, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    Ok(())
}

fn parse_scale(text: &str) -> Result<ScaleId> {
    if let Ok(index) = text.parse::<usize>() {
        return ScaleId::from_index(index).with_context(|| {
            format!("scale index {index} out of range (0-{})", ScaleId::ALL.len() - 1)
        });
    }
    match ScaleId::parse(text) {
        Some(id) => Ok(id),
        None => bail!("unknown scale '{text}'; run `melodygen scales` for the list"),
    }
}

fn parse_key(text: &str) -> Result<u8> {
    if let Ok(index) = text.parse::<u8>() {
        if usize::from(index) < KEY_NAMES.len() {
            return Ok(index);
        }
        bail!("key {index} out of range (0-11)");
    }
    KEY_NAMES
        .iter()
        .position(|name| name.eq_ignore_ascii_case(text))
        .map(|i| i as u8)
        .with_context(|| format!("unknown key '{text}'; expected one of {}", KEY_NAMES.join(" ")))
}
