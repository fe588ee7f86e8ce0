//! `emg-assist` binary: demo runs and line-protocol streaming
//!
//! # Usage
//!
//! ```bash
//! emg-assist simulate --seed 7
//! emg-assist stream --input /dev/ttyACM0 --output /dev/ttyACM0 --config assist.toml
//! emg-assist stream --input recording.txt --output -
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use emg_assist::actuator::{LogNotifier, SerialCommandSink, SimulatedActuator};
use emg_assist::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use emg_assist::simulation::SignalGenerator;
use emg_assist::{
    AssistResult, AssistService, AssistSession, ConfigLoader, CycleReport, SystemConfig,
};

#[derive(Parser, Debug)]
#[command(name = "emg-assist", version, about = "Closed-loop EMG assist controller")]
struct Args {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, value_enum, default_value_t = LevelArg::Info, global = true)]
    log_level: LevelArg,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Calibrate on synthetic data and run the posture, low-activation and ok demos
    Simulate {
        #[arg(long, default_value_t = 7)]
        seed: u64,

        /// Print cycle reports as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Ingest `EMG:` lines and write `CMD` lines
    Stream {
        /// Sample source, `-` for stdin
        #[arg(short, long, value_name = "PATH")]
        input: String,

        /// Command destination, `-` for stdout; simulated actuator when absent
        #[arg(short, long, value_name = "PATH")]
        output: Option<String>,

        /// TOML configuration file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Seconds of new samples between cycles
        #[arg(long, default_value_t = 0.5)]
        step_s: f64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LevelArg {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LevelArg> for LogLevel {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Trace => LogLevel::Trace,
            LevelArg::Debug => LogLevel::Debug,
            LevelArg::Info => LogLevel::Info,
            LevelArg::Warn => LogLevel::Warn,
            LevelArg::Error => LogLevel::Error,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&LogConfig {
        level: args.log_level.into(),
        format: if args.json_logs { LogFormat::Json } else { LogFormat::Compact },
        ..Default::default()
    });
    tracing::info!("{} v{}", emg_assist::NAME, emg_assist::VERSION);

    match args.command {
        Command::Simulate { seed, json } => simulate(seed, json),
        Command::Stream {
            input,
            output,
            config,
            step_s,
        } => stream(&input, output.as_deref(), config.as_deref(), step_s),
    }
}

fn simulate(seed: u64, json: bool) -> anyhow::Result<()> {
    let config = SystemConfig::default();
    let mut session = AssistSession::new(
        &config,
        Box::new(SimulatedActuator::new(&config.actuator)),
        Box::new(LogNotifier),
    )?;

    let mut generator = SignalGenerator::new(config.assist.sampling_rate_hz, seed);
    let calibration = session
        .calibrate(&generator.reference_recording())
        .context("calibrating on synthetic reference")?;
    println!(
        "calibration: a_ref={:.4} noise={:.4}",
        calibration.a_ref, calibration.noise_level
    );

    // Cycles run once per second over the trailing 3 s window, so the
    // low-activation trial needs repeated presence before assist starts
    let dt = 1.0;
    let trials = [
        ("posture", generator.posture_trial()),
        ("low activation", generator.low_activation_trial(0.1)),
        ("low activation", generator.low_activation_trial(0.1)),
        ("low activation", generator.low_activation_trial(0.1)),
        ("sufficient", generator.sufficient_trial()),
        ("sufficient", generator.sufficient_trial()),
    ];
    for (name, buffer) in trials {
        if let Some(report) = session.run_once(&buffer, dt)? {
            print_report(name, &report, json)?;
        }
    }
    Ok(())
}

fn print_report(name: &str, report: &CycleReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }
    match (report.assessment, report.features) {
        (Some(assessment), Some(features)) => println!(
            "{:<15} state={} label={} conf={:.2} deficit={:.3} mean={:.3} cv={:.3} snr={:.1}dB onset={} u={:.3}",
            name,
            report.state,
            assessment.label,
            assessment.confidence,
            assessment.deficit,
            features.mean_activation,
            features.activation_cv,
            features.snr_db,
            features.onset_index,
            report.assist_ratio()
        ),
        _ => println!("{:<15} state={} u={:.3}", name, report.state, report.assist_ratio()),
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> AssistResult<SystemConfig> {
    let loader = match path {
        Some(path) => ConfigLoader::with_paths(vec![path.to_path_buf()]),
        None => ConfigLoader::new(),
    };
    Ok(loader.load()?)
}

fn open_input(input: &str) -> anyhow::Result<Box<dyn BufRead + Send>> {
    if input == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(input).with_context(|| format!("opening input {}", input))?;
    Ok(Box::new(BufReader::new(file)))
}

fn open_output(output: &str) -> anyhow::Result<Box<dyn Write + Send>> {
    if output == "-" {
        return Ok(Box::new(io::stdout()));
    }
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(output)
        .with_context(|| format!("opening output {}", output))?;
    Ok(Box::new(file))
}

fn stream(
    input: &str,
    output: Option<&str>,
    config_path: Option<&Path>,
    step_s: f64,
) -> anyhow::Result<()> {
    anyhow::ensure!(step_s > 0.0, "--step-s must be positive");
    let config = load_config(config_path).context("loading configuration")?;
    let fs = config.assist.sampling_rate_hz;
    let step_frames = ((step_s * fs) as u64).max(1);
    let calibration_samples = config.calibration_window_samples();

    let service = match output {
        Some(output) => AssistService::new(
            config.clone(),
            Box::new(SerialCommandSink::new(open_output(output)?)),
            Box::new(LogNotifier),
        )?,
        None => AssistService::new(
            config.clone(),
            Box::new(SimulatedActuator::new(&config.actuator)),
            Box::new(LogNotifier),
        )?,
    };

    let (data_ready, wake) = crossbeam::channel::bounded(1);
    let handle = service.ingest_worker().spawn(open_input(input)?, data_ready)?;
    let mut processed_frames = 0u64;

    loop {
        let woke = wake.recv_timeout(Duration::from_millis(100)).is_ok();

        if !service.status().calibrated && service.buffer().reference_len() >= calibration_samples {
            if let Err(e) = service.calibrate() {
                tracing::warn!(error = %e, "calibration failed");
            }
        }

        let frames = handle.frames();
        if frames - processed_frames >= step_frames {
            let dt = (frames - processed_frames) as f64 / fs;
            processed_frames = frames;
            match service.process_latest(dt) {
                Ok(Some(report)) => tracing::info!(
                    state = %report.state,
                    u = report.assist_ratio(),
                    "cycle complete"
                ),
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "cycle failed"),
            }
        }

        if !woke && !handle.is_running() {
            break;
        }
    }

    let stats = handle.join();
    tracing::info!(frames = stats.frames, malformed = stats.malformed, "stream finished");
    tracing::info!(status = %serde_json::to_string(&service.status())?, "final status");
    stats.check().context("sample stream")?;
    Ok(())
}
