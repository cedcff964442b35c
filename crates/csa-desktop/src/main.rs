//! CSA command line - circuit and signal analysis labs with a plot viewer

mod app;
mod figures;

use anyhow::{Context, Result};
use app::SpectrumReload;
use clap::{Parser, Subcommand, ValueEnum};
use csa_acquisition::{collect_samples, spawn_reader, spawn_serial, Collection, SampleCollector, SerialConfig};
use csa_core::CsaError;
use csa_processing::{
    autocorrelation, run_rc_study, run_spwm_study, LabConfig, SensorConfig, SimulatorSpectrum,
    SpectralPeak,
};
use csa_simulation::{CarrierKind, SensorSimulator};
use figures::Figure;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Circuit and signal analysis labs
#[derive(Parser, Debug)]
#[command(name = "csa", version)]
struct Cli {
    /// JSON configuration file; command-line flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results only, without opening the plot viewer
    #[arg(long, global = true)]
    no_plot: bool,

    /// Print a JSON report instead of text lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Euler vs. trapezoidal integration of the RC step response
    Rc {
        /// Steps per time constant (dt = tau / N)
        #[arg(long)]
        dt_fraction: Option<f64>,
        /// Simulated span in time constants
        #[arg(long)]
        periods: Option<f64>,
    },
    /// Time and frequency content of a circuit simulator output file
    Spectrum {
        /// Whitespace-delimited data file
        file: PathBuf,
        #[arg(long)]
        time_col: Option<usize>,
        #[arg(long)]
        pwm_col: Option<usize>,
        #[arg(long)]
        out_col: Option<usize>,
        /// Upper limit of the spectrum view in kHz
        #[arg(long)]
        max_freq_khz: Option<f64>,
    },
    /// Sine-triangle PWM synthesis and audio recovery
    Spwm {
        #[arg(long, value_enum)]
        carrier: Option<CarrierArg>,
    },
    /// Period and frequency of a serial sensor signal
    Sensor {
        #[arg(long)]
        port: Option<String>,
        #[arg(long)]
        baud: Option<u32>,
        /// Valid readings to collect
        #[arg(long)]
        samples: Option<usize>,
        /// Time between readings in seconds
        #[arg(long)]
        interval: Option<f64>,
        /// Read from the built-in simulated sensor instead of a port
        #[arg(long)]
        simulate: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CarrierArg {
    Triangle,
    Sawtooth,
}

impl From<CarrierArg> for CarrierKind {
    fn from(arg: CarrierArg) -> Self {
        match arg {
            CarrierArg::Triangle => CarrierKind::Triangle,
            CarrierArg::Sawtooth => CarrierKind::Sawtooth,
        }
    }
}

/// What a lab run produced
struct Outcome {
    title: &'static str,
    lines: Vec<String>,
    report: serde_json::Value,
    figures: Vec<Figure>,
    reload: Option<SpectrumReload>,
}

#[derive(Debug, Serialize)]
struct SpectrumReport {
    file: PathBuf,
    samples: usize,
    sampling_rate: f64,
    resolution: f64,
    pwm_peak: Option<SpectralPeak>,
    output_peak: Option<SpectralPeak>,
}

#[derive(Debug, Serialize)]
struct SensorReport {
    source: String,
    samples: Vec<i64>,
    skipped: usize,
    period_samples: Option<usize>,
    frequency_hz: Option<f64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => LabConfig::from_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => LabConfig::default(),
    };
    debug!(profile = %config.name, "configuration ready");

    let outcome = match cli.command {
        Command::Rc { dt_fraction, periods } => {
            if let Some(n) = dt_fraction {
                config.rc.steps_per_tau = n;
            }
            if let Some(n) = periods {
                config.rc.time_constants = n;
            }
            rc_lab(&config)?
        }
        Command::Spectrum { file, time_col, pwm_col, out_col, max_freq_khz } => {
            let spectrum = &mut config.spectrum;
            if let Some(c) = time_col {
                spectrum.time_column = c;
            }
            if let Some(c) = pwm_col {
                spectrum.pwm_column = c;
            }
            if let Some(c) = out_col {
                spectrum.output_column = c;
            }
            if let Some(khz) = max_freq_khz {
                spectrum.max_frequency = khz * 1000.0;
            }
            spectrum_lab(&config, &file)?
        }
        Command::Spwm { carrier } => {
            if let Some(kind) = carrier {
                config.spwm.signal.set_carrier(kind.into());
            }
            spwm_lab(&config)?
        }
        Command::Sensor { port, baud, samples, interval, simulate } => {
            let sensor = &mut config.sensor;
            if let Some(p) = port {
                sensor.port = p;
            }
            if let Some(b) = baud {
                sensor.baud_rate = b;
            }
            if let Some(n) = samples {
                sensor.sample_count = n;
            }
            if let Some(dt) = interval {
                sensor.sample_interval = dt;
            }
            sensor_lab(&config.sensor, simulate)?
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    } else {
        for line in &outcome.lines {
            println!("{}", line);
        }
    }

    if !cli.no_plot {
        app::run(outcome.title, outcome.figures, outcome.reload)?;
    }

    Ok(())
}

fn rc_lab(config: &LabConfig) -> Result<Outcome> {
    let study = run_rc_study(&config.rc).context("RC study failed")?;
    let report = study.report();

    let mut lines = vec![format!(
        "tau = {:.6} s, dt = {:.6} s, {} steps",
        report.tau, report.dt, report.steps
    )];
    for method in &report.methods {
        lines.push(format!(
            "{}: max |error| = {:.6e} V, rms = {:.6e} V, final = {:.6} V",
            method.method.name(),
            method.max_abs_error,
            method.rms_error,
            method.final_voltage
        ));
    }

    Ok(Outcome {
        title: "RC circuit response to a current step",
        lines,
        report: serde_json::to_value(&report)?,
        figures: figures::rc_figures(&study),
        reload: None,
    })
}

fn spectrum_lab(config: &LabConfig, file: &Path) -> Result<Outcome> {
    let result = SimulatorSpectrum::from_file(file, &config.spectrum)
        .with_context(|| format!("analysing {}", file.display()))?;

    let report = SpectrumReport {
        file: file.to_path_buf(),
        samples: result.pwm.len(),
        sampling_rate: result.pwm.sampling_rate(),
        resolution: result.pwm_spectrum.resolution(),
        pwm_peak: result.pwm_spectrum.peak(true),
        output_peak: result.output_spectrum.peak(true),
    };

    let mut lines = vec![format!(
        "{} samples at {:.1} Hz (resolution {:.3} Hz)",
        report.samples, report.sampling_rate, report.resolution
    )];
    for (name, peak) in [("Vspwm", report.pwm_peak), ("Vout", report.output_peak)] {
        if let Some(p) = peak {
            lines.push(format!(
                "{} peak: {:.2} Hz ({:.1} dB)",
                name,
                p.frequency,
                p.magnitude_db()
            ));
        }
    }

    Ok(Outcome {
        title: "Simulator output spectrum",
        lines,
        report: serde_json::to_value(&report)?,
        figures: figures::spectrum_figures(&result, config.spectrum.max_frequency),
        reload: Some(SpectrumReload {
            config: config.spectrum.clone(),
            source: file.to_path_buf(),
        }),
    })
}

fn spwm_lab(config: &LabConfig) -> Result<Outcome> {
    let study = run_spwm_study(&config.spwm).context("SPWM study failed")?;
    let report = &study.report;

    let lines = vec![
        format!("{} samples, duty cycle {:.3}", report.samples, report.duty_cycle),
        format!(
            "Recovered tone correlation: {:.4} (window {} samples)",
            report.recovered_correlation, report.recovery_window
        ),
        format!("Integral correlation: {:.4}", report.integral_correlation),
        format!("Euler/trapezoidal gap: {:.4}", report.euler_trapezoidal_gap),
    ];

    Ok(Outcome {
        title: "SPWM synthesis and recovery",
        lines,
        report: serde_json::to_value(report)?,
        figures: figures::spwm_figures(&study),
        reload: None,
    })
}

fn sensor_lab(sensor: &SensorConfig, simulate: bool) -> Result<Outcome> {
    sensor.validate()?;
    let runtime = tokio::runtime::Runtime::new().context("creating tokio runtime")?;

    let source = if simulate { "simulated".to_string() } else { sensor.port.clone() };
    let collection = runtime.block_on(acquire(sensor, simulate))?;
    info!(samples = collection.samples.len(), skipped = collection.skipped, "samples collected");

    let estimator = sensor.estimator()?;
    let (estimate, lines) = match estimator.estimate_counts(&collection.samples) {
        Ok(estimate) => {
            let lines = vec![
                format!("Estimated period: {} samples", estimate.period_samples),
                format!("Estimated frequency: {:.2} Hz", estimate.frequency_hz),
            ];
            (Some(estimate), lines)
        }
        Err(CsaError::PeriodNotFound) => (None, vec!["No clear period detected.".to_string()]),
        Err(e) => return Err(e.into()),
    };

    let samples: Vec<f64> = collection.samples.iter().map(|&v| v as f64).collect();
    let autocorr = match &estimate {
        Some(e) => e.autocorrelation.clone(),
        None => autocorrelation(&samples)?,
    };

    let report = SensorReport {
        source,
        samples: collection.samples.clone(),
        skipped: collection.skipped,
        period_samples: estimate.as_ref().map(|e| e.period_samples),
        frequency_hz: estimate.as_ref().map(|e| e.frequency_hz),
    };

    Ok(Outcome {
        title: "Sensor signal",
        lines,
        report: serde_json::to_value(&report)?,
        figures: figures::sensor_figures(&samples, &autocorr, estimate.as_ref()),
        reload: None,
    })
}

async fn acquire(sensor: &SensorConfig, simulate: bool) -> Result<Collection> {
    let timeout = sensor.timeout()?;

    let stream = if simulate {
        let mut sim_config = sensor.simulation.clone();
        sim_config.sample_interval = sensor.sample_interval;
        let reader = SensorSimulator::new(sim_config)?.into_reader(sensor.sample_count);
        spawn_reader(reader, SampleCollector::new(sensor.sample_count, timeout)?)
    } else {
        spawn_serial(SerialConfig {
            port: sensor.port.clone(),
            baud_rate: sensor.baud_rate,
            sample_count: sensor.sample_count,
            timeout,
            ..SerialConfig::default()
        })?
    };

    // The reader's own deadline fires first and reports an exact count
    let limit = timeout.saturating_add(Duration::from_secs(1));
    let collection = collect_samples(stream, limit)
        .await
        .with_context(|| format!("reading sensor ({})", if simulate { "simulated" } else { sensor.port.as_str() }))?;
    Ok(collection)
}
