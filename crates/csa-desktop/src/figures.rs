//! Plot descriptions for each lab, independent of the rendering backend

use csa_processing::period::PeriodEstimate;
use csa_processing::spectrum::Spectrum;
use csa_processing::{IntegrationMethod, RcStudy, SimulatorSpectrum, SpwmStudy};
use csa_core::Signal;

pub const BLACK: [u8; 3] = [20, 20, 20];
pub const RED: [u8; 3] = [220, 60, 60];
pub const BLUE: [u8; 3] = [60, 110, 220];
pub const GREEN: [u8; 3] = [60, 170, 90];
pub const ORANGE: [u8; 3] = [240, 150, 40];
pub const PURPLE: [u8; 3] = [150, 80, 200];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Solid,
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisScale {
    Linear,
    /// Values are drawn as log10; non-positive points are dropped
    Log10,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub color: [u8; 3],
    pub style: LineKind,
}

impl Series {
    pub fn new(name: impl Into<String>, points: Vec<[f64; 2]>, color: [u8; 3]) -> Self {
        Self {
            name: name.into(),
            points,
            color,
            style: LineKind::Solid,
        }
    }

    pub fn styled(mut self, style: LineKind) -> Self {
        self.style = style;
        self
    }

    /// Signal against time, with time multiplied by `time_scale`
    pub fn from_signal(name: impl Into<String>, signal: &Signal, time_scale: f64, color: [u8; 3]) -> Self {
        let points = signal.points().map(|(t, v)| [t * time_scale, v]).collect();
        Self::new(name, points, color)
    }

    /// Samples against their index
    pub fn from_samples(name: impl Into<String>, samples: &[f64], color: [u8; 3]) -> Self {
        let points = samples
            .iter()
            .enumerate()
            .map(|(i, &v)| [i as f64, v])
            .collect();
        Self::new(name, points, color)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub y_scale: AxisScale,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<String>, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            y_scale: AxisScale::Linear,
            series: Vec::new(),
        }
    }

    pub fn log_y(mut self) -> Self {
        self.y_scale = AxisScale::Log10;
        self
    }

    pub fn with(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    /// Points of `series` as they should be drawn on this figure's axes
    pub fn display_points(&self, series: &Series) -> Vec<[f64; 2]> {
        match self.y_scale {
            AxisScale::Linear => series.points.clone(),
            AxisScale::Log10 => series.points
                .iter()
                .filter(|p| p[1] > 0.0)
                .map(|p| [p[0], p[1].log10()])
                .collect(),
        }
    }
}

fn method_look(method: IntegrationMethod) -> ([u8; 3], LineKind) {
    match method {
        IntegrationMethod::ForwardEuler => (RED, LineKind::Dashed),
        IntegrationMethod::Trapezoidal => (BLUE, LineKind::Dotted),
        IntegrationMethod::ImplicitTrapezoidal => (GREEN, LineKind::Dashed),
    }
}

pub fn rc_figures(study: &RcStudy) -> Vec<Figure> {
    let mut response = Figure::new("RC step response", "Time (s)", "Voltage (V)")
        .with(Series::from_signal("Exact solution", &study.exact, 1.0, BLACK));
    let mut errors = Figure::new("Integration error", "Time (s)", "log10 |error| (V)").log_y();

    for run in &study.runs {
        let (color, style) = method_look(run.method);
        response = response.with(Series::from_signal(run.method.name(), &run.voltage, 1.0, color).styled(style));
        errors = errors.with(
            Series::from_signal(format!("{} error", run.method.name()), &run.error, 1.0, color).styled(style),
        );
    }

    vec![response, errors]
}

fn spectrum_series(name: &str, spectrum: &Spectrum, max_frequency: f64, color: [u8; 3]) -> Series {
    let clipped = spectrum.clipped(max_frequency);
    let points = clipped.frequencies
        .iter()
        .zip(clipped.magnitude_db())
        .map(|(&f, db)| [f / 1000.0, db])
        .collect();
    Series::new(name, points, color)
}

pub fn spectrum_figures(result: &SimulatorSpectrum, max_frequency: f64) -> Vec<Figure> {
    let time = Figure::new("Time-domain signals", "Time (ms)", "Voltage (V)")
        .with(Series::from_signal("Vspwm (PWM)", &result.pwm, 1e3, RED))
        .with(Series::from_signal("Vout (filtered)", &result.output, 1e3, BLUE));

    let freq = Figure::new("FFT magnitude", "Frequency (kHz)", "Magnitude (dB)")
        .with(spectrum_series("FFT Vspwm", &result.pwm_spectrum, max_frequency, RED))
        .with(spectrum_series("FFT Vout", &result.output_spectrum, max_frequency, BLUE));

    vec![time, freq]
}

pub fn spwm_figures(study: &SpwmStudy) -> Vec<Figure> {
    let signals = &study.signals;
    vec![
        Figure::new("Audio signal", "Time (ms)", "Amplitude")
            .with(Series::from_signal("Audio", &signals.audio, 1e3, BLUE)),
        Figure::new("Carrier", "Time (ms)", "Amplitude")
            .with(Series::from_signal("Carrier", &signals.carrier, 1e3, ORANGE)),
        Figure::new("SPWM (comparator output)", "Time (ms)", "Level")
            .with(Series::from_signal("SPWM", &signals.spwm, 1e3, PURPLE)),
        Figure::new("Integrated signal (filter)", "Time (ms)", "Normalised amplitude")
            .with(Series::from_signal("Euler", &study.integrated_euler, 1e3, RED))
            .with(Series::from_signal("Trapezoidal", &study.integrated_trapezoidal, 1e3, BLUE).styled(LineKind::Dashed)),
        Figure::new("Recovered audio", "Time (ms)", "Normalised amplitude")
            .with(Series::from_signal("Audio", &signals.audio, 1e3, BLACK))
            .with(Series::from_signal("Recovered", &study.recovered, 1e3, GREEN).styled(LineKind::Dashed)),
    ]
}

pub fn sensor_figures(samples: &[f64], autocorrelation: &[f64], estimate: Option<&PeriodEstimate>) -> Vec<Figure> {
    let signal = Figure::new("Sensor signal", "Sample", "Amplitude")
        .with(Series::from_samples("Raw samples", samples, BLUE));

    let mut autocorr = Figure::new("Signal autocorrelation", "Lag", "Value")
        .with(Series::from_samples("Autocorrelation", autocorrelation, ORANGE));

    if let Some(estimate) = estimate {
        let lag = estimate.period_samples as f64;
        let top = autocorrelation.get(estimate.period_samples).copied().unwrap_or(0.0);
        autocorr = autocorr.with(
            Series::new(format!("Period ({} samples)", estimate.period_samples), vec![[lag, 0.0], [lag, top]], RED)
                .styled(LineKind::Dashed),
        );
    }

    vec![signal, autocorr]
}

#[cfg(test)]
mod tests {
    use super::*;
    use csa_processing::{run_rc_study, run_spwm_study, RcStudyConfig, SpwmStudyConfig};

    #[test]
    fn test_log_axis_drops_non_positive() {
        let figure = Figure::new("e", "x", "y").log_y();
        let series = Series::new("s", vec![[0.0, 0.0], [1.0, 100.0], [2.0, -1.0]], RED);
        assert_eq!(figure.display_points(&series), vec![[1.0, 2.0]]);
    }

    #[test]
    fn test_rc_figures() {
        let study = run_rc_study(&RcStudyConfig::default()).unwrap();
        let figures = rc_figures(&study);

        assert_eq!(figures.len(), 2);
        assert_eq!(figures[0].series.len(), 3);
        assert_eq!(figures[0].series[0].name, "Exact solution");
        assert_eq!(figures[1].y_scale, AxisScale::Log10);
        assert_eq!(figures[1].series[0].style, LineKind::Dashed);
    }

    #[test]
    fn test_spwm_figures_in_milliseconds() {
        let study = run_spwm_study(&SpwmStudyConfig::default()).unwrap();
        let figures = spwm_figures(&study);

        assert_eq!(figures.len(), 5);
        let last_t = figures[0].series[0].points.last().unwrap()[0];
        assert!(last_t > 1.9 && last_t < 2.0);
    }

    #[test]
    fn test_sensor_figures_without_period() {
        let figures = sensor_figures(&[1.0, 2.0, 3.0], &[2.0, 0.0, -2.0], None);
        assert_eq!(figures[1].series.len(), 1);
        assert_eq!(figures[0].series[0].points[2], [2.0, 3.0]);
    }
}
