//! Plot viewer window

use crate::figures::{spectrum_figures, Figure, LineKind};
use anyhow::anyhow;
use csa_processing::{SimulatorSpectrum, SpectrumConfig};
use egui_plot::{Legend, Line, LineStyle, Plot, PlotPoints};
use std::path::PathBuf;
use tracing::{info, warn};

/// Enables "Open data file…" for the spectrum lab
#[derive(Debug, Clone)]
pub struct SpectrumReload {
    pub config: SpectrumConfig,
    pub source: PathBuf,
}

/// Figures of one run, shown one at a time as tabs
pub struct LabApp {
    figures: Vec<Figure>,
    selected: usize,
    reload: Option<SpectrumReload>,
    status: Option<String>,
}

impl LabApp {
    pub fn new(figures: Vec<Figure>, reload: Option<SpectrumReload>) -> Self {
        Self {
            figures,
            selected: 0,
            reload,
            status: None,
        }
    }

    fn open_data_file(&mut self) {
        let Some(reload) = self.reload.as_mut() else {
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Simulator output", &["dat", "txt", "csv"])
            .pick_file()
        else {
            return;
        };

        match SimulatorSpectrum::from_file(&path, &reload.config) {
            Ok(result) => {
                info!(file = %path.display(), "reloaded spectrum");
                self.figures = spectrum_figures(&result, reload.config.max_frequency);
                self.selected = self.selected.min(self.figures.len().saturating_sub(1));
                self.status = Some(format!("Loaded {}", path.display()));
                reload.source = path;
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "could not load data file");
                self.status = Some(format!("{}: {}", path.display(), e));
            }
        }
    }

    fn show_figure(ui: &mut egui::Ui, id: usize, figure: &Figure) {
        ui.heading(&figure.title);

        Plot::new(("lab_figure", id))
            .legend(Legend::default())
            .x_axis_label(figure.x_label.clone())
            .y_axis_label(figure.y_label.clone())
            .allow_zoom(true)
            .allow_drag(true)
            .show(ui, |plot_ui| {
                for series in &figure.series {
                    let [r, g, b] = series.color;
                    let style = match series.style {
                        LineKind::Solid => LineStyle::Solid,
                        LineKind::Dashed => LineStyle::dashed_loose(),
                        LineKind::Dotted => LineStyle::dotted_dense(),
                    };
                    let line = Line::new(PlotPoints::from(figure.display_points(series)))
                        .name(&series.name)
                        .color(egui::Color32::from_rgb(r, g, b))
                        .style(style);
                    plot_ui.line(line);
                }
            });
    }
}

impl eframe::App for LabApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("figure_tabs").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                if self.reload.is_some() {
                    if ui.button("Open data file…").clicked() {
                        self.open_data_file();
                    }
                    if let Some(reload) = &self.reload {
                        ui.label(reload.source.display().to_string());
                    }
                    ui.separator();
                }
                for (i, figure) in self.figures.iter().enumerate() {
                    ui.selectable_value(&mut self.selected, i, &figure.title);
                }
            });
            if let Some(status) = &self.status {
                ui.label(status);
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.figures.get(self.selected) {
            Some(figure) => Self::show_figure(ui, self.selected, figure),
            None => {
                ui.label("Nothing to plot");
            }
        });
    }
}

/// Open the viewer and block until its window is closed
pub fn run(title: &str, figures: Vec<Figure>, reload: Option<SpectrumReload>) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 700.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    let app = LabApp::new(figures, reload);
    eframe::run_native(title, options, Box::new(move |_cc| Ok(Box::new(app))))
        .map_err(|e| anyhow!("Failed to run plot viewer: {}", e))
}
