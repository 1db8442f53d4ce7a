use chrono::DateTime;
use eframe::egui::{Color32, Ui};
use egui_plot::{HLine, Legend, Plot, PlotPoints, Points};

use crate::color::ModeColors;
use crate::data::model::{MatchedFile, TransmissionMode};
use crate::state::SessionState;

// ---------------------------------------------------------------------------
// Density over time (analyzer)
// ---------------------------------------------------------------------------

/// Hours since the earliest parsable detection timestamp, per match.
///
/// Matches whose timestamp does not parse as RFC 3339 are left out.
pub fn hours_since_start<'a>(matches: &[MatchedFile<'a>]) -> Vec<(f64, MatchedFile<'a>)> {
    let stamped: Vec<(i64, MatchedFile<'a>)> = matches
        .iter()
        .filter_map(|m| {
            DateTime::parse_from_rfc3339(&m.detection.timestamp)
                .ok()
                .map(|dt| (dt.timestamp(), *m))
        })
        .collect();
    let Some(start) = stamped.iter().map(|(t, _)| *t).min() else {
        return Vec::new();
    };
    stamped
        .into_iter()
        .map(|(t, m)| ((t - start) as f64 / 3600.0, m))
        .collect()
}

/// Scatter of sardine density against time, one series per transmission mode.
pub fn density_plot(ui: &mut Ui, state: &SessionState, colors: &ModeColors) {
    let matches = state.visible_matches();
    let series = hours_since_start(&matches);
    if series.is_empty() {
        ui.weak("No timestamped detections to plot.");
        return;
    }

    let min_density = state.filters.min_density;

    Plot::new("density_plot")
        .legend(Legend::default())
        .height(220.0)
        .x_axis_label("Hours since first detection")
        .y_axis_label("Sardine density")
        .include_y(0.0)
        .include_y(1.0)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for mode in TransmissionMode::ALL {
                let points: PlotPoints = series
                    .iter()
                    .filter(|(_, m)| m.file.transmission_mode == mode)
                    .map(|(h, m)| [*h, m.detection.sardine_density])
                    .collect();
                if points.points().is_empty() {
                    continue;
                }
                plot_ui.points(
                    Points::new(points)
                        .name(mode.to_string())
                        .color(colors.color_for(mode))
                        .radius(4.0),
                );
            }

            if min_density > 0.0 {
                plot_ui.hline(
                    HLine::new(min_density)
                        .name("Min density")
                        .color(Color32::LIGHT_RED),
                );
            }
        });
}
