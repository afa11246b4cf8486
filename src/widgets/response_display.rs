//! Response display widget.
//!
//! Draws the log-frequency grid, the live analyzer path and the filter
//! response curve in one panel. Both axes come from the curve's
//! [`ResponseConfig`]; the response uses the left gain scale, the analyzer
//! the right.

use eframe::egui::{self, Color32, Pos2, Rect, Response, Sense, Stroke, Ui, Vec2};

use crate::analysis::response::{ResponseConfig, ResponseCurve};
use crate::analysis::scale::{jmap, map_to_log10};
use crate::app::theme;

/// Frequencies that get a vertical grid line.
pub const GRID_FREQUENCIES: [f32; 10] = [20.0, 50.0, 100.0, 200.0, 500.0, 1000.0, 2000.0, 5000.0, 10000.0, 20000.0];

/// Gains that get a horizontal grid line.
pub const GRID_GAINS: [f32; 5] = [-24.0, -12.0, 0.0, 12.0, 24.0];

/// Configuration for the response display.
#[derive(Clone, Debug)]
pub struct ResponseDisplayConfig {
    /// Size of the whole widget, labels included.
    pub size: Vec2,
    /// Space reserved around the plot for axis labels.
    pub margin: f32,
    /// Analyzer floor (right scale runs from here to 0 dB).
    pub analyzer_floor_db: f32,
    pub line_thickness: f32,
    pub show_analyzer: bool,
}

impl Default for ResponseDisplayConfig {
    fn default() -> Self {
        Self {
            size: Vec2::new(720.0, 300.0),
            margin: 24.0,
            analyzer_floor_db: -48.0,
            line_thickness: 2.0,
            show_analyzer: true,
        }
    }
}

impl ResponseDisplayConfig {
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = Vec2::new(width, height);
        self
    }

    pub fn with_analyzer(mut self, show: bool) -> Self {
        self.show_analyzer = show;
        self
    }

    pub fn with_analyzer_floor(mut self, floor_db: f32) -> Self {
        self.analyzer_floor_db = floor_db;
        self
    }

    /// The area curves are drawn into, inside the label margins.
    pub fn plot_rect(&self, rect: Rect) -> Rect {
        rect.shrink2(Vec2::new(self.margin, self.margin * 0.5))
    }
}

fn freq_to_x(range: &ResponseConfig, freq: f32, plot: Rect) -> f32 {
    plot.left() + map_to_log10(freq, range.min_freq, range.max_freq) * plot.width()
}

fn db_to_y(range: &ResponseConfig, db: f32, plot: Rect) -> f32 {
    jmap(db, range.min_db, range.max_db, plot.bottom(), plot.top())
}

/// Short label for a grid frequency ("500", "2k").
pub fn frequency_label(freq: f32) -> String {
    if freq >= 1000.0 {
        format!("{}k", freq / 1000.0)
    } else {
        format!("{}", freq)
    }
}

/// Draws the display.
///
/// `response_points` is scratch space for the response path.
/// Returns the widget response and the plot rectangle, which is where an
/// analyzer path for the next frame should be generated.
pub fn response_display(
    ui: &mut Ui,
    curve: &ResponseCurve,
    analyzer_path: &[Pos2],
    response_points: &mut Vec<Pos2>,
    config: &ResponseDisplayConfig,
) -> (Response, Rect) {
    let (rect, response) = ui.allocate_exact_size(config.size, Sense::hover());
    let plot = config.plot_rect(rect);

    if ui.is_rect_visible(rect) {
        let painter = ui.painter();
        painter.rect_filled(rect, theme::ROUNDING_SMALL, theme::background::DISPLAY);
        draw_grid(painter, plot, curve.config(), config);

        let clipped = painter.with_clip_rect(plot);
        if config.show_analyzer {
            draw_path(&clipped, analyzer_path, theme::curve::ANALYZER, 1.0);
        }

        curve.generate_path(plot, response_points);
        draw_path(&clipped, response_points, theme::curve::RESPONSE, config.line_thickness);

        painter.rect_stroke(plot, 0.0, Stroke::new(1.0, Color32::from_rgb(50, 55, 70)));
    }

    (response, plot)
}

fn draw_grid(painter: &egui::Painter, plot: Rect, range: &ResponseConfig, config: &ResponseDisplayConfig) {
    let grid = Stroke::new(1.0, theme::curve::GRID);
    let font = egui::FontId::proportional(9.0);

    for freq in GRID_FREQUENCIES {
        if freq < range.min_freq || freq > range.max_freq {
            continue;
        }
        let x = freq_to_x(range, freq, plot);
        painter.line_segment([Pos2::new(x, plot.top()), Pos2::new(x, plot.bottom())], grid);
        painter.text(
            Pos2::new(x, plot.top() - 2.0),
            egui::Align2::CENTER_BOTTOM,
            frequency_label(freq),
            font.clone(),
            theme::curve::LABEL,
        );
    }

    for gain in GRID_GAINS {
        if gain < range.min_db || gain > range.max_db {
            continue;
        }
        let y = db_to_y(range, gain, plot);
        let stroke = if gain == 0.0 {
            Stroke::new(1.0, theme::curve::UNITY)
        } else {
            grid
        };
        painter.line_segment([Pos2::new(plot.left(), y), Pos2::new(plot.right(), y)], stroke);

        let label = if gain > 0.0 { format!("+{}", gain) } else { format!("{}", gain) };
        painter.text(
            Pos2::new(plot.left() - 3.0, y),
            egui::Align2::RIGHT_CENTER,
            label,
            font.clone(),
            theme::curve::LABEL,
        );

        // Analyzer scale on the right: same lines, floor..0 dB.
        if config.show_analyzer {
            let analyzer_db = jmap(gain, range.min_db, range.max_db, config.analyzer_floor_db, 0.0);
            painter.text(
                Pos2::new(plot.right() + 3.0, y),
                egui::Align2::LEFT_CENTER,
                format!("{}", analyzer_db),
                font.clone(),
                theme::curve::LABEL,
            );
        }
    }
}

/// Draw a polyline segment by segment.
fn draw_path(painter: &egui::Painter, points: &[Pos2], color: Color32, thickness: f32) {
    let stroke = Stroke::new(thickness, color);
    for pair in points.windows(2) {
        painter.line_segment([pair[0], pair[1]], stroke);
    }
}
