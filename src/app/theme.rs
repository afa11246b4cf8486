//! Equalizer color scheme
//!
//! A graphite background with one hue per filter stage. `apply_theme` is run
//! once, on the first frame.

use eframe::egui::{self, style::WidgetVisuals, Color32, Rounding, Stroke, Vec2};

/// Surfaces, darkest first.
pub mod background {
    use super::Color32;

    pub const MAIN: Color32 = Color32::from_rgb(22, 24, 28);
    pub const PANEL: Color32 = Color32::from_rgb(30, 33, 38);
    /// Behind the response plot.
    pub const DISPLAY: Color32 = Color32::from_rgb(14, 16, 19);

    pub const WIDGET: Color32 = Color32::from_rgb(44, 48, 56);
    pub const WIDGET_HOVERED: Color32 = Color32::from_rgb(54, 59, 69);
    pub const WIDGET_ACTIVE: Color32 = Color32::from_rgb(64, 70, 82);
}

/// Plot colors.
pub mod curve {
    use super::Color32;

    /// Filter response, drawn over the analyzer.
    pub const RESPONSE: Color32 = Color32::from_rgb(236, 238, 242);
    pub const ANALYZER: Color32 = Color32::from_rgb(92, 184, 230);
    pub const GRID: Color32 = Color32::from_rgb(36, 40, 46);
    /// 0 dB line.
    pub const UNITY: Color32 = Color32::from_rgb(58, 130, 100);
    pub const LABEL: Color32 = Color32::from_rgb(118, 124, 134);
}

/// One hue per filter stage, used for control headings.
pub mod stage {
    use super::Color32;

    pub const LOW_CUT: Color32 = Color32::from_rgb(96, 200, 214);
    pub const PEAK: Color32 = Color32::from_rgb(238, 176, 84);
    pub const HIGH_CUT: Color32 = Color32::from_rgb(176, 120, 210);
}

pub mod text {
    use super::Color32;

    pub const PRIMARY: Color32 = Color32::from_rgb(228, 230, 235);
    pub const SECONDARY: Color32 = Color32::from_rgb(150, 156, 166);
    pub const DISABLED: Color32 = Color32::from_rgb(92, 97, 106);
}

/// Status and focus colors.
pub mod accent {
    use super::Color32;

    pub const FOCUS: Color32 = Color32::from_rgb(92, 184, 230);
    pub const SUCCESS: Color32 = Color32::from_rgb(120, 196, 128);
    pub const ERROR: Color32 = Color32::from_rgb(232, 88, 84);
}

pub const ROUNDING: Rounding = Rounding::same(5.0);
pub const ROUNDING_SMALL: Rounding = Rounding::same(3.0);

fn paint_widget(visuals: &mut WidgetVisuals, fill: Color32, text: Stroke) {
    visuals.bg_fill = fill;
    visuals.weak_bg_fill = fill;
    visuals.fg_stroke = text;
    visuals.rounding = ROUNDING_SMALL;
}

/// Installs the scheme into `ctx`.
pub fn apply_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    let visuals = &mut style.visuals;

    visuals.dark_mode = true;
    visuals.panel_fill = background::MAIN;
    visuals.window_fill = background::PANEL;
    visuals.window_rounding = ROUNDING;
    visuals.window_stroke = Stroke::new(1.0, background::WIDGET_ACTIVE);
    visuals.extreme_bg_color = background::DISPLAY;

    let widgets = &mut visuals.widgets;
    paint_widget(&mut widgets.noninteractive, background::PANEL, Stroke::new(1.0, text::SECONDARY));
    paint_widget(&mut widgets.inactive, background::WIDGET, Stroke::new(1.0, text::PRIMARY));
    paint_widget(&mut widgets.hovered, background::WIDGET_HOVERED, Stroke::new(1.0, text::PRIMARY));
    paint_widget(&mut widgets.active, background::WIDGET_ACTIVE, Stroke::new(1.5, accent::FOCUS));

    visuals.selection.bg_fill = accent::FOCUS.gamma_multiply(0.35);
    visuals.selection.stroke = Stroke::new(1.0, accent::FOCUS);

    style.spacing.item_spacing = Vec2::new(8.0, 5.0);
    style.spacing.button_padding = Vec2::new(10.0, 4.0);
    style.spacing.slider_width = 180.0;

    ctx.set_style(style);
}
