//! Parameter controls bound directly to the parameter store.

use eframe::egui::{self, RichText, Ui};

use crate::app::theme;
use crate::dsp::parameter::{ParameterDisplay, ParameterId, ParameterStore};

/// Draws the control for `id` and writes any change back to `store`.
///
/// Frequencies slide over the skewed normalized range so the low end gets
/// most of the travel; gain and Q slide linearly in their own units; slopes
/// are a drop-down of their choices. Returns true if the value changed.
pub fn param_slider(ui: &mut Ui, store: &ParameterStore, id: ParameterId) -> bool {
    let def = id.definition();
    let current = store.get(id);
    let mut changed = false;

    ui.horizontal(|ui| {
        ui.add_sized([96.0, 18.0], egui::Label::new(RichText::new(def.name).color(theme::text::SECONDARY)));

        match def.display {
            ParameterDisplay::Logarithmic { .. } => {
                let mut normalized = def.normalize(current);
                let response = ui.add(
                    egui::Slider::new(&mut normalized, 0.0..=1.0)
                        .custom_formatter(|n, _| def.display.format(def.denormalize(n as f32)))
                        .custom_parser(|text| {
                            let hz = text.trim().trim_end_matches("Hz").trim().parse::<f32>().ok()?;
                            Some(def.normalize(hz) as f64)
                        }),
                );
                if response.changed() {
                    store.set_normalized(id, normalized);
                    changed = true;
                }
            }
            ParameterDisplay::Linear { unit } => {
                let mut value = current;
                let response = ui.add(
                    egui::Slider::new(&mut value, def.min..=def.max)
                        .step_by(def.step as f64)
                        .suffix(format!(" {}", unit)),
                );
                if response.changed() {
                    store.set(id, value);
                    changed = true;
                }
            }
            ParameterDisplay::Discrete { labels } => {
                let mut index = current.round().max(0.0) as usize;
                egui::ComboBox::from_id_salt(def.name)
                    .selected_text(def.display.format(current))
                    .show_ui(ui, |ui| {
                        for (choice, label) in labels.iter().enumerate() {
                            if ui.selectable_value(&mut index, choice, *label).changed() {
                                store.set(id, choice as f32);
                                changed = true;
                            }
                        }
                    });
            }
        }
    });

    changed
}
