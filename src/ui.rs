use eframe::egui::{self, Color32, Stroke, Style, Theme, Visuals, style::Selection};

use crate::status::StatusKind;

const ACCENT_LIGHT: (u8, u8, u8) = (10, 110, 230);
const ACCENT_DARK: (u8, u8, u8) = (40, 120, 220);
const SUCCESS_LIGHT: Color32 = Color32::from_rgb(20, 140, 60);
const SUCCESS_DARK: Color32 = Color32::from_rgb(90, 200, 120);

pub const BUTTON_HEIGHT: f32 = 36.0;
pub const EDITOR_MIN_HEIGHT: f32 = 300.0;

pub fn setup_custom_style(ctx: &egui::Context) {
    ctx.style_mut_of(Theme::Dark, custom_colors);
    ctx.style_mut_of(Theme::Light, custom_colors);
}

fn custom_colors(style: &mut Style) {
    let accent = accent_color(&style.visuals);
    style.visuals.selection = Selection {
        bg_fill: accent.gamma_multiply(0.6),
        stroke: Stroke::new(1.0, Color32::WHITE),
    };
    style.visuals.widgets.hovered.weak_bg_fill = accent.gamma_multiply(0.8);
    if style.visuals.dark_mode {
        style.visuals.widgets.inactive.weak_bg_fill = style.visuals.faint_bg_color;
    }
}

pub fn accent_color(visuals: &Visuals) -> Color32 {
    let (r, g, b) = if visuals.dark_mode {
        ACCENT_DARK
    } else {
        ACCENT_LIGHT
    };
    Color32::from_rgb(r, g, b)
}

/// Red for failures, green for a saved file, the normal text colour otherwise.
pub fn status_color(kind: StatusKind, visuals: &Visuals) -> Color32 {
    match kind {
        StatusKind::Error => visuals.error_fg_color,
        StatusKind::Success if visuals.dark_mode => SUCCESS_DARK,
        StatusKind::Success => SUCCESS_LIGHT,
        StatusKind::Idle | StatusKind::Busy | StatusKind::Cancelled => visuals.text_color(),
    }
}

/// The full-width "Compile to PDF" button.
pub fn compile_button(visuals: &Visuals, width: f32) -> egui::Button<'static> {
    egui::Button::new(egui::RichText::new("Compile to PDF").color(Color32::WHITE).strong())
        .fill(accent_color(visuals))
        .corner_radius(8.0)
        .min_size(egui::vec2(width, BUTTON_HEIGHT))
}
