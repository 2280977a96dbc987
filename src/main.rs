use eframe::egui::{self, Vec2, vec2};
use tracing_subscriber::EnvFilter;
use typst_export::{
    app::TypstExportApp,
    export::RfdSavePrompt,
    ffi::NativeLibrary,
    settings::{APP_TITLE, ExportSettings},
    ui,
};

const WINDOW_SIZE: Vec2 = vec2(560.0, 620.0);
const MIN_WINDOW_SIZE: Vec2 = vec2(400.0, 480.0);

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_inner_size(WINDOW_SIZE)
            .with_min_inner_size(MIN_WINDOW_SIZE),

        ..Default::default()
    };
    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(|cc| {
            ui::setup_custom_style(&cc.egui_ctx);
            let app = TypstExportApp::new(NativeLibrary, RfdSavePrompt, ExportSettings::default());
            Ok(Box::new(app))
        }),
    )
}
