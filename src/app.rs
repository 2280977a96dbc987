use std::{
    path::PathBuf,
    sync::{
        Arc,
        mpsc::{self, Receiver, TryRecvError},
    },
    thread,
};

use eframe::egui::{self, Key, Margin, Modifiers};
use tracing::{debug, warn};

use crate::{
    export::{ExportError, SavePrompt, compile_markup, encode_markup, save_output},
    ffi::CompilerLibrary,
    settings::{APP_TITLE, ExportSettings, SAMPLE_MARKUP},
    status::{Status, StatusKind},
    ui,
};

const TEXT_EDIT_MARGIN: i8 = 10;

type CompileResult = Result<Vec<u8>, ExportError>;

/// Where the current action is. Anything but `Idle` means the button is off.
///
/// Prompting and writing run inside a single `poll_compile` call once the
/// worker reports back, so they never show up as phases of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Compiling,
}

/// Wakes the UI when the worker finishes, including when it panics.
struct RepaintOnDrop(egui::Context);

impl Drop for RepaintOnDrop {
    fn drop(&mut self) {
        self.0.request_repaint();
    }
}

/// Editor state plus the one in-flight compile, if any.
pub struct TypstExportApp<L, P> {
    library: Arc<L>,
    prompt: P,
    settings: ExportSettings,
    markup: String,
    status: Status,
    phase: Phase,
    compile_receiver: Option<Receiver<CompileResult>>,
}

impl<L, P> TypstExportApp<L, P>
where
    L: CompilerLibrary + 'static,
    P: SavePrompt,
{
    pub fn new(library: L, prompt: P, settings: ExportSettings) -> Self {
        Self {
            library: Arc::new(library),
            prompt,
            settings,
            markup: SAMPLE_MARKUP.to_string(),
            status: Status::idle(),
            phase: Phase::Idle,
            compile_receiver: None,
        }
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn set_markup(&mut self, markup: impl Into<String>) {
        self.markup = markup.into();
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    fn enter(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "phase change");
        self.phase = phase;
    }

    /// Encodes the markup and hands it to a worker thread. Ignored while a
    /// previous action is still running.
    pub fn start_compile(&mut self, ctx: &egui::Context) {
        if self.is_busy() {
            return;
        }

        let input = match encode_markup(&self.markup) {
            Ok(input) => input,
            Err(e) => {
                self.finish(Err(e));
                return;
            }
        };

        let (sender, receiver) = mpsc::channel::<CompileResult>();
        let library = Arc::clone(&self.library);
        let ctx = ctx.clone();

        thread::spawn(move || {
            let _repaint = RepaintOnDrop(ctx);
            let sender = sender;
            let result = compile_markup(library.as_ref(), &input);
            if sender.send(result).is_err() {
                warn!("editor went away before compilation finished");
            }
        });

        self.compile_receiver = Some(receiver);
        self.status = Status::busy("Compiling…");
        self.enter(Phase::Compiling);
    }

    /// Picks up a finished compile and runs the save step. Returns `true`
    /// once the action has reached a terminal state.
    pub fn poll_compile(&mut self) -> bool {
        let Some(receiver) = &self.compile_receiver else {
            return false;
        };

        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => Err(ExportError::WorkerGone),
        };
        self.compile_receiver = None;

        // The dialog is modal, so the frame blocks here until it closes.
        let outcome = result.and_then(|bytes| save_output(&self.prompt, &self.settings, &bytes));
        self.finish(outcome);
        true
    }

    fn finish(&mut self, outcome: Result<PathBuf, ExportError>) {
        self.status = match &outcome {
            Ok(path) => Status::saved(path),
            Err(e) => Status::failed(e),
        };
        self.enter(Phase::Idle);
    }

    fn show_status(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if self.status.kind == StatusKind::Busy {
                ui.spinner();
            }
            let color = ui::status_color(self.status.kind, ui.visuals());
            ui.colored_label(color, self.status.display_text());
        });
    }
}

impl<L, P> eframe::App for TypstExportApp<L, P>
where
    L: CompilerLibrary + 'static,
    P: SavePrompt,
{
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_compile();

        let shortcut = ctx.input_mut(|i| i.consume_key(Modifiers::COMMAND, Key::Enter));
        if shortcut {
            self.start_compile(ctx);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(8.0);
                ui.heading(APP_TITLE);
                ui.add_space(12.0);
            });

            egui::Frame::new()
                .stroke(ui.visuals().widgets.noninteractive.bg_stroke)
                .show(ui, |ui| {
                    ui.set_min_height(ui::EDITOR_MIN_HEIGHT);
                    egui::ScrollArea::vertical()
                        .max_height(
                            (ui.available_height() - 2.0 * ui::BUTTON_HEIGHT - 40.0)
                                .max(ui::EDITOR_MIN_HEIGHT),
                        )
                        .show(ui, |ui| {
                            ui.add(
                                egui::TextEdit::multiline(&mut self.markup)
                                    .code_editor()
                                    .desired_width(ui.available_width())
                                    .desired_rows(18)
                                    .margin(Margin::same(TEXT_EDIT_MARGIN))
                                    .frame(false),
                            );
                        });
                });

            ui.add_space(16.0);

            let button = ui::compile_button(ui.visuals(), ui.available_width());
            if ui.add_enabled(!self.is_busy(), button).clicked() {
                self.start_compile(ctx);
            }

            ui.add_space(12.0);
            self.show_status(ui);
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::test_support::{MockLibrary, ScriptedPrompt};

    fn app(library: MockLibrary, prompt: ScriptedPrompt) -> TypstExportApp<MockLibrary, ScriptedPrompt> {
        let settings = ExportSettings {
            default_directory: None,
            ..ExportSettings::default()
        };
        TypstExportApp::new(library, prompt, settings)
    }

    fn run_to_completion(app: &mut TypstExportApp<MockLibrary, ScriptedPrompt>) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !app.poll_compile() {
            assert!(Instant::now() < deadline, "compile never finished");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn starts_with_sample_markup_and_blank_status() {
        let app = app(MockLibrary::failing(), ScriptedPrompt::cancelling());
        assert_eq!(app.markup(), SAMPLE_MARKUP);
        assert_eq!(app.status().kind, StatusKind::Idle);
        assert_eq!(app.phase(), Phase::Idle);
    }

    #[test]
    fn successful_action_saves_and_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("out.pdf");
        let mut app = app(
            MockLibrary::returning(vec![0x25, 0x50, 0x44, 0x46]),
            ScriptedPrompt::choosing(&destination),
        );
        app.set_markup("Hello, *Typst* world!");

        let ctx = egui::Context::default();
        app.start_compile(&ctx);
        assert_eq!(app.phase(), Phase::Compiling);
        assert_eq!(app.status().kind, StatusKind::Busy);
        run_to_completion(&mut app);

        assert_eq!(app.phase(), Phase::Idle);
        assert_eq!(app.status().kind, StatusKind::Success);
        assert_eq!(
            app.status().text,
            format!("Success: PDF saved to {}", destination.display())
        );
        assert_eq!(std::fs::read(&destination).unwrap(), b"%PDF");
        assert_eq!(app.library.release_calls(), 1);
        assert_eq!(app.library.last_input().as_deref(), Some("Hello, *Typst* world!"));
    }

    #[test]
    fn second_request_while_compiling_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(
            MockLibrary::returning(b"%PDF".to_vec()),
            ScriptedPrompt::choosing(dir.path().join("a.pdf")),
        );
        let ctx = egui::Context::default();

        app.start_compile(&ctx);
        app.start_compile(&ctx);
        run_to_completion(&mut app);

        assert_eq!(app.library.compile_calls(), 1);
        assert_eq!(app.prompt.prompt_count(), 1);
    }

    #[test]
    fn nul_in_markup_fails_without_spawning_a_worker() {
        let mut app = app(MockLibrary::returning(b"%PDF".to_vec()), ScriptedPrompt::cancelling());
        app.set_markup("bad\0input");

        app.start_compile(&egui::Context::default());

        assert_eq!(app.phase(), Phase::Idle);
        assert_eq!(app.status().kind, StatusKind::Error);
        assert_eq!(app.status().text, "Error: Failed to convert input to C string");
        assert!(!app.poll_compile());
        assert_eq!(app.library.compile_calls(), 0);
    }

    #[test]
    fn compiler_failure_is_reported_without_prompting() {
        let mut app = app(MockLibrary::failing(), ScriptedPrompt::cancelling());

        app.start_compile(&egui::Context::default());
        run_to_completion(&mut app);

        assert_eq!(app.status().text, "Error: Compilation failed");
        assert_eq!(app.prompt.prompt_count(), 0);
        assert_eq!(app.library.release_calls(), 0);
    }

    #[test]
    fn panicking_worker_reports_failure_and_frees_the_button() {
        let mut app = app(MockLibrary::panicking(), ScriptedPrompt::cancelling());

        app.start_compile(&egui::Context::default());
        run_to_completion(&mut app);

        assert_eq!(app.phase(), Phase::Idle);
        assert!(!app.is_busy());
        assert_eq!(app.status().kind, StatusKind::Error);
        assert_eq!(app.status().text, "Error: Compilation failed");
        assert_eq!(app.prompt.prompt_count(), 0);
        assert_eq!(app.library.release_calls(), 0);
    }

    #[test]
    fn cancelled_dialog_leaves_a_neutral_status() {
        let mut app = app(MockLibrary::returning(b"%PDF".to_vec()), ScriptedPrompt::cancelling());

        app.start_compile(&egui::Context::default());
        run_to_completion(&mut app);

        assert_eq!(app.status().kind, StatusKind::Cancelled);
        assert_eq!(app.status().text, "Save operation cancelled");
        assert_eq!(app.library.release_calls(), 1);
    }
}
