use std::time::Instant;

use eframe::egui::{self, Color32, FontId, RichText, TextFormat};
use egui::text::LayoutJob;
use tracing::{debug, info, warn};

use topple_lang::{
    compile, preview, unsupported_positions, AudioCommand, DrawCommand, Frame, InputState, Runtime,
};

use crate::canvas;

/// Knobs taken from the command line.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub max_dt: f64,
    pub canvas: egui::Vec2,
}

#[derive(PartialEq)]
enum Tab { Canvas, Preview, Errors, Console }

pub struct App {
    source: String,
    settings: Settings,
    tab: Tab,
    /// Source after falling.
    processed: String,
    /// Cells of `source` that fall, highlighted in the preview.
    floating: Vec<(usize, usize)>,
    errors: Vec<String>,
    console: Vec<String>,
    draw: Vec<DrawCommand>,
    runtime: Option<Runtime>,
    paused: bool,
    last_tick: Instant,
}

impl App {
    pub fn new(source: String, settings: Settings) -> Self {
        let mut app = Self {
            source,
            settings,
            tab: Tab::Canvas,
            processed: String::new(),
            floating: Vec::new(),
            errors: Vec::new(),
            console: Vec::new(),
            draw: Vec::new(),
            runtime: None,
            paused: false,
            last_tick: Instant::now(),
        };
        app.rebuild();
        app
    }

    /// Recompiles the source and starts a fresh runtime.
    fn rebuild(&mut self) {
        self.processed = preview(&self.source);
        self.floating = unsupported_positions(&self.source);
        self.errors.clear();
        self.console.clear();
        self.draw.clear();
        self.runtime = None;
        self.last_tick = Instant::now();

        let program = match compile(&self.source) {
            Ok(p) => p,
            Err(errs) => {
                warn!(count = errs.len(), "compile failed");
                self.errors = errs.iter().map(ToString::to_string).collect();
                return;
            }
        };

        match Runtime::new(program, Box::new(InputState::with_default_bindings())) {
            Ok(mut rt) => {
                debug!(draw = rt.has_draw(), update = rt.has_update(), "program started");
                let first = rt.take_output();
                self.absorb(first);
                self.runtime = Some(rt);
            }
            Err(e) => {
                warn!("{e}");
                self.errors.push(e.to_string());
            }
        }
    }

    fn absorb(&mut self, frame: Frame) {
        for cmd in &frame.audio {
            match cmd {
                AudioCommand::PlayMusic { track } => info!(target: "topple::audio", track = %track, "music"),
                AudioCommand::StopMusic => info!(target: "topple::audio", "stop music"),
                AudioCommand::Sound { clip } => info!(target: "topple::audio", clip = %clip, "sound"),
                AudioCommand::Volume { channel, level } => info!(target: "topple::audio", channel = %channel, level, "volume"),
            }
        }
        self.console.extend(frame.printed);
        // keep the last picture when a frame draws nothing
        if !frame.draw.is_empty() {
            self.draw = frame.draw;
        }
    }

    fn step(&mut self, ctx: &egui::Context, canvas_rect: egui::Rect) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_tick).as_secs_f64().min(self.settings.max_dt);
        self.last_tick = now;

        let Some(rt) = &mut self.runtime else { return };
        if let Some(input) = rt.input_mut().as_any_mut().downcast_mut::<InputState>() {
            canvas::feed_input(ctx, canvas_rect, input);
        }
        if self.paused { return; }

        match rt.tick(dt) {
            Ok(frame) => self.absorb(frame),
            Err(e) => {
                warn!("{e}");
                self.errors.push(e.to_string());
                self.runtime = None;
                self.tab = Tab::Errors;
            }
        }
        ctx.request_repaint();
    }
}

// ─── UI ───────────────────────────────────────────────────────────────────────

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut canvas_rect = egui::Rect::NOTHING;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.columns(2, |cols| {
                // ── Left: editor ──────────────────────────────────────────────
                cols[0].vertical(|ui| {
                    ui.label("Source");
                    let response = ui.add(
                        egui::TextEdit::multiline(&mut self.source)
                            .font(egui::TextStyle::Monospace)
                            .desired_width(f32::INFINITY)
                            .desired_rows(44),
                    );
                    if response.changed() {
                        self.rebuild();
                    }
                });

                // ── Right: output ─────────────────────────────────────────────
                cols[1].vertical(|ui| {
                    ui.horizontal(|ui| {
                        if self.errors.is_empty() {
                            ui.label(RichText::new("✓  no errors").color(Color32::from_rgb(80, 200, 80)));
                        } else {
                            ui.label(RichText::new(format!("✗  {} error(s)", self.errors.len()))
                                .color(Color32::from_rgb(220, 80, 80)));
                        }
                        if !self.floating.is_empty() {
                            ui.label(RichText::new(format!("↓ {} falling", self.floating.len()))
                                .color(Color32::from_rgb(220, 180, 60)));
                        }
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("restart").clicked() {
                                self.rebuild();
                            }
                            let label = if self.paused { "resume" } else { "pause" };
                            if ui.button(label).clicked() {
                                self.paused = !self.paused;
                            }
                        });
                    });

                    ui.separator();

                    ui.horizontal(|ui| {
                        ui.selectable_value(&mut self.tab, Tab::Canvas, "Canvas");
                        ui.selectable_value(&mut self.tab, Tab::Preview, "Preview");
                        let err_label = if self.errors.is_empty() {
                            "Errors".into()
                        } else {
                            format!("Errors ({})", self.errors.len())
                        };
                        ui.selectable_value(&mut self.tab, Tab::Errors, err_label);
                        ui.selectable_value(&mut self.tab, Tab::Console, "Console");
                    });

                    ui.separator();

                    match self.tab {
                        Tab::Canvas  => canvas_rect = self.show_canvas(ui),
                        Tab::Preview => self.show_preview(ui),
                        Tab::Errors  => self.show_errors(ui),
                        Tab::Console => self.show_console(ui),
                    }
                });
            });
        });

        self.step(ctx, canvas_rect);
    }
}

impl App {
    fn show_canvas(&self, ui: &mut egui::Ui) -> egui::Rect {
        let (rect, _response) = ui.allocate_exact_size(self.settings.canvas, egui::Sense::click());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, Color32::BLACK);
        canvas::paint(&painter, rect.min, &self.draw);

        if self.runtime.as_ref().is_some_and(|rt| !rt.has_draw()) {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "no draw block",
                FontId::proportional(14.0),
                Color32::GRAY,
            );
        }
        rect
    }

    /// The source as typed, with every character that will fall in amber,
    /// followed by what actually runs.
    fn show_preview(&self, ui: &mut egui::Ui) {
        let font = FontId::monospace(13.0);
        let plain = TextFormat { font_id: font.clone(), color: Color32::from_rgb(200, 200, 200), ..Default::default() };
        let falling = TextFormat { font_id: font, color: Color32::from_rgb(230, 170, 40), ..Default::default() };

        let mut job = LayoutJob::default();
        let mut floating = self.floating.iter().peekable();
        for (row, line) in self.source.split('\n').enumerate() {
            for (col, ch) in line.chars().enumerate() {
                let fmt = if floating.peek() == Some(&&(row, col)) {
                    floating.next();
                    falling.clone()
                } else {
                    plain.clone()
                };
                job.append(ch.encode_utf8(&mut [0; 4]), 0.0, fmt);
            }
            job.append("\n", 0.0, plain.clone());
        }

        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.label(RichText::new("typed").strong());
            ui.label(job);
            ui.separator();
            ui.label(RichText::new("after falling").strong());
            ui.label(RichText::new(&self.processed).monospace());
        });
    }

    fn show_errors(&self, ui: &mut egui::Ui) {
        if self.errors.is_empty() {
            ui.label(RichText::new("No errors.").color(Color32::GRAY));
            return;
        }
        egui::ScrollArea::vertical().show(ui, |ui| {
            for msg in &self.errors {
                ui.label(RichText::new(msg).monospace().color(Color32::from_rgb(220, 80, 80)));
            }
        });
    }

    fn show_console(&self, ui: &mut egui::Ui) {
        if self.console.is_empty() {
            ui.label(RichText::new("Nothing printed.").color(Color32::GRAY));
            return;
        }
        egui::ScrollArea::vertical().stick_to_bottom(true).show(ui, |ui| {
            for line in &self.console {
                ui.label(RichText::new(line).monospace());
            }
        });
    }
}
