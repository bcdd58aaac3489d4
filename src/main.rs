//! SPYGLASS - SPARSE MATRIX VIEWER
//!
//! Draws every nonzero of a sparse matrix as a colored point and lets the
//! user pan, zoom, permute and normalize the picture interactively.
//!
//! ```bash
//! spyglass graph.smat
//! spyglass graph.smat.gz --rcperm order.perm --rclabel names.txt
//! spyglass big.smat --nocontrols --colormap bone --alpha 0.3
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]

use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use eframe::egui::{
    self, Color32, Pos2, Rect, RichText, Sense, Stroke, TextureHandle, TextureOptions, Vec2,
};

use spyglass::app::{
    svg_path, Background, Command, MatrixCanvas, MatrixView, PointSurface, ASPECT_CHOICES,
};
use spyglass::config::RenderConfig;
use spyglass::matrix::{load_matrix, Labels, MatrixPermutations, PermutationMode};
use spyglass::render::NormalizationMode;
use spyglass::util::color::Palette;
use spyglass::util::format::{format_count, format_value};
use spyglass::window::{Key, MouseButton, WindowEvent, WindowId, WindowRegistry};

/// Initial window size in logical pixels.
const WINDOW_SIZE: [f32; 2] = [1200.0, 800.0];

/// Interactive viewer for large sparse matrices
#[derive(Parser, Debug)]
#[command(name = "spyglass")]
#[command(about = "Scatter-plot viewer for large sparse matrices")]
#[command(version)]
struct Args {
    /// Matrix file: SMAT triplets, optionally gzip-compressed
    file: PathBuf,

    /// Display A + A^T instead of A
    #[arg(long)]
    symmetrize: bool,

    /// Row permutation file
    #[arg(long, value_name = "FILE")]
    rperm: Option<PathBuf>,

    /// Column permutation file
    #[arg(long, value_name = "FILE")]
    cperm: Option<PathBuf>,

    /// Permutation file applied to both rows and columns
    #[arg(long, value_name = "FILE")]
    rcperm: Option<PathBuf>,

    /// Row label file
    #[arg(long, value_name = "FILE")]
    rlabel: Option<PathBuf>,

    /// Column label file
    #[arg(long, value_name = "FILE")]
    clabel: Option<PathBuf>,

    /// Label file applied to both rows and columns
    #[arg(long, value_name = "FILE")]
    rclabel: Option<PathBuf>,

    /// Hide the control panel
    #[arg(long)]
    nocontrols: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Initial colormap (rainbow, bone, spring)
    #[arg(long, value_name = "NAME")]
    colormap: Option<String>,

    /// Point alpha when zoomed out, in [0, 1]
    #[arg(long)]
    alpha: Option<f32>,

    /// JSON file with render settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

// =============================================================================
// Startup
// =============================================================================

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_config(args: &Args) -> Result<RenderConfig> {
    let mut config = match &args.config {
        Some(path) => RenderConfig::from_json_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => RenderConfig::default(),
    };
    if let Some(alpha) = args.alpha {
        ensure!(
            (0.0..=1.0).contains(&alpha),
            "--alpha must be within [0, 1], got {alpha}"
        );
        config.point_alpha = alpha;
    }
    log::debug!("{config:?}");
    Ok(config)
}

/// Load the matrix and its side files. Any failure aborts startup.
fn load_canvas(args: &Args, config: &RenderConfig) -> Result<MatrixCanvas> {
    let data = load_matrix(&args.file, args.symmetrize)
        .with_context(|| format!("failed to load matrix {}", args.file.display()))?;
    let (nrows, ncols) = (data.matrix.nrows(), data.matrix.ncols());

    let rperm = args.rcperm.as_deref().or(args.rperm.as_deref());
    let cperm = args.rcperm.as_deref().or(args.cperm.as_deref());
    let permutations = MatrixPermutations::load(rperm, cperm, nrows, ncols)
        .context("failed to load permutation")?;

    let rlabel = args.rclabel.as_deref().or(args.rlabel.as_deref());
    let clabel = args.rclabel.as_deref().or(args.clabel.as_deref());
    let labels = Labels::load(rlabel, clabel, nrows, ncols).context("failed to load labels")?;

    let mode = PermutationMode::from_axes(permutations.rows.is_some(), permutations.cols.is_some());
    let mut view = MatrixView::new(data, permutations, labels, config, WINDOW_SIZE[0], WINDOW_SIZE[1]);
    view.apply(Command::SetPermutation(mode));

    if let Some(name) = &args.colormap {
        let palette = Palette::from_name(name).with_context(|| {
            let known: Vec<_> = Palette::all().iter().map(|p| p.name()).collect();
            format!("unknown colormap '{name}' (expected one of {})", known.join(", "))
        })?;
        view.apply(Command::SetColormap(palette));
    }

    Ok(MatrixCanvas::new(view, Some(svg_path(&args.file))))
}

// =============================================================================
// Application
// =============================================================================

struct SpyglassApp {
    windows: WindowRegistry<MatrixCanvas>,
    canvas: WindowId,
    surface: PointSurface,
    texture: Option<TextureHandle>,
    /// Another display pass is required.
    needs_redraw: bool,
    show_controls: bool,
    show_help: bool,
    title: String,
    last_points: usize,
    last_strategy: &'static str,
}

impl SpyglassApp {
    fn new(canvas: MatrixCanvas, title: String, show_controls: bool) -> Self {
        let mut windows = WindowRegistry::new();
        let id = windows.register(canvas);
        Self {
            windows,
            canvas: id,
            surface: PointSurface::new(),
            texture: None,
            needs_redraw: true,
            show_controls,
            show_help: false,
            title,
            last_points: 0,
            last_strategy: "",
        }
    }

    fn apply(&mut self, command: Command) {
        if let Some(canvas) = self.windows.get_mut(self.canvas) {
            self.needs_redraw |= canvas.apply(command);
        }
    }

    fn dispatch(&mut self, event: WindowEvent) {
        self.needs_redraw |= self.windows.dispatch(self.canvas, event);
    }

    /// Forward keyboard and pointer input to the canvas window.
    fn handle_input(&mut self, ctx: &egui::Context, rect: Rect, hovered: bool) {
        let keyboard_free = !ctx.wants_keyboard_input();
        let mut events = Vec::new();

        ctx.input(|i| {
            for event in &i.events {
                match event {
                    egui::Event::Key {
                        key, pressed: true, ..
                    } if keyboard_free => {
                        if *key == egui::Key::F1 {
                            self.show_help = !self.show_help;
                        } else if let Some(key) = map_key(*key) {
                            events.push(WindowEvent::Key(key));
                        }
                    }
                    egui::Event::PointerMoved(pos) => {
                        let local = *pos - rect.min;
                        events.push(WindowEvent::Motion {
                            x: local.x,
                            y: local.y,
                        });
                    }
                    egui::Event::PointerButton {
                        pos,
                        button,
                        pressed,
                        ..
                    } => {
                        // Presses start only inside the canvas; releases always end a drag.
                        if *pressed && !rect.contains(*pos) {
                            continue;
                        }
                        if let Some(button) = map_button(*button) {
                            let local = *pos - rect.min;
                            events.push(WindowEvent::Click {
                                button,
                                pressed: *pressed,
                                x: local.x,
                                y: local.y,
                            });
                        }
                    }
                    _ => {}
                }
            }

            let scroll = i.raw_scroll_delta.y;
            if hovered && scroll != 0.0 {
                if let Some(pos) = i.pointer.hover_pos() {
                    let local = pos - rect.min;
                    events.push(WindowEvent::Scroll {
                        delta: scroll,
                        x: local.x,
                        y: local.y,
                    });
                }
            }
        });

        for event in events {
            self.dispatch(event);
        }
    }

    /// Run one display pass into the surface and upload it.
    fn redraw(&mut self, ctx: &egui::Context) {
        let Some(canvas) = self.windows.get(self.canvas) else {
            return;
        };
        let viewport = *canvas.view.viewport();
        let background = canvas.view.background().color();
        self.surface.set_view(&viewport, background);

        let Some(report) = self.windows.display(self.canvas, &mut self.surface) else {
            return;
        };
        self.last_points = report.points;
        self.last_strategy = report.task.strategy.name();
        self.needs_redraw = !report.task.finished;

        if self.surface.take_dirty() || self.texture.is_none() {
            let image = self.surface.image().clone();
            match &mut self.texture {
                Some(texture) => texture.set(image, TextureOptions::NEAREST),
                None => {
                    self.texture = Some(ctx.load_texture("matrix", image, TextureOptions::NEAREST));
                }
            }
        }
    }
}

fn map_key(key: egui::Key) -> Option<Key> {
    use egui::Key as K;
    let key = match key {
        K::ArrowUp => Key::Up,
        K::ArrowDown => Key::Down,
        K::ArrowLeft => Key::Left,
        K::ArrowRight => Key::Right,
        K::C => Key::Char('c'),
        K::H => Key::Char('h'),
        K::I => Key::Char('i'),
        K::K => Key::Char('k'),
        K::O => Key::Char('o'),
        K::P => Key::Char('p'),
        K::Q => Key::Char('q'),
        K::R => Key::Char('r'),
        K::T => Key::Char('t'),
        _ => return None,
    };
    Some(key)
}

fn map_button(button: egui::PointerButton) -> Option<MouseButton> {
    match button {
        egui::PointerButton::Primary => Some(MouseButton::Primary),
        egui::PointerButton::Secondary => Some(MouseButton::Secondary),
        egui::PointerButton::Middle => Some(MouseButton::Middle),
        egui::PointerButton::Extra1 | egui::PointerButton::Extra2 => None,
    }
}

fn to_color32(c: spyglass::util::color::Rgba) -> Color32 {
    c.into()
}

// =============================================================================
// UI Implementation
// =============================================================================

impl eframe::App for SpyglassApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.show_controls {
            let mut commands = Vec::new();
            if let Some(canvas) = self.windows.get(self.canvas) {
                egui::SidePanel::left("controls")
                    .resizable(false)
                    .default_width(220.0)
                    .show(ctx, |ui| draw_controls(ui, canvas, &self.title, &mut commands));
            }
            for command in commands {
                self.apply(command);
            }
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| self.draw_canvas(ui));

        if self.show_help {
            self.draw_help(ctx);
        }

        if self.needs_redraw {
            ctx.request_repaint();
        }
    }
}

impl SpyglassApp {
    fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let rect = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(rect, Sense::click_and_drag());

        self.dispatch(WindowEvent::Reshape {
            width: rect.width(),
            height: rect.height(),
        });
        self.handle_input(ui.ctx(), rect, response.hovered());

        if self.needs_redraw || self.texture.is_none() {
            self.redraw(ui.ctx());
        }

        let Some(canvas) = self.windows.get(self.canvas) else {
            return;
        };
        let view = &canvas.view;
        let background = view.background();
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, to_color32(background.color()));

        if let Some(texture) = &self.texture {
            painter.image(
                texture.id(),
                rect,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        // Matrix border and cursor cell.
        let vp = view.viewport();
        let to_screen = |x: f32, y: f32| vp.world_to_screen(Pos2::new(x, y)) + rect.min.to_vec2();
        let (nrows, ncols) = (view.nrows() as f32, view.ncols() as f32);
        painter.rect_stroke(
            Rect::from_min_max(to_screen(-0.5, -0.5), to_screen(ncols - 0.5, nrows - 0.5)),
            0.0,
            Stroke::new(1.0, to_color32(background.border_color())),
        );

        let cursor = view.cursor();
        if cursor.visible {
            let (r, c) = (cursor.row as f32, cursor.col as f32);
            let cell = Rect::from_min_max(to_screen(c - 0.5, r - 0.5), to_screen(c + 0.5, r + 0.5));
            let cell = Rect::from_center_size(cell.center(), cell.size().max(Vec2::splat(5.0)));
            painter.rect_stroke(
                cell,
                0.0,
                Stroke::new(1.5, to_color32(background.cursor_color())),
            );
        }

        self.draw_hud(ui, rect, view);
    }

    fn draw_hud(&self, ui: &egui::Ui, rect: Rect, view: &MatrixView) {
        let readout = view.cursor_readout();

        let mut text = format!(
            "ROW {} {} | COL {} {} | VALUE {} | ZOOM {:.2}x | {} {}",
            readout.row,
            readout.row_label,
            readout.col,
            readout.col_label,
            format_value(readout.value),
            view.viewport().zoom,
            self.last_strategy.to_uppercase(),
            format_count(self.last_points),
        );
        if self.needs_redraw {
            text.push_str(" | SCANNING");
        }

        let hud_rect = Rect::from_min_size(
            rect.min + Vec2::new(12.0, rect.height() - 40.0),
            Vec2::new((rect.width() - 24.0).max(0.0), 28.0),
        );
        let painter = ui.painter();
        painter.rect_filled(hud_rect, 2.0, Color32::from_black_alpha(200));
        painter.text(
            hud_rect.left_center() + Vec2::new(8.0, 0.0),
            egui::Align2::LEFT_CENTER,
            text,
            egui::FontId::monospace(11.0),
            Color32::from_gray(220),
        );
    }

    fn draw_help(&mut self, ctx: &egui::Context) {
        let mut open = self.show_help;
        egui::Window::new("Controls")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                egui::Grid::new("help").num_columns(2).show(ui, |ui| {
                    for (key, action) in [
                        ("drag", "pan"),
                        ("right drag", "zoom"),
                        ("scroll", "zoom about pointer"),
                        ("click", "select cell"),
                        ("arrows", "move cursor"),
                        ("c", "next colormap"),
                        ("i", "invert colormap"),
                        ("h", "home view"),
                        ("r / k", "normalize rows / columns"),
                        ("p / q", "permute rows / columns"),
                        ("t", "toggle cursor"),
                        ("o", "export SVG"),
                    ] {
                        ui.label(RichText::new(key).monospace());
                        ui.label(action);
                        ui.end_row();
                    }
                });
            });
        self.show_help = open;
    }
}

/// Side panel widgets. Changes are queued as commands for the canvas.
fn draw_controls(ui: &mut egui::Ui, canvas: &MatrixCanvas, title: &str, commands: &mut Vec<Command>) {
    let view = &canvas.view;
    let data = view.data();

    ui.add_space(6.0);
    ui.heading(title);
    ui.label(
        RichText::new(format!(
            "{} x {}, {} nonzeros",
            format_count(view.nrows()),
            format_count(view.ncols()),
            format_count(data.matrix.nnz())
        ))
        .monospace()
        .size(10.0),
    );
    ui.label(
        RichText::new(format!(
            "values [{}, {}]",
            format_value(data.stats.min_val),
            format_value(data.stats.max_val)
        ))
        .monospace()
        .size(10.0),
    );
    ui.separator();

    let mut alpha = view.point_alpha();
    if ui
        .add(egui::Slider::new(&mut alpha, 0.0..=1.0).text("point alpha"))
        .changed()
    {
        commands.push(Command::SetPointAlpha(alpha));
    }

    ui.separator();
    ui.label("Normalize");
    let norm = view.normalization();
    let (mut rows, mut cols) = (norm.normalizes_rows(), norm.normalizes_cols());
    let changed = ui.checkbox(&mut rows, "rows").changed() | ui.checkbox(&mut cols, "columns").changed();
    if changed {
        commands.push(Command::SetNormalization(NormalizationMode::from_axes(rows, cols)));
    }

    ui.label("Permute");
    let perm = view.permutation();
    let loaded = view.permutations();
    let (mut rows, mut cols) = (perm.permutes_rows(), perm.permutes_cols());
    let changed = ui
        .add_enabled(loaded.rows.is_some(), egui::Checkbox::new(&mut rows, "rows"))
        .changed()
        | ui.add_enabled(loaded.cols.is_some(), egui::Checkbox::new(&mut cols, "columns"))
            .changed();
    if changed {
        commands.push(Command::SetPermutation(PermutationMode::from_axes(rows, cols)));
    }

    ui.separator();
    let mut palette = view.palette();
    egui::ComboBox::from_label("colormap")
        .selected_text(palette.name())
        .show_ui(ui, |ui| {
            for p in Palette::all() {
                ui.selectable_value(&mut palette, *p, p.name());
            }
        });
    if palette != view.palette() {
        commands.push(Command::SetColormap(palette));
    }
    let mut inverted = view.inverted();
    if ui.checkbox(&mut inverted, "invert colormap").changed() {
        commands.push(Command::InvertColormap);
    }

    let current = view.viewport().aspect;
    let mut aspect = current;
    let label = ASPECT_CHOICES
        .iter()
        .find(|(a, _)| *a == current)
        .map_or("custom", |(_, name)| *name);
    egui::ComboBox::from_label("aspect")
        .selected_text(label)
        .show_ui(ui, |ui| {
            for (a, name) in ASPECT_CHOICES {
                ui.selectable_value(&mut aspect, *a, *name);
            }
        });
    if aspect != current {
        commands.push(Command::SetAspect(aspect));
    }

    let mut background = view.background();
    ui.horizontal(|ui| {
        ui.label("background");
        ui.radio_value(&mut background, Background::Black, Background::Black.name());
        ui.radio_value(&mut background, Background::White, Background::White.name());
    });
    if background != view.background() {
        commands.push(Command::SetBackground(background));
    }

    let mut cursor = view.cursor().visible;
    if ui.checkbox(&mut cursor, "show cursor").changed() {
        commands.push(Command::ToggleCursor);
    }

    ui.separator();
    ui.horizontal(|ui| {
        if ui.button("Home").clicked() {
            commands.push(Command::Home);
        }
        if ui.button("Export SVG").clicked() {
            canvas.export_svg();
        }
    });
    ui.add_space(4.0);
    ui.label(RichText::new("F1: help").size(10.0).weak());
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(&args)?;
    let canvas = load_canvas(&args, &config)?;

    let title = args
        .file
        .file_name()
        .map_or_else(|| args.file.display().to_string(), |n| n.to_string_lossy().into_owned());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(WINDOW_SIZE)
            .with_min_inner_size([320.0, 240.0])
            .with_title(format!("spyglass - {title}")),
        ..Default::default()
    };

    let show_controls = !args.nocontrols;
    eframe::run_native(
        "spyglass",
        options,
        Box::new(move |_cc| Ok(Box::new(SpyglassApp::new(canvas, title, show_controls)))),
    )
    .map_err(|e| anyhow::anyhow!("window system error: {e}"))
}
