use std::path::PathBuf;
use std::sync::mpsc;

use crate::config;
use crate::core::progress::Line;
use crate::core::{albums, export, CancelToken};
use crate::models::{AlbumFilter, AlbumSummary, ExportRequest};

const HELP_TEXT: &str = "\
1. Open the \"ting.sqlite\" database copied from the phone. The \"Download\"
   folder must sit next to it.
2. Choose the folder to export into.
3. Pick one album, or \"All\" to export everything.
4. Press Start. Each album gets its own folder; files are named
   \"<title>-<artist>.mp3\" and tagged when possible.
5. Stop ends the run after the current track.";

enum BgResult {
    AlbumsLoaded(Vec<AlbumSummary>),
    Progress(String),
    Finished(i32),
    Error(String),
}

pub struct ExportApp {
    db_path: String,
    out_dir: String,

    albums: Vec<AlbumSummary>,
    /// 0 is "All", otherwise index into `albums` plus one
    selected_album: usize,
    verbose: bool,

    // Background tasks
    tx: mpsc::Sender<BgResult>,
    rx: mpsc::Receiver<BgResult>,
    cancel: Option<CancelToken>,
    output: String,
    status_msg: String,
    show_help: bool,
}

impl ExportApp {
    pub fn new(cc: &eframe::CreationContext<'_>, database: Option<PathBuf>) -> Self {
        Self::setup_cjk_fonts(&cc.egui_ctx);
        let (tx, rx) = mpsc::channel();

        let db_path = database
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        let mut app = Self {
            db_path,
            out_dir: String::new(),
            albums: Vec::new(),
            selected_album: 0,
            verbose: true,
            tx,
            rx,
            cancel: None,
            output: String::new(),
            status_msg: String::new(),
            show_help: false,
        };

        if database.is_some() {
            app.start_probe(&cc.egui_ctx);
        }

        app
    }

    /// Album names are mostly Chinese; egui's bundled fonts have no CJK glyphs.
    fn setup_cjk_fonts(ctx: &egui::Context) {
        let mut fonts = egui::FontDefinitions::default();

        let font_paths = [
            // macOS
            "/System/Library/Fonts/PingFang.ttc",
            "/System/Library/Fonts/STHeiti Medium.ttc",
            // Windows
            "C:\\Windows\\Fonts\\msyh.ttc",
            "C:\\Windows\\Fonts\\simsun.ttc",
            // Linux
            "/usr/share/fonts/truetype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/wenquanyi/wqy-microhei/wqy-microhei.ttc",
        ];

        for path in &font_paths {
            if let Ok(font_data) = std::fs::read(path) {
                fonts
                    .font_data
                    .insert("cjk_font".to_string(), egui::FontData::from_owned(font_data));

                for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
                    if let Some(fallbacks) = fonts.families.get_mut(&family) {
                        fallbacks.push("cjk_font".to_string());
                    }
                }

                ctx.set_fonts(fonts);
                return;
            }
        }
        log::warn!("no CJK font found, album names may not render");
    }

    fn is_running(&self) -> bool {
        self.cancel.is_some()
    }

    /// Reads the album list of the chosen database for the combo box.
    fn start_probe(&mut self, ctx: &egui::Context) {
        let path = PathBuf::from(&self.db_path);
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        self.status_msg = "Reading database...".to_string();

        std::thread::spawn(move || {
            let msg = match albums::album_summaries(&path) {
                Ok(list) => BgResult::AlbumsLoaded(list),
                Err(e) => BgResult::Error(format!("Cannot read database: {}", e)),
            };
            let _ = tx.send(msg);
            ctx.request_repaint();
        });
    }

    fn start_export(&mut self, ctx: &egui::Context) {
        let album = match self.selected_album {
            0 => None,
            i => self.albums.get(i - 1).map(|a| a.album_name.clone()),
        };
        let request = ExportRequest {
            database: PathBuf::from(&self.db_path),
            output_dir: PathBuf::from(&self.out_dir),
            album: AlbumFilter::from(album),
            verbose: self.verbose,
        };
        let cfg = config::load_config();
        let cancel = CancelToken::new();
        self.cancel = Some(cancel.clone());
        self.output.clear();
        self.status_msg = "Exporting...".to_string();

        let tx = self.tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let progress_tx = tx.clone();
            let progress_ctx = ctx.clone();
            let mut sink = move |line: Line| {
                let _ = progress_tx.send(BgResult::Progress(line.to_string()));
                progress_ctx.request_repaint();
            };

            let status = match export::run_configured(&request, &cfg, &cancel, &mut sink) {
                Ok(status) => status,
                Err(e) => {
                    let _ = tx.send(BgResult::Error(format!("Export failed: {:#}", e)));
                    1
                }
            };
            let _ = tx.send(BgResult::Finished(status));
            ctx.request_repaint();
        });
    }

    fn stop_export(&mut self) {
        if let Some(cancel) = &self.cancel {
            cancel.cancel();
            self.status_msg = "Stopping after the current track...".to_string();
        }
    }

    fn process_bg_results(&mut self) {
        while let Ok(result) = self.rx.try_recv() {
            match result {
                BgResult::AlbumsLoaded(albums) => {
                    self.status_msg = format!("{} albums in database", albums.len());
                    self.albums = albums;
                    self.selected_album = 0;
                }
                BgResult::Progress(line) => {
                    self.output.push_str(&line);
                    self.output.push('\n');
                }
                BgResult::Finished(status) => {
                    self.cancel = None;
                    self.status_msg = if status == 0 {
                        "Finished".to_string()
                    } else {
                        format!("Failed (status {})", status)
                    };
                }
                BgResult::Error(msg) => {
                    self.output.push_str(&msg);
                    self.output.push('\n');
                    self.status_msg = msg;
                }
            }
        }
    }

    fn album_label(&self) -> String {
        match self.selected_album {
            0 => "All".to_string(),
            i => self
                .albums
                .get(i - 1)
                .map(|a| a.album_name.clone())
                .unwrap_or_default(),
        }
    }
}

impl eframe::App for ExportApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_bg_results();
        let running = self.is_running();
        let album_label = self.album_label();

        egui::TopBottomPanel::top("paths_panel").show(ctx, |ui| {
            egui::Grid::new("paths_grid")
                .num_columns(3)
                .spacing([8.0, 6.0])
                .show(ui, |ui| {
                    ui.label("Database:");
                    let response = ui.text_edit_singleline(&mut self.db_path);
                    if ui.add_enabled(!running, egui::Button::new("Open...")).clicked() {
                        if let Some(file) = rfd::FileDialog::new()
                            .add_filter("SQLite", &["sqlite", "db"])
                            .pick_file()
                        {
                            self.db_path = file.display().to_string();
                            self.start_probe(ctx);
                        }
                    }
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        self.start_probe(ctx);
                    }
                    ui.end_row();

                    ui.label("Output folder:");
                    ui.text_edit_singleline(&mut self.out_dir);
                    if ui.add_enabled(!running, egui::Button::new("Choose...")).clicked() {
                        if let Some(folder) = rfd::FileDialog::new().pick_folder() {
                            self.out_dir = folder.display().to_string();
                        }
                    }
                    ui.end_row();
                });
        });

        egui::TopBottomPanel::top("action_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.add_enabled_ui(!running, |ui| {
                    egui::ComboBox::from_label("Album")
                        .selected_text(album_label)
                        .show_ui(ui, |ui| {
                            ui.selectable_value(&mut self.selected_album, 0, "All");
                            for (i, album) in self.albums.iter().enumerate() {
                                ui.selectable_value(
                                    &mut self.selected_album,
                                    i + 1,
                                    album.album_name.as_str(),
                                );
                            }
                        });
                    ui.checkbox(&mut self.verbose, "Verbose");
                });

                let ready = !self.db_path.trim().is_empty() && !self.out_dir.trim().is_empty();
                if ui
                    .add_enabled(!running && ready, egui::Button::new("Start"))
                    .clicked()
                {
                    self.start_export(ctx);
                }
                if ui.add_enabled(running, egui::Button::new("Stop")).clicked() {
                    self.stop_export();
                }
                if ui.button("Help").clicked() {
                    self.show_help = !self.show_help;
                }
                if running {
                    ui.spinner();
                }
                ui.label(&self.status_msg);
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .stick_to_bottom(true)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.monospace(self.output.as_str());
                });
        });

        egui::Window::new("Help")
            .open(&mut self.show_help)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(HELP_TEXT);
            });
    }
}
