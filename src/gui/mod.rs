#[cfg(feature = "gui")]
mod app;

#[cfg(feature = "gui")]
pub fn launch(database: Option<std::path::PathBuf>) {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([760.0, 560.0]),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "XimaExport",
        options,
        Box::new(move |cc| Ok(Box::new(app::ExportApp::new(cc, database)))),
    ) {
        log::error!("GUI exited with an error: {}", e);
    }
}
