#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result {
    env_logger::init();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        "eframe studio",
        native_options,
        Box::new(|cc| Ok(Box::new(eframe_studio::StudioApp::new(cc)))),
    )
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The web entry point lives with the hosting page; nothing to do here.
}
