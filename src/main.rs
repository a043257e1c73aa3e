use eframe::egui;

mod app;
mod geolocation;
mod map;
mod models;
mod storage;
mod store;

use app::WorkoutMapApp;
use storage::FileStore;

fn main() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1180.0, 760.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Workout Map",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());

            let storage = FileStore::open("workouts.json");
            Ok(Box::new(WorkoutMapApp::new(Box::new(storage))))
        }),
    )
}
