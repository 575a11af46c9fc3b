use collagefe::app::CollageFEApp;
use collagefe::cli;
use collagefe::config::EditorConfig;
use collagefe::logger;

use eframe::egui;

fn main() -> Result<(), eframe::Error> {
    // -- CLI / headless mode ------------------------------------------------
    if cli::CliArgs::is_cli_mode() {
        use clap::Parser;
        let args = cli::CliArgs::parse();
        std::process::exit(cli::run(args));
    }

    // -- GUI mode -------------------------------------------------------------

    // Initialize session log (overwrites previous session log)
    logger::init();

    let config = EditorConfig::load_or_default();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_title("CollageFE"),
        ..Default::default()
    };

    eframe::run_native(
        "CollageFE",
        options,
        Box::new(move |cc| Box::new(CollageFEApp::new(cc, config))),
    )
}
