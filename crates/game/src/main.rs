mod app;

use room_engine::run_app;
use tracing::error;

use app::bootstrap::build_app;
use app::rooms::Splash;

fn main() {
    let wiring = build_app();
    if let Err(err) = run_app(wiring.config, wiring.assets, || Splash) {
        error!(error = %err, "startup_failed");
        std::process::exit(1);
    }
}
