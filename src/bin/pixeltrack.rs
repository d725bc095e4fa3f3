use std::sync::Arc;
use pixeltrack::config::Config;
use pixeltrack::constants::PIXELTRACK_SERVER_APP;
use pixeltrack::daemon::start::start_pixeltrack_daemon;

#[tokio::main]
async fn main() {
    match Config::create() {
        Ok(config) => {
            if let Err(e) = start_pixeltrack_daemon(
                Arc::new(config), None
            ).await {
                eprintln!("{PIXELTRACK_SERVER_APP} failed to start: {e}");
                ::std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            ::std::process::exit(1);
        }
    }
}
