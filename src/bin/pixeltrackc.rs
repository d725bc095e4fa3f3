use pixeltrack::cli::PixeltrackClient;
use pixeltrack::cli::options::Options;
use pixeltrack::constants::PIXELTRACK_CLIENT_APP;

#[tokio::main]
async fn main() {
    let options = Options::from_args();
    let client = match PixeltrackClient::new(options.general.server) {
        Ok(client) => client.with_api_only(options.general.api),
        Err(e) => {
            eprintln!("{PIXELTRACK_CLIENT_APP}: {e}");
            ::std::process::exit(1);
        }
    };
    let report = options.command.run(&client).await;
    match report.report(options.general.format) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("{e}");
            ::std::process::exit(1);
        }
    }
}
