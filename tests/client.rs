//! Tests the command line client against a running daemon.

use clap::Parser;
use pixeltrack::api::opens::OpensReport;
use pixeltrack::cli::{Error, PixeltrackClient};
use pixeltrack::cli::options::Options;
use pixeltrack::cli::report::ReportFormat;
use pixeltrack::constants::PIXELTRACK_STATUS_RUNNING;

mod common;
use common::PixeltrackServer;

#[tokio::test]
async fn client_health_events_and_opens() {
    let server = PixeltrackServer::start().await;
    let client = PixeltrackClient::new(server.base().clone()).unwrap();

    let health = client.health().await.unwrap();
    assert_eq!(health.status, PIXELTRACK_STATUS_RUNNING);

    assert!(client.events().await.unwrap().is_empty());

    // The first fetch of "a" is taken to be the sender's own client, the
    // second one a genuine open. "b" is only fetched once.
    server.fetch_pixel("id=a&subject=Report").await;
    server.fetch_pixel("id=b").await;
    server.fetch_pixel("id=a&subject=Report&to=bob%40example.com").await;

    let events = client.events().await.unwrap();
    assert_eq!(events.len(), 3);

    let report = OpensReport::from_events(&events.events);
    assert_eq!(report.opens.len(), 1);
    assert_eq!(report.total(), 1);
    assert_eq!(report.opens[0].id.as_str(), "a");
    assert_eq!(
        report.opens[0].representative.to.as_deref(), Some("bob@example.com")
    );

    let options = Options::try_parse_from([
        "pixeltrackc", "--server", server.base().as_str(), "opens"
    ]).unwrap();
    let text = options.command.run(&client).await
        .report(ReportFormat::Text).unwrap();
    assert!(text.starts_with("a opened 1 time(s)"));
}

#[tokio::test]
async fn client_reports_storage_errors() {
    let server = PixeltrackServer::start_with_config(|config, dir| {
        config.event_log = Some(dir.path().to_path_buf());
    }).await;
    let client = PixeltrackClient::new(server.base().clone()).unwrap();

    match client.events().await {
        Err(Error::ErrorResponseWithJson(_, status, res)) => {
            assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(res.label, "storage-unavailable");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
