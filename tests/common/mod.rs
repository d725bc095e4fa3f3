#![allow(dead_code)] // Different tests use different parts.

use std::env;
use std::net::TcpListener;
use log::{error, LevelFilter};
use tempfile::TempDir;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use url::Url;
use pixeltrack::config::Config;
use pixeltrack::daemon::start::start_pixeltrack_daemon;


//------------ PixeltrackServer ----------------------------------------------

/// A test pixeltrack server.
///
/// The server keeps its data in a temporary directory and listens on a
/// free port on localhost. It is stopped when the value is dropped.
pub struct PixeltrackServer {
    join: JoinHandle<()>,
    base: Url,
    client: reqwest::Client,
    data_dir: TempDir,
}

impl PixeltrackServer {
    /// Starts a default test server.
    pub async fn start() -> Self {
        Self::start_with_config(|_, _| ()).await
    }

    /// Starts a test server with a modified config.
    ///
    /// The closure receives the config and the data directory.
    pub async fn start_with_config(
        op: impl FnOnce(&mut Config, &TempDir)
    ) -> Self {
        let data_dir = TempDir::new().unwrap();
        let port = free_port();
        let mut config = Config::test(data_dir.path(), port);
        config.log_level = if env::var("PIXELTRACK_TEST_DEBUG").is_ok() {
            LevelFilter::Debug
        }
        else {
            LevelFilter::Error
        };
        op(&mut config, &data_dir);
        let _ = config.init_logging(); // Allow failing on repeat attempts.

        let (tx, running) = oneshot::channel();
        let join = tokio::spawn(async move {
            if let Err(err) = start_pixeltrack_daemon(
                config.into(), Some(tx)
            ).await {
                error!("Pixeltrack failed to start: {}", err);
            }
        });
        assert!(running.await.is_ok());

        PixeltrackServer {
            join,
            base: Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap(),
            client: reqwest::Client::new(),
            data_dir,
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn data_dir(&self) -> &TempDir {
        &self.data_dir
    }

    pub fn uri(&self, path_and_query: &str) -> String {
        self.base.join(path_and_query).unwrap().to_string()
    }

    pub async fn get(&self, path_and_query: &str) -> reqwest::Response {
        self.client.get(self.uri(path_and_query)).send().await.unwrap()
    }

    pub async fn request(
        &self, method: reqwest::Method, path_and_query: &str
    ) -> reqwest::Response {
        self.client.request(
            method, self.uri(path_and_query)
        ).send().await.unwrap()
    }

    /// Fetches the pixel and checks that it was served.
    pub async fn fetch_pixel(&self, query: &str) {
        let res = self.get(&format!("pixel?{query}")).await;
        assert_eq!(res.status(), reqwest::StatusCode::OK);
    }

    /// Returns the parsed body of the events query.
    pub async fn logs(&self) -> serde_json::Value {
        let res = self.get("logs").await;
        assert_eq!(res.status(), reqwest::StatusCode::OK);
        res.json().await.unwrap()
    }
}

impl Drop for PixeltrackServer {
    fn drop(&mut self) {
        self.join.abort();
    }
}


//------------ Helpers -------------------------------------------------------

/// Returns a port on localhost that is currently free.
fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
}
