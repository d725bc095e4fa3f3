use std::{fs, process};
use std::net::SocketAddr;
use std::sync::Arc;
use log::{error, info, warn};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use tokio::select;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use crate::commons::error::Error;
use crate::config::Config;
use crate::constants::{PIXELTRACK_SERVER_APP, PIXELTRACK_VERSION};
use crate::eventlog::EventLog;
use super::http::server::HttpServer;


/// Runs the daemon until a listener stops or the process is interrupted.
///
/// If `signal_running` is given, it is triggered once all listeners are
/// bound. If any address cannot be bound, the daemon does not start and the
/// signal is dropped.
pub async fn start_pixeltrack_daemon(
    config: Arc<Config>,
    signal_running: Option<oneshot::Sender<()>>,
) -> Result<(), Error> {
    write_pid_file(&config)?;

    // A missing directory is not fatal: the pixel is served even when the
    // fetch cannot be recorded.
    let event_log = match config.event_log() {
        Ok(event_log) => event_log,
        Err(err) => {
            warn!("{err}");
            EventLog::new(config.event_log_path(), config.event_format)
        }
    };
    info!(
        "{} {} recording {} events to '{}'",
        PIXELTRACK_SERVER_APP,
        PIXELTRACK_VERSION,
        event_log.format(),
        event_log.path().display()
    );

    let server = Arc::new(HttpServer::new(event_log, config.clone()));

    let addrs = config.socket_addresses();
    if addrs.is_empty() {
        return Err(Error::custom("no address to listen on"))
    }

    // All sockets are bound before anyone is told we are running.
    let mut listeners = Vec::with_capacity(addrs.len());
    for addr in addrs {
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                info!("Listening on http://{addr}/");
                listeners.push((addr, listener));
            }
            Err(err) => {
                error!("Could not bind to {addr}: {err}");
                remove_pid_file(&config);
                return Err(Error::custom(format!(
                    "could not bind to {addr}: {err}"
                )))
            }
        }
    }

    if let Some(tx) = signal_running {
        let _ = tx.send(());
    }

    // Start a hyper server for each configured socket.
    let server_futures = futures_util::future::select_all(
        listeners.into_iter().map(|(addr, listener)| {
            tokio::spawn(single_http_listener(server.clone(), addr, listener))
        }),
    );

    select!(
        _ = server_futures => error!("http server stopped unexpectedly"),
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping {PIXELTRACK_SERVER_APP}");
            remove_pid_file(&config);
            return Ok(())
        }
    );

    remove_pid_file(&config);
    Err(Error::custom("stopping pixeltrack process"))
}

/// Runs an HTTP server on a single bound socket.
async fn single_http_listener(
    server: Arc<HttpServer>,
    addr: SocketAddr,
    listener: TcpListener,
) {
    loop {
        let (stream, remote) = match listener.accept().await {
            Ok(res) => res,
            Err(err) => {
                error!("Fatal error in HTTP server {addr}: {err}");
                return;
            }
        };
        let server = server.clone();
        tokio::task::spawn(async move {
            let _ = hyper_util::server::conn::auto::Builder::new(
                TokioExecutor::new(),
            )
            .serve_connection(
                TokioIo::new(stream),
                service_fn(move |req| {
                    let server = server.clone();
                    async move {
                        server.process_request(req, Some(remote)).await
                    }
                }),
            )
            .await;
        });
    }
}

fn write_pid_file(config: &Config) -> Result<(), Error> {
    let Some(pid_file) = config.pid_file.as_ref() else {
        return Ok(())
    };
    if let Some(parent) = pid_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Custom(format!(
                    "Could not create directory for PID file '{}': {}",
                    pid_file.display(), e
                ))
            })?;
        }
    }
    fs::write(pid_file, process::id().to_string()).map_err(|e| {
        Error::Custom(format!(
            "Could not write PID file '{}': {}", pid_file.display(), e
        ))
    })
}

fn remove_pid_file(config: &Config) {
    if let Some(pid_file) = config.pid_file.as_ref() {
        if let Err(err) = fs::remove_file(pid_file) {
            warn!(
                "Could not remove PID file '{}': {}", pid_file.display(), err
            );
        }
    }
}
