//! HTTP front end for the depot artifact repository.
//!
//! Serves the artifact endpoint (`HEAD`/`GET`/`PUT /artifact/<path>`) on top
//! of a [`Repository`], with a small worker pool over a shared `tiny_http`
//! listener. Configuration, the single-instance pid lock and the access
//! policy seam live here as well.
//!
//! The [`TestServer`] helper starts a server on a random port for integration testing.

pub mod access;
pub mod config;
pub mod handler;
pub mod instance;

pub use access::{AccessPolicy, AccessRequest, AllowAll};
pub use config::{config_path, resolve_home, ServerConfig, HOME_ENV};
pub use handler::{handle_request, ARTIFACT_PREFIX};
pub use instance::{install_shutdown_handler, InstanceLock, PID_FILE};

use depot_store::Repository;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use thiserror::Error;
use tiny_http::Server;
use tracing::error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration in '{}': {message}", .path.display())]
    Config { path: PathBuf, message: String },
    #[error("failed to bind {addr}: {message}")]
    Bind { addr: String, message: String },
    #[error("another depot instance is running (lock held on '{}')", .0.display())]
    AlreadyRunning(PathBuf),
}

/// Everything a request handler needs, shared across worker threads.
pub struct ServerState {
    repository: Repository,
    access: Box<dyn AccessPolicy>,
}

impl ServerState {
    pub fn new(repository: Repository) -> Self {
        Self {
            repository,
            access: Box::new(AllowAll),
        }
    }

    #[must_use]
    pub fn with_access_policy(mut self, policy: impl AccessPolicy + 'static) -> Self {
        self.access = Box::new(policy);
        self
    }

    #[inline]
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    #[inline]
    pub fn access_policy(&self) -> &dyn AccessPolicy {
        self.access.as_ref()
    }
}

pub fn bind(addr: &str) -> Result<Server, ServerError> {
    Server::http(addr).map_err(|e| ServerError::Bind {
        addr: addr.to_owned(),
        message: e.to_string(),
    })
}

fn spawn_workers(
    server: &Arc<Server>,
    state: &Arc<ServerState>,
    workers: usize,
) -> Vec<thread::JoinHandle<()>> {
    (0..workers.max(1))
        .map(|_| {
            let srv = Arc::clone(server);
            let state = Arc::clone(state);
            thread::spawn(move || {
                for request in srv.incoming_requests() {
                    handle_request(&state, request);
                }
            })
        })
        .collect()
}

/// Serve requests on `workers` threads until the server is unblocked once per worker.
pub fn serve(server: &Arc<Server>, state: &Arc<ServerState>, workers: usize) {
    for handle in spawn_workers(server, state, workers) {
        if handle.join().is_err() {
            error!("request worker panicked");
        }
    }
}

/// A test helper that starts a depot server on a random port in background threads.
///
/// The server listens on `127.0.0.1:{port}`; artifact URLs are under
/// `{url}/artifact/`. Dropping the `TestServer` unblocks its workers.
pub struct TestServer {
    pub url: String,
    pub port: u16,
    pub root: PathBuf,
    workers: usize,
    server: Arc<Server>,
}

impl TestServer {
    const WORKERS: usize = 4;

    /// Start a test server over a fresh repository at `root`.
    pub fn start(root: PathBuf) -> Self {
        Self::start_with(ServerState::new(Repository::new(root)))
    }

    /// Start a test server with a prepared state (custom access policy, proxy settings).
    pub fn start_with(state: ServerState) -> Self {
        let root = state.repository().root().to_path_buf();
        let server = Arc::new(bind("127.0.0.1:0").expect("failed to bind test HTTP server"));
        let port = server.server_addr().to_ip().expect("not an IP addr").port();
        let url = format!("http://127.0.0.1:{port}");

        let state = Arc::new(state);
        drop(spawn_workers(&server, &state, Self::WORKERS));

        Self {
            url,
            port,
            root,
            workers: Self::WORKERS,
            server,
        }
    }

    pub fn artifact_url(&self, path: &str) -> String {
        format!("{}{ARTIFACT_PREFIX}/{}", self.url, path.trim_start_matches('/'))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        for _ in 0..self.workers {
            self.server.unblock();
        }
    }
}
