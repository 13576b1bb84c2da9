use crate::ServerError;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tiny_http::Server;
use tracing::{info, warn};

/// File under the home directory that marks a running server.
pub const PID_FILE: &str = "depot.pid";

/// Exclusive lock on the pid file, held for the lifetime of the server.
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    pub fn acquire(path: &Path) -> Result<Self, ServerError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        if file.try_lock_exclusive().is_err() {
            return Err(ServerError::AlreadyRunning(path.to_path_buf()));
        }

        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        file.sync_all()?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
        let _ = self.file.unlock();
    }
}

/// Unblock every worker on Ctrl-C so the server loop returns and locks are released.
pub fn install_shutdown_handler(server: Arc<Server>, workers: usize) {
    let result = ctrlc::set_handler(move || {
        info!("shutdown requested, stopping workers");
        for _ in 0..workers {
            server.unblock();
        }
    });
    if let Err(e) = result {
        warn!("failed to install shutdown handler: {e}");
    }
}
