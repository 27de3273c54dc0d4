//! Listener task ownership and coordinated shutdown.
//!
//! A [`Supervisor`] owns every listener task of a process and one
//! [`CancellationToken`] they all watch. Shutdown starts when the stop signal
//! fires or when any listener exits; the token is then cancelled and every
//! remaining listener is drained before [`Supervisor::run_until`] returns.

use std::collections::HashMap;
use std::future::Future;

use tokio::task::{Id, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::ServeError;

type Joined = Result<(Id, Result<(), ServeError>), JoinError>;

/// Owns listener tasks and the shutdown token.
#[derive(Debug, Default)]
pub struct Supervisor {
    token: CancellationToken,
    tasks: JoinSet<Result<(), ServeError>>,
    names: HashMap<Id, String>,
}

impl Supervisor {
    /// Create an empty supervisor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The token every listener should stop on.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Start a listener task.
    pub fn spawn<F>(&mut self, name: impl Into<String>, task: F)
    where
        F: Future<Output = Result<(), ServeError>> + Send + 'static,
    {
        let handle = self.tasks.spawn(task);
        self.names.insert(handle.id(), name.into());
    }

    /// Number of listeners still running.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no listener is running.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run until `signal` fires or a listener exits, then shut everything down.
    ///
    /// Returns the first listener failure, if any.
    pub async fn run_until<S>(mut self, signal: S) -> Result<(), ServeError>
    where
        S: Future<Output = ()>,
    {
        let mut first_error = None;

        tokio::select! {
            () = signal => info!("Shutdown requested"),
            joined = self.tasks.join_next_with_id() => {
                if let Some(joined) = joined {
                    first_error = self.settle(joined).err();
                }
            }
        }

        self.token.cancel();
        while let Some(joined) = self.tasks.join_next_with_id().await {
            if let Err(err) = self.settle(joined) {
                first_error.get_or_insert(err);
            }
        }

        info!("All listeners stopped");
        first_error.map_or(Ok(()), Err)
    }

    fn settle(&mut self, joined: Joined) -> Result<(), ServeError> {
        match joined {
            Ok((id, result)) => {
                let name = self.names.remove(&id).unwrap_or_default();
                match result {
                    Ok(()) => {
                        info!(listener = %name, "Listener stopped");
                        Ok(())
                    }
                    Err(err) => {
                        error!(listener = %name, error = %err, "Listener failed");
                        Err(err)
                    }
                }
            }
            Err(err) => {
                let name = self.names.remove(&err.id()).unwrap_or_default();
                error!(listener = %name, error = %err, "Listener task aborted");
                Err(ServeError::TaskFailed { name })
            }
        }
    }
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
