//! Screen wake lock handling
//!
//! On Linux the lock is a `systemd-inhibit` child process that holds an
//! idle/sleep inhibitor for as long as it lives. Platforms without it get
//! [`Unsupported`], which makes every acquire a logged no-op.

use std::{process::Stdio, sync::Arc};

use tokio::process::{Child, Command};
use tracing::{debug, error, info};

/// A held wake lock. Releasing consumes it.
pub trait WakeLockSentinel: Send {
    fn release(self: Box<Self>) -> Result<(), String>;
}

/// Platform capability that can hand out wake locks
pub trait WakeLockBackend: Send + Sync {
    fn is_supported(&self) -> bool;
    fn request(&self) -> Result<Box<dyn WakeLockSentinel>, String>;
}

/// Backend for platforms without a wake-lock capability
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl WakeLockBackend for Unsupported {
    fn is_supported(&self) -> bool {
        false
    }

    fn request(&self) -> Result<Box<dyn WakeLockSentinel>, String> {
        Err("Wake lock is not supported on this platform".to_string())
    }
}

/// Wake lock backed by `systemd-inhibit`
#[derive(Debug, Clone)]
pub struct SystemdInhibit {
    why: String,
}

impl SystemdInhibit {
    pub fn new(why: impl Into<String>) -> Self {
        Self { why: why.into() }
    }

    /// Return the backend if `systemd-inhibit` is available on this system
    pub async fn detect() -> Option<Self> {
        let output = Command::new("systemd-inhibit")
            .arg("--version")
            .output()
            .await
            .ok()?;

        if output.status.success() {
            info!("systemd-inhibit is available");
            Some(Self::new("Meditation session running"))
        } else {
            None
        }
    }
}

impl WakeLockBackend for SystemdInhibit {
    fn is_supported(&self) -> bool {
        true
    }

    fn request(&self) -> Result<Box<dyn WakeLockSentinel>, String> {
        let child = Command::new("systemd-inhibit")
            .arg("--what=idle:sleep")
            .arg("--who=gongy")
            .arg(format!("--why={}", self.why))
            .arg("--mode=block")
            .args(["sleep", "infinity"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("Failed to execute systemd-inhibit: {}", e))?;

        debug!("systemd-inhibit started (pid {:?})", child.id());
        Ok(Box::new(InhibitorProcess { child }))
    }
}

struct InhibitorProcess {
    child: Child,
}

impl WakeLockSentinel for InhibitorProcess {
    fn release(self: Box<Self>) -> Result<(), String> {
        let mut child = self.child;
        child
            .start_kill()
            .map_err(|e| format!("Failed to stop systemd-inhibit: {}", e))
    }
}

/// Holds at most one wake lock at a time
pub struct WakeLockGuard {
    backend: Arc<dyn WakeLockBackend>,
    sentinel: Option<Box<dyn WakeLockSentinel>>,
}

impl WakeLockGuard {
    pub fn new(backend: Arc<dyn WakeLockBackend>) -> Self {
        Self {
            backend,
            sentinel: None,
        }
    }

    pub fn is_held(&self) -> bool {
        self.sentinel.is_some()
    }

    /// Take the wake lock unless it is already held or unsupported
    pub fn acquire(&mut self) {
        if self.sentinel.is_some() {
            return;
        }
        if !self.backend.is_supported() {
            debug!("Wake lock unsupported, keeping screen awake is not possible");
            return;
        }

        match self.backend.request() {
            Ok(sentinel) => {
                self.sentinel = Some(sentinel);
                info!("Wake lock acquired");
            }
            Err(e) => error!("{} - Wake lock request failed", e),
        }
    }

    /// Drop the wake lock if held
    pub fn release(&mut self) {
        if let Some(sentinel) = self.sentinel.take() {
            match sentinel.release() {
                Ok(()) => info!("Wake lock released"),
                Err(e) => error!("{} - Wake lock release failed", e),
            }
        }
    }
}

impl Drop for WakeLockGuard {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        requests: AtomicUsize,
        releases: Arc<AtomicUsize>,
        reject: bool,
    }

    struct CountingSentinel(Arc<AtomicUsize>);

    impl WakeLockSentinel for CountingSentinel {
        fn release(self: Box<Self>) -> Result<(), String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl WakeLockBackend for Counting {
        fn is_supported(&self) -> bool {
            true
        }

        fn request(&self) -> Result<Box<dyn WakeLockSentinel>, String> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                return Err("NotAllowedError".to_string());
            }
            Ok(Box::new(CountingSentinel(self.releases.clone())))
        }
    }

    #[test]
    fn unsupported_never_holds() {
        let mut guard = WakeLockGuard::new(Arc::new(Unsupported));
        guard.acquire();
        assert!(!guard.is_held());
        guard.release();
        guard.acquire();
        assert!(!guard.is_held());
    }

    #[test]
    fn acquire_and_release_are_idempotent() {
        let backend = Arc::new(Counting::default());
        let mut guard = WakeLockGuard::new(backend.clone());

        guard.acquire();
        guard.acquire();
        assert!(guard.is_held());
        assert_eq!(backend.requests.load(Ordering::SeqCst), 1);

        guard.release();
        guard.release();
        assert!(!guard.is_held());
        assert_eq!(backend.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rejected_request_is_logged_not_held() {
        let backend = Arc::new(Counting {
            reject: true,
            ..Default::default()
        });
        let mut guard = WakeLockGuard::new(backend.clone());
        guard.acquire();
        assert!(!guard.is_held());
        guard.acquire();
        assert_eq!(backend.requests.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dropping_guard_releases_lock() {
        let backend = Arc::new(Counting::default());
        {
            let mut guard = WakeLockGuard::new(backend.clone());
            guard.acquire();
        }
        assert_eq!(backend.releases.load(Ordering::SeqCst), 1);
    }
}
