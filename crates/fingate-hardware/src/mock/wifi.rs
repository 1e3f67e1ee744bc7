//! Scriptable WiFi station.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::info;

use crate::error::{HardwareError, Result};
use crate::traits::WifiControl;

#[derive(Debug, Default)]
struct WifiState {
    ip: Option<String>,
    resets: usize,
    disconnects: usize,
    fail_next: bool,
}

/// WiFi collaborator backed by shared in-memory state.
///
/// Clones share state. Resetting forgets the connection instead of
/// restarting anything.
#[derive(Debug, Clone, Default)]
pub struct MockWifi {
    state: Arc<Mutex<WifiState>>,
}

impl MockWifi {
    /// A station that is not connected (configuration portal mode).
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn connected(ip: impl Into<String>) -> Self {
        let wifi = Self::default();
        wifi.lock().ip = Some(ip.into());
        wifi
    }

    /// Make the next `reset` or `disconnect` fail.
    pub fn fail_next(&self) {
        self.lock().fail_next = true;
    }

    pub fn resets(&self) -> usize {
        self.lock().resets
    }

    pub fn disconnects(&self) -> usize {
        self.lock().disconnects
    }

    fn lock(&self) -> MutexGuard<'_, WifiState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_failure(state: &mut WifiState, operation: &str) -> Result<()> {
        if std::mem::take(&mut state.fail_next) {
            return Err(HardwareError::communication(format!(
                "wifi {} failed",
                operation
            )));
        }
        Ok(())
    }
}

impl WifiControl for MockWifi {
    fn is_connected(&self) -> bool {
        self.lock().ip.is_some()
    }

    fn current_ip(&self) -> String {
        self.lock()
            .ip
            .clone()
            .unwrap_or_else(|| "0.0.0.0".to_string())
    }

    async fn reset(&mut self) -> Result<()> {
        let mut state = self.lock();
        Self::check_failure(&mut state, "reset")?;
        state.ip = None;
        state.resets += 1;
        info!("wifi credentials cleared");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        let mut state = self.lock();
        Self::check_failure(&mut state, "disconnect")?;
        state.ip = None;
        state.disconnects += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disconnect_clears_ip() {
        let mut wifi = MockWifi::connected("192.168.1.40");
        assert!(wifi.is_connected());
        assert_eq!(wifi.current_ip(), "192.168.1.40");

        wifi.disconnect().await.unwrap();
        assert!(!wifi.is_connected());
        assert_eq!(wifi.disconnects(), 1);
    }

    #[tokio::test]
    async fn test_fail_next_is_one_shot() {
        let mut wifi = MockWifi::connected("10.0.0.2");
        wifi.fail_next();

        assert!(wifi.reset().await.is_err());
        assert!(wifi.is_connected());
        assert!(wifi.reset().await.is_ok());
        assert_eq!(wifi.resets(), 1);
    }
}
