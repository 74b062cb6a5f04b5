use crate::config::{env_bool, env_parse};
use crate::core::Rgb;
use crate::error::{ActuatorError, ConfigError};
use crate::hal::Actuator;
use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error, info};

/// Connection settings for the light controller
#[derive(Debug, Clone, PartialEq)]
pub struct SerialConfig {
    /// Device node, e.g. `/dev/ttyUSB0`. `None` means a link must be supplied
    /// with [`SerialActuator::with_link`].
    pub port: Option<PathBuf>,
    pub write_timeout: Duration,
    /// Reopen the port on the next send after a communication error
    pub auto_reconnect: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            write_timeout: Duration::from_secs(2),
            auto_reconnect: true,
        }
    }
}

impl SerialConfig {
    /// Read `SERIAL_PORT`, `SERIAL_TIMEOUT` (seconds) and `AUTO_RECONNECT`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(port) = std::env::var("SERIAL_PORT") {
            if !port.is_empty() {
                config.port = Some(PathBuf::from(port));
            }
        }
        if let Some(secs) = env_parse::<u64>("SERIAL_TIMEOUT")? {
            if secs == 0 {
                return Err(ConfigError::invalid("SERIAL_TIMEOUT", "must be positive"));
            }
            config.write_timeout = Duration::from_secs(secs);
        }
        if let Some(flag) = env_bool("AUTO_RECONNECT")? {
            config.auto_reconnect = flag;
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortInfo {
    pub port: Option<String>,
    pub connected: bool,
}

type Link = Box<dyn AsyncWrite + Send + Unpin>;

struct LinkState {
    link: Option<Link>,
    failed: bool,
}

/// Sends colour commands to the controller firmware over a byte link.
///
/// Commands are single lines (`RGB:r,g,b` or `HEX:RRGGBB`). The link is
/// opened lazily; after a write error it is dropped and, when
/// `auto_reconnect` is set, reopened on the next send.
pub struct SerialActuator {
    config: SerialConfig,
    state: Mutex<LinkState>,
}

impl SerialActuator {
    pub fn new(config: SerialConfig) -> Self {
        Self {
            config,
            state: Mutex::new(LinkState {
                link: None,
                failed: false,
            }),
        }
    }

    /// Use an already-open link instead of a device path
    pub fn with_link(link: impl AsyncWrite + Send + Unpin + 'static, config: SerialConfig) -> Self {
        Self {
            config,
            state: Mutex::new(LinkState {
                link: Some(Box::new(link)),
                failed: false,
            }),
        }
    }

    pub async fn connect(&self) -> Result<(), ActuatorError> {
        let mut state = self.state.lock().await;
        state.link = Some(self.open().await?);
        state.failed = false;
        Ok(())
    }

    pub async fn disconnect(&self) {
        let mut state = self.state.lock().await;
        if state.link.take().is_some() {
            info!(port = ?self.config.port, "disconnected");
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.state.lock().await.link.is_some()
    }

    pub async fn port_info(&self) -> PortInfo {
        PortInfo {
            port: self.config.port.as_ref().map(|p| p.display().to_string()),
            connected: self.is_connected().await,
        }
    }

    pub async fn send_rgb(&self, color: &Rgb) -> Result<String, ActuatorError> {
        self.send_line(&color.command()).await?;
        Ok(format!("Sent {}", color))
    }

    /// Send a `#RRGGBB` colour using the firmware's hex command
    pub async fn send_hex(&self, hex: &str) -> Result<String, ActuatorError> {
        let color = Rgb::from_hex(hex).map_err(|e| ActuatorError::Rejected(e.to_string()))?;
        let command = format!("HEX:{}\n", &color.to_hex()[1..]);
        self.send_line(&command).await?;
        Ok(format!("Sent {}", color.to_hex()))
    }

    async fn open(&self) -> Result<Link, ActuatorError> {
        let port = self
            .config
            .port
            .as_ref()
            .ok_or_else(|| ActuatorError::NotConnected("no serial port configured".to_string()))?;

        let file = timeout(
            self.config.write_timeout,
            OpenOptions::new().write(true).open(port),
        )
        .await
        .map_err(|_| ActuatorError::Timeout(self.config.write_timeout))?
        .map_err(|e| ActuatorError::NotConnected(format!("{}: {}", port.display(), e)))?;

        info!(port = %port.display(), "connected to controller");
        Ok(Box::new(file))
    }

    async fn send_line(&self, line: &str) -> Result<(), ActuatorError> {
        let mut state = self.state.lock().await;

        if state.link.is_none() {
            if state.failed && !self.config.auto_reconnect {
                return Err(ActuatorError::NotConnected(
                    "link lost and auto-reconnect disabled".to_string(),
                ));
            }
            state.link = Some(self.open().await?);
            state.failed = false;
        }

        let Some(link) = state.link.as_mut() else {
            return Err(ActuatorError::NotConnected("link unavailable".to_string()));
        };

        let write = async {
            link.write_all(line.as_bytes()).await?;
            link.flush().await
        };

        let result = match timeout(self.config.write_timeout, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ActuatorError::Io(e)),
            Err(_) => Err(ActuatorError::Timeout(self.config.write_timeout)),
        };

        match &result {
            Ok(()) => debug!(command = line.trim_end(), "sent command"),
            Err(e) => {
                error!(error = %e, "serial write failed, dropping link");
                state.link = None;
                state.failed = true;
            }
        }
        result
    }
}

#[async_trait]
impl Actuator<Rgb> for SerialActuator {
    async fn apply(&self, payload: &Rgb) -> Result<String, ActuatorError> {
        self.send_rgb(payload).await
    }
}
