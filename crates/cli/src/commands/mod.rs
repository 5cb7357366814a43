//! Command implementations

pub mod list;
pub mod listen;
pub mod monitor;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use keymux_engine::{KeyMuxConfig, KeyboardService};
use keymux_hid::mock::MockHidPort;
use keymux_hid::{HidApiPort, HidDeviceDescriptor, HidPort};

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub json: bool,
    pub config: Option<PathBuf>,
    pub interval_ms: Option<u64>,
    pub mock_keyboards: Option<u8>,
}

impl GlobalOptions {
    /// Load the configuration file, then apply command-line overrides.
    pub async fn load_config(&self) -> Result<KeyMuxConfig> {
        let mut config = match &self.config {
            Some(path) => KeyMuxConfig::load_from_path(path)
                .await
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => KeyMuxConfig::load()
                .await
                .context("failed to load default config")?,
        };

        if let Some(interval_ms) = self.interval_ms {
            config = config.with_interval_ms(interval_ms);
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }

    fn port(&self) -> Result<Arc<dyn HidPort>> {
        if let Some(count) = self.mock_keyboards {
            debug!(count, "Using simulated keyboards");
            return Ok(Arc::new(simulated_port(count)));
        }
        let port = HidApiPort::new().context("failed to initialise HID access")?;
        Ok(Arc::new(port))
    }

    pub async fn service(&self) -> Result<KeyboardService> {
        let config = self.load_config().await?;
        let port = self.port()?;
        Ok(KeyboardService::new(port, config)?)
    }
}

/// Port with `count` idle keyboards, for running without hardware.
fn simulated_port(count: u8) -> MockHidPort {
    let port = MockHidPort::new();
    for slot in 0..count {
        port.add_device(
            HidDeviceDescriptor::keyboard(0x046d, 0xc31c, format!("/dev/hidraw{slot}"))
                .with_manufacturer("Logitech")
                .with_product_name(format!("Simulated Keyboard {slot}")),
        );
    }
    port
}
