//! Stub host services - desktop/CI implementation of the capability traits
//!
//! Real deployments back these traits with the platform's webview and device
//! APIs. The stub logs every capability call instead, which is enough for the
//! CLI harness and for exercising the dispatcher without hardware.

use husk_bridge::{DeviceInfoSnapshot, DeviceInfoSource, ExitPrompt, Haptics, ScriptInjector, ToastSink};

pub struct StubHost {
    platform: String,
}

impl StubHost {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
        }
    }
}

impl DeviceInfoSource for StubHost {
    fn snapshot(&self) -> DeviceInfoSnapshot {
        DeviceInfoSnapshot {
            platform: self.platform.clone(),
            version: std::env::consts::OS.to_string(),
            model: std::env::consts::ARCH.to_string(),
            name: "Stub Device".to_string(),
        }
    }
}

impl Haptics for StubHost {
    fn pulse(&self) {
        tracing::debug!("haptic pulse (no hardware, ignored)");
    }
}

impl ToastSink for StubHost {
    fn show(&self, message: &str) {
        tracing::info!(target: "husk::toast", "{message}");
    }
}

impl ExitPrompt for StubHost {
    fn explain(&self, title: &str, message: &str) {
        tracing::info!(target: "husk::alert", "{title}: {message}");
    }
}

impl ScriptInjector for StubHost {
    fn eval(&self, script: &str) -> Result<(), String> {
        tracing::debug!(script, "eval (stub, discarded)");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
