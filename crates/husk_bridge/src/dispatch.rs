//! Bridge dispatcher - channel validation and action routing
//!
//! The host's message-handler glue forwards every posted message here as a
//! channel name plus raw JSON payload. The dispatcher validates the payload
//! against the channel's expected shape, then either relays it (log, toast,
//! console lines) or performs the requested native action through the host
//! capability traits. Responses back to the script environment (device info)
//! travel out of band as a fire-and-forget script injection, never as a
//! return value.

use std::sync::Arc;

use serde_json::Value;

use crate::{
    inject, ActionEnvelope, BridgeAction, BridgeError, Channel, ConsoleLevel, ConsoleLine,
    DeviceInfoSnapshot,
};

/// Shown when the hosted app requests programmatic exit, which the platform
/// does not support.
pub const EXIT_TITLE: &str = "Exit";
pub const EXIT_MESSAGE: &str = "To exit the app, swipe up from the bottom of the screen \
     (or press the home button) to return to the home screen.";

// ============================================================================
// Host Capability Traits
// ============================================================================

/// Produces a fresh device identity snapshot per request.
pub trait DeviceInfoSource: Send + Sync {
    fn snapshot(&self) -> DeviceInfoSnapshot;
}

/// Single haptic feedback pulse. Hardware without support ignores the call.
pub trait Haptics: Send + Sync {
    fn pulse(&self);
}

/// Transient on-screen notice. Rendering is owned by the UI layer; the
/// dispatcher's responsibility ends at handing off the string.
pub trait ToastSink: Send + Sync {
    fn show(&self, message: &str);
}

/// Surfaces a user-facing explanation. Implementations must never call a
/// process-termination primitive.
pub trait ExitPrompt: Send + Sync {
    fn explain(&self, title: &str, message: &str);
}

/// Evaluates a script inside the embedded script environment.
pub trait ScriptInjector: Send + Sync {
    fn eval(&self, script: &str) -> Result<(), String>;
}

/// Everything the dispatcher needs from its host, grouped so wiring takes a
/// single object.
pub trait HostServices:
    DeviceInfoSource + Haptics + ToastSink + ExitPrompt + ScriptInjector
{
}

impl<T> HostServices for T where
    T: DeviceInfoSource + Haptics + ToastSink + ExitPrompt + ScriptInjector
{
}

/// Capability interface the host wires into its message-handler event model.
pub trait MessageSink: Send + Sync {
    /// Side-effecting; never returns a value to the caller. Failures are
    /// logged and dropped.
    fn dispatch(&self, channel: &str, payload: Value);
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Routes validated bridge messages to host capabilities and native logging.
pub struct BridgeDispatcher {
    services: Arc<dyn HostServices>,
}

impl BridgeDispatcher {
    pub fn new(services: Arc<dyn HostServices>) -> Self {
        Self { services }
    }

    /// Validate and route one message. Callers that want the failure reason
    /// (tests, harnesses) use this; webview glue goes through
    /// [`MessageSink::dispatch`], which logs and swallows it.
    pub fn try_dispatch(&self, channel: &str, payload: Value) -> Result<(), BridgeError> {
        let channel =
            Channel::from_wire(channel).ok_or_else(|| BridgeError::unknown_channel(channel))?;
        tracing::debug!(channel = channel.wire_name(), "bridge message received");

        match channel {
            Channel::Bridge => self.handle_action(payload),
            Channel::Log => {
                let line = expect_string(Channel::Log, payload)?;
                tracing::info!(target: "husk::webview", "{line}");
                Ok(())
            }
            Channel::Toast => {
                let line = expect_string(Channel::Toast, payload)?;
                self.services.show(&line);
                Ok(())
            }
            Channel::ConsoleLog => self.relay_console(payload),
        }
    }

    fn handle_action(&self, payload: Value) -> Result<(), BridgeError> {
        let envelope: ActionEnvelope = serde_json::from_value(payload)
            .map_err(|e| BridgeError::malformed(Channel::Bridge.wire_name(), e.to_string()))?;

        match BridgeAction::from_wire(&envelope.action) {
            BridgeAction::GetDeviceInfo => self.inject_device_info(),
            BridgeAction::Vibrate => {
                self.services.pulse();
                Ok(())
            }
            BridgeAction::Exit => {
                // The platform reserves termination for the user's own
                // app-switching gesture; explain instead of exiting.
                self.services.explain(EXIT_TITLE, EXIT_MESSAGE);
                Ok(())
            }
            BridgeAction::Unknown(name) => Err(BridgeError::unknown_action(name)),
        }
    }

    /// Build a fresh snapshot and push it into the script global namespace.
    /// Fire-and-forget: an eval failure is logged, not retried, and the
    /// message still counts as dispatched.
    fn inject_device_info(&self) -> Result<(), BridgeError> {
        let snapshot = self.services.snapshot();
        let script = inject::device_info_script(&snapshot)?;
        if let Err(error) = self.services.eval(&script) {
            tracing::error!(%error, "device info injection failed");
        }
        Ok(())
    }

    fn relay_console(&self, payload: Value) -> Result<(), BridgeError> {
        let line: ConsoleLine = serde_json::from_value(payload)
            .map_err(|e| BridgeError::malformed(Channel::ConsoleLog.wire_name(), e.to_string()))?;

        match line.severity() {
            ConsoleLevel::Error => tracing::error!(target: "husk::console", "{}", line.message),
            ConsoleLevel::Warn => tracing::warn!(target: "husk::console", "{}", line.message),
            ConsoleLevel::Info => tracing::info!(target: "husk::console", "{}", line.message),
        }
        Ok(())
    }
}

impl MessageSink for BridgeDispatcher {
    fn dispatch(&self, channel: &str, payload: Value) {
        if let Err(error) = self.try_dispatch(channel, payload) {
            tracing::warn!(channel, %error, "bridge message dropped");
        }
    }
}

fn expect_string(channel: Channel, payload: Value) -> Result<String, BridgeError> {
    match payload {
        Value::String(s) => Ok(s),
        other => Err(BridgeError::malformed(
            channel.wire_name(),
            format!("expected a string payload, got {other}"),
        )),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BridgeErrorCode;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockHost {
        pulses: AtomicUsize,
        toasts: Mutex<Vec<String>>,
        exits: Mutex<Vec<(String, String)>>,
        scripts: Mutex<Vec<String>>,
        fail_eval: bool,
    }

    impl DeviceInfoSource for MockHost {
        fn snapshot(&self) -> DeviceInfoSnapshot {
            DeviceInfoSnapshot {
                platform: "ios".to_string(),
                version: "17.4".to_string(),
                model: "iPhone".to_string(),
                name: "Test Device".to_string(),
            }
        }
    }

    impl Haptics for MockHost {
        fn pulse(&self) {
            self.pulses.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl ToastSink for MockHost {
        fn show(&self, message: &str) {
            self.toasts.lock().unwrap().push(message.to_string());
        }
    }

    impl ExitPrompt for MockHost {
        fn explain(&self, title: &str, message: &str) {
            self.exits
                .lock()
                .unwrap()
                .push((title.to_string(), message.to_string()));
        }
    }

    impl ScriptInjector for MockHost {
        fn eval(&self, script: &str) -> Result<(), String> {
            if self.fail_eval {
                return Err("script environment gone".to_string());
            }
            self.scripts.lock().unwrap().push(script.to_string());
            Ok(())
        }
    }

    fn dispatcher() -> (BridgeDispatcher, Arc<MockHost>) {
        let host = Arc::new(MockHost::default());
        (BridgeDispatcher::new(host.clone()), host)
    }

    #[test]
    fn get_device_info_injects_complete_payload() {
        let (d, host) = dispatcher();
        d.try_dispatch("bridge", json!({"action": "getDeviceInfo"}))
            .unwrap();

        let scripts = host.scripts.lock().unwrap();
        assert_eq!(scripts.len(), 1);
        let script = &scripts[0];
        let prefix = format!("window.{} = ", crate::DEVICE_INFO_GLOBAL);
        assert!(script.starts_with(&prefix), "{script}");

        let json_part = script
            .strip_prefix(&prefix)
            .and_then(|s| s.strip_suffix(';'))
            .unwrap();
        let value: Value = serde_json::from_str(json_part).unwrap();
        for field in ["platform", "version", "model", "name"] {
            assert!(value.get(field).is_some_and(|v| !v.is_null()), "{field}");
        }
        assert_eq!(value["platform"], "ios");
    }

    #[test]
    fn device_info_is_fresh_per_request() {
        let (d, host) = dispatcher();
        d.try_dispatch("bridge", json!({"action": "getDeviceInfo"}))
            .unwrap();
        d.try_dispatch("bridge", json!({"action": "getDeviceInfo"}))
            .unwrap();
        assert_eq!(host.scripts.lock().unwrap().len(), 2);
    }

    #[test]
    fn injection_failure_is_swallowed() {
        let host = Arc::new(MockHost {
            fail_eval: true,
            ..MockHost::default()
        });
        let d = BridgeDispatcher::new(host.clone());
        // Dispatch still succeeds; the failure is logged, not retried.
        d.try_dispatch("bridge", json!({"action": "getDeviceInfo"}))
            .unwrap();
        assert!(host.scripts.lock().unwrap().is_empty());
    }

    #[test]
    fn vibrate_pulses_once_and_returns_nothing() {
        let (d, host) = dispatcher();
        d.try_dispatch("bridge", json!({"action": "vibrate"})).unwrap();
        assert_eq!(host.pulses.load(Ordering::SeqCst), 1);
        assert!(host.scripts.lock().unwrap().is_empty());
    }

    #[test]
    fn exit_explains_instead_of_terminating() {
        let (d, host) = dispatcher();
        d.try_dispatch("bridge", json!({"action": "exit"})).unwrap();

        let exits = host.exits.lock().unwrap();
        assert_eq!(exits.len(), 1);
        assert!(exits[0].1.contains("swipe up"));
    }

    #[test]
    fn unknown_action_has_no_side_effect() {
        let (d, host) = dispatcher();
        let err = d
            .try_dispatch("bridge", json!({"action": "frobnicate"}))
            .unwrap_err();
        assert!(matches!(err, BridgeError::UnknownAction { .. }));
        assert!(err.to_string().contains("frobnicate"));

        assert_eq!(host.pulses.load(Ordering::SeqCst), 0);
        assert!(host.scripts.lock().unwrap().is_empty());
        assert!(host.exits.lock().unwrap().is_empty());

        // The logging path swallows the failure without panicking.
        d.dispatch("bridge", json!({"action": "frobnicate"}));
    }

    #[test]
    fn bridge_payload_without_action_is_malformed() {
        let (d, _) = dispatcher();
        let err = d.try_dispatch("bridge", json!({"foo": 1})).unwrap_err();
        assert!(matches!(err, BridgeError::MalformedMessage { .. }));

        let err = d.try_dispatch("bridge", json!("vibrate")).unwrap_err();
        assert!(matches!(err, BridgeError::MalformedMessage { .. }));
    }

    #[test]
    fn legacy_bridge_channel_alias_routes() {
        let (d, host) = dispatcher();
        d.try_dispatch("iOSBridge", json!({"action": "vibrate"}))
            .unwrap();
        assert_eq!(host.pulses.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn log_channel_requires_plain_string() {
        let (d, _) = dispatcher();
        d.try_dispatch("log", json!("hello from the page")).unwrap();

        let err = d.try_dispatch("log", json!({"message": "x"})).unwrap_err();
        assert!(matches!(err, BridgeError::MalformedMessage { .. }));
    }

    #[test]
    fn toast_hands_off_the_string() {
        let (d, host) = dispatcher();
        d.try_dispatch("toast", json!("saved")).unwrap();
        assert_eq!(host.toasts.lock().unwrap().as_slice(), ["saved"]);
    }

    #[test]
    fn console_log_levels_route() {
        let (d, _) = dispatcher();
        for level in ["error", "warn", "log", "info", ""] {
            d.try_dispatch("consoleLog", json!({"level": level, "message": "m"}))
                .unwrap();
        }
        // Missing level is informational, not an error.
        d.try_dispatch("consoleLog", json!({"message": "m"})).unwrap();
    }

    #[test]
    fn console_log_without_message_is_dropped() {
        let (d, host) = dispatcher();
        let err = d
            .try_dispatch("consoleLog", json!({"level": "error"}))
            .unwrap_err();
        assert!(matches!(err, BridgeError::MalformedMessage { .. }));
        assert!(host.toasts.lock().unwrap().is_empty());
    }

    #[test]
    fn unknown_channel_is_reported() {
        let (d, _) = dispatcher();
        let err = d.try_dispatch("telemetry", json!("x")).unwrap_err();
        assert!(matches!(err, BridgeError::UnknownChannel { .. }));
        assert!(err.to_string().contains(&format!(
            "{}",
            BridgeErrorCode::UnknownChannel as u32
        )));
    }
}
