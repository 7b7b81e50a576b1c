//! Bridge protocol - named message channels between script and native code
//!
//! The embedded application talks to the shell by posting a message on one of
//! a fixed set of named channels; the shell validates the payload shape per
//! channel and routes recognized actions to native capabilities. The channel
//! and action names are a closed wire protocol, represented here as explicit
//! enums so that new actions get compile-time coverage checking instead of
//! untyped string dispatch.
//!
//! Dispatch is never fatal: a malformed payload, unknown channel, or unknown
//! action is logged and dropped, and nothing here can terminate the host.

use serde::{Deserialize, Serialize};

pub mod dispatch;
pub mod inject;

pub use dispatch::{
    BridgeDispatcher, DeviceInfoSource, ExitPrompt, Haptics, HostServices, MessageSink,
    ScriptInjector, ToastSink,
};

/// Script global the device-info payload is injected under. Part of the wire
/// contract with the hosted application.
pub const DEVICE_INFO_GLOBAL: &str = "iOSDeviceInfo";

// ============================================================================
// Error Types with Structured Codes
// ============================================================================

/// Error codes for bridge dispatch (for machine-readable errors)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum BridgeErrorCode {
    /// Payload fails the channel's shape validation
    MalformedMessage = 3000,
    /// Valid shape, unrecognized action name
    UnknownAction = 3001,
    /// Message posted on a channel the shell does not register
    UnknownChannel = 3002,
    /// Serialization failed while building an injection script
    Inject = 3003,
}

/// Custom error type for bridge dispatch
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("[{code}] Malformed message on channel {channel}: {message}")]
    MalformedMessage {
        code: u32,
        channel: &'static str,
        message: String,
    },

    #[error("[{code}] Unknown bridge action: {action}")]
    UnknownAction { code: u32, action: String },

    #[error("[{code}] Unknown channel: {channel}")]
    UnknownChannel { code: u32, channel: String },

    #[error("[{code}] Injection script error: {message}")]
    Inject { code: u32, message: String },
}

impl BridgeError {
    pub fn malformed(channel: &'static str, message: impl Into<String>) -> Self {
        Self::MalformedMessage {
            code: BridgeErrorCode::MalformedMessage as u32,
            channel,
            message: message.into(),
        }
    }

    pub fn unknown_action(action: impl Into<String>) -> Self {
        Self::UnknownAction {
            code: BridgeErrorCode::UnknownAction as u32,
            action: action.into(),
        }
    }

    pub fn unknown_channel(channel: impl Into<String>) -> Self {
        Self::UnknownChannel {
            code: BridgeErrorCode::UnknownChannel as u32,
            channel: channel.into(),
        }
    }

    pub fn inject(message: impl Into<String>) -> Self {
        Self::Inject {
            code: BridgeErrorCode::Inject as u32,
            message: message.into(),
        }
    }
}

// ============================================================================
// Channels
// ============================================================================

/// The fixed channel set. Wire names must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Structured native actions (`{"action": …}` payloads).
    Bridge,
    /// Plain string relayed to the native informational log.
    Log,
    /// Plain string handed to the transient on-screen notice sink.
    Toast,
    /// `{level, message}` lines from the script console shim.
    ConsoleLog,
}

impl Channel {
    /// Resolve a wire channel name. `iOSBridge` is the legacy alias for the
    /// action channel and remains accepted.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "bridge" | "iOSBridge" => Some(Self::Bridge),
            "log" => Some(Self::Log),
            "toast" => Some(Self::Toast),
            "consoleLog" => Some(Self::ConsoleLog),
            _ => None,
        }
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Bridge => "bridge",
            Self::Log => "log",
            Self::Toast => "toast",
            Self::ConsoleLog => "consoleLog",
        }
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Structured actions carried on the `bridge` channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeAction {
    GetDeviceInfo,
    Vibrate,
    Exit,
    Unknown(String),
}

impl BridgeAction {
    pub fn from_wire(action: &str) -> Self {
        match action {
            "getDeviceInfo" => Self::GetDeviceInfo,
            "vibrate" => Self::Vibrate,
            "exit" => Self::Exit,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Envelope for `bridge`-channel payloads. Extra fields are permitted and
/// ignored; only `action` is validated here.
#[derive(Debug, Deserialize)]
pub struct ActionEnvelope {
    pub action: String,
}

// ============================================================================
// Console Lines
// ============================================================================

/// Severity a relayed console line maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Error,
    Warn,
    Info,
}

impl ConsoleLevel {
    /// Anything other than `error`/`warn` (including absent) is informational.
    pub fn from_wire(level: &str) -> Self {
        match level {
            "error" => Self::Error,
            "warn" => Self::Warn,
            _ => Self::Info,
        }
    }
}

/// A `consoleLog`-channel payload. `message` is required; a payload without
/// it fails validation and is dropped.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleLine {
    #[serde(default)]
    pub level: String,
    pub message: String,
}

impl ConsoleLine {
    pub fn severity(&self) -> ConsoleLevel {
        ConsoleLevel::from_wire(&self.level)
    }
}

// ============================================================================
// Device Info
// ============================================================================

/// Snapshot of device identity, generated fresh on each `getDeviceInfo`
/// request and never cached. Field names are the injected wire contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfoSnapshot {
    pub platform: String,
    pub version: String,
    pub model: String,
    pub name: String,
}

// ============================================================================
// Tests
// ============================================================================
