//! Shell wiring - manifest, asset index, server, and dispatcher in one place
//!
//! A [`Shell`] is the host-agnostic core assembled for one app: the asset
//! index over the app's bundle, the virtual-scheme content server, and the
//! bridge dispatcher bound to a set of host services. The surrounding webview
//! glue (whatever the platform provides) wires [`husk_scheme::ResourceProvider`]
//! into its scheme-handler callbacks and [`husk_bridge::MessageSink`] into its
//! message handlers.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use husk_assets::DirAssets;
use husk_bridge::{inject, BridgeDispatcher, HostServices, ScriptInjector};
use husk_scheme::{ContentServer, ResourceResolver};

/// Platform identifier used when the manifest does not override it.
pub const DEFAULT_PLATFORM: &str = "ios";

/// Application manifest (manifest.app.toml)
#[derive(Debug, Deserialize, Clone)]
pub struct Manifest {
    /// App metadata (name, identifier, version)
    pub app: App,
    /// Shell configuration (optional)
    pub shell: Option<ShellConfig>,
}

/// Application metadata
#[derive(Debug, Deserialize, Clone)]
pub struct App {
    /// Display name of the application
    pub name: String,
    /// Unique identifier (reverse-DNS format, e.g., "com.example.myapp")
    pub identifier: String,
    /// Semantic version (e.g., "1.0.0")
    pub version: String,
}

/// Shell configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ShellConfig {
    /// Platform identifier injected into the page (default: "ios")
    pub platform: Option<String>,
    /// Bundle directory relative to the app dir (default: "web")
    pub asset_dir: Option<String>,
}

impl Manifest {
    /// Load `manifest.app.toml` from the app directory, falling back to
    /// defaults when the file is absent (dev harness convenience).
    pub fn load_or_default(app_dir: &Path) -> Result<Self> {
        let path = app_dir.join("manifest.app.toml");
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "no manifest, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn platform(&self) -> &str {
        self.shell
            .as_ref()
            .and_then(|s| s.platform.as_deref())
            .unwrap_or(DEFAULT_PLATFORM)
    }

    pub fn asset_dir(&self) -> &str {
        self.shell
            .as_ref()
            .and_then(|s| s.asset_dir.as_deref())
            .unwrap_or("web")
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            app: App {
                name: "husk-app".to_string(),
                identifier: "dev.husk.app".to_string(),
                version: "0.0.0".to_string(),
            },
            shell: None,
        }
    }
}

/// The assembled core for one hosted app.
pub struct Shell {
    manifest: Manifest,
    server: Arc<ContentServer>,
    dispatcher: Arc<BridgeDispatcher>,
}

impl Shell {
    /// Assemble the shell over the app directory's bundle, with the given
    /// host services behind the bridge.
    pub fn new(manifest: Manifest, app_dir: &Path, services: Arc<dyn HostServices>) -> Self {
        let bundle = app_dir.join(manifest.asset_dir());
        tracing::info!(
            app = %manifest.app.name,
            bundle = %bundle.display(),
            "assembling shell"
        );

        let index = Arc::new(DirAssets::new(bundle));
        let resolver = Arc::new(ResourceResolver::new(index));
        let server = Arc::new(ContentServer::new(resolver));
        let dispatcher = Arc::new(BridgeDispatcher::new(services));

        Self {
            manifest,
            server,
            dispatcher,
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn server(&self) -> &Arc<ContentServer> {
        &self.server
    }

    pub fn dispatcher(&self) -> &Arc<BridgeDispatcher> {
        &self.dispatcher
    }

    /// Inject the platform markers after a successful page load. Idempotent;
    /// failures are logged and never propagate into navigation.
    pub fn on_page_loaded(&self, injector: &dyn ScriptInjector) {
        let script = inject::platform_marker_script(self.manifest.platform());
        if let Err(error) = injector.eval(&script) {
            tracing::error!(%error, "platform marker injection failed");
        } else {
            tracing::debug!(platform = self.manifest.platform(), "platform markers injected");
        }
    }
}

/// The console-interception shim co-delivered with the hosted app. The
/// embedder registers this to run at document start.
pub fn preload_js() -> &'static str {
    include_str!("../../../sdk/preload.js")
}

// ============================================================================
// Tests
// ============================================================================
