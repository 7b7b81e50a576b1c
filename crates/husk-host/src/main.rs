//! husk - shell host harness
//!
//! Assembles the shell core (asset index, virtual-scheme server, bridge
//! dispatcher) over an app directory and drives it from the command line,
//! with stub host services standing in for real device capabilities:
//!
//! ```text
//! husk [--app-dir DIR] serve app://local/index.html
//! husk [--app-dir DIR] dispatch bridge '{"action":"vibrate"}'
//! husk [--app-dir DIR] preload
//! ```
//!
//! `serve` runs the real per-task delivery path and writes the body to
//! stdout; `dispatch` routes one bridge message; `preload` prints the
//! scripts an embedder injects at document start and after page load.
//!
//! Log level comes from the `HUSK_LOG` environment variable (default: info).

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::sync::oneshot;

use husk_bridge::inject;
use husk_scheme::{ResourceProvider, SchemeError, SchemeTask};

mod shell;
mod stub;

use shell::{preload_js, Manifest, Shell};
use stub::StubHost;

enum Command {
    Serve { url: String },
    Dispatch { channel: String, payload: String },
    Preload,
}

fn usage() -> ! {
    eprintln!(
        "usage: husk [--app-dir DIR] <command>\n\
         \n\
         commands:\n\
         \x20 serve <app://local/...>       resolve and serve one request\n\
         \x20 dispatch <channel> <payload>  route one bridge message\n\
         \x20 preload                       print the injected bootstrap scripts"
    );
    std::process::exit(2);
}

fn parse_args() -> Result<(PathBuf, Command)> {
    let mut args = std::env::args().skip(1);
    let mut app_dir = PathBuf::from(".");

    let command = loop {
        match args.next().as_deref() {
            Some("--app-dir") => {
                app_dir = PathBuf::from(
                    args.next().context("--app-dir requires a directory argument")?,
                );
            }
            Some("serve") => {
                let url = args.next().context("serve requires a URL argument")?;
                break Command::Serve { url };
            }
            Some("dispatch") => {
                let channel = args.next().context("dispatch requires a channel argument")?;
                let payload = args.next().context("dispatch requires a payload argument")?;
                break Command::Dispatch { channel, payload };
            }
            Some("preload") => break Command::Preload,
            _ => usage(),
        }
    };

    Ok((app_dir, command))
}

/// Scheme task that streams response events to the terminal.
struct PrintTask {
    done: Option<oneshot::Sender<Result<(), SchemeError>>>,
}

impl SchemeTask for PrintTask {
    fn did_receive_response(&mut self, head: http::response::Parts) {
        eprintln!("{:?} {}", head.version, head.status);
        for (name, value) in head.headers.iter() {
            eprintln!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
        }
        eprintln!();
    }

    fn did_receive_data(&mut self, chunk: Vec<u8>) {
        if let Err(e) = std::io::stdout().write_all(&chunk) {
            tracing::error!(error = %e, "failed to write body to stdout");
        }
    }

    fn did_finish(&mut self) {
        if let Some(tx) = self.done.take() {
            let _ = tx.send(Ok(()));
        }
    }

    fn did_fail(&mut self, error: SchemeError) {
        if let Some(tx) = self.done.take() {
            let _ = tx.send(Err(error));
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("HUSK_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let (app_dir, command) = parse_args()?;
    let manifest = Manifest::load_or_default(&app_dir)?;
    let services = Arc::new(StubHost::new(manifest.platform()));
    let shell = Shell::new(manifest, &app_dir, services);

    match command {
        Command::Serve { url } => {
            let (tx, rx) = oneshot::channel();
            shell
                .server()
                .serve(1, &url, Box::new(PrintTask { done: Some(tx) }));
            match rx.await.context("serve task dropped")? {
                Ok(()) => Ok(()),
                Err(error) => bail!("{error}"),
            }
        }
        Command::Dispatch { channel, payload } => {
            // Accept raw JSON; anything unparseable is treated as a plain
            // string payload (handy for the log/toast channels).
            let value = serde_json::from_str(&payload)
                .unwrap_or_else(|_| serde_json::Value::String(payload));
            shell
                .dispatcher()
                .try_dispatch(&channel, value)
                .map_err(|e| anyhow::anyhow!("{e}"))
        }
        Command::Preload => {
            println!("// --- document-start shim ---");
            println!("{}", preload_js());
            println!("// --- page-load markers ---");
            println!(
                "{}",
                inject::platform_marker_script(shell.manifest().platform())
            );
            Ok(())
        }
    }
}
