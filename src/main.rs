//! sensor-hub console entry point.
//!
//! Connects to the hub, prints every inbound message and sends commands
//! typed on stdin.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use sensor_hub::codec::supported_kinds;
use sensor_hub::config::HubConfig;
use sensor_hub::login::HubLogin;
use sensor_hub::service::{HubSession, LogEntry};
use sensor_hub::ws::ConnectionManager;

const HELP: &str = "commands: <json or text> | /info <text> | /sample <Kind> | /raw <text> \
                    | /typed <Type> <text> | /dash <to> <text> | /kinds | /log | /quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = HubConfig::from_env().context("loading configuration")?;
    tracing::info!(url = %config.ws_url, target = %config.command_target, "starting sensor-hub console");

    // Obtain a token
    let token = match (&config.token, config.login_enabled) {
        (Some(token), _) => Some(token.clone()),
        (None, true) => Some(
            HubLogin::new(config.login_url.as_str())
                .login(&config.username, &config.password)
                .await
                .context("hub login")?,
        ),
        (None, false) => None,
    };

    // Build the session
    let manager = ConnectionManager::websocket();
    let printer = manager.subscribe(|inbound| {
        println!("{}", LogEntry::received(inbound).display());
    });
    let session = HubSession::new(manager, config.clone());
    session.start(token).context("starting hub session")?;

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let result = match line.split_once(' ').unwrap_or((line, "")) {
            ("/quit", _) => break,
            ("/kinds", _) => {
                println!("{}", supported_kinds().join(", "));
                continue;
            }
            ("/log", _) => {
                for entry in session.log().iter().rev() {
                    println!("{}", entry.display());
                }
                continue;
            }
            ("/info", text) => session.send_information(&config.command_target, text.trim()),
            ("/sample", kind) => session.send_sample(kind.trim(), None),
            ("/raw", text) => {
                report(session.send_raw(None, text.trim()).map(|frame| frame.to_string()));
                continue;
            }
            ("/typed", rest) => {
                let (msg_type, text) = rest.trim().split_once(' ').unwrap_or((rest.trim(), ""));
                report(
                    session
                        .send_raw(Some(msg_type), text.trim())
                        .map(|frame| frame.to_string()),
                );
                continue;
            }
            ("/dash", rest) => {
                let (to, text) = rest.trim().split_once(' ').unwrap_or((rest.trim(), ""));
                session.send_generic(to, text.trim())
            }
            _ => session.send_text_command(line, None),
        };

        match result {
            Ok(envelope) => println!("{}", LogEntry::sent(&envelope).display()),
            Err(err) => eprintln!("error: {err}"),
        }
    }

    printer.unsubscribe();
    session.shutdown();
    tracing::info!("sensor-hub console stopped");
    Ok(())
}

fn report(result: Result<String, sensor_hub::error::HubError>) {
    match result {
        Ok(frame) => println!("-> hub: {frame}"),
        Err(err) => eprintln!("error: {err}"),
    }
}
