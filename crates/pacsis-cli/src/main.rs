//! PACSIS operator console.
//!
//! Loads the door configuration, connects to the controller and reads
//! operator commands from stdin while applying controller updates as they
//! arrive.

mod repl;
mod status;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use pacsis_core::PeripheralKind;
use pacsis_core::constants::{DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_HOST, DEFAULT_WEBSOCKET_PORT};
use pacsis_network::ConnectionConfig;
use pacsis_panel::{ConfigSource, FileConfigSource, Session, StaticConfigSource};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::repl::{HELP, ReplCommand};

#[derive(Debug, Parser)]
#[command(
    name = "pacsis",
    version,
    about = "Operator console for a PACSIS door controller"
)]
struct Args {
    /// Controller host name or address
    #[arg(long, env = "PACSIS_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Controller WebSocket port
    #[arg(long, env = "PACSIS_PORT", default_value_t = DEFAULT_WEBSOCKET_PORT)]
    port: u16,

    /// Connection timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT_MS)]
    connect_timeout: u64,

    /// Door configuration document (JSON)
    #[arg(short, long, env = "PACSIS_CONFIG")]
    config: Option<PathBuf>,

    /// Start without connecting
    #[arg(long)]
    offline: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig::new(self.host.clone())
            .with_port(self.port)
            .with_connect_timeout(Duration::from_millis(self.connect_timeout))
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Where `reload` reads the configuration from.
enum Source {
    File(FileConfigSource),
    Missing(StaticConfigSource),
}

impl Source {
    async fn refresh(&self, session: &mut Session) -> bool {
        match self {
            Source::File(source) => session.refresh_config(source).await,
            Source::Missing(source) => session.refresh_config(source).await,
        }
    }
}

enum Flow {
    Continue,
    Quit,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let source = match &args.config {
        Some(path) => Source::File(FileConfigSource::new(path)),
        None => Source::Missing(StaticConfigSource::unavailable()),
    };

    let mut session = Session::new(args.connection_config());
    if let Source::File(file) = &source {
        // The file must exist at startup; later reload failures only alert.
        let document = file.fetch().await?;
        session.load_config(&document);
    }

    if !args.offline {
        session.connect().await;
    }

    info!(url = %session.connection().config().ws_url(), "Console ready");
    println!("{}", status::render(&session));

    run(&mut session, &source, BufReader::new(tokio::io::stdin())).await;

    session.shutdown().await;
    Ok(())
}

/// Read operator commands from `input` until it ends, fails or asks to quit,
/// applying controller updates in between.
async fn run<R>(session: &mut Session, source: &Source, input: R)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "Failed to read operator input");
                        break;
                    }
                };
                if let Flow::Quit = handle_line(session, source, &line).await {
                    break;
                }
            }
            outcome = session.next_update() => {
                let Some(outcome) = outcome else {
                    break;
                };
                if outcome.changed() {
                    debug!(?outcome, "State changed");
                    println!("{}", status::render(session));
                }
            }
        }
    }
}

async fn handle_line(session: &mut Session, source: &Source, line: &str) -> Flow {
    let command = match repl::parse(line) {
        Ok(Some(command)) => command,
        Ok(None) => return Flow::Continue,
        Err(e) => {
            println!("{e}");
            return Flow::Continue;
        }
    };

    let sent = match command {
        ReplCommand::Status => {
            println!("{}", status::render(session));
            return Flow::Continue;
        }
        ReplCommand::Open { door, monitor } => session.open_door(&door, &monitor),
        ReplCommand::Close { door, monitor } => session.close_door(&door, &monitor),
        ReplCommand::Rex { door, rex } => session.push_rex(&door, &rex),
        ReplCommand::Key { door, reader, key } => session.press_key(&door, &reader, key),
        ReplCommand::Pin { door, reader, pin } => session.enter_pin(&door, &reader, &pin),
        ReplCommand::Swipe {
            door,
            reader,
            facility_code,
            card_number,
        } => session.swipe_card(&door, &reader, facility_code, card_number),
        ReplCommand::Activate { door, input } => session.activate_input(&door, &input),
        ReplCommand::Deactivate { door, input } => session.deactivate_input(&door, &input),
        ReplCommand::Press { door, peripheral } => {
            let button = match session.tree().peripheral_owner(&peripheral) {
                Some((owner, PeripheralKind::DoorMonitor)) if owner.id().as_str() == door => {
                    session.door_button(&door)
                }
                Some((owner, PeripheralKind::DigitalInput)) if owner.id().as_str() == door => {
                    session.input_button(&door, &peripheral)
                }
                _ => {
                    println!("{peripheral} is not a door monitor or digital input of {door}");
                    return Flow::Continue;
                }
            };
            if button.is_blank() {
                println!("button is blank until the controller reports state");
                return Flow::Continue;
            }
            println!("pressing [{button}]");
            session.press(&button).await
        }
        ReplCommand::Connect => {
            session.connect().await;
            return Flow::Continue;
        }
        ReplCommand::Disconnect => {
            session.disconnect().await;
            return Flow::Continue;
        }
        ReplCommand::Toggle => {
            session.toggle_connection().await;
            return Flow::Continue;
        }
        ReplCommand::Alerts => {
            if session.alerts().is_empty() {
                println!("no alerts");
            }
            for (index, alert) in session.alerts().iter().enumerate() {
                println!("{index}: {alert}");
            }
            return Flow::Continue;
        }
        ReplCommand::Dismiss(index) => {
            if session.alerts_mut().dismiss(index).is_none() {
                println!("no alert {index}");
            }
            return Flow::Continue;
        }
        ReplCommand::Reload => {
            if source.refresh(session).await {
                println!("{}", status::render(session));
            } else {
                println!("reload failed, see 'alerts'");
            }
            return Flow::Continue;
        }
        ReplCommand::Dump => {
            println!("{}", session.tree().to_json());
            return Flow::Continue;
        }
        ReplCommand::Help => {
            println!("{HELP}");
            return Flow::Continue;
        }
        ReplCommand::Quit => return Flow::Quit,
    };

    if !sent {
        println!("not sent (disconnected or missing field)");
    }
    Flow::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    fn offline_session() -> Session {
        let mut session = Session::new(ConnectionConfig::default());
        assert!(session.load_config(r#"[{"Id": "D1", "DoorMonitor": [{"Id": "M1"}]}]"#));
        session
    }

    #[tokio::test]
    async fn test_run_stops_on_unreadable_input() {
        let mut session = offline_session();
        let source = Source::Missing(StaticConfigSource::unavailable());
        let input: &[u8] = b"status\n\xff\xfe\nreload\n";

        timeout(Duration::from_secs(5), run(&mut session, &source, input))
            .await
            .unwrap();

        // The line after the invalid one was never handled.
        assert!(session.alerts().is_empty());
        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_run_handles_lines_until_quit() {
        let mut session = offline_session();
        let source = Source::Missing(StaticConfigSource::unavailable());
        let input: &[u8] = b"reload\nquit\nreload\n";

        timeout(Duration::from_secs(5), run(&mut session, &source, input))
            .await
            .unwrap();

        assert_eq!(session.alerts().len(), 1);
        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_run_ends_with_input() {
        let mut session = offline_session();
        let source = Source::Missing(StaticConfigSource::unavailable());
        let input: &[u8] = b"";

        timeout(Duration::from_secs(5), run(&mut session, &source, input))
            .await
            .unwrap();

        assert!(!session.is_connected());
    }
}
