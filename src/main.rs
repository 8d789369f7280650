use std::fs;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use runpad::{
    logging, DirectorySaver, EditorShell, EnvConfig, RunOutcome, RuntimeHandle, SessionRuntime,
    StdoutTerminal,
};
use session_transport::{ConnectionIdStore, WebSocketConnector};
use tracing::{error, info};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Run a program on a remote executor and talk to it from this terminal.
#[derive(Debug, Parser)]
#[command(name = "runpad", version)]
struct Cli {
    /// Program to submit as `main.py`; defaults to the built-in calculator.
    file: Option<PathBuf>,

    /// Executor origin, e.g. `http://127.0.0.1:8000`.
    #[arg(long)]
    server: Option<String>,

    #[arg(long)]
    socket_path: Option<String>,

    /// Directory holding the persisted connection id.
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Expect tagged `{"kind","payload"}` frames from the executor.
    #[arg(long)]
    tagged: bool,

    /// Log filter, e.g. `debug` or `session_transport=trace`.
    #[arg(long)]
    log: Option<String>,

    /// Also save the submitted program into this directory.
    #[arg(long)]
    save_to: Option<PathBuf>,

    /// Forget the stored connection id and mint a new one.
    #[arg(long)]
    reset_connection_id: bool,
}

impl Cli {
    fn apply(&self, config: &mut EnvConfig) {
        if let Some(server) = &self.server {
            config.server_origin = server.clone();
        }
        if let Some(socket_path) = &self.socket_path {
            config.socket_path = socket_path.clone();
        }
        if let Some(state_dir) = &self.state_dir {
            config.state_dir = state_dir.clone();
        }
        if self.tagged {
            config.tagged_protocol = true;
        }
        if let Some(log) = &self.log {
            config.log_filter = log.clone();
        }
    }
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let mut config = EnvConfig::from_env().map_err(io::Error::other)?;
    cli.apply(&mut config);
    logging::init(&config.log_filter);

    let store = ConnectionIdStore::new(&config.state_dir);
    if cli.reset_connection_id {
        store.reset().map_err(io::Error::other)?;
    }
    let record = store.load_or_create().map_err(io::Error::other)?;

    let mut shell = EditorShell::new(config.history_limit, config.protocol_mode());
    if let Some(path) = &cli.file {
        shell.edit(fs::read_to_string(path)?);
    }
    if let Some(dir) = &cli.save_to {
        shell.save(&mut DirectorySaver::new(dir), &mut StdoutTerminal::stdout())?;
    }

    let mut runtime = SessionRuntime::new(
        shell,
        config.transport_config(record.connection_id),
        WebSocketConnector::new(),
        StdoutTerminal::stdout(),
    )
    .map_err(io::Error::other)?;
    info!(url = runtime.transport().url(), "starting session");
    runtime.start(Instant::now()).map_err(io::Error::other)?;
    spawn_stdin_forwarder(runtime.handle())?;

    let outcome = drive(&mut runtime);
    runtime.stop();
    outcome
}

fn drive(runtime: &mut SessionRuntime<StdoutTerminal<io::Stdout>>) -> io::Result<()> {
    let handle = runtime.handle();
    let mut submitted = false;

    while runtime.run_once(Some(POLL_INTERVAL)) {
        if !submitted {
            if runtime.transport().is_open() {
                submitted = handle.run();
            } else if runtime.transport().gave_up() {
                return Err(unreachable_executor("could not reach the executor"));
            }
            continue;
        }

        match runtime.run_outcome() {
            None => {}
            Some(RunOutcome::Exited) => return Ok(()),
            Some(RunOutcome::Failed(message)) => return Err(io::Error::other(message)),
            Some(RunOutcome::ConnectionLost) => {
                return Err(unreachable_executor("lost the executor while the program was running"))
            }
        }
    }
    Ok(())
}

fn unreachable_executor(message: &str) -> io::Error {
    error!("{message}");
    io::Error::new(io::ErrorKind::NotConnected, message.to_string())
}

fn spawn_stdin_forwarder(handle: RuntimeHandle) -> io::Result<()> {
    thread::Builder::new()
        .name("runpad-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if !handle.input(format!("{line}\n")) {
                    return;
                }
            }
        })?;
    Ok(())
}
