//! bot-runner: runs the Bathtub command bot over a line-delimited JSON feed.
//!
//! Usage:
//!   bot-runner --config config.json --db bathtub.db
//!   bot-runner --config config.json --connect-port 9000
//!
//! Each input line is one event:
//!   {"type":"message","author_id":"…","channel_id":"…","content":"!roll 3d6"}
//!   {"type":"quit"}
//! Each reply is written as one output line:
//!   {"channel_id":"…","content":"Rolls: 2 5 1 \nTotal: 8"}

use anyhow::{Context, Result};
use bathtub_core::{
    config::BotConfig,
    dispatch::{Dispatcher, InboundMessage, ReplySink},
    entity::{Item, Player},
    error::{BotError, BotResult},
    router::CommandRouter,
    store::BotStore,
};
use std::env;
use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::{Arc, Mutex};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum GatewayEvent {
    Message(InboundMessage),
    Quit,
}

#[derive(serde::Serialize)]
struct OutboundReply<'a> {
    channel_id: &'a str,
    content: &'a str,
}

/// Writes replies as JSON lines to any writer (stdout or the gateway socket).
struct LineSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> LineSink<W> {
    fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(out, "{line}")?;
        out.flush()
    }
}

impl<W: Write + Send> ReplySink for LineSink<W> {
    fn send(&self, channel_id: &str, content: &str) -> BotResult<()> {
        let line = serde_json::to_string(&OutboundReply { channel_id, content })?;
        self.write_line(&line)
            .map_err(|e| BotError::Transport(e.to_string()))
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config_path = arg_value(&args, "--config").unwrap_or("config.json");
    let connect_port = parse_port(arg_value(&args, "--connect-port"))?;

    let mut config = BotConfig::load(config_path)?;
    if let Some(db) = arg_value(&args, "--db") {
        config.db_path = db.to_string();
    }

    let store = BotStore::open(&config.db_path)?;
    store.migrate()?;
    let store = Arc::new(store);

    let router = Arc::new(CommandRouter::build(config, Arc::clone(&store)));
    log::info!("Bot is now running. Send {{\"type\":\"quit\"}} or close input to exit.");

    match connect_port {
        Some(port) => {
            let stream = TcpStream::connect(("127.0.0.1", port))?;
            log::info!("Connected to gateway on port {port}");
            let reader = BufReader::new(stream.try_clone()?);
            let sink = Arc::new(LineSink::new(stream));
            run_event_loop(reader, sink, router)?;
        }
        None => {
            let sink = Arc::new(LineSink::new(io::stdout()));
            run_event_loop(io::stdin().lock(), sink, router)?;
        }
    }

    print_summary(&store)?;
    Ok(())
}

fn run_event_loop<R, W>(mut input: R, sink: Arc<LineSink<W>>, router: Arc<CommandRouter>) -> Result<()>
where
    R: BufRead,
    W: Write + Send + 'static,
{
    let dispatcher = Dispatcher::new(router, sink.clone());
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = input.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let event: GatewayEvent = match serde_json::from_str(&buffer) {
            Ok(e) => e,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                sink.write_line(&err_json.to_string())?;
                continue;
            }
        };

        match event {
            GatewayEvent::Quit => break,
            GatewayEvent::Message(msg) => dispatcher.dispatch(msg),
        }
    }

    let joined = dispatcher.drain();
    log::info!("Shutting down; waited for {joined} in-flight handlers");
    Ok(())
}

fn print_summary(store: &BotStore) -> Result<()> {
    let players = store.count::<Player>()?;
    let items = store.count::<Item>()?;
    let handled = store.command_count("handled")?;
    let rejected = store.command_count("rejected")?;

    eprintln!("=== SESSION SUMMARY ===");
    eprintln!("  db:        {}", store.path().unwrap_or(":memory:"));
    eprintln!("  players:   {players}");
    eprintln!("  items:     {items}");
    eprintln!("  handled:   {handled}");
    eprintln!("  rejected:  {rejected}");
    Ok(())
}

fn parse_port(value: Option<&str>) -> Result<Option<u16>> {
    value
        .map(|p| p.parse::<u16>().with_context(|| format!("Invalid --connect-port {p:?}")))
        .transpose()
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_port_must_be_a_port_number() {
        assert_eq!(parse_port(None).unwrap(), None);
        assert_eq!(parse_port(Some("9000")).unwrap(), Some(9000));
        assert!(parse_port(Some("nine")).is_err());
        assert!(parse_port(Some("70000")).is_err());
    }

    #[test]
    fn flag_values_follow_their_flag() {
        let args: Vec<String> = ["bot-runner", "--db", "a.db", "--config"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(arg_value(&args, "--db"), Some("a.db"));
        assert_eq!(arg_value(&args, "--config"), None);
    }
}
