//! Scrawl debug harness: a loopback collaborative session in one process.
//!
//! Wires a `TextEngine` and a `BoardEngine` to an in-process authority task
//! that assigns `mod_id`s and echoes every operation back, exactly as the
//! real server would for a single participant. A `r ...` command injects
//! operations attributed to a simulated second participant, which drives the
//! rebase path end to end. Commands arrive on stdin; the rendered markup is
//! printed after every state change.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use core_board::{BoardEngine, Modifiers, Tool};
use core_config::LogConfig;
use core_editor::TextEngine;
use core_events::{
    BoardEvent, EventSink, ModId, TextClientEvent, TextServerEvent, UserId,
};
use core_geom::point;
use core_transport::{Endpoint, loopback};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOCAL_USER: UserId = 1;
const SIM_USER: UserId = 99;
const PING_SECS: u64 = 10;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "scrawl", version, about = "Scrawl collaborative core harness")]
struct Args {
    /// Optional configuration file path (overrides discovery of `scrawl.toml`).
    #[arg(long = "config")]
    config: Option<PathBuf>,
    /// Join read-only regardless of configuration.
    #[arg(long = "read-only")]
    read_only: bool,
}

/// Everything the client side hands to the authority.
#[derive(Debug)]
enum Submission {
    Local(TextClientEvent),
    Remote(TextClientEvent),
    Board(BoardEvent),
}

/// Engine-facing sink that wraps text events into submissions.
struct TextSink {
    tx: mpsc::Sender<Submission>,
}

impl EventSink<TextClientEvent> for TextSink {
    fn emit(&mut self, event: TextClientEvent) {
        if let Err(err) = self.tx.try_send(Submission::Local(event)) {
            tracing::warn!(target: "transport.wire", ?err, "outbound_drop");
        }
    }
}

struct BoardSink {
    tx: mpsc::Sender<Submission>,
}

impl EventSink<BoardEvent> for BoardSink {
    fn emit(&mut self, event: BoardEvent) {
        if let Err(err) = self.tx.try_send(Submission::Board(event)) {
            tracing::warn!(target: "transport.wire", ?err, "outbound_drop");
        }
    }
}

fn init_tracing(log: &LogConfig) -> Result<Option<WorkerGuard>> {
    let directives = log
        .filter
        .clone()
        .or_else(|| std::env::var(EnvFilter::DEFAULT_ENV).ok())
        .unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_new(directives)?;
    match &log.file {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

/// The loopback authority: totally orders text operations with strictly
/// increasing `mod_id`s and broadcasts back; board events echo verbatim.
async fn authority(
    mut rx: mpsc::Receiver<Submission>,
    text_tx: mpsc::Sender<TextServerEvent>,
    board_tx: mpsc::Sender<BoardEvent>,
    start_mod: ModId,
) {
    let mut mod_id = start_mod;
    while let Some(submission) = rx.recv().await {
        match submission {
            Submission::Local(event) => {
                if let Some(out) = order(event, LOCAL_USER, "me", &mut mod_id) {
                    let _ = text_tx.send(out).await;
                }
            }
            Submission::Remote(event) => {
                if let Some(out) = order(event, SIM_USER, "sim", &mut mod_id) {
                    let _ = text_tx.send(out).await;
                }
            }
            Submission::Board(event) => {
                let _ = board_tx.send(event).await;
            }
        }
    }
}

fn order(
    event: TextClientEvent,
    userid: UserId,
    username: &str,
    mod_id: &mut ModId,
) -> Option<TextServerEvent> {
    let mut next = || {
        *mod_id += 1;
        *mod_id
    };
    match event {
        TextClientEvent::AddRegion { text, position, .. } => Some(TextServerEvent::AddRegion {
            text,
            position,
            userid,
            mod_id: next(),
        }),
        TextClientEvent::RemoveRegion { start, end, .. } => Some(TextServerEvent::RemoveRegion {
            start,
            end,
            userid,
            mod_id: next(),
        }),
        TextClientEvent::AddProperty {
            start,
            end,
            property,
            flag,
            ..
        } => Some(TextServerEvent::AddProperty {
            start,
            end,
            property,
            flag,
            userid,
            mod_id: next(),
        }),
        TextClientEvent::RemoveProperty {
            start,
            end,
            property,
            ..
        } => Some(TextServerEvent::RemoveProperty {
            start,
            end,
            property,
            userid,
            mod_id: next(),
        }),
        TextClientEvent::CursorMoved { position, .. } => Some(TextServerEvent::CursorMoved {
            position,
            userid,
            username: username.to_string(),
            mod_id: next(),
        }),
        TextClientEvent::UpdateLastModId { last_mod_id } => {
            debug!(target: "transport.wire", last_mod_id, "heartbeat_ack");
            None
        }
    }
}

const HELP: &str = "\
commands:
  i <pos> <text>           insert text
  d <start> <end>          delete a range
  c <pos>                  move the cursor
  p <start> <end> <prop> [flag]   toggle a property
  r i <pos> <text>         simulated remote insert
  r d <start> <end>        simulated remote delete
  b pen <x y>...           draw a pen stroke
  b erase <x0 y0 x1 y1>    erase along a segment
  b list                   list board paths
  show                     print markup and engine state
  q                        quit";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = core_config::load_from(args.config.clone())?;
    let _log_guard = init_tracing(&config.log)?;

    // client <-> authority plumbing
    let (submit, server_side): (Endpoint<Submission, TextServerEvent>, _) = loopback();
    let (board_tx, mut board_rx) = mpsc::channel(core_events::EVENT_CHANNEL_CAP);
    tokio::spawn(authority(server_side.rx, server_side.tx, board_tx, 0));

    let read_only = args.read_only || config.session.read_only;
    let mut engine = TextEngine::with_read_only(
        TextSink {
            tx: submit.tx.clone(),
        },
        String::new(),
        read_only,
    );
    let mut board = BoardEngine::new(BoardSink {
        tx: submit.tx.clone(),
    });

    // the snapshot a real server would deliver on connect
    engine.handle(TextServerEvent::Connected {
        userid: LOCAL_USER,
        content: String::new(),
        mod_id: 0,
    })?;
    info!(target: "harness", username = config.username(), read_only, "session_open");
    println!("scrawl harness; `?` for commands");

    let mut from_server = submit.rx;
    let submit_tx = submit.tx;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ping = tokio::time::interval(std::time::Duration::from_secs(PING_SECS));
    ping.reset();

    loop {
        tokio::select! {
            event = from_server.recv() => {
                let Some(event) = event else { break };
                engine.handle(event)?;
                println!("text: {}", engine.view());
            }
            event = board_rx.recv() => {
                let Some(event) = event else { break };
                board.apply(event);
            }
            _ = ping.tick() => {
                engine.handle(TextServerEvent::Ping)?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !dispatch(line.trim(), &mut engine, &mut board, &submit_tx) {
                    break;
                }
            }
        }
    }
    info!(target: "harness", "session_closed");
    Ok(())
}

fn dispatch(
    line: &str,
    engine: &mut TextEngine<TextSink, String>,
    board: &mut BoardEngine<BoardSink>,
    submit: &mpsc::Sender<Submission>,
) -> bool {
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields.as_slice() {
        [] => {}
        ["q"] | ["quit"] => return false,
        ["?"] | ["help"] => println!("{HELP}"),
        ["show"] => {
            println!("text: {}", engine.render_markup());
            println!(
                "state: phase={:?} pending={} last_mod_id={}",
                engine.phase(),
                engine.pending_len(),
                engine.last_mod_id()
            );
        }
        ["i", pos, rest @ ..] if !rest.is_empty() => {
            if let Ok(pos) = pos.parse() {
                engine.insert(&rest.join(" "), pos);
            }
        }
        ["d", start, end] => {
            if let (Ok(start), Ok(end)) = (start.parse(), end.parse()) {
                engine.remove(start, end);
            }
        }
        ["c", pos] => {
            if let Ok(pos) = pos.parse() {
                engine.move_cursor(pos);
            }
        }
        ["p", start, end, property, flag @ ..] => {
            if let (Ok(start), Ok(end)) = (start.parse(), end.parse()) {
                engine.toggle_property(start, end, property, flag.first().copied());
            }
        }
        ["r", "i", pos, rest @ ..] if !rest.is_empty() => {
            if let Ok(position) = pos.parse() {
                let _ = submit.try_send(Submission::Remote(TextClientEvent::AddRegion {
                    text: rest.join(" "),
                    position,
                    last_mod_id: engine.last_mod_id(),
                }));
            }
        }
        ["r", "d", start, end] => {
            if let (Ok(start), Ok(end)) = (start.parse(), end.parse()) {
                let _ = submit.try_send(Submission::Remote(TextClientEvent::RemoveRegion {
                    start,
                    end,
                    last_mod_id: engine.last_mod_id(),
                }));
            }
        }
        ["b", "pen", coords @ ..] if coords.len() >= 4 && coords.len() % 2 == 0 => {
            let points: Vec<f64> = coords.iter().filter_map(|c| c.parse().ok()).collect();
            if points.len() == coords.len() {
                board.set_tool(Tool::Pen);
                board.pointer_down(point(points[0], points[1]), Modifiers::empty());
                for pair in points[2..].chunks(2) {
                    board.pointer_move(point(pair[0], pair[1]));
                }
                let last = point(points[points.len() - 2], points[points.len() - 1]);
                board.pointer_up(last);
            }
        }
        ["b", "erase", x0, y0, x1, y1] => {
            if let (Ok(x0), Ok(y0), Ok(x1), Ok(y1)) =
                (x0.parse(), y0.parse(), x1.parse(), y1.parse())
            {
                board.set_tool(Tool::Eraser);
                board.pointer_down(point(x0, y0), Modifiers::empty());
                board.pointer_move(point(x1, y1));
                board.pointer_up(point(x1, y1));
            }
        }
        ["b", "list"] => {
            for path in board.scene().paths() {
                println!("board: {} {}", path.id, path.d.to_d());
            }
        }
        _ => println!("unrecognised command; `?` for help"),
    }
    true
}
