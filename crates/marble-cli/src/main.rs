//! Marble command-line front end.
//!
//! Drives the canvas engine against a JSON storage file so canvases can be
//! inspected, edited, exported, and imported from a terminal.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use marble_core::waitlist::WaitlistCollector;
use marble_core::{CanvasId, NodeId, NodeType};
use marble_engine::{CanvasEngine, FileStorage};

const DEFAULT_STORE: &str = "marble-storage.json";

#[derive(Parser, Debug)]
#[command(name = "marble", about = "Spatial note canvases from the terminal")]
struct Args {
    /// Storage file holding every canvas.
    #[arg(long, default_value = DEFAULT_STORE)]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List canvases, marking the active one.
    List,
    /// Show the active canvas's nodes and connections.
    Show,
    /// Create a canvas and make it active.
    Create { name: Option<String> },
    /// Rename a canvas (id or unique id prefix).
    Rename { canvas: String, name: String },
    /// Copy a canvas with fresh node ids and no connections.
    Duplicate { canvas: String },
    /// Delete a canvas.
    Delete { canvas: String },
    /// Make a canvas active.
    Switch { canvas: String },
    /// Add a node to the active canvas.
    AddNode {
        #[arg(value_parser = parse_node_type)]
        kind: NodeType,
        x: f64,
        y: f64,
        #[arg(long)]
        content: Option<String>,
    },
    /// Connect two nodes on the active canvas.
    Connect { from: String, to: String },
    /// Remove every node and connection from the active canvas.
    Clear,
    /// Export the active canvas as JSON (stdout unless --output is given).
    Export {
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Import a canvas export and make it active.
    Import { file: PathBuf },
    /// Find canvases by name.
    Search { query: String },
    /// Run emails through an in-memory waitlist and print the responses.
    Waitlist { emails: Vec<String> },
}

fn parse_node_type(s: &str) -> Result<NodeType, String> {
    s.parse()
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut engine = CanvasEngine::new(FileStorage::new(&args.store));
    log::debug!("opened store {}", args.store.display());

    match args.command {
        Command::List => {
            for summary in engine.summaries() {
                let marker = if summary.is_active { "*" } else { " " };
                println!(
                    "{marker} {}  {:<32} {:>3} nodes  updated {}",
                    summary.id,
                    summary.name,
                    summary.node_count,
                    summary.updated_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Command::Show => {
            let Some(canvas) = engine.active_canvas() else {
                bail!("no active canvas");
            };
            println!("{} ({})  zoom {:.2}", canvas.name, canvas.id, engine.zoom());
            let mut nodes: Vec<_> = engine.nodes().iter().collect();
            nodes.sort_by_key(|n| n.z_index);
            for node in nodes {
                println!(
                    "  [{}] {:<5} @ ({}, {}) {}x{}  {:?}",
                    node.z_index, node.kind, node.x, node.y, node.width, node.height, node.content
                );
            }
            for link in engine.resolved_connections() {
                println!("  {} -> {}", link.from.id, link.to.id);
            }
        }
        Command::Create { name } => {
            let id = engine.create_canvas(name.as_deref());
            println!("{id}");
        }
        Command::Rename { canvas, name } => {
            let name = name.trim();
            if name.is_empty() {
                bail!("canvas name must not be empty");
            }
            let id = resolve_canvas(&engine, &canvas)?;
            engine.rename_canvas(id, name);
        }
        Command::Duplicate { canvas } => {
            let id = resolve_canvas(&engine, &canvas)?;
            if let Some(copy) = engine.duplicate_canvas(id) {
                println!("{copy}");
            }
        }
        Command::Delete { canvas } => {
            let id = resolve_canvas(&engine, &canvas)?;
            engine.delete_canvas(id);
        }
        Command::Switch { canvas } => {
            let id = resolve_canvas(&engine, &canvas)?;
            engine.switch_canvas(id);
        }
        Command::AddNode {
            kind,
            x,
            y,
            content,
        } => {
            if engine.active_canvas_id().is_none() {
                bail!("no active canvas; create one first");
            }
            let id = engine.add_node(kind, x, y, content.as_deref());
            println!("{id}");
        }
        Command::Connect { from, to } => {
            let from = resolve_node(&engine, &from)?;
            let to = resolve_node(&engine, &to)?;
            let id = engine.add_connection(from, to);
            println!("{id}");
        }
        Command::Clear => engine.clear_canvas(),
        Command::Export { output } => {
            let json = engine.export_canvas()?;
            match output {
                Some(path) => std::fs::write(&path, json)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => println!("{json}"),
            }
        }
        Command::Import { file } => {
            let data = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let id = engine
                .import_canvas(&data)
                .with_context(|| format!("{} is not a canvas export", file.display()))?;
            println!("{id}");
        }
        Command::Search { query } => {
            for canvas in engine.search(&query) {
                println!("{}  {}", canvas.id, canvas.name);
            }
        }
        Command::Waitlist { emails } => run_waitlist(&emails)?,
    }

    engine.flush().context("failed to save canvases")?;
    Ok(())
}

fn run_waitlist(emails: &[String]) -> Result<()> {
    let mut waitlist = WaitlistCollector::new();
    for email in emails {
        match waitlist.submit(email) {
            Ok(signup) => println!("{}", serde_json::to_string(&signup)?),
            Err(err) => println!("{}", serde_json::json!({ "error": err.to_string() })),
        }
    }
    println!("{}", serde_json::to_string(&waitlist.count())?);
    Ok(())
}

/// Match a canvas by full id or unique id prefix.
fn resolve_canvas(engine: &CanvasEngine<FileStorage>, needle: &str) -> Result<CanvasId> {
    if let Some(id) = CanvasId::lookup(needle).filter(|id| engine.canvas(*id).is_some()) {
        return Ok(id);
    }
    let matches: Vec<_> = engine
        .canvases()
        .iter()
        .filter(|c| c.id.as_str().starts_with(needle))
        .map(|c| c.id)
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => bail!("no canvas matches `{needle}`"),
        _ => bail!("`{needle}` matches {} canvases", matches.len()),
    }
}

/// Match a node on the active canvas by full id or unique id prefix.
fn resolve_node(engine: &CanvasEngine<FileStorage>, needle: &str) -> Result<NodeId> {
    if let Some(id) = NodeId::lookup(needle).filter(|id| engine.node(*id).is_some()) {
        return Ok(id);
    }
    let matches: Vec<_> = engine
        .nodes()
        .iter()
        .filter(|n| n.id.as_str().starts_with(needle))
        .map(|n| n.id)
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => bail!("no node matches `{needle}`"),
        _ => bail!("`{needle}` matches {} nodes", matches.len()),
    }
}
