//! Console Host Example
//!
//! A line-oriented stand-in for a game console. Lines typed on stdin go to
//! `C3Runtime::submit`; lines it does not handle fall back to a couple of
//! built-in host commands. A simulated script runtime answers calls after a
//! short delay, so results show up asynchronously like they would in-game.
//!
//! # Host commands
//!
//! - `prid <id>|<origin>`: select a reference (e.g. `prid 14|Skyrim.esm`)
//! - `quit`: exit
//!
//! # Usage
//!
//! ```bash
//! cargo run --package c3-console-demo
//! cargo run --package c3-console-demo -- --width 32 --delay-ms 500
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use c3::prelude::*;
use clap::Parser;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "c3-console", about = "Interactive C3 console over stdin")]
struct Args {
    /// Configuration file (defaults to c3.toml / c3.yaml in the current directory).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extra declaration directories.
    #[arg(short = 'd', long = "commands")]
    commands: Vec<PathBuf>,

    /// Override the display width.
    #[arg(short, long)]
    width: Option<usize>,

    /// Simulated script latency.
    #[arg(long, default_value_t = 150)]
    delay_ms: u64,
}

// ============================================================================
// Simulated world
// ============================================================================

#[derive(Debug, Clone)]
struct Actor {
    name: String,
    health: f32,
}

/// Objects known to the simulated host, keyed by form id.
#[derive(Default)]
struct World {
    actors: Mutex<HashMap<u32, Actor>>,
    next_id: Mutex<u32>,
    god_mode: Mutex<bool>,
    weather: Mutex<String>,
}

const ORIGIN: &str = "Skyrim.esm";

impl World {
    fn new() -> Self {
        let world = Self::default();
        {
            let mut actors = world.actors.lock();
            actors.insert(0x14, Actor { name: "Player".into(), health: 100.0 });
            actors.insert(0xA2C94, Actor { name: "Lydia".into(), health: 250.0 });
        }
        *world.next_id.lock() = 0xFF00_0000;
        *world.weather.lock() = "Clear".into();
        world
    }

    fn find_by_name(&self, name: &str) -> Option<u32> {
        self.actors
            .lock()
            .iter()
            .find(|(_, actor)| actor.name.eq_ignore_ascii_case(name))
            .map(|(&id, _)| id)
    }

    fn call(&self, call: &RemoteCall) -> Result<ReturnValue, RemoteError> {
        match (call.namespace.as_str(), call.callable.as_str(), call.args.as_slice()) {
            ("C3Commands", "Heal", [amount, target]) => {
                let amount = match amount {
                    CallValue::Float(f) => *f,
                    CallValue::None => 10.0,
                    _ => return Err(RemoteError::rejected("amount must be a float")),
                };
                let CallValue::Object(handle) = target else {
                    return Ok(ReturnValue::String("Nothing selected to heal".into()));
                };
                let mut actors = self.actors.lock();
                let actor = actors
                    .get_mut(&handle.id)
                    .ok_or_else(|| RemoteError::rejected("actor vanished"))?;
                actor.health += amount;
                Ok(ReturnValue::Float(actor.health))
            }
            ("C3Commands", "Spawn", [CallValue::String(base), count]) => {
                let count = match count {
                    CallValue::Int(n) => *n,
                    _ => 1,
                };
                if count <= 0 {
                    return Err(RemoteError::rejected("count must be positive"));
                }
                let mut lines = Vec::new();
                for _ in 0..count {
                    let mut next = self.next_id.lock();
                    *next += 1;
                    self.actors
                        .lock()
                        .insert(*next, Actor { name: base.clone(), health: 50.0 });
                    lines.push(format!("Spawned {base} as {:X}|{ORIGIN}", *next));
                }
                Ok(ReturnValue::String(lines.join("\n")))
            }
            ("C3Commands", "ToggleGod", [quiet]) => {
                let mut god = self.god_mode.lock();
                *god = !*god;
                match quiet {
                    CallValue::Bool(true) => Ok(ReturnValue::None),
                    _ => Ok(ReturnValue::Bool(*god)),
                }
            }
            ("C3Commands", "Describe", [CallValue::Object(handle)]) => {
                let actors = self.actors.lock();
                let actor = actors
                    .get(&handle.id)
                    .ok_or_else(|| RemoteError::rejected("actor vanished"))?;
                Ok(ReturnValue::String(format!(
                    "{} ({:X}|{ORIGIN}): {:.1} health",
                    actor.name, handle.id, actor.health
                )))
            }
            ("C3Commands", "Describe", [_]) => Ok(ReturnValue::String("No actor".into())),
            ("C3Commands", "OpenMenu", []) => Ok(ReturnValue::Object(ObjectHandle::new(
                0x0010_0000,
                "menu",
            ))),
            ("WeatherScript", "SetWeather", [CallValue::String(kind), transition]) => {
                *self.weather.lock() = kind.clone();
                let secs = match transition {
                    CallValue::Float(f) => *f,
                    _ => 0.0,
                };
                Ok(ReturnValue::String(format!("Weather changing to {kind} over {secs}s")))
            }
            ("WeatherScript", "CurrentWeather", []) => {
                Ok(ReturnValue::String(self.weather.lock().clone()))
            }
            _ => Err(RemoteError::NotFound {
                namespace: call.namespace.clone(),
                callable: call.callable.clone(),
            }),
        }
    }
}

// ============================================================================
// Host collaborators
// ============================================================================

/// Answers every call from a tokio task after a fixed delay.
struct SimulatedScripts {
    world: Arc<World>,
    delay: Duration,
}

impl ScriptRuntime for SimulatedScripts {
    fn invoke(&self, call: RemoteCall, reply: ReplySlot) -> Result<(), RemoteError> {
        if !matches!(call.namespace.as_str(), "C3Commands" | "WeatherScript") {
            return Err(RemoteError::NotFound {
                namespace: call.namespace,
                callable: call.callable,
            });
        }

        let world = Arc::clone(&self.world);
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!(callable = %call.callable, "Simulated script answering");
            match world.call(&call) {
                Ok(value) => reply.resolve(value),
                Err(e) => reply.reject(e),
            }
        });
        Ok(())
    }
}

struct WorldResolver {
    world: Arc<World>,
}

impl ObjectResolver for WorldResolver {
    fn resolve(&self, reference: ObjectRef<'_>, type_tag: &str) -> Option<ObjectHandle> {
        let id = match reference {
            ObjectRef::Selected(target) => match ObjectRef::parse(&target.identifier)? {
                ObjectRef::Qualified { id, .. } => id,
                _ => return None,
            },
            ObjectRef::Symbol(name) => self.world.find_by_name(name)?,
            ObjectRef::Qualified { id, origin } if origin.eq_ignore_ascii_case(ORIGIN) => id,
            ObjectRef::Qualified { .. } => return None,
        };
        self.world
            .actors
            .lock()
            .contains_key(&id)
            .then(|| ObjectHandle::new(id, type_tag))
    }
}

/// Prints straight to stdout.
struct StdoutHost;

impl ConsoleHost for StdoutHost {
    fn print(&self, text: String) {
        print!("{text}");
    }

    fn close_input(&self) {
        info!("Console input closed by command");
        println!("[console closed]");
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = C3Runtime::builder()
        .directory(concat!(env!("CARGO_MANIFEST_DIR"), "/commands"));
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    for dir in &args.commands {
        builder = builder.directory(dir);
    }
    if let Some(width) = args.width {
        let mut overrides = C3Config::default();
        overrides.display.width = width;
        builder = builder.merge(overrides);
    }

    let world = Arc::new(World::new());
    let runtime = builder
        .script_runtime(Arc::new(SimulatedScripts {
            world: Arc::clone(&world),
            delay: Duration::from_millis(args.delay_ms),
        }))
        .resolver(Arc::new(WorldResolver { world }))
        .host(Arc::new(StdoutHost))
        .build()?;

    for failure in runtime.load_failures() {
        eprintln!("warning: {failure}");
    }
    let names: Vec<_> = runtime
        .registry()
        .commands()
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    println!("Commands: {}. Type `<command> -h` for help, `quit` to exit.", names.join(", "));

    let mut selection: Option<Target> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        if runtime.submit(line, selection.as_ref()) {
            continue;
        }

        match line.split_once(' ') {
            _ if line == "quit" || line == "exit" => break,
            Some(("prid", id)) => {
                selection = Some(Target::new(id.trim()));
                println!("Selected {}", id.trim());
            }
            _ if line.is_empty() => {}
            _ => println!("Unknown host command: {line}"),
        }
    }

    runtime.wait_idle().await;
    runtime.shutdown().await;
    Ok(())
}
