// SPDX-License-Identifier: MIT

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use reflow_rs::app::counter::CounterAction;
use reflow_rs::app::todos::{TodoAction, TodosAction};
use reflow_rs::app::{self, AppAction, AppEnvironment, AppState, StatusLine};
use reflow_rs::runtime::{Store, StoreConfig};

use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Store configuration file (YAML); falls back to REFLOW_* variables
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// How long to wait for in-flight effects, in milliseconds
    #[arg(long, global = true, default_value_t = 5000)]
    settle_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Drive the counter feature
    Counter {
        /// Immediate increments
        #[arg(short, long, default_value_t = 1)]
        increments: u32,

        /// Delayed increments, completed by effects
        #[arg(short, long, default_value_t = 0)]
        delayed: u32,

        /// Ask for a fact about the final count
        #[arg(short, long)]
        fact: bool,
    },
    /// Drive the todo list feature
    Todos {
        /// Titles to add
        #[arg(short, long)]
        add: Vec<String>,

        /// Positions (in insertion order, from 0) to mark done
        #[arg(short, long)]
        toggle: Vec<usize>,

        /// Remove done items at the end
        #[arg(long)]
        clear_completed: bool,
    },
}

fn load_config(path: Option<&str>) -> anyhow::Result<StoreConfig> {
    let config = match path {
        Some(path) => StoreConfig::from_file(path)?,
        None => StoreConfig::from_env()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    log::info!("Using store '{}' on {} scheduler", config.label, config.scheduler);

    let store = Store::builder(AppState::default(), app::reducer(), AppEnvironment::live())
        .config(config)
        .try_build()?;

    let status = store.connect(StatusLine);
    let _status_log = status.subscribe(|line: &String| log::info!("{}", line));

    match args.command {
        Commands::Counter {
            increments,
            delayed,
            fact,
        } => {
            for _ in 0..increments {
                store.send(AppAction::Counter(CounterAction::Increment));
            }
            for _ in 0..delayed {
                store.send(AppAction::Counter(CounterAction::DelayedIncrement));
            }
            // The fact is about the settled count
            settle(&store, args.settle_ms).await?;
            if fact {
                store.send(AppAction::Counter(CounterAction::FactRequested));
            }
        }
        Commands::Todos {
            add,
            toggle,
            clear_completed,
        } => {
            for title in add {
                store.send(AppAction::Todos(TodosAction::Add(title)));
            }
            let ids: Vec<_> = store.with_state(|state| {
                state.todos.ordered().iter().map(|todo| todo.id).collect()
            });
            for position in toggle {
                match ids.get(position) {
                    Some(id) => store.send(AppAction::Todos(TodosAction::Todo(
                        *id,
                        TodoAction::Toggle,
                    ))),
                    None => log::warn!("No todo at position {}", position),
                }
            }
            if clear_completed {
                store.send(AppAction::Todos(TodosAction::ClearCompleted));
            }
        }
    }

    settle(&store, args.settle_ms).await?;
    println!("{}", serde_json::to_string_pretty(&store.state())?);
    Ok(())
}

async fn settle(store: &Store<AppState, AppAction>, millis: u64) -> anyhow::Result<()> {
    if !app::settle(store, Duration::from_millis(millis)).await {
        anyhow::bail!("effects did not finish within {}ms", millis);
    }
    Ok(())
}
