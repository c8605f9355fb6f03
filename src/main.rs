use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use feedloom::config::Config;
use feedloom::feed::Dispatcher;
use feedloom::registry::Registry;
use feedloom::state::{self, opml, MarkKind, StateGraph, StateRef};
use feedloom::storage::MemoryStore;
use feedloom::xml::{DocumentParser, ReaderSource};

#[derive(Parser, Debug)]
#[command(name = "feedloom", about = "Feed interpretation and OPML state tool")]
struct Args {
    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interpret feed documents and print a JSON summary of each
    Interpret {
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Import a state file into an empty store and print the folder tree
    ImportState {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Import a state file, then export everything again
    Roundtrip {
        #[arg(value_name = "IN")]
        input: PathBuf,
        #[arg(value_name = "OUT")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => Config::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let registry = Registry::builtin();
    let parser = DocumentParser::new(config.parser_options());

    match args.command {
        Command::Interpret { files } => interpret(files, registry, parser).await,
        Command::ImportState { file } => {
            let store = import_state(&file, &registry, &parser)?;
            print_tree(store.graph());
            Ok(())
        }
        Command::Roundtrip { input, output } => {
            let store = import_state(&input, &registry, &parser)?;
            let key = format_key(&output);
            let exporter = registry
                .state_exporter(key)
                .with_context(|| format!("No state exporter for '{key}'"))?;
            let roots: Vec<StateRef> = store
                .graph()
                .roots()
                .iter()
                .map(|&root| StateRef::Folder(root))
                .collect();
            state::export_to_path(
                exporter,
                &output,
                store.graph(),
                &roots,
                &config.export_options(),
            )
            .with_context(|| format!("Failed to export state to {}", output.display()))?;
            println!("Exported state to {}", output.display());
            Ok(())
        }
    }
}

/// Interprets every file on the blocking pool, all against one registry.
async fn interpret(files: Vec<PathBuf>, registry: Arc<Registry>, parser: DocumentParser) -> Result<()> {
    let dispatcher = Dispatcher::new(registry);

    let tasks = files.into_iter().map(|path| {
        let dispatcher = dispatcher.clone();
        let parser = parser.clone();
        tokio::task::spawn_blocking(move || match std::fs::File::open(&path) {
            Ok(file) => {
                let mut source = ReaderSource::new(file);
                match dispatcher.interpret_source(&parser, &mut source) {
                    Ok(feed) => serde_json::json!({
                        "file": path.display().to_string(),
                        "format": feed.format,
                        "title": feed.title,
                        "homepage": feed.homepage,
                        "news": feed.news.len(),
                        "titles": feed.news.iter().map(|news| news.title.clone()).collect::<Vec<_>>(),
                    }),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to interpret");
                        serde_json::json!({
                            "file": path.display().to_string(),
                            "error": e.to_string(),
                        })
                    }
                }
            }
            Err(e) => serde_json::json!({
                "file": path.display().to_string(),
                "error": e.to_string(),
            }),
        })
    });

    for result in futures::future::join_all(tasks).await {
        let summary = result.context("Interpretation task panicked")?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

fn import_state(path: &Path, registry: &Registry, parser: &DocumentParser) -> Result<MemoryStore> {
    let key = format_key(path);
    let importer = registry
        .state_importer(key)
        .with_context(|| format!("No state importer for '{key}'"))?;

    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open state file: {}", path.display()))?;
    let document = parser
        .parse(&mut ReaderSource::new(file))
        .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

    let mut store = MemoryStore::new();
    let report = store.import(importer.import_from(&document), None);
    tracing::debug!(?report, "Imported state file");
    Ok(store)
}

/// Importer/exporter key for a file: its extension, or the OPML format.
fn format_key(path: &Path) -> &str {
    path.extension()
        .and_then(|extension| extension.to_str())
        .unwrap_or(opml::FORMAT)
}

fn print_tree(graph: &StateGraph) {
    fn print_node(graph: &StateGraph, node: StateRef, depth: usize) {
        let indent = "  ".repeat(depth);
        match node {
            StateRef::Folder(handle) => {
                let folder = graph.folder(handle);
                println!("{indent}{}/ [{}]", folder.name, id_text(folder.id));
                for &child in &folder.children {
                    print_node(graph, child, depth + 1);
                }
            }
            StateRef::Mark(handle) => {
                let mark = graph.mark(handle);
                let kind = match &mark.kind {
                    MarkKind::BookMark { feed_link, .. } => format!("bookmark {feed_link}"),
                    MarkKind::SearchMark(search) => {
                        format!("search, {} conditions", search.conditions.len())
                    }
                    MarkKind::NewsBin => "news bin".to_owned(),
                };
                println!("{indent}{} ({kind}) [{}]", mark.name, id_text(mark.id));
            }
        }
    }

    for &root in graph.roots() {
        print_node(graph, StateRef::Folder(root), 0);
    }
    for label in &graph.labels {
        println!("label {} [{}]", label.name, id_text(label.id));
    }
    for filter in &graph.filters {
        println!("filter {} ({} actions) [{}]", filter.name, filter.actions.len(), id_text(filter.id));
    }
    for preference in &graph.preferences {
        println!("pref {} = {}", preference.key, preference.value.to_text());
    }
}

fn id_text(id: Option<i64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_owned())
}
