use std::{
    fs,
    path::{Path, PathBuf},
};

use structopt::StructOpt;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wsdl_docs_util::xml::Document;
use wsdl_docs_wsdl::{
    self as wsdl,
    error::StoreError,
    introspect::Introspection,
    reconcile::{OperationStore, ReconcilePlan, Reconciler},
    render::RenderFormat,
    resolver::{BindingSelection, ResolveOptions},
    source,
};

mod store;

use store::JsonFileStore;

#[derive(Debug, Error)]
enum Error {
    #[error("Error processing WSDL")]
    WsdlError(#[from] wsdl::error::Error),

    #[error("Error accessing operation store")]
    StoreError(#[from] StoreError),

    #[error("Unable to read feed file")]
    IoError(#[from] std::io::Error),

    #[error("Feed file is not a JSON array of strings")]
    FeedError(#[from] serde_json::Error),
}

/// Documents the operations of a WSDL and keeps a store of them up to date.
#[derive(StructOpt)]
struct Args {
    /// Struct descriptor feed, a JSON array of strings; synthesized from the WSDL if absent
    #[structopt(long)]
    types: Option<PathBuf>,

    /// Function signature feed, a JSON array of strings; synthesized from the WSDL if absent
    #[structopt(long)]
    functions: Option<PathBuf>,

    #[structopt(short, long, default_value = "./operations.json")]
    store: PathBuf,

    /// Key of this WSDL in the store, defaults to its URL
    #[structopt(long)]
    source: Option<String>,

    /// `html` or `text`
    #[structopt(short, long, default_value = "html")]
    format: RenderFormat,

    /// Take styles and shapes from every binding, not only the first
    #[structopt(long)]
    all_bindings: bool,

    /// Print the changes without touching the store
    #[structopt(long)]
    dry_run: bool,

    /// WSDL URL or local path
    input: String,
}

fn read_feed(path: &Path) -> Result<Vec<String>, Error> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

fn load_feed(args: &Args, document: &Document) -> Result<Introspection, Error> {
    let synthesized = if args.types.is_none() || args.functions.is_none() {
        info!("synthesizing introspection feed from the WSDL");
        Introspection::from_document(document)
    } else {
        Introspection::default()
    };

    Ok(Introspection {
        types: match &args.types {
            Some(path) => read_feed(path)?,
            None => synthesized.types,
        },
        functions: match &args.functions {
            Some(path) => read_feed(path)?,
            None => synthesized.functions,
        },
    })
}

fn print_plan(plan: &ReconcilePlan) {
    for record in &plan.updates {
        println!("update {}", record.name);
    }

    for name in &plan.deletes {
        println!("delete {}", name);
    }

    for record in &plan.creates {
        println!("create {}", record.name);
    }
}

#[paw::main]
fn main(args: Args) -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wsdl_docs=info")),
        )
        .init();

    let url = source::locate(&args.input)?;
    let xml = source::fetch(&url)?;
    let document = Document::parse(&xml).map_err(wsdl::error::Error::from)?;
    let feed = load_feed(&args, &document)?;

    let options = ResolveOptions {
        bindings: if args.all_bindings {
            BindingSelection::All
        } else {
            BindingSelection::First
        },
    };

    let documentation = wsdl::describe(&document, &feed, &options, args.format);
    if !documentation.diagnostics.is_empty() {
        warn!(
            "{} operations documented with {} problems",
            documentation.records.len(),
            documentation.diagnostics.len()
        );
    }

    let source = args.source.clone().unwrap_or_else(|| url.to_string());
    let store = JsonFileStore::open(&args.store);

    if args.dry_run {
        let previous = store.list_existing(&source)?;
        print_plan(&ReconcilePlan::new(&previous, &documentation.records));
    } else {
        let summary = Reconciler::new().reconcile(&store, &source, &documentation.records)?;
        println!(
            "{}: {} updated, {} deleted, {} created",
            source, summary.updated, summary.deleted, summary.created
        );
    }

    Ok(())
}
