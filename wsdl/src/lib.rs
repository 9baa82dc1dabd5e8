use indexmap::IndexMap;
use tracing::warn;
use wsdl_docs_util::xml::Document;

pub mod error;
pub mod feed;
pub mod introspect;
pub mod names;
pub mod reconcile;
pub mod render;
pub mod resolver;
pub mod source;
pub mod types;

use error::Diagnostic;
use introspect::Introspection;
use reconcile::OperationRecord;
use render::RenderFormat;
use resolver::ResolveOptions;

/// Operation records for one WSDL, plus everything that went wrong on the way.
#[derive(Default, Debug, Clone)]
pub struct Documentation {
    pub records: IndexMap<String, OperationRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Fetches and parses the WSDL at `location`, a URL or a local path.
pub fn load<S: AsRef<str>>(location: S) -> Result<Document, error::Error> {
    let url = source::locate(location)?;
    let xml = source::fetch(&url)?;
    Ok(Document::parse(&xml)?)
}

/// Runs the whole pipeline: feeds to catalog and signatures, the resolver
/// passes, then one rendered record per signature.
pub fn describe(
    document: &Document,
    introspection: &Introspection,
    options: &ResolveOptions,
    format: RenderFormat,
) -> Documentation {
    let (catalog, mut diagnostics) = feed::build_catalog(&introspection.types);
    if catalog.is_empty() {
        warn!("type feed is empty, rendered shapes will carry no properties");
    }

    let (signatures, signature_diagnostics) = feed::build_signatures(&introspection.functions);
    diagnostics.extend(signature_diagnostics);

    let resolution = resolver::resolve(document, &catalog, options);
    diagnostics.extend(resolution.diagnostics.iter().cloned());

    Documentation {
        records: reconcile::assemble_records(&signatures, &resolution, format),
        diagnostics,
    }
}
