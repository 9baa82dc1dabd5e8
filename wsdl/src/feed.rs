//! Parsers for the textual introspection feeds.
//!
//! Struct descriptors look like `struct Name {type field;type field;}` and
//! function signatures like `ReturnType name(Type $param, Type $param)`. Both
//! are kept apart from the XML walk so another introspection source only has
//! to replace this module.

use indexmap::IndexMap;
use tracing::{debug, warn};

use super::{
    error::{Diagnostic, FeedError},
    types::{OperationSignature, SemanticType, TypeCatalog, TypeDescriptor},
};

const STRUCT_TOKEN: &str = "struct";
const LIST_RETURN: &str = "list(";

fn split_typed_name(segment: &str) -> Result<(&str, &str), FeedError> {
    let (ty, name) = segment
        .split_once(' ')
        .ok_or_else(|| FeedError::MissingSpace(segment.to_owned()))?;

    let name = name.trim();
    Ok((ty, name.strip_prefix('$').unwrap_or(name)))
}

/// Parses one struct descriptor. Entries that are not structs yield `None`.
pub fn parse_struct(entry: &str) -> Result<Option<TypeDescriptor>, FeedError> {
    let rest = match entry.trim_start().strip_prefix(STRUCT_TOKEN) {
        Some(rest) if rest.starts_with(char::is_whitespace) => rest,
        _ => return Ok(None),
    };

    let (name, body) = rest.split_once('{').ok_or(FeedError::MissingBrace)?;
    let body = body
        .trim_end()
        .strip_suffix('}')
        .ok_or(FeedError::MissingBrace)?;

    let mut descriptor = TypeDescriptor::new(name.trim().to_owned());

    for segment in body.split(';').map(str::trim) {
        if segment.is_empty() {
            continue;
        }

        let (ty, name) = split_typed_name(segment)?;
        descriptor
            .properties
            .insert(name.to_owned(), SemanticType::from_wire(ty));
    }

    Ok(Some(descriptor))
}

/// Builds the type catalog, skipping (and reporting) malformed entries.
pub fn build_catalog<I, S>(entries: I) -> (TypeCatalog, Vec<Diagnostic>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut catalog = TypeCatalog::default();
    let mut diagnostics = Vec::new();

    for entry in entries {
        let entry = entry.as_ref();

        match parse_struct(entry) {
            Ok(Some(descriptor)) => catalog.insert(descriptor),
            Ok(None) => (),

            Err(error) => {
                warn!("skipping struct descriptor {:?}: {}", entry, error);
                diagnostics.push(Diagnostic::MalformedFeedEntry {
                    entry: entry.to_owned(),
                    error,
                });
            }
        }
    }

    debug!("type catalog holds {} structs", catalog.len());
    (catalog, diagnostics)
}

fn split_return_type(signature: &str) -> Option<(&str, &str)> {
    // rpc operations with several output parts report `list(T $a, U $b) name(...)`
    if signature.starts_with(LIST_RETURN) {
        let end = signature.find(')')? + 1;
        let (ty, rest) = signature.split_at(end);
        return Some((ty, rest.trim_start()));
    }

    signature.split_once(' ')
}

pub fn parse_signature(entry: &str) -> Result<OperationSignature, FeedError> {
    let (return_type, rest) =
        split_return_type(entry.trim()).ok_or(FeedError::MissingReturnType)?;
    let (name, parameters) = rest.split_once('(').ok_or(FeedError::MissingParenthesis)?;
    let parameters = parameters.trim_end();
    let parameters = parameters.strip_suffix(')').unwrap_or(parameters).trim();

    let mut signature = OperationSignature {
        name: name.trim().to_owned(),
        return_type: SemanticType::from_wire(return_type),
        parameters: IndexMap::new(),
    };

    if !parameters.is_empty() {
        for parameter in parameters.split(',').map(str::trim) {
            let (ty, name) = split_typed_name(parameter)?;
            signature
                .parameters
                .insert(name.to_owned(), SemanticType::from_wire(ty));
        }
    }

    Ok(signature)
}

/// Parses every function signature; a repeated operation name replaces the
/// earlier signature.
pub fn build_signatures<I, S>(entries: I) -> (IndexMap<String, OperationSignature>, Vec<Diagnostic>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut signatures = IndexMap::new();
    let mut diagnostics = Vec::new();

    for entry in entries {
        let entry = entry.as_ref();

        match parse_signature(entry) {
            Ok(signature) => {
                if signatures.contains_key(&signature.name) {
                    debug!("operation {} declared twice, keeping the last", signature.name);
                }

                signatures.insert(signature.name.clone(), signature);
            }

            Err(error) => {
                warn!("skipping function signature {:?}: {}", entry, error);
                diagnostics.push(Diagnostic::MalformedFeedEntry {
                    entry: entry.to_owned(),
                    error,
                });
            }
        }
    }

    (signatures, diagnostics)
}
