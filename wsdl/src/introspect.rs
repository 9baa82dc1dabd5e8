//! Synthesizes the introspection feeds from the WSDL itself.
//!
//! The output uses the same textual grammar a SOAP introspection library
//! reports, so it goes through [`crate::feed`] like any other feed.

use std::collections::HashMap;
use wsdl_docs_util::xml::{Document, Element};

use super::names::normalize;

const COMPOSITORS: [&str; 3] = ["sequence", "all", "choice"];
const ANY_TYPE: &str = "anyType";

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Introspection {
    /// Struct descriptors (`struct Name {...}`) and simple type entries.
    pub types: Vec<String>,
    /// Function signatures, one per operation.
    pub functions: Vec<String>,
}

fn field_type(element: &Element, name: &str) -> String {
    if let Some(ty) = element.attribute("type").or_else(|| element.attribute("ref")) {
        return normalize(ty).to_owned();
    }

    if element.first_child_named("complexType").is_some() {
        name.to_owned()
    } else {
        ANY_TYPE.to_owned()
    }
}

fn struct_descriptor(name: &str, complex_type: &Element) -> String {
    let mut descriptor = format!("struct {} {{\n", name);

    let compositor = complex_type
        .descendants()
        .find(|element| COMPOSITORS.contains(&element.local_name()));

    for field in compositor.into_iter().flat_map(|c| c.children_named("element")) {
        let field_name = field
            .attribute("name")
            .or_else(|| field.attribute("ref").map(normalize))
            .unwrap_or_default();

        descriptor.push_str(&format!(" {} {};\n", field_type(field, field_name), field_name));
    }

    descriptor.push('}');
    descriptor
}

fn schema_types(schema: &Element, types: &mut Vec<String>) {
    for child in schema.children() {
        let name = match child.attribute("name") {
            Some(name) => name,
            None => continue,
        };

        match child.local_name() {
            "complexType" => types.push(struct_descriptor(name, child)),

            "element" if !child.has_attribute("type") => {
                if let Some(complex_type) = child.first_child_named("complexType") {
                    types.push(struct_descriptor(name, complex_type));
                }
            }

            "simpleType" => {
                let base = child
                    .first_descendant_named("restriction")
                    .and_then(|restriction| restriction.attribute("base"))
                    .map_or(ANY_TYPE, normalize);

                types.push(format!("{} {}", base, name));
            }

            _ => (),
        }
    }
}

struct Signatures<'a> {
    /// Top-level schema element name to the type it stands for.
    elements: HashMap<&'a str, &'a str>,
    /// Message name to its `(part name, part type)` list.
    messages: HashMap<&'a str, Vec<(&'a str, &'a str)>>,
}

impl<'a> Signatures<'a> {
    fn new(document: &'a Document) -> Self {
        let mut elements = HashMap::new();

        for schema in document.elements_named("schema") {
            for element in schema.children_named("element") {
                if let Some(name) = element.attribute("name") {
                    let ty = element.attribute("type").map_or(name, normalize);
                    elements.entry(name).or_insert(ty);
                }
            }
        }

        let mut signatures = Self {
            elements,
            messages: HashMap::new(),
        };

        for message in document.elements_named("message") {
            let name = message.attribute("name").unwrap_or_default();
            let parts = message
                .children_named("part")
                .map(|part| {
                    (
                        part.attribute("name").unwrap_or_default(),
                        signatures.part_type(part),
                    )
                })
                .collect();

            signatures.messages.entry(name).or_insert(parts);
        }

        signatures
    }

    fn part_type(&self, part: &'a Element) -> &'a str {
        if let Some(ty) = part.attribute("type") {
            return normalize(ty);
        }

        match part.attribute("element").map(normalize) {
            Some(element) => self.elements.get(element).copied().unwrap_or(element),
            None => ANY_TYPE,
        }
    }

    fn parts(&self, operation: &Element, tag: &str) -> &[(&'a str, &'a str)] {
        operation
            .first_descendant_named(tag)
            .and_then(|reference| reference.attribute("message"))
            .and_then(|message| self.messages.get(normalize(message)))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn signature(&self, name: &str, operation: &Element) -> String {
        let typed = |parts: &[(&str, &str)]| {
            parts
                .iter()
                .map(|(name, ty)| format!("{} ${}", ty, name))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let output = self.parts(operation, "output");
        let return_type = match output {
            [] => "void".to_owned(),
            [(_, ty)] => (*ty).to_owned(),
            parts => format!("list({})", typed(parts)),
        };

        format!(
            "{} {}({})",
            return_type,
            name,
            typed(self.parts(operation, "input"))
        )
    }
}

impl Introspection {
    pub fn from_document(document: &Document) -> Self {
        let mut introspection = Self::default();

        for schema in document.elements_named("schema") {
            schema_types(schema, &mut introspection.types);
        }

        let signatures = Signatures::new(document);
        let mut seen = Vec::new();

        for port_type in document.elements_named("portType") {
            for operation in port_type.descendants_named("operation") {
                let name = operation.attribute("name").unwrap_or_default();

                if seen.contains(&name) {
                    continue;
                }

                seen.push(name);
                introspection
                    .functions
                    .push(signatures.signature(name, operation));
            }
        }

        introspection
    }
}
