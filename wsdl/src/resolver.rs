//! Cross-references a WSDL document against the type catalog.
//!
//! Operation inputs and outputs are only described indirectly:
//! operation → message → part → element or type → schema element → type →
//! catalog properties. Each pass below builds one link of that chain and hands
//! it, read-only, to the next.

use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::debug;
use wsdl_docs_util::xml::{Document, Element};

use super::{
    error::Diagnostic,
    names::normalize,
    render::{ResolvedMessageShape, ShapeContext},
    types::{Direction, TypeCatalog},
};

/// Which `binding` elements supply styles and trigger rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingSelection {
    /// Only the first top-level binding, operations of later bindings get no
    /// style and no rendered shapes.
    #[default]
    First,
    /// Every top-level binding; the first binding naming an operation wins.
    All,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    pub bindings: BindingSelection,
}

/// Pass 1: operations of every `portType`, with their message references.
#[derive(Default, Debug, Clone)]
pub struct OperationIndex {
    pub order: Vec<String>,
    pub documentation: HashMap<String, String>,
    pub inputs: HashMap<String, Vec<String>>,
    pub outputs: HashMap<String, Vec<String>>,
    pub input_messages: HashMap<String, String>,
    pub output_messages: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartTarget {
    Element(String),
    Type(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePart {
    pub name: String,
    pub target: PartTarget,
}

/// Pass 2: the first part of every referenced message.
#[derive(Default, Debug, Clone)]
pub struct MessageIndex {
    pub parts: HashMap<String, MessagePart>,
    /// Element or type name to the messages pointing at it.
    pub by_target: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementBinding {
    /// The element's own name, or the wrapped child's name for complex elements.
    pub name: String,
    pub ty: String,
}

/// Pass 3: schema elements resolved to their underlying type.
#[derive(Default, Debug, Clone)]
pub struct ElementIndex(HashMap<String, ElementBinding>);

/// Pass 4: binding operations and their invocation style.
#[derive(Default, Debug, Clone)]
pub struct BindingIndex {
    pub operations: Vec<String>,
    pub styles: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOperation {
    pub name: String,
    pub documentation: Option<String>,
    pub style: Option<String>,
    pub input: Option<ResolvedMessageShape>,
    pub output: Option<ResolvedMessageShape>,
}

#[derive(Default, Debug, Clone)]
pub struct Resolution {
    pub operations: IndexMap<String, ResolvedOperation>,
    pub diagnostics: Vec<Diagnostic>,
}

impl OperationIndex {
    pub fn messages(&self, operation: &str, direction: Direction) -> Option<&[String]> {
        let messages = match direction {
            Direction::Input => &self.inputs,
            Direction::Output => &self.outputs,
        };

        messages.get(operation).map(Vec::as_slice)
    }

    pub fn is_target(&self, message: &str) -> bool {
        self.input_messages.contains_key(message) || self.output_messages.contains_key(message)
    }
}

impl MessageIndex {
    pub fn part(&self, message: &str) -> Option<&MessagePart> {
        self.parts.get(message)
    }
}

impl ElementIndex {
    pub fn get(&self, element: &str) -> Option<&ElementBinding> {
        self.0.get(element)
    }
}

impl ResolvedOperation {
    fn new(name: String) -> Self {
        Self {
            name,
            documentation: None,
            style: None,
            input: None,
            output: None,
        }
    }

    pub fn shape(&self, direction: Direction) -> Option<&ResolvedMessageShape> {
        match direction {
            Direction::Input => self.input.as_ref(),
            Direction::Output => self.output.as_ref(),
        }
    }
}

fn message_reference(operation: &Element, direction: Direction) -> Option<String> {
    operation
        .first_descendant_named(direction.tag())
        .and_then(|element| element.attribute("message"))
        .map(|message| normalize(message).to_owned())
}

pub fn index_operations(document: &Document) -> OperationIndex {
    let mut index = OperationIndex::default();

    for port_type in document.elements_named("portType") {
        for operation in port_type.descendants_named("operation") {
            let name = operation.attribute("name").unwrap_or_default().to_owned();

            if !index.order.contains(&name) {
                index.order.push(name.clone());
            }

            if !index.documentation.contains_key(&name) {
                if let Some(documentation) = operation.first_descendant_named("documentation") {
                    index
                        .documentation
                        .insert(name.clone(), documentation.text_content());
                }
            }

            for direction in Direction::BOTH {
                let message = match message_reference(operation, direction) {
                    Some(message) => message,
                    None => {
                        debug!("operation {} has no {} message", name, direction);
                        continue;
                    }
                };

                let (by_operation, by_message) = match direction {
                    Direction::Input => (&mut index.inputs, &mut index.input_messages),
                    Direction::Output => (&mut index.outputs, &mut index.output_messages),
                };

                by_operation
                    .entry(name.clone())
                    .or_default()
                    .push(message.clone());
                by_message.insert(message, name.clone());
            }
        }
    }

    debug!("indexed {} portType operations", index.order.len());
    index
}

pub fn index_messages(document: &Document, operations: &OperationIndex) -> MessageIndex {
    let mut index = MessageIndex::default();

    for message in document.elements_named("message") {
        let name = message.attribute("name").unwrap_or_default();

        if !operations.is_target(name) || index.parts.contains_key(name) {
            continue;
        }

        let part = match message.first_descendant_named("part") {
            Some(part) => part,
            None => continue,
        };

        let target = if let Some(element) = part.attribute("element") {
            PartTarget::Element(normalize(element).to_owned())
        } else if let Some(ty) = part.attribute("type") {
            PartTarget::Type(normalize(ty).to_owned())
        } else {
            debug!("message {} has a part with neither element nor type", name);
            continue;
        };

        let key = match &target {
            PartTarget::Element(key) | PartTarget::Type(key) => key.clone(),
        };

        index
            .by_target
            .entry(key)
            .or_default()
            .push(name.to_owned());
        index.parts.insert(
            name.to_owned(),
            MessagePart {
                name: part.attribute("name").unwrap_or_default().to_owned(),
                target,
            },
        );
    }

    debug!("indexed {} referenced messages", index.parts.len());
    index
}

fn element_binding(element: &Element) -> Option<ElementBinding> {
    let name = element.attribute("name").unwrap_or_default();

    if let Some(ty) = element.attribute("type") {
        return Some(ElementBinding {
            name: name.to_owned(),
            ty: normalize(ty).to_owned(),
        });
    }

    // complex element: one level down to the wrapped element
    let inner = element.first_descendant_named("element")?;

    Some(ElementBinding {
        name: inner.attribute("name").unwrap_or_default().to_owned(),
        ty: normalize(inner.attribute("type")?).to_owned(),
    })
}

/// Schemas are scanned in document order; the first schema declaring an
/// element wins.
pub fn index_elements(document: &Document, messages: &MessageIndex) -> ElementIndex {
    let mut index = HashMap::new();

    let types = match document.elements_named("types").next() {
        Some(types) => types,
        None => return ElementIndex(index),
    };

    for schema in types.descendants_named("schema") {
        for element in schema.children_named("element") {
            let name = element.attribute("name").unwrap_or_default();

            if !messages.by_target.contains_key(name) || index.contains_key(name) {
                continue;
            }

            match element_binding(element) {
                Some(binding) => {
                    index.insert(name.to_owned(), binding);
                }

                None => debug!("element {} has no resolvable type", name),
            }
        }
    }

    debug!("resolved {} schema elements", index.len());
    ElementIndex(index)
}

pub fn index_bindings(document: &Document, options: &ResolveOptions) -> BindingIndex {
    let mut index = BindingIndex::default();

    let bindings = document.root().children_named("binding");
    let limit = match options.bindings {
        BindingSelection::First => 1,
        BindingSelection::All => usize::MAX,
    };

    for binding in bindings.take(limit) {
        for operation in binding.children_named("operation") {
            let name = operation.attribute("name").unwrap_or_default();

            if index.operations.iter().any(|seen| seen == name) {
                continue;
            }

            let style = operation
                .first_descendant_named("operation")
                .and_then(|soap| soap.attribute("style"));

            if let Some(style) = style {
                index.styles.insert(name.to_owned(), style.to_owned());
            }

            index.operations.push(name.to_owned());
        }
    }

    debug!("indexed {} binding operations", index.operations.len());
    index
}

/// Runs all four passes over one document.
pub fn resolve(document: &Document, catalog: &TypeCatalog, options: &ResolveOptions) -> Resolution {
    let operations = index_operations(document);
    let messages = index_messages(document, &operations);
    let elements = index_elements(document, &messages);
    let bindings = index_bindings(document, options);

    let context = ShapeContext {
        operations: &operations,
        messages: &messages,
        elements: &elements,
        catalog,
    };

    let mut resolution = Resolution::default();

    for name in &operations.order {
        let mut operation = ResolvedOperation::new(name.clone());
        operation.documentation = operations.documentation.get(name).cloned();
        resolution.operations.insert(name.clone(), operation);
    }

    for name in &bindings.operations {
        let operation = resolution
            .operations
            .entry(name.clone())
            .or_insert_with(|| ResolvedOperation::new(name.clone()));

        operation.style = bindings.styles.get(name).cloned();
        operation.input = context.shape(name, Direction::Input, &mut resolution.diagnostics);
        operation.output = context.shape(name, Direction::Output, &mut resolution.diagnostics);
    }

    resolution
}
