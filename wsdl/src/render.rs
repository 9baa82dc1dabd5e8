use indexmap::IndexMap;
use std::{fmt::Write, str::FromStr};
use tracing::warn;

use super::{
    error::{Diagnostic, Reference},
    resolver::{ElementIndex, MessageIndex, OperationIndex, PartTarget},
    types::{Direction, SemanticType, TypeCatalog},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerField {
    pub name: String,
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeVariant {
    /// The part names a schema element; `inner` is unset when the element
    /// could not be found in any schema.
    DirectElement {
        element: String,
        inner: Option<InnerField>,
        properties: IndexMap<String, SemanticType>,
    },
    DirectType {
        ty: String,
        properties: IndexMap<String, SemanticType>,
    },
}

/// The resolved input or output of one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMessageShape {
    pub part_name: String,
    pub variant: ShapeVariant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderFormat {
    #[default]
    Html,
    Text,
}

/// The pass outputs the renderer reads from.
#[derive(Debug, Clone, Copy)]
pub struct ShapeContext<'a> {
    pub operations: &'a OperationIndex,
    pub messages: &'a MessageIndex,
    pub elements: &'a ElementIndex,
    pub catalog: &'a TypeCatalog,
}

impl ResolvedMessageShape {
    pub fn properties(&self) -> &IndexMap<String, SemanticType> {
        match &self.variant {
            ShapeVariant::DirectElement { properties, .. }
            | ShapeVariant::DirectType { properties, .. } => properties,
        }
    }
}

impl FromStr for RenderFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "html" => Ok(Self::Html),
            "text" => Ok(Self::Text),
            other => Err(format!("unknown render format {}", other)),
        }
    }
}

impl<'a> ShapeContext<'a> {
    /// Follows the first message of the operation down to catalog properties.
    ///
    /// Broken links are reported and give a partial shape (or none at all when
    /// even the message is unknown) rather than an error.
    pub fn shape(
        &self,
        operation: &str,
        direction: Direction,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<ResolvedMessageShape> {
        let mut report = |reference: Reference| {
            let diagnostic = Diagnostic::MissingReference {
                operation: operation.to_owned(),
                direction,
                reference,
            };

            warn!("{}", diagnostic);
            diagnostics.push(diagnostic);
        };

        let message = match self
            .operations
            .messages(operation, direction)
            .and_then(<[String]>::first)
        {
            Some(message) => message,
            None => {
                report(Reference::Direction);
                return None;
            }
        };

        let part = match self.messages.part(message) {
            Some(part) => part,
            None => {
                report(Reference::Message(message.clone()));
                return None;
            }
        };

        let variant = match &part.target {
            PartTarget::Element(element) => match self.elements.get(element) {
                Some(binding) => ShapeVariant::DirectElement {
                    element: element.clone(),
                    inner: Some(InnerField {
                        name: binding.name.clone(),
                        ty: binding.ty.clone(),
                    }),
                    properties: self.properties(&binding.ty, &mut report),
                },

                None => {
                    report(Reference::Element(element.clone()));
                    ShapeVariant::DirectElement {
                        element: element.clone(),
                        inner: None,
                        properties: IndexMap::new(),
                    }
                }
            },

            PartTarget::Type(ty) => ShapeVariant::DirectType {
                ty: ty.clone(),
                properties: self.properties(ty, &mut report),
            },
        };

        Some(ResolvedMessageShape {
            part_name: part.name.clone(),
            variant,
        })
    }

    fn properties(
        &self,
        ty: &str,
        report: &mut impl FnMut(Reference),
    ) -> IndexMap<String, SemanticType> {
        match self.catalog.get(ty) {
            Some(descriptor) => descriptor.properties.clone(),

            None => {
                // primitives never have catalog entries
                if let SemanticType::Named(_) = SemanticType::from_wire(ty) {
                    report(Reference::Type(ty.to_owned()));
                }

                IndexMap::new()
            }
        }
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }

    escaped
}

fn render_html(shape: &ResolvedMessageShape) -> String {
    let mut text = String::new();
    let part = escape(&shape.part_name);

    let property_items = |properties: &IndexMap<String, SemanticType>| {
        properties
            .iter()
            .map(|(name, ty)| {
                format!(
                    "<li>{} - type {}</li>",
                    escape(name),
                    escape(&ty.to_string())
                )
            })
            .collect::<String>()
    };

    match &shape.variant {
        ShapeVariant::DirectElement {
            element,
            inner,
            properties,
        } => {
            let _ = write!(text, "{} type {}<br><ul>", part, escape(element));

            if let Some(inner) = inner {
                let _ = write!(
                    text,
                    "<li>{} type {}<ul>{}</ul></li>",
                    escape(&inner.name),
                    escape(&inner.ty),
                    property_items(properties)
                );
            }

            text.push_str("</ul>");
        }

        ShapeVariant::DirectType { ty, properties } => {
            let _ = write!(
                text,
                "{} type {}<br><ul>{}</ul>",
                part,
                escape(ty),
                property_items(properties)
            );
        }
    }

    text
}

fn render_text(shape: &ResolvedMessageShape) -> String {
    let mut lines = Vec::new();

    let (header, indent) = match &shape.variant {
        ShapeVariant::DirectElement { element, inner, .. } => {
            let header = format!("{} type {}", shape.part_name, element);

            match inner {
                Some(inner) => {
                    lines.push(header);
                    (format!("  - {} type {}", inner.name, inner.ty), "    ")
                }
                None => (header, "  "),
            }
        }

        ShapeVariant::DirectType { ty, .. } => (format!("{} type {}", shape.part_name, ty), "  "),
    };

    lines.push(header);
    lines.extend(
        shape
            .properties()
            .iter()
            .map(|(name, ty)| format!("{}- {} - type {}", indent, name, ty)),
    );

    lines.join("\n")
}

pub fn render(shape: &ResolvedMessageShape, format: RenderFormat) -> String {
    match format {
        RenderFormat::Html => render_html(shape),
        RenderFormat::Text => render_text(shape),
    }
}
