use std::{io::BufRead, slice, str::FromStr};

use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Error parsing XML input")]
    Xml(#[from] quick_xml::Error),

    #[error("Document has no root element")]
    MissingRoot,

    #[error("Document has more than one root element")]
    MultipleRoots,

    #[error("Element {0} is never closed")]
    UnclosedElement(String),
}

/// An immutable, fully loaded XML tree.
///
/// Lookups are by local tag name, so `wsdl:portType` and `portType` are the
/// same thing as far as callers are concerned.
#[derive(Debug, Clone)]
pub struct Document {
    root: Element,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// Pre-order walk over every element below a starting element.
pub struct Descendants<'a> {
    stack: Vec<slice::Iter<'a, Node>>,
}

fn local_name(name: &str) -> &str {
    name.split_once(':').map_or(name, |(_, local)| local)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<(), Error> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(Error::MultipleRoots),
    }

    Ok(())
}

impl Document {
    pub fn parse(xml: &str) -> Result<Self, Error> {
        let mut reader = Reader::from_str(xml);

        let mut stack = Vec::new();
        let mut root = None;
        let mut buffer = Vec::new();

        loop {
            match reader.read_event(&mut buffer)? {
                Event::Start(start) => stack.push(Element::from_start(&reader, &start)?),

                Event::Empty(start) => {
                    let element = Element::from_start(&reader, &start)?;
                    attach(&mut stack, &mut root, element)?;
                }

                Event::End(..) => {
                    if let Some(element) = stack.pop() {
                        attach(&mut stack, &mut root, element)?;
                    }
                }

                Event::Text(text) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .children
                            .push(Node::Text(text.unescape_and_decode(&reader)?));
                    }
                }

                // CDATA content reaches us already escaped
                Event::CData(text) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .children
                            .push(Node::Text(text.unescape_and_decode(&reader)?));
                    }
                }

                Event::Eof => break,

                _ => (),
            }

            buffer.clear();
        }

        if let Some(element) = stack.pop() {
            return Err(Error::UnclosedElement(element.name));
        }

        root.map(|root| Document { root }).ok_or(Error::MissingRoot)
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Every element in the document with the given local name, root included.
    pub fn elements_named<'a, 'b>(&'a self, local: &'b str) -> impl Iterator<Item = &'a Element> + 'b
    where
        'a: 'b,
    {
        std::iter::once(&self.root)
            .chain(self.root.descendants())
            .filter(move |element| element.local_name() == local)
    }
}

impl FromStr for Document {
    type Err = Error;

    fn from_str(xml: &str) -> Result<Self, Self::Err> {
        Self::parse(xml)
    }
}

impl Element {
    fn from_start<B: BufRead>(reader: &Reader<B>, start: &BytesStart<'_>) -> Result<Self, Error> {
        let name = reader.decode(start.name())?.to_owned();
        let mut attributes = Vec::new();

        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = reader.decode(attribute.key)?.to_owned();
            let value = attribute.unescape_and_decode_value(reader)?;
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    /// The qualified tag name, prefix included.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attribute(key).is_some()
    }

    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    pub fn children_named<'a, 'b>(&'a self, local: &'b str) -> impl Iterator<Item = &'a Element> + 'b
    where
        'a: 'b,
    {
        self.children()
            .filter(move |element| element.local_name() == local)
    }

    pub fn first_child_named(&self, local: &str) -> Option<&Element> {
        self.children_named(local).next()
    }

    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![self.children.iter()],
        }
    }

    pub fn descendants_named<'a, 'b>(&'a self, local: &'b str) -> impl Iterator<Item = &'a Element> + 'b
    where
        'a: 'b,
    {
        self.descendants()
            .filter(move |element| element.local_name() == local)
    }

    pub fn first_descendant_named(&self, local: &str) -> Option<&Element> {
        self.descendants_named(local).next()
    }

    /// Concatenated text of this element and everything below it, with
    /// leading and trailing whitespace removed.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text.trim().to_owned()
    }

    fn collect_text(&self, into: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(value) => into.push_str(value),
                Node::Element(element) => element.collect_text(into),
            }
        }
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(nodes) = self.stack.last_mut() {
            match nodes.next() {
                Some(Node::Element(element)) => {
                    self.stack.push(element.children.iter());
                    return Some(element);
                }

                Some(Node::Text(_)) => (),

                None => {
                    self.stack.pop();
                }
            }
        }

        None
    }
}
