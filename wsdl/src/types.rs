use indexmap::IndexMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Text,
    Integer,
    Decimal,
    Boolean,
}

/// The normalized type vocabulary used in rendered documentation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Primitive(Primitive),
    List(Box<SemanticType>),
    /// A reference to another catalog entry, left unresolved.
    Named(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub label: String,
    pub properties: IndexMap<String, SemanticType>,
}

/// Struct types from the introspection feed, keyed by type name.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct TypeCatalog(IndexMap<String, TypeDescriptor>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSignature {
    pub name: String,
    pub return_type: SemanticType,
    pub parameters: IndexMap<String, SemanticType>,
}

const ARRAY_PREFIX: &str = "ArrayOf";

impl Primitive {
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "double" | "float" | "decimal" => Some(Self::Decimal),
            "int" | "long" | "short" => Some(Self::Integer),
            "string" => Some(Self::Text),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
        }
    }
}

impl SemanticType {
    /// Maps a raw wire type name from the feed or the schema.
    ///
    /// `ArrayOfX` names become lists; the element of the list is checked against
    /// the primitives case-insensitively, so `ArrayOfString` is `list<text>`.
    pub fn from_wire(raw: &str) -> Self {
        if let Some(primitive) = Primitive::from_wire(raw) {
            return Self::Primitive(primitive);
        }

        if let Some(element) = raw.strip_prefix(ARRAY_PREFIX) {
            let inner = match Primitive::from_wire(&element.to_lowercase()) {
                Some(primitive) => Self::Primitive(primitive),
                None => Self::Named(element.to_owned()),
            };

            return Self::List(Box::new(inner));
        }

        Self::Named(raw.to_owned())
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(primitive) => f.write_str(primitive.as_str()),
            Self::List(inner) => write!(f, "list<{}>", inner),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl Direction {
    pub const BOTH: [Direction; 2] = [Direction::Input, Direction::Output];

    /// The WSDL tag carrying this direction's message reference.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl TypeDescriptor {
    pub fn new(label: String) -> Self {
        Self {
            label,
            properties: IndexMap::new(),
        }
    }
}

impl TypeCatalog {
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn insert(&mut self, descriptor: TypeDescriptor) {
        self.0.insert(descriptor.label.clone(), descriptor);
    }
}

impl FromIterator<TypeDescriptor> for TypeCatalog {
    fn from_iter<I: IntoIterator<Item = TypeDescriptor>>(iter: I) -> Self {
        let mut catalog = Self::default();

        for descriptor in iter {
            catalog.insert(descriptor);
        }

        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn named(name: &str) -> SemanticType {
        SemanticType::Named(name.to_owned())
    }

    fn list(inner: SemanticType) -> SemanticType {
        SemanticType::List(Box::new(inner))
    }

    #[rstest]
    #[case("double", SemanticType::Primitive(Primitive::Decimal))]
    #[case("float", SemanticType::Primitive(Primitive::Decimal))]
    #[case("decimal", SemanticType::Primitive(Primitive::Decimal))]
    #[case("int", SemanticType::Primitive(Primitive::Integer))]
    #[case("long", SemanticType::Primitive(Primitive::Integer))]
    #[case("short", SemanticType::Primitive(Primitive::Integer))]
    #[case("string", SemanticType::Primitive(Primitive::Text))]
    #[case("boolean", SemanticType::Primitive(Primitive::Boolean))]
    #[case("ArrayOfString", list(SemanticType::Primitive(Primitive::Text)))]
    #[case("ArrayOfInt", list(SemanticType::Primitive(Primitive::Integer)))]
    #[case("ArrayOfFoo", list(named("Foo")))]
    #[case("Bar", named("Bar"))]
    #[case("String", named("String"))]
    fn maps_wire_names(#[case] raw: &str, #[case] expected: SemanticType) {
        assert_eq!(SemanticType::from_wire(raw), expected);
    }

    #[test]
    fn displays_vocabulary() {
        assert_eq!(SemanticType::from_wire("long").to_string(), "integer");
        assert_eq!(SemanticType::from_wire("ArrayOfDouble").to_string(), "list<decimal>");
        assert_eq!(SemanticType::from_wire("ArrayOfWidget").to_string(), "list<Widget>");
        assert_eq!(SemanticType::from_wire("Widget").to_string(), "Widget");
    }

    #[test]
    fn catalog_keeps_last_entry_per_name() {
        let mut first = TypeDescriptor::new("Widget".to_owned());
        first.properties.insert("a".to_owned(), named("A"));
        let second = TypeDescriptor::new("Widget".to_owned());

        let catalog = [first, second].into_iter().collect::<TypeCatalog>();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("Widget").unwrap().properties.is_empty());
    }
}
