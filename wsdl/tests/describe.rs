use rstest::rstest;
use wsdl_docs_util::xml::Document;
use wsdl_docs_wsdl::{
    describe,
    error::{Diagnostic, Error, Reference},
    introspect::Introspection,
    load,
    render::RenderFormat,
    resolver::{resolve, BindingSelection, ResolveOptions},
    types::{Direction, TypeCatalog},
};

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn document(name: &str) -> Document {
    load(fixture(name)).unwrap()
}

fn echo_feed() -> Introspection {
    Introspection {
        types: vec!["struct EchoType {string $message;}".to_owned()],
        functions: vec!["EchoType Echo(EchoType $body)".to_owned()],
    }
}

#[test]
fn echo_input_renders_element_and_property() {
    let documentation = describe(
        &document("echo.wsdl"),
        &echo_feed(),
        &ResolveOptions::default(),
        RenderFormat::Html,
    );

    let echo = &documentation.records["Echo"];
    assert!(echo.rendered_input.contains("EchoRequest"));
    assert!(echo.rendered_input.contains("message - type text"));
    assert!(echo.rendered_output.contains("EchoResponse"));
    assert_eq!(echo.style, "document");
    assert_eq!(echo.documentation, "Returns the message it was given.");
    assert!(documentation.diagnostics.is_empty());
}

#[rstest]
#[case(RenderFormat::Html)]
#[case(RenderFormat::Text)]
fn resolving_twice_is_byte_identical(#[case] format: RenderFormat) {
    let document = document("calculator.wsdl");
    let feed = Introspection::from_document(&document);
    let options = ResolveOptions::default();

    let first = describe(&document, &feed, &options, format);
    let second = describe(&document, &feed, &options, format);

    assert_eq!(first.records, second.records);
}

#[test]
fn calculator_with_synthesized_feed() {
    let document = document("calculator.wsdl");
    let feed = Introspection::from_document(&document);
    let documentation = describe(&document, &feed, &ResolveOptions::default(), RenderFormat::Text);

    assert_eq!(
        documentation.records.keys().collect::<Vec<_>>(),
        ["Add", "Divide"]
    );

    let add = &documentation.records["Add"];
    assert_eq!(add.style, "document");
    assert!(add.documentation.starts_with("Adds two integers."));
    // wrapper elements are unwrapped to their first field only
    assert_eq!(add.rendered_input, "parameters type Add\n  - intA type int");

    let divide = &documentation.records["Divide"];
    assert_eq!(divide.documentation, "");
    assert_eq!(
        divide.rendered_output,
        "parameters type DivideResponse\n  - DivideResult type int"
    );
}

#[test]
fn later_bindings_only_count_when_selected() {
    let document = document("calculator.wsdl");
    let catalog = TypeCatalog::default();

    let first = resolve(&document, &catalog, &ResolveOptions::default());
    assert_eq!(first.operations["Add"].style.as_deref(), Some("document"));

    let all = resolve(
        &document,
        &catalog,
        &ResolveOptions {
            bindings: BindingSelection::All,
        },
    );
    assert_eq!(all.operations["Add"].style.as_deref(), Some("document"));
    assert_eq!(all.operations.len(), 2);
}

#[test]
fn rpc_type_parts_render_one_level_shallower() {
    let document = document("stock.wsdl");
    let feed = Introspection::from_document(&document);
    let documentation = describe(&document, &feed, &ResolveOptions::default(), RenderFormat::Html);

    let quote = &documentation.records["GetQuote"];
    assert_eq!(quote.style, "rpc");
    assert_eq!(
        quote.rendered_input,
        "request type QuoteRequest<br><ul><li>symbol - type text</li>\
         <li>days - type integer</li></ul>"
    );
    assert!(quote
        .rendered_output
        .contains("<li>history - type list&lt;decimal&gt;</li>"));
    assert!(quote.rendered_output.contains("<li>exchange - type Exchange</li>"));
}

#[test]
fn missing_types_still_produce_every_record() {
    let document = document("stock.wsdl");
    let feed = Introspection::from_document(&document);
    let documentation = describe(&document, &feed, &ResolveOptions::default(), RenderFormat::Html);

    assert_eq!(documentation.records.len(), 2);

    let symbols = &documentation.records["ListSymbols"];
    assert_eq!(symbols.rendered_input, "prefix type string<br><ul></ul>");
    assert_eq!(symbols.rendered_output, "symbols type SymbolList<br><ul></ul>");

    assert_eq!(
        documentation.diagnostics,
        [Diagnostic::MissingReference {
            operation: "ListSymbols".to_owned(),
            direction: Direction::Output,
            reference: Reference::Type("SymbolList".to_owned()),
        }]
    );
}

#[test]
fn operations_missing_from_the_document_get_empty_records() {
    let mut feed = echo_feed();
    feed.functions.push("void Forgotten()".to_owned());
    feed.functions.push("not a signature".to_owned());

    let documentation = describe(
        &document("echo.wsdl"),
        &feed,
        &ResolveOptions::default(),
        RenderFormat::Html,
    );

    let forgotten = &documentation.records["Forgotten"];
    assert_eq!(forgotten.style, "");
    assert_eq!(forgotten.rendered_input, "");
    assert_eq!(forgotten.rendered_output, "");
    assert!(matches!(
        documentation.diagnostics.as_slice(),
        [Diagnostic::MalformedFeedEntry { entry, .. }] if entry == "not a signature"
    ));
}

#[test]
fn broken_message_and_element_links_are_reported() {
    let feed = Introspection {
        types: Vec::new(),
        functions: vec![
            "string Bare(string $bare)".to_owned(),
            "int Haunt(Ghost $p)".to_owned(),
        ],
    };
    let documentation = describe(
        &document("gaps.wsdl"),
        &feed,
        &ResolveOptions::default(),
        RenderFormat::Html,
    );

    let bare = &documentation.records["Bare"];
    assert_eq!(bare.style, "rpc");
    assert_eq!(bare.rendered_input, "");
    assert_eq!(bare.rendered_output, "result type string<br><ul></ul>");

    let haunt = &documentation.records["Haunt"];
    assert_eq!(haunt.rendered_input, "p type Ghost<br><ul></ul>");
    assert_eq!(haunt.rendered_output, "result type int<br><ul></ul>");

    assert_eq!(
        documentation.diagnostics,
        [
            Diagnostic::MissingReference {
                operation: "Bare".to_owned(),
                direction: Direction::Input,
                reference: Reference::Message("BareIn".to_owned()),
            },
            Diagnostic::MissingReference {
                operation: "Haunt".to_owned(),
                direction: Direction::Input,
                reference: Reference::Element("Ghost".to_owned()),
            },
        ]
    );
}

#[test]
fn documentation_keeps_spacing_around_inline_markup() {
    let documentation = describe(
        &document("gaps.wsdl"),
        &Introspection {
            types: Vec::new(),
            functions: vec!["int Haunt(Ghost $p)".to_owned()],
        },
        &ResolveOptions::default(),
        RenderFormat::Text,
    );

    assert_eq!(
        documentation.records["Haunt"].documentation,
        "Looks for the ghost in the record."
    );
}

#[test]
fn malformed_document_fails_the_whole_load() {
    assert!(matches!(load(fixture("broken.wsdl")), Err(Error::Document(_))));
}
