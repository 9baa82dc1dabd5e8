/// Splits a qualified name on its first colon.
pub fn split_namespaced_name(prefixed_name: &str) -> (Option<&str>, &str) {
    match prefixed_name.split_once(':') {
        Some((prefix, local_name)) => (Some(prefix), local_name),
        None => (None, prefixed_name),
    }
}

/// Strips the namespace prefix from a qualified name: `tns:Foo` becomes `Foo`.
///
/// No namespace URI resolution happens here, the prefix is simply dropped.
pub fn normalize(prefixed_name: &str) -> &str {
    split_namespaced_name(prefixed_name).1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefix() {
        assert_eq!(normalize("tns:Foo"), "Foo");
        assert_eq!(normalize("Foo"), "Foo");
    }

    #[test]
    fn splits_on_first_colon_only() {
        assert_eq!(normalize("a:b:c"), "b:c");
        assert_eq!(split_namespaced_name("a:b:c"), (Some("a"), "b:c"));
        assert_eq!(split_namespaced_name(":x"), (Some(""), "x"));
    }
}
