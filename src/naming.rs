//! Turning paths into source-specific names.

use crate::path::Path;

/// Split an identifier into words at underscores, dashes and case changes.
///
/// Runs of capitals stay together, so `HTMLEntityID` yields `HTML`, `Entity`,
/// `ID`. Digits stick to the word before them.
pub fn split_name(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn words(path: &Path) -> Vec<String> {
    path.elements()
        .iter()
        .flat_map(|element| split_name(element))
        .collect()
}

/// `server->maxConns` becomes `SERVER_MAX_CONNS` (or `APP_SERVER_MAX_CONNS`
/// with prefix `APP`).
pub fn env_name(prefix: Option<&str>, path: &Path) -> String {
    let name = words(path)
        .iter()
        .map(|w| w.to_uppercase())
        .collect::<Vec<_>>()
        .join("_");
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{}_{name}", prefix.to_uppercase()),
        _ => name,
    }
}

/// `server->maxConns` becomes `server-max-conns`.
pub fn flag_name(path: &Path) -> String {
    words(path)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// `server->max_conns` becomes `server.max_conns`.
pub fn dotted_name(path: &Path) -> String {
    path.elements().join(".")
}

/// A short lowercase name for `T`, looking through `Option`, `Vec` and
/// smart pointers: `Option<Vec<std::time::Duration>>` is `duration`.
pub fn friendly_type_name<T: ?Sized>() -> String {
    let mut name = std::any::type_name::<T>();
    loop {
        let base = name.split('<').next().unwrap_or(name);
        let short = base.rsplit("::").next().unwrap_or(base);
        if matches!(short, "Option" | "Vec" | "Box" | "Rc" | "Arc") {
            let inner = name
                .find('<')
                .and_then(|i| name[i + 1..].strip_suffix('>'));
            if let Some(inner) = inner {
                name = inner;
                continue;
            }
        }
        return short.to_lowercase();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::NodePath;

    #[test]
    fn split_name_cases() {
        let cases: &[(&str, &[&str])] = &[
            ("", &[]),
            ("lowercase", &["lowercase"]),
            ("Class", &["Class"]),
            ("MyClass", &["My", "Class"]),
            ("MyC", &["My", "C"]),
            ("HTML", &["HTML"]),
            ("PDFLoader", &["PDF", "Loader"]),
            ("AString", &["A", "String"]),
            ("SimpleXMLParser", &["Simple", "XML", "Parser"]),
            ("vimRPCPlugin", &["vim", "RPC", "Plugin"]),
            ("GL11Version", &["GL11", "Version"]),
            ("99Bottles", &["99", "Bottles"]),
            ("May5", &["May5"]),
            ("BFG9000", &["BFG9000"]),
            ("HTMLEntityID", &["HTML", "Entity", "ID"]),
            ("pool_size", &["pool", "size"]),
            ("max-conns", &["max", "conns"]),
        ];
        for (input, expected) in cases {
            assert_eq!(&split_name(input), expected, "splitting {input:?}");
        }
    }

    #[test]
    fn env_and_flag_names() {
        let root = NodePath::root("");
        let path = root.node("test").leaf("maxConns");
        assert_eq!(env_name(None, &path), "TEST_MAX_CONNS");
        assert_eq!(env_name(Some("app"), &path), "APP_TEST_MAX_CONNS");
        assert_eq!(flag_name(&path), "test-max-conns");
        assert_eq!(dotted_name(&path), "test.maxConns");
    }

    #[test]
    fn friendly_names() {
        assert_eq!(friendly_type_name::<u16>(), "u16");
        assert_eq!(friendly_type_name::<String>(), "string");
        assert_eq!(
            friendly_type_name::<Option<Vec<std::time::Duration>>>(),
            "duration"
        );
        assert_eq!(friendly_type_name::<std::net::IpAddr>(), "ipaddr");
    }
}
