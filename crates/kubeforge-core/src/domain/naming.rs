//! Name derivation helpers shared by the resource model and the render context.
//!
//! Everything here is pure string manipulation over ASCII identifiers; the
//! inputs are already validated (kinds, groups, project names).

/// Convert a string to kebab-case.
///
/// | Input | Output |
/// |-------|--------|
/// | "MyOperator" | "my-operator" |
/// | "my_operator" | "my-operator" |
/// | "HTTPProxy" | "http-proxy" |
pub fn to_kebab_case(s: &str) -> String {
    split_words(s).join("-")
}

/// Strip every character that cannot appear in a Go identifier.
///
/// Used for import aliases (`batch.tutorial` + `v1` → `batchtutorialv1`).
pub fn to_go_identifier(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// English plural of a lower-cased kind, following the rules the API
/// machinery uses for resource names.
///
/// | Input | Output |
/// |-------|--------|
/// | "cronjob" | "cronjobs" |
/// | "policy" | "policies" |
/// | "ingress" | "ingresses" |
/// | "box" | "boxes" |
/// | "key" | "keys" |
pub fn pluralize(singular: &str) -> String {
    if singular.is_empty() {
        return String::new();
    }

    if ["s", "x", "z", "ch", "sh"]
        .iter()
        .any(|suffix| singular.ends_with(suffix))
    {
        return format!("{singular}es");
    }

    if let Some(stem) = singular.strip_suffix('y') {
        let before = stem.chars().last();
        if before.is_some_and(|c| !"aeiou".contains(c)) {
            return format!("{stem}ies");
        }
    }

    format!("{singular}s")
}

/// Split a string into lowercase words based on casing and separators.
///
/// ## Word Boundary Detection
///
/// 1. **Explicit separators:** `_`, `-`, `.`, whitespace → always split
/// 2. **Case transition (camelCase):** `aB` → split between `a` and `B`
/// 3. **Acronym boundary:** `HTTPProxy` → split between `P` and `P`roxy
fn split_words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c == '.' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }

        current.extend(c.to_lowercase());
    }

    if !current.is_empty() {
        words.push(current);
    }

    words
}
