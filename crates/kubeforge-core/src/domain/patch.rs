//! Literal-anchor text patching.
//!
//! These functions never touch the filesystem. They take the full content of
//! a file and return the new content, or a [`PatchError`] when the anchor
//! cannot be found. The first qualifying occurrence of an anchor wins; no
//! syntax of the edited file is understood.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("marker '{}' not found", abbreviate(anchor))]
    MarkerNotFound { anchor: String },

    #[error("text '{}' not found", abbreviate(text))]
    TextNotFound { text: String },

    #[error("line {line} of region '{}' does not start with '{prefix}'", abbreviate(anchor))]
    RegionNotCommented {
        anchor: String,
        prefix: String,
        line: usize,
    },
}

impl PatchError {
    /// Whether the anchor (or text) was absent, as opposed to malformed.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::MarkerNotFound { .. } | Self::TextNotFound { .. })
    }
}

/// First line of a multi-line anchor, for messages.
fn abbreviate(text: &str) -> String {
    let mut lines = text.lines();
    let first = lines.next().unwrap_or_default().trim();
    if lines.next().is_some() {
        format!("{first} ...")
    } else {
        first.to_string()
    }
}

/// Insert `payload` right after the first literal occurrence of `anchor`.
///
/// Whatever follows the anchor is kept as is, even when it already starts
/// with `payload`. Duplicate detection belongs to
/// [`Mutation::insert_once`](crate::domain::Mutation::insert_once).
pub fn insert_after(content: &str, anchor: &str, payload: &str) -> Result<String, PatchError> {
    let not_found = || PatchError::MarkerNotFound {
        anchor: anchor.to_string(),
    };
    if anchor.is_empty() {
        return Err(not_found());
    }
    let end = content.find(anchor).ok_or_else(not_found)? + anchor.len();
    Ok(splice(content, end, end, payload))
}

/// Prefix every line of the first occurrence of `anchor` that is not already
/// preceded by `prefix`.
pub fn comment_region(content: &str, anchor: &str, prefix: &str) -> Result<String, PatchError> {
    if anchor.is_empty() {
        return Err(PatchError::MarkerNotFound {
            anchor: anchor.to_string(),
        });
    }

    let start = content
        .match_indices(anchor)
        .map(|(i, _)| i)
        .find(|&i| prefix.is_empty() || !content[..i].ends_with(prefix))
        .ok_or_else(|| PatchError::MarkerNotFound {
            anchor: anchor.to_string(),
        })?;
    let end = start + anchor.len();

    let commented: String = anchor
        .split_inclusive('\n')
        .map(|line| format!("{prefix}{line}"))
        .collect();

    Ok(splice(content, start, end, &commented))
}

/// Strip `prefix` from every line of the first occurrence of `anchor`.
///
/// `anchor` is the commented form of the region. Every line of it must start
/// with `prefix`, which makes this the exact inverse of [`comment_region`].
pub fn uncomment_region(content: &str, anchor: &str, prefix: &str) -> Result<String, PatchError> {
    if anchor.is_empty() {
        return Err(PatchError::MarkerNotFound {
            anchor: anchor.to_string(),
        });
    }

    let start = content.find(anchor).ok_or_else(|| PatchError::MarkerNotFound {
        anchor: anchor.to_string(),
    })?;
    let end = start + anchor.len();

    let mut uncommented = String::with_capacity(anchor.len());
    for (index, line) in anchor.split_inclusive('\n').enumerate() {
        let stripped = line
            .strip_prefix(prefix)
            .ok_or_else(|| PatchError::RegionNotCommented {
                anchor: anchor.to_string(),
                prefix: prefix.to_string(),
                line: index + 1,
            })?;
        uncommented.push_str(stripped);
    }

    Ok(splice(content, start, end, &uncommented))
}

/// Replace the first occurrence of `old` with `new`.
pub fn replace_first(content: &str, old: &str, new: &str) -> Result<String, PatchError> {
    let not_found = || PatchError::TextNotFound {
        text: old.to_string(),
    };
    if old.is_empty() {
        return Err(not_found());
    }
    let start = content.find(old).ok_or_else(not_found)?;
    Ok(splice(content, start, start + old.len(), new))
}

fn splice(content: &str, start: usize, end: usize, replacement: &str) -> String {
    let mut out = String::with_capacity(content.len() - (end - start) + replacement.len());
    out.push_str(&content[..start]);
    out.push_str(replacement);
    out.push_str(&content[end..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MAIN: &str = "import (\n\t// +kubeforge:scaffold:imports\n)\n";

    #[test]
    fn insert_after_places_payload_and_keeps_the_rest() {
        let out = insert_after(MAIN, "// +kubeforge:scaffold:imports", "\n\tbatchv1 \"x/api/v1\"")
            .unwrap();
        assert_eq!(
            out,
            "import (\n\t// +kubeforge:scaffold:imports\n\tbatchv1 \"x/api/v1\"\n)\n"
        );
    }

    #[test]
    fn insert_after_missing_anchor_fails() {
        let err = insert_after(MAIN, "// +kubeforge:scaffold:scheme", "x").unwrap_err();
        assert_eq!(
            err,
            PatchError::MarkerNotFound {
                anchor: "// +kubeforge:scaffold:scheme".into()
            }
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn insert_after_uses_the_first_occurrence_even_when_payload_follows() {
        let out = insert_after("// +marker\n\tfoo()\n", "// +marker", "\n").unwrap();
        assert_eq!(out, "// +marker\n\n\tfoo()\n");

        let out = insert_after("A\nXA\n", "A", "X").unwrap();
        assert_eq!(out, "AX\nXA\n");
        assert_eq!(insert_after(&out, "A", "X").unwrap(), "AXX\nXA\n");
    }

    #[test]
    fn empty_anchor_is_rejected() {
        assert!(insert_after(MAIN, "", "x").is_err());
        assert!(comment_region(MAIN, "", "#").is_err());
        assert!(uncomment_region(MAIN, "", "#").is_err());
        assert!(matches!(
            replace_first(MAIN, "", "x"),
            Err(PatchError::TextNotFound { .. })
        ));
    }

    #[test]
    fn comment_then_uncomment_is_identity() {
        let content = "resources:\n- ../crd\n- ../rbac\n- ../manager\n";
        let region = "- ../rbac\n- ../manager\n";

        let commented = comment_region(content, region, "#").unwrap();
        assert_eq!(commented, "resources:\n- ../crd\n#- ../rbac\n#- ../manager\n");

        let restored = uncomment_region(&commented, "#- ../rbac\n#- ../manager\n", "#").unwrap();
        assert_eq!(restored, content);
    }

    #[test]
    fn uncomment_then_comment_is_identity() {
        let content = "resources:\n#- ../webhook\n#- ../certmanager\n";
        let uncommented = uncomment_region(content, "#- ../webhook", "#").unwrap();
        assert_eq!(uncommented, "resources:\n- ../webhook\n#- ../certmanager\n");
        assert_eq!(comment_region(&uncommented, "- ../webhook", "#").unwrap(), content);
    }

    #[test]
    fn comment_skips_already_commented_occurrence() {
        let content = "#- ../webhook\n- ../webhook\n";
        let out = comment_region(content, "- ../webhook", "#").unwrap();
        assert_eq!(out, "#- ../webhook\n#- ../webhook\n");
        assert!(comment_region(&out, "- ../webhook", "#").is_err());
    }

    #[test]
    fn uncomment_requires_every_line_prefixed() {
        let content = "#a\nb\n";
        let err = uncomment_region(content, "#a\nb\n", "#").unwrap_err();
        assert!(matches!(err, PatchError::RegionNotCommented { line: 2, .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn consumed_uncomment_anchor_fails_closed() {
        let content = "#- ../webhook\n";
        let once = uncomment_region(content, "#- ../webhook", "#").unwrap();
        assert!(matches!(
            uncomment_region(&once, "#- ../webhook", "#"),
            Err(PatchError::MarkerNotFound { .. })
        ));
    }

    #[test]
    fn replace_first_only() {
        assert_eq!(replace_first("a b a", "a", "c").unwrap(), "c b a");
        assert!(matches!(
            replace_first("a b a", "z", "c"),
            Err(PatchError::TextNotFound { .. })
        ));
    }

    #[test]
    fn multi_line_anchors_are_abbreviated_in_messages() {
        let err = PatchError::MarkerNotFound {
            anchor: "first line\nsecond".into(),
        };
        assert_eq!(err.to_string(), "marker 'first line ...' not found");
    }
}
