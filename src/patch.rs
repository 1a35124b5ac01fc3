use crate::{Result, VitrineError};

/// Marker pair bounding one mutable region of an otherwise opaque
/// document. The document is never parsed as markup.
#[derive(Debug, Clone)]
pub struct AnchorBlock {
    pub tag: String,
}

impl AnchorBlock {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    pub fn start_marker(&self) -> String {
        format!("<!-- {}:START -->", self.tag)
    }

    pub fn end_marker(&self) -> String {
        format!("<!-- {}:END -->", self.tag)
    }
}

/// Replace the inclusive span from the first start marker to the first
/// end marker after it with `start\n<body>\n<end>`. Missing markers are
/// a configuration defect and fail fatally. Idempotent: patching again
/// with the same body reports `changed = false`.
pub fn patch_region(document: &str, anchor: &AnchorBlock, body: &str) -> Result<(String, bool)> {
    let start_marker = anchor.start_marker();
    let end_marker = anchor.end_marker();

    let start_idx = document
        .find(&start_marker)
        .ok_or_else(|| VitrineError::AnchorMissing { tag: anchor.tag.clone() })?;
    let after_start = start_idx + start_marker.len();
    let end_rel = document[after_start..]
        .find(&end_marker)
        .ok_or_else(|| VitrineError::AnchorMissing { tag: anchor.tag.clone() })?;
    let end_idx = after_start + end_rel + end_marker.len();

    let mut patched = String::with_capacity(document.len() + body.len());
    patched.push_str(&document[..start_idx]);
    patched.push_str(&start_marker);
    patched.push('\n');
    patched.push_str(body);
    patched.push('\n');
    patched.push_str(&end_marker);
    patched.push_str(&document[end_idx..]);

    let changed = patched != document;
    Ok((patched, changed))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "# Profile\n\nintro text\n<!-- STRIP:START -->\nold body\n<!-- STRIP:END -->\nfooter text\n";

    #[test]
    fn replaces_span_and_reports_change() {
        let anchor = AnchorBlock::new("STRIP");
        let (patched, changed) = patch_region(DOC, &anchor, "new body").expect("patch");
        assert!(changed);
        assert!(patched.contains("<!-- STRIP:START -->\nnew body\n<!-- STRIP:END -->"));
        assert!(!patched.contains("old body"));
    }

    #[test]
    fn second_identical_patch_is_a_no_op() {
        let anchor = AnchorBlock::new("STRIP");
        let (first, changed_first) = patch_region(DOC, &anchor, "new body").expect("patch");
        assert!(changed_first);
        let (second, changed_second) = patch_region(&first, &anchor, "new body").expect("patch");
        assert!(!changed_second);
        assert_eq!(first, second);
    }

    #[test]
    fn content_outside_the_span_is_byte_identical() {
        let anchor = AnchorBlock::new("STRIP");
        let (patched, _) = patch_region(DOC, &anchor, "replacement").expect("patch");
        assert!(patched.starts_with("# Profile\n\nintro text\n<!-- STRIP:START -->"));
        assert!(patched.ends_with("<!-- STRIP:END -->\nfooter text\n"));
    }

    #[test]
    fn missing_start_marker_is_fatal() {
        let err = patch_region("no markers here", &AnchorBlock::new("STRIP"), "x").unwrap_err();
        assert!(matches!(err, VitrineError::AnchorMissing { tag } if tag == "STRIP"));
    }

    #[test]
    fn end_marker_before_start_is_treated_as_missing() {
        let doc = "<!-- STRIP:END -->\n<!-- STRIP:START -->\n";
        let err = patch_region(doc, &AnchorBlock::new("STRIP"), "x").unwrap_err();
        assert!(matches!(err, VitrineError::AnchorMissing { .. }));
    }

    #[test]
    fn first_marker_pair_wins_when_duplicated() {
        let doc = "<!-- A:START -->one<!-- A:END -->mid<!-- A:START -->two<!-- A:END -->";
        let (patched, _) = patch_region(doc, &AnchorBlock::new("A"), "X").expect("patch");
        assert!(patched.starts_with("<!-- A:START -->\nX\n<!-- A:END -->mid"));
        assert!(patched.ends_with("<!-- A:START -->two<!-- A:END -->"));
    }
}
