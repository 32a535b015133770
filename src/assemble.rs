//! Document assembly: stitches a markup buffer and a style buffer into one
//! renderable document.
//!
//! Classification is purely substring based (case-insensitive): markup that
//! lacks a closing `</body>` is treated as a fragment and wrapped, markup that
//! lacks a closing `</head>` gets a minimal head. The style text is then
//! spliced in as a single marked `<style>` block right before the first
//! `</head>`.

use serde::{Deserialize, Serialize};

/// Attribute carried by the injected style block so later passes can find it.
pub const STYLE_MARKER: &str = "data-pagesmith";

const DEFAULT_PREVIEW_TITLE: &str = "Preview";
const DEFAULT_EXPORT_TITLE: &str = "My Webpage";

/// What to do when the markup already brings its own styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionPolicy {
    /// Always inject; the block is layered after any author `<style>`/`<link>`.
    #[default]
    Layer,
    /// Leave the markup unstyled by us when it already has a `<style>` or
    /// `<link>` tag.
    SkipIfStyled,
}

/// Which consumer the document is assembled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The live preview surface
    Preview,
    /// The standalone `.html` download
    Export,
}

/// Document assembler configured with an injection policy and the titles used
/// for synthesized heads.
#[derive(Debug, Clone)]
pub struct Assembler {
    pub policy: InjectionPolicy,
    pub preview_title: String,
    pub export_title: String,
}

impl Default for Assembler {
    fn default() -> Self {
        Self {
            policy: InjectionPolicy::default(),
            preview_title: DEFAULT_PREVIEW_TITLE.to_string(),
            export_title: DEFAULT_EXPORT_TITLE.to_string(),
        }
    }
}

impl Assembler {
    pub fn new(policy: InjectionPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Assemble `markup` and `style` for the given target.
    pub fn assemble(&self, markup: &str, style: &str, target: Target) -> String {
        let doc = match target {
            Target::Preview => ensure_structure(markup, &self.preview_title),
            Target::Export if is_bare_fragment(markup) => skeleton(markup, &self.export_title),
            Target::Export => ensure_doctype(ensure_structure(markup, &self.export_title)),
        };
        inject_style(doc, style, self.policy)
    }
}

/// Assemble a preview document with the default policy.
pub fn assemble(markup: &str, style: &str) -> String {
    Assembler::default().assemble(markup, style, Target::Preview)
}

/// Assemble a standalone export document with the default policy.
pub fn assemble_for_export(markup: &str, style: &str) -> String {
    Assembler::default().assemble(markup, style, Target::Export)
}

fn ensure_structure(markup: &str, title: &str) -> String {
    let mut doc = markup.to_string();
    if find_ci(&doc, "</body>").is_none() {
        doc = format!("<body>\n{}\n</body>", doc);
    }
    if find_ci(&doc, "</head>").is_none() {
        let head = format!(
            "<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n",
            escape_text(title)
        );
        let at = find_open_tag(&doc, "body").unwrap_or(0);
        doc.insert_str(at, &head);
    }
    doc
}

fn skeleton(markup: &str, title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_text(title),
        markup
    )
}

fn ensure_doctype(doc: String) -> String {
    let has_doctype = doc
        .trim_start()
        .get(..9)
        .is_some_and(|lead| lead.eq_ignore_ascii_case("<!doctype"));
    if has_doctype {
        doc
    } else {
        format!("<!DOCTYPE html>\n{}", doc)
    }
}

fn is_bare_fragment(markup: &str) -> bool {
    ["html", "head", "body"]
        .iter()
        .all(|tag| find_open_tag(markup, tag).is_none())
        && find_ci(markup, "</head>").is_none()
        && find_ci(markup, "</body>").is_none()
}

fn inject_style(mut doc: String, style: &str, policy: InjectionPolicy) -> String {
    let block = style_block(style);

    // A block from a previous pass is rewritten in place, never duplicated.
    if let Some((start, end)) = find_marked_block(&doc) {
        doc.replace_range(start..end, &block);
        return doc;
    }

    if policy == InjectionPolicy::SkipIfStyled && has_author_styles(&doc) {
        return doc;
    }

    if let Some(at) = find_ci(&doc, "</head>") {
        doc.insert_str(at, &format!("{}\n", block));
    }
    doc
}

fn style_block(style: &str) -> String {
    format!("<style {}>{}</style>", STYLE_MARKER, neutralize_style_close(style))
}

fn find_marked_block(doc: &str) -> Option<(usize, usize)> {
    let start = find_ci(doc, &format!("<style {}", STYLE_MARKER))?;
    let close = find_ci(&doc[start..], "</style>")?;
    Some((start, start + close + "</style>".len()))
}

fn has_author_styles(doc: &str) -> bool {
    find_open_tag(doc, "style").is_some() || find_open_tag(doc, "link").is_some()
}

// `</style` inside the style text would end the block early.
fn neutralize_style_close(style: &str) -> String {
    let mut out = String::with_capacity(style.len());
    let mut rest = style;
    while let Some(at) = find_ci(rest, "</style") {
        out.push_str(&rest[..at]);
        out.push_str("<\\/");
        rest = &rest[at + 2..];
    }
    out.push_str(rest);
    out
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Case-insensitive (ASCII) substring search returning a byte offset.
pub(crate) fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    // ASCII lowercasing keeps byte offsets intact.
    haystack
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
}

/// Offset of the first opening tag `<name` that is followed by `>`, `/` or
/// whitespace, so `<head` does not match `<header>`.
pub(crate) fn find_open_tag(doc: &str, name: &str) -> Option<usize> {
    let lower = doc.to_ascii_lowercase();
    let pattern = format!("<{}", name.to_ascii_lowercase());
    let mut from = 0;
    while let Some(rel) = lower[from..].find(&pattern) {
        let at = from + rel;
        let after = lower[at + pattern.len()..].chars().next();
        match after {
            Some(c) if c == '>' || c == '/' || c.is_whitespace() => return Some(at),
            None => return None,
            _ => from = at + pattern.len(),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(hay: &str, needle: &str) -> usize {
        hay.matches(needle).count()
    }

    #[test]
    fn fragment_gets_head_and_body() {
        let doc = assemble("<div>Hi</div>", "body{color:red}");
        let head = doc.find("<head>").unwrap();
        let body = doc.find("<body>").unwrap();
        assert!(head < body);
        assert_eq!(count(&doc, "<style"), 1);
        assert!(doc.contains("<style data-pagesmith>body{color:red}</style>"));
        assert!(doc.contains("<body>\n<div>Hi</div>\n</body>"));
    }

    #[test]
    fn closing_head_match_is_case_insensitive_and_single() {
        let markup = "<HTML><HEAD><title>x</title></HEAD><BODY>a</BODY></HTML><!-- </head> -->";
        let doc = assemble(markup, "p{}");
        assert_eq!(count(&doc, "<style"), 1);
        let style_at = doc.find("<style").unwrap();
        assert!(style_at < doc.find("</HEAD>").unwrap());
        // no synthesized wrappers when the structure is already there
        assert!(!doc.contains("<head>"));
        assert!(!doc.contains("<body>"));
    }

    #[test]
    fn head_is_inserted_before_existing_body() {
        let doc = assemble("<!DOCTYPE html><html><body><p>x</p></body></html>", "");
        let head = doc.find("<head>").unwrap();
        assert!(doc.starts_with("<!DOCTYPE html><html>"));
        assert!(head < doc.find("<body>").unwrap());
    }

    #[test]
    fn header_element_is_not_a_head() {
        let doc = assemble("<header>Top</header>", "h{}");
        assert!(doc.contains("<head>\n<meta charset=\"utf-8\">"));
        assert!(doc.contains("<header>Top</header>"));
    }

    #[test]
    fn reassembly_is_stable_under_both_policies() {
        for policy in [InjectionPolicy::Layer, InjectionPolicy::SkipIfStyled] {
            let asm = Assembler::new(policy);
            for target in [Target::Preview, Target::Export] {
                let once = asm.assemble("<p>Hello</p>", "p{margin:0}", target);
                let twice = asm.assemble(&once, "p{margin:0}", target);
                assert_eq!(once, twice, "{:?}/{:?}", policy, target);
                assert_eq!(count(&twice, "<style"), 1);
                assert_eq!(count(&twice, "<body>"), 1);
                assert_eq!(count(&twice, "<head>"), 1);
            }
        }
    }

    #[test]
    fn policies_disagree_on_author_styles() {
        let markup = "<html><head><link rel=\"stylesheet\" href=\"a.css\"></head><body></body></html>";
        let layered = Assembler::new(InjectionPolicy::Layer).assemble(markup, "b{}", Target::Preview);
        let skipped =
            Assembler::new(InjectionPolicy::SkipIfStyled).assemble(markup, "b{}", Target::Preview);
        assert!(layered.contains("<style data-pagesmith>b{}</style>"));
        assert!(layered.find("<link").unwrap() < layered.find("<style").unwrap());
        assert_eq!(skipped, markup);
    }

    #[test]
    fn export_wraps_bare_fragment_in_skeleton() {
        let doc = assemble_for_export("<h1>Card</h1>", ".c{}");
        assert!(doc.starts_with("<!DOCTYPE html>\n<html lang=\"en\">"));
        assert!(doc.contains("<title>My Webpage</title>"));
        assert!(doc.contains("<body>\n<h1>Card</h1>\n</body>\n</html>"));
        assert_eq!(count(&doc, "<style"), 1);
    }

    #[test]
    fn export_adds_doctype_to_partial_documents() {
        let doc = assemble_for_export("<html><body>x</body></html>", "");
        assert!(doc.starts_with("<!DOCTYPE html>\n<html>"));
        assert_eq!(count(&doc, "<html"), 1);
    }

    #[test]
    fn style_close_tag_cannot_escape_block() {
        let doc = assemble("<p>x</p>", "a{}</STYLE><script>1</script>");
        assert_eq!(count(&doc.to_ascii_lowercase(), "</style>"), 1);
        assert!(doc.contains("<\\/STYLE>"));
    }

    #[test]
    fn find_open_tag_respects_boundaries() {
        assert_eq!(find_open_tag("<bodyx><body>", "body"), Some(7));
        assert_eq!(find_open_tag("<body", "body"), None);
        assert_eq!(find_open_tag("<BODY class=a>", "body"), Some(0));
    }
}
