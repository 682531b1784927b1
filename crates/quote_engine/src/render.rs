use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::ElementRef;

/// Elements whose content is never rendered.
const SKIPPED_TAGS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "title", "iframe", "object",
];

/// Elements rendered as blocks separated by a single line break.
const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "body",
    "caption",
    "dd",
    "details",
    "dialog",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "header",
    "hr",
    "html",
    "li",
    "main",
    "nav",
    "ol",
    "pre",
    "section",
    "summary",
    "table",
    "tbody",
    "tfoot",
    "thead",
    "tr",
    "ul",
];

/// Elements rendered with a blank line around them.
const PARAGRAPH_TAGS: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "h6"];

const PREFORMATTED_TAGS: &[&str] = &["pre", "textarea", "listing", "plaintext"];

/// Approximates the browser's rendered text (`innerText`) of an element.
///
/// Whitespace runs collapse to one space, block elements start new lines,
/// paragraphs and headings are separated by a blank line, and preformatted
/// content is kept verbatim. Leading and trailing breaks are dropped.
pub fn rendered_text(element: ElementRef<'_>) -> String {
    let mut ctx = RenderContext::default();
    for child in element.children() {
        visit_node(child, &mut ctx, false);
    }
    ctx.finish()
}

fn visit_node(node: NodeRef<'_, Node>, ctx: &mut RenderContext, preformatted: bool) {
    match node.value() {
        Node::Text(text) => ctx.push_text(text, preformatted),
        Node::Element(_) => {
            if let Some(element) = ElementRef::wrap(node) {
                visit_element(element, ctx, preformatted);
            }
        }
        Node::Comment(_) | Node::Doctype(_) | Node::ProcessingInstruction(_) => {}
        _ => {
            for child in node.children() {
                visit_node(child, ctx, preformatted);
            }
        }
    }
}

fn visit_element(element: ElementRef<'_>, ctx: &mut RenderContext, preformatted: bool) {
    let tag = element.value().name().to_ascii_lowercase();
    let tag = tag.as_str();
    if SKIPPED_TAGS.contains(&tag) || element.value().attr("hidden").is_some() {
        return;
    }
    if tag == "br" {
        ctx.line_break();
        return;
    }

    let breaks = if PARAGRAPH_TAGS.contains(&tag) {
        2
    } else if BLOCK_TAGS.contains(&tag) {
        1
    } else {
        0
    };
    if breaks > 0 {
        ctx.require_breaks(breaks);
    }
    if matches!(tag, "td" | "th") {
        ctx.separate();
    }

    let preformatted = preformatted || PREFORMATTED_TAGS.contains(&tag);
    for child in element.children() {
        visit_node(child, ctx, preformatted);
    }

    if breaks > 0 {
        ctx.require_breaks(breaks);
    }
}

#[derive(Debug, Default)]
struct RenderContext {
    out: String,
    line_has_text: bool,
    pending_space: bool,
    pending_breaks: usize,
}

impl RenderContext {
    fn push_text(&mut self, text: &str, preformatted: bool) {
        for ch in text.chars() {
            if preformatted {
                if ch == '\n' {
                    self.line_break();
                } else {
                    self.push_char(ch);
                }
            } else if ch.is_whitespace() {
                if self.line_has_text {
                    self.pending_space = true;
                }
            } else {
                self.push_char(ch);
            }
        }
    }

    fn push_char(&mut self, ch: char) {
        if self.pending_breaks > 0 {
            if !self.out.is_empty() {
                for _ in 0..self.pending_breaks {
                    self.out.push('\n');
                }
            }
            self.pending_breaks = 0;
        } else if self.pending_space {
            self.out.push(' ');
        }
        self.pending_space = false;
        self.out.push(ch);
        self.line_has_text = true;
    }

    /// Block boundary: at least `count` line breaks before the next text.
    fn require_breaks(&mut self, count: usize) {
        self.pending_space = false;
        self.line_has_text = false;
        self.pending_breaks = self.pending_breaks.max(count);
    }

    /// Forced break (`<br>` or a newline in preformatted text).
    fn line_break(&mut self) {
        self.pending_space = false;
        self.line_has_text = false;
        self.pending_breaks += 1;
    }

    /// Table cells on the same row are separated by a space.
    fn separate(&mut self) {
        if self.line_has_text {
            self.pending_space = true;
        }
    }

    fn finish(self) -> String {
        self.out
    }
}
