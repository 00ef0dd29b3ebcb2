//! Minimal indenting XML writer
//!
//! Output is built by hand so that documents are byte-for-byte reproducible:
//! fixed attribute order, two-space indentation and `\n` line endings.

/// Escape `&`, `<`, `>` and `"` for use in text and attribute values
pub fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Format a coordinate with at least one fractional digit (`41` becomes `41.0`)
pub fn fmt_coord(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}

pub(crate) struct XmlWriter {
    buf: String,
    depth: usize,
}

impl XmlWriter {
    /// Start a document with the UTF-8 XML declaration
    pub(crate) fn new() -> Self {
        Self {
            buf: String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"),
            depth: 0,
        }
    }

    pub(crate) fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.start_line();
        self.buf.push('<');
        self.buf.push_str(tag);
        self.push_attrs(attrs);
        self.buf.push_str(">\n");
        self.depth += 1;
    }

    pub(crate) fn close(&mut self, tag: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.start_line();
        self.buf.push_str("</");
        self.buf.push_str(tag);
        self.buf.push_str(">\n");
    }

    /// `<tag attrs/>`
    pub(crate) fn empty(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.start_line();
        self.buf.push('<');
        self.buf.push_str(tag);
        self.push_attrs(attrs);
        self.buf.push_str("/>\n");
    }

    /// `<tag>text</tag>` with `text` escaped
    pub(crate) fn text(&mut self, tag: &str, text: &str) {
        self.raw_text(tag, &xml_escape(text));
    }

    /// `<tag>text</tag>` for content that needs no escaping
    pub(crate) fn raw_text(&mut self, tag: &str, text: &str) {
        self.start_line();
        self.buf.push('<');
        self.buf.push_str(tag);
        self.buf.push('>');
        self.buf.push_str(text);
        self.buf.push_str("</");
        self.buf.push_str(tag);
        self.buf.push_str(">\n");
    }

    pub(crate) fn finish(self) -> String {
        self.buf
    }

    fn start_line(&mut self) {
        for _ in 0..self.depth {
            self.buf.push_str("  ");
        }
    }

    fn push_attrs(&mut self, attrs: &[(&str, &str)]) {
        for (name, value) in attrs {
            self.buf.push(' ');
            self.buf.push_str(name);
            self.buf.push_str("=\"");
            self.buf.push_str(&xml_escape(value));
            self.buf.push('"');
        }
    }
}
