//! Formatting utilities (Markdown → Telegram HTML, long message splitting).

use std::sync::OnceLock;

use regex::{Captures, NoExpand, Regex};

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Tag syntax and bullet glyph the converter emits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkupDialect {
    pub bold_open: String,
    pub bold_close: String,
    pub italic_open: String,
    pub italic_close: String,
    pub bullet: String,
}

impl MarkupDialect {
    /// Telegram HTML parse mode (`<b>`, `<i>`).
    pub fn telegram_html() -> Self {
        Self {
            bold_open: "<b>".to_string(),
            bold_close: "</b>".to_string(),
            italic_open: "<i>".to_string(),
            italic_close: "</i>".to_string(),
            bullet: "•".to_string(),
        }
    }
}

impl Default for MarkupDialect {
    fn default() -> Self {
        Self::telegram_html()
    }
}

/// Converts the emphasis/list subset of Markdown that models emit into the
/// target dialect.
///
/// The three rules are plain non-greedy substitutions applied in order over the
/// whole text: `**bold**`, then `*italic*`, then `- ` / `* ` bullets at the
/// start of a line. Nothing else is interpreted. Unpaired markers stay literal,
/// and `.` never crosses a line break, so emphasis never spans lines.
#[derive(Clone, Debug)]
pub struct MarkupConverter {
    dialect: MarkupDialect,
    bold: Regex,
    italic: Regex,
    bullet: Regex,
}

impl MarkupConverter {
    pub fn new(dialect: MarkupDialect) -> Self {
        Self {
            dialect,
            bold: Regex::new(r"\*\*(.*?)\*\*").expect("valid regex"),
            italic: Regex::new(r"\*(.*?)\*").expect("valid regex"),
            bullet: Regex::new(r"\n[-*] ").expect("valid regex"),
        }
    }

    pub fn dialect(&self) -> &MarkupDialect {
        &self.dialect
    }

    pub fn convert(&self, source: &str) -> String {
        let d = &self.dialect;

        // Bold must run first so `**` is never half-eaten by the italic rule.
        let text = self.bold.replace_all(source, |caps: &Captures| {
            format!("{}{}{}", d.bold_open, &caps[1], d.bold_close)
        });
        let text = self.italic.replace_all(&text, |caps: &Captures| {
            format!("{}{}{}", d.italic_open, &caps[1], d.italic_close)
        });
        let bullet = format!("\n{} ", d.bullet);
        self.bullet
            .replace_all(&text, NoExpand(&bullet))
            .into_owned()
    }
}

impl Default for MarkupConverter {
    fn default() -> Self {
        Self::new(MarkupDialect::default())
    }
}

/// Convert model Markdown to Telegram HTML using the default dialect.
pub fn convert_markdown_to_html(input: &str) -> String {
    static CONVERTER: OnceLock<MarkupConverter> = OnceLock::new();
    CONVERTER.get_or_init(MarkupConverter::default).convert(input)
}

// ============== Message splitting ==============

#[derive(Clone, Copy, Debug)]
enum HtmlToken<'a> {
    Tag(&'a str),
    Text(&'a str),
}

fn tokenize_html(mut s: &str) -> Vec<HtmlToken<'_>> {
    let mut out = Vec::new();
    while !s.is_empty() {
        let Some(start) = s.find('<') else {
            out.push(HtmlToken::Text(s));
            break;
        };
        if start > 0 {
            out.push(HtmlToken::Text(&s[..start]));
            s = &s[start..];
        }

        let Some(end) = s.find('>') else {
            out.push(HtmlToken::Text(s));
            break;
        };
        out.push(HtmlToken::Tag(&s[..=end]));
        s = &s[end + 1..];
    }
    out
}

enum TagKind {
    Open(String),
    Close(String),
    Other,
}

fn classify_tag(tag: &str) -> TagKind {
    let inner = tag.trim_start_matches('<').trim_end_matches('>');
    if inner.ends_with('/') {
        return TagKind::Other;
    }
    let (closing, rest) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    let name: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    match (name.is_empty(), closing) {
        (true, _) => TagKind::Other,
        (false, true) => TagKind::Close(name),
        (false, false) => TagKind::Open(name),
    }
}

struct OpenTag {
    name: String,
    raw: String,
}

impl OpenTag {
    fn close(&self) -> String {
        format!("</{}>", self.name)
    }

    fn close_len(&self) -> usize {
        self.name.len() + 3
    }
}

/// Accumulates chunks; `chunk` always begins with the tags reopened from the
/// previous chunk, and `chunk.len() + close_len()` never exceeds `limit`
/// unless a single tag is longer than the limit itself.
struct ChunkSplitter {
    limit: usize,
    out: Vec<String>,
    chunk: String,
    open: Vec<OpenTag>,
    has_content: bool,
}

impl ChunkSplitter {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            out: Vec::new(),
            chunk: String::new(),
            open: Vec::new(),
            has_content: false,
        }
    }

    fn close_len(&self) -> usize {
        self.open.iter().map(OpenTag::close_len).sum()
    }

    fn room(&self) -> usize {
        self.limit
            .saturating_sub(self.chunk.len() + self.close_len())
    }

    fn flush(&mut self) {
        if self.has_content {
            let mut msg = std::mem::take(&mut self.chunk);
            for t in self.open.iter().rev() {
                msg.push_str(&t.close());
            }
            self.out.push(msg);
        }
        self.chunk = self.open.iter().map(|t| t.raw.as_str()).collect();
        self.has_content = false;
    }

    fn push_tag(&mut self, tag: &str) {
        match classify_tag(tag) {
            TagKind::Open(name) => {
                let t = OpenTag {
                    name,
                    raw: tag.to_string(),
                };
                if tag.len() + t.close_len() > self.room() && self.has_content {
                    self.flush();
                }
                self.chunk.push_str(tag);
                self.open.push(t);
            }
            TagKind::Close(name) => {
                if let Some(pos) = self.open.iter().rposition(|t| t.name == name) {
                    // Space for this close tag was reserved when it was opened.
                    self.chunk.push_str(tag);
                    self.open.truncate(pos);
                    self.has_content = true;
                } else {
                    self.push_atom(tag);
                }
            }
            TagKind::Other => self.push_atom(tag),
        }
    }

    fn push_atom(&mut self, atom: &str) {
        if atom.len() > self.room() && self.has_content {
            self.flush();
        }
        self.chunk.push_str(atom);
        self.has_content = true;
    }

    fn push_text(&mut self, mut text: &str) {
        while !text.is_empty() {
            let room = self.room();
            if text.len() <= room {
                self.chunk.push_str(text);
                self.has_content = true;
                return;
            }

            let cut = text_cut(text, room, self.has_content);
            if cut == 0 {
                if self.has_content {
                    self.flush();
                    continue;
                }
                // Nothing fits next to the reopened tags; take one character to make progress.
                let first = text.chars().next().map(char::len_utf8).unwrap_or(text.len());
                self.chunk.push_str(&text[..first]);
                self.has_content = true;
                text = &text[first..];
                continue;
            }

            self.chunk.push_str(&text[..cut]);
            self.has_content = true;
            text = &text[cut..];
            self.flush();
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.out
    }
}

/// Pick how many bytes of `text` go into a chunk with `room` bytes left.
///
/// Prefers the last line break; when the chunk already has content and no line
/// break fits, returns 0 so the caller starts a fresh chunk first. Never cuts
/// inside a UTF-8 character or an HTML entity.
fn text_cut(text: &str, room: usize, chunk_has_content: bool) -> usize {
    let mut max = room.min(text.len());
    while !text.is_char_boundary(max) {
        max -= 1;
    }
    let head = &text[..max];

    if let Some(nl) = head.rfind('\n') {
        return nl + 1;
    }
    if chunk_has_content {
        return 0;
    }
    if let Some(amp) = head.rfind('&') {
        if amp > 0 && !head[amp..].contains(';') && max - amp < 10 {
            return amp;
        }
    }
    max
}

/// Strip tags and decode the entities `escape_html` produces.
pub fn html_to_plain(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    for token in tokenize_html(html) {
        if let HtmlToken::Text(t) = token {
            out.push_str(t);
        }
    }
    out.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

/// Split an HTML message into chunks of at most `limit` bytes.
///
/// Tags still open at a split point are closed at the end of the chunk and
/// reopened at the start of the next one.
pub fn split_html_chunks(html: &str, limit: usize) -> Vec<String> {
    if html.len() <= limit {
        return vec![html.to_string()];
    }

    let mut splitter = ChunkSplitter::new(limit);
    for token in tokenize_html(html) {
        match token {
            HtmlToken::Tag(t) => splitter.push_tag(t),
            HtmlToken::Text(t) => splitter.push_text(t),
        }
    }
    splitter.finish()
}
