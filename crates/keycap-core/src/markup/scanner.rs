//! Tokenizer for the label markup vocabulary.
//!
//! The scanner only understands enough HTML syntax to find tags, attributes and comments.
//! Anything that does not form a complete tag is returned as text, so malformed input degrades
//! to literal characters instead of failing.

use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Attr {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token<'a> {
    /// Raw (not yet entity-decoded) character data.
    Text(&'a str),
    StartTag {
        name: String,
        attrs: Vec<Attr>,
        self_closing: bool,
        span: Range<usize>,
    },
    EndTag {
        name: String,
        span: Range<usize>,
    },
}

pub(crate) struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    pub fn source(&self) -> &'a str {
        self.src
    }

    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    /// Returns the byte offset right after the first `</name ...>` at depth zero, counting nested
    /// `<name>` openings. Used to capture raw inline graphic markup.
    pub fn skip_to_matching_end(&mut self, name: &str) -> Option<usize> {
        let mut depth = 0usize;
        while let Some(tok) = self.next() {
            match tok {
                Token::StartTag {
                    name: n,
                    self_closing,
                    ..
                } if n == name && !self_closing => depth += 1,
                Token::EndTag { name: n, span } if n == name => {
                    if depth == 0 {
                        return Some(span.end);
                    }
                    depth -= 1;
                }
                _ => {}
            }
        }
        None
    }

    fn text_until_next_tag_start(&mut self, from: usize) -> Token<'a> {
        let b = self.bytes();
        let mut i = from;
        while i < b.len() && b[i] != b'<' {
            i += 1;
        }
        let start = self.pos;
        self.pos = i;
        Token::Text(&self.src[start..i])
    }

    fn try_comment(&mut self) -> bool {
        let rest = &self.src[self.pos..];
        if let Some(body) = rest.strip_prefix("<!--") {
            self.pos = match body.find("-->") {
                Some(end) => self.pos + 4 + end + 3,
                None => self.src.len(),
            };
            return true;
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            self.pos = match rest.find('>') {
                Some(end) => self.pos + end + 1,
                None => self.src.len(),
            };
            return true;
        }
        false
    }

    fn scan_name(&self, mut i: usize) -> (String, usize) {
        let b = self.bytes();
        let start = i;
        while i < b.len() && (b[i].is_ascii_alphanumeric() || matches!(b[i], b'-' | b':' | b'_'))
        {
            i += 1;
        }
        (self.src[start..i].to_ascii_lowercase(), i)
    }

    fn try_end_tag(&mut self) -> Option<Token<'a>> {
        let b = self.bytes();
        let start = self.pos;
        if b.get(start + 1) != Some(&b'/') || !b.get(start + 2)?.is_ascii_alphabetic() {
            return None;
        }
        let (name, i) = self.scan_name(start + 2);
        let close = self.src[i..].find('>')? + i;
        self.pos = close + 1;
        Some(Token::EndTag {
            name,
            span: start..close + 1,
        })
    }

    fn try_start_tag(&mut self) -> Option<Token<'a>> {
        let b = self.bytes();
        let start = self.pos;
        if !b.get(start + 1)?.is_ascii_alphabetic() {
            return None;
        }
        let (name, mut i) = self.scan_name(start + 1);
        let mut attrs = Vec::new();
        let mut self_closing = false;
        loop {
            while i < b.len() && b[i].is_ascii_whitespace() {
                i += 1;
            }
            match b.get(i)? {
                b'>' => {
                    i += 1;
                    break;
                }
                b'/' => {
                    i += 1;
                    if b.get(i) == Some(&b'>') {
                        self_closing = true;
                        i += 1;
                        break;
                    }
                    continue;
                }
                _ => {}
            }

            let name_start = i;
            while i < b.len() && !b[i].is_ascii_whitespace() && !matches!(b[i], b'=' | b'>' | b'/')
            {
                i += 1;
            }
            let attr_name = self.src[name_start..i].to_ascii_lowercase();
            while i < b.len() && b[i].is_ascii_whitespace() {
                i += 1;
            }

            let mut value = String::new();
            if b.get(i) == Some(&b'=') {
                i += 1;
                while i < b.len() && b[i].is_ascii_whitespace() {
                    i += 1;
                }
                match b.get(i)? {
                    q @ (b'"' | b'\'') => {
                        let q = *q;
                        let vstart = i + 1;
                        let vend = self.src[vstart..].find(q as char)? + vstart;
                        value = crate::entities::decode_entities(&self.src[vstart..vend])
                            .into_owned();
                        i = vend + 1;
                    }
                    _ => {
                        let vstart = i;
                        while i < b.len() && !b[i].is_ascii_whitespace() && b[i] != b'>' {
                            i += 1;
                        }
                        value = crate::entities::decode_entities(&self.src[vstart..i])
                            .into_owned();
                    }
                }
            }
            if !attr_name.is_empty() {
                attrs.push(Attr {
                    name: attr_name,
                    value,
                });
            }
        }
        self.pos = i;
        Some(Token::StartTag {
            name,
            attrs,
            self_closing,
            span: start..i,
        })
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.pos >= self.src.len() {
                return None;
            }
            if self.bytes()[self.pos] != b'<' {
                return Some(self.text_until_next_tag_start(self.pos));
            }
            if self.try_comment() {
                continue;
            }
            if let Some(tok) = self.try_end_tag() {
                return Some(tok);
            }
            if let Some(tok) = self.try_start_tag() {
                return Some(tok);
            }
            // A lone `<` is literal text; continue the run up to the next `<`.
            return Some(self.text_until_next_tag_start(self.pos + 1));
        }
    }
}

pub(crate) fn attr<'v>(attrs: &'v [Attr], name: &str) -> Option<&'v str> {
    attrs
        .iter()
        .find(|a| a.name == name)
        .map(|a| a.value.as_str())
}
