//! HTML tokenizer
//!
//! Converts HTML text into a stream of tokens. This is a compact
//! tokenizer for transcription-project book HTML, not a full HTML5
//! state machine: tags, quoted and unquoted attribute values, comments,
//! doctypes, entity decoding, and raw text for `script`/`style`.

use smallvec::SmallVec;

use crate::entities::{decode_entity, decode_numeric};
use crate::error::HtmlResult;

/// An HTML token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// DOCTYPE declaration (contents ignored by the tree builder)
    Doctype,
    /// Start tag
    StartTag {
        name: String,
        attributes: SmallVec<[(String, String); 4]>,
        self_closing: bool,
    },
    /// End tag
    EndTag { name: String },
    /// Character data, entities decoded
    Text(String),
    /// Comment
    Comment(String),
    /// End of file
    Eof,
}

/// HTML tokenizer
pub struct Tokenizer {
    input: Vec<char>,
    pos: usize,
    /// Tag whose raw-text content we are inside, if any
    rawtext_tag: Option<String>,
}

impl Tokenizer {
    /// Create a new tokenizer for the given input
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            rawtext_tag: None,
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> HtmlResult<Token> {
        if self.pos >= self.input.len() {
            return Ok(Token::Eof);
        }

        if let Some(tag) = self.rawtext_tag.take() {
            return Ok(self.consume_rawtext(&tag));
        }

        if self.current() == Some('<') {
            return self.consume_markup();
        }

        Ok(self.consume_text())
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn consume(&mut self) -> Option<char> {
        let c = self.current()?;
        self.pos += 1;
        Some(c)
    }

    /// Check if the input continues with a string (case-insensitive)
    fn at_str_ci(&self, s: &str) -> bool {
        let upcoming: String = self.input[self.pos..].iter().take(s.len()).collect();
        upcoming.eq_ignore_ascii_case(s)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.current(), Some(c) if c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Consume character data up to the next tag
    fn consume_text(&mut self) -> Token {
        let mut text = String::new();
        while let Some(c) = self.current() {
            match c {
                '<' => break,
                '&' => {
                    self.pos += 1;
                    text.push_str(&self.consume_entity());
                }
                _ => {
                    text.push(c);
                    self.pos += 1;
                }
            }
        }
        Token::Text(text)
    }

    /// Consume an entity reference after '&'. An unrecognized reference
    /// is emitted literally.
    fn consume_entity(&mut self) -> String {
        let start = self.pos;
        let numeric = self.current() == Some('#');
        if numeric {
            self.pos += 1;
        }

        let mut name = String::new();
        while let Some(c) = self.current() {
            if c.is_ascii_alphanumeric() || (numeric && (c == 'x' || c == 'X')) {
                name.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }

        if self.current() == Some(';') && !name.is_empty() {
            let decoded = if numeric {
                decode_numeric(&name).map(String::from)
            } else {
                decode_entity(&name).map(String::from)
            };
            if let Some(decoded) = decoded {
                self.pos += 1;
                return decoded;
            }
        }

        // Not a reference we know; back out and emit the ampersand
        self.pos = start;
        "&".to_string()
    }

    /// Consume a tag, comment or doctype starting at '<'
    fn consume_markup(&mut self) -> HtmlResult<Token> {
        if self.at_str_ci("<!--") {
            return Ok(self.consume_comment());
        }
        if self.at_str_ci("<!doctype") {
            self.skip_until('>');
            return Ok(Token::Doctype);
        }
        if self.at_str_ci("</") {
            return Ok(self.consume_end_tag());
        }
        match self.peek_at(1) {
            Some(c) if c.is_ascii_alphabetic() => Ok(self.consume_start_tag()),
            _ => {
                // A lone '<' is character data
                self.pos += 1;
                Ok(Token::Text("<".to_string()))
            }
        }
    }

    fn skip_until(&mut self, end: char) {
        while let Some(c) = self.consume() {
            if c == end {
                break;
            }
        }
    }

    fn consume_comment(&mut self) -> Token {
        self.pos += 4; // past "<!--"
        let mut text = String::new();
        while self.pos < self.input.len() {
            if self.at_str_ci("-->") {
                self.pos += 3;
                return Token::Comment(text);
            }
            text.push(self.input[self.pos]);
            self.pos += 1;
        }
        Token::Comment(text) // EOF inside comment
    }

    fn consume_tag_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.current() {
            if c.is_ascii_alphanumeric() || c == '-' || c == ':' {
                name.push(c.to_ascii_lowercase());
                self.pos += 1;
            } else {
                break;
            }
        }
        name
    }

    fn consume_end_tag(&mut self) -> Token {
        self.pos += 2; // past "</"
        let name = self.consume_tag_name();
        self.skip_until('>');
        Token::EndTag { name }
    }

    fn consume_start_tag(&mut self) -> Token {
        self.pos += 1; // past '<'
        let name = self.consume_tag_name();
        let mut attributes: SmallVec<[(String, String); 4]> = SmallVec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            match self.current() {
                None => break,
                Some('>') => {
                    self.pos += 1;
                    break;
                }
                Some('/') => {
                    self.pos += 1;
                    if self.current() == Some('>') {
                        self.pos += 1;
                        self_closing = true;
                        break;
                    }
                }
                Some(_) => {
                    if let Some(attr) = self.consume_attribute() {
                        attributes.push(attr);
                    }
                }
            }
        }

        if !self_closing && is_rawtext_element(&name) {
            self.rawtext_tag = Some(name.clone());
        }

        Token::StartTag { name, attributes, self_closing }
    }

    fn consume_attribute(&mut self) -> Option<(String, String)> {
        let mut name = String::new();
        while let Some(c) = self.current() {
            if c.is_ascii_whitespace() || c == '=' || c == '>' || c == '/' {
                break;
            }
            name.push(c.to_ascii_lowercase());
            self.pos += 1;
        }
        if name.is_empty() {
            // Unparseable character; skip it to make progress
            self.pos += 1;
            return None;
        }

        self.skip_whitespace();
        if self.current() != Some('=') {
            return Some((name, String::new()));
        }
        self.pos += 1;
        self.skip_whitespace();

        let mut value = String::new();
        match self.current() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                while let Some(c) = self.current() {
                    if c == quote {
                        self.pos += 1;
                        break;
                    }
                    if c == '&' {
                        self.pos += 1;
                        value.push_str(&self.consume_entity());
                    } else {
                        value.push(c);
                        self.pos += 1;
                    }
                }
            }
            _ => {
                while let Some(c) = self.current() {
                    if c.is_ascii_whitespace() || c == '>' {
                        break;
                    }
                    value.push(c);
                    self.pos += 1;
                }
            }
        }

        Some((name, value))
    }

    /// Consume raw text until the matching end tag (script, style)
    fn consume_rawtext(&mut self, tag: &str) -> Token {
        let close = format!("</{}", tag);
        let mut text = String::new();
        while self.pos < self.input.len() {
            if self.at_str_ci(&close) {
                break;
            }
            text.push(self.input[self.pos]);
            self.pos += 1;
        }
        Token::Text(text)
    }
}

/// Elements whose content is raw text, never markup
fn is_rawtext_element(name: &str) -> bool {
    matches!(name, "script" | "style")
}
