//! Stylesheet parser
//!
//! Parses the transformation dialect into an ordered list of rules.
//! A malformed rule is dropped and recorded as a warning; parsing
//! always continues with the next rule.

use log::warn;

use crate::error::SourceLocation;
use crate::selector::Selector;
use crate::tokenizer::{Token, Tokenizer};

/// A parsed stylesheet: ordered rules plus the warnings produced while
/// parsing. Rule order is significant; later rules observe the tree as
/// mutated by earlier ones.
#[derive(Debug, Default)]
pub struct Stylesheet {
    /// All rules, in source order
    pub rules: Vec<Rule>,
    /// Rules dropped during parsing
    pub warnings: Vec<CssWarning>,
}

/// A recorded parse problem (the offending rule was skipped)
#[derive(Debug, Clone)]
pub struct CssWarning {
    pub location: SourceLocation,
    pub message: String,
}

/// A style rule: selector list sharing a declaration block
#[derive(Debug)]
pub struct Rule {
    /// Selectors for this rule
    pub selectors: Vec<Selector>,
    /// Declarations, in source order
    pub declarations: Vec<Declaration>,
}

/// A declaration: property name plus one or more values
#[derive(Debug, Clone)]
pub struct Declaration {
    /// Property name (lowercase). Interpretation happens in the
    /// transform engine; unknown names are reported there.
    pub property: String,
    /// Value list
    pub values: Vec<Value>,
    /// Where the declaration started
    pub location: SourceLocation,
}

/// A declaration value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Quoted string, escapes already decoded
    Str(String),
    /// Bare identifier (e.g. `none`, `uppercase`, `parent`, `content`)
    Ident(String),
    /// `attr(NAME)` function form
    Attr(String),
}

impl Stylesheet {
    /// Parse a stylesheet. Never fails as a whole: bad rules become
    /// warnings.
    pub fn parse(input: &str) -> Self {
        let mut parser = CssParser::new(input);
        parser.parse_stylesheet()
    }

    /// Create a new empty stylesheet
    pub fn new() -> Self {
        Self::default()
    }
}

/// Stylesheet parser
struct CssParser<'a> {
    tokenizer: Tokenizer<'a>,
    current: Option<Token>,
    warnings: Vec<CssWarning>,
}

impl<'a> CssParser<'a> {
    fn new(input: &'a str) -> Self {
        let mut tokenizer = Tokenizer::new(input);
        let current = tokenizer.next_token().ok();
        Self {
            tokenizer,
            current,
            warnings: Vec::new(),
        }
    }

    fn location(&self) -> SourceLocation {
        self.tokenizer.location()
    }

    fn advance(&mut self) -> Option<Token> {
        let prev = self.current.take();
        self.current = self.tokenizer.next_token().ok();
        prev
    }

    fn peek(&self) -> Option<&Token> {
        self.current.as_ref()
    }

    fn skip_whitespace(&mut self) {
        while let Some(Token::Whitespace) = self.peek() {
            self.advance();
        }
    }

    fn record_warning(&mut self, location: SourceLocation, message: impl Into<String>) {
        let message = message.into();
        warn!("stylesheet {}: {}", location, message);
        self.warnings.push(CssWarning { location, message });
    }

    fn parse_stylesheet(&mut self) -> Stylesheet {
        let mut rules = Vec::new();

        loop {
            self.skip_whitespace();

            match self.peek() {
                None | Some(Token::Eof) => break,
                Some(Token::AtKeyword(name)) => {
                    let name = name.clone();
                    let location = self.location();
                    self.record_warning(location, format!("at-rule @{} is not supported", name));
                    self.advance();
                    self.skip_until_semicolon_or_block();
                }
                _ => {
                    if let Some(rule) = self.parse_style_rule() {
                        rules.push(rule);
                    }
                }
            }
        }

        Stylesheet {
            rules,
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    /// Parse one `selector-list { declarations }` rule. Returns None
    /// when the rule was malformed (warning recorded, input skipped past
    /// the rule).
    fn parse_style_rule(&mut self) -> Option<Rule> {
        let rule_start = self.location();
        let selector_text = self.collect_until_brace();

        if selector_text.is_empty() {
            // Stray tokens before a block; skip the block if present
            self.skip_block();
            return None;
        }

        let selectors = match Selector::parse_list(&selector_text) {
            Ok(selectors) if !selectors.is_empty() => selectors,
            Ok(_) => {
                self.record_warning(rule_start, "empty selector list");
                self.skip_block();
                return None;
            }
            Err(err) => {
                self.record_warning(rule_start, format!("{}", err));
                self.skip_block();
                return None;
            }
        };

        if !matches!(self.peek(), Some(Token::LeftBrace)) {
            self.record_warning(rule_start, "expected '{' after selector list");
            return None;
        }
        self.advance();

        match self.parse_declaration_block() {
            Some(declarations) => Some(Rule { selectors, declarations }),
            None => {
                self.record_warning(rule_start, "malformed declaration block, rule dropped");
                None
            }
        }
    }

    /// Parse the inside of a `{ }` block. Returns None when any
    /// declaration is malformed (the block is still consumed).
    fn parse_declaration_block(&mut self) -> Option<Vec<Declaration>> {
        let mut declarations = Vec::new();
        let mut ok = true;

        loop {
            self.skip_whitespace();

            match self.peek() {
                None | Some(Token::Eof) | Some(Token::RightBrace) => break,
                Some(Token::Semicolon) => {
                    self.advance();
                }
                _ => match self.parse_declaration() {
                    Some(decl) => declarations.push(decl),
                    None => {
                        ok = false;
                        self.skip_until_semicolon_or_brace();
                    }
                },
            }
        }

        // Consume '}'
        if matches!(self.peek(), Some(Token::RightBrace)) {
            self.advance();
        }

        ok.then_some(declarations)
    }

    fn parse_declaration(&mut self) -> Option<Declaration> {
        self.skip_whitespace();
        let location = self.location();

        let property = match self.peek().cloned() {
            Some(Token::Ident(name)) => {
                self.advance();
                name.to_ascii_lowercase()
            }
            _ => return None,
        };

        self.skip_whitespace();

        if !matches!(self.peek(), Some(Token::Colon)) {
            return None;
        }
        self.advance();

        let values = self.parse_value_list()?;
        if values.is_empty() {
            return None;
        }

        // Consume semicolon if present
        self.skip_whitespace();
        if matches!(self.peek(), Some(Token::Semicolon)) {
            self.advance();
        }

        Some(Declaration { property, values, location })
    }

    /// Parse values until ';' or '}'. Returns None on a token the
    /// dialect has no use for.
    fn parse_value_list(&mut self) -> Option<Vec<Value>> {
        let mut values = Vec::new();

        loop {
            self.skip_whitespace();

            match self.peek().cloned() {
                None | Some(Token::Eof) | Some(Token::Semicolon) | Some(Token::RightBrace) => break,
                Some(Token::String(s)) => {
                    self.advance();
                    values.push(Value::Str(s));
                }
                Some(Token::Ident(s)) => {
                    self.advance();
                    values.push(Value::Ident(s));
                }
                Some(Token::Number(s)) => {
                    self.advance();
                    values.push(Value::Ident(s));
                }
                Some(Token::Function(name)) if name.eq_ignore_ascii_case("attr") => {
                    self.advance();
                    self.skip_whitespace();
                    let attr = match self.advance() {
                        Some(Token::Ident(attr)) => attr,
                        _ => return None,
                    };
                    self.skip_whitespace();
                    if !matches!(self.peek(), Some(Token::RightParen)) {
                        return None;
                    }
                    self.advance();
                    values.push(Value::Attr(attr));
                }
                _ => return None,
            }
        }

        Some(values)
    }

    /// Collect tokens until a left brace, returning their text form
    fn collect_until_brace(&mut self) -> String {
        let mut text = String::new();

        loop {
            match self.peek() {
                None | Some(Token::Eof) | Some(Token::LeftBrace) => break,
                _ => {
                    if let Some(token) = self.advance() {
                        text.push_str(&token_to_string(&token));
                    }
                }
            }
        }

        text.trim().to_string()
    }

    /// Skip a brace-delimited block if one follows
    fn skip_block(&mut self) {
        if !matches!(self.peek(), Some(Token::LeftBrace)) {
            return;
        }
        let mut depth = 0usize;
        loop {
            match self.advance() {
                None | Some(Token::Eof) => break,
                Some(Token::LeftBrace) => depth += 1,
                Some(Token::RightBrace) => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    /// Skip tokens until past a semicolon, or to a brace
    fn skip_until_semicolon_or_brace(&mut self) {
        loop {
            match self.peek() {
                None | Some(Token::Eof) | Some(Token::RightBrace) => break,
                Some(Token::Semicolon) => {
                    self.advance();
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skip tokens until past a semicolon or a balanced block
    fn skip_until_semicolon_or_block(&mut self) {
        loop {
            match self.peek() {
                None | Some(Token::Eof) => break,
                Some(Token::Semicolon) => {
                    self.advance();
                    break;
                }
                Some(Token::LeftBrace) => {
                    self.skip_block();
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}

/// Convert a token back to text (for collecting selector text)
fn token_to_string(token: &Token) -> String {
    match token {
        Token::Ident(s) => s.clone(),
        Token::Function(s) => format!("{}(", s),
        Token::AtKeyword(s) => format!("@{}", s),
        Token::Hash(s) => format!("#{}", s),
        Token::String(s) => format!("\"{}\"", s),
        Token::Number(s) => s.clone(),
        Token::Whitespace => " ".to_string(),
        Token::Colon => ":".to_string(),
        Token::Semicolon => ";".to_string(),
        Token::Comma => ",".to_string(),
        Token::LeftBracket => "[".to_string(),
        Token::RightBracket => "]".to_string(),
        Token::LeftParen => "(".to_string(),
        Token::RightParen => ")".to_string(),
        Token::LeftBrace => "{".to_string(),
        Token::RightBrace => "}".to_string(),
        Token::Delim(c) => c.to_string(),
        Token::Eof => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::PseudoElement;

    #[test]
    fn test_simple_rule() {
        let sheet = Stylesheet::parse("span[class^=\"pagenum\"] { display: none; }");
        assert!(sheet.warnings.is_empty());
        assert_eq!(sheet.rules.len(), 1);
        let rule = &sheet.rules[0];
        assert_eq!(rule.selectors.len(), 1);
        assert_eq!(rule.declarations.len(), 1);
        assert_eq!(rule.declarations[0].property, "display");
        assert_eq!(rule.declarations[0].values, vec![Value::Ident("none".to_string())]);
    }

    #[test]
    fn test_multiple_selectors_share_block() {
        let sheet = Stylesheet::parse("i:before, i:after, em:before, em:after { content: \"_\"; }");
        assert_eq!(sheet.rules.len(), 1);
        let rule = &sheet.rules[0];
        assert_eq!(rule.selectors.len(), 4);
        assert_eq!(rule.selectors[0].pseudo_element(), Some(PseudoElement::Before));
        assert_eq!(rule.declarations[0].values, vec![Value::Str("_".to_string())]);
    }

    #[test]
    fn test_multiple_declarations() {
        let sheet = Stylesheet::parse(".smcap { text-transform: uppercase; text-replace: \"a\" \"b\"; }");
        let rule = &sheet.rules[0];
        assert_eq!(rule.declarations.len(), 2);
        assert_eq!(rule.declarations[0].property, "text-transform");
        assert_eq!(rule.declarations[1].property, "text-replace");
        assert_eq!(
            rule.declarations[1].values,
            vec![Value::Str("a".to_string()), Value::Str("b".to_string())]
        );
    }

    #[test]
    fn test_attr_value() {
        let sheet = Stylesheet::parse("*[lang=grc] { content: \"+\" attr(title) \"+\"; }");
        let rule = &sheet.rules[0];
        assert_eq!(
            rule.declarations[0].values,
            vec![
                Value::Str("+".to_string()),
                Value::Attr("title".to_string()),
                Value::Str("+".to_string()),
            ]
        );
    }

    #[test]
    fn test_graft_path_values() {
        let sheet = Stylesheet::parse(".fn { _graft: parent next-sib; }");
        let rule = &sheet.rules[0];
        assert_eq!(rule.declarations[0].property, "_graft");
        assert_eq!(
            rule.declarations[0].values,
            vec![Value::Ident("parent".to_string()), Value::Ident("next-sib".to_string())]
        );
    }

    #[test]
    fn test_bad_rule_dropped_parsing_continues() {
        let sheet = Stylesheet::parse("p:hover { display: none; } b { content: \"=\"; }");
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.warnings.len(), 1);
        assert!(matches!(&sheet.rules[0].selectors[0].parts[0],
            crate::selector::SelectorPart::Type(t) if t == "b"));
    }

    #[test]
    fn test_at_rule_skipped_with_warning() {
        let sheet = Stylesheet::parse("@media screen { p { display: none; } } i { content: \"_\"; }");
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.warnings.len(), 1);
    }

    #[test]
    fn test_comment_ignored() {
        let sheet = Stylesheet::parse("/* italics */ i:before { content: \"_\"; }");
        assert_eq!(sheet.rules.len(), 1);
        assert!(sheet.warnings.is_empty());
    }

    #[test]
    fn test_missing_semicolon_on_last_declaration() {
        let sheet = Stylesheet::parse("sup:before { content: \"^{\" }");
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].declarations[0].values, vec![Value::Str("^{".to_string())]);
    }

    #[test]
    fn test_empty_stylesheet() {
        let sheet = Stylesheet::parse("   ");
        assert!(sheet.rules.is_empty());
        assert!(sheet.warnings.is_empty());
    }

    #[test]
    fn test_unicode_escape_in_content() {
        let sheet = Stylesheet::parse(r#".nbsp:before { content: "\u00a0"; }"#);
        assert_eq!(
            sheet.rules[0].declarations[0].values,
            vec![Value::Str("\u{00a0}".to_string())]
        );
    }
}
