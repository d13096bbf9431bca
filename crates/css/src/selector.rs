//! Selector parser
//!
//! Parses the closed selector vocabulary of the transformation dialect:
//! type, `*`, `.class`, `#id`, attribute selectors, the `:before` /
//! `:after` pseudo-elements (single- or double-colon), and the four
//! standard combinators. There is no specificity; rule order decides.

use crate::error::{CssError, CssResult, SourceLocation};
use crate::tokenizer::{Token, Tokenizer};

/// A compound selector: simple-selector steps joined by combinators
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    /// The simple selectors and combinators that make up this selector
    pub parts: Vec<SelectorPart>,
}

/// A part of a compound selector
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorPart {
    /// Universal selector (*)
    Universal,
    /// Type selector (e.g. div, span)
    Type(String),
    /// Class selector (e.g. .pagenum)
    Class(String),
    /// ID selector (e.g. #main)
    Id(String),
    /// Attribute selector (e.g. [class^="pagenum"])
    Attribute {
        name: String,
        op: Option<AttributeOp>,
        value: Option<String>,
    },
    /// Pseudo-element selecting the content insertion slot
    PseudoElement(PseudoElement),
    /// Combinator between compound selectors
    Combinator(Combinator),
}

/// Attribute selector operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOp {
    /// [attr=value] - exact match
    Equals,
    /// [attr^=value] - starts with
    PrefixMatch,
    /// [attr$=value] - ends with
    SuffixMatch,
    /// [attr*=value] - contains
    SubstringMatch,
}

/// Selector combinators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Descendant combinator (space)
    Descendant,
    /// Child combinator (>)
    Child,
    /// Next sibling combinator (+)
    NextSibling,
    /// Subsequent sibling combinator (~)
    SubsequentSibling,
}

/// The two recognized pseudo-elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoElement {
    Before,
    After,
}

impl Selector {
    /// Parse a selector string
    pub fn parse(input: &str) -> CssResult<Self> {
        let mut parser = SelectorParser::new(input);
        parser.parse_selector()
    }

    /// Parse a comma-separated list of selectors
    pub fn parse_list(input: &str) -> CssResult<Vec<Self>> {
        let mut parser = SelectorParser::new(input);
        parser.parse_selector_list()
    }

    /// The pseudo-element of this selector, if any. The parser
    /// guarantees it is the final part.
    pub fn pseudo_element(&self) -> Option<PseudoElement> {
        match self.parts.last() {
            Some(SelectorPart::PseudoElement(pe)) => Some(*pe),
            _ => None,
        }
    }
}

/// Selector parser
struct SelectorParser<'a> {
    tokenizer: Tokenizer<'a>,
    current: Option<Token>,
}

impl<'a> SelectorParser<'a> {
    fn new(input: &'a str) -> Self {
        let mut tokenizer = Tokenizer::new(input);
        let current = tokenizer.next_token().ok();
        Self { tokenizer, current }
    }

    fn location(&self) -> SourceLocation {
        self.tokenizer.location()
    }

    fn advance(&mut self) -> CssResult<Option<Token>> {
        let prev = self.current.take();
        self.current = self.tokenizer.next_token().ok();
        Ok(prev)
    }

    fn peek(&self) -> Option<&Token> {
        self.current.as_ref()
    }

    fn skip_whitespace(&mut self) -> CssResult<()> {
        while let Some(Token::Whitespace) = self.peek() {
            self.advance()?;
        }
        Ok(())
    }

    fn parse_selector_list(&mut self) -> CssResult<Vec<Selector>> {
        let mut selectors = Vec::new();

        loop {
            self.skip_whitespace()?;

            if matches!(self.peek(), None | Some(Token::Eof)) {
                break;
            }

            selectors.push(self.parse_selector()?);

            self.skip_whitespace()?;

            match self.peek() {
                Some(Token::Comma) => {
                    self.advance()?;
                }
                _ => break,
            }
        }

        Ok(selectors)
    }

    fn parse_selector(&mut self) -> CssResult<Selector> {
        let mut parts = Vec::new();
        let mut saw_simple_selector = false;
        let mut saw_pseudo = false;

        loop {
            // Track if there's whitespace before the next token
            let had_whitespace = matches!(self.peek(), Some(Token::Whitespace));
            self.skip_whitespace()?;

            match self.peek() {
                None | Some(Token::Eof) | Some(Token::Comma) | Some(Token::LeftBrace) => break,
                _ => {}
            }

            // Check for explicit combinator (>, +, ~)
            if let Some(comb) = self.try_parse_combinator()? {
                if saw_simple_selector {
                    if saw_pseudo {
                        return Err(CssError::InvalidSelector {
                            selector: "pseudo-element must be last".to_string(),
                            location: self.location(),
                        });
                    }
                    parts.push(SelectorPart::Combinator(comb));
                    saw_simple_selector = false;
                    continue;
                }
            } else if saw_simple_selector && had_whitespace {
                // Whitespace between compound selectors = descendant combinator
                if saw_pseudo {
                    return Err(CssError::InvalidSelector {
                        selector: "pseudo-element must be last".to_string(),
                        location: self.location(),
                    });
                }
                parts.push(SelectorPart::Combinator(Combinator::Descendant));
                saw_simple_selector = false;
            }

            // Parse simple selector
            if let Some(part) = self.try_parse_simple_selector()? {
                if saw_pseudo {
                    return Err(CssError::InvalidSelector {
                        selector: "pseudo-element must be last".to_string(),
                        location: self.location(),
                    });
                }
                saw_pseudo = matches!(part, SelectorPart::PseudoElement(_));
                parts.push(part);
                saw_simple_selector = true;
            } else {
                break;
            }
        }

        if parts.is_empty() || matches!(parts.last(), Some(SelectorPart::Combinator(_))) {
            return Err(CssError::InvalidSelector {
                selector: String::new(),
                location: self.location(),
            });
        }

        Ok(Selector { parts })
    }

    fn try_parse_combinator(&mut self) -> CssResult<Option<Combinator>> {
        match self.peek() {
            Some(Token::Delim('>')) => {
                self.advance()?;
                Ok(Some(Combinator::Child))
            }
            Some(Token::Delim('+')) => {
                self.advance()?;
                Ok(Some(Combinator::NextSibling))
            }
            Some(Token::Delim('~')) => {
                self.advance()?;
                Ok(Some(Combinator::SubsequentSibling))
            }
            _ => Ok(None),
        }
    }

    fn try_parse_simple_selector(&mut self) -> CssResult<Option<SelectorPart>> {
        match self.peek().cloned() {
            Some(Token::Delim('*')) => {
                self.advance()?;
                Ok(Some(SelectorPart::Universal))
            }
            Some(Token::Ident(name)) => {
                self.advance()?;
                Ok(Some(SelectorPart::Type(name.to_ascii_lowercase())))
            }
            Some(Token::Hash(name)) => {
                self.advance()?;
                Ok(Some(SelectorPart::Id(name)))
            }
            Some(Token::Delim('.')) => {
                self.advance()?;
                if let Some(Token::Ident(name)) = self.advance()? {
                    Ok(Some(SelectorPart::Class(name)))
                } else {
                    Err(CssError::InvalidSelector {
                        selector: ".".to_string(),
                        location: self.location(),
                    })
                }
            }
            Some(Token::LeftBracket) => self.parse_attribute_selector().map(Some),
            Some(Token::Colon) => self.parse_pseudo_element().map(Some),
            _ => Ok(None),
        }
    }

    fn parse_attribute_selector(&mut self) -> CssResult<SelectorPart> {
        self.advance()?; // consume '['
        self.skip_whitespace()?;

        let name = match self.advance()? {
            Some(Token::Ident(name)) => name,
            _ => {
                return Err(CssError::InvalidSelector {
                    selector: "[".to_string(),
                    location: self.location(),
                })
            }
        };

        self.skip_whitespace()?;

        let op = match self.peek() {
            Some(Token::Delim('=')) => {
                self.advance()?;
                Some(AttributeOp::Equals)
            }
            Some(&Token::Delim(c @ ('^' | '$' | '*'))) => {
                let op = match c {
                    '^' => AttributeOp::PrefixMatch,
                    '$' => AttributeOp::SuffixMatch,
                    _ => AttributeOp::SubstringMatch,
                };
                self.advance()?;
                if !matches!(self.peek(), Some(Token::Delim('='))) {
                    return Err(CssError::InvalidSelector {
                        selector: format!("[{}{}", name, c),
                        location: self.location(),
                    });
                }
                self.advance()?;
                Some(op)
            }
            _ => None,
        };

        self.skip_whitespace()?;

        let value = if op.is_some() {
            match self.advance()? {
                Some(Token::Ident(v)) => Some(v),
                Some(Token::String(v)) => Some(v),
                Some(Token::Number(v)) => Some(v),
                _ => {
                    return Err(CssError::InvalidSelector {
                        selector: format!("[{}=", name),
                        location: self.location(),
                    })
                }
            }
        } else {
            None
        };

        self.skip_whitespace()?;

        match self.advance()? {
            Some(Token::RightBracket) => {}
            _ => {
                return Err(CssError::InvalidSelector {
                    selector: format!("[{}", name),
                    location: self.location(),
                })
            }
        }

        Ok(SelectorPart::Attribute { name, op, value })
    }

    fn parse_pseudo_element(&mut self) -> CssResult<SelectorPart> {
        self.advance()?; // consume first ':'

        // Accept the legacy single-colon and the double-colon form
        if matches!(self.peek(), Some(Token::Colon)) {
            self.advance()?;
        }

        let name = match self.advance()? {
            Some(Token::Ident(name)) => name.to_ascii_lowercase(),
            _ => {
                return Err(CssError::InvalidSelector {
                    selector: ":".to_string(),
                    location: self.location(),
                })
            }
        };

        match name.as_str() {
            "before" => Ok(SelectorPart::PseudoElement(PseudoElement::Before)),
            "after" => Ok(SelectorPart::PseudoElement(PseudoElement::After)),
            _ => Err(CssError::InvalidSelector {
                selector: format!(":{}", name),
                location: self.location(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_selector() {
        let sel = Selector::parse("div").unwrap();
        assert_eq!(sel.parts.len(), 1);
        assert!(matches!(&sel.parts[0], SelectorPart::Type(t) if t == "div"));
    }

    #[test]
    fn test_class_selector() {
        let sel = Selector::parse(".pagenum").unwrap();
        assert!(matches!(&sel.parts[0], SelectorPart::Class(c) if c == "pagenum"));
    }

    #[test]
    fn test_id_selector() {
        let sel = Selector::parse("#main").unwrap();
        assert!(matches!(&sel.parts[0], SelectorPart::Id(id) if id == "main"));
    }

    #[test]
    fn test_universal_selector() {
        let sel = Selector::parse("*").unwrap();
        assert!(matches!(sel.parts[0], SelectorPart::Universal));
    }

    #[test]
    fn test_compound_selector() {
        let sel = Selector::parse("div.fig#main").unwrap();
        assert_eq!(sel.parts.len(), 3);
        assert!(matches!(&sel.parts[0], SelectorPart::Type(t) if t == "div"));
        assert!(matches!(&sel.parts[1], SelectorPart::Class(c) if c == "fig"));
        assert!(matches!(&sel.parts[2], SelectorPart::Id(id) if id == "main"));
    }

    #[test]
    fn test_descendant_combinator() {
        let sel = Selector::parse("div p").unwrap();
        assert_eq!(sel.parts.len(), 3);
        assert!(matches!(sel.parts[1], SelectorPart::Combinator(Combinator::Descendant)));
    }

    #[test]
    fn test_child_combinator() {
        let sel = Selector::parse("div > p").unwrap();
        assert!(matches!(sel.parts[1], SelectorPart::Combinator(Combinator::Child)));
    }

    #[test]
    fn test_sibling_combinators() {
        let sel = Selector::parse("h1 + p").unwrap();
        assert!(matches!(sel.parts[1], SelectorPart::Combinator(Combinator::NextSibling)));

        let sel = Selector::parse("h1 ~ p").unwrap();
        assert!(matches!(sel.parts[1], SelectorPart::Combinator(Combinator::SubsequentSibling)));
    }

    #[test]
    fn test_attribute_selector_exists() {
        let sel = Selector::parse("[lang]").unwrap();
        assert!(matches!(&sel.parts[0], SelectorPart::Attribute { name, op: None, .. } if name == "lang"));
    }

    #[test]
    fn test_attribute_selector_equals_bare_ident() {
        let sel = Selector::parse("*[lang=grc]").unwrap();
        assert!(matches!(
            &sel.parts[1],
            SelectorPart::Attribute { name, op: Some(AttributeOp::Equals), value: Some(v) }
            if name == "lang" && v == "grc"
        ));
    }

    #[test]
    fn test_attribute_selector_prefix() {
        let sel = Selector::parse("span[class^=\"pagenum\"]").unwrap();
        assert!(matches!(
            &sel.parts[1],
            SelectorPart::Attribute { op: Some(AttributeOp::PrefixMatch), value: Some(v), .. }
            if v == "pagenum"
        ));
    }

    #[test]
    fn test_attribute_selector_suffix_substring() {
        let sel = Selector::parse("[href$=htm]").unwrap();
        assert!(matches!(&sel.parts[0], SelectorPart::Attribute { op: Some(AttributeOp::SuffixMatch), .. }));

        let sel = Selector::parse("[class*=note]").unwrap();
        assert!(matches!(&sel.parts[0], SelectorPart::Attribute { op: Some(AttributeOp::SubstringMatch), .. }));
    }

    #[test]
    fn test_pseudo_element_double_colon() {
        let sel = Selector::parse("i::before").unwrap();
        assert_eq!(sel.pseudo_element(), Some(PseudoElement::Before));
    }

    #[test]
    fn test_pseudo_element_legacy_colon() {
        let sel = Selector::parse("i:after").unwrap();
        assert_eq!(sel.pseudo_element(), Some(PseudoElement::After));
    }

    #[test]
    fn test_pseudo_class_rejected() {
        assert!(Selector::parse("li:first-child").is_err());
        assert!(Selector::parse("a:hover").is_err());
    }

    #[test]
    fn test_pseudo_element_must_be_last() {
        assert!(Selector::parse("i:before b").is_err());
        assert!(Selector::parse("i:before > b").is_err());
    }

    #[test]
    fn test_selector_list() {
        let selectors = Selector::parse_list("i:before, i:after, cite:before").unwrap();
        assert_eq!(selectors.len(), 3);
        assert_eq!(selectors[0].pseudo_element(), Some(PseudoElement::Before));
        assert_eq!(selectors[1].pseudo_element(), Some(PseudoElement::After));
    }

    #[test]
    fn test_unsupported_attribute_ops_rejected() {
        assert!(Selector::parse("[rel~=next]").is_err());
        assert!(Selector::parse("[lang|=en]").is_err());
    }
}
