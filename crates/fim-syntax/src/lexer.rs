use crate::types::SINGULAR;

use fim_common::types::{line_col, Span};
use once_cell::sync::Lazy;
use regex::Regex;

use std::cmp::Reverse;
use std::fmt::{self, Display, Formatter};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TokenKind {
    // Literals.
    Char,
    False,
    Name,
    Null,
    Number,
    String,
    True,

    // Keywords.
    Access,
    Addition,
    And,
    Array,
    Assign,
    Case,
    Comment,
    Const,
    Decrement,
    Default,
    Division,
    DoWhile,
    Else,
    EndLoop,
    Equal,
    For,
    GreaterThan,
    GreaterThanOrEqual,
    If,
    Import,
    Increment,
    Iter,
    LessThan,
    LessThanOrEqual,
    ManeParagraph,
    Modulo,
    Multiplication,
    Not,
    NotEqual,
    Or,
    Paragraph,
    Parameters,
    Print,
    Punctuation,
    Read,
    Report,
    Return,
    ReturnType,
    Run,
    Subtraction,
    Switch,
    Var,
    While,
    Xor,

    Eof,
}

impl TokenKind {
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::Char
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::Number
                | TokenKind::String
                | TokenKind::True
        )
    }
}

/// The part a token plays in delimiting a grammatical unit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Block {
    None,
    Begin,
    End,
    BeginPartner,
    EndPartner,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Fixity {
    None,
    Prefix,
    Infix,
    Postfix,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub block: Block,
    pub fixity: Fixity,
    pub span: Span,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, text: &str, block: Block, fixity: Fixity, span: Span) -> Self {
        Self { kind, text: text.to_string(), block, fixity, span, line: 0, column: 0 }
    }

    pub fn is(&self, kind: TokenKind, block: Block) -> bool {
        self.kind == kind && self.block == block
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "the end of the program"),
            _ => write!(f, "{}", self.text),
        }
    }
}

struct ReservedWord {
    pattern: Regex,
    kind: TokenKind,
    block: Block,
    fixity: Fixity,
    /// A word that must appear later in the same sentence for this one to be
    /// reserved.
    closer: Option<Regex>,
}

const APOSTROPHE: &str = "['‘’]";
const QUOTE: &str = "\"“”";
const PUNCTUATION: &str = ".!?‽…:,";

fn compile(pattern: &str) -> Regex {
    Regex::new(&pattern.replace('\'', APOSTROPHE))
        .unwrap_or_else(|e| unreachable!("invalid reserved word pattern {pattern:?}: {e}"))
}

fn word(pattern: &str, kind: TokenKind, block: Block, fixity: Fixity) -> ReservedWord {
    ReservedWord { pattern: compile(pattern), kind, block, fixity, closer: None }
}

fn partner(pattern: &str, kind: TokenKind, closer: &str) -> ReservedWord {
    ReservedWord {
        pattern: compile(pattern),
        kind,
        block: Block::BeginPartner,
        fixity: Fixity::Prefix,
        closer: Some(compile(closer)),
    }
}

const STRING_PATTERN: &str = r#"(?:(?:(?:a |the )?(?:sentence|phrase|quote|word|name)|(?:the )?(?:characters|letters)) )?["“”][^"“”]*["“”]"#;

/// Phrases in priority order. Matches that start and end at the same offsets
/// are tried in this order.
static RESERVED_WORDS: Lazy<Vec<ReservedWord>> = Lazy::new(|| {
    use Block::{Begin, BeginPartner, End, EndPartner};
    use Fixity::{Infix, Postfix, Prefix};
    use TokenKind::*;

    vec![
        // Quoted text, so that phrases inside quotes never become keywords.
        word(STRING_PATTERN, String, Block::None, Fixity::None),
        word(r"\([^)]*\)", Comment, Block::None, Fixity::None),
        word(r"(?:P\.)+S\..*", Comment, Block::None, Fixity::None),
        word(r"\.\.\.|[.!?‽…:,]", Punctuation, Block::None, Fixity::None),
        // Statements.
        word(r"\bDid you know that\b", Var, BeginPartner, Prefix),
        word(r"\bRemember when I wrote about\b", Import, Block::None, Prefix),
        word(r"\bDear\b", Report, Begin, Prefix),
        word(r"\bYour faithful student,", Report, End, Prefix),
        word(r"\bToday I learned\b", ManeParagraph, Begin, Prefix),
        word(r"\bI learned\b", Paragraph, Begin, Prefix),
        word(r"\bThat's all about\b", Paragraph, End, Prefix),
        word(r"\bThen you get\b", Return, Block::None, Prefix),
        word(r"\bI (?:said|wrote|sang)\b", Print, Block::None, Prefix),
        word(r"\bI (?:heard|read|asked)\b", Read, Block::None, Prefix),
        word(r"\bI (?:remembered|would)\b", Run, Block::None, Prefix),
        word(r"\bIf all else fails\b|\bConditional conclusion\b", Default, Block::None, Prefix),
        word(r"\b(?:If|When)\b", If, BeginPartner, Prefix),
        word(r"\bthen\b", If, EndPartner, Postfix),
        word(r"\b(?:Otherwise|Or else)\b", Else, Block::None, Fixity::None),
        word(r"\bThat's what I would do\b", If, End, Fixity::None),
        word(r"\b(?:As long as|While)\b", While, Begin, Prefix),
        word(r"\bHere's what I did\b", DoWhile, Begin, Prefix),
        word(r"\bI did this (?:as long as|while)\b", DoWhile, End, Prefix),
        word(r"\bThat's what I did\b", EndLoop, End, Fixity::None),
        word(r"\bFor every\b", For, BeginPartner, Prefix),
        word(r"\bin\b", For, EndPartner, Infix),
        word(r"\bIn regards to\b", Switch, Begin, Prefix),
        word(r"\bOn the\b", Case, BeginPartner, Prefix),
        word(r"(?:nd|rd|st|th)?\s+hoof\b", Case, EndPartner, Postfix),
        word(r"\bThere was one more\b", Increment, Block::None, Prefix),
        word(r"\bgot one more\b", Increment, Block::None, Postfix),
        word(r"\bThere was one less\b", Decrement, Block::None, Prefix),
        word(r"\bgot one less\b", Decrement, Block::None, Postfix),
        // Comparisons.
        word(
            r"\b(?:is|was|were|had|has)(?:n't| not| no) more than\b|\b(?:is|was|were)(?:n't| not) greater than\b",
            LessThanOrEqual,
            Block::None,
            Infix,
        ),
        word(r"\b(?:is|was|were|had|has)(?:n't| not| no) less than\b", GreaterThanOrEqual, Block::None, Infix),
        word(r"\b(?:is|was|were|had|has) (?:greater|more) than\b", GreaterThan, Block::None, Infix),
        word(r"\b(?:is|was|were|had|has) less than\b", LessThan, Block::None, Infix),
        word(r"\b(?:is|are) now\b|\bnow likes?\b|\bbecomes?\b", Assign, Block::None, Infix),
        word(r"\b(?:is|was|were|had|has)(?:n't| not)\b", NotEqual, Block::None, Infix),
        // Declaration verbs close "Did you know that", otherwise they compare.
        word(r"\b(?:is|was|has|are|likes?)\b", Var, EndPartner, Infix),
        word(r"\b(?:is|was|were|had|has)\b", Equal, Block::None, Infix),
        word(r"\balways\b", Const, Block::None, Prefix),
        word(r"\bmany\b", Array, Block::None, Prefix),
        word(r"\bto get\b|\bwith\b", ReturnType, Block::None, Infix),
        word(r"\busing\b", Parameters, Block::None, Infix),
        word(r"`s\b|`", Access, Block::None, Infix),
        // Arithmetic.
        partner(r"\badd\b|\bthe sum of\b", Addition, r"\band\b"),
        partner(r"\badd\b", Increment, r"\bto\b"),
        word(r"\bplus\b|\badded to\b", Addition, Block::None, Infix),
        partner(r"\bsubtract\b|\bthe difference between\b", Subtraction, r"\b(?:and|from)\b"),
        word(r"\bminus\b|\bwithout\b", Subtraction, Block::None, Infix),
        partner(r"\bmultiply\b|\bthe product of\b", Multiplication, r"\b(?:and|by)\b"),
        word(r"\btimes\b|\bmultiplied with\b", Multiplication, Block::None, Infix),
        partner(r"\bdivide\b", Division, r"\b(?:and|by)\b"),
        word(r"\bdivided by\b", Division, Block::None, Infix),
        partner(r"\bthe remainder of\b", Modulo, r"\b(?:and|by)\b"),
        word(r"\bmodulo\b", Modulo, Block::None, Infix),
        partner(r"\beither\b", Xor, r"\bor\b"),
        word(r"\bit's not the case that\b|\bnot\b", Not, Block::None, Prefix),
        // Closing partners come before the plain connectives they shadow.
        word(r"\band\b", Addition, EndPartner, Infix),
        word(r"\b(?:and|from)\b", Subtraction, EndPartner, Infix),
        word(r"\b(?:and|by)\b", Multiplication, EndPartner, Infix),
        word(r"\b(?:and|by)\b", Division, EndPartner, Infix),
        word(r"\b(?:and|by)\b", Modulo, EndPartner, Infix),
        word(r"\bto\b", Increment, EndPartner, Infix),
        word(r"\bor\b", Xor, EndPartner, Infix),
        word(r"\bfrom\b", Iter, BeginPartner, Prefix),
        word(r"\bto\b", Iter, EndPartner, Infix),
        word(r"\band\b", And, Block::None, Infix),
        word(r"\bor\b", Or, Block::None, Infix),
    ]
});

/// Literal patterns, scanned inside the text between reserved words.
static LITERALS: Lazy<Vec<(Regex, TokenKind)>> = Lazy::new(|| {
    const BOOL_PREFIX: &str = r"(?:(?:the )?logic |(?:an |the )?argument )?";
    vec![
        (compile(STRING_PATTERN), TokenKind::String),
        (compile(r"(?:\b(?:a |the )?(?:letter|character) )?'.'"), TokenKind::Char),
        (compile(r"(?:\b(?:a |the )?number )?[+-]?\b[0-9]+(?:\.[0-9]+)?\b"), TokenKind::Number),
        (compile(&format!(r"\b{BOOL_PREFIX}(?:correct|right|true|yes)\b")), TokenKind::True),
        (compile(&format!(r"\b{BOOL_PREFIX}(?:incorrect|false|wrong|no)\b")), TokenKind::False),
        (compile(&format!(r"\b(?:(?:a |an |the )?(?:{SINGULAR}) )?nothing\b")), TokenKind::Null),
    ]
});

struct Match {
    start: usize,
    end: usize,
    word: &'static ReservedWord,
}

pub struct Lexer<'a> {
    source: &'a str,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, tokens: Vec::new() }
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        let mut partners: Vec<TokenKind> = Vec::new();
        let mut cursor = 0;

        for m in self.matches() {
            // Overlaps a phrase that was already accepted.
            if m.start < cursor {
                continue;
            }
            match m.word.block {
                Block::EndPartner => {
                    // A closer without its own opener is just part of a name.
                    if partners.last() != Some(&m.word.kind) {
                        continue;
                    }
                    partners.pop();
                }
                Block::BeginPartner => {
                    // "from" only opens a range inside a "For every" header,
                    // and then takes the header's place.
                    if m.word.kind == TokenKind::Iter {
                        if partners.last() != Some(&TokenKind::For) {
                            continue;
                        }
                        partners.pop();
                    }
                    partners.push(m.word.kind);
                }
                _ => (),
            }

            self.push_gap(cursor, m.start);
            let text = &self.source[m.start..m.end];
            self.tokens.push(Token::new(m.word.kind, text, m.word.block, m.word.fixity, m.start..m.end));
            cursor = m.end;
        }
        self.push_gap(cursor, self.source.len());

        let end = self.source.len();
        self.tokens.push(Token::new(TokenKind::Eof, "", Block::None, Fixity::None, end..end));
        self.set_positions();

        tracing::trace!(tokens = self.tokens.len(), "tokenized source");
        self.tokens
    }

    /// Every reserved word match, sorted so that at each offset the longest
    /// match comes first.
    fn matches(&self) -> Vec<Match> {
        let mut matches = Vec::new();
        for word in RESERVED_WORDS.iter() {
            for m in word.pattern.find_iter(self.source) {
                if word.kind == TokenKind::Punctuation && self.is_decimal_point(m.start()) {
                    continue;
                }
                if let Some(closer) = &word.closer {
                    let end = self.sentence_end(m.end());
                    if !closer.is_match(&self.source[m.end()..end]) {
                        continue;
                    }
                }
                matches.push(Match { start: m.start(), end: m.end(), word });
            }
        }
        matches.sort_by_key(|m| (m.start, Reverse(m.end), Reverse(m.end - m.start)));
        matches
    }

    fn is_decimal_point(&self, offset: usize) -> bool {
        let bytes = self.source.as_bytes();
        bytes[offset] == b'.'
            && offset > 0
            && bytes[offset - 1].is_ascii_digit()
            && bytes.get(offset + 1).map_or(false, u8::is_ascii_digit)
    }

    /// Offset of the punctuation that ends the sentence running through
    /// `offset`, ignoring punctuation inside quotes.
    fn sentence_end(&self, offset: usize) -> usize {
        let mut quoted = false;
        for (idx, c) in self.source[offset..].char_indices() {
            let idx = offset + idx;
            if QUOTE.contains(c) {
                quoted = !quoted;
            } else if !quoted && PUNCTUATION.contains(c) && !self.is_decimal_point(idx) {
                return idx;
            }
        }
        self.source.len()
    }

    /// Splits the text between two reserved words into literals and names.
    fn push_gap(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let text = &self.source[start..end];

        let mut literals = Vec::new();
        for (pattern, kind) in LITERALS.iter() {
            for m in pattern.find_iter(text) {
                literals.push((start + m.start(), start + m.end(), *kind));
            }
        }
        literals.sort_by_key(|&(start, end, _)| (start, Reverse(end)));

        let mut cursor = start;
        for (lit_start, lit_end, kind) in literals {
            if lit_start < cursor {
                continue;
            }
            // Once a name has started, the rest of the gap belongs to it.
            if !self.source[cursor..lit_start].trim().is_empty() {
                break;
            }
            let text = &self.source[lit_start..lit_end];
            self.tokens.push(Token::new(kind, text, Block::None, Fixity::None, lit_start..lit_end));
            cursor = lit_end;
        }
        self.push_name(cursor, end);
    }

    fn push_name(&mut self, start: usize, end: usize) {
        let raw = &self.source[start..end];
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return;
        }
        let start = start + (raw.len() - raw.trim_start().len());
        let end = start + trimmed.len();
        let text = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");

        if let Some(last) = self.tokens.last_mut() {
            if last.kind == TokenKind::Name {
                last.text = format!("{} {}", last.text, text);
                last.span.end = end;
                return;
            }
        }
        self.tokens.push(Token::new(TokenKind::Name, &text, Block::None, Fixity::None, start..end));
    }

    fn set_positions(&mut self) {
        for token in &mut self.tokens {
            (token.line, token.column) = line_col(self.source, token.span.start);
        }
    }
}

pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).tokenize()
}
