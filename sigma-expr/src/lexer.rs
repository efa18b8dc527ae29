//! Tokenizer for infix math text

use sigma_core::SigmaError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Bang,
    Prime,
    Amp,
    Pipe,
    Tilde,
    /// `->` or `>>`
    Arrow,
    /// `<->`
    DoubleArrow,
    Eq,
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number '{}'", n),
            Token::Ident(s) => format!("'{}'", s),
            Token::Plus => "'+'".into(),
            Token::Minus => "'-'".into(),
            Token::Star => "'*'".into(),
            Token::Slash => "'/'".into(),
            Token::Caret => "'^'".into(),
            Token::LParen => "'('".into(),
            Token::RParen => "')'".into(),
            Token::LBracket => "'['".into(),
            Token::RBracket => "']'".into(),
            Token::Comma => "','".into(),
            Token::Bang => "'!'".into(),
            Token::Prime => "'''".into(),
            Token::Amp => "'&'".into(),
            Token::Pipe => "'|'".into(),
            Token::Tilde => "'~'".into(),
            Token::Arrow => "'->'".into(),
            Token::DoubleArrow => "'<->'".into(),
            Token::Eq => "'='".into(),
        }
    }
}

/// Token with its byte offset in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub pos: usize,
}

pub fn tokenize(input: &str) -> Result<Vec<Spanned>, SigmaError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if let Some(tokens) = typographic(c) {
            out.extend(tokens.into_iter().map(|token| Spanned { token, pos }));
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|(_, d)| d.is_ascii_digit())) {
            let start = i;
            while i < chars.len() && chars[i].1.is_ascii_digit() {
                i += 1;
            }
            if i < chars.len() && chars[i].1 == '.' {
                i += 1;
                while i < chars.len() && chars[i].1.is_ascii_digit() {
                    i += 1;
                }
            }
            // exponent only when digits follow, so `2e^x` stays 2*e^x
            if i < chars.len() && (chars[i].1 == 'e' || chars[i].1 == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j].1 == '+' || chars[j].1 == '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].1.is_ascii_digit() {
                    i = j;
                    while i < chars.len() && chars[i].1.is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let text: String = chars[start..i].iter().map(|(_, ch)| ch).collect();
            out.push(Spanned { token: Token::Number(text), pos });
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && continues_identifier(chars[i].1) {
                i += 1;
            }
            let text: String = chars[start..i].iter().map(|(_, ch)| ch).collect();
            out.push(Spanned { token: Token::Ident(text), pos });
            continue;
        }

        let next = chars.get(i + 1).map(|(_, ch)| *ch);
        let (token, width) = match (c, next) {
            ('*', Some('*')) => (Token::Caret, 2),
            ('-', Some('>')) => (Token::Arrow, 2),
            ('>', Some('>')) => (Token::Arrow, 2),
            ('<', Some('-')) if chars.get(i + 2).map(|(_, ch)| *ch) == Some('>') => (Token::DoubleArrow, 3),
            ('=', Some('=')) => (Token::Eq, 2),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('^', _) => (Token::Caret, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('[', _) => (Token::LBracket, 1),
            (']', _) => (Token::RBracket, 1),
            (',', _) => (Token::Comma, 1),
            ('!', _) => (Token::Bang, 1),
            ('\'', _) => (Token::Prime, 1),
            ('&', _) => (Token::Amp, 1),
            ('|', _) => (Token::Pipe, 1),
            ('~', _) => (Token::Tilde, 1),
            ('=', _) => (Token::Eq, 1),
            _ => {
                return Err(SigmaError::parse_error(format!("unexpected character '{}'", c))
                    .at_position(pos))
            }
        };
        out.push(Spanned { token, pos });
        i += width;
    }

    Ok(out)
}

/// Typographic symbols, read as their ASCII spelling
fn typographic(c: char) -> Option<Vec<Token>> {
    let tokens = match c {
        '×' | '·' | '⋅' => vec![Token::Star],
        '÷' => vec![Token::Slash],
        '−' | '–' => vec![Token::Minus],
        '²' => vec![Token::Caret, Token::Number("2".into())],
        '³' => vec![Token::Caret, Token::Number("3".into())],
        '√' => vec![Token::Ident("sqrt".into())],
        'π' => vec![Token::Ident("pi".into())],
        '∞' => vec![Token::Ident("oo".into())],
        '∧' => vec![Token::Amp],
        '∨' => vec![Token::Pipe],
        '¬' => vec![Token::Tilde],
        '→' | '⇒' => vec![Token::Arrow],
        '↔' | '⇔' => vec![Token::DoubleArrow],
        _ => return None,
    };
    Some(tokens)
}

/// Letters, ASCII digits and `_`; superscripts and symbols end the name
fn continues_identifier(c: char) -> bool {
    c == '_' || c.is_ascii_digit() || (c.is_alphabetic() && typographic(c).is_none())
}
