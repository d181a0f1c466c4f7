//! Tokenizer for the supported SPARQL subset.

use broker_core::error::AppError;
use broker_core::result::AppResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `<…>`
    Iri(String),
    /// `prefix:local` (either part may be empty).
    PrefixedName(String, String),
    /// `?name` or `$name`
    Var(String),
    /// Quoted string body, escapes resolved.
    String(String),
    /// `@tag` following a string.
    LangTag(String),
    /// `^^`
    DatatypeMarker,
    Integer(String),
    Decimal(String),
    /// `_:label`
    BlankNode(String),
    /// Bare word: keyword, `a`, `true`/`false`.
    Word(String),
    LBrace,
    RBrace,
    Dot,
    Semicolon,
    Comma,
    Star,
}

/// Splits `input` into tokens.
pub fn tokenize(input: &str) -> AppResult<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            _ if c.is_whitespace() => i += 1,
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '{' => {
                tokens.push(Token::LBrace);
                i += 1;
            }
            '}' => {
                tokens.push(Token::RBrace);
                i += 1;
            }
            '.' if !chars.get(i + 1).is_some_and(|d| d.is_ascii_digit()) => {
                tokens.push(Token::Dot);
                i += 1;
            }
            ';' => {
                tokens.push(Token::Semicolon);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '<' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&ch| ch == '>')
                    .map(|p| i + 1 + p)
                    .ok_or_else(|| syntax("unterminated IRI"))?;
                let iri: String = chars[i + 1..end].iter().collect();
                if iri.chars().any(char::is_whitespace) {
                    return Err(syntax("whitespace inside IRI"));
                }
                tokens.push(Token::Iri(iri));
                i = end + 1;
            }
            '?' | '$' => {
                let (name, next) = take_while(&chars, i + 1, is_name_char);
                if name.is_empty() {
                    return Err(syntax("empty variable name"));
                }
                tokens.push(Token::Var(name));
                i = next;
            }
            '"' | '\'' => {
                let (value, next) = read_string(&chars, i)?;
                tokens.push(Token::String(value));
                i = next;
            }
            '@' => {
                let (tag, next) = take_while(&chars, i + 1, |ch| ch.is_alphanumeric() || ch == '-');
                if tag.is_empty() {
                    return Err(syntax("empty language tag"));
                }
                tokens.push(Token::LangTag(tag));
                i = next;
            }
            '^' => {
                if chars.get(i + 1) != Some(&'^') {
                    return Err(syntax("expected ^^"));
                }
                tokens.push(Token::DatatypeMarker);
                i += 2;
            }
            '_' if chars.get(i + 1) == Some(&':') => {
                let (label, next) = take_while(&chars, i + 2, is_name_char);
                if label.is_empty() {
                    return Err(syntax("empty blank node label"));
                }
                tokens.push(Token::BlankNode(label));
                i = next;
            }
            _ if c.is_ascii_digit() || ((c == '+' || c == '-' || c == '.') && next_is_digit(&chars, i)) => {
                let start = i;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let mut decimal = c == '.';
                if i < chars.len() && chars[i] == '.' && next_is_digit(&chars, i) {
                    decimal = true;
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push(if decimal {
                    Token::Decimal(text)
                } else {
                    Token::Integer(text)
                });
            }
            _ if c.is_alphabetic() || c == ':' => {
                let (prefix, next) = take_while(&chars, i, is_name_char);
                if chars.get(next) == Some(&':') {
                    let (local, after) = take_local(&chars, next + 1);
                    tokens.push(Token::PrefixedName(prefix, local));
                    i = after;
                } else {
                    tokens.push(Token::Word(prefix));
                    i = next;
                }
            }
            other => return Err(syntax(&format!("unexpected character '{other}'"))),
        }
    }

    Ok(tokens)
}

fn syntax(msg: &str) -> AppError {
    AppError::execution(format!("SPARQL syntax error: {msg}"))
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn next_is_digit(chars: &[char], i: usize) -> bool {
    chars.get(i + 1).is_some_and(|d| d.is_ascii_digit())
}

fn take_while(chars: &[char], start: usize, pred: impl Fn(char) -> bool) -> (String, usize) {
    let mut end = start;
    while end < chars.len() && pred(chars[end]) {
        end += 1;
    }
    (chars[start..end].iter().collect(), end)
}

/// Local part of a prefixed name; may contain dots but not end with one.
fn take_local(chars: &[char], start: usize) -> (String, usize) {
    let mut end = start;
    while end < chars.len() && (is_name_char(chars[end]) || chars[end] == '.') {
        end += 1;
    }
    while end > start && chars[end - 1] == '.' {
        end -= 1;
    }
    (chars[start..end].iter().collect(), end)
}

fn read_string(chars: &[char], start: usize) -> AppResult<(String, usize)> {
    let quote = chars[start];
    let long = chars.get(start + 1) == Some(&quote) && chars.get(start + 2) == Some(&quote);
    let mut i = if long { start + 3 } else { start + 1 };
    let mut out = String::new();

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            let escaped = chars.get(i + 1).ok_or_else(|| syntax("dangling escape"))?;
            out.push(match escaped {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                'b' => '\u{8}',
                'f' => '\u{c}',
                other => *other,
            });
            i += 2;
            continue;
        }
        if c == quote {
            if !long {
                return Ok((out, i + 1));
            }
            if chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote) {
                return Ok((out, i + 3));
            }
        } else if c == '\n' && !long {
            return Err(syntax("newline in string literal"));
        }
        out.push(c);
        i += 1;
    }

    Err(syntax("unterminated string literal"))
}
