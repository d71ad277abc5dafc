//! Line tokenizer.
//!
//! Each script line goes through three steps:
//!
//! 1. Lines ending in an odd number of backslashes are joined with the
//!    following line (the final backslash and the newline disappear).
//! 2. Backslash escapes (`\n`, `\t`, `\x41`, `é`, octal, …) are decoded
//!    over the whole logical line.
//! 3. The decoded text is split into words with POSIX shell quoting rules.
//!    An unquoted `#` starts a comment that runs to the end of the line.
//!
//! Because decoding happens before splitting, a `\"` in the source becomes a
//! plain `"` that the splitter then treats as a quote.  To get a literal
//! quote character into a token, write `\\"`.
//!
//! Lines that produce no tokens (blank or comment-only) are skipped.

use std::iter::Enumerate;
use std::str::Lines;

use super::error::ScriptError;

/// One tokenized logical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based number of the first physical line.
    pub number: usize,
    pub tokens: Vec<String>,
}

/// Lazily tokenize `src`, one logical line at a time.
pub fn tokenize(src: &str) -> Tokenize<'_> {
    Tokenize {
        lines: src.lines().enumerate(),
    }
}

/// Iterator returned by [`tokenize`].
#[derive(Debug, Clone)]
pub struct Tokenize<'a> {
    lines: Enumerate<Lines<'a>>,
}

impl Tokenize<'_> {
    /// Pull the next logical line, joining continuations.
    fn next_logical(&mut self) -> Option<(usize, String)> {
        let (idx, mut physical) = self.lines.next()?;
        let mut text = String::new();
        loop {
            if !ends_with_continuation(physical) {
                text.push_str(physical);
                break;
            }
            text.push_str(&physical[..physical.len() - 1]);
            match self.lines.next() {
                Some((_, next)) => physical = next,
                None => break,
            }
        }
        Some((idx + 1, text))
    }
}

impl Iterator for Tokenize<'_> {
    type Item = Result<Line, ScriptError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (number, text) = self.next_logical()?;
            match tokenize_line(&text) {
                Ok(tokens) if tokens.is_empty() => continue,
                Ok(tokens) => return Some(Ok(Line { number, tokens })),
                Err(message) => {
                    return Some(Err(ScriptError::Tokenize { line: number, message }));
                }
            }
        }
    }
}

/// Decode escapes in one logical line and split it into words.
pub fn tokenize_line(text: &str) -> Result<Vec<String>, String> {
    let decoded = decode_escapes(text)?;
    split_words(&decoded)
}

fn ends_with_continuation(line: &str) -> bool {
    let trailing = line.bytes().rev().take_while(|&b| b == b'\\').count();
    trailing % 2 == 1
}

// ── Escape decoding ───────────────────────────────────────────────────────────

/// Decode backslash escape sequences.
///
/// Unknown escapes (`\q`) are kept verbatim, backslash included.  Characters
/// outside ASCII pass through unchanged.
pub fn decode_escapes(text: &str) -> Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let Some(esc) = chars.next() else {
            return Err("\\ at end of line".to_owned());
        };
        match esc {
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut code = esc.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char_from(code, esc)?);
            }
            'x' => out.push(hex_escape(&mut chars, 2, 'x')?),
            'u' => out.push(hex_escape(&mut chars, 4, 'u')?),
            'U' => out.push(hex_escape(&mut chars, 8, 'U')?),
            'N' => return Err("\\N{...} escapes are not supported".to_owned()),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    Ok(out)
}

fn hex_escape(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    digits: usize,
    marker: char,
) -> Result<char, String> {
    let mut code = 0u32;
    for _ in 0..digits {
        let d = chars
            .next()
            .and_then(|c| c.to_digit(16))
            .ok_or_else(|| format!("truncated \\{marker} escape"))?;
        code = code * 16 + d;
    }
    char_from(code, marker)
}

fn char_from(code: u32, marker: char) -> Result<char, String> {
    char::from_u32(code).ok_or_else(|| format!("illegal code point in \\{marker} escape: {code:#x}"))
}

// ── Word splitting ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Split `text` into words using POSIX shell quoting.
///
/// - `'…'` is taken literally.
/// - `"…"` honours `\"` and `\\`; any other backslash is kept.
/// - Outside quotes a backslash escapes the next character.
/// - Adjacent quoted and unquoted parts join into one word; `""` yields an
///   empty word.
/// - An unquoted `#` discards the rest of the line.
pub fn split_words(text: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote = Quote::None;
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        match quote {
            Quote::Single => {
                if ch == '\'' {
                    quote = Quote::None;
                } else {
                    current.push(ch);
                }
            }
            Quote::Double => match ch {
                '"' => quote = Quote::None,
                '\\' => match chars.next() {
                    Some(esc @ ('"' | '\\')) => current.push(esc),
                    Some(esc) => {
                        current.push('\\');
                        current.push(esc);
                    }
                    None => return Err("no escaped character".to_owned()),
                },
                _ => current.push(ch),
            },
            Quote::None => match ch {
                c if is_blank(c) => {
                    if in_word {
                        words.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                '#' => break,
                '\'' => {
                    quote = Quote::Single;
                    in_word = true;
                }
                '"' => {
                    quote = Quote::Double;
                    in_word = true;
                }
                '\\' => {
                    let esc = chars.next().ok_or_else(|| "no escaped character".to_owned())?;
                    current.push(esc);
                    in_word = true;
                }
                _ => {
                    current.push(ch);
                    in_word = true;
                }
            },
        }
    }

    if quote != Quote::None {
        return Err("no closing quotation".to_owned());
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
