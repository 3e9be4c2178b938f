//! charclass.rs - Typed character-class model for scrub rules.
//!
//! A `CharClass` is the validated form of an allow/deny character set: a set
//! of single characters plus a list of inclusive ranges. It replaces the
//! older approach of splicing a caller-supplied fragment directly into a
//! regex pattern; fragments are parsed here once, at configuration time, and
//! the class is re-emitted with every metacharacter escaped, so malformed or
//! hostile fragments can never reach the pattern compiler.
//!
//! The fragment syntax accepted by [`CharClass::parse_fragment`] is the
//! body of a JS-style regex character class: plain characters, `a-z`
//! ranges, and `\`-escaped literals, with `\d`, `\w` and `\s` expanding to
//! their usual shorthand sets.
//!
//! License: MIT OR APACHE 2.0

use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::errors::FragmentErrorKind;

/// A validated set of allowed (or denied) characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    singles: BTreeSet<char>,
    ranges: Vec<(char, char)>,
}

/// One lexed element of a fragment. `raw` distinguishes an unescaped
/// character (which may act as a range dash) from an escaped literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Lit { ch: char, raw: bool },
    Shorthand(char),
}

impl CharClass {
    /// Parses a legacy character-class fragment (e.g. `"0-9./"`, `"A-Z"`,
    /// `"a-z\\-"`) into a typed class.
    ///
    /// Rules, matching JS class-body semantics:
    /// * `-` between two characters forms an inclusive range; at the start
    ///   or end of the fragment (or after a consumed range) it is a literal;
    /// * `\x` yields the literal `x`; `\n`, `\t`, `\r`, `\f`, `\v` yield the
    ///   control character; `\d`, `\w`, `\s` expand to their shorthand sets;
    /// * an unescaped `]` is rejected outright (it would have terminated the
    ///   class early in the spliced form); `[` and `^` are plain literals;
    /// * reversed ranges, dangling escapes, and empty fragments are errors.
    pub fn parse_fragment(fragment: &str) -> Result<Self, FragmentErrorKind> {
        if fragment.is_empty() {
            return Err(FragmentErrorKind::Empty);
        }

        let tokens = lex_fragment(fragment)?;
        let mut singles = BTreeSet::new();
        let mut ranges = Vec::new();

        let mut i = 0;
        while i < tokens.len() {
            // Lit, raw '-', Lit is a range; everything else is consumed singly.
            if i + 2 < tokens.len() {
                if let (
                    Token::Lit { ch: start, .. },
                    Token::Lit { ch: '-', raw: true },
                    Token::Lit { ch: end, .. },
                ) = (tokens[i], tokens[i + 1], tokens[i + 2])
                {
                    if start > end {
                        return Err(FragmentErrorKind::ReversedRange(start, end));
                    }
                    ranges.push((start, end));
                    i += 3;
                    continue;
                }
            }
            match tokens[i] {
                Token::Lit { ch, .. } => {
                    singles.insert(ch);
                }
                Token::Shorthand(s) => expand_shorthand(s, &mut singles, &mut ranges),
            }
            i += 1;
        }

        Ok(Self { singles, ranges })
    }

    /// Builds a class from explicit characters and ranges, bypassing the
    /// legacy fragment syntax entirely.
    pub fn from_parts(
        singles: impl IntoIterator<Item = char>,
        ranges: impl IntoIterator<Item = (char, char)>,
    ) -> Result<Self, FragmentErrorKind> {
        let singles: BTreeSet<char> = singles.into_iter().collect();
        let ranges: Vec<(char, char)> = ranges.into_iter().collect();
        if let Some(&(start, end)) = ranges.iter().find(|(s, e)| s > e) {
            return Err(FragmentErrorKind::ReversedRange(start, end));
        }
        if singles.is_empty() && ranges.is_empty() {
            return Err(FragmentErrorKind::Empty);
        }
        Ok(Self { singles, ranges })
    }

    /// True when `c` is a member of the class.
    pub fn contains(&self, c: char) -> bool {
        self.singles.contains(&c) || self.ranges.iter().any(|&(s, e)| s <= c && c <= e)
    }

    /// Emits the class body with every metacharacter escaped, suitable for
    /// placing inside `[...]` or `[^...]`.
    pub fn to_class_body(&self) -> String {
        let mut body = String::new();
        for &(start, end) in &self.ranges {
            push_class_char(&mut body, start);
            body.push('-');
            push_class_char(&mut body, end);
        }
        for &c in &self.singles {
            push_class_char(&mut body, c);
        }
        body
    }
}

fn lex_fragment(fragment: &str) -> Result<Vec<Token>, FragmentErrorKind> {
    let mut tokens = Vec::new();
    let mut chars = fragment.chars().enumerate();

    while let Some((pos, c)) = chars.next() {
        match c {
            ']' => return Err(FragmentErrorKind::UnescapedBracket(pos)),
            '\\' => {
                let (_, next) = chars.next().ok_or(FragmentErrorKind::DanglingEscape)?;
                let token = match next {
                    'd' | 'w' | 's' => Token::Shorthand(next),
                    'n' => Token::Lit { ch: '\n', raw: false },
                    't' => Token::Lit { ch: '\t', raw: false },
                    'r' => Token::Lit { ch: '\r', raw: false },
                    'f' => Token::Lit { ch: '\u{0C}', raw: false },
                    'v' => Token::Lit { ch: '\u{0B}', raw: false },
                    '0' => Token::Lit { ch: '\0', raw: false },
                    other => Token::Lit { ch: other, raw: false },
                };
                tokens.push(token);
            }
            other => tokens.push(Token::Lit { ch: other, raw: true }),
        }
    }
    Ok(tokens)
}

fn expand_shorthand(s: char, singles: &mut BTreeSet<char>, ranges: &mut Vec<(char, char)>) {
    match s {
        'd' => ranges.push(('0', '9')),
        'w' => {
            ranges.push(('0', '9'));
            ranges.push(('A', 'Z'));
            ranges.push(('a', 'z'));
            singles.insert('_');
        }
        's' => {
            singles.extend([' ', '\t', '\n', '\r', '\u{0B}', '\u{0C}']);
        }
        _ => unreachable!("lexer only produces d/w/s shorthands"),
    }
}

fn push_class_char(body: &mut String, c: char) {
    match c {
        '\\' | '[' | ']' | '^' | '-' | '&' | '~' => {
            body.push('\\');
            body.push(c);
        }
        c if c.is_control() => {
            // Controls are emitted as explicit codepoints so the pattern
            // stays printable.
            let _ = write!(body, "\\x{{{:X}}}", c as u32);
        }
        c => body.push(c),
    }
}
