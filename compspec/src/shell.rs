//! Shell word helpers.
//!
//! Completion requests carry words as the user typed them, quotes and
//! backslashes included. The interpreter matches against the unescaped form
//! and hands both forms to registered functions.

/// Remove shell quoting from a single word.
///
/// Handles backslash escapes, `'single'` quotes (no escapes inside) and
/// `"double"` quotes (only `\"`, `\\`, `` \` `` and `\$` are escapes). An
/// unterminated quote runs to the end of the word.
#[must_use]
pub fn unescape(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut chars = word.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            '\'' => {
                for c in chars.by_ref() {
                    if c == '\'' {
                        break;
                    }
                    out.push(c);
                }
            }
            '"' => {
                while let Some(c) = chars.next() {
                    match c {
                        '"' => break,
                        '\\' if matches!(chars.peek(), Some('"' | '\\' | '`' | '$')) => {
                            out.extend(chars.next());
                        }
                        _ => out.push(c),
                    }
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Split a command line into raw words, keeping quotes and escapes.
///
/// Trailing whitespace yields a final empty word, which puts the cursor on
/// a fresh word the way a shell does after a space.
#[must_use]
pub fn split(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                } else if c == '\\' && q == '"' {
                    current.extend(chars.next());
                }
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                in_word = true;
                current.push(c);
                match c {
                    '\\' => current.extend(chars.next()),
                    '\'' | '"' => quote = Some(c),
                    _ => {}
                }
            }
        }
    }

    if in_word {
        words.push(current);
    } else if line.ends_with(char::is_whitespace) {
        words.push(String::new());
    }
    words
}
