use std::ops::Range;

#[derive(Clone)]
enum State {
    Code,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

/// A `$N` placeholder found in executable SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Placeholder {
    /// Byte range of the whole token, `$` included.
    pub span: (usize, usize),
    /// 1-based parameter index.
    pub index: usize,
}

fn starts_with_at(bytes: &[u8], idx: usize, pat: &[u8]) -> bool {
    bytes.get(idx..idx + pat.len()) == Some(pat)
}

/// `$tag$` opener at `start`; returns the tag and the index of its closing `$`.
fn dollar_quote_open(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    let mut idx = start + 1;
    while idx < bytes.len() && bytes[idx] != b'$' {
        let b = bytes[idx];
        if !(b.is_ascii_alphabetic() || b == b'_' || (idx > start + 1 && b.is_ascii_digit())) {
            return None;
        }
        idx += 1;
    }
    if idx < bytes.len() {
        let tag = std::str::from_utf8(&bytes[start + 1..idx]).ok()?.to_owned();
        Some((tag, idx))
    } else {
        None
    }
}

fn dollar_quote_close(bytes: &[u8], idx: usize, tag: &str) -> Option<usize> {
    let end = idx + 1 + tag.len();
    (bytes[idx] == b'$'
        && starts_with_at(bytes, idx + 1, tag.as_bytes())
        && bytes.get(end) == Some(&b'$'))
    .then_some(end)
}

/// Byte ranges of `sql` that are executable text: outside string literals, quoted identifiers,
/// comments and dollar-quoted bodies. Range boundaries always fall on ASCII delimiters.
pub(crate) fn code_spans(sql: &str) -> Vec<Range<usize>> {
    let bytes = sql.as_bytes();
    let mut spans = Vec::new();
    let mut state = State::Code;
    let mut span_start = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Code => {
                let (next, skip_to) = match b {
                    b'\'' => (Some(State::SingleQuoted), idx),
                    b'"' => (Some(State::DoubleQuoted), idx),
                    b'-' if starts_with_at(bytes, idx, b"--") => {
                        (Some(State::LineComment), idx + 1)
                    }
                    b'/' if starts_with_at(bytes, idx, b"/*") => {
                        (Some(State::BlockComment(1)), idx + 1)
                    }
                    b'$' => match dollar_quote_open(bytes, idx) {
                        Some((tag, close)) => (Some(State::DollarQuoted(tag)), close),
                        None => (None, idx),
                    },
                    _ => (None, idx),
                };
                if let Some(next) = next {
                    if span_start < idx {
                        spans.push(span_start..idx);
                    }
                    state = next;
                    idx = skip_to;
                }
            }
            State::SingleQuoted | State::DoubleQuoted => {
                let quote = if matches!(state, State::SingleQuoted) {
                    b'\''
                } else {
                    b'"'
                };
                if b == quote {
                    if bytes.get(idx + 1) == Some(&quote) {
                        idx += 1; // doubled quote is an escape
                    } else {
                        state = State::Code;
                        span_start = idx + 1;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Code;
                    span_start = idx;
                }
            }
            State::BlockComment(depth) => {
                if starts_with_at(bytes, idx, b"/*") {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if starts_with_at(bytes, idx, b"*/") {
                    idx += 1;
                    if depth == 1 {
                        state = State::Code;
                        span_start = idx + 1;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                }
            }
            State::DollarQuoted(ref tag) => {
                if let Some(end) = dollar_quote_close(bytes, idx, tag) {
                    idx = end;
                    state = State::Code;
                    span_start = idx + 1;
                }
            }
        }
        idx += 1;
    }

    if matches!(state, State::Code) && span_start < bytes.len() {
        spans.push(span_start..bytes.len());
    }
    spans
}

/// All `$N` placeholders in executable text, in source order.
pub(crate) fn placeholders(sql: &str) -> Vec<Placeholder> {
    let bytes = sql.as_bytes();
    let mut found = Vec::new();
    for span in code_spans(sql) {
        let mut idx = span.start;
        while idx < span.end {
            if bytes[idx] == b'$' {
                let digits_end = scan_digits(bytes, idx + 1, span.end);
                if digits_end > idx + 1
                    && let Ok(index) = sql[idx + 1..digits_end].parse::<usize>()
                {
                    found.push(Placeholder {
                        span: (idx, digits_end),
                        index,
                    });
                    idx = digits_end;
                    continue;
                }
            }
            idx += 1;
        }
    }
    found
}

/// Copy of `sql` with every non-executable region collapsed to one space, for keyword checks.
pub(crate) fn mask_literals(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut last = 0;
    for span in code_spans(sql) {
        if span.start > last {
            out.push(' ');
        }
        out.push_str(&sql[span.clone()]);
        last = span.end;
    }
    if last < sql.len() {
        out.push(' ');
    }
    out
}

fn scan_digits(bytes: &[u8], start: usize, limit: usize) -> usize {
    let mut idx = start;
    while idx < limit && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    idx
}
