//! Text helpers shared by the stats clause scan: comment removal, quoted-text
//! blanking, identifier unquoting and small word-boundary checks.

/// Strip SQL comments from the input while preserving content inside quoted text.
/// Supported comment styles:
/// - Line comments starting with `--` until end of line
/// - Block comments delimited by `/* ... */` (nesting is supported)
/// Each comment is replaced by a single space so that the tokens on either side
/// stay separate; newlines inside comments are kept. Single quotes, double
/// quotes and backticks all open quoted runs that are copied verbatim.
pub fn strip_sql_comments(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0usize;
    let mut quote: Option<u8> = None;
    let mut block_depth: i32 = 0;
    let mut line_comment = false;

    while i < bytes.len() {
        let b = bytes[i];

        if line_comment {
            if b == b'\n' {
                out.push('\n');
                line_comment = false;
            }
            i += 1;
            continue;
        }

        if block_depth > 0 {
            if b == b'\n' || b == b'\r' {
                out.push(b as char);
                i += 1;
                continue;
            }
            if b == b'/' && bytes.get(i + 1) == Some(&b'*') {
                block_depth += 1;
                i += 2;
                continue;
            }
            if b == b'*' && bytes.get(i + 1) == Some(&b'/') {
                block_depth -= 1;
                i += 2;
                continue;
            }
            i += 1;
            continue;
        }

        match quote {
            Some(q) => {
                if b == q { quote = None; }
            }
            None => {
                if b == b'\'' || b == b'"' || b == b'`' {
                    quote = Some(b);
                } else if b == b'-' && bytes.get(i + 1) == Some(&b'-') {
                    line_comment = true;
                    out.push(' ');
                    i += 2;
                    continue;
                } else if b == b'/' && bytes.get(i + 1) == Some(&b'*') {
                    block_depth = 1;
                    out.push(' ');
                    i += 2;
                    continue;
                }
            }
        }

        // copy one whole UTF-8 char
        let ch = input[i..].chars().next().unwrap_or(' ');
        out.push(ch);
        i += ch.len_utf8().max(1);
    }

    out
}

/// Replace the body of every quoted run (`'...'`, `"..."`, `` `...` ``) with
/// spaces, keeping the quote characters. The result has the same byte length
/// as `input`, so match offsets taken on it slice `input` at the same text.
/// An unterminated quote blanks the rest of the input.
pub fn blank_quoted_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut quote: Option<char> = None;
    for ch in input.chars() {
        match quote {
            Some(q) if ch == q => {
                quote = None;
                out.push(ch);
            }
            Some(_) => out.extend(std::iter::repeat(' ').take(ch.len_utf8())),
            None => {
                if matches!(ch, '\'' | '"' | '`') { quote = Some(ch); }
                out.push(ch);
            }
        }
    }
    out
}

/// Normalize a raw identifier token: trim whitespace, then unwrap one layer of
/// backticks or double quotes (trimming again inside). May return "".
pub fn unquote_identifier(raw: &str) -> String {
    let t = raw.trim();
    let inner = if t.len() >= 2 && ((t.starts_with('`') && t.ends_with('`')) || (t.starts_with('"') && t.ends_with('"'))) {
        &t[1..t.len() - 1]
    } else {
        t
    };
    inner.trim().to_string()
}

/// Strip every backtick, one layer of double quotes and surrounding
/// whitespace from a group field token.
pub fn normalize_field_token(raw: &str) -> String {
    let t = raw.trim();
    let t = t.strip_prefix('"').and_then(|s| s.strip_suffix('"')).unwrap_or(t);
    t.replace('`', "").trim().to_string()
}

/// The word (run of alphanumerics/underscores) that ends right before `pos`,
/// skipping any whitespace in between.
pub fn preceding_word(s: &str, pos: usize) -> &str {
    let head = s[..pos].trim_end();
    let start = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphanumeric() || *c == '_')
        .last()
        .map(|(i, _)| i)
        .unwrap_or(head.len());
    &head[start..]
}

/// True when `s` starts with keyword `kw` (ASCII case-insensitive) followed by a word boundary.
pub fn starts_with_keyword_ci(s: &str, kw: &str) -> bool {
    if s.len() < kw.len() || !s.is_char_boundary(kw.len()) { return false; }
    if !s[..kw.len()].eq_ignore_ascii_case(kw) { return false; }
    match s[kw.len()..].chars().next() {
        Some(c) => !(c.is_alphanumeric() || c == '_'),
        None => true,
    }
}
