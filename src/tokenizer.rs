//! Line-level lexing: comment stripping and field splitting.
//!
//! Fields are separated by runs of whitespace and commas. Quoted literals
//! (`'...'` or `"..."`) are kept whole, quotes included, so a later stage can
//! tell a string operand from a name.

const COMMENT: char = ';';

fn is_quote(c: char) -> bool {
    c == '\'' || c == '"'
}

/// Returns `line` up to (not including) the first `;` that is outside a quoted literal.
pub fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    for (i, c) in line.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if is_quote(c) => quote = Some(c),
            None if c == COMMENT => return &line[..i],
            None => {}
        }
    }
    line
}

/// Splits one source line into its fields, dropping any trailing comment.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut cur = String::new();
    let mut quote: Option<char> = None;
    for c in strip_comment(line).chars() {
        if let Some(q) = quote {
            cur.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        if c.is_whitespace() || c == ',' {
            if !cur.is_empty() {
                fields.push(std::mem::take(&mut cur));
            }
        } else {
            if is_quote(c) {
                quote = Some(c);
            }
            cur.push(c);
        }
    }
    if !cur.is_empty() {
        fields.push(cur);
    }
    fields
}

/// If `field` is a quoted literal, returns its contents without the quotes.
pub fn unquote(field: &str) -> Option<&str> {
    let mut chars = field.chars();
    let open = chars.next().filter(|c| is_quote(*c))?;
    let inner = &field[open.len_utf8()..];
    Some(inner.strip_suffix(open).unwrap_or(inner))
}
