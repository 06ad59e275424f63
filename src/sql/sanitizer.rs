/// Strip comments and mask string literals so the classifier only ever sees
/// SQL structure.
///
/// - `/* ... */`, `-- ...` and `# ...` comments are replaced by whitespace
/// - string literals keep their prefix and quotes but lose their contents
///   (`'abc'` -> `''`, `r"""x"""` -> `r""""""`)
/// - backtick-quoted identifiers are copied verbatim
/// - whitespace runs collapse to one space and the result is trimmed
///
/// A single left-to-right scan handles all of these together, so a `--`
/// inside a literal or a quote inside a comment is never misread.
pub fn sanitize(sql: &str) -> String {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '/' if chars.get(i + 1) == Some(&'*') => {
                i = skip_block_comment(&chars, i + 2);
                out.push(' ');
            }
            '-' if chars.get(i + 1) == Some(&'-') => {
                i = skip_line(&chars, i + 2);
                out.push(' ');
            }
            '#' => {
                i = skip_line(&chars, i + 1);
                out.push(' ');
            }
            '`' => {
                i = copy_quoted_identifier(&chars, i, &mut out);
            }
            '\'' | '"' => {
                let raw = has_raw_prefix(&chars, i);
                i = mask_string_literal(&chars, i, raw, &mut out);
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    collapse_whitespace(&out)
}

/// Returns the index just past the closing `*/`, or the end of input
fn skip_block_comment(chars: &[char], from: usize) -> usize {
    let mut i = from;
    while i < chars.len() {
        if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
            return i + 2;
        }
        i += 1;
    }
    chars.len()
}

/// Returns the index of the terminating newline (kept as whitespace)
fn skip_line(chars: &[char], from: usize) -> usize {
    chars[from..]
        .iter()
        .position(|&c| c == '\n')
        .map_or(chars.len(), |offset| from + offset)
}

fn copy_quoted_identifier(chars: &[char], start: usize, out: &mut String) -> usize {
    out.push('`');
    let mut i = start + 1;
    while i < chars.len() {
        out.push(chars[i]);
        if chars[i] == '`' {
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}

/// A literal is raw when the identifier run directly before its opening
/// quote is exactly `r`, `rb` or `br` in any case.
fn has_raw_prefix(chars: &[char], quote_at: usize) -> bool {
    let mut start = quote_at;
    while start > 0 && (chars[start - 1].is_alphanumeric() || chars[start - 1] == '_') {
        start -= 1;
    }

    let prefix: String = chars[start..quote_at]
        .iter()
        .map(|c| c.to_ascii_lowercase())
        .collect();
    matches!(prefix.as_str(), "r" | "rb" | "br")
}

/// Emits an empty literal of the same quoting style and returns the index
/// just past the closing quote. Unterminated literals run to end of input.
fn mask_string_literal(chars: &[char], start: usize, raw: bool, out: &mut String) -> usize {
    let quote = chars[start];
    let triple = chars.get(start + 1) == Some(&quote) && chars.get(start + 2) == Some(&quote);
    let width = if triple { 3 } else { 1 };

    for _ in 0..width * 2 {
        out.push(quote);
    }

    let mut i = start + width;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && !raw {
            i += 2;
            continue;
        }
        if c == quote {
            if !triple {
                return i + 1;
            }
            if chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote) {
                return i + 3;
            }
        }
        i += 1;
    }
    chars.len()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_line_comments() {
        assert_eq!(sanitize("-- DROP TABLE t\nSELECT 1"), "SELECT 1");
        assert_eq!(sanitize("SELECT 1 # trailing note"), "SELECT 1");
    }

    #[test]
    fn test_strips_block_comments() {
        assert_eq!(sanitize("SELECT /* DELETE FROM t */ 1"), "SELECT 1");
        assert_eq!(sanitize("/* multi\nline */SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_unterminated_block_comment_swallows_rest() {
        assert_eq!(sanitize("SELECT 1 /* DROP TABLE t"), "SELECT 1");
    }

    #[test]
    fn test_masks_single_and_double_quoted() {
        assert_eq!(sanitize("SELECT 'DROP TABLE x'"), "SELECT ''");
        assert_eq!(sanitize("SELECT \"a; b\""), "SELECT \"\"");
    }

    #[test]
    fn test_masks_triple_quoted() {
        assert_eq!(
            sanitize("SELECT '''line one\nDELETE FROM t''' AS s"),
            "SELECT '''''' AS s"
        );
        assert_eq!(sanitize("SELECT \"\"\"a\"b\"\"\""), "SELECT \"\"\"\"\"\"");
    }

    #[test]
    fn test_preserves_raw_and_byte_prefixes() {
        assert_eq!(sanitize("SELECT r'\\d+', b'abc', RB\"x\""), "SELECT r'', b'', RB\"\"");
        assert_eq!(sanitize("SELECT br'''x'''"), "SELECT br''''''");
    }

    #[test]
    fn test_escaped_quote_stays_inside_literal() {
        assert_eq!(sanitize(r"SELECT 'it\'s; DROP TABLE t'"), "SELECT ''");
    }

    #[test]
    fn test_raw_literal_ends_at_first_quote() {
        // backslash is literal in raw strings, so the quote after it closes
        assert_eq!(sanitize(r"SELECT r'a\' , 2"), "SELECT r'' , 2");
    }

    #[test]
    fn test_comment_markers_inside_literals_are_kept_masked() {
        assert_eq!(sanitize("SELECT '-- not a comment', 2"), "SELECT '', 2");
        assert_eq!(sanitize("SELECT '# nope' FROM t"), "SELECT '' FROM t");
    }

    #[test]
    fn test_quotes_inside_comments_do_not_open_literals() {
        assert_eq!(sanitize("SELECT 1 -- it's fine\n, 2"), "SELECT 1 , 2");
    }

    #[test]
    fn test_backtick_identifiers_copied_verbatim() {
        assert_eq!(
            sanitize("SELECT * FROM `my-project.ds--x.t#1`"),
            "SELECT * FROM `my-project.ds--x.t#1`"
        );
    }

    #[test]
    fn test_unterminated_literal_masks_to_end() {
        assert_eq!(sanitize("SELECT 'abc; DROP TABLE t"), "SELECT ''");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(sanitize("  SELECT\t\t*\n\nFROM   t  "), "SELECT * FROM t");
    }

    #[test]
    fn test_only_comments_yields_empty() {
        assert_eq!(sanitize("-- nothing here\n/* or here */"), "");
        assert_eq!(sanitize(""), "");
    }
}
