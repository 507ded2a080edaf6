// src/tags.rs
//
// Byte-level tag scanning shared by the rewrite passes.
//
// - No tree is built: callers hand in the whole document and the index of a '<'.
// - A tag name ends at the first non-name byte. Opening tags need whitespace, '/' or '>'
//   right after the name; closing tags allow only whitespace before '>'. This keeps
//   a rule for `s` away from `<span>` and `<s-x>`.
// - Every index handed back sits on an ASCII byte, so slicing the &str is always valid.

use memchr::memchr;

/* ============================ Utility predicates ========================= */

#[inline]
pub(crate) fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

#[inline]
fn is_ws(b: u8) -> bool {
    b == b' ' || b == b'\t' || b == b'\n' || b == b'\r' || b == b'\x0c'
}

/* =============================== Tag parsing ============================= */

#[derive(Clone, Copy, Debug)]
pub(crate) struct Tag<'a> {
    pub name: &'a str,
    pub is_end: bool,
    /// Everything between the name and the closing '>' (empty for end tags).
    pub attrs: &'a str,
    /// Index of '<'.
    pub start: usize,
    /// Index of '>'.
    pub end: usize,
}

impl<'a> Tag<'a> {
    #[inline]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// First index after the tag.
    #[inline]
    pub fn next(&self) -> usize {
        self.end + 1
    }

    pub fn attr(&self, wanted: &str) -> Option<&'a str> {
        attr_value(self.attrs, wanted)
    }
}

/// Find the '>' for a tag starting at `i` (s[i] == '<'), being quote-aware.
///
/// Quotes only open after '=' so a stray apostrophe can't swallow the rest of the
/// document. A quote that never closes, or runs into a '<' before closing, falls back
/// to the first '>'.
pub(crate) fn find_tag_end(s: &[u8], i: usize) -> Option<usize> {
    let n = s.len();
    let mut j = i + 1;
    let mut quote: u8 = 0;
    let mut after_eq = false;
    while j < n {
        let b = s[j];
        if quote != 0 {
            if b == quote {
                quote = 0;
            } else if b == b'<' {
                break;
            }
        } else if (b == b'"' || b == b'\'') && after_eq {
            quote = b;
        } else if b == b'>' {
            return Some(j);
        }
        if !is_ws(b) {
            after_eq = quote == 0 && b == b'=';
        }
        j += 1;
    }
    if quote != 0 {
        return memchr(b'>', &s[i + 1..]).map(|off| i + 1 + off);
    }
    None
}

/// Parse the tag at `i` (doc[i] == '<'). Anything that isn't `<name ...>` or
/// `</name>` gives `None`.
pub(crate) fn parse_tag(doc: &str, i: usize) -> Option<Tag<'_>> {
    let s = doc.as_bytes();
    let n = s.len();
    let mut k = i + 1;

    let is_end = k < n && s[k] == b'/';
    if is_end {
        k += 1;
    }
    let name_start = k;
    while k < n && is_name_char(s[k]) {
        k += 1;
    }
    if k == name_start || k >= n {
        return None;
    }
    let name = &doc[name_start..k];

    if is_end {
        let mut m = k;
        while m < n && is_ws(s[m]) {
            m += 1;
        }
        if m < n && s[m] == b'>' {
            return Some(Tag {
                name,
                is_end,
                attrs: "",
                start: i,
                end: m,
            });
        }
        return None;
    }

    let end = match s[k] {
        b'>' => k,
        b'/' => find_tag_end(s, i)?,
        b if is_ws(b) => find_tag_end(s, i)?,
        _ => return None,
    };
    Some(Tag {
        name,
        is_end,
        attrs: &doc[k..end],
        start: i,
        end,
    })
}

/// Next end tag named `name` at or after `from`.
pub(crate) fn find_end_tag<'a>(doc: &'a str, from: usize, name: &str) -> Option<Tag<'a>> {
    let s = doc.as_bytes();
    let mut pos = from;
    while let Some(off) = memchr(b'<', &s[pos..]) {
        let i = pos + off;
        if let Some(tag) = parse_tag(doc, i) {
            if tag.is_end && tag.is_named(name) {
                return Some(tag);
            }
        }
        pos = i + 1;
    }
    None
}

/* ============================ Attribute lookup =========================== */

/// Value of the attribute named `wanted` (ASCII case-insensitive), quotes stripped.
/// Only the first attribute with that name counts, and an empty value is no value.
pub(crate) fn attr_value<'a>(attrs: &'a str, wanted: &str) -> Option<&'a str> {
    let tag = attrs.as_bytes();
    let len = tag.len();
    let mut i = 0usize;

    while i < len {
        // skip whitespace and slashes
        while i < len && (is_ws(tag[i]) || tag[i] == b'/') {
            i += 1;
        }
        if i >= len {
            break;
        }

        if !is_name_char(tag[i]) {
            // Not a valid name start; advance to avoid infinite loops.
            i += 1;
            continue;
        }
        let name_start = i;
        while i < len && is_name_char(tag[i]) {
            i += 1;
        }
        let matched = attrs[name_start..i].eq_ignore_ascii_case(wanted);

        while i < len && is_ws(tag[i]) {
            i += 1;
        }

        let mut value = "";
        if i < len && tag[i] == b'=' {
            i += 1;
            while i < len && is_ws(tag[i]) {
                i += 1;
            }
            if i < len && (tag[i] == b'"' || tag[i] == b'\'') {
                let q = tag[i];
                i += 1;
                let value_start = i;
                while i < len && tag[i] != q {
                    i += 1;
                }
                value = &attrs[value_start..i];
                if i < len {
                    i += 1;
                }
            } else {
                let value_start = i;
                while i < len && !is_ws(tag[i]) {
                    i += 1;
                }
                value = &attrs[value_start..i];
            }
        }

        if matched {
            return (!value.is_empty()).then_some(value);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("<b>", Some(("b", false)))]
    #[case("<B class=\"x\">", Some(("B", false)))]
    #[case("</b>", Some(("b", true)))]
    #[case("</b  >", Some(("b", true)))]
    #[case("<hr/>", Some(("hr", false)))]
    #[case("<background-block>", Some(("background-block", false)))]
    #[case("< b>", None)]
    #[case("<>", None)]
    #[case("<b", None)]
    #[case("</b class=x>", None)]
    #[case("<b.x>", None)]
    fn test_parse_tag(#[case] input: &str, #[case] expected: Option<(&str, bool)>) {
        let parsed = parse_tag(input, 0).map(|t| (t.name, t.is_end));
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_span_is_not_s() {
        let tag = parse_tag("<span>", 0).unwrap();
        assert!(!tag.is_named("s"));
        assert!(tag.is_named("SPAN"));
    }

    #[test]
    fn test_quoted_gt_does_not_end_tag() {
        let doc = r#"<b title="a>b">x"#;
        let tag = parse_tag(doc, 0).unwrap();
        assert_eq!(tag.next(), doc.len() - 1);
        assert_eq!(tag.attr("title"), Some("a>b"));
    }

    #[test]
    fn test_stray_apostrophe_is_not_a_quote() {
        let doc = "<p it's>x</p> and 'more'";
        let tag = parse_tag(doc, 0).unwrap();
        assert_eq!(&doc[tag.start..tag.next()], "<p it's>");
    }

    #[test]
    fn test_unclosed_quote_falls_back_to_first_gt() {
        let doc = r#"<b title="oops>x"#;
        let tag = parse_tag(doc, 0).unwrap();
        assert_eq!(tag.end, 14);
    }

    #[test]
    fn test_unclosed_quote_stops_at_next_tag() {
        let doc = r#"<p class="a>Hello</p> <p class="b">"#;
        let tag = parse_tag(doc, 0).unwrap();
        assert_eq!(&doc[tag.start..tag.next()], r#"<p class="a>"#);
    }

    #[rstest]
    #[case(r#" id="x""#, "id", Some("x"))]
    #[case(r#" ID='x y'"#, "id", Some("x y"))]
    #[case(" id=plain", "id", Some("plain"))]
    #[case(r#" data-id="x""#, "id", None)]
    #[case(r#" data-id="x" id="y""#, "id", Some("y"))]
    #[case(r#" id="""#, "id", None)]
    #[case(" id", "id", None)]
    #[case(r#" class="a" href = "http://e.com" "#, "href", Some("http://e.com"))]
    #[case(r#" src="pic.png" /"#, "src", Some("pic.png"))]
    fn test_attr_value(#[case] attrs: &str, #[case] wanted: &str, #[case] expected: Option<&str>) {
        assert_eq!(attr_value(attrs, wanted), expected);
    }

    #[test]
    fn test_find_end_tag_skips_other_names() {
        let doc = "<a href=x>one</abbr> two</A >";
        let tag = find_end_tag(doc, 10, "a").unwrap();
        assert_eq!(tag.start, 24);
        assert_eq!(tag.next(), doc.len());
    }
}
