// src/convert.rs
//
// HTML → BBCode conversion.
//
// - One pass per rule, in table order. A pass rewrites only tags whose whole name equals
//   the rule's source tag (ASCII case-insensitive); everything else is copied through.
// - Wrap:      <t>       → [target]   <t id="x"> → [target=x]   </t> → [/target]
//   ListItem:  <t>       → [*]        </t> → (dropped)
//   Size(n):   <t>       → [size=n]   </t> → [/size]
//   Hr:        <t>       → [hr]       </t> → (dropped)
//   Url:       <t href="X">TEXT</t>   → [url=X]TEXT[/url]   (TEXT copied verbatim)
//   Image:     <t src="X">            → [img]X[/img]
// - Cleanup: whatever still looks like `<[^>]+>` is removed, then &lt; &gt; &amp; are
//   unescaped in one non-recursive scan, then whitespace and byte-order marks are trimmed.
// - Total: every input string produces an output string. Leftover markup is swept up by
//   the cleanup, never reported.

use memchr::memchr;

use crate::rules::{OutputKind, RuleTable, TagRule};
use crate::tags::{find_end_tag, parse_tag, Tag};

/// Convert `source` with the built-in rule table.
pub fn convert(source: &str) -> String {
    Converter::default().convert(source)
}

/// Runs a [`RuleTable`] over documents. Holds no state between calls.
#[derive(Debug, Clone, Copy)]
pub struct Converter<'t> {
    table: &'t RuleTable,
}

impl Default for Converter<'static> {
    fn default() -> Self {
        Self::new(RuleTable::builtin())
    }
}

impl<'t> Converter<'t> {
    pub fn new(table: &'t RuleTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'t RuleTable {
        self.table
    }

    pub fn convert(&self, source: &str) -> String {
        let mut doc = source.to_owned();
        for rule in self.table.rules() {
            let (next, hits) = apply_rule(&doc, rule);
            if hits > 0 {
                log::trace!("<{}>: rewrote {hits} tag(s)", rule.source());
                doc = next;
            }
        }
        let out = trim_output(&unescape_entities(&strip_tags(&doc))).to_owned();
        log::debug!(
            "converted {} bytes of HTML into {} bytes of BBCode",
            source.len(),
            out.len()
        );
        out
    }
}

/* ============================== Rule passes ============================== */

struct Replacement {
    text: String,
    /// Where scanning resumes in the source document.
    resume: usize,
}

impl Replacement {
    fn tag(tag: &Tag<'_>, text: impl Into<String>) -> Option<Self> {
        Some(Self {
            text: text.into(),
            resume: tag.next(),
        })
    }
}

/// Run one rule over the whole document. Returns the new text and how many tags
/// were rewritten.
fn apply_rule(doc: &str, rule: &TagRule) -> (String, usize) {
    let name = rule.source();
    match rule.kind() {
        OutputKind::Wrap(target) => rewrite_tags(doc, name, |tag| {
            if tag.is_end {
                Replacement::tag(tag, format!("[/{target}]"))
            } else if let Some(id) = tag.attr("id") {
                Replacement::tag(tag, format!("[{target}={id}]"))
            } else {
                Replacement::tag(tag, format!("[{target}]"))
            }
        }),
        OutputKind::ListItem => rewrite_tags(doc, name, |tag| {
            Replacement::tag(tag, if tag.is_end { "" } else { "[*]" })
        }),
        OutputKind::Size(size) => rewrite_tags(doc, name, |tag| {
            if tag.is_end {
                Replacement::tag(tag, "[/size]")
            } else {
                Replacement::tag(tag, format!("[size={size}]"))
            }
        }),
        OutputKind::Hr => rewrite_tags(doc, name, |tag| {
            Replacement::tag(tag, if tag.is_end { "" } else { "[hr]" })
        }),
        OutputKind::Url => rewrite_tags(doc, name, |tag| {
            if tag.is_end {
                return None;
            }
            let href = tag.attr("href")?;
            let close = find_end_tag(doc, tag.next(), name)?;
            Some(Replacement {
                text: format!("[url={href}]{}[/url]", &doc[tag.next()..close.start]),
                resume: close.next(),
            })
        }),
        OutputKind::Image => rewrite_tags(doc, name, |tag| {
            if tag.is_end {
                return None;
            }
            let src = tag.attr("src")?;
            Replacement::tag(tag, format!("[img]{src}[/img]"))
        }),
    }
}

/// Copy `doc`, offering every tag named `name` to `edit`. `None` keeps the tag as written.
fn rewrite_tags<F>(doc: &str, name: &str, mut edit: F) -> (String, usize)
where
    F: FnMut(&Tag<'_>) -> Option<Replacement>,
{
    let bytes = doc.as_bytes();
    let mut out = String::with_capacity(doc.len());
    let mut copied = 0usize;
    let mut pos = 0usize;
    let mut hits = 0usize;

    while let Some(off) = memchr(b'<', &bytes[pos..]) {
        let i = pos + off;
        let replacement = parse_tag(doc, i)
            .filter(|tag| tag.is_named(name))
            .and_then(|tag| edit(&tag));
        match replacement {
            Some(rep) => {
                out.push_str(&doc[copied..i]);
                out.push_str(&rep.text);
                copied = rep.resume;
                pos = rep.resume;
                hits += 1;
            }
            None => pos = i + 1,
        }
        if pos >= bytes.len() {
            break;
        }
    }
    out.push_str(&doc[copied..]);
    (out, hits)
}

/* ================================ Cleanup ================================ */

/// Trim whitespace and any byte-order mark from both ends.
fn trim_output(doc: &str) -> &str {
    doc.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// Remove every `<...>` run with at least one byte between the brackets.
///
/// Not quote-aware on purpose: by now the known tags are gone and this only has to
/// match what a plain `<[^>]+>` would.
pub fn strip_tags(doc: &str) -> String {
    let bytes = doc.as_bytes();
    let mut out = String::with_capacity(doc.len());
    let mut copied = 0usize;
    let mut pos = 0usize;

    while let Some(off) = memchr(b'<', &bytes[pos..]) {
        let i = pos + off;
        let Some(gt) = memchr(b'>', &bytes[i + 1..]).map(|o| i + 1 + o) else {
            break;
        };
        if gt == i + 1 {
            // "<>" stays
            pos = gt;
            continue;
        }
        out.push_str(&doc[copied..i]);
        copied = gt + 1;
        pos = gt + 1;
        if pos >= bytes.len() {
            break;
        }
    }
    out.push_str(&doc[copied..]);
    out
}

/// Unescape `&lt;`, `&gt;` and `&amp;`. Produced characters are never rescanned, so
/// `&amp;lt;` becomes `&lt;` and stays that way.
pub fn unescape_entities(doc: &str) -> String {
    let bytes = doc.as_bytes();
    let mut out = String::with_capacity(doc.len());
    let mut copied = 0usize;
    let mut pos = 0usize;

    while let Some(off) = memchr(b'&', &bytes[pos..]) {
        let i = pos + off;
        let rest = &bytes[i + 1..];
        let hit = if rest.starts_with(b"lt;") {
            Some(('<', 4))
        } else if rest.starts_with(b"gt;") {
            Some(('>', 4))
        } else if rest.starts_with(b"amp;") {
            Some(('&', 5))
        } else {
            None
        };
        match hit {
            Some((ch, len)) => {
                out.push_str(&doc[copied..i]);
                out.push(ch);
                copied = i + len;
                pos = i + len;
            }
            None => pos = i + 1,
        }
        if pos >= bytes.len() {
            break;
        }
    }
    out.push_str(&doc[copied..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("<b>hi</b>", "[b]hi[/b]")]
    #[case("<strong>hi</strong>", "[b]hi[/b]")]
    #[case("<B>hi</B>", "[b]hi[/b]")]
    #[case("<em>a</em> <i>b</i>", "[i]a[/i] [i]b[/i]")]
    #[case("<s>x</s><span>y</span><del>z</del>", "[strike]x[/strike]y[strike]z[/strike]")]
    #[case("<blockquote>q</blockquote>", "[sidebar]q[/sidebar]")]
    #[case("<th>h</th><td>d</td>", "[td]h[/td][td]d[/td]")]
    #[case("<ul><li>one</li><li>two</li></ul>", "[list][*]one[*]two[/list]")]
    #[case("<li>one</li><li>two</li>", "[*]one[*]two")]
    #[case("<h1>Title</h1>", "[size=150]Title[/size]")]
    #[case("<h2>T</h2>", "[size=135]T[/size]")]
    #[case("<h3>T</h3>", "[size=120]T[/size]")]
    #[case("<h4>T</h4>", "[size=105]T[/size]")]
    #[case("<h5>T</h5>", "[size=90]T[/size]")]
    #[case("<p>T</p>", "[size=75]T[/size]")]
    #[case("<h6>T</h6>", "T")]
    #[case("a<hr>b", "a[hr]b")]
    #[case("a<hr/>b<hr></hr>c", "a[hr]b[hr]c")]
    #[case("<unknowntag>x</unknowntag>", "x")]
    #[case("  <b>padded</b>\n\n", "[b]padded[/b]")]
    #[case("\u{feff}<b>hi</b>\n", "[b]hi[/b]")]
    #[case(r#"<p class="a>Hello</p> <p class="b">World</p>"#, "[size=75]Hello[/size] [size=75]World[/size]")]
    fn test_convert(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(convert(input), expected);
    }

    #[rstest]
    #[case(r#"<box id="x">t</box>"#, "[box=x]t[/box]")]
    #[case(r#"<anchor class="c" id='intro'>t</anchor>"#, "[anchor=intro]t[/anchor]")]
    #[case(r#"<box data-id="x">t</box>"#, "[box]t[/box]")]
    #[case(r#"<box id="">t</box>"#, "[box]t[/box]")]
    #[case(r#"<color id="red">t</color>"#, "[color=red]t[/color]")]
    fn test_wrap_with_id(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(convert(input), expected);
    }

    #[rstest]
    #[case(r#"<a href="http://e.com">click</a>"#, "[url=http://e.com]click[/url]")]
    #[case(r#"<A class="x" HREF='http://e.com'>click</A>"#, "[url=http://e.com]click[/url]")]
    #[case(
        r#"<a href="http://e.com"><b>bold</b> link</a>"#,
        "[url=http://e.com][b]bold[/b] link[/url]"
    )]
    #[case(r#"<a href="x">multi
line</a>"#, "[url=x]multi\nline[/url]")]
    #[case(r#"<a name="top">here</a>"#, "here")]
    #[case(r#"<a href="x">never closed"#, "never closed")]
    #[case(
        r#"<a href="1">one</a> and <a href="2">two</a>"#,
        "[url=1]one[/url] and [url=2]two[/url]"
    )]
    #[case(r#"<abbr href="x">t</abbr>"#, "t")]
    fn test_links(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(convert(input), expected);
    }

    #[rstest]
    #[case(r#"<img src="pic.png">"#, "[img]pic.png[/img]")]
    #[case(r#"<img alt="a" src='pic.png' />"#, "[img]pic.png[/img]")]
    #[case(r#"<img alt="no source">"#, "")]
    fn test_images(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(convert(input), expected);
    }

    #[test]
    fn test_whole_document() {
        let html = r#"
<h1>Welcome</h1>
<p>Read the <a href="https://example.com/rules">rules</a> first.</p>
<ul>
  <li><strong>Be</strong> nice</li>
  <li><em>Stay</em> on topic</li>
</ul>
<hr>
<div class="footer"><box id="notes">Tom &amp; Jerry &lt;3</box></div>
"#;
        let expected = "[size=150]Welcome[/size]
[size=75]Read the [url=https://example.com/rules]rules[/url] first.[/size]
[list]
  [*][b]Be[/b] nice
  [*][i]Stay[/i] on topic
[/list]
[hr]
[box=notes]Tom & Jerry <3[/box]";
        assert_eq!(convert(html), expected);
    }

    #[test]
    fn test_custom_table() {
        let table = RuleTable::new(vec![
            TagRule::wrap("span", "color"),
            TagRule::new("br", OutputKind::Hr),
        ]);
        let converter = Converter::new(&table);
        assert_eq!(
            converter.convert("<span id=red>x</span><br><b>y</b>"),
            "[color=red]x[/color][hr]y"
        );
    }

    #[test]
    fn test_quoted_gt_inside_known_tag() {
        assert_eq!(convert(r#"<b title="a>b">x</b>"#), "[b]x[/b]");
    }

    #[rstest]
    #[case("a <b> c", "a  c")]
    #[case("a < b", "a < b")]
    #[case("<>", "<>")]
    #[case("x <<b> y", "x  y")]
    #[case("<!-- note -->text", "text")]
    #[case("1 < 2 > 0", "1  0")]
    fn test_strip_tags(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_tags(input), expected);
    }

    #[rstest]
    #[case("a &amp; b &lt; c", "a & b < c")]
    #[case("&gt;&lt;", "><")]
    #[case("&amp;lt;", "&lt;")]
    #[case("&amp;amp;", "&amp;")]
    #[case("&nbsp; &quot;", "&nbsp; &quot;")]
    #[case("&&lt;", "&<")]
    #[case("trailing &", "trailing &")]
    fn test_unescape_entities(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(unescape_entities(input), expected);
    }

    #[test]
    fn test_entities_unescaped_once() {
        assert_eq!(convert("a &amp; b &lt; c"), "a & b < c");
        assert_eq!(convert("&amp;lt;b&amp;gt;"), "&lt;b&gt;");
    }

    #[test]
    fn test_escaped_markup_is_not_stripped() {
        assert_eq!(convert("&lt;b&gt;bold&lt;/b&gt;"), "<b>bold</b>");
    }

    #[test]
    fn test_output_is_stable_under_reconversion() {
        let once = convert("<h2>x</h2><ul><li>a</li></ul><a href=\"u\">l</a>");
        assert_eq!(convert(&once), once);
    }

    proptest! {
        #[test]
        fn prop_tag_free_text_is_unescaped_and_trimmed(text in "[^<]{0,64}") {
            let expected = unescape_entities(&text);
            prop_assert_eq!(convert(&text), trim_output(&expected));
        }

        #[test]
        fn prop_convert_is_idempotent_without_entities(text in "[a-z<>/ =\"\\[\\]\n]{0,64}") {
            let once = convert(&text);
            prop_assert_eq!(convert(&once), once);
        }

        #[test]
        fn prop_convert_never_panics(text in "\\PC{0,64}") {
            let _ = convert(&text);
        }
    }
}
