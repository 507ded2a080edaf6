// src/rules.rs
//
// The tag-to-tag rule table.
//
// Each `TagRule` names an HTML tag and the `OutputKind` that decides how its
// opening and closing occurrences are written out as BBCode. The table is ordered:
// the converter runs one pass per rule, top to bottom.

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::error::RuleError;
use crate::tags::is_name_char;

/// How a matched tag is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputKind {
    /// `[target]...[/target]`, or `[target=<id>]` when the opening tag has an `id`.
    Wrap(String),
    /// `[*]`, closing tag dropped.
    ListItem,
    /// `[size=n]...[/size]`.
    Size(u16),
    /// `[hr]`, closing tag dropped.
    Hr,
    /// The whole `<a href="X">TEXT</a>` span becomes `[url=X]TEXT[/url]`.
    Url,
    /// `<img src="X">` becomes `[img]X[/img]`.
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRule {
    source: String,
    kind: OutputKind,
}

impl TagRule {
    pub fn new(source: impl Into<String>, kind: OutputKind) -> Self {
        Self {
            source: source.into(),
            kind,
        }
    }

    pub fn wrap(source: &str, target: &str) -> Self {
        Self::new(source, OutputKind::Wrap(target.to_owned()))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> &OutputKind {
        &self.kind
    }

    /// Reject rules the converter could not match or render safely.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.source.is_empty() {
            return Err(RuleError::EmptyTag);
        }
        if !self.source.bytes().all(is_name_char) {
            return Err(RuleError::InvalidTag(self.source.clone()));
        }
        if let OutputKind::Wrap(target) = &self.kind {
            if target.is_empty() {
                return Err(RuleError::EmptyTarget {
                    tag: self.source.clone(),
                });
            }
            if target.contains(['[', ']', '=']) {
                return Err(RuleError::InvalidTarget {
                    tag: self.source.clone(),
                    target: target.clone(),
                });
            }
        }
        Ok(())
    }
}

static BUILTIN: Lazy<RuleTable> = Lazy::new(|| {
    use OutputKind::*;
    RuleTable::new(vec![
        // Floating, alignment, indentation, box
        TagRule::wrap("float", "float"),
        TagRule::wrap("align", "align"),
        TagRule::wrap("tab", "tab"),
        TagRule::wrap("box", "box"),
        // Sidebar
        TagRule::wrap("sidebar", "sidebar"),
        TagRule::wrap("blockquote", "sidebar"),
        // Bold / italic / underline
        TagRule::wrap("b", "b"),
        TagRule::wrap("strong", "b"),
        TagRule::wrap("i", "i"),
        TagRule::wrap("em", "i"),
        TagRule::wrap("u", "u"),
        TagRule::wrap("sup", "sup"),
        TagRule::wrap("sub", "sub"),
        // Strike
        TagRule::wrap("strike", "strike"),
        TagRule::wrap("del", "strike"),
        TagRule::wrap("s", "strike"),
        // Unformatted text, code (forum only)
        TagRule::wrap("pre", "pre"),
        TagRule::wrap("code", "code"),
        TagRule::new("hr", Hr),
        // Links and images
        TagRule::new("a", Url),
        TagRule::new("img", Image),
        // Anchors, nations, regions, WA proposals and resolutions
        TagRule::wrap("anchor", "anchor"),
        TagRule::wrap("nation", "nation"),
        TagRule::wrap("region", "region"),
        TagRule::wrap("proposal", "proposal"),
        TagRule::wrap("resolution", "resolution"),
        TagRule::wrap("quote", "quote"),
        // Size
        TagRule::new("h1", Size(150)),
        TagRule::new("h2", Size(135)),
        TagRule::new("h3", Size(120)),
        TagRule::new("h4", Size(105)),
        TagRule::new("h5", Size(90)),
        TagRule::new("p", Size(75)),
        // Coloration
        TagRule::wrap("color", "color"),
        TagRule::wrap("background", "background"),
        TagRule::wrap("background-block", "background-block"),
        TagRule::wrap("spoiler", "spoiler"),
        // Lists
        TagRule::wrap("ul", "list"),
        TagRule::wrap("ol", "list"),
        TagRule::new("li", ListItem),
        // Tables
        TagRule::wrap("table", "table"),
        TagRule::wrap("tr", "tr"),
        TagRule::wrap("td", "td"),
        TagRule::wrap("th", "td"),
    ])
});

/// Ordered, immutable set of rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<TagRule>,
}

impl RuleTable {
    pub fn new(rules: Vec<TagRule>) -> Self {
        Self { rules }
    }

    /// The table shipped with the binary.
    pub fn builtin() -> &'static RuleTable {
        &BUILTIN
    }

    pub fn rules(&self) -> &[TagRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, source: &str) -> Option<&TagRule> {
        self.rules
            .iter()
            .find(|r| r.source.eq_ignore_ascii_case(source))
    }

    /// Copy of this table with `overrides` applied. A rule for a tag already in the
    /// table takes its slot; rules for new tags go at the end, in the given order.
    pub fn with_overrides(&self, overrides: Vec<TagRule>) -> Result<RuleTable, RuleError> {
        let mut seen = HashSet::new();
        let mut rules = self.rules.clone();
        for rule in overrides {
            rule.validate()?;
            if !seen.insert(rule.source.to_ascii_lowercase()) {
                return Err(RuleError::Duplicate(rule.source));
            }
            match rules
                .iter_mut()
                .find(|r| r.source.eq_ignore_ascii_case(&rule.source))
            {
                Some(slot) => *slot = rule,
                None => rules.push(rule),
            }
        }
        Ok(RuleTable::new(rules))
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::builtin().clone()
    }
}
