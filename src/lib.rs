//! # htb
//!
//! HTML to BBCode conversion driven by a table of tag rules.
//!
//! ```text
//! <h1>Title</h1>                     → [size=150]Title[/size]
//! <a href="http://e.com">click</a>   → [url=http://e.com]click[/url]
//! <ul><li>one</li></ul>              → [list][*]one[/list]
//! ```
//!
//! [`convert`] is the whole core: a pure, total function over strings. The remaining
//! modules are what the `htb` binary wraps around it (config, file endpoints, the watch
//! loop and its command shell).

pub mod config;
pub mod convert;
pub mod endpoint;
pub mod error;
pub mod report;
pub mod rules;
pub mod session;
pub mod shell;
mod tags;
pub mod watch;

pub use convert::{convert, Converter};
pub use rules::{OutputKind, RuleTable, TagRule};
