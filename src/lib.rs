//! Hierarchical key-value configuration index. Point it at a directory of
//! YAML and TOML documents and look keys up by name.
//!
//! Tierfig walks a configuration root, flattens every document into
//! individually addressable keys, and answers lookups through one index
//! instead of a pile of hand-merged files.
//!
//! ```ignore
//! let index = KeyIndex::builder()
//!     .root_dir("config")
//!     .open()?;
//!
//! let timeout: u64 = index.get_as("database.timeout")?.unwrap_or(30);
//! ```
//!
//! # Layout
//!
//! The root directory is scanned recursively. Files ending in `.yaml`,
//! `.yml` or `.toml` are documents; hidden files and directories are
//! ignored. A document's **level** is its directory depth below the root:
//!
//! ```text
//! config/
//!   defaults.yaml          level 0
//!   env/
//!     prod.yaml            level 1
//!     eu/
//!       frankfurt.toml     level 2
//! ```
//!
//! Inside a document, every mapping entry is a key. Its **path** is the
//! chain of mapping names above it and its **depth** is the length of that
//! chain. In
//!
//! ```yaml
//! database:
//!   pool:
//!     size: 10
//! ```
//!
//! `size` lives at path `database.pool`, depth 2. `database` and `pool` are
//! keys too, and their value is the subtree below them.
//!
//! # Precedence
//!
//! A lookup by key name collects every occurrence that passes the query's
//! filters, then picks winners:
//!
//! ```text
//! deeper level wins        config/env/prod.yaml over config/defaults.yaml
//!        ↓ then
//! shallower depth wins     port over server.port
//! ```
//!
//! One winner is the answer. Several winners with the same level and depth
//! are **ambiguous** and the lookup fails with
//! [`TierfigError::AmbiguousKey`], naming every candidate location. Narrow
//! the query with a [`Query`] or let it take the first candidate:
//!
//! ```ignore
//! index.lookup(Query::new("port").path("web"))?;
//! index.lookup(Query::new("port").level(1).depth(1))?;
//! index.lookup(Query::new("port").force_first(true))?;
//! ```
//!
//! A dotted name is shorthand for key plus path: `"web.port"` and
//! `Query::new("port").path("web")` address the same thing. Path filters
//! are exact, not prefixes.
//!
//! # Cache
//!
//! The built index is saved next to the documents (`.index.yaml` by
//! default) and reused when no document was added, removed or modified
//! since. A missing, corrupt or outdated cache is rebuilt silently.
//! With [`Refresh::OnAccess`] (the default) every lookup checks document
//! modification times and rebuilds if something changed;
//! [`Refresh::Manual`] leaves that to [`KeyIndex::reload`].
//!
//! # Environment expansion
//!
//! String values returned from lookups have `${NAME}`, `$NAME` and
//! `${NAME:-default}` replaced from the process environment. Unknown
//! variables stay as written. The cache stores values unexpanded.
//!
//! # Overlay
//!
//! [`KeyIndex::set`] places a value in an in-memory overlay that beats
//! every document. The value replaces the entry the query resolves to, so
//! `set("database.timeout", 5)` is also what `lookup("timeout")` returns when
//! that entry wins. Overlay values are expanded like document values,
//! survive rebuilds and are never persisted.
//!
//! # Concurrency
//!
//! [`KeyIndex`] is `Send + Sync`. Readers work on an immutable snapshot of
//! the index; a rebuild swaps in a new snapshot and concurrent callers that
//! notice the same change rebuild it once. [`IndexContext`] decides whether
//! callers share one index or each open their own, following the
//! `singleton` option of the documents' control section when no explicit
//! [`Sharing`] is given.
//!
//! # Control section
//!
//! A top-level mapping named by the control key (`tierfig` by default) is
//! not indexed. Its entries are merged across documents into a
//! [`ControlBlock`] that configures the index itself.
//!
//! # Process settings
//!
//! [`Settings`] reads `TIERFIG_HOME` and `TIERFIG_INDEX_FILE` through
//! [confique](https://docs.rs/confique); the builder falls back to them when
//! no root or cache file name is given explicitly.
//!
//! # Clap adapter
//!
//! The core has no dependency on any CLI framework. Operations are
//! expressed as [`IndexAction`] values and answered with [`IndexResult`].
//! For [clap](https://docs.rs/clap) users the `clap` feature (on by
//! default) provides [`IndexArgs`], which gives an application
//! `keys|get|whereis|rebuild` subcommands:
//!
//! ```ignore
//! #[derive(Subcommand)]
//! enum Commands {
//!     Config(IndexArgs),
//! }
//!
//! Commands::Config(args) => index.handle_and_print(&args.into_action())?,
//! ```
//!
//! # Rich errors
//!
//! The optional `rich-errors` feature derives
//! [`miette::Diagnostic`](https://docs.rs/miette) for [`TierfigError`].

pub mod error;
pub mod types;

#[cfg(feature = "clap")]
mod cli;
mod context;
mod discover;
mod document;
mod engine;
mod expand;
mod flatten;
mod index;
mod keypath;
mod ops;
mod overlay;
mod resolve;
mod settings;
mod store;
mod tree;

#[cfg(test)]
mod fixtures;

#[cfg(feature = "clap")]
pub use cli::{IndexArgs, IndexSubcommand, QueryArgs};
pub use context::IndexContext;
pub use discover::discover;
pub use document::DocumentFormat;
pub use engine::{DEFAULT_CONTROL_KEY, KeyIndex, KeyIndexBuilder};
pub use error::TierfigError;
pub use expand::{expand_env, expand_node, expand_node_with, expand_with};
pub use index::{ControlBlock, Index, KeyEntry, SkippedFile, SourceFile};
pub use keypath::KeyPath;
pub use ops::IndexResult;
pub use resolve::{Location, Query};
pub use settings::Settings;
pub use store::StaleReason;
pub use tree::Node;
pub use types::{IndexAction, Refresh, RootPath, Sharing};
