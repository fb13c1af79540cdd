//! Clap adapter for tierfig.
//!
//! Compiled only when the `clap` Cargo feature is enabled (on by default).
//! [`IndexArgs`] embeds into an application's clap derive and gives it
//! `keys|get|whereis|rebuild` subcommands. The only bridge to the core is
//! [`IndexArgs::into_action()`], which produces a framework-agnostic
//! [`IndexAction`](crate::IndexAction) for
//! [`KeyIndex::handle()`](crate::KeyIndex::handle).

use clap::{Args, Subcommand};

use crate::resolve::Query;
use crate::types::IndexAction;

/// Clap-derived args for the index subcommand group.
///
/// ```ignore
/// #[derive(Subcommand)]
/// enum Commands {
///     Config(IndexArgs),
/// }
/// ```
#[derive(Debug, Args)]
pub struct IndexArgs {
    #[command(subcommand)]
    pub action: Option<IndexSubcommand>,
}

/// Lookup scoping shared by `get` and `whereis`.
#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Key name, optionally dotted (e.g. "database.timeout").
    pub key: String,

    /// Only consider occurrences under exactly this path (e.g. "database.pool").
    #[arg(long)]
    pub path: Option<String>,

    /// Only consider documents at this directory level.
    #[arg(long)]
    pub level: Option<usize>,

    /// Only consider occurrences at this nesting depth.
    #[arg(long)]
    pub depth: Option<usize>,

    /// Pick the first match instead of failing on ambiguity.
    #[arg(long)]
    pub force_first: bool,
}

impl QueryArgs {
    pub fn into_query(self) -> Query {
        let mut query = Query::new(&self.key).force_first(self.force_first);
        if let Some(path) = self.path {
            query = query.path(path);
        }
        if let Some(level) = self.level {
            query = query.level(level);
        }
        if let Some(depth) = self.depth {
            query = query.depth(depth);
        }
        query
    }
}

/// Available index subcommands.
#[derive(Debug, Subcommand)]
pub enum IndexSubcommand {
    /// List every key name with its occurrence count.
    Keys,
    /// Show the resolved value of a key.
    Get(QueryArgs),
    /// Show where a key is defined.
    Whereis(QueryArgs),
    /// Rebuild the index if any document changed.
    Rebuild {
        /// Rebuild even if nothing changed.
        #[arg(long)]
        force: bool,
    },
}

impl IndexArgs {
    /// Convert clap-parsed args into an `IndexAction`.
    ///
    /// A bare invocation (no subcommand) maps to `IndexAction::Keys`.
    pub fn into_action(self) -> IndexAction {
        match self.action {
            None | Some(IndexSubcommand::Keys) => IndexAction::Keys,
            Some(IndexSubcommand::Get(q)) => IndexAction::Get {
                query: q.into_query(),
            },
            Some(IndexSubcommand::Whereis(q)) => IndexAction::Whereis {
                query: q.into_query(),
            },
            Some(IndexSubcommand::Rebuild { force }) => IndexAction::Rebuild { force },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    /// Wrapper so we can use `try_parse_from` on the subcommand.
    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        index: IndexArgs,
    }

    fn parse(args: &[&str]) -> IndexAction {
        TestCli::try_parse_from(args).unwrap().index.into_action()
    }

    #[test]
    fn parse_bare_is_keys() {
        assert_eq!(parse(&["test"]), IndexAction::Keys);
        assert_eq!(parse(&["test", "keys"]), IndexAction::Keys);
    }

    #[test]
    fn parse_get_dotted() {
        assert_eq!(
            parse(&["test", "get", "database.timeout"]),
            IndexAction::Get {
                query: Query::new("database.timeout")
            }
        );
    }

    #[test]
    fn parse_get_with_filters() {
        let action = parse(&[
            "test", "get", "key", "--path", "level1.level2", "--level", "0", "--depth", "2",
        ]);
        assert_eq!(
            action,
            IndexAction::Get {
                query: Query::new("key").path("level1.level2").level(0).depth(2)
            }
        );
    }

    #[test]
    fn parse_get_force_first() {
        assert_eq!(
            parse(&["test", "get", "port", "--force-first"]),
            IndexAction::Get {
                query: Query::new("port").force_first(true)
            }
        );
    }

    #[test]
    fn parse_whereis() {
        assert_eq!(
            parse(&["test", "whereis", "port", "--level", "1"]),
            IndexAction::Whereis {
                query: Query::new("port").level(1)
            }
        );
    }

    #[test]
    fn parse_rebuild() {
        assert_eq!(
            parse(&["test", "rebuild"]),
            IndexAction::Rebuild { force: false }
        );
        assert_eq!(
            parse(&["test", "rebuild", "--force"]),
            IndexAction::Rebuild { force: true }
        );
    }

    #[test]
    fn invalid_subcommand_errors() {
        assert!(TestCli::try_parse_from(["test", "nope"]).is_err());
    }

    #[test]
    fn get_requires_key() {
        assert!(TestCli::try_parse_from(["test", "get"]).is_err());
    }

    #[test]
    fn non_numeric_level_errors() {
        assert!(TestCli::try_parse_from(["test", "get", "k", "--level", "top"]).is_err());
    }
}
