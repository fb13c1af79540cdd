//! Explicit sharing of an index between callers.
//!
//! An [`IndexContext`] owns the builder and decides, per [`Sharing`], whether
//! [`handle`](IndexContext::handle) returns one shared [`KeyIndex`] or opens
//! a fresh one for every caller. Without an explicit policy the documents'
//! control section decides through its `singleton` option (default: shared).

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::engine::{KeyIndex, KeyIndexBuilder};
use crate::error::TierfigError;
use crate::types::Sharing;

pub struct IndexContext {
    builder: KeyIndexBuilder,
    sharing: Option<Sharing>,
    shared: Mutex<Option<Arc<KeyIndex>>>,
}

impl IndexContext {
    pub fn new(builder: KeyIndexBuilder, sharing: Option<Sharing>) -> Self {
        Self {
            builder,
            sharing,
            shared: Mutex::new(None),
        }
    }

    /// The explicit policy, if one was given.
    pub fn sharing(&self) -> Option<Sharing> {
        self.sharing
    }

    /// An index for the caller: the shared instance, or a newly opened one.
    ///
    /// Opening happens outside the lock. If two callers race to open the
    /// first shared instance, the one stored first is handed to both.
    pub fn handle(&self) -> Result<Arc<KeyIndex>, TierfigError> {
        if self.sharing != Some(Sharing::PerCaller)
            && let Some(index) = self.shared.lock().as_ref()
        {
            return Ok(Arc::clone(index));
        }

        let index = Arc::new(self.builder.clone().open()?);
        let sharing = self.sharing.unwrap_or_else(|| {
            if index.control().singleton() {
                Sharing::Shared
            } else {
                Sharing::PerCaller
            }
        });
        debug!(?sharing, "opened index for context");
        if sharing == Sharing::PerCaller {
            return Ok(index);
        }
        let mut shared = self.shared.lock();
        Ok(Arc::clone(shared.get_or_insert(index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::write_tree;
    use crate::settings::Settings;
    use tempfile::TempDir;

    fn context(files: &[(&str, &str)], sharing: Option<Sharing>) -> (TempDir, IndexContext) {
        let dir = TempDir::new().unwrap();
        write_tree(dir.path(), files);
        let builder = KeyIndex::builder()
            .root_dir(dir.path())
            .settings(Settings::defaults().unwrap());
        (dir, IndexContext::new(builder, sharing))
    }

    #[test]
    fn shared_returns_same_instance() {
        let (_dir, ctx) = context(&[("a.yaml", "port: 1\n")], Some(Sharing::Shared));
        let a = ctx.handle().unwrap();
        let b = ctx.handle().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        a.set("port", 2);
        assert_eq!(b.lookup("port").unwrap(), Some(crate::Node::Integer(2)));
    }

    #[test]
    fn per_caller_returns_fresh_instances() {
        let (_dir, ctx) = context(&[("a.yaml", "port: 1\n")], Some(Sharing::PerCaller));
        let a = ctx.handle().unwrap();
        let b = ctx.handle().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        a.set("port", 2);
        assert_eq!(b.lookup("port").unwrap(), Some(crate::Node::Integer(1)));
    }

    #[test]
    fn control_section_decides_by_default() {
        let (_dir, ctx) = context(&[("a.yaml", "tierfig:\n  singleton: false\n")], None);
        let a = ctx.handle().unwrap();
        let b = ctx.handle().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));

        let (_dir, ctx) = context(&[("a.yaml", "port: 1\n")], None);
        assert!(Arc::ptr_eq(&ctx.handle().unwrap(), &ctx.handle().unwrap()));
    }

    #[test]
    fn explicit_policy_overrides_control_section() {
        let (_dir, ctx) = context(
            &[("a.yaml", "tierfig:\n  singleton: false\n")],
            Some(Sharing::Shared),
        );
        assert_eq!(ctx.sharing(), Some(Sharing::Shared));
        assert!(Arc::ptr_eq(&ctx.handle().unwrap(), &ctx.handle().unwrap()));
    }

    #[test]
    fn per_caller_opens_do_not_hold_the_context_lock() {
        let (_dir, ctx) = context(&[("a.yaml", "port: 1\n")], Some(Sharing::PerCaller));
        let _held = ctx.shared.lock();
        let index = ctx.handle().unwrap();
        assert_eq!(index.lookup("port").unwrap(), Some(crate::Node::Integer(1)));
    }

    #[test]
    fn racing_callers_share_one_instance() {
        let (_dir, ctx) = context(&[("a.yaml", "port: 1\n")], Some(Sharing::Shared));
        let handles: Vec<Arc<KeyIndex>> = std::thread::scope(|s| {
            let workers: Vec<_> = (0..4).map(|_| s.spawn(|| ctx.handle().unwrap())).collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });
        assert!(handles.iter().all(|h| Arc::ptr_eq(h, &handles[0])));
    }

    #[test]
    fn open_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let builder = KeyIndex::builder()
            .root_dir(dir.path().join("missing"))
            .settings(Settings::defaults().unwrap());
        let ctx = IndexContext::new(builder, None);
        assert!(ctx.handle().err().unwrap().is_discovery());
    }
}
