//! Scoped context and tags per execution unit
//!
//! - `ExecutionContext`: handle to the ambient context of one dispatcher
//! - `TagGuard`: RAII guard that pops a pushed tag group
//!
//! Storage is keyed by the dispatcher's context key and lives in a
//! `thread_local!`. With the `async-context` feature, futures run under
//! [`ExecutionContext::scope`] get their own task-local store instead, so
//! tasks sharing a worker thread never see each other's values.
//!
//! Unscoped async tasks fall back to the thread store. Every task polled on
//! the same worker thread then reads and writes the same context and tags,
//! so wrap each task in `scope` when it sets context across an `.await`.
//!
//! A key's entry is evicted as soon as it holds no fields and no tags.

use super::field_value::{FieldValue, Payload};
use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Scope {
    context: Payload,
    tags: Vec<Vec<String>>,
}

impl Scope {
    fn is_empty(&self) -> bool {
        self.context.is_empty() && self.tags.is_empty()
    }
}

type Store = RefCell<HashMap<Arc<str>, Scope>>;

thread_local! {
    static THREAD_STORE: Store = RefCell::new(HashMap::new());
}

#[cfg(feature = "async-context")]
tokio::task_local! {
    static TASK_STORE: Store;
}

fn with_store<R>(f: impl FnOnce(&Store) -> R) -> R {
    #[cfg(feature = "async-context")]
    {
        if TASK_STORE.try_with(|_| ()).is_ok() {
            return TASK_STORE.with(f);
        }
    }
    THREAD_STORE.with(f)
}

/// Handle to the ambient tags and key/value context of one dispatcher
///
/// Values are visible only on the execution unit that set them: the current
/// thread, or the enclosing [`ExecutionContext::scope`] for async tasks.
///
/// # Example
///
/// ```
/// use rust_dispatch_logger::ExecutionContext;
///
/// let ctx = ExecutionContext::new("docs");
/// ctx.set("request_id", "r-42");
///
/// ctx.tagged(["api"], || {
///     ctx.tagged(["v2"], || {
///         assert_eq!(ctx.tags(), vec!["api", "v2"]);
///     });
/// });
///
/// assert!(ctx.tags().is_empty());
/// assert_eq!(ctx.get("request_id").unwrap().as_str(), Some("r-42"));
/// ctx.clear();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    key: Arc<str>,
}

impl ExecutionContext {
    pub fn new(key: impl AsRef<str>) -> Self {
        Self {
            key: Arc::from(key.as_ref()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn with_scope<R>(&self, f: impl FnOnce(&mut Scope) -> R) -> R {
        with_store(|store| {
            let mut store = store.borrow_mut();
            let scope = store.entry(Arc::clone(&self.key)).or_default();
            let result = f(scope);
            if scope.is_empty() {
                store.remove(&self.key);
            }
            result
        })
    }

    fn read_scope<R>(&self, f: impl FnOnce(Option<&Scope>) -> R) -> R {
        with_store(|store| f(store.borrow().get(&self.key)))
    }

    pub fn get(&self, field: &str) -> Option<FieldValue> {
        self.read_scope(|scope| scope.and_then(|s| s.context.get(field).cloned()))
    }

    /// Set a context field; an existing value is overwritten
    pub fn set<K, V>(&self, field: K, value: V)
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.with_scope(|scope| {
            scope.context.insert(field, value);
        });
    }

    pub fn remove(&self, field: &str) -> Option<FieldValue> {
        self.with_scope(|scope| scope.context.remove(field))
    }

    /// Snapshot of the context fields
    pub fn context(&self) -> Payload {
        self.read_scope(|scope| scope.map(|s| s.context.clone()).unwrap_or_default())
    }

    /// Mutate the context map in place
    ///
    /// The closure must not log or touch this context again; the store is
    /// borrowed for its duration.
    pub fn update<R>(&self, f: impl FnOnce(&mut Payload) -> R) -> R {
        self.with_scope(|scope| f(&mut scope.context))
    }

    /// Active tag groups flattened into one ordered list
    pub fn tags(&self) -> Vec<String> {
        self.read_scope(|scope| {
            scope
                .map(|s| s.tags.iter().flatten().cloned().collect())
                .unwrap_or_default()
        })
    }

    /// Push a tag group; it is popped when the guard drops
    #[must_use = "tags are popped as soon as the guard is dropped"]
    pub fn push_tags<I, S>(&self, tags: I) -> TagGuard
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let group: Vec<String> = tags.into_iter().map(Into::into).collect();
        let depth = self.with_scope(|scope| {
            let depth = scope.tags.len();
            scope.tags.push(group);
            depth
        });
        TagGuard {
            context: self.clone(),
            depth,
            _not_send: PhantomData,
        }
    }

    /// Run `body` with `tags` appended to the active tags
    ///
    /// The group is popped on every exit path, unwinding included.
    pub fn tagged<I, S, F, R>(&self, tags: I, body: F) -> R
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce() -> R,
    {
        let _guard = self.push_tags(tags);
        body()
    }

    /// Drop all context fields and tags of this execution unit
    pub fn clear(&self) {
        with_store(|store| {
            store.borrow_mut().remove(&self.key);
        });
    }

    /// Run a future with its own isolated context store
    #[cfg(feature = "async-context")]
    pub async fn scope<F>(future: F) -> F::Output
    where
        F: std::future::Future,
    {
        TASK_STORE.scope(RefCell::new(HashMap::new()), future).await
    }

    /// Run a closure with its own isolated context store
    #[cfg(feature = "async-context")]
    pub fn sync_scope<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        TASK_STORE.sync_scope(RefCell::new(HashMap::new()), f)
    }
}

/// RAII guard for a pushed tag group
///
/// Dropping it removes the group and anything pushed after it.
pub struct TagGuard {
    context: ExecutionContext,
    depth: usize,
    _not_send: PhantomData<*const ()>,
}

impl Drop for TagGuard {
    fn drop(&mut self) {
        let depth = self.depth;
        self.context.with_scope(|scope| scope.tags.truncate(depth));
    }
}
