//! Versioned category registry.
//!
//! Categories are opaque strings, unique by exact match. The set is closed
//! at training time but may grow at runtime (user-defined categories appended
//! through feedback). Readers take an immutable snapshot so a concurrent
//! registration never exposes a half-applied label list.

use std::sync::{Arc, RwLock};

/// Reserved label returned when no tier produces a trustworthy answer.
pub const FALLBACK_CATEGORY: &str = "Others";

/// Immutable view of the label set at a point in time.
///
/// Labels keep their registration order; the fallback category is always
/// present.
#[derive(Debug, Clone)]
pub struct CategorySnapshot {
    version: u64,
    labels: Vec<String>,
}

impl CategorySnapshot {
    /// Monotonic version, bumped on every successful registration.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// All known labels in registration order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// Registry of known categories with snapshot-read semantics.
///
/// Writers swap a fresh [`Arc<CategorySnapshot>`] under the lock; readers
/// clone the current `Arc` and work against a consistent label list for as
/// long as they hold it.
pub struct CategoryRegistry {
    inner: RwLock<Arc<CategorySnapshot>>,
}

impl CategoryRegistry {
    /// Build a registry from an initial label list.
    ///
    /// Duplicates are dropped (first occurrence wins) and the fallback
    /// category is appended if missing.
    pub fn new<I, S>(initial: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut labels: Vec<String> = Vec::new();
        for label in initial {
            let label = label.into();
            if !label.is_empty() && !labels.contains(&label) {
                labels.push(label);
            }
        }
        if !labels.iter().any(|l| l == FALLBACK_CATEGORY) {
            labels.push(FALLBACK_CATEGORY.to_string());
        }

        Self {
            inner: RwLock::new(Arc::new(CategorySnapshot { version: 1, labels })),
        }
    }

    /// Current snapshot. Cheap: one `Arc` clone under a read lock.
    pub fn snapshot(&self) -> Arc<CategorySnapshot> {
        self.inner.read().expect("registry lock poisoned").clone()
    }

    /// Append a new label. Returns `false` (and leaves the version untouched)
    /// if the label is empty or already registered.
    pub fn register(&self, label: &str) -> bool {
        if label.is_empty() {
            return false;
        }
        let mut guard = self.inner.write().expect("registry lock poisoned");
        if guard.labels.iter().any(|l| l == label) {
            return false;
        }
        let mut labels = guard.labels.clone();
        labels.push(label.to_string());
        let next = CategorySnapshot {
            version: guard.version + 1,
            labels,
        };
        tracing::debug!(label, version = next.version, "category registered");
        *guard = Arc::new(next);
        true
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_always_present() {
        let reg = CategoryRegistry::new(["Fuel", "Travel"]);
        let snap = reg.snapshot();
        assert!(snap.contains(FALLBACK_CATEGORY));
        assert_eq!(snap.labels().len(), 3);
    }

    #[test]
    fn initial_duplicates_dropped() {
        let reg = CategoryRegistry::new(["Fuel", "Fuel", "Travel"]);
        assert_eq!(reg.snapshot().labels(), &["Fuel", "Travel", "Others"]);
    }

    #[test]
    fn register_appends_and_bumps_version() {
        let reg = CategoryRegistry::new(["Fuel"]);
        let before = reg.snapshot();

        assert!(reg.register("Gifts"));
        let after = reg.snapshot();

        assert_eq!(after.version(), before.version() + 1);
        assert!(after.contains("Gifts"));
        // The old snapshot is unaffected.
        assert!(!before.contains("Gifts"));
    }

    #[test]
    fn register_existing_is_noop() {
        let reg = CategoryRegistry::new(["Fuel"]);
        let v = reg.snapshot().version();
        assert!(!reg.register("Fuel"));
        assert!(!reg.register(""));
        assert_eq!(reg.snapshot().version(), v);
    }
}
