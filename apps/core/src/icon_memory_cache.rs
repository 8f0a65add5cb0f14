use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use crate::model::IconArtifact;

/// Bounded in-process cache of rendered artifacts. Eviction is silent;
/// nothing may depend on an entry still being present.
pub struct MemoryIconCache {
    entries: Mutex<LruCache<String, IconArtifact>>,
}

impl MemoryIconCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, key: &str) -> Option<IconArtifact> {
        let mut entries = self.entries.lock().ok()?;
        entries.get(key).cloned()
    }

    pub fn put(&self, key: String, artifact: IconArtifact) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(key, artifact);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryIconCache;
    use crate::model::{IconArtifact, IconOrigin};
    use crate::text_icon::render_text_icon;

    fn artifact(label: &str) -> IconArtifact {
        IconArtifact {
            image: render_text_icon(label, 0x202020ff),
            origin: IconOrigin::Generated,
        }
    }

    #[test]
    fn get_returns_stored_artifact() {
        let cache = MemoryIconCache::new(4);
        cache.put("k".to_string(), artifact("K"));

        let hit = cache.get("k").expect("entry should be present");
        assert_eq!(hit.origin, IconOrigin::Generated);
        assert!(cache.get("missing").is_none());
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let cache = MemoryIconCache::new(2);
        cache.put("a".to_string(), artifact("A"));
        cache.put("b".to_string(), artifact("B"));

        // Touch "a" so "b" becomes the eviction candidate.
        let _ = cache.get("a");
        cache.put("c".to_string(), artifact("C"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
    }
}
