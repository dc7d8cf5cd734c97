use std::collections::HashMap;

use super::codec::RESERVED_INDEX;

/// Versions of every index drawn by the most recent pick pass.
///
/// A pick only trusts a decoded index if it appears here, which keeps a color
/// left over from an older frame (or from an entity that was despawned and had
/// its slot reused) from resolving to the wrong object.
#[derive(Debug, Default)]
pub struct IdentifierRegistry {
    versions: HashMap<u32, u32>,
}

impl IdentifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything recorded by the previous pass
    pub fn reset(&mut self) {
        self.versions.clear();
    }

    pub fn record(&mut self, index: u32, version: u32) {
        if index == RESERVED_INDEX {
            log::warn!("Refusing to record reserved pick index {}", index);
            return;
        }
        self.versions.insert(index, version);
    }

    pub fn lookup(&self, index: u32) -> Option<u32> {
        self.versions.get(&index).copied()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_lookup() {
        let mut registry = IdentifierRegistry::new();
        registry.record(7, 2);

        assert_eq!(registry.lookup(7), Some(2));
        assert_eq!(registry.lookup(8), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_last_write_wins() {
        let mut registry = IdentifierRegistry::new();
        registry.record(7, 2);
        registry.record(7, 3);

        assert_eq!(registry.lookup(7), Some(3));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reset_drops_previous_pass() {
        let mut registry = IdentifierRegistry::new();
        registry.record(1, 0);
        registry.record(2, 0);
        registry.reset();

        assert!(registry.is_empty());
        assert_eq!(registry.lookup(1), None);
    }

    #[test]
    fn test_reserved_index_is_refused() {
        let mut registry = IdentifierRegistry::new();
        registry.record(RESERVED_INDEX, 1);

        assert!(registry.is_empty());
        assert_eq!(registry.lookup(RESERVED_INDEX), None);
    }
}
