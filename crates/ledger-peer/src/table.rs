use std::collections::HashMap;

use crate::descriptor::PeerDescriptor;

/// Mapping `ident -> PeerDescriptor`. Shared between a node's tracker
/// reader, accept loop, and per-peer readers; callers are responsible for
/// guarding it with a mutex at the point where it's held alongside
/// connection state.
#[derive(Debug, Clone, Default)]
pub struct PeerTable {
    peers: HashMap<u64, PeerDescriptor>,
}

impl PeerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, descriptor: PeerDescriptor) {
        self.peers.insert(descriptor.ident, descriptor);
    }

    pub fn remove(&mut self, ident: u64) -> Option<PeerDescriptor> {
        self.peers.remove(&ident)
    }

    pub fn get(&self, ident: u64) -> Option<&PeerDescriptor> {
        self.peers.get(&ident)
    }

    pub fn contains(&self, ident: u64) -> bool {
        self.peers.contains_key(&ident)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// A snapshot of every currently-known descriptor, safe to iterate
    /// while the table itself may be mutated concurrently by other tasks.
    pub fn snapshot(&self) -> Vec<PeerDescriptor> {
        self.peers.values().cloned().collect()
    }

    /// The idents currently known, taken before any send loop that might
    /// race with concurrent insertion.
    pub fn idents(&self) -> Vec<u64> {
        self.peers.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_crypto::KeyBytes;

    fn descriptor(ident: u64) -> PeerDescriptor {
        PeerDescriptor::new(ident, "127.0.0.1", 7100 + ident as u16, KeyBytes([0u8; 32]), KeyBytes([1u8; 32]))
    }

    #[test]
    fn insert_and_get() {
        let mut table = PeerTable::new();
        table.insert(descriptor(1));
        assert!(table.contains(1));
        assert_eq!(table.get(1).unwrap().port, 7101);
    }

    #[test]
    fn remove_drops_entry() {
        let mut table = PeerTable::new();
        table.insert(descriptor(1));
        let removed = table.remove(1);
        assert!(removed.is_some());
        assert!(!table.contains(1));
    }

    #[test]
    fn snapshot_reflects_all_inserted_peers() {
        let mut table = PeerTable::new();
        table.insert(descriptor(1));
        table.insert(descriptor(2));
        let snapshot = table.snapshot();
        assert_eq!(snapshot.len(), 2);
    }
}
