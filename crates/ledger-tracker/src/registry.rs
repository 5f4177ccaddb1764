use std::collections::HashMap;

use ledger_peer::PeerDescriptor;
use tokio::net::tcp::OwnedWriteHalf;

/// `ident -> PeerDescriptor` and `ident -> socket` for every admitted node,
/// plus the next identity to hand out. Identities start at 1; 0 is reserved
/// for the genesis sender/receiver and is never assigned to a node.
///
/// Every structural mutation (insert, remove, the `ident_count` bump) goes
/// through `&mut self`; callers hold the whole registry behind one
/// `tokio::sync::Mutex` so admission and monitoring never observe a
/// half-committed node.
#[derive(Default)]
pub struct NodeRegistry {
    ident_count: u64,
    nodes: HashMap<u64, PeerDescriptor>,
    sockets: HashMap<u64, OwnedWriteHalf>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self { ident_count: 1, nodes: HashMap::new(), sockets: HashMap::new() }
    }

    /// Reserve the next identity without committing it; the caller commits
    /// via [`NodeRegistry::commit`] only after the rest of admission
    /// succeeds, so a failed handshake never burns an identity early... with
    /// one exception: identities are never reused even across a rolled-back
    /// admission, matching the "never reused after a node leaves" rule, so
    /// `ident_count` is bumped here, eagerly.
    pub fn reserve_ident(&mut self) -> u64 {
        let ident = self.ident_count;
        self.ident_count += 1;
        ident
    }

    /// Snapshot of every currently-admitted peer descriptor, safe to send
    /// from while the registry may be mutated by a later admission.
    pub fn snapshot_peers(&self) -> Vec<PeerDescriptor> {
        self.nodes.values().cloned().collect()
    }

    /// The idents of every admitted node, taken before a broadcast loop that
    /// may race with concurrent insertion or removal.
    pub fn idents(&self) -> Vec<u64> {
        self.nodes.keys().copied().collect()
    }

    pub fn get(&self, ident: u64) -> Option<&PeerDescriptor> {
        self.nodes.get(&ident)
    }

    pub fn socket_mut(&mut self, ident: u64) -> Option<&mut OwnedWriteHalf> {
        self.sockets.get_mut(&ident)
    }

    /// Commit a newly-admitted node: record its descriptor and the write
    /// half of its socket under the same lock acquisition that broadcasts
    /// `TRACKER_NEW_PEER` to the existing nodes, so a node never observes
    /// `TRACKER_ACCEPT` before its peers have heard about it.
    pub fn commit(&mut self, descriptor: PeerDescriptor, socket: OwnedWriteHalf) {
        let ident = descriptor.ident;
        self.nodes.insert(ident, descriptor);
        self.sockets.insert(ident, socket);
    }

    /// Remove a node from both tables. Idempotent: removing an unknown ident
    /// is a no-op.
    pub fn remove(&mut self, ident: u64) {
        self.nodes.remove(&ident);
        self.sockets.remove(&ident);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
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
    fn idents_start_at_one_and_increase() {
        let mut registry = NodeRegistry::new();
        assert_eq!(registry.reserve_ident(), 1);
        assert_eq!(registry.reserve_ident(), 2);
        assert_eq!(registry.reserve_ident(), 3);
    }

    #[test]
    fn snapshot_and_remove() {
        let mut registry = NodeRegistry::new();
        let _ = registry.reserve_ident();
        registry.nodes.insert(1, descriptor(1));
        assert_eq!(registry.snapshot_peers().len(), 1);
        registry.remove(1);
        assert!(registry.is_empty());
        // removing again is a no-op, not a panic
        registry.remove(1);
    }
}
