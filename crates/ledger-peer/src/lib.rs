pub mod descriptor;
pub mod table;

pub use descriptor::PeerDescriptor;
pub use table::PeerTable;
