//! Networking (§6): an in-scope gossip bus plus the out-of-scope `PeerRpc`
//! contract and a peer-set helper shared between them.

pub mod gossip;
pub mod peer_rpc;
pub mod peer_set;

pub use gossip::{GossipBus, GossipMessage, LinkConditions, PeerId};
pub use peer_rpc::PeerRpc;
pub use peer_set::PeerSet;
