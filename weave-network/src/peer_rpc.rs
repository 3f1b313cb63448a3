//! `PeerRpc` (§6): the request/response contract a node uses to pull state
//! from a specific remote peer (fork recovery, join). spec.md places the
//! wire transport out of scope — "specified only by its input/output
//! contract" — so this module supplies only the trait. A production
//! implementation would back it with HTTP or a gRPC client; `weave-node`'s
//! integration tests back it with an in-memory double instead.

use async_trait::async_trait;
use weave_core::{Block, FullBlock, Transaction};
use weave_crypto::Hash;

#[async_trait]
pub trait PeerRpc: Send + Sync {
    /// The peer's current chain tip.
    async fn get_current_block(&self) -> anyhow::Result<Block>;
    /// A specific block by independent hash, in its canonical (tx-ids-only) form.
    async fn get_block(&self, hash: Hash) -> anyhow::Result<Option<Block>>;
    /// The same block, paired with its full transaction bodies.
    async fn get_full_block(&self, hash: Hash) -> anyhow::Result<Option<FullBlock>>;
    async fn send_new_tx(&self, tx: Transaction) -> anyhow::Result<()>;
    async fn send_new_block(&self, block: FullBlock) -> anyhow::Result<()>;
    /// Addresses of peers this peer itself knows about, for join bootstrap.
    async fn get_peers(&self) -> anyhow::Result<Vec<String>>;
}
