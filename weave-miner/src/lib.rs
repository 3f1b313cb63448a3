//! The Miner (§4.5): a standalone tokio task that repeatedly samples nonces
//! against its current mining input until the proof-of-work predicate is
//! satisfied, then reports the completed work to its parent and waits for
//! fresh input. Runs independently of the node server; the two communicate
//! only by message passing (`change_data`, `stop`, and the `WorkComplete`
//! channel), per the actor model of spec §5.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use weave_consensus::pow_hash;
use weave_core::{data_segment, Block, RewardAddr, Transaction};
use weave_crypto::{leading_zero_bits, Hash};

/// Everything a mining attempt needs: the predecessor's hash and
/// difficulty, the candidate tx set, and the recall block/txs the data
/// segment commits to.
#[derive(Clone)]
pub struct MiningInput {
    pub prev_hash: Hash,
    pub diff: u32,
    /// The candidate block's `timestamp`/`last_retarget`, fixed once at
    /// assembly time (by `next_diff`) rather than read again when a nonce is
    /// found: `diff` above is only valid for the instant it was computed at,
    /// since on a retarget height it is derived from this exact timestamp.
    pub timestamp: u64,
    pub last_retarget: u64,
    pub txs: Vec<Transaction>,
    pub recall_block: Block,
    pub recall_txs: Vec<Transaction>,
    pub reward_addr: RewardAddr,
}

impl MiningInput {
    fn data_segment(&self) -> Vec<u8> {
        data_segment(&self.txs, &self.recall_block, &self.recall_txs, &self.reward_addr)
    }
}

/// `work_complete{txs, H_prev, h, D, N}` — the winning nonce and the state
/// it was found against, handed back to the node so it can assemble and
/// broadcast the full block.
#[derive(Debug, Clone)]
pub struct WorkComplete {
    pub txs: Vec<Transaction>,
    pub prev_hash: Hash,
    pub hash: Hash,
    pub diff: u32,
    pub timestamp: u64,
    pub last_retarget: u64,
    pub nonce: Vec<u8>,
}

enum Command {
    ChangeData(MiningInput),
    Stop,
}

/// A handle to a running miner task. Dropping it without calling [`stop`]
/// leaves the task running; callers that want a clean shutdown should
/// always await `stop`.
pub struct MinerHandle {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl MinerHandle {
    /// Atomically swaps in new mining input between nonce attempts. Safe to
    /// call at any time, including while the miner is blocked waiting for
    /// the next input after a find.
    pub fn change_data(&self, input: MiningInput) {
        let _ = self.commands.send(Command::ChangeData(input));
    }

    /// Requests the task stop and waits for it to exit. Idempotent: calling
    /// `stop` on an already-stopping miner just waits for the same exit.
    pub async fn stop(self) {
        let _ = self.commands.send(Command::Stop);
        let _ = self.task.await;
    }
}

/// Spawns the miner task against `initial` input, reporting completed work
/// on `out`. `mining_delay` throttles the rate of nonce attempts — set to
/// zero for tests, non-zero in production to bound CPU usage between
/// `change_data` polls.
pub fn spawn_miner(
    initial: MiningInput,
    mining_delay: Duration,
    out: mpsc::UnboundedSender<WorkComplete>,
) -> MinerHandle {
    let (commands, mut rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(async move {
        let mut input = initial;
        let mut nonce: u64 = 0;

        'search: loop {
            match rx.try_recv() {
                Ok(Command::ChangeData(new_input)) => {
                    debug!("miner: data changed, restarting nonce search");
                    input = new_input;
                    nonce = 0;
                    continue 'search;
                }
                Ok(Command::Stop) => {
                    debug!("miner: stopped");
                    return;
                }
                Err(mpsc::error::TryRecvError::Empty) => {}
                Err(mpsc::error::TryRecvError::Disconnected) => return,
            }

            let seg = input.data_segment();
            let candidate_nonce = nonce.to_be_bytes().to_vec();
            let h = pow_hash(&input.prev_hash, &seg, &candidate_nonce);

            if leading_zero_bits(&h) >= input.diff {
                info!(diff = input.diff, "miner: found a valid nonce");
                let completed = WorkComplete {
                    txs: input.txs.clone(),
                    prev_hash: input.prev_hash,
                    hash: h,
                    diff: input.diff,
                    timestamp: input.timestamp,
                    last_retarget: input.last_retarget,
                    nonce: candidate_nonce,
                };
                if out.send(completed).is_err() {
                    return;
                }
                // Don't re-mine the same (now-stale) input; block until the
                // parent supplies the next one.
                match rx.recv().await {
                    Some(Command::ChangeData(new_input)) => {
                        input = new_input;
                        nonce = 0;
                        continue 'search;
                    }
                    _ => return,
                }
            }

            nonce = nonce.wrapping_add(1);
            if !mining_delay.is_zero() {
                tokio::time::sleep(mining_delay).await;
            }
        }
    });
    MinerHandle { commands, task }
}
