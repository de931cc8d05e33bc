//! # In-Memory Stores
//!
//! `parking_lot`-guarded maps implementing [`BlockStore`] and [`StateStore`].

use crate::ports::{BlockStore, StateStore};
use parking_lot::RwLock;
use serde_json::Value;
use shared_types::{Block, Hash, StateDelta, StorageError, GENESIS_HASH};
use std::collections::BTreeMap;

// =============================================================================
// BLOCK STORE
// =============================================================================

#[derive(Debug)]
struct BlockTable {
    blocks: BTreeMap<u64, Block>,
    latest_height: u64,
    latest_hash: Hash,
}

impl Default for BlockTable {
    fn default() -> Self {
        Self {
            blocks: BTreeMap::new(),
            latest_height: 0,
            latest_hash: GENESIS_HASH,
        }
    }
}

/// Block storage held in memory.
#[derive(Debug, Default)]
pub struct InMemoryBlockStore {
    inner: RwLock<BlockTable>,
}

impl InMemoryBlockStore {
    /// Create an empty store (head at genesis).
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `blocks` and point the head at the last one.
    pub fn with_chain(blocks: impl IntoIterator<Item = Block>) -> Self {
        let store = Self::new();
        {
            let mut table = store.inner.write();
            for block in blocks {
                table.latest_height = block.number;
                table.latest_hash = block.hash;
                table.blocks.insert(block.number, block);
            }
        }
        store
    }

    /// Blocks held, including any above the head.
    pub fn block_count(&self) -> usize {
        self.inner.read().blocks.len()
    }
}

impl BlockStore for InMemoryBlockStore {
    fn get_block(&self, number: u64) -> Option<Block> {
        self.inner.read().blocks.get(&number).cloned()
    }

    fn put_block(&self, block: Block) -> Result<(), StorageError> {
        self.inner.write().blocks.insert(block.number, block);
        Ok(())
    }

    fn latest_height(&self) -> u64 {
        self.inner.read().latest_height
    }

    fn latest_hash(&self) -> Hash {
        self.inner.read().latest_hash
    }

    fn set_latest(&self, height: u64, hash: Hash) -> Result<(), StorageError> {
        let mut table = self.inner.write();
        if height > 0 {
            let block = table.blocks.get(&height).ok_or(StorageError::NotFound(height))?;
            if block.hash != hash {
                return Err(StorageError::DatabaseError(format!(
                    "head hash does not match stored block {height}"
                )));
            }
        }
        table.latest_height = height;
        table.latest_hash = hash;
        Ok(())
    }
}

// =============================================================================
// STATE STORE
// =============================================================================

#[derive(Debug)]
struct StateTable {
    values: BTreeMap<String, Value>,
    applied_height: u64,
    applied_hash: Hash,
    fail_at: Option<u64>,
}

impl Default for StateTable {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
            applied_height: 0,
            applied_hash: GENESIS_HASH,
            fail_at: None,
        }
    }
}

/// Key-value application state held in memory.
///
/// Blocks must be applied in sequence. Re-applying a block at or below the
/// applied height is a no-op.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    inner: RwLock<StateTable>,
}

impl InMemoryStateStore {
    /// Create empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value for `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.read().values.get(key).cloned()
    }

    /// Copy of every key.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.inner.read().values.clone()
    }

    /// Fail the write for block `number` (for exercising repair paths).
    pub fn set_failure_at(&self, number: Option<u64>) {
        self.inner.write().fail_at = number;
    }
}

impl StateStore for InMemoryStateStore {
    fn apply_state_deltas(
        &self,
        number: u64,
        block_hash: &Hash,
        deltas: &[StateDelta],
    ) -> Result<(), StorageError> {
        let mut table = self.inner.write();

        if number <= table.applied_height {
            return Ok(());
        }
        let expected = table.applied_height + 1;
        if number != expected {
            return Err(StorageError::NonSequential {
                expected,
                actual: number,
            });
        }
        if table.fail_at == Some(number) {
            return Err(StorageError::StateWrite(format!(
                "write refused for block {number}"
            )));
        }

        for delta in deltas {
            table.values.insert(delta.key.clone(), delta.value.clone());
        }
        table.applied_height = number;
        table.applied_hash = *block_hash;
        Ok(())
    }

    fn applied_height(&self) -> u64 {
        self.inner.read().applied_height
    }

    fn applied_hash(&self) -> Hash {
        self.inner.read().applied_hash
    }
}
