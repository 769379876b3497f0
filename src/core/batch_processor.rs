//! Batch processing with account-group partitioning
//!
//! This module provides the `BatchProcessor` struct, which executes a batch of
//! transfer instructions concurrently while keeping the outcome identical to
//! running the batch one transfer at a time in input order.
//!
//! # Design
//!
//! Two transfers interfere only when they touch a common account. The batch is
//! partitioned into groups of transfers connected through shared accounts
//! (union-find over account ids). Groups touch disjoint account sets, so they
//! run in parallel; transfers inside a group run sequentially in input order.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     └── LedgerEngine  (cloneable, thread-safe transfer executor)
//! ```
//!
//! Each group runs on a blocking tokio thread because the engine may wait on
//! account locks.

use std::collections::{BTreeMap, HashMap};

use tokio::task::JoinError;

use super::engine::LedgerEngine;
use super::traits::{AccountStore, TransactionStore};
use crate::types::{
    AccountId, PersistenceError, Transaction, TransferError, TransferInstruction, TransferRequest,
};

/// Result of processing a single transfer instruction
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// Position of the instruction in its batch
    pub sequence: usize,

    /// The instruction that was processed
    pub instruction: TransferInstruction,

    /// The recorded transaction, or why nothing was recorded
    pub result: Result<Transaction, TransferError>,
}

/// A resolved request waiting in a group: input position, instruction, request
pub type Pending = (usize, TransferInstruction, TransferRequest);

/// Batch processor with account-group partitioning
#[derive(Debug)]
pub struct BatchProcessor<A, T>
where
    A: AccountStore,
    T: TransactionStore,
{
    engine: LedgerEngine<A, T>,
}

impl<A, T> Clone for BatchProcessor<A, T>
where
    A: AccountStore,
    T: TransactionStore,
{
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl<A, T> BatchProcessor<A, T>
where
    A: AccountStore + 'static,
    T: TransactionStore + 'static,
{
    pub fn new(engine: LedgerEngine<A, T>) -> Self {
        Self { engine }
    }

    /// Partition resolved requests into groups connected by shared accounts
    ///
    /// # Guarantees
    ///
    /// - Each request appears in exactly one group
    /// - No two groups touch the same account
    /// - Requests inside a group keep their input order
    /// - Groups are ordered by their lowest account id, so the partition is
    ///   deterministic
    pub fn partition_by_account_group(&self, batch: Vec<Pending>) -> Vec<Vec<Pending>> {
        let mut parent: HashMap<AccountId, AccountId> = HashMap::new();

        for (_, _, request) in &batch {
            let origin = find_root(&mut parent, request.origin);
            let destination = find_root(&mut parent, request.destination);
            if origin != destination {
                parent.insert(origin.max(destination), origin.min(destination));
            }
        }

        let mut groups: BTreeMap<AccountId, Vec<Pending>> = BTreeMap::new();
        for pending in batch {
            let root = find_root(&mut parent, pending.2.origin);
            groups.entry(root).or_default().push(pending);
        }

        groups.into_values().collect()
    }

    /// Execute one group sequentially, in input order
    pub fn process_group(&self, group: Vec<Pending>) -> Vec<ProcessingResult> {
        group
            .into_iter()
            .map(|(sequence, instruction, request)| ProcessingResult {
                sequence,
                instruction,
                result: self.engine.transfer(request),
            })
            .collect()
    }

    /// Process a batch of instructions
    ///
    /// This method:
    /// 1. Resolves each instruction's origin (failures become results directly)
    /// 2. Partitions the resolved requests into account groups
    /// 3. Runs every group on its own blocking task
    /// 4. Returns all results sorted by input position
    pub async fn process_batch(&self, batch: Vec<TransferInstruction>) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(batch.len());
        let mut resolved = Vec::with_capacity(batch.len());

        for (sequence, instruction) in batch.into_iter().enumerate() {
            match self.engine.resolve(instruction.clone()) {
                Ok(request) => resolved.push((sequence, instruction, request)),
                Err(error) => results.push(ProcessingResult {
                    sequence,
                    instruction,
                    result: Err(error),
                }),
            }
        }

        let mut tasks = Vec::new();
        for group in self.partition_by_account_group(resolved) {
            let submitted: Vec<(usize, TransferInstruction)> = group
                .iter()
                .map(|(sequence, instruction, _)| (*sequence, instruction.clone()))
                .collect();
            let processor = self.clone();
            let task = tokio::task::spawn_blocking(move || processor.process_group(group));
            tasks.push((task, submitted));
        }

        for (task, submitted) in tasks {
            results.extend(collect_group(task.await, submitted));
        }

        results.sort_by_key(|result| result.sequence);
        results
    }
}

/// Results of a finished group task
///
/// A task that panicked yields no results of its own, so every instruction it
/// was given is reported as unavailable; whether any of them was applied is
/// unknown.
fn collect_group(
    outcome: Result<Vec<ProcessingResult>, JoinError>,
    submitted: Vec<(usize, TransferInstruction)>,
) -> Vec<ProcessingResult> {
    match outcome {
        Ok(group_results) => group_results,
        Err(e) => {
            tracing::error!(error = %e, transfers = submitted.len(), "Transfer group task panicked");
            submitted
                .into_iter()
                .map(|(sequence, instruction)| ProcessingResult {
                    sequence,
                    instruction,
                    result: Err(PersistenceError::unavailable("transfer group task panicked").into()),
                })
                .collect()
        }
    }
}

fn find_root(parent: &mut HashMap<AccountId, AccountId>, id: AccountId) -> AccountId {
    let mut root = id;
    while let Some(&next) = parent.get(&root) {
        if next == root {
            break;
        }
        root = next;
    }
    parent.entry(root).or_insert(root);

    // Path compression
    let mut current = id;
    while current != root {
        let next = parent.get(&current).copied().unwrap_or(root);
        parent.insert(current, root);
        current = next;
    }

    root
}
