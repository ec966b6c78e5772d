//! Scoped durable transactions (`tx_begin` / `tx_commit` / `tx_abort`)
//!
//! The core requires that allocation, deallocation, and linked-field
//! updates inside a single user operation run inside one transaction. This
//! module models that bracket as a closure: [`run`] opens a transaction,
//! runs the closure, and commits on `Ok` or rolls back any allocations made
//! during the closure on `Err`.

use pskiplist_core::Result;

use crate::offset::TaggedOffset;
use crate::pool::Pool;

/// A durability transaction bracket over a single [`Pool`].
///
/// Allocations made through [`Transaction::alloc`] are tracked; if the
/// transaction is dropped without [`run`] having observed an `Ok`, they are
/// rolled back (freed) automatically.
pub struct Transaction<'p, T> {
    pool: &'p Pool<T>,
    allocated: Vec<TaggedOffset>,
    committed: bool,
}

impl<'p, T> Transaction<'p, T> {
    /// Allocates `value` in the pool as part of this transaction.
    pub fn alloc(&mut self, value: T) -> Result<TaggedOffset> {
        let tpo = self.pool.alloc_persistent(value)?;
        self.allocated.push(tpo);
        Ok(tpo)
    }

    /// Frees the node referenced by `tpo` as part of this transaction.
    ///
    /// Frees are not rolled back on abort: by the time a caller frees a
    /// node it has already unlinked it from every level, so there is
    /// nothing left referencing it to restore.
    pub fn free(&mut self, tpo: TaggedOffset) {
        self.pool.free_persistent(tpo);
    }

    /// Access to the pool this transaction is scoped to, for resolving
    /// offsets allocated outside the transaction (e.g. predecessors).
    pub fn pool(&self) -> &'p Pool<T> {
        self.pool
    }
}

impl<'p, T> Drop for Transaction<'p, T> {
    fn drop(&mut self) {
        if !self.committed && !self.allocated.is_empty() {
            log::warn!(
                "transaction aborted, rolling back {} allocation(s)",
                self.allocated.len()
            );
            for tpo in self.allocated.drain(..) {
                self.pool.free_persistent(tpo);
            }
        }
    }
}

/// Runs `body` inside a transaction bracket over `pool`.
///
/// On `Ok`, the transaction commits (its allocations are kept). On `Err`,
/// the transaction rolls back its own allocations and the error propagates
/// to the caller, matching the "transaction abort is fatal to the in-flight
/// operation, but any partial link is healed via the dirty-bit pathway"
/// error model.
pub fn run<T, R>(pool: &Pool<T>, body: impl FnOnce(&mut Transaction<T>) -> Result<R>) -> Result<R> {
    let mut tx = Transaction {
        pool,
        allocated: Vec::new(),
        committed: false,
    };
    let result = body(&mut tx);
    if result.is_ok() {
        tx.committed = true;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pskiplist_core::Error;

    #[test]
    fn committed_transaction_keeps_its_allocations() {
        let pool: Pool<u32> = Pool::new(8);
        let tpo = run(&pool, |tx| tx.alloc(5)).unwrap();
        assert_eq!(*pool.resolve(tpo).unwrap(), 5);
    }

    #[test]
    fn aborted_transaction_rolls_back_its_allocations() {
        let pool: Pool<u32> = Pool::new(8);
        let mut captured = TaggedOffset::NULL;

        let result: Result<()> = run(&pool, |tx| {
            captured = tx.alloc(5)?;
            Err(Error::TransactionAborted("simulated failure".into()))
        });

        assert!(result.is_err());
        assert!(pool.resolve(captured).is_none());
    }
}
