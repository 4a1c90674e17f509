//! Ordered collection of logged transactions, newest first.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::transaction::dedup_tags;
use crate::domain::Transaction;

/// The transaction log. Most-recent-first is the canonical external order;
/// appends insert at the head. Filtering and querying never mutate the log.
#[derive(Debug, Clone, Default)]
pub struct TransactionLog {
    transactions: Vec<Transaction>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a log from persisted records, keeping the stored order.
    pub fn from_transactions(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    /// Inserts a transaction at the head. Duplicate tag names are dropped.
    pub fn append(&mut self, mut transaction: Transaction) {
        transaction.tags = dedup_tags(std::mem::take(&mut transaction.tags));
        self.transactions.insert(0, transaction);
    }

    /// Replaces a transaction in place, preserving its original id and its
    /// position in the log. Whether an edit should instead be re-stamped as
    /// a new event is the caller's call.
    pub fn update(&mut self, id: Uuid, mut replacement: Transaction) -> bool {
        match self.transactions.iter_mut().find(|t| t.id == id) {
            Some(slot) => {
                replacement.id = id;
                replacement.tags = dedup_tags(std::mem::take(&mut replacement.tags));
                *slot = replacement;
                true
            }
            None => false,
        }
    }

    /// Deletes by id. Removing an unknown id is a no-op, not an error.
    pub fn remove(&mut self, id: Uuid) -> Option<Transaction> {
        let index = self.transactions.iter().position(|t| t.id == id)?;
        Some(self.transactions.remove(index))
    }

    pub fn get(&self, id: Uuid) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }

    /// Lazy, restartable view over the log. Calling again restarts the scan.
    pub fn filter<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a Transaction>
    where
        P: Fn(&Transaction) -> bool + 'a,
    {
        self.transactions.iter().filter(move |t| predicate(t))
    }

    /// Transactions touching `account` with `from < date_time <= to`.
    ///
    /// The open start and closed end make successive reconciliation windows
    /// chain without overlap: an update stamped at `t` owns the transaction
    /// stamped exactly at `t`, and the next window starts strictly after it.
    pub fn query<'a>(
        &'a self,
        account: &'a str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Iterator<Item = &'a Transaction> {
        self.filter(move |t| {
            t.touches_account(account) && t.date_time > from && t.date_time <= to
        })
    }

    /// Removes `tag` from every transaction carrying it. Returns the ids of
    /// the transactions that changed.
    pub fn strip_tag(&mut self, tag: &str) -> Vec<Uuid> {
        let mut touched = Vec::new();
        for transaction in &mut self.transactions {
            let before = transaction.tags.len();
            transaction.tags.retain(|t| t != tag);
            if transaction.tags.len() != before {
                touched.push(transaction.id);
            }
        }
        touched
    }

    /// Rewrites `old` to `new` in every transaction's tag set. Returns the
    /// ids of the transactions that changed.
    pub fn rename_tag(&mut self, old: &str, new: &str) -> Vec<Uuid> {
        let mut touched = Vec::new();
        for transaction in &mut self.transactions {
            let mut changed = false;
            for tag in &mut transaction.tags {
                if tag == old {
                    *tag = new.to_string();
                    changed = true;
                }
            }
            if changed {
                transaction.tags = dedup_tags(std::mem::take(&mut transaction.tags));
                touched.push(transaction.id);
            }
        }
        touched
    }

    pub fn as_slice(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn append_keeps_newest_first() {
        let mut log = TransactionLog::new();
        let first = Transaction::expense("Checking", 10.0, at(100));
        let second = Transaction::expense("Checking", 20.0, at(200));
        log.append(first.clone());
        log.append(second.clone());

        let ids: Vec<_> = log.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn update_preserves_id_and_position() {
        let mut log = TransactionLog::new();
        let older = Transaction::expense("Checking", 10.0, at(100));
        let newer = Transaction::expense("Checking", 20.0, at(200));
        let target = older.id;
        log.append(older);
        log.append(newer);

        let replacement = Transaction::income("Checking", 99.0, at(150));
        assert!(log.update(target, replacement));

        let stored = log.get(target).expect("updated transaction");
        assert_eq!(stored.amount, 99.0);
        assert_eq!(log.as_slice()[1].id, target);
    }

    #[test]
    fn update_unknown_id_reports_false() {
        let mut log = TransactionLog::new();
        assert!(!log.update(Uuid::new_v4(), Transaction::expense("X", 1.0, at(0))));
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let mut log = TransactionLog::new();
        log.append(Transaction::expense("Checking", 10.0, at(100)));
        assert!(log.remove(Uuid::new_v4()).is_none());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn query_is_open_start_closed_end() {
        let mut log = TransactionLog::new();
        let at_start = Transaction::expense("Checking", 1.0, at(100));
        let inside = Transaction::expense("Checking", 2.0, at(150));
        let at_end = Transaction::expense("Checking", 3.0, at(200));
        let after = Transaction::expense("Checking", 4.0, at(201));
        for t in [&at_start, &inside, &at_end, &after] {
            log.append(t.clone());
        }

        let hits: Vec<_> = log.query("Checking", at(100), at(200)).map(|t| t.id).collect();
        assert!(!hits.contains(&at_start.id), "start bound is exclusive");
        assert!(hits.contains(&inside.id));
        assert!(hits.contains(&at_end.id), "end bound is inclusive");
        assert!(!hits.contains(&after.id));
    }

    #[test]
    fn query_matches_either_side_of_a_transfer() {
        let mut log = TransactionLog::new();
        log.append(Transaction::transfer("A", "B", 5.0, at(150)));

        assert_eq!(log.query("A", at(0), at(200)).count(), 1);
        assert_eq!(log.query("B", at(0), at(200)).count(), 1);
        assert_eq!(log.query("C", at(0), at(200)).count(), 0);
    }

    #[test]
    fn filter_is_restartable() {
        let mut log = TransactionLog::new();
        log.append(Transaction::expense("Checking", 10.0, at(100)).with_tags(["trip"]));
        log.append(Transaction::expense("Checking", 20.0, at(200)));

        let tagged = |t: &Transaction| t.tags.contains(&"trip".to_string());
        assert_eq!(log.filter(tagged).count(), 1);
        assert_eq!(log.filter(tagged).count(), 1);
    }

    #[test]
    fn strip_tag_reports_changed_transactions() {
        let mut log = TransactionLog::new();
        let tagged = Transaction::expense("A", 1.0, at(1)).with_tags(["trip", "petrol"]);
        let untouched = Transaction::expense("A", 2.0, at(2)).with_tags(["house"]);
        log.append(tagged.clone());
        log.append(untouched.clone());

        let touched = log.strip_tag("trip");
        assert_eq!(touched, vec![tagged.id]);
        assert_eq!(log.get(tagged.id).unwrap().tags, vec!["petrol"]);
        assert_eq!(log.get(untouched.id).unwrap().tags, vec!["house"]);
    }

    #[test]
    fn rename_tag_dedups_collisions_within_a_transaction() {
        let mut log = TransactionLog::new();
        let txn = Transaction::expense("A", 1.0, at(1)).with_tags(["trip", "holiday"]);
        log.append(txn.clone());

        log.rename_tag("holiday", "trip");
        assert_eq!(log.get(txn.id).unwrap().tags, vec!["trip"]);
    }
}
