//! Tag statistics aggregation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::core::transaction_log::TransactionLog;
use crate::domain::{TagStat, Transaction, TransactionKind, PRELOADED_TAGS};

/// Rebuilds the tag set from scratch: one entry per name seen in the
/// existing set or on any transaction, derived fields reset and then
/// re-accumulated over the whole log. Names and creation stamps of known
/// tags survive; everything else is recomputed, which makes the operation
/// idempotent for a given log. Output order is unspecified.
pub fn recompute(
    log: &TransactionLog,
    existing: &[TagStat],
    now: DateTime<Utc>,
) -> Vec<TagStat> {
    let mut stats: HashMap<String, TagStat> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    fn seed(
        name: &str,
        created_at: DateTime<Utc>,
        stats: &mut HashMap<String, TagStat>,
        order: &mut Vec<String>,
    ) {
        if !stats.contains_key(name) {
            stats.insert(name.to_string(), TagStat::new(name, created_at));
            order.push(name.to_string());
        }
    }

    for tag in existing {
        seed(&tag.name, tag.created_at, &mut stats, &mut order);
    }

    for transaction in log.iter() {
        for name in &transaction.tags {
            seed(name, now, &mut stats, &mut order);
            let entry = stats.get_mut(name).expect("seeded above");
            entry.transaction_count += 1;
            entry.total_amount += signed_amount(transaction);
            if entry.last_used.map_or(true, |used| transaction.date_time > used) {
                entry.last_used = Some(transaction.date_time);
            }
        }
    }

    for name in PRELOADED_TAGS {
        seed(name, now, &mut stats, &mut order);
    }

    order
        .into_iter()
        .map(|name| stats.remove(&name).expect("every name was inserted"))
        .collect()
}

/// Contribution of one transaction to a tag total. Transfers move money
/// between own accounts and are left out of tag totals.
fn signed_amount(transaction: &Transaction) -> f64 {
    match transaction.kind {
        TransactionKind::Income => transaction.amount,
        TransactionKind::Expense => -transaction.amount,
        TransactionKind::Transfer => 0.0,
    }
}

/// Inserts any missing preloaded tag with zeroed statistics.
pub fn ensure_preloaded(tags: &mut Vec<TagStat>, now: DateTime<Utc>) {
    for name in PRELOADED_TAGS {
        if !tags.iter().any(|tag| tag.name == name) {
            tags.push(TagStat::new(name, now));
        }
    }
}
