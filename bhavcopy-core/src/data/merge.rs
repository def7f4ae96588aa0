//! Full outer join of two record sets on all of their common columns.

use super::record::{RecordSet, Row};
use super::value::{JoinKey, Value};
use std::collections::HashMap;

/// Merge `left` and `right` with a full outer join.
///
/// The join key is every column name the two sets share; there is no declared
/// key. Values match after [`Value::join_key`] normalization, so numbers
/// compare across representations and `Null` matches `Null`.
///
/// Output columns are `left`'s columns followed by `right`-only columns.
/// Output rows are each left row followed by one combined row per matching
/// right row (so duplicates on both sides multiply), left rows without a
/// match padded with `Null`, then unmatched right rows in their original
/// order.
///
/// With no shared columns every row has the same (empty) key: two non-empty
/// inputs produce their cross product, and an empty side yields the other
/// side's rows padded with `Null`. No row is ever dropped.
pub fn outer_join(left: &RecordSet, right: &RecordSet) -> RecordSet {
    let mut shared: Vec<(usize, usize)> = Vec::new();
    let mut right_only: Vec<usize> = Vec::new();
    let mut columns: Vec<String> = left.columns().to_vec();

    for (r_idx, name) in right.columns().iter().enumerate() {
        match left.column_index(name) {
            Some(l_idx) => {
                if !shared.iter().any(|&(l, _)| l == l_idx) {
                    shared.push((l_idx, r_idx));
                }
            }
            None => {
                if !columns.contains(name) {
                    columns.push(name.clone());
                    right_only.push(r_idx);
                }
            }
        }
    }
    // keys compare in left column order
    shared.sort_unstable_by_key(|&(l, _)| l);

    let mut index: HashMap<Vec<JoinKey>, Vec<usize>> = HashMap::new();
    for (i, row) in right.rows().iter().enumerate() {
        let key = shared.iter().map(|&(_, r)| row[r].join_key()).collect();
        index.entry(key).or_default().push(i);
    }

    let width = columns.len();
    let mut matched = vec![false; right.len()];
    let mut rows: Vec<Row> = Vec::with_capacity(left.len().max(right.len()));

    for l_row in left.rows() {
        let key: Vec<JoinKey> = shared.iter().map(|&(l, _)| l_row[l].join_key()).collect();
        match index.get(&key) {
            Some(hits) => {
                for &i in hits {
                    matched[i] = true;
                    let r_row = &right.rows()[i];
                    let mut out = Vec::with_capacity(width);
                    out.extend(l_row.iter().cloned());
                    out.extend(right_only.iter().map(|&r| r_row[r].clone()));
                    rows.push(out);
                }
            }
            None => {
                let mut out = l_row.clone();
                out.resize(width, Value::Null);
                rows.push(out);
            }
        }
    }

    for (i, r_row) in right.rows().iter().enumerate() {
        if matched[i] {
            continue;
        }
        let mut out = vec![Value::Null; left.width()];
        for &(l, r) in &shared {
            out[l] = r_row[r].clone();
        }
        out.extend(right_only.iter().map(|&r| r_row[r].clone()));
        rows.push(out);
    }

    RecordSet::new(columns, rows)
}
