// `calcSplices`: a bounded edit-distance diff over two flattened indexed
// sequences, and a key-walk diff for the two ordered ones. Both work on
// fully materialized `Vec`s (see `flatten`) rather than walking chunk
// boundaries directly — the tree-aware short-circuiting (skip identical
// subtrees by comparing child hashes) is left as a known optimization
// gap, noted where it matters.

use noms_base::Result;
use noms_types::Value;

use crate::flatten::{flatten_list, flatten_map, flatten_set};
use crate::reader::{ordering_key, value_eq, ValueReader};

/// One edit: replace `removed` items starting at index `at` in the source
/// sequence with `added` items starting at index `from` in the target
/// sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Splice {
    pub at: u64,
    pub removed: u64,
    pub added: u64,
    pub from: u64,
}

/// Default bound on `(len_a+1)*(len_b+1)`, the LCS matrix this diff
/// builds when computing an exact alignment. Beyond it we fall back to a
/// single splice replacing the whole differing range.
pub const DEFAULT_MAX_MATRIX: u64 = 8 * 1024 * 1024;

pub fn diff_list(reader: &dyn ValueReader, from: &Value, to: &Value, max_matrix: u64) -> Result<Vec<Splice>> {
    let a = flatten_list(reader, from)?;
    let b = flatten_list(reader, to)?;
    diff_values(&a, &b, max_matrix)
}

fn diff_values(a: &[Value], b: &[Value], max_matrix: u64) -> Result<Vec<Splice>> {
    let mut common_prefix = 0usize;
    while common_prefix < a.len()
        && common_prefix < b.len()
        && value_eq(&a[common_prefix], &b[common_prefix])?
    {
        common_prefix += 1;
    }
    let mut common_suffix = 0usize;
    while common_suffix < a.len() - common_prefix
        && common_suffix < b.len() - common_prefix
        && value_eq(&a[a.len() - 1 - common_suffix], &b[b.len() - 1 - common_suffix])?
    {
        common_suffix += 1;
    }

    let a_mid = &a[common_prefix..a.len() - common_suffix];
    let b_mid = &b[common_prefix..b.len() - common_suffix];
    if a_mid.is_empty() && b_mid.is_empty() {
        return Ok(Vec::new());
    }

    let matrix_size = (a_mid.len() as u64 + 1) * (b_mid.len() as u64 + 1);
    if matrix_size > max_matrix {
        return Ok(vec![Splice {
            at: common_prefix as u64,
            removed: a_mid.len() as u64,
            added: b_mid.len() as u64,
            from: common_prefix as u64,
        }]);
    }

    let matches = lcs_matches(a_mid, b_mid)?;
    Ok(splices_from_matches(a_mid.len(), b_mid.len(), &matches, common_prefix))
}

/// Index pairs `(i, j)` of a longest common subsequence between `a` and
/// `b`, via a full O(n*m) DP table. Only called once the caller has
/// checked the table fits inside the matrix bound.
fn lcs_matches(a: &[Value], b: &[Value]) -> Result<Vec<(usize, usize)>> {
    let n = a.len();
    let m = b.len();
    let mut eq = vec![vec![false; m]; n];
    for i in 0..n {
        for j in 0..m {
            eq[i][j] = value_eq(&a[i], &b[j])?;
        }
    }
    let mut dp = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            dp[i][j] = if eq[i][j] {
                dp[i + 1][j + 1] + 1
            } else {
                dp[i + 1][j].max(dp[i][j + 1])
            };
        }
    }
    let mut matches = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);
    while i < n && j < m {
        if eq[i][j] {
            matches.push((i, j));
            i += 1;
            j += 1;
        } else if dp[i + 1][j] >= dp[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    Ok(matches)
}

fn splices_from_matches(
    len_a: usize,
    len_b: usize,
    matches: &[(usize, usize)],
    offset: usize,
) -> Vec<Splice> {
    let mut splices = Vec::new();
    let mut prev = (0usize, 0usize);
    let mut emit = |a_start: usize, a_end: usize, b_start: usize, b_end: usize| {
        if a_end > a_start || b_end > b_start {
            splices.push(Splice {
                at: (offset + a_start) as u64,
                removed: (a_end - a_start) as u64,
                added: (b_end - b_start) as u64,
                from: (offset + b_start) as u64,
            });
        }
    };
    for &(i, j) in matches {
        emit(prev.0, i, prev.1, j);
        prev = (i + 1, j + 1);
    }
    emit(prev.0, len_a, prev.1, len_b);
    splices
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MapChange {
    Added(Value, Value),
    Removed(Value),
    Modified(Value, Value, Value),
}

pub fn diff_map(reader: &dyn ValueReader, from: &Value, to: &Value) -> Result<Vec<MapChange>> {
    let a = flatten_map(reader, from)?;
    let b = flatten_map(reader, to)?;
    let mut out = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);
    loop {
        match (a.get(i), b.get(j)) {
            (None, None) => break,
            (Some((k, _)), None) => {
                out.push(MapChange::Removed(k.clone()));
                i += 1;
            }
            (None, Some((k, v))) => {
                out.push(MapChange::Added(k.clone(), v.clone()));
                j += 1;
            }
            (Some((ka, va)), Some((kb, vb))) => {
                let order = ordering_key(ka)?.cmp(&ordering_key(kb)?);
                match order {
                    std::cmp::Ordering::Less => {
                        out.push(MapChange::Removed(ka.clone()));
                        i += 1;
                    }
                    std::cmp::Ordering::Greater => {
                        out.push(MapChange::Added(kb.clone(), vb.clone()));
                        j += 1;
                    }
                    std::cmp::Ordering::Equal => {
                        if !value_eq(va, vb)? {
                            out.push(MapChange::Modified(ka.clone(), va.clone(), vb.clone()));
                        }
                        i += 1;
                        j += 1;
                    }
                }
            }
        }
    }
    Ok(out)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SetChange {
    Added(Value),
    Removed(Value),
}

pub fn diff_set(reader: &dyn ValueReader, from: &Value, to: &Value) -> Result<Vec<SetChange>> {
    let a = flatten_set(reader, from)?;
    let b = flatten_set(reader, to)?;
    let mut out = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);
    loop {
        match (a.get(i), b.get(j)) {
            (None, None) => break,
            (Some(x), None) => {
                out.push(SetChange::Removed(x.clone()));
                i += 1;
            }
            (None, Some(y)) => {
                out.push(SetChange::Added(y.clone()));
                j += 1;
            }
            (Some(x), Some(y)) => match ordering_key(x)?.cmp(&ordering_key(y)?) {
                std::cmp::Ordering::Less => {
                    out.push(SetChange::Removed(x.clone()));
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    out.push(SetChange::Added(y.clone()));
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            },
        }
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::build::build_list;
    use crate::reader::MapReader;
    use noms_chunker::TEST_PATTERN;
    use noms_types::Number;
    use test_log::test;

    fn nums(xs: &[i64]) -> Vec<Value> {
        xs.iter().map(|&i| Value::Number(Number::from_i64(i))).collect()
    }

    #[test]
    fn identical_lists_have_no_splices() {
        let items = nums(&[1, 2, 3]);
        let tree = build_list(items, TEST_PATTERN, noms_types::number_type()).unwrap();
        let reader = MapReader::from_chunks(&tree.chunks).unwrap();
        let splices = diff_list(&reader, &tree.root, &tree.root, DEFAULT_MAX_MATRIX).unwrap();
        assert!(splices.is_empty());
    }

    #[test]
    fn a_single_removed_run_is_one_splice() {
        let a_items = nums(&(0..20).collect::<Vec<_>>());
        let b_items = nums(&(5..20).collect::<Vec<_>>());
        let ta = build_list(a_items, TEST_PATTERN, noms_types::number_type()).unwrap();
        let tb = build_list(b_items, TEST_PATTERN, noms_types::number_type()).unwrap();
        let mut reader = MapReader::from_chunks(&ta.chunks).unwrap();
        for c in &tb.chunks {
            reader.insert(c.hash(), noms_codec::decode(c).unwrap());
        }
        let splices = diff_list(&reader, &ta.root, &tb.root, DEFAULT_MAX_MATRIX).unwrap();
        assert_eq!(splices, vec![Splice { at: 0, removed: 5, added: 0, from: 0 }]);
    }

    #[test]
    fn oversized_matrix_falls_back_to_one_coarse_splice() {
        let a_items = nums(&(0..50).collect::<Vec<_>>());
        let b_items = nums(&(0..50).rev().collect::<Vec<_>>());
        let ta = build_list(a_items, TEST_PATTERN, noms_types::number_type()).unwrap();
        let tb = build_list(b_items, TEST_PATTERN, noms_types::number_type()).unwrap();
        let mut reader = MapReader::from_chunks(&ta.chunks).unwrap();
        for c in &tb.chunks {
            reader.insert(c.hash(), noms_codec::decode(c).unwrap());
        }
        let splices = diff_list(&reader, &ta.root, &tb.root, 4).unwrap();
        assert_eq!(splices.len(), 1);
        assert_eq!(splices[0].removed, 50);
        assert_eq!(splices[0].added, 50);
    }

    #[test]
    fn map_diff_reports_added_removed_modified() {
        let pairs_a: Vec<(Value, Value)> =
            vec![(0, 1), (1, 2), (2, 3)].into_iter().map(|(k, v)| (Value::Number(Number::from_i64(k)), Value::Number(Number::from_i64(v)))).collect();
        let pairs_b: Vec<(Value, Value)> =
            vec![(1, 20), (2, 3), (3, 4)].into_iter().map(|(k, v)| (Value::Number(Number::from_i64(k)), Value::Number(Number::from_i64(v)))).collect();
        let ta = crate::build::build_map(pairs_a, TEST_PATTERN, noms_types::number_type(), noms_types::number_type()).unwrap();
        let tb = crate::build::build_map(pairs_b, TEST_PATTERN, noms_types::number_type(), noms_types::number_type()).unwrap();
        let mut reader = MapReader::from_chunks(&ta.chunks).unwrap();
        for c in &tb.chunks {
            reader.insert(c.hash(), noms_codec::decode(c).unwrap());
        }
        let changes = diff_map(&reader, &ta.root, &tb.root).unwrap();
        assert!(changes.iter().any(|c| matches!(c, MapChange::Removed(k) if k.as_number().unwrap() == Number::from_i64(0))));
        assert!(changes.iter().any(|c| matches!(c, MapChange::Added(k, _) if k.as_number().unwrap() == Number::from_i64(3))));
        assert!(changes.iter().any(|c| matches!(c, MapChange::Modified(k, _, _) if k.as_number().unwrap() == Number::from_i64(1))));
    }
}
