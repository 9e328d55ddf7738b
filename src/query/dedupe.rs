//! Collapses a sequence of sets so that no kept set is contained in another.

/// Reduce a sequence of sets (each a slice of comparable elements) by dropping
/// every set that is a subset of another. When a new set strictly contains an
/// already-kept one, the contained set is replaced; identical sets collapse to
/// the first occurrence. Remaining sets keep first-seen order.
///
/// ```
/// use starter_sdk::query::dedupe_subarrays;
///
/// let reduced = dedupe_subarrays(&[
///     vec![0, 1],
///     vec![1, 2],
///     vec![2, 3],
///     vec![1, 2, 3, 4],
///     vec![3, 4, 5],
///     vec![2, 4],
///     vec![1, 3],
///     vec![3, 4, 5],
///     vec![3, 4, 5, 6],
///     vec![3, 4, 5, 6],
/// ]);
/// assert_eq!(reduced, vec![vec![0, 1], vec![1, 2, 3, 4], vec![3, 4, 5, 6]]);
/// ```
pub fn dedupe_subarrays<T: PartialEq + Clone>(arrays: &[Vec<T>]) -> Vec<Vec<T>> {
    let mut kept: Vec<Vec<T>> = Vec::new();
    for arr in arrays {
        let mut next = Vec::new();
        let mut should_add = true;
        for r in &kept {
            // existing entry survives only if it has an element arr lacks
            if r.iter().any(|x| !arr.contains(x)) {
                next.push(r.clone());
            }
            // arr adds nothing over an existing entry
            if arr.iter().all(|x| r.contains(x)) {
                should_add = false;
                break;
            }
        }
        if should_add {
            next.push(arr.clone());
            kept = next;
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Vec<Vec<i32>> {
        vec![
            vec![0, 1],
            vec![1, 2],
            vec![2, 3],
            vec![1, 2, 3, 4],
            vec![3, 4, 5],
            vec![2, 4],
            vec![1, 3],
            vec![3, 4, 5],
            vec![3, 4, 5, 6],
            vec![3, 4, 5, 6],
        ]
    }

    #[test]
    fn drops_subsets_in_favor_of_supersets() {
        assert_eq!(
            dedupe_subarrays(&fixture()),
            vec![vec![0, 1], vec![1, 2, 3, 4], vec![3, 4, 5, 6]]
        );
    }

    #[test]
    fn is_idempotent() {
        let once = dedupe_subarrays(&fixture());
        let twice = dedupe_subarrays(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn identical_sets_collapse() {
        let arrays = vec![vec!["a", "b"], vec!["a", "b"], vec!["c"]];
        assert_eq!(dedupe_subarrays(&arrays), vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn unrelated_sets_keep_first_seen_order() {
        let arrays = vec![vec![1], vec![2], vec![3]];
        assert_eq!(dedupe_subarrays(&arrays), arrays);
    }

    #[test]
    fn empty_input() {
        assert!(dedupe_subarrays::<i32>(&[]).is_empty());
    }
}
