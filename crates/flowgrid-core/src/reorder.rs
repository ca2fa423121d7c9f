use crate::error::{FlowgridError, Result};
use std::collections::HashSet;

/// Move the element at `from` to `to`, shifting the elements in between by
/// one. Elements outside that span keep their positions. Out-of-range
/// indices leave `items` untouched.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> Result<()> {
    let len = items.len();
    if from >= len {
        return Err(FlowgridError::IndexOutOfRange { index: from, len });
    }
    if to >= len {
        return Err(FlowgridError::IndexOutOfRange { index: to, len });
    }
    if from == to {
        return Ok(());
    }
    let item = items.remove(from);
    items.insert(to, item);
    Ok(())
}

/// Check that `proposed` is a permutation of `current`: every id exactly once.
pub fn validate_order(current: &[&str], proposed: &[&str]) -> Result<()> {
    let mut seen = HashSet::new();
    for &id in proposed {
        if !seen.insert(id) {
            return Err(FlowgridError::InvalidStepOrder(format!(
                "duplicate step id in order list: '{id}'"
            )));
        }
    }

    let existing: HashSet<&str> = current.iter().copied().collect();
    for &id in proposed {
        if !existing.contains(id) {
            return Err(FlowgridError::InvalidStepOrder(format!(
                "'{id}' is not in this scenario"
            )));
        }
    }

    for &id in current {
        if !seen.contains(id) {
            return Err(FlowgridError::InvalidStepOrder(format!(
                "missing step id in order list: '{id}'"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn letters() -> Vec<&'static str> {
        vec!["a", "b", "c", "d", "e"]
    }

    #[test]
    fn move_forward_shifts_intermediate_back() {
        let mut v = letters();
        move_item(&mut v, 1, 3).unwrap();
        assert_eq!(v, vec!["a", "c", "d", "b", "e"]);
    }

    #[test]
    fn move_backward_shifts_intermediate_forward() {
        let mut v = letters();
        move_item(&mut v, 4, 0).unwrap();
        assert_eq!(v, vec!["e", "a", "b", "c", "d"]);
    }

    #[test]
    fn move_then_inverse_restores_order() {
        for from in 0..5 {
            for to in 0..5 {
                let mut v = letters();
                move_item(&mut v, from, to).unwrap();
                move_item(&mut v, to, from).unwrap();
                assert_eq!(v, letters(), "move({from},{to}) then move({to},{from})");
            }
        }
    }

    #[test]
    fn move_preserves_multiset() {
        let mut v = letters();
        move_item(&mut v, 0, 4).unwrap();
        let mut sorted = v.clone();
        sorted.sort();
        assert_eq!(sorted, letters());
    }

    #[test]
    fn out_of_range_does_not_mutate() {
        let mut v = letters();
        assert!(matches!(
            move_item(&mut v, 5, 0),
            Err(FlowgridError::IndexOutOfRange { index: 5, len: 5 })
        ));
        assert!(matches!(
            move_item(&mut v, 0, 9),
            Err(FlowgridError::IndexOutOfRange { index: 9, len: 5 })
        ));
        assert_eq!(v, letters());
    }

    #[test]
    fn validate_accepts_permutation() {
        validate_order(&["a", "b", "c"], &["c", "a", "b"]).unwrap();
    }

    #[test]
    fn validate_rejects_missing_id() {
        let err = validate_order(&["a", "b"], &["a"]).unwrap_err();
        assert!(err.to_string().contains("missing step id in order list: 'b'"));
    }

    #[test]
    fn validate_rejects_unknown_id() {
        let err = validate_order(&["a"], &["a", "ghost"]).unwrap_err();
        assert!(err.to_string().contains("'ghost' is not in this scenario"));
    }

    #[test]
    fn validate_rejects_duplicate() {
        let err = validate_order(&["a", "b"], &["a", "a"]).unwrap_err();
        assert!(err.to_string().contains("duplicate step id in order list: 'a'"));
    }
}
