//! # Path Algebra
//!
//! Pure functions over tree coordinates. A path is the list of child indices
//! to descend from the document root; the empty path is the root itself.
//!
//! Paths are positions, not identities. Every structural operation can shift
//! them, so anything holding a path across an edit must rebase it with
//! [`transform`].
//!
//! ## Sibling vocabulary
//!
//! `is_older(a, b)` means `a` sits at a *higher* index than `b` (later in
//! document order) under the same parent prefix; `is_younger` is the reverse.

use crate::operation::Operation;
use std::cmp::Ordering;

/// Tree coordinate: child indices from the document root
pub type Path = Vec<usize>;

/// Compare two paths in document order.
///
/// Only the shared-depth prefix is inspected. Returns `None` when the prefixes
/// agree but the lengths differ, i.e. one path is an ancestor of the other.
/// That case is neither before nor after and callers must handle it.
pub fn compare(path: &[usize], target: &[usize]) -> Option<Ordering> {
    match compare_prefix(path, target) {
        Ordering::Equal if path.len() != target.len() => None,
        ordering => Some(ordering),
    }
}

/// Compare only the shared-depth prefix, treating ancestors as equal
pub fn compare_prefix(path: &[usize], target: &[usize]) -> Ordering {
    let depth = path.len().min(target.len());
    path[..depth].cmp(&target[..depth])
}

pub fn is_equal(path: &[usize], target: &[usize]) -> bool {
    path == target
}

/// True if `path` is a strict ancestor of `target`
pub fn is_above(path: &[usize], target: &[usize]) -> bool {
    path.len() < target.len() && target.starts_with(path)
}

/// True if `path` comes after `target` and is not related by ancestry
pub fn is_after(path: &[usize], target: &[usize]) -> bool {
    compare_prefix(path, target) == Ordering::Greater
}

/// True if `path` comes before `target` and is not related by ancestry
pub fn is_before(path: &[usize], target: &[usize]) -> bool {
    compare_prefix(path, target) == Ordering::Less
}

/// True if both paths share a parent and differ in their last index
pub fn is_sibling(path: &[usize], target: &[usize]) -> bool {
    !path.is_empty()
        && path.len() == target.len()
        && path[..path.len() - 1] == target[..target.len() - 1]
        && path != target
}

/// True if `path` has a higher index than `target` at `path`'s last depth,
/// under the same parent prefix.
pub fn is_older(path: &[usize], target: &[usize]) -> bool {
    compare_last(path, target) == Some(Ordering::Greater)
}

/// True if `path` has a lower index than `target` at `path`'s last depth,
/// under the same parent prefix.
pub fn is_younger(path: &[usize], target: &[usize]) -> bool {
    compare_last(path, target) == Some(Ordering::Less)
}

fn compare_last(path: &[usize], target: &[usize]) -> Option<Ordering> {
    let index = path.len().checked_sub(1)?;
    if target.len() <= index || path[..index] != target[..index] {
        return None;
    }
    Some(path[index].cmp(&target[index]))
}

/// Add `n` to the index at `depth` (the last depth when `None`)
pub fn increment(path: &[usize], n: usize, depth: Option<usize>) -> Path {
    let mut next = path.to_vec();
    if let Some(depth) = depth.or_else(|| path.len().checked_sub(1)) {
        next[depth] += n;
    }
    next
}

/// Subtract `n` from the index at `depth` (the last depth when `None`)
pub fn decrement(path: &[usize], n: usize, depth: Option<usize>) -> Path {
    let mut next = path.to_vec();
    if let Some(depth) = depth.or_else(|| path.len().checked_sub(1)) {
        next[depth] = next[depth].saturating_sub(n);
    }
    next
}

/// Parent path; the root is its own parent
pub fn lift(path: &[usize]) -> Path {
    path[..path.len().saturating_sub(1)].to_vec()
}

/// Parent path, or `None` for the root
pub fn parent(path: &[usize]) -> Option<Path> {
    if path.is_empty() {
        None
    } else {
        Some(lift(path))
    }
}

/// All strict ancestors, root first
pub fn ancestors(path: &[usize]) -> Vec<Path> {
    (0..path.len()).map(|depth| path[..depth].to_vec()).collect()
}

/// Where a node moved by `move_node` actually lands.
///
/// `new_path` is expressed against the tree before the removal. When the moved
/// node was an earlier sibling of one of `new_path`'s ancestors, removing it
/// shifts that ancestor down by one.
pub fn move_target(path: &[usize], new_path: &[usize]) -> Path {
    if path.len() < new_path.len() && is_younger(path, new_path) {
        decrement(new_path, 1, Some(path.len() - 1))
    } else {
        new_path.to_vec()
    }
}

/// Rebase `path` through an operation that has already been applied.
///
/// Returns the paths that now address the node `path` used to address: none
/// if it was removed, two if it was the node split by `split_node`, one
/// otherwise.
pub fn transform(path: &[usize], operation: &Operation) -> Vec<Path> {
    let (p, is_structural) = match operation {
        Operation::InsertNode { path, .. }
        | Operation::RemoveNode { path, .. }
        | Operation::MergeNode { path, .. }
        | Operation::SplitNode { path, .. }
        | Operation::MoveNode { path, .. } => (path.as_slice(), true),
        _ => (&[][..], false),
    };

    if !is_structural || path.is_empty() || p.is_empty() {
        return vec![path.to_vec()];
    }

    let p_index = p.len() - 1;
    let p_equal = is_equal(p, path);
    let p_younger = is_younger(p, path);
    let p_above = is_above(p, path);

    match operation {
        Operation::InsertNode { .. } => {
            if p_equal || p_younger || p_above {
                vec![increment(path, 1, Some(p_index))]
            } else {
                vec![path.to_vec()]
            }
        }

        Operation::RemoveNode { .. } => {
            if p_equal || p_above {
                vec![]
            } else if p_younger {
                vec![decrement(path, 1, Some(p_index))]
            } else {
                vec![path.to_vec()]
            }
        }

        Operation::MergeNode { position, .. } => {
            if p_equal || p_younger {
                vec![decrement(path, 1, Some(p_index))]
            } else if p_above {
                let shifted = decrement(path, 1, Some(p_index));
                vec![increment(&shifted, *position, Some(p_index + 1))]
            } else {
                vec![path.to_vec()]
            }
        }

        Operation::SplitNode { position, .. } => {
            if p_equal {
                vec![path.to_vec(), increment(path, 1, None)]
            } else if p_younger {
                vec![increment(path, 1, Some(p_index))]
            } else if p_above && path[p_index + 1] >= *position {
                let shifted = increment(path, 1, Some(p_index));
                vec![decrement(&shifted, *position, Some(p_index + 1))]
            } else {
                vec![path.to_vec()]
            }
        }

        Operation::MoveNode { new_path, .. } => {
            if is_equal(p, new_path) {
                return vec![path.to_vec()];
            }

            let target = move_target(p, new_path);

            if p_equal || p_above {
                // Inside the moved subtree: carry the suffix onto the landing spot.
                let mut moved = target;
                moved.extend_from_slice(&path[p.len()..]);
                return vec![moved];
            }

            // Removal at `p`, then insertion at `target`.
            let mut rebased = if p_younger {
                decrement(path, 1, Some(p_index))
            } else {
                path.to_vec()
            };

            if is_equal(&target, &rebased)
                || is_younger(&target, &rebased)
                || is_above(&target, &rebased)
            {
                rebased = increment(&rebased, 1, Some(target.len() - 1));
            }

            vec![rebased]
        }

        _ => vec![path.to_vec()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, NodeProperties};
    use crate::operation::Affinity;

    fn text(key: &str) -> Node {
        Node::text(key, "")
    }

    #[test]
    fn test_compare_orders_siblings() {
        assert_eq!(compare(&[0, 1], &[0, 2]), Some(Ordering::Less));
        assert_eq!(compare(&[1], &[0, 5]), Some(Ordering::Greater));
        assert_eq!(compare(&[0, 1], &[0, 1]), Some(Ordering::Equal));
    }

    #[test]
    fn test_compare_ancestor_is_unordered() {
        assert_eq!(compare(&[0], &[0, 1]), None);
        assert_eq!(compare_prefix(&[0], &[0, 1]), Ordering::Equal);
        assert!(!is_after(&[0, 1], &[0]));
        assert!(!is_before(&[0], &[0, 1]));
    }

    #[test]
    fn test_is_above() {
        assert!(is_above(&[], &[0]));
        assert!(is_above(&[0], &[0, 3, 1]));
        assert!(!is_above(&[0], &[0]));
        assert!(!is_above(&[1], &[0, 1]));
    }

    #[test]
    fn test_older_and_younger() {
        assert!(is_older(&[0, 3], &[0, 1]));
        assert!(is_older(&[0, 3], &[0, 1, 7]));
        assert!(is_younger(&[0, 1], &[0, 3, 0]));
        assert!(!is_younger(&[1, 1], &[0, 3]));
        assert!(!is_older(&[0, 1], &[0]));
    }

    #[test]
    fn test_is_sibling() {
        assert!(is_sibling(&[0, 1], &[0, 4]));
        assert!(!is_sibling(&[0, 1], &[1, 1]));
        assert!(!is_sibling(&[0, 1], &[0, 1]));
    }

    #[test]
    fn test_lift_and_parent() {
        assert_eq!(lift(&[1, 2]), vec![1]);
        assert_eq!(lift(&[]), Vec::<usize>::new());
        assert_eq!(parent(&[1, 2]), Some(vec![1]));
        assert_eq!(parent(&[3]), Some(vec![]));
        assert_eq!(parent(&[]), None);
    }

    #[test]
    fn test_increment_and_decrement() {
        assert_eq!(increment(&[0, 1], 2, None), vec![0, 3]);
        assert_eq!(increment(&[0, 1], 1, Some(0)), vec![1, 1]);
        assert_eq!(decrement(&[2, 1], 1, Some(0)), vec![1, 1]);
        assert_eq!(ancestors(&[1, 2, 3]), vec![vec![], vec![1], vec![1, 2]]);
    }

    #[test]
    fn test_transform_insert_node() {
        let op = Operation::InsertNode { path: vec![0, 1], node: text("t") };
        assert_eq!(transform(&[0, 1], &op), vec![vec![0, 2]]);
        assert_eq!(transform(&[0, 2, 4], &op), vec![vec![0, 3, 4]]);
        assert_eq!(transform(&[0, 0], &op), vec![vec![0, 0]]);
        assert_eq!(transform(&[0], &op), vec![vec![0]]);
    }

    #[test]
    fn test_transform_remove_node() {
        let op = Operation::RemoveNode { path: vec![1], node: text("t") };
        assert!(transform(&[1], &op).is_empty());
        assert!(transform(&[1, 0], &op).is_empty());
        assert_eq!(transform(&[2, 0], &op), vec![vec![1, 0]]);
        assert_eq!(transform(&[0, 4], &op), vec![vec![0, 4]]);
    }

    #[test]
    fn test_transform_merge_node() {
        let op = Operation::MergeNode {
            path: vec![1],
            position: 3,
            properties: NodeProperties::default(),
        };
        assert_eq!(transform(&[1], &op), vec![vec![0]]);
        assert_eq!(transform(&[2], &op), vec![vec![1]]);
        assert_eq!(transform(&[1, 0], &op), vec![vec![0, 3]]);
        assert_eq!(transform(&[0, 1], &op), vec![vec![0, 1]]);
    }

    #[test]
    fn test_transform_split_node() {
        let op = Operation::SplitNode {
            path: vec![0],
            position: 2,
            properties: NodeProperties::default(),
            affinity: Affinity::Forward,
        };
        assert_eq!(transform(&[0], &op), vec![vec![0], vec![1]]);
        assert_eq!(transform(&[1], &op), vec![vec![2]]);
        assert_eq!(transform(&[0, 1], &op), vec![vec![0, 1]]);
        assert_eq!(transform(&[0, 3], &op), vec![vec![1, 1]]);
    }

    #[test]
    fn test_transform_move_node_forward_sibling() {
        // [a, b, c] -> move a to index 2 -> [b, c, a]
        let op = Operation::MoveNode { path: vec![0], new_path: vec![2] };
        assert_eq!(transform(&[0], &op), vec![vec![2]]);
        assert_eq!(transform(&[1], &op), vec![vec![0]]);
        assert_eq!(transform(&[2], &op), vec![vec![1]]);
    }

    #[test]
    fn test_transform_move_node_into_later_sibling() {
        // [a, y[b]] -> move a to [1, 0] -> [y[a, b]]
        let op = Operation::MoveNode { path: vec![0], new_path: vec![1, 0] };
        assert_eq!(transform(&[0], &op), vec![vec![0, 0]]);
        assert_eq!(transform(&[1, 0], &op), vec![vec![0, 1]]);
        assert_eq!(transform(&[1], &op), vec![vec![0]]);
    }

    #[test]
    fn test_transform_move_node_carries_descendants() {
        let op = Operation::MoveNode { path: vec![0, 1], new_path: vec![2] };
        assert_eq!(transform(&[0, 1, 3], &op), vec![vec![2, 3]]);
        assert_eq!(transform(&[0, 2], &op), vec![vec![0, 1]]);
        assert_eq!(transform(&[2], &op), vec![vec![3]]);
    }

    #[test]
    fn test_transform_ignores_text_operations() {
        let op = Operation::InsertText {
            path: vec![0, 0],
            offset: 0,
            text: "x".to_string(),
            marks: None,
            affinity: Affinity::Forward,
        };
        assert_eq!(transform(&[0, 0], &op), vec![vec![0, 0]]);
    }

    #[test]
    fn test_move_target_adjusts_for_removed_ancestor_sibling() {
        assert_eq!(move_target(&[0], &[1, 0]), vec![0, 0]);
        assert_eq!(move_target(&[0], &[2]), vec![2]);
        assert_eq!(move_target(&[3], &[1, 0]), vec![1, 0]);
    }
}
