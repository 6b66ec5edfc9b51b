use ordered_tree::error::Error;
use ordered_tree::linked::Tree;

use std::collections::{BTreeMap, HashSet};

use crate::Op;

/// Applies a set of operations to a tree and a counting map.
/// This way we can ensure that after a random smattering of adds
/// and removes we have the same multiset of items in both.
fn do_ops<T>(ops: &[Op<T>], tree: &mut Tree<T>, counts: &mut BTreeMap<T, usize>) -> usize
where
    T: Ord + Clone + std::fmt::Debug,
{
    let mut removed = 0;
    for op in ops {
        match op {
            Op::Add(x) => {
                tree.add(x.clone());
                *counts.entry(x.clone()).or_default() += 1;
            }
            Op::Remove(x) => match counts.get_mut(x) {
                Some(count) => {
                    assert_eq!(tree.remove(x).as_ref(), Ok(x));
                    removed += 1;
                    *count -= 1;
                    if *count == 0 {
                        counts.remove(x);
                    }
                }
                None => assert_eq!(tree.remove(x), Err(Error::NotFound)),
            },
            Op::Rebalance => tree.rebalance(),
        }
    }

    removed
}

#[quickcheck]
fn fuzz_multiple_operations_i8(ops: Vec<Op<i8>>) -> bool {
    let mut tree = Tree::new();
    let mut counts = BTreeMap::new();

    let removed = do_ops(&ops, &mut tree, &mut counts);
    let adds = ops.iter().filter(|op| matches!(op, Op::Add(_))).count();

    let expected = counts
        .iter()
        .flat_map(|(x, count)| std::iter::repeat(x).take(*count));
    tree.len() == adds - removed
        && tree.inorder().eq(expected)
        && counts.keys().all(|x| tree.find(x) == Some(x))
        && tree.min() == counts.keys().next()
        && tree.max() == counts.keys().next_back()
}

#[quickcheck]
fn contains(xs: Vec<i8>) -> bool {
    let tree: Tree<_> = xs.iter().copied().collect();

    xs.iter().all(|x| tree.find(x) == Some(x))
}

#[quickcheck]
fn contains_not(xs: Vec<i8>, nots: Vec<i8>) -> bool {
    let tree: Tree<_> = xs.iter().copied().collect();
    let added: HashSet<_> = xs.into_iter().collect();
    let nots: HashSet<_> = nots.into_iter().collect();
    let mut nots = nots.difference(&added);

    nots.all(|x| !tree.contains(x))
}

#[quickcheck]
fn with_removals(xs: Vec<i8>, removes: Vec<i8>) -> bool {
    let mut tree: Tree<_> = xs.iter().copied().collect();
    let mut still_present = xs;
    for remove in &removes {
        // Each removal takes out a single copy of a duplicated item.
        match still_present.iter().position(|x| x == remove) {
            Some(pos) => {
                still_present.swap_remove(pos);
                assert_eq!(tree.remove(remove), Ok(*remove));
            }
            None => assert_eq!(tree.remove(remove), Err(Error::NotFound)),
        }
    }

    still_present.sort_unstable();
    tree.len() == still_present.len() && tree.inorder().eq(still_present.iter())
}

#[quickcheck]
fn rebalance_bounds_height(xs: Vec<u16>) -> bool {
    let mut tree: Tree<_> = xs.iter().copied().collect();
    let before: Vec<_> = tree.inorder().copied().collect();
    tree.rebalance();

    let bound = ((tree.len() + 1) as f64).log2().ceil() as isize;
    tree.height() <= bound && tree.inorder().copied().eq(before)
}

#[quickcheck]
fn is_balanced_is_pure(xs: Vec<i8>) -> bool {
    let tree: Tree<_> = xs.iter().copied().collect();
    let shape: Vec<_> = tree.iter().copied().collect();

    tree.is_balanced() == tree.is_balanced() && tree.iter().copied().eq(shape)
}

#[quickcheck]
fn ordered_queries_match_a_scan(xs: Vec<i8>, probe: i8, low: i8, high: i8) -> bool {
    let tree: Tree<_> = xs.iter().copied().collect();
    let mut sorted = xs;
    sorted.sort_unstable();

    let successor = sorted.iter().find(|x| **x > probe);
    let predecessor = sorted.iter().rev().find(|x| **x < probe);
    let range: Vec<_> = sorted.iter().filter(|x| low <= **x && **x <= high).collect();

    tree.successor(&probe) == successor
        && tree.predecessor(&probe) == predecessor
        && tree.range_find(&low, &high) == range
}

#[quickcheck]
fn clone_preserves_shape(xs: Vec<i8>) -> bool {
    let tree: Tree<_> = xs.iter().copied().collect();
    let copy = tree.clone();

    tree.iter().eq(copy.iter()) && tree.height() == copy.height() && tree.len() == copy.len()
}

#[test]
fn scenario_remove_missing_item_is_an_error() {
    let mut tree: Tree<_> = [5, 3, 8, 1, 4, 7, 9].into_iter().collect();

    assert_eq!(tree.remove(&3), Ok(3));
    assert_eq!(tree.remove(&3), Err(Error::NotFound));
    assert_eq!(Error::NotFound.to_string(), "item not in tree");
    assert_eq!(tree.inorder().copied().collect::<Vec<_>>(), [1, 4, 5, 7, 8, 9]);
}
