//! A linked BST that stores single items and only rebalances when asked to.
//!
//! Duplicates are allowed and always descend to the right. The tree keeps a handle on its
//! leftmost and rightmost nodes so that inserting a new minimum or maximum (e.g. loading an
//! already sorted list) is `O(1)` instead of `O(height)`.
//!
//! # Examples
//!
//! ```
//! use ordered_tree::error::Error;
//! use ordered_tree::linked::Tree;
//!
//! let mut tree = Tree::new();
//!
//! // Nothing in here yet.
//! assert_eq!(tree.find(&1), None);
//!
//! for x in [5, 3, 8, 1, 4, 7, 9] {
//!     tree.add(x);
//! }
//! assert_eq!(tree.find(&4), Some(&4));
//! assert_eq!(tree.inorder().copied().collect::<Vec<_>>(), [1, 3, 4, 5, 7, 8, 9]);
//!
//! // Removing an item returns it. Removing it again is an error.
//! assert_eq!(tree.remove(&3), Ok(3));
//! assert_eq!(tree.remove(&3), Err(Error::NotFound));
//!
//! assert_eq!(tree.successor(&5), Some(&7));
//! assert_eq!(tree.predecessor(&5), Some(&4));
//! assert_eq!(tree.range_find(&4, &8), [&4, &5, &7, &8]);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::ptr::NonNull;

use crate::error::Error;
use crate::traverse::{Inorder, Iter, Levelorder, Postorder};

/// An unbalanced Binary Search Tree of `T`s. This can be used for adding, finding, and
/// removing items, for ordered queries, and can be rebuilt into a perfectly balanced shape
/// with [`Tree::rebalance`].
pub struct Tree<T> {
    root: Link<T>,
    len: usize,

    /// The node reached by walking left from the root. It never has a left child.
    leftmost: Link<T>,
    /// The node reached by walking right from the root. It never has a right child.
    rightmost: Link<T>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Tree<T> {
    fn drop(&mut self) {
        self.root.take().free();
    }
}

impl<T> Clone for Tree<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        let mut root = Link::NONE;
        let mut pending: Vec<(&Node<T>, NonNull<Link<T>>)> = Vec::new();
        if let Some(node) = self.root.node() {
            pending.push((node, NonNull::from(&mut root)));
        }

        while let Some((source, mut slot)) = pending.pop() {
            let mut copy = Node::alloc(source.value.clone());
            // SAFETY: `slot` is either `root` or a child link of a node allocated earlier in
            // this loop. Neither has been moved or freed and nothing else references them.
            unsafe { *slot.as_mut() = Link(Some(copy)) };
            // SAFETY: `copy` was just allocated and is only reachable through `slot`, which
            // isn't dereferenced again.
            let copy = unsafe { copy.as_mut() };
            if let Some(left) = source.left() {
                pending.push((left, NonNull::from(&mut copy.left)));
            }
            if let Some(right) = source.right() {
                pending.push((right, NonNull::from(&mut copy.right)));
            }
        }

        let mut tree = Self {
            root,
            len: self.len,
            leftmost: Link::NONE,
            rightmost: Link::NONE,
        };
        tree.refresh_extremes();
        tree
    }
}

impl<T> fmt::Debug for Tree<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.inorder()).finish()
    }
}

/// Renders the tree rotated 90 degrees counterclockwise: the right subtree is printed above
/// its parent and every level of depth adds a `"| "` prefix.
///
/// ```
/// use ordered_tree::linked::Tree;
///
/// let tree: Tree<_> = [2, 1, 3].into_iter().collect();
/// assert_eq!(tree.to_string(), "| 3\n2\n| 1\n");
/// ```
impl<T> fmt::Display for Tree<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Reverse inorder: right subtree, node, left subtree.
        let mut stack: Vec<(&Node<T>, usize)> = Vec::new();
        let mut next = self.root.node().map(|node| (node, 0));
        loop {
            while let Some((node, depth)) = next {
                stack.push((node, depth));
                next = node.right().map(|right| (right, depth + 1));
            }
            let Some((node, depth)) = stack.pop() else {
                return Ok(());
            };
            writeln!(f, "{}{}", "| ".repeat(depth), node.value)?;
            next = node.left().map(|left| (left, depth + 1));
        }
    }
}

impl<T> FromIterator<T> for Tree<T>
where
    T: Ord,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<T> Extend<T> for Tree<T>
where
    T: Ord,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.add(item);
        }
    }
}

impl<'a, T> IntoIterator for &'a Tree<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> Tree<T> {
    /// Generate a new, empty `Tree`.
    pub fn new() -> Self {
        Self {
            root: Link::NONE,
            len: 0,
            leftmost: Link::NONE,
            rightmost: Link::NONE,
        }
    }

    /// The number of items stored in the tree, counting duplicates.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no items.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The smallest item in the tree. This is `O(1)`.
    pub fn min(&self) -> Option<&T> {
        self.leftmost.node().map(|node| &node.value)
    }

    /// The largest item in the tree. This is `O(1)`.
    pub fn max(&self) -> Option<&T> {
        self.rightmost.node().map(|node| &node.value)
    }

    /// Potentially finds an item equal to `item` in this tree. If no node holds a matching
    /// item, `None` is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_tree::linked::Tree;
    ///
    /// let mut tree = Tree::new();
    /// tree.add(1);
    ///
    /// assert_eq!(tree.find(&1), Some(&1));
    /// assert_eq!(tree.find(&42), None);
    /// ```
    pub fn find(&self, item: &T) -> Option<&T>
    where
        T: Ord,
    {
        let mut current = self.root.node();
        while let Some(node) = current {
            current = match item.cmp(&node.value) {
                Ordering::Less => node.left(),
                Ordering::Equal => return Some(&node.value),
                Ordering::Greater => node.right(),
            };
        }
        None
    }

    /// Whether an item equal to `item` is stored in the tree.
    pub fn contains(&self, item: &T) -> bool
    where
        T: Ord,
    {
        self.find(item).is_some()
    }

    /// Adds `item` to the tree. Items equal to one already stored are kept as well and are
    /// placed to its right.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_tree::linked::Tree;
    ///
    /// let mut tree = Tree::new();
    /// tree.add(2);
    /// tree.add(2);
    ///
    /// assert_eq!(tree.len(), 2);
    /// assert_eq!(tree.inorder().collect::<Vec<_>>(), [&2, &2]);
    /// ```
    pub fn add(&mut self, item: T)
    where
        T: Ord,
    {
        self.len += 1;

        if let (Some(mut leftmost), Some(mut rightmost)) = (self.leftmost.0, self.rightmost.0) {
            // SAFETY: The extreme links always point at live nodes of this tree (they're
            // refreshed by every operation that frees or rebuilds nodes) and no other
            // reference into the tree is alive while we hold `&mut self`.
            let leftmost = unsafe { leftmost.as_mut() };
            if item < leftmost.value {
                log::trace!("adding new minimum through the leftmost node");
                let link = Link(Some(Node::alloc(item)));
                leftmost.left = link;
                self.leftmost = link;
                return;
            }

            // SAFETY: See above. `leftmost` isn't used past this point so this doesn't alias
            // it when both links point at the root.
            let rightmost = unsafe { rightmost.as_mut() };
            if item > rightmost.value {
                log::trace!("adding new maximum through the rightmost node");
                let link = Link(Some(Node::alloc(item)));
                rightmost.right = link;
                self.rightmost = link;
                return;
            }
        }

        let Some(mut parent) = self.root.0 else {
            self.root = Link(Some(Node::alloc(item)));
            self.refresh_extremes();
            return;
        };

        loop {
            // SAFETY: `parent` is a live node of this tree and `&mut self` guarantees there is
            // no other reference into it.
            let node = unsafe { parent.as_mut() };
            let side = if item < node.value {
                Side::Left
            } else {
                Side::Right
            };

            let slot = node.child_mut(side);
            match slot.0 {
                Some(child) => parent = child,
                None => {
                    let link = Link(Some(Node::alloc(item)));
                    *slot = link;

                    // A new node can only extend the outer edge of the tree when its parent was
                    // the extreme node on that side (e.g. a duplicate of the maximum).
                    let parent = Link(Some(parent));
                    match side {
                        Side::Left if self.leftmost == parent => self.leftmost = link,
                        Side::Right if self.rightmost == parent => self.rightmost = link,
                        _ => {}
                    }
                    return;
                }
            }
        }
    }

    /// Removes an item equal to `item` from the tree and returns it.
    ///
    /// A node with two children takes over the largest item of its left subtree, whose node
    /// is removed instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no stored item equals `item`. The tree is left
    /// untouched in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_tree::error::Error;
    /// use ordered_tree::linked::Tree;
    ///
    /// let mut tree = Tree::new();
    /// tree.add(1);
    ///
    /// assert_eq!(tree.remove(&1), Ok(1));
    /// assert_eq!(tree.remove(&1), Err(Error::NotFound));
    /// assert!(tree.is_empty());
    /// ```
    pub fn remove(&mut self, item: &T) -> Result<T, Error>
    where
        T: Ord,
    {
        // The link (either `root` or a child link of the parent) holding the node to remove.
        let mut slot = NonNull::from(&mut self.root);
        let mut target = loop {
            // SAFETY: `slot` points at `root` or at a child link of a live node and
            // `&mut self` guarantees there is no other reference into the tree.
            let Some(mut ptr) = (unsafe { slot.as_ref() }).0 else {
                log::trace!("remove found no matching item");
                return Err(Error::NotFound);
            };
            // SAFETY: See above.
            let node = unsafe { ptr.as_mut() };
            match item.cmp(&node.value) {
                Ordering::Less => slot = NonNull::from(&mut node.left),
                Ordering::Equal => break ptr,
                Ordering::Greater => slot = NonNull::from(&mut node.right),
            }
        };

        // SAFETY: `target` is a live node. The only other pointer we hold is `slot`, which
        // points at a link outside of `target`.
        let node = unsafe { target.as_mut() };
        let removed = match (node.left.0, node.right.0) {
            (Some(_), Some(_)) => {
                let largest = node.left.take_largest();
                // SAFETY: `take_largest` unlinked this node from the tree so nothing else can
                // reach it.
                let largest = unsafe { Node::into_value(largest) };
                mem::replace(&mut node.value, largest)
            }
            (left, right) => {
                // SAFETY: `slot` isn't part of `target` (see above).
                unsafe { *slot.as_mut() = Link(left.or(right)) };
                // SAFETY: We just replaced the only link to `target` with its child.
                unsafe { Node::into_value(target) }
            }
        };

        self.len -= 1;
        self.refresh_extremes();
        Ok(removed)
    }

    /// Overwrites the stored item equal to `item` with `new_item` and returns the old item, or
    /// returns `None` if there is no such item.
    ///
    /// The tree isn't reordered. It is the caller's responsibility to keep `new_item` between
    /// the items that surround the replaced one, otherwise later searches may miss items.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_tree::linked::Tree;
    ///
    /// let mut tree: Tree<(u8, &str)> = [(1, "a"), (2, "b")].into_iter().collect();
    ///
    /// assert_eq!(tree.replace(&(2, "b"), (2, "c")), Some((2, "b")));
    /// assert_eq!(tree.max(), Some(&(2, "c")));
    /// assert_eq!(tree.replace(&(3, "z"), (3, "y")), None);
    /// ```
    pub fn replace(&mut self, item: &T, new_item: T) -> Option<T>
    where
        T: Ord,
    {
        let mut current = self.root.0;
        while let Some(mut ptr) = current {
            // SAFETY: `ptr` is a live node of this tree and `&mut self` guarantees there is no
            // other reference into it.
            let node = unsafe { ptr.as_mut() };
            current = match item.cmp(&node.value) {
                Ordering::Less => node.left.0,
                Ordering::Equal => return Some(mem::replace(&mut node.value, new_item)),
                Ordering::Greater => node.right.0,
            };
        }
        None
    }

    /// Removes every item from the tree.
    pub fn clear(&mut self) {
        log::debug!("clearing tree of {} items", self.len);
        self.root.take().free();
        self.len = 0;
        self.leftmost = Link::NONE;
        self.rightmost = Link::NONE;
    }

    /// The number of edges on the longest path from the root to a leaf. A tree with a single
    /// item has a height of `0` and an empty tree has a height of `-1`.
    pub fn height(&self) -> isize {
        let mut height = -1;
        let mut stack: Vec<(&Node<T>, isize)> = Vec::new();
        stack.extend(self.root.node().map(|root| (root, 0)));
        while let Some((node, depth)) = stack.pop() {
            height = height.max(depth);
            stack.extend(node.left().map(|left| (left, depth + 1)));
            stack.extend(node.right().map(|right| (right, depth + 1)));
        }
        height
    }

    /// Whether the height of the tree is within `2 * log2(len + 1) - 1`, i.e. reasonably close
    /// to the smallest possible height for this many items. An empty tree is not considered
    /// balanced.
    pub fn is_balanced(&self) -> bool {
        (self.height() as f64) < 2.0 * ((self.len + 1) as f64).log2() - 1.0
    }

    /// Rebuilds the tree so that it is perfectly balanced. Each subtree is rooted at the middle
    /// item of its sorted contents.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_tree::linked::Tree;
    ///
    /// let mut tree: Tree<_> = (1..=5).collect();
    /// assert_eq!(tree.height(), 4);
    ///
    /// tree.rebalance();
    /// assert_eq!(tree.height(), 2);
    /// assert_eq!(tree.iter().collect::<Vec<_>>(), [&3, &2, &1, &5, &4]);
    /// ```
    pub fn rebalance(&mut self) {
        log::debug!("rebalancing tree of {} items", self.len);
        let items = self.root.take().into_sorted_vec();
        let len = items.len();
        self.root = Link::build_balanced(&mut items.into_iter(), len);
        self.refresh_extremes();
    }

    /// The smallest item strictly greater than `item`, if any.
    pub fn successor(&self, item: &T) -> Option<&T>
    where
        T: Ord,
    {
        self.inorder().find(|stored| *stored > item)
    }

    /// The largest item strictly less than `item`, if any.
    pub fn predecessor(&self, item: &T) -> Option<&T>
    where
        T: Ord,
    {
        self.inorder().take_while(|stored| *stored < item).last()
    }

    /// All items in the inclusive range `[low, high]` in ascending order. The result is empty
    /// when `low > high`.
    pub fn range_find(&self, low: &T, high: &T) -> Vec<&T>
    where
        T: Ord,
    {
        self.inorder()
            .skip_while(|stored| *stored < low)
            .take_while(|stored| *stored <= high)
            .collect()
    }

    /// Iterates the items in preorder (each node before its left, then right, subtree). This is
    /// the default iteration order of the tree.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.root.node(), self.len)
    }

    /// Iterates the items in ascending order.
    pub fn inorder(&self) -> Inorder<'_, T> {
        Inorder::new(self.root.node(), self.len)
    }

    /// Iterates the items with each node after both of its subtrees.
    pub fn postorder(&self) -> Postorder<'_, T> {
        Postorder::new(self.root.node(), self.len)
    }

    /// Iterates the items level by level from the root, left to right within a level.
    pub fn levelorder(&self) -> Levelorder<'_, T> {
        Levelorder::new(self.root.node(), self.len)
    }

    /// Points the extreme links back at the outermost nodes of the current shape.
    fn refresh_extremes(&mut self) {
        self.leftmost = self.root.outermost(Side::Left);
        self.rightmost = self.root.outermost(Side::Right);
    }
}

/// Which child of a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// A possibly empty pointer to a node. The tree owns every node through exactly one link (the
/// root or a child link of the parent); copies of a link never own anything.
pub(crate) struct Link<T>(Option<NonNull<Node<T>>>);

impl<T> Clone for Link<T> {
    fn clone(&self) -> Self {
        Self(self.0)
    }
}
impl<T> Copy for Link<T> {}

impl<T> PartialEq for Link<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Link<T> {
    const NONE: Self = Link(None);

    pub(crate) fn node(&self) -> Option<&Node<T>> {
        // SAFETY: If the link is not `None` then it points at a live `Node` owned by the tree
        // that contains this link. Borrowing through `&self` ties the node to a borrow of that
        // tree, so it can't be freed or mutated while the reference is alive.
        unsafe { self.0.as_ref().map(|ptr| ptr.as_ref()) }
    }

    fn take(&mut self) -> Self {
        Link(self.0.take())
    }

    /// Walks from this node to the last node on the given side.
    fn outermost(self, side: Side) -> Self {
        let mut current = self;
        while let Some(node) = current.node() {
            let next = node.child(side);
            if next.0.is_none() {
                break;
            }
            current = next;
        }
        current
    }

    /// Unlinks the largest node of this non-empty subtree, splicing its left child into its
    /// place, and returns it.
    fn take_largest(&mut self) -> NonNull<Node<T>> {
        let mut slot = NonNull::from(self);
        loop {
            // SAFETY: `slot` is `self` or the right link of a live node in the subtree, and the
            // caller holds the subtree mutably.
            let link = unsafe { slot.as_mut() };
            let Some(mut ptr) = link.0 else {
                unreachable!("`take_largest` called on an empty subtree");
            };
            // SAFETY: See above.
            let node = unsafe { ptr.as_mut() };
            if node.right.0.is_none() {
                *link = node.left.take();
                return ptr;
            }
            slot = NonNull::from(&mut node.right);
        }
    }

    /// Frees every node in this subtree without recursing so that long chains can't overflow
    /// the stack.
    fn free(self) {
        let mut stack: Vec<NonNull<Node<T>>> = self.0.into_iter().collect();
        while let Some(ptr) = stack.pop() {
            // SAFETY: Every node was allocated with `Box` in `Node::alloc`, is owned by exactly
            // one link, and that link was detached from the tree by the caller so this is the
            // only place that frees it.
            let node = unsafe { Box::from_raw(ptr.as_ptr()) };
            stack.extend(node.left.0);
            stack.extend(node.right.0);
        }
    }

    /// Consumes this subtree and returns its items in ascending order.
    fn into_sorted_vec(self) -> Vec<T> {
        let mut items = Vec::new();
        let mut stack: Vec<NonNull<Node<T>>> = Vec::new();
        let mut current = self.0;
        loop {
            while let Some(ptr) = current {
                stack.push(ptr);
                // SAFETY: `ptr` is a live node of the detached subtree that hasn't been freed
                // yet. Nodes are only freed after their left subtree was fully visited.
                current = unsafe { ptr.as_ref() }.left.0;
            }
            let Some(ptr) = stack.pop() else {
                return items;
            };
            // SAFETY: Its left subtree has been consumed and nothing else points at it, so this
            // is the last use of the node.
            let node = unsafe { Box::from_raw(ptr.as_ptr()) };
            current = node.right.0;
            items.push(node.value);
        }
    }

    /// Builds a perfectly balanced subtree out of the next `len` (ascending) items. The middle
    /// item becomes the root and each half is built the same way.
    fn build_balanced(items: &mut impl Iterator<Item = T>, len: usize) -> Self {
        if len == 0 {
            return Link::NONE;
        }
        let left_len = len / 2;
        let left = Self::build_balanced(items, left_len);
        let Some(value) = items.next() else {
            unreachable!("`build_balanced` ran out of items");
        };
        let right = Self::build_balanced(items, len - left_len - 1);

        let mut ptr = Node::alloc(value);
        // SAFETY: `ptr` was just allocated and nothing else references it.
        let node = unsafe { ptr.as_mut() };
        node.left = left;
        node.right = right;
        Link(Some(ptr))
    }
}

/// A single item and its (possibly empty) children.
pub(crate) struct Node<T> {
    pub(crate) value: T,
    left: Link<T>,
    right: Link<T>,
}

impl<T> Node<T> {
    /// Allocates a childless node. It must eventually be released with [`Link::free`],
    /// [`Link::into_sorted_vec`] or [`Node::into_value`].
    fn alloc(value: T) -> NonNull<Self> {
        NonNull::from(Box::leak(Box::new(Node {
            value,
            left: Link::NONE,
            right: Link::NONE,
        })))
    }

    /// Frees a single node and returns its item. Its children are left untouched.
    ///
    /// # Safety
    ///
    /// The node must have been unlinked from the tree so that it is never dereferenced again.
    unsafe fn into_value(node: NonNull<Self>) -> T {
        Box::from_raw(node.as_ptr()).value
    }

    pub(crate) fn left(&self) -> Option<&Self> {
        self.left.node()
    }

    pub(crate) fn right(&self) -> Option<&Self> {
        self.right.node()
    }

    fn child(&self, side: Side) -> Link<T> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    fn child_mut(&mut self, side: Side) -> &mut Link<T> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}
