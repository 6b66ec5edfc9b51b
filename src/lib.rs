//! This crate exposes an ordered collection built on a plain (not self-balancing) Binary
//! Search Tree, mostly for educational purposes.
//!
//! ## Binary Search Tree
//!
//! A Binary Search Tree is a data structure supporting operations to
//! add, find, and remove stored items. BSTs are typically defined
//! recursively using the notion of a `Node`. A `Node` stores one item
//! and will sometimes have child `Node`s. The most important invariants
//! of this BST are:
//!
//! 1. For every `Node`, all the `Node`s in its left subtree hold items
//!    less than its own item.
//! 2. For every `Node`, all the `Node`s in its right subtree hold items
//!    greater than or equal to its own item. Duplicates always go right.
//!
//! > Note that some `Node`s have no children. These `Node`s are called "leaf nodes".
//!
//! Searching takes `O(height)` where `height` is the longest path from the
//! root `Node` to a leaf `Node`. This tree doesn't rebalance itself, so adding
//! sorted items yields a chain with a height of `N - 1`. Calling
//! [`Tree::rebalance`][linked::Tree::rebalance] rebuilds it with a height of
//! `O(lg N)`. BSTs also naturally support sorted iteration by visiting the
//! left subtree, then the subtree root, then the right subtree.

#![deny(missing_docs, clippy::clone_on_ref_ptr)]

pub mod error;
pub mod linked;
pub mod traverse;
