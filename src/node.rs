//! Singly linked element chain
//!
//! This module provides the storage behind the queue: a chain of heap nodes
//! in enqueue order. The chain owns its oldest node, every node owns the next
//! younger one, and a second pointer to the newest node makes appends O(1).
//! The chain is not synchronized; callers keep it behind the queue lock.

use std::marker::PhantomData;
use std::ptr::NonNull;

/// A single queued value and the link to the node enqueued right after it
pub(crate) struct Node<T> {
    value: T,
    next: Option<NonNull<Node<T>>>,
}

impl<T> Node<T> {
    /// Allocates an unlinked node holding `value`
    ///
    /// Allocation happens here rather than in [`Chain::push_back`] so that it
    /// can be done before the queue lock is taken.
    #[inline]
    pub(crate) fn boxed(value: T) -> Box<Self> {
        Box::new(Self { value, next: None })
    }

    /// Consumes an unlinked node and returns its value
    #[inline]
    pub(crate) fn into_value(self: Box<Self>) -> T {
        self.value
    }
}

/// FIFO chain of nodes, oldest first
pub(crate) struct Chain<T> {
    /// Next node to be removed
    oldest: Option<NonNull<Node<T>>>,

    /// Most recently appended node
    newest: Option<NonNull<Node<T>>>,

    /// Number of linked nodes
    len: usize,

    /// The chain owns every linked node
    _owns: PhantomData<Box<Node<T>>>,
}

// SAFETY: the chain exclusively owns its nodes, so moving it to another
// thread moves the values with it.
unsafe impl<T: Send> Send for Chain<T> {}

impl<T> Chain<T> {
    /// Creates an empty chain
    #[inline]
    pub(crate) const fn new() -> Self {
        Self {
            oldest: None,
            newest: None,
            len: 0,
            _owns: PhantomData,
        }
    }

    /// Number of linked nodes
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Links `node` behind the newest node
    pub(crate) fn push_back(&mut self, node: Box<Node<T>>) {
        debug_assert!(node.next.is_none());
        let node = NonNull::from(Box::leak(node));

        match self.newest {
            // SAFETY: `newest` is the last live node of this chain. Nodes are
            // only freed in `pop_front`, which clears `newest` when it unlinks
            // the last one.
            Some(newest) => unsafe { (*newest.as_ptr()).next = Some(node) },
            None => self.oldest = Some(node),
        }

        self.newest = Some(node);
        self.len += 1;
    }

    /// Unlinks the oldest node and returns its value
    pub(crate) fn pop_front(&mut self) -> Option<T> {
        let oldest = self.oldest?;

        // SAFETY: every linked node was leaked from a `Box` in `push_back` and
        // is reclaimed exactly once, here, as it leaves the chain.
        let node = unsafe { Box::from_raw(oldest.as_ptr()) };

        self.oldest = node.next;
        if self.oldest.is_none() {
            self.newest = None;
        }
        self.len -= 1;

        Some(node.value)
    }

    /// Walks the chain from `oldest` and checks it against `len` and `newest`
    #[cfg(test)]
    pub(crate) fn assert_linked(&self) {
        let mut visited = 0;
        let mut last = None;
        let mut cursor = self.oldest;

        while let Some(node) = cursor {
            visited += 1;
            last = Some(node);
            // SAFETY: linked nodes stay alive until `pop_front` unlinks them.
            cursor = unsafe { (*node.as_ptr()).next };
        }

        assert_eq!(visited, self.len, "chain length does not match count");
        assert_eq!(last, self.newest, "chain does not end at the newest node");
        assert_eq!(self.len == 0, self.oldest.is_none());
    }
}

impl<T> Drop for Chain<T> {
    fn drop(&mut self) {
        // Iterative so that a long chain cannot overflow the stack
        while self.pop_front().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn push(chain: &mut Chain<String>, value: &str) {
        chain.push_back(Node::boxed(value.to_string()));
    }

    #[test]
    fn test_empty_chain() {
        let mut chain = Chain::<String>::new();
        chain.assert_linked();
        assert!(chain.is_empty());
        assert_eq!(chain.pop_front(), None);
        chain.assert_linked();
    }

    #[test]
    fn test_fifo_order() {
        let mut chain = Chain::new();
        push(&mut chain, "one");
        push(&mut chain, "two");
        push(&mut chain, "three");
        chain.assert_linked();
        assert_eq!(chain.len(), 3);

        assert_eq!(chain.pop_front().as_deref(), Some("one"));
        chain.assert_linked();
        assert_eq!(chain.pop_front().as_deref(), Some("two"));
        assert_eq!(chain.pop_front().as_deref(), Some("three"));
        chain.assert_linked();
        assert_eq!(chain.pop_front(), None);
    }

    #[test]
    fn test_reuse_after_drain() {
        let mut chain = Chain::new();
        push(&mut chain, "a");
        assert_eq!(chain.pop_front().as_deref(), Some("a"));

        // The newest pointer must have been reset, otherwise this would link
        // behind a freed node.
        push(&mut chain, "b");
        push(&mut chain, "c");
        chain.assert_linked();
        assert_eq!(chain.pop_front().as_deref(), Some("b"));
        assert_eq!(chain.pop_front().as_deref(), Some("c"));
    }

    #[test]
    fn test_unlinked_node_returns_value() {
        let node = Node::boxed(vec![1u8, 2, 3]);
        assert_eq!(node.into_value(), vec![1, 2, 3]);
    }

    #[test]
    fn test_drop_releases_every_value() {
        let tracker = Rc::new(());
        {
            let mut chain = Chain::new();
            for _ in 0..8 {
                chain.push_back(Node::boxed(Rc::clone(&tracker)));
            }
            drop(chain.pop_front());
            assert_eq!(Rc::strong_count(&tracker), 8);
        }
        assert_eq!(Rc::strong_count(&tracker), 1);
    }

    #[test]
    fn test_drop_long_chain() {
        let mut chain = Chain::new();
        for i in 0..1_000_000u32 {
            chain.push_back(Node::boxed(i));
        }
        assert_eq!(chain.len(), 1_000_000);
        drop(chain);
    }
}
