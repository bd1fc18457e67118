//! A priority queue implemented with a 4-ary heap.
//!
//! Insertion and popping the minimal element have `O(log n)` time complexity.
//! Checking the minimal element is `O(1)`. Keys of elements already in the heap can
//! be decreased, which is what the witness search needs for its edge key frontier.
//!
//! # Examples
//!
//! ```
//! use edge_ch_witness::datastr::index_heap::{Indexing, IndexdMinHeap};
//!
//! #[derive(Copy, Clone, Eq, PartialEq, Debug, Ord, PartialOrd)]
//! pub struct State {
//!     pub distance: usize,
//!     pub node: usize,
//! }
//!
//! // The `Indexing` traits needs to be implemented as well, so we can find elements to decrease their key.
//! impl Indexing for State {
//!     fn as_index(&self) -> usize {
//!         self.node as usize
//!     }
//! }
//!
//! let mut heap = IndexdMinHeap::new(3);
//! heap.push(State { node: 0, distance: 42 });
//! heap.push(State { node: 1, distance: 23 });
//! heap.push(State { node: 2, distance: 50000 });
//! assert_eq!(heap.peek().cloned(), Some(State { node: 1, distance: 23 }));
//! heap.decrease_key(State { node: 0, distance: 1 });
//! assert_eq!(heap.pop(), Some(State { node: 0, distance: 1 }));
//! ```

use std::cmp::min;

/// A trait to map elements in a heap to a unique index.
/// The element type of the `IndexdMinHeap` has to implement this trait.
pub trait Indexing {
    /// This method has to map a heap element to a unique `usize` index.
    fn as_index(&self) -> usize;
}

/// A priority queue where the elements are IDs from 0 to id_count-1 where id_count is a number that is set in the constructor.
/// The elements are sorted ascending by the ordering defined by the `Ord` trait.
/// The interface mirrors the standard library BinaryHeap (except for the reversed order).
/// Only the methods necessary for dijkstras algorithm are implemented.
#[derive(Debug, Clone)]
pub struct IndexdMinHeap<T> {
    positions: Vec<usize>,
    data: Vec<T>,
}

const TREE_ARITY: usize = 4;
const INVALID_POSITION: usize = usize::MAX;

impl<T: Ord + Indexing> IndexdMinHeap<T> {
    /// Creates an empty `IndexdMinHeap` as a min-heap.
    /// The indices (as defined by the `Indexing` trait) of all inserted elements
    /// will have to be between in `[0, max_index)`
    pub fn new(max_id: usize) -> IndexdMinHeap<T> {
        IndexdMinHeap {
            positions: vec![INVALID_POSITION; max_id],
            data: Vec::new(),
        }
    }

    /// Returns the length of the binary heap.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Checks if the binary heap is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks if the heap already contains an element mapped to the given index
    pub fn contains_index(&self, id: usize) -> bool {
        self.positions[id] != INVALID_POSITION
    }

    /// Drops all items from the heap.
    /// Only touches the positions of contained elements, so this is cheap for small heaps.
    pub fn clear(&mut self) {
        for element in &self.data {
            self.positions[element.as_index()] = INVALID_POSITION;
        }
        self.data.clear();
    }

    /// Returns a reference to the smallest item in the heap, or None if it is empty.
    pub fn peek(&self) -> Option<&T> {
        self.data.first()
    }

    /// Removes the smallest item from the heap and returns it, or None if it is empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.data.is_empty() {
            return None;
        }
        let item = self.data.swap_remove(0);
        self.positions[item.as_index()] = INVALID_POSITION;
        if !self.data.is_empty() {
            self.positions[self.data[0].as_index()] = 0;
            self.move_down_in_tree(0);
        }
        Some(item)
    }

    /// Pushes an item onto the heap.
    /// Panics if an element with the same index already exists.
    pub fn push(&mut self, element: T) {
        assert!(!self.contains_index(element.as_index()));
        let insert_position = self.len();
        self.positions[element.as_index()] = insert_position;
        self.data.push(element);
        self.move_up_in_tree(insert_position);
    }

    /// Replaces the element with the same index by the given one, which must not be larger.
    /// Panics if no element with this index is contained.
    pub fn decrease_key(&mut self, element: T) {
        let position = self.positions[element.as_index()];
        assert_ne!(position, INVALID_POSITION, "decrease_key on element not in heap");
        debug_assert!(element <= self.data[position]);
        self.data[position] = element;
        self.move_up_in_tree(position);
    }

    fn move_up_in_tree(&mut self, mut position: usize) {
        while position > 0 {
            let parent = (position - 1) / TREE_ARITY;
            if self.data[parent] <= self.data[position] {
                break;
            }
            self.swap_elements(parent, position);
            position = parent;
        }
    }

    fn move_down_in_tree(&mut self, mut position: usize) {
        let heap_size = self.len();
        loop {
            let first_child = TREE_ARITY * position + 1;
            if first_child >= heap_size {
                return; // no children at all
            }
            let last_child = min(first_child + TREE_ARITY, heap_size);
            let smallest_child = (first_child..last_child).min_by(|&a, &b| self.data[a].cmp(&self.data[b])).unwrap();

            if self.data[smallest_child] >= self.data[position] {
                return; // no child is smaller
            }
            self.swap_elements(smallest_child, position);
            position = smallest_child;
        }
    }

    fn swap_elements(&mut self, a: usize, b: usize) {
        self.positions.swap(self.data[a].as_index(), self.data[b].as_index());
        self.data.swap(a, b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Copy, Clone, Eq, PartialEq, Debug, Ord, PartialOrd)]
    struct Entry {
        key: u32,
        id: usize,
    }

    impl Indexing for Entry {
        fn as_index(&self) -> usize {
            self.id
        }
    }

    #[test]
    fn pops_in_ascending_order() {
        let keys = [17, 3, 99, 42, 3, 8, 0, 56, 23, 11, 5];
        let mut heap = IndexdMinHeap::new(keys.len());
        for (id, &key) in keys.iter().enumerate() {
            heap.push(Entry { key, id });
        }
        let mut popped = Vec::new();
        while let Some(Entry { key, .. }) = heap.pop() {
            popped.push(key);
        }
        let mut sorted = keys.to_vec();
        sorted.sort_unstable();
        assert_eq!(popped, sorted);
        assert!(heap.is_empty());
    }

    #[test]
    fn decrease_key_moves_element_to_front() {
        let mut heap = IndexdMinHeap::new(10);
        for id in 0..10 {
            heap.push(Entry { key: 100 + id as u32, id });
        }
        heap.decrease_key(Entry { key: 1, id: 7 });
        assert_eq!(heap.peek(), Some(&Entry { key: 1, id: 7 }));
        assert_eq!(heap.pop(), Some(Entry { key: 1, id: 7 }));
        assert!(!heap.contains_index(7));
        assert_eq!(heap.pop(), Some(Entry { key: 100, id: 0 }));
    }

    #[test]
    fn clear_resets_positions() {
        let mut heap = IndexdMinHeap::new(4);
        heap.push(Entry { key: 1, id: 0 });
        heap.push(Entry { key: 2, id: 3 });
        heap.clear();
        assert!(heap.is_empty());
        assert!(!heap.contains_index(0));
        assert!(!heap.contains_index(3));
        heap.push(Entry { key: 5, id: 3 });
        assert_eq!(heap.len(), 1);
    }

    #[test]
    #[should_panic]
    fn double_push_panics() {
        let mut heap = IndexdMinHeap::new(2);
        heap.push(Entry { key: 1, id: 1 });
        heap.push(Entry { key: 0, id: 1 });
    }
}
