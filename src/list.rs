//! Arena-backed doubly linked lists with externally held node handles.
//!
//! A [`ListPool`] owns any number of lists and the nodes in them.
//! Nodes are created on their own and can then be linked into at most one list at a time.
//! Because the handles live outside the list, an item can be a member of several lists
//! as long as it holds one node per membership.
//! Every operation is O(1).

use thunderdome as td;

/// Handle to a list in a [`ListPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListKey(td::Index);

impl ListKey {
    #[inline]
    pub fn index(&self) -> td::Index {
        self.0
    }
}

/// Handle to a node in a [`ListPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeKey(td::Index);

impl NodeKey {
    #[inline]
    pub fn index(&self) -> td::Index {
        self.0
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct ListHead {
    first: Option<NodeKey>,
    last: Option<NodeKey>,
    len: usize,
}

#[derive(Clone, Debug)]
struct Node<T> {
    prev: Option<NodeKey>,
    next: Option<NodeKey>,
    list: Option<ListKey>,
    item: T,
}

/// Storage for a family of linked lists whose nodes carry items of type `T`.
///
/// Methods taking keys panic if a key doesn't belong to this pool
/// or refers to something that has been destroyed.
#[derive(Clone, Debug)]
pub struct ListPool<T> {
    lists: td::Arena<ListHead>,
    nodes: td::Arena<Node<T>>,
}

impl<T> Default for ListPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ListPool<T> {
    pub fn new() -> Self {
        Self {
            lists: td::Arena::new(),
            nodes: td::Arena::new(),
        }
    }

    //
    // lists
    //

    /// Create a new empty list.
    pub fn create_list(&mut self) -> ListKey {
        ListKey(self.lists.insert(ListHead::default()))
    }

    /// Destroy a list. Its nodes are unlinked but stay alive.
    /// Returns false if the list didn't exist.
    pub fn destroy_list(&mut self, list: ListKey) -> bool {
        let Some(head) = self.lists.remove(list.0) else {
            return false;
        };
        let mut cursor = head.first;
        while let Some(key) = cursor {
            let node = &mut self.nodes[key.0];
            cursor = node.next;
            node.prev = None;
            node.next = None;
            node.list = None;
        }
        true
    }

    #[inline]
    pub fn contains_list(&self, list: ListKey) -> bool {
        self.lists.contains(list.0)
    }

    #[inline]
    pub fn len(&self, list: ListKey) -> usize {
        self.lists[list.0].len
    }

    #[inline]
    pub fn is_empty(&self, list: ListKey) -> bool {
        self.len(list) == 0
    }

    #[inline]
    pub fn first(&self, list: ListKey) -> Option<NodeKey> {
        self.lists[list.0].first
    }

    #[inline]
    pub fn last(&self, list: ListKey) -> Option<NodeKey> {
        self.lists[list.0].last
    }

    /// Iterate over the nodes of a list from first to last.
    pub fn iter(&self, list: ListKey) -> Iter<'_, T> {
        Iter {
            pool: self,
            cursor: self.first(list),
        }
    }

    /// Iterate over the nodes following `node` in its list.
    pub fn iter_after(&self, node: NodeKey) -> Iter<'_, T> {
        Iter {
            pool: self,
            cursor: self.next(node),
        }
    }

    /// Iterate over the items of a list from first to last.
    pub fn items(&self, list: ListKey) -> impl '_ + Iterator<Item = &T> {
        self.iter(list).map(|(_, item)| item)
    }

    //
    // nodes
    //

    /// Create a node that isn't in any list yet.
    pub fn create_node(&mut self, item: T) -> NodeKey {
        NodeKey(self.nodes.insert(Node {
            prev: None,
            next: None,
            list: None,
            item,
        }))
    }

    /// Destroy a node, removing it from its list first if it's in one.
    /// Returns the item if the node still existed.
    pub fn destroy_node(&mut self, node: NodeKey) -> Option<T> {
        if !self.nodes.contains(node.0) {
            return None;
        }
        self.remove(node);
        self.nodes.remove(node.0).map(|n| n.item)
    }

    #[inline]
    pub fn contains_node(&self, node: NodeKey) -> bool {
        self.nodes.contains(node.0)
    }

    #[inline]
    pub fn item(&self, node: NodeKey) -> Option<&T> {
        self.nodes.get(node.0).map(|n| &n.item)
    }

    #[inline]
    pub fn item_mut(&mut self, node: NodeKey) -> Option<&mut T> {
        self.nodes.get_mut(node.0).map(|n| &mut n.item)
    }

    /// The list a node is currently in, if any.
    #[inline]
    pub fn list_of(&self, node: NodeKey) -> Option<ListKey> {
        self.nodes[node.0].list
    }

    #[inline]
    pub fn next(&self, node: NodeKey) -> Option<NodeKey> {
        self.nodes[node.0].next
    }

    #[inline]
    pub fn prev(&self, node: NodeKey) -> Option<NodeKey> {
        self.nodes[node.0].prev
    }

    //
    // insertion
    //

    /// Insert a node at the start of a list.
    /// If the node was in a list already, it's moved.
    pub fn insert_first(&mut self, list: ListKey, node: NodeKey) {
        match self.first(list) {
            Some(first) => self.insert_prev(first, node),
            None => self.insert_only(list, node),
        }
    }

    /// Insert a node at the end of a list.
    /// If the node was in a list already, it's moved.
    pub fn insert_last(&mut self, list: ListKey, node: NodeKey) {
        match self.last(list) {
            Some(last) => self.insert_next(last, node),
            None => self.insert_only(list, node),
        }
    }

    /// Create a node for an item and insert it at the start of a list.
    pub fn insert_first_item(&mut self, list: ListKey, item: T) -> NodeKey {
        let node = self.create_node(item);
        self.insert_first(list, node);
        node
    }

    /// Create a node for an item and insert it at the end of a list.
    pub fn insert_last_item(&mut self, list: ListKey, item: T) -> NodeKey {
        let node = self.create_node(item);
        self.insert_last(list, node);
        node
    }

    /// Insert `node` directly after `anchor`, in the same list as `anchor`.
    ///
    /// # Panics
    /// Panics if `anchor` is not in a list.
    pub fn insert_next(&mut self, anchor: NodeKey, node: NodeKey) {
        if anchor == node {
            return;
        }
        self.remove(node);
        let list = self.nodes[anchor.0]
            .list
            .expect("insert_next anchor is not in a list");
        let after = self.nodes[anchor.0].next;

        let inserted = &mut self.nodes[node.0];
        inserted.prev = Some(anchor);
        inserted.next = after;
        inserted.list = Some(list);
        self.nodes[anchor.0].next = Some(node);

        let head = &mut self.lists[list.0];
        match after {
            Some(after) => self.nodes[after.0].prev = Some(node),
            None => head.last = Some(node),
        }
        head.len += 1;
    }

    /// Insert `node` directly before `anchor`, in the same list as `anchor`.
    ///
    /// # Panics
    /// Panics if `anchor` is not in a list.
    pub fn insert_prev(&mut self, anchor: NodeKey, node: NodeKey) {
        if anchor == node {
            return;
        }
        self.remove(node);
        let list = self.nodes[anchor.0]
            .list
            .expect("insert_prev anchor is not in a list");
        let before = self.nodes[anchor.0].prev;

        let inserted = &mut self.nodes[node.0];
        inserted.prev = before;
        inserted.next = Some(anchor);
        inserted.list = Some(list);
        self.nodes[anchor.0].prev = Some(node);

        let head = &mut self.lists[list.0];
        match before {
            Some(before) => self.nodes[before.0].next = Some(node),
            None => head.first = Some(node),
        }
        head.len += 1;
    }

    /// Create a node for an item and insert it directly after `anchor`.
    pub fn insert_next_item(&mut self, anchor: NodeKey, item: T) -> NodeKey {
        let node = self.create_node(item);
        self.insert_next(anchor, node);
        node
    }

    /// Create a node for an item and insert it directly before `anchor`.
    pub fn insert_prev_item(&mut self, anchor: NodeKey, item: T) -> NodeKey {
        let node = self.create_node(item);
        self.insert_prev(anchor, node);
        node
    }

    fn insert_only(&mut self, list: ListKey, node: NodeKey) {
        self.remove(node);
        let inserted = &mut self.nodes[node.0];
        inserted.prev = None;
        inserted.next = None;
        inserted.list = Some(list);
        let head = &mut self.lists[list.0];
        head.first = Some(node);
        head.last = Some(node);
        head.len = 1;
    }

    //
    // reordering and removal
    //

    /// Swap a node with the one after it. Does nothing if it's the last node.
    pub fn swap_with_next(&mut self, node: NodeKey) {
        if let Some(next) = self.nodes[node.0].next {
            self.swap_adjacent(node, next);
        }
    }

    /// Swap a node with the one before it. Does nothing if it's the first node.
    pub fn swap_with_prev(&mut self, node: NodeKey) {
        if let Some(prev) = self.nodes[node.0].prev {
            self.swap_adjacent(prev, node);
        }
    }

    // `second` must be directly after `first` in the same list.
    fn swap_adjacent(&mut self, first: NodeKey, second: NodeKey) {
        let Some(list) = self.nodes[first.0].list else {
            return;
        };
        let before = self.nodes[first.0].prev;
        let after = self.nodes[second.0].next;

        let s = &mut self.nodes[second.0];
        s.prev = before;
        s.next = Some(first);
        let f = &mut self.nodes[first.0];
        f.prev = Some(second);
        f.next = after;

        let head = &mut self.lists[list.0];
        match before {
            Some(before) => self.nodes[before.0].next = Some(second),
            None => head.first = Some(second),
        }
        match after {
            Some(after) => self.nodes[after.0].prev = Some(first),
            None => head.last = Some(first),
        }
    }

    /// Unlink a node from its list. Does nothing if it isn't in one.
    pub fn remove(&mut self, node: NodeKey) {
        let Some(list) = self.nodes[node.0].list else {
            return;
        };
        let n = &mut self.nodes[node.0];
        let (prev, next) = (n.prev.take(), n.next.take());
        n.list = None;

        let head = &mut self.lists[list.0];
        match prev {
            Some(prev) => self.nodes[prev.0].next = next,
            None => head.first = next,
        }
        match next {
            Some(next) => self.nodes[next.0].prev = prev,
            None => head.last = prev,
        }
        head.len -= 1;
    }
}

/// Iterator over the nodes of a list, returned by [`ListPool::iter`].
pub struct Iter<'a, T> {
    pool: &'a ListPool<T>,
    cursor: Option<NodeKey>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (NodeKey, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.cursor?;
        let node = &self.pool.nodes[key.0];
        self.cursor = node.next;
        Some((key, &node.item))
    }
}

//
// tests
//
