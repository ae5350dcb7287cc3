//! Catalog tree: an unbalanced binary search tree of books keyed by
//! sequence number.
//!
//! The shape follows insertion order and is never rebalanced. Sequence
//! numbers are issued in increasing order, so a catalog built by
//! registration or rebuilt from its own ordered listing degenerates into a
//! right spine. Every walk is therefore iterative, including `Drop`, so a
//! deep tree cannot overflow the stack.
//!
//! Deletion does not restructure nodes: the tree is rebuilt from its
//! ordered listing minus the removed book.

use crate::models::Book;

type Link = Option<Box<Node>>;

struct Node {
    book: Book,
    left: Link,
    right: Link,
}

impl Node {
    fn leaf(book: Book) -> Box<Self> {
        Box::new(Self {
            book,
            left: None,
            right: None,
        })
    }
}

#[derive(Default)]
pub struct BookTree {
    root: Link,
    len: usize,
}

impl BookTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Insert a book. Smaller sequence numbers go left, everything else
    /// (ties included) goes right. Uniqueness is the caller's job.
    pub fn insert(&mut self, book: Book) {
        let mut link = &mut self.root;
        while let Some(node) = link {
            link = if book.sequence_number < node.book.sequence_number {
                &mut node.left
            } else {
                &mut node.right
            };
        }
        *link = Some(Node::leaf(book));
        self.len += 1;
    }

    /// Pre-order lookup by id, stopping at the first match
    pub fn find_by_id(&self, id: &str) -> Option<&Book> {
        self.pre_order().find(|book| book.id == id)
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Book> {
        let mut stack: Vec<&mut Node> = Vec::new();
        stack.extend(self.root.as_deref_mut());
        while let Some(node) = stack.pop() {
            let Node { book, left, right } = node;
            if book.id == id {
                return Some(book);
            }
            stack.extend(right.as_deref_mut());
            stack.extend(left.as_deref_mut());
        }
        None
    }

    /// Books whose title, author or sequence number contain `query`,
    /// case-insensitively, in pre-order (not sorted).
    pub fn search_by_text(&self, query: &str) -> Vec<&Book> {
        let needle = query.trim().to_lowercase();
        self.pre_order().filter(|book| book.matches(&needle)).collect()
    }

    /// In-order walk: strictly ascending by sequence number
    pub fn to_ordered(&self) -> Vec<&Book> {
        let mut out = Vec::with_capacity(self.len);
        let mut stack: Vec<&Node> = Vec::new();
        let mut current = self.root.as_deref();
        loop {
            while let Some(node) = current {
                stack.push(node);
                current = node.left.as_deref();
            }
            match stack.pop() {
                Some(node) => {
                    out.push(&node.book);
                    current = node.right.as_deref();
                }
                None => break,
            }
        }
        out
    }

    /// Owned copy of the ordered listing, as persisted and exported
    pub fn to_ordered_vec(&self) -> Vec<Book> {
        self.to_ordered().into_iter().cloned().collect()
    }

    /// Discard every node and insert `books` in the given order
    pub fn rebuild_from<I>(&mut self, books: I)
    where
        I: IntoIterator<Item = Book>,
    {
        self.clear();
        for book in books {
            self.insert(book);
        }
    }

    /// Remove by rebuilding from the ordered listing without `id`.
    /// Returns the removed book, if it was present.
    pub fn remove_by_id(&mut self, id: &str) -> Option<Book> {
        let mut removed = None;
        let mut kept = Vec::with_capacity(self.len);
        for book in self.drain_ordered() {
            if removed.is_none() && book.id == id {
                removed = Some(book);
            } else {
                kept.push(book);
            }
        }
        self.rebuild_from(kept);
        removed
    }

    pub fn clear(&mut self) {
        let mut stack: Vec<Box<Node>> = Vec::new();
        stack.extend(self.root.take());
        while let Some(mut node) = stack.pop() {
            stack.extend(node.left.take());
            stack.extend(node.right.take());
        }
        self.len = 0;
    }

    /// Longest root-to-leaf path, counted in nodes
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(&Node, usize)> = Vec::new();
        stack.extend(self.root.as_deref().map(|n| (n, 1)));
        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            stack.extend(node.left.as_deref().map(|n| (n, level + 1)));
            stack.extend(node.right.as_deref().map(|n| (n, level + 1)));
        }
        deepest
    }

    fn pre_order(&self) -> PreOrder<'_> {
        PreOrder {
            stack: self.root.as_deref().into_iter().collect(),
        }
    }

    /// Take every book out in ascending order, leaving the tree empty
    fn drain_ordered(&mut self) -> Vec<Book> {
        let mut out = Vec::with_capacity(self.len);
        let mut stack: Vec<Box<Node>> = Vec::new();
        let mut current = self.root.take();
        loop {
            while let Some(mut node) = current {
                current = node.left.take();
                stack.push(node);
            }
            match stack.pop() {
                Some(mut node) => {
                    current = node.right.take();
                    out.push(node.book);
                }
                None => break,
            }
        }
        self.len = 0;
        out
    }
}

impl Drop for BookTree {
    fn drop(&mut self) {
        self.clear();
    }
}

impl std::fmt::Debug for BookTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookTree")
            .field("len", &self.len)
            .field("depth", &self.depth())
            .finish()
    }
}

struct PreOrder<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a Book;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.right.as_deref());
        self.stack.extend(node.left.as_deref());
        Some(&node.book)
    }
}
