//! Element paths computed from a live DOM.
//!
//! The walk goes upward: for each ancestor, count earlier element siblings
//! with the same tag name, then move to the parent. It stops at the first
//! node without a tag name (the document or a fragment), so a detached
//! subtree yields a path rooted at its topmost element.

use std::collections::VecDeque;

use od_debug_core::{ELEMENT_NODE, ElementPath, PathError, PathSegment};

/// The slice of the DOM `Node` interface the walk needs.
pub trait LiveNode: Clone {
    fn node_type(&self) -> u16;

    /// DOM `tagName`; `None` for anything that is not an element.
    fn tag_name(&self) -> Option<String>;

    fn parent_node(&self) -> Option<Self>;

    fn previous_sibling(&self) -> Option<Self>;
}

/// Computes the element path of `element`.
pub fn create_xpath<N: LiveNode>(element: &N) -> Result<ElementPath, PathError> {
    let node_type = element.node_type();
    if node_type != ELEMENT_NODE {
        return Err(PathError::NotAnElement { node_type });
    }

    let mut segments = VecDeque::new();
    let mut current = Some(element.clone());
    while let Some(node) = current {
        let Some(tag) = node.tag_name() else {
            break;
        };
        let index = 1 + preceding_siblings(&node)
            .filter(|sibling| {
                sibling.node_type() == ELEMENT_NODE && sibling.tag_name().as_deref() == Some(tag.as_str())
            })
            .count();
        segments.push_front(PathSegment::new(tag, index));
        current = node.parent_node();
    }

    ElementPath::from_segments(&segments)
}

fn preceding_siblings<N: LiveNode>(node: &N) -> impl Iterator<Item = N> {
    std::iter::successors(node.previous_sibling(), LiveNode::previous_sibling)
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory DOM for exercising the walk without a browser.

    use std::cell::RefCell;
    use std::rc::{Rc, Weak};

    use super::LiveNode;

    pub const TEXT_NODE: u16 = 3;
    pub const DOCUMENT_NODE: u16 = 9;

    #[derive(Debug)]
    struct Data {
        node_type: u16,
        tag: Option<String>,
        parent: RefCell<Weak<Data>>,
        children: RefCell<Vec<MockNode>>,
    }

    #[derive(Debug, Clone)]
    pub struct MockNode(Rc<Data>);

    impl MockNode {
        fn with(node_type: u16, tag: Option<&str>) -> Self {
            Self(Rc::new(Data {
                node_type,
                tag: tag.map(str::to_string),
                parent: RefCell::new(Weak::new()),
                children: RefCell::new(Vec::new()),
            }))
        }

        pub fn document() -> Self {
            Self::with(DOCUMENT_NODE, None)
        }

        pub fn element(tag: &str) -> Self {
            Self::with(1, Some(tag))
        }

        pub fn text() -> Self {
            Self::with(TEXT_NODE, None)
        }

        /// Appends `child` and returns it.
        pub fn append(&self, child: MockNode) -> MockNode {
            *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
            self.0.children.borrow_mut().push(child.clone());
            child
        }
    }

    impl LiveNode for MockNode {
        fn node_type(&self) -> u16 {
            self.0.node_type
        }

        fn tag_name(&self) -> Option<String> {
            self.0.tag.clone()
        }

        fn parent_node(&self) -> Option<Self> {
            self.0.parent.borrow().upgrade().map(MockNode)
        }

        fn previous_sibling(&self) -> Option<Self> {
            let parent = self.parent_node()?;
            let siblings = parent.0.children.borrow();
            let position = siblings
                .iter()
                .position(|sibling| Rc::ptr_eq(&sibling.0, &self.0))?;
            position.checked_sub(1).map(|i| siblings[i].clone())
        }
    }
}
