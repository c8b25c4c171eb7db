use std::collections::BTreeSet;

/// A peer endpoint, stored without a trailing `/`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Node {
    addr: String,
}

impl Node {
    pub fn new(addr: &str) -> Node {
        Node {
            addr: normalize(addr),
        }
    }

    pub fn get_addr(&self) -> &str {
        self.addr.as_str()
    }
}

fn normalize(addr: &str) -> String {
    addr.trim().trim_end_matches('/').to_string()
}

/// Registered peers. A set, so duplicates collapse and iteration order is stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Nodes {
    inner: BTreeSet<Node>,
}

impl Nodes {
    pub fn new() -> Nodes {
        Nodes {
            inner: BTreeSet::new(),
        }
    }

    /// Returns false when the endpoint was already known or is blank
    pub fn add_node(&mut self, addr: &str) -> bool {
        let node = Node::new(addr);
        if node.addr.is_empty() {
            return false;
        }
        self.inner.insert(node)
    }

    pub fn get_nodes(&self) -> Vec<Node> {
        self.inner.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
