use std::{cmp::min, fmt, mem, str};

use crate::{
    error::{InsertError, MatchError},
    params::Params,
    path,
};

/// A successful match, consisting of the registered value, the extracted URL
/// parameters and the route pattern that produced it.
#[derive(Debug)]
pub struct Match<'k, 'v, V> {
    /// The value stored under the matched node.
    pub value: V,
    /// The route parameters, in the order they appear in the pattern.
    pub params: Params<'k, 'v>,
    /// The route pattern that matched.
    pub pattern: &'k str,
}

/// The types of nodes the tree can hold.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub(crate) enum NodeType {
    /// The root path.
    Root,
    /// A named parameter, e.g. `/:id`.
    Param,
    /// A catch-all parameter, e.g. `/*filepath`.
    CatchAll,
    /// A static prefix, e.g. `/foo`.
    Static,
}

/// A value registered at a node, together with the route that produced it.
#[derive(Clone)]
pub(crate) struct Leaf<T> {
    pub(crate) value: T,
    pub(crate) route: Box<str>,
}

/// A node in a radix tree ordered by priority.
///
/// The priority is the number of registered routes reachable through the
/// node; static children are kept sorted by descending priority so hot
/// branches are tried first.
#[derive(Clone)]
pub struct Node<T> {
    // The bytes this node matches. Wildcard nodes hold the `:name` or
    // `/*name` text itself.
    pub(crate) prefix: Vec<u8>,

    // True iff the sole child of this node is a wildcard (parameter or
    // catch-all) node.
    pub(crate) wild_child: bool,

    pub(crate) node_type: NodeType,

    // The first byte of each child's prefix, parallel to `children`, used as
    // a first-byte dispatch table for static children.
    pub(crate) indices: Vec<u8>,

    pub(crate) children: Vec<Self>,

    pub(crate) value: Option<Leaf<T>>,

    pub(crate) priority: u32,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            prefix: Vec::new(),
            wild_child: false,
            node_type: NodeType::Static,
            indices: Vec::new(),
            children: Vec::new(),
            value: None,
            priority: 0,
        }
    }
}

impl<T> Node<T> {
    /// Construct a new, empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a value under the given route.
    ///
    /// ```rust
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut tree = turnpike::Node::new();
    /// tree.insert("/home", "Welcome!")?;
    /// tree.insert("/users/:id", "A User")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn insert(&mut self, route: impl Into<String>, value: T) -> Result<(), InsertError> {
        let route = route.into();
        check_route(route.as_bytes())?;

        // Empty tree.
        if self.prefix.is_empty() && self.children.is_empty() {
            self.insert_route(route.as_bytes(), &route, value)?;
            self.node_type = NodeType::Root;
        } else {
            self.insert_inner(route.as_bytes(), &route, value)?;
        }

        // Priorities are only touched once the insertion is known to have
        // succeeded, so a rejected route leaves them consistent.
        self.bump_priorities(route.as_bytes());
        Ok(())
    }

    fn insert_inner(&mut self, prefix: &[u8], route: &str, value: T) -> Result<(), InsertError> {
        // Find the longest common prefix between the remaining route and
        // this node. The common prefix contains no ':' or '*' since an
        // existing prefix never does.
        let max = min(prefix.len(), self.prefix.len());
        let mut i = 0;
        while i < max && prefix[i] == self.prefix[i] {
            i += 1;
        }

        // Split the edge: this node keeps the common prefix and the
        // remainder moves into a new child, inheriting children, value and
        // dispatch table.
        if i < self.prefix.len() {
            let child = Node {
                prefix: self.prefix[i..].to_owned(),
                wild_child: self.wild_child,
                node_type: NodeType::Static,
                indices: mem::take(&mut self.indices),
                children: mem::take(&mut self.children),
                value: self.value.take(),
                priority: self.priority,
            };

            self.indices = vec![self.prefix[i]];
            self.prefix.truncate(i);
            self.children = vec![child];
            self.wild_child = false;
        }

        // The route ends at this node.
        if prefix.len() == i {
            if self.value.is_some() {
                return Err(InsertError::conflict(route, self));
            }

            self.value = Some(Leaf {
                value,
                route: route.into(),
            });
            return Ok(());
        }

        let prefix = &prefix[i..];

        if self.wild_child {
            return self.children[0].wild_child_conflict(prefix, route, value);
        }

        let idxc = prefix[0];

        // `/` after a parameter.
        if self.node_type == NodeType::Param && idxc == b'/' && self.children.len() == 1 {
            return self.children[0].insert_inner(prefix, route, value);
        }

        // Check if a child with the next route byte exists.
        if let Some(i) = self.indices.iter().position(|&c| c == idxc) {
            return self.children[i].insert_inner(prefix, route, value);
        }

        // Otherwise insert it.
        if idxc != b':' && idxc != b'*' {
            self.indices.push(idxc);
            self.children.push(Self::default());
            return self
                .children
                .last_mut()
                .unwrap()
                .insert_route(prefix, route, value);
        }

        self.insert_route(prefix, route, value)
    }

    // Descends into the wildcard child, which must be compatible with the
    // route being inserted.
    fn wild_child_conflict(&mut self, prefix: &[u8], route: &str, value: T) -> Result<(), InsertError> {
        // The wildcard must match exactly: a catch-all never gains children,
        // and overlaps in the style of `:name` vs `:names` are rejected.
        if prefix.len() >= self.prefix.len()
            && self.prefix == prefix[..self.prefix.len()]
            && self.node_type != NodeType::CatchAll
            && (self.prefix.len() >= prefix.len() || prefix[self.prefix.len()] == b'/')
        {
            self.insert_inner(prefix, route, value)
        } else {
            Err(InsertError::conflict(route, self))
        }
    }

    // Installs the remaining route below this node, carving off wildcard
    // segments into child nodes.
    fn insert_route(&mut self, mut prefix: &[u8], route: &str, value: T) -> Result<(), InsertError> {
        let Some((start, end)) = find_wildcard(prefix) else {
            // No wildcard left, the whole remainder becomes this node's
            // prefix.
            self.value = Some(Leaf {
                value,
                route: route.into(),
            });
            self.prefix = prefix.to_owned();
            return Ok(());
        };

        // A wildcard at a node that already has children would make them
        // unreachable.
        if !self.children.is_empty() {
            return Err(InsertError::conflict(route, self));
        }

        // Parameter.
        if prefix[start] == b':' {
            let wildcard_len = end - start;

            // The static part before the wildcard stays on this node.
            if start > 0 {
                self.prefix = prefix[..start].to_owned();
                prefix = &prefix[start..];
            }

            let child = Node {
                node_type: NodeType::Param,
                prefix: prefix[..wildcard_len].to_owned(),
                ..Self::default()
            };
            self.wild_child = true;
            self.children = vec![child];

            // The route continues after the parameter with another
            // `/`-led part.
            if wildcard_len < prefix.len() {
                prefix = &prefix[wildcard_len..];
                self.children[0].children = vec![Self::default()];
                return self.children[0].children[0].insert_route(prefix, route, value);
            }

            self.children[0].value = Some(Leaf {
                value,
                route: route.into(),
            });
            return Ok(());
        }

        // Catch-all. The separator belongs to the catch-all itself, so the
        // node owning it must not already end in '/'.
        if self.prefix.last() == Some(&b'/') {
            return Err(InsertError::conflict(route, self));
        }

        let slash = match start.checked_sub(1) {
            Some(i) if prefix[i] == b'/' => i,
            _ => return Err(InsertError::InvalidCatchAll),
        };

        // First node: a catch-all with an empty prefix, dispatched to
        // through the '/' index...
        let child = Node {
            wild_child: true,
            node_type: NodeType::CatchAll,
            ..Self::default()
        };

        self.prefix = prefix[..slash].to_owned();
        self.children = vec![child];
        self.indices = vec![b'/'];

        // ...second node: the one holding the variable and the value.
        let child = Node {
            prefix: prefix[slash..].to_owned(),
            node_type: NodeType::CatchAll,
            value: Some(Leaf {
                value,
                route: route.into(),
            }),
            ..Self::default()
        };
        self.children[0].children = vec![child];

        Ok(())
    }

    // Walks the freshly inserted route from this node, bumping priorities
    // and re-sorting children so higher priority branches are tried first.
    fn bump_priorities(&mut self, route: &[u8]) {
        self.priority += 1;

        let rest = &route[self.prefix.len()..];
        if rest.is_empty() {
            return;
        }

        let i = if self.wild_child
            || (self.node_type == NodeType::Param && rest[0] == b'/' && self.children.len() == 1)
        {
            0
        } else {
            match self.indices.iter().position(|&c| c == rest[0]) {
                Some(i) => i,
                None => return,
            }
        };

        self.children[i].bump_priorities(rest);
        self.reorder_child(i);
    }

    // Bubbles the child at `i` forward past siblings with strictly lower
    // priority, keeping `indices` in step. Stable on ties.
    fn reorder_child(&mut self, i: usize) {
        let priority = self.children[i].priority;

        let mut updated = i;
        while updated > 0 && self.children[updated - 1].priority < priority {
            self.children.swap(updated - 1, updated);
            updated -= 1;
        }

        if updated != i {
            self.indices[updated..=i].rotate_right(1);
        }
    }

    /// Find the value registered at the given path.
    ///
    /// On a miss the returned [`MatchError`] reports whether a route exists
    /// at the same path with one trailing slash added or removed.
    ///
    /// ```rust
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut tree = turnpike::Node::new();
    /// tree.insert("/home", "Welcome!")?;
    ///
    /// let matched = tree.at("/home").unwrap();
    /// assert_eq!(*matched.value, "Welcome!");
    /// # Ok(())
    /// # }
    /// ```
    pub fn at<'n, 'p>(&'n self, path: &'p str) -> Result<Match<'n, 'p, &'n T>, MatchError> {
        let mut current = self;
        let mut path = path.as_bytes();
        let mut params = Params::new();

        'walk: loop {
            let prefix = &current.prefix;

            if path.len() > prefix.len() {
                if **prefix == path[..prefix.len()] {
                    path = &path[prefix.len()..];

                    // Without a wildcard child the next node is found
                    // through the first-byte dispatch table.
                    if !current.wild_child {
                        let idxc = path[0];
                        if let Some(i) = current.indices.iter().position(|&c| c == idxc) {
                            current = &current.children[i];
                            continue 'walk;
                        }

                        // The path carries a superfluous trailing slash.
                        let tsr = path == b"/" && current.value.is_some();
                        return Err(MatchError::new(tsr));
                    }

                    current = &current.children[0];
                    match current.node_type {
                        NodeType::Param => {
                            // The parameter value runs until the next '/' or
                            // the end of the path. An empty value is a miss.
                            let end = path.iter().position(|&c| c == b'/').unwrap_or(path.len());
                            if end == 0 {
                                return Err(MatchError::new(false));
                            }

                            let key = str::from_utf8(&current.prefix[1..]).unwrap();
                            let value = path::unescape(str::from_utf8(&path[..end]).unwrap());
                            params.push(key, value);

                            if end < path.len() {
                                if current.children.is_empty() {
                                    let tsr = path.len() == end + 1;
                                    return Err(MatchError::new(tsr));
                                }

                                path = &path[end..];
                                current = &current.children[0];
                                continue 'walk;
                            }

                            if let Some(ref leaf) = current.value {
                                return Ok(Match {
                                    value: &leaf.value,
                                    params,
                                    pattern: &leaf.route,
                                });
                            }

                            if current.children.len() == 1 {
                                // A value may exist for this path with a
                                // trailing slash.
                                let child = &current.children[0];
                                let tsr = (child.prefix == b"/" && child.value.is_some())
                                    || (child.prefix.is_empty() && child.indices == b"/");
                                return Err(MatchError::new(tsr));
                            }

                            return Err(MatchError::new(false));
                        }
                        NodeType::CatchAll => {
                            let key = str::from_utf8(&current.prefix[2..]).unwrap();
                            let value = path::unescape(str::from_utf8(path).unwrap());
                            params.push(key, value);

                            return match current.value {
                                Some(ref leaf) => Ok(Match {
                                    value: &leaf.value,
                                    params,
                                    pattern: &leaf.route,
                                }),
                                None => Err(MatchError::new(false)),
                            };
                        }
                        _ => unreachable!(),
                    }
                }
            } else if **prefix == *path {
                // This is the node the path ends at; check for a value.
                if let Some(ref leaf) = current.value {
                    return Ok(Match {
                        value: &leaf.value,
                        params,
                        pattern: &leaf.route,
                    });
                }

                // The path is missing its trailing slash and the registered
                // route continues through the parameter child.
                if path == b"/" && current.wild_child && current.node_type != NodeType::Root {
                    return Err(MatchError::new(true));
                }

                // Or through a static '/' child.
                if let Some(i) = current.indices.iter().position(|&c| c == b'/') {
                    let child = &current.children[i];
                    let tsr = (child.prefix.len() == 1 && child.value.is_some())
                        || (child.node_type == NodeType::CatchAll
                            && child.children[0].value.is_some());
                    return Err(MatchError::new(tsr));
                }

                return Err(MatchError::new(false));
            }

            // Nothing found: recommend the same path with an extra trailing
            // slash when a value exists there.
            let tsr = path == b"/"
                || (prefix.len() == path.len() + 1
                    && prefix[path.len()] == b'/'
                    && *path == prefix[..prefix.len() - 1]
                    && current.value.is_some());

            return Err(MatchError::new(tsr));
        }
    }

    /// Makes a case-insensitive match of the given path and returns the
    /// registered path in its original casing, optionally fixing a trailing
    /// slash.
    ///
    /// ```rust
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut tree = turnpike::Node::new();
    /// tree.insert("/home", "Welcome!")?;
    ///
    /// let path = tree.path_ignore_case("/HoMe/", true).unwrap();
    /// assert_eq!(path, "/home");
    /// # Ok(())
    /// # }
    /// ```
    pub fn path_ignore_case(&self, path: impl AsRef<str>, fix_trailing_slash: bool) -> Option<String> {
        let path = path.as_ref();
        let mut out = Vec::with_capacity(path.len() + 1);

        if self.path_ignore_case_inner(path.as_bytes(), &mut out, [0; 4], fix_trailing_slash) {
            Some(String::from_utf8(out).unwrap())
        } else {
            None
        }
    }

    fn path_ignore_case_inner(
        &self,
        mut path: &[u8],
        out: &mut Vec<u8>,
        mut buf: [u8; 4],
        fix_trailing_slash: bool,
    ) -> bool {
        let lower_path: &[u8] = &path.to_ascii_lowercase();

        if lower_path.len() >= self.prefix.len()
            && (self.prefix.is_empty()
                || lower_path[1..self.prefix.len()].eq_ignore_ascii_case(&self.prefix[1..]))
        {
            out.extend_from_slice(&self.prefix);
            path = &path[self.prefix.len()..];

            if !path.is_empty() {
                let cached_lower_path = <&[u8]>::clone(&lower_path);

                if !self.wild_child {
                    // Skip the char bytes already processed.
                    buf = shift_n_bytes(buf, self.prefix.len());

                    if buf[0] == 0 {
                        // Process a new char: find where it starts, chars
                        // are up to 4 bytes long.
                        let mut current_char = '\0';
                        let mut off = 0;
                        for j in 0..min(self.prefix.len(), 3) {
                            let i = self.prefix.len() - j;
                            if char_start(cached_lower_path[i]) {
                                current_char = str::from_utf8(&cached_lower_path[i..])
                                    .unwrap()
                                    .chars()
                                    .next()
                                    .unwrap();
                                off = j;
                                break;
                            }
                        }

                        current_char.encode_utf8(&mut buf);
                        buf = shift_n_bytes(buf, off);

                        for i in 0..self.indices.len() {
                            // Lowercase matches. Both the uppercase and the
                            // lowercase byte might exist as an index, so
                            // recurse and backtrack.
                            if self.indices[i] == buf[0] {
                                let prev = out.len();
                                if self.children[i].path_ignore_case_inner(
                                    path,
                                    out,
                                    buf,
                                    fix_trailing_slash,
                                ) {
                                    return true;
                                }

                                out.truncate(prev);
                                break;
                            }
                        }

                        // Same for the uppercase char, if it differs.
                        let up = current_char.to_ascii_uppercase();
                        if up != current_char {
                            up.encode_utf8(&mut buf);
                            buf = shift_n_bytes(buf, off);

                            for i in 0..self.indices.len() {
                                if self.indices[i] == buf[0] {
                                    let prev = out.len();
                                    if self.children[i].path_ignore_case_inner(
                                        path,
                                        out,
                                        buf,
                                        fix_trailing_slash,
                                    ) {
                                        return true;
                                    }

                                    out.truncate(prev);
                                    break;
                                }
                            }
                        }
                    } else {
                        // A multi-byte char is still in progress.
                        for i in 0..self.indices.len() {
                            if self.indices[i] == buf[0] {
                                return self.children[i].path_ignore_case_inner(
                                    path,
                                    out,
                                    buf,
                                    fix_trailing_slash,
                                );
                            }
                        }
                    }

                    // Nothing found. Recommend the path without its trailing
                    // slash when a value exists there.
                    return fix_trailing_slash && path == b"/" && self.value.is_some();
                }

                return self.children[0].path_ignore_case_wild(path, out, buf, fix_trailing_slash);
            }

            // The path ends at this node.
            if self.value.is_some() {
                return true;
            }

            // Try fixing the path by appending a trailing slash.
            if fix_trailing_slash {
                for i in 0..self.indices.len() {
                    if self.indices[i] == b'/' {
                        let child = &self.children[i];
                        if (child.prefix.len() == 1 && child.value.is_some())
                            || (child.node_type == NodeType::CatchAll
                                && child.children[0].value.is_some())
                        {
                            out.push(b'/');
                            return true;
                        }
                        return false;
                    }
                }
            }

            return false;
        }

        // Try fixing the path by adding or removing a trailing slash.
        if fix_trailing_slash {
            if path == b"/" {
                return true;
            }

            if lower_path.len() + 1 == self.prefix.len()
                && self.prefix[lower_path.len()] == b'/'
                && lower_path[1..].eq_ignore_ascii_case(&self.prefix[1..lower_path.len()])
                && self.value.is_some()
            {
                out.extend_from_slice(&self.prefix);
                return true;
            }
        }

        false
    }

    fn path_ignore_case_wild(
        &self,
        mut path: &[u8],
        out: &mut Vec<u8>,
        buf: [u8; 4],
        fix_trailing_slash: bool,
    ) -> bool {
        match self.node_type {
            NodeType::Param => {
                let mut end = 0;
                while end < path.len() && path[end] != b'/' {
                    end += 1;
                }

                // The parameter value keeps the request's casing.
                out.extend_from_slice(&path[..end]);

                if end < path.len() {
                    if !self.children.is_empty() {
                        path = &path[end..];
                        return self.children[0].path_ignore_case_inner(
                            path,
                            out,
                            buf,
                            fix_trailing_slash,
                        );
                    }

                    if fix_trailing_slash && path.len() == end + 1 {
                        return true;
                    }
                    return false;
                }

                if self.value.is_some() {
                    return true;
                }

                if fix_trailing_slash
                    && self.children.len() == 1
                    && self.children[0].prefix == b"/"
                    && self.children[0].value.is_some()
                {
                    // A value exists for this path with a trailing slash.
                    out.push(b'/');
                    return true;
                }

                false
            }
            NodeType::CatchAll => {
                out.extend_from_slice(path);
                true
            }
            _ => unreachable!(),
        }
    }

    #[doc(hidden)]
    /// Test helper that ensures route priorities are consistent.
    pub fn check_priorities(&self) -> Result<u32, (u32, u32)> {
        let mut priority = 0;
        for child in &self.children {
            priority += child.check_priorities()?;
        }

        if self.value.is_some() {
            priority += 1;
        }

        if self.priority != priority {
            return Err((self.priority, priority));
        }

        Ok(priority)
    }
}

// Checks a route for structural errors: the leading '/', wildcard name
// rules and catch-all placement. Runs before the tree is touched so a
// rejected route never leaves a partial insertion behind.
pub(crate) fn check_route(route: &[u8]) -> Result<(), InsertError> {
    if route.first() != Some(&b'/') {
        return Err(InsertError::MalformedPath);
    }

    let mut i = 0;
    while i < route.len() {
        let c = route[i];
        if c != b':' && c != b'*' {
            i += 1;
            continue;
        }

        // The wildcard name runs until the next '/' or the end of the route.
        let mut end = i + 1;
        while end < route.len() && route[end] != b'/' {
            if route[end] == b':' || route[end] == b'*' {
                return Err(InsertError::TooManyParams);
            }
            end += 1;
        }

        if end == i + 1 {
            return Err(InsertError::UnnamedParam);
        }

        if c == b'*' && (route[i - 1] != b'/' || end != route.len()) {
            return Err(InsertError::InvalidCatchAll);
        }

        i = end;
    }

    Ok(())
}

// Returns the position of the first wildcard segment of `prefix` as a
// `(start, end)` pair covering the `:name` / `*name` text.
fn find_wildcard(prefix: &[u8]) -> Option<(usize, usize)> {
    let start = prefix.iter().position(|&c| c == b':' || c == b'*')?;
    let end = prefix[start + 1..]
        .iter()
        .position(|&c| c == b'/')
        .map(|i| start + 1 + i)
        .unwrap_or(prefix.len());

    Some((start, end))
}

// Shifts the bytes of a partially processed char left by `n`.
const fn shift_n_bytes(bytes: [u8; 4], n: usize) -> [u8; 4] {
    match u32::from_ne_bytes(bytes).overflowing_shr((n * 8) as u32) {
        (_, true) => [0; 4],
        (shifted, false) => shifted.to_ne_bytes(),
    }
}

// Whether the byte could be the first byte of an encoded char; second and
// subsequent bytes always have the top two bits set to 10.
const fn char_start(b: u8) -> bool {
    b & 0xC0 != 0x80
}

impl<T> fmt::Debug for Node<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("prefix", &str::from_utf8(&self.prefix).unwrap_or("<bytes>"))
            .field("node_type", &self.node_type)
            .field("priority", &self.priority)
            .field(
                "value",
                &self.value.as_ref().map(|leaf| (&*leaf.route, &leaf.value)),
            )
            .field("indices", &str::from_utf8(&self.indices).unwrap_or("<bytes>"))
            .field("children", &self.children)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;

    fn params(vec: Vec<(&'static str, &'static str)>) -> Params<'static, 'static> {
        let mut params = Params::new();
        for (key, value) in vec {
            params.push(key, Cow::Borrowed(value));
        }
        params
    }

    struct TestRequest {
        path: &'static str,
        should_be_nil: bool,
        route: &'static str,
        params: Params<'static, 'static>,
    }

    impl TestRequest {
        fn new(
            path: &'static str,
            should_be_nil: bool,
            route: &'static str,
            params: Params<'static, 'static>,
        ) -> TestRequest {
            TestRequest {
                path,
                should_be_nil,
                route,
                params,
            }
        }
    }

    fn check_requests(tree: &Node<String>, requests: Vec<TestRequest>) {
        for request in requests {
            match tree.at(request.path) {
                Err(_) => {
                    assert!(
                        request.should_be_nil,
                        "expected non-nil value for route '{}'",
                        request.path
                    );
                }
                Ok(result) => {
                    assert!(
                        !request.should_be_nil,
                        "expected nil value for route '{}'",
                        request.path
                    );
                    assert_eq!(
                        *result.value, request.route,
                        "wrong value for route '{}'",
                        request.path
                    );
                    assert_eq!(
                        result.pattern, request.route,
                        "wrong pattern for route '{}'",
                        request.path
                    );
                    assert_eq!(
                        result.params, request.params,
                        "wrong params for route '{}'",
                        request.path
                    );
                }
            }
        }
    }

    // Validates the first-byte dispatch table and the priority ordering of
    // every node in the tree.
    fn check_order<T>(node: &Node<T>) {
        if !node.indices.is_empty() {
            assert_eq!(node.indices.len(), node.children.len());

            let mut prev = u32::MAX;
            for (i, child) in node.children.iter().enumerate() {
                if !child.prefix.is_empty() {
                    assert_eq!(node.indices[i], child.prefix[0]);
                }
                assert!(child.priority <= prev, "children out of priority order");
                prev = child.priority;
            }
        }

        for child in &node.children {
            check_order(child);
        }
    }

    #[test]
    fn add_and_get() {
        let mut tree = Node::new();

        let routes = vec![
            "/hi",
            "/contact",
            "/co",
            "/c",
            "/a",
            "/ab",
            "/doc/",
            "/doc/go_faq.html",
            "/doc/go1.html",
            "/ʯ",
            "/β",
        ];

        for route in routes {
            tree.insert(route, route.to_owned()).unwrap();
        }

        check_requests(
            &tree,
            vec![
                TestRequest::new("/a", false, "/a", Params::new()),
                TestRequest::new("/", true, "", Params::new()),
                TestRequest::new("/hi", false, "/hi", Params::new()),
                TestRequest::new("/contact", false, "/contact", Params::new()),
                TestRequest::new("/co", false, "/co", Params::new()),
                TestRequest::new("/con", true, "", Params::new()), // key mismatch
                TestRequest::new("/cona", true, "", Params::new()), // key mismatch
                TestRequest::new("/no", true, "", Params::new()),  // no matching child
                TestRequest::new("/ab", false, "/ab", Params::new()),
                TestRequest::new("/ʯ", false, "/ʯ", Params::new()),
                TestRequest::new("/β", false, "/β", Params::new()),
            ],
        );

        tree.check_priorities().unwrap();
        check_order(&tree);
    }

    #[test]
    fn wildcards() {
        let mut tree = Node::new();

        let routes = vec![
            "/",
            "/cmd/:tool/:sub",
            "/cmd/:tool/",
            "/src/*filepath",
            "/search/",
            "/search/:query",
            "/user_:name",
            "/user_:name/about",
            "/files/:dir/*filepath",
            "/doc/",
            "/doc/go_faq.html",
            "/doc/go1.html",
            "/info/:user/public",
            "/info/:user/project/:project",
        ];

        for route in routes {
            tree.insert(route, route.to_owned()).unwrap();
        }

        check_requests(
            &tree,
            vec![
                TestRequest::new("/", false, "/", Params::new()),
                TestRequest::new(
                    "/cmd/test/",
                    false,
                    "/cmd/:tool/",
                    params(vec![("tool", "test")]),
                ),
                TestRequest::new("/cmd/test", true, "", Params::new()),
                TestRequest::new(
                    "/cmd/test/3",
                    false,
                    "/cmd/:tool/:sub",
                    params(vec![("tool", "test"), ("sub", "3")]),
                ),
                TestRequest::new(
                    "/src/",
                    false,
                    "/src/*filepath",
                    params(vec![("filepath", "/")]),
                ),
                TestRequest::new(
                    "/src/some/file.png",
                    false,
                    "/src/*filepath",
                    params(vec![("filepath", "/some/file.png")]),
                ),
                TestRequest::new("/search/", false, "/search/", Params::new()),
                TestRequest::new(
                    "/search/someth!ng+in+ünìcodé",
                    false,
                    "/search/:query",
                    params(vec![("query", "someth!ng+in+ünìcodé")]),
                ),
                TestRequest::new("/search/someth!ng+in+ünìcodé/", true, "", Params::new()),
                TestRequest::new(
                    "/user_rustacean",
                    false,
                    "/user_:name",
                    params(vec![("name", "rustacean")]),
                ),
                TestRequest::new(
                    "/user_rustacean/about",
                    false,
                    "/user_:name/about",
                    params(vec![("name", "rustacean")]),
                ),
                TestRequest::new(
                    "/files/js/inc/framework.js",
                    false,
                    "/files/:dir/*filepath",
                    params(vec![("dir", "js"), ("filepath", "/inc/framework.js")]),
                ),
                TestRequest::new(
                    "/info/gordon/public",
                    false,
                    "/info/:user/public",
                    params(vec![("user", "gordon")]),
                ),
                TestRequest::new(
                    "/info/gordon/project/go",
                    false,
                    "/info/:user/project/:project",
                    params(vec![("user", "gordon"), ("project", "go")]),
                ),
            ],
        );

        tree.check_priorities().unwrap();
        check_order(&tree);
    }

    #[test]
    fn decoded_params() {
        let mut tree = Node::new();
        tree.insert("/date/:year/:month", "/date/:year/:month".to_owned())
            .unwrap();

        check_requests(
            &tree,
            vec![TestRequest::new(
                "/date/2014/ab%2f",
                false,
                "/date/:year/:month",
                params(vec![("year", "2014"), ("month", "ab/")]),
            )],
        );
    }

    type TestRoute = (&'static str, bool);

    fn test_routes(routes: Vec<TestRoute>) {
        let mut tree = Node::new();

        for route in routes {
            let res = tree.insert(route.0, ());

            if route.1 {
                assert!(res.is_err(), "no error for conflicting route '{}'", route.0);
            } else {
                assert!(res.is_ok(), "unexpected error for route '{}': {res:?}", route.0);
            }
        }
    }

    #[test]
    fn wildcard_conflicts() {
        test_routes(vec![
            ("/cmd/:tool/:sub", false),
            ("/cmd/vet", true),
            ("/src/*filepath", false),
            ("/src/*filepathx", true),
            ("/src/", true),
            ("/src1/", false),
            ("/src1/*filepath", true),
            ("/src2*filepath", true),
            ("/search/:query", false),
            ("/search/invalid", true),
            ("/user_:name", false),
            ("/user_x", true),
            ("/user_:name", true),
            ("/id:id", false),
            ("/id/:id", true),
        ]);
    }

    #[test]
    fn child_conflicts() {
        test_routes(vec![
            ("/cmd/vet", false),
            ("/cmd/:tool/:sub", true),
            ("/src/AUTHORS", false),
            ("/src/*filepath", true),
            ("/user_x", false),
            ("/user_:name", true),
            ("/id/:id", false),
            ("/id:id", true),
            ("/:id", true),
            ("/*filepath", true),
        ]);
    }

    #[test]
    fn duplicates() {
        let mut tree = Node::new();

        let routes = vec![
            "/",
            "/doc/",
            "/src/*filepath",
            "/search/:query",
            "/user_:name",
        ];

        for route in &routes {
            tree.insert(*route, route.to_string()).unwrap();
            let res = tree.insert(*route, route.to_string());
            assert_eq!(
                res,
                Err(InsertError::Conflict {
                    with: route.to_string()
                })
            );
        }

        check_requests(
            &tree,
            vec![
                TestRequest::new("/", false, "/", Params::new()),
                TestRequest::new("/doc/", false, "/doc/", Params::new()),
                TestRequest::new(
                    "/src/some/file.png",
                    false,
                    "/src/*filepath",
                    params(vec![("filepath", "/some/file.png")]),
                ),
                TestRequest::new(
                    "/search/someth!ng+in+ünìcodé",
                    false,
                    "/search/:query",
                    params(vec![("query", "someth!ng+in+ünìcodé")]),
                ),
                TestRequest::new(
                    "/user_rustacean",
                    false,
                    "/user_:name",
                    params(vec![("name", "rustacean")]),
                ),
            ],
        );
    }

    #[test]
    fn empty_wildcard_names() {
        let mut tree = Node::new();

        for route in ["/user:", "/user:/", "/cmd/:/", "/src/*"] {
            assert_eq!(
                tree.insert(route, route.to_owned()),
                Err(InsertError::UnnamedParam)
            );
        }
    }

    #[test]
    fn catch_all_conflicts() {
        test_routes(vec![
            ("/src/*filepath/x", true),
            ("/src2/", false),
            ("/src2/*filepath/x", true),
        ]);
    }

    #[test]
    fn catch_all_root_conflict() {
        test_routes(vec![("/", false), ("/*filepath", true)]);
    }

    #[test]
    fn double_wildcards() {
        for route in ["/:foo:bar", "/:foo:bar/", "/:foo*bar"] {
            let mut tree = Node::new();
            assert_eq!(
                tree.insert(route, route.to_owned()),
                Err(InsertError::TooManyParams)
            );
        }
    }

    #[test]
    fn malformed_paths() {
        let mut tree = Node::new();
        assert_eq!(tree.insert("*x", 1), Err(InsertError::MalformedPath));
        assert_eq!(tree.insert("", 1), Err(InsertError::MalformedPath));
        assert_eq!(tree.insert("noSlashRoot", 1), Err(InsertError::MalformedPath));
    }

    #[test]
    fn empty_parameter_segments() {
        let mut tree = Node::new();
        tree.insert("/post/:post/page/:page", ()).unwrap();

        assert!(tree.at("/post//page/2").is_err());
        assert!(tree.at("/post/abc/page//2").is_err());
        assert!(tree.at("//post/abc/page/2").is_err());
    }

    #[test]
    fn rejected_insert_keeps_priorities() {
        let mut tree = Node::new();
        tree.insert("/user/:name", "a".to_owned()).unwrap();
        tree.insert("/user/:name/posts", "b".to_owned()).unwrap();

        assert!(tree.insert("/user/friends", "c".to_owned()).is_err());

        tree.check_priorities().unwrap();
        assert!(tree.at("/user/gopher").is_ok());
        assert!(tree.at("/user/gopher/posts").is_ok());
    }

    #[test]
    fn trailing_slash_redirect() {
        let mut tree = Node::new();

        let routes = vec![
            "/hi",
            "/b/",
            "/search/:query",
            "/cmd/:tool/",
            "/src/*filepath",
            "/x",
            "/x/y",
            "/y/",
            "/y/z",
            "/0/:id",
            "/0/:id/1",
            "/1/:id/",
            "/1/:id/2",
            "/aa",
            "/a/",
            "/admin",
            "/admin/:category",
            "/admin/:category/:page",
            "/doc",
            "/doc/go_faq.html",
            "/doc/go1.html",
            "/no/a",
            "/no/b",
            "/api/hello/:name",
        ];

        for route in routes {
            tree.insert(route, route.to_owned()).unwrap();
        }

        let tsr_routes = vec![
            "/hi/",
            "/b",
            "/search/rustacean/",
            "/cmd/vet",
            "/src",
            "/x/",
            "/y",
            "/0/go/",
            "/1/go",
            "/a",
            "/admin/",
            "/admin/config/",
            "/admin/config/permissions/",
            "/doc/",
        ];

        for route in tsr_routes {
            let err = tree.at(route).expect_err(route);
            assert!(err.tsr(), "expected TSR recommendation for route '{route}'");
        }

        let no_tsr_routes = vec!["/", "/no", "/no/", "/_", "/_/", "/api/world/abc"];

        for route in no_tsr_routes {
            let err = tree.at(route).expect_err(route);
            assert!(!err.tsr(), "expected no TSR recommendation for route '{route}'");
        }
    }

    #[test]
    fn root_trailing_slash_redirect() {
        let mut tree = Node::new();
        tree.insert("/:test", "/:test".to_owned()).unwrap();

        let err = tree.at("/").unwrap_err();
        assert!(!err.tsr(), "expected no TSR recommendation for route '/'");
    }

    #[test]
    fn case_insensitive_path() {
        let mut tree = Node::new();

        let routes = vec![
            "/hi",
            "/b/",
            "/ABC/",
            "/search/:query",
            "/cmd/:tool/",
            "/src/*filepath",
            "/x",
            "/x/y",
            "/y/",
            "/y/z",
            "/0/:id",
            "/0/:id/1",
            "/1/:id/",
            "/1/:id/2",
            "/aa",
            "/a/",
            "/doc",
            "/doc/go_faq.html",
            "/doc/go1.html",
            "/doc/go/away",
            "/no/a",
            "/no/b",
            "/Π",
            "/u/apfêl/",
            "/u/äpfêl/",
            "/u/öpfêl",
            "/v/Äpfêl/",
            "/v/Öpfêl",
            "/w/♬",
            "/w/♭/",
            "/w/𠜎",
            "/w/𠜏/",
            "/loooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooong",
        ];

        for route in &routes {
            tree.insert(*route, route.to_string()).unwrap();
        }

        // Every registered route resolves to itself, with and without the
        // trailing slash fix.
        for route in &routes {
            assert_eq!(
                tree.path_ignore_case(route, true).as_deref(),
                Some(*route),
                "fix_trailing_slash = true"
            );
            assert_eq!(
                tree.path_ignore_case(route, false).as_deref(),
                Some(*route),
                "fix_trailing_slash = false"
            );
        }

        // (input, expected output, requires trailing slash fix)
        let tests = vec![
            ("/HI", "/hi", false),
            ("/HI/", "/hi", true),
            ("/B", "/b/", true),
            ("/B/", "/b/", false),
            ("/abc", "/ABC/", true),
            ("/abc/", "/ABC/", false),
            ("/aBc", "/ABC/", true),
            ("/aBc/", "/ABC/", false),
            ("/abC", "/ABC/", true),
            ("/abC/", "/ABC/", false),
            ("/SEARCH/QUERY", "/search/QUERY", false),
            ("/SEARCH/QUERY/", "/search/QUERY", true),
            ("/CMD/TOOL/", "/cmd/TOOL/", false),
            ("/CMD/TOOL", "/cmd/TOOL/", true),
            ("/SRC/FILE/PATH", "/src/FILE/PATH", false),
            ("/x/Y", "/x/y", false),
            ("/x/Y/", "/x/y", true),
            ("/X/y", "/x/y", false),
            ("/X/y/", "/x/y", true),
            ("/X/Y", "/x/y", false),
            ("/X/Y/", "/x/y", true),
            ("/Y/", "/y/", false),
            ("/Y", "/y/", true),
            ("/Y/z", "/y/z", false),
            ("/Y/z/", "/y/z", true),
            ("/Y/Z", "/y/z", false),
            ("/Y/Z/", "/y/z", true),
            ("/y/Z", "/y/z", false),
            ("/y/Z/", "/y/z", true),
            ("/Aa", "/aa", false),
            ("/Aa/", "/aa", true),
            ("/AA", "/aa", false),
            ("/AA/", "/aa", true),
            ("/aA", "/aa", false),
            ("/aA/", "/aa", true),
            ("/A/", "/a/", false),
            ("/A", "/a/", true),
            ("/DOC", "/doc", false),
            ("/DOC/", "/doc", true),
            ("/NO", "", true),
            ("/DOC/GO", "", true),
            ("/w/♬/", "/w/♬", true),
            ("/w/♭", "/w/♭/", true),
            ("/w/𠜎/", "/w/𠜎", true),
            ("/w/𠜏", "/w/𠜏/", true),
            (
                "/lOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOng/",
                "/loooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooooong",
                true,
            ),
        ];

        for (input, output, _) in &tests {
            let res = tree.path_ignore_case(input, true).unwrap_or_default();
            assert_eq!(res, *output, "wrong result for '{input}'");
        }

        for (input, output, needs_fix) in &tests {
            match tree.path_ignore_case(input, false) {
                None => {}
                Some(res) => {
                    assert!(!needs_fix, "found '{input}' without fix_trailing_slash");
                    assert_eq!(res, *output, "wrong result for '{input}'");
                }
            }
        }
    }

    #[test]
    fn wildcard_conflict_details() {
        let conflicts = vec![
            ("/who/are/foo", "/who/are/*you"),
            ("/who/are/foo/", "/who/are/*you"),
            ("/who/are/foo/bar", "/who/are/*you"),
            ("/conxxx", "/con:tact"),
            ("/conooo/xxx", "/con:tact"),
            ("/whose/:users/:user", "/whose/:users/:name"),
        ];

        for conflict in conflicts {
            let mut tree = Node::new();

            let routes = vec![
                "/con:tact",
                "/who/are/*you",
                "/who/foo/hello",
                "/whose/:users/:name",
            ];

            for route in routes {
                tree.insert(route, route.to_owned()).unwrap();
            }

            let res = tree.insert(conflict.0, conflict.0.to_owned());
            assert_eq!(
                res,
                Err(InsertError::Conflict {
                    with: conflict.1.into()
                })
            );
        }
    }
}
