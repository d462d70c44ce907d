use std::{error, fmt};

use crate::tree::Node;

/// Represents errors that can occur when inserting a new route.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InsertError {
    /// Attempted to insert a route that conflicts with an existing one.
    Conflict {
        /// The previously registered route the insertion conflicts with.
        with: String,
    },

    /// Only one wildcard per route segment is allowed.
    ///
    /// For example `/user_:name` is a valid route, but `/:user:name` is not.
    TooManyParams,

    /// Wildcards must be registered with a non-empty name, e.g. `/:id`
    /// rather than `/:`.
    UnnamedParam,

    /// Catch-all wildcards are only allowed at the end of a route, directly
    /// following a `/`.
    InvalidCatchAll,

    /// Routes must be non-empty and start with a `/`.
    MalformedPath,
}

impl fmt::Display for InsertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt = match self {
            Self::Conflict { with } => {
                return write!(
                    f,
                    "insertion failed due to conflict with previously registered route: {with}"
                );
            }
            Self::TooManyParams => "only one wildcard per path segment is allowed",
            Self::UnnamedParam => "wildcards must be registered with a non-empty name",
            Self::InvalidCatchAll => "catch-all wildcards are only allowed at the end of a route",
            Self::MalformedPath => "routes must start with a '/'",
        };
        f.write_str(fmt)
    }
}

impl error::Error for InsertError {}

impl InsertError {
    /// Returns a conflict error naming the route registered through `node`.
    ///
    /// The conflicting route terminates either at `node` itself or somewhere
    /// below it, so the first value-bearing descendant holds its text.
    pub(crate) fn conflict<T>(route: &str, node: &Node<T>) -> Self {
        let mut current = node;

        loop {
            if let Some(ref leaf) = current.value {
                return InsertError::Conflict {
                    with: leaf.route.to_string(),
                };
            }

            match current.children.first() {
                Some(child) => current = child,
                None => break,
            }
        }

        InsertError::Conflict {
            with: route.to_owned(),
        }
    }
}

/// A failed match attempt.
///
/// ```rust
/// use http::Method;
/// use turnpike::Router;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut router = Router::new();
/// router.insert(Method::GET, "/home", "Welcome!")?;
///
/// // No route matches, but one exists without the trailing slash.
/// if let Err(err) = router.at(&Method::GET, "/home/") {
///     assert!(err.tsr());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct MatchError {
    tsr: bool,
}

impl MatchError {
    pub(crate) const fn new(tsr: bool) -> Self {
        Self { tsr }
    }

    /// Returns `true` if a route exists at the same path with exactly one
    /// trailing slash added or removed.
    pub const fn tsr(&self) -> bool {
        self.tsr
    }
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("matching route not found")
    }
}

impl error::Error for MatchError {}
