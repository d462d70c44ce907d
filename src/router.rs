use std::{borrow::Cow, collections::HashMap};

use http::Method;
use tracing::trace;

use crate::{
    error::{InsertError, MatchError},
    params::MATCHED_ROUTE_PATH_PARAM,
    tree::{self, Match, Node},
};

/// A router dispatching on HTTP method and request path.
///
/// One radix tree is kept per method, created lazily by the first
/// registration for that method.
///
/// Routes are registered during a single-threaded setup phase; after that
/// every lookup takes `&self`, so the router can be shared freely between
/// request handlers.
///
/// See [the crate documentation](crate) for details.
#[derive(Clone, Debug)]
pub struct Router<T> {
    trees: HashMap<Method, Node<T>>,
    save_matched_route_path: bool,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self {
            trees: HashMap::new(),
            save_matched_route_path: false,
        }
    }
}

impl<T> Router<T> {
    /// Construct a new router.
    pub fn new() -> Self {
        Self::default()
    }

    /// When enabled, every successful match records the matched route
    /// pattern as a synthetic first parameter under
    /// [`MATCHED_ROUTE_PATH_PARAM`](crate::MATCHED_ROUTE_PATH_PARAM),
    /// retrievable through
    /// [`Params::matched_route_path`](crate::Params::matched_route_path).
    pub fn save_matched_route_path(&mut self, enable: bool) {
        self.save_matched_route_path = enable;
    }

    /// Register a value for the given method and route.
    ///
    /// ```rust
    /// use http::Method;
    /// use turnpike::Router;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut router = Router::new();
    /// router.insert(Method::GET, "/home", "Welcome!")?;
    /// router.insert(Method::POST, "/users/:id", "A User")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn insert(
        &mut self,
        method: Method,
        route: impl Into<String>,
        value: T,
    ) -> Result<(), InsertError> {
        let route = route.into();

        // Reject malformed routes before a tree is created for the method.
        tree::check_route(route.as_bytes())?;

        trace!(target: "router", "registering route {method} {route}");
        self.trees.entry(method).or_default().insert(route, value)
    }

    /// Register a value for a `GET` route.
    pub fn get(&mut self, route: impl Into<String>, value: T) -> Result<(), InsertError> {
        self.insert(Method::GET, route, value)
    }

    /// Register a value for a `HEAD` route.
    pub fn head(&mut self, route: impl Into<String>, value: T) -> Result<(), InsertError> {
        self.insert(Method::HEAD, route, value)
    }

    /// Register a value for an `OPTIONS` route.
    pub fn options(&mut self, route: impl Into<String>, value: T) -> Result<(), InsertError> {
        self.insert(Method::OPTIONS, route, value)
    }

    /// Register a value for a `POST` route.
    pub fn post(&mut self, route: impl Into<String>, value: T) -> Result<(), InsertError> {
        self.insert(Method::POST, route, value)
    }

    /// Register a value for a `PUT` route.
    pub fn put(&mut self, route: impl Into<String>, value: T) -> Result<(), InsertError> {
        self.insert(Method::PUT, route, value)
    }

    /// Register a value for a `PATCH` route.
    pub fn patch(&mut self, route: impl Into<String>, value: T) -> Result<(), InsertError> {
        self.insert(Method::PATCH, route, value)
    }

    /// Register a value for a `DELETE` route.
    pub fn delete(&mut self, route: impl Into<String>, value: T) -> Result<(), InsertError> {
        self.insert(Method::DELETE, route, value)
    }

    /// Find the value registered for the given method and path.
    ///
    /// On a miss, [`MatchError::tsr`] reports whether a route exists at the
    /// same path with one trailing slash added or removed; picking the
    /// redirect status code (301 for `GET`, 308 otherwise) is the caller's
    /// business.
    ///
    /// ```rust
    /// use http::Method;
    /// use turnpike::Router;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut router = Router::new();
    /// router.insert(Method::GET, "/user/:name", "a user")?;
    ///
    /// let matched = router.at(&Method::GET, "/user/gopher")?;
    /// assert_eq!(matched.params.get("name"), Some("gopher"));
    /// assert_eq!(*matched.value, "a user");
    /// # Ok(())
    /// # }
    /// ```
    pub fn at<'r>(
        &'r self,
        method: &Method,
        path: &'r str,
    ) -> Result<Match<'r, 'r, &'r T>, MatchError> {
        let root = self.trees.get(method).ok_or(MatchError::new(false))?;
        let mut matched = root.at(path)?;

        if self.save_matched_route_path {
            matched
                .params
                .prepend(MATCHED_ROUTE_PATH_PARAM, Cow::Borrowed(matched.pattern));
        }

        Ok(matched)
    }

    /// Returns the canonical registered path for the given method when the
    /// request path differs only by ASCII case, optionally fixing a trailing
    /// slash.
    pub fn path_ignore_case(
        &self,
        method: &Method,
        path: &str,
        fix_trailing_slash: bool,
    ) -> Option<String> {
        self.trees.get(method)?.path_ignore_case(path, fix_trailing_slash)
    }

    /// Computes the `Allow` set for a path: every method other than
    /// `exclude` with a value registered at `path`. The server-wide `"*"`
    /// path yields the union over all methods.
    ///
    /// A non-empty result always contains `OPTIONS` and is sorted by method
    /// token, ready to be joined into an `Allow` header.
    pub fn allowed(&self, path: &str, exclude: &Method) -> Vec<Method> {
        let mut allowed = Vec::with_capacity(self.trees.len() + 1);

        if path == "*" {
            for method in self.trees.keys() {
                if *method != Method::OPTIONS {
                    allowed.push(method.clone());
                }
            }
        } else {
            for (method, root) in &self.trees {
                if method == exclude || *method == Method::OPTIONS {
                    continue;
                }

                if root.at(path).is_ok() {
                    allowed.push(method.clone());
                }
            }
        }

        if !allowed.is_empty() {
            allowed.push(Method::OPTIONS);
            allowed.sort_unstable_by(|a, b| a.as_str().cmp(b.as_str()));
        }

        allowed
    }

    #[doc(hidden)]
    /// Test helper that ensures route priorities are consistent.
    pub fn check_priorities(&self) -> Result<(), (u32, u32)> {
        for root in self.trees.values() {
            root.check_priorities()?;
        }
        Ok(())
    }
}
