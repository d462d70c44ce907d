//! A compact radix tree based HTTP request router.
//!
//! Routes are registered per HTTP method and matched against request paths,
//! extracting any named parameters along the way:
//!
//!```rust
//!use http::Method;
//!use turnpike::Router;
//!
//!fn main() -> Result<(), Box<dyn std::error::Error>> {
//!    let mut router = Router::new();
//!    router.insert(Method::GET, "/home", "Welcome!")?;
//!    router.insert(Method::GET, "/users/:id", "A User")?;
//!
//!    let matched = router.at(&Method::GET, "/users/978")?;
//!    assert_eq!(matched.params.get("id"), Some("978"));
//!    assert_eq!(*matched.value, "A User");
//!
//!    Ok(())
//!}
//!```
//!
//!# Parameters
//!
//!Named parameters like `/:id` match a single path segment, anything up to
//!the next `/` or the end of the path:
//!
//!```rust
//!# use http::Method;
//!# use turnpike::Router;
//!# fn main() -> Result<(), Box<dyn std::error::Error>> {
//!let mut router = Router::new();
//!router.insert(Method::GET, "/users/:id", 42)?;
//!
//!let matched = router.at(&Method::GET, "/users/1")?;
//!assert_eq!(matched.params.get("id"), Some("1"));
//!
//!// Named parameters never match more than one segment.
//!assert!(router.at(&Method::GET, "/users/1/posts").is_err());
//!assert!(router.at(&Method::GET, "/users").is_err());
//!# Ok(())
//!# }
//!```
//!
//!Catch-all parameters start with `*` and match everything from their
//!leading `/` to the end of the path. They must always be the final segment
//!of the route:
//!
//!```rust
//!# use http::Method;
//!# use turnpike::Router;
//!# fn main() -> Result<(), Box<dyn std::error::Error>> {
//!let mut router = Router::new();
//!router.insert(Method::GET, "/static/*filepath", true)?;
//!
//!let matched = router.at(&Method::GET, "/static/css/main.css")?;
//!assert_eq!(matched.params.get("filepath"), Some("/css/main.css"));
//!# Ok(())
//!# }
//!```
//!
//!Extracted parameter values are percent-decoded; the route itself is
//!matched against the raw path.
//!
//!# Explicit matches
//!
//!A request path matches exactly one route or none at all. Registering a
//!static segment and a parameter at the same position is a conflict reported
//!at registration time, not resolved by priority rules at lookup time:
//!
//!```rust
//!# use http::Method;
//!# use turnpike::Router;
//!# fn main() -> Result<(), Box<dyn std::error::Error>> {
//!let mut router = Router::new();
//!router.insert(Method::GET, "/users/new", 1)?;
//!assert!(router.insert(Method::GET, "/users/:id", 2).is_err());
//!# Ok(())
//!# }
//!```
//!
//!# Path recovery
//!
//!A miss can still carry a hint: [`MatchError::tsr`] reports that the path
//!would match with one trailing slash added or removed, and
//![`Router::path_ignore_case`] finds the registered path for a request that
//!differs only by ASCII case. [`path::clean`] removes `.` and `..` segments
//!and duplicate slashes. How to turn these into redirects is up to the
//!calling server:
//!
//!```rust
//!# use http::Method;
//!# use turnpike::Router;
//!# fn main() -> Result<(), Box<dyn std::error::Error>> {
//!let mut router = Router::new();
//!router.insert(Method::GET, "/home", "Welcome!")?;
//!
//!assert!(router.at(&Method::GET, "/home/").unwrap_err().tsr());
//!assert_eq!(
//!    router.path_ignore_case(&Method::GET, "/HoMe", true).as_deref(),
//!    Some("/home"),
//!);
//!assert_eq!(turnpike::path::clean("//home/../home"), "/home");
//!# Ok(())
//!# }
//!```
//!
//!# Concurrency
//!
//!Registration is a setup-phase operation taking `&mut self`. Lookups take
//!`&self` and never mutate, so once all routes are registered the router can
//!be shared across threads (e.g. in an `Arc`) without locking.

#![forbid(unsafe_code)]

mod error;
mod params;
mod router;
mod tree;

pub mod path;

pub use error::{InsertError, MatchError};
pub use params::{Param, Params, MATCHED_ROUTE_PATH_PARAM};
pub use router::Router;
pub use tree::{Match, Node};
