use std::borrow::Cow;

/// The reserved key under which the matched route pattern is recorded when
/// [`Router::save_matched_route_path`](crate::Router::save_matched_route_path)
/// is enabled.
pub const MATCHED_ROUTE_PATH_PARAM: &str = "$matchedRoutePath";

/// A single URL parameter, consisting of a key and a value.
///
/// The value borrows from the request path unless percent-decoding had to
/// allocate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param<'k, 'v> {
    pub key: &'k str,
    pub value: Cow<'v, str>,
}

/// The URL parameters extracted by a match, ordered by their position in the
/// route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params<'k, 'v>(Vec<Param<'k, 'v>>);

impl<'k, 'v> Params<'k, 'v> {
    pub(crate) const fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns the value of the first parameter registered under the given
    /// key.
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        let key = key.as_ref();
        self.0.iter().find(|p| p.key == key).map(|p| p.value.as_ref())
    }

    /// Returns the value registered under the given key, or an empty string
    /// when there is none.
    pub fn by_name(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    /// Returns the route pattern this match came from, if the router was
    /// configured to record it.
    pub fn matched_route_path(&self) -> Option<&str> {
        self.get(MATCHED_ROUTE_PATH_PARAM)
    }

    /// Returns the number of extracted parameters.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns `true` if there are no parameters in the list.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates the parameters in route order.
    ///
    /// The matched route entry, if recorded, is not a real parameter and is
    /// skipped.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter(|p| p.key != MATCHED_ROUTE_PATH_PARAM)
            .map(|p| (p.key, p.value.as_ref()))
    }

    pub(crate) fn push(&mut self, key: &'k str, value: Cow<'v, str>) {
        self.0.push(Param { key, value });
    }

    pub(crate) fn prepend(&mut self, key: &'k str, value: Cow<'v, str>) {
        self.0.insert(0, Param { key, value });
    }
}
