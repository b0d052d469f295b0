//! Route exclusion by ignored prefix.

/// Keep the routes that start with none of `ignored`, preserving order.
///
/// Matching is a plain string prefix test, not path-segment aware: the
/// prefix `/ad` also excludes `/admin/x`.
pub fn without_ignored<I, S, P>(routes: I, ignored: &[P]) -> Vec<S>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    P: AsRef<str>,
{
    routes
        .into_iter()
        .filter(|route| {
            let route = route.as_ref();
            !ignored.iter().any(|prefix| route.starts_with(prefix.as_ref()))
        })
        .collect()
}
