//! Route template sources.

/// Supplies the route templates of a web application.
///
/// Implemented for lists of strings and for closures, so a framework adapter
/// can pass its router lookup directly.
pub trait RouteSource: Send + Sync {
    fn routes(&self) -> Vec<String>;
}

impl RouteSource for Vec<String> {
    fn routes(&self) -> Vec<String> {
        self.clone()
    }
}

impl RouteSource for Vec<&'static str> {
    fn routes(&self) -> Vec<String> {
        self.iter().map(|&route| route.to_owned()).collect()
    }
}

impl<const N: usize> RouteSource for [&'static str; N] {
    fn routes(&self) -> Vec<String> {
        self.iter().map(|&route| route.to_owned()).collect()
    }
}

impl<F> RouteSource for F
where
    F: Fn() -> Vec<String> + Send + Sync,
{
    fn routes(&self) -> Vec<String> {
        self()
    }
}
