use crate::errors::Result;
use futures::future::try_join_all;
use std::future::Future;

/// Run `f` on every item concurrently and collect the results in input order.
///
/// The first error is returned as soon as it happens; every other in-flight
/// future is dropped at that point.
pub async fn try_map<I, T, F, Fut, R>(items: I, f: F) -> Result<Vec<R>>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    try_join_all(items.into_iter().map(f)).await
}

/// Like [`try_map`] for calls run only for their effect
pub async fn try_for_each<I, T, F, Fut>(items: I, f: F) -> Result<()>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    try_map(items, f).await.map(|_| ())
}

/// Run synchronous git work on tokio's blocking pool
pub async fn blocking<F, R>(f: F) -> Result<R>
where
    F: FnOnce() -> Result<R> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// Treat the hosting provider's "does not exist" answer as an empty result
pub fn not_found_as_none<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
