//! Resource Accessor
//!
//! The expensive resource sitting behind the cache (a download, a query, a
//! remote call). The cache never interprets its errors.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

// == Resource Accessor Trait ==
/// Loads the value for a key from the underlying resource.
///
/// Implementations own their retry policy; the cache calls `fetch` once per
/// miss and hands any error straight back to the reader.
#[async_trait]
pub trait ResourceAccessor: Send + Sync {
    type Key: Send + Sync;
    type Value: Send;
    type Error: Send;

    async fn fetch(&self, key: &Self::Key) -> Result<Self::Value, Self::Error>;
}

// == Fn Accessor ==
/// Adapts an async closure into a [`ResourceAccessor`].
///
/// ```ignore
/// let accessor = FnAccessor::new(|id: &u64| {
///     let id = *id;
///     async move { db.load_user(id).await }
/// });
/// ```
pub struct FnAccessor<K, V, F> {
    fetch: F,
    _marker: PhantomData<fn(&K) -> V>,
}

impl<K, V, F> FnAccessor<K, V, F> {
    pub fn new<E, Fut>(fetch: F) -> Self
    where
        F: Fn(&K) -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        Self {
            fetch,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<K, V, E, F, Fut> ResourceAccessor for FnAccessor<K, V, F>
where
    K: Send + Sync + 'static,
    V: Send + 'static,
    E: Send + 'static,
    F: Fn(&K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
{
    type Key = K;
    type Value = V;
    type Error = E;

    async fn fetch(&self, key: &K) -> Result<V, E> {
        (self.fetch)(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fn_accessor_fetch() {
        let accessor = FnAccessor::new(|key: &String| {
            let key = key.clone();
            async move { Ok::<_, String>(key.to_uppercase()) }
        });

        assert_eq!(accessor.fetch(&"abc".to_string()).await, Ok("ABC".to_string()));
    }

    #[tokio::test]
    async fn test_fn_accessor_error_passes_through() {
        let accessor = FnAccessor::new(|key: &u32| {
            let key = *key;
            async move { Err::<String, _>(format!("no row {}", key)) }
        });

        assert_eq!(accessor.fetch(&7).await, Err("no row 7".to_string()));
    }
}
