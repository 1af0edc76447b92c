use std::{
    future::Future,
    hash::Hash,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use chrono::NaiveDate;
use db::models::{
    bem_patrimonial::{BemFilter, BemPatrimonial},
    edital::{Edital, EditalFilter, PublicEdital},
    noticia::{Noticia, NoticiaFilter, PublicNoticia},
    pagination::{Page, PageRequest},
};
use moka::future::Cache;

use super::config::CacheConfig;

/// One bounded TTL cache for one kind of list query.
///
/// Entries are keyed by a generation counter as well, so a load that raced
/// with an invalidation never repopulates the cache with stale rows.
pub struct CacheSlot<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    cache: Cache<(u64, K), Arc<V>>,
    generation: Arc<AtomicU64>,
}

impl<K, V> Clone for CacheSlot<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            generation: self.generation.clone(),
        }
    }
}

impl<K, V> CacheSlot<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub fn new(settings: &CacheConfig) -> Self {
        let mut builder = Cache::builder().max_capacity(settings.max_entries);
        if settings.ttl_secs > 0 {
            builder = builder.time_to_live(Duration::from_secs(settings.ttl_secs));
        }
        Self {
            cache: builder.build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn get_or_load<F, Fut, E>(&self, key: K, load: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let generation = self.generation.load(Ordering::Acquire);
        let cache_key = (generation, key);
        if let Some(hit) = self.cache.get(&cache_key).await {
            return Ok(hit);
        }

        let value = Arc::new(load().await?);
        if self.generation.load(Ordering::Acquire) == generation {
            self.cache.insert(cache_key, value.clone()).await;
        }
        Ok(value)
    }

    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.cache.invalidate_all();
    }
}

pub type EditalListKey = (EditalFilter, PageRequest, NaiveDate);

/// List-query caches, invalidated per entity on every successful mutation.
#[derive(Clone)]
pub struct QueryCache {
    pub editais_admin: CacheSlot<EditalListKey, Page<Edital>>,
    pub editais_public: CacheSlot<EditalListKey, Page<PublicEdital>>,
    pub noticias_admin: CacheSlot<(NoticiaFilter, PageRequest), Page<Noticia>>,
    pub noticias_public: CacheSlot<u64, Vec<PublicNoticia>>,
    pub bens: CacheSlot<(BemFilter, PageRequest), Page<BemPatrimonial>>,
}

impl QueryCache {
    pub fn new(settings: &CacheConfig) -> Self {
        Self {
            editais_admin: CacheSlot::new(settings),
            editais_public: CacheSlot::new(settings),
            noticias_admin: CacheSlot::new(settings),
            noticias_public: CacheSlot::new(settings),
            bens: CacheSlot::new(settings),
        }
    }

    pub fn invalidate_editais(&self) {
        self.editais_admin.invalidate();
        self.editais_public.invalidate();
        tracing::debug!("Invalidated editais list cache");
    }

    pub fn invalidate_noticias(&self) {
        self.noticias_admin.invalidate();
        self.noticias_public.invalidate();
        tracing::debug!("Invalidated noticias list cache");
    }

    pub fn invalidate_bens(&self) {
        self.bens.invalidate();
        tracing::debug!("Invalidated bens list cache");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[tokio::test]
    async fn hits_until_invalidated() {
        let slot: CacheSlot<u32, String> = CacheSlot::new(&CacheConfig::default());
        let counter = AtomicUsize::new(0);
        let loads = &counter;
        let load = move || async move {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok::<_, std::convert::Infallible>("page".to_string())
        };

        assert_eq!(*slot.get_or_load(1, load).await.unwrap(), "page");
        assert_eq!(*slot.get_or_load(1, load).await.unwrap(), "page");
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        slot.get_or_load(2, load).await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);

        slot.invalidate();
        slot.get_or_load(1, load).await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let slot: CacheSlot<u32, u32> = CacheSlot::new(&CacheConfig::default());
        let failed = slot
            .get_or_load(7, || async { Err::<u32, &str>("boom") })
            .await;
        assert_eq!(failed.unwrap_err(), "boom");

        let loaded = slot
            .get_or_load(7, || async { Ok::<u32, &str>(42) })
            .await
            .unwrap();
        assert_eq!(*loaded, 42);
    }

    #[tokio::test]
    async fn load_racing_an_invalidation_is_not_stored() {
        let slot: CacheSlot<u32, u32> = CacheSlot::new(&CacheConfig::default());
        let value = slot
            .get_or_load(1, || async {
                slot.invalidate();
                Ok::<u32, ()>(1)
            })
            .await
            .unwrap();
        assert_eq!(*value, 1);

        let reloaded = slot
            .get_or_load(1, || async { Ok::<u32, ()>(2) })
            .await
            .unwrap();
        assert_eq!(*reloaded, 2);
    }
}
