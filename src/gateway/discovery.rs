//! Discovery aggregator.
//!
//! Trending and popular sections come straight from Jellyseerr's TMDB
//! proxy. "For You" is seeded from the user's Radarr/Sonarr libraries:
//! Jellyseerr recommendations for library titles, minus titles already in
//! the library, accumulated in the per-user rotation cache.
//!
//! A section whose service is missing, disabled or failing is returned
//! empty. Discovery never fails because of an upstream.

use std::collections::HashSet;
use std::future::Future;
use std::time::Instant;

use futures_util::future::{join, join_all, join4};
use tracing::{debug, instrument, warn};

use super::{Assistarr, optional};
use crate::Result;
use crate::cache::{
    CacheState, IdentityKey, expire_fresh_slots, get_all_items, needs_more_items, rotate_cache_at,
};
use crate::clients::JellyseerrClient;
use crate::retry::with_retry;
use crate::types::{MediaItem, Section, SectionId, ServiceName};

/// Seed batches fetched per "For You" refill before giving up on the target.
const MAX_SEED_BATCHES: usize = 2;

impl Assistarr {
    /// All discovery sections for `user_id`, in display order.
    #[instrument(skip(self))]
    pub async fn discover(&self, user_id: &str) -> Result<Vec<Section>> {
        let jellyseerr = optional(self.jellyseerr(user_id).await)?;
        let client = jellyseerr.as_ref();

        let (trending, movies, tv, for_you) = join4(
            self.jellyseerr_section(SectionId::Trending, client, |c| c.trending()),
            self.jellyseerr_section(SectionId::PopularMovies, client, |c| c.popular_movies()),
            self.jellyseerr_section(SectionId::PopularTv, client, |c| c.popular_tv()),
            self.for_you(user_id),
        )
        .await;

        Ok(vec![trending, movies, tv, for_you?])
    }

    async fn jellyseerr_section<'a, F, Fut>(
        &self,
        id: SectionId,
        client: Option<&'a JellyseerrClient>,
        fetch: F,
    ) -> Section
    where
        F: Fn(&'a JellyseerrClient) -> Fut,
        Fut: Future<Output = Result<Vec<MediaItem>>>,
    {
        let Some(client) = client else {
            return Section::empty(id);
        };
        match with_retry(&self.retry, ServiceName::Jellyseerr, id.as_str(), || fetch(client)).await {
            Ok(items) => Section::new(id, items),
            Err(e) => {
                warn!(section = id.as_str(), error = %e, "discovery section failed");
                Section::empty(id)
            }
        }
    }

    /// The "For You" section, refilled in stages.
    ///
    /// Held items are returned as they are while the current refill cycle
    /// has at least `target` fresh items. Otherwise recommendations are
    /// fetched one seed batch at a time until the target is met.
    #[instrument(skip(self))]
    pub async fn for_you(&self, user_id: &str) -> Result<Section> {
        let config = &self.discovery;
        let target = config.effective_target();
        let now = Instant::now();

        let state = self.discovery_cache.get(user_id);
        let mut state = expire_fresh_slots(state, config.fresh_max_age, now);

        if needs_more_items(&state, target) {
            state = self.refill(user_id, state, target, now).await?;
            self.discovery_cache.put(user_id, state.clone());
        }

        let items = get_all_items(&state).cloned().collect();
        Ok(Section::new(SectionId::ForYou, items))
    }

    async fn refill(
        &self,
        user_id: &str,
        mut state: CacheState<MediaItem>,
        target: usize,
        now: Instant,
    ) -> Result<CacheState<MediaItem>> {
        let Some(jellyseerr) = optional(self.jellyseerr(user_id).await)? else {
            return Ok(state);
        };
        let capacity = self.discovery.capacity;
        let library = self.library(user_id).await?;
        let owned: HashSet<String> = library.iter().map(IdentityKey::identity_key).collect();

        let mut seeds: Vec<&MediaItem> = library.iter().filter(|i| i.tmdb_id.is_some()).collect();
        if seeds.is_empty() {
            // No library to personalize from: fall back to what is trending.
            debug!("no library seeds, using trending titles");
            if let Ok(trending) = with_retry(&self.retry, ServiceName::Jellyseerr, "trending", || {
                jellyseerr.trending()
            })
            .await
            {
                state = rotate_cache_at(state, trending, capacity, now);
            }
            return Ok(state);
        }

        // Start at a different seed each refill so later cycles bring new titles.
        seeds.reverse();
        let offset = (state.written() as usize) % seeds.len();
        seeds.rotate_left(offset);

        for batch in seeds.chunks(target.max(1)).take(MAX_SEED_BATCHES) {
            let fetched = join_all(batch.iter().map(|seed| self.recommendations(&jellyseerr, seed))).await;
            let incoming = fetched
                .into_iter()
                .flatten()
                .filter(|item| !owned.contains(&item.identity_key()));
            state = rotate_cache_at(state, incoming, capacity, now);
            if !needs_more_items(&state, target) {
                break;
            }
        }
        Ok(state)
    }

    async fn recommendations(&self, jellyseerr: &JellyseerrClient, seed: &MediaItem) -> Vec<MediaItem> {
        let Some(tmdb_id) = seed.tmdb_id else {
            return Vec::new();
        };
        with_retry(&self.retry, ServiceName::Jellyseerr, "recommendations", || {
            jellyseerr.recommendations(seed.media_type, tmdb_id)
        })
        .await
        .unwrap_or_else(|e| {
            warn!(tmdb_id, error = %e, "recommendations failed");
            Vec::new()
        })
    }

    /// Movies and series the user already has. Missing services add nothing.
    async fn library(&self, user_id: &str) -> Result<Vec<MediaItem>> {
        let radarr = optional(self.radarr(user_id).await)?;
        let sonarr = optional(self.sonarr(user_id).await)?;

        let movies = async {
            match &radarr {
                Some(client) => with_retry(&self.retry, ServiceName::Radarr, "library", || {
                    client.movies()
                })
                .await
                .unwrap_or_else(|e| {
                    warn!(service = "radarr", error = %e, "library fetch failed");
                    Vec::new()
                }),
                None => Vec::new(),
            }
        };
        let series = async {
            match &sonarr {
                Some(client) => with_retry(&self.retry, ServiceName::Sonarr, "library", || {
                    client.series()
                })
                .await
                .unwrap_or_else(|e| {
                    warn!(service = "sonarr", error = %e, "library fetch failed");
                    Vec::new()
                }),
                None => Vec::new(),
            }
        };

        let (mut movies, series) = join(movies, series).await;
        movies.extend(series);
        Ok(movies)
    }
}
