//! Cache-aside resolution of EVE reference data.
//!
//! Every single-entity lookup walks cache → database → ESI, writing back to the layers it
//! missed. Batched lookups only consult the cache and the database and never reach ESI.

pub mod alliance;
pub mod blueprint;
pub mod character;
pub mod corporation;
pub mod types;
pub mod universe;

use std::{collections::HashMap, future::Future, time::Duration};

use sea_orm::DbErr;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    cache::{get_json, get_many_json, set_json, set_many_json, Cache},
    data::is_unique_violation,
    error::{Error, ResultExt},
    esi::{EsiMeta, EsiResponse},
};

/// Resolves a single value through cache, store and finally `remote`.
pub(crate) async fn cache_aside<T, S, SF, R, RF>(
    cache: &dyn Cache,
    entity: &'static str,
    key: &str,
    ttl: Duration,
    store: S,
    remote: R,
) -> Result<T, Error>
where
    T: Serialize + DeserializeOwned,
    S: FnOnce() -> SF,
    SF: Future<Output = Result<Option<T>, DbErr>>,
    R: FnOnce() -> RF,
    RF: Future<Output = Result<T, Error>>,
{
    if let Some(cached) = get_json::<T>(cache, key)
        .await
        .context(format!("unable to read {entity} from redis"))?
    {
        return Ok(cached);
    }

    let value = match store()
        .await
        .context(format!("unable to load {entity} from database"))?
    {
        Some(value) => value,
        None => remote().await?,
    };

    set_json(cache, key, &value, ttl)
        .await
        .context(format!("unable to cache {entity} in redis"))?;

    Ok(value)
}

/// Resolves many values from cache and store only.
///
/// Cache misses are loaded with a single `store` call and written back. IDs found in neither
/// layer are absent from the result, which follows the order of `ids`.
pub(crate) async fn cache_aside_many<T, K, S, SF>(
    cache: &dyn Cache,
    entity: &'static str,
    ids: &[i64],
    key: K,
    ttl: Duration,
    id_of: fn(&T) -> i64,
    store: S,
) -> Result<Vec<T>, Error>
where
    T: Serialize + DeserializeOwned,
    K: Fn(i64) -> String,
    S: FnOnce(Vec<i64>) -> SF,
    SF: Future<Output = Result<Vec<T>, DbErr>>,
{
    let mut unique = ids.to_vec();
    unique.sort_unstable();
    unique.dedup();

    if unique.is_empty() {
        return Ok(Vec::new());
    }

    let keys: Vec<String> = unique.iter().map(|id| key(*id)).collect();
    let cached = get_many_json::<T>(cache, &keys)
        .await
        .context(format!("unable to read {entity} batch from redis"))?;

    let mut found: HashMap<i64, T> = HashMap::with_capacity(unique.len());
    let mut misses = Vec::new();
    for (id, value) in unique.iter().zip(cached) {
        match value {
            Some(value) => {
                found.insert(*id, value);
            }
            None => misses.push(*id),
        }
    }

    if !misses.is_empty() {
        let stored = store(misses)
            .await
            .context(format!("unable to load {entity} batch from database"))?;

        let entries = stored.iter().map(|value| (key(id_of(value)), value)).collect();
        set_many_json(cache, entries, ttl)
            .await
            .context(format!("unable to cache {entity} batch in redis"))?;

        for value in stored {
            found.insert(id_of(&value), value);
        }
    }

    let mut ordered = Vec::with_capacity(found.len());
    for id in ids {
        if let Some(value) = found.remove(id) {
            ordered.push(value);
        }
    }

    Ok(ordered)
}

/// Unwraps an ESI response, mapping 404 to [`Error::NotFound`]
pub(crate) fn remote_result<T>(
    entity: &'static str,
    id: i64,
    response: EsiResponse<T>,
) -> Result<(T, EsiMeta), Error> {
    if response.meta.is_not_found() {
        return Err(Error::NotFound { entity, id });
    }

    response
        .into_result()
        .context(format!("unable to fetch {entity} {id} from ESI"))
}

/// Accepts a freshly inserted row, or the existing one when a concurrent resolver won the
/// insert race.
pub(crate) async fn inserted_or_existing<T, F>(
    entity: &'static str,
    id: i64,
    inserted: Result<T, DbErr>,
    existing: F,
) -> Result<T, Error>
where
    F: Future<Output = Result<Option<T>, DbErr>>,
{
    match inserted {
        Ok(model) => Ok(model),
        Err(e) if is_unique_violation(&e) => {
            tracing::debug!(entity, id, "row inserted concurrently, reading existing");
            existing
                .await
                .context(format!("unable to load {entity} from database"))?
                .ok_or(Error::NotFound { entity, id })
        }
        Err(e) => Err(e).context(format!("unable to store {entity} {id}")),
    }
}
