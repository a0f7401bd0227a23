use sea_orm::DatabaseConnection;

use super::{cache_aside, cache_aside_many, inserted_or_existing, remote_result};
use crate::{
    cache::{key, Cache},
    data::eve::character::CharacterRepository,
    error::Error,
    esi::EsiClient,
};

pub struct CharacterService<'a> {
    db: &'a DatabaseConnection,
    cache: &'a dyn Cache,
    esi: &'a EsiClient,
}

impl<'a> CharacterService<'a> {
    /// Creates a new instance of [`CharacterService`]
    pub fn new(db: &'a DatabaseConnection, cache: &'a dyn Cache, esi: &'a EsiClient) -> Self {
        Self { db, cache, esi }
    }

    /// Get a character from cache, database or ESI
    pub async fn get(&self, character_id: i64) -> Result<entity::eve_character::Model, Error> {
        let repo = CharacterRepository::new(self.db);

        cache_aside(
            self.cache,
            "character",
            &key::character(character_id),
            key::VOLATILE_TTL,
            || repo.find_by_id(character_id),
            || self.fetch_and_store(character_id),
        )
        .await
    }

    /// Get every known character among `character_ids` without calling ESI
    pub async fn get_by_ids(
        &self,
        character_ids: &[i64],
    ) -> Result<Vec<entity::eve_character::Model>, Error> {
        let repo = CharacterRepository::new(self.db);

        cache_aside_many(
            self.cache,
            "character",
            character_ids,
            key::character,
            key::VOLATILE_TTL,
            |character: &entity::eve_character::Model| character.id,
            |missing| async move { repo.find_by_ids(&missing).await },
        )
        .await
    }

    async fn fetch_and_store(
        &self,
        character_id: i64,
    ) -> Result<entity::eve_character::Model, Error> {
        let repo = CharacterRepository::new(self.db);

        let (character, meta) = remote_result(
            "character",
            character_id,
            self.esi.get_character(character_id, None).await,
        )?;

        let inserted = repo
            .create(character_id, character, meta.expires().timestamp(), meta.etag())
            .await;

        inserted_or_existing(
            "character",
            character_id,
            inserted,
            repo.find_by_id(character_id),
        )
        .await
    }
}
