//! Description operations behind the `/api/v1/descriptions` routes, plus the
//! seeding of default descriptions into a freshly connected store.

use std::sync::Arc;

use tracing::{debug, info, warn};
use validator::Validate;

use crate::{
    config::DefaultDescription,
    dao::{
        models::{DescriptionUpdate, NewDescriptionEntity},
        score_store::ScoreStore,
        storage::StorageError,
    },
    dto::{
        common::DeletedResponse,
        description::{DescriptionInput, DescriptionResponse, DescriptionSummary},
    },
    error::ServiceError,
    services::game_service::require_id,
    state::SharedState,
};

pub async fn list_descriptions(
    state: &SharedState,
) -> Result<Vec<DescriptionResponse>, ServiceError> {
    let store = state.require_score_store().await?;
    let descriptions = store.list_descriptions().await?;
    Ok(descriptions.into_iter().map(Into::into).collect())
}

/// Persist a user description. Names must be unique; a taken name writes nothing.
pub async fn create_description(
    state: &SharedState,
    input: DescriptionInput,
) -> Result<DescriptionSummary, ServiceError> {
    input.validate()?;
    let store = state.require_score_store().await?;

    let entity = input.into_new_entity();
    if store
        .find_description_by_name(entity.name.clone())
        .await?
        .is_some()
    {
        return Err(name_taken(&entity.name));
    }

    let created = store.insert_description(entity).await?;
    info!(description_id = %created.id, name = %created.name, "description created");
    Ok(created.into())
}

pub async fn get_description(
    state: &SharedState,
    id: &str,
) -> Result<DescriptionResponse, ServiceError> {
    let id = require_id(id, "description")?;
    let store = state.require_score_store().await?;

    match store.find_description(id.clone()).await? {
        Some(description) => Ok(description.into()),
        None => Err(description_not_found(&id)),
    }
}

/// Replace the name and text of a user description. Defaults are read-only.
pub async fn update_description(
    state: &SharedState,
    id: &str,
    input: DescriptionInput,
) -> Result<DescriptionSummary, ServiceError> {
    let id = require_id(id, "description")?;
    input.validate()?;
    let store = state.require_score_store().await?;

    let Some(current) = store.find_description(id.clone()).await? else {
        return Err(description_not_found(&id));
    };
    if current.is_default {
        return Err(read_only(&id));
    }

    let patch = input.into_patch();
    if let Some(existing) = store.find_description_by_name(patch.name.clone()).await? {
        if existing.id != id {
            return Err(name_taken(&patch.name));
        }
    }

    // The store re-checks existence and the default flag as part of the write.
    match store.update_description(id.clone(), patch).await? {
        DescriptionUpdate::Updated(description) => {
            debug!(description_id = %description.id, "description updated");
            Ok(description.into())
        }
        DescriptionUpdate::Missing => Err(description_not_found(&id)),
        DescriptionUpdate::Locked => Err(read_only(&id)),
    }
}

/// Delete a description; defaults may be deleted too.
pub async fn delete_description(
    state: &SharedState,
    id: &str,
) -> Result<DeletedResponse, ServiceError> {
    let id = require_id(id, "description")?;
    let store = state.require_score_store().await?;

    if !store.delete_description(id.clone()).await? {
        return Err(description_not_found(&id));
    }
    info!(description_id = %id, "description deleted");
    Ok(DeletedResponse::new(id))
}

/// Insert every configured default whose name is free, returning how many were added.
///
/// A store is seeded once; defaults deleted afterwards are not brought back.
/// Invalid entries are skipped with a warning.
pub async fn seed_default_descriptions(
    store: &Arc<dyn ScoreStore>,
    defaults: &[DefaultDescription],
) -> Result<usize, StorageError> {
    if store.defaults_seeded().await? {
        debug!("default descriptions already seeded");
        return Ok(0);
    }
    let mut inserted = 0;

    for default in defaults {
        let input = DescriptionInput {
            name: default.name.clone(),
            description: default.description.clone(),
        };
        if let Err(errors) = input.validate() {
            warn!(name = %default.name, error = %errors, "skipping invalid default description");
            continue;
        }

        let entity = NewDescriptionEntity {
            is_default: true,
            ..input.into_new_entity()
        };
        if store
            .find_description_by_name(entity.name.clone())
            .await?
            .is_some()
        {
            continue;
        }

        match store.insert_description(entity).await {
            Ok(created) => {
                debug!(name = %created.name, "default description seeded");
                inserted += 1;
            }
            // Another instance seeded it first.
            Err(StorageError::Duplicate { .. }) => {}
            Err(err) => return Err(err),
        }
    }

    store.mark_defaults_seeded().await?;
    Ok(inserted)
}

fn name_taken(name: &str) -> ServiceError {
    ServiceError::Conflict(format!("a description named `{name}` already exists"))
}

fn read_only(id: &str) -> ServiceError {
    ServiceError::ReadOnly(format!(
        "description `{id}` is a default description and cannot be modified"
    ))
}

fn description_not_found(id: &str) -> ServiceError {
    ServiceError::NotFound(format!("description `{id}` not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig, dao::score_store::memory::MemoryScoreStore, state::AppState,
    };

    fn rules(name: &str) -> DescriptionInput {
        DescriptionInput {
            name: name.into(),
            description: "Each player rolls five dice and keeps the best combination. ".repeat(3),
        }
    }

    async fn connected_state() -> (SharedState, Arc<dyn ScoreStore>) {
        let state = AppState::new(AppConfig::default());
        let store: Arc<dyn ScoreStore> = Arc::new(MemoryScoreStore::new());
        state.install_score_store(store.clone()).await;
        (state, store)
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected_without_writing() {
        let (state, store) = connected_state().await;
        create_description(&state, rules("Yahtzee")).await.unwrap();

        let err = create_description(&state, rules("Yahtzee")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(store.list_descriptions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn keeping_the_same_name_on_update_is_allowed() {
        let (state, _) = connected_state().await;
        let created = create_description(&state, rules("Yahtzee")).await.unwrap();

        let updated = update_description(&state, &created.id, rules("Yahtzee"))
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
    }

    #[tokio::test]
    async fn renaming_onto_another_description_conflicts() {
        let (state, _) = connected_state().await;
        create_description(&state, rules("Yahtzee")).await.unwrap();
        let other = create_description(&state, rules("Tarot")).await.unwrap();

        let err = update_description(&state, &other.id, rules("Yahtzee"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn defaults_are_seeded_once_and_locked() {
        let (state, store) = connected_state().await;
        let defaults = AppConfig::builtin().default_descriptions().to_vec();

        let first = seed_default_descriptions(&store, &defaults).await.unwrap();
        let second = seed_default_descriptions(&store, &defaults).await.unwrap();
        assert_eq!(first, defaults.len());
        assert_eq!(second, 0);

        let listed = list_descriptions(&state).await.unwrap();
        assert!(listed.iter().all(|d| d.is_default_field));

        let err = update_description(&state, &listed[0].id, rules("Renamed"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ReadOnly(_)));
    }

    #[tokio::test]
    async fn deleted_defaults_stay_deleted_after_reseeding() {
        let (state, store) = connected_state().await;
        let defaults = AppConfig::builtin().default_descriptions().to_vec();
        seed_default_descriptions(&store, &defaults).await.unwrap();

        let classic = store
            .find_description_by_name("Classic".into())
            .await
            .unwrap()
            .unwrap();
        delete_description(&state, &classic.id).await.unwrap();

        assert_eq!(seed_default_descriptions(&store, &defaults).await.unwrap(), 0);
        let names: Vec<_> = list_descriptions(&state)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["Lowest wins".to_owned()]);
    }

    #[tokio::test]
    async fn invalid_defaults_are_skipped() {
        let (_, store) = connected_state().await;
        let defaults = vec![DefaultDescription {
            name: "Short".into(),
            description: "too short".into(),
        }];

        assert_eq!(seed_default_descriptions(&store, &defaults).await.unwrap(), 0);
    }
}
