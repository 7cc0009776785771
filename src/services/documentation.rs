use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for Scoreboard Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::list_games,
        crate::routes::game::create_game,
        crate::routes::game::get_game,
        crate::routes::game::update_scores,
        crate::routes::game::delete_game,
        crate::routes::description::list_descriptions,
        crate::routes::description::create_description,
        crate::routes::description::get_description,
        crate::routes::description::update_description,
        crate::routes::description::delete_description,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::common::DeletedResponse,
            crate::dto::game::CreateGameRequest,
            crate::dto::game::UpdateScoresRequest,
            crate::dto::game::GameResponse,
            crate::dto::game::PlayerResponse,
            crate::dto::description::DescriptionInput,
            crate::dto::description::DescriptionResponse,
            crate::dto::description::DescriptionSummary,
            crate::error::ErrorBody,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "games", description = "Games and their score history"),
        (name = "descriptions", description = "Rule-set descriptions"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_api_path() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/api/v1/games",
            "/api/v1/games/{id}",
            "/api/v1/descriptions",
            "/api/v1/descriptions/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
