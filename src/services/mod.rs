/// Description CRUD and default seeding.
pub mod description_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Game CRUD and score rounds.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
