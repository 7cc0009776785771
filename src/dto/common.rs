use serde::Serialize;
use utoipa::ToSchema;

/// Identifier of a document removed by a delete request.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedResponse {
    pub id: String,
}

impl DeletedResponse {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}
