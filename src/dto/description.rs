use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{DescriptionEntity, DescriptionPatch, NewDescriptionEntity},
    dto::validation::{validate_description_name, validate_description_text},
};

/// Body accepted when creating or updating a description.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DescriptionInput {
    /// Unique name, 2 to 75 characters once trimmed.
    pub name: String,
    /// Rule text, 100 to 3000 characters once trimmed.
    pub description: String,
}

impl Validate for DescriptionInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_description_name(&self.name) {
            errors.add("name", e);
        }
        if let Err(e) = validate_description_text(&self.description) {
            errors.add("description", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl DescriptionInput {
    /// Trimmed user-provided description; never flagged as default.
    pub fn into_new_entity(self) -> NewDescriptionEntity {
        let DescriptionPatch { name, description } = self.into_patch();
        NewDescriptionEntity {
            name,
            description,
            is_default: false,
        }
    }

    pub fn into_patch(self) -> DescriptionPatch {
        DescriptionPatch {
            name: self.name.trim().to_owned(),
            description: self.description.trim().to_owned(),
        }
    }
}

/// Full description, including the default flag.
#[derive(Debug, Serialize, ToSchema)]
pub struct DescriptionResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    /// True for system-provided descriptions, which cannot be edited.
    #[serde(rename = "isDefaultField")]
    pub is_default_field: bool,
}

impl From<DescriptionEntity> for DescriptionResponse {
    fn from(entity: DescriptionEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            description: entity.description,
            is_default_field: entity.is_default,
        }
    }
}

/// Description returned after a write.
#[derive(Debug, Serialize, ToSchema)]
pub struct DescriptionSummary {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl From<DescriptionEntity> for DescriptionSummary {
    fn from(entity: DescriptionEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            description: entity.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, description_len: usize) -> DescriptionInput {
        DescriptionInput {
            name: name.into(),
            description: "r".repeat(description_len),
        }
    }

    #[test]
    fn reports_both_fields() {
        let errors = input("x", 10).validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("description"));
    }

    #[test]
    fn new_entities_are_never_default() {
        let entity = input(" Tarot ", 120).into_new_entity();
        assert_eq!(entity.name, "Tarot");
        assert!(!entity.is_default);
    }

    #[test]
    fn response_uses_camel_case_default_flag() {
        let response = DescriptionResponse::from(DescriptionEntity {
            id: "1".into(),
            name: "Tarot".into(),
            description: "rules".into(),
            is_default: true,
        });
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["isDefaultField"], serde_json::Value::Bool(true));
    }
}
