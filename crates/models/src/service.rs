use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

use crate::enums::{Category, Currency};

/// Ordered list of feature bullet points, stored as a JSON array.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct Features(pub Vec<String>);

impl From<Vec<String>> for Features {
    fn from(v: Vec<String>) -> Self { Features(v) }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "services")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub description: String,
    pub short_description: String,
    pub icon: String,
    pub image: Option<String>,
    pub category: Category,
    #[sea_orm(column_type = "Double", nullable)]
    pub price: Option<f64>,
    pub currency: Currency,
    pub duration: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub features: Features,
    pub is_active: bool,
    #[serde(rename = "order")]
    pub display_order: i32,
    pub created_by: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub const DEFAULT_ICON: &str = "service";

impl Model {
    /// Case-insensitive substring match over title, description and short description.
    /// `needle` must already be lowercased.
    pub fn matches_search(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.short_description.to_lowercase().contains(needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample() -> Model {
        let now = Utc::now().into();
        Model {
            id: 7,
            title: "Web Development".into(),
            description: "Custom web application development".into(),
            short_description: "Modern websites and web apps".into(),
            icon: DEFAULT_ICON.into(),
            image: None,
            category: Category::Technology,
            price: Some(2500.0),
            currency: Currency::USD,
            duration: Some("4-6 weeks".into()),
            features: Features(vec!["Responsive Design".into(), "API Development".into()]),
            is_active: true,
            display_order: 1,
            created_by: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn search_is_case_insensitive_across_text_fields() {
        let s = sample();
        assert!(s.matches_search("web"));
        assert!(s.matches_search("application"));
        assert!(s.matches_search("modern"));
        assert!(!s.matches_search("marketing"));
    }

    #[test]
    fn json_shape_uses_order_and_feature_array() {
        let v = serde_json::to_value(sample()).unwrap();
        assert_eq!(v["order"], 1);
        assert_eq!(v["features"], serde_json::json!(["Responsive Design", "API Development"]));
        assert_eq!(v["shortDescription"], "Modern websites and web apps");
        assert_eq!(v["category"], "technology");
        assert!(v.get("displayOrder").is_none());
    }
}
