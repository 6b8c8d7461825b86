//! String-backed domain enums shared by entities, the store and request validation.

use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use sea_orm::Iterable;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

fn parse_value<E>(raw: &str, what: &str) -> Result<E, ModelError>
where
    E: ActiveEnum<Value = String>,
{
    E::try_from_value(&raw.trim().to_string())
        .map_err(|_| ModelError::Validation(format!("invalid {what} `{raw}`")))
}

macro_rules! display_and_parse {
    ($ty:ty, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_value())
            }
        }

        impl FromStr for $ty {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_value(s, $what)
            }
        }
    };
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "admin")]
    Admin,
}

display_and_parse!(Role, "role");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[sea_orm(string_value = "consulting")]
    Consulting,
    #[sea_orm(string_value = "technology")]
    Technology,
    #[sea_orm(string_value = "support")]
    Support,
    #[sea_orm(string_value = "training")]
    Training,
    #[sea_orm(string_value = "marketing")]
    Marketing,
    #[sea_orm(string_value = "other")]
    Other,
}

display_and_parse!(Category, "category");

impl Category {
    /// Every category in declaration order.
    pub fn all() -> Vec<Category> {
        Self::iter().collect()
    }

    /// Human-readable label shown by the catalog filter.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Consulting => "Consulting Services",
            Category::Technology => "Technology Solutions",
            Category::Support => "Customer Support",
            Category::Training => "Training & Development",
            Category::Marketing => "Marketing & Branding",
            Category::Other => "Other Services",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum Currency {
    #[default]
    #[sea_orm(string_value = "USD")]
    USD,
    #[sea_orm(string_value = "EUR")]
    EUR,
    #[sea_orm(string_value = "MAD")]
    MAD,
}

display_and_parse!(Currency, "currency");

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    #[default]
    #[sea_orm(string_value = "new")]
    New,
    #[sea_orm(string_value = "read")]
    Read,
    #[sea_orm(string_value = "replied")]
    Replied,
    #[sea_orm(string_value = "closed")]
    Closed,
}

display_and_parse!(ContactStatus, "status");

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[sea_orm(string_value = "low")]
    Low,
    #[default]
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
}

display_and_parse!(Priority, "priority");
