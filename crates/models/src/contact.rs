use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

use crate::enums::{ContactStatus, Priority};

/// Admin reply embedded in a contact message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub message: String,
    pub replied_by: i32,
    pub replied_at: DateTimeWithTimeZone,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contacts")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub status: ContactStatus,
    pub priority: Priority,
    pub assigned_to: Option<i32>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub reply: Option<Reply>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Public acknowledgement returned to whoever submitted the form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub status: ContactStatus,
    pub created_at: DateTimeWithTimeZone,
}

impl From<&Model> for ContactSummary {
    fn from(m: &Model) -> Self {
        Self {
            id: m.id,
            name: m.name.clone(),
            email: m.email.clone(),
            subject: m.subject.clone(),
            status: m.status,
            created_at: m.created_at,
        }
    }
}
