//! Expand account ids on records into `{id, name, email}` for display.
//!
//! A reference whose account no longer exists becomes `null`.

use std::collections::HashMap;

use models::{contact, service};
use serde_json::{json, Value};
use store::{Store, UserRef};

use crate::errors::ApiResult;

type Refs = HashMap<i32, UserRef>;

fn set_ref(obj: &mut Value, key: &str, id: Option<i32>, refs: &Refs) {
    let (Some(slot), Some(id)) = (obj.get_mut(key), id) else {
        return;
    };
    *slot = refs.get(&id).map_or(Value::Null, |r| json!(r));
}

fn service_value(s: &service::Model, refs: &Refs) -> Value {
    let mut v = json!(s);
    set_ref(&mut v, "createdBy", Some(s.created_by), refs);
    v
}

fn contact_value(c: &contact::Model, refs: &Refs) -> Value {
    let mut v = json!(c);
    set_ref(&mut v, "assignedTo", c.assigned_to, refs);
    if let Some(reply) = v.get_mut("reply") {
        set_ref(reply, "repliedBy", c.reply.as_ref().map(|r| r.replied_by), refs);
    }
    v
}

fn contact_ids(c: &contact::Model) -> impl Iterator<Item = i32> + '_ {
    c.assigned_to.into_iter().chain(c.reply.as_ref().map(|r| r.replied_by))
}

pub async fn service(store: &Store, s: &service::Model) -> ApiResult<Value> {
    let refs = store.user_refs([s.created_by]).await?;
    Ok(service_value(s, &refs))
}

pub async fn services(store: &Store, items: &[service::Model]) -> ApiResult<Vec<Value>> {
    let refs = store.user_refs(items.iter().map(|s| s.created_by).collect::<Vec<_>>()).await?;
    Ok(items.iter().map(|s| service_value(s, &refs)).collect())
}

pub async fn contact(store: &Store, c: &contact::Model) -> ApiResult<Value> {
    let refs = store.user_refs(contact_ids(c)).await?;
    Ok(contact_value(c, &refs))
}

pub async fn contacts(store: &Store, items: &[contact::Model]) -> ApiResult<Vec<Value>> {
    let refs = store.user_refs(items.iter().flat_map(contact_ids).collect::<Vec<_>>()).await?;
    Ok(items.iter().map(|c| contact_value(c, &refs)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use models::contact::Reply;
    use models::service::Features;
    use models::{Category, ContactStatus, Currency, Priority};

    fn refs() -> Refs {
        HashMap::from([(1, UserRef { id: 1, name: "Admin User".into(), email: "admin@geed.com".into() })])
    }

    fn sample_contact() -> contact::Model {
        let ts = Utc::now().into();
        contact::Model {
            id: 7,
            name: "Jo Lee".into(),
            email: "jo@x.com".into(),
            phone: None,
            subject: "Billing question here".into(),
            message: "Please clarify my invoice amount".into(),
            status: ContactStatus::Replied,
            priority: Priority::Medium,
            assigned_to: Some(42),
            reply: Some(Reply { message: "Sent a corrected invoice".into(), replied_by: 1, replied_at: ts }),
            ip_address: None,
            user_agent: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn service_creator_is_expanded() {
        let ts = Utc::now().into();
        let s = service::Model {
            id: 3,
            title: "Web Development".into(),
            description: "Custom websites and web applications".into(),
            short_description: "Modern responsive websites".into(),
            icon: service::DEFAULT_ICON.into(),
            image: None,
            category: Category::Technology,
            price: None,
            currency: Currency::USD,
            duration: None,
            features: Features::default(),
            is_active: true,
            display_order: 0,
            created_by: 1,
            created_at: ts,
            updated_at: ts,
        };
        let v = service_value(&s, &refs());
        assert_eq!(v["createdBy"], json!({ "id": 1, "name": "Admin User", "email": "admin@geed.com" }));
        assert_eq!(v["title"], "Web Development");
    }

    #[test]
    fn contact_refs_expand_and_missing_accounts_are_null() {
        let v = contact_value(&sample_contact(), &refs());
        assert_eq!(v["reply"]["repliedBy"]["name"], "Admin User");
        assert_eq!(v["reply"]["message"], "Sent a corrected invoice");
        assert_eq!(v["assignedTo"], Value::Null);
    }

    #[test]
    fn unassigned_contact_keeps_null_fields() {
        let mut c = sample_contact();
        c.assigned_to = None;
        c.reply = None;
        let v = contact_value(&c, &refs());
        assert_eq!(v["assignedTo"], Value::Null);
        assert_eq!(v["reply"], Value::Null);
        assert_eq!(contact_ids(&c).count(), 0);
    }
}
