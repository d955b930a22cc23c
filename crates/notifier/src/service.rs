//! Enqueue API: phone normalization, template rendering, and queue insert.
//!
//! Everything that gets delivered enters through [`NotificationService`].
//! The body is rendered here, at enqueue time, and persisted with the
//! record.

use avisa_database::{queue, Database};
use notify_core::{NotificationCategory, NotificationRecord, Subscriber};
use templates::{Fields, TemplateRenderer};
use tracing::debug;

use crate::error::{NotifyError, Result};

/// Business details substituted into every billing template.
#[derive(Debug, Clone, Default)]
pub struct BusinessProfile {
    /// Company display name.
    pub company: String,
    /// PIX key shown in payment instructions.
    pub pix_key: String,
    /// Support contact (phone or handle).
    pub contact: String,
}

/// Front door of the delivery engine.
#[derive(Debug, Clone)]
pub struct NotificationService {
    db: Database,
    renderer: TemplateRenderer,
    business: BusinessProfile,
    max_attempts: i64,
}

impl NotificationService {
    pub fn new(db: Database, renderer: TemplateRenderer, business: BusinessProfile) -> Self {
        Self {
            db,
            renderer,
            business,
            max_attempts: notify_core::DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Override the per-record attempt budget.
    pub fn with_max_attempts(mut self, max_attempts: i64) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Render and enqueue a templated notification for a subscriber.
    ///
    /// The subscriber's phone is normalized to canonical form first; a
    /// number that cannot be normalized rejects the enqueue and nothing is
    /// persisted. `dedupe_key` is set by the scanner; manual sends pass
    /// `None`.
    pub async fn enqueue_for_subscriber(
        &self,
        subscriber: &Subscriber,
        category: NotificationCategory,
        dedupe_key: Option<String>,
    ) -> Result<NotificationRecord> {
        let canonical = phone::normalize(&subscriber.phone)
            .ok_or_else(|| NotifyError::InvalidPhone(subscriber.phone.clone()))?;

        let fields = self.subscriber_fields(subscriber);
        let body = self.renderer.render(category, &fields)?;

        let mut rec = NotificationRecord::new(canonical, &subscriber.name, category, body);
        rec.max_attempts = self.max_attempts;
        if let Some(key) = dedupe_key {
            rec = rec.with_dedupe_key(key);
        }

        queue::enqueue(self.db.pool(), &rec).await?;
        debug!(
            "Enqueued {} notification {} for {}",
            category, rec.id, rec.phone
        );
        Ok(rec)
    }

    /// Enqueue an operator-triggered notification to a raw phone number.
    ///
    /// Any category works; the caller supplies the template fields directly
    /// instead of a subscriber. A category with no registered template
    /// rejects the enqueue and nothing is persisted.
    pub async fn enqueue_custom(
        &self,
        raw_phone: &str,
        name: &str,
        category: NotificationCategory,
        fields: &Fields,
    ) -> Result<NotificationRecord> {
        let canonical = phone::normalize(raw_phone)
            .ok_or_else(|| NotifyError::InvalidPhone(raw_phone.to_string()))?;

        let body = self.renderer.render(category, fields)?;

        let mut rec = NotificationRecord::new(canonical, name, category, body);
        rec.max_attempts = self.max_attempts;

        queue::enqueue(self.db.pool(), &rec).await?;
        debug!(
            "Enqueued operator {} notification {} for {}",
            category, rec.id, rec.phone
        );
        Ok(rec)
    }

    /// Enqueue a free-form message: the `custom` category's `{message}`
    /// passthrough.
    pub async fn enqueue_message(
        &self,
        raw_phone: &str,
        name: &str,
        message: &str,
    ) -> Result<NotificationRecord> {
        let mut fields = Fields::new();
        fields.insert("message".to_string(), message.to_string());
        self.enqueue_custom(raw_phone, name, NotificationCategory::Custom, &fields)
            .await
    }

    /// Template fields for a subscriber, Brazilian formatting throughout.
    fn subscriber_fields(&self, subscriber: &Subscriber) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), subscriber.name.clone());
        fields.insert(
            "due_date".to_string(),
            subscriber.due_date.format("%d/%m/%Y").to_string(),
        );
        fields.insert("server".to_string(), subscriber.server.clone());
        fields.insert("price".to_string(), format!("{:.2}", subscriber.price));
        fields.insert("package".to_string(), subscriber.package.clone());
        fields.insert("pix_key".to_string(), self.business.pix_key.clone());
        fields.insert("company".to_string(), self.business.company.clone());
        fields.insert("contact".to_string(), self.business.contact.clone());
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avisa_database::DatabaseError;
    use chrono::NaiveDate;
    use notify_core::NotificationStatus;

    async fn test_db() -> Database {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn business() -> BusinessProfile {
        BusinessProfile {
            company: "Genial TV".to_string(),
            pix_key: "chave-pix".to_string(),
            contact: "(11) 4002-8922".to_string(),
        }
    }

    fn subscriber(raw_phone: &str) -> Subscriber {
        Subscriber {
            id: 7,
            name: "Carlos".to_string(),
            phone: raw_phone.to_string(),
            package: "1 mês".to_string(),
            price: 35.0,
            server: "Prata".to_string(),
            due_date: NaiveDate::from_ymd_opt(2026, 8, 26).unwrap(),
            active: true,
        }
    }

    #[tokio::test]
    async fn enqueue_normalizes_and_renders() {
        let db = test_db().await;
        let service =
            NotificationService::new(db.clone(), TemplateRenderer::with_builtins(), business());

        let rec = service
            .enqueue_for_subscriber(
                &subscriber("11-99999-8888"),
                NotificationCategory::DueIn2Days,
                None,
            )
            .await
            .unwrap();

        assert_eq!(rec.phone, "5511999998888");
        assert!(rec.body.contains("Carlos"));
        assert!(rec.body.contains("26/08/2026"));
        assert!(rec.body.contains("35.00"));
        assert!(rec.body.contains("chave-pix"));
        assert!(!rec.body.contains("[missing"));

        let stored = queue::get(db.pool(), &rec.id).await.unwrap();
        assert_eq!(stored.status, NotificationStatus::Pending);
        assert_eq!(stored.body, rec.body);
    }

    #[tokio::test]
    async fn invalid_phone_rejects_without_persisting() {
        let db = test_db().await;
        let service =
            NotificationService::new(db.clone(), TemplateRenderer::with_builtins(), business());

        let result = service
            .enqueue_for_subscriber(&subscriber("123"), NotificationCategory::DueToday, None)
            .await;
        assert!(matches!(result, Err(NotifyError::InvalidPhone(raw)) if raw == "123"));

        let stats = queue::stats(db.pool()).await.unwrap();
        assert_eq!(stats.pending, 0);
    }

    #[tokio::test]
    async fn missing_template_rejects_without_persisting() {
        let db = test_db().await;
        let mut renderer = TemplateRenderer::with_builtins();
        renderer.remove_template(NotificationCategory::Billing);
        let service = NotificationService::new(db.clone(), renderer, business());

        let result = service
            .enqueue_custom(
                "11-99999-8888",
                "Carlos",
                NotificationCategory::Billing,
                &Fields::new(),
            )
            .await;
        assert!(matches!(
            result,
            Err(NotifyError::Template(
                templates::TemplateError::TemplateNotFound(_)
            ))
        ));

        let result = service
            .enqueue_for_subscriber(
                &subscriber("11-99999-8888"),
                NotificationCategory::Billing,
                None,
            )
            .await;
        assert!(matches!(result, Err(NotifyError::Template(_))));

        let stats = queue::stats(db.pool()).await.unwrap();
        assert_eq!(stats.pending, 0);
    }

    #[tokio::test]
    async fn operator_enqueue_renders_supplied_fields() {
        let db = test_db().await;
        let service =
            NotificationService::new(db.clone(), TemplateRenderer::with_builtins(), business());

        let mut fields = Fields::new();
        fields.insert("name".to_string(), "Ana".to_string());
        fields.insert("company".to_string(), "Genial TV".to_string());
        let rec = service
            .enqueue_custom(
                "(11) 98888-7777",
                "Ana",
                NotificationCategory::Promotional,
                &fields,
            )
            .await
            .unwrap();
        assert_eq!(rec.phone, "5511988887777");
        assert_eq!(rec.category, NotificationCategory::Promotional);
        assert!(rec.body.contains("Ana"));
        assert!(!rec.body.contains("[missing"));
    }

    #[tokio::test]
    async fn custom_message_passes_through() {
        let db = test_db().await;
        let service =
            NotificationService::new(db.clone(), TemplateRenderer::with_builtins(), business());

        let rec = service
            .enqueue_message("(11) 98888-7777", "Ana", "Oi Ana, tudo certo?")
            .await
            .unwrap();
        assert_eq!(rec.phone, "5511988887777");
        assert_eq!(rec.body, "Oi Ana, tudo certo?");
        assert_eq!(rec.category, NotificationCategory::Custom);
    }

    #[tokio::test]
    async fn dedupe_key_collision_surfaces_already_exists() {
        let db = test_db().await;
        let service =
            NotificationService::new(db.clone(), TemplateRenderer::with_builtins(), business());
        let sub = subscriber("11-99999-8888");

        service
            .enqueue_for_subscriber(&sub, NotificationCategory::DueToday, Some("k".to_string()))
            .await
            .unwrap();
        let result = service
            .enqueue_for_subscriber(&sub, NotificationCategory::DueToday, Some("k".to_string()))
            .await;
        assert!(matches!(
            result,
            Err(NotifyError::Database(DatabaseError::AlreadyExists { .. }))
        ));
    }
}
