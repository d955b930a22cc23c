//! Subscriber queries.
//!
//! Subscribers are billing records owned by the surrounding bot layer. The
//! delivery core reads them through [`SqliteSubscriberStore`]; the write
//! operations here exist for the bot layer and for operator tooling.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use notify_core::{Subscriber, SubscriberStore};
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{format_date, format_timestamp, SubscriberRow};

/// Fields for a new subscriber. The id is assigned on insert.
#[derive(Debug, Clone)]
pub struct NewSubscriber {
    pub name: String,
    /// Canonical phone, `55` + national number.
    pub phone: String,
    pub package: String,
    pub price: f64,
    pub server: String,
    pub due_date: NaiveDate,
}

/// Insert a subscriber. The phone is unique; a duplicate maps to
/// `AlreadyExists`.
pub async fn create(pool: &SqlitePool, new: &NewSubscriber) -> Result<Subscriber> {
    let result = sqlx::query(
        r#"
        INSERT INTO subscribers (name, phone, package, price, server, due_date, active, created_at)
        VALUES (?, ?, ?, ?, ?, ?, 1, ?)
        "#,
    )
    .bind(&new.name)
    .bind(&new.phone)
    .bind(&new.package)
    .bind(new.price)
    .bind(&new.server)
    .bind(format_date(new.due_date))
    .bind(format_timestamp(Utc::now()))
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Subscriber",
                    id: new.phone.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(Subscriber {
        id: result.last_insert_rowid(),
        name: new.name.clone(),
        phone: new.phone.clone(),
        package: new.package.clone(),
        price: new.price,
        server: new.server.clone(),
        due_date: new.due_date,
        active: true,
    })
}

/// Look a subscriber up by canonical phone.
pub async fn get_by_phone(pool: &SqlitePool, phone: &str) -> Result<Subscriber> {
    let row = sqlx::query_as::<_, SubscriberRow>(
        r#"
        SELECT id, name, phone, package, price, server, due_date, active
        FROM subscribers
        WHERE phone = ?
        "#,
    )
    .bind(phone)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Subscriber",
        id: phone.to_string(),
    })?;

    row.into_subscriber()
}

/// All active subscribers, ordered by due date.
pub async fn list_active(pool: &SqlitePool) -> Result<Vec<Subscriber>> {
    let rows = sqlx::query_as::<_, SubscriberRow>(
        r#"
        SELECT id, name, phone, package, price, server, due_date, active
        FROM subscribers
        WHERE active = 1
        ORDER BY due_date ASC, id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(SubscriberRow::into_subscriber).collect()
}

/// Activate or deactivate a subscriber. Inactive subscribers are skipped by
/// the due-date scanner.
pub async fn set_active(pool: &SqlitePool, id: i64, active: bool) -> Result<()> {
    let result = sqlx::query("UPDATE subscribers SET active = ? WHERE id = ?")
        .bind(active as i64)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Subscriber",
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Move a subscriber's due date, e.g. after a renewal payment.
pub async fn update_due_date(pool: &SqlitePool, id: i64, due_date: NaiveDate) -> Result<()> {
    let result = sqlx::query("UPDATE subscribers SET due_date = ? WHERE id = ?")
        .bind(format_date(due_date))
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Subscriber",
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Active subscribers whose due date is exactly `date`.
pub async fn list_due_on(pool: &SqlitePool, date: NaiveDate) -> Result<Vec<Subscriber>> {
    let rows = sqlx::query_as::<_, SubscriberRow>(
        r#"
        SELECT id, name, phone, package, price, server, due_date, active
        FROM subscribers
        WHERE active = 1 AND due_date = ?
        ORDER BY id ASC
        "#,
    )
    .bind(format_date(date))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(SubscriberRow::into_subscriber).collect()
}

/// [`SubscriberStore`] backed by the `subscribers` table. This is the handle
/// the due-date scanner holds.
#[derive(Debug, Clone)]
pub struct SqliteSubscriberStore {
    pool: SqlitePool,
}

impl SqliteSubscriberStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriberStore for SqliteSubscriberStore {
    async fn list_due_in_days(
        &self,
        today: NaiveDate,
        days: i64,
    ) -> std::result::Result<Vec<Subscriber>, Box<dyn std::error::Error + Send + Sync>> {
        let date = today + Duration::days(days);
        Ok(list_due_on(&self.pool, date).await?)
    }

    async fn list_overdue_by_days(
        &self,
        today: NaiveDate,
        days: i64,
    ) -> std::result::Result<Vec<Subscriber>, Box<dyn std::error::Error + Send + Sync>> {
        let date = today - Duration::days(days);
        Ok(list_due_on(&self.pool, date).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn test_db() -> Database {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn new_subscriber(phone: &str, due_date: NaiveDate) -> NewSubscriber {
        NewSubscriber {
            name: "Carlos".to_string(),
            phone: phone.to_string(),
            package: "1 mês".to_string(),
            price: 35.0,
            server: "Prata".to_string(),
            due_date,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn create_and_fetch_round_trip() {
        let db = test_db().await;
        let created = create(
            db.pool(),
            &new_subscriber("5511999998888", date(2026, 8, 26)),
        )
        .await
        .unwrap();
        assert!(created.id > 0);
        assert!(created.active);

        let fetched = get_by_phone(db.pool(), "5511999998888").await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn duplicate_phone_is_rejected() {
        let db = test_db().await;
        let sub = new_subscriber("5511999998888", date(2026, 8, 26));
        create(db.pool(), &sub).await.unwrap();
        assert!(matches!(
            create(db.pool(), &sub).await,
            Err(DatabaseError::AlreadyExists { .. })
        ));
    }

    #[tokio::test]
    async fn due_date_buckets_are_exact_days() {
        let db = test_db().await;
        let today = date(2026, 8, 24);
        create(db.pool(), &new_subscriber("5511999990001", today)).await.unwrap();
        create(db.pool(), &new_subscriber("5511999990002", date(2026, 8, 26))).await.unwrap();
        create(db.pool(), &new_subscriber("5511999990003", date(2026, 8, 23))).await.unwrap();

        let store = SqliteSubscriberStore::new(db.pool().clone());

        let due_today = store.list_due_in_days(today, 0).await.unwrap();
        assert_eq!(due_today.len(), 1);
        assert_eq!(due_today[0].phone, "5511999990001");

        let due_in_2 = store.list_due_in_days(today, 2).await.unwrap();
        assert_eq!(due_in_2.len(), 1);
        assert_eq!(due_in_2[0].phone, "5511999990002");

        let overdue_1 = store.list_overdue_by_days(today, 1).await.unwrap();
        assert_eq!(overdue_1.len(), 1);
        assert_eq!(overdue_1[0].phone, "5511999990003");

        assert!(store.list_due_in_days(today, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn inactive_subscribers_are_excluded_from_buckets() {
        let db = test_db().await;
        let today = date(2026, 8, 24);
        let sub = create(db.pool(), &new_subscriber("5511999998888", today))
            .await
            .unwrap();

        set_active(db.pool(), sub.id, false).await.unwrap();

        let store = SqliteSubscriberStore::new(db.pool().clone());
        assert!(store.list_due_in_days(today, 0).await.unwrap().is_empty());
        assert!(list_active(db.pool()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_due_date_moves_the_bucket() {
        let db = test_db().await;
        let today = date(2026, 8, 24);
        let sub = create(db.pool(), &new_subscriber("5511999998888", today))
            .await
            .unwrap();

        update_due_date(db.pool(), sub.id, date(2026, 9, 24)).await.unwrap();

        let fetched = get_by_phone(db.pool(), "5511999998888").await.unwrap();
        assert_eq!(fetched.due_date, date(2026, 9, 24));

        let store = SqliteSubscriberStore::new(db.pool().clone());
        assert!(store.list_due_in_days(today, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_subscriber_is_not_found() {
        let db = test_db().await;
        assert!(matches!(
            get_by_phone(db.pool(), "5511999998888").await,
            Err(DatabaseError::NotFound { .. })
        ));
        assert!(matches!(
            set_active(db.pool(), 42, false).await,
            Err(DatabaseError::NotFound { .. })
        ));
    }
}
