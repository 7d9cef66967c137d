use async_trait::async_trait;
use sqlx::PgPool;

use super::{ContactStore, StoreError};
use crate::models::{Contact, NewContact};

#[derive(Clone)]
pub struct PgContactStore {
    pool: PgPool,
}

impl PgContactStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactStore for PgContactStore {
    async fn create(&self, contact: NewContact) -> Result<Contact, StoreError> {
        let contact = sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts (kind, name, email, phone, company, subject, message)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, kind, name, email, phone, company, subject, message, created_at
            "#,
        )
        .bind(contact.kind)
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.company)
        .bind(&contact.subject)
        .bind(&contact.message)
        .fetch_one(&self.pool)
        .await?;
        Ok(contact)
    }

    async fn list(&self) -> Result<Vec<Contact>, StoreError> {
        let contacts = sqlx::query_as::<_, Contact>(
            r#"
            SELECT id, kind, name, email, phone, company, subject, message, created_at
            FROM contacts
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(contacts)
    }
}
