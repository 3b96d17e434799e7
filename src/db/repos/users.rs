use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{CreateUser, User, UserRef},
};

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Create a user. Fails with `Conflict` if the email (case-insensitive) is taken.
    async fn create(&self, input: CreateUser) -> DbResult<User>;

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<User>>;

    /// Case-insensitive email lookup.
    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRef>>;

    /// Case-insensitive lookup of many emails at once.
    ///
    /// Emails without an account are simply absent from the result.
    async fn find_by_emails(&self, emails: &[String]) -> DbResult<Vec<UserRef>>;
}
