pub mod memory;
pub mod mongo;

use async_trait::async_trait;

use crate::errors::Result;
use crate::schemas::{
    Bill, BillDraft, Category, Friendship, Id, PaymentStatus, RequestStatus, Session, User,
    UserBill,
};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Persistence surface consumed by the engines. Ids are opaque positive
/// integers assigned by the backend; composite writes (bill + shares) are
/// atomic.
#[async_trait]
pub trait Store: Send + Sync {
    // users
    async fn create_user(&self, name: &str, email: &str, password: Option<String>)
        -> Result<User>;
    async fn find_user_by_id(&self, id: Id) -> Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_users_by_ids(&self, ids: &[Id]) -> Result<Vec<User>>;
    /// Case-insensitive substring match on the email column.
    async fn search_users_by_email(&self, fragment: &str) -> Result<Vec<User>>;

    // sessions
    async fn create_session(&self, user_id: Id, token: &str) -> Result<Session>;
    async fn find_session_by_token(&self, token: &str) -> Result<Option<Session>>;

    // categories
    async fn find_category_by_id(&self, id: Id) -> Result<Option<Category>>;
    async fn list_categories(&self) -> Result<Vec<Category>>;
    /// Idempotent seeding: inserts only when the lookup table is empty.
    async fn seed_categories(&self, names: &[&str]) -> Result<()>;

    // bills and shares
    /// Inserts the bill and one share per `(user_id, value)` entry as a
    /// single atomic unit; every share starts in the bill's initial status.
    async fn create_bill_with_shares(
        &self,
        draft: BillDraft,
        shares: &[(Id, i64)],
    ) -> Result<Bill>;
    async fn find_bill_by_id(&self, id: Id) -> Result<Option<Bill>>;
    async fn find_user_bill(&self, user_id: Id, bill_id: Id) -> Result<Option<UserBill>>;
    async fn list_shares_of_bill(&self, bill_id: Id) -> Result<Vec<UserBill>>;
    async fn list_shares_of_user(&self, user_id: Id) -> Result<Vec<UserBill>>;
    async fn set_share_paid(&self, share_id: Id) -> Result<UserBill>;
    async fn set_bill_status(&self, bill_id: Id, status: PaymentStatus) -> Result<()>;
    /// Removes the bill and all of its shares in one transaction.
    async fn delete_bill_with_shares(&self, bill_id: Id) -> Result<()>;

    // friendship edges
    async fn create_friendship(&self, user_id: Id, friend_id: Id) -> Result<Friendship>;
    async fn find_friendship_by_id(&self, id: Id) -> Result<Option<Friendship>>;
    /// Exact directed pair lookup: requester `user_id` toward `friend_id`.
    async fn find_friendship_between(&self, user_id: Id, friend_id: Id)
        -> Result<Option<Friendship>>;
    async fn list_pending_received(&self, user_id: Id) -> Result<Vec<Friendship>>;
    async fn list_pending_sent(&self, user_id: Id) -> Result<Vec<Friendship>>;
    /// ACCEPTED edges where `user_id` is requester or recipient.
    async fn list_accepted_involving(&self, user_id: Id) -> Result<Vec<Friendship>>;
    async fn set_friendship_status(&self, id: Id, status: RequestStatus) -> Result<Friendship>;
    async fn delete_friendship(&self, id: Id) -> Result<()>;
}
