use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::{Client, Collection, Database};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ServiceError};
use crate::schemas::{
    Bill, BillDraft, Category, Friendship, Id, PaymentStatus, RequestStatus, Session, User,
    UserBill,
};

use super::Store;

/// MongoDB backend. Numeric ids come from a `counters` collection; the two
/// composite writes run inside a client-session transaction.
pub struct MongoStore {
    db: Database,
    client: Client,
}

#[derive(Debug, Deserialize, Serialize)]
struct Counter {
    #[serde(rename = "_id")]
    name: String,
    seq: Id,
}

fn payment_status_str(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "PENDING",
        PaymentStatus::Paid => "PAID",
    }
}

// The search fragment is matched literally, so regex metacharacters in it
// must be neutralized before building the filter.
fn escape_regex(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if ".^$*+?()[]{}|\\".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn request_status_str(status: RequestStatus) -> &'static str {
    match status {
        RequestStatus::Pending => "PENDING",
        RequestStatus::Accepted => "ACCEPTED",
        RequestStatus::Rejected => "REJECTED",
    }
}

impl MongoStore {
    pub fn new(client: Client, db_name: &str) -> Self {
        let db = client.database(db_name);
        Self { db, client }
    }

    fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    fn sessions(&self) -> Collection<Session> {
        self.db.collection("sessions")
    }

    fn categories(&self) -> Collection<Category> {
        self.db.collection("categories")
    }

    fn bills(&self) -> Collection<Bill> {
        self.db.collection("bills")
    }

    fn user_bills(&self) -> Collection<UserBill> {
        self.db.collection("user_bills")
    }

    fn friendships(&self) -> Collection<Friendship> {
        self.db.collection("friendships")
    }

    async fn next_id(&self, sequence: &str) -> Result<Id> {
        let counters: Collection<Counter> = self.db.collection("counters");
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let counter = counters
            .find_one_and_update(
                doc! { "_id": sequence },
                doc! { "$inc": { "seq": 1_i64 } },
                options,
            )
            .await?
            .ok_or_else(|| ServiceError::not_found("sequence counter missing"))?;
        Ok(counter.seq)
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: Option<String>,
    ) -> Result<User> {
        let user = User {
            id: self.next_id("users").await?,
            name: name.to_string(),
            email: email.to_string(),
            password,
            created_at: Utc::now(),
        };
        self.users().insert_one(&user, None).await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Id) -> Result<Option<User>> {
        Ok(self.users().find_one(doc! { "id": id }, None).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users().find_one(doc! { "email": email }, None).await?)
    }

    async fn find_users_by_ids(&self, ids: &[Id]) -> Result<Vec<User>> {
        let cursor = self
            .users()
            .find(doc! { "id": { "$in": ids.to_vec() } }, None)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn search_users_by_email(&self, fragment: &str) -> Result<Vec<User>> {
        let filter = doc! {
            "email": { "$regex": escape_regex(fragment), "$options": "i" },
        };
        let cursor = self.users().find(filter, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn create_session(&self, user_id: Id, token: &str) -> Result<Session> {
        let session = Session {
            id: self.next_id("sessions").await?,
            user_id,
            token: token.to_string(),
        };
        self.sessions().insert_one(&session, None).await?;
        Ok(session)
    }

    async fn find_session_by_token(&self, token: &str) -> Result<Option<Session>> {
        Ok(self
            .sessions()
            .find_one(doc! { "token": token }, None)
            .await?)
    }

    async fn find_category_by_id(&self, id: Id) -> Result<Option<Category>> {
        Ok(self.categories().find_one(doc! { "id": id }, None).await?)
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let cursor = self.categories().find(None, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn seed_categories(&self, names: &[&str]) -> Result<()> {
        if self.categories().count_documents(None, None).await? > 0 {
            return Ok(());
        }
        let mut rows = Vec::with_capacity(names.len());
        for name in names {
            rows.push(Category {
                id: self.next_id("categories").await?,
                name: name.to_string(),
            });
        }
        self.categories().insert_many(rows, None).await?;
        Ok(())
    }

    async fn create_bill_with_shares(
        &self,
        draft: BillDraft,
        shares: &[(Id, i64)],
    ) -> Result<Bill> {
        let bill = Bill {
            id: self.next_id("bills").await?,
            name: draft.name,
            value: draft.value,
            category_id: draft.category_id,
            owner_id: draft.owner_id,
            payment_destination: draft.payment_destination,
            bill_status: draft.bill_status,
            expire_date: draft.expire_date,
            created_at: Utc::now(),
        };
        let mut rows = Vec::with_capacity(shares.len());
        for &(user_id, value) in shares {
            rows.push(UserBill {
                id: self.next_id("user_bills").await?,
                bill_id: bill.id,
                user_id,
                value,
                payment_status: bill.bill_status,
            });
        }

        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;
        self.bills()
            .insert_one_with_session(&bill, None, &mut session)
            .await?;
        if !rows.is_empty() {
            self.user_bills()
                .insert_many_with_session(&rows, None, &mut session)
                .await?;
        }
        session.commit_transaction().await?;
        Ok(bill)
    }

    async fn find_bill_by_id(&self, id: Id) -> Result<Option<Bill>> {
        Ok(self.bills().find_one(doc! { "id": id }, None).await?)
    }

    async fn find_user_bill(&self, user_id: Id, bill_id: Id) -> Result<Option<UserBill>> {
        Ok(self
            .user_bills()
            .find_one(doc! { "user_id": user_id, "bill_id": bill_id }, None)
            .await?)
    }

    async fn list_shares_of_bill(&self, bill_id: Id) -> Result<Vec<UserBill>> {
        let cursor = self
            .user_bills()
            .find(doc! { "bill_id": bill_id }, None)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn list_shares_of_user(&self, user_id: Id) -> Result<Vec<UserBill>> {
        let cursor = self
            .user_bills()
            .find(doc! { "user_id": user_id }, None)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn set_share_paid(&self, share_id: Id) -> Result<UserBill> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        self.user_bills()
            .find_one_and_update(
                doc! { "id": share_id },
                doc! { "$set": { "payment_status": payment_status_str(PaymentStatus::Paid) } },
                options,
            )
            .await?
            .ok_or_else(|| ServiceError::not_found("user bill not found"))
    }

    async fn set_bill_status(&self, bill_id: Id, status: PaymentStatus) -> Result<()> {
        self.bills()
            .update_one(
                doc! { "id": bill_id },
                doc! { "$set": { "bill_status": payment_status_str(status) } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn delete_bill_with_shares(&self, bill_id: Id) -> Result<()> {
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;
        self.user_bills()
            .delete_many_with_session(doc! { "bill_id": bill_id }, None, &mut session)
            .await?;
        self.bills()
            .delete_one_with_session(doc! { "id": bill_id }, None, &mut session)
            .await?;
        session.commit_transaction().await?;
        Ok(())
    }

    async fn create_friendship(&self, user_id: Id, friend_id: Id) -> Result<Friendship> {
        let edge = Friendship {
            id: self.next_id("friendships").await?,
            user_id,
            friend_id,
            request_status: RequestStatus::Pending,
        };
        self.friendships().insert_one(&edge, None).await?;
        Ok(edge)
    }

    async fn find_friendship_by_id(&self, id: Id) -> Result<Option<Friendship>> {
        Ok(self.friendships().find_one(doc! { "id": id }, None).await?)
    }

    async fn find_friendship_between(
        &self,
        user_id: Id,
        friend_id: Id,
    ) -> Result<Option<Friendship>> {
        Ok(self
            .friendships()
            .find_one(doc! { "user_id": user_id, "friend_id": friend_id }, None)
            .await?)
    }

    async fn list_pending_received(&self, user_id: Id) -> Result<Vec<Friendship>> {
        let filter = doc! {
            "friend_id": user_id,
            "request_status": request_status_str(RequestStatus::Pending),
        };
        let cursor = self.friendships().find(filter, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn list_pending_sent(&self, user_id: Id) -> Result<Vec<Friendship>> {
        let filter = doc! {
            "user_id": user_id,
            "request_status": request_status_str(RequestStatus::Pending),
        };
        let cursor = self.friendships().find(filter, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn list_accepted_involving(&self, user_id: Id) -> Result<Vec<Friendship>> {
        let filter = doc! {
            "request_status": request_status_str(RequestStatus::Accepted),
            "$or": [ { "user_id": user_id }, { "friend_id": user_id } ],
        };
        let cursor = self.friendships().find(filter, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn set_friendship_status(&self, id: Id, status: RequestStatus) -> Result<Friendship> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        self.friendships()
            .find_one_and_update(
                doc! { "id": id },
                doc! { "$set": { "request_status": request_status_str(status) } },
                options,
            )
            .await?
            .ok_or_else(|| ServiceError::not_found("friend request not found"))
    }

    async fn delete_friendship(&self, id: Id) -> Result<()> {
        self.friendships().delete_one(doc! { "id": id }, None).await?;
        Ok(())
    }
}
