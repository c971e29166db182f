use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::errors::{Result, ServiceError};
use crate::schemas::{
    Bill, BillDraft, Category, Friendship, Id, PaymentStatus, RequestStatus, Session, User,
    UserBill,
};

use super::Store;

/// In-memory backend. Used by the engine tests; a single mutex stands in for
/// the transactional guarantees the Mongo backend gets from client sessions.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    next_id: Id,
    users: Vec<User>,
    sessions: Vec<Session>,
    categories: Vec<Category>,
    bills: Vec<Bill>,
    user_bills: Vec<UserBill>,
    friendships: Vec<Friendship>,
}

impl State {
    fn next_id(&mut self) -> Id {
        self.next_id += 1;
        self.next_id
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: Option<String>,
    ) -> Result<User> {
        let mut state = self.state.lock().unwrap();
        let user = User {
            id: state.next_id(),
            name: name.to_string(),
            email: email.to_string(),
            password,
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Id) -> Result<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_users_by_ids(&self, ids: &[Id]) -> Result<Vec<User>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn search_users_by_email(&self, fragment: &str) -> Result<Vec<User>> {
        let state = self.state.lock().unwrap();
        let needle = fragment.to_lowercase();
        Ok(state
            .users
            .iter()
            .filter(|u| u.email.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn create_session(&self, user_id: Id, token: &str) -> Result<Session> {
        let mut state = self.state.lock().unwrap();
        let session = Session {
            id: state.next_id(),
            user_id,
            token: token.to_string(),
        };
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn find_session_by_token(&self, token: &str) -> Result<Option<Session>> {
        let state = self.state.lock().unwrap();
        Ok(state.sessions.iter().find(|s| s.token == token).cloned())
    }

    async fn find_category_by_id(&self, id: Id) -> Result<Option<Category>> {
        let state = self.state.lock().unwrap();
        Ok(state.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let state = self.state.lock().unwrap();
        Ok(state.categories.clone())
    }

    async fn seed_categories(&self, names: &[&str]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.categories.is_empty() {
            return Ok(());
        }
        for name in names {
            let id = state.next_id();
            state.categories.push(Category {
                id,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    async fn create_bill_with_shares(
        &self,
        draft: BillDraft,
        shares: &[(Id, i64)],
    ) -> Result<Bill> {
        let mut state = self.state.lock().unwrap();
        let bill = Bill {
            id: state.next_id(),
            name: draft.name,
            value: draft.value,
            category_id: draft.category_id,
            owner_id: draft.owner_id,
            payment_destination: draft.payment_destination,
            bill_status: draft.bill_status,
            expire_date: draft.expire_date,
            created_at: Utc::now(),
        };
        state.bills.push(bill.clone());
        for &(user_id, value) in shares {
            let id = state.next_id();
            state.user_bills.push(UserBill {
                id,
                bill_id: bill.id,
                user_id,
                value,
                payment_status: bill.bill_status,
            });
        }
        Ok(bill)
    }

    async fn find_bill_by_id(&self, id: Id) -> Result<Option<Bill>> {
        let state = self.state.lock().unwrap();
        Ok(state.bills.iter().find(|b| b.id == id).cloned())
    }

    async fn find_user_bill(&self, user_id: Id, bill_id: Id) -> Result<Option<UserBill>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .user_bills
            .iter()
            .find(|ub| ub.user_id == user_id && ub.bill_id == bill_id)
            .cloned())
    }

    async fn list_shares_of_bill(&self, bill_id: Id) -> Result<Vec<UserBill>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .user_bills
            .iter()
            .filter(|ub| ub.bill_id == bill_id)
            .cloned()
            .collect())
    }

    async fn list_shares_of_user(&self, user_id: Id) -> Result<Vec<UserBill>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .user_bills
            .iter()
            .filter(|ub| ub.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn set_share_paid(&self, share_id: Id) -> Result<UserBill> {
        let mut state = self.state.lock().unwrap();
        let share = state
            .user_bills
            .iter_mut()
            .find(|ub| ub.id == share_id)
            .ok_or_else(|| ServiceError::not_found("user bill not found"))?;
        share.payment_status = PaymentStatus::Paid;
        Ok(share.clone())
    }

    async fn set_bill_status(&self, bill_id: Id, status: PaymentStatus) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(bill) = state.bills.iter_mut().find(|b| b.id == bill_id) {
            bill.bill_status = status;
        }
        Ok(())
    }

    async fn delete_bill_with_shares(&self, bill_id: Id) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.user_bills.retain(|ub| ub.bill_id != bill_id);
        state.bills.retain(|b| b.id != bill_id);
        Ok(())
    }

    async fn create_friendship(&self, user_id: Id, friend_id: Id) -> Result<Friendship> {
        let mut state = self.state.lock().unwrap();
        let edge = Friendship {
            id: state.next_id(),
            user_id,
            friend_id,
            request_status: RequestStatus::Pending,
        };
        state.friendships.push(edge.clone());
        Ok(edge)
    }

    async fn find_friendship_by_id(&self, id: Id) -> Result<Option<Friendship>> {
        let state = self.state.lock().unwrap();
        Ok(state.friendships.iter().find(|f| f.id == id).cloned())
    }

    async fn find_friendship_between(
        &self,
        user_id: Id,
        friend_id: Id,
    ) -> Result<Option<Friendship>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .friendships
            .iter()
            .find(|f| f.user_id == user_id && f.friend_id == friend_id)
            .cloned())
    }

    async fn list_pending_received(&self, user_id: Id) -> Result<Vec<Friendship>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .friendships
            .iter()
            .filter(|f| f.friend_id == user_id && f.request_status == RequestStatus::Pending)
            .cloned()
            .collect())
    }

    async fn list_pending_sent(&self, user_id: Id) -> Result<Vec<Friendship>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .friendships
            .iter()
            .filter(|f| f.user_id == user_id && f.request_status == RequestStatus::Pending)
            .cloned()
            .collect())
    }

    async fn list_accepted_involving(&self, user_id: Id) -> Result<Vec<Friendship>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .friendships
            .iter()
            .filter(|f| {
                f.request_status == RequestStatus::Accepted
                    && (f.user_id == user_id || f.friend_id == user_id)
            })
            .cloned()
            .collect())
    }

    async fn set_friendship_status(&self, id: Id, status: RequestStatus) -> Result<Friendship> {
        let mut state = self.state.lock().unwrap();
        let edge = state
            .friendships
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| ServiceError::not_found("friend request not found"))?;
        edge.request_status = status;
        Ok(edge.clone())
    }

    async fn delete_friendship(&self, id: Id) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.friendships.retain(|f| f.id != id);
        Ok(())
    }
}
