use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Id = i64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct User {
    pub id: Id,
    pub name: String,
    pub email: String,
    // Absent for accounts created through an OAuth login
    pub password: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Category {
    pub id: Id,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Bill {
    pub id: Id,
    pub name: String,
    pub value: i64,
    pub category_id: Id,
    pub owner_id: Id,
    pub payment_destination: String,
    pub bill_status: PaymentStatus,
    pub expire_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// One user's portion of a bill, with its own payment state.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct UserBill {
    pub id: Id,
    pub bill_id: Id,
    pub user_id: Id,
    pub value: i64,
    pub payment_status: PaymentStatus,
}

/// Directed friend-request edge. `user_id` sent the request, `friend_id`
/// received it; the symmetric friends list is derived at read time from
/// ACCEPTED edges in both directions.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Friendship {
    pub id: Id,
    pub user_id: Id,
    pub friend_id: Id,
    pub request_status: RequestStatus,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Session {
    pub id: Id,
    pub user_id: Id,
    pub token: String,
}

/// Fields of a bill known before it gets an id.
#[derive(Clone, Debug)]
pub struct BillDraft {
    pub name: String,
    pub value: i64,
    pub category_id: Id,
    pub owner_id: Id,
    pub payment_destination: String,
    pub bill_status: PaymentStatus,
    pub expire_date: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Wire types: request bodies and response projections (camelCase JSON).
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Id,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewParticipant {
    pub user_id: Id,
    pub value: i64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBill {
    pub name: String,
    pub value: i64,
    pub category_id: Id,
    pub payment_destination: String,
    pub bill_status: PaymentStatus,
    pub expire_date: DateTime<Utc>,
    pub users_bill: Vec<NewParticipant>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBill {
    pub id: Id,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillSummary {
    pub id: Id,
    pub name: String,
    pub value: i64,
    pub created_at: DateTime<Utc>,
    pub category: String,
    pub participants: usize,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillParticipant {
    pub id: Id,
    pub name: String,
    pub value: i64,
    pub payment_status: PaymentStatus,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillDetail {
    pub id: Id,
    pub name: String,
    pub value: i64,
    pub category: String,
    pub owner_id: Id,
    pub payment_destination: String,
    pub bill_status: PaymentStatus,
    pub expire_date: DateTime<Utc>,
    pub users_bill: Vec<BillParticipant>,
}

/// Read-side aggregate of a user's paid/pending totals across bills.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    pub paid_bills_count: usize,
    pub pending_bills_count: usize,
    pub total_paid_value: i64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody {
    pub friend_id: Id,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondBody {
    pub friend_request_id: Id,
    pub request_status: RequestStatus,
}

/// Counterparty of a friend-request edge, tagged with the edge's id.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendEntry {
    pub friend_request_id: Id,
    pub id: Id,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestUpdate {
    pub id: Id,
    pub request_status: RequestStatus,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpBody {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInBody {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OauthBody {
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReply {
    pub user: UserProfile,
    pub token: String,
}
