//! Cross-cutting ownership and membership checks shared by the bill and
//! friendship engines.

use crate::errors::{Result, ServiceError};
use crate::schemas::{Bill, Friendship, Id, User, UserBill};
use crate::store::Store;

/// Identifiers are opaque but must be positive; zero and negatives never
/// reference a row.
pub fn require_valid_id(id: Id) -> Result<()> {
    if id < 1 {
        return Err(ServiceError::bad_request("invalid id"));
    }
    Ok(())
}

pub async fn require_user(store: &dyn Store, id: Id) -> Result<User> {
    store
        .find_user_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("user not found"))
}

pub async fn require_bill(store: &dyn Store, id: Id) -> Result<Bill> {
    store
        .find_bill_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("bill not found"))
}

pub async fn require_friendship(store: &dyn Store, id: Id) -> Result<Friendship> {
    store
        .find_friendship_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("friend request not found"))
}

/// Membership: the user holds a share on the bill. Grants read access and the
/// right to pay their own share.
pub async fn require_membership(store: &dyn Store, user_id: Id, bill_id: Id) -> Result<UserBill> {
    store
        .find_user_bill(user_id, bill_id)
        .await?
        .ok_or_else(|| ServiceError::forbidden("you are not part of this bill"))
}

/// Ownership: stricter than membership; only the creator may delete a bill.
pub fn require_ownership(bill: &Bill, user_id: Id) -> Result<()> {
    if bill.owner_id != user_id {
        return Err(ServiceError::forbidden("you are not the owner of this bill"));
    }
    Ok(())
}

/// Only the recipient of a friend request may accept or reject it.
pub fn require_recipient(edge: &Friendship, user_id: Id) -> Result<()> {
    if edge.friend_id != user_id {
        return Err(ServiceError::forbidden("no access to this request"));
    }
    Ok(())
}

/// Either side of the edge may delete it.
pub fn require_party(edge: &Friendship, user_id: Id) -> Result<()> {
    if edge.user_id != user_id && edge.friend_id != user_id {
        return Err(ServiceError::forbidden("no access to this request"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::{PaymentStatus, RequestStatus};
    use chrono::Utc;

    fn bill_owned_by(owner_id: Id) -> Bill {
        Bill {
            id: 1,
            name: "dinner".to_string(),
            value: 100,
            category_id: 1,
            owner_id,
            payment_destination: "pix".to_string(),
            bill_status: PaymentStatus::Pending,
            expire_date: Utc::now(),
            created_at: Utc::now(),
        }
    }

    fn edge(user_id: Id, friend_id: Id) -> Friendship {
        Friendship {
            id: 7,
            user_id,
            friend_id,
            request_status: RequestStatus::Pending,
        }
    }

    #[test]
    fn rejects_non_positive_ids() {
        assert!(require_valid_id(0).is_err());
        assert!(require_valid_id(-3).is_err());
        assert!(require_valid_id(1).is_ok());
    }

    #[test]
    fn ownership_is_the_creator_only() {
        let bill = bill_owned_by(5);
        assert!(require_ownership(&bill, 5).is_ok());
        assert!(matches!(
            require_ownership(&bill, 6),
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[test]
    fn only_the_recipient_may_respond() {
        let edge = edge(1, 2);
        assert!(require_recipient(&edge, 2).is_ok());
        assert!(require_recipient(&edge, 1).is_err());
        assert!(require_recipient(&edge, 3).is_err());
    }

    #[test]
    fn either_party_may_delete() {
        let edge = edge(1, 2);
        assert!(require_party(&edge, 1).is_ok());
        assert!(require_party(&edge, 2).is_ok());
        assert!(require_party(&edge, 3).is_err());
    }
}
