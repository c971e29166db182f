//! Bill settlement: a bill is split into one share per participant, each
//! share is paid individually, and the bill's own status is a derived
//! aggregate that flips to PAID once no share remains PENDING.

use std::collections::{HashMap, HashSet};

use crate::errors::{Result, ServiceError};
use crate::guard;
use crate::schemas::{
    BillDetail, BillDraft, BillParticipant, BillSummary, Category, CreatedBill, Id, NewBill,
    PaymentStatus, Resume, UserBill,
};
use crate::store::Store;

/// Creates a bill and its participant shares as one atomic unit. Every
/// participant id is checked against the user table before anything is
/// written; a single unknown participant aborts the whole creation.
pub async fn create_bill(store: &dyn Store, owner_id: Id, body: NewBill) -> Result<CreatedBill> {
    store
        .find_category_by_id(body.category_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("category not found"))?;

    let participant_ids: Vec<Id> = body.users_bill.iter().map(|p| p.user_id).collect();
    let known: HashSet<Id> = store
        .find_users_by_ids(&participant_ids)
        .await?
        .into_iter()
        .map(|user| user.id)
        .collect();
    if participant_ids.iter().any(|id| !known.contains(id)) {
        return Err(ServiceError::bad_request(
            "a listed participant does not exist",
        ));
    }

    let shares: Vec<(Id, i64)> = body
        .users_bill
        .iter()
        .map(|p| (p.user_id, p.value))
        .collect();
    let draft = BillDraft {
        name: body.name,
        value: body.value,
        category_id: body.category_id,
        owner_id,
        payment_destination: body.payment_destination,
        bill_status: body.bill_status,
        expire_date: body.expire_date,
    };
    let bill = store.create_bill_with_shares(draft, &shares).await?;
    tracing::debug!(bill = bill.id, owner = owner_id, shares = shares.len(), "bill created");
    Ok(CreatedBill { id: bill.id })
}

/// Every bill the user holds a share on, projected with the parent bill's
/// headline fields, newest bill first.
pub async fn summaries(store: &dyn Store, user_id: Id) -> Result<Vec<BillSummary>> {
    let mut shares = store.list_shares_of_user(user_id).await?;
    shares.sort_by_key(|share| std::cmp::Reverse(share.bill_id));

    let mut result = Vec::with_capacity(shares.len());
    for share in shares {
        let bill = match store.find_bill_by_id(share.bill_id).await? {
            Some(bill) => bill,
            None => continue,
        };
        let category = store
            .find_category_by_id(bill.category_id)
            .await?
            .map(|c| c.name)
            .unwrap_or_default();
        let participants = store.list_shares_of_bill(bill.id).await?.len();
        result.push(BillSummary {
            id: bill.id,
            name: bill.name,
            value: bill.value,
            created_at: bill.created_at,
            category,
            participants,
        });
    }
    Ok(result)
}

/// Full projection of one bill, shares included. Requires membership, not
/// ownership.
pub async fn detail(store: &dyn Store, user_id: Id, bill_id: Id) -> Result<BillDetail> {
    guard::require_valid_id(bill_id)?;
    let bill = guard::require_bill(store, bill_id).await?;
    guard::require_membership(store, user_id, bill_id).await?;

    let mut shares = store.list_shares_of_bill(bill_id).await?;
    shares.sort_by_key(|share| share.id);
    let ids: Vec<Id> = shares.iter().map(|share| share.user_id).collect();
    let names: HashMap<Id, String> = store
        .find_users_by_ids(&ids)
        .await?
        .into_iter()
        .map(|user| (user.id, user.name))
        .collect();
    let category = store
        .find_category_by_id(bill.category_id)
        .await?
        .map(|c| c.name)
        .unwrap_or_default();

    let users_bill = shares
        .into_iter()
        .map(|share| BillParticipant {
            id: share.user_id,
            name: names.get(&share.user_id).cloned().unwrap_or_default(),
            value: share.value,
            payment_status: share.payment_status,
        })
        .collect();

    Ok(BillDetail {
        id: bill.id,
        name: bill.name,
        value: bill.value,
        category,
        owner_id: bill.owner_id,
        payment_destination: bill.payment_destination,
        bill_status: bill.bill_status,
        expire_date: bill.expire_date,
        users_bill,
    })
}

/// Removes the bill and all of its shares together. Owner only.
pub async fn delete(store: &dyn Store, user_id: Id, bill_id: Id) -> Result<()> {
    guard::require_valid_id(bill_id)?;
    let bill = guard::require_bill(store, bill_id).await?;
    guard::require_ownership(&bill, user_id)?;
    store.delete_bill_with_shares(bill_id).await?;
    tracing::debug!(bill = bill_id, "bill deleted");
    Ok(())
}

/// Marks the caller's share PAID, then re-scans the bill's shares and flips
/// the bill itself to PAID once none remain PENDING. Re-paying an
/// already-PAID share is a no-op.
pub async fn mark_paid(store: &dyn Store, user_id: Id, bill_id: Id) -> Result<UserBill> {
    guard::require_valid_id(bill_id)?;
    guard::require_bill(store, bill_id).await?;
    let share = guard::require_membership(store, user_id, bill_id).await?;
    if share.payment_status == PaymentStatus::Paid {
        return Ok(share);
    }

    let updated = store.set_share_paid(share.id).await?;
    let still_pending = store
        .list_shares_of_bill(bill_id)
        .await?
        .iter()
        .any(|s| s.payment_status == PaymentStatus::Pending);
    if !still_pending {
        store.set_bill_status(bill_id, PaymentStatus::Paid).await?;
        tracing::debug!(bill = bill_id, "all shares paid, bill settled");
    }
    Ok(updated)
}

pub async fn categories(store: &dyn Store) -> Result<Vec<Category>> {
    store.list_categories().await
}

/// Read-side aggregate over the user's shares; nothing is stored.
pub async fn resume(store: &dyn Store, user_id: Id) -> Result<Resume> {
    let shares = store.list_shares_of_user(user_id).await?;
    let mut report = Resume {
        paid_bills_count: 0,
        pending_bills_count: 0,
        total_paid_value: 0,
    };
    for share in shares {
        match share.payment_status {
            PaymentStatus::Paid => {
                report.paid_bills_count += 1;
                report.total_paid_value += share.value;
            }
            PaymentStatus::Pending => report.pending_bills_count += 1,
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::{NewParticipant, User};
    use crate::store::{MemoryStore, Store as _};
    use chrono::Utc;

    async fn user(store: &MemoryStore, name: &str) -> User {
        store
            .create_user(name, &format!("{name}@mail.com"), None)
            .await
            .unwrap()
    }

    async fn category(store: &MemoryStore) -> Id {
        store.seed_categories(&["Trip"]).await.unwrap();
        store.list_categories().await.unwrap()[0].id
    }

    fn new_bill(category_id: Id, participants: Vec<NewParticipant>) -> NewBill {
        NewBill {
            name: "dinner".to_string(),
            value: 100,
            category_id,
            payment_destination: "pix:owner".to_string(),
            bill_status: PaymentStatus::Pending,
            expire_date: Utc::now(),
            users_bill: participants,
        }
    }

    fn split(users: &[(&User, i64)]) -> Vec<NewParticipant> {
        users
            .iter()
            .map(|(user, value)| NewParticipant {
                user_id: user.id,
                value: *value,
            })
            .collect()
    }

    #[tokio::test]
    async fn creates_one_share_per_participant_with_the_initial_status() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;
        let (ana, bia) = (user(&store, "ana").await, user(&store, "bia").await);
        let category_id = category(&store).await;

        let created = create_bill(
            &store,
            owner.id,
            new_bill(category_id, split(&[(&ana, 40), (&bia, 60)])),
        )
        .await
        .unwrap();

        let shares = store.list_shares_of_bill(created.id).await.unwrap();
        assert_eq!(shares.len(), 2);
        assert!(shares
            .iter()
            .all(|s| s.payment_status == PaymentStatus::Pending));
        assert_eq!(shares.iter().map(|s| s.value).sum::<i64>(), 100);
    }

    #[tokio::test]
    async fn unknown_participant_aborts_the_whole_creation() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;
        let ana = user(&store, "ana").await;
        let category_id = category(&store).await;

        let mut participants = split(&[(&ana, 40)]);
        participants.push(NewParticipant {
            user_id: 999,
            value: 60,
        });

        let err = create_bill(&store, owner.id, new_bill(category_id, participants))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));

        // nothing was written, not even the valid participant's share
        assert!(store.list_shares_of_user(ana.id).await.unwrap().is_empty());
        assert!(summaries(&store, ana.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_category_fails_before_any_write() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;
        let ana = user(&store, "ana").await;

        let err = create_bill(&store, owner.id, new_bill(999, split(&[(&ana, 40)])))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(store.list_shares_of_user(ana.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bill_settles_only_when_the_last_share_is_paid() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;
        let (ana, bia) = (user(&store, "ana").await, user(&store, "bia").await);
        let category_id = category(&store).await;

        let created = create_bill(
            &store,
            owner.id,
            new_bill(category_id, split(&[(&ana, 40), (&bia, 60)])),
        )
        .await
        .unwrap();

        let paid = mark_paid(&store, ana.id, created.id).await.unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        let bill = store.find_bill_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(bill.bill_status, PaymentStatus::Pending);

        mark_paid(&store, bia.id, created.id).await.unwrap();
        let bill = store.find_bill_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(bill.bill_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn repaying_an_already_paid_share_is_a_no_op() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;
        let ana = user(&store, "ana").await;
        let category_id = category(&store).await;

        let created = create_bill(&store, owner.id, new_bill(category_id, split(&[(&ana, 100)])))
            .await
            .unwrap();

        let first = mark_paid(&store, ana.id, created.id).await.unwrap();
        let second = mark_paid(&store, ana.id, created.id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(second.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn paying_a_missing_bill_or_without_membership_fails() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;
        let (ana, eve) = (user(&store, "ana").await, user(&store, "eve").await);
        let category_id = category(&store).await;

        let err = mark_paid(&store, ana.id, 999).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let created = create_bill(&store, owner.id, new_bill(category_id, split(&[(&ana, 100)])))
            .await
            .unwrap();
        let err = mark_paid(&store, eve.id, created.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn detail_requires_membership_and_lists_every_participant() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;
        let (ana, bia, eve) = (
            user(&store, "ana").await,
            user(&store, "bia").await,
            user(&store, "eve").await,
        );
        let category_id = category(&store).await;

        let created = create_bill(
            &store,
            owner.id,
            new_bill(category_id, split(&[(&ana, 40), (&bia, 60)])),
        )
        .await
        .unwrap();

        let err = detail(&store, eve.id, created.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let view = detail(&store, ana.id, created.id).await.unwrap();
        assert_eq!(view.id, created.id);
        assert_eq!(view.category, "Trip");
        assert_eq!(view.users_bill.len(), 2);
        assert_eq!(view.users_bill[0].name, "ana");
        assert_eq!(view.users_bill[1].name, "bia");
    }

    #[tokio::test]
    async fn only_the_owner_deletes_and_the_shares_go_with_the_bill() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;
        let ana = user(&store, "ana").await;
        let category_id = category(&store).await;

        let created = create_bill(&store, owner.id, new_bill(category_id, split(&[(&ana, 100)])))
            .await
            .unwrap();

        // membership without ownership is not enough
        let err = delete(&store, ana.id, created.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        delete(&store, owner.id, created.id).await.unwrap();
        assert!(store.find_bill_by_id(created.id).await.unwrap().is_none());
        assert!(store
            .list_shares_of_bill(created.id)
            .await
            .unwrap()
            .is_empty());

        let err = detail(&store, ana.id, created.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn summaries_are_newest_first_with_participant_counts() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;
        let (ana, bia) = (user(&store, "ana").await, user(&store, "bia").await);
        let category_id = category(&store).await;

        let first = create_bill(
            &store,
            owner.id,
            new_bill(category_id, split(&[(&ana, 40), (&bia, 60)])),
        )
        .await
        .unwrap();
        let second = create_bill(&store, owner.id, new_bill(category_id, split(&[(&ana, 100)])))
            .await
            .unwrap();

        let list = summaries(&store, ana.id).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, second.id);
        assert_eq!(list[0].participants, 1);
        assert_eq!(list[1].id, first.id);
        assert_eq!(list[1].participants, 2);
        assert_eq!(list[1].category, "Trip");

        // bia only appears on the first bill
        let list = summaries(&store, bia.id).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, first.id);
    }

    #[tokio::test]
    async fn resume_totals_paid_values_and_counts_pending() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;
        let ana = user(&store, "ana").await;
        let category_id = category(&store).await;

        let first = create_bill(&store, owner.id, new_bill(category_id, split(&[(&ana, 40)])))
            .await
            .unwrap();
        create_bill(&store, owner.id, new_bill(category_id, split(&[(&ana, 25)])))
            .await
            .unwrap();
        let third = create_bill(&store, owner.id, new_bill(category_id, split(&[(&ana, 35)])))
            .await
            .unwrap();

        mark_paid(&store, ana.id, first.id).await.unwrap();
        mark_paid(&store, ana.id, third.id).await.unwrap();

        let report = resume(&store, ana.id).await.unwrap();
        assert_eq!(report.paid_bills_count, 2);
        assert_eq!(report.pending_bills_count, 1);
        assert_eq!(report.total_paid_value, 75);
    }

    #[tokio::test]
    async fn forty_sixty_settlement_scenario() {
        let store = MemoryStore::new();
        let owner = user(&store, "a").await;
        let (p2, p3) = (user(&store, "b").await, user(&store, "c").await);
        let category_id = category(&store).await;

        let created = create_bill(
            &store,
            owner.id,
            new_bill(category_id, split(&[(&p2, 40), (&p3, 60)])),
        )
        .await
        .unwrap();

        mark_paid(&store, p2.id, created.id).await.unwrap();
        let bill = store.find_bill_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(bill.bill_status, PaymentStatus::Pending);

        mark_paid(&store, p3.id, created.id).await.unwrap();
        let bill = store.find_bill_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(bill.bill_status, PaymentStatus::Paid);
    }
}
