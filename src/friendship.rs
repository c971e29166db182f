//! Friend-request lifecycle: a directed PENDING edge that the recipient
//! accepts or rejects, and the symmetric friends list derived from ACCEPTED
//! edges in both directions.

use std::collections::HashMap;

use crate::errors::{Result, ServiceError};
use crate::guard;
use crate::schemas::{FriendEntry, FriendRequestUpdate, Friendship, Id, RequestStatus};
use crate::store::Store;

/// Creates a PENDING edge from `user_id` toward `friend_id` and returns its
/// id. Duplicate detection is pair-sensitive: an existing edge in either
/// direction rejects the request.
pub async fn send_request(store: &dyn Store, user_id: Id, friend_id: Id) -> Result<Id> {
    guard::require_valid_id(friend_id)?;
    if friend_id == user_id {
        return Err(ServiceError::bad_request("you cannot befriend yourself"));
    }
    guard::require_user(store, friend_id).await?;

    let sent = store.find_friendship_between(user_id, friend_id).await?;
    let received = store.find_friendship_between(friend_id, user_id).await?;
    if sent.is_some() || received.is_some() {
        return Err(ServiceError::conflict("friend request already exists"));
    }

    let edge = store.create_friendship(user_id, friend_id).await?;
    tracing::debug!(edge = edge.id, from = user_id, to = friend_id, "friend request sent");
    Ok(edge.id)
}

/// PENDING requests addressed to `user_id`, projected as their senders.
pub async fn received_pending(store: &dyn Store, user_id: Id) -> Result<Vec<FriendEntry>> {
    let edges = store.list_pending_received(user_id).await?;
    project_counterparties(store, edges, |edge| edge.user_id).await
}

/// PENDING requests `user_id` has sent, projected as their recipients.
pub async fn sent_pending(store: &dyn Store, user_id: Id) -> Result<Vec<FriendEntry>> {
    let edges = store.list_pending_sent(user_id).await?;
    project_counterparties(store, edges, |edge| edge.friend_id).await
}

/// Accept or reject a request. Only the recipient may respond.
pub async fn respond(
    store: &dyn Store,
    user_id: Id,
    friend_request_id: Id,
    status: RequestStatus,
) -> Result<FriendRequestUpdate> {
    guard::require_valid_id(friend_request_id)?;
    if status == RequestStatus::Pending {
        return Err(ServiceError::bad_request("invalid request status"));
    }
    let edge = guard::require_friendship(store, friend_request_id).await?;
    guard::require_recipient(&edge, user_id)?;

    let updated = store.set_friendship_status(edge.id, status).await?;
    tracing::debug!(edge = updated.id, status = ?status, "friend request answered");
    Ok(FriendRequestUpdate {
        id: updated.id,
        request_status: updated.request_status,
    })
}

/// Deletes an edge in any state. Unlike `respond`, either party may do this.
pub async fn revoke(store: &dyn Store, user_id: Id, friend_request_id: Id) -> Result<()> {
    guard::require_valid_id(friend_request_id)?;
    let edge = guard::require_friendship(store, friend_request_id).await?;
    guard::require_party(&edge, user_id)?;
    store.delete_friendship(edge.id).await
}

/// Union of counterparties from ACCEPTED edges in both directions, each entry
/// carrying the id of the edge it came from.
pub async fn friends(store: &dyn Store, user_id: Id) -> Result<Vec<FriendEntry>> {
    let edges = store.list_accepted_involving(user_id).await?;
    project_counterparties(store, edges, |edge| {
        if edge.user_id == user_id {
            edge.friend_id
        } else {
            edge.user_id
        }
    })
    .await
}

async fn project_counterparties<F>(
    store: &dyn Store,
    mut edges: Vec<Friendship>,
    counterparty: F,
) -> Result<Vec<FriendEntry>>
where
    F: Fn(&Friendship) -> Id,
{
    edges.sort_by_key(|edge| edge.id);
    let ids: Vec<Id> = edges.iter().map(&counterparty).collect();
    let users = store.find_users_by_ids(&ids).await?;
    let by_id: HashMap<Id, _> = users.into_iter().map(|user| (user.id, user)).collect();

    let mut entries = Vec::with_capacity(edges.len());
    for edge in &edges {
        if let Some(user) = by_id.get(&counterparty(edge)) {
            entries.push(FriendEntry {
                friend_request_id: edge.id,
                id: user.id,
                name: user.name.clone(),
                email: user.email.clone(),
            });
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::User;
    use crate::store::{MemoryStore, Store as _};

    async fn user(store: &MemoryStore, name: &str) -> User {
        store
            .create_user(name, &format!("{name}@mail.com"), None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn rejects_self_requests() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;

        let err = send_request(&store, alice.id, alice.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
    }

    #[tokio::test]
    async fn rejects_malformed_recipient_ids() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;

        assert!(matches!(
            send_request(&store, alice.id, 0).await.unwrap_err(),
            ServiceError::BadRequest(_)
        ));
        assert!(matches!(
            send_request(&store, alice.id, -4).await.unwrap_err(),
            ServiceError::BadRequest(_)
        ));
    }

    #[tokio::test]
    async fn rejects_unknown_recipients() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;

        let err = send_request(&store, alice.id, 999).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn rejects_duplicates_in_both_directions() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;

        send_request(&store, alice.id, bob.id).await.unwrap();

        let same = send_request(&store, alice.id, bob.id).await.unwrap_err();
        assert!(matches!(same, ServiceError::Conflict(_)));

        let reversed = send_request(&store, bob.id, alice.id).await.unwrap_err();
        assert!(matches!(reversed, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn pending_projections_show_the_counterparty() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let carol = user(&store, "carol").await;

        let first = send_request(&store, alice.id, carol.id).await.unwrap();
        let second = send_request(&store, bob.id, carol.id).await.unwrap();

        let received = received_pending(&store, carol.id).await.unwrap();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].friend_request_id, first);
        assert_eq!(received[0].id, alice.id);
        assert_eq!(received[0].email, "alice@mail.com");
        assert_eq!(received[1].friend_request_id, second);
        assert_eq!(received[1].id, bob.id);

        let sent = sent_pending(&store, alice.id).await.unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].id, carol.id);
    }

    #[tokio::test]
    async fn only_the_recipient_may_respond() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let eve = user(&store, "eve").await;

        let request = send_request(&store, alice.id, bob.id).await.unwrap();

        let by_sender = respond(&store, alice.id, request, RequestStatus::Accepted)
            .await
            .unwrap_err();
        assert!(matches!(by_sender, ServiceError::Forbidden(_)));

        let by_stranger = respond(&store, eve.id, request, RequestStatus::Accepted)
            .await
            .unwrap_err();
        assert!(matches!(by_stranger, ServiceError::Forbidden(_)));

        let updated = respond(&store, bob.id, request, RequestStatus::Accepted)
            .await
            .unwrap();
        assert_eq!(updated.id, request);
        assert_eq!(updated.request_status, RequestStatus::Accepted);
    }

    #[tokio::test]
    async fn respond_rejects_pending_as_target_status() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let request = send_request(&store, alice.id, bob.id).await.unwrap();

        let err = respond(&store, bob.id, request, RequestStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
    }

    #[tokio::test]
    async fn respond_to_missing_request_is_not_found() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;

        let err = respond(&store, alice.id, 42, RequestStatus::Rejected)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn accepted_requests_appear_in_both_friends_lists() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;

        let request = send_request(&store, alice.id, bob.id).await.unwrap();
        respond(&store, bob.id, request, RequestStatus::Accepted)
            .await
            .unwrap();

        let of_alice = friends(&store, alice.id).await.unwrap();
        assert_eq!(of_alice.len(), 1);
        assert_eq!(of_alice[0].id, bob.id);
        assert_eq!(of_alice[0].friend_request_id, request);

        let of_bob = friends(&store, bob.id).await.unwrap();
        assert_eq!(of_bob.len(), 1);
        assert_eq!(of_bob[0].id, alice.id);
        assert_eq!(of_bob[0].friend_request_id, request);
    }

    #[tokio::test]
    async fn rejected_requests_do_not_become_friendships() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;

        let request = send_request(&store, alice.id, bob.id).await.unwrap();
        respond(&store, bob.id, request, RequestStatus::Rejected)
            .await
            .unwrap();

        assert!(friends(&store, alice.id).await.unwrap().is_empty());
        assert!(friends(&store, bob.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn either_party_may_revoke_but_strangers_may_not() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let eve = user(&store, "eve").await;

        let request = send_request(&store, alice.id, bob.id).await.unwrap();
        let err = revoke(&store, eve.id, request).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        revoke(&store, alice.id, request).await.unwrap();
        assert!(received_pending(&store, bob.id).await.unwrap().is_empty());

        // A revoked edge frees the pair for a new request, even reversed.
        let again = send_request(&store, bob.id, alice.id).await.unwrap();
        revoke(&store, alice.id, again).await.unwrap();
    }
}
