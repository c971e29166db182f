//! Email search, used by the frontend to find people to invite: a
//! case-insensitive substring match returning every matching profile.

use crate::errors::Result;
use crate::schemas::UserProfile;
use crate::store::Store;

pub async fn find_by_email(store: &dyn Store, email: &str) -> Result<Vec<UserProfile>> {
    let users = store.search_users_by_email(email).await?;
    Ok(users.iter().map(UserProfile::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Store as _};

    #[tokio::test]
    async fn matches_substrings_case_insensitively() {
        let store = MemoryStore::new();
        let ana = store
            .create_user("ana", "Ana.Silva@mail.com", None)
            .await
            .unwrap();
        let bia = store
            .create_user("bia", "bia@mail.com", None)
            .await
            .unwrap();
        store
            .create_user("carol", "carol@other.org", None)
            .await
            .unwrap();

        let found = find_by_email(&store, "MAIL.COM").await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().any(|p| p.id == ana.id));
        assert!(found.iter().any(|p| p.id == bia.id));

        let found = find_by_email(&store, "ana.silva").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, ana.id);
    }

    #[tokio::test]
    async fn no_match_yields_an_empty_list() {
        let store = MemoryStore::new();
        store
            .create_user("ana", "ana@mail.com", None)
            .await
            .unwrap();

        let found = find_by_email(&store, "ghost").await.unwrap();
        assert!(found.is_empty());
    }
}
