use async_trait::async_trait;
use tokio::sync::RwLock;

use super::repo::UserStore;
use super::repo_types::{parse_id, NewUser, StoreError, UserDocument, UserFields};

/// Process-local store with the same semantics as the MongoDB one.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<UserDocument>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create_user(&self, user: NewUser) -> Result<UserDocument, StoreError> {
        let user = user.into_document();
        self.users.write().await.push(user.clone());
        Ok(user)
    }

    async fn find_users(&self, filter: &UserFields) -> Result<Vec<UserDocument>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().filter(|u| filter_matches(filter, u)).cloned().collect())
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<UserDocument>, StoreError> {
        let id = parse_id(id)?;
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn update_user(
        &self,
        id: &str,
        updates: &UserFields,
    ) -> Result<Option<UserDocument>, StoreError> {
        let id = parse_id(id)?;
        let mut users = self.users.write().await;
        Ok(users.iter_mut().find(|u| u.id == id).map(|user| {
            apply(updates, user);
            user.clone()
        }))
    }

    async fn delete_users(&self, filter: &UserFields) -> Result<u64, StoreError> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| !filter_matches(filter, u));
        Ok((before - users.len()) as u64)
    }

    async fn delete_user_by_id(&self, id: &str) -> Result<Option<UserDocument>, StoreError> {
        let id = parse_id(id)?;
        let mut users = self.users.write().await;
        let Some(idx) = users.iter().position(|u| u.id == id) else {
            return Ok(None);
        };
        Ok(Some(users.remove(idx)))
    }
}

/// Exact match on every present field; an empty filter matches everything.
fn filter_matches(filter: &UserFields, user: &UserDocument) -> bool {
    filter.name.as_ref().map_or(true, |name| *name == user.name)
        && filter.age.map_or(true, |age| age == user.age)
        && filter.email.as_ref().map_or(true, |email| *email == user.email)
        && filter
            .phone_number
            .map_or(true, |phone| user.phone_number == Some(phone))
}

fn apply(updates: &UserFields, user: &mut UserDocument) {
    if let Some(name) = &updates.name {
        user.name = name.clone();
    }
    if let Some(age) = updates.age {
        user.age = age;
    }
    if let Some(email) = &updates.email {
        user.email = email.clone();
    }
    if let Some(phone_number) = updates.phone_number {
        user.phone_number = Some(phone_number);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    fn new_user(name: &str, age: f64) -> NewUser {
        NewUser {
            name: name.into(),
            age,
            email: format!("{}@example.com", name.to_lowercase()),
            phone_number: None,
        }
    }

    fn by_name(name: &str) -> UserFields {
        UserFields {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_then_find_by_id() {
        let store = InMemoryUserStore::new();
        let created = store.create_user(new_user("Ada", 36.0)).await.unwrap();
        let found = store
            .find_user_by_id(&created.id.to_hex())
            .await
            .unwrap()
            .expect("user should exist");
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn find_users_filters_exactly() {
        let store = InMemoryUserStore::new();
        store.create_user(new_user("Ada", 36.0)).await.unwrap();
        store.create_user(new_user("Ada", 40.0)).await.unwrap();
        store.create_user(new_user("Bob", 36.0)).await.unwrap();

        assert_eq!(store.find_users(&UserFields::default()).await.unwrap().len(), 3);
        assert_eq!(store.find_users(&by_name("Ada")).await.unwrap().len(), 2);

        let filter = UserFields {
            name: Some("Ada".into()),
            age: Some(40.0),
            ..Default::default()
        };
        let found = store.find_users(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].age, 40.0);

        assert!(store.find_users(&by_name("Nobody")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_id_is_none_and_malformed_id_is_error() {
        let store = InMemoryUserStore::new();
        let missing = ObjectId::new().to_hex();
        assert!(store.find_user_by_id(&missing).await.unwrap().is_none());
        assert!(store
            .update_user(&missing, &by_name("X"))
            .await
            .unwrap()
            .is_none());
        assert!(store.delete_user_by_id(&missing).await.unwrap().is_none());
        assert!(matches!(
            store.find_user_by_id("not-an-id").await,
            Err(StoreError::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn update_is_partial() {
        let store = InMemoryUserStore::new();
        let created = store.create_user(new_user("Ada", 36.0)).await.unwrap();
        let updates = UserFields {
            age: Some(31.0),
            ..Default::default()
        };
        let updated = store
            .update_user(&created.id.to_hex(), &updates)
            .await
            .unwrap()
            .expect("user should exist");
        assert_eq!(updated.age, 31.0);
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.email, created.email);

        let unchanged = store
            .update_user(&created.id.to_hex(), &UserFields::default())
            .await
            .unwrap()
            .expect("user should exist");
        assert_eq!(unchanged, updated);
    }

    #[tokio::test]
    async fn delete_users_counts_and_empty_filter_clears_everything() {
        let store = InMemoryUserStore::new();
        store.create_user(new_user("X", 1.0)).await.unwrap();
        store.create_user(new_user("X", 2.0)).await.unwrap();
        store.create_user(new_user("Y", 3.0)).await.unwrap();

        assert_eq!(store.delete_users(&by_name("X")).await.unwrap(), 2);
        assert_eq!(store.delete_users(&by_name("X")).await.unwrap(), 0);
        assert_eq!(store.delete_users(&UserFields::default()).await.unwrap(), 1);
        assert!(store.find_users(&UserFields::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_by_id_returns_removed_document_once() {
        let store = InMemoryUserStore::new();
        let created = store.create_user(new_user("Ada", 36.0)).await.unwrap();
        let id = created.id.to_hex();
        assert_eq!(store.delete_user_by_id(&id).await.unwrap(), Some(created));
        assert_eq!(store.delete_user_by_id(&id).await.unwrap(), None);
    }
}
