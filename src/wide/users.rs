use chrono::Utc;

use super::table::{Condition, TableError, Write};
use super::{email_key, user_key, username_key, Item, WideStore};
use crate::repo::{NewUser, RepoError, RepoResult, Unique, User, UserChanges, UserRepository};

impl UserRepository for WideStore {
    fn insert_user(&self, new: &NewUser) -> RepoResult<User> {
        let id = WideStore::next_id(&self.user_ids);
        let now = Utc::now();
        let user = User {
            id,
            username: new.username.clone(),
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            bio: None,
            image: None,
            created_at: now,
            updated_at: now,
        };
        let writes = vec![
            Write::Put { key: email_key(&user.email), item: Item::Unique { owner: id }, condition: Condition::NotExists },
            Write::Put { key: username_key(&user.username), item: Item::Unique { owner: id }, condition: Condition::NotExists },
            Write::Put { key: user_key(id), item: Item::User(user.clone()), condition: Condition::NotExists },
        ];
        match self.table.transact(writes) {
            Ok(()) => Ok(user),
            Err(TableError::ConditionFailed(0)) => Err(RepoError::Conflict(Unique::Email)),
            Err(TableError::ConditionFailed(1)) => Err(RepoError::Conflict(Unique::Username)),
            Err(e) => Err(e.into()),
        }
    }

    fn user_by_id(&self, id: i32) -> RepoResult<User> {
        self.load_user(id)
    }

    fn user_by_email(&self, email: &str) -> RepoResult<User> {
        let owner = self.owner_of(&email_key(email)).ok_or(RepoError::NotFound("user"))?;
        self.load_user(owner)
    }

    fn user_by_username(&self, username: &str) -> RepoResult<User> {
        let owner = self.owner_of(&username_key(username)).ok_or(RepoError::NotFound("profile"))?;
        self.load_user(owner).map_err(|_| RepoError::NotFound("profile"))
    }

    fn update_user(&self, id: i32, changes: &UserChanges) -> RepoResult<User> {
        let current = self.load_user(id)?;
        let mut writes = Vec::new();
        // Which marker each write guards, so a failed condition maps back to a field.
        let mut guards = Vec::new();

        if let Some(email) = changes.email.as_ref().filter(|e| **e != current.email) {
            writes.push(Write::Put { key: email_key(email), item: Item::Unique { owner: id }, condition: Condition::NotExists });
            writes.push(Write::Delete { key: email_key(&current.email), condition: Condition::Always });
            guards.extend([Some(Unique::Email), None]);
        }
        if let Some(username) = changes.username.as_ref().filter(|u| **u != current.username) {
            writes.push(Write::Put { key: username_key(username), item: Item::Unique { owner: id }, condition: Condition::NotExists });
            writes.push(Write::Delete { key: username_key(&current.username), condition: Condition::Always });
            guards.extend([Some(Unique::Username), None]);
        }

        let changes = changes.clone();
        let now = Utc::now();
        writes.push(Write::Update {
            key: user_key(id),
            apply: Box::new(move |item: &mut Item| {
                if let Item::User(user) = item {
                    if let Some(username) = changes.username {
                        user.username = username;
                    }
                    if let Some(email) = changes.email {
                        user.email = email;
                    }
                    if let Some(hash) = changes.password_hash {
                        user.password_hash = hash;
                    }
                    if let Some(bio) = changes.bio {
                        user.bio = Some(bio);
                    }
                    if let Some(image) = changes.image {
                        user.image = Some(image);
                    }
                    user.updated_at = now;
                }
            }),
        });
        guards.push(None);

        match self.table.transact(writes) {
            Ok(()) => self.load_user(id),
            Err(TableError::ConditionFailed(at)) => match guards.get(at).copied().flatten() {
                Some(unique) => Err(RepoError::Conflict(unique)),
                None => Err(RepoError::NotFound("user")),
            },
            Err(e) => Err(e.into()),
        }
    }
}
