//! In-memory repositories - used when no database is configured, and in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use blog_core::domain::{Post, User};
use blog_core::error::RepoError;
use blog_core::ports::{BaseRepository, PostRepository, UserRepository};

/// In-memory post repository. Data is lost on process restart.
#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored posts.
    pub async fn count(&self) -> usize {
        self.posts.read().await.len()
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        if posts.contains_key(&post.id) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        match posts.get_mut(&post.id) {
            Some(stored) => {
                *stored = post.clone();
                Ok(post)
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.posts
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_recent(&self) -> Result<Vec<Post>, RepoError> {
        let mut posts: Vec<Post> = self.posts.read().await.values().cloned().collect();
        Post::sort_recent_first(&mut posts);
        Ok(posts)
    }

    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, RepoError> {
        let mut posts: Vec<Post> = self
            .posts
            .read()
            .await
            .values()
            .filter(|p| p.is_authored_by(author_id))
            .cloned()
            .collect();
        Post::sort_recent_first(&mut posts);
        Ok(posts)
    }
}

/// In-memory user repository. Emails are unique, compared case-insensitively.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        let taken = users
            .values()
            .any(|u| u.id == user.id || u.email.eq_ignore_ascii_case(&user.email));
        if taken {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(user)
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};

    fn post_at(author_id: Uuid, title: &str, minutes_ago: i64) -> Post {
        let mut post = Post::new(author_id, title.to_string(), "body".to_string());
        post.published_at = Utc::now() - TimeDelta::minutes(minutes_ago);
        post
    }

    #[tokio::test]
    async fn test_find_recent_is_newest_first() {
        let repo = InMemoryPostRepository::new();
        let author = Uuid::new_v4();
        repo.insert(post_at(author, "middle", 5)).await.unwrap();
        repo.insert(post_at(author, "newest", 1)).await.unwrap();
        repo.insert(post_at(author, "oldest", 30)).await.unwrap();

        let titles: Vec<String> = repo
            .find_recent()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();

        assert_eq!(titles, vec!["newest", "middle", "oldest"]);
    }

    #[tokio::test]
    async fn test_find_by_author_filters() {
        let repo = InMemoryPostRepository::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        repo.insert(post_at(alice, "a1", 3)).await.unwrap();
        repo.insert(post_at(bob, "b1", 2)).await.unwrap();
        repo.insert(post_at(alice, "a2", 1)).await.unwrap();

        let posts = repo.find_by_author(alice).await.unwrap();

        assert_eq!(posts.len(), 2);
        assert!(posts.iter().all(|p| p.author_id == alice));
        assert_eq!(posts[0].title, "a2");
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_post() {
        let repo = InMemoryPostRepository::new();
        let post = Post::new(Uuid::new_v4(), "ghost".to_string(), String::new());

        assert!(matches!(
            repo.update(post.clone()).await,
            Err(RepoError::NotFound)
        ));
        assert!(matches!(repo.delete(post.id).await, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.insert(User::new("Writer@Example.com".to_string(), "h".to_string()))
            .await
            .unwrap();

        let result = repo
            .insert(User::new("writer@example.com".to_string(), "h".to_string()))
            .await;

        assert!(matches!(result, Err(RepoError::Constraint(_))));
        assert!(
            repo.find_by_email("WRITER@example.com")
                .await
                .unwrap()
                .is_some()
        );
    }
}
