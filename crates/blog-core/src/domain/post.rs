use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity - a short text entry owned by its author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub text: String,
    pub published_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post published now.
    pub fn new(author_id: Uuid, title: String, text: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            text,
            published_at: now,
            updated_at: now,
        }
    }

    /// Whether `user_id` is the recorded author.
    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }

    /// Replace title and body in place. `published_at` is never touched.
    pub fn revise(&mut self, title: String, text: String) {
        self.title = title;
        self.text = text;
        self.updated_at = Utc::now();
    }

    /// Sort newest first by publication time.
    pub fn sort_recent_first(posts: &mut [Post]) {
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_only_author_owns_post() {
        let author = Uuid::new_v4();
        let post = Post::new(author, "Title".to_string(), "Body".to_string());

        assert!(post.is_authored_by(author));
        assert!(!post.is_authored_by(Uuid::new_v4()));
    }

    #[test]
    fn test_revise_keeps_published_at() {
        let mut post = Post::new(Uuid::new_v4(), "Old".to_string(), "Old body".to_string());
        let published = post.published_at;

        post.revise("New".to_string(), "New body".to_string());

        assert_eq!(post.title, "New");
        assert_eq!(post.text, "New body");
        assert_eq!(post.published_at, published);
        assert!(post.updated_at >= published);
    }

    #[test]
    fn test_sort_recent_first() {
        let author = Uuid::new_v4();
        let now = Utc::now();
        let mut posts: Vec<Post> = (0..3)
            .map(|i| {
                let mut post = Post::new(author, format!("Post {i}"), String::new());
                post.published_at = now - TimeDelta::minutes(10 - i);
                post
            })
            .collect();
        posts.swap(0, 2);
        posts.swap(0, 1);

        Post::sort_recent_first(&mut posts);

        let titles: Vec<&str> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Post 2", "Post 1", "Post 0"]);
    }
}
