#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use crate::database::entity::{post, user};
    use crate::database::postgres_repo::{PostgresPostRepository, PostgresUserRepository};
    use blog_core::domain::Post;
    use blog_core::error::RepoError;
    use blog_core::ports::{BaseRepository, PostRepository, UserRepository};

    fn post_model(author_id: Uuid, title: &str, minutes_ago: i64) -> post::Model {
        let at = Utc::now() - TimeDelta::minutes(minutes_ago);
        post::Model {
            id: Uuid::new_v4(),
            author_id,
            title: title.to_owned(),
            text: "Content".to_owned(),
            published_at: at.into(),
            updated_at: at.into(),
        }
    }

    #[tokio::test]
    async fn test_find_post_by_id() {
        let author_id = Uuid::new_v4();
        let model = post_model(author_id, "Test Post", 0);
        let post_id = model.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model]])
            .into_connection();

        let repo = PostgresPostRepository::new(db);

        let post: Post = repo.find_by_id(post_id).await.unwrap().unwrap();

        assert_eq!(post.title, "Test Post");
        assert_eq!(post.id, post_id);
        assert_eq!(post.author_id, author_id);
    }

    #[tokio::test]
    async fn test_find_recent_orders_by_published_at_desc() {
        let author_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![
                post_model(author_id, "newer", 1),
                post_model(author_id, "older", 10),
            ]])
            .into_connection();

        let repo = PostgresPostRepository::new(db);
        let posts = repo.find_recent().await.unwrap();
        assert_eq!(posts.len(), 2);

        let sql = format!("{:?}", repo.db.into_transaction_log()[0]);
        assert!(sql.contains("ORDER BY"));
        assert!(sql.contains("published_at"));
        assert!(sql.contains("DESC"));
    }

    #[tokio::test]
    async fn test_find_by_author_filters_on_author_id() {
        let author_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![post_model(author_id, "mine", 1)]])
            .into_connection();

        let repo = PostgresPostRepository::new(db);
        let posts = repo.find_by_author(author_id).await.unwrap();
        assert_eq!(posts[0].title, "mine");

        let sql = format!("{:?}", repo.db.into_transaction_log()[0]);
        assert!(sql.contains("author_id"));
        assert!(sql.contains("DESC"));
    }

    #[tokio::test]
    async fn test_insert_post_returns_stored_row() {
        let author_id = Uuid::new_v4();
        let model = post_model(author_id, "Fresh", 0);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model.clone()]])
            .into_connection();

        let repo = PostgresPostRepository::new(db);
        let saved = repo.insert(Post::from(model.clone())).await.unwrap();

        assert_eq!(saved.id, model.id);
        assert_eq!(saved.title, "Fresh");
    }

    #[tokio::test]
    async fn test_delete_missing_post_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let repo = PostgresPostRepository::new(db);

        assert!(matches!(
            BaseRepository::<Post, Uuid>::delete(&repo, Uuid::new_v4()).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_find_user_by_email() {
        let now = Utc::now();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![user::Model {
                id: Uuid::new_v4(),
                email: "writer@example.com".to_owned(),
                password_hash: "$argon2id$stub".to_owned(),
                created_at: now.into(),
                updated_at: now.into(),
            }]])
            .into_connection();

        let repo = PostgresUserRepository::new(db);
        let user = repo.find_by_email("writer@example.com").await.unwrap();

        assert_eq!(user.map(|u| u.email).as_deref(), Some("writer@example.com"));
    }
}
