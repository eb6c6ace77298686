//! Post handlers: listing, detail, create, update and the two-step delete.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blog_core::DomainError;
use blog_core::domain::{ConfirmChoice, PendingDelete, Post};
use blog_core::error::RepoError;
use blog_shared::{ConfirmForm, PostForm};

use super::{CONFIRM_DELETE_PATH, INDEX_PATH, LIST_PATH, redirect};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::session::Session;
use crate::state::AppState;
use crate::views::{
    ConfirmDeletePage, DetailPage, IndexPage, ListPage, PageContext, PostFormPage, PostView,
    post_views, render,
};

const EDIT_DENIED: &str = "You don't have permission to edit this blog.";
const DELETE_DENIED: &str = "You don't have permission to delete this blog.";
const NO_PENDING_DELETE: &str = "You don't have access to this page.";

async fn load_post(state: &AppState, id: Uuid) -> AppResult<Post> {
    let post = state.posts.find_by_id(id).await?;
    post.ok_or_else(|| {
        AppError::NotFound(
            DomainError::NotFound {
                entity_type: "Post",
                id,
            }
            .to_string(),
        )
    })
}

fn ensure_author(post: &Post, identity: &Identity) -> Result<(), DomainError> {
    if post.is_authored_by(identity.user_id) {
        Ok(())
    } else {
        Err(DomainError::NotAuthor {
            post_id: post.id,
            user_id: identity.user_id,
        })
    }
}

/// Flash `message` and send a non-author back to the index.
fn deny(session: &Session, err: DomainError, message: &str) -> HttpResponse {
    tracing::warn!(error = %err, "Ownership check failed");
    session.flash_error(message);
    redirect(INDEX_PATH)
}

/// GET / - every post, newest first
pub async fn index(
    state: web::Data<AppState>,
    session: Session,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let posts = state.posts.find_recent().await?;

    render(&IndexPage {
        page: PageContext::new(identity.0.as_ref(), &session),
        posts: post_views(&posts),
    })
}

/// GET /posts/{id}
pub async fn detail(
    state: web::Data<AppState>,
    session: Session,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = load_post(&state, path.into_inner()).await?;
    let author = state
        .users
        .find_by_id(post.author_id)
        .await?
        .map(|user| user.email)
        .unwrap_or_else(|| "unknown".to_string());

    render(&DetailPage {
        is_owner: post.is_authored_by(identity.user_id),
        post: PostView::from(&post),
        author,
        page: PageContext::new(Some(&identity), &session),
    })
}

/// GET /posts - the current user's posts, newest first
pub async fn list(
    state: web::Data<AppState>,
    session: Session,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let posts = state.posts.find_by_author(identity.user_id).await?;

    render(&ListPage {
        page: PageContext::new(Some(&identity), &session),
        posts: post_views(&posts),
    })
}

/// GET /posts/new
pub async fn create_form(session: Session, identity: Identity) -> AppResult<HttpResponse> {
    render(&PostFormPage::create(PageContext::new(
        Some(&identity),
        &session,
    )))
}

/// POST /posts/new
pub async fn create(
    state: web::Data<AppState>,
    session: Session,
    identity: Identity,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();

    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => {
            return render(
                &PostFormPage::create(PageContext::new(Some(&identity), &session))
                    .with_values(&form.title, &form.text)
                    .with_errors(&errors),
            );
        }
    };

    let post = state
        .posts
        .insert(Post::new(identity.user_id, valid.title, valid.text))
        .await?;
    tracing::info!(post_id = %post.id, author_id = %identity.user_id, "Post created");

    session.flash_success("Blog created successfully.");
    Ok(redirect(LIST_PATH))
}

/// GET /posts/{id}/edit
pub async fn update_form(
    state: web::Data<AppState>,
    session: Session,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = load_post(&state, path.into_inner()).await?;
    if let Err(err) = ensure_author(&post, &identity) {
        return Ok(deny(&session, err, EDIT_DENIED));
    }

    render(
        &PostFormPage::update(
            PageContext::new(Some(&identity), &session),
            &post.id.to_string(),
        )
        .with_values(&post.title, &post.text),
    )
}

/// POST /posts/{id}/edit
///
/// Ownership is checked before the body; an unreadable body counts as an empty form.
pub async fn update(
    state: web::Data<AppState>,
    session: Session,
    identity: Identity,
    path: web::Path<Uuid>,
    form: Option<web::Form<PostForm>>,
) -> AppResult<HttpResponse> {
    let mut post = load_post(&state, path.into_inner()).await?;
    if let Err(err) = ensure_author(&post, &identity) {
        return Ok(deny(&session, err, EDIT_DENIED));
    }

    let form = form.map(web::Form::into_inner).unwrap_or_default();
    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => {
            return render(
                &PostFormPage::update(
                    PageContext::new(Some(&identity), &session),
                    &post.id.to_string(),
                )
                .with_values(&form.title, &form.text)
                .with_errors(&errors),
            );
        }
    };

    post.revise(valid.title, valid.text);
    let post = state.posts.update(post).await?;
    tracing::info!(post_id = %post.id, "Post updated");

    session.flash_success(format!("{} updated successfully.", post.title));
    Ok(redirect(LIST_PATH))
}

/// GET /posts/{id}/delete - stage the post for deletion and ask for confirmation
pub async fn delete(
    state: web::Data<AppState>,
    session: Session,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = load_post(&state, path.into_inner()).await?;
    if let Err(err) = ensure_author(&post, &identity) {
        return Ok(deny(&session, err, DELETE_DENIED));
    }

    session.insert(PendingDelete::SESSION_KEY, PendingDelete::for_post(&post))?;
    tracing::debug!(post_id = %post.id, "Delete staged");

    Ok(redirect(CONFIRM_DELETE_PATH))
}

/// The staged delete, if any. An unreadable entry counts as none.
fn pending_delete(session: &Session) -> Option<PendingDelete> {
    match session.get::<PendingDelete>(PendingDelete::SESSION_KEY) {
        Ok(pending) => pending,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring unreadable pending delete");
            None
        }
    }
}

fn no_pending_delete(session: &Session) -> HttpResponse {
    session.flash_error(NO_PENDING_DELETE);
    redirect(INDEX_PATH)
}

/// GET /posts/confirm-delete
pub async fn confirm_delete_page(
    session: Session,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let Some(pending) = pending_delete(&session) else {
        return Ok(no_pending_delete(&session));
    };

    render(&ConfirmDeletePage {
        page: PageContext::new(Some(&identity), &session),
        title: pending.title,
    })
}

/// POST /posts/confirm-delete - `choice=Yes` deletes, `choice=Cancel` keeps the post
pub async fn confirm_delete(
    state: web::Data<AppState>,
    session: Session,
    identity: Identity,
    form: web::Form<ConfirmForm>,
) -> AppResult<HttpResponse> {
    let Some(pending) = pending_delete(&session) else {
        return Ok(no_pending_delete(&session));
    };

    match ConfirmChoice::parse(&form.choice) {
        Some(ConfirmChoice::Yes) => {}
        Some(ConfirmChoice::Cancel) => {
            session.remove(PendingDelete::SESSION_KEY);
            session.flash_info("Deletion cancelled.");
            return Ok(redirect(LIST_PATH));
        }
        None => {
            session.flash_error("Choose Yes or Cancel.");
            return Ok(redirect(CONFIRM_DELETE_PATH));
        }
    }

    let post = match state.posts.find_by_id(pending.pk).await? {
        Some(post) => post,
        None => {
            session.remove(PendingDelete::SESSION_KEY);
            session.flash_error(format!("{} no longer exists.", pending.title));
            return Ok(redirect(LIST_PATH));
        }
    };

    if let Err(err) = ensure_author(&post, &identity) {
        session.remove(PendingDelete::SESSION_KEY);
        return Ok(deny(&session, err, DELETE_DENIED));
    }

    match state.posts.delete(post.id).await {
        Ok(()) | Err(RepoError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }
    session.remove(PendingDelete::SESSION_KEY);
    tracing::info!(post_id = %post.id, "Post deleted");

    session.flash_success(format!("{} deleted.", pending.title));
    Ok(redirect(LIST_PATH))
}
