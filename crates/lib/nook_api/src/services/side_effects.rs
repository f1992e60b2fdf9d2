//! Secondary writes that follow a primary write: user and post counters,
//! notifications.
//!
//! These run inline after the primary write has committed. A failure is
//! logged and swallowed; it never fails the request.

use nook_core::counters::{self, UserCounter};
use nook_core::models::social::{NewNotification, NotificationKind};
use nook_core::notifications;
use nook_core::posts::{self, PostCounter};
use nook_core::store::UserStore;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

pub async fn bump_user(pool: &PgPool, user_id: i64, counter: UserCounter, delta: i64) {
    if let Err(e) = counters::adjust(pool, user_id, counter, delta).await {
        warn!(user_id, ?counter, delta, error = %e, "user counter update failed");
    }
}

pub async fn bump_post(docs: &PgPool, post_id: &Uuid, counter: PostCounter, delta: i64) {
    if let Err(e) = posts::adjust_counter(docs, post_id, counter, delta).await {
        warn!(%post_id, ?counter, delta, error = %e, "post counter update failed");
    }
}

/// Display name used in notification messages.
pub async fn actor_name(users: &dyn UserStore, user_id: i64) -> String {
    match users.find_by_id(user_id).await {
        Ok(user) => user.display_name,
        Err(e) => {
            warn!(user_id, error = %e, "actor lookup failed");
            "Someone".to_string()
        }
    }
}

/// What a notification points at.
#[derive(Debug, Clone)]
pub struct Target {
    pub id: String,
    pub kind: &'static str,
    pub preview_image_url: Option<String>,
}

impl Target {
    pub fn post(id: &Uuid, preview_image_url: Option<String>) -> Self {
        Self {
            id: id.to_string(),
            kind: "post",
            preview_image_url,
        }
    }

    pub fn story(id: &Uuid) -> Self {
        Self {
            id: id.to_string(),
            kind: "story",
            preview_image_url: None,
        }
    }

    pub fn user(id: i64) -> Self {
        Self {
            id: id.to_string(),
            kind: "user",
            preview_image_url: None,
        }
    }
}

/// Notify `recipient_id` about something `actor_id` did. Acting on your own
/// content produces no notification.
pub async fn notify(
    pool: &PgPool,
    kind: NotificationKind,
    actor_id: i64,
    recipient_id: i64,
    target: Target,
    message: String,
) {
    if actor_id == recipient_id {
        return;
    }
    let new = NewNotification {
        kind,
        actor_id,
        recipient_id,
        target_id: Some(target.id),
        target_type: Some(target.kind),
        preview_image_url: target.preview_image_url,
        message,
    };
    if let Err(e) = notifications::create(pool, &new).await {
        warn!(actor_id, recipient_id, kind = kind.as_str(), error = %e, "notification insert failed");
    }
}

#[cfg(test)]
mod tests {
    use nook_core::models::auth::NewUser;
    use nook_core::store::memory::MemoryUserStore;

    use super::*;

    #[tokio::test]
    async fn actor_name_falls_back_for_missing_users() {
        let store = MemoryUserStore::new();
        let ann = store
            .create(NewUser::local("ann1", "Ann", "ann@x.com", "h".into()))
            .await
            .unwrap();
        assert_eq!(actor_name(&store, ann.id).await, "Ann");
        assert_eq!(actor_name(&store, 404).await, "Someone");
    }

    #[test]
    fn targets_render_ids_as_text() {
        let id = uuid::Uuid::now_v7();
        let t = Target::post(&id, Some("https://img.example/p.png".into()));
        assert_eq!(t.id, id.to_string());
        assert_eq!(t.kind, "post");
        assert_eq!(Target::user(7).id, "7");
        assert_eq!(Target::story(&id).kind, "story");
    }
}
