//! Response enrichment: attach author summaries and the viewer's relation
//! (liked, saved, seen) to rows loaded from the stores.

use std::collections::{HashMap, HashSet};

use nook_core::models::auth::UserSummary;
use nook_core::models::content::{Post, Story};
use nook_core::models::social::{Comment, Notification};
use nook_core::store::UserStore;
use nook_core::{likes, saved_posts, stories};
use uuid::Uuid;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{CommentView, GroupedViews, NotificationView, PostView, StoryView};

/// Summaries for the given user ids. Unknown ids are simply absent.
pub async fn summaries(
    users: &dyn UserStore,
    ids: impl IntoIterator<Item = i64>,
) -> AppResult<HashMap<i64, UserSummary>> {
    let mut ids: Vec<i64> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let found = users.find_many(&ids).await?;
    Ok(found.into_iter().map(|u| (u.id, u.summary())).collect())
}

pub async fn post_views(
    state: &AppState,
    viewer: Option<i64>,
    posts: Vec<Post>,
) -> AppResult<Vec<PostView>> {
    let authors = summaries(state.users.as_ref(), posts.iter().map(|p| p.user_id)).await?;
    let ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
    let (liked, saved) = match viewer {
        Some(uid) => (
            likes::liked_post_ids(&state.pool, uid, &ids).await?,
            saved_posts::saved_post_ids(&state.pool, uid, &ids).await?,
        ),
        None => (HashSet::new(), HashSet::new()),
    };

    Ok(posts
        .into_iter()
        .map(|post| PostView {
            author: authors.get(&post.user_id).cloned(),
            is_liked: liked.contains(&post.id),
            is_saved: saved.contains(&post.id),
            post,
        })
        .collect())
}

pub async fn post_view(state: &AppState, viewer: Option<i64>, post: Post) -> AppResult<PostView> {
    post_views(state, viewer, vec![post])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("post view lost during enrichment".into()))
}

pub async fn comment_views(
    state: &AppState,
    viewer: Option<i64>,
    comments: Vec<Comment>,
) -> AppResult<Vec<CommentView>> {
    let authors = summaries(state.users.as_ref(), comments.iter().map(|c| c.user_id)).await?;
    let ids: Vec<i64> = comments.iter().map(|c| c.id).collect();
    let counts = likes::comment_like_counts(&state.pool, &ids).await?;
    let liked = match viewer {
        Some(uid) => likes::liked_comment_ids(&state.pool, uid, &ids).await?,
        None => HashSet::new(),
    };

    Ok(comments
        .into_iter()
        .map(|c| CommentView {
            id: c.id,
            post_id: c.post_id,
            author: authors.get(&c.user_id).cloned(),
            content: c.content,
            likes_count: counts.get(&c.id).copied().unwrap_or(0),
            is_liked: liked.contains(&c.id),
            replies_count: 0,
            parent_id: None,
            created_at: c.created_at,
            updated_at: c.updated_at,
        })
        .collect())
}

/// Story views for `viewer`. Anonymous viewers see every story as unseen.
pub async fn story_views(
    state: &AppState,
    viewer: Option<i64>,
    rows: Vec<Story>,
) -> AppResult<Vec<StoryView>> {
    let authors = summaries(state.users.as_ref(), rows.iter().map(|s| s.user_id)).await?;
    let ids: Vec<Uuid> = rows.iter().map(|s| s.id).collect();
    let seen = match viewer {
        Some(uid) => stories::seen_story_ids(&state.pool, uid, &ids).await?,
        None => HashSet::new(),
    };

    Ok(rows
        .into_iter()
        .map(|s| StoryView {
            id: s.id,
            author: authors.get(&s.user_id).cloned(),
            has_unseen_items: !seen.contains(&s.id),
            items: s.items,
            expires_at: s.expires_at,
        })
        .collect())
}

pub async fn notification_views(
    state: &AppState,
    notifications: Vec<Notification>,
) -> AppResult<Vec<NotificationView>> {
    let actors = summaries(state.users.as_ref(), notifications.iter().map(|n| n.actor_id)).await?;
    Ok(attach_actors(&actors, notifications))
}

pub async fn grouped_views(
    state: &AppState,
    grouped: nook_core::models::social::GroupedNotifications,
) -> AppResult<GroupedViews> {
    let ids = grouped
        .today
        .iter()
        .chain(&grouped.yesterday)
        .chain(&grouped.this_week)
        .chain(&grouped.older)
        .map(|n| n.actor_id)
        .collect::<Vec<_>>();
    let actors = summaries(state.users.as_ref(), ids).await?;
    Ok(GroupedViews {
        today: attach_actors(&actors, grouped.today),
        yesterday: attach_actors(&actors, grouped.yesterday),
        this_week: attach_actors(&actors, grouped.this_week),
        older: attach_actors(&actors, grouped.older),
    })
}

fn attach_actors(
    actors: &HashMap<i64, UserSummary>,
    notifications: Vec<Notification>,
) -> Vec<NotificationView> {
    notifications
        .into_iter()
        .map(|n| NotificationView {
            actor: actors.get(&n.actor_id).cloned(),
            notification: n,
        })
        .collect()
}
