use uuid::Uuid;

use crate::{
    db::{CatalogStore, LikeStore},
    error::{AppError, AppResult},
    models::{Content, Liker},
};

/// Flips membership of `content_id` in the liker's set and returns the new set
///
/// The content is not checked for existence.
pub async fn toggle(store: &dyn LikeStore, liker: Liker, content_id: Uuid) -> AppResult<Vec<Uuid>> {
    let mut likes = store
        .load_likes(liker)
        .await?
        .ok_or_else(|| AppError::NotFound("Liker not found".to_string()))?;

    let liked = toggle_in(&mut likes, content_id);
    store.save_likes(liker, &likes).await?;

    tracing::debug!(liker = ?liker, content_id = %content_id, liked, "Toggled like");

    Ok(likes)
}

/// Removes `id` when present, appends it otherwise; returns whether it is now present
pub fn toggle_in(likes: &mut Vec<Uuid>, id: Uuid) -> bool {
    match likes.iter().position(|l| *l == id) {
        Some(index) => {
            likes.remove(index);
            false
        }
        None => {
            likes.push(id);
            true
        }
    }
}

pub async fn is_liked(store: &dyn LikeStore, liker: Liker, content_id: Uuid) -> AppResult<bool> {
    Ok(store
        .load_likes(liker)
        .await?
        .is_some_and(|likes| likes.contains(&content_id)))
}

/// The liker's likes resolved to catalog entries, in like order
pub async fn liked_content(
    likes: &dyn LikeStore,
    catalog: &dyn CatalogStore,
    liker: Liker,
) -> AppResult<Vec<Content>> {
    let ids = likes.load_likes(liker).await?.unwrap_or_default();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut contents = catalog.get_contents(&ids).await?;
    contents.sort_by_key(|c| ids.iter().position(|id| *id == c.id));
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::MockLikeStore;
    use crate::db::{MemoryStore, ProfileStore, UserStore};
    use crate::models::{ContentInput, Profile, User};

    #[test]
    fn test_toggle_in_adds_then_removes() {
        let mut likes = Vec::new();
        let id = Uuid::new_v4();
        assert!(toggle_in(&mut likes, id));
        assert_eq!(likes, vec![id]);
        assert!(!toggle_in(&mut likes, id));
        assert!(likes.is_empty());
    }

    #[tokio::test]
    async fn test_profile_and_user_likes_are_separate() {
        let store = MemoryStore::new();
        let user = User::new("noa".into(), "noa@example.com".into(), "s$h".into());
        let profile = Profile::new("Kids".into(), user.id);
        store.insert_user(&user).await.unwrap();
        store.insert_profile(&profile).await.unwrap();

        let content = Uuid::new_v4();
        let profile_likes = toggle(&store, Liker::Profile(profile.id), content)
            .await
            .unwrap();
        assert_eq!(profile_likes, vec![content]);

        assert!(is_liked(&store, Liker::Profile(profile.id), content).await.unwrap());
        assert!(!is_liked(&store, Liker::User(user.id), content).await.unwrap());

        let user_likes = toggle(&store, Liker::User(user.id), content).await.unwrap();
        assert_eq!(user_likes, vec![content]);

        let profile_likes = toggle(&store, Liker::Profile(profile.id), content)
            .await
            .unwrap();
        assert!(profile_likes.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_liker_is_not_found() {
        let mut store = MockLikeStore::new();
        store.expect_load_likes().returning(|_| Ok(None));
        store.expect_save_likes().never();

        let result = toggle(&store, Liker::Profile(Uuid::new_v4()), Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_liked_content_skips_missing_entries() {
        let store = MemoryStore::new();
        let user = User::new("eli".into(), "eli@example.com".into(), "s$h".into());
        let profile = Profile::new("Main".into(), user.id);
        store.insert_profile(&profile).await.unwrap();

        let first = Content::new(ContentInput {
            title: "Arrival".into(),
            ..Default::default()
        });
        let second = Content::new(ContentInput {
            title: "Sicario".into(),
            ..Default::default()
        });
        store.insert_content(&first).await.unwrap();
        store.insert_content(&second).await.unwrap();

        let liker = Liker::Profile(profile.id);
        toggle(&store, liker, second.id).await.unwrap();
        toggle(&store, liker, Uuid::new_v4()).await.unwrap();
        toggle(&store, liker, first.id).await.unwrap();

        let liked = liked_content(&store, &store, liker).await.unwrap();
        let titles: Vec<&str> = liked.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Sicario", "Arrival"]);
    }
}
