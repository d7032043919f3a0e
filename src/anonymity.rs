//! Identity disclosure rules for posts and comments.
//!
//! An anonymous item renders with a fixed stand-in and nothing that could
//! identify its author. The true author id never leaves the item: it is only
//! consulted for the owner's own permission checks.

use serde::Serialize;
use uuid::Uuid;

use crate::profiles::Profile;

pub const ANONYMOUS_POST_LABEL: &str = "匿名ユーザー";
pub const ANONYMOUS_COMMENT_LABEL: &str = "匿名さん";
pub const UNKNOWN_LABEL: &str = "不明";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Post,
    Comment,
}

impl ItemKind {
    fn anonymous_label(self) -> &'static str {
        match self {
            ItemKind::Post => ANONYMOUS_POST_LABEL,
            ItemKind::Comment => ANONYMOUS_COMMENT_LABEL,
        }
    }

    fn anonymous_initials(self) -> &'static str {
        match self {
            ItemKind::Post => "?",
            ItemKind::Comment => "匿",
        }
    }
}

/// What a viewer is shown as the author of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayIdentity {
    pub name: String,
    pub initials: String,
    pub is_anonymous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_link: Option<String>,
}

/// Anything with a true author that may be hidden behind anonymity.
pub trait Authored {
    const KIND: ItemKind;

    fn author_id(&self) -> Uuid;
    fn is_anonymous(&self) -> bool;
    fn author_profile(&self) -> Option<&Profile>;

    fn display_identity(&self) -> DisplayIdentity {
        resolve(
            Self::KIND,
            self.is_anonymous(),
            self.author_id(),
            self.author_profile(),
        )
    }

    fn can_delete(&self, viewer: Option<Uuid>) -> bool {
        can_delete(self.author_id(), viewer)
    }
}

pub fn resolve(
    kind: ItemKind,
    is_anonymous: bool,
    author_id: Uuid,
    profile: Option<&Profile>,
) -> DisplayIdentity {
    if is_anonymous {
        return DisplayIdentity {
            name: kind.anonymous_label().to_string(),
            initials: kind.anonymous_initials().to_string(),
            is_anonymous: true,
            username: None,
            avatar_url: None,
            profile_link: None,
        };
    }

    let username = profile.and_then(Profile::username_if_set);
    let name = profile
        .map(Profile::display_name_or_fallback)
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string());

    DisplayIdentity {
        initials: name.chars().take(2).collect(),
        name,
        is_anonymous: false,
        username,
        avatar_url: profile.and_then(|p| p.avatar_url.clone()),
        profile_link: Some(format!("/profile/{}", author_id)),
    }
}

/// Ownership ignores anonymity: the real author may always delete.
pub fn can_delete(author_id: Uuid, viewer: Option<Uuid>) -> bool {
    viewer == Some(author_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: Uuid) -> Profile {
        Profile {
            id,
            username: Some("shizuka".to_string()),
            display_name: Some("しずか".to_string()),
            avatar_url: Some("https://cdn.example/a.png".to_string()),
            hobby_tags: vec![],
        }
    }

    #[test]
    fn anonymous_identity_carries_nothing_of_the_author() {
        let author = Uuid::new_v4();
        let p = profile(author);
        let shown = resolve(ItemKind::Post, true, author, Some(&p));

        assert_eq!(shown.name, ANONYMOUS_POST_LABEL);
        assert_eq!(shown.initials, "?");
        assert!(shown.username.is_none());
        assert!(shown.avatar_url.is_none());
        assert!(shown.profile_link.is_none());

        let json = serde_json::to_string(&shown).unwrap();
        assert!(!json.contains(&author.to_string()));
        assert!(!json.contains("shizuka"));
        assert!(!json.contains("しずか"));
        assert!(!json.contains("a.png"));
    }

    #[test]
    fn comments_use_their_own_anonymous_label() {
        let shown = resolve(ItemKind::Comment, true, Uuid::new_v4(), None);
        assert_eq!(shown.name, ANONYMOUS_COMMENT_LABEL);
        assert_eq!(shown.initials, "匿");
    }

    #[test]
    fn named_identity_falls_back_from_display_name_to_username_to_unknown() {
        let author = Uuid::new_v4();
        let mut p = profile(author);
        assert_eq!(resolve(ItemKind::Post, false, author, Some(&p)).name, "しずか");

        p.display_name = None;
        let shown = resolve(ItemKind::Post, false, author, Some(&p));
        assert_eq!(shown.name, "shizuka");
        assert_eq!(shown.initials, "sh");
        assert_eq!(shown.profile_link, Some(format!("/profile/{author}")));

        p.username = None;
        assert_eq!(
            resolve(ItemKind::Post, false, author, Some(&p)).name,
            UNKNOWN_LABEL
        );
        assert_eq!(resolve(ItemKind::Post, false, author, None).name, UNKNOWN_LABEL);
    }

    #[test]
    fn only_the_true_author_may_delete() {
        let author = Uuid::new_v4();
        assert!(can_delete(author, Some(author)));
        assert!(!can_delete(author, Some(Uuid::new_v4())));
        assert!(!can_delete(author, None));
    }
}
