mod common;

use quietfeed::{
    anonymity::{Authored, ANONYMOUS_COMMENT_LABEL},
    comments::CommentThread,
    error::FeedError,
    posts::{CreatePost, PostService},
};
use uuid::Uuid;

use common::{flaky_store, memory_store, seed_profile};

async fn post_by(store: &quietfeed::store::SharedStore, author: Uuid) -> Uuid {
    PostService::new(store.clone())
        .create(
            author,
            CreatePost {
                content: "温泉に行った".to_string(),
                is_anonymous: false,
                hobby_tags: vec!["onsen".to_string()],
            },
        )
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn comments_list_oldest_first() {
    let store = memory_store();
    let author = seed_profile(&store, "tanuki", Some("たぬき")).await;
    let post = post_by(&store, author).await;
    let thread = CommentThread::new(store.clone());

    for text in ["一番", "二番", "三番"] {
        thread.create(post, author, text, false).await.unwrap();
    }

    let contents: Vec<String> = thread
        .list(post)
        .await
        .into_iter()
        .map(|c| c.comment.content)
        .collect();
    assert_eq!(contents, vec!["一番", "二番", "三番"]);
}

#[tokio::test]
async fn comment_content_is_trimmed_and_bounded() {
    let store = memory_store();
    let author = seed_profile(&store, "tanuki", None).await;
    let post = post_by(&store, author).await;
    let thread = CommentThread::new(store.clone());

    let blank = thread.create(post, author, " \n ", false).await;
    assert!(matches!(blank, Err(FeedError::Validation(_))));

    let long = thread.create(post, author, &"x".repeat(501), false).await;
    assert!(matches!(long, Err(FeedError::Validation(_))));

    let ok = thread
        .create(post, author, &format!("  {}  ", "x".repeat(500)), false)
        .await
        .unwrap();
    assert_eq!(ok.comment.content.chars().count(), 500);
    assert!(thread.list(post).await.len() == 1);
}

#[tokio::test]
async fn only_the_true_author_deletes_an_anonymous_comment() {
    let store = memory_store();
    let author = seed_profile(&store, "tanuki", Some("たぬき")).await;
    let commenter = seed_profile(&store, "kitsune", Some("きつね")).await;
    let post = post_by(&store, author).await;
    let thread = CommentThread::new(store.clone());

    let comment = thread
        .create(post, commenter, "ひみつ", true)
        .await
        .unwrap();
    assert!(comment.author.is_none());

    let listed = thread.list(post).await;
    let shown = listed[0].display_identity();
    assert_eq!(shown.name, ANONYMOUS_COMMENT_LABEL);
    assert!(shown.avatar_url.is_none());
    assert!(listed[0].view(Some(commenter)).can_delete);
    assert!(!listed[0].view(Some(author)).can_delete);

    let err = thread.delete(comment.comment.id, author).await.unwrap_err();
    assert!(matches!(err, FeedError::Permission(_)));
    assert_eq!(thread.list(post).await.len(), 1);

    thread.delete(comment.comment.id, commenter).await.unwrap();
    assert!(thread.list(post).await.is_empty());

    let err = thread.delete(comment.comment.id, commenter).await.unwrap_err();
    assert!(matches!(err, FeedError::NotFound(_)));
}

#[tokio::test]
async fn named_comment_shows_profile() {
    let store = memory_store();
    let author = seed_profile(&store, "tanuki", Some("たぬき")).await;
    let post = post_by(&store, author).await;
    let thread = CommentThread::new(store.clone());

    let comment = thread.create(post, author, "どうも", false).await.unwrap();
    let shown = comment.display_identity();
    assert_eq!(shown.name, "たぬき");
    assert_eq!(shown.username.as_deref(), Some("tanuki"));
    assert_eq!(shown.profile_link, Some(format!("/profile/{author}")));
}

#[tokio::test]
async fn commenting_on_a_missing_post_is_not_found() {
    let store = memory_store();
    let author = seed_profile(&store, "tanuki", None).await;
    let thread = CommentThread::new(store.clone());

    let err = thread
        .create(Uuid::new_v4(), author, "誰かいる?", false)
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::NotFound(_)));
}

#[tokio::test]
async fn outage_empties_the_list_but_fails_writes() {
    let (flaky, store) = flaky_store();
    let author = seed_profile(&store, "tanuki", None).await;
    let post = post_by(&store, author).await;
    let thread = CommentThread::new(store.clone());
    let comment = thread.create(post, author, "残る", false).await.unwrap();

    flaky.set_down(true);
    assert!(thread.list(post).await.is_empty());

    let err = thread.create(post, author, "消える", false).await.unwrap_err();
    assert!(matches!(err, FeedError::Transient(_)));
    let err = thread.delete(comment.comment.id, author).await.unwrap_err();
    assert!(matches!(err, FeedError::Transient(_)));

    flaky.set_down(false);
    assert_eq!(thread.list(post).await.len(), 1);
}
