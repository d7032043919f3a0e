mod common;

use quietfeed::follows::{FollowCounts, FollowGraph};

use common::{memory_store, seed_profile};

#[tokio::test]
async fn follow_then_unfollow_updates_counts_immediately() {
    let store = memory_store();
    let a = seed_profile(&store, "a", None).await;
    let b = seed_profile(&store, "b", None).await;
    let graph = FollowGraph::new(store.clone());

    assert!(!graph.is_following(a, b).await.unwrap());

    let state = graph.toggle(a, b).await.unwrap();
    assert!(state.following);
    assert!(graph.is_following(a, b).await.unwrap());
    assert_eq!(graph.counts(b).await.unwrap().followers, 1);
    assert_eq!(graph.counts(a).await.unwrap().following, 1);

    let state = graph.toggle(a, b).await.unwrap();
    assert!(!state.following);
    assert!(!graph.is_following(a, b).await.unwrap());
    assert_eq!(
        graph.counts(b).await.unwrap(),
        FollowCounts {
            followers: 0,
            following: 0
        }
    );
}

#[tokio::test]
async fn edges_are_directed() {
    let store = memory_store();
    let a = seed_profile(&store, "a", None).await;
    let b = seed_profile(&store, "b", None).await;
    let graph = FollowGraph::new(store.clone());

    graph.toggle(a, b).await.unwrap();
    assert!(!graph.is_following(b, a).await.unwrap());
    assert_eq!(graph.counts(a).await.unwrap().followers, 0);
}

#[tokio::test]
async fn self_follow_is_accepted() {
    let store = memory_store();
    let a = seed_profile(&store, "a", None).await;
    let graph = FollowGraph::new(store.clone());

    assert!(graph.toggle(a, a).await.unwrap().following);
    assert_eq!(
        graph.counts(a).await.unwrap(),
        FollowCounts {
            followers: 1,
            following: 1
        }
    );
}

#[tokio::test]
async fn lists_are_newest_follow_first() {
    let store = memory_store();
    let star = seed_profile(&store, "star", None).await;
    let first = seed_profile(&store, "first", None).await;
    let second = seed_profile(&store, "second", None).await;
    let graph = FollowGraph::new(store.clone());

    graph.toggle(first, star).await.unwrap();
    graph.toggle(second, star).await.unwrap();
    graph.toggle(first, second).await.unwrap();

    let followers: Vec<_> = graph
        .followers(star)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(followers, vec![second, first]);

    let following: Vec<_> = graph
        .following(first)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(following, vec![second, star]);

    let followed = graph
        .followed_among(first, &[star, second, first])
        .await
        .unwrap();
    assert!(followed.contains(&star) && followed.contains(&second));
    assert!(!followed.contains(&first));
}
