//! Hobby-tagged social timeline: posts, reactions, comments and follows,
//! with per-item author anonymity.

use axum::{
    extract::FromRef,
    routing::{delete, get, post},
    Router,
};

pub mod anonymity;
pub mod auth;
pub mod comments;
pub mod config;
pub mod error;
pub mod follows;
pub mod posts;
pub mod profiles;
pub mod reactions;
pub mod response;
pub mod store;
pub mod tags;

use comments::CommentThread;
use config::settings::Settings;
use follows::FollowGraph;
use posts::{PostService, TimelineAssembler};
use profiles::ProfileDirectory;
use reactions::ReactionLedger;
use store::SharedStore;

/// Feed components, all sharing one store.
#[derive(Clone)]
pub struct AppState {
    timeline: TimelineAssembler,
    posts: PostService,
    reactions: ReactionLedger,
    comments: CommentThread,
    follows: FollowGraph,
    profiles: ProfileDirectory,
    settings: Settings,
}

impl AppState {
    pub fn new(store: SharedStore, settings: Settings) -> Self {
        Self {
            timeline: TimelineAssembler::new(store.clone()),
            posts: PostService::new(store.clone()),
            reactions: ReactionLedger::new(store.clone()),
            comments: CommentThread::new(store.clone()),
            follows: FollowGraph::new(store.clone()),
            profiles: ProfileDirectory::new(store),
            settings,
        }
    }
}

impl FromRef<AppState> for TimelineAssembler {
    fn from_ref(app_state: &AppState) -> TimelineAssembler {
        app_state.timeline.clone()
    }
}

impl FromRef<AppState> for PostService {
    fn from_ref(app_state: &AppState) -> PostService {
        app_state.posts.clone()
    }
}

impl FromRef<AppState> for ReactionLedger {
    fn from_ref(app_state: &AppState) -> ReactionLedger {
        app_state.reactions.clone()
    }
}

impl FromRef<AppState> for CommentThread {
    fn from_ref(app_state: &AppState) -> CommentThread {
        app_state.comments.clone()
    }
}

impl FromRef<AppState> for FollowGraph {
    fn from_ref(app_state: &AppState) -> FollowGraph {
        app_state.follows.clone()
    }
}

impl FromRef<AppState> for ProfileDirectory {
    fn from_ref(app_state: &AppState) -> ProfileDirectory {
        app_state.profiles.clone()
    }
}

impl FromRef<AppState> for Settings {
    fn from_ref(app_state: &AppState) -> Settings {
        app_state.settings.clone()
    }
}

pub fn app(state: AppState) -> Router {
    let post_router = Router::new()
        .route(
            "/",
            post(posts::handler::create_post).get(posts::handler::get_feed),
        )
        .route(
            "/:id",
            get(posts::handler::get_post).delete(posts::handler::delete_post),
        )
        .route(
            "/:id/reactions/:kind",
            post(reactions::handler::toggle_reaction),
        )
        .route(
            "/:id/comments",
            get(comments::handler::get_post_comments).post(comments::handler::create_comment),
        );

    let user_router = Router::new()
        .route("/:id/posts", get(posts::handler::get_user_posts))
        .route("/:id/follow", post(follows::handler::toggle_follow))
        .route("/:id/follow-stats", get(follows::handler::get_follow_stats))
        .route("/:id/followers", get(follows::handler::get_followers))
        .route("/:id/following", get(follows::handler::get_following));

    Router::new()
        .route("/", get(|| async { "quietfeed" }))
        .nest("/api/posts", post_router)
        .nest("/api/users", user_router)
        .route("/api/comments/:id", delete(comments::handler::delete_comment))
        .route("/api/tags", get(posts::handler::get_tags))
        .route("/api/reactions", get(reactions::handler::get_reaction_types))
        .with_state(state)
}
