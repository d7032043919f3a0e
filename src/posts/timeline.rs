//! Reverse-chronological, tag-filterable post pages.
//!
//! Rows are totally ordered by `(created_at, id)` descending, and a cursor is
//! the last row's key: the next page holds only rows strictly below it. With
//! no writes between requests, walking the cursor visits every post exactly
//! once. A write landing inside an already-fetched range can still cause a
//! skip or a duplicate; the feed is pull-based and takes no snapshot.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    comments::CommentThread,
    error::{FeedError, FeedResult},
    posts::{EnrichedPost, Post},
    profiles::ProfileDirectory,
    reactions::{Reaction, ReactionLedger},
    store::{self, Entity, Filter, Order, SharedStore},
    tags::HobbyTag,
};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

pub fn clamp_page_size(requested: usize) -> usize {
    requested.clamp(1, MAX_PAGE_SIZE)
}

/// Which posts a timeline shows. Only a single tag is ever tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeedFilter {
    pub tag: Option<HobbyTag>,
    /// Restrict to one author's posts. Anonymous posts are never listed
    /// under their author.
    pub author: Option<Uuid>,
}

impl FeedFilter {
    pub fn tagged(tag: HobbyTag) -> Self {
        Self {
            tag: Some(tag),
            author: None,
        }
    }

    pub fn by_author(author: Uuid) -> Self {
        Self {
            tag: None,
            author: Some(author),
        }
    }

    fn to_filters(self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(tag) = self.tag {
            filters.push(Filter::Contains("hobby_tags", tag.id().to_string()));
        }
        if let Some(author) = self.author {
            filters.push(Filter::Eq("author_id", author.into()));
            filters.push(Filter::Eq("is_anonymous", false.into()));
        }
        filters
    }
}

/// Position after the last-seen row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl Cursor {
    pub fn of(post: &Post) -> Self {
        Self {
            created_at: post.created_at,
            id: post.id,
        }
    }
}

/// Opaque text form: `<unix micros>_<id>`.
impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.created_at.timestamp_micros(), self.id)
    }
}

impl FromStr for Cursor {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FeedError::Validation(format!("invalid cursor: {s}"));
        let (micros, id) = s.split_once('_').ok_or_else(invalid)?;
        let micros: i64 = micros.parse().map_err(|_| invalid())?;
        Ok(Cursor {
            created_at: DateTime::from_timestamp_micros(micros).ok_or_else(invalid)?,
            id: id.parse().map_err(|_| invalid())?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub posts: Vec<EnrichedPost>,
    /// Present iff the page came back full, so more rows may exist.
    pub next_cursor: Option<Cursor>,
}

/// Composes stored posts with their authors, reactions and comment totals.
#[derive(Clone)]
pub struct TimelineAssembler {
    store: SharedStore,
    ledger: ReactionLedger,
    comments: CommentThread,
    profiles: ProfileDirectory,
}

impl TimelineAssembler {
    pub fn new(store: SharedStore) -> Self {
        Self {
            ledger: ReactionLedger::new(store.clone()),
            comments: CommentThread::new(store.clone()),
            profiles: ProfileDirectory::new(store.clone()),
            store,
        }
    }

    /// One page of the timeline. Failures degrade to an empty page so the
    /// feed stays renderable.
    pub async fn get_page(
        &self,
        filter: FeedFilter,
        cursor: Option<Cursor>,
        page_size: usize,
    ) -> Page {
        match self.try_page(filter, cursor, page_size).await {
            Ok(page) => page,
            Err(e) => {
                warn!(?filter, "Timeline page unavailable: {}", e);
                Page::default()
            }
        }
    }

    async fn try_page(
        &self,
        filter: FeedFilter,
        cursor: Option<Cursor>,
        page_size: usize,
    ) -> FeedResult<Page> {
        let page_size = clamp_page_size(page_size);
        let mut filters = filter.to_filters();
        if let Some(c) = cursor {
            filters.push(Filter::Before(
                ["created_at", "id"],
                [c.created_at.into(), c.id.into()],
            ));
        }

        let rows = self
            .store
            .query(
                Entity::Posts,
                &filters,
                &[Order::desc("created_at"), Order::desc("id")],
                Some(page_size),
            )
            .await?;
        let posts: Vec<Post> = store::decode(rows)?;

        let next_cursor = if posts.len() == page_size {
            posts.last().map(Cursor::of)
        } else {
            None
        };
        Ok(Page {
            posts: self.enrich(posts).await?,
            next_cursor,
        })
    }

    /// A single post enriched like a timeline row.
    pub async fn get_post(&self, post_id: Uuid) -> FeedResult<EnrichedPost> {
        let rows = self
            .store
            .query(Entity::Posts, &[Filter::Eq("id", post_id.into())], &[], Some(1))
            .await?;
        let posts: Vec<Post> = store::decode(rows)?;
        self.enrich(posts)
            .await?
            .pop()
            .ok_or_else(|| FeedError::NotFound("Post not found".to_string()))
    }

    async fn enrich(&self, posts: Vec<Post>) -> FeedResult<Vec<EnrichedPost>> {
        let ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let mut named: Vec<Uuid> = posts
            .iter()
            .filter(|p| !p.is_anonymous)
            .map(|p| p.author_id)
            .collect();
        named.sort_unstable();
        named.dedup();

        let mut reactions: HashMap<Uuid, Vec<Reaction>> = HashMap::new();
        for r in self.ledger.for_posts(&ids).await? {
            reactions.entry(r.post_id).or_default().push(r);
        }
        let comment_counts = self.comments.counts_for(&ids).await?;
        let profiles = self.profiles.by_ids(&named).await?;

        Ok(posts
            .into_iter()
            .map(|post| EnrichedPost {
                author: if post.is_anonymous {
                    None
                } else {
                    profiles.get(&post.author_id).cloned()
                },
                reactions: reactions.remove(&post.id).unwrap_or_default(),
                comment_count: comment_counts.get(&post.id).copied().unwrap_or(0),
                post,
            })
            .collect())
    }

    /// Issue, fetch and apply the next page for `state`. Returns whether the
    /// state changed.
    pub async fn load_more(&self, state: &mut TimelineState) -> bool {
        match state.request_more() {
            Some(request) => {
                let response = self.fetch(request).await;
                state.apply(response)
            }
            None => false,
        }
    }

    /// Replace `state`'s items with a fresh first page for its filter.
    pub async fn refresh(&self, state: &mut TimelineState) -> bool {
        let request = state.request_refresh();
        let response = self.fetch(request).await;
        state.apply(response)
    }

    /// Run a request for a [`TimelineState`]. Unlike [`get_page`](Self::get_page)
    /// a failure is kept, so the state can tell it apart from an empty page.
    pub async fn fetch(&self, request: PageRequest) -> PageResponse {
        let page = self
            .try_page(request.filter, request.cursor, request.page_size)
            .await;
        if let Err(e) = &page {
            warn!(ticket = request.ticket, "Timeline fetch failed: {}", e);
        }
        PageResponse { request, page }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Refresh,
    LoadMore,
}

/// A page fetch stamped with the ticket it was issued under.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub ticket: u64,
    pub kind: RequestKind,
    pub filter: FeedFilter,
    pub cursor: Option<Cursor>,
    pub page_size: usize,
}

#[derive(Debug, Clone)]
pub struct PageResponse {
    pub request: PageRequest,
    pub page: FeedResult<Page>,
}

/// The paged list one client is looking at.
///
/// Mutated only by issuing requests, applying their responses,
/// [`remove_local`](Self::remove_local) and [`set_filter`](Self::set_filter).
/// Only the newest issued request may be applied; a response to anything
/// older is discarded, which is how a filter change or unmount supersedes an
/// in-flight fetch without aborting it.
#[derive(Debug, Clone)]
pub struct TimelineState {
    filter: FeedFilter,
    page_size: usize,
    items: Vec<EnrichedPost>,
    cursor: Option<Cursor>,
    has_more: bool,
    latest_ticket: u64,
    pending: Option<RequestKind>,
}

impl TimelineState {
    /// Empty state; call [`TimelineAssembler::refresh`] to load the first page.
    pub fn new(filter: FeedFilter, page_size: usize) -> Self {
        Self {
            filter,
            page_size: clamp_page_size(page_size),
            items: Vec::new(),
            cursor: None,
            has_more: false,
            latest_ticket: 0,
            pending: None,
        }
    }

    pub fn filter(&self) -> FeedFilter {
        self.filter
    }

    pub fn items(&self) -> &[EnrichedPost] {
        &self.items
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.cursor
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    fn issue(&mut self, kind: RequestKind, cursor: Option<Cursor>) -> PageRequest {
        self.latest_ticket += 1;
        self.pending = Some(kind);
        PageRequest {
            ticket: self.latest_ticket,
            kind,
            filter: self.filter,
            cursor,
            page_size: self.page_size,
        }
    }

    /// Next page after the last item, unless nothing more is expected or a
    /// fetch is already in flight.
    pub fn request_more(&mut self) -> Option<PageRequest> {
        if self.pending.is_some() || !self.has_more {
            return None;
        }
        Some(self.issue(RequestKind::LoadMore, self.cursor))
    }

    /// First page for the current filter. Supersedes any in-flight fetch.
    pub fn request_refresh(&mut self) -> PageRequest {
        self.issue(RequestKind::Refresh, None)
    }

    /// Switch filter: clears the list and issues its first page.
    pub fn set_filter(&mut self, filter: FeedFilter) -> PageRequest {
        self.filter = filter;
        self.items.clear();
        self.cursor = None;
        self.has_more = false;
        self.request_refresh()
    }

    /// Supersede every in-flight fetch, e.g. when the view goes away.
    pub fn cancel(&mut self) {
        self.latest_ticket += 1;
        self.pending = None;
    }

    /// Apply a fetched page. A refresh replaces the list wholesale; a
    /// load-more appends. Returns false if the response was stale or the
    /// fetch failed; a failure only ends the pending request, so the list
    /// stays as it was and the same request can be issued again.
    pub fn apply(&mut self, response: PageResponse) -> bool {
        let PageResponse { request, page } = response;
        if request.ticket != self.latest_ticket || self.pending != Some(request.kind) {
            debug!(ticket = request.ticket, latest = self.latest_ticket, "discarding stale page");
            return false;
        }

        self.pending = None;
        let Ok(page) = page else {
            return false;
        };
        self.has_more = page.next_cursor.is_some();
        match request.kind {
            RequestKind::Refresh => self.items = page.posts,
            RequestKind::LoadMore => self.items.extend(page.posts),
        }
        self.cursor = self.items.last().map(|p| Cursor::of(&p.post));
        true
    }

    /// Drop one post locally after it was deleted, without a round trip.
    pub fn remove_local(&mut self, post_id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|p| p.id() != post_id);
        self.items.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_text_form_parses_back() {
        let cursor = Cursor {
            created_at: DateTime::from_timestamp_micros(1_717_000_000_123_456).unwrap(),
            id: Uuid::new_v4(),
        };
        assert_eq!(cursor.to_string().parse::<Cursor>().unwrap(), cursor);
        assert!("garbage".parse::<Cursor>().is_err());
        assert!("12_not-a-uuid".parse::<Cursor>().is_err());
    }

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(clamp_page_size(0), 1);
        assert_eq!(clamp_page_size(20), 20);
        assert_eq!(clamp_page_size(5_000), MAX_PAGE_SIZE);
    }

    #[test]
    fn author_filter_always_hides_anonymous_posts() {
        let filters = FeedFilter::by_author(Uuid::new_v4()).to_filters();
        assert!(filters
            .iter()
            .any(|f| matches!(f, Filter::Eq("is_anonymous", crate::store::Value::Bool(false)))));
    }

    #[test]
    fn load_more_is_not_issued_twice_or_past_the_end() {
        let mut state = TimelineState::new(FeedFilter::default(), 20);
        assert!(state.request_more().is_none(), "nothing loaded yet");

        state.has_more = true;
        let first = state.request_more();
        assert!(first.is_some());
        assert!(state.request_more().is_none(), "one load-more in flight");
    }

    #[test]
    fn superseded_responses_are_discarded() {
        let mut state = TimelineState::new(FeedFilter::default(), 20);
        let old = state.request_refresh();
        let new = state.set_filter(FeedFilter::tagged(HobbyTag::Coffee));

        let stale = PageResponse {
            request: old,
            page: Ok(Page::default()),
        };
        assert!(!state.apply(stale));
        assert!(state.is_loading());

        let fresh = PageResponse {
            request: new,
            page: Ok(Page::default()),
        };
        assert!(state.apply(fresh));
        assert!(!state.is_loading());

        let after_cancel = state.request_refresh();
        state.cancel();
        assert!(!state.apply(PageResponse {
            request: after_cancel,
            page: Ok(Page::default()),
        }));
    }

    #[test]
    fn failed_fetch_ends_the_request_without_touching_the_list() {
        let mut state = TimelineState::new(FeedFilter::default(), 20);
        state.has_more = true;

        let more = state.request_more().unwrap();
        let failed = PageResponse {
            request: more,
            page: Err(FeedError::Transient("store unavailable".to_string())),
        };
        assert!(!state.apply(failed));
        assert!(!state.is_loading());
        assert!(state.has_more());
        assert!(state.request_more().is_some(), "load-more can be retried");
    }
}
