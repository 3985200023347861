use std::collections::{HashMap, HashSet};

use crate::feed::{Author, Feed, PostId};
use crate::render::{self, FeedView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Focus {
    Composer,
    ReplyInput(PostId),
}

/// In-memory document the feed is rendered into.
///
/// Owns everything the UI keeps outside the feed: the markup of the feed
/// container, the composer text, reply drafts, input focus and which replies
/// regions are open. None of it is persisted.
#[derive(Debug, Clone)]
pub struct Page {
    viewer: Author,
    container_html: String,
    composer: String,
    reply_drafts: HashMap<PostId, String>,
    shown_replies: HashSet<PostId>,
    focus: Option<Focus>,
}

impl Page {
    pub fn new(viewer: Author) -> Self {
        Self {
            viewer,
            container_html: String::new(),
            composer: String::new(),
            reply_drafts: HashMap::new(),
            shown_replies: HashSet::new(),
            focus: None,
        }
    }

    pub fn viewer(&self) -> &Author {
        &self.viewer
    }

    /// Replaces the container markup with a fresh render of `feed`.
    ///
    /// Reply inputs live inside the container, so their drafts go away with
    /// the old markup. Open regions stay open unless their post is gone.
    pub fn sync_dom(&mut self, feed: &Feed) {
        self.shown_replies.retain(|id| feed.contains(id));
        self.reply_drafts.clear();
        if matches!(&self.focus, Some(Focus::ReplyInput(id)) if !feed.contains(id)) {
            self.focus = None;
        }
        self.container_html = FeedView::new(feed, &self.viewer).markup(&self.shown_replies);
    }

    pub fn container_html(&self) -> &str {
        &self.container_html
    }

    pub fn document_html(&self) -> String {
        render::render_page(&self.container_html, &self.viewer, &self.composer)
    }

    pub fn composer(&self) -> &str {
        &self.composer
    }

    pub fn set_composer(&mut self, text: impl Into<String>) {
        self.composer = text.into();
    }

    pub fn composer_mut(&mut self) -> &mut String {
        &mut self.composer
    }

    pub fn clear_composer(&mut self) {
        self.composer.clear();
    }

    pub fn focus_composer(&mut self) {
        self.focus = Some(Focus::Composer);
    }

    pub fn focus_reply(&mut self, id: &str) {
        self.focus = Some(Focus::ReplyInput(id.to_string()));
    }

    pub fn blur(&mut self) {
        self.focus = None;
    }

    pub fn focus(&self) -> Option<&Focus> {
        self.focus.as_ref()
    }

    pub fn reply_draft(&self, id: &str) -> &str {
        self.reply_drafts.get(id).map(String::as_str).unwrap_or("")
    }

    pub fn reply_draft_mut(&mut self, id: &str) -> &mut String {
        self.reply_drafts.entry(id.to_string()).or_default()
    }

    pub fn set_reply_draft(&mut self, id: &str, text: impl Into<String>) {
        self.reply_drafts.insert(id.to_string(), text.into());
    }

    pub fn toggle_replies(&mut self, id: &str) {
        if !self.shown_replies.remove(id) {
            self.shown_replies.insert(id.to_string());
        }
        self.container_html = self.container_html.replacen(
            &region_open_tag(id, !self.replies_shown(id)),
            &region_open_tag(id, self.replies_shown(id)),
            1,
        );
    }

    pub fn replies_shown(&self, id: &str) -> bool {
        self.shown_replies.contains(id)
    }
}

fn region_open_tag(id: &str, shown: bool) -> String {
    let class = if shown { "" } else { "hidden" };
    format!(
        r#"<div class="{class}" id="replies-{}">"#,
        render::escape_html(id)
    )
}
