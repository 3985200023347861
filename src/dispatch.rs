//! Click and key handling on top of a page.
//!
//! Events carry the attributes of the element they hit. The dispatcher turns
//! them into at most one [`Action`], the reducer applies it to the feed and
//! the session carries out the returned effects on the page.

use tracing::{debug, info};

use crate::action::{Action, Effect, Reducer};
use crate::feed::{Feed, PostId};
use crate::page::Page;
use crate::render::SUBMIT_ID;

/// `data-*` attributes the feed markup tags its controls with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub like: Option<PostId>,
    pub retweet: Option<PostId>,
    pub reply: Option<PostId>,
    pub remove: Option<PostId>,
    pub new_reply: Option<PostId>,
}

/// The element an event landed on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub id: Option<String>,
    pub dataset: Dataset,
}

impl Target {
    pub fn like(post: &str) -> Self {
        Self::tagged(Dataset {
            like: Some(post.to_string()),
            ..Dataset::default()
        })
    }

    pub fn retweet(post: &str) -> Self {
        Self::tagged(Dataset {
            retweet: Some(post.to_string()),
            ..Dataset::default()
        })
    }

    pub fn reply_toggle(post: &str) -> Self {
        Self::tagged(Dataset {
            reply: Some(post.to_string()),
            ..Dataset::default()
        })
    }

    pub fn remove(post: &str) -> Self {
        Self::tagged(Dataset {
            remove: Some(post.to_string()),
            ..Dataset::default()
        })
    }

    pub fn reply_input(post: &str) -> Self {
        Self {
            id: Some(format!("reply-input-{post}")),
            dataset: Dataset {
                new_reply: Some(post.to_string()),
                ..Dataset::default()
            },
        }
    }

    pub fn submit() -> Self {
        Self {
            id: Some(SUBMIT_ID.to_string()),
            dataset: Dataset::default(),
        }
    }

    fn tagged(dataset: Dataset) -> Self {
        Self { id: None, dataset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Char(char),
    Backspace,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub shift: bool,
}

impl KeyPress {
    pub fn new(key: Key) -> Self {
        Self { key, shift: false }
    }

    pub fn shifted(key: Key) -> Self {
        Self { key, shift: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The handler consumed the key; the input must not insert it.
    PreventDefault,
    Default,
}

/// Resolves a click in fixed priority order: like, retweet, reply toggle,
/// submit, remove. The first tag present wins.
pub fn click_action(page: &Page, target: &Target) -> Option<Action> {
    let data = &target.dataset;
    if let Some(id) = &data.like {
        Some(Action::Like(id.clone()))
    } else if let Some(id) = &data.retweet {
        Some(Action::Retweet(id.clone()))
    } else if let Some(id) = &data.reply {
        Some(Action::ToggleReplies(id.clone()))
    } else if target.id.as_deref() == Some(SUBMIT_ID) {
        Some(Action::Submit(page.composer().to_string()))
    } else {
        data.remove.as_ref().map(|id| Action::Remove(id.clone()))
    }
}

/// Only reply inputs react to keys, and only to Enter without Shift.
pub fn key_action(page: &Page, target: &Target, press: KeyPress) -> Option<Action> {
    let id = target.dataset.new_reply.as_ref()?;
    if press.key != Key::Enter || press.shift {
        return None;
    }
    Some(Action::AddReply(id.clone(), page.reply_draft(id).to_string()))
}

/// Owns the feed and the page it is rendered into for one run of the app.
pub struct Session {
    feed: Feed,
    page: Page,
    reducer: Reducer,
}

impl Session {
    pub fn new(feed: Feed, reducer: Reducer) -> Self {
        let mut page = Page::new(reducer.author().clone());
        page.sync_dom(&feed);
        Self {
            feed,
            page,
            reducer,
        }
    }

    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn into_feed(self) -> Feed {
        self.feed
    }

    /// Returns whether the click resolved to an action.
    pub fn click(&mut self, target: &Target) -> bool {
        match click_action(&self.page, target) {
            Some(action) => {
                self.dispatch(action);
                true
            }
            None => false,
        }
    }

    pub fn key_down(&mut self, target: &Target, press: KeyPress) -> KeyOutcome {
        match key_action(&self.page, target, press) {
            Some(action) => {
                self.dispatch(action);
                KeyOutcome::PreventDefault
            }
            None => KeyOutcome::Default,
        }
    }

    pub fn dispatch(&mut self, action: Action) {
        debug!(?action, "dispatch");
        if let Action::ToggleReplies(id) = &action {
            if !self.feed.contains(id) {
                debug!(post = %id, "no replies region for unknown post");
                return;
            }
        }
        for effect in self.reducer.reduce(&mut self.feed, action) {
            match effect {
                Effect::Render => self.page.sync_dom(&self.feed),
                Effect::ToggleReplies(id) => self.page.toggle_replies(&id),
                Effect::ClearComposer => {
                    self.page.clear_composer();
                    info!(posts = self.feed.len(), "posted");
                }
                Effect::FocusComposer => self.page.focus_composer(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{Author, Post, SequentialIds};

    fn session(feed: Feed) -> Session {
        Session::new(
            feed,
            Reducer::new(Author::default(), Box::new(SequentialIds::default())),
        )
    }

    fn post_a() -> Post {
        Post {
            id: "a".into(),
            handle: "@a".into(),
            avatar: "a.png".into(),
            text: "first".into(),
            likes: 5,
            liked: false,
            retweets: 0,
            retweeted: false,
            replies: Vec::new(),
        }
    }

    #[test]
    fn like_wins_over_remove() {
        let mut session = session(Feed::new(vec![post_a()]));
        let target = Target {
            id: None,
            dataset: Dataset {
                like: Some("a".into()),
                remove: Some("a".into()),
                ..Dataset::default()
            },
        };
        assert!(session.click(&target));
        assert_eq!(session.feed().len(), 1);
        assert!(session.feed().get("a").unwrap().liked);
    }

    #[test]
    fn click_on_untagged_element_does_nothing() {
        let mut session = session(Feed::new(vec![post_a()]));
        assert!(!session.click(&Target::default()));
        assert_eq!(session.feed(), &Feed::new(vec![post_a()]));
    }

    #[test]
    fn like_click_rerenders() {
        let mut session = session(Feed::new(vec![post_a()]));
        session.click(&Target::like("a"));
        let post = session.feed().get("a").unwrap();
        assert_eq!((post.likes, post.liked), (6, true));
        assert!(session.page().container_html().contains("fa-heart liked"));

        session.click(&Target::like("a"));
        let post = session.feed().get("a").unwrap();
        assert_eq!((post.likes, post.liked), (5, false));
        assert!(!session.page().container_html().contains("fa-heart liked"));
    }

    #[test]
    fn submit_with_text_posts_and_clears() {
        let mut session = session(Feed::default());
        session.page_mut().set_composer("hello");
        session.click(&Target::submit());
        assert_eq!(session.feed().len(), 1);
        assert_eq!(session.feed().posts()[0].text, "hello");
        assert_eq!(session.feed().posts()[0].handle, "@Scrimba");
        assert_eq!(session.page().composer(), "");
        assert!(session.page().container_html().contains("hello"));
    }

    #[test]
    fn empty_submit_focuses_composer() {
        let mut session = session(Feed::default());
        session.click(&Target::submit());
        assert!(session.feed().is_empty());
        assert_eq!(session.page().focus(), Some(&crate::page::Focus::Composer));
    }

    #[test]
    fn reply_toggle_only_changes_visibility() {
        let mut session = session(Feed::new(vec![post_a()]));
        session.click(&Target::reply_toggle("a"));
        assert!(session.page().replies_shown("a"));
        session.click(&Target::reply_toggle("a"));
        assert!(!session.page().replies_shown("a"));
        assert_eq!(session.feed(), &Feed::new(vec![post_a()]));
    }

    #[test]
    fn enter_in_reply_input_adds_reply_and_collapses() {
        let mut session = session(Feed::new(vec![post_a()]));
        session.click(&Target::reply_toggle("a"));
        session.page_mut().set_reply_draft("a", "hi");

        let outcome = session.key_down(&Target::reply_input("a"), KeyPress::new(Key::Enter));
        assert_eq!(outcome, KeyOutcome::PreventDefault);
        let replies = &session.feed().get("a").unwrap().replies;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].text, "hi");
        assert!(!session.page().replies_shown("a"));
        assert_eq!(session.page().reply_draft("a"), "");
    }

    #[test]
    fn shift_enter_is_left_to_the_input() {
        let mut session = session(Feed::new(vec![post_a()]));
        let outcome = session.key_down(&Target::reply_input("a"), KeyPress::shifted(Key::Enter));
        assert_eq!(outcome, KeyOutcome::Default);
        let outcome = session.key_down(&Target::reply_input("a"), KeyPress::new(Key::Char('x')));
        assert_eq!(outcome, KeyOutcome::Default);
        assert!(session.feed().get("a").unwrap().replies.is_empty());
    }

    #[test]
    fn keys_outside_reply_inputs_are_ignored() {
        let mut session = session(Feed::new(vec![post_a()]));
        let outcome = session.key_down(&Target::like("a"), KeyPress::new(Key::Enter));
        assert_eq!(outcome, KeyOutcome::Default);
    }

    #[test]
    fn remove_click_drops_post() {
        let mut session = session(Feed::seed());
        let id = session.feed().posts()[0].id.clone();
        session.click(&Target::remove(&id));
        assert_eq!(session.feed().len(), 2);
        assert!(!session.feed().contains(&id));
        assert!(!session.page().container_html().contains(&id));

        session.click(&Target::remove(&id));
        assert_eq!(session.feed().len(), 2);
    }

    #[test]
    fn toggling_unknown_region_is_ignored() {
        let mut session = session(Feed::default());
        session.click(&Target::reply_toggle("gone"));
        assert!(!session.page().replies_shown("gone"));
    }
}
