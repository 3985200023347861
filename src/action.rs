use tracing::debug;

use crate::feed::{Author, Feed, IdGenerator, PostId, UuidGenerator};

/// Everything a user can do to the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Like(PostId),
    Retweet(PostId),
    ToggleReplies(PostId),
    Submit(String),
    Remove(PostId),
    AddReply(PostId, String),
}

/// What the page has to do after an action was applied, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Render,
    ToggleReplies(PostId),
    ClearComposer,
    FocusComposer,
}

pub struct Reducer {
    author: Author,
    ids: Box<dyn IdGenerator>,
}

impl Reducer {
    pub fn new(author: Author, ids: Box<dyn IdGenerator>) -> Self {
        Self { author, ids }
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn reduce(&mut self, feed: &mut Feed, action: Action) -> Vec<Effect> {
        match action {
            Action::Like(id) => rendered(feed.toggle_like(&id), "like", &id),
            Action::Retweet(id) => rendered(feed.toggle_retweet(&id), "retweet", &id),
            Action::ToggleReplies(id) => vec![Effect::ToggleReplies(id)],
            Action::Submit(text) => match feed.create_post(&text, &self.author, self.ids.as_mut())
            {
                Some(id) => {
                    debug!(post = %id, "created post");
                    vec![Effect::Render, Effect::ClearComposer]
                }
                None => vec![Effect::FocusComposer],
            },
            Action::Remove(id) => rendered(feed.remove_post(&id), "remove", &id),
            Action::AddReply(id, text) => {
                if feed.add_reply(&id, &text, &self.author) {
                    vec![Effect::Render, Effect::ToggleReplies(id)]
                } else {
                    debug!(post = %id, "reply target is gone");
                    Vec::new()
                }
            }
        }
    }
}

impl Default for Reducer {
    fn default() -> Self {
        Self::new(Author::default(), Box::new(UuidGenerator))
    }
}

fn rendered(found: bool, what: &str, id: &str) -> Vec<Effect> {
    if found {
        vec![Effect::Render]
    } else {
        debug!(post = %id, action = what, "ignoring action for unknown post");
        Vec::new()
    }
}
