use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

pub type PostId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub handle: String,
    pub avatar: String,
}

impl Default for Author {
    fn default() -> Self {
        Self {
            handle: "@Scrimba".to_string(),
            avatar: "images/scrimbalogo.png".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub handle: String,
    #[serde(rename = "profilePic")]
    pub avatar: String,
    #[serde(rename = "tweetText")]
    pub text: String,
}

/// A top-level entry in the feed.
///
/// `liked` and `likes` move together: while `liked` is set, `likes` counts the
/// viewer once. The same holds for `retweeted` and `retweets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "uuid")]
    pub id: PostId,
    pub handle: String,
    #[serde(rename = "profilePic")]
    pub avatar: String,
    #[serde(rename = "tweetText")]
    pub text: String,
    pub likes: u64,
    #[serde(rename = "isLiked", default)]
    pub liked: bool,
    pub retweets: u64,
    #[serde(rename = "isRetweeted", default)]
    pub retweeted: bool,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

impl Post {
    pub fn new(id: PostId, text: &str, author: &Author) -> Self {
        Self {
            id,
            handle: author.handle.clone(),
            avatar: author.avatar.clone(),
            text: text.to_string(),
            likes: 0,
            liked: false,
            retweets: 0,
            retweeted: false,
            replies: Vec::new(),
        }
    }

    fn toggle_like(&mut self) {
        if self.liked {
            self.likes = self.likes.saturating_sub(1);
        } else {
            self.likes += 1;
        }
        self.liked = !self.liked;
    }

    fn toggle_retweet(&mut self) {
        if self.retweeted {
            self.retweets = self.retweets.saturating_sub(1);
        } else {
            self.retweets += 1;
        }
        self.retweeted = !self.retweeted;
    }
}

pub trait IdGenerator {
    fn next_id(&mut self) -> PostId;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&mut self) -> PostId {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Hands out `post-1`, `post-2`, ... for deterministic tests.
#[derive(Debug, Default, Clone)]
pub struct SequentialIds {
    next: u64,
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> PostId {
        self.next += 1;
        format!("post-{}", self.next)
    }
}

/// Newest-first list of posts. Every mutation that targets an id the feed no
/// longer holds is a no-op and reports `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feed {
    posts: Vec<Post>,
}

impl Feed {
    pub fn new(posts: Vec<Post>) -> Self {
        Self { posts }
    }

    pub fn seed() -> Self {
        Self::new(SEED.clone())
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Post> {
        self.posts.iter().find(|post| post.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Post> {
        self.posts.iter_mut().find(|post| post.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn toggle_like(&mut self, id: &str) -> bool {
        match self.get_mut(id) {
            Some(post) => {
                post.toggle_like();
                true
            }
            None => false,
        }
    }

    pub fn toggle_retweet(&mut self, id: &str) -> bool {
        match self.get_mut(id) {
            Some(post) => {
                post.toggle_retweet();
                true
            }
            None => false,
        }
    }

    /// Returns the new post's id, or `None` when `text` is empty.
    pub fn create_post(
        &mut self,
        text: &str,
        author: &Author,
        ids: &mut dyn IdGenerator,
    ) -> Option<PostId> {
        if text.is_empty() {
            return None;
        }
        let id = ids.next_id();
        self.posts.insert(0, Post::new(id.clone(), text, author));
        Some(id)
    }

    pub fn add_reply(&mut self, id: &str, text: &str, author: &Author) -> bool {
        match self.get_mut(id) {
            Some(post) => {
                post.replies.insert(
                    0,
                    Reply {
                        handle: author.handle.clone(),
                        avatar: author.avatar.clone(),
                        text: text.to_string(),
                    },
                );
                true
            }
            None => false,
        }
    }

    pub fn remove_post(&mut self, id: &str) -> bool {
        match self.posts.iter().position(|post| post.id == id) {
            Some(index) => {
                self.posts.remove(index);
                true
            }
            None => false,
        }
    }
}

static SEED: Lazy<Vec<Post>> = Lazy::new(|| {
    vec![
        Post {
            id: "4b161eee-c0f5-4545-9c4b-8562944223ee".into(),
            handle: "@TrollBot66756542 💎".into(),
            avatar: "images/troll.jpg".into(),
            text: "Buy Bitcoin, ETH Make 💰💰💰 low low prices. \
                   Guaranteed return on investment. HMU DMs open!!"
                .into(),
            likes: 27,
            liked: false,
            retweets: 10,
            retweeted: false,
            replies: Vec::new(),
        },
        Post {
            id: "3c23454ee-c0f5-9g9g-9c4b-77835tgs2".into(),
            handle: "@Elon ✅".into(),
            avatar: "images/musk.png".into(),
            text: "I need volunteers for a one-way mission to Mars 🪐. No experience necessary🚀"
                .into(),
            likes: 6500,
            liked: false,
            retweets: 234,
            retweeted: false,
            replies: vec![
                Reply {
                    handle: "@TomCruise ✅".into(),
                    avatar: "images/tcruise.png".into(),
                    text: "Yes! Sign me up! 😎🛩".into(),
                },
                Reply {
                    handle: "@ChuckNorris ✅".into(),
                    avatar: "images/chucknorris.jpeg".into(),
                    text: "I went last year😴".into(),
                },
            ],
        },
        Post {
            id: "8hy671sff-c0f5-4545-9c4b-1237gyys45".into(),
            handle: "@NoobCoder12".into(),
            avatar: "images/flower.png".into(),
            text: "Are you a coder if you only know HTML?".into(),
            likes: 10,
            liked: false,
            retweets: 3,
            retweeted: false,
            replies: vec![
                Reply {
                    handle: "@StackOverflower ☣️".into(),
                    avatar: "images/overflow.png".into(),
                    text: "No. Obviosuly not. Go get a job in McDonald's.".into(),
                },
                Reply {
                    handle: "@YummyCoder64".into(),
                    avatar: "images/love.png".into(),
                    text: "You are wonderful just as you are! ❤️".into(),
                },
            ],
        },
    ]
});
