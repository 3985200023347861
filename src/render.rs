//! Feed rendering: `Feed` → view-model → HTML.
//!
//! The view-model carries no replies-region visibility. Callers pass the set
//! of opened regions when producing markup; `render_feed` uses an empty set,
//! so every region comes out hidden.

use std::collections::HashSet;
use std::fmt::Write;

use crate::feed::{Author, Feed, Post, PostId, Reply};

pub const FEED_CONTAINER_ID: &str = "feed";
pub const COMPOSER_ID: &str = "tweet-input";
pub const SUBMIT_ID: &str = "tweet-btn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedView {
    pub posts: Vec<PostView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostView {
    pub id: PostId,
    pub handle: String,
    pub avatar: String,
    pub text: String,
    pub reply_count: usize,
    pub likes: u64,
    pub liked: bool,
    pub retweets: u64,
    pub retweeted: bool,
    pub composer_avatar: String,
    pub replies: Vec<ReplyView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyView {
    pub handle: String,
    pub avatar: String,
    pub text: String,
}

impl FeedView {
    pub fn new(feed: &Feed, viewer: &Author) -> Self {
        Self {
            posts: feed
                .posts()
                .iter()
                .map(|post| PostView::new(post, viewer))
                .collect(),
        }
    }

    pub fn markup(&self, shown: &HashSet<PostId>) -> String {
        let mut out = String::new();
        for post in &self.posts {
            post.write_markup(&mut out, shown.contains(&post.id));
        }
        out
    }
}

impl PostView {
    fn new(post: &Post, viewer: &Author) -> Self {
        Self {
            id: post.id.clone(),
            handle: post.handle.clone(),
            avatar: post.avatar.clone(),
            text: post.text.clone(),
            reply_count: post.replies.len(),
            likes: post.likes,
            liked: post.liked,
            retweets: post.retweets,
            retweeted: post.retweeted,
            composer_avatar: viewer.avatar.clone(),
            replies: post.replies.iter().map(ReplyView::from).collect(),
        }
    }

    pub fn like_class(&self) -> &'static str {
        if self.liked {
            "liked"
        } else {
            ""
        }
    }

    pub fn retweet_class(&self) -> &'static str {
        if self.retweeted {
            "retweeted"
        } else {
            ""
        }
    }

    fn write_markup(&self, out: &mut String, replies_shown: bool) {
        let id = escape_html(&self.id);
        let region_class = if replies_shown { "" } else { "hidden" };

        let mut replies = String::new();
        let _ = write!(
            replies,
            r#"
<div class="tweet-reply">
    <div class="tweet-inner">
        <img src="{avatar}" class="profile-pic">
        <textarea id="reply-input-{id}" class="reply-input" data-new-reply="{id}" placeholder="Write your reply..."></textarea>
    </div>
</div>"#,
            avatar = escape_html(&self.composer_avatar),
        );
        for reply in &self.replies {
            reply.write_markup(&mut replies);
        }

        let _ = write!(
            out,
            r#"
<div class="tweet">
    <i class="fa-solid fa-xmark remove-btn" data-remove="{id}"></i>
    <div class="tweet-inner">
        <img src="{avatar}" class="profile-pic">
        <div>
            <p class="handle">{handle}</p>
            <p class="tweet-text">{text}</p>
            <div class="tweet-details">
                <span class="tweet-detail">
                    <i class="fa-regular fa-comment-dots" data-reply="{id}"></i>
                    {reply_count}
                </span>
                <span class="tweet-detail">
                    <i class="fa-solid fa-heart {like_class}" data-like="{id}"></i>
                    {likes}
                </span>
                <span class="tweet-detail">
                    <i class="fa-solid fa-retweet {retweet_class}" data-retweet="{id}"></i>
                    {retweets}
                </span>
            </div>
        </div>
    </div>
    <div class="{region_class}" id="replies-{id}">{replies}
    </div>
</div>
"#,
            avatar = escape_html(&self.avatar),
            handle = escape_html(&self.handle),
            text = escape_html(&self.text),
            reply_count = self.reply_count,
            like_class = self.like_class(),
            likes = self.likes,
            retweet_class = self.retweet_class(),
            retweets = self.retweets,
        );
    }
}

impl From<&Reply> for ReplyView {
    fn from(reply: &Reply) -> Self {
        Self {
            handle: reply.handle.clone(),
            avatar: reply.avatar.clone(),
            text: reply.text.clone(),
        }
    }
}

impl ReplyView {
    fn write_markup(&self, out: &mut String) {
        let _ = write!(
            out,
            r#"
<div class="tweet-reply">
    <div class="tweet-inner">
        <img src="{}" class="profile-pic">
        <div>
            <p class="handle">{}</p>
            <p class="tweet-text">{}</p>
        </div>
    </div>
</div>"#,
            escape_html(&self.avatar),
            escape_html(&self.handle),
            escape_html(&self.text),
        );
    }
}

/// Markup for the whole feed with every replies region hidden.
pub fn render_feed(feed: &Feed) -> String {
    FeedView::new(feed, &Author::default()).markup(&HashSet::new())
}

/// A standalone document around the feed markup: composer, submit button and
/// the feed container.
pub fn render_page(feed_html: &str, viewer: &Author, composer: &str) -> String {
    format!(
        r#"<!doctype html>
<html>
<head>
    <meta charset="utf-8">
    <title>Chirp</title>
    <link rel="stylesheet" href="index.css">
</head>
<body>
    <main>
        <div class="tweet-input-area">
            <img src="{avatar}" class="profile-pic">
            <textarea placeholder="What's happening?" id="{COMPOSER_ID}">{composer}</textarea>
        </div>
        <button id="{SUBMIT_ID}">Tweet</button>
        <div class="feed" id="{FEED_CONTAINER_ID}">{feed_html}</div>
    </main>
</body>
</html>
"#,
        avatar = escape_html(&viewer.avatar),
        composer = escape_html(composer),
    )
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::SequentialIds;

    #[test]
    fn render_is_deterministic() {
        let feed = Feed::seed();
        assert_eq!(render_feed(&feed), render_feed(&feed));
    }

    #[test]
    fn posts_render_in_feed_order_with_controls() {
        let feed = Feed::seed();
        let html = render_feed(&feed);
        let mut last = 0;
        for post in feed.posts() {
            let at = html
                .find(&format!(r#"data-remove="{}""#, post.id))
                .expect("remove control");
            assert!(at >= last);
            last = at;
            for attr in ["data-like", "data-retweet", "data-reply", "data-new-reply"] {
                assert!(html.contains(&format!(r#"{attr}="{}""#, post.id)));
            }
            assert!(html.contains(&format!(r#"class="hidden" id="replies-{}""#, post.id)));
        }
    }

    #[test]
    fn active_controls_get_marked() {
        let mut feed = Feed::seed();
        let id = feed.posts()[0].id.clone();
        feed.toggle_like(&id);
        feed.toggle_retweet(&id);
        let html = render_feed(&feed);
        assert!(html.contains(&format!(r#"fa-heart liked" data-like="{id}""#)));
        assert!(html.contains(&format!(r#"fa-retweet retweeted" data-retweet="{id}""#)));
        assert_eq!(html.matches("liked\"").count(), 1);
    }

    #[test]
    fn replies_follow_the_composer_in_order() {
        let feed = Feed::seed();
        let html = render_feed(&feed);
        let composer = html.find("reply-input-3c23454ee").unwrap();
        let first = html.find("Yes! Sign me up!").unwrap();
        let second = html.find("I went last year").unwrap();
        assert!(composer < first && first < second);
    }

    #[test]
    fn shown_regions_drop_hidden_class() {
        let feed = Feed::seed();
        let id = feed.posts()[1].id.clone();
        let shown: HashSet<_> = [id.clone()].into_iter().collect();
        let html = FeedView::new(&feed, &Author::default()).markup(&shown);
        assert!(html.contains(&format!(r#"<div class="" id="replies-{id}">"#)));
        assert_eq!(html.matches(r#"class="hidden" id="replies-"#).count(), 2);
    }

    #[test]
    fn user_text_is_escaped() {
        let mut feed = Feed::default();
        feed.create_post(
            "<script>alert('x')</script>",
            &Author::default(),
            &mut SequentialIds::default(),
        );
        let html = render_feed(&feed);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
    }

    #[test]
    fn view_model_counts_replies() {
        let view = FeedView::new(&Feed::seed(), &Author::default());
        let counts: Vec<_> = view.posts.iter().map(|p| p.reply_count).collect();
        assert_eq!(counts, vec![0, 2, 2]);
    }

    #[test]
    fn page_wraps_feed_container() {
        let page = render_page("<p>x</p>", &Author::default(), "draft");
        assert!(page.contains(r#"id="feed"><p>x</p></div>"#));
        assert!(page.contains(r#"id="tweet-input">draft</textarea>"#));
        assert!(page.contains(r#"<button id="tweet-btn">"#));
    }
}
