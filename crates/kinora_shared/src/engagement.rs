//! # Engagement Metrics
//!
//! The vocabulary shared by milestone video requirements (minimums a player
//! must reach) and player video activity (what the player actually did).
//! Both are read from the chain one metric at a time.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// A numeric engagement metric tracked per video.
///
/// Interaction counts are tracked at two depths: interactions on the
/// player's quote of the video, and interactions on the player's comment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EngagementMetric {
    /// Number of plays.
    PlayCount,
    /// Average view duration in seconds.
    AverageViewDuration,
    /// Total watched duration in seconds.
    Duration,
    /// Quotes of the player's quote.
    QuoteOnQuote,
    /// Mirrors of the player's quote.
    MirrorOnQuote,
    /// Reactions to the player's quote.
    ReactOnQuote,
    /// Comments on the player's quote.
    CommentOnQuote,
    /// Bookmarks of the player's quote.
    BookmarkOnQuote,
    /// Collects of the player's quote.
    CollectOnQuote,
    /// Quotes of the player's comment.
    QuoteOnComment,
    /// Mirrors of the player's comment.
    MirrorOnComment,
    /// Reactions to the player's comment.
    ReactOnComment,
    /// Comments on the player's comment.
    CommentOnComment,
    /// Bookmarks of the player's comment.
    BookmarkOnComment,
    /// Collects of the player's comment.
    CollectOnComment,
}

impl EngagementMetric {
    /// Every metric, in read order.
    pub const ALL: [Self; 15] = [
        Self::PlayCount,
        Self::AverageViewDuration,
        Self::Duration,
        Self::QuoteOnQuote,
        Self::MirrorOnQuote,
        Self::ReactOnQuote,
        Self::CommentOnQuote,
        Self::BookmarkOnQuote,
        Self::CollectOnQuote,
        Self::QuoteOnComment,
        Self::MirrorOnComment,
        Self::ReactOnComment,
        Self::CommentOnComment,
        Self::BookmarkOnComment,
        Self::CollectOnComment,
    ];

    /// Short name used in read-call labels and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PlayCount => "play_count",
            Self::AverageViewDuration => "average_view_duration",
            Self::Duration => "duration",
            Self::QuoteOnQuote => "quote_on_quote",
            Self::MirrorOnQuote => "mirror_on_quote",
            Self::ReactOnQuote => "react_on_quote",
            Self::CommentOnQuote => "comment_on_quote",
            Self::BookmarkOnQuote => "bookmark_on_quote",
            Self::CollectOnQuote => "collect_on_quote",
            Self::QuoteOnComment => "quote_on_comment",
            Self::MirrorOnComment => "mirror_on_comment",
            Self::ReactOnComment => "react_on_comment",
            Self::CommentOnComment => "comment_on_comment",
            Self::BookmarkOnComment => "bookmark_on_comment",
            Self::CollectOnComment => "collect_on_comment",
        }
    }
}

/// A yes/no engagement requirement tracked per video.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EngagementFlag {
    /// The video was quoted.
    Quote,
    /// The video was mirrored.
    Mirror,
    /// The video was reacted to.
    React,
    /// The video was commented on.
    Comment,
    /// The video was bookmarked.
    Bookmark,
}

impl EngagementFlag {
    /// Every flag, in read order.
    pub const ALL: [Self; 5] = [
        Self::Quote,
        Self::Mirror,
        Self::React,
        Self::Comment,
        Self::Bookmark,
    ];

    /// Short name used in read-call labels and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Mirror => "mirror",
            Self::React => "react",
            Self::Comment => "comment",
            Self::Bookmark => "bookmark",
        }
    }
}

/// A full set of engagement values for one video.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Engagement {
    /// Number of plays.
    pub play_count: U256,
    /// Average view duration in seconds.
    pub average_view_duration: U256,
    /// Total watched duration in seconds.
    pub duration: U256,
    /// Quotes of the player's quote.
    pub quote_on_quote: U256,
    /// Mirrors of the player's quote.
    pub mirror_on_quote: U256,
    /// Reactions to the player's quote.
    pub react_on_quote: U256,
    /// Comments on the player's quote.
    pub comment_on_quote: U256,
    /// Bookmarks of the player's quote.
    pub bookmark_on_quote: U256,
    /// Collects of the player's quote.
    pub collect_on_quote: U256,
    /// Quotes of the player's comment.
    pub quote_on_comment: U256,
    /// Mirrors of the player's comment.
    pub mirror_on_comment: U256,
    /// Reactions to the player's comment.
    pub react_on_comment: U256,
    /// Comments on the player's comment.
    pub comment_on_comment: U256,
    /// Bookmarks of the player's comment.
    pub bookmark_on_comment: U256,
    /// Collects of the player's comment.
    pub collect_on_comment: U256,
    /// Quoted.
    pub quote: bool,
    /// Mirrored.
    pub mirror: bool,
    /// Reacted.
    pub react: bool,
    /// Commented.
    pub comment: bool,
    /// Bookmarked.
    pub bookmark: bool,
}

impl Engagement {
    fn metric_slot(&mut self, metric: EngagementMetric) -> &mut U256 {
        match metric {
            EngagementMetric::PlayCount => &mut self.play_count,
            EngagementMetric::AverageViewDuration => &mut self.average_view_duration,
            EngagementMetric::Duration => &mut self.duration,
            EngagementMetric::QuoteOnQuote => &mut self.quote_on_quote,
            EngagementMetric::MirrorOnQuote => &mut self.mirror_on_quote,
            EngagementMetric::ReactOnQuote => &mut self.react_on_quote,
            EngagementMetric::CommentOnQuote => &mut self.comment_on_quote,
            EngagementMetric::BookmarkOnQuote => &mut self.bookmark_on_quote,
            EngagementMetric::CollectOnQuote => &mut self.collect_on_quote,
            EngagementMetric::QuoteOnComment => &mut self.quote_on_comment,
            EngagementMetric::MirrorOnComment => &mut self.mirror_on_comment,
            EngagementMetric::ReactOnComment => &mut self.react_on_comment,
            EngagementMetric::CommentOnComment => &mut self.comment_on_comment,
            EngagementMetric::BookmarkOnComment => &mut self.bookmark_on_comment,
            EngagementMetric::CollectOnComment => &mut self.collect_on_comment,
        }
    }

    fn flag_slot(&mut self, flag: EngagementFlag) -> &mut bool {
        match flag {
            EngagementFlag::Quote => &mut self.quote,
            EngagementFlag::Mirror => &mut self.mirror,
            EngagementFlag::React => &mut self.react,
            EngagementFlag::Comment => &mut self.comment,
            EngagementFlag::Bookmark => &mut self.bookmark,
        }
    }

    /// Sets one metric.
    pub fn set_metric(&mut self, metric: EngagementMetric, value: U256) {
        *self.metric_slot(metric) = value;
    }

    /// Sets one flag.
    pub fn set_flag(&mut self, flag: EngagementFlag, value: bool) {
        *self.flag_slot(flag) = value;
    }

    /// Returns one metric.
    #[must_use]
    pub fn metric(&self, metric: EngagementMetric) -> U256 {
        match metric {
            EngagementMetric::PlayCount => self.play_count,
            EngagementMetric::AverageViewDuration => self.average_view_duration,
            EngagementMetric::Duration => self.duration,
            EngagementMetric::QuoteOnQuote => self.quote_on_quote,
            EngagementMetric::MirrorOnQuote => self.mirror_on_quote,
            EngagementMetric::ReactOnQuote => self.react_on_quote,
            EngagementMetric::CommentOnQuote => self.comment_on_quote,
            EngagementMetric::BookmarkOnQuote => self.bookmark_on_quote,
            EngagementMetric::CollectOnQuote => self.collect_on_quote,
            EngagementMetric::QuoteOnComment => self.quote_on_comment,
            EngagementMetric::MirrorOnComment => self.mirror_on_comment,
            EngagementMetric::ReactOnComment => self.react_on_comment,
            EngagementMetric::CommentOnComment => self.comment_on_comment,
            EngagementMetric::BookmarkOnComment => self.bookmark_on_comment,
            EngagementMetric::CollectOnComment => self.collect_on_comment,
        }
    }

    /// Returns one flag.
    #[must_use]
    pub fn flag(&self, flag: EngagementFlag) -> bool {
        match flag {
            EngagementFlag::Quote => self.quote,
            EngagementFlag::Mirror => self.mirror,
            EngagementFlag::React => self.react,
            EngagementFlag::Comment => self.comment,
            EngagementFlag::Bookmark => self.bookmark,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_metric_has_its_own_slot() {
        let mut engagement = Engagement::default();
        for (i, metric) in EngagementMetric::ALL.into_iter().enumerate() {
            engagement.set_metric(metric, U256::from(i + 1));
        }
        for (i, metric) in EngagementMetric::ALL.into_iter().enumerate() {
            assert_eq!(engagement.metric(metric), U256::from(i + 1), "{}", metric.name());
        }
    }

    #[test]
    fn test_flags() {
        let mut engagement = Engagement::default();
        engagement.set_flag(EngagementFlag::Mirror, true);
        assert!(engagement.flag(EngagementFlag::Mirror));
        assert!(!engagement.flag(EngagementFlag::Quote));
    }
}
