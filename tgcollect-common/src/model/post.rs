use regex::Regex;
use std::{fmt::Display, str::FromStr, sync::LazyLock};
use thiserror::Error;

/// Prefix Telegram puts in front of a channel's bare id to form its marked id.
pub const PRIVATE_CHANNEL_MARKER: &str = "-100";

static POST_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"t\.me/(c/)?([\w_-]+)/(\d+)").expect("Post URL regex is valid.")
});

static DECIMAL_DIGIT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d$").expect("Decimal digit regex is valid."));

fn is_decimal_digit(c: char) -> bool {
    DECIMAL_DIGIT_REGEX.is_match(c.encode_utf8(&mut [0; 4]))
}

/// Value of a Unicode decimal digit, e.g. `'٤'` is 4.
///
/// Unicode encodes every decimal digit set as ten contiguous code points starting at zero.
fn decimal_digit_value(c: char) -> Option<u32> {
    if !is_decimal_digit(c) {
        return None;
    }

    let mut run_start = u32::from(c);
    while let Some(previous) = run_start.checked_sub(1).and_then(char::from_u32)
        && is_decimal_digit(previous)
    {
        run_start -= 1;
    }

    Some((u32::from(c) - run_start) % 10)
}

/// Rewrites a string of decimal digits from any script into ASCII digits.
fn ascii_digits(digits: &str) -> Option<String> {
    digits
        .chars()
        .map(|c| decimal_digit_value(c).and_then(|value| char::from_digit(value, 10)))
        .collect()
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Invalid Telegram post URL format.")]
pub struct InvalidPostUrlError;

/// A channel as the messaging client addresses it.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum ChannelEntity {
    /// Public username, passed through as written in the URL.
    Handle(String),
    /// Marked id of a private channel, e.g. `-100123456`.
    Id(i64),
}

impl ChannelEntity {
    /// The channel id with the private marker removed, if this is an [`ChannelEntity::Id`]
    /// carrying the marker.
    #[must_use]
    pub fn bare_id(&self) -> Option<i64> {
        match self {
            ChannelEntity::Handle(_) => None,
            ChannelEntity::Id(id) => id
                .to_string()
                .strip_prefix(PRIVATE_CHANNEL_MARKER)
                .and_then(|bare| bare.parse().ok()),
        }
    }
}

impl Display for ChannelEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelEntity::Handle(handle) => Display::fmt(handle, f),
            ChannelEntity::Id(id) => Display::fmt(id, f),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct PostReference {
    pub channel_identifier: String,
    pub is_private_form: bool,
    pub post_id: i32,
    pub channel: ChannelEntity,
}

impl PostReference {
    /// Finds the first `t.me/[c/]<channel>/<post>` occurrence in `url`.
    pub fn parse(url: &str) -> Result<Self, InvalidPostUrlError> {
        let captures = POST_URL_REGEX.captures(url).ok_or(InvalidPostUrlError)?;

        let is_private_form = captures.get(1).is_some();
        let channel_identifier = captures[2].to_owned();
        let post_id = ascii_digits(&captures[3])
            .and_then(|digits| digits.parse::<i32>().ok())
            .filter(|id| id.is_positive())
            .ok_or(InvalidPostUrlError)?;

        let private_digits = is_private_form
            .then(|| ascii_digits(&channel_identifier))
            .flatten();
        let channel = match private_digits {
            Some(digits) => {
                let id = format!("{PRIVATE_CHANNEL_MARKER}{digits}")
                    .parse()
                    .map_err(|_| InvalidPostUrlError)?;
                ChannelEntity::Id(id)
            }
            None => ChannelEntity::Handle(channel_identifier.clone()),
        };

        Ok(Self {
            channel_identifier,
            is_private_form,
            post_id,
            channel,
        })
    }
}

impl FromStr for PostReference {
    type Err = InvalidPostUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::post::{
        ChannelEntity, InvalidPostUrlError, PostReference, decimal_digit_value,
    };

    #[test]
    fn public_channel() {
        let urls = [
            "https://t.me/channelx/42",
            "t.me/channelx/42",
            "http://t.me/channelx/42?comment=7",
            "see https://t.me/channelx/42 for details",
        ];

        for url in urls {
            let post = PostReference::parse(url).unwrap();
            assert!(!post.is_private_form, "{url}");
            assert_eq!(post.channel_identifier, "channelx", "{url}");
            assert_eq!(post.post_id, 42, "{url}");
            assert_eq!(post.channel, ChannelEntity::Handle("channelx".into()), "{url}");
        }
    }

    #[test]
    fn handle_with_underscore_and_hyphen() {
        let post = PostReference::parse("https://t.me/some_chan-nel/7").unwrap();
        assert_eq!(post.channel, ChannelEntity::Handle("some_chan-nel".into()));
    }

    #[test]
    fn private_channel() {
        let post = PostReference::parse("https://t.me/c/123456/789").unwrap();

        assert!(post.is_private_form);
        assert_eq!(post.channel_identifier, "123456");
        assert_eq!(post.post_id, 789);
        assert_eq!(post.channel, ChannelEntity::Id(-100_123_456));
        assert_eq!(post.channel.bare_id(), Some(123_456));
    }

    #[test]
    fn private_form_with_non_numeric_token_stays_textual() {
        let post = PostReference::parse("https://t.me/c/abc123/5").unwrap();

        assert!(post.is_private_form);
        assert_eq!(post.channel, ChannelEntity::Handle("abc123".into()));
        assert_eq!(post.channel.bare_id(), None);
    }

    #[test]
    fn digits_from_other_scripts() {
        let post = PostReference::parse("https://t.me/channelx/٤٢").unwrap();
        assert_eq!(post.channel, ChannelEntity::Handle("channelx".into()));
        assert_eq!(post.post_id, 42);

        let post = PostReference::parse("https://t.me/c/١٢/5").unwrap();
        assert!(post.is_private_form);
        assert_eq!(post.channel_identifier, "١٢");
        assert_eq!(post.channel, ChannelEntity::Id(-10012));

        let post = PostReference::parse("https://t.me/c/۱۲۳/۹").unwrap();
        assert_eq!(post.channel, ChannelEntity::Id(-100_123));
        assert_eq!(post.post_id, 9);

        let post = PostReference::parse("https://t.me/c/１０/𝟕").unwrap();
        assert_eq!(post.channel, ChannelEntity::Id(-10010));
        assert_eq!(post.post_id, 7);
    }

    #[test]
    fn decimal_digit_values() {
        let digits = [
            ('0', 0),
            ('9', 9),
            ('٠', 0),
            ('٩', 9),
            ('۴', 4),
            ('५', 5),
            ('１', 1),
            ('𝟐', 2),
            ('𝟿', 9),
        ];
        for (digit, value) in digits {
            assert_eq!(decimal_digit_value(digit), Some(value), "{digit}");
        }

        for not_digit in ['a', '²', '½', 'Ⅻ', '_'] {
            assert_eq!(decimal_digit_value(not_digit), None, "{not_digit}");
        }
    }

    #[test]
    fn channel_named_c() {
        let post = PostReference::parse("https://t.me/c/45").unwrap();

        assert!(!post.is_private_form);
        assert_eq!(post.channel, ChannelEntity::Handle("c".into()));
        assert_eq!(post.post_id, 45);
    }

    #[test]
    fn invalid_urls() {
        let urls = [
            "",
            "https://example.com/channelx/42",
            "https://t.me/channelx",
            "https://t.me/channelx/abc",
            "https://t.me//42",
            "https://t.me/channelx/0",
            "https://t.me/channelx/99999999999",
            "https://t.me/c/99999999999999999999/1",
            "tme/channelx/42",
        ];

        for url in urls {
            assert_eq!(PostReference::parse(url), Err(InvalidPostUrlError), "{url}");
        }
    }

    #[test]
    fn from_str() {
        let post: PostReference = "https://t.me/c/1/2".parse().unwrap();
        assert_eq!(post.channel, ChannelEntity::Id(-1001));
    }
}
