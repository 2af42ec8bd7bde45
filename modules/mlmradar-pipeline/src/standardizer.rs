use instagram_client::{RawComment, RawReply};
use mlmradar_common::{
    CanonicalPostRecord, CommentRecord, MlmRadarError, Platform, PostRecord, ProfileRecord,
    ReplyRecord,
};

use crate::aggregator::AggregatedCapture;

/// Map an aggregated capture into the canonical schema for `platform`.
/// Only Instagram has a transformation registered; a recognized but
/// unmapped platform fails the same way as an unknown one. Pure function:
/// no I/O, input untouched.
pub fn standardize(
    platform: Platform,
    capture: &AggregatedCapture,
) -> Result<CanonicalPostRecord, MlmRadarError> {
    match platform {
        Platform::Instagram => Ok(standardize_instagram(capture)),
        other => Err(MlmRadarError::UnsupportedPlatform(other.to_string())),
    }
}

fn standardize_instagram(capture: &AggregatedCapture) -> CanonicalPostRecord {
    let profile = &capture.profile_data;
    let post = &capture.post_data;

    let title = post
        .captions
        .first()
        .filter(|caption| !caption.is_empty())
        .cloned()
        .unwrap_or_default();

    CanonicalPostRecord {
        profile: ProfileRecord {
            username: profile.username.clone().unwrap_or_default(),
            nickname: profile.full_name.clone().unwrap_or_default(),
            bio: profile.bio.clone().unwrap_or_default(),
            verified: profile.is_verified.unwrap_or(false),
            bio_links: profile.external_url.clone().filter(|url| !url.is_empty()),
            follower_count: profile.follower_count.unwrap_or(0).max(0) as u64,
            following_count: profile.following_count.unwrap_or(0),
        },
        post: PostRecord {
            title,
            likes: post.likes,
            tags: extract_hashtags(&post.captions),
        },
        comments: post.comments.iter().map(comment_record).collect(),
    }
}

/// Whitespace-split each caption, keep tokens beginning with `#`, and strip
/// any `@` characters from the kept tokens. Tokens are not otherwise
/// validated against a hashtag grammar.
fn extract_hashtags(captions: &[String]) -> Vec<String> {
    captions
        .iter()
        .flat_map(|caption| {
            caption
                .split_whitespace()
                .filter(|token| token.starts_with('#'))
                .map(|token| token.replace('@', ""))
        })
        .collect()
}

fn comment_record(raw: &RawComment) -> CommentRecord {
    CommentRecord {
        user: raw.owner.clone().unwrap_or_default(),
        comment: raw.text.clone().unwrap_or_default(),
        replies: raw.replies.iter().map(reply_record).collect(),
    }
}

fn reply_record(raw: &RawReply) -> ReplyRecord {
    ReplyRecord {
        user: raw.owner.clone().unwrap_or_default(),
        comment: raw.text.clone().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use instagram_client::{RawPost, RawProfile};

    use super::*;

    fn capture(post: RawPost, profile: RawProfile) -> AggregatedCapture {
        AggregatedCapture {
            profile_data: profile,
            post_data: post,
        }
    }

    #[test]
    fn empty_capture_standardizes_to_defaults() {
        let record = standardize(
            Platform::Instagram,
            &capture(RawPost::default(), RawProfile::default()),
        )
        .unwrap();

        assert_eq!(record.profile.username, "");
        assert_eq!(record.profile.bio, "");
        assert!(!record.profile.verified);
        assert_eq!(record.profile.bio_links, None);
        assert_eq!(record.profile.follower_count, 0);
        assert_eq!(record.profile.following_count, 0);
        assert_eq!(record.post.title, "");
        assert_eq!(record.post.likes, None);
        assert!(record.post.tags.is_empty());
        assert!(record.comments.is_empty());
    }

    #[test]
    fn hashtags_keep_order_and_lose_at_signs() {
        let tags = extract_hashtags(&[
            "Join my #team today! #boss@babe normal word".to_string(),
            "second caption #hustle".to_string(),
        ]);
        assert_eq!(tags, vec!["#team", "#bossbabe", "#hustle"]);
    }

    #[test]
    fn negative_follower_count_clamps_to_zero() {
        let profile = RawProfile {
            follower_count: Some(-42),
            following_count: Some(-7),
            ..Default::default()
        };
        let record =
            standardize(Platform::Instagram, &capture(RawPost::default(), profile)).unwrap();

        assert_eq!(record.profile.follower_count, 0);
        assert_eq!(record.profile.following_count, -7);
    }

    #[test]
    fn empty_external_url_collapses_to_none() {
        let profile = RawProfile {
            external_url: Some(String::new()),
            ..Default::default()
        };
        let record =
            standardize(Platform::Instagram, &capture(RawPost::default(), profile)).unwrap();
        assert_eq!(record.profile.bio_links, None);
    }

    #[test]
    fn known_instagram_fixture_maps_exactly() {
        let post = RawPost {
            captions: vec!["New drop! #wellness #side@hustle #mlm@free".to_string()],
            likes: Some(523),
            comments: vec![
                RawComment {
                    owner: Some("curious_carl".into()),
                    text: Some("How do I sign up?".into()),
                    replies: vec![RawReply {
                        owner: Some("wellnessqueen".into()),
                        text: Some("DM me!".into()),
                        ..Default::default()
                    }],
                    ..Default::default()
                },
                RawComment {
                    owner: Some("skeptic_sue".into()),
                    text: Some("Looks like a pyramid scheme".into()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let profile = RawProfile {
            username: Some("wellnessqueen".into()),
            full_name: Some("Wellness Queen".into()),
            bio: Some("dream big".into()),
            is_verified: Some(true),
            follower_count: Some(15300),
            following_count: Some(87),
            external_url: Some("https://linktr.ee/wellnessqueen".into()),
            ..Default::default()
        };

        let record = standardize(Platform::Instagram, &capture(post, profile)).unwrap();

        assert_eq!(record.post.title, "New drop! #wellness #side@hustle #mlm@free");
        assert_eq!(
            record.post.tags,
            vec!["#wellness", "#sidehustle", "#mlmfree"]
        );
        assert_eq!(record.comments.len(), 2);
        assert_eq!(record.comments[0].replies.len(), 1);
        assert_eq!(record.comments[0].replies[0].user, "wellnessqueen");
        assert!(record.comments[1].replies.is_empty());
        assert_eq!(record.profile.follower_count, 15300);
    }

    #[test]
    fn tiktok_has_no_registered_transformation() {
        let result = standardize(
            Platform::TikTok,
            &capture(RawPost::default(), RawProfile::default()),
        );
        assert!(matches!(
            result,
            Err(MlmRadarError::UnsupportedPlatform(_))
        ));
    }
}
