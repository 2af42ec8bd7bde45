use serde::{Deserialize, Deserializer, Serialize};

// --- Shaped fetch results ---

/// Flat, minimally-shaped post data extracted from the GraphQL response.
/// Every field is optional or defaulted: an externally-versioned response
/// schema must never fail the shaping step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPost {
    pub username: Option<String>,
    /// Owner id, the key for the follow-up profile fetch.
    pub pk: Option<String>,
    pub id: Option<String>,
    pub shortcode: Option<String>,
    pub dimensions: Option<Dimensions>,
    pub src: Option<String>,
    pub thumbnail_src: Option<String>,
    pub media_preview: Option<String>,
    pub video_url: Option<String>,
    pub views: Option<i64>,
    pub likes: Option<i64>,
    pub location: Option<String>,
    pub taken_at: Option<i64>,
    pub media_type: Option<String>,
    pub video_duration: Option<f64>,
    pub music: Option<serde_json::Value>,
    pub is_video: Option<bool>,
    pub related: Vec<String>,
    pub tagged_users: Vec<String>,
    pub captions: Vec<String>,
    pub related_profiles: Vec<String>,
    pub comments: Vec<RawComment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawComment {
    pub id: Option<String>,
    pub text: Option<String>,
    pub created_at: Option<i64>,
    pub owner: Option<String>,
    pub owner_verified: Option<bool>,
    pub viewer_has_liked: Option<bool>,
    pub likes: Option<i64>,
    pub replies: Vec<RawReply>,
}

/// Same shape as a comment, minus further nesting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawReply {
    pub id: Option<String>,
    pub text: Option<String>,
    pub created_at: Option<i64>,
    pub owner: Option<String>,
    pub owner_verified: Option<bool>,
    pub viewer_has_liked: Option<bool>,
    pub likes: Option<i64>,
}

/// Flat profile data extracted from the GraphQL response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawProfile {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub profile_pic_url: Option<String>,
    pub bio: Option<String>,
    pub follower_count: Option<i64>,
    pub following_count: Option<i64>,
    pub media_count: Option<i64>,
    pub is_private: Option<bool>,
    pub is_verified: Option<bool>,
    pub external_url: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimensions {
    pub height: Option<i64>,
    pub width: Option<i64>,
}

// --- GraphQL response envelopes ---

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PostEnvelope {
    pub data: PostData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PostData {
    #[serde(rename = "xdt_shortcode_media")]
    pub media: Option<Media>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Media {
    pub id: Option<String>,
    pub shortcode: Option<String>,
    pub dimensions: Option<Dimensions>,
    pub display_url: Option<String>,
    pub thumbnail_src: Option<String>,
    pub media_preview: Option<String>,
    pub video_url: Option<String>,
    #[serde(deserialize_with = "lenient_count")]
    pub video_view_count: Option<i64>,
    pub video_duration: Option<f64>,
    pub is_video: Option<bool>,
    pub product_type: Option<String>,
    pub taken_at_timestamp: Option<i64>,
    pub clips_music_attribution_info: Option<serde_json::Value>,
    pub owner: Option<Owner>,
    pub location: Option<Location>,
    pub edge_media_preview_like: Option<CountEdge>,
    pub edge_media_to_caption: Edges<CaptionNode>,
    pub edge_media_to_parent_comment: Edges<CommentNode>,
    pub edge_media_to_tagged_user: Edges<TaggedUserNode>,
    pub edge_related_profiles: Edges<UsernameNode>,
    pub edge_web_media_to_related_media: Edges<ShortcodeNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Owner {
    pub id: Option<String>,
    pub username: Option<String>,
    pub is_verified: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Location {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CountEdge {
    #[serde(deserialize_with = "lenient_count")]
    pub count: Option<i64>,
}

/// Generic `{"edges": [{"node": ...}]}` wrapper used throughout the schema.
#[derive(Debug, Deserialize)]
#[serde(default, bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct Edges<T> {
    pub edges: Vec<Edge<T>>,
}

impl<T> Default for Edges<T> {
    fn default() -> Self {
        Self { edges: Vec::new() }
    }
}

impl<T> Edges<T> {
    pub(crate) fn into_nodes(self) -> impl Iterator<Item = T> {
        self.edges.into_iter().filter_map(|edge| edge.node)
    }
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct Edge<T> {
    #[serde(default)]
    pub node: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CaptionNode {
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CommentNode {
    pub id: Option<String>,
    pub text: Option<String>,
    pub created_at: Option<i64>,
    pub owner: Option<Owner>,
    pub viewer_has_liked: Option<bool>,
    pub edge_liked_by: Option<CountEdge>,
    pub edge_threaded_comments: Edges<ReplyNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ReplyNode {
    pub id: Option<String>,
    pub text: Option<String>,
    pub created_at: Option<i64>,
    pub owner: Option<Owner>,
    pub viewer_has_liked: Option<bool>,
    pub edge_liked_by: Option<CountEdge>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct TaggedUserNode {
    pub user: Option<UsernameNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct UsernameNode {
    pub username: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ShortcodeNode {
    pub shortcode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ProfileEnvelope {
    pub data: ProfileData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ProfileData {
    pub user: Option<UserNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct UserNode {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub profile_pic_url: Option<String>,
    pub biography: Option<String>,
    #[serde(deserialize_with = "lenient_count")]
    pub follower_count: Option<i64>,
    #[serde(deserialize_with = "lenient_count")]
    pub following_count: Option<i64>,
    #[serde(deserialize_with = "lenient_count")]
    pub media_count: Option<i64>,
    pub is_private: Option<bool>,
    pub is_verified: Option<bool>,
    pub external_url: Option<String>,
    pub category: Option<String>,
}

/// Accept a count as a number or a numeric string; anything else becomes
/// `None` instead of a deserialization failure.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

// --- Envelope → shaped conversions ---

impl RawPost {
    pub(crate) fn from_media(media: Media) -> Self {
        let comments = media
            .edge_media_to_parent_comment
            .into_nodes()
            .map(RawComment::from_node)
            .collect();

        RawPost {
            username: media.owner.as_ref().and_then(|o| o.username.clone()),
            pk: media.owner.as_ref().and_then(|o| o.id.clone()),
            id: media.id,
            shortcode: media.shortcode,
            dimensions: media.dimensions,
            src: media.display_url,
            thumbnail_src: media.thumbnail_src,
            media_preview: media.media_preview,
            video_url: media.video_url,
            views: media.video_view_count,
            likes: media.edge_media_preview_like.and_then(|e| e.count),
            location: media.location.and_then(|l| l.name),
            taken_at: media.taken_at_timestamp,
            media_type: media.product_type,
            video_duration: media.video_duration,
            music: media.clips_music_attribution_info,
            is_video: media.is_video,
            related: media
                .edge_web_media_to_related_media
                .into_nodes()
                .filter_map(|n| n.shortcode)
                .collect(),
            tagged_users: media
                .edge_media_to_tagged_user
                .into_nodes()
                .filter_map(|n| n.user.and_then(|u| u.username))
                .collect(),
            captions: media
                .edge_media_to_caption
                .into_nodes()
                .filter_map(|n| n.text)
                .collect(),
            related_profiles: media
                .edge_related_profiles
                .into_nodes()
                .filter_map(|n| n.username)
                .collect(),
            comments,
        }
    }
}

impl RawComment {
    fn from_node(node: CommentNode) -> Self {
        let replies = node
            .edge_threaded_comments
            .into_nodes()
            .map(RawReply::from_node)
            .collect();

        RawComment {
            id: node.id,
            text: node.text,
            created_at: node.created_at,
            owner: node.owner.as_ref().and_then(|o| o.username.clone()),
            owner_verified: node.owner.as_ref().and_then(|o| o.is_verified),
            viewer_has_liked: node.viewer_has_liked,
            likes: node.edge_liked_by.and_then(|e| e.count),
            replies,
        }
    }
}

impl RawReply {
    fn from_node(node: ReplyNode) -> Self {
        RawReply {
            id: node.id,
            text: node.text,
            created_at: node.created_at,
            owner: node.owner.as_ref().and_then(|o| o.username.clone()),
            owner_verified: node.owner.as_ref().and_then(|o| o.is_verified),
            viewer_has_liked: node.viewer_has_liked,
            likes: node.edge_liked_by.and_then(|e| e.count),
        }
    }
}

impl RawProfile {
    pub(crate) fn from_user(user: UserNode) -> Self {
        RawProfile {
            username: user.username,
            full_name: user.full_name,
            profile_pic_url: user.profile_pic_url,
            bio: user.biography,
            follower_count: user.follower_count,
            following_count: user.following_count,
            media_count: user.media_count,
            is_private: user.is_private,
            is_verified: user.is_verified,
            external_url: user.external_url,
            category: user.category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST_FIXTURE: &str = r#"{
        "data": {
            "xdt_shortcode_media": {
                "id": "321",
                "shortcode": "C0SeC8oCT1L",
                "display_url": "https://example.test/img.jpg",
                "is_video": false,
                "taken_at_timestamp": 1701388800,
                "owner": {"id": "1021317618", "username": "wellnessqueen", "is_verified": false},
                "edge_media_preview_like": {"count": 523},
                "edge_media_to_caption": {
                    "edges": [{"node": {"text": "Join my team! #bossbabe #hustle"}}]
                },
                "edge_media_to_parent_comment": {
                    "edges": [
                        {
                            "node": {
                                "id": "c1",
                                "text": "How do I sign up?",
                                "owner": {"username": "curious_carl"},
                                "edge_liked_by": {"count": 2},
                                "edge_threaded_comments": {
                                    "edges": [
                                        {"node": {"id": "r1", "text": "DM me!", "owner": {"username": "wellnessqueen"}}}
                                    ]
                                }
                            }
                        },
                        {
                            "node": {
                                "id": "c2",
                                "text": "Looks like a pyramid scheme",
                                "owner": {"username": "skeptic_sue"}
                            }
                        }
                    ]
                }
            }
        }
    }"#;

    #[test]
    fn shapes_post_envelope() {
        let envelope: PostEnvelope = serde_json::from_str(POST_FIXTURE).unwrap();
        let post = RawPost::from_media(envelope.data.media.unwrap());

        assert_eq!(post.pk.as_deref(), Some("1021317618"));
        assert_eq!(post.username.as_deref(), Some("wellnessqueen"));
        assert_eq!(post.likes, Some(523));
        assert_eq!(post.captions, vec!["Join my team! #bossbabe #hustle"]);
        assert_eq!(post.comments.len(), 2);
        assert_eq!(post.comments[0].owner.as_deref(), Some("curious_carl"));
        assert_eq!(post.comments[0].replies.len(), 1);
        assert_eq!(post.comments[0].replies[0].text.as_deref(), Some("DM me!"));
        assert!(post.comments[1].replies.is_empty());
    }

    #[test]
    fn empty_envelope_has_no_media() {
        let envelope: PostEnvelope = serde_json::from_str(r#"{"data": {}}"#).unwrap();
        assert!(envelope.data.media.is_none());
    }

    #[test]
    fn profile_counts_accept_strings_and_junk() {
        let json = r#"{
            "data": {
                "user": {
                    "username": "wellnessqueen",
                    "biography": "dream big",
                    "follower_count": "15300",
                    "following_count": 87,
                    "media_count": {"oops": true}
                }
            }
        }"#;
        let envelope: ProfileEnvelope = serde_json::from_str(json).unwrap();
        let profile = RawProfile::from_user(envelope.data.user.unwrap());

        assert_eq!(profile.follower_count, Some(15300));
        assert_eq!(profile.following_count, Some(87));
        assert_eq!(profile.media_count, None);
    }

    #[test]
    fn missing_node_in_edge_is_skipped() {
        let json = r#"{"edges": [{"node": null}, {"node": {"text": "hi"}}]}"#;
        let edges: Edges<CaptionNode> = serde_json::from_str(json).unwrap();
        let texts: Vec<String> = edges.into_nodes().filter_map(|n| n.text).collect();
        assert_eq!(texts, vec!["hi"]);
    }
}
