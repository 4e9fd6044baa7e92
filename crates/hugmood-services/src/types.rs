//! Inputs and results exchanged with the downstream services.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use hugmood_core::error::AppError;
use hugmood_core::types::UserId;

/// The backend a call is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    /// Auth service.
    Auth,
    /// User / social graph service.
    Social,
    /// Mood tracking service.
    Mood,
    /// Hug exchange service.
    Hug,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auth => write!(f, "auth"),
            Self::Social => write!(f, "social"),
            Self::Mood => write!(f, "mood"),
            Self::Hug => write!(f, "hug"),
        }
    }
}

/// A session issued by the auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    /// Access token.
    pub token: String,
    /// Refresh token, when the backend issues one.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// User record as returned by the backend.
    pub user: Value,
}

impl AuthSession {
    /// The bound user id, if the record carries one.
    pub fn user_id(&self) -> Option<UserId> {
        user_id_of(&self.user)
    }
}

/// Extracts the `id` field of a backend user record.
///
/// Backends are inconsistent about string vs numeric ids; both are accepted.
pub fn user_id_of(user: &Value) -> Option<UserId> {
    match user.get("id")? {
        Value::String(s) if !s.is_empty() => Some(UserId::new(s.clone())),
        Value::Number(n) => Some(UserId::new(n.to_string())),
        _ => None,
    }
}

/// Fields needed to create a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationFields {
    /// Email address.
    pub email: String,
    /// Unique username.
    pub username: String,
    /// Plain-text password (forwarded to the auth service only).
    pub password: String,
    /// Display name; defaults to the username.
    #[serde(default)]
    pub name: Option<String>,
}

impl RegistrationFields {
    /// Display name, falling back to the username.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.username)
    }
}

/// Current and best mood streak for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodStreak {
    /// Consecutive days with a mood entry, ending today.
    pub current_streak: u32,
    /// Longest run ever recorded.
    pub longest_streak: u32,
}

/// A mood entry to create.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMood {
    /// Mood label, e.g. `"good"`.
    pub value: String,
    /// Optional free-text note.
    pub note: Option<String>,
    /// Whether the entry is visible to the community.
    pub is_public: bool,
    /// Optional numeric score.
    pub score: Option<i64>,
}

/// A hug to send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHug {
    /// Recipient user id.
    pub recipient_id: UserId,
    /// Hug style, e.g. `"friendly"`.
    pub hug_type: String,
    /// Optional message.
    pub message: Option<String>,
    /// Optional attached media.
    pub media_url: Option<String>,
}

/// A hug request, either directed at one user or public.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHugRequest {
    /// Recipient user id; `None` for community-only requests.
    pub recipient_id: Option<UserId>,
    /// Optional message.
    pub message: Option<String>,
    /// Whether the request is broadcast to the community.
    pub is_public: bool,
}

/// A group hug to create.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGroupHug {
    /// Title.
    pub title: String,
    /// Optional message.
    pub message: Option<String>,
    /// Hug style.
    pub hug_type: String,
    /// Participant cap; 0 means unlimited.
    pub max_participants: u32,
    /// Whether anyone may join.
    pub is_public: bool,
    /// Lifetime in hours.
    pub duration: u32,
    /// Users to invite.
    pub invited_users: Vec<UserId>,
}

/// Content to share to an external social platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    /// Platform name, e.g. `"twitter"`.
    pub platform: String,
    /// What is being shared: `mood`, `hug`, `group_hug`, `media_hug`.
    pub content_type: String,
    /// Id of the shared entity.
    pub content_id: Option<String>,
    /// Optional accompanying text.
    pub text: Option<String>,
}

impl ShareRequest {
    /// Mood content goes to the mood service; everything else to the hug service.
    pub fn target_service(&self) -> ServiceKind {
        if self.content_type == "mood" {
            ServiceKind::Mood
        } else {
            ServiceKind::Hug
        }
    }
}

/// Read queries available through `fetch_data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuery {
    /// Mood entries over a period.
    MoodHistory,
    /// Aggregated mood statistics.
    MoodAnalytics,
    /// Generated insights.
    MoodInsights,
    /// Current and longest streak.
    MoodStreak,
    /// Public moods from everyone.
    CommunityFeed,
    /// A user's profile.
    UserProfile,
    /// Users a user follows.
    Following,
    /// Users following a user.
    Followers,
    /// Hugs received by the requester.
    HugsReceived,
    /// Hugs sent by the requester.
    HugsSent,
    /// Hug requests involving the requester.
    HugRequests,
    /// Group hugs the requester belongs to.
    GroupHugs,
    /// Media hug catalogue.
    MediaHugs,
}

impl DataQuery {
    /// Every supported query.
    pub const ALL: [DataQuery; 13] = [
        Self::MoodHistory,
        Self::MoodAnalytics,
        Self::MoodInsights,
        Self::MoodStreak,
        Self::CommunityFeed,
        Self::UserProfile,
        Self::Following,
        Self::Followers,
        Self::HugsReceived,
        Self::HugsSent,
        Self::HugRequests,
        Self::GroupHugs,
        Self::MediaHugs,
    ];

    /// Wire name of the query.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MoodHistory => "mood_history",
            Self::MoodAnalytics => "mood_analytics",
            Self::MoodInsights => "mood_insights",
            Self::MoodStreak => "mood_streak",
            Self::CommunityFeed => "community_feed",
            Self::UserProfile => "user_profile",
            Self::Following => "following",
            Self::Followers => "followers",
            Self::HugsReceived => "hugs_received",
            Self::HugsSent => "hugs_sent",
            Self::HugRequests => "hug_requests",
            Self::GroupHugs => "group_hugs",
            Self::MediaHugs => "media_hugs",
        }
    }

    /// Backend owning the data.
    pub fn service(&self) -> ServiceKind {
        match self {
            Self::MoodHistory
            | Self::MoodAnalytics
            | Self::MoodInsights
            | Self::MoodStreak
            | Self::CommunityFeed => ServiceKind::Mood,
            Self::UserProfile | Self::Following | Self::Followers => ServiceKind::Social,
            Self::HugsReceived
            | Self::HugsSent
            | Self::HugRequests
            | Self::GroupHugs
            | Self::MediaHugs => ServiceKind::Hug,
        }
    }
}

impl fmt::Display for DataQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataQuery {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|q| q.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Unknown data type: {s}")))
    }
}

/// Parameters of a read query.
///
/// `requester` is the authenticated user; the remaining request fields are
/// kept as-is and read through the typed accessors.
#[derive(Debug, Clone)]
pub struct QueryParams {
    /// Authenticated user issuing the query.
    pub requester: UserId,
    /// Remaining request fields (`limit`, `offset`, `period`, ...).
    pub fields: Map<String, Value>,
}

impl QueryParams {
    /// Create params for a requester with no extra fields.
    pub fn new(requester: UserId) -> Self {
        Self {
            requester,
            fields: Map::new(),
        }
    }

    /// Add a field.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Explicit `userId` field, falling back to the requester.
    pub fn subject(&self) -> UserId {
        self.str("userId")
            .map(UserId::from)
            .unwrap_or_else(|| self.requester.clone())
    }

    /// String field.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// String field with a default.
    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.str(key).unwrap_or(default)
    }

    /// Integer field with a default.
    pub fn int_or(&self, key: &str, default: i64) -> i64 {
        self.fields.get(key).and_then(Value::as_i64).unwrap_or(default)
    }

    /// Boolean field with a default.
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.fields.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    /// Page size, default 20.
    pub fn limit(&self) -> i64 {
        self.int_or("limit", 20)
    }

    /// Page offset, default 0.
    pub fn offset(&self) -> i64 {
        self.int_or("offset", 0)
    }
}
