//! Mood service client.

use async_trait::async_trait;
use serde_json::{Value, json};

use hugmood_core::error::AppError;
use hugmood_core::result::AppResult;
use hugmood_core::types::UserId;

use super::{GraphqlClient, queries};
use crate::traits::MoodService;
use crate::types::{DataQuery, MoodStreak, NewMood, QueryParams, ShareRequest};

/// [`MoodService`] backed by the mood GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct GraphqlMoodService {
    client: GraphqlClient,
}

impl GraphqlMoodService {
    /// Create a new mood client.
    pub fn new(client: GraphqlClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MoodService for GraphqlMoodService {
    async fn create_mood(&self, mood: &NewMood, bearer: Option<&str>) -> AppResult<Value> {
        self.client
            .execute_required(
                "createMood",
                queries::CREATE_MOOD,
                json!({ "input": mood }),
                bearer,
                "Failed to create mood",
            )
            .await
    }

    async fn mood_streak(&self, user_id: &UserId, bearer: Option<&str>) -> AppResult<MoodStreak> {
        let value = self
            .client
            .execute_required(
                "moodStreak",
                queries::MOOD_STREAK,
                json!({ "userId": user_id }),
                bearer,
                "Mood streak unavailable",
            )
            .await?;
        serde_json::from_value(value).map_err(|e| {
            AppError::external_service(format!("moodStreak returned a malformed streak: {e}"))
        })
    }

    async fn query(
        &self,
        query: DataQuery,
        params: &QueryParams,
        bearer: Option<&str>,
    ) -> AppResult<Value> {
        let requester = &params.requester;
        let (operation, document, variables) = match query {
            DataQuery::MoodHistory => (
                "moodHistory",
                queries::MOOD_HISTORY,
                json!({ "userId": requester, "period": params.str_or("period", "30days") }),
            ),
            DataQuery::MoodAnalytics => (
                "moodAnalytics",
                queries::MOOD_ANALYTICS,
                json!({
                    "userId": requester,
                    "timeRange": params.int_or("timeRange", 30),
                    "includeCorrelations": params.bool_or("includeCorrelations", true),
                }),
            ),
            DataQuery::MoodInsights => (
                "moodInsights",
                queries::MOOD_INSIGHTS,
                json!({ "userId": requester }),
            ),
            DataQuery::MoodStreak => (
                "moodStreak",
                queries::MOOD_STREAK,
                json!({ "userId": requester }),
            ),
            DataQuery::CommunityFeed => (
                "communityMoods",
                queries::COMMUNITY_MOODS,
                json!({ "limit": params.limit(), "offset": params.offset() }),
            ),
            other => {
                return Err(AppError::internal(format!(
                    "Query {other} is not served by the mood service"
                )));
            }
        };

        self.client
            .execute(operation, document, variables, bearer)
            .await
    }

    async fn share_to_social(
        &self,
        share: &ShareRequest,
        bearer: Option<&str>,
    ) -> AppResult<Value> {
        self.client
            .execute_required(
                "shareToSocial",
                queries::SHARE_TO_SOCIAL,
                json!({ "input": share }),
                bearer,
                "Failed to share content",
            )
            .await
    }
}
