//! User service client for the social graph.

use async_trait::async_trait;
use serde_json::{Value, json};

use hugmood_core::error::AppError;
use hugmood_core::result::AppResult;
use hugmood_core::types::UserId;

use super::{GraphqlClient, queries};
use crate::traits::SocialService;
use crate::types::{DataQuery, QueryParams};

/// [`SocialService`] backed by the user GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct GraphqlSocialService {
    client: GraphqlClient,
}

impl GraphqlSocialService {
    /// Create a new social client.
    pub fn new(client: GraphqlClient) -> Self {
        Self { client }
    }

    async fn follow_mutation(
        &self,
        operation: &str,
        action: &str,
        target: &UserId,
        bearer: Option<&str>,
    ) -> AppResult<Value> {
        self.client
            .execute_required(
                operation,
                &queries::follow_mutation(operation),
                json!({ "userId": target }),
                bearer,
                &format!("Failed to {action} user"),
            )
            .await
    }
}

#[async_trait]
impl SocialService for GraphqlSocialService {
    async fn follow_user(&self, target: &UserId, bearer: Option<&str>) -> AppResult<Value> {
        self.follow_mutation("followUser", "follow", target, bearer).await
    }

    async fn unfollow_user(&self, target: &UserId, bearer: Option<&str>) -> AppResult<Value> {
        self.follow_mutation("unfollowUser", "unfollow", target, bearer).await
    }

    async fn query(
        &self,
        query: DataQuery,
        params: &QueryParams,
        bearer: Option<&str>,
    ) -> AppResult<Value> {
        let subject = params.subject();
        match query {
            DataQuery::UserProfile => {
                self.client
                    .execute(
                        "userProfile",
                        &queries::user_profile(),
                        json!({ "userId": subject }),
                        bearer,
                    )
                    .await
            }
            DataQuery::Following | DataQuery::Followers => {
                let operation = query.as_str();
                self.client
                    .execute(
                        operation,
                        &queries::follow_list(operation),
                        json!({
                            "userId": subject,
                            "limit": params.limit(),
                            "offset": params.offset(),
                        }),
                        bearer,
                    )
                    .await
            }
            other => Err(AppError::internal(format!(
                "Query {other} is not served by the user service"
            ))),
        }
    }
}
