//! Hug service client.

use async_trait::async_trait;
use serde_json::{Value, json};

use hugmood_core::error::AppError;
use hugmood_core::result::AppResult;

use super::{GraphqlClient, queries};
use crate::traits::HugService;
use crate::types::{DataQuery, NewGroupHug, NewHug, NewHugRequest, QueryParams, ShareRequest};

/// [`HugService`] backed by the hug GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct GraphqlHugService {
    client: GraphqlClient,
}

impl GraphqlHugService {
    /// Create a new hug client.
    pub fn new(client: GraphqlClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HugService for GraphqlHugService {
    async fn send_hug(&self, hug: &NewHug, bearer: Option<&str>) -> AppResult<Value> {
        self.client
            .execute_required(
                "sendHug",
                &queries::send_hug(),
                json!({ "input": hug }),
                bearer,
                "Failed to send hug",
            )
            .await
    }

    async fn request_hug(
        &self,
        request: &NewHugRequest,
        bearer: Option<&str>,
    ) -> AppResult<Value> {
        self.client
            .execute_required(
                "requestHug",
                &queries::request_hug(),
                json!({ "input": request }),
                bearer,
                "Failed to create hug request",
            )
            .await
    }

    async fn create_group_hug(
        &self,
        group: &NewGroupHug,
        bearer: Option<&str>,
    ) -> AppResult<Value> {
        self.client
            .execute_required(
                "createGroupHug",
                &queries::create_group_hug(),
                json!({ "input": group }),
                bearer,
                "Failed to create group hug",
            )
            .await
    }

    async fn query(
        &self,
        query: DataQuery,
        params: &QueryParams,
        bearer: Option<&str>,
    ) -> AppResult<Value> {
        let requester = &params.requester;
        let page = (params.limit(), params.offset());
        let (operation, document, variables) = match query {
            DataQuery::HugsReceived | DataQuery::HugsSent => {
                let direction = if query == DataQuery::HugsSent {
                    "sent"
                } else {
                    "received"
                };
                (
                    "hugs",
                    queries::hugs(),
                    json!({ "userId": requester, "type": direction, "limit": page.0, "offset": page.1 }),
                )
            }
            DataQuery::HugRequests => (
                "hugRequests",
                queries::hug_requests(),
                json!({
                    "userId": requester,
                    "status": params.str_or("status", "pending"),
                    "limit": page.0,
                    "offset": page.1,
                }),
            ),
            DataQuery::GroupHugs => (
                "groupHugs",
                queries::group_hugs(),
                json!({
                    "userId": requester,
                    "status": params.str_or("status", "active"),
                    "limit": page.0,
                    "offset": page.1,
                }),
            ),
            DataQuery::MediaHugs => (
                "mediaHugs",
                queries::media_hugs(),
                json!({
                    "category": params.str("category"),
                    "mood": params.str("mood"),
                    "limit": page.0,
                    "offset": page.1,
                }),
            ),
            other => {
                return Err(AppError::internal(format!(
                    "Query {other} is not served by the hug service"
                )));
            }
        };

        self.client
            .execute(operation, &document, variables, bearer)
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
