//! Bundle of backend handles shared by the gateway.

use std::sync::Arc;

use serde_json::Value;

use hugmood_core::config::ServicesConfig;
use hugmood_core::error::AppError;
use hugmood_core::result::AppResult;

use crate::graphql::{
    GraphqlAuthService, GraphqlClient, GraphqlHugService, GraphqlMoodService,
    GraphqlSocialService,
};
use crate::traits::{AuthService, HugService, MoodService, SocialService};
use crate::types::{DataQuery, QueryParams, ServiceKind, ShareRequest};

/// Handles to every downstream service.
///
/// Cheap to clone; all fields are `Arc`-wrapped.
#[derive(Debug, Clone)]
pub struct Backends {
    /// Auth service.
    pub auth: Arc<dyn AuthService>,
    /// Mood service.
    pub mood: Arc<dyn MoodService>,
    /// Social graph service.
    pub social: Arc<dyn SocialService>,
    /// Hug service.
    pub hug: Arc<dyn HugService>,
}

impl Backends {
    /// Bundle explicit service implementations.
    pub fn new(
        auth: Arc<dyn AuthService>,
        mood: Arc<dyn MoodService>,
        social: Arc<dyn SocialService>,
        hug: Arc<dyn HugService>,
    ) -> Self {
        Self {
            auth,
            mood,
            social,
            hug,
        }
    }

    /// GraphQL-over-HTTP clients for the configured endpoints.
    pub fn graphql(config: &ServicesConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .user_agent(concat!("hugmood-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                AppError::configuration(format!("Failed to build downstream HTTP client: {e}"))
            })?;

        tracing::info!(
            auth = %config.auth_url,
            user = %config.user_url,
            mood = %config.mood_url,
            hug = %config.hug_url,
            "Downstream service endpoints configured"
        );

        Ok(Self::new(
            Arc::new(GraphqlAuthService::new(GraphqlClient::new(
                &config.auth_url,
                http.clone(),
            ))),
            Arc::new(GraphqlMoodService::new(GraphqlClient::new(
                &config.mood_url,
                http.clone(),
            ))),
            Arc::new(GraphqlSocialService::new(GraphqlClient::new(
                &config.user_url,
                http.clone(),
            ))),
            Arc::new(GraphqlHugService::new(GraphqlClient::new(
                &config.hug_url,
                http,
            ))),
        ))
    }

    /// Route a read query to the service owning its data.
    pub async fn query(
        &self,
        query: DataQuery,
        params: &QueryParams,
        bearer: Option<&str>,
    ) -> AppResult<Value> {
        match query.service() {
            ServiceKind::Mood => self.mood.query(query, params, bearer).await,
            ServiceKind::Social => self.social.query(query, params, bearer).await,
            ServiceKind::Hug => self.hug.query(query, params, bearer).await,
            ServiceKind::Auth => Err(AppError::internal(format!(
                "Query {query} has no auth-service route"
            ))),
        }
    }

    /// Route a share to the service owning the content type.
    pub async fn share_to_social(
        &self,
        share: &ShareRequest,
        bearer: Option<&str>,
    ) -> AppResult<Value> {
        match share.target_service() {
            ServiceKind::Mood => self.mood.share_to_social(share, bearer).await,
            _ => self.hug.share_to_social(share, bearer).await,
        }
    }
}
