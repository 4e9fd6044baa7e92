//! `fetch_data`: read-only queries against the owning backend.

use async_trait::async_trait;

use hugmood_services::{DataQuery, QueryParams};

use crate::dispatch::handler::{Handled, RequestContext, RequestHandler};
use crate::error::RequestError;
use crate::message::{Envelope, builder};

/// Fields that steer the query and are not forwarded as parameters.
const RESERVED_FIELDS: [&str; 2] = ["dataType", "token"];

/// Routes a named query to the mood, social, or hug backend.
#[derive(Debug, Default)]
pub struct FetchDataHandler;

#[async_trait]
impl RequestHandler for FetchDataHandler {
    fn request_type(&self) -> &'static str {
        "fetch_data"
    }

    fn failure_prefix(&self, request: &Envelope) -> String {
        format!(
            "Failed to fetch {}",
            request.str_field("dataType").unwrap_or("data")
        )
    }

    async fn handle(
        &self,
        ctx: &RequestContext,
        request: &Envelope,
    ) -> Result<Handled, RequestError> {
        let data_type = request
            .str_field("dataType")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| RequestError::InvalidPayload("dataType is required".to_string()))?;
        let query: DataQuery = data_type.parse()?;

        let mut params = QueryParams::new(ctx.user_id()?.clone());
        params.fields = request
            .fields
            .iter()
            .filter(|(key, _)| !RESERVED_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let data = ctx
            .backends
            .query(query, &params, ctx.bearer(request))
            .await?;
        Ok(Handled::reply(builder::fetch_success(query.as_str(), data)))
    }
}
