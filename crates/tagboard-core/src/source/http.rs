//! HTTP client for the tag collection service.

use super::TagSource;
use crate::error::ApiError;
use crate::model::{CreateTagRequest, QueryKey, Tag, TagResponse};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3333";

/// Blocking client for `{base_url}/tags`.
#[derive(Debug, Clone)]
pub struct HttpTagSource {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpTagSource {
    #[must_use]
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("tagboard/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn tags_url(&self) -> String {
        format!("{}/tags", self.base_url)
    }
}

impl TagSource for HttpTagSource {
    fn fetch_page(&self, key: &QueryKey, per_page: u32) -> Result<TagResponse, ApiError> {
        let url = self.tags_url();
        debug!(%url, %key, per_page, "GET tags");
        let response = self
            .agent
            .get(&url)
            .query("_page", &key.page.to_string())
            .query("_per_page", &per_page.to_string())
            .query("title", &key.filter)
            .call()
            .map_err(|err| map_ureq_error(&url, err))?;

        response
            .into_json::<TagResponse>()
            .map_err(|err| ApiError::Decode {
                url,
                message: err.to_string(),
            })
    }

    fn create_tag(&self, request: &CreateTagRequest) -> Result<Tag, ApiError> {
        let url = self.tags_url();
        debug!(%url, title = %request.title, slug = %request.slug, "POST tags");
        let response = self
            .agent
            .post(&url)
            .send_json(request)
            .map_err(|err| map_ureq_error(&url, err))?;

        response.into_json::<Tag>().map_err(|err| ApiError::Decode {
            url,
            message: err.to_string(),
        })
    }
}

fn map_ureq_error(url: &str, err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Status(status, _) => ApiError::Status {
            url: url.to_string(),
            status,
        },
        ureq::Error::Transport(transport) => ApiError::Transport {
            url: url.to_string(),
            message: transport.to_string(),
        },
    }
}
