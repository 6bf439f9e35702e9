//! HTTP client for the call gateway sidecar.
//!
//! The gateway owns the driving account's chat session and the live
//! group-call media engine. This client speaks its small JSON API and
//! implements [`VoiceCallClient`] and [`GroupDirectory`] on top of it.

use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::platform::error::{PlatformError, PlatformResult};
use crate::platform::traits::{GroupDirectory, VoiceCallClient};
use crate::platform::types::{AccountId, GroupId};
use crate::utils::truncate_diagnostic;

#[derive(Serialize)]
struct StreamSourceBody<'a> {
    source: &'a str,
}

#[derive(Deserialize)]
struct WhoAmIResponse {
    id: i64,
}

#[derive(Deserialize)]
struct MembershipResponse {
    member: bool,
}

#[derive(Deserialize)]
struct GatewayErrorBody {
    error: String,
}

/// Call gateway client.
///
/// Cheap to clone; the underlying `reqwest::Client` pools connections.
#[derive(Clone)]
pub struct CallGatewayClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl CallGatewayClient {
    /// Creates a client for the gateway at `base_url` (e.g. `http://127.0.0.1:8090`).
    pub fn new(client: Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, action: &str, req: RequestBuilder) -> PlatformResult<Response> {
        let start = Instant::now();
        let res = self.authorize(req).send().await;
        log::debug!(
            "[Gateway] {} completed in {:?}: {:?}",
            action,
            start.elapsed(),
            res.as_ref().map(|r| r.status())
        );
        let res = res?;

        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let body = res.text().await.unwrap_or_default();
        if status == StatusCode::CONFLICT || status == StatusCode::UNPROCESSABLE_ENTITY {
            if let Ok(err) = serde_json::from_str::<GatewayErrorBody>(&body) {
                return Err(PlatformError::Rejected(err.error));
            }
        }
        Err(PlatformError::HttpStatus(
            status.as_u16(),
            truncate_diagnostic(&body),
        ))
    }

    async fn post_source(&self, action: &str, path: &str, source: &Path) -> PlatformResult<()> {
        let source = source.to_string_lossy();
        let req = self
            .client
            .post(self.url(path))
            .json(&StreamSourceBody { source: &source });
        self.send(action, req).await.map(|_| ())
    }
}

#[async_trait]
impl VoiceCallClient for CallGatewayClient {
    async fn join_call(&self, group_id: GroupId, source: &Path) -> PlatformResult<()> {
        self.post_source(
            "JoinCall",
            &format!("/v1/groups/{group_id}/call/join"),
            source,
        )
        .await
    }

    async fn change_stream(&self, group_id: GroupId, source: &Path) -> PlatformResult<()> {
        self.post_source(
            "ChangeStream",
            &format!("/v1/groups/{group_id}/call/change"),
            source,
        )
        .await
    }

    async fn leave_call(&self, group_id: GroupId) -> PlatformResult<()> {
        let req = self
            .client
            .post(self.url(&format!("/v1/groups/{group_id}/call/leave")));
        self.send("LeaveCall", req).await.map(|_| ())
    }
}

#[async_trait]
impl GroupDirectory for CallGatewayClient {
    async fn whoami(&self) -> PlatformResult<AccountId> {
        let res = self
            .send("WhoAmI", self.client.get(self.url("/v1/me")))
            .await?;
        let body: WhoAmIResponse = res
            .json()
            .await
            .map_err(|e| PlatformError::Decode(e.to_string()))?;
        Ok(AccountId(body.id))
    }

    async fn warm_up(&self, group_id: GroupId) -> PlatformResult<()> {
        let req = self
            .client
            .post(self.url(&format!("/v1/groups/{group_id}/resolve")));
        self.send("WarmUp", req).await.map(|_| ())
    }

    async fn is_member(&self, group_id: GroupId, account: AccountId) -> PlatformResult<bool> {
        let req = self
            .client
            .get(self.url(&format!("/v1/groups/{group_id}/members/{account}")));
        match self.send("GetMember", req).await {
            Ok(res) => {
                let body: MembershipResponse = res
                    .json()
                    .await
                    .map_err(|e| PlatformError::Decode(e.to_string()))?;
                Ok(body.member)
            }
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}
