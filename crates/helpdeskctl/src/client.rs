//! HTTP client for the helpdesk daemon.

use anyhow::{anyhow, Context, Result};
use helpdesk_common::{
    AskRequest, AskResponse, CreateTicketRequest, ErrorResponse, HealthResponse, LoginRequest,
    LoginResponse, NewMessageRequest, ReopenRequest, StatsResponse, Ticket, TicketDetailResponse,
    TicketEnvelope, TicketListResponse, TicketStats, UpdateTicketRequest,
};
use reqwest::Response;

/// Environment variable carrying the admin session token for `reopen`.
pub const ADMIN_TOKEN_ENV: &str = "HELPDESK_ADMIN_TOKEN";

/// Client for the helpdeskd HTTP API.
pub struct HelpdeskClient {
    base_url: String,
    http: reqwest::Client,
}

impl HelpdeskClient {
    pub fn new(server: &str) -> Self {
        Self {
            base_url: server.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<Response> {
        req.send().await.with_context(|| {
            format!(
                "Cannot reach the helpdesk daemon at {}.\nIs helpdeskd running?",
                self.base_url
            )
        })
    }

    /// Decode a response, turning a failing status into the daemon's own
    /// error message rather than a bare status code.
    async fn expect_json<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            return Err(match resp.json::<ErrorResponse>().await {
                Ok(body) => anyhow!("{}", body.error),
                Err(_) => anyhow!("HTTP {} from daemon", status),
            });
        }
        Ok(resp.json().await?)
    }

    pub async fn create_ticket(
        &self,
        requester: &str,
        description: &str,
        priority: Option<&str>,
    ) -> Result<Ticket> {
        let body = CreateTicketRequest {
            requester_name: requester.to_string(),
            description: description.to_string(),
            priority: priority.map(String::from),
        };
        let resp = self
            .send(self.http.post(self.url("/api/tickets")).json(&body))
            .await?;
        let envelope: TicketEnvelope = Self::expect_json(resp).await?;
        Ok(envelope.ticket)
    }

    pub async fn list_tickets(
        &self,
        status: Option<&str>,
        priority: Option<&str>,
        assignee: Option<&str>,
        search: Option<&str>,
    ) -> Result<TicketListResponse> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(s) = status {
            query.push(("status", s));
        }
        if let Some(p) = priority {
            query.push(("priority", p));
        }
        if let Some(a) = assignee {
            query.push(("assignee", a));
        }
        if let Some(s) = search {
            query.push(("search", s));
        }

        let resp = self
            .send(self.http.get(self.url("/api/tickets")).query(&query))
            .await?;
        Self::expect_json(resp).await
    }

    pub async fn ticket_detail(&self, id: i64) -> Result<TicketDetailResponse> {
        let resp = self
            .send(self.http.get(self.url(&format!("/api/tickets/{}", id))))
            .await?;
        Self::expect_json(resp).await
    }

    pub async fn update_ticket(&self, id: i64, update: &UpdateTicketRequest) -> Result<Ticket> {
        let resp = self
            .send(
                self.http
                    .put(self.url(&format!("/api/tickets/{}", id)))
                    .json(update),
            )
            .await?;
        let envelope: TicketEnvelope = Self::expect_json(resp).await?;
        Ok(envelope.ticket)
    }

    pub async fn reopen_ticket(&self, id: i64, token: &str, to: Option<&str>) -> Result<Ticket> {
        let body = ReopenRequest {
            status: to.map(String::from),
        };
        let resp = self
            .send(
                self.http
                    .post(self.url(&format!("/api/tickets/{}/reopen", id)))
                    .header("Authorization", format!("Bearer {}", token))
                    .json(&body),
            )
            .await?;
        let envelope: TicketEnvelope = Self::expect_json(resp).await?;
        Ok(envelope.ticket)
    }

    pub async fn add_message(&self, id: i64, author_name: &str, body: &str) -> Result<()> {
        let req = NewMessageRequest {
            author: None,
            author_name: author_name.to_string(),
            body: body.to_string(),
        };
        let resp = self
            .send(
                self.http
                    .post(self.url(&format!("/api/tickets/{}/messages", id)))
                    .json(&req),
            )
            .await?;
        let _: serde_json::Value = Self::expect_json(resp).await?;
        Ok(())
    }

    pub async fn ask(&self, req: &AskRequest) -> Result<AskResponse> {
        let resp = self
            .send(self.http.post(self.url("/api/agent/ask")).json(req))
            .await?;
        Self::expect_json(resp).await
    }

    pub async fn stats(&self) -> Result<TicketStats> {
        let resp = self.send(self.http.get(self.url("/api/stats"))).await?;
        let body: StatsResponse = Self::expect_json(resp).await?;
        Ok(body.stats)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let resp = self.send(self.http.get(self.url("/api/health"))).await?;
        Self::expect_json(resp).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let resp = self
            .send(self.http.post(self.url("/api/admin/login")).json(&body))
            .await?;
        Self::expect_json(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = HelpdeskClient::new("http://127.0.0.1:7810/");
        assert_eq!(
            client.url("/api/tickets"),
            "http://127.0.0.1:7810/api/tickets"
        );
    }

    #[test]
    fn test_url_join_without_trailing_slash() {
        let client = HelpdeskClient::new("http://helpdesk.internal:9000");
        assert_eq!(
            client.url("/api/health"),
            "http://helpdesk.internal:9000/api/health"
        );
    }
}
