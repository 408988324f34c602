use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use super::{AcceptanceDecision, MatchmakingService, ServiceError};
use crate::ticket::{TicketDescription, TicketRequest};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON gateway in front of the matchmaking service.
///
/// `POST /tickets` submits a ticket, `GET /tickets/{id}` describes one and
/// `POST /tickets/{id}/acceptance` records an accept or reject decision.
#[derive(Debug, Clone)]
pub struct HttpMatchmakingService {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartMatchmakingResponse {
    ticket_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AcceptMatchRequest<'a> {
    player_ids: &'a [String],
    acceptance_type: AcceptanceDecision,
}

impl HttpMatchmakingService {
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ServiceError::Transport)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn tickets_url(&self) -> String {
        format!("{}/tickets", self.base_url)
    }

    fn ticket_url(&self, ticket_id: &str) -> String {
        format!("{}/tickets/{ticket_id}", self.base_url)
    }
}

#[async_trait]
impl MatchmakingService for HttpMatchmakingService {
    async fn start_matchmaking(&self, request: &TicketRequest) -> Result<String, ServiceError> {
        let response = self
            .client
            .post(self.tickets_url())
            .json(request)
            .send()
            .await
            .map_err(ServiceError::Transport)?;

        let body: StartMatchmakingResponse = success(response)
            .await?
            .json()
            .await
            .map_err(|err| ServiceError::Decode(err.to_string()))?;
        Ok(body.ticket_id)
    }

    async fn describe_ticket(&self, ticket_id: &str) -> Result<TicketDescription, ServiceError> {
        let response = self
            .client
            .get(self.ticket_url(ticket_id))
            .send()
            .await
            .map_err(ServiceError::Transport)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ServiceError::UnknownTicket(ticket_id.to_string()));
        }

        success(response)
            .await?
            .json()
            .await
            .map_err(|err| ServiceError::Decode(err.to_string()))
    }

    async fn accept_match(
        &self,
        ticket_id: &str,
        player_ids: &[String],
        decision: AcceptanceDecision,
    ) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(format!("{}/acceptance", self.ticket_url(ticket_id)))
            .json(&AcceptMatchRequest {
                player_ids,
                acceptance_type: decision,
            })
            .send()
            .await
            .map_err(ServiceError::Transport)?;

        success(response).await.map(|_| ())
    }
}

async fn success(response: Response) -> Result<Response, ServiceError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Api { status, body })
}
