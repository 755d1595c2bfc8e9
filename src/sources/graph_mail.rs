use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::{
    FetchQuery, RecordSource, SourceError, TokenCache, non_empty, parse_timestamp,
    read_success_body,
};
use crate::{
    config::{ClientCredentials, MailSourceConfig},
    models::EmailRecord,
};

const SERVICE: &str = "graph";

/// Fields requested from the list-messages endpoint.
const MESSAGE_PROJECTION: &str = "id,subject,from,receivedDateTime,bodyPreview";

/// Mailbox fetcher backed by the Microsoft Graph list-messages endpoint.
pub struct GraphMailSource {
    http: reqwest::Client,
    config: MailSourceConfig,
    tokens: Arc<TokenCache>,
}

impl GraphMailSource {
    pub fn new(http: reqwest::Client, config: MailSourceConfig, tokens: Arc<TokenCache>) -> Self {
        Self {
            http,
            config,
            tokens,
        }
    }

    /// Resolve credentials and mailbox, naming everything that is missing.
    fn settings(&self) -> Result<(ClientCredentials, &str), SourceError> {
        let credentials = self.config.credentials();
        let mailbox = self.config.mailbox();

        match (credentials, mailbox) {
            (Ok(credentials), Some(mailbox)) => Ok((credentials, mailbox)),
            (credentials, mailbox) => {
                let mut missing = credentials.err().unwrap_or_default();
                if mailbox.is_none() {
                    missing.push("mail.mailbox");
                }
                Err(SourceError::NotConfigured(missing.join(", ")))
            }
        }
    }

    fn messages_url(&self, mailbox: &str) -> Result<Url, SourceError> {
        let mut url = Url::parse(&self.config.graph_url).map_err(|e| {
            SourceError::NotConfigured(format!("mail.graph_url is invalid: {e}"))
        })?;
        url.path_segments_mut()
            .map_err(|_| SourceError::NotConfigured("mail.graph_url cannot be a base URL".into()))?
            .pop_if_empty()
            .extend(["users", mailbox, "messages"]);
        Ok(url)
    }
}

#[async_trait]
impl RecordSource for GraphMailSource {
    type Record = EmailRecord;

    fn name(&self) -> &'static str {
        SERVICE
    }

    #[tracing::instrument(name = "graph.fetch", skip_all)]
    async fn fetch(&self, _query: &FetchQuery) -> Result<Vec<EmailRecord>, SourceError> {
        let (credentials, mailbox) = self.settings()?;
        let url = self.messages_url(mailbox)?;
        let token = self.tokens.get_access_token(&credentials).await?;

        let response = self
            .http
            .get(url)
            .bearer_auth(&*token)
            .query(&[
                ("$top", self.config.page_size.to_string()),
                ("$select", MESSAGE_PROJECTION.to_string()),
            ])
            .send()
            .await?;

        let body = read_success_body(SERVICE, response).await?;
        let page: MessagePage = serde_json::from_str(&body).map_err(|e| SourceError::Decode {
            service: SERVICE,
            message: e.to_string(),
        })?;

        let records: Vec<EmailRecord> = page
            .value
            .unwrap_or_default()
            .into_iter()
            .filter_map(|message| {
                let record = message.into_record();
                if record.is_none() {
                    tracing::warn!("Skipping message without an id");
                }
                record
            })
            .collect();

        tracing::debug!(count = records.len(), "Fetched mailbox messages");
        Ok(records)
    }
}

#[derive(Debug, Deserialize)]
struct MessagePage {
    #[serde(default)]
    value: Option<Vec<GraphMessage>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphMessage {
    id: Option<String>,
    subject: Option<String>,
    from: Option<GraphRecipient>,
    received_date_time: Option<String>,
    body_preview: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphRecipient {
    email_address: Option<GraphEmailAddress>,
}

#[derive(Debug, Deserialize)]
struct GraphEmailAddress {
    address: Option<String>,
}

impl GraphMessage {
    fn into_record(self) -> Option<EmailRecord> {
        Some(EmailRecord {
            id: non_empty(self.id)?,
            subject: non_empty(self.subject),
            sender_address: non_empty(
                self.from
                    .and_then(|from| from.email_address)
                    .and_then(|address| address.address),
            ),
            received_at: parse_timestamp(SERVICE, "receivedDateTime", self.received_date_time),
            preview: non_empty(self.body_preview),
        })
    }
}
