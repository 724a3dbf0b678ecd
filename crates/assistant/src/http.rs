//! Reqwest implementation of [`AssistantBackend`] for assistants-style
//! thread/run REST APIs.

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    serde_json::json,
};

use crate::{
    api::{AssistantBackend, Role, Run, RunId, RunStatus, ThreadId, ThreadMessage},
    error::{Error, Result},
};

const BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Secret<String>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, api_key: Secret<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .header(BETA_HEADER.0, BETA_HEADER.1)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .header(BETA_HEADER.0, BETA_HEADER.1)
    }

    /// Turn a non-success response into [`Error::Api`] with the body text.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(Error::api(status.as_u16(), message))
        }
    }
}

#[async_trait]
impl AssistantBackend for HttpBackend {
    async fn create_thread(&self) -> Result<ThreadId> {
        let response = Self::check(self.post("/threads").send().await?).await?;
        let thread: ThreadObject = response.json().await?;
        Ok(ThreadId(thread.id))
    }

    async fn create_message(&self, thread: &ThreadId, content: &str) -> Result<()> {
        let body = json!({ "role": "user", "content": content });
        let response = self
            .post(&format!("/threads/{thread}/messages"))
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn create_run(&self, thread: &ThreadId, assistant_id: &str) -> Result<Run> {
        let body = json!({ "assistant_id": assistant_id });
        let response = self
            .post(&format!("/threads/{thread}/runs"))
            .json(&body)
            .send()
            .await?;
        let run: RunObject = Self::check(response).await?.json().await?;
        Ok(Run {
            id: RunId(run.id),
            created_at: run.created_at,
        })
    }

    async fn run_status(&self, thread: &ThreadId, run: &RunId) -> Result<RunStatus> {
        let response = self.get(&format!("/threads/{thread}/runs/{run}")).send().await?;
        let run: RunStatusObject = Self::check(response).await?.json().await?;
        Ok(run.status)
    }

    async fn list_messages(&self, thread: &ThreadId) -> Result<Vec<ThreadMessage>> {
        let response = self.get(&format!("/threads/{thread}/messages")).send().await?;
        let list: MessageList = Self::check(response).await?.json().await?;
        Ok(list.data.into_iter().map(MessageObject::flatten).collect())
    }
}

// ── Wire types ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ThreadObject {
    id: String,
}

#[derive(Deserialize)]
struct RunObject {
    id: String,
    created_at: i64,
}

#[derive(Deserialize)]
struct RunStatusObject {
    status: RunStatus,
}

#[derive(Deserialize)]
struct MessageList {
    data: Vec<MessageObject>,
}

#[derive(Deserialize)]
struct MessageObject {
    role: Role,
    created_at: i64,
    #[serde(default)]
    content: Vec<ContentBlock>,
}

impl MessageObject {
    /// Flatten the content blocks to the first text value; messages without
    /// one (image-only, for instance) flatten to an empty string.
    fn flatten(self) -> ThreadMessage {
        let content = self
            .content
            .into_iter()
            .find_map(|block| match block {
                ContentBlock::Text { text } => Some(text.value),
                ContentBlock::Other => None,
            })
            .unwrap_or_default();
        ThreadMessage {
            role: self.role,
            created_at: self.created_at,
            content,
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: TextValue },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct TextValue {
    value: String,
}
