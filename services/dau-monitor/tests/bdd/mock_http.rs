//! Scripted HTTP client for BDD tests

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use dau_monitor::io::{HttpClient, HttpResponse};
use dau_monitor::{DauMonitorError, Result};
use tokio::sync::Mutex;

/// What a scripted GET does
#[derive(Debug, Clone)]
pub enum Reply {
    Respond {
        status: u16,
        body: String,
        delay: Duration,
    },
    Timeout,
    Refused,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Reply::Respond {
            status: 200,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Reply::Respond {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }
}

/// Replies are consumed in order per URL; the last one repeats
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    gets: Mutex<Vec<String>>,
    posts: Mutex<Vec<(String, serde_json::Value)>>,
    callback_status: Mutex<Option<u16>>,
}

impl ScriptedHttpClient {
    pub async fn script(&self, url: &str, reply: Reply) {
        self.replies
            .lock()
            .await
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
    }

    pub async fn set_callback_status(&self, status: u16) {
        *self.callback_status.lock().await = Some(status);
    }

    pub async fn get_count(&self, url: &str) -> usize {
        self.gets.lock().await.iter().filter(|u| *u == url).count()
    }

    pub async fn posts(&self) -> Vec<(String, serde_json::Value)> {
        self.posts.lock().await.clone()
    }

    async fn next_reply(&self, url: &str) -> Option<Reply> {
        let mut replies = self.replies.lock().await;
        let queue = replies.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<HttpResponse> {
        self.gets.lock().await.push(url.to_string());

        match self.next_reply(url).await {
            Some(Reply::Respond {
                status,
                body,
                delay,
            }) => {
                tokio::time::sleep(delay).await;
                Ok(HttpResponse { status, body })
            }
            Some(Reply::Timeout) => Err(DauMonitorError::Timeout),
            Some(Reply::Refused) | None => Err(DauMonitorError::Http(format!(
                "GET {} failed: connection refused",
                url
            ))),
        }
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        _timeout: Duration,
    ) -> Result<HttpResponse> {
        self.posts
            .lock()
            .await
            .push((url.to_string(), body.clone()));
        let status = self.callback_status.lock().await.unwrap_or(200);
        Ok(HttpResponse {
            status,
            body: String::new(),
        })
    }
}
