//! Async HTTP client wrapping the registrar JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use registrar_core::{entity::EntityKind, query::Listing};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// Connection settings for the registrar API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub email:    String,
  pub password: String,
}

/// Async HTTP client for the registrar JSON REST API.
///
/// Logs in lazily on the first request and reuses the bearer token.
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
  token:  Option<String>,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config, token: None })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  /// `POST /api/login`, once per client.
  async fn token(&mut self) -> Result<String> {
    if let Some(token) = &self.token {
      return Ok(token.clone());
    }
    if self.config.email.is_empty() {
      return Err(anyhow!("no credentials: set --email/--password or REGISTRAR_EMAIL"));
    }
    let resp = self
      .client
      .post(self.url("/login"))
      .json(&json!({ "email": self.config.email, "password": self.config.password }))
      .send()
      .await
      .context("POST /login failed")?;
    let body: Value = expect_success("POST /login", resp).await?;
    let token = body["token"]
      .as_str()
      .ok_or_else(|| anyhow!("login response carried no token"))?
      .to_owned();
    tracing::debug!("logged in as {}", self.config.email);
    self.token = Some(token.clone());
    Ok(token)
  }

  async fn request(&mut self, method: Method, path: &str) -> Result<RequestBuilder> {
    let token = self.token().await?;
    Ok(self.client.request(method, self.url(path)).bearer_auth(token))
  }

  async fn call<T: DeserializeOwned>(
    &mut self,
    method: Method,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<T> {
    let label = format!("{method} {path}");
    let resp = self
      .request(method, path)
      .await?
      .query(query)
      .send()
      .await
      .with_context(|| format!("{label} failed"))?;
    expect_success(&label, resp).await
  }

  // ── Records ───────────────────────────────────────────────────────────────

  /// `GET /api/{resource}`
  pub async fn list(
    &mut self,
    kind: EntityKind,
    query: &[(&str, String)],
  ) -> Result<Listing<Value>> {
    self.call(Method::GET, &format!("/{}", kind.path()), query).await
  }

  /// `GET /api/{resource}/{id}?view=`
  pub async fn show(&mut self, kind: EntityKind, id: i64, view: &str) -> Result<Value> {
    let query = [("view", view.to_owned())];
    self.call(Method::GET, &format!("/{}/{id}", kind.path()), &query).await
  }

  // ── Lifecycle ─────────────────────────────────────────────────────────────

  /// `DELETE /api/{resource}/{id}`
  pub async fn archive(&mut self, kind: EntityKind, id: i64) -> Result<String> {
    let body: Value = self.call(Method::DELETE, &format!("/{}/{id}", kind.path()), &[]).await?;
    Ok(message(&body))
  }

  /// `PATCH /api/{resource}/{id}/restore`
  pub async fn restore(&mut self, kind: EntityKind, id: i64) -> Result<String> {
    let path = format!("/{}/{id}/restore", kind.path());
    let body: Value = self.call(Method::PATCH, &path, &[]).await?;
    Ok(message(&body))
  }

  /// `DELETE /api/{resource}/{id}/force`
  pub async fn purge(&mut self, kind: EntityKind, id: i64) -> Result<String> {
    let path = format!("/{}/{id}/force", kind.path());
    let body: Value = self.call(Method::DELETE, &path, &[]).await?;
    Ok(message(&body))
  }

  // ── Academic years and aggregates ─────────────────────────────────────────

  /// `PATCH /api/academic-years/{id}/activate`
  pub async fn activate(&mut self, id: i64) -> Result<Value> {
    self.call(Method::PATCH, &format!("/academic-years/{id}/activate"), &[]).await
  }

  /// `GET /api/dashboard`
  pub async fn dashboard(&mut self) -> Result<Value> {
    self.call(Method::GET, "/dashboard", &[]).await
  }

  /// `GET /api/{students,faculties}/by-department`
  pub async fn by_department(&mut self, kind: EntityKind) -> Result<Value> {
    self.call(Method::GET, &format!("/{}/by-department", kind.path()), &[]).await
  }
}

fn message(body: &Value) -> String {
  body["message"].as_str().unwrap_or_default().to_owned()
}

/// Decode a 2xx body, or turn the API's `{message, errors}` into an error.
async fn expect_success<T: DeserializeOwned>(label: &str, resp: Response) -> Result<T> {
  let status = resp.status();
  if status.is_success() {
    return resp.json().await.with_context(|| format!("deserialising {label} response"));
  }
  let body: Value = resp.json().await.unwrap_or(Value::Null);
  let mut detail = message(&body);
  if let Some(errors) = body["errors"].as_object() {
    for (field, messages) in errors {
      for m in messages.as_array().into_iter().flatten() {
        detail.push_str(&format!("\n  {field}: {}", m.as_str().unwrap_or_default()));
      }
    }
  }
  Err(anyhow!("{label} → {status}: {detail}"))
}
