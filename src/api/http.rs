use std::collections::BTreeMap;

use log::{debug, warn};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;

use super::{
	BatchDeleteResult, BatchTask, DebugSearchResult, EdgeRequest, GraphApi, LinkEntityRequest,
	LoginResponse, SessionContext, SessionScope,
};
use crate::error::ConsoleError;
use crate::storage;

/// Error body returned by the backend on non-2xx responses.
#[derive(Deserialize)]
struct ErrorBody {
	detail: Option<Value>,
}

/// [`GraphApi`] over `fetch`, with the bearer token read from session storage per call.
#[derive(Clone)]
pub struct HttpGraphApi {
	base: String,
	client: reqwest::Client,
}

impl HttpGraphApi {
	/// Client for the server at `base`, e.g. `https://host:8080`.
	pub fn new(base: impl Into<String>) -> Self {
		Self {
			base: base.into(),
			client: reqwest::Client::new(),
		}
	}

	fn endpoint(&self, segments: &[&str]) -> Result<Url, ConsoleError> {
		let mut url = Url::parse(&self.base).map_err(|e| ConsoleError::Transport(e.to_string()))?;
		url.path_segments_mut()
			.map_err(|_| ConsoleError::Transport(format!("`{}` cannot be a base url", self.base)))?
			.pop_if_empty()
			.extend(segments);
		Ok(url)
	}

	async fn send(&self, request: RequestBuilder) -> Result<Response, ConsoleError> {
		let request = match storage::session_token() {
			Some(token) => request.bearer_auth(token),
			None => request,
		};
		check(request.send().await?).await
	}
}

/// Map a non-2xx response to an error carrying the server detail, or the status text.
async fn check(response: Response) -> Result<Response, ConsoleError> {
	let status = response.status();
	if status.is_success() {
		return Ok(response);
	}
	if status == StatusCode::UNAUTHORIZED {
		warn!("{} answered 401", response.url().path());
		return Err(ConsoleError::Unauthorized);
	}
	let fallback = status.canonical_reason().unwrap_or("request failed").to_string();
	let detail = response
		.json::<ErrorBody>()
		.await
		.ok()
		.and_then(|body| body.detail)
		.map(|detail| match detail {
			Value::String(s) => s,
			other => other.to_string(),
		});
	Err(ConsoleError::Server {
		status: status.as_u16(),
		message: detail.unwrap_or(fallback),
	})
}

impl GraphApi for HttpGraphApi {
	fn has_session(&self) -> bool {
		storage::session_token().is_some()
	}

	async fn login(&self, key: &str) -> Result<(), ConsoleError> {
		let url = self.endpoint(&["api", "login"])?;
		let response = self
			.client
			.post(url)
			.json(&serde_json::json!({ "key": key }))
			.send()
			.await?;
		if !response.status().is_success() {
			return Err(ConsoleError::InvalidAccessKey);
		}
		let body: LoginResponse = response.json().await.unwrap_or_default();
		if let Some(token) = body.token {
			storage::set_session_token(&token);
		}
		Ok(())
	}

	fn logout(&self) {
		storage::clear_session_token();
	}

	async fn contexts(&self) -> Result<Vec<SessionContext>, ConsoleError> {
		let url = self.endpoint(&["api", "contexts"])?;
		Ok(self.send(self.client.get(url)).await?.json().await?)
	}

	async fn graph(&self, scope: &SessionScope) -> Result<Option<Value>, ConsoleError> {
		let url = self.endpoint(&["api", "graph"])?;
		let mut request = self.client.get(url);
		if let Some(session_id) = scope.session_id() {
			request = request.query(&[("session_id", session_id)]);
		}
		let text = self.send(request).await?.text().await?;
		let payload = serde_json::from_str::<Value>(&text)
			.inspect_err(|e| debug!("graph payload is not json: {}", e))
			.ok()
			.filter(|v| !v.is_null());
		Ok(payload)
	}

	async fn create_edge(&self, edge: &EdgeRequest) -> Result<(), ConsoleError> {
		let url = self.endpoint(&["api", "edge"])?;
		self.send(self.client.post(url).json(edge)).await?;
		Ok(())
	}

	async fn delete_edge(&self, edge: &EdgeRequest) -> Result<(), ConsoleError> {
		let url = self.endpoint(&["api", "edge"])?;
		self.send(self.client.delete(url).query(edge)).await?;
		Ok(())
	}

	async fn delete_node(&self, node_type: &str, id: &str) -> Result<(), ConsoleError> {
		let url = self.endpoint(&["api", "node", node_type, id])?;
		self.send(self.client.delete(url)).await?;
		Ok(())
	}

	async fn update_node(
		&self,
		node_type: &str,
		id: &str,
		props: &BTreeMap<String, String>,
	) -> Result<(), ConsoleError> {
		let url = self.endpoint(&["api", "node", node_type, id])?;
		self.send(self.client.patch(url).json(props)).await?;
		Ok(())
	}

	async fn link_entity(&self, link: &LinkEntityRequest) -> Result<(), ConsoleError> {
		let url = self.endpoint(&["api", "link"])?;
		self.send(self.client.post(url).json(link)).await?;
		Ok(())
	}

	async fn batch_delete(&self, task: BatchTask) -> Result<BatchDeleteResult, ConsoleError> {
		let url = self.endpoint(&["api", "batch-delete"])?;
		Ok(self.send(self.client.post(url).json(&task.body())).await?.json().await?)
	}

	async fn debug_search(
		&self,
		query: &str,
		session_id: &str,
	) -> Result<DebugSearchResult, ConsoleError> {
		let url = self.endpoint(&["api", "debug_search"])?;
		let request = self
			.client
			.get(url)
			.query(&[("q", query), ("session_id", session_id)]);
		let raw: Value = self.send(request).await?.json().await?;
		Ok(DebugSearchResult { raw })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn endpoints_escape_path_segments() {
		let api = HttpGraphApi::new("http://localhost:8000");
		assert_eq!(
			api.endpoint(&["api", "node", "Entity", "a b/c"]).unwrap().as_str(),
			"http://localhost:8000/api/node/Entity/a%20b%2Fc"
		);
		assert_eq!(
			api.endpoint(&["api", "graph"]).unwrap().as_str(),
			"http://localhost:8000/api/graph"
		);
	}

	#[test]
	fn bad_base_is_a_transport_error() {
		let api = HttpGraphApi::new("not a url");
		assert!(matches!(
			api.endpoint(&["api"]),
			Err(ConsoleError::Transport(_))
		));
	}
}
