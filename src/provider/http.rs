//! HTTP client abstraction for REST-backed providers
//!
//! Providers build requests and interpret status codes; the client only
//! moves bytes. Tests substitute a recording client for [`ReqwestClient`].

use async_trait::async_trait;
use std::fmt;

/// HTTP verbs used by the backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
	Get,
	Put,
	Patch,
}

impl fmt::Display for HttpMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			HttpMethod::Get => write!(f, "GET"),
			HttpMethod::Put => write!(f, "PUT"),
			HttpMethod::Patch => write!(f, "PATCH"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
	pub method: HttpMethod,
	pub url: String,
	pub headers: Vec<(String, String)>,
	pub body: Option<Vec<u8>>,
}

impl HttpRequest {
	pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
		HttpRequest { method, url: url.into(), headers: Vec::new(), body: None }
	}

	pub fn bearer(self, token: &str) -> Self {
		self.header("Authorization", &format!("Bearer {}", token))
	}

	pub fn header(mut self, name: &str, value: &str) -> Self {
		self.headers.push((name.to_string(), value.to_string()));
		self
	}

	pub fn body(mut self, body: Vec<u8>) -> Self {
		self.body = Some(body);
		self
	}

	/// First header value with the given (case-insensitive) name
	pub fn header_value(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(n, _)| n.eq_ignore_ascii_case(name))
			.map(|(_, v)| v.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
	pub status: u16,
	pub body: Vec<u8>,
}

impl HttpResponse {
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Sends a request and returns the raw response.
///
/// `Err` is reserved for failures below HTTP (DNS, TLS, connection reset);
/// non-2xx statuses come back as `Ok` for the caller to classify.
#[async_trait]
pub trait HttpClient: Send + Sync {
	async fn send(&self, request: HttpRequest) -> Result<HttpResponse, String>;
}

/// Production client backed by `reqwest`
#[derive(Debug, Clone, Default)]
pub struct ReqwestClient {
	client: reqwest::Client,
}

impl ReqwestClient {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl HttpClient for ReqwestClient {
	async fn send(&self, request: HttpRequest) -> Result<HttpResponse, String> {
		let method = match request.method {
			HttpMethod::Get => reqwest::Method::GET,
			HttpMethod::Put => reqwest::Method::PUT,
			HttpMethod::Patch => reqwest::Method::PATCH,
		};

		let mut builder = self.client.request(method, &request.url);
		for (name, value) in &request.headers {
			builder = builder.header(name.as_str(), value.as_str());
		}
		if let Some(body) = request.body {
			builder = builder.body(body);
		}

		let response = builder.send().await.map_err(|e| e.to_string())?;
		let status = response.status().as_u16();
		let body = response.bytes().await.map_err(|e| e.to_string())?;
		Ok(HttpResponse { status, body: body.to_vec() })
	}
}


// vim: ts=4
