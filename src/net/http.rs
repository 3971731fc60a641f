use futures::future::BoxFuture;
use futures::FutureExt;
use std::time::Duration;

use super::{Headers, Method, NetError, Request, Response, Transport};

/// `reqwest`-backed transport.
#[derive(Clone)]
pub struct HttpTransport {
  client: reqwest::Client,
}

impl HttpTransport {
  pub fn new(timeout: Duration) -> Result<Self, NetError> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("moviedeck/", env!("CARGO_PKG_VERSION")))
      .timeout(timeout)
      .build()
      .map_err(|e| {
        tracing::error!("Failed to build HTTP client: {}", e);
        NetError::InvalidRequest(e.to_string())
      })?;

    Ok(Self { client })
  }
}

impl Transport for HttpTransport {
  fn fetch(&self, request: Request) -> BoxFuture<'static, Result<Response, NetError>> {
    let client = self.client.clone();
    async move {
      let method = match request.method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
      };

      let resp = client
        .request(method, request.url.clone())
        .header("accept", "application/json, text/plain, */*")
        .send()
        .await
        .map_err(|e| NetError::Network(e.without_url().to_string()))?;

      let status = resp.status();
      let mut headers = Headers::new();
      for (name, value) in resp.headers() {
        if let Ok(value) = value.to_str() {
          headers.insert(name.as_str().to_ascii_lowercase(), value.to_string());
        }
      }

      let body = resp
        .bytes()
        .await
        .map_err(|e| NetError::Network(e.without_url().to_string()))?;

      Ok(Response {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        headers,
        body: body.to_vec(),
      })
    }
    .boxed()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use url::Url;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  #[tokio::test]
  async fn test_fetch_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/"))
      .and(query_param("s", "batman"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_raw(r#"{"Response":"True","Search":[]}"#, "application/json"),
      )
      .mount(&mock_server)
      .await;

    let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
    let url = Url::parse(&format!("{}/?s=batman", mock_server.uri())).unwrap();
    let response = transport.fetch(Request::get(url)).await.unwrap();

    assert!(response.is_ok());
    assert_eq!(response.header("content-type"), Some("application/json"));
    assert_eq!(response.body_text(), r#"{"Response":"True","Search":[]}"#);
  }

  #[tokio::test]
  async fn test_server_error_is_a_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
      .mount(&mock_server)
      .await;

    let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
    let url = Url::parse(&mock_server.uri()).unwrap();
    let response = transport.fetch(Request::get(url)).await.unwrap();

    assert_eq!(response.status, 500);
    assert!(!response.is_ok());
  }

  #[tokio::test]
  async fn test_unreachable_host_is_a_network_error() {
    let transport = HttpTransport::new(Duration::from_secs(2)).unwrap();
    let url = Url::parse("http://127.0.0.1:9/").unwrap();
    let result = transport.fetch(Request::get(url)).await;

    assert!(matches!(result, Err(NetError::Network(_))));
  }
}
