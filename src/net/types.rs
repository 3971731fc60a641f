use std::collections::BTreeMap;
use url::Url;

/// Header map with lowercase names.
pub type Headers = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
  Get,
  Head,
  Post,
  Put,
  Delete,
}

impl Method {
  pub fn as_str(&self) -> &'static str {
    match self {
      Method::Get => "GET",
      Method::Head => "HEAD",
      Method::Post => "POST",
      Method::Put => "PUT",
      Method::Delete => "DELETE",
    }
  }
}

/// What the request is for. Only navigations get offline documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Destination {
  /// A page navigation
  Document,
  Image,
  Font,
  Style,
  Script,
  /// fetch()-style data request
  #[default]
  Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
  pub method: Method,
  pub url: Url,
  pub destination: Destination,
}

impl Request {
  pub fn get(url: Url) -> Self {
    Self {
      method: Method::Get,
      url,
      destination: Destination::Empty,
    }
  }

  pub fn with_destination(mut self, destination: Destination) -> Self {
    self.destination = destination;
    self
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
  pub status: u16,
  pub status_text: String,
  pub headers: Headers,
  pub body: Vec<u8>,
}

impl Response {
  pub fn new(status: u16, body: Vec<u8>) -> Self {
    Self {
      status,
      status_text: default_status_text(status).to_string(),
      headers: Headers::new(),
      body,
    }
  }

  /// A synthetic plain-text response.
  pub fn text(status: u16, status_text: &str, body: &str) -> Self {
    let mut headers = Headers::new();
    headers.insert(
      "content-type".to_string(),
      "text/plain; charset=utf-8".to_string(),
    );
    Self {
      status,
      status_text: status_text.to_string(),
      headers,
      body: body.as_bytes().to_vec(),
    }
  }

  pub fn html(status: u16, body: &str) -> Self {
    let mut response = Self::new(status, body.as_bytes().to_vec());
    response
      .headers
      .insert("content-type".to_string(), "text/html".to_string());
    response
  }

  /// 2xx
  pub fn is_ok(&self) -> bool {
    (200..300).contains(&self.status)
  }

  pub fn header(&self, name: &str) -> Option<&str> {
    self
      .headers
      .get(&name.to_ascii_lowercase())
      .map(String::as_str)
  }

  #[cfg(test)]
  pub fn body_text(&self) -> String {
    String::from_utf8_lossy(&self.body).into_owned()
  }
}

fn default_status_text(status: u16) -> &'static str {
  match status {
    200 => "OK",
    204 => "No Content",
    304 => "Not Modified",
    400 => "Bad Request",
    401 => "Unauthorized",
    404 => "Not Found",
    500 => "Internal Server Error",
    502 => "Bad Gateway",
    503 => "Service Unavailable",
    _ => "",
  }
}
