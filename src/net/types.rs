use reqwest::Method;
use serde::{Deserialize, Serialize};
use url::Url;

/// An outgoing request as seen by the interceptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
  pub method: Method,
  pub url: Url,
  pub body: Option<Vec<u8>>,
}

impl Request {
  pub fn new(method: Method, url: Url) -> Self {
    Self {
      method,
      url,
      body: None,
    }
  }

  /// Shorthand for a body-less GET
  pub fn get(url: Url) -> Self {
    Self::new(Method::GET, url)
  }

  pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
    self.body = Some(body.into());
    self
  }

  pub fn is_get(&self) -> bool {
    self.method == Method::GET
  }

  /// Key under which this request is stored in a cache bucket.
  ///
  /// Fragments never reach the server, so `/a#x` and `/a` share an entry.
  pub fn cache_key(&self) -> String {
    let mut url = self.url.clone();
    url.set_fragment(None);
    url.into()
  }
}

/// A response snapshot, cloneable so one copy can go into the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
  pub status: u16,
  pub status_text: String,
  /// Header name/value pairs in arrival order
  pub headers: Vec<(String, String)>,
  #[serde(skip)]
  pub body: Vec<u8>,
}

impl Response {
  pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
    Self {
      status,
      status_text: String::new(),
      headers: Vec::new(),
      body: body.into(),
    }
  }

  pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.headers.push((name.into(), value.into()));
    self
  }

  /// True for 2xx statuses
  pub fn is_ok(&self) -> bool {
    (200..300).contains(&self.status)
  }

  /// Partial content can't be replayed for a full request, so it is never stored.
  pub fn is_storable(&self) -> bool {
    self.status != 206
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cache_key_drops_fragment() {
    let req = Request::get(Url::parse("http://localhost:5000/static/css/main.css#top").unwrap());
    assert_eq!(req.cache_key(), "http://localhost:5000/static/css/main.css");
  }

  #[test]
  fn cache_key_keeps_query() {
    let req = Request::get(
      Url::parse("https://fonts.googleapis.com/css2?family=Noto+Sans+TC&display=swap").unwrap(),
    );
    assert_eq!(
      req.cache_key(),
      "https://fonts.googleapis.com/css2?family=Noto+Sans+TC&display=swap"
    );
  }

  #[test]
  fn partial_content_is_not_storable() {
    assert!(!Response::new(206, "abc").is_storable());
    assert!(Response::new(404, "").is_storable());
    assert!(!Response::new(404, "").is_ok());
  }
}
