// storefront_server/src/web/responses.rs

use actix_web::http::{header, Uri};
use actix_web::{HttpRequest, HttpResponse};
use serde_json::{json, Map, Value};

use super::session::Visitor;

/// `302 Found` to `location`.
pub fn redirect(location: &str) -> HttpResponse {
  HttpResponse::Found()
    .insert_header((header::LOCATION, location))
    .finish()
}

/// Renders a page document: `data`'s fields plus `page`, the current `user`
/// and the pending flash `messages` (which are consumed).
pub fn page(visitor: &Visitor, name: &str, data: Value) -> HttpResponse {
  let mut body = match data {
    Value::Object(map) => map,
    Value::Null => Map::new(),
    other => {
      let mut map = Map::new();
      map.insert("data".to_string(), other);
      map
    }
  };
  body.insert("page".to_string(), json!(name));
  body.insert("user".to_string(), json!(visitor.identity));
  body.insert("messages".to_string(), json!(visitor.session.take_messages()));
  HttpResponse::Ok().json(Value::Object(body))
}

/// The path (and query) of the `Referer` header, if it names one.
pub fn referer_path(req: &HttpRequest) -> Option<String> {
  let raw = req.headers().get(header::REFERER)?.to_str().ok()?.trim();
  let uri: Uri = raw.parse().ok()?;
  let path = match uri.path() {
    "" => "/",
    path => path,
  };
  Some(match uri.query() {
    Some(query) => format!("{}?{}", path, query),
    None => path.to_string(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::test::TestRequest;

  fn referer(value: &str) -> Option<String> {
    referer_path(&TestRequest::default().insert_header((header::REFERER, value)).to_http_request())
  }

  #[test]
  fn referer_reduces_to_local_path() {
    assert_eq!(referer("http://localhost:8080/home"), Some("/home".to_string()));
    assert_eq!(referer("https://shop.example.com/products?page=2"), Some("/products?page=2".to_string()));
    assert_eq!(referer("https://shop.example.com"), Some("/".to_string()));
    assert_eq!(referer("/cart"), Some("/cart".to_string()));
    assert_eq!(referer("not a url"), None);
    assert_eq!(referer_path(&TestRequest::default().to_http_request()), None);
  }
}
