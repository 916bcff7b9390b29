//! Synthesized responses served when neither network nor cache can answer.
//!
//! Both carry `Cache-Control: no-cache` so nothing downstream keeps them in
//! place of real content, and neither is ever written to a partition.

use bytes::Bytes;

use super::response::{ResponseSource, RouteResponse};

pub const OFFLINE_IMAGE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="200" viewBox="0 0 200 200"><rect width="200" height="200" fill="#f0f0f0"/><text x="50%" y="50%" text-anchor="middle" dy=".3em" fill="#999">Image unavailable</text></svg>"##;

/// Title of the offline page for `store_name`.
pub fn offline_title(store_name: &str) -> String {
    format!("Offline - {store_name}")
}

fn synthesized(content_type: &str, body: String) -> RouteResponse {
    RouteResponse {
        status: 200,
        headers: vec![
            ("Content-Type".to_string(), content_type.to_string()),
            ("Cache-Control".to_string(), "no-cache".to_string()),
        ],
        body: Bytes::from(body),
        source: ResponseSource::Fallback,
    }
}

/// Neutral 200x200 placeholder for images that cannot be loaded.
pub fn offline_image() -> RouteResponse {
    synthesized("image/svg+xml", OFFLINE_IMAGE_SVG.to_string())
}

/// Minimal offline notice with a retry button.
pub fn offline_page(store_name: &str) -> RouteResponse {
    let title = offline_title(store_name);
    let html = format!(
        r#"<!DOCTYPE html>
      <html>
      <head>
        <title>{title}</title>
        <meta name="viewport" content="width=device-width, initial-scale=1">
        <style>
          body {{ font-family: Arial, sans-serif; text-align: center; padding: 50px; }}
          .offline-message {{ max-width: 400px; margin: 0 auto; }}
          .offline-icon {{ font-size: 64px; margin-bottom: 20px; }}
        </style>
      </head>
      <body>
        <div class="offline-message">
          <div class="offline-icon">📱</div>
          <h1>You're offline</h1>
          <p>Please check your internet connection and try again.</p>
          <button onclick="window.location.reload()">Retry</button>
        </div>
      </body>
      </html>"#
    );
    synthesized("text/html", html)
}
