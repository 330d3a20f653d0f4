//! HTML rendering for resolved content and denial states.
//!
//! The delivery surface serves minimal server-rendered pages; there is no
//! templating engine, just a shared shell. Denial verdicts map to fixed
//! status codes and fixed pages so probing cannot distinguish entity shapes
//! beyond what the verdict already reveals.

use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};

use crate::access::Verdict;
use crate::models::{Collection, Document};

/// Cache directive for domain-bound document HTML served to the edge.
pub const DOMAIN_CACHE_CONTROL: &str = "public, s-maxage=60, stale-while-revalidate=300";

/// Status code for each denial verdict.
pub fn verdict_status(verdict: Verdict) -> StatusCode {
    match verdict {
        Verdict::Ok => StatusCode::OK,
        Verdict::NotFound => StatusCode::NOT_FOUND,
        Verdict::Private => StatusCode::FORBIDDEN,
        Verdict::Expired => StatusCode::GONE,
        Verdict::PasswordRequired => StatusCode::UNAUTHORIZED,
        Verdict::ViewLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
    }
}

/// Escape text for interpolation into HTML.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn shell(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape(title),
        body
    )
}

/// Render a resolved document. `content_html` is author-supplied markup
/// stored server-side; titles and slugs are escaped.
pub fn document_page(doc: &Document) -> Html<String> {
    Html(shell(&doc.title, &doc.content_html))
}

/// Render the synthesized workspace landing listing.
pub fn landing_page(documents: &[Document]) -> Html<String> {
    let mut items = String::new();
    for doc in documents {
        items.push_str(&format!(
            "<li><a href=\"/{}\">{}</a></li>\n",
            escape(&doc.slug),
            escape(&doc.title)
        ));
    }
    let body = format!("<h1>Documents</h1>\n<ul>\n{items}</ul>");
    Html(shell("Documents", &body))
}

/// Render a collection reached through a short link.
pub fn collection_page(collection: &Collection) -> Html<String> {
    let body = format!("<h1>{}</h1>", escape(&collection.name));
    Html(shell(&collection.name, &body))
}

/// Fixed page for a denial verdict, with its status code.
pub fn denial_page(verdict: Verdict) -> Response {
    let status = verdict_status(verdict);
    let (title, message) = match verdict {
        Verdict::Ok | Verdict::NotFound => ("Not found", "This content does not exist."),
        Verdict::Private => ("Private", "This content is not publicly available."),
        Verdict::Expired => ("Expired", "This content is no longer available."),
        Verdict::PasswordRequired => ("Password required", "This content requires a password."),
        Verdict::ViewLimitExceeded => ("Unavailable", "This link has reached its view limit."),
    };
    let body = format!("<h1>{title}</h1>\n<p>{message}</p>");
    (
        status,
        [(header::CACHE_CONTROL, "no-store")],
        Html(shell(title, &body)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_status_mapping() {
        assert_eq!(verdict_status(Verdict::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(verdict_status(Verdict::Private), StatusCode::FORBIDDEN);
        assert_eq!(verdict_status(Verdict::Expired), StatusCode::GONE);
        assert_eq!(
            verdict_status(Verdict::PasswordRequired),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            verdict_status(Verdict::ViewLimitExceeded),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn titles_are_escaped() {
        let html = shell("<script>alert(1)</script>", "body");
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
