//! Route modules, one per aggregate, plus the helpers they share.

pub mod client_contact_number;
pub mod contact_number_type;
pub mod health;

use axum::Json;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use dialbook_core::command::CommandContext;
use dialbook_core::event::EventMetaData;
use dialbook_projections::read_model::{ListQuery, Page};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header carrying the correlation id of a request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Header carrying the acting user.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the OAuth client of the caller.
pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// Header carrying the total number of rows of a list response.
pub const RESULT_COUNT_HEADER: &str = "x-result-count";

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// Builds the command context of a request from its headers.
///
/// Requests without `x-request-id` get a fresh correlation id; requests
/// without `x-user-id` act as `system`.
pub(crate) fn command_context(headers: &HeaderMap) -> CommandContext {
    let correlation_id =
        header_value(headers, REQUEST_ID_HEADER).unwrap_or_else(|| Uuid::new_v4().to_string());
    let meta_data = EventMetaData {
        user_id: header_value(headers, USER_ID_HEADER).unwrap_or_else(|| "system".to_owned()),
        client_id: header_value(headers, CLIENT_ID_HEADER),
        context: None,
    };
    CommandContext::new(correlation_id, meta_data)
}

/// Query string of list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Requested page, starting at 1.
    pub page: Option<u32>,
    /// Rows per page.
    pub items_per_page: Option<u32>,
}

impl From<ListParams> for ListQuery {
    fn from(params: ListParams) -> Self {
        Self::new(params.page, params.items_per_page)
    }
}

fn page_link(path: &str, page: u64, items_per_page: u32, rel: &str) -> String {
    format!("<{path}?page={page}&items_per_page={items_per_page}>; rel=\"{rel}\"")
}

/// Renders one page of a list endpoint.
///
/// An empty page answers `204 No Content`. Otherwise the rows come with
/// `X-Result-Count` and a `Link` header pointing at the neighbouring pages.
pub(crate) fn list_response<T: Serialize>(path: &str, query: ListQuery, page: Page<T>) -> Response {
    if page.data.is_empty() {
        return StatusCode::NO_CONTENT.into_response();
    }

    let per_page = u64::from(query.items_per_page);
    let current = u64::from(query.page);
    let last = page.count.div_ceil(per_page).max(1);

    let mut links = vec![page_link(path, 1, query.items_per_page, "first")];
    if current > 1 {
        links.push(page_link(path, current - 1, query.items_per_page, "prev"));
    }
    if current < last {
        links.push(page_link(path, current + 1, query.items_per_page, "next"));
    }
    links.push(page_link(path, last, query.items_per_page, "last"));

    (
        [
            (RESULT_COUNT_HEADER, page.count.to_string()),
            ("link", links.join(", ")),
        ],
        Json(page.data),
    )
        .into_response()
}

/// `202 Accepted` pointing at the created resource.
pub(crate) fn accepted_at(location: String) -> Response {
    (StatusCode::ACCEPTED, [(header::LOCATION, location)]).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_command_context_reads_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-7"));
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("user-1"));

        let context = command_context(&headers);

        assert_eq!(context.correlation_id, "req-7");
        assert_eq!(context.meta_data.user_id, "user-1");
        assert_eq!(context.meta_data.client_id, None);
    }

    #[test]
    fn test_command_context_defaults_to_system() {
        let context = command_context(&HeaderMap::new());

        assert_eq!(context.meta_data, EventMetaData::system());
        assert!(Uuid::parse_str(&context.correlation_id).is_ok());
    }

    #[test]
    fn test_empty_page_is_no_content() {
        let page: Page<String> = Page {
            count: 0,
            data: Vec::new(),
        };

        let response = list_response("/things", ListQuery::default(), page);

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn test_middle_page_links_both_neighbours() {
        let page = Page {
            count: 7,
            data: vec!["c", "d"],
        };

        let response = list_response("/things", ListQuery::new(Some(2), Some(2)), page);

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[RESULT_COUNT_HEADER], "7");
        assert_eq!(
            response.headers()[header::LINK],
            "</things?page=1&items_per_page=2>; rel=\"first\", \
             </things?page=1&items_per_page=2>; rel=\"prev\", \
             </things?page=3&items_per_page=2>; rel=\"next\", \
             </things?page=4&items_per_page=2>; rel=\"last\""
        );
    }
}
