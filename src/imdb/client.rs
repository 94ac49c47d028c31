use super::{Credential, SubmissionError, SubmitOutcome, TitleService};
use crate::state::Category;
use crate::utils::{ApiConfig, Result};
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::debug;

const RATE_TITLE_MUTATION: &str = "mutation UpdateTitleRating($rating: Int!, $titleId: ID!) { rateTitle(input: {rating: $rating, titleId: $titleId}) { rating { value __typename } __typename }}";
const RATE_TITLE_OPERATION: &str = "UpdateTitleRating";
const AUTH_FAILURE_MARKER: &str = "Authentication";

pub struct ImdbClient {
    client: Client,
    api: ApiConfig,
    credential: Credential,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphqlRequest<'a> {
    query: &'static str,
    operation_name: &'static str,
    variables: RatingVariables<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RatingVariables<'a> {
    rating: u8,
    title_id: &'a str,
}

impl ImdbClient {
    pub fn new(api: ApiConfig, credential: Credential) -> Result<Self> {
        let mut builder = Client::builder().user_agent(api.user_agent.clone());
        if let Some(secs) = api.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            api,
            credential,
        })
    }

    fn watchlist_url(&self, title_id: &str) -> String {
        format!(
            "{}/{}",
            self.api.watchlist_endpoint.trim_end_matches('/'),
            title_id
        )
    }

    fn with_session(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(CONTENT_TYPE, "application/json")
            .header(COOKIE, self.credential.expose())
    }

    fn rating_request(&self, title_id: &str, score: u8) -> RequestBuilder {
        let request = GraphqlRequest {
            query: RATE_TITLE_MUTATION,
            operation_name: RATE_TITLE_OPERATION,
            variables: RatingVariables {
                rating: score,
                title_id,
            },
        };
        self.with_session(self.client.post(&self.api.graphql_endpoint).json(&request))
    }

    fn watchlist_request(&self, title_id: &str) -> RequestBuilder {
        self.with_session(self.client.put(self.watchlist_url(title_id)))
    }

    async fn send(&self, category: Category, request: RequestBuilder) -> SubmitOutcome {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return SubmitOutcome::Failed(SubmissionError::Transport(e.to_string())),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return SubmitOutcome::Failed(SubmissionError::Transport(e.to_string())),
        };

        debug!(%category, status = status.as_u16(), body_len = body.len(), "IMDb responded");
        classify_response(category, status, &body)
    }
}

impl TitleService for ImdbClient {
    async fn submit_rating(&self, title_id: &str, score: u8) -> SubmitOutcome {
        self.send(Category::Ratings, self.rating_request(title_id, score))
            .await
    }

    async fn add_to_watchlist(&self, title_id: &str) -> SubmitOutcome {
        self.send(Category::Watchlist, self.watchlist_request(title_id))
            .await
    }
}

/// Maps an HTTP response onto a submission outcome.
///
/// The GraphQL endpoint always answers with JSON, so an unparseable rating
/// response is a failure. The watchlist endpoint's body is only inspected for
/// an `errors` field.
pub fn classify_response(category: Category, status: StatusCode, body: &str) -> SubmitOutcome {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return SubmitOutcome::RateLimited;
    }
    if status != StatusCode::OK {
        return SubmitOutcome::Failed(SubmissionError::Status {
            category,
            status: status.as_u16(),
        });
    }

    let parsed: JsonValue = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            return match category {
                Category::Ratings => {
                    SubmitOutcome::Failed(SubmissionError::UnexpectedBody(e.to_string()))
                }
                Category::Watchlist => SubmitOutcome::Success,
            };
        }
    };

    let errors = match parsed.get("errors") {
        None | Some(JsonValue::Null) => return SubmitOutcome::Success,
        Some(JsonValue::Array(list)) if list.is_empty() => return SubmitOutcome::Success,
        Some(errors) => errors,
    };

    let first = match errors {
        JsonValue::Array(list) => &list[0],
        other => other,
    };
    let message = match first.get("message").and_then(JsonValue::as_str) {
        Some(message) if !message.trim().is_empty() => message.to_string(),
        // No usable message: keep the raw error so the user can diagnose it.
        _ => first.to_string(),
    };

    if message.contains(AUTH_FAILURE_MARKER) {
        SubmitOutcome::AuthFailed(message)
    } else {
        SubmitOutcome::Failed(SubmissionError::Api(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_without_errors_is_success() {
        let body = r#"{"data":{"rateTitle":{"rating":{"value":10}}}}"#;
        assert_eq!(
            classify_response(Category::Ratings, StatusCode::OK, body),
            SubmitOutcome::Success
        );
        assert_eq!(
            classify_response(Category::Ratings, StatusCode::OK, r#"{"errors":[]}"#),
            SubmitOutcome::Success
        );
        assert_eq!(
            classify_response(Category::Ratings, StatusCode::OK, r#"{"errors":null}"#),
            SubmitOutcome::Success
        );
    }

    #[test]
    fn too_many_requests_is_rate_limited() {
        for category in [Category::Ratings, Category::Watchlist] {
            assert_eq!(
                classify_response(category, StatusCode::TOO_MANY_REQUESTS, ""),
                SubmitOutcome::RateLimited
            );
        }
    }

    #[test]
    fn authentication_message_is_auth_failure() {
        let body = r#"{"errors":[{"message":"Authentication required to rate titles"}]}"#;
        assert_eq!(
            classify_response(Category::Ratings, StatusCode::OK, body),
            SubmitOutcome::AuthFailed("Authentication required to rate titles".into())
        );
    }

    #[test]
    fn only_first_error_message_is_inspected() {
        let body = r#"{"errors":[{"message":"Title not found"},{"message":"Authentication"}]}"#;
        assert_eq!(
            classify_response(Category::Ratings, StatusCode::OK, body),
            SubmitOutcome::Failed(SubmissionError::Api("Title not found".into()))
        );
    }

    #[test]
    fn other_status_carries_code() {
        let outcome = classify_response(Category::Watchlist, StatusCode::FORBIDDEN, "");
        assert_eq!(
            outcome,
            SubmitOutcome::Failed(SubmissionError::Status {
                category: Category::Watchlist,
                status: 403
            })
        );
        if let SubmitOutcome::Failed(e) = outcome {
            assert!(e.to_string().contains("403"));
        }
    }

    #[test]
    fn non_json_body_depends_on_category() {
        assert!(matches!(
            classify_response(Category::Ratings, StatusCode::OK, "<html></html>"),
            SubmitOutcome::Failed(SubmissionError::UnexpectedBody(_))
        ));
        assert_eq!(
            classify_response(Category::Watchlist, StatusCode::OK, ""),
            SubmitOutcome::Success
        );
    }

    #[test]
    fn rating_request_body_shape() {
        let request = GraphqlRequest {
            query: RATE_TITLE_MUTATION,
            operation_name: RATE_TITLE_OPERATION,
            variables: RatingVariables {
                rating: 9,
                title_id: "tt0068646",
            },
        };

        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["operationName"], "UpdateTitleRating");
        assert_eq!(value["variables"]["rating"], 9);
        assert_eq!(value["variables"]["titleId"], "tt0068646");
        assert!(value["query"].as_str().unwrap().contains("rateTitle"));
    }

    #[test]
    fn watchlist_url_joins_title_id() {
        let api = ApiConfig {
            watchlist_endpoint: "https://www.imdb.com/watchlist/".to_string(),
            ..ApiConfig::default()
        };
        let client = ImdbClient::new(api, Credential::parse("id=1").unwrap()).unwrap();

        assert_eq!(
            client.watchlist_url("tt0133093"),
            "https://www.imdb.com/watchlist/tt0133093"
        );
    }

    #[test]
    fn watchlist_errors_are_not_success() {
        let auth = r#"{"errors":[{"message":"Authentication failed"}]}"#;
        assert_eq!(
            classify_response(Category::Watchlist, StatusCode::OK, auth),
            SubmitOutcome::AuthFailed("Authentication failed".into())
        );

        let api = r#"{"errors":[{"message":"Title not found"}]}"#;
        assert_eq!(
            classify_response(Category::Watchlist, StatusCode::OK, api),
            SubmitOutcome::Failed(SubmissionError::Api("Title not found".into()))
        );
    }

    #[test]
    fn irregular_errors_shape_is_a_failure() {
        let object = r#"{"errors":{"message":"Title not found"}}"#;
        assert_eq!(
            classify_response(Category::Watchlist, StatusCode::OK, object),
            SubmitOutcome::Failed(SubmissionError::Api("Title not found".into()))
        );

        let null_message = r#"{"errors":[{"message":null,"code":"E1"}]}"#;
        match classify_response(Category::Watchlist, StatusCode::OK, null_message) {
            SubmitOutcome::Failed(SubmissionError::Api(detail)) => assert!(detail.contains("E1")),
            other => panic!("expected API failure, got {:?}", other),
        }
    }

    #[test]
    fn missing_message_keeps_raw_error_as_detail() {
        let body = r#"{"errors":[{"extensions":{"code":"BAD_INPUT"}}]}"#;
        match classify_response(Category::Ratings, StatusCode::OK, body) {
            SubmitOutcome::Failed(e) => {
                let detail = e.to_string();
                assert!(!detail.is_empty());
                assert!(detail.contains("BAD_INPUT"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    fn test_client() -> ImdbClient {
        ImdbClient::new(ApiConfig::default(), Credential::parse("session-id=abc").unwrap()).unwrap()
    }

    #[test]
    fn rating_request_carries_session_headers() {
        let request = test_client()
            .rating_request("tt0111161", 10)
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().as_str(), "https://api.graphql.imdb.com/");
        assert_eq!(request.headers()[COOKIE], "session-id=abc");
        assert_eq!(request.headers()[CONTENT_TYPE], "application/json");

        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        let value: JsonValue = serde_json::from_slice(body).unwrap();
        assert_eq!(value["variables"]["titleId"], "tt0111161");
        assert_eq!(value["variables"]["rating"], 10);
    }

    #[test]
    fn watchlist_request_carries_session_headers() {
        let request = test_client().watchlist_request("tt0133093").build().unwrap();

        assert_eq!(request.method(), reqwest::Method::PUT);
        assert_eq!(
            request.url().as_str(),
            "https://www.imdb.com/watchlist/tt0133093"
        );
        assert_eq!(request.headers()[COOKIE], "session-id=abc");
        assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
    }
}
