//! Pocket API facade.
//!
//! # Design
//! `PocketClient` holds an immutable `ClientConfig` and a transport. It
//! carries no mutable state, so a shared reference can serve any number of
//! callers. Each operation is split into a `build_*` step that produces an
//! `HttpRequest` and a `parse_*` step that consumes an `HttpResponse`; the
//! request builders and the authorization helpers run both around
//! `Transport::execute`. Hosts that do their own I/O can call the two halves
//! directly.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::normalize;
use crate::request::{AddRequest, ModifyRequest, RetrieveRequest};
use crate::types::{AccessGrant, AddResult, Authorization, GetResult, ModifyResult};

#[derive(Debug, Clone)]
pub struct PocketClient<T> {
    config: ClientConfig,
    transport: T,
}

#[cfg(feature = "ureq")]
impl PocketClient<crate::transport::UreqTransport> {
    /// Client over a default blocking ureq transport.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, crate::transport::UreqTransport::new())
    }
}

impl<T> PocketClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Start a retrieve call.
    pub fn retrieve(&self) -> RetrieveRequest<'_, T> {
        RetrieveRequest::new(self)
    }

    /// Start an add call for `url`.
    pub fn add(&self, url: impl Into<String>) -> AddRequest<'_, T> {
        AddRequest::new(self, url.into())
    }

    /// Start an empty modify batch.
    pub fn modify(&self) -> ModifyRequest<'_, T> {
        ModifyRequest::new(self)
    }

    pub fn build_authorization_request(&self, redirect_uri: &str) -> Result<HttpRequest, ApiError> {
        #[derive(Serialize)]
        struct Params<'a> {
            consumer_key: &'a str,
            redirect_uri: &'a str,
        }
        self.post(
            "/oauth/request",
            &Params {
                consumer_key: &self.config.consumer_key,
                redirect_uri,
            },
        )
    }

    /// Turn the request-token response into an authorization URL that
    /// embeds the token and `redirect_uri`.
    pub fn parse_authorization(
        &self,
        redirect_uri: &str,
        response: HttpResponse,
    ) -> Result<Authorization, ApiError> {
        #[derive(Deserialize)]
        struct Body {
            code: String,
        }
        check_status(&response)?;
        let body: Body = normalize::plain(&response.body)?;

        let url = Url::parse_with_params(
            &self.config.authorize_url,
            &[("request_token", body.code.as_str()), ("redirect_uri", redirect_uri)],
        )
        .map_err(|e| ApiError::ConfigError(format!("authorize url: {e}")))?;

        Ok(Authorization {
            request_token: body.code,
            url: url.into(),
        })
    }

    pub fn build_access_token_request(&self, request_token: &str) -> Result<HttpRequest, ApiError> {
        #[derive(Serialize)]
        struct Params<'a> {
            consumer_key: &'a str,
            code: &'a str,
        }
        self.post(
            "/oauth/authorize",
            &Params {
                consumer_key: &self.config.consumer_key,
                code: request_token,
            },
        )
    }

    pub fn parse_access_token(&self, response: HttpResponse) -> Result<AccessGrant, ApiError> {
        check_status(&response)?;
        normalize::plain(&response.body)
    }

    pub fn parse_get(&self, response: HttpResponse) -> Result<GetResult, ApiError> {
        check_status(&response)?;
        let result = normalize::get_result(&response.body)?;
        debug!(items = result.list.len(), "retrieve decoded");
        Ok(result)
    }

    pub fn parse_add(&self, response: HttpResponse) -> Result<AddResult, ApiError> {
        check_status(&response)?;
        normalize::add_result(&response.body)
    }

    pub fn parse_modify(&self, response: HttpResponse) -> Result<ModifyResult, ApiError> {
        check_status(&response)?;
        normalize::plain(&response.body)
    }

    /// JSON POST to `endpoint` under the API base URL.
    pub(crate) fn post<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            url: format!("{}{endpoint}", self.config.api_url),
            headers: vec![
                ("content-type".to_string(), "application/json".to_string()),
                ("x-accept".to_string(), "application/json".to_string()),
            ],
            body,
        })
    }
}

impl<T: Transport> PocketClient<T> {
    /// First half of the handshake: obtain a request token and the URL the
    /// user must visit to approve it.
    pub fn authorized_url(&self, redirect_uri: &str) -> Result<Authorization, ApiError> {
        let request = self.build_authorization_request(redirect_uri)?;
        let response = self.execute(request)?;
        self.parse_authorization(redirect_uri, response)
    }

    /// Second half of the handshake: exchange an approved request token for
    /// a long-lived access token.
    pub fn new_access_token(&self, request_token: &str) -> Result<AccessGrant, ApiError> {
        debug!(request_token, "exchanging request token");
        let request = self.build_access_token_request(request_token)?;
        let response = self.execute(request)?;
        self.parse_access_token(response)
    }

    pub(crate) fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(url = %request.url, bytes = request.body.len(), "sending request");
        self.transport.execute(request)
    }
}

/// Map a non-2xx status to `HttpError`, keeping both error headers.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let code = response.header("x-error-code").map(str::to_string);
    let message = response.header("x-error").map(str::to_string);
    warn!(
        status = response.status,
        code = code.as_deref().unwrap_or(""),
        message = message.as_deref().unwrap_or(""),
        "pocket api error"
    );
    Err(ApiError::HttpError {
        status: response.status,
        code,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PocketClient<()> {
        PocketClient::with_transport(
            ClientConfig::new("consumer", "token").with_api_url("http://localhost:3000/v3"),
            (),
        )
    }

    fn response(status: u16, headers: &[(&str, &str)], body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.to_string(),
        }
    }

    #[test]
    fn build_authorization_request_produces_correct_request() {
        let req = client().build_authorization_request("myapp://done").unwrap();
        assert_eq!(req.url, "http://localhost:3000/v3/oauth/request");
        assert!(req
            .headers
            .contains(&("x-accept".to_string(), "application/json".to_string())));
        let body: serde_json::Value = serde_json::from_str(&req.body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"consumer_key": "consumer", "redirect_uri": "myapp://done"})
        );
    }

    #[test]
    fn parse_authorization_builds_encoded_url() {
        let auth = client()
            .parse_authorization(
                "https://example.com/cb?x=1",
                response(200, &[], r#"{"code":"dcba4321-dcba-4321"}"#),
            )
            .unwrap();
        assert_eq!(auth.request_token, "dcba4321-dcba-4321");
        assert_eq!(
            auth.url,
            "https://getpocket.com/auth/authorize?request_token=dcba4321-dcba-4321&redirect_uri=https%3A%2F%2Fexample.com%2Fcb%3Fx%3D1"
        );
    }

    #[test]
    fn parse_authorization_rejected_key() {
        let err = client()
            .parse_authorization(
                "myapp://done",
                response(403, &[("X-Error-Code", "152"), ("X-Error", "Invalid consumer key.")], ""),
            )
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::HttpError {
                status: 403,
                code: Some("152".to_string()),
                message: Some("Invalid consumer key.".to_string()),
            }
        );
    }

    #[test]
    fn build_access_token_request_produces_correct_request() {
        let req = client().build_access_token_request("req-token").unwrap();
        assert_eq!(req.url, "http://localhost:3000/v3/oauth/authorize");
        let body: serde_json::Value = serde_json::from_str(&req.body).unwrap();
        assert_eq!(body, serde_json::json!({"consumer_key": "consumer", "code": "req-token"}));
    }

    #[test]
    fn parse_access_token_success() {
        let grant = client()
            .parse_access_token(response(
                200,
                &[],
                r#"{"access_token":"5678defg-5678-defg","username":"pocketuser"}"#,
            ))
            .unwrap();
        assert_eq!(grant.access_token, "5678defg-5678-defg");
        assert_eq!(grant.username, "pocketuser");
    }

    #[test]
    fn api_error_surfaces_code_and_message_verbatim() {
        let err = client()
            .parse_get(response(
                401,
                &[("x-error-code", "140"), ("x-error", "Missing redirect url.")],
                "",
            ))
            .unwrap_err();
        assert_eq!(err.error_code(), Some("140"));
        match err {
            ApiError::HttpError { status, message, .. } => {
                assert_eq!(status, 401);
                assert_eq!(message.as_deref(), Some("Missing redirect url."));
            }
            other => panic!("expected HttpError, got {other:?}"),
        }
    }

    #[test]
    fn parse_modify_success() {
        let result = client()
            .parse_modify(response(200, &[], r#"{"action_results":[true,false],"status":1}"#))
            .unwrap();
        assert_eq!(result.action_results, vec![true, false]);
        assert_eq!(result.status, 1);
    }

    #[test]
    fn parse_modify_bad_json() {
        let err = client().parse_modify(response(200, &[], "not json")).unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError { .. }));
    }

    #[test]
    fn authorized_url_runs_through_transport() {
        let transport = |req: HttpRequest| -> Result<HttpResponse, ApiError> {
            assert_eq!(req.url, "http://localhost:3000/v3/oauth/request");
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: r#"{"code":"abc"}"#.to_string(),
            })
        };
        let client = PocketClient::with_transport(
            ClientConfig::new("consumer", "").with_api_url("http://localhost:3000/v3"),
            transport,
        );
        let auth = client.authorized_url("myapp://done").unwrap();
        assert_eq!(auth.request_token, "abc");
        assert!(auth.url.contains("request_token=abc"));
    }

    #[test]
    fn transport_failure_is_not_retried() {
        let calls = std::cell::Cell::new(0);
        let transport = |_req: HttpRequest| -> Result<HttpResponse, ApiError> {
            calls.set(calls.get() + 1);
            Err(ApiError::TransportError("connection refused".to_string()))
        };
        let client = PocketClient::with_transport(ClientConfig::new("consumer", ""), transport);
        let err = client.new_access_token("abc").unwrap_err();
        assert!(matches!(err, ApiError::TransportError(_)));
        assert_eq!(calls.get(), 1);
    }
}
