#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use sparql_kernel::format::mime_essence;
use sparql_kernel::session::{AuthScheme, Credentials, HttpMethod};
use sparql_kernel::{HttpResponse, OutboundRequest, SparqlClient, TransportError};
use std::time::Duration;
use tracing::debug;

/// Settings of the [ReqwestClient].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// Applies to the whole request, from connecting until the body has been read.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            user_agent: concat!("sparql-kernel/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

/// Sends kernel requests with [reqwest].
#[derive(Clone, Debug)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(config: &HttpClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(transport_error)?;
        Ok(Self { client })
    }

    /// Translates an [OutboundRequest] into a [reqwest::Request] without sending it.
    pub fn prepare(&self, request: &OutboundRequest) -> Result<reqwest::Request, TransportError> {
        let mut parameters = vec![("query", request.query.as_str())];
        parameters.extend(
            request
                .parameters
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        );

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.endpoint).query(&parameters),
            HttpMethod::Post => self.client.post(&request.endpoint).form(&parameters),
        };
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        match &request.credentials {
            Some(Credentials {
                scheme: AuthScheme::Basic,
                user,
                password,
            }) => builder = builder.basic_auth(user, Some(password)),
            Some(Credentials { scheme, .. }) => {
                return Err(TransportError::UnsupportedAuth(*scheme));
            }
            None => {}
        }
        builder.build().map_err(transport_error)
    }
}

#[async_trait]
impl SparqlClient for ReqwestClient {
    async fn execute(&self, request: &OutboundRequest) -> Result<HttpResponse, TransportError> {
        let http_request = self.prepare(request)?;
        debug!("Sending {} {}", http_request.method(), http_request.url());

        let response = self
            .client
            .execute(http_request)
            .await
            .map_err(transport_error)?;
        let status = response.status().as_u16();
        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(mime_essence);
        let body = response.bytes().await.map_err(transport_error)?.to_vec();
        Ok(HttpResponse {
            status,
            mime_type,
            body,
        })
    }
}

fn transport_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Failed(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparql_kernel::request::Negotiation;
    use sparql_kernel::session::{HttpHeaders, SettingMap};
    use std::collections::BTreeMap;

    fn request(method: HttpMethod, credentials: Option<Credentials>) -> OutboundRequest {
        let mut headers = HttpHeaders::new();
        headers.set("Accept", "application/sparql-results+json");
        OutboundRequest {
            endpoint: "http://example.com/sparql".to_owned(),
            method,
            query: "SELECT * WHERE { ?s ?p ?o }".to_owned(),
            headers,
            parameters: BTreeMap::from([("format".to_owned(), "json".to_owned())]),
            credentials,
            negotiation: Negotiation::Any,
        }
    }

    fn client() -> ReqwestClient {
        ReqwestClient::new(&HttpClientConfig::default()).unwrap()
    }

    #[test]
    fn get_puts_everything_in_the_url() {
        let prepared = client().prepare(&request(HttpMethod::Get, None)).unwrap();
        assert_eq!(prepared.method(), reqwest::Method::GET);
        let pairs: Vec<_> = prepared.url().query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            [
                ("query".to_owned(), "SELECT * WHERE { ?s ?p ?o }".to_owned()),
                ("format".to_owned(), "json".to_owned())
            ]
        );
        assert_eq!(
            prepared.headers().get("accept").and_then(|v| v.to_str().ok()),
            Some("application/sparql-results+json")
        );
    }

    #[test]
    fn post_sends_a_form() {
        let prepared = client()
            .prepare(&request(
                HttpMethod::Post,
                Some(Credentials {
                    scheme: AuthScheme::Basic,
                    user: "u".to_owned(),
                    password: "p".to_owned(),
                }),
            ))
            .unwrap();
        assert_eq!(prepared.method(), reqwest::Method::POST);
        assert_eq!(prepared.url().query(), None);
        let body = prepared.body().and_then(|body| body.as_bytes()).unwrap();
        assert!(body.starts_with(b"query=SELECT"));
        assert!(prepared.headers().contains_key("authorization"));
    }

    #[test]
    fn digest_is_unsupported() {
        let error = client()
            .prepare(&request(
                HttpMethod::Get,
                Some(Credentials {
                    scheme: AuthScheme::Digest,
                    user: "u".to_owned(),
                    password: "p".to_owned(),
                }),
            ))
            .unwrap_err();
        assert!(matches!(
            error,
            TransportError::UnsupportedAuth(AuthScheme::Digest)
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let mut unreachable = request(HttpMethod::Get, None);
        unreachable.endpoint = "http://127.0.0.1:9/sparql".to_owned();
        let error = client().execute(&unreachable).await.unwrap_err();
        assert!(matches!(
            error,
            TransportError::Failed(_) | TransportError::Timeout
        ));
    }
}
