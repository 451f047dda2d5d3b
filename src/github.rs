use async_trait::async_trait;
use octocrab::Octocrab;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ErrorKind, LensError, Result};
use crate::source::IssueSource;
use crate::types::{Issue, IssueQuery, RepoId, RepositorySummary, ISSUES_PER_PAGE};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

pub struct GitHub {
    client: Octocrab,
}

impl std::fmt::Debug for GitHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHub").finish_non_exhaustive()
    }
}

/// Errors from the client itself: the request never produced a response.
impl From<octocrab::Error> for LensError {
    fn from(err: octocrab::Error) -> Self {
        LensError::Api {
            kind: ErrorKind::NetworkFailure,
            message: err.to_string(),
        }
    }
}

/// The JSON object GitHub sends with most non-2xx responses. Proxies and
/// rate limiters may send something else, so every field is optional.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    documentation_url: Option<String>,
}

fn classify(status: u16, body: &ErrorBody) -> ErrorKind {
    match status {
        404 => ErrorKind::NotFound,
        429 => ErrorKind::RateLimited,
        403 if mentions_rate_limit(&body.message, body.documentation_url.as_deref()) => {
            ErrorKind::RateLimited
        }
        status => ErrorKind::Http(status),
    }
}

/// GitHub answers an exhausted quota with 403 and says so in the body.
fn mentions_rate_limit(message: &str, documentation_url: Option<&str>) -> bool {
    message.to_lowercase().contains("rate limit")
        || documentation_url.is_some_and(|url| url.contains("rate-limit"))
}

#[derive(Debug)]
struct IssueParams {
    state: &'static str,
    per_page: u8,
    page: u32,
}

impl IssueParams {
    fn query_string(&self) -> String {
        format!(
            "state={}&per_page={}&page={}",
            self.state, self.per_page, self.page
        )
    }
}

impl From<IssueQuery> for IssueParams {
    fn from(query: IssueQuery) -> Self {
        Self {
            state: query.filter.as_api_str(),
            per_page: ISSUES_PER_PAGE,
            page: query.page,
        }
    }
}

impl GitHub {
    /// Client against `api_url`, anonymous unless a token is given.
    pub fn new(api_url: &str, token: Option<String>) -> Result<Self> {
        let mut builder = Octocrab::builder()
            .base_uri(api_url)
            .map_err(|e| LensError::Client(format!("invalid API URL {}: {}", api_url, e)))?;

        if let Some(token) = token {
            builder = builder.personal_token(token);
        }

        let client = builder
            .build()
            .map_err(|e| LensError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    /// GET `uri` and decode a 2xx body as `R`. The status decides the error
    /// kind before the body is looked at.
    async fn fetch<R: DeserializeOwned>(&self, uri: String) -> Result<R> {
        let response = self.client._get(uri).await?;
        let status = response.status();
        let body = self.client.body_to_string(response).await?;

        if !status.is_success() {
            let error: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
            let kind = classify(status.as_u16(), &error);
            let message = if error.message.is_empty() {
                status.to_string()
            } else {
                error.message
            };
            return Err(LensError::Api { kind, message });
        }

        serde_json::from_str(&body).map_err(|e| LensError::Api {
            kind: ErrorKind::DecodeFailure,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl IssueSource for GitHub {
    async fn get_repository(&self, repo: &RepoId) -> Result<RepositorySummary> {
        let route = format!("/repos/{}", repo.as_str());
        debug!(%route, "fetching repository");
        self.fetch(route).await
    }

    async fn list_issues(&self, repo: &RepoId, query: IssueQuery) -> Result<Vec<Issue>> {
        let route = format!("/repos/{}/issues", repo.as_str());
        let params = IssueParams::from(query);
        debug!(%route, state = params.state, page = params.page, "fetching issues");
        self.fetch(format!("{}?{}", route, params.query_string())).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::types::IssueFilter;

    fn repo() -> RepoId {
        RepoId::decode("facebook%2Freact").unwrap()
    }

    fn issue_json(id: u64, title: &str) -> serde_json::Value {
        json!({
            "id": id,
            "number": id,
            "title": title,
            "html_url": format!("https://github.com/facebook/react/issues/{}", id),
            "state": "open",
            "user": { "login": "octocat", "avatar_url": "https://avatars/octocat" },
            "labels": [{ "id": 9, "name": "bug" }]
        })
    }

    fn error_body(message: &str) -> serde_json::Value {
        json!({ "message": message, "documentation_url": "https://docs.github.com/rest" })
    }

    async fn mount_issues_error(server: &MockServer, status: u16, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/repos/facebook/react/issues"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn issues_error_kind(server: &MockServer) -> ErrorKind {
        let github = GitHub::new(&server.uri(), None).unwrap();
        let query = IssueQuery {
            filter: IssueFilter::All,
            page: 1,
        };
        github.list_issues(&repo(), query).await.unwrap_err().kind()
    }

    #[tokio::test]
    async fn get_repository_reads_summary() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/facebook/react"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 10270250,
                "name": "react",
                "full_name": "facebook/react",
                "description": "The library for web and native user interfaces.",
                "owner": { "login": "facebook", "avatar_url": "https://avatars/facebook" },
                "stargazers_count": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let github = GitHub::new(&server.uri(), None).unwrap();
        let summary = github.get_repository(&repo()).await.unwrap();

        assert_eq!(summary.name, "react");
        assert_eq!(summary.owner.login, "facebook");
        assert_eq!(
            summary.description.as_deref(),
            Some("The library for web and native user interfaces.")
        );
    }

    #[tokio::test]
    async fn list_issues_sends_state_page_and_page_size() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/facebook/react/issues"))
            .and(query_param("state", "all"))
            .and(query_param("per_page", "5"))
            .and(query_param("page", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([issue_json(1, "first"), issue_json(2, "second")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let github = GitHub::new(&server.uri(), None).unwrap();
        let issues = github
            .list_issues(
                &repo(),
                IssueQuery {
                    filter: IssueFilter::All,
                    page: 1,
                },
            )
            .await
            .unwrap();

        let titles: Vec<_> = issues.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["first", "second"]);
        assert_eq!(issues[0].labels[0].name, "bug");
    }

    #[tokio::test]
    async fn list_issues_passes_filter_and_page_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/facebook/react/issues"))
            .and(query_param("state", "closed"))
            .and(query_param("per_page", "5"))
            .and(query_param("page", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let github = GitHub::new(&server.uri(), None).unwrap();
        let issues = github
            .list_issues(
                &repo(),
                IssueQuery {
                    filter: IssueFilter::Closed,
                    page: 3,
                },
            )
            .await
            .unwrap();

        assert!(issues.is_empty());
    }

    #[tokio::test]
    async fn missing_repository_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/facebook/react"))
            .respond_with(ResponseTemplate::new(404).set_body_json(error_body("Not Found")))
            .mount(&server)
            .await;

        let github = GitHub::new(&server.uri(), None).unwrap();
        let err = github.get_repository(&repo()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn forbidden_with_rate_limit_message_is_rate_limited() {
        let server = MockServer::start().await;
        mount_issues_error(
            &server,
            403,
            error_body("API rate limit exceeded for 127.0.0.1."),
        )
        .await;
        assert_eq!(issues_error_kind(&server).await, ErrorKind::RateLimited);
    }

    #[tokio::test]
    async fn too_many_requests_is_rate_limited() {
        let server = MockServer::start().await;
        mount_issues_error(&server, 429, error_body("Too Many Requests")).await;
        assert_eq!(issues_error_kind(&server).await, ErrorKind::RateLimited);
    }

    #[tokio::test]
    async fn plain_forbidden_keeps_its_status() {
        let server = MockServer::start().await;
        mount_issues_error(&server, 403, error_body("Resource not accessible")).await;
        assert_eq!(issues_error_kind(&server).await, ErrorKind::Http(403));
    }

    #[tokio::test]
    async fn unexpected_body_is_a_decode_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/facebook/react/issues"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
            .mount(&server)
            .await;
        assert_eq!(issues_error_kind(&server).await, ErrorKind::DecodeFailure);
    }

    #[tokio::test]
    async fn too_many_requests_without_body_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/facebook/react/issues"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        assert_eq!(issues_error_kind(&server).await, ErrorKind::RateLimited);
    }

    #[tokio::test]
    async fn plain_text_not_found_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/facebook/react"))
            .respond_with(ResponseTemplate::new(404).set_body_string("404 page not found"))
            .mount(&server)
            .await;

        let github = GitHub::new(&server.uri(), None).unwrap();
        let err = github.get_repository(&repo()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn html_gateway_error_keeps_its_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/facebook/react/issues"))
            .respond_with(
                ResponseTemplate::new(502)
                    .set_body_raw("<html><body>Bad Gateway</body></html>", "text/html"),
            )
            .mount(&server)
            .await;
        assert_eq!(issues_error_kind(&server).await, ErrorKind::Http(502));
    }

    #[tokio::test]
    async fn error_message_comes_from_the_body_when_present() {
        let server = MockServer::start().await;
        mount_issues_error(&server, 403, error_body("Resource not accessible")).await;
        let github = GitHub::new(&server.uri(), None).unwrap();
        let query = IssueQuery {
            filter: IssueFilter::All,
            page: 1,
        };
        let err = github.list_issues(&repo(), query).await.unwrap_err();
        assert!(err.to_string().contains("Resource not accessible"));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_failure() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let github = GitHub::new(&format!("http://{}", addr), None).unwrap();
        let err = github.get_repository(&repo()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkFailure);
    }

    #[test]
    fn rate_limit_detection_reads_message_and_docs_url() {
        assert!(mentions_rate_limit("API rate limit exceeded", None));
        assert!(mentions_rate_limit(
            "You have exceeded a secondary limit",
            Some("https://docs.github.com/rest/overview/rate-limits-for-the-rest-api")
        ));
        assert!(!mentions_rate_limit("Must have admin rights", None));
    }

    #[test]
    fn issue_params_always_request_five_per_page() {
        let params = IssueParams::from(IssueQuery {
            filter: IssueFilter::Open,
            page: 4,
        });
        assert_eq!(params.state, "open");
        assert_eq!(params.per_page, 5);
        assert_eq!(params.page, 4);
        assert_eq!(params.query_string(), "state=open&per_page=5&page=4");
    }

    #[test]
    fn classify_prefers_status_over_body() {
        let empty = ErrorBody::default();
        assert_eq!(classify(404, &empty), ErrorKind::NotFound);
        assert_eq!(classify(429, &empty), ErrorKind::RateLimited);
        assert_eq!(classify(403, &empty), ErrorKind::Http(403));
        assert_eq!(classify(500, &empty), ErrorKind::Http(500));

        let quota = ErrorBody {
            message: "API rate limit exceeded".to_string(),
            documentation_url: None,
        };
        assert_eq!(classify(403, &quota), ErrorKind::RateLimited);
    }
}
