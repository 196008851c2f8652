use anyhow::{anyhow, Context, Result};
use futures::stream::{self, Stream, StreamExt};
use headers::{HeaderMapExt, UserAgent};
use hyper::client::HttpConnector;
use hyper::header::ACCEPT;
use hyper::{Body, Client, Method, Request, Uri};
use hyper_tls::HttpsConnector;
use serde::de::DeserializeOwned;
use url::Url;

use std::future::Future;

use crate::model::{Issue, NodeList, Page, Queue};

pub type Query = [(&'static str, String)];

pub struct DrupalApi {
    client: Client<HttpsConnector<HttpConnector>>,
    endpoint: Url,
}

impl DrupalApi {
    pub const API_ENDPOINT: &'static str = "https://www.drupal.org/api-d7";
    const USER_AGENT: &'static str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint =
            Url::parse(endpoint).with_context(|| format!("invalid api url '{}'", endpoint))?;
        if endpoint.cannot_be_a_base() {
            return Err(anyhow!("'{}' cannot be used as api base url", endpoint));
        }
        Ok(Self {
            client: Client::builder().build(HttpsConnector::new()),
            endpoint,
        })
    }

    pub async fn get<T>(&self, url: &Url) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let uri: Uri = url
            .as_str()
            .parse()
            .with_context(|| format!("invalid url '{}'", url))?;
        let mut req = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(ACCEPT, "application/json")
            .body(Body::empty())?;
        req.headers_mut()
            .typed_insert(UserAgent::from_static(Self::USER_AGENT));

        let resp = self.client.request(req).await?;
        let status = resp.status();
        let body = hyper::body::to_bytes(resp.into_body()).await?;
        if !status.is_success() {
            return Err(anyhow!(
                "request failed with {}: '{}'",
                status,
                String::from_utf8_lossy(&body)
            ));
        }
        serde_json::from_slice(&body).context("could not parse response from server")
    }

    /// Fetches a single page of `{path}.json`.
    pub async fn page(&self, path: &str, query: &Query, page: u32) -> Result<Page> {
        let url = listing_url(&self.endpoint, path, query, page)?;
        tracing::info!("Fetching {}", url);
        let list: NodeList = self.get(&url).await?;
        Ok(Page::from(list))
    }

    /// Walks all pages of `{path}.json`. A failing page ends the walk, issues
    /// collected so far are returned.
    pub async fn fetch_all(&self, path: &str, query: &Query) -> Vec<Issue> {
        collect_issues(paginate(move |page| self.page(path, query, page))).await
    }

    /// All issues of a project currently in `queue`.
    pub async fn issues(&self, project: u32, queue: Queue, limit: u32) -> Vec<Issue> {
        self.fetch_all("/node", &issue_query(project, queue, limit))
            .await
    }
}

pub fn issue_query(project: u32, queue: Queue, limit: u32) -> Vec<(&'static str, String)> {
    vec![
        ("field_project", project.to_string()),
        ("type", "project_issue".to_owned()),
        ("field_issue_status", queue.status().to_string()),
        ("limit", limit.to_string()),
    ]
}

/// `{endpoint}{path}.json` with `query` and `page` appended to any query the
/// endpoint already carries.
fn listing_url(endpoint: &Url, path: &str, query: &Query, page: u32) -> Result<Url> {
    let mut url = endpoint.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow!("'{}' cannot be used as api base url", endpoint))?
        .pop_if_empty()
        .extend(format!("{}.json", path.trim_matches('/')).split('/'));
    url.query_pairs_mut()
        .extend_pairs(query.iter().map(|(key, value)| (*key, value.as_str())))
        .append_pair("page", &page.to_string());
    Ok(url)
}

/// Requests pages starting at 0 until the server reports the last one.
///
/// An error from `fetch` is logged and ends the stream. The walk also stops
/// when the server answers with a page index lower than the requested one.
pub fn paginate<F, Fut>(fetch: F) -> impl Stream<Item = Page>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page>>,
{
    stream::unfold((fetch, Some(0)), |(mut fetch, next)| async move {
        let requested = next?;
        match fetch(requested).await {
            Ok(page) => {
                let next = if page.is_last() || page.current < requested {
                    None
                } else {
                    Some(page.current + 1)
                };
                Some((page, (fetch, next)))
            }
            Err(err) => {
                tracing::error!("Fetching page {} failed: {:#}", requested, err);
                None
            }
        }
    })
}

pub async fn collect_issues(pages: impl Stream<Item = Page>) -> Vec<Issue> {
    pages.flat_map(|page| stream::iter(page.items)).collect().await
}
