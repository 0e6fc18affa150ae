#![warn(clippy::all, clippy::pedantic)]
use std::path::Path;
use std::time::Duration;

use base64::{engine, Engine as _};
use bytes::Bytes;
use http_body_util::{BodyExt as _, Empty};
use hyper::{body::Incoming, ext::ReasonPhrase, Method, Request, Response, StatusCode, Uri};
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt as _;
use urlencoding::encode;

use crate::error::{Error, Result};

type HttpClient = Client<HttpsConnector<HttpConnector>, Empty<Bytes>>;

/// Builds `{base}/job/{a}/job/{b}` from a job path like `a/b`.
pub fn job_url(base: &str, job: &str) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    for segment in job.split('/').filter(|s| !s.is_empty()) {
        url.push_str("/job/");
        url.push_str(&encode(segment));
    }
    url
}

fn reason(res: &Response<Incoming>) -> String {
    res.extensions()
        .get::<ReasonPhrase>()
        .map(|r| String::from_utf8_lossy(r.as_bytes()).into_owned())
        .or_else(|| res.status().canonical_reason().map(str::to_string))
        .unwrap_or_default()
}

#[derive(Clone, Default)]
pub struct Credentials {
    pub login: Option<String>,
    pub token: Option<String>,
}

impl Credentials {
    pub fn new(login: Option<String>, token: Option<String>) -> Self {
        Self { login, token }
    }

    fn authorization(&self) -> Option<String> {
        if self.login.is_none() && self.token.is_none() {
            return None;
        }

        let login = self.login.as_deref().unwrap_or_default();
        let token = self.token.as_deref().unwrap_or_default();
        Some(format!(
            "Basic {}",
            engine::general_purpose::STANDARD.encode(format!("{login}:{token}"))
        ))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

pub struct Jenkins {
    client: HttpClient,
    credentials: Credentials,
    timeout: Duration,
}

impl Jenkins {
    /// `timeout` bounds the TCP connect and every wait on the server
    /// (response headers, each body frame).
    pub fn new(credentials: Credentials, timeout: Duration) -> Self {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(Some(timeout));
        let stream = HttpsConnector::new_with_connector(http);

        let client = Client::builder(TokioExecutor::new()).build(stream);

        Self {
            client,
            credentials,
            timeout,
        }
    }

    async fn send_request(&self, url: &str) -> Result<Response<Incoming>> {
        let uri = url
            .parse::<Uri>()
            .map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;

        let mut req = Request::builder().uri(uri).method(Method::GET);
        if let Some(auth) = self.credentials.authorization() {
            req = req.header(hyper::header::AUTHORIZATION, auth);
        }
        let req = req
            .body(Empty::<Bytes>::new())
            .map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;

        log::debug!("GET {url}");
        let res = tokio::time::timeout(self.timeout, self.client.request(req))
            .await
            .map_err(|_| Error::Timeout(self.timeout))??;
        log::debug!("{} <- {url}", res.status());

        Ok(res)
    }

    /// Fetches a JSON document. Any non-2xx status is a `Server` error.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let res = self.send_request(url).await?;

        if !res.status().is_success() {
            return Err(Error::Server {
                status: res.status().as_u16(),
                reason: reason(&res),
            });
        }

        let mut body = res.into_body();
        let mut json = Vec::new();
        while let Some(chunk) = self.next_chunk(&mut body).await? {
            json.extend_from_slice(&chunk);
        }

        Ok(serde_json::from_slice(&json)?)
    }

    /// Next data chunk of `body`, waiting at most `timeout` for it.
    async fn next_chunk(&self, body: &mut Incoming) -> Result<Option<Bytes>> {
        loop {
            let next = tokio::time::timeout(self.timeout, body.frame())
                .await
                .map_err(|_| Error::Timeout(self.timeout))?;

            match next {
                Some(frame) => {
                    if let Ok(chunk) = frame?.into_data() {
                        return Ok(Some(chunk));
                    }
                }
                None => return Ok(None),
            }
        }
    }

    /// Streams the body of `url` into `dest`, truncating whatever is there.
    /// Nothing is created unless the server answers 200.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<usize> {
        let res = self.send_request(url).await?;

        if res.status() != StatusCode::OK {
            return Err(Error::Download {
                status: res.status().as_u16(),
                reason: reason(&res),
            });
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| Error::filesystem(dest, e))?;

        let mut body = res.into_body();
        let mut written = 0;
        while let Some(chunk) = self.next_chunk(&mut body).await? {
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::filesystem(dest, e))?;
            written += chunk.len();
        }
        file.flush().await.map_err(|e| Error::filesystem(dest, e))?;

        Ok(written)
    }
}
