// src/crawl/fetch.rs
// =============================================================================
// Fetches the seed page.
//
// One GET, following redirects. We keep the final URL because the origin
// for link classification comes from wherever the request actually ended
// up, not from what the user typed.
//
// The client carries a timeout so a hung server can't stall the run.
// =============================================================================

use super::classify::Origin;
use crate::error::FetchError;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after following redirects
    pub final_url: Url,
    pub html: String,
}

impl FetchedPage {
    pub fn origin(&self) -> Result<Origin, FetchError> {
        Origin::from_url(&self.final_url).ok_or_else(|| FetchError::NoHost {
            url: self.final_url.to_string(),
        })
    }
}

pub fn build_client(timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .user_agent(concat!("site-report/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(FetchError::Client)
}

pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage, FetchError> {
    let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;

    let response = client
        .get(parsed)
        .send()
        .await
        .map_err(|e| request_error(url, e))?;

    let final_url = response.url().clone();
    let status = response.status();

    if !status.is_success() {
        return Err(FetchError::Status {
            url: final_url.to_string(),
            status,
        });
    }

    let html = response
        .text()
        .await
        .map_err(|e| request_error(final_url.as_str(), e))?;

    Ok(FetchedPage { final_url, html })
}

// Timeouts get their own variant so the operator sees what happened
// rather than a wall of hyper internals
fn request_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Request {
            url: url.to_string(),
            source: error,
        }
    }
}
