use reqwest::Client;

use crate::cli::Config;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status code: {0}")]
    HttpStatus(u16),
}

pub fn client(config: &Config) -> Result<Client, FetchError> {
    Ok(Client::builder()
        .timeout(config.timeout)
        .user_agent(config.user_agent.as_str())
        .build()?)
}

/// A single GET of the feed; anything but a 2xx response is an error.
pub async fn fetch_feed(client: &Client, url: &str) -> Result<Vec<u8>, FetchError> {
    log::info!("Fetching feed: {url}");

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    Ok(response.bytes().await?.to_vec())
}
