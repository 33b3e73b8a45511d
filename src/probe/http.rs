use reqwest::Client;
use std::time::Duration;

pub fn client(timeout: Duration) -> Client {
    match Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(err) => {
            log::warn!("falling back to default http client: {err}");
            Client::new()
        }
    }
}

/// Issues one GET and reports whether the status landed in [200, 400).
pub async fn healthy(client: &Client, url: &str) -> Result<bool, reqwest::Error> {
    let status = client.get(url).send().await?.status();
    log::debug!("health check {url} answered {status}");

    Ok((200..400).contains(&status.as_u16()))
}
