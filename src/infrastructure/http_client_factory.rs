use reqwest::Client;
use std::time::Duration;

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Creates an HTTP client whose every request is bounded by `timeout`.
    /// Requests are never retried: one failed fetch fails the prediction.
    pub fn create_client(timeout: Duration) -> reqwest::Result<Client> {
        Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("signalcast/", env!("CARGO_PKG_VERSION")))
            .build()
    }
}
