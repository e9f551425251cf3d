use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

// Per-request timeouts are set by callers; this one only bounds connection setup.
static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .connect_timeout(Duration::from_secs(15))
        .user_agent(concat!("emoji-forge/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to build HTTP client")
});

pub fn get_http_client() -> &'static Client {
    &HTTP_CLIENT
}
