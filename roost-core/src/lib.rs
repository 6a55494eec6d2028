#[macro_use]
extern crate tracing;

use reqwest::header::HeaderMap;
use reqwest::Proxy;

use crate::config::Configuration;
use crate::error::RoostResult;

pub mod config;
pub mod error;
pub mod request_helper;
pub mod session;
pub mod state;

/// Build the HTTP client used for every platform API call.
///
/// Short timeouts and no redirect following: the API is a first-party
/// collaborator, not the open web, and a hung upstream must not hold the
/// request thread hostage.
pub fn http_client(config: &Configuration) -> RoostResult<reqwest::Client> {
    let client = reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_millis(500))
        .timeout(std::time::Duration::from_secs(5))
        .redirect(reqwest::redirect::Policy::none());
    let client = if let Some(proxy) = &config.proxy {
        client.proxy(Proxy::all(proxy.clone())?)
    } else {
        client
    };
    Ok(client.default_headers(common_headers()).build()?)
}

fn common_headers() -> HeaderMap {
    let mut hm = HeaderMap::new();
    let user_agent = format!("Mozilla/5.0 ({} v{})", package_name(), package_version());
    trace!("new user agent with value {}", user_agent);
    hm.append(reqwest::header::USER_AGENT, user_agent.parse().unwrap());
    hm
}

pub fn package_name() -> &'static str {
    env!("CARGO_PKG_NAME")
}

pub fn package_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub fn package_full() -> String {
    format!("{} v{}", package_name(), package_version())
}
