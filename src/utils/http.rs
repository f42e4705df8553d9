// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::ImageConfig;

/// Create the asynchronous client used for image downloads.
///
/// An unusable proxy address is logged and the client is built without one.
pub fn create_async_client(config: &ImageConfig, proxy: Option<&str>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs));

    if let Some(address) = proxy {
        match reqwest::Proxy::all(address) {
            Ok(proxy) => builder = builder.proxy(proxy),
            Err(e) => {
                log::error!("Invalid proxy '{}': {}. Downloading without a proxy.", address, e)
            }
        }
    }

    Ok(builder.build()?)
}
