//! Easy-handle configuration shared by every connection slot.

use std::time::Duration;

use curl::easy::Easy2;

use super::handler::FetchHandler;
use crate::config::RetrieverConfig;

/// Options applied once to each handle when the pool is built.
#[derive(Debug, Clone)]
pub struct HandleSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_redirects: u32,
    pub max_body_bytes: usize,
    pub user_agent: Option<String>,
}

impl HandleSettings {
    pub fn from_config(cfg: &RetrieverConfig) -> Self {
        Self {
            connect_timeout: cfg.connect_timeout(),
            request_timeout: cfg.request_timeout(),
            max_redirects: cfg.max_redirects,
            max_body_bytes: cfg.max_body_bytes,
            user_agent: cfg.user_agent.clone(),
        }
    }
}

/// Build an idle handle for `slot`: GET, follow redirects, bounded timeouts,
/// no signal-based DNS timeouts.
pub(super) fn new_handle(
    slot: usize,
    settings: &HandleSettings,
) -> Result<Easy2<FetchHandler>, curl::Error> {
    let mut easy = Easy2::new(FetchHandler::new(slot, settings.max_body_bytes));
    easy.get(true)?;
    easy.follow_location(true)?;
    easy.max_redirections(settings.max_redirects)?;
    easy.connect_timeout(settings.connect_timeout)?;
    easy.timeout(settings.request_timeout)?;
    easy.signal(false)?;
    if let Some(ref agent) = settings.user_agent {
        easy.useragent(agent)?;
    }
    Ok(easy)
}

/// Ignore SIGPIPE process-wide. With signals disabled on the handles, a peer
/// dropping the connection then surfaces as a transfer error instead of
/// killing the process.
pub fn ignore_sigpipe() {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_IGN);
    }
}

/// libcurl's description, with the per-transfer detail appended when present.
pub(super) fn error_message(e: &curl::Error) -> String {
    match e.extra_description() {
        Some(extra) if !extra.is_empty() => format!("{}: {}", e.description(), extra),
        _ => e.description().to_string(),
    }
}
