//! Bridge from async command handlers to the blocking WebSocket client.

use hassws::Connection;

use crate::config::HassConfig;
use crate::error::CliError;

/// Connect, authenticate, run `work` on tokio's blocking pool, then close.
///
/// The connection is closed whether `work` succeeds or not.
pub async fn session<T, F>(config: &HassConfig, work: F) -> Result<T, CliError>
where
    T: Send + 'static,
    F: FnOnce(&mut Connection) -> Result<T, CliError> + Send + 'static,
{
    let base_url = config.base_url.clone();
    let token = config.token.clone();
    let options = config.connect_options();

    tokio::task::spawn_blocking(move || {
        let mut conn = Connection::connect_with(&base_url, &token, &options)?;
        let outcome = work(&mut conn);
        conn.close();
        outcome
    })
    .await?
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
