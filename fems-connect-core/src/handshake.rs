//! Login and channel subscription.
//!
//! Both steps are a single request/response exchange. They report success as
//! a plain `bool` and log the reason of any failure exactly once; retrying is
//! left to the supervisor.

use crate::rpc::{RpcRequest, RpcResponse};
use crate::traits::MessageTransport;
use crate::{ConnectorError, ConnectorResult};
use tracing::{error, info, trace};

/// Log in with `authenticateWithPassword`
pub async fn authenticate<T: MessageTransport>(session: &mut T, password: &str) -> bool {
    let request = RpcRequest::authenticate(password);

    trace!("sending login request");
    let ok = exchange(session, &request, "login").await;
    if ok {
        info!("login succeeded");
    }
    ok
}

/// Subscribe to `channels` through an `edgeRpc` wrapped `subscribeChannels`
pub async fn subscribe<T: MessageTransport>(session: &mut T, channels: &[String]) -> bool {
    let request = RpcRequest::subscribe_channels(channels);

    trace!("subscribing to {} channels", channels.len());
    let ok = exchange(session, &request, "channel subscribe").await;
    if ok {
        info!("subscribed to channels: {:?}", channels);
    }
    ok
}

/// Send `request` and validate the single response that follows
async fn exchange<T: MessageTransport>(
    session: &mut T,
    request: &RpcRequest,
    step: &str,
) -> bool {
    if let Err(e) = session.send_json(request).await {
        log_send_failure(step, &e);
        return false;
    }

    match read_response(session, request).await {
        Ok(()) => true,
        Err(e) => {
            log_read_failure(step, &e);
            false
        }
    }
}

async fn read_response<T: MessageTransport>(
    session: &mut T,
    request: &RpcRequest,
) -> ConnectorResult<()> {
    let raw = session.recv_message().await?;

    let response: RpcResponse = serde_json::from_str(&raw).map_err(|e| {
        ConnectorError::invalid_data(format!("could not parse response: {}", e), raw.as_bytes())
    })?;

    if !response.matches(&request.id) {
        return Err(ConnectorError::protocol(format!(
            "unexpected response id. sent: {:?} received: {:?}",
            request, response
        )));
    }

    trace!("got {} response", request.method);
    if let Some(err) = response.error {
        return Err(ConnectorError::Rpc {
            code: err.code,
            message: err.message,
        });
    }

    Ok(())
}

fn log_send_failure(step: &str, err: &ConnectorError) {
    if err.is_transport() {
        info!("write {} request: {}", step, err)
    } else {
        error!("{} failed: {}", step, err)
    }
}

fn log_read_failure(step: &str, err: &ConnectorError) {
    match err {
        ConnectorError::InvalidData { .. } => info!(
            "{} failed: {}. data was: {}",
            step,
            err,
            err.payload_lossy().unwrap_or_default()
        ),
        ConnectorError::Rpc { code, message } => {
            error!("{} failed: {} - {}", step, code, message)
        }
        err if err.is_transport() => info!("read {} response: {}", step, err),
        _ => error!("{} failed: {}", step, err),
    }
}
