use ::url::Url;

use crate::error::ProtocolError;

/// Path of the executor's terminal socket on the serving origin.
pub const DEFAULT_SOCKET_PATH: &str = "/ws/terminal";
/// Query parameter carrying the persisted session correlation id.
pub const CONNECTION_ID_PARAM: &str = "connectionId";

/// Socket URL for a page origin.
///
/// Rules:
/// 1) `http` becomes `ws`, `https` becomes `wss`; socket schemes are kept
/// 2) the origin's own path, query and fragment are discarded
/// 3) `socket_path` and the `connectionId` query parameter are appended
pub fn connection_url(
    origin: &str,
    socket_path: &str,
    connection_id: &str,
) -> Result<Url, ProtocolError> {
    let mut url = Url::parse(origin.trim()).map_err(|error| ProtocolError::InvalidOrigin {
        origin: origin.to_owned(),
        reason: error.to_string(),
    })?;

    let socket_scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(ProtocolError::UnsupportedScheme {
                scheme: other.to_owned(),
            })
        }
    };
    url.set_scheme(socket_scheme)
        .map_err(|()| ProtocolError::InvalidOrigin {
            origin: origin.to_owned(),
            reason: format!("cannot switch scheme to {socket_scheme}"),
        })?;

    let path = if socket_path.trim().is_empty() {
        DEFAULT_SOCKET_PATH
    } else {
        socket_path.trim()
    };
    url.set_path(path);
    url.set_fragment(None);
    url.set_query(None);
    url.query_pairs_mut()
        .append_pair(CONNECTION_ID_PARAM, connection_id);

    Ok(url)
}
