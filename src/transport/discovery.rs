//! Peer socket discovery and sandbox detection.

use std::{
    env,
    io,
    path::{Path, PathBuf},
};

use tokio::net::UnixStream;

use crate::error::RpcError;

/// Environment variable set when the process runs inside an app sandbox.
pub const SANDBOX_ENV_VAR: &str = "APP_SANDBOX_CONTAINER_ID";

/// File name prefix of the peer's listening sockets.
pub const SOCKET_NAME_PREFIX: &str = "discord-ipc-";

/// Number of numbered socket slots the peer may listen on.
pub const SOCKET_SLOTS: usize = 10;

const RUNTIME_DIR_VARS: [&str; 4] = ["XDG_RUNTIME_DIR", "TMPDIR", "TMP", "TEMP"];

/// Report whether the sandbox marker is set, using `lookup` to read the
/// environment.
///
/// # Examples
///
/// ```
/// use rpcframe::transport::is_sandboxed_with;
///
/// assert!(is_sandboxed_with(|_| Some("container".to_owned())));
/// assert!(!is_sandboxed_with(|_| None));
/// ```
#[must_use]
pub fn is_sandboxed_with(lookup: impl Fn(&str) -> Option<String>) -> bool {
    lookup(SANDBOX_ENV_VAR).is_some()
}

/// Report whether the current process is sandboxed.
#[must_use]
pub fn is_sandboxed() -> bool { is_sandboxed_with(|key| env::var(key).ok()) }

/// Resolve the directory the peer places its sockets in.
///
/// The first non-empty of `XDG_RUNTIME_DIR`, `TMPDIR`, `TMP` and `TEMP`
/// wins; `/tmp` is the fallback.
#[must_use]
pub fn runtime_dir_with(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    RUNTIME_DIR_VARS
        .iter()
        .filter_map(|key| lookup(key))
        .find(|value| !value.is_empty())
        .map_or_else(|| PathBuf::from("/tmp"), PathBuf::from)
}

/// Candidate socket paths inside `dir`, in the order they are tried.
///
/// # Examples
///
/// ```
/// use std::path::Path;
///
/// use rpcframe::transport::socket_paths_in;
///
/// let paths = socket_paths_in(Path::new("/run/user/1000"));
/// assert_eq!(paths.len(), 10);
/// assert_eq!(paths[0], Path::new("/run/user/1000/discord-ipc-0"));
/// ```
#[must_use]
pub fn socket_paths_in(dir: &Path) -> Vec<PathBuf> {
    (0..SOCKET_SLOTS)
        .map(|slot| dir.join(format!("{SOCKET_NAME_PREFIX}{slot}")))
        .collect()
}

/// Candidate socket paths derived from the process environment.
#[must_use]
pub fn default_socket_paths() -> Vec<PathBuf> {
    socket_paths_in(&runtime_dir_with(|key| env::var(key).ok()))
}

/// Errors that mean "nobody listens here", as opposed to a broken socket
/// layer.
fn is_no_listener(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::AddrNotAvailable
    )
}

/// Connect to the first candidate that accepts, trying `paths` in order.
///
/// Paths after the one that accepts are never touched.
pub(crate) async fn connect_first(paths: &[PathBuf]) -> Result<(UnixStream, PathBuf), RpcError> {
    for path in paths {
        match UnixStream::connect(path).await {
            Ok(stream) => return Ok((stream, path.clone())),
            Err(err) if is_no_listener(&err) => {
                tracing::trace!(path = %path.display(), error = %err, "no listener");
            }
            Err(err) => return Err(RpcError::SocketCreationFailed(err)),
        }
    }
    Err(RpcError::NoListenerFound {
        tried: paths.to_vec(),
    })
}
