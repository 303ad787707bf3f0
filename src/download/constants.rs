//! Constants for the download module (timeouts, buffer sizes).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default read timeout for a document fetch (2 minutes).
///
/// Applies to each read, so it bounds the worst-case stall of a transfer but not its
/// total duration. There is no global run deadline.
pub const FETCH_TIMEOUT_SECS: u64 = 120;

/// Read buffer used by the content verifier (64 KiB).
pub const VERIFY_CHUNK_BYTES: usize = 64 * 1024;
