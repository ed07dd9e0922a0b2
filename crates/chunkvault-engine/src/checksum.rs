//! SHA-256 helpers. Checksums are lowercase hex strings throughout.

use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};

/// SHA-256 of zero bytes.
pub const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Hex-encoded SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
  hex::encode(Sha256::digest(data))
}

/// Hash everything `reader` yields until EOF.
///
/// Returns the hex digest and the number of bytes read. The reader is left
/// at EOF; seekable callers rewind before reading it again.
pub async fn checksum_reader<R>(reader: &mut R) -> std::io::Result<(String, u64)>
where
  R: AsyncRead + Unpin,
{
  let mut hasher = Sha256::new();
  let mut buf = vec![0u8; READ_BUFFER_SIZE];
  let mut total = 0u64;

  loop {
    let n = reader.read(&mut buf).await?;
    if n == 0 {
      break;
    }
    hasher.update(&buf[..n]);
    total += n as u64;
  }

  Ok((hex::encode(hasher.finalize()), total))
}
