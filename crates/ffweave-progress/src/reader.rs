//! Driving a parser from an async byte stream.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use ffweave_core::Result;

use crate::parser::ProgressParser;

/// Read `reader` to EOF, feeding every line into `parser`, then flush any
/// unterminated trailing line.
///
/// Typically `reader` is the stdout of an ffmpeg child started with
/// `-progress pipe:1`. Invalid UTF-8 is replaced rather than rejected.
/// Returns the number of bytes read.
pub async fn consume<R>(parser: &mut ProgressParser, reader: R) -> Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut total = 0u64;

    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf).await?;
        if n == 0 {
            break;
        }
        total += n as u64;
        parser.feed(&String::from_utf8_lossy(&buf));
    }

    parser.finish();
    tracing::debug!(
        "Progress stream closed after {} bytes, {} updates",
        total,
        parser.update_count()
    );
    Ok(total)
}
