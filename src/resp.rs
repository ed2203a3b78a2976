use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::reply::Reply;

/// The RESP2 wire framing spec §6 treats as an external, pluggable codec:
/// request is `(command-name, args)` as an array of bulk strings in, typed
/// [`Reply`] out. [`crate::engine::Engine`] and [`crate::command::Registry`]
/// never import this module — an embedder is free to parse RESP3, a custom
/// binary protocol, or drive the engine directly without any codec at all
/// (SPEC_FULL.md §6).
///
/// Reads one request (an array of bulk strings, or a plain inline command)
/// from `reader`. Returns `Ok(None)` at a clean EOF.
pub async fn read_request<R>(reader: &mut R) -> std::io::Result<Option<Vec<Bytes>>>
where
    R: AsyncBufRead + Unpin,
{
    let Some(line) = read_line(reader).await? else {
        return Ok(None);
    };
    if line.is_empty() {
        return Ok(Some(Vec::new()));
    }
    if line[0] != b'*' {
        let args = line
            .split(u8::is_ascii_whitespace)
            .filter(|part| !part.is_empty())
            .map(Bytes::copy_from_slice)
            .collect();
        return Ok(Some(args));
    }

    let count = parse_len(&line[1..])?;
    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        let Some(header) = read_line(reader).await? else {
            return Ok(None);
        };
        if header.first() != Some(&b'$') {
            return Err(invalid_data("expected bulk string header"));
        }
        let len = parse_len(&header[1..])?;
        let mut buf = vec![0u8; len + 2];
        reader.read_exact(&mut buf).await?;
        buf.truncate(len);
        args.push(Bytes::from(buf));
    }
    Ok(Some(args))
}

async fn read_line<R>(reader: &mut R) -> std::io::Result<Option<Vec<u8>>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let n = reader.read_until(b'\n', &mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    Ok(Some(buf))
}

fn parse_len(bytes: &[u8]) -> std::io::Result<usize> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| invalid_data("expected a length prefix"))
}

fn invalid_data(message: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, message.to_owned())
}

/// Writes `reply` in RESP2 form. Boxed and recursive (rather than a plain
/// `async fn`) so that `Reply::Array`'s elements — which can themselves be
/// arrays, as in a `SUBSCRIBE` acknowledgement nested inside a pipelined
/// batch — encode without needing a second, non-recursive code path.
pub fn write_reply<'a, W>(writer: &'a mut W, reply: &'a Reply) -> Pin<Box<dyn Future<Output = std::io::Result<()>> + Send + 'a>>
where
    W: AsyncWrite + Unpin + Send,
{
    Box::pin(async move {
        match reply {
            Reply::Integer(n) => {
                writer.write_all(format!(":{n}\r\n").as_bytes()).await?;
            }
            Reply::Bulk(None) => {
                writer.write_all(b"$-1\r\n").await?;
            }
            Reply::Bulk(Some(bytes)) => {
                writer.write_all(format!("${}\r\n", bytes.len()).as_bytes()).await?;
                writer.write_all(bytes).await?;
                writer.write_all(b"\r\n").await?;
            }
            Reply::Array(items) => {
                writer.write_all(format!("*{}\r\n", items.len()).as_bytes()).await?;
                for item in items {
                    write_reply(writer, item).await?;
                }
            }
            Reply::Status(status) => {
                writer.write_all(b"+").await?;
                writer.write_all(status).await?;
                writer.write_all(b"\r\n").await?;
            }
            Reply::Error(error) => {
                writer.write_all(b"-").await?;
                writer.write_all(error.to_string().as_bytes()).await?;
                writer.write_all(b"\r\n").await?;
            }
            Reply::Subscribed => {}
        }
        Ok(())
    })
}
