//! Message framing on the stdio channel. Clients either send LSP-style
//! `Content-Length` headers or one JSON document per line; each reply goes
//! back in the framing its request arrived in.

use std::io;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    ContentLength,
    Line,
}

/// One message read off the channel. A payload that is not JSON is kept as
/// an error so the server can answer with a parse error and carry on.
#[derive(Debug)]
pub struct Frame {
    pub framing: Framing,
    pub message: Result<Value, serde_json::Error>,
}

/// Returns `Ok(None)` on a clean EOF between messages.
pub async fn read_frame<R>(reader: &mut R) -> io::Result<Option<Frame>>
where
    R: AsyncBufRead + Unpin,
{
    let first = loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            break trimmed.to_string();
        }
    };

    if first.starts_with('{') || first.starts_with('[') {
        return Ok(Some(Frame {
            framing: Framing::Line,
            message: serde_json::from_str(&first),
        }));
    }

    let mut content_length = parse_content_length(&first)?;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Unexpected EOF while reading MCP headers",
            ));
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }
        if let Some(len) = parse_content_length(line)? {
            content_length = Some(len);
        }
    }

    let content_length = content_length.ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidData, "Missing Content-Length header")
    })?;
    let mut payload = vec![0_u8; content_length];
    reader.read_exact(&mut payload).await?;

    Ok(Some(Frame {
        framing: Framing::ContentLength,
        message: serde_json::from_slice(&payload),
    }))
}

/// `Ok(None)` for headers other than Content-Length.
fn parse_content_length(line: &str) -> io::Result<Option<usize>> {
    let Some((name, value)) = line.split_once(':') else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Expected a header or a JSON message, got '{line}'"),
        ));
    };
    if !name.trim().eq_ignore_ascii_case("content-length") {
        return Ok(None);
    }
    value
        .trim()
        .parse::<usize>()
        .map(Some)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "Invalid Content-Length header"))
}

pub async fn write_frame<W>(writer: &mut W, value: &Value, framing: Framing) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_vec(value).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Failed to serialize JSON: {e}"),
        )
    })?;
    match framing {
        Framing::ContentLength => {
            let header = format!(
                "Content-Length: {}\r\nContent-Type: application/json\r\n\r\n",
                body.len()
            );
            writer.write_all(header.as_bytes()).await?;
            writer.write_all(&body).await?;
        }
        Framing::Line => {
            writer.write_all(&body).await?;
            writer.write_all(b"\n").await?;
        }
    }
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::io::BufReader;

    use super::*;

    fn framed(body: &str) -> String {
        format!("Content-Length: {}\r\n\r\n{body}", body.len())
    }

    #[tokio::test]
    async fn reads_content_length_messages_back_to_back() {
        let input = format!(
            "{}{}",
            framed(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#),
            framed(r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#)
        );
        let mut reader = BufReader::new(input.as_bytes());

        let first = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(first.framing, Framing::ContentLength);
        assert_eq!(first.message.unwrap()["id"], 1);
        let second = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(second.message.unwrap()["id"], 2);
        assert!(read_frame(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn extra_headers_are_ignored() {
        let body = r#"{"id":7}"#;
        let input = format!(
            "Content-Type: application/json\r\ncontent-length: {}\r\n\r\n{body}",
            body.len()
        );
        let mut reader = BufReader::new(input.as_bytes());
        let frame = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(frame.message.unwrap(), json!({ "id": 7 }));
    }

    #[tokio::test]
    async fn reads_newline_delimited_messages() {
        let input = "{\"id\":1}\n\n[{\"id\":2}]\n";
        let mut reader = BufReader::new(input.as_bytes());

        let first = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(first.framing, Framing::Line);
        assert_eq!(first.message.unwrap(), json!({ "id": 1 }));
        let second = read_frame(&mut reader).await.unwrap().unwrap();
        assert!(second.message.unwrap().is_array());
        assert!(read_frame(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_json_is_returned_not_fatal() {
        let mut reader = BufReader::new("{not json}\n".as_bytes());
        let frame = read_frame(&mut reader).await.unwrap().unwrap();
        assert!(frame.message.is_err());
    }

    #[tokio::test]
    async fn truncated_headers_are_an_error() {
        let mut reader = BufReader::new("Content-Length: 10\r\n".as_bytes());
        let err = read_frame(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        let mut reader = BufReader::new("Content-Length: ten\r\n\r\n".as_bytes());
        let err = read_frame(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn writes_in_the_requested_framing() {
        let value = json!({ "jsonrpc": "2.0", "id": 1, "result": {} });
        let body = serde_json::to_string(&value).unwrap();

        let mut out = Vec::new();
        write_frame(&mut out, &value, Framing::Line).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), format!("{body}\n"));

        let mut out = Vec::new();
        write_frame(&mut out, &value, Framing::ContentLength)
            .await
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!(
                "Content-Length: {}\r\nContent-Type: application/json\r\n\r\n{body}",
                body.len()
            )
        );
    }
}
