//! Parsing of lines typed at the prompt.

use std::path::PathBuf;

use hikyaku_shared::protocol::{InboundFrame, parse_target_id};

use crate::error::ClientError;

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send a frame as typed (`<target>:<message>` or a raw file frame)
    Send(InboundFrame),
    /// `/file <target> <path>`: read, encode and send a local file
    SendFile { target_id: u64, path: PathBuf },
    /// `/help`
    Help,
    /// `/quit`
    Quit,
}

/// Parse one input line.
///
/// Plain lines are validated against the inbound frame grammar before they
/// are sent, so typos are reported locally instead of being dropped by the server.
pub fn parse_command(line: &str) -> Result<Command, ClientError> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix('/') {
        let mut parts = rest.splitn(3, char::is_whitespace);
        return match (parts.next(), parts.next(), parts.next()) {
            (Some("quit"), None, None) => Ok(Command::Quit),
            (Some("help"), None, None) => Ok(Command::Help),
            (Some("file"), Some(target), Some(path)) if !path.trim().is_empty() => {
                let target_id = parse_target_id(target)
                    .map_err(|e| ClientError::InvalidCommand(e.to_string()))?;
                Ok(Command::SendFile {
                    target_id,
                    path: PathBuf::from(path.trim()),
                })
            }
            (Some("file"), _, _) => Err(ClientError::InvalidCommand(
                "usage: /file <target_id> <path>".to_string(),
            )),
            _ => Err(ClientError::InvalidCommand(format!(
                "unknown command '{}', type /help",
                line
            ))),
        };
    }

    InboundFrame::parse(line)
        .map(Command::Send)
        .map_err(|e| ClientError::InvalidCommand(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_message() {
        // テスト項目: "<target>:<message>" はテキストフレームとして解釈される
        // given (前提条件):
        let line = "42:hello:world";

        // when (操作):
        let result = parse_command(line).unwrap();

        // then (期待する結果):
        assert_eq!(
            result,
            Command::Send(InboundFrame::Text {
                target_id: 42,
                message: "hello:world".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_file_command() {
        // テスト項目: /file コマンドで宛先とパスが取り出される
        // given (前提条件):
        let line = "/file 7 ./pictures/cat photo.png";

        // when (操作):
        let result = parse_command(line).unwrap();

        // then (期待する結果):
        assert_eq!(
            result,
            Command::SendFile {
                target_id: 7,
                path: PathBuf::from("./pictures/cat photo.png"),
            }
        );
    }

    #[test]
    fn test_parse_quit_and_help() {
        // テスト項目: /quit と /help が認識される
        // given (前提条件):

        // when (操作) / then (期待する結果):
        assert_eq!(parse_command("/quit").unwrap(), Command::Quit);
        assert_eq!(parse_command("  /help  ").unwrap(), Command::Help);
    }

    #[test]
    fn test_parse_invalid_lines() {
        // テスト項目: 文法に合わない入力はエラーになる
        // given (前提条件):
        let lines = ["hello", "bob:hi", "/file 7", "/file x a.png", "/unknown"];

        for line in lines {
            // when (操作):
            let result = parse_command(line);

            // then (期待する結果):
            assert!(
                matches!(result, Err(ClientError::InvalidCommand(_))),
                "{} should be rejected",
                line
            );
        }
    }
}
