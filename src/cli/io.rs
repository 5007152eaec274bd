//! JSON I/O handling for CLI
//!
//! - Input: JSON requests on stdin, one object per line
//! - Output: one JSON response per line on stdout
//! - Log lines go to stderr and never mix with responses

use std::io::{self, BufRead, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read one non-empty line from `reader`
pub fn read_request<R: BufRead>(reader: &mut R) -> CliResult<String> {
    let mut line = String::new();
    reader.read_line(&mut line)?;

    if line.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }

    Ok(line)
}

/// Non-empty lines of `reader`; blank lines are skipped
pub fn read_requests<R: BufRead>(reader: R) -> impl Iterator<Item = CliResult<String>> {
    reader.lines().filter_map(|line| match line {
        Ok(line) if line.trim().is_empty() => None,
        Ok(line) => Some(Ok(line)),
        Err(e) => Some(Err(CliError::from(e))),
    })
}

/// Write a success envelope
pub fn write_response<W: Write>(out: &mut W, data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });
    write_json(out, &response.to_string())
}

/// Write an error envelope
pub fn write_error<W: Write>(out: &mut W, code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });
    write_json(out, &response.to_string())
}

/// Write a raw JSON line and flush
pub fn write_json<W: Write>(out: &mut W, json_str: &str) -> CliResult<()> {
    writeln!(out, "{}", json_str)?;
    out.flush()?;
    Ok(())
}

/// Locked stdin, for the commands
pub fn stdin() -> io::StdinLock<'static> {
    io::stdin().lock()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_blank_lines_are_skipped() {
        let input = Cursor::new("{\"op\":\"findAllUsers\"}\n\n   \n{\"op\":\"findAllCohorts\"}\n");
        let lines: Vec<String> = read_requests(input).map(|l| l.unwrap()).collect();
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_empty_single_request() {
        let mut input = Cursor::new("\n");
        let err = read_request(&mut input).unwrap_err();
        assert_eq!(err.code_str(), "BUIDL_CLI_IO_ERROR");
    }

    #[test]
    fn test_error_envelope() {
        let mut out = Vec::new();
        write_error(&mut out, "BUIDL_X", "boom").unwrap();
        let line = String::from_utf8(out).unwrap();
        let value: Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["code"], "BUIDL_X");
    }
}
