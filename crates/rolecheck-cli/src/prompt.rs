//! Interactive prompts for ids not given any other way.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};

/// Ask for a value on `output` and read one line from `input`.
///
/// # Errors
/// Returns an error on I/O failure, end of input, or a blank answer.
pub fn ask(input: &mut impl BufRead, output: &mut impl Write, label: &str) -> Result<String> {
    write!(output, "Enter {label}: ")?;
    output.flush()?;

    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .with_context(|| format!("Failed to read {label}"))?;
    if read == 0 {
        bail!("No {label} given (end of input)");
    }

    let answer = line.trim();
    if answer.is_empty() {
        bail!("No {label} given");
    }
    Ok(answer.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_trimmed_line() {
        let mut input = Cursor::new("  mg-prod \r\nleftover\n");
        let mut output = Vec::new();
        let value = ask(&mut input, &mut output, "Current Management Group ID").unwrap();
        assert_eq!(value, "mg-prod");
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Enter Current Management Group ID: "
        );
    }

    #[test]
    fn end_of_input_is_an_error() {
        let err = ask(&mut Cursor::new(""), &mut Vec::new(), "Target Management Group ID")
            .unwrap_err();
        assert!(err.to_string().contains("end of input"));
    }

    #[test]
    fn blank_answer_is_an_error() {
        assert!(ask(&mut Cursor::new("\n"), &mut Vec::new(), "x").is_err());
    }
}
