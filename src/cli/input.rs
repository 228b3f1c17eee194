//! Reading and writing document files
//!
//! Accepts a single JSON document, a JSON array of documents, or JSON Lines
//! (`.jsonl` / `.ndjson`, or any input that is not one JSON value). `-`
//! means stdin for input and stdout for output.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::io::{self, Read, Write};

/// Layout of the input, reused for the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Single,
    Array,
    Lines,
}

/// Parsed input documents
#[derive(Debug)]
pub struct InputDocuments {
    pub documents: Vec<Value>,
    pub format: InputFormat,
}

/// Read documents from a path or stdin
pub fn read_documents(path: &str) -> Result<InputDocuments> {
    let contents = if path == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read documents from stdin")?;
        buffer
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read input file {path}"))?
    };

    let lines_hint = path.ends_with(".jsonl") || path.ends_with(".ndjson");
    parse_documents(&contents, lines_hint)
}

/// Parse document text
pub fn parse_documents(contents: &str, lines_hint: bool) -> Result<InputDocuments> {
    if !lines_hint {
        if let Ok(value) = serde_json::from_str::<Value>(contents) {
            return Ok(match value {
                Value::Array(documents) => InputDocuments {
                    documents,
                    format: InputFormat::Array,
                },
                document => InputDocuments {
                    documents: vec![document],
                    format: InputFormat::Single,
                },
            });
        }
    }

    let documents = contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Invalid JSON on line {}", index + 1))
        })
        .collect::<Result<Vec<Value>>>()?;

    Ok(InputDocuments {
        documents,
        format: InputFormat::Lines,
    })
}

/// Render documents in the given layout
pub fn render_documents(documents: &[Value], format: InputFormat, pretty: bool) -> Result<String> {
    let to_string = |value: &Value| {
        if pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    };

    let rendered = match (format, documents) {
        (InputFormat::Lines, _) => {
            let mut out = String::new();
            for document in documents {
                out.push_str(&serde_json::to_string(document)?);
                out.push('\n');
            }
            return Ok(out);
        }
        (InputFormat::Single, [document]) => to_string(document)?,
        _ => to_string(&Value::Array(documents.to_vec()))?,
    };

    Ok(format!("{rendered}\n"))
}

/// Write rendered output to a file or stdout
pub fn write_output(path: Option<&str>, contents: &str) -> Result<()> {
    match path {
        Some(path) if path != "-" => {
            fs::write(path, contents).with_context(|| format!("Failed to write {path}"))
        }
        _ => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(contents.as_bytes())
                .context("Failed to write to stdout")?;
            stdout.flush().context("Failed to flush stdout")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_single_document() {
        let input = parse_documents(r#"{"id": "a"}"#, false).unwrap();
        assert_eq!(input.format, InputFormat::Single);
        assert_eq!(input.documents, vec![json!({"id": "a"})]);
    }

    #[test]
    fn test_parse_array() {
        let input = parse_documents(r#"[{"id": "a"}, {"id": "b"}]"#, false).unwrap();
        assert_eq!(input.format, InputFormat::Array);
        assert_eq!(input.documents.len(), 2);
    }

    #[test]
    fn test_parse_lines_without_hint() {
        let input = parse_documents("{\"id\": \"a\"}\n\n{\"id\": \"b\"}\n", false).unwrap();
        assert_eq!(input.format, InputFormat::Lines);
        assert_eq!(input.documents.len(), 2);
    }

    #[test]
    fn test_invalid_line_is_reported() {
        let err = parse_documents("{\"id\": 1}\nnot json\n", true).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_render_keeps_layout() {
        let docs = vec![json!({"b": 1, "a": 2})];
        assert_eq!(
            render_documents(&docs, InputFormat::Single, false).unwrap(),
            "{\"b\":1,\"a\":2}\n"
        );
        assert_eq!(
            render_documents(&docs, InputFormat::Array, false).unwrap(),
            "[{\"b\":1,\"a\":2}]\n"
        );
        assert_eq!(
            render_documents(&docs, InputFormat::Lines, true).unwrap(),
            "{\"b\":1,\"a\":2}\n"
        );
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_output(Some(path.to_str().unwrap()), "[]\n").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "[]\n");
    }
}
