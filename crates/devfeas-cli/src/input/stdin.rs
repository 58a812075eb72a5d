use serde_json::Value;
use std::io::{self, Read};

/// Read a piped JSON or YAML document from stdin.
/// Returns None if stdin is a TTY (interactive) or empty.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_piped(&buffer)
}

fn parse_piped(buffer: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    // JSON documents start with a brace; anything else is tried as YAML
    let value: Value = if trimmed.starts_with('{') || trimmed.starts_with('[') {
        serde_json::from_str(trimmed)?
    } else {
        serde_yaml::from_str(trimmed)?
    };
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_none() {
        assert!(parse_piped("  \n").unwrap().is_none());
    }

    #[test]
    fn test_json_and_yaml() {
        let json = parse_piped(r#"{"num_lots": 3}"#).unwrap().unwrap();
        assert_eq!(json["num_lots"], 3);
        let yaml = parse_piped("num_lots: 3\nproject_name: Hilltop\n").unwrap().unwrap();
        assert_eq!(yaml["num_lots"], 3);
        assert_eq!(yaml["project_name"], "Hilltop");
    }
}
