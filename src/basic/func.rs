//! Small helpers shared by the command line tools.

use log::LevelFilter;

/// Map the receiver-tool log level names onto the `log` facade. The seven
/// original levels collapse onto the five the facade offers.
pub fn log_level_filter(name: &str) -> Option<LevelFilter> {
    match name.to_ascii_uppercase().as_str() {
        "SEVERE" => Some(LevelFilter::Error),
        "WARNING" => Some(LevelFilter::Warn),
        "INFO" => Some(LevelFilter::Info),
        "CONFIG" | "FINE" => Some(LevelFilter::Debug),
        "FINER" | "FINEST" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// Split a comma separated observable list into its tokens.
pub fn get_tokens(source: &str, separator: char) -> Vec<String> {
    source
        .split(separator)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names() {
        assert_eq!(log_level_filter("SEVERE"), Some(LevelFilter::Error));
        assert_eq!(log_level_filter("fine"), Some(LevelFilter::Debug));
        assert_eq!(log_level_filter("FINEST"), Some(LevelFilter::Trace));
        assert_eq!(log_level_filter("VERBOSE"), None);
    }

    #[test]
    fn token_split() {
        assert_eq!(
            get_tokens("C1C,L1C,D1C,S1C", ','),
            vec!["C1C", "L1C", "D1C", "S1C"]
        );
        assert_eq!(get_tokens("", ','), Vec::<String>::new());
    }
}
