//! Value rendering configuration
//!
//! Lazy sets are printed either fully enumerated or in their abbreviated
//! form (`[D -> R]`). The choice is governed by an enumeration bound, the
//! same knob TLC exposes as its enum bound:
//!
//! ```text
//! \* render sets of fewer than 500 elements in full
//! ENUM_BOUND 500
//! EXPAND TRUE
//! ```
//!
//! A configuration can be parsed from that directive format, read from the
//! environment (`TLA2_ENUM_BOUND`, `TLA2_EXPAND`), or installed once as the
//! process-wide default used by `Display`.

use std::fmt;
use std::sync::OnceLock;

/// Default element-count bound below which lazy sets render in full.
pub const DEFAULT_ENUM_BOUND: i64 = 2000;

/// Bound used when rendering a value into an error message.
pub const ERROR_RENDER_BOUND: i64 = 100;

const ENV_ENUM_BOUND: &str = "TLA2_ENUM_BOUND";
const ENV_EXPAND: &str = "TLA2_EXPAND";

static GLOBAL: OnceLock<ValueConfig> = OnceLock::new();

/// Rendering configuration for values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueConfig {
    /// Lazy sets with fewer elements than this render fully enumerated
    pub enum_bound: i64,
    /// Whether lazy sets may be enumerated for rendering at all
    pub expand: bool,
}

impl Default for ValueConfig {
    fn default() -> Self {
        ValueConfig {
            enum_bound: DEFAULT_ENUM_BOUND,
            expand: true,
        }
    }
}

/// Configuration parse error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ValueConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration used when rendering into error messages.
    pub fn for_errors() -> Self {
        ValueConfig {
            enum_bound: ERROR_RENDER_BOUND,
            expand: true,
        }
    }

    /// Parse `ENUM_BOUND` / `EXPAND` directives, one per line.
    ///
    /// `\*` starts a comment. Unknown directives and malformed values are
    /// collected, with 1-indexed line numbers.
    pub fn parse(input: &str) -> Result<ValueConfig, Vec<ConfigError>> {
        let mut config = ValueConfig::new();
        let mut errors = Vec::new();

        for (line_num, raw_line) in input.lines().enumerate() {
            let line_num = line_num + 1;
            let line = match raw_line.find("\\*") {
                Some(pos) => &raw_line[..pos],
                None => raw_line,
            }
            .trim();
            if line.is_empty() {
                continue;
            }

            let mut parts = line.split_whitespace();
            let directive = parts.next().unwrap_or_default();
            let arg = parts.next();
            if parts.next().is_some() {
                errors.push(ConfigError {
                    line: line_num,
                    message: format!("{} takes a single argument", directive),
                });
                continue;
            }

            match (directive, arg) {
                ("ENUM_BOUND", Some(arg)) => match parse_bound(arg) {
                    Some(bound) => config.enum_bound = bound,
                    None => errors.push(ConfigError {
                        line: line_num,
                        message: format!("ENUM_BOUND requires a non-negative integer, got {arg}"),
                    }),
                },
                ("EXPAND", Some(arg)) => match parse_flag(arg) {
                    Some(flag) => config.expand = flag,
                    None => errors.push(ConfigError {
                        line: line_num,
                        message: format!("EXPAND requires TRUE or FALSE, got {arg}"),
                    }),
                },
                ("ENUM_BOUND" | "EXPAND", None) => errors.push(ConfigError {
                    line: line_num,
                    message: format!("{} requires a value", directive),
                }),
                (other, _) => errors.push(ConfigError {
                    line: line_num,
                    message: format!("unknown directive {}", other),
                }),
            }
        }

        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }

    /// Render back into directive form; `parse` of the result is `self`.
    pub fn to_cfg_string(&self) -> String {
        format!(
            "ENUM_BOUND {}\nEXPAND {}\n",
            self.enum_bound,
            if self.expand { "TRUE" } else { "FALSE" }
        )
    }

    /// Defaults overridden by `TLA2_ENUM_BOUND` and `TLA2_EXPAND`.
    pub fn from_env() -> Result<ValueConfig, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<ValueConfig, ConfigError> {
        let mut config = ValueConfig::new();
        if let Some(raw) = lookup(ENV_ENUM_BOUND) {
            config.enum_bound = parse_bound(raw.trim()).ok_or_else(|| ConfigError {
                line: 0,
                message: format!("{ENV_ENUM_BOUND} must be a non-negative integer, got {raw}"),
            })?;
        }
        if let Some(raw) = lookup(ENV_EXPAND) {
            config.expand = parse_flag(raw.trim()).ok_or_else(|| ConfigError {
                line: 0,
                message: format!("{ENV_EXPAND} must be TRUE or FALSE, got {raw}"),
            })?;
        }
        Ok(config)
    }

    /// The process-wide configuration.
    ///
    /// Falls back to the environment (or defaults, if the environment is
    /// malformed) when nothing was installed first.
    pub fn global() -> &'static ValueConfig {
        GLOBAL.get_or_init(|| {
            Self::from_env().unwrap_or_else(|err| {
                tracing::warn!(%err, "ignoring malformed value configuration");
                ValueConfig::default()
            })
        })
    }

    /// Install `self` as the process-wide configuration.
    ///
    /// Only the first installation takes effect; later ones get their
    /// configuration handed back.
    pub fn install_global(self) -> Result<(), ValueConfig> {
        GLOBAL.set(self)
    }
}

fn parse_bound(s: &str) -> Option<i64> {
    s.parse::<i64>().ok().filter(|n| *n >= 0)
}

fn parse_flag(s: &str) -> Option<bool> {
    match s {
        "TRUE" | "true" | "1" => Some(true),
        "FALSE" | "false" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directives() {
        let config = ValueConfig::parse(
            r#"
\* small bound for tests
ENUM_BOUND 50
EXPAND FALSE   \* never enumerate
"#,
        )
        .unwrap();
        assert_eq!(config.enum_bound, 50);
        assert!(!config.expand);
    }

    #[test]
    fn test_parse_defaults_when_empty() {
        assert_eq!(ValueConfig::parse("").unwrap(), ValueConfig::default());
    }

    #[test]
    fn test_parse_errors_carry_lines() {
        let errors = ValueConfig::parse("ENUM_BOUND -3\nEXPAND maybe\nBOGUS 1\nEXPAND").unwrap_err();
        let lines: Vec<usize> = errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 4]);
        assert!(errors[2].message.contains("BOGUS"));
    }

    #[test]
    fn test_roundtrip() {
        let config = ValueConfig {
            enum_bound: 17,
            expand: false,
        };
        assert_eq!(ValueConfig::parse(&config.to_cfg_string()).unwrap(), config);
    }

    #[test]
    fn test_from_lookup() {
        let config = ValueConfig::from_lookup(|key| match key {
            ENV_ENUM_BOUND => Some("12".to_string()),
            ENV_EXPAND => Some("false".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.enum_bound, 12);
        assert!(!config.expand);

        let err = ValueConfig::from_lookup(|key| {
            (key == ENV_ENUM_BOUND).then(|| "lots".to_string())
        })
        .unwrap_err();
        assert!(err.message.contains(ENV_ENUM_BOUND));
    }
}
