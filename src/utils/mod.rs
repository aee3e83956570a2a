//! Utilities: logging (verbosity -> tracing filter, stderr only) and the JSON
//! output contract (stdout result, stderr fatal).
//!
//! Key items:
//!   init_logging / derive_level
//!   output::print_json / output::fatal

/// Logging helpers.
pub mod logging {
    use tracing::level_filters::LevelFilter;
    use tracing_subscriber::EnvFilter;

    /// Overrides the verbosity flags, `EnvFilter` syntax (e.g. `martech=debug`).
    pub const LOG_ENV: &str = "MARTECH_LOG";

    /// Silent unless asked: stderr is reserved for the fatal JSON line.
    pub fn derive_level(verbose: u8, quiet: bool) -> LevelFilter {
        if quiet {
            return LevelFilter::OFF;
        }
        match verbose {
            0 => LevelFilter::OFF,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    pub fn init_logging(level: LevelFilter) {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

        // Ignore double init (tests).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

pub use logging::{derive_level, init_logging};

/// Output helpers.
pub mod output {
    use std::io::{self, Write};

    use serde_json::{Value, json};

    /// Pretty (2-space) JSON, one value per invocation.
    pub fn render(value: &Value) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    }

    /// Single-line `{"error": ...}`.
    pub fn error_line(message: &str) -> String {
        json!({ "error": message }).to_string()
    }

    /// Write one rendered value. A reader that went away (`| head`) is not
    /// an error.
    pub fn write_json<W: Write>(out: &mut W, value: &Value) -> io::Result<()> {
        match writeln!(out, "{}", render(value)).and_then(|_| out.flush()) {
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            other => other,
        }
    }

    pub fn print_json(value: &Value) {
        if let Err(e) = write_json(&mut io::stdout().lock(), value) {
            fatal(format!("Failed to write output: {e}"));
        }
    }

    /// Print `{"error": message}` on stderr and exit 1.
    pub fn fatal(message: impl std::fmt::Display) -> ! {
        eprintln!("{}", error_line(&message.to_string()));
        std::process::exit(1)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn render_is_two_space_indented() {
            let out = render(&json!({"a": {"b": 1}}));
            assert_eq!(out, "{\n  \"a\": {\n    \"b\": 1\n  }\n}");
        }

        struct ClosedPipe;

        impl Write for ClosedPipe {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        struct Full;

        impl Write for Full {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::other("disk full"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        #[test]
        fn write_json_ends_with_newline() {
            let mut buf = Vec::new();
            write_json(&mut buf, &json!({"ok": true})).unwrap();
            assert_eq!(String::from_utf8(buf).unwrap(), "{\n  \"ok\": true\n}\n");
        }

        #[test]
        fn closed_pipe_is_quiet() {
            assert!(write_json(&mut ClosedPipe, &json!({"a": 1})).is_ok());
            assert!(write_json(&mut Full, &json!({"a": 1})).is_err());
        }

        #[test]
        fn error_line_is_single_line() {
            let line = error_line("bad\nthing");
            assert!(!line.contains('\n'));
            assert_eq!(
                serde_json::from_str::<Value>(&line).unwrap(),
                json!({"error": "bad\nthing"})
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::logging::derive_level;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn verbosity_mapping() {
        assert_eq!(derive_level(0, false), LevelFilter::OFF);
        assert_eq!(derive_level(1, false), LevelFilter::INFO);
        assert_eq!(derive_level(2, false), LevelFilter::DEBUG);
        assert_eq!(derive_level(5, false), LevelFilter::TRACE);
        assert_eq!(derive_level(3, true), LevelFilter::OFF);
    }
}
