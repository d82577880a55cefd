pub mod commands;
pub mod handlers;
pub mod select;

pub use commands::Cli;
pub use handlers::handle_command;

/// Log filter used when RUST_LOG is unset
pub fn log_level(verbose: u8, configured: Option<&str>) -> String {
    match verbose {
        0 => configured.unwrap_or("info").to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(0, None), "info");
        assert_eq!(log_level(0, Some("warn")), "warn");
        assert_eq!(log_level(1, Some("warn")), "debug");
        assert_eq!(log_level(3, None), "trace");
    }
}
