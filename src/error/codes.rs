/// Error code registry for stepguard
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 7000-7999: Validation errors
/// - 9000-9999: Other errors
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_NOT_FOUND: u16 = 1001;
    pub const CONFIG_INVALID_YAML: u16 = 1002;
    pub const CONFIG_INVALID_TOML: u16 = 1003;
    pub const CONFIG_MISSING_REQUIRED: u16 = 1004;
    pub const CONFIG_INVALID_VALUE: u16 = 1005;
    pub const CONFIG_PATH_ERROR: u16 = 1006;
    pub const CONFIG_OUT_OF_RANGE: u16 = 1007;
    pub const CONFIG_UNSUPPORTED_SHELL: u16 = 1008;
    pub const CONFIG_INVALID_PATTERN: u16 = 1009;

    // Validation errors (7000-7999)
    pub const VALIDATION_REQUIRED: u16 = 7001;
    pub const VALIDATION_INJECTION: u16 = 7002;
    pub const VALIDATION_PATTERN_MISMATCH: u16 = 7003;
    pub const VALIDATION_NOT_ALLOWED: u16 = 7004;
    pub const VALIDATION_OUT_OF_RANGE: u16 = 7005;
    pub const VALIDATION_INVALID_PATH: u16 = 7006;

    // Other errors (9000-9999)
    pub const OTHER_GENERIC: u16 = 9000;
    pub const OTHER_OUTPUT: u16 = 9001;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        ErrorCode::CONFIG_NOT_FOUND => "Configuration file not found",
        ErrorCode::CONFIG_INVALID_YAML => "Invalid YAML syntax in rule or schema file",
        ErrorCode::CONFIG_INVALID_TOML => "Invalid TOML syntax in configuration file",
        ErrorCode::CONFIG_MISSING_REQUIRED => "Required configuration value is missing",
        ErrorCode::CONFIG_INVALID_VALUE => "Configuration value is invalid",
        ErrorCode::CONFIG_PATH_ERROR => {
            "Working directory is missing or outside the permitted root"
        }
        ErrorCode::CONFIG_OUT_OF_RANGE => "Policy value is outside its documented bounds",
        ErrorCode::CONFIG_UNSUPPORTED_SHELL => "Shell is not in the allow-list",
        ErrorCode::CONFIG_INVALID_PATTERN => "Rule pattern is not a valid regular expression",

        ErrorCode::VALIDATION_REQUIRED => "Required input is empty",
        ErrorCode::VALIDATION_INJECTION => "Input contains disallowed characters",
        ErrorCode::VALIDATION_PATTERN_MISMATCH => "Input does not match the expected format",
        ErrorCode::VALIDATION_NOT_ALLOWED => "Input is not one of the allowed values",
        ErrorCode::VALIDATION_OUT_OF_RANGE => "Input is outside the allowed range",
        ErrorCode::VALIDATION_INVALID_PATH => "Input is not a safe relative path",

        ErrorCode::OTHER_GENERIC => "General error",
        ErrorCode::OTHER_OUTPUT => "Failed to write step outputs",

        _ => "Unknown error code",
    }
}
