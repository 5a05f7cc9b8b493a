//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, bad payload)  |
//! | 10-19   | ai               | AI backend / keychain codes              |
//! | 20-29   | lint             | Lint batch codes                         |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use sheetlint_client::AiError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unreadable or invalid input.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// AI (10-19)
// =============================================================================

/// No AI endpoint configured.
pub const EXIT_AI_NOT_CONFIGURED: u8 = 10;

/// AI backend unreachable, returned an error status, or sent non-JSON.
pub const EXIT_AI_BACKEND: u8 = 11;

/// Keychain error (cannot read/write credentials).
pub const EXIT_AI_KEYCHAIN_ERR: u8 = 12;

// =============================================================================
// Lint (20-29)
// =============================================================================

/// At least one file in the batch produced a failure outcome.
/// Results for every file are still printed.
pub const EXIT_LINT_FAILED: u8 = 20;

/// Could not construct the HTTP client.
pub const EXIT_LINT_CLIENT: u8 = 21;

/// Map an AI dispatch error to its exit code.
pub fn ai_exit_code(err: &AiError) -> u8 {
    match err {
        AiError::NotConfigured(_) => EXIT_AI_NOT_CONFIGURED,
        AiError::Network(_) | AiError::Http { .. } | AiError::Parse(_) => EXIT_AI_BACKEND,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_exit_codes() {
        assert_eq!(ai_exit_code(&AiError::NotConfigured("x".into())), EXIT_AI_NOT_CONFIGURED);
        assert_eq!(ai_exit_code(&AiError::Network("x".into())), EXIT_AI_BACKEND);
        assert_eq!(
            ai_exit_code(&AiError::Http { status: 500, body: String::new() }),
            EXIT_AI_BACKEND
        );
    }

    #[test]
    fn test_ranges_do_not_collide() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_AI_NOT_CONFIGURED,
            EXIT_AI_BACKEND,
            EXIT_AI_KEYCHAIN_ERR,
            EXIT_LINT_FAILED,
            EXIT_LINT_CLIENT,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }
}
