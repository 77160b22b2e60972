//! Path helpers for configuration values.

/// Expands a leading `~/` or `$HOME/` prefix to the user's home directory.
///
/// If the `HOME` environment variable is not set, the input is returned
/// unchanged. Only local paths go through this expansion; remote repository
/// paths keep their `$HOME` literal so the remote shell expands them.
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    for prefix in ["~/", "$HOME/"] {
        if let Some(rest) = path.strip_prefix(prefix)
            && let Some(home) = std::env::var_os("HOME")
        {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_owned()
}
