//! URL helpers

/// Join a base URL and a path with exactly one slash between them,
/// whatever the inputs carry.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_handles_slash_combinations() {
        let expected = "https://api.example.com/v1/models";
        assert_eq!(join_url("https://api.example.com/v1", "models"), expected);
        assert_eq!(join_url("https://api.example.com/v1/", "models"), expected);
        assert_eq!(join_url("https://api.example.com/v1", "/models"), expected);
        assert_eq!(join_url("https://api.example.com/v1/", "/models"), expected);
    }

    #[test]
    fn join_keeps_nested_paths() {
        assert_eq!(
            join_url("http://localhost:8080/v1", "videos/job-1"),
            "http://localhost:8080/v1/videos/job-1"
        );
    }
}
