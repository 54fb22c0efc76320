//! Shell Tests
//!
//! Command grammar and batch splitting. Executing commands against a live node is
//! covered by the cluster integration tests.

#[cfg(test)]
mod tests {
    use crate::shell::{Command, UsageError, absolute, parse, split_batch};

    // ============================================================
    // PARSING
    // ============================================================

    #[test]
    fn test_parse_put_with_and_without_dfs_name() {
        assert_eq!(
            parse("put notes.txt").unwrap(),
            Command::Put {
                local: "notes.txt".to_string(),
                dfs_path: None,
            }
        );
        assert_eq!(
            parse("  put notes.txt  docs/notes  ").unwrap(),
            Command::Put {
                local: "notes.txt".to_string(),
                dfs_path: Some("docs/notes".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_get_and_app() {
        assert_eq!(
            parse("get docs/notes").unwrap(),
            Command::Get {
                dfs_path: "docs/notes".to_string(),
                local: None,
            }
        );
        assert_eq!(
            parse("get docs/notes copy.txt").unwrap(),
            Command::Get {
                dfs_path: "docs/notes".to_string(),
                local: Some("copy.txt".to_string()),
            }
        );
        assert_eq!(
            parse("app docs/notes all.txt").unwrap(),
            Command::App {
                dfs_path: "docs/notes".to_string(),
                local: "all.txt".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_metadata_switching() {
        assert_eq!(
            parse("rmdm meta-host").unwrap(),
            Command::Rmdm {
                host: "meta-host".to_string(),
                port: None,
            }
        );
        assert_eq!(
            parse("rmdm meta-host 7000").unwrap(),
            Command::Rmdm {
                host: "meta-host".to_string(),
                port: Some(7000),
            }
        );
        assert_eq!(parse("lmdm").unwrap(), Command::Lmdm);
    }

    #[test]
    fn test_parse_listings_and_aliases() {
        assert_eq!(parse("ls").unwrap(), Command::Ls);
        assert_eq!(parse("lsac").unwrap(), Command::Lsac);
        assert_eq!(parse("lslc").unwrap(), Command::Lslc);
        assert_eq!(parse("lsn").unwrap(), Command::Lsn);
        assert_eq!(parse("cat f").unwrap(), Command::Cat { dfs_path: "f".to_string() });

        for alias in ["kill", "k"] {
            assert_eq!(parse(alias).unwrap(), Command::Kill);
        }
        for alias in ["quit", "q", "exit", "e"] {
            assert_eq!(parse(alias).unwrap(), Command::Quit);
        }
        for alias in ["help", "h"] {
            assert_eq!(parse(alias).unwrap(), Command::Help);
        }
    }

    // ============================================================
    // USAGE ERRORS
    // ============================================================

    #[test]
    fn test_wrong_argument_counts_are_usage_errors() {
        for line in [
            "put",
            "put a b c",
            "get",
            "get a b c",
            "app a",
            "cat",
            "cat a b",
            "ls extra",
            "rmdm",
            "rmdm a 1 2",
            "q now",
        ] {
            assert!(
                matches!(parse(line), Err(UsageError::Arguments(_))),
                "{:?} should be a usage error",
                line
            );
        }
    }

    #[test]
    fn test_unknown_and_empty_commands() {
        assert_eq!(
            parse("rm f"),
            Err(UsageError::Unknown("rm".to_string()))
        );
        assert_eq!(parse("   "), Err(UsageError::Empty));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert_eq!(
            parse("rmdm host seventy"),
            Err(UsageError::Port("seventy".to_string()))
        );
        assert!(matches!(parse("rmdm host 70000"), Err(UsageError::Port(_))));
    }

    // ============================================================
    // BATCHES & PATHS
    // ============================================================

    #[test]
    fn test_split_batch_trims_and_skips_empty_entries() {
        assert_eq!(
            split_batch("put a b, get b c,, ls ,"),
            vec!["put a b", "get b c", "ls"]
        );
        assert!(split_batch(" , ").is_empty());
    }

    #[test]
    fn test_absolute_resolves_against_working_directory() {
        let cwd = std::env::current_dir().unwrap();

        assert_eq!(
            absolute("out.txt").unwrap(),
            cwd.join("out.txt").to_string_lossy()
        );
        assert_eq!(absolute("/tmp/x").unwrap(), "/tmp/x");
    }
}
