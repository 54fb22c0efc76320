use thiserror::Error;

pub const USAGE: &str = "\
Commands:
  put <local> [dfsName]   store a local file (dfsName defaults to <local>)
  get <dfsName> [local]   copy a file out of the DFS (local defaults to dfsName)
  app <dfsName> <local>   append a DFS file to a local file
  cat <dfsName>           print a DFS file
  ls                      list files
  lsac                    list all chunks and their holders
  lslc                    list chunks stored on this node
  lsn                     list nodes
  rmdm <host> [port]      use the metadata service at host:port
  lmdm                    go back to the local metadata service
  kill, k                 stop the node
  quit, q, exit, e        leave the shell
  help, h                 this text";

/// One parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Put {
        local: String,
        dfs_path: Option<String>,
    },
    Get {
        dfs_path: String,
        local: Option<String>,
    },
    App {
        dfs_path: String,
        local: String,
    },
    Cat {
        dfs_path: String,
    },
    Ls,
    Lsac,
    Lslc,
    Lsn,
    Rmdm {
        host: String,
        port: Option<u16>,
    },
    Lmdm,
    Kill,
    Quit,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0} (try help)")]
    Unknown(String),

    #[error("usage: {0}")]
    Arguments(&'static str),

    #[error("invalid port: {0}")]
    Port(String),
}

/// Parses one whitespace-separated command line.
pub fn parse(line: &str) -> Result<Command, UsageError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&name, args)) = words.split_first() else {
        return Err(UsageError::Empty);
    };

    let command = match (name, args) {
        ("put", [local]) => Command::Put {
            local: local.to_string(),
            dfs_path: None,
        },
        ("put", [local, dfs_path]) => Command::Put {
            local: local.to_string(),
            dfs_path: Some(dfs_path.to_string()),
        },
        ("put", _) => return Err(UsageError::Arguments("put <local> [dfsName]")),

        ("get", [dfs_path]) => Command::Get {
            dfs_path: dfs_path.to_string(),
            local: None,
        },
        ("get", [dfs_path, local]) => Command::Get {
            dfs_path: dfs_path.to_string(),
            local: Some(local.to_string()),
        },
        ("get", _) => return Err(UsageError::Arguments("get <dfsName> [local]")),

        ("app", [dfs_path, local]) => Command::App {
            dfs_path: dfs_path.to_string(),
            local: local.to_string(),
        },
        ("app", _) => return Err(UsageError::Arguments("app <dfsName> <local>")),

        ("cat", [dfs_path]) => Command::Cat {
            dfs_path: dfs_path.to_string(),
        },
        ("cat", _) => return Err(UsageError::Arguments("cat <dfsName>")),

        ("rmdm", [host]) => Command::Rmdm {
            host: host.to_string(),
            port: None,
        },
        ("rmdm", [host, port]) => Command::Rmdm {
            host: host.to_string(),
            port: Some(
                port.parse()
                    .map_err(|_| UsageError::Port(port.to_string()))?,
            ),
        },
        ("rmdm", _) => return Err(UsageError::Arguments("rmdm <host> [port]")),

        ("ls", []) => Command::Ls,
        ("lsac", []) => Command::Lsac,
        ("lslc", []) => Command::Lslc,
        ("lsn", []) => Command::Lsn,
        ("lmdm", []) => Command::Lmdm,
        ("kill" | "k", []) => Command::Kill,
        ("quit" | "q" | "exit" | "e", []) => Command::Quit,
        ("help" | "h", []) => Command::Help,

        ("ls", _) => return Err(UsageError::Arguments("ls")),
        ("lsac", _) => return Err(UsageError::Arguments("lsac")),
        ("lslc", _) => return Err(UsageError::Arguments("lslc")),
        ("lsn", _) => return Err(UsageError::Arguments("lsn")),
        ("lmdm", _) => return Err(UsageError::Arguments("lmdm")),
        ("kill" | "k", _) => return Err(UsageError::Arguments("kill")),
        ("quit" | "q" | "exit" | "e", _) => return Err(UsageError::Arguments("quit")),
        ("help" | "h", _) => return Err(UsageError::Arguments("help")),

        (other, _) => return Err(UsageError::Unknown(other.to_string())),
    };

    Ok(command)
}

/// Splits an `exec` argument (`"put a b, get b c"`) into its command lines,
/// dropping empty entries.
pub fn split_batch(batch: &str) -> Vec<&str> {
    batch
        .split(',')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}
