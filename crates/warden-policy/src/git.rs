// git.rs — Parsing git command lines into subcommand, flags and positionals.
//
// Only what the git rules need: we do not try to be a full git option
// parser. Global options before the subcommand (`-C <path>`, `-c k=v`) are
// skipped so `git -C repo push --force` is still seen as a push.

/// A git invocation split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitInvocation {
    pub subcommand: String,
    /// Everything after the subcommand, in order.
    pub args: Vec<String>,
}

impl GitInvocation {
    /// Parse a command line such as `git push --force origin main`.
    /// The leading `git` token is optional. Returns None for an empty line.
    pub fn parse(command: &str) -> Option<Self> {
        let tokens = split_args(command);
        let mut iter = tokens.into_iter().peekable();

        if iter.peek().map(String::as_str) == Some("git") {
            iter.next();
        }

        // Skip global options (and the value of those that take one).
        loop {
            let skip = match iter.peek().map(String::as_str) {
                Some("-C") | Some("-c") | Some("--git-dir") | Some("--work-tree") => 2,
                Some(t) if t.starts_with('-') => 1,
                _ => 0,
            };
            if skip == 0 {
                break;
            }
            for _ in 0..skip {
                iter.next();
            }
        }

        let subcommand = iter.next()?;
        Some(Self {
            subcommand,
            args: iter.collect(),
        })
    }

    /// Arguments that are not options.
    pub fn positionals(&self) -> Vec<&str> {
        self.args
            .iter()
            .map(String::as_str)
            .filter(|a| !a.starts_with('-'))
            .collect()
    }

    /// True if any long flag equals `long` (or `long=...`), or any short
    /// flag cluster (e.g. `-fdx`) contains `short`.
    pub fn has_flag(&self, long: &str, short: Option<char>) -> bool {
        self.args.iter().any(|arg| {
            if let Some(rest) = arg.strip_prefix("--") {
                let name = rest.split('=').next().unwrap_or(rest);
                !long.is_empty() && name == long.trim_start_matches("--")
            } else if let Some(cluster) = arg.strip_prefix('-') {
                short.is_some_and(|c| cluster.chars().all(char::is_alphabetic) && cluster.contains(c))
            } else {
                false
            }
        })
    }

    /// Extract the commit message from `-m`, `-m<msg>`, `--message <msg>`,
    /// `--message=<msg>` or a short cluster ending in `m` (e.g. `-am`).
    /// Multiple messages are joined by a blank line, as git does.
    pub fn commit_message(&self) -> Option<String> {
        let mut parts = Vec::new();
        let mut iter = self.args.iter();

        while let Some(arg) = iter.next() {
            if arg == "--message" {
                if let Some(msg) = iter.next() {
                    parts.push(msg.clone());
                }
            } else if let Some(msg) = arg.strip_prefix("--message=") {
                parts.push(msg.to_string());
            } else if let Some(cluster) = arg.strip_prefix('-') {
                if cluster.starts_with('-') {
                    continue;
                }
                if let Some(pos) = cluster.find('m') {
                    let inline = &cluster[pos + 1..];
                    if inline.is_empty() {
                        if let Some(msg) = iter.next() {
                            parts.push(msg.clone());
                        }
                    } else {
                        parts.push(inline.to_string());
                    }
                }
            }
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }
}

/// Split a command line into arguments, honoring single and double quotes
/// and backslash escapes outside single quotes.
pub fn split_args(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('"'), '\\') | (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_token = true;
            }
            (Some(_), c) => current.push(c),
            (None, '"') | (None, '\'') => {
                quote = Some(c);
                in_token = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_token {
        args.push(current);
    }
    args
}
