//! Lightweight ssh flag scanning for display.
//!
//! This is not an ssh option parser. It only picks out the handful of flags
//! worth showing next to a history entry.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SshMeta {
    pub host: String,
    pub port: String,
    pub jump: String,
    pub identity: String,
}

impl SshMeta {
    /// Scan a space-separated ssh argument string.
    ///
    /// `-p`, `-J` and `-i` accept a separate or attached value; the identity
    /// is reduced to its file name. The last bare word is taken as the host.
    pub fn from_args(args: &str) -> Self {
        let mut meta = SshMeta::default();
        let mut tokens = args.split(' ').filter(|t| !t.is_empty());

        while let Some(token) = tokens.next() {
            let (flag, attached) = match token.get(..2) {
                Some(flag @ ("-p" | "-J" | "-i")) => (flag, &token[2..]),
                _ => {
                    if !token.starts_with('-') {
                        meta.host = token.to_string();
                    }
                    continue;
                }
            };
            let value = if attached.is_empty() {
                match tokens.next() {
                    Some(value) => value,
                    None => continue,
                }
            } else {
                attached
            };
            match flag {
                "-p" => meta.port = value.to_string(),
                "-J" => meta.jump = value.to_string(),
                _ => meta.identity = basename(value).to_string(),
            }
        }
        meta
    }

    pub fn is_empty(&self) -> bool {
        self.host.is_empty()
            && self.port.is_empty()
            && self.jump.is_empty()
            && self.identity.is_empty()
    }

    /// `host: h  p:22  J:bastion  i:id_ed25519`, omitting empty parts.
    pub fn summary(&self) -> String {
        let parts = [
            ("host: ", &self.host),
            ("p:", &self.port),
            ("J:", &self.jump),
            ("i:", &self.identity),
        ];
        parts
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(label, value)| format!("{label}{value}"))
            .collect::<Vec<_>>()
            .join("  ")
    }
}

fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return path;
    }
    match trimmed.rfind('/') {
        Some(slash) => &trimmed[slash + 1..],
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separate_flag_values() {
        let meta = SshMeta::from_args("-p 2222 -J bastion -i ~/.ssh/id_ed25519 deploy@web1");
        assert_eq!(
            meta,
            SshMeta {
                host: "deploy@web1".into(),
                port: "2222".into(),
                jump: "bastion".into(),
                identity: "id_ed25519".into(),
            }
        );
    }

    #[test]
    fn attached_flag_values() {
        let meta = SshMeta::from_args("web1 -p22 -Jjump -i/keys/prod/");
        assert_eq!(meta.host, "web1");
        assert_eq!(meta.port, "22");
        assert_eq!(meta.jump, "jump");
        assert_eq!(meta.identity, "prod");
    }

    #[test]
    fn other_flags_are_skipped() {
        let meta = SshMeta::from_args("-v -A host -o");
        assert_eq!(meta.host, "host");
        assert!(meta.port.is_empty());
    }

    #[test]
    fn dangling_flag_is_ignored() {
        let meta = SshMeta::from_args("host -p");
        assert_eq!(meta.host, "host");
        assert!(meta.port.is_empty());
    }

    #[test]
    fn summary_skips_empty_parts() {
        let meta = SshMeta::from_args("host -p 22");
        assert_eq!(meta.summary(), "host: host  p:22");
        assert!(SshMeta::from_args("").is_empty());
        assert_eq!(SshMeta::default().summary(), "");
    }

    #[test]
    fn basename_handles_edges() {
        assert_eq!(basename("/"), "/");
        assert_eq!(basename("key"), "key");
        assert_eq!(basename("a/b/c"), "c");
    }
}
