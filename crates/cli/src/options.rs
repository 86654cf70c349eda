//! Command options and shell quoting

use std::fmt;

/// Ordered `--key value` options for a hammer subcommand
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pairs: Vec<(String, Option<String>)>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `--key value`, replacing an earlier value for the same key
    pub fn set(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// Add a bare `--key` switch
    pub fn flag(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.pairs.retain(|(k, _)| *k != key);
        self.pairs.push((key, None));
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = Some(value),
            None => self.pairs.push((key, Some(value))),
        }
    }

    /// Set `key` only if it has no value yet
    pub fn insert_default(&mut self, key: &str, value: impl FnOnce() -> String) {
        if !self.contains(key) {
            self.pairs.push((key.to_string(), Some(value())));
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.pairs.iter().position(|(k, _)| k == key)?;
        self.pairs.remove(index).1
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Parse `--key value` and `--key=value` arguments; other words are ignored
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        let mut options = Self::new();
        let mut iter = args.iter().map(AsRef::as_ref).peekable();
        while let Some(arg) = iter.next() {
            let Some(key) = arg.strip_prefix("--") else {
                continue;
            };
            if let Some((key, value)) = key.split_once('=') {
                options.insert(key, value);
                continue;
            }
            match iter.peek() {
                Some(next) if !next.starts_with("--") => {
                    let value = iter.next().unwrap_or_default();
                    options.insert(key, value);
                }
                _ => options = options.flag(key),
            }
        }
        options
    }
}

impl fmt::Display for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.pairs {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            write!(f, "--{}", key)?;
            if let Some(value) = value {
                write!(f, " {}", quote(value))?;
            }
        }
        Ok(())
    }
}

/// Quote `value` for a POSIX shell
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Split a shell command line into words, honouring single quotes, double
/// quotes and backslash escapes
pub fn split(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                for q in chars.by_ref() {
                    if q == '\'' {
                        break;
                    }
                    word.push(q);
                }
            }
            '"' => {
                in_word = true;
                while let Some(q) = chars.next() {
                    match q {
                        '"' => break,
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                word.push(escaped);
                            }
                        }
                        _ => word.push(q),
                    }
                }
            }
            '\\' => {
                in_word = true;
                if let Some(escaped) = chars.next() {
                    word.push(escaped);
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                word.push(c);
            }
        }
    }
    if in_word {
        words.push(word);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_render_in_order() {
        let options = Options::new()
            .set("name", "my template")
            .set("locked", 1)
            .flag("interactive");
        assert_eq!(options.to_string(), "--name 'my template' --locked '1' --interactive");
    }

    #[test]
    fn test_set_replaces() {
        let options = Options::new().set("name", "a").set("id", 3).set("name", "b");
        assert_eq!(options.get("name"), Some("b"));
        assert_eq!(options.iter().count(), 2);
    }

    #[test_case("plain" ; "plain")]
    #[test_case("it's" ; "single quote")]
    #[test_case("a \"b\" c" ; "double quotes")]
    #[test_case("$HOME `id` \\n" ; "shell metacharacters")]
    #[test_case("" ; "empty")]
    fn test_quote_then_split(value: &str) {
        let line = format!("hammer --name {}", quote(value));
        assert_eq!(split(&line), ["hammer", "--name", value]);
    }

    #[test]
    fn test_from_args() {
        let args = split("report-template update --name 'a b' --locked=1 --interactive --id 4");
        let options = Options::from_args(&args);
        assert_eq!(options.get("name"), Some("a b"));
        assert_eq!(options.get("locked"), Some("1"));
        assert!(options.contains("interactive"));
        assert_eq!(options.get("interactive"), None);
        assert_eq!(options.get("id"), Some("4"));
    }
}
