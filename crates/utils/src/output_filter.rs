use seedvault_core::SecretValue;
use std::io::{self, Write};

/// Replacement written in place of a secret; fixed width so it leaks no length
pub const MASK: &str = "********";

/// Values shorter than this are left alone; replacing them everywhere would
/// mangle names and keys that merely contain the same characters
pub const MIN_FILTERED_LEN: usize = 6;

/// Writer adapter that masks every occurrence of known secret values
pub struct OutputFilter<W: Write> {
    writer: W,
    secrets: Vec<SecretValue>,
}

impl<W: Write> OutputFilter<W> {
    pub fn new(writer: W, secrets: impl IntoIterator<Item = SecretValue>) -> Self {
        let mut secrets: Vec<SecretValue> = secrets
            .into_iter()
            .filter(|s| s.char_count() >= MIN_FILTERED_LEN)
            .collect();
        // Longest first so a secret containing another is masked whole
        secrets.sort_by_key(|s| std::cmp::Reverse(s.expose().len()));
        Self { writer, secrets }
    }

    fn filter_line(&self, line: &str) -> String {
        let mut filtered = line.to_string();
        for secret in &self.secrets {
            if filtered.contains(secret.expose()) {
                filtered = filtered.replace(secret.expose(), MASK);
            }
        }
        filtered
    }
}

impl<W: Write> Write for OutputFilter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let input = String::from_utf8_lossy(buf);
        let filtered = self.filter_line(&input);
        self.writer.write_all(filtered.as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
