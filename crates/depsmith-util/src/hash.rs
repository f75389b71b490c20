use sha2::{Digest, Sha256};

/// Hash a sequence of lines, each terminated by `\n`, returning lowercase hex.
///
/// Equivalent to hashing the joined text, without building it first.
pub fn sha256_lines<I, S>(lines: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    for line in lines {
        hasher.update(line.as_ref().as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}
