//! Append-only text output, one line per recorded message.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

/// Appends `lines` to `name`, adding a `.txt` suffix when missing. Earlier
/// runs' content is kept.
pub fn append_lines(name: &str, lines: &[String]) -> io::Result<()> {
    let mut path = PathBuf::from(name);
    if path.extension().map_or(true, |ext| ext != "txt") {
        path = PathBuf::from(format!("{name}.txt"));
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    for line in lines {
        writeln!(file, "{line}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn appends_and_adds_txt_suffix() {
        let dir = std::env::temp_dir().join("timelock-p2sh-outfile-test");
        fs::create_dir_all(&dir).unwrap();
        let base = dir.join("log");
        let base_str = base.to_str().unwrap();
        let txt = dir.join("log.txt");
        let _ = fs::remove_file(&txt);

        append_lines(base_str, &["first".to_string()]).unwrap();
        append_lines(&format!("{base_str}.txt"), &["second".to_string()]).unwrap();

        let content = fs::read_to_string(&txt).unwrap();
        assert_eq!(content, "first\nsecond\n");
        fs::remove_file(&txt).unwrap();
    }
}
