use std::path::Path;

use tokio::{
    fs::File,
    io::{self, AsyncBufReadExt, Lines},
};

/// Read a file from the given path into a list of strings
pub async fn read_file(path: impl AsRef<Path>) -> io::Result<Vec<String>> {
    let mut r = file_reader(path).await?;
    let mut lines = Vec::new();

    while let Some(line) = r.next_line().await? {
        lines.push(line);
    }

    Ok(lines)
}

/// Open a buffered line reader for the given path
pub async fn file_reader(path: impl AsRef<Path>) -> io::Result<Lines<io::BufReader<File>>> {
    let f = File::open(path).await?;

    Ok(io::BufReader::new(f).lines())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn test_read_file() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "first line")?;
        writeln!(file, "second line")?;

        let lines = read_file(file.path()).await?;

        assert_eq!(lines, vec!["first line", "second line"]);

        Ok(())
    }
}
