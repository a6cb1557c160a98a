use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write as _},
    path::Path,
};

use anyhow::Context as _;

/// Reads a JSON file; `kind` names the file in error messages.
pub fn read_json_file<T, P>(kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let reader = File::open(path)
        .map(BufReader::new)
        .with_context(|| format!("Cannot open {kind} file {}", path.display()))?;
    serde_json::from_reader(reader)
        .with_context(|| format!("Cannot parse {kind} file {}", path.display()))
}

/// Writes `value` as pretty JSON to `path`, or to stdout if no path is given.
pub fn save_json<T>(value: &T, path: Option<&Path>) -> anyhow::Result<()>
where
    T: serde::Serialize,
{
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Cannot create output file {}", path.display()))?;
            write_json(BufWriter::new(file), value)
                .with_context(|| format!("Cannot write JSON to {}", path.display()))
        }
        None => write_json(io::stdout().lock(), value).context("Cannot write JSON to stdout"),
    }
}

fn write_json<W, T>(mut writer: W, value: &T) -> io::Result<()>
where
    W: io::Write,
    T: serde::Serialize,
{
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()
}
