use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use super::Corpus;

impl Corpus {
    /// Saves the corpus to a JSON file.
    pub fn save(&self, file: impl AsRef<Path>) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(file)?);
        self.save_to_writer(&mut writer)?;
        writer.flush()
    }

    /// Writes the corpus into the given writer as a pretty-printed JSON array.
    pub fn save_to_writer<W: Write>(&self, writer: W) -> io::Result<()> {
        serde_json::to_writer_pretty(writer, self.records())?;
        Ok(())
    }
}
