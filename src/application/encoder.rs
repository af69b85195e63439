use std::collections::BTreeMap;
use std::io::Write;
use thiserror::Error;

use crate::domain::entities::Resources;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serializes the outcome of a sync.
pub trait ResourceEncoder {
    fn encode(&mut self, resources: &Resources) -> Result<(), EncodeError>;
}

/// Writes `{"<local path>": "<url>", ...}` with sorted keys, then a newline.
pub struct JsonEncoder<W: Write> {
    writer: W,
}

impl<W: Write> JsonEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResourceEncoder for JsonEncoder<W> {
    fn encode(&mut self, resources: &Resources) -> Result<(), EncodeError> {
        let mapping: BTreeMap<String, &str> = resources
            .iter()
            .map(|r| (r.path().display().to_string(), r.url().unwrap_or_default()))
            .collect();

        serde_json::to_writer(&mut self.writer, &mapping)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Resource;
    use crate::domain::value_objects::ContentDigest;
    use std::path::PathBuf;

    #[test]
    fn test_encode_sorted_mapping() {
        let mut b = Resource::new(PathBuf::from("/data/b.txt"), ContentDigest::of_bytes(b"b")).unwrap();
        b.mark_uploaded("http://cdn/blob-001/b.txt".to_string());
        let mut a = Resource::new(PathBuf::from("/data/a.txt"), ContentDigest::of_bytes(b"a")).unwrap();
        a.mark_unchanged("http://cdn/blob-000/a.txt".to_string());
        let resources = Resources::new(vec![b, a]).unwrap();

        let mut encoder = JsonEncoder::new(Vec::new());
        encoder.encode(&resources).unwrap();

        assert_eq!(
            String::from_utf8(encoder.into_inner()).unwrap(),
            "{\"/data/a.txt\":\"http://cdn/blob-000/a.txt\",\"/data/b.txt\":\"http://cdn/blob-001/b.txt\"}\n"
        );
    }

    #[test]
    fn test_encode_missing_url_as_empty_string() {
        let pending = Resource::new(PathBuf::from("c.txt"), ContentDigest::of_bytes(b"c")).unwrap();
        let resources = Resources::new(vec![pending]).unwrap();

        let mut encoder = JsonEncoder::new(Vec::new());
        encoder.encode(&resources).unwrap();
        assert_eq!(encoder.into_inner(), b"{\"c.txt\":\"\"}\n");
    }

    #[test]
    fn test_encode_empty_batch() {
        let mut encoder = JsonEncoder::new(Vec::new());
        encoder.encode(&Resources::default()).unwrap();
        assert_eq!(encoder.into_inner(), b"{}\n");
    }
}
