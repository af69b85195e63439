use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::domain::errors::DomainError;
use crate::domain::value_objects::ContentDigest;

/// A local file taking part in a sync batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    filename: String,
    #[serde(skip)]
    path: PathBuf,
    url: Option<String>,
    md5: ContentDigest,
    needs_upload: bool,
}

impl Resource {
    /// New resource for `path`; it needs an upload until the server says
    /// otherwise.
    pub fn new(path: PathBuf, md5: ContentDigest) -> Result<Self, DomainError> {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| DomainError::InvalidName(path.display().to_string()))?;

        Ok(Self {
            filename,
            path,
            url: None,
            md5,
            needs_upload: true,
        })
    }

    /// The server already holds identical content at `url`.
    pub fn mark_unchanged(&mut self, url: String) {
        self.needs_upload = false;
        self.url = Some(url);
    }

    /// The server accepted an upload of this file, now reachable at `url`.
    pub fn mark_uploaded(&mut self, url: String) {
        self.needs_upload = false;
        self.url = Some(url);
    }

    // Getters
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn md5(&self) -> &ContentDigest {
        &self.md5
    }

    pub fn needs_upload(&self) -> bool {
        self.needs_upload
    }
}

/// Filename a remote path refers to.
///
/// Remote paths look like `<container>/<filename>`. A path without a slash
/// is the filename itself; a path with more than one slash is ambiguous.
pub fn filename_from_remote_path(path: &str) -> Result<&str, DomainError> {
    match path.split_once('/') {
        None => Ok(path),
        Some((_, rest)) if !rest.contains('/') => Ok(rest),
        Some(_) => Err(DomainError::AmbiguousRemotePath(path.to_string())),
    }
}

/// Ordered batch of resources with unique filenames.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resources(Vec<Resource>);

impl Resources {
    pub fn new(resources: Vec<Resource>) -> Result<Self, DomainError> {
        let mut seen = HashSet::with_capacity(resources.len());
        for resource in &resources {
            if !seen.insert(resource.filename()) {
                return Err(DomainError::DuplicateFilename(resource.filename().to_string()));
            }
        }
        Ok(Self(resources))
    }

    /// Index of the resource a remote path (from a stat or upload response)
    /// refers to.
    pub fn position_for_remote_path(&self, remote_path: &str) -> Result<usize, DomainError> {
        let filename = filename_from_remote_path(remote_path)?;
        self.0
            .iter()
            .position(|r| r.filename == filename)
            .ok_or_else(|| DomainError::UnmatchedRemotePath(remote_path.to_string()))
    }

    /// Indices of resources still needing an upload.
    pub fn pending(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, r)| r.needs_upload)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn get(&self, index: usize) -> Option<&Resource> {
        self.0.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Resource> {
        self.0.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<Resource> {
        self.0
    }
}

impl<'a> IntoIterator for &'a Resources {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
