use crate::error::{BuildError, BuildResult};
use crate::index::codec::{
    DOCUMENT_MAGIC, KEYWORD_MAGIC, KEYWORD_VALUE_LEN, encode_keyword_key, encode_keyword_value, header,
};
use crate::index::fields::TypeMask;
use crate::index::types::{DOCUMENT_STORE, DocId, KEYWORD_STORE};
use crate::utils::encoding::write_u32_be;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writer producing a replacement pair of stores for one collection root.
///
/// Records go to temporary files beside the live stores. [`StoreWriter::install`]
/// renames them into place; dropping the writer without installing removes
/// them.
pub struct StoreWriter {
    root: PathBuf,
    keyword_tmp: PathBuf,
    document_tmp: PathBuf,
    keywords: BufWriter<File>,
    documents: BufWriter<File>,
    keyword_count: usize,
    document_count: usize,
    installed: bool,
}

impl StoreWriter {
    /// Create the temporary stores under `root`
    pub fn create(root: &Path) -> BuildResult<Self> {
        fs::create_dir_all(root).map_err(|source| BuildError::Write {
            path: root.to_path_buf(),
            source,
        })?;

        let keyword_tmp = root.join(format!("{}.tmp", KEYWORD_STORE));
        let document_tmp = root.join(format!("{}.tmp", DOCUMENT_STORE));

        let keywords = create_store(&keyword_tmp, KEYWORD_MAGIC)?;
        let documents = match create_store(&document_tmp, DOCUMENT_MAGIC) {
            Ok(file) => file,
            Err(e) => {
                let _ = fs::remove_file(&keyword_tmp);
                return Err(e);
            }
        };

        Ok(Self {
            root: root.to_path_buf(),
            keyword_tmp,
            document_tmp,
            keywords,
            documents,
            keyword_count: 0,
            document_count: 0,
            installed: false,
        })
    }

    /// Append one keyword record. Records must arrive in key order.
    pub fn write_keyword(&mut self, keyword: &[u8], mask: TypeMask, doc_id: DocId) -> BuildResult<()> {
        let key = encode_keyword_key(keyword);
        let value = encode_keyword_value(mask, doc_id);

        let result = (|| {
            write_u32_be(&mut self.keywords, key.len() as u32)?;
            self.keywords.write_all(&key)?;
            write_u32_be(&mut self.keywords, KEYWORD_VALUE_LEN as u32)?;
            self.keywords.write_all(&value)
        })();
        result.map_err(|source| BuildError::Write {
            path: self.keyword_tmp.clone(),
            source,
        })?;

        self.keyword_count += 1;
        Ok(())
    }

    /// Append the next document slot. An empty value is a tombstone.
    pub fn write_document(&mut self, value: &[u8]) -> BuildResult<()> {
        let result = write_u32_be(&mut self.documents, value.len() as u32)
            .and_then(|_| self.documents.write_all(value));
        result.map_err(|source| BuildError::Write {
            path: self.document_tmp.clone(),
            source,
        })?;

        self.document_count += 1;
        Ok(())
    }

    /// Flush both stores and rename them over the live ones.
    ///
    /// A failure between the two renames leaves the new keyword store next
    /// to the old document store.
    pub fn install(mut self) -> BuildResult<()> {
        finish(&mut self.keywords, &self.keyword_tmp)?;
        finish(&mut self.documents, &self.document_tmp)?;

        let keyword_path = self.root.join(KEYWORD_STORE);
        let document_path = self.root.join(DOCUMENT_STORE);

        fs::rename(&self.keyword_tmp, &keyword_path).map_err(|source| BuildError::Install {
            path: keyword_path.clone(),
            source,
        })?;
        // The keyword store is live from here on; only the document
        // temporary is left to clean up on failure.
        self.keyword_tmp = keyword_path;
        fs::rename(&self.document_tmp, &document_path).map_err(|source| BuildError::Install {
            path: document_path.clone(),
            source,
        })?;
        self.installed = true;

        debug!(
            root = %self.root.display(),
            keywords = self.keyword_count,
            documents = self.document_count,
            "installed stores"
        );
        Ok(())
    }
}

impl Drop for StoreWriter {
    fn drop(&mut self) {
        if self.installed {
            return;
        }
        if self.keyword_tmp.extension().is_some_and(|ext| ext == "tmp") {
            let _ = fs::remove_file(&self.keyword_tmp);
        }
        let _ = fs::remove_file(&self.document_tmp);
    }
}

fn create_store(path: &Path, magic: &[u8; 4]) -> BuildResult<BufWriter<File>> {
    let file = File::create(path).map_err(|source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&header(magic)).map_err(|source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(writer)
}

fn finish(writer: &mut BufWriter<File>, path: &Path) -> BuildResult<()> {
    writer
        .flush()
        .and_then(|_| writer.get_ref().sync_all())
        .map_err(|source| BuildError::Write {
            path: path.to_path_buf(),
            source,
        })
}
