//! Per-item analysis: locate the parallel texts, count, and title them.

use crate::catalog::model::CatalogEntry;
use crate::error::{CatalogError, CatalogResult};
use crate::remote::{FetchError, FileKind, RemoteFile, RemoteItem, RepositoryHost};
use crate::text::{LineCountMode, TextEncoding, decode_bytes};
use crate::titles::{Language, TitlePipeline, single_text_title};

/// The shortest root-level `.txt` file whose name contains `tag`
/// (case-insensitive). Ties keep listing order.
pub fn select_text_file<'f>(files: &'f [RemoteFile], tag: &str) -> Option<&'f RemoteFile> {
    files
        .iter()
        .filter(|f| f.kind == FileKind::File && f.name.ends_with(".txt"))
        .filter(|f| f.name.to_lowercase().contains(tag))
        .min_by_key(|f| f.name.chars().count())
}

/// What became of one side of the pair.
enum Side {
    Missing,
    Failed(String),
    Loaded(String),
}

/// Analyzes items against a repository host.
pub struct ItemAnalyzer<'a> {
    host: &'a dyn RepositoryHost,
    encodings: Vec<TextEncoding>,
    line_count: LineCountMode,
}

impl<'a> ItemAnalyzer<'a> {
    pub fn new(
        host: &'a dyn RepositoryHost,
        encodings: Vec<TextEncoding>,
        line_count: LineCountMode,
    ) -> Self {
        Self {
            host,
            encodings,
            line_count,
        }
    }

    /// Build the catalog entry for `item`.
    ///
    /// Only a failed root listing is an error; everything that goes wrong
    /// with an individual file is recorded in the entry's notes.
    pub fn analyze(
        &self,
        item: &RemoteItem,
        pipeline: &mut TitlePipeline,
    ) -> CatalogResult<CatalogEntry> {
        let files = self
            .host
            .list_root_files(&item.full_name)
            .map_err(|e| CatalogError::ItemAnalysis {
                item: item.name.clone(),
                message: format!("root listing failed: {e}"),
            })?;

        let mut entry = CatalogEntry::new(&item.name, &item.url);
        let mut notes = Vec::new();

        let bo_file = select_text_file(&files, Language::Tibetan.code());
        let en_file = select_text_file(&files, Language::English.code());
        entry.bo_file_path = bo_file.map(|f| f.path.clone());
        entry.en_file_path = en_file.map(|f| f.path.clone());

        let bo = self.load_side(bo_file);
        let en = self.load_side(en_file);

        if let (Side::Loaded(bo_text), Side::Loaded(en_text)) = (&bo, &en) {
            let resolution = pipeline.resolve(&item.name, bo_text, en_text);
            entry.bo_lines = self.line_count.count(bo_text) as u64;
            entry.en_lines = self.line_count.count(en_text) as u64;
            entry.bo_title = resolution.bo_title;
            entry.en_title = resolution.en_title;
            notes.extend(resolution.provenance);
        } else {
            for (side, language) in [(&bo, Language::Tibetan), (&en, Language::English)] {
                match side {
                    Side::Loaded(text) => {
                        let (lines, title) = (
                            self.line_count.count(text) as u64,
                            single_text_title(text, language),
                        );
                        match language {
                            Language::Tibetan => {
                                entry.bo_lines = lines;
                                entry.bo_title = title;
                            }
                            Language::English => {
                                entry.en_lines = lines;
                                entry.en_title = title;
                            }
                        }
                    }
                    Side::Failed(e) => notes.push(format!("{} file error: {e}", language.label())),
                    Side::Missing => notes.push(format!(
                        "No .txt file with '{}' in filename found",
                        language.code()
                    )),
                }
            }
        }

        entry.notes = notes.join("; ");
        tracing::debug!(
            item = %item.name,
            bo_lines = entry.bo_lines,
            en_lines = entry.en_lines,
            "item analyzed"
        );
        Ok(entry)
    }

    fn load_side(&self, file: Option<&RemoteFile>) -> Side {
        let Some(file) = file else {
            return Side::Missing;
        };
        match self.load_text(file) {
            Ok(text) => Side::Loaded(text),
            Err(e) => {
                tracing::warn!(file = %file.path, error = %e, "text file unusable");
                Side::Failed(e.to_string())
            }
        }
    }

    fn load_text(&self, file: &RemoteFile) -> CatalogResult<String> {
        let url = file
            .download_url
            .as_deref()
            .ok_or_else(|| FetchError::NotFound {
                what: format!("download URL for {}", file.path),
            })?;
        let raw = self.host.fetch_content(url)?;
        Ok(decode_bytes(&raw, &self.encodings)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txt(name: &str) -> RemoteFile {
        RemoteFile::file(name, format!("mem://{name}"))
    }

    #[test]
    fn shortest_matching_txt_wins() {
        let files = vec![
            txt("README.md"),
            txt("TMtoh1_bo_full.txt"),
            txt("bo.txt"),
            txt("BO_alt.txt"),
            txt("en.txt"),
        ];
        assert_eq!(select_text_file(&files, "bo").map(|f| f.name.as_str()), Some("bo.txt"));
        assert_eq!(select_text_file(&files, "en").map(|f| f.name.as_str()), Some("en.txt"));
    }

    #[test]
    fn ties_keep_listing_order_and_dirs_are_ignored() {
        let mut dir = txt("bo.txt");
        dir.kind = FileKind::Dir;
        let files = vec![dir, txt("xbo.txt"), txt("BOx.txt"), txt("bo.tmx")];
        assert_eq!(select_text_file(&files, "bo").map(|f| f.name.as_str()), Some("xbo.txt"));
    }

    #[test]
    fn name_length_counts_characters() {
        // 10 characters but 16 bytes against 11 of each.
        let files = vec![txt("text_bo.txt"), txt("བོད_bo.txt")];
        assert_eq!(
            select_text_file(&files, "bo").map(|f| f.name.as_str()),
            Some("བོད_bo.txt")
        );
    }

    #[test]
    fn nothing_matching_is_none() {
        assert!(select_text_file(&[txt("notes.md")], "en").is_none());
    }
}
