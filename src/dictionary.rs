use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// Dictionaries the debug screen can ask the input service to dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryKind {
    Contacts,
    User,
    UserHistory,
    Personalization,
}

impl DictionaryKind {
    /// Stable name used in dump requests and dump filenames.
    pub fn name(self) -> &'static str {
        match self {
            DictionaryKind::Contacts => "contacts",
            DictionaryKind::User => "user",
            DictionaryKind::UserHistory => "user_history",
            DictionaryKind::Personalization => "personalization",
        }
    }
}

/// Ask the input service to dump the named dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpRequest {
    pub kind: DictionaryKind,
}

/// Delivery seam for dump requests. How the request reaches the input
/// service is the embedder's concern.
pub trait DumpRequester {
    fn request_dump(&self, kind: DictionaryKind);
}

/// Delivers dump requests to the input service over a channel.
pub struct ChannelDumpRequester {
    tx: mpsc::Sender<DumpRequest>,
}

impl ChannelDumpRequester {
    pub fn new() -> (Self, mpsc::Receiver<DumpRequest>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl DumpRequester for ChannelDumpRequester {
    fn request_dump(&self, kind: DictionaryKind) {
        tracing::info!("requesting dump of the {} dictionary", kind.name());
        let _ = self.tx.send(DumpRequest { kind });
    }
}

/// Chooser-and-installer seam for external dictionaries. The file dialog
/// lives with the embedder; implementations typically end in
/// [`install_external_dictionary`].
pub trait DictionaryImporter {
    fn choose_and_install(&self);
}

/// One word of a dumped dictionary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub word: String,
    pub frequency: u32,
}

/// Extension expected of importable dictionary files
pub const DICTIONARY_EXTENSION: &str = "dict";

/// Write the entries of the named dictionary to a timestamped YAML file
/// under `<dir>/dumps/` and return its path.
pub fn dump_dictionary(
    entries: &[DictionaryEntry],
    kind: DictionaryKind,
    dir: &Path,
) -> anyhow::Result<PathBuf> {
    let dumps_dir = dir.join("dumps");
    fs::create_dir_all(&dumps_dir)?;
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    let path = dumps_dir.join(format!("{}-{}.yaml", kind.name(), stamp));
    let yaml = serde_yaml::to_string(entries)?;
    fs::write(&path, yaml)?;
    tracing::info!(
        "dumped {} entries of the {} dictionary to {}",
        entries.len(),
        kind.name(),
        path.display()
    );
    Ok(path)
}

/// Copy an already-chosen dictionary file into `<dir>/dictionaries/`.
/// Rejects files without the `.dict` extension and empty files.
pub fn install_external_dictionary(src: &Path, dir: &Path) -> anyhow::Result<PathBuf> {
    let ext = src.extension().and_then(|e| e.to_str());
    if ext != Some(DICTIONARY_EXTENSION) {
        anyhow::bail!("not a dictionary file: {}", src.display());
    }
    if fs::metadata(src)?.len() == 0 {
        anyhow::bail!("dictionary file is empty: {}", src.display());
    }

    let dest_dir = dir.join("dictionaries");
    fs::create_dir_all(&dest_dir)?;
    let file_name = src
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("dictionary path has no file name: {}", src.display()))?;
    let dest = dest_dir.join(file_name);
    fs::copy(src, &dest)?;
    tracing::info!("installed external dictionary {}", dest.display());
    Ok(dest)
}
