use std::fs::create_dir_all;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use cap_std::{ambient_authority, fs::Dir};
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::error::Result;

/// URL prefix under which stored images are served.
pub const PUBLIC_PATH: &str = "/static/uploads";

pub struct Uploads {
    dir: Dir,
}

impl Uploads {
    /// Opens the uploads directory, creating it first if necessary.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        create_dir_all(path)?;

        let dir = Dir::open_ambient_dir(path, ambient_authority())?;

        Ok(Self { dir })
    }

    /// Stores `bytes` under the sanitized `file_name` and returns its public URL.
    ///
    /// Yields `None` if nothing usable remains of the file name.
    pub fn save(&self, file_name: &str, bytes: &[u8]) -> Result<Option<String>> {
        let file_name = secure_filename(file_name);

        if file_name.is_empty() {
            return Ok(None);
        }

        let mut file = self.dir.create(&file_name)?;
        file.write_all(bytes)?;

        tracing::debug!("Saved {} bytes to {}", bytes.len(), file_name);

        Ok(Some(format!("{}/{}", PUBLIC_PATH, file_name)))
    }

    pub fn read(&self, file_name: &str) -> Result<Option<Vec<u8>>> {
        if file_name.is_empty() || secure_filename(file_name) != file_name {
            return Ok(None);
        }

        let mut file = match self.dir.open(file_name) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;

        Ok(Some(buf))
    }
}

/// Reduces a client-supplied file name to a flat name made of `[A-Za-z0-9_.-]`.
///
/// Accented letters are decomposed first so that only their diacritics are lost.
pub fn secure_filename(file_name: &str) -> String {
    static UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").unwrap());

    let file_name = file_name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect::<String>();

    let file_name = file_name.split_whitespace().collect::<Vec<_>>().join("_");

    let file_name = UNSAFE.replace_all(&file_name, "");

    file_name.trim_matches(&['.', '_'][..]).to_owned()
}

pub fn content_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    #[test]
    fn secure_filename_strips_paths() {
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("C:\\photos\\me.png"), "C_photos_me.png");
    }

    #[test]
    fn secure_filename_joins_whitespace() {
        assert_eq!(secure_filename("my  holiday photo.jpg"), "my_holiday_photo.jpg");
    }

    #[test]
    fn secure_filename_drops_unsafe_characters() {
        assert_eq!(secure_filename("smile😀<script>.gif"), "smilescript.gif");
        assert_eq!(secure_filename("..."), "");
    }

    #[test]
    fn secure_filename_transliterates_accents() {
        assert_eq!(secure_filename("café.png"), "cafe.png");
        assert_eq!(secure_filename("Ångström ﬁle.jpg"), "Angstrom_file.jpg");
    }

    #[test]
    fn content_type_by_extension() {
        assert_eq!(content_type("me.PNG"), "image/png");
        assert_eq!(content_type("me.jpeg"), "image/jpeg");
        assert_eq!(content_type("README"), "application/octet-stream");
    }

    #[test]
    fn save_creates_directory_and_returns_public_url() {
        let tmp = tempdir().unwrap();
        let uploads = Uploads::open(tmp.path().join("static/uploads")).unwrap();

        let url = uploads.save("../me.png", b"png").unwrap();

        assert_eq!(url.as_deref(), Some("/static/uploads/me.png"));
        assert_eq!(uploads.read("me.png").unwrap().as_deref(), Some(&b"png"[..]));
    }

    #[test]
    fn save_without_usable_name_stores_nothing() {
        let tmp = tempdir().unwrap();
        let uploads = Uploads::open(tmp.path()).unwrap();

        assert_eq!(uploads.save("///", b"data").unwrap(), None);
    }

    #[test]
    fn read_refuses_unsanitized_names() {
        let tmp = tempdir().unwrap();
        let uploads = Uploads::open(tmp.path()).unwrap();

        assert_eq!(uploads.read("../secret").unwrap(), None);
        assert_eq!(uploads.read("missing.png").unwrap(), None);
    }
}
