use std::path::{Path, PathBuf};

use crate::image_pipeline::common::error::{ConversionError, Result};

/// File next to `input` sharing its base name up to the first `.`.
///
/// `scan.AIM;1` and `scan.mha` both map to `scan.<extension>`.
pub fn sibling_path(input: &Path, extension: &str) -> Option<PathBuf> {
    let file_name = input.file_name()?.to_str()?;
    let stem = file_name.split('.').next().filter(|s| !s.is_empty())?;
    let folder = input.parent().unwrap_or_else(|| Path::new(""));
    Some(folder.join(format!("{stem}.{extension}")))
}

/// Destination for a written image: the explicit path if set, otherwise the
/// sibling of the input file.
pub fn resolve_output_path(explicit: Option<&Path>, input: Option<&Path>, extension: &str) -> Result<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| input.and_then(|p| sibling_path(p, extension)))
        .ok_or(ConversionError::NoOutputPath)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sibling_path_uses_first_dot() {
        assert_eq!(
            sibling_path(Path::new("/data/C0001234.AIM;1"), "mha"),
            Some(PathBuf::from("/data/C0001234.mha"))
        );
        assert_eq!(
            sibling_path(Path::new("scan.nii.mha"), "aim"),
            Some(PathBuf::from("scan.aim"))
        );
        assert_eq!(sibling_path(Path::new("/data/.hidden"), "aim"), None);
    }

    #[test]
    fn test_resolve_output_path() {
        let explicit = Path::new("/out/x.aim");
        assert_eq!(
            resolve_output_path(Some(explicit), Some(Path::new("/in/y.mha")), "aim").unwrap(),
            PathBuf::from("/out/x.aim")
        );
        assert_eq!(
            resolve_output_path(None, Some(Path::new("/in/y.mha")), "aim").unwrap(),
            PathBuf::from("/in/y.aim")
        );
        assert!(matches!(
            resolve_output_path(None, None, "aim"),
            Err(ConversionError::NoOutputPath)
        ));
    }
}
