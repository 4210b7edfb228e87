use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tga", "tiff", "tif", "webp", "ico", "pnm", "pbm",
    "pgm", "ppm", "pam", "dds", "hdr", "exr", "ff", "qoi",
];

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://") || s.starts_with("file://")
}

/// Turn command-line arguments into image references.
///
/// Directories expand to their image files (sorted, optionally recursive).
/// Everything else, including URLs and paths that do not exist yet, is kept
/// as given: the viewer shows a placeholder for entries it cannot load.
pub fn collect_images(
    paths: &[PathBuf],
    file_list: Option<&PathBuf>,
    recursive: bool,
) -> anyhow::Result<Vec<String>> {
    let mut images = Vec::new();

    if let Some(list_path) = file_list {
        let text = fs::read_to_string(list_path)
            .with_context(|| format!("reading file list {}", list_path.display()))?;
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            push_reference(trimmed, recursive, &mut images);
        }
    }

    for path in paths {
        push_reference(&path.display().to_string(), recursive, &mut images);
    }

    log::info!("Collected {} image references", images.len());
    Ok(images)
}

fn push_reference(reference: &str, recursive: bool, out: &mut Vec<String>) {
    let path = Path::new(reference);
    if !is_url(reference) && path.is_dir() {
        scan_dir(path, recursive, out);
    } else {
        out.push(reference.to_string());
    }
}

fn scan_dir(dir: &Path, recursive: bool, out: &mut Vec<String>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Cannot read directory {}: {}", dir.display(), e);
            return;
        }
    };
    let mut files = Vec::new();
    let mut subdirs = Vec::new();

    for entry in entries.filter_map(|e| e.ok()) {
        let p = entry.path();
        if p.is_file() && is_image_file(&p) {
            files.push(p);
        } else if recursive && p.is_dir() {
            subdirs.push(p);
        }
    }

    files.sort();
    log::debug!("Scanning {:?}... ({} images)", dir, files.len());
    out.extend(files.iter().map(|p| p.display().to_string()));

    if recursive {
        subdirs.sort();
        for sub in subdirs {
            scan_dir(&sub, true, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::write(path, b"").expect("write");
    }

    #[test]
    fn recognises_image_extensions() {
        assert!(is_image_file(Path::new("a/b.PNG")));
        assert!(is_image_file(Path::new("photo.jpeg")));
        assert!(!is_image_file(Path::new("notes.txt")));
        assert!(!is_image_file(Path::new("no_extension")));
    }

    #[test]
    fn directories_expand_sorted_and_filtered() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(&dir.path().join("b.png"));
        touch(&dir.path().join("a.jpg"));
        touch(&dir.path().join("readme.md"));
        let sub = dir.path().join("nested");
        fs::create_dir(&sub).expect("mkdir");
        touch(&sub.join("c.gif"));

        let flat = collect_images(&[dir.path().to_path_buf()], None, false).expect("collect");
        let names: Vec<_> = flat
            .iter()
            .map(|p| Path::new(p).file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.png"]);

        let deep = collect_images(&[dir.path().to_path_buf()], None, true).expect("collect");
        assert_eq!(deep.len(), 3);
        assert!(deep[2].ends_with("c.gif"));
    }

    #[test]
    fn file_list_keeps_urls_and_missing_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let list = dir.path().join("list.txt");
        fs::write(
            &list,
            "https://example.com/x.png\n\n# comment\n  /does/not/exist.png  \n",
        )
        .expect("write");

        let images =
            collect_images(&[PathBuf::from("last.png")], Some(&list), false).expect("collect");
        assert_eq!(
            images,
            vec![
                "https://example.com/x.png".to_string(),
                "/does/not/exist.png".to_string(),
                "last.png".to_string(),
            ]
        );
    }

    #[test]
    fn missing_file_list_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = collect_images(&[], Some(&dir.path().join("nope.txt")), false).unwrap_err();
        assert!(err.to_string().contains("reading file list"));
    }
}
