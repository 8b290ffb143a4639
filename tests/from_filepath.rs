mod from_filepath {

    use std::fs;
    use std::path::PathBuf;

    use magic_tree::{from_filepath, mime_from_filepath, read_bytes};

    /// A fresh directory for one test
    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("magic_tree-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn files_and_directories() {
        let dir = scratch("files");
        let pdf = dir.join("doc");
        fs::write(&pdf, b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n").unwrap();
        let empty = dir.join("empty");
        fs::write(&empty, b"").unwrap();
        let text = dir.join("notes");
        fs::write(&text, "plain words, nothing more\n").unwrap();

        assert_eq!(from_filepath(&pdf).unwrap(), "PDF document, version 1.7");
        assert_eq!(mime_from_filepath(&pdf).unwrap(), "application/pdf");
        assert_eq!(from_filepath(&empty).unwrap(), "empty");
        assert_eq!(from_filepath(&text).unwrap(), "ASCII text");
        assert_eq!(from_filepath(&dir).unwrap(), "directory");
        assert_eq!(mime_from_filepath(&dir).unwrap(), "inode/directory");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = scratch("missing");
        assert!(from_filepath(&dir.join("nope")).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn reads_are_capped() {
        let dir = scratch("capped");
        let big = dir.join("big");
        fs::write(&big, vec![b'a'; 4096]).unwrap();
        assert_eq!(read_bytes(&big, 100).unwrap().len(), 100);
        assert_eq!(read_bytes(&big, 1 << 20).unwrap().len(), 4096);
        fs::remove_dir_all(&dir).unwrap();
    }
}
