#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use crate::common::error::DfsError;
    use crate::common::path::Path;
    use crate::storage::server::StorageServer;

    fn scratch_server(files: &[(&str, &[u8])]) -> (TempDir, Arc<StorageServer>) {
        let scratch = tempfile::tempdir().unwrap();
        for (path, contents) in files {
            let local = scratch.path().join(path.trim_start_matches('/'));
            if let Some(parent) = local.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(local, contents).unwrap();
        }
        let server = StorageServer::new(scratch.path());
        (scratch, server)
    }

    fn path(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_size_of_regular_file() {
        let (_scratch, server) = scratch_server(&[("/a/data.bin", b"hello")]);
        assert_eq!(server.size(&path("/a/data.bin")).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_size_fails_on_missing_file_and_directory() {
        let (_scratch, server) = scratch_server(&[("/a/data.bin", b"hello")]);
        assert!(matches!(
            server.size(&path("/nope")).await,
            Err(DfsError::NotFound(_))
        ));
        assert!(matches!(
            server.size(&path("/a")).await,
            Err(DfsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let (_scratch, server) = scratch_server(&[("/f", b"0123456789")]);
        let target = path("/f");

        server.write(&target, 3, b"XYZ").await.unwrap();
        assert_eq!(server.read(&target, 3, 3).await.unwrap(), b"XYZ");
        assert_eq!(server.read(&target, 0, 10).await.unwrap(), b"012XYZ6789");
    }

    #[tokio::test]
    async fn test_write_past_the_end_extends_the_file() {
        let (_scratch, server) = scratch_server(&[("/f", b"ab")]);
        let target = path("/f");

        server.write(&target, 4, b"zz").await.unwrap();
        assert_eq!(server.size(&target).await.unwrap(), 6);
        // The gap reads back as zero bytes.
        assert_eq!(server.read(&target, 0, 6).await.unwrap(), b"ab\0\0zz");
    }

    #[tokio::test]
    async fn test_read_out_of_bounds() {
        let (_scratch, server) = scratch_server(&[("/f", b"abcdef")]);
        let target = path("/f");

        assert!(matches!(
            server.read(&target, 0, 7).await,
            Err(DfsError::OutOfBounds(_))
        ));
        assert!(matches!(
            server.read(&target, 6, 1).await,
            Err(DfsError::OutOfBounds(_))
        ));
        assert!(matches!(
            server.read(&target, -1, 1).await,
            Err(DfsError::OutOfBounds(_))
        ));
        assert!(matches!(
            server.read(&target, 0, -1).await,
            Err(DfsError::OutOfBounds(_))
        ));
        // Reading exactly to the end is fine.
        assert_eq!(server.read(&target, 0, 6).await.unwrap(), b"abcdef");
    }

    #[tokio::test]
    async fn test_write_rejects_negative_offset() {
        let (_scratch, server) = scratch_server(&[("/f", b"abc")]);
        assert!(matches!(
            server.write(&path("/f"), -1, b"x").await,
            Err(DfsError::OutOfBounds(_))
        ));
    }

    #[tokio::test]
    async fn test_create_builds_parents_and_reports_novelty() {
        let (scratch, server) = scratch_server(&[]);

        assert!(server.create(&path("/a/b/c.txt")).await.unwrap());
        assert!(scratch.path().join("a/b/c.txt").is_file());

        // Second create of the same path is not a new file.
        assert!(!server.create(&path("/a/b/c.txt")).await.unwrap());
        // The root is never created.
        assert!(!server.create(&Path::root()).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_prunes_empty_ancestors_but_not_the_root() {
        let (scratch, server) =
            scratch_server(&[("/a/b/c/deep.txt", b"x"), ("/a/keep.txt", b"y")]);

        assert!(server.delete(&path("/a/b/c/deep.txt")).await.unwrap());
        // /a/b/c and /a/b became empty and were pruned; /a still holds a file.
        assert!(!scratch.path().join("a/b").exists());
        assert!(scratch.path().join("a/keep.txt").is_file());

        assert!(server.delete(&path("/a/keep.txt")).await.unwrap());
        // Everything under the root is gone, but the root itself survives.
        assert!(!scratch.path().join("a").exists());
        assert!(scratch.path().exists());
    }

    #[tokio::test]
    async fn test_delete_is_recursive_on_directories() {
        let (scratch, server) = scratch_server(&[("/dir/x.txt", b"x"), ("/dir/sub/y.txt", b"y")]);

        assert!(server.delete(&path("/dir")).await.unwrap());
        assert!(!scratch.path().join("dir").exists());
    }

    #[tokio::test]
    async fn test_delete_of_missing_target_and_root() {
        let (_scratch, server) = scratch_server(&[]);
        assert!(!server.delete(&path("/ghost")).await.unwrap());
        assert!(!server.delete(&Path::root()).await.unwrap());
    }

    #[tokio::test]
    async fn test_paths_cannot_escape_the_root() {
        let (_scratch, server) = scratch_server(&[]);
        let escape = Path::root().child("..").unwrap();
        assert!(matches!(
            server.size(&escape).await,
            Err(DfsError::InvalidArgument(_))
        ));
    }
}
