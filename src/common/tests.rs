#[cfg(test)]
mod tests {
    use crate::common::error::DfsError;
    use crate::common::path::Path;

    #[test]
    fn test_string_form_round_trips() {
        for s in ["/", "/a", "/a/b/c", "/weird name/x", "/ünïcode/päth"] {
            let path = Path::parse(s).unwrap();
            assert_eq!(Path::parse(&path.to_string()).unwrap(), path);
        }
        // Empty components are dropped, so the canonical form differs.
        assert_eq!(Path::parse("//a//b/").unwrap().to_string(), "/a/b");
    }

    #[test]
    fn test_child_parent_last_are_inverses() {
        let parent = Path::parse("/a/b").unwrap();
        let child = parent.child("c").unwrap();
        assert_eq!(child.to_string(), "/a/b/c");
        assert_eq!(child.parent().unwrap(), parent);
        assert_eq!(child.last().unwrap(), "c");
    }

    #[test]
    fn test_root_has_no_parent_or_last() {
        let root = Path::root();
        assert!(root.is_root());
        assert!(root.parent().is_none());
        assert!(root.last().is_none());
        assert_eq!(root.to_string(), "/");
        // The root plays the "empty parent" role for child construction.
        assert_eq!(root.child("a").unwrap().to_string(), "/a");
    }

    #[test]
    fn test_invalid_components_are_rejected() {
        let root = Path::root();
        for component in ["", "a/b", "a:b", ":", "/"] {
            assert!(matches!(
                root.child(component),
                Err(DfsError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_invalid_strings_are_rejected() {
        for s in ["", "a/b", "relative", "/a:b", ":"] {
            assert!(matches!(Path::parse(s), Err(DfsError::InvalidArgument(_))));
        }
    }

    #[test]
    fn test_subpath_is_reflexive_and_prefix_based() {
        let path = Path::parse("/a/b/c").unwrap();
        assert!(path.is_subpath(&path));
        assert!(path.is_subpath(&Path::root()));
        assert!(path.is_subpath(&Path::parse("/a/b").unwrap()));
        assert!(!path.is_subpath(&Path::parse("/a/x").unwrap()));
        assert!(!path.is_subpath(&Path::parse("/a/b/c/d").unwrap()));
        // Prefix of components, not of strings.
        assert!(!Path::parse("/ab").unwrap().is_subpath(&Path::parse("/a").unwrap()));
    }

    #[test]
    fn test_list_walks_the_directory_tree() {
        let scratch = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(scratch.path().join("a/b")).unwrap();
        std::fs::write(scratch.path().join("a/b/c.txt"), b"c").unwrap();
        std::fs::write(scratch.path().join("top.txt"), b"t").unwrap();
        std::fs::create_dir(scratch.path().join("empty")).unwrap();

        let mut listed = Path::list(scratch.path()).unwrap();
        listed.sort_by_key(|p| p.to_string());
        let strings: Vec<String> = listed.iter().map(|p| p.to_string()).collect();
        assert_eq!(strings, vec!["/a/b/c.txt", "/top.txt"]);
    }

    #[test]
    fn test_list_rejects_missing_or_non_directory() {
        let scratch = tempfile::tempdir().unwrap();
        assert!(matches!(
            Path::list(&scratch.path().join("missing")),
            Err(DfsError::NotFound(_))
        ));
        let file = scratch.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            Path::list(&file),
            Err(DfsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_to_local_stays_under_the_root() {
        let root = std::path::Path::new("/srv/files");
        let path = Path::parse("/a/b").unwrap();
        assert_eq!(path.to_local(root).unwrap(), root.join("a/b"));

        let escape = Path::root().child("..").unwrap();
        assert!(matches!(
            escape.to_local(root),
            Err(DfsError::InvalidArgument(_))
        ));
    }
}
