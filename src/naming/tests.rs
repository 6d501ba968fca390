#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use crate::common::error::DfsError;
    use crate::common::path::Path;
    use crate::naming::client::{RegistrationStub, ServiceStub};
    use crate::naming::server::NamingServer;
    use crate::naming::tree::{PathNode, ServerStubs};
    use crate::storage::client::{CommandStub, StorageStub};
    use crate::storage::server::StorageServer;

    fn path(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    fn paths(strings: &[&str]) -> Vec<Path> {
        strings.iter().map(|s| path(s)).collect()
    }

    // Address-only stubs are enough for tree-level tests: registration and
    // lookups never contact the storage server.
    fn stub_pair(port: u16) -> (StorageStub, CommandStub) {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        (StorageStub::for_address(addr), CommandStub::for_address(addr))
    }

    // ============================================================
    // DIRECTORY TREE NODES
    // ============================================================

    #[test]
    fn test_tree_node_operations() {
        let (storage, command) = stub_pair(7001);
        let stubs = ServerStubs { storage, command };
        let mut root = PathNode::new_dir(Path::root());
        assert!(root.insert_file(&path("/a/b"), &stubs).unwrap());

        assert!(root.has_directory_child("a"));
        assert!(!root.has_file_child("a"));
        let a = root.child("a").unwrap();
        assert!(a.has_file_child("b"));
        assert_eq!(a.path(), &path("/a"));
        assert_eq!(a.stubs(), None);

        let leaf = root.node_at(&path("/a/b")).unwrap();
        assert!(leaf.is_file());
        assert_eq!(leaf.stubs(), Some(&stubs));

        let descendants = root.descendants();
        assert_eq!(descendants.len(), 1);
        assert_eq!(descendants[0].path(), &path("/a/b"));

        assert!(matches!(
            root.node_at(&path("/a/x")),
            Err(DfsError::NotFound(_))
        ));
        assert!(matches!(
            root.add_child("a", PathNode::new_dir(path("/a"))),
            Err(DfsError::InvalidArgument(_))
        ));
        assert!(matches!(
            root.delete_child("ghost"),
            Err(DfsError::NotFound(_))
        ));
        assert!(root.delete_child("a").is_ok());
        assert!(root.descendants().is_empty());
    }

    // ============================================================
    // REGISTRATION AND TREE STATE
    // ============================================================

    #[tokio::test]
    async fn test_registration_builds_the_tree() {
        let naming = NamingServer::with_ports(0, 0);
        let (s1, c1) = stub_pair(7001);

        let duplicates = naming
            .register(s1.clone(), c1, paths(&["/a/b/c", "/a/d"]))
            .await
            .unwrap();
        assert!(duplicates.is_empty());

        assert_eq!(naming.get_storage(&path("/a/b/c")).await.unwrap(), s1);
        let mut names = naming.list(&path("/a")).await.unwrap();
        names.sort();
        assert_eq!(names, vec!["b", "d"]);
        assert!(naming.is_directory(&path("/a/b")).await.unwrap());
        assert!(!naming.is_directory(&path("/a/b/c")).await.unwrap());
        assert!(naming.is_directory(&Path::root()).await.unwrap());
    }

    #[tokio::test]
    async fn test_second_registration_reports_duplicates() {
        let naming = NamingServer::with_ports(0, 0);
        let (s1, c1) = stub_pair(7001);
        let (s2, c2) = stub_pair(7002);

        naming
            .register(s1.clone(), c1, paths(&["/a/b/c", "/a/d"]))
            .await
            .unwrap();
        let duplicates = naming
            .register(s2.clone(), c2, paths(&["/a/b/c", "/x"]))
            .await
            .unwrap();
        assert_eq!(duplicates, paths(&["/a/b/c"]));

        // The original assignment is untouched; the fresh file routes to
        // the second server.
        assert_eq!(naming.get_storage(&path("/a/b/c")).await.unwrap(), s1);
        assert_eq!(naming.get_storage(&path("/x")).await.unwrap(), s2);
    }

    #[tokio::test]
    async fn test_registering_the_same_pair_twice_fails() {
        let naming = NamingServer::with_ports(0, 0);
        let (s1, c1) = stub_pair(7001);

        naming
            .register(s1.clone(), c1.clone(), paths(&["/a"]))
            .await
            .unwrap();
        assert_eq!(
            naming.register(s1, c1, vec![]).await,
            Err(DfsError::AlreadyRegistered)
        );
    }

    #[tokio::test]
    async fn test_an_offer_can_duplicate_itself() {
        let naming = NamingServer::with_ports(0, 0);
        let (s1, c1) = stub_pair(7001);

        let duplicates = naming
            .register(s1, c1, paths(&["/f", "/f"]))
            .await
            .unwrap();
        assert_eq!(duplicates, paths(&["/f"]));
    }

    #[tokio::test]
    async fn test_a_file_blocking_an_intermediate_directory_is_a_duplicate() {
        let naming = NamingServer::with_ports(0, 0);
        let (s1, c1) = stub_pair(7001);
        let (s2, c2) = stub_pair(7002);

        naming.register(s1.clone(), c1, paths(&["/a"])).await.unwrap();
        let duplicates = naming
            .register(s2, c2, paths(&["/a/b"]))
            .await
            .unwrap();
        assert_eq!(duplicates, paths(&["/a/b"]));
        assert_eq!(naming.get_storage(&path("/a")).await.unwrap(), s1);
    }

    // ============================================================
    // SERVICE OPERATIONS
    // ============================================================

    #[tokio::test]
    async fn test_lookup_failures() {
        let naming = NamingServer::with_ports(0, 0);
        let (s1, c1) = stub_pair(7001);
        naming.register(s1, c1, paths(&["/a/b"])).await.unwrap();

        assert!(matches!(
            naming.is_directory(&path("/ghost")).await,
            Err(DfsError::NotFound(_))
        ));
        // Listing a file is not a directory listing.
        assert!(matches!(
            naming.list(&path("/a/b")).await,
            Err(DfsError::NotFound(_))
        ));
        // Directories have no storage assignment.
        assert!(matches!(
            naming.get_storage(&path("/a")).await,
            Err(DfsError::NotFound(_))
        ));
        assert!(matches!(
            naming.get_storage(&path("/ghost")).await,
            Err(DfsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_root_structural_operations_are_rejected() {
        let naming = NamingServer::with_ports(0, 0);
        assert!(!naming.create_file(&Path::root()).await.unwrap());
        assert!(!naming.create_directory(&Path::root()).await.unwrap());
        assert!(!naming.delete(&Path::root()).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_directory_walk_rules() {
        let naming = NamingServer::with_ports(0, 0);

        assert!(naming.create_directory(&path("/top")).await.unwrap());
        assert!(naming.create_directory(&path("/top/sub")).await.unwrap());
        // Existing name: not created.
        assert!(!naming.create_directory(&path("/top")).await.unwrap());
        // Missing intermediate directory.
        assert!(matches!(
            naming.create_directory(&path("/none/deep")).await,
            Err(DfsError::NotFound(_))
        ));
        assert!(naming.is_directory(&path("/top/sub")).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_file_requires_a_registered_storage_server() {
        let naming = NamingServer::with_ports(0, 0);
        assert!(matches!(
            naming.create_file(&path("/f")).await,
            Err(DfsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_of_missing_target_returns_false() {
        let naming = NamingServer::with_ports(0, 0);
        assert!(!naming.delete(&path("/ghost")).await.unwrap());
        assert!(!naming.delete(&path("/a/b/c")).await.unwrap());
    }

    // ============================================================
    // END-TO-END OVER THE WIRE
    // ============================================================

    async fn start_cluster() -> (Arc<NamingServer>, ServiceStub, RegistrationStub) {
        let naming = NamingServer::with_ports(0, 0);
        naming.start().await.expect("naming start failed");
        let service_port = naming.service_addr().await.unwrap().port();
        let registration_port = naming.registration_addr().await.unwrap().port();
        let service = ServiceStub::for_address(SocketAddr::from(([127, 0, 0, 1], service_port)));
        let registration =
            RegistrationStub::for_address(SocketAddr::from(([127, 0, 0, 1], registration_port)));
        (naming, service, registration)
    }

    #[tokio::test]
    async fn test_create_file_materializes_on_a_storage_server() {
        let (naming, service, registration) = start_cluster().await;
        let scratch = tempfile::tempdir().unwrap();
        let storage = StorageServer::new(scratch.path());
        storage
            .start("localhost", &registration)
            .await
            .expect("storage start failed");

        let target = path("/new.txt");
        assert!(service.create_file(&target).await.unwrap());
        assert!(scratch.path().join("new.txt").is_file());
        assert!(!service.create_file(&target).await.unwrap());

        // Bytes flow through the stub the naming server hands out.
        let stub = service.get_storage(&target).await.unwrap();
        stub.write(&target, 0, b"payload".to_vec()).await.unwrap();
        assert_eq!(stub.size(&target).await.unwrap(), 7);
        assert_eq!(stub.read(&target, 0, 7).await.unwrap(), b"payload");

        storage.stop().await;
        naming.stop().await;
    }

    #[tokio::test]
    async fn test_duplicate_files_are_pruned_from_the_second_server() {
        let (naming, service, registration) = start_cluster().await;

        let scratch1 = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(scratch1.path().join("a/b")).unwrap();
        std::fs::write(scratch1.path().join("a/b/c"), b"first copy").unwrap();
        let storage1 = StorageServer::new(scratch1.path());
        storage1.start("localhost", &registration).await.unwrap();

        let scratch2 = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(scratch2.path().join("a/b")).unwrap();
        std::fs::write(scratch2.path().join("a/b/c"), b"second copy").unwrap();
        std::fs::write(scratch2.path().join("x"), b"unique").unwrap();
        let storage2 = StorageServer::new(scratch2.path());
        storage2.start("localhost", &registration).await.unwrap();

        // The duplicate was deleted locally and its emptied directories
        // pruned; the unique file survived.
        assert!(!scratch2.path().join("a").exists());
        assert!(scratch2.path().join("x").is_file());

        // The first copy still serves reads.
        let stub = service.get_storage(&path("/a/b/c")).await.unwrap();
        assert_eq!(stub.read(&path("/a/b/c"), 0, 10).await.unwrap(), b"first copy");

        // Deleting through the naming server reaches the owning backend.
        assert!(service.delete(&path("/a")).await.unwrap());
        assert!(!scratch1.path().join("a").exists());
        assert!(matches!(
            service.get_storage(&path("/a/b/c")).await,
            Err(DfsError::NotFound(_))
        ));

        storage1.stop().await;
        storage2.stop().await;
        naming.stop().await;
    }

    #[tokio::test]
    async fn test_servers_cannot_be_started_twice() {
        let (naming, _service, registration) = start_cluster().await;
        assert_eq!(naming.start().await, Err(DfsError::AlreadyStarted));

        let scratch = tempfile::tempdir().unwrap();
        let storage = StorageServer::new(scratch.path());
        storage.start("localhost", &registration).await.unwrap();
        assert_eq!(
            storage.start("localhost", &registration).await,
            Err(DfsError::AlreadyStarted)
        );

        storage.stop().await;
        naming.stop().await;
    }

    #[tokio::test]
    async fn test_storage_start_validates_its_root() {
        let (naming, _service, registration) = start_cluster().await;
        let scratch = tempfile::tempdir().unwrap();

        let missing = StorageServer::new(scratch.path().join("missing"));
        assert!(matches!(
            missing.start("localhost", &registration).await,
            Err(DfsError::NotFound(_))
        ));

        let file = scratch.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();
        let not_dir = StorageServer::new(&file);
        assert!(matches!(
            not_dir.start("localhost", &registration).await,
            Err(DfsError::NotFound(_))
        ));

        naming.stop().await;
    }
}
