use distfs::naming::client::RegistrationStub;
use distfs::naming::server::NamingServer;
use distfs::storage::server::StorageServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} --role naming", args[0]);
        eprintln!(
            "       {} --role storage --root <dir> --naming <host> [--hostname <name>]",
            args[0]
        );
        std::process::exit(1);
    }

    let mut role: Option<String> = None;
    let mut root: Option<String> = None;
    let mut naming_host: Option<String> = None;
    let mut hostname = std::env::var("DISTFS_HOSTNAME")
        .ok()
        .unwrap_or_else(|| "localhost".to_string());

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--role" => {
                role = Some(args[i + 1].clone());
                i += 2;
            }
            "--root" => {
                root = Some(args[i + 1].clone());
                i += 2;
            }
            "--naming" => {
                naming_host = Some(args[i + 1].clone());
                i += 2;
            }
            "--hostname" => {
                hostname = args[i + 1].clone();
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    match role.as_deref() {
        Some("naming") => {
            let server = NamingServer::new();
            server.start().await?;
            tracing::info!("Press Ctrl+C to shutdown");
            tokio::signal::ctrl_c().await?;
            server.stop().await;
        }
        Some("storage") => {
            let root = root.ok_or_else(|| anyhow::anyhow!("--root is required"))?;
            let naming_host =
                naming_host.ok_or_else(|| anyhow::anyhow!("--naming is required"))?;
            let registration = RegistrationStub::connect(&naming_host).await?;

            let server = StorageServer::new(root);
            server.start(&hostname, &registration).await?;
            tracing::info!("Press Ctrl+C to shutdown");
            tokio::signal::ctrl_c().await?;
            server.stop().await;
        }
        other => {
            anyhow::bail!("unknown role {other:?}; expected \"naming\" or \"storage\"");
        }
    }

    Ok(())
}
