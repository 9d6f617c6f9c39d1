//! `cardscan serve`: wires the pipeline, worker pool and HTTP gateway together.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use cardscan_config::AppConfig;
use cardscan_gateway::{build_router, shutdown_signal, start_server, AppState};
use cardscan_scheduler::{TaskStore, WorkerPool};
use cardscan_understanding::{DocumentPipeline, TesseractRecognizer};

pub async fn run(config: AppConfig) -> Result<()> {
    let addr = listen_addr(&config)?;
    info!(
        addr = %addr,
        upload_dir = %config.server.upload_dir.display(),
        workers = config.tasks.workers,
        "Starting CardScan"
    );

    tokio::fs::create_dir_all(&config.server.upload_dir)
        .await
        .with_context(|| {
            format!(
                "failed to create upload directory {}",
                config.server.upload_dir.display()
            )
        })?;

    if !TesseractRecognizer::new(&config.ocr).is_available().await {
        warn!(
            binary = %config.ocr.tesseract_path,
            "tesseract is not runnable; OCR tasks will fail until it is installed"
        );
    }

    let pipeline = Arc::new(DocumentPipeline::from_config(&config));
    let store = TaskStore::from_settings(&config.tasks);
    let pool = Arc::new(WorkerPool::start(pipeline, store, &config.tasks));

    let state = AppState::new(Arc::clone(&pool), config.server.upload_dir.clone());
    let app = build_router(state, config.server.max_upload_bytes);

    let served = start_server(addr, app, shutdown_signal()).await;

    pool.shutdown().await;
    served
}

fn listen_addr(config: &AppConfig) -> Result<SocketAddr> {
    let ip: IpAddr = config
        .server
        .bind_address
        .parse()
        .with_context(|| format!("invalid bind address {:?}", config.server.bind_address))?;
    Ok(SocketAddr::new(ip, config.server.port))
}
