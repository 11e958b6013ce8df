use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use super::Commands;
use crate::config::Config;
use crate::errors::StorageError;
use crate::models::{FileRecord, NewFile, UploadProgress};
use crate::services::{FileService, FileStorage};
use crate::utils::ids::sanitize_name;

pub async fn handle_cli(cmd: Commands, service: &FileService, cfg: &Config) -> Result<()> {
    match cmd {
        Commands::Upload { paths, prefix, mime } => {
            let mut batch = Vec::with_capacity(paths.len());
            for path in &paths {
                match fs::read(path).await {
                    Ok(data) => {
                        let name = file_name(path);
                        let mime_type = mime.clone().unwrap_or_else(|| guess_mime(path).to_string());
                        batch.push(NewFile::new(name, mime_type, data));
                    }
                    Err(e) => eprintln!("Failed to read {}: {}", path.display(), e),
                }
            }

            let names: Vec<String> = batch.iter().map(|f| f.name.clone()).collect();
            let on_progress = |index: usize, p: UploadProgress| {
                println!("  {} {:>3}% ({}/{} bytes)", names[index], p.percentage, p.loaded, p.total);
            };
            let uploaded = service.upload_many(batch, &prefix, Some(&on_progress)).await;
            for record in &uploaded {
                println!("Uploaded: {} -> {}", record.name, record.id);
            }
            if uploaded.len() != paths.len() {
                return Err(anyhow!("{} of {} files uploaded", uploaded.len(), paths.len()));
            }
        }
        Commands::Download { file_id, output } => {
            let record = lookup(service, &file_id).await?;
            let data = service.download(&record).await.context("download file")?;
            let output = output.unwrap_or_else(|| PathBuf::from(sanitize_name(&record.name)));
            fs::write(&output, &data)
                .await
                .with_context(|| format!("write {}", output.display()))?;
            println!("Downloaded {} bytes to {}", data.len(), output.display());
        }
        Commands::Delete { file_id } => {
            let record = lookup(service, &file_id).await?;
            service.delete(&record).await.context("delete file")?;
            println!("Deleted: {}", record.id);
        }
        Commands::Info { file_id } => {
            let mut record = lookup(service, &file_id).await?;
            record.inline_payload = None;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::List { prefix } => {
            let files = service.list(&prefix).await.context("list files")?;
            for f in &files {
                let layout = match f.chunk_count {
                    Some(n) => format!("{} chunks", n),
                    None => "inline".to_string(),
                };
                println!("{} - {} ({} bytes, {})", f.id, f.name, f.size, layout);
            }
            if files.is_empty() {
                println!("No files under {}", prefix);
            }
        }
        Commands::Url { file_id } => {
            let record = lookup(service, &file_id).await?;
            println!("{}", service.resolve_access_reference(&record).await?);
        }
        Commands::Gc { prefix, grace_secs } => {
            let grace = grace_secs.map(Duration::from_secs).unwrap_or(cfg.orphan_grace);
            let report = service.collect_orphans(&prefix, grace).await.context("collect orphans")?;
            println!(
                "Removed {} chunks from {} aborted uploads ({} recent uploads skipped)",
                report.chunks_removed, report.files_removed, report.skipped_recent
            );
        }
        Commands::Shell => return Err(anyhow!("already in the interactive shell")),
    }
    Ok(())
}

async fn lookup(service: &FileService, file_id: &str) -> Result<FileRecord> {
    let record = service
        .find(file_id)
        .await
        .context("look up file")?
        .ok_or_else(|| StorageError::NotFound(file_id.to_string()))?;
    Ok(record)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.bin".to_string())
}

pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}
