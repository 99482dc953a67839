//! `loris asset` subcommand group.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use loris_db::NewAsset;
use loris_media::{MediaStorage, upload_key};
use loris_model::{FileType, PageType};

use super::{GlobalArgs, Session, file_name};
use crate::error::CliError;
use crate::output::Output;

/// Page asset commands.
#[derive(Subcommand)]
pub(crate) enum AssetCommand {
    /// Upload a file and register it on a page.
    Add(AddArgs),
}

#[derive(Args)]
pub(crate) struct AddArgs {
    /// Site id.
    site: i64,

    /// File to upload.
    file: PathBuf,

    /// Page the asset belongs to (index or news).
    #[arg(long, default_value = "index")]
    page: PageType,

    /// Directory inside the site the file is written to.
    #[arg(long, default_value = ".")]
    relative_path: String,

    /// Filename inside the site (default: the uploaded file's name).
    #[arg(long)]
    filename: Option<String>,

    /// File type: css, js, img or pdf (default: from the extension).
    #[arg(long)]
    file_type: Option<FileType>,
}

impl AssetCommand {
    pub(crate) async fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let session = Session::open(global).await?;
        let actor = session.actor(global).await?;

        match self {
            Self::Add(args) => {
                let filename = match args.filename {
                    Some(name) => name,
                    None => file_name(&args.file)?,
                };
                let file_type = match args.file_type {
                    Some(file_type) => file_type,
                    None => file_type_from_extension(&args.file)?,
                };
                let page = session.db.get_page(args.site, args.page).await?;
                let content = std::fs::read(&args.file)?;

                let key = upload_key("assets", &filename);
                session.media().write(&key, &content)?;
                let asset = session
                    .db
                    .add_asset(
                        NewAsset {
                            page_id: page.id,
                            file_type,
                            filename,
                            relative_path: args.relative_path,
                            content_key: key.clone(),
                        },
                        actor.id,
                    )
                    .await;
                let asset = match asset {
                    Ok(asset) => asset,
                    Err(err) => {
                        // Drop the orphaned upload.
                        let _ = session.media().delete(&key);
                        return Err(err.into());
                    }
                };
                output.success(&format!(
                    "Registered {} ({}) on {}",
                    asset.relative_filepath(),
                    asset.file_type,
                    page.relative_filepath()
                ));
            }
        }

        session.db.close().await;
        Ok(())
    }
}

fn file_type_from_extension(path: &Path) -> Result<FileType, CliError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("css") => Ok(FileType::Css),
        Some("js" | "mjs") => Ok(FileType::Js),
        Some("png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "ico") => Ok(FileType::Img),
        Some("pdf") => Ok(FileType::Pdf),
        _ => Err(CliError::Validation(format!(
            "Cannot tell the file type of {}; pass --file-type",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_from_extension() {
        assert_eq!(
            file_type_from_extension(Path::new("a/Logo.PNG")).unwrap(),
            FileType::Img
        );
        assert_eq!(
            file_type_from_extension(Path::new("app.js")).unwrap(),
            FileType::Js
        );
        assert!(file_type_from_extension(Path::new("notes.txt")).is_err());
    }
}
