//! Subcommand handlers.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use recall_vector::Metadata;

use super::output::Output;
use super::Commands;
use crate::llm::CompletionRequest;
use crate::rag::chunker::chunk_text;
use crate::rag::context::{build_augmented_prompt, search};
use crate::rag::filter::SearchFilters;
use crate::rag::ingest::ingest_document;
use crate::state::RagState;
use crate::types::{Document, Message};
use crate::utils::config::RecallConfig;

/// Execute one subcommand against the loaded configuration.
pub async fn run(command: Commands, config: RecallConfig, output: &Output) -> anyhow::Result<()> {
    match command {
        Commands::Chunk { file, max_length } => {
            let max_length = max_length.unwrap_or(config.context.max_chunk_length);
            if max_length == 0 {
                bail!("--max-length must be at least 1");
            }
            let text = read_file(&file).await?;
            let chunks = chunk_text(&text, max_length);

            output.header(&format!("{} chunks from {}", chunks.len(), file.display()));
            for (n, chunk) in chunks.iter().enumerate() {
                output.chunk(n, chunk);
            }
        }

        Commands::Embed { text } => {
            let state = RagState::from_config(config)?;
            let vector = state.embedder.embed(&text).await?;
            let head: Vec<String> = vector.iter().take(3).map(|v| format!("{:.6}", v)).collect();

            output.header("Embedding");
            output.kv("backend", state.embedder.backend_name());
            output.kv("dimensions", &vector.len().to_string());
            output.kv("head", &format!("[{}, ...]", head.join(", ")));
            state.close();
        }

        Commands::Ingest {
            file,
            id,
            source,
            category,
        } => {
            let state = RagState::from_config(config)?;
            let document = load_document(&file, id, source, category).await?;
            let ack = ingest_document(&state, &document).await?;

            output.success(&format!(
                "Upserted {} chunks from {} into the {} index",
                ack.upserted_count,
                file.display(),
                state.index.provider_name()
            ));
            state.close();
        }

        Commands::Query {
            text,
            files,
            top_k,
            categories,
            recent,
        } => {
            let mut config = config;
            if let Some(k) = top_k {
                if k == 0 {
                    bail!("--top-k must be at least 1");
                }
                config.index.top_k = k;
            }
            let state = RagState::from_config(config)?;
            ingest_files(&state, &files, output).await?;

            let filters = if recent {
                SearchFilters::recent()
            } else if !categories.is_empty() {
                SearchFilters::categories(categories)
            } else {
                SearchFilters::all()
            };
            let filter = filters.to_metadata_filter();
            let results = search(&state, &text, filter.as_ref()).await?;

            output.header(&format!("Results for \"{}\"", text));
            if results.is_empty() {
                output.warning("No matching documents");
            }
            for (rank, result) in results.iter().enumerate() {
                let source = result.metadata.get_str("source").unwrap_or("Unknown");
                output.hit(rank + 1, &result.id, result.score, source);
                if let Some(content) = &result.content {
                    output.block(content);
                }
            }
            state.close();
        }

        Commands::Prompt { text, files } => {
            let state = RagState::from_config(config)?;
            ingest_files(&state, &files, output).await?;

            let prompt =
                build_augmented_prompt(&state, &text, vec![Message::user(text.as_str())], None)
                    .await?;
            let request = CompletionRequest::from_prompt(&prompt, &state.config.completion);
            println!("{}", serde_json::to_string_pretty(&request)?);
            state.close();
        }

        Commands::Config { validate } => {
            if validate {
                config.validate()?;
                output.success("Configuration is valid");
            }
            output.header("Effective configuration");
            output.block(&config.to_toml_string()?);
        }
    }

    Ok(())
}

async fn read_file(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

async fn load_document(
    path: &Path,
    id: Option<String>,
    source: Option<String>,
    category: Option<String>,
) -> anyhow::Result<Document> {
    let text = read_file(path).await?;
    let id = id.unwrap_or_else(|| path.display().to_string());
    let source = source.unwrap_or_else(|| {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    });

    let mut metadata = Metadata::from_pairs([("source", source)]);
    if let Some(category) = category {
        metadata.insert("category", category);
    }
    Ok(Document::new(id, text, metadata))
}

async fn ingest_files(state: &RagState, files: &[PathBuf], output: &Output) -> anyhow::Result<()> {
    for file in files {
        let document = load_document(file, None, None, None).await?;
        let ack = ingest_document(state, &document).await?;
        output.info(&format!(
            "Ingested {} ({} chunks)",
            file.display(),
            ack.upserted_count
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_document_defaults_id_and_source() {
        let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        write!(file, "A note about Rust.").unwrap();

        let document = load_document(file.path(), None, None, Some("technology".into()))
            .await
            .unwrap();

        assert_eq!(document.id, file.path().display().to_string());
        assert_eq!(document.text, "A note about Rust.");
        assert!(document.metadata.get_str("source").unwrap().ends_with(".md"));
        assert_eq!(document.metadata.get_str("category"), Some("technology"));
    }

    #[tokio::test]
    async fn test_missing_file_reports_path() {
        let err = read_file(Path::new("/nonexistent/recall-note.md"))
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("recall-note.md"));
    }

    #[tokio::test]
    async fn test_chunk_rejects_zero_length() {
        let result = run(
            Commands::Chunk {
                file: "unused.md".into(),
                max_length: Some(0),
            },
            RecallConfig::default(),
            &Output::no_color(),
        )
        .await;
        assert!(result.is_err());
    }
}
