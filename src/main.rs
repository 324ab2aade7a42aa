//! RAG Admin CLI
//!
//! Command-line front end for the admin API:
//! - Log in and out
//! - Manage knowledge base documents and uploads
//! - Import and browse FAQs
//! - Inspect conversations, statistics and system health
//!
//! # Configuration
//!
//! Reads `--config`, else the default config locations, then applies the
//! `RAG_ADMIN_*` environment overrides. `RUST_LOG` overrides the tracing
//! filter.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use rag_admin::api::{
    csv_columns, CatalogParams, DocumentListParams, DocumentStatus, DocumentUpdateRequest,
    FaqImportRequest, FaqListParams, HistoryParams, MetricsRange, SearchParams, UploadOptions,
    UpsertDocument, UpsertRequest,
};
use rag_admin::config::{generate_default_config, Config};
use rag_admin::http::{ApiClient, FilePart, Navigator, ProgressCallback};
use rag_admin::logging;
use rag_admin::session::FileSessionStore;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[derive(Parser)]
#[command(name = "rag-admin")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Administer a RAG customer-service backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: user config dir, then ./rag-admin.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL, overriding the config
    #[arg(long, global = true)]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session token
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "RAG_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Knowledge base documents and uploads
    Docs {
        #[command(subcommand)]
        command: DocsCommand,
    },

    /// Semantic search over the knowledge base
    Search {
        query: String,
        #[arg(short = 'k', long)]
        top_k: Option<u32>,
        #[arg(long)]
        collection: Option<String>,
    },

    /// FAQ import and management
    Faq {
        #[command(subcommand)]
        command: FaqCommand,
    },

    /// Conversation history
    Conversations {
        #[command(subcommand)]
        command: ConversationsCommand,
    },

    /// Usage statistics
    Stats {
        #[command(subcommand)]
        command: StatsCommand,
    },

    /// Dashboard KPIs and component status
    Metrics {
        /// 24h, 7d or 30d
        #[arg(short, long, default_value = "24h")]
        range: MetricsRange,
    },

    /// Backend dependency health
    Health,

    /// Backend model and storage settings
    SystemConfig,

    /// Generate default config file
    InitConfig {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum DocsCommand {
    /// List documents
    List {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one document
    Show { id: String },
    /// Replace a document's content
    Update {
        id: String,
        #[arg(long)]
        content: String,
        /// Metadata as a JSON object
        #[arg(long, default_value = "{}")]
        metadata: String,
    },
    /// Delete a document
    Delete { id: String },
    /// Upload files for ingestion
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        version: Option<String>,
    },
    /// List recent uploads
    Uploads {
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Show the processing status of an upload
    UploadStatus { upload_id: String },
    /// Re-run a failed upload
    Retry { upload_id: String },
    /// Remove an upload and its documents
    Rollback { upload_id: String },
    /// Show how a file would be chunked
    Preview { file: PathBuf },
    /// Browse the document catalog
    Catalog {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
        #[arg(short, long)]
        keyword: Option<String>,
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        /// draft, published or archived
        #[arg(long)]
        status: Option<DocumentStatus>,
    },
    /// Insert raw text documents
    Upsert {
        /// Document text (repeatable)
        #[arg(short, long = "text", required = true)]
        texts: Vec<String>,
        #[arg(long)]
        collection: Option<String>,
        #[arg(long)]
        chunk_size: Option<u32>,
        #[arg(long)]
        chunk_overlap: Option<u32>,
    },
}

#[derive(Subcommand)]
pub enum FaqCommand {
    /// List FAQs
    List {
        #[arg(long)]
        skip: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        language: Option<String>,
    },
    /// Show one FAQ
    Show { id: String },
    /// Preview a CSV file before importing
    Preview { file: PathBuf },
    /// Import FAQs from a CSV file
    Import {
        file: PathBuf,
        /// Columns concatenated into the FAQ text
        #[arg(long, value_delimiter = ',', required = true)]
        text_columns: Vec<String>,
        /// Columns used for embeddings
        #[arg(long, value_delimiter = ',', required = true)]
        embedding_columns: Vec<String>,
        #[arg(long)]
        template: Option<String>,
        #[arg(long)]
        language: Option<String>,
    },
    /// Delete an FAQ
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum ConversationsCommand {
    /// Conversation history, newest first
    History {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
        /// YYYY-MM-DD
        #[arg(long)]
        start_date: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        end_date: Option<String>,
    },
    /// All exchanges of one chat session
    Session { session_id: String },
}

#[derive(Subcommand)]
pub enum StatsCommand {
    /// Session totals and average confidence
    Overview,
    /// Sessions per day
    Daily {
        #[arg(short, long)]
        days: Option<u32>,
    },
}

/// Tells the operator to log in again once a 401 has cleared the session
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, path: &str) {
        eprintln!("Session expired ({path}). Run `rag-admin login` to sign in again.");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }

    init_tracing(&config);
    logging::init(config.logging.threshold());

    let session = Arc::new(FileSessionStore::new(config.session.path()));
    let navigator = guards_session(&cli.command)
        .then(|| Arc::new(TerminalNavigator) as Arc<dyn Navigator>);
    let client = ApiClient::from_config(&config.api, session, navigator)?;

    run(cli.command, &client).await
}

/// A rejected login is a wrong password, not an expired session
fn guards_session(command: &Commands) -> bool {
    !matches!(command, Commands::Login { .. })
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rag_admin=debug".into());
    let json = config.logging.is_json();

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| pretty_layer(std::io::stderr)))
        .init();
}

/// Human-readable layer; logger lines carry their own timestamp
fn pretty_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .without_time()
        .with_writer(writer)
}

async fn run(command: Commands, client: &ApiClient) -> anyhow::Result<()> {
    match command {
        Commands::Login { username, password } => {
            let response = client.auth().login(&username, &password).await?;
            println!(
                "Logged in as {} (token expires in {}s)",
                username, response.expires_in
            );
        }

        Commands::Logout => {
            client.auth().logout()?;
            println!("Logged out");
        }

        Commands::Whoami => {
            let auth = client.auth();
            match auth.current_user()? {
                Some(user) if auth.is_authenticated()? => println!("{user}"),
                _ => {
                    eprintln!("Not logged in");
                    std::process::exit(1);
                }
            }
        }

        Commands::Docs { command } => run_docs(command, client).await?,

        Commands::Search {
            query,
            top_k,
            collection,
        } => {
            let params = SearchParams {
                query,
                top_k,
                collection_name: collection,
            };
            let response = client.knowledge().search(&params).await?;

            if response.results.is_empty() {
                println!("No results for \"{}\"", response.query);
            }
            for (rank, hit) in response.results.iter().enumerate() {
                println!("{:>2}. [{:.3}] {}", rank + 1, hit.score, first_line(&hit.text, 100));
            }
        }

        Commands::Faq { command } => run_faq(command, client).await?,

        Commands::Conversations { command } => match command {
            ConversationsCommand::History {
                page,
                page_size,
                start_date,
                end_date,
            } => {
                let params = HistoryParams {
                    page,
                    page_size,
                    start_date,
                    end_date,
                };
                print_json(&client.conversations().history(&params).await?)?;
            }
            ConversationsCommand::Session { session_id } => {
                print_json(&client.conversations().session(&session_id).await?)?;
            }
        },

        Commands::Stats { command } => match command {
            StatsCommand::Overview => {
                let stats = client.analytics().overview().await?;
                println!("Total sessions:  {}", stats.total_sessions);
                println!("Today:           {}", stats.today_sessions);
                println!("Avg confidence:  {:.2}", stats.avg_confidence);
            }
            StatsCommand::Daily { days } => {
                let daily = client.analytics().daily(days).await?;
                println!("{:<12} {}", "Date", "Sessions");
                println!("{}", "-".repeat(22));
                for day in daily {
                    println!("{:<12} {}", day.date, day.count);
                }
            }
        },

        Commands::Metrics { range } => {
            let metrics = client.metrics().summary(range).await?;
            println!("Metrics ({range}), generated {}", metrics.generated_at);
            println!();
            for kpi in &metrics.kpis {
                println!(
                    "{:<24} {:>12} {:<4} {:+.1}",
                    kpi.title,
                    kpi.value,
                    kpi.unit.as_deref().unwrap_or(""),
                    kpi.delta
                );
            }
            println!();
            println!("Milvus: {:?}", metrics.status.milvus.status);
            println!("Redis:  {:?}", metrics.status.redis.status);
        }

        Commands::Health => {
            let health = client.settings().health().await?;
            println!("Status: {}", health.status);
            for (name, service) in &health.services {
                println!("  {:<12} {:<10} {}", name, service.status, service.message);
            }
            if health.unhealthy().next().is_some() {
                std::process::exit(2);
            }
        }

        Commands::SystemConfig => print_json(&client.settings().config().await?)?,

        Commands::InitConfig { output } => write_default_config(output.as_ref())?,
    }

    Ok(())
}

async fn run_docs(command: DocsCommand, client: &ApiClient) -> anyhow::Result<()> {
    let knowledge = client.knowledge();

    match command {
        DocsCommand::List {
            page,
            page_size,
            search,
        } => {
            let params = DocumentListParams {
                page,
                page_size,
                search,
            };
            let response = knowledge.list(&params).await?;

            println!("{:<38} {}", "ID", "Text");
            println!("{}", "-".repeat(80));
            for doc in &response.documents {
                println!("{:<38} {}", doc.id, first_line(&doc.text, 40));
            }
            println!();
            println!(
                "Page {} ({} of {} documents)",
                response.page,
                response.documents.len(),
                response.total
            );
        }

        DocsCommand::Show { id } => print_json(&knowledge.get(&id).await?)?,

        DocsCommand::Update {
            id,
            content,
            metadata,
        } => {
            let metadata = serde_json::from_str(&metadata).context("metadata must be a JSON object")?;
            let update = DocumentUpdateRequest { content, metadata };
            println!("{}", knowledge.update(&id, &update).await?.message);
        }

        DocsCommand::Delete { id } => println!("{}", knowledge.delete(&id).await?.message),

        DocsCommand::Upload {
            files,
            source,
            version,
        } => {
            let mut parts = Vec::with_capacity(files.len());
            for path in &files {
                let part = FilePart::from_path("files", path)
                    .await
                    .with_context(|| format!("cannot read {}", path.display()))?;
                parts.push(part);
            }

            let options = UploadOptions {
                source,
                version,
                progress: Some(progress_bar("Uploading")),
            };
            let responses = knowledge.upload_files(parts, options).await?;
            eprintln!();

            for upload in responses {
                println!("{} {} ({}): {}", upload.upload_id, upload.filename, upload.status, upload.message);
            }
        }

        DocsCommand::Uploads { limit } => {
            let uploads = knowledge.uploads(limit).await?;
            println!("{:<38} {:<30} {:<12} {:>6}", "Upload", "File", "Status", "Docs");
            println!("{}", "-".repeat(90));
            for upload in uploads {
                println!(
                    "{:<38} {:<30} {:<12} {:>6}",
                    upload.upload_id, upload.filename, upload.status, upload.document_count
                );
            }
        }

        DocsCommand::UploadStatus { upload_id } => print_json(&knowledge.upload_status(&upload_id).await?)?,

        DocsCommand::Retry { upload_id } => {
            println!("{}", knowledge.retry_upload(&upload_id).await?.message)
        }

        DocsCommand::Rollback { upload_id } => {
            println!("{}", knowledge.rollback_upload(&upload_id).await?.message)
        }

        DocsCommand::Preview { file } => {
            let part = FilePart::from_path("file", &file)
                .await
                .with_context(|| format!("cannot read {}", file.display()))?;
            let preview = knowledge.preview(part).await?;

            println!(
                "{} ({}): {} chunks, ~{} tokens",
                preview.filename, preview.file_type, preview.total_chunks, preview.estimated_tokens
            );
            for (i, chunk) in preview.chunks.iter().enumerate() {
                println!("  [{}] {}", i + 1, first_line(chunk, 70));
            }
        }

        DocsCommand::Catalog {
            page,
            page_size,
            keyword,
            tags,
            status,
        } => {
            let params = CatalogParams {
                page,
                page_size,
                keyword,
                tags,
                status,
            };
            print_json(&knowledge.catalog(&params).await?)?;
        }

        DocsCommand::Upsert {
            texts,
            collection,
            chunk_size,
            chunk_overlap,
        } => {
            let request = UpsertRequest {
                documents: texts
                    .into_iter()
                    .map(|text| UpsertDocument {
                        text,
                        metadata: Default::default(),
                    })
                    .collect(),
                collection_name: collection,
                chunk_size,
                chunk_overlap,
            };
            let response = knowledge.upsert(&request).await?;
            println!(
                "Inserted {} chunks into {}: {}",
                response.inserted_count, response.collection_name, response.message
            );
        }
    }

    Ok(())
}

async fn run_faq(command: FaqCommand, client: &ApiClient) -> anyhow::Result<()> {
    let faq = client.faq();

    match command {
        FaqCommand::List {
            skip,
            limit,
            language,
        } => {
            let params = FaqListParams {
                skip,
                limit,
                language,
            };
            let response = faq.list(&params).await?;
            for item in &response.faqs {
                println!("{}  Q: {}", item.id, first_line(&item.question, 60));
            }
            println!();
            println!("{} of {} FAQs", response.faqs.len(), response.total);
        }

        FaqCommand::Show { id } => print_json(&faq.get(&id).await?)?,

        FaqCommand::Preview { file } => {
            let part = FilePart::from_path("file", &file)
                .await
                .with_context(|| format!("cannot read {}", file.display()))?;
            print_json(&faq.preview_csv(part).await?)?;
        }

        FaqCommand::Import {
            file,
            text_columns,
            embedding_columns,
            template,
            language,
        } => {
            let available = csv_columns(&file)
                .with_context(|| format!("cannot read CSV header of {}", file.display()))?;
            let part = FilePart::from_path("file", &file)
                .await
                .with_context(|| format!("cannot read {}", file.display()))?;

            let mut request = FaqImportRequest::new(part, text_columns, embedding_columns);
            let missing = request.missing_columns(&available);
            if !missing.is_empty() {
                bail!(
                    "columns not found in {}: {} (available: {})",
                    file.display(),
                    missing.join(", "),
                    available.join(", ")
                );
            }
            request.text_template = template;
            request.language = language;
            request.progress = Some(progress_bar("Importing"));

            let response = faq.import_csv(request).await?;
            eprintln!();
            println!("{} (imported {})", response.message, response.imported_count);
            if !response.success {
                std::process::exit(1);
            }
        }

        FaqCommand::Delete { id } => println!("{}", faq.delete(&id).await?.message),
    }

    Ok(())
}

/// Progress callback that redraws a percentage on stderr
fn progress_bar(label: &'static str) -> ProgressCallback {
    Arc::new(move |pct: u8| {
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "\r{label}... {pct:>3}%");
        let _ = stderr.flush();
    })
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn write_default_config(output: Option<&PathBuf>) -> anyhow::Result<()> {
    let content = generate_default_config();
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("cannot write {}", path.display()))?;
            println!("Config written to {}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}

/// First line of `text`, cut to `max` characters
fn first_line(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or("");
    if line.chars().count() > max {
        let cut: String = line.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}
