use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use news_client::board::{MoveDirection, PostBoard, PostDraft, PostEdit};
use news_client::{NewsClient, NewsClientError, Post};
use uuid::Uuid;

const TOKEN_FILE: &str = ".news_token";
const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";
const DEFAULT_WIDTH: u32 = 1280;

#[derive(Debug, Parser)]
#[command(name = "news-cli", version, about = "Operator CLI for news-server")]
struct Cli {
    /// Server address.
    #[arg(long, global = true, default_value = DEFAULT_SERVER)]
    server: String,

    /// Bearer token; falls back to the saved `.news_token`.
    #[arg(long, global = true, env = "NEWS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Direction {
    Left,
    Right,
}

impl From<Direction> for MoveDirection {
    fn from(value: Direction) -> Self {
        match value {
            Direction::Left => MoveDirection::Left,
            Direction::Right => MoveDirection::Right,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Save a bearer token for later calls.
    Token {
        #[arg(long)]
        value: String,
    },
    /// Public feed: published posts only.
    Feed,
    /// Admin board, or the deleted posts with `--deleted`.
    List {
        #[arg(long)]
        deleted: bool,
    },
    /// Create an unpublished draft.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long, default_value = "")]
        content: String,
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Change the text fields or image of a post.
    Edit {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long, conflicts_with = "clear_image")]
        image_url: Option<String>,
        /// Remove the image reference.
        #[arg(long)]
        clear_image: bool,
    },
    /// Toggle the published flag.
    Publish {
        #[arg(long)]
        id: Uuid,
    },
    /// Toggle the pin; pinning unpins every other post.
    Pin {
        #[arg(long)]
        id: Uuid,
    },
    /// Soft-delete a post.
    Delete {
        #[arg(long)]
        id: Uuid,
    },
    /// Restore a soft-deleted post.
    Restore {
        #[arg(long)]
        id: Uuid,
    },
    /// Permanently delete a soft-deleted post.
    Purge {
        #[arg(long)]
        id: Uuid,
    },
    /// Copy a post as a new draft.
    Duplicate {
        #[arg(long)]
        id: Uuid,
    },
    /// Move a post one step inside its grid row.
    Move {
        #[arg(long)]
        id: Uuid,
        #[arg(long, value_enum)]
        direction: Direction,
        /// Viewport width used to compute the grid columns.
        #[arg(long, default_value_t = DEFAULT_WIDTH)]
        width: u32,
    },
    /// Upload an image and print its public URL.
    Upload {
        #[arg(long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut client = NewsClient::new(normalize_server(cli.server)).map_err(map_client_error)?;
    let token = match cli.token.as_deref().and_then(parse_token_content) {
        Some(token) => Some(token),
        None => load_token().context("failed to read .news_token")?,
    };
    if let Some(token) = token {
        client.set_token(token);
    }

    match cli.command {
        Command::Token { value } => {
            let token = parse_token_content(&value).ok_or_else(|| anyhow!("token is blank"))?;
            fs::write(TOKEN_FILE, token).context("failed to save .news_token")?;
            println!("Token saved to {TOKEN_FILE}");
        }
        Command::Feed => {
            let feed = client.public_feed().await.map_err(map_client_error)?;
            if let Some(error) = &feed.error {
                eprintln!("server reported: {error}");
            }
            print_posts("Public feed", &feed.posts);
        }
        Command::Upload { file } => {
            let (file_name, content_type, data) = read_upload(&file)?;
            let url = client
                .upload_image(&file_name, &content_type, data)
                .await
                .map_err(map_client_error)?;
            println!("{url}");
        }
        Command::List { deleted } => {
            let board = open_board(client, DEFAULT_WIDTH).await?;
            if deleted {
                print_posts("Deleted posts", board.deleted());
            } else {
                print_posts("Active posts", board.active());
            }
        }
        Command::Create {
            title,
            author,
            content,
            image_url,
        } => {
            let mut board = open_board(client, DEFAULT_WIDTH).await?;
            let draft = PostDraft {
                title,
                author,
                content,
                image_url,
            };
            let post = board.create(draft).await.map_err(map_client_error)?;
            print_post("Draft created", &post);
        }
        Command::Edit {
            id,
            title,
            author,
            content,
            image_url,
            clear_image,
        } => {
            let mut board = open_board(client, DEFAULT_WIDTH).await?;
            let changes = PostEdit {
                title,
                author,
                content,
                image_url: image_change(image_url, clear_image),
            };
            let post = board.edit(id, changes).await.map_err(map_client_error)?;
            print_post("Post updated", &post);
        }
        Command::Publish { id } => {
            let mut board = open_board(client, DEFAULT_WIDTH).await?;
            board.toggle_publish(id).await.map_err(map_client_error)?;
            report_state(&board, id);
        }
        Command::Pin { id } => {
            let mut board = open_board(client, DEFAULT_WIDTH).await?;
            board.toggle_pin(id).await.map_err(map_client_error)?;
            report_state(&board, id);
        }
        Command::Delete { id } => {
            let mut board = open_board(client, DEFAULT_WIDTH).await?;
            board.soft_delete(id).await.map_err(map_client_error)?;
            println!("Post moved to deleted: id={id}");
        }
        Command::Restore { id } => {
            let mut board = open_board(client, DEFAULT_WIDTH).await?;
            board.restore(id).await.map_err(map_client_error)?;
            report_state(&board, id);
        }
        Command::Purge { id } => {
            let mut board = open_board(client, DEFAULT_WIDTH).await?;
            board.purge(id).await.map_err(map_client_error)?;
            println!("Post permanently deleted: id={id}");
        }
        Command::Duplicate { id } => {
            let mut board = open_board(client, DEFAULT_WIDTH).await?;
            let copy = board.duplicate(id).await.map_err(map_client_error)?;
            print_post("Copy created", &copy);
        }
        Command::Move {
            id,
            direction,
            width,
        } => {
            let mut board = open_board(client, width).await?;
            let moved = board
                .move_post(id, direction.into())
                .await
                .map_err(map_client_error)?;
            if moved {
                print_posts("Active posts", board.active());
            } else {
                println!("Move not allowed: pinned post or edge of its row");
            }
        }
    }

    Ok(())
}

async fn open_board(client: NewsClient, width: u32) -> Result<PostBoard<NewsClient>> {
    let mut board = PostBoard::new(client, width);
    board.refresh().await.map_err(map_client_error)?;
    if let Some(error) = board.backend_error() {
        eprintln!("server reported: {error}");
    }
    Ok(board)
}

fn image_change(image_url: Option<String>, clear_image: bool) -> Option<Option<String>> {
    if clear_image {
        Some(None)
    } else {
        image_url.map(Some)
    }
}

fn read_upload(path: &Path) -> Result<(String, String, Vec<u8>)> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("{} has no usable file name", path.display()))?
        .to_string();
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok((file_name, content_type, data))
}

fn normalize_server(server: String) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        return server;
    }

    format!("http://{server}")
}

fn parse_token_content(raw: &str) -> Option<String> {
    let token = raw.trim().to_string();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn load_token() -> io::Result<Option<String>> {
    if !Path::new(TOKEN_FILE).exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(TOKEN_FILE)?;
    Ok(parse_token_content(&raw))
}

fn map_client_error(err: NewsClientError) -> anyhow::Error {
    let message = match err {
        NewsClientError::Unauthorized => {
            "unauthorized: pass --token, set NEWS_TOKEN or run `news-cli token --value ...`"
                .to_string()
        }
        NewsClientError::NotFound(message) => format!("not found: {message}"),
        NewsClientError::InvalidRequest(message) => format!("invalid request: {message}"),
        NewsClientError::Server(message) => format!("server error: {message}"),
        NewsClientError::Http(err) => format!("http error: {err}"),
    };
    anyhow!(message)
}

fn report_state<A: news_client::NewsApi>(board: &PostBoard<A>, id: Uuid) {
    match board.find(id) {
        Some(post) => print_post("Post", post),
        None => println!("Post {id} is no longer listed"),
    }
}

fn status_of(post: &Post) -> &'static str {
    match (post.deleted, post.published) {
        (true, _) => "deleted",
        (false, true) => "published",
        (false, false) => "draft",
    }
}

fn print_post(title: &str, post: &Post) {
    println!("{title}");
    println!("id: {}", post.id);
    println!("title: {}", post.title);
    println!("author: {}", post.author);
    println!("status: {}", status_of(post));
    println!("pinned: {}", post.is_effectively_pinned());
    println!("display_order: {}", post.sort_order());
    if let Some(image_url) = &post.image_url {
        println!("image_url: {image_url}");
    }
    println!("content: {}", post.content);
    println!("created_at: {}", post.created_at);
    println!("updated_at: {}", post.updated_at);
}

fn print_posts(title: &str, posts: &[Post]) {
    println!("{title}: {}", posts.len());

    for (index, post) in posts.iter().enumerate() {
        let pin = if post.is_effectively_pinned() { " [pinned]" } else { "" };
        println!(
            "{index:>3}. [{}] {} ({}, {}){pin}",
            post.id,
            post.title,
            post.author,
            status_of(post)
        );
    }
}
