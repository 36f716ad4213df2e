use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use inkpost_client::models::{LoginRequest, RegisterRequest};
use inkpost_client::{HttpClient, NewPostForm, ProfileUpdateForm, UpdatePostForm};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Server base URL, e.g. http://localhost:3000
    #[arg(short, long)]
    server: Option<String>,

    /// Path to the token file (defaults to ~/.inkpost_token)
    #[arg(long)]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new account
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(short, long)]
        full_name: String,
    },

    /// Log in with a username or email
    Login {
        #[arg(short, long)]
        identifier: String,

        #[arg(short, long)]
        password: String,
    },

    /// Log out and forget the saved token
    Logout,

    /// Show who the saved token belongs to
    Status,

    /// List posts, newest first
    List {
        #[arg(short, long, default_value_t = 1)]
        page: i64,
    },

    /// Fetch a single post
    Get {
        #[arg(short, long)]
        id: i64,
    },

    /// Create a post
    Create {
        #[arg(short, long)]
        title: String,

        #[arg(short = 'd', long)]
        short_description: String,

        #[arg(short, long)]
        content: String,

        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Update a post you own
    Update {
        #[arg(short, long)]
        id: i64,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short = 'd', long)]
        short_description: Option<String>,

        #[arg(short, long)]
        content: Option<String>,

        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Delete a post you own
    Delete {
        #[arg(short, long)]
        id: i64,
    },

    /// Update your profile
    Profile {
        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        full_name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        password: Option<String>,

        #[arg(long)]
        profile_image: Option<PathBuf>,

        #[arg(long)]
        cover_image: Option<PathBuf>,
    },

    /// Show a user and their posts
    User {
        #[arg(short, long)]
        id: i64,
    },

    /// Comment on a post
    Comment {
        #[arg(short, long)]
        post_id: i64,

        #[arg(short, long)]
        text: String,
    },

    /// List the comments on a post
    Comments {
        #[arg(short, long)]
        post_id: i64,
    },

    /// Delete a comment you wrote
    Uncomment {
        #[arg(short, long)]
        comment_id: i64,
    },
}

struct TokenManager {
    token_path: PathBuf,
}

impl TokenManager {
    fn new(custom_path: Option<PathBuf>) -> Result<Self> {
        let token_path = match custom_path {
            Some(path) => path,
            None => {
                let home = dirs::home_dir().context("Failed to get home directory")?;
                home.join(".inkpost_token")
            }
        };

        Ok(Self { token_path })
    }

    fn save_token(&self, token: &str) -> Result<()> {
        fs::write(&self.token_path, token)
            .with_context(|| format!("Failed to save token to {:?}", self.token_path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.token_path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.token_path, perms)?;
        }

        println!("✓ Token saved to {:?}", self.token_path);
        Ok(())
    }

    fn load_token(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.token_path) {
            Ok(token) => {
                let token = token.trim().to_string();
                if !token.is_empty() {
                    Ok(Some(token))
                } else {
                    Ok(None)
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context("Failed to read token file"),
        }
    }

    fn clear_token(&self) -> Result<()> {
        if self.token_path.exists() {
            fs::remove_file(&self.token_path)
                .with_context(|| format!("Failed to remove token file {:?}", self.token_path))?;
            println!("✓ Token file removed");
        }
        Ok(())
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    println!("{} {}", "❌".red(), message);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let server = cli
        .server
        .or_else(|| std::env::var("INKPOST_SERVER").ok())
        .unwrap_or_else(|| "http://localhost:3000".to_string());

    println!("🔌 Connecting to: {}", server);

    let mut client = HttpClient::new(server);

    let token_manager = TokenManager::new(cli.token_file)?;
    if let Some(token) = token_manager.load_token()? {
        client.set_token(token);
    }

    match cli.command {
        Commands::Register {
            username,
            email,
            password,
            full_name,
        } => {
            println!("📝 Registering user: {}", username);

            match client
                .register(RegisterRequest {
                    full_name,
                    username,
                    email,
                    password,
                })
                .await
            {
                Ok(user) => {
                    println!("{} Registration successful!", "✅".green());
                    println!("   User ID: {}", user.id);
                    println!("   Username: {}", user.username);
                    println!("   Email: {}", user.email);
                    println!("   Log in to get a token.");
                }
                Err(e) => fail(format!("Registration failed: {}", e)),
            }
        }

        Commands::Login {
            identifier,
            password,
        } => {
            println!("🔑 Logging in as: {}", identifier);

            match client
                .login(LoginRequest {
                    email_or_username: identifier,
                    password,
                })
                .await
            {
                Ok(login) => {
                    println!("{} Login successful!", "✅".green());
                    println!("   Welcome back, {}", login.data.full_name);
                    token_manager.save_token(&login.token)?;
                }
                Err(e) => fail(format!("Login failed: {}", e)),
            }
        }

        Commands::Logout => match client.logout().await {
            Ok(()) => {
                token_manager.clear_token()?;
                println!("{} Logged out", "✅".green());
            }
            Err(e) => fail(format!("Logout failed: {}", e)),
        },

        Commands::Status => match client.verify().await {
            Ok(user) => {
                println!("{} Authenticated", "✅".green());
                println!("   User ID: {}", user.id);
                println!("   Username: {}", user.username);
                println!("   Full name: {}", user.full_name);
            }
            Err(e) => fail(format!("Not authenticated: {}", e)),
        },

        Commands::List { page } => match client.list_posts(Some(page)).await {
            Ok(listing) => {
                println!(
                    "📋 Page {}: {} post(s) of {} total",
                    listing.page,
                    listing.data.len(),
                    listing.total
                );
                for post in listing.data {
                    println!(
                        "   #{} {} by {} ({} views)",
                        post.id,
                        post.title.bold(),
                        post.author.username,
                        post.views
                    );
                    println!("      {}", post.short_description);
                }
            }
            Err(e) => fail(format!("Failed to list posts: {}", e)),
        },

        Commands::Get { id } => match client.get_post(id).await {
            Ok(post) => {
                println!("📄 {}", post.title.bold());
                println!("   by {}, {} views", post.author.username, post.views);
                if let Some(image) = &post.image {
                    println!("   image: {}", image);
                }
                println!();
                println!("{}", post.content);
            }
            Err(e) => fail(format!("Failed to fetch post: {}", e)),
        },

        Commands::Create {
            title,
            short_description,
            content,
            image,
        } => {
            match client
                .create_post(NewPostForm {
                    title,
                    short_description,
                    content,
                    image,
                })
                .await
            {
                Ok(post) => {
                    println!("{} Post created!", "✅".green());
                    println!("   Post ID: {}", post.id);
                    if let Some(image) = &post.image {
                        println!("   Image: {}", image);
                    }
                }
                Err(e) => fail(format!("Failed to create post: {}", e)),
            }
        }

        Commands::Update {
            id,
            title,
            short_description,
            content,
            image,
        } => {
            match client
                .update_post(
                    id,
                    UpdatePostForm {
                        title,
                        short_description,
                        content,
                        image,
                    },
                )
                .await
            {
                Ok(post) => {
                    println!("{} Post {} updated", "✅".green(), post.id);
                }
                Err(e) => fail(format!("Failed to update post: {}", e)),
            }
        }

        Commands::Delete { id } => match client.delete_post(id).await {
            Ok(()) => println!("{} Post {} deleted", "✅".green(), id),
            Err(e) => fail(format!("Failed to delete post: {}", e)),
        },

        Commands::Profile {
            username,
            full_name,
            email,
            password,
            profile_image,
            cover_image,
        } => {
            // The update endpoint is keyed by user id, so resolve ourselves
            // from the token first.
            let me = match client.verify().await {
                Ok(user) => user,
                Err(e) => fail(format!("Not authenticated: {}", e)),
            };

            match client
                .update_profile(
                    me.id,
                    ProfileUpdateForm {
                        username,
                        full_name,
                        email,
                        password,
                        profile_image,
                        cover_image,
                    },
                )
                .await
            {
                Ok(user) => {
                    println!("{} Profile updated", "✅".green());
                    println!("   Username: {}", user.username);
                    println!("   Full name: {}", user.full_name);
                    if let Some(pic) = &user.profile_pic {
                        println!("   Profile picture: {}", pic);
                    }
                    if let Some(cover) = &user.cover_image {
                        println!("   Cover image: {}", cover);
                    }
                }
                Err(e) => fail(format!("Failed to update profile: {}", e)),
            }
        }

        Commands::User { id } => match client.get_user_info(id).await {
            Ok(info) => {
                println!("👤 {} ({})", info.user.full_name.bold(), info.user.username);
                println!("   {} post(s)", info.posts.len());
                for post in info.posts {
                    println!("   #{} {}", post.id, post.title);
                }
            }
            Err(e) => fail(format!("Failed to fetch user: {}", e)),
        },

        Commands::Comment { post_id, text } => match client.add_comment(post_id, text).await {
            Ok(comment) => {
                println!("{} Comment {} added", "✅".green(), comment.id);
            }
            Err(e) => fail(format!("Failed to add comment: {}", e)),
        },

        Commands::Comments { post_id } => match client.list_comments(post_id).await {
            Ok(comments) => {
                println!("💬 {} comment(s)", comments.len());
                for comment in comments {
                    println!("   #{} (user {}): {}", comment.id, comment.commented_by, comment.comment);
                }
            }
            Err(e) => fail(format!("Failed to list comments: {}", e)),
        },

        Commands::Uncomment { comment_id } => match client.delete_comment(comment_id).await {
            Ok(()) => println!("{} Comment {} deleted", "✅".green(), comment_id),
            Err(e) => fail(format!("Failed to delete comment: {}", e)),
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
