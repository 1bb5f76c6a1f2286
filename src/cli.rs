use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use log::info;

use crate::api::AppState;
use crate::config::Config;
use crate::database::Database;
use crate::error::SitlyError;
use crate::import::Import;
use crate::ratings::{PageRequest, RatingCriteria, RatingPage, Ratings, Role};

#[derive(Parser)]
#[command(
    name = "sitly-ratings",
    version,
    about = "Sitly ratings feed: stable paginated ratings over HTTP"
)]
pub struct Cli {
    /// Database file (overrides the configured location)
    #[arg(long = "db", global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the server (default if no command specified)
    Serve,

    /// Print one page of the ratings feed as JSON
    Ratings {
        /// Page number, starting at 1
        #[arg(long, short = 'p', default_value_t = 1)]
        page: u32,

        /// Ratings per page (default: configured page size)
        #[arg(long, short = 'l')]
        limit: Option<u32>,

        /// Only ratings sent by users with this role (parent, babysitter, childminder)
        #[arg(long)]
        role: Option<Role>,

        /// Only senders whose profile does (true) or does not (false) have references
        #[arg(long)]
        has_references: Option<bool>,

        /// Only senders whose profile does (true) or does not (false) have first aid
        #[arg(long)]
        has_first_aid: Option<bool>,

        /// Only senders located in this place
        #[arg(long)]
        place: Option<String>,

        /// Ids shown on page 1, comma separated; anchors later pages to exactly these
        #[arg(long, value_delimiter = ',')]
        seen: Option<Vec<i64>>,
    },

    /// Load places, users and ratings from a JSON file
    Import {
        /// Path of the JSON file
        file: PathBuf,
    },
}

impl Cli {
    pub fn handle_command_line(project_dirs: &ProjectDirs) -> Result<(), SitlyError> {
        let args = Cli::parse();
        let config = Config::get();

        let db_path = args
            .db
            .clone()
            .unwrap_or_else(|| config.database.resolve_path(project_dirs));

        // Default to Serve if no command specified
        match args.command.unwrap_or(Command::Serve) {
            Command::Serve => Self::start_server(&db_path, config),
            Command::Ratings {
                page,
                limit,
                role,
                has_references,
                has_first_aid,
                place,
                seen,
            } => {
                let page = PageRequest::checked(
                    page,
                    limit.unwrap_or(config.ratings.default_page_size),
                    config.ratings.max_page_size,
                )?;
                let criteria = RatingCriteria {
                    role,
                    has_references,
                    has_first_aid,
                    place,
                };
                Self::print_ratings(&db_path, config, &criteria, page, seen.as_deref())
            }
            Command::Import { file } => Self::import(&db_path, config, &file),
        }
    }

    fn start_server(db_path: &Path, config: &Config) -> Result<(), SitlyError> {
        let db = Database::open(db_path, config.database.pool_size)?;
        let state = AppState::new(db, config.ratings.clone());

        let host = config.server.host.clone();
        let port = config.server.port;

        info!("Starting server on {}:{}", host, port);

        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| SitlyError::Error(format!("Failed to create runtime: {}", e)))?;

        rt.block_on(async {
            let web_server = crate::server::WebServer::new(host, port);
            web_server.start(state).await
        })
    }

    fn print_ratings(
        db_path: &Path,
        config: &Config,
        criteria: &RatingCriteria,
        page: PageRequest,
        seen: Option<&[i64]>,
    ) -> Result<(), SitlyError> {
        let db = Database::open(db_path, config.database.pool_size)?;
        let conn = db.conn()?;

        let rating_page: RatingPage = match seen {
            Some(seen) => Ratings::find_page_after(&conn, criteria, page, seen)?,
            None => Ratings::find_page(&conn, criteria, page)?,
        };

        println!("{}", serde_json::to_string_pretty(&rating_page)?);

        Ok(())
    }

    fn import(db_path: &Path, config: &Config, file: &Path) -> Result<(), SitlyError> {
        let db = Database::open(db_path, config.database.pool_size)?;
        let mut conn = db.conn()?;

        let summary = Import::from_file(&mut conn, file)?;

        println!(
            "Imported {} places, {} users and {} ratings",
            summary.places, summary.users, summary.ratings
        );

        Ok(())
    }
}
