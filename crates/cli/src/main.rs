use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use collab::{MovieRecommender, ProductRecommender, RatingScale, SvdConfig, cross_validate};
use colored::Colorize;
use data_loader::{
    MovieTable, UserId, load_product_ratings, load_ratings, load_raw, normalize,
};
use recommenders::{ContentRecommender, DemographicRanker};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// RecEngine - Recommendation engine demos
#[derive(Parser)]
#[command(name = "rec-engine")]
#[command(about = "Recommendation engines over movie and product rating datasets", long_about = None)]
struct Cli {
    /// Path to the movie metadata CSV
    #[arg(long, default_value = "data/tmdb_5000_movies.csv")]
    movies: PathBuf,

    /// Path to the movie credits CSV
    #[arg(long, default_value = "data/tmdb_5000_credits.csv")]
    credits: PathBuf,

    /// Path to the movie ratings CSV
    #[arg(long, default_value = "data/ratings_small.csv")]
    ratings: PathBuf,

    /// Path to the product ratings CSV
    #[arg(long, default_value = "data/ratings_Beauty.csv")]
    product_ratings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank all movies by popularity-weighted rating
    TopRated {
        /// Number of movies to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Find movies with overviews similar to a given title
    Similar {
        /// Movie title to match against
        #[arg(long)]
        title: String,

        /// Number of movies to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Get personalized movie recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations to return
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Cross-validate the rating predictor and report RMSE/MAE
    Evaluate {
        /// Number of folds
        #[arg(long, default_value = "5")]
        folds: usize,
    },

    /// List the most-rated products
    PopularProducts {
        /// Number of products to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Find products similar to a given product
    SimilarProducts {
        /// Product ID to match against
        #[arg(long)]
        product_id: String,

        /// Number of products to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Find users with similar rating patterns
    SimilarUsers {
        /// User ID to match against
        #[arg(long)]
        user_id: String,

        /// Number of users to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::TopRated { limit } => {
            let table = load_movie_table(&cli.movies, &cli.credits)?;
            handle_top_rated(table, limit)
        }
        Commands::Similar { title, limit } => {
            let table = load_movie_table(&cli.movies, &cli.credits)?;
            handle_similar(table, &title, limit)
        }
        Commands::Recommend { user_id, limit } => {
            let table = load_movie_table(&cli.movies, &cli.credits)?;
            handle_recommend(&cli.ratings, table, user_id, limit)
        }
        Commands::Evaluate { folds } => handle_evaluate(&cli.ratings, folds),
        Commands::PopularProducts { limit } => {
            let rec = load_product_recommender(&cli.product_ratings)?;
            handle_popular_products(&rec, limit)
        }
        Commands::SimilarProducts { product_id, limit } => {
            let rec = load_product_recommender(&cli.product_ratings)?;
            handle_similar_products(&rec, &product_id, limit)
        }
        Commands::SimilarUsers { user_id, limit } => {
            let rec = load_product_recommender(&cli.product_ratings)?;
            handle_similar_users(&rec, &user_id, limit)
        }
    }
}

/// Load, join and normalize the movie metadata tables
fn load_movie_table(movies: &Path, credits: &Path) -> Result<Arc<MovieTable>> {
    println!("Loading movie dataset from {}...", movies.display());
    let start = Instant::now();

    let raw = load_raw(movies, credits).context("Failed to load movie dataset")?;
    let (table, report) = normalize(raw);

    println!(
        "{} Loaded {} movies in {:?} ({} rows dropped, {} malformed fields)",
        "✓".green(),
        table.len(),
        start.elapsed(),
        report.rows_dropped,
        report.malformed_total()
    );
    Ok(Arc::new(table))
}

/// Load product ratings and build the item-item recommender
fn load_product_recommender(path: &Path) -> Result<ProductRecommender> {
    println!("Loading product ratings from {}...", path.display());
    let start = Instant::now();

    let ratings = load_product_ratings(path).context("Failed to load product ratings")?;
    let rec = ProductRecommender::new(&ratings, 10)
        .context("Failed to build product recommender")?;

    println!(
        "{} Factorized {} ratings in {:?}",
        "✓".green(),
        ratings.len(),
        start.elapsed()
    );
    Ok(rec)
}

/// Handle the 'top-rated' command
fn handle_top_rated(table: Arc<MovieTable>, limit: usize) -> Result<()> {
    let ranked = DemographicRanker::new(table).rank(limit);

    println!("{}", "Top rated movies:".bold().blue());
    for (rank, scored) in ranked.iter().enumerate() {
        println!(
            "{}. {} - Score: {:.2} ({:.0} votes, avg {:.1})",
            (rank + 1).to_string().green(),
            scored.movie.title,
            scored.score,
            scored.movie.vote_count,
            scored.movie.vote_average
        );
    }
    Ok(())
}

/// Handle the 'similar' command
fn handle_similar(table: Arc<MovieTable>, title: &str, limit: usize) -> Result<()> {
    let start = Instant::now();
    let recommender = ContentRecommender::new(table);
    println!(
        "{} Built similarity matrix in {:?}",
        "✓".green(),
        start.elapsed()
    );

    let results = recommender
        .recommend(title, limit)
        .with_context(|| format!("No recommendations for '{title}'"))?;

    println!("{}", format!("Movies similar to '{title}':").bold().blue());
    for (rank, movie) in results.iter().enumerate() {
        let genres = movie.genres.join(", ");
        println!(
            "{}. {} [{}]",
            (rank + 1).to_string().green(),
            movie.title,
            genres
        );
    }
    Ok(())
}

/// Handle the 'recommend' command
fn handle_recommend(
    ratings_path: &Path,
    table: Arc<MovieTable>,
    user_id: UserId,
    limit: usize,
) -> Result<()> {
    println!("Loading ratings from {}...", ratings_path.display());
    let ratings = load_ratings(ratings_path).context("Failed to load ratings")?;

    let titles: HashMap<_, _> = table
        .iter()
        .map(|m| (m.id, m.title.clone()))
        .collect();

    let start = Instant::now();
    let mut recommender = MovieRecommender::new(ratings, titles);
    recommender.train().context("Training failed")?;
    println!("{} Trained model in {:?}", "✓".green(), start.elapsed());

    let results = recommender
        .recommend(user_id, limit)
        .with_context(|| format!("No recommendations for user {user_id}"))?;

    println!(
        "{}",
        format!("Recommendations for user {user_id}:").bold().blue()
    );
    for (rank, rec) in results.iter().enumerate() {
        let title = rec.title.as_deref().unwrap_or("(unknown title)");
        println!(
            "{}. {} - Estimated rating: {:.2}",
            (rank + 1).to_string().green(),
            title,
            rec.estimate
        );
    }
    Ok(())
}

/// Handle the 'evaluate' command
fn handle_evaluate(ratings_path: &Path, folds: usize) -> Result<()> {
    println!("Loading ratings from {}...", ratings_path.display());
    let ratings = load_ratings(ratings_path).context("Failed to load ratings")?;

    let start = Instant::now();
    let config = SvdConfig::default();
    let metrics = cross_validate(&ratings, folds, &config, RatingScale::default(), config.seed)
        .context("Cross-validation failed")?;

    println!(
        "{} Evaluated {} folds in {:?}",
        "✓".green(),
        folds,
        start.elapsed()
    );
    println!("{}", "Cross-validation results:".bold().blue());
    for (fold, m) in metrics.iter().enumerate() {
        println!(
            "  Fold {}: RMSE {:.4}, MAE {:.4}",
            (fold + 1).to_string().green(),
            m.rmse,
            m.mae
        );
    }

    let mean_rmse = metrics.iter().map(|m| m.rmse).sum::<f64>() / metrics.len() as f64;
    let mean_mae = metrics.iter().map(|m| m.mae).sum::<f64>() / metrics.len() as f64;
    println!("  Mean: RMSE {:.4}, MAE {:.4}", mean_rmse, mean_mae);
    Ok(())
}

/// Handle the 'popular-products' command
fn handle_popular_products(rec: &ProductRecommender, limit: usize) -> Result<()> {
    println!("{}", "Most rated products:".bold().blue());
    for (rank, product) in rec.get_popular_products(limit).iter().enumerate() {
        println!("{}. {}", (rank + 1).to_string().green(), product);
    }
    Ok(())
}

/// Handle the 'similar-products' command
fn handle_similar_products(rec: &ProductRecommender, product_id: &str, limit: usize) -> Result<()> {
    let results = rec
        .recommend(product_id, limit)
        .with_context(|| format!("No recommendations for product '{product_id}'"))?;

    println!(
        "{}",
        format!("Products similar to '{product_id}':").bold().blue()
    );
    for (rank, product) in results.iter().enumerate() {
        println!("{}. {}", (rank + 1).to_string().green(), product);
    }
    Ok(())
}

/// Handle the 'similar-users' command
fn handle_similar_users(rec: &ProductRecommender, user_id: &str, limit: usize) -> Result<()> {
    let results = rec
        .get_similar_users(user_id, limit)
        .with_context(|| format!("No similar users for '{user_id}'"))?;

    println!(
        "{}",
        format!("Users with taste similar to '{user_id}':").bold().blue()
    );
    for (rank, user) in results.iter().enumerate() {
        println!("{}. {}", (rank + 1).to_string().green(), user);
    }
    Ok(())
}
